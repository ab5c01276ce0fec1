//! Authentication module for managing the user session.
//!
//! This module provides:
//! - `SessionStore`: owns the credential and identity, and drives login,
//!   logout and identity refresh
//! - `AuthBroadcaster`: process-wide notification of session changes
//! - `Storage`: durable credential storage (file, OS keyring, memory)
//!
//! The credential is persisted under `userToken`; a copy of the nickname is
//! kept under `userNickname` for quick display only.

pub mod broadcast;
pub mod session;
pub mod storage;

pub use broadcast::{AuthBroadcaster, AuthChange, AuthSubscription};
pub use session::{AuthError, SessionState, SessionStore};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, Storage, NICKNAME_KEY, TOKEN_KEY};
