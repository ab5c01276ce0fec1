//! Core library for WatchNow: the REST API client, data models, form
//! validation, the session store with its auth change broadcaster, and
//! navigation state shared by the front-ends.

pub mod api;
pub mod auth;
pub mod config;
pub mod forms;
pub mod models;
pub mod nav;
pub mod utils;

pub use api::{ApiClient, ApiError, Credential};
pub use auth::{AuthChange, AuthError, AuthSubscription, SessionState, SessionStore};
pub use config::Config;
pub use nav::{Navigator, Route};
