//! REST API client module for the WatchNow backend.
//!
//! This module provides the `ApiClient` for communicating with the
//! WatchNow API to browse movies, manage reviews and read or update the
//! signed-in user's profile.
//!
//! Login goes through the backend's root `/login` form endpoint; every
//! other call lives under `/api` and carries the session credential
//! (bearer token or session cookie) when one is set.

pub mod client;
pub mod error;

pub use client::{ApiClient, Credential};
pub use error::ApiError;
