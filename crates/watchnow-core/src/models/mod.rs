//! Data models for WatchNow entities.
//!
//! This module contains the data structures exchanged with the backend:
//!
//! - `Movie`, `NewMovie`, `MovieFilter`: catalog entries and search filters
//! - `Review`, `NewReview`: user reviews attached to movies
//! - `UserProfile`, `Registration`, `ProfileUpdate`: accounts and profiles

pub mod movie;
pub mod review;
pub mod user;

pub use movie::{year_options, Movie, MovieFilter, NewMovie, GENRES};
pub use review::{sort_newest_first, NewReview, Review, MAX_RATING, MIN_RATING};
pub use user::{ProfileUpdate, RegisteredUser, Registration, UserProfile};
