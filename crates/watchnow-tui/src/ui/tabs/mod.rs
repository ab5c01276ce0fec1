//! Content rendering for each route.

pub mod account;
pub mod movie_detail;
pub mod movies;
pub mod profile;
