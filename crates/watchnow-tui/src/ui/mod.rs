//! Terminal UI module using ratatui.
//!
//! This module provides the TUI rendering and input handling:
//!
//! - `render`: Frame layout, header, status bar and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color schemes and text styling
//! - `tabs`: Per-route content (movies, movie details, profile, account forms)

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
