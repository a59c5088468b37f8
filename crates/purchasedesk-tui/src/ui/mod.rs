//! Terminal UI module using ratatui.
//!
//! - `render`: frame layout, screen dispatch and overlays
//! - `login`: the public entry screen
//! - `dashboard`: the guarded purchase list
//! - `modal`: the multi-row purchase entry form
//! - `input`: keyboard event handling
//! - `styles`: color scheme and text styling

pub mod dashboard;
pub mod input;
pub mod login;
pub mod modal;
pub mod render;
pub mod styles;
