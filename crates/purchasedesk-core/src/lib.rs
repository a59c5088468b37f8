//! Core library for purchasedesk.
//!
//! Holds everything below the terminal UI: the session store and access
//! guard, the REST client for the purchase API, data models, the entry
//! form and configuration.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
