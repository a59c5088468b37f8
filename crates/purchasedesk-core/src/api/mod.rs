//! REST API client module for the material purchase service.
//!
//! The service issues an opaque bearer token on login; list and create
//! calls carry it as `Authorization: Bearer <token>`.

pub mod client;
pub mod error;

pub use client::{ApiClient, LoginSuccess, DEFAULT_BASE_URL};
pub use error::ApiError;
