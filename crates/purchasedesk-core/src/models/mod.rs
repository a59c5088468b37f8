//! Data models for material purchases.
//!
//! - `MaterialPurchase`, `PurchasePage`: rows and pages as listed by the API
//! - `NewPurchase`: a validated row ready to submit
//! - `Pagination`: page cursor for the dashboard list
//! - `PurchaseForm`, `PurchaseDraft`: the multi-row entry form

pub mod form;
pub mod purchase;

pub use form::{FormError, PurchaseDraft, PurchaseField, PurchaseForm};
pub use purchase::{MaterialPurchase, NewPurchase, Pagination, PurchasePage};
