//! HTTP handlers for submission-service.

pub mod health;
pub mod invoices;
pub mod submit;

pub use health::{health_check, metrics_handler, readiness_check};
pub use invoices::{create_invoices, get_invoice, list_invoices};
pub use submit::submit_invoices;
