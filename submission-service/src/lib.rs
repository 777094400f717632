//! FBR digital invoicing submission service.
//!
//! Takes a seller's stored draft invoices, assembles them into FBR's wire format,
//! posts them to the sandbox or production endpoint and reconciles the answer
//! back onto the invoices and their items.

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
