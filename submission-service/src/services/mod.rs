//! Services module for submission-service.

pub mod assembler;
pub mod credentials;
pub mod database;
pub mod fbr_client;
pub mod metrics;
pub mod normalizer;
pub mod orchestrator;
pub mod reconciler;
pub mod store;

pub use assembler::{InvoiceAssembler, InvoicePayload};
pub use credentials::resolve_token;
pub use database::Database;
pub use fbr_client::{FbrClient, RawResponse};
pub use metrics::{get_metrics, init_metrics};
pub use orchestrator::{SubmissionError, SubmissionPipeline};
pub use reconciler::ReconciliationUpdate;
pub use store::InvoiceStore;
