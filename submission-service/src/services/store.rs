//! Persistence seam used by the submission pipeline and the HTTP handlers.

use crate::models::{Environment, Invoice, InvoiceItem, NewInvoice, Seller};
use crate::services::reconciler::ReconciliationUpdate;
use async_trait::async_trait;
use service_core::error::AppError;
use uuid::Uuid;

/// Invoice, item and seller storage.
///
/// Every invoice operation is scoped to one seller in one environment; an id
/// owned by another seller behaves as if it did not exist.
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// Batch lookup in request order. Unknown ids are dropped.
    async fn find_invoices(
        &self,
        environment: Environment,
        seller_id: Uuid,
        invoice_ids: &[Uuid],
    ) -> Result<Vec<Invoice>, AppError>;

    /// Most recent invoices first.
    async fn list_invoices(
        &self,
        environment: Environment,
        seller_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Invoice>, AppError>;

    async fn get_invoice(
        &self,
        environment: Environment,
        seller_id: Uuid,
        invoice_id: Uuid,
    ) -> Result<Option<Invoice>, AppError>;

    /// Items in submission order.
    async fn get_items(
        &self,
        environment: Environment,
        invoice_id: Uuid,
    ) -> Result<Vec<InvoiceItem>, AppError>;

    async fn get_seller(&self, seller_id: Uuid) -> Result<Option<Seller>, AppError>;

    /// Which of `reference_numbers` the seller already used.
    async fn existing_reference_numbers(
        &self,
        environment: Environment,
        seller_id: Uuid,
        reference_numbers: &[String],
    ) -> Result<Vec<String>, AppError>;

    /// Insert pending invoices with their items, all or nothing.
    async fn create_invoices(
        &self,
        environment: Environment,
        seller_id: Uuid,
        drafts: &[NewInvoice],
    ) -> Result<Vec<Invoice>, AppError>;

    /// Apply an invoice header update and its item annotations atomically.
    async fn apply_reconciliation(
        &self,
        environment: Environment,
        update: &ReconciliationUpdate,
    ) -> Result<(), AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}
