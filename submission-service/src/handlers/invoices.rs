use crate::middleware::CallerContext;
use crate::models::{Invoice, InvoiceItem, NewInvoice};
use crate::startup::AppState;
use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use service_core::response::ApiResponse;
use std::collections::BTreeSet;
use uuid::Uuid;
use validator::Validate;

const LIST_LIMIT: i64 = 50;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateInvoicesRequest {
    #[validate(
        length(min = 1, max = 100, message = "Between 1 and 100 invoices are required"),
        nested
    )]
    pub invoices: Vec<NewInvoice>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
}

/// Reference numbers that appear more than once in `drafts`.
fn repeated_reference_numbers(drafts: &[NewInvoice]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut repeated = BTreeSet::new();
    for draft in drafts {
        if !seen.insert(draft.invoice_ref_no.as_str()) {
            repeated.insert(draft.invoice_ref_no.clone());
        }
    }
    repeated.into_iter().collect()
}

/// Create pending invoices. Reference numbers must be unused by the seller.
#[tracing::instrument(
    skip(state, caller, request),
    fields(
        user_id = %caller.user_id,
        role = caller.role.as_deref().unwrap_or("unknown"),
        seller_id = %caller.seller_id,
        environment = %caller.environment
    )
)]
pub async fn create_invoices(
    State(state): State<AppState>,
    caller: CallerContext,
    Json(request): Json<CreateInvoicesRequest>,
) -> Result<ApiResponse<Vec<Invoice>>, AppError> {
    request.validate()?;

    let repeated = repeated_reference_numbers(&request.invoices);
    if !repeated.is_empty() {
        return Err(AppError::Conflict(anyhow::anyhow!(
            "Duplicate invoice reference numbers in request: {}",
            repeated.join(", ")
        )));
    }

    let reference_numbers: Vec<String> = request
        .invoices
        .iter()
        .map(|d| d.invoice_ref_no.clone())
        .collect();
    let mut existing = state
        .store
        .existing_reference_numbers(caller.environment, caller.seller_id, &reference_numbers)
        .await?;
    if !existing.is_empty() {
        existing.sort();
        return Err(AppError::Conflict(anyhow::anyhow!(
            "Invoice reference numbers already exist: {}",
            existing.join(", ")
        )));
    }

    let created = state
        .store
        .create_invoices(caller.environment, caller.seller_id, &request.invoices)
        .await?;

    let message = format!("Created {} invoices", created.len());
    Ok(ApiResponse::created(created, message))
}

#[tracing::instrument(skip(state, caller), fields(seller_id = %caller.seller_id))]
pub async fn list_invoices(
    State(state): State<AppState>,
    caller: CallerContext,
) -> Result<ApiResponse<Vec<Invoice>>, AppError> {
    let invoices = state
        .store
        .list_invoices(caller.environment, caller.seller_id, LIST_LIMIT)
        .await?;

    Ok(ApiResponse::ok(invoices, "Invoices retrieved"))
}

#[tracing::instrument(skip(state, caller), fields(seller_id = %caller.seller_id))]
pub async fn get_invoice(
    State(state): State<AppState>,
    caller: CallerContext,
    Path(invoice_id): Path<Uuid>,
) -> Result<ApiResponse<InvoiceDetail>, AppError> {
    let invoice = state
        .store
        .get_invoice(caller.environment, caller.seller_id, invoice_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Invoice not found: {}", invoice_id)))?;

    let items = state.store.get_items(caller.environment, invoice_id).await?;

    Ok(ApiResponse::ok(
        InvoiceDetail { invoice, items },
        "Invoice retrieved",
    ))
}
