use crate::middleware::CallerContext;
use crate::models::SubmissionOutcome;
use crate::startup::AppState;
use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use service_core::error::AppError;
use service_core::response::ApiResponse;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitInvoicesRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Between 1 and 100 invoice ids are required"
    ))]
    pub invoice_ids: Vec<Uuid>,
}

/// Submit a batch of the caller's invoices to FBR.
///
/// Responds 400 when any invoice was rejected by FBR or has rejected items, so
/// the caller knows to correct and resubmit; every outcome is returned either way.
#[tracing::instrument(
    skip(state, caller, request),
    fields(
        user_id = %caller.user_id,
        role = caller.role.as_deref().unwrap_or("unknown"),
        seller_id = %caller.seller_id,
        environment = %caller.environment
    )
)]
pub async fn submit_invoices(
    State(state): State<AppState>,
    caller: CallerContext,
    Json(request): Json<SubmitInvoicesRequest>,
) -> Result<ApiResponse<Vec<SubmissionOutcome>>, AppError> {
    request.validate()?;

    let outcomes = state
        .pipeline
        .submit_batch(caller.environment, caller.seller_id, &request.invoice_ids)
        .await?;

    let needs_correction = outcomes.iter().filter(|o| o.requires_correction()).count();
    if needs_correction > 0 {
        let message = format!(
            "{} of {} invoices need correction before resubmission",
            needs_correction,
            outcomes.len()
        );
        return Ok(ApiResponse::with_status(
            StatusCode::BAD_REQUEST,
            outcomes,
            message,
        ));
    }

    let message = format!("Processed {} invoices", outcomes.len());
    Ok(ApiResponse::ok(outcomes, message))
}
