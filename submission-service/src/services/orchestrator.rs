//! Batch submission driver.
//!
//! Invoices in a batch are submitted one at a time. Every found invoice ends in
//! exactly one outcome; a failure on one invoice never stops the rest. Only the
//! batch lookup that runs before the loop can fail the whole request.

use crate::models::{
    Environment, Invoice, SubmissionOutcome, ERROR_CODE_LOCAL, ERROR_CODE_PERSISTENCE,
    ERROR_CODE_TRANSPORT,
};
use crate::services::assembler::InvoiceAssembler;
use crate::services::credentials::resolve_token;
use crate::services::fbr_client::FbrClient;
use crate::services::metrics::{record_error, record_outcome};
use crate::services::normalizer::normalize_response;
use crate::services::reconciler::{correlate_items, ReconciliationUpdate};
use crate::services::store::InvoiceStore;
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Per-invoice failure that produced no usable FBR answer.
#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("Seller {0} not found")]
    SellerNotFound(Uuid),

    #[error("Failed to reach FBR: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Local failure: {0}")]
    Store(#[from] AppError),
}

impl SubmissionError {
    pub fn error_code(&self) -> &'static str {
        match self {
            SubmissionError::Transport(_) => ERROR_CODE_TRANSPORT,
            SubmissionError::SellerNotFound(_) | SubmissionError::Store(_) => ERROR_CODE_LOCAL,
        }
    }

    fn metric_label(&self) -> &'static str {
        match self {
            SubmissionError::SellerNotFound(_) => "seller_not_found",
            SubmissionError::Transport(_) => "transport",
            SubmissionError::Store(_) => "store",
        }
    }
}

#[derive(Clone)]
pub struct SubmissionPipeline {
    store: Arc<dyn InvoiceStore>,
    client: FbrClient,
    assembler: InvoiceAssembler,
}

impl SubmissionPipeline {
    pub fn new(
        store: Arc<dyn InvoiceStore>,
        client: FbrClient,
        assembler: InvoiceAssembler,
    ) -> Self {
        Self {
            store,
            client,
            assembler,
        }
    }

    /// Submit the seller's invoices in request order.
    ///
    /// Ids that do not resolve to one of the seller's invoices are left out of
    /// the result.
    #[instrument(
        skip(self, invoice_ids),
        fields(seller_id = %seller_id, environment = %environment, requested = invoice_ids.len())
    )]
    pub async fn submit_batch(
        &self,
        environment: Environment,
        seller_id: Uuid,
        invoice_ids: &[Uuid],
    ) -> Result<Vec<SubmissionOutcome>, AppError> {
        let invoices = self
            .store
            .find_invoices(environment, seller_id, invoice_ids)
            .await?;

        if invoices.len() < invoice_ids.len() {
            info!(
                found = invoices.len(),
                "Some requested invoices were not found and are skipped"
            );
        }

        let mut outcomes = Vec::with_capacity(invoices.len());
        for invoice in &invoices {
            let outcome = self.submit_invoice(environment, invoice).await;
            record_outcome(environment.as_str(), outcome.classification.as_str());
            outcomes.push(outcome);
        }

        info!(submitted = outcomes.len(), "Batch submission finished");

        Ok(outcomes)
    }

    #[instrument(
        skip(self, invoice),
        fields(invoice_id = %invoice.invoice_id, invoice_ref_no = %invoice.invoice_ref_no)
    )]
    async fn submit_invoice(
        &self,
        environment: Environment,
        invoice: &Invoice,
    ) -> SubmissionOutcome {
        match self.process(environment, invoice).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Invoice submission failed");
                record_error(e.metric_label());

                let outcome =
                    SubmissionOutcome::failed(invoice.invoice_id, e.error_code(), e.to_string());
                let update = ReconciliationUpdate::error(invoice.invoice_id, e.to_string());
                if let Err(write_err) =
                    self.store.apply_reconciliation(environment, &update).await
                {
                    error!(error = %write_err, "Failed to record submission error on invoice");
                    record_error("persistence");
                }
                outcome
            }
        }
    }

    async fn process(
        &self,
        environment: Environment,
        invoice: &Invoice,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let seller = self
            .store
            .get_seller(invoice.seller_id)
            .await?
            .ok_or(SubmissionError::SellerNotFound(invoice.seller_id))?;
        let items = self.store.get_items(environment, invoice.invoice_id).await?;

        let token = resolve_token(&seller, environment);
        let payload = self.assembler.assemble(invoice, &seller, &items, environment);
        let response = self.client.submit(&payload, &token, environment).await?;

        let mut outcome = normalize_response(invoice.invoice_id, &response);
        correlate_items(&mut outcome, &items);

        let update = ReconciliationUpdate::from_outcome(&outcome);
        if let Err(e) = self.store.apply_reconciliation(environment, &update).await {
            // The FBR answer is already known; an error-path write would fail the same way.
            error!(
                error = %e,
                classification = outcome.classification.as_str(),
                fbr_invoice_number = ?outcome.fbr_invoice_number,
                "Failed to persist FBR result"
            );
            record_error("persistence");
            return Ok(SubmissionOutcome::failed(
                invoice.invoice_id,
                ERROR_CODE_PERSISTENCE,
                persistence_message(&outcome),
            ));
        }

        if !outcome.item_errors.is_empty() {
            warn!(item_errors = outcome.item_errors.len(), "FBR rejected invoice items");
        }

        Ok(outcome)
    }
}

fn persistence_message(outcome: &SubmissionOutcome) -> String {
    match &outcome.fbr_invoice_number {
        Some(number) => format!(
            "FBR accepted the invoice as {} but the result could not be saved",
            number
        ),
        None => format!(
            "FBR answered with status {} ({}) but the result could not be saved",
            outcome.status, outcome.status_code
        ),
    }
}
