//! Reconciliation of normalized outcomes onto stored invoices.

use crate::models::{Classification, InvoiceItem, InvoiceStatus, SubmissionOutcome};
use uuid::Uuid;

/// State changes for one invoice, applied by the store in a single transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationUpdate {
    pub invoice_id: Uuid,
    pub status: InvoiceStatus,
    pub error: Option<String>,
    /// Only ever `Some` for a submitted invoice. `None` leaves the column alone.
    pub fbr_invoice_number: Option<String>,
    /// Clear annotations left on the items by earlier attempts.
    pub clear_item_errors: bool,
    pub item_errors: Vec<(Uuid, String)>,
}

impl ReconciliationUpdate {
    /// Plan the write for an outcome whose item errors were already correlated.
    pub fn from_outcome(outcome: &SubmissionOutcome) -> Self {
        match outcome.classification {
            Classification::Submitted => Self {
                invoice_id: outcome.invoice_id,
                status: InvoiceStatus::Submitted,
                error: None,
                fbr_invoice_number: outcome.fbr_invoice_number.clone(),
                clear_item_errors: true,
                item_errors: Vec::new(),
            },
            Classification::Invalid => Self {
                invoice_id: outcome.invoice_id,
                status: InvoiceStatus::Invalid,
                error: Some(
                    outcome
                        .error
                        .clone()
                        .unwrap_or_else(|| "One or more items were rejected by FBR".to_string()),
                ),
                fbr_invoice_number: None,
                clear_item_errors: true,
                item_errors: outcome
                    .item_errors
                    .iter()
                    .filter_map(|e| {
                        let message = e
                            .error
                            .clone()
                            .or_else(|| e.status.clone())
                            .unwrap_or_else(|| "Rejected by FBR".to_string());
                        e.item_id.map(|id| (id, message))
                    })
                    .collect(),
            },
            Classification::Error => Self::error(
                outcome.invoice_id,
                outcome
                    .error
                    .clone()
                    .unwrap_or_else(|| format!("FBR status {}", outcome.status_code)),
            ),
        }
    }

    /// Error marker for a failure with no item information.
    pub fn error(invoice_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            invoice_id,
            status: InvoiceStatus::Error,
            error: Some(message.into()),
            fbr_invoice_number: None,
            clear_item_errors: false,
            item_errors: Vec::new(),
        }
    }
}

/// Map FBR's per-item results onto local items by position.
///
/// `items` must be in the order they were submitted in. A serial number that
/// disagrees with the position is only logged.
#[tracing::instrument(
    skip(outcome, items),
    fields(invoice_id = %outcome.invoice_id, items = items.len())
)]
pub fn correlate_items(outcome: &mut SubmissionOutcome, items: &[InvoiceItem]) {
    for item_error in &mut outcome.item_errors {
        item_error.item_id = items.get(item_error.item_index).map(|item| item.item_id);

        if item_error.item_id.is_none() {
            tracing::warn!(
                invoice_id = %outcome.invoice_id,
                item_index = item_error.item_index,
                submitted_items = items.len(),
                "FBR reported an item beyond the submitted items"
            );
            continue;
        }

        let serial = item_error
            .item_s_no
            .as_deref()
            .and_then(|s| s.trim().parse::<usize>().ok());
        if let Some(serial) = serial {
            if serial != item_error.item_index + 1 {
                tracing::warn!(
                    invoice_id = %outcome.invoice_id,
                    item_index = item_error.item_index,
                    item_s_no = serial,
                    "FBR item serial disagrees with position, using position"
                );
            }
        }
    }
}
