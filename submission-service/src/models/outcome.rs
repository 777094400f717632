//! Normalized result of one FBR submission attempt.
//!
//! This is the only shape that leaves the response normalizer: the reconciliation
//! writer, the batch result and the HTTP response all read it, never the raw
//! FBR body.

use super::invoice::InvoiceStatus;
use serde::Serialize;
use uuid::Uuid;

pub const STATUS_CODE_VALID: &str = "00";
pub const STATUS_CODE_INVALID: &str = "01";
pub const STATUS_CODE_ERROR: &str = "99";

pub const ERROR_CODE_MALFORMED_RESPONSE: &str = "MALFORMED_RESPONSE";
pub const ERROR_CODE_MISSING_INVOICE_NUMBER: &str = "MISSING_INVOICE_NUMBER";
pub const ERROR_CODE_TRANSPORT: &str = "TRANSPORT_ERROR";
pub const ERROR_CODE_LOCAL: &str = "LOCAL_ERROR";
pub const ERROR_CODE_PERSISTENCE: &str = "PERSISTENCE_ERROR";

/// Coarse classification of a submission, named after the invoice status it leads to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Submitted,
    Invalid,
    Error,
}

impl Classification {
    pub fn invoice_status(&self) -> InvoiceStatus {
        match self {
            Classification::Submitted => InvoiceStatus::Submitted,
            Classification::Invalid => InvoiceStatus::Invalid,
            Classification::Error => InvoiceStatus::Error,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.invoice_status().as_str()
    }
}

/// Item-level rejection reported by FBR.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemError {
    /// Position in FBR's `invoiceStatuses` array, which follows submission order.
    pub item_index: usize,
    #[serde(rename = "itemSNo")]
    pub item_s_no: Option<String>,
    /// Local item at `item_index`; `None` when FBR reported more entries than were sent.
    pub item_id: Option<Uuid>,
    pub status: Option<String>,
    pub status_code: Option<String>,
    pub error: Option<String>,
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionOutcome {
    pub invoice_id: Uuid,
    #[serde(rename = "invoiceStatus")]
    pub classification: Classification,
    pub status: String,
    pub status_code: String,
    pub error: Option<String>,
    pub error_code: Option<String>,
    pub fbr_invoice_number: Option<String>,
    pub item_errors: Vec<ItemError>,
}

impl SubmissionOutcome {
    /// Error outcome for a failure that produced no usable FBR answer.
    pub fn failed(invoice_id: Uuid, error_code: &str, message: impl Into<String>) -> Self {
        Self {
            invoice_id,
            classification: Classification::Error,
            status: "Error".to_string(),
            status_code: STATUS_CODE_ERROR.to_string(),
            error: Some(message.into()),
            error_code: Some(error_code.to_string()),
            fbr_invoice_number: None,
            item_errors: Vec::new(),
        }
    }

    /// Whether this outcome turns the batch response into a 400.
    ///
    /// Error outcomes do not: transport and local faults are reported with 200.
    pub fn requires_correction(&self) -> bool {
        self.classification == Classification::Invalid || !self.item_errors.is_empty()
    }
}
