//! FBR response normalization.
//!
//! Turns whatever FBR returned into a [`SubmissionOutcome`]. Decoding runs in
//! three stages: strict JSON, pattern salvage of the fields that matter, and a
//! synthetic error outcome. None of them can fail.
//!
//! Classification, first match wins:
//!
//! | condition                                          | outcome   |
//! |----------------------------------------------------|-----------|
//! | `statusCode == "01"` or `status` is `invalid`      | Invalid   |
//! | `statusCode == "00"` and `status == "Valid"`       | Submitted |
//! | anything else                                      | Error     |

use crate::models::{
    Classification, ItemError, SubmissionOutcome, ERROR_CODE_MALFORMED_RESPONSE,
    ERROR_CODE_MISSING_INVOICE_NUMBER, STATUS_CODE_ERROR, STATUS_CODE_INVALID, STATUS_CODE_VALID,
};
use crate::services::fbr_client::RawResponse;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

static ERROR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""error"\s*:\s*"([^"]*)"#).expect("valid error pattern"));
static STATUS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""status"\s*:\s*"([^"]*)""#).expect("valid status pattern"));
static STATUS_CODE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""statusCode"\s*:\s*"?(\d+)"#).expect("valid statusCode pattern")
});

/// Normalize a raw FBR answer, using the HTTP status as the message of an
/// error outcome that carries none.
#[tracing::instrument(
    skip(invoice_id, response),
    fields(invoice_id = %invoice_id, http_status = response.status)
)]
pub fn normalize_response(invoice_id: Uuid, response: &RawResponse) -> SubmissionOutcome {
    let mut outcome = normalize(invoice_id, &response.body);

    if outcome.classification == Classification::Error && outcome.error.is_none() {
        outcome.error = Some(format!("FBR responded with HTTP {}", response.status));
    }

    if outcome.classification == Classification::Error {
        tracing::warn!(
            invoice_id = %invoice_id,
            http_status = response.status,
            status = %outcome.status,
            status_code = %outcome.status_code,
            body = %response.body,
            "FBR submission did not succeed"
        );
    }

    outcome
}

/// Normalize a response body.
pub fn normalize(invoice_id: Uuid, body: &str) -> SubmissionOutcome {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => normalize_value(invoice_id, &value),
        Err(e) => {
            tracing::warn!(
                invoice_id = %invoice_id,
                error = %e,
                body = %body,
                "FBR response is not valid JSON, salvaging"
            );
            salvage(invoice_id, body)
        }
    }
}

/// Normalize an already decoded response.
pub fn normalize_value(invoice_id: Uuid, value: &Value) -> SubmissionOutcome {
    let validation = value.get("validationResponse").filter(|v| v.is_object());
    let field = |name: &str| validation.and_then(|v| text(v.get(name)));

    let status = field("status");
    let status_code = field("statusCode");
    let error = field("error");
    let error_code = field("errorCode");
    let invoice_statuses: &[Value] = validation
        .and_then(|v| v.get("invoiceStatuses"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    if is_invalid(status_code.as_deref(), status.as_deref()) {
        return SubmissionOutcome {
            invoice_id,
            classification: Classification::Invalid,
            status: status.unwrap_or_else(|| "Invalid".to_string()),
            status_code: status_code.unwrap_or_else(|| STATUS_CODE_INVALID.to_string()),
            error,
            error_code,
            fbr_invoice_number: None,
            item_errors: item_errors(invoice_statuses),
        };
    }

    if status_code.as_deref() == Some(STATUS_CODE_VALID) && status.as_deref() == Some("Valid") {
        let invoice_number = invoice_statuses
            .first()
            .and_then(|entry| text(entry.get("invoiceNo")))
            .or_else(|| text(value.get("invoiceNumber")));

        return match invoice_number {
            Some(number) => SubmissionOutcome {
                invoice_id,
                classification: Classification::Submitted,
                status: "Valid".to_string(),
                status_code: STATUS_CODE_VALID.to_string(),
                error: None,
                error_code: None,
                fbr_invoice_number: Some(number),
                item_errors: Vec::new(),
            },
            None => SubmissionOutcome::failed(
                invoice_id,
                ERROR_CODE_MISSING_INVOICE_NUMBER,
                "FBR accepted the invoice but returned no invoice number",
            ),
        };
    }

    SubmissionOutcome {
        invoice_id,
        classification: Classification::Error,
        status: status.unwrap_or_else(|| "Unknown".to_string()),
        status_code: status_code.unwrap_or_else(|| STATUS_CODE_ERROR.to_string()),
        error,
        error_code,
        fbr_invoice_number: None,
        item_errors: Vec::new(),
    }
}

fn is_invalid(status_code: Option<&str>, status: Option<&str>) -> bool {
    status_code == Some(STATUS_CODE_INVALID)
        || status.is_some_and(|s| s.trim().eq_ignore_ascii_case("invalid"))
}

/// Rejected entries of `invoiceStatuses`, keyed by their array position.
fn item_errors(invoice_statuses: &[Value]) -> Vec<ItemError> {
    invoice_statuses
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let status = text(entry.get("status"));
            let status_code = text(entry.get("statusCode"));
            if !is_invalid(status_code.as_deref(), status.as_deref()) {
                return None;
            }
            Some(ItemError {
                item_index: index,
                item_s_no: text(entry.get("itemSNo")),
                item_id: None,
                status,
                status_code,
                error: text(entry.get("error")),
                error_code: text(entry.get("errorCode")),
            })
        })
        .collect()
}

fn salvage(invoice_id: Uuid, body: &str) -> SubmissionOutcome {
    let capture = |pattern: &Regex| {
        pattern
            .captures(body)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let error = capture(&ERROR_PATTERN);
    let status = capture(&STATUS_PATTERN);
    let status_code = capture(&STATUS_CODE_PATTERN);

    let mut message = String::from("Malformed response from FBR");
    let reported: Vec<String> = [("status", status), ("statusCode", status_code)]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| format!("{}: {}", name, v)))
        .collect();
    if !reported.is_empty() {
        message.push_str(&format!(" ({})", reported.join(", ")));
    }
    if let Some(error) = error {
        message.push_str(&format!(": {}", error));
    }

    SubmissionOutcome::failed(invoice_id, ERROR_CODE_MALFORMED_RESPONSE, message)
}

/// Field as text. FBR sends codes as strings but numbers have been seen.
fn text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
