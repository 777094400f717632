//! Invoice model for submission-service.

use super::invoice_item::NewInvoiceItem;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Invoice lifecycle status.
///
/// The submission pipeline only ever moves an invoice to `Submitted`, `Invalid`
/// or `Error`; every other status is set by CRUD paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Valid,
    Submitted,
    Invalid,
    Error,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Valid => "valid",
            InvoiceStatus::Submitted => "submitted",
            InvoiceStatus::Invalid => "invalid",
            InvoiceStatus::Error => "error",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "valid" => InvoiceStatus::Valid,
            "submitted" => InvoiceStatus::Submitted,
            "invalid" => InvoiceStatus::Invalid,
            "error" => InvoiceStatus::Error,
            _ => InvoiceStatus::Pending,
        }
    }
}

/// Invoice header as stored for one seller in one environment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub invoice_id: Uuid,
    pub seller_id: Uuid,
    pub invoice_type: String,
    pub invoice_date: NaiveDate,
    #[serde(rename = "buyerNTNCNIC")]
    pub buyer_ntn_cnic: String,
    pub buyer_business_name: String,
    pub buyer_province: String,
    pub buyer_address: String,
    pub buyer_registration_type: String,
    pub invoice_ref_no: String,
    pub scenario_id: Option<String>,
    pub total_amount: Decimal,
    pub status: String,
    pub fbr_invoice_number: Option<String>,
    pub error: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl Invoice {
    pub fn status(&self) -> InvoiceStatus {
        InvoiceStatus::from_string(&self.status)
    }
}

/// Input for creating a pending invoice with its items.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoice {
    #[validate(length(min = 1, max = 50, message = "Invoice type is required"))]
    pub invoice_type: String,
    pub invoice_date: NaiveDate,
    #[serde(rename = "buyerNTNCNIC")]
    #[validate(length(min = 1, max = 20, message = "Buyer NTN/CNIC is required"))]
    pub buyer_ntn_cnic: String,
    #[validate(length(min = 1, max = 191, message = "Buyer business name is required"))]
    pub buyer_business_name: String,
    #[validate(length(min = 1, max = 50, message = "Buyer province is required"))]
    pub buyer_province: String,
    #[validate(length(min = 1, message = "Buyer address is required"))]
    pub buyer_address: String,
    #[validate(length(min = 1, max = 20, message = "Buyer registration type is required"))]
    pub buyer_registration_type: String,
    #[validate(length(min = 1, max = 50, message = "Invoice reference number is required"))]
    pub invoice_ref_no: String,
    pub scenario_id: Option<String>,
    #[validate(length(min = 1, message = "An invoice needs at least one item"), nested)]
    pub items: Vec<NewInvoiceItem>,
}

impl NewInvoice {
    /// Invoice total: the sum of item gross values, absent values counting as zero.
    pub fn total_amount(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| item.total_values.unwrap_or_default())
            .sum()
    }
}
