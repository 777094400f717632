//! Invoice line item model for submission-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// One taxable line of an invoice.
///
/// Monetary columns are nullable: rows imported from spreadsheets frequently
/// leave optional tax components blank. Only `error` changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub item_id: Uuid,
    pub invoice_id: Uuid,
    pub sort_order: i32,
    pub hs_code: String,
    pub product_description: String,
    /// Free text as entered, e.g. `18%` or `Exempt`.
    pub rate: String,
    #[serde(rename = "uoM")]
    pub uom: String,
    pub quantity: Option<Decimal>,
    pub total_values: Option<Decimal>,
    #[serde(rename = "valueSalesExcludingST")]
    pub value_sales_excluding_st: Option<Decimal>,
    pub fixed_notified_value_or_retail_price: Option<Decimal>,
    pub sales_tax_applicable: Option<Decimal>,
    pub sales_tax_withheld_at_source: Option<Decimal>,
    pub extra_tax: Option<Decimal>,
    pub further_tax: Option<Decimal>,
    pub fed_payable: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub sale_type: String,
    pub sro_schedule_no: Option<String>,
    pub sro_item_serial_no: Option<String>,
    pub error: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Input for one item of a new invoice. Items keep the order they are given in.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewInvoiceItem {
    #[validate(length(min = 1, max = 20, message = "HS code is required"))]
    pub hs_code: String,
    #[validate(length(min = 1, max = 500, message = "Product description is required"))]
    pub product_description: String,
    #[validate(length(min = 1, max = 20, message = "Rate is required"))]
    pub rate: String,
    #[serde(rename = "uoM")]
    #[validate(length(min = 1, max = 100, message = "Unit of measure is required"))]
    pub uom: String,
    pub quantity: Option<Decimal>,
    pub total_values: Option<Decimal>,
    #[serde(rename = "valueSalesExcludingST")]
    pub value_sales_excluding_st: Option<Decimal>,
    pub fixed_notified_value_or_retail_price: Option<Decimal>,
    pub sales_tax_applicable: Option<Decimal>,
    pub sales_tax_withheld_at_source: Option<Decimal>,
    pub extra_tax: Option<Decimal>,
    pub further_tax: Option<Decimal>,
    pub fed_payable: Option<Decimal>,
    pub discount: Option<Decimal>,
    #[validate(length(min = 1, max = 100, message = "Sale type is required"))]
    pub sale_type: String,
    pub sro_schedule_no: Option<String>,
    pub sro_item_serial_no: Option<String>,
}
