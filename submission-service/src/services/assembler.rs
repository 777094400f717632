//! Projection of stored invoices into the FBR digital invoicing wire schema.

use crate::models::{Environment, Invoice, InvoiceItem, Seller};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

/// Body of `POST /postinvoicedata[_sb]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePayload {
    pub invoice_type: String,
    /// `yyyy-MM-dd`
    pub invoice_date: String,
    #[serde(rename = "sellerNTNCNIC")]
    pub seller_ntn_cnic: String,
    pub seller_business_name: String,
    pub seller_province: String,
    pub seller_address: String,
    #[serde(rename = "buyerNTNCNIC")]
    pub buyer_ntn_cnic: String,
    pub buyer_business_name: String,
    pub buyer_province: String,
    pub buyer_address: String,
    pub buyer_registration_type: String,
    pub invoice_ref_no: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<String>,
    pub items: Vec<ItemPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    pub hs_code: String,
    pub product_description: String,
    pub rate: String,
    #[serde(rename = "uoM")]
    pub uom: String,
    pub quantity: f64,
    pub total_values: f64,
    #[serde(rename = "valueSalesExcludingST")]
    pub value_sales_excluding_st: f64,
    pub fixed_notified_value_or_retail_price: f64,
    pub sales_tax_applicable: f64,
    pub sales_tax_withheld_at_source: f64,
    pub extra_tax: f64,
    pub further_tax: f64,
    pub fed_payable: f64,
    pub discount: f64,
    pub sale_type: String,
    pub sro_schedule_no: String,
    pub sro_item_serial_no: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InvoiceAssembler {
    include_scenario_in_production: bool,
}

impl InvoiceAssembler {
    pub fn new(include_scenario_in_production: bool) -> Self {
        Self {
            include_scenario_in_production,
        }
    }

    /// Build the payload for one invoice.
    ///
    /// `items` must already be in stored order: FBR reports item results by
    /// position and the reconciler maps them back the same way.
    #[tracing::instrument(
        skip(self, invoice, seller, items),
        fields(invoice_id = %invoice.invoice_id, items = items.len())
    )]
    pub fn assemble(
        &self,
        invoice: &Invoice,
        seller: &Seller,
        items: &[InvoiceItem],
        environment: Environment,
    ) -> InvoicePayload {
        let scenario_id = match environment {
            Environment::Sandbox => invoice.scenario_id.clone(),
            Environment::Production if self.include_scenario_in_production => {
                invoice.scenario_id.clone()
            }
            Environment::Production => None,
        }
        .filter(|s| !s.trim().is_empty());

        InvoicePayload {
            invoice_type: invoice.invoice_type.clone(),
            invoice_date: invoice.invoice_date.format("%Y-%m-%d").to_string(),
            seller_ntn_cnic: seller.ntn_cnic.clone().unwrap_or_default(),
            seller_business_name: seller.business_name.clone().unwrap_or_default(),
            seller_province: seller.province.clone().unwrap_or_default(),
            seller_address: seller.postal_address(),
            buyer_ntn_cnic: invoice.buyer_ntn_cnic.clone(),
            buyer_business_name: invoice.buyer_business_name.clone(),
            buyer_province: invoice.buyer_province.clone(),
            buyer_address: invoice.buyer_address.clone(),
            buyer_registration_type: invoice.buyer_registration_type.clone(),
            invoice_ref_no: invoice.invoice_ref_no.clone(),
            scenario_id,
            items: items.iter().map(item_payload).collect(),
        }
    }
}

fn item_payload(item: &InvoiceItem) -> ItemPayload {
    ItemPayload {
        hs_code: item.hs_code.clone(),
        product_description: item.product_description.clone(),
        rate: item.rate.clone(),
        uom: item.uom.clone(),
        quantity: number(item.quantity),
        total_values: number(item.total_values),
        value_sales_excluding_st: number(item.value_sales_excluding_st),
        fixed_notified_value_or_retail_price: number(item.fixed_notified_value_or_retail_price),
        sales_tax_applicable: number(item.sales_tax_applicable),
        sales_tax_withheld_at_source: number(item.sales_tax_withheld_at_source),
        extra_tax: number(item.extra_tax),
        further_tax: number(item.further_tax),
        fed_payable: number(item.fed_payable),
        discount: number(item.discount),
        sale_type: item.sale_type.clone(),
        sro_schedule_no: item.sro_schedule_no.clone().unwrap_or_default(),
        sro_item_serial_no: item.sro_item_serial_no.clone().unwrap_or_default(),
    }
}

/// Absent or unrepresentable amounts go out as zero.
fn number(value: Option<Decimal>) -> f64 {
    value.and_then(|d| d.to_f64()).unwrap_or(0.0)
}
