//! Seller model for submission-service.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Merchant profile. The pipeline only reads it.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Seller {
    pub seller_id: Uuid,
    pub seller_code: Option<String>,
    pub business_name: Option<String>,
    #[serde(rename = "ntnCnic")]
    pub ntn_cnic: Option<String>,
    pub province: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    #[serde(skip_serializing)]
    pub fbr_sandbox_token: Option<String>,
    #[serde(skip_serializing)]
    pub fbr_prod_token: Option<String>,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
}

impl Seller {
    /// Single-line postal address as FBR expects it.
    pub fn postal_address(&self) -> String {
        [&self.address1, &self.address2, &self.city]
            .into_iter()
            .filter_map(|part| part.as_deref().map(str::trim))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
