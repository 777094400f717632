//! FBR environment selection.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which FBR system receives a submission.
///
/// The flag belongs to the seller's account; the identity provider forwards it on
/// every request. Parsing is case-insensitive because upstream systems disagree
/// on `Sandbox` vs `sandbox`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Sandbox,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Sandbox => "sandbox",
            Environment::Production => "production",
        }
    }

    /// Table holding invoice headers for this environment.
    pub fn invoice_table(&self) -> &'static str {
        match self {
            Environment::Sandbox => "sandbox_invoices",
            Environment::Production => "invoices",
        }
    }

    /// Table holding invoice line items for this environment.
    pub fn item_table(&self) -> &'static str {
        match self {
            Environment::Sandbox => "sandbox_invoice_items",
            Environment::Production => "invoice_items",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown FBR environment '{0}', expected 'sandbox' or 'production'")]
pub struct UnknownEnvironment(pub String);

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("sandbox") {
            Ok(Environment::Sandbox)
        } else if trimmed.eq_ignore_ascii_case("production")
            || trimmed.eq_ignore_ascii_case("prod")
        {
            Ok(Environment::Production)
        } else {
            Err(UnknownEnvironment(s.to_string()))
        }
    }
}
