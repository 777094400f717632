//! Bearer credential selection.

use crate::models::{Environment, Seller};
use secrecy::Secret;

/// Pick the seller's FBR token for `environment`.
///
/// An unset token resolves to an empty secret rather than an error: FBR rejects
/// the call and the failure is recorded like any other remote rejection.
#[tracing::instrument(skip(seller), fields(seller_id = %seller.seller_id))]
pub fn resolve_token(seller: &Seller, environment: Environment) -> Secret<String> {
    let token = match environment {
        Environment::Sandbox => seller.fbr_sandbox_token.as_deref(),
        Environment::Production => seller.fbr_prod_token.as_deref(),
    }
    .unwrap_or_default()
    .trim();

    if token.is_empty() {
        tracing::warn!(
            seller_id = %seller.seller_id,
            environment = %environment,
            "Seller has no FBR token for this environment"
        );
    }

    Secret::new(token.to_string())
}
