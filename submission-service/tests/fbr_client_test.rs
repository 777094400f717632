//! FBR client integration tests against a mock FBR gateway.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use secrecy::Secret;
use std::time::Duration;
use submission_service::config::FbrConfig;
use submission_service::models::{Environment, Invoice, Seller};
use submission_service::services::{FbrClient, InvoiceAssembler, InvoicePayload};
use uuid::Uuid;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn payload() -> InvoicePayload {
    let seller = Seller {
        seller_id: Uuid::new_v4(),
        seller_code: None,
        business_name: Some("Seller Traders".to_string()),
        ntn_cnic: Some("7654321".to_string()),
        province: Some("Punjab".to_string()),
        address1: Some("Lahore".to_string()),
        address2: None,
        city: None,
        fbr_sandbox_token: None,
        fbr_prod_token: None,
        is_active: true,
        created_utc: Utc::now(),
    };
    let invoice = Invoice {
        invoice_id: Uuid::new_v4(),
        seller_id: seller.seller_id,
        invoice_type: "Sale Invoice".to_string(),
        invoice_date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        buyer_ntn_cnic: "1000000000000".to_string(),
        buyer_business_name: "Buyer Ltd".to_string(),
        buyer_province: "Sindh".to_string(),
        buyer_address: "Karachi".to_string(),
        buyer_registration_type: "Registered".to_string(),
        invoice_ref_no: "INV-1".to_string(),
        scenario_id: Some("SN001".to_string()),
        total_amount: Decimal::ZERO,
        status: "pending".to_string(),
        fbr_invoice_number: None,
        error: None,
        created_utc: Utc::now(),
        updated_utc: Utc::now(),
    };
    InvoiceAssembler::default().assemble(&invoice, &seller, &[], Environment::Sandbox)
}

fn client(base_url: &str, timeout: Option<Duration>) -> FbrClient {
    FbrClient::new(FbrConfig {
        base_url: base_url.to_string(),
        timeout,
        ..FbrConfig::default()
    })
    .unwrap()
}

#[tokio::test]
async fn posts_to_environment_path_with_bearer_token() {
    let fbr = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/postinvoicedata_sb"))
        .and(header("authorization", "Bearer sb-token"))
        .and(header("content-type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .expect(1)
        .mount(&fbr)
        .await;
    Mock::given(method("POST"))
        .and(path("/postinvoicedata"))
        .and(header("authorization", "Bearer prod-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string("prod"))
        .expect(1)
        .mount(&fbr)
        .await;

    let client = client(&fbr.uri(), None);
    let payload = payload();

    let sandbox = client
        .submit(&payload, &Secret::new("sb-token".to_string()), Environment::Sandbox)
        .await
        .unwrap();
    assert_eq!(sandbox.status, 200);
    assert_eq!(sandbox.body, r#"{"ok":true}"#);

    let production = client
        .submit(
            &payload,
            &Secret::new("prod-token".to_string()),
            Environment::Production,
        )
        .await
        .unwrap();
    assert_eq!(production.body, "prod");
}

#[tokio::test]
async fn error_statuses_are_returned_verbatim() {
    let fbr = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/postinvoicedata_sb"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>upstream exploded"))
        .mount(&fbr)
        .await;

    let response = client(&fbr.uri(), None)
        .submit(&payload(), &Secret::new(String::new()), Environment::Sandbox)
        .await
        .unwrap();

    assert_eq!(response.status, 500);
    assert_eq!(response.body, "<html>upstream exploded");
}

#[tokio::test]
async fn timeout_is_a_transport_error() {
    let fbr = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .mount(&fbr)
        .await;

    let result = client(&fbr.uri(), Some(Duration::from_millis(200)))
        .submit(&payload(), &Secret::new("t".to_string()), Environment::Sandbox)
        .await;

    assert!(result.unwrap_err().is_timeout());
}

#[tokio::test]
async fn unreachable_gateway_is_a_transport_error() {
    // Nothing listens on the discard port.
    let result = client("http://127.0.0.1:9", Some(Duration::from_secs(2)))
        .submit(&payload(), &Secret::new("t".to_string()), Environment::Production)
        .await;

    assert!(result.is_err());
}
