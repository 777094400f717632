//! FBR digital invoicing HTTP client.
//!
//! Posts assembled invoices and hands back whatever came over the wire. HTTP
//! error statuses are not failures here: FBR reports business rejections with
//! 4xx/5xx and sometimes with bodies that are not valid JSON, so interpreting
//! the answer is left to the normalizer.

use crate::config::FbrConfig;
use crate::models::Environment;
use crate::services::assembler::InvoicePayload;
use crate::services::metrics::FBR_REQUEST_DURATION;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use tracing::instrument;

/// Unparsed FBR answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Clone)]
pub struct FbrClient {
    client: Client,
    config: FbrConfig,
}

impl FbrClient {
    pub fn new(config: FbrConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            config,
        })
    }

    /// Full URL of the submission endpoint for `environment`.
    pub fn endpoint(&self, environment: Environment) -> String {
        let path = match environment {
            Environment::Sandbox => &self.config.sandbox_path,
            Environment::Production => &self.config.production_path,
        };
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Post one invoice. Only transport failures (connect, DNS, timeout, reading
    /// the body) are returned as errors.
    #[instrument(
        skip(self, payload, token),
        fields(environment = %environment, invoice_ref_no = %payload.invoice_ref_no)
    )]
    pub async fn submit(
        &self,
        payload: &InvoicePayload,
        token: &Secret<String>,
        environment: Environment,
    ) -> Result<RawResponse, reqwest::Error> {
        let url = self.endpoint(environment);
        let timer = FBR_REQUEST_DURATION
            .with_label_values(&[environment.as_str()])
            .start_timer();

        let result = self.post(&url, payload, token).await;
        timer.observe_duration();

        let response = result?;
        tracing::debug!(
            status = response.status,
            body = %response.body,
            "FBR postinvoicedata response"
        );
        Ok(response)
    }

    async fn post(
        &self,
        url: &str,
        payload: &InvoicePayload,
        token: &Secret<String>,
    ) -> Result<RawResponse, reqwest::Error> {
        let response = self
            .client
            .post(url)
            .bearer_auth(token.expose_secret())
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}
