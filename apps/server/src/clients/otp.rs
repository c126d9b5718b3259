//! OTP service client: generate a one-time code bound to a workflow task
//! and validate it on confirmation.

use crate::{config::OtpConfig, Error, Result};
use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const TYPE_PHONE: &str = "PHONE";

/// A generated one-time code. `value` echoes the phone number, `code` is
/// empty when the upstream withheld it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Otp {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,

    #[serde(rename = "expiresAt", skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,

    #[serde(rename = "attemptsCount", default)]
    pub attempts_count: u32,

    #[serde(rename = "maxAttemptsCount", default)]
    pub max_attempts_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidateOtp {
    pub code: String,
    pub value: String,
    #[serde(rename = "processID")]
    pub process_id: String,
}

#[async_trait]
pub trait OtpService: Send + Sync {
    /// Issue a code for `phone`, bound to the workflow via `process_id`
    /// (the task id).
    async fn generate_by_phone(&self, phone: &str, process_id: &str) -> Result<Otp>;

    /// Check a code previously issued with the same value/process pair.
    async fn validate(&self, params: &ValidateOtp) -> Result<()>;
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    #[serde(rename = "type")]
    type_: &'static str,
    value: &'a str,
    #[serde(rename = "processID")]
    process_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    data: Otp,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    error: ErrorBody,
}

#[derive(Debug, Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// HTTP implementation; the configured per-call timeout bounds each request
/// on top of the caller's deadline.
#[derive(Clone)]
pub struct OtpClient {
    client: Client,
    base_url: String,
}

impl OtpClient {
    pub fn new(config: &OtpConfig) -> Self {
        let mut builder = Client::builder();
        if config.request_timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_seconds));
        }
        Self {
            // Building a default client cannot fail with these options.
            client: builder.build().unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = match response.json::<ErrorResponse>().await {
            Ok(payload) if !payload.error.message.is_empty() => {
                format!("otp service error: {}", payload.error.message)
            }
            _ => format!("otp service error. Code: {status}"),
        };

        let status =
            StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Err(Error::from_upstream_status(status, message))
    }
}

#[async_trait]
impl OtpService for OtpClient {
    async fn generate_by_phone(&self, phone: &str, process_id: &str) -> Result<Otp> {
        let response = self
            .client
            .post(format!("{}/generate", self.base_url))
            .json(&GenerateRequest {
                type_: TYPE_PHONE,
                value: phone,
                process_id,
            })
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("invalid otp response: {e}")))?;

        Ok(body.data)
    }

    async fn validate(&self, params: &ValidateOtp) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/validate", self.base_url))
            .json(params)
            .send()
            .await?;

        Self::check_status(response).await?;
        Ok(())
    }
}
