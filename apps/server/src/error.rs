//! Classified error values with HTTP mapping.
//!
//! Every engine step that can fail returns one of these kinds; callers never
//! recover, the failure travels unchanged to the HTTP layer which renders an
//! `OperationOutcome`. Validation errors optionally carry a field → message
//! payload that becomes one outcome issue per field.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sijil_models::{OperationOutcome, OperationOutcomeIssue};
use std::collections::BTreeMap;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed request surface (body, path parameters, content type).
    #[error("{0}")]
    BadParams(String),

    /// Business-rule or structural validation failure.
    #[error("{message}")]
    Validation {
        message: String,
        /// Field path → message, rendered as one issue per field.
        fields: BTreeMap<String, String>,
    },

    #[error("{0}")]
    NotExist(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Internal(String),
}

impl Error {
    /// Message-only validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Validation error carrying a field → message payload. The display
    /// message joins the pairs so logs and tests see the details too.
    pub fn validation_fields<K, V>(fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let fields: BTreeMap<String, String> = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let message = fields
            .iter()
            .map(|(k, v)| format!("{k}: {v}"))
            .collect::<Vec<_>>()
            .join("; ");
        Self::Validation { message, fields }
    }

    /// Map an upstream HTTP status onto an error kind, used by the outbound
    /// clients when a collaborator answers non-2xx.
    pub fn from_upstream_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::BAD_REQUEST => Self::BadParams(message),
            StatusCode::UNPROCESSABLE_ENTITY => Self::validation(message),
            StatusCode::NOT_FOUND => Self::NotExist(message),
            StatusCode::CONFLICT => Self::Conflict(message),
            StatusCode::FORBIDDEN => Self::Forbidden(message),
            StatusCode::UNAUTHORIZED => Self::Unauthorized(message),
            _ => Self::Internal(message),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadParams(_) => StatusCode::BAD_REQUEST,
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotExist(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    pub fn is_not_exist(&self) -> bool {
        matches!(self, Self::NotExist(_))
    }

    /// FHIR issue code derived from the HTTP status.
    fn issue_code(&self) -> &'static str {
        match self.status_code() {
            StatusCode::BAD_REQUEST => "invalid",
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => "security",
            StatusCode::NOT_FOUND => "not-found",
            StatusCode::CONFLICT => "conflict",
            StatusCode::UNPROCESSABLE_ENTITY => "processing",
            _ => "exception",
        }
    }

    fn to_outcome(&self) -> OperationOutcome {
        let code = self.issue_code();
        let issue = match self {
            Self::Validation { fields, .. } if !fields.is_empty() => fields
                .iter()
                .map(|(field, message)| OperationOutcomeIssue {
                    severity: "error".to_string(),
                    code: code.to_string(),
                    diagnostics: Some(message.clone()),
                    expression: vec![field.clone()],
                })
                .collect(),
            other => vec![OperationOutcomeIssue {
                severity: "error".to_string(),
                code: code.to_string(),
                diagnostics: Some(other.to_string()),
                expression: Vec::new(),
            }],
        };

        OperationOutcome {
            issue,
            ..OperationOutcome::default()
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, status = %status, "request rejected");
        }
        (status, Json(self.to_outcome())).into_response()
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("serialization failed: {err}"))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
