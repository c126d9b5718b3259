//! Request guards applied in front of the handlers.

use crate::Error;
use axum::{
    extract::Request,
    http::{header, Method},
    middleware::Next,
    response::Response,
};

/// POST bodies must be JSON (`application/json` or `application/fhir+json`).
pub async fn require_json_content_type(
    request: Request,
    next: Next,
) -> Result<Response, Error> {
    if request.method() == Method::POST {
        let content_type = request
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        let mime = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        if mime != "application/json" && mime != "application/fhir+json" {
            return Err(Error::BadParams(format!(
                "unsupported content type: {content_type}"
            )));
        }
    }

    Ok(next.run(request).await)
}
