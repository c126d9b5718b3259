//! The six MPI endpoints. Each handler parses the `Parameters` body, guards
//! the request profile and dispatches into the workflow engine; every error
//! is rendered as an `OperationOutcome` by the error type.

use crate::{state::AppState, Error, Result};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sijil_models::{
    Parameters, PROFILE_PATIENT_CONFIRM_CREATE_REQUEST,
    PROFILE_PATIENT_CONFIRM_UPDATE_IDENTITY_REQUEST, PROFILE_PATIENT_CREATE_REQUEST,
    PROFILE_PATIENT_UPDATE_EMAIL_REQUEST, PROFILE_PATIENT_UPDATE_IDENTITY_REQUEST,
    PROFILE_PATIENT_UPDATE_REQUEST,
};

fn parse_body(body: &Bytes) -> Result<Parameters> {
    serde_json::from_slice(body).map_err(|e| Error::BadParams(e.to_string()))
}

fn require_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(Error::BadParams("empty id parameter".to_string()));
    }
    Ok(())
}

/// Transport-level profile guard; the engine separately checks the embedded
/// patient's profile against the request profile.
fn validate_request_profile(params: &Parameters, expected: &str) -> Result<()> {
    let meta = params
        .meta
        .as_ref()
        .ok_or_else(|| Error::validation_fields([("Parameters.meta", "value is required")]))?;

    if meta.profile.len() != 1 {
        return Err(Error::validation_fields([(
            "Parameters.meta.profile",
            "expected to have 1 value",
        )]));
    }

    if meta.profile[0] != expected {
        return Err(Error::validation_fields([(
            "Parameters.meta.profile[0]",
            "given profile is not supported",
        )]));
    }

    Ok(())
}

// (POST /Patient/$create-request)
pub async fn create_patient(State(state): State<AppState>, body: Bytes) -> Result<Response> {
    let params = parse_body(&body)?;
    validate_request_profile(&params, PROFILE_PATIENT_CREATE_REQUEST)?;

    let task = state.patient_service.create_patient(&params).await?;

    Ok((StatusCode::OK, Json(task)).into_response())
}

// (POST /Patient/$confirm-request)
pub async fn confirm_create_patient(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Response> {
    let params = parse_body(&body)?;
    validate_request_profile(&params, PROFILE_PATIENT_CONFIRM_CREATE_REQUEST)?;

    let task = state.patient_service.confirm_create_patient(&params).await?;

    Ok((StatusCode::CREATED, Json(task)).into_response())
}

// (POST /Patient/:id/$update)
pub async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response> {
    require_id(&id)?;
    let params = parse_body(&body)?;
    validate_request_profile(&params, PROFILE_PATIENT_UPDATE_REQUEST)?;

    let task = state.patient_service.update_patient(&id, &params).await?;

    Ok((StatusCode::OK, Json(task)).into_response())
}

// (POST /Patient/:id/$update-email)
pub async fn update_patient_email(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response> {
    require_id(&id)?;
    let params = parse_body(&body)?;
    validate_request_profile(&params, PROFILE_PATIENT_UPDATE_EMAIL_REQUEST)?;

    let task = state
        .patient_service
        .update_patient_email(&id, &params)
        .await?;

    Ok((StatusCode::OK, Json(task)).into_response())
}

// (POST /Patient/:id/$update-identity)
pub async fn update_patient_identity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response> {
    require_id(&id)?;
    let params = parse_body(&body)?;
    validate_request_profile(&params, PROFILE_PATIENT_UPDATE_IDENTITY_REQUEST)?;

    let task = state
        .patient_service
        .update_patient_identity(&id, &params)
        .await?;

    Ok((StatusCode::OK, Json(task)).into_response())
}

// (POST /Patient/:id/$confirm-identity)
pub async fn confirm_update_patient_identity(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response> {
    require_id(&id)?;
    let params = parse_body(&body)?;
    validate_request_profile(&params, PROFILE_PATIENT_CONFIRM_UPDATE_IDENTITY_REQUEST)?;

    let task = state
        .patient_service
        .confirm_update_patient_identity(&id, &params)
        .await?;

    Ok((StatusCode::OK, Json(task)).into_response())
}
