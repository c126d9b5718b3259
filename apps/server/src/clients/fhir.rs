//! Clinical store client - typed operations over the downstream FHIR REST
//! API: `$validate`, transaction commit, get-by-id and criteria searches.

use super::{PatientSearch, TaskSearch};
use crate::{Error, Result};
use async_trait::async_trait;
use axum::http::StatusCode;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use sijil_models::{
    Bundle, OperationOutcome, Parameters, Patient, Task, PROFILE_PATIENT_IDENTIFIED,
    RESOURCE_PARAMETERS, RESOURCE_PATIENT, RESOURCE_TASK,
};

/// Engine-facing view of the clinical store. The store is trusted to apply
/// transaction bundles atomically and honor entry order.
#[async_trait]
pub trait ClinicalStore: Send + Sync {
    /// Structural validation of a `Parameters` document (`$validate`).
    async fn validate_parameters(&self, params: &Parameters) -> Result<OperationOutcome>;

    /// Commit a transaction bundle; all entries apply or none do.
    async fn create_bundle(&self, bundle: &Bundle) -> Result<Bundle>;

    async fn get_patient_by_id(&self, id: &str) -> Result<Patient>;
    async fn get_task_by_id(&self, id: &str) -> Result<Task>;
    async fn get_parameters_by_id(&self, id: &str) -> Result<Parameters>;

    /// Search workflow tasks through their originating Parameters
    /// (`_revinclude=Task:input-reference`).
    async fn search_tasks(&self, search: &TaskSearch) -> Result<Vec<Task>>;

    /// Search active, profile-conforming patients.
    async fn search_patients(&self, search: &PatientSearch) -> Result<Vec<Patient>>;
}

/// HTTP implementation over `reqwest` with a normalized base URL.
#[derive(Clone)]
pub struct FhirClient {
    client: Client,
    base_url: String,
}

impl FhirClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<OperationOutcome>(&body)
                .ok()
                .and_then(|o| o.first_diagnostics().map(str::to_string))
                .unwrap_or_else(|| format!("clinical store error. Code: {status}"));
            let status =
                StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            return Err(Error::from_upstream_status(status, message));
        }

        serde_json::from_slice(&body)
            .map_err(|e| Error::Internal(format!("invalid clinical store response: {e}")))
    }

    async fn get_resource<T: DeserializeOwned>(&self, resource_type: &str, id: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}/{resource_type}/{id}", self.base_url))
            .send()
            .await?;
        Self::decode_response(response).await
    }

    async fn search_resource(
        &self,
        resource_type: &str,
        query: &[(&str, &str)],
    ) -> Result<Bundle> {
        let response = self
            .client
            .get(format!("{}/{resource_type}", self.base_url))
            .query(query)
            .send()
            .await?;
        Self::decode_response(response).await
    }

    /// Pick entries whose `fullUrl` names the wanted resource type and
    /// decode them; search responses may interleave revincluded resources.
    fn collect_entries<T: DeserializeOwned>(bundle: Bundle, resource_type: &str) -> Result<Vec<T>> {
        let mut out = Vec::new();
        for (i, entry) in bundle.entry.into_iter().enumerate() {
            if !entry.full_url.contains(resource_type) {
                continue;
            }
            let resource = entry.resource.unwrap_or(Value::Null);
            let typed = serde_json::from_value(resource).map_err(|e| {
                Error::validation_fields([(
                    format!("Bundle.entry[{i}].resource"),
                    format!("{resource_type}: {e}"),
                )])
            })?;
            out.push(typed);
        }
        Ok(out)
    }
}

#[async_trait]
impl ClinicalStore for FhirClient {
    async fn validate_parameters(&self, params: &Parameters) -> Result<OperationOutcome> {
        let response = self
            .client
            .post(format!("{}/{RESOURCE_PARAMETERS}/$validate", self.base_url))
            .json(params)
            .send()
            .await?;
        Self::decode_response(response).await
    }

    async fn create_bundle(&self, bundle: &Bundle) -> Result<Bundle> {
        let response = self
            .client
            .post(&self.base_url)
            .json(bundle)
            .send()
            .await?;
        Self::decode_response(response).await
    }

    async fn get_patient_by_id(&self, id: &str) -> Result<Patient> {
        self.get_resource(RESOURCE_PATIENT, id).await
    }

    async fn get_task_by_id(&self, id: &str) -> Result<Task> {
        self.get_resource(RESOURCE_TASK, id).await
    }

    async fn get_parameters_by_id(&self, id: &str) -> Result<Parameters> {
        self.get_resource(RESOURCE_PARAMETERS, id).await
    }

    async fn search_tasks(&self, search: &TaskSearch) -> Result<Vec<Task>> {
        let mut query: Vec<(&str, &str)> = Vec::new();

        if let Some(telecom) = &search.telecom {
            query.push(("parameter-resource-telecom", &telecom.value));
            query.push(("parameter-resource-telecom-use", &telecom.use_));
            query.push(("parameter-resource-telecom-system", &telecom.system));
            query.push(("parameter-resource-birthdate", &telecom.birth_date));
        }

        if let Some(identifier) = &search.identifier {
            query.push(("parameter-resource-identifier", &identifier.value));
            query.push(("parameter-resource-identifier-type", &identifier.type_));
        }

        if query.is_empty() {
            return Err(Error::Internal("no search criteria set".to_string()));
        }

        query.push(("_revinclude", "Task:input-reference"));

        let bundle = self.search_resource(RESOURCE_TASK, &query).await?;
        Self::collect_entries(bundle, RESOURCE_TASK)
    }

    async fn search_patients(&self, search: &PatientSearch) -> Result<Vec<Patient>> {
        let mut query: Vec<(&str, &str)> = Vec::new();

        if let Some(phone) = &search.phone {
            query.push(("phone", &phone.phone));
            query.push(("birthdate", &phone.birth_date));
        }

        if let Some(identifier) = &search.identifier {
            query.push(("identifier", &identifier.value));
            query.push(("identifier-type", &identifier.type_));
        }

        if query.is_empty() {
            return Err(Error::Internal("no search criteria set".to_string()));
        }

        query.push(("active", "true"));
        query.push(("_profile", PROFILE_PATIENT_IDENTIFIED));

        let bundle = self.search_resource(RESOURCE_PATIENT, &query).await?;
        Self::collect_entries(bundle, RESOURCE_PATIENT)
    }
}
