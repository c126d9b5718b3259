//! Patient workflow engine.
//!
//! Six use-cases over the clinical store: create, confirm-create, update,
//! update-email, update-identity and confirm-identity. Each request runs a
//! single flow of control - validations, store reads, OTP/registry calls,
//! then exactly one transaction bundle commit. The engine keeps no state of
//! its own between requests.

mod confirm_create;
mod confirm_identity;
mod create;
mod identifiers;
mod merge;
mod update;
mod update_email;
mod update_identity;

use crate::clients::{
    ClinicalStore, DocumentRegistry, IdentifierSearch, Otp, OtpService, PatientPhoneSearch,
    PatientSearch, TaskSearch, TaskTelecomSearch, ValidateOtp,
};
use crate::{Error, Result};
use sijil_models::{
    resource_task_input, Bundle, Meta, Parameters, Patient, Task, TaskStatus,
    PROFILE_PATIENT_CREATE_REQUEST, PROFILE_PATIENT_IDENTIFIED, PROFILE_PATIENT_OPERATION_UPDATE,
    PROFILE_PATIENT_OPERATION_UPDATE_EMAIL, PROFILE_PATIENT_OPERATION_UPDATE_IDENTITY,
    PROFILE_PATIENT_UPDATE_EMAIL_REQUEST, PROFILE_PATIENT_UPDATE_IDENTITY_REQUEST,
    PROFILE_PATIENT_UPDATE_REQUEST, RESOURCE_PARAMETERS, RESOURCE_TASK, TELECOM_SYSTEM_PHONE,
    TELECOM_USE_MOBILE,
};
use std::sync::Arc;
use uuid::Uuid;

pub(crate) const BUSINESS_STATUS_OTP_CODE_SENT: &str = "OTP code sent";
pub(crate) const BUSINESS_STATUS_PATIENT_CREATED: &str = "Patient Created";
pub(crate) const BUSINESS_STATUS_CONFIRM_IDENTITY_UPDATE: &str =
    "Confirm Updating Identity & save Parameters";
pub(crate) const BUSINESS_STATUS_IDENTITY_UPDATED: &str = "Patient Identity Updated";

/// Fraud cap: active patients allowed to share one phone + birthdate pair.
pub(crate) const MAX_PATIENTS_WITH_SAME_PHONE: usize = 10;

pub struct PatientService {
    store: Arc<dyn ClinicalStore>,
    otp: Arc<dyn OtpService>,
    registry: Arc<dyn DocumentRegistry>,
}

/// Scalar inputs of the two confirm endpoints.
pub(crate) struct ConfirmRequest {
    pub otp_code: String,
    pub task_id: String,
}

/// Inputs of the update-identity request: the target phone and the patient
/// document carrying the new identifiers.
pub(crate) struct IdentityUpdateRequest {
    pub confirmation_method: String,
    pub patient: Patient,
}

impl PatientService {
    pub fn new(
        store: Arc<dyn ClinicalStore>,
        otp: Arc<dyn OtpService>,
        registry: Arc<dyn DocumentRegistry>,
    ) -> Self {
        Self {
            store,
            otp,
            registry,
        }
    }

    pub(crate) fn new_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// Decode the embedded patient out of `parameter[index].resource`.
    pub(crate) fn unmarshal_patient_param(
        params: &Parameters,
        index: usize,
    ) -> Result<Patient> {
        if params.parameter.len() < index + 1 {
            return Err(Error::validation_fields([(
                "Parameters",
                format!("expected to have at least {} elements", index + 1),
            )]));
        }

        let resource = params.parameter[index]
            .resource
            .clone()
            .unwrap_or(serde_json::Value::Null);

        serde_json::from_value(resource).map_err(|e| {
            Error::validation_fields([(
                format!("Parameters.parameter[{index}].resource"),
                e.to_string(),
            )])
        })
    }

    /// Check the (request profile, embedded patient profile) pair against
    /// the closed dispatch table.
    pub(crate) fn validate_patient_profile(
        params_meta: Option<&Meta>,
        patient_meta: Option<&Meta>,
    ) -> Result<()> {
        let params_meta = params_meta
            .ok_or_else(|| Error::validation_fields([("Parameters.meta", "value is required")]))?;

        if params_meta.profile.len() != 1 {
            return Err(Error::validation_fields([(
                "Parameters.meta.profile",
                "expected to have 1 value",
            )]));
        }

        let patient_meta = patient_meta
            .ok_or_else(|| Error::validation_fields([("Resource.meta", "value is required")]))?;

        if patient_meta.profile.len() != 1 {
            return Err(Error::validation_fields([(
                "Resource.meta.profile",
                "expected to have 1 value",
            )]));
        }

        let expected = match params_meta.profile[0].as_str() {
            PROFILE_PATIENT_CREATE_REQUEST => PROFILE_PATIENT_IDENTIFIED,
            PROFILE_PATIENT_UPDATE_REQUEST => PROFILE_PATIENT_OPERATION_UPDATE,
            PROFILE_PATIENT_UPDATE_IDENTITY_REQUEST => PROFILE_PATIENT_OPERATION_UPDATE_IDENTITY,
            PROFILE_PATIENT_UPDATE_EMAIL_REQUEST => PROFILE_PATIENT_OPERATION_UPDATE_EMAIL,
            _ => {
                return Err(Error::validation_fields([(
                    "Parameters.meta.profile[0]",
                    "unknown value",
                )]))
            }
        };

        if patient_meta.profile[0] != expected {
            return Err(Error::validation_fields([(
                "Resource.meta.profile[0]",
                "given patient profile is not supported for current operation",
            )]));
        }

        Ok(())
    }

    /// Stored patients that are inactive or deceased are frozen against
    /// modification.
    pub(crate) fn validate_stored_patient(db_patient: &Patient) -> Result<()> {
        if db_patient.active != Some(true) {
            return Err(Error::validation("patient has inactive status"));
        }

        if db_patient.deceased_boolean == Some(true) {
            return Err(Error::validation("patient has deceased status"));
        }

        Ok(())
    }

    /// Extract `otp` and `task_id` from a confirm request.
    pub(crate) fn extract_confirm_params(params: &Parameters) -> Result<ConfirmRequest> {
        let otp_code = params
            .find("otp")
            .and_then(|p| p.value_string.clone())
            .unwrap_or_default();

        if otp_code.is_empty() {
            return Err(Error::validation_fields([(
                "Parameters.parameter",
                "missing otp parameter",
            )]));
        }

        let task_ref = params
            .find("task_id")
            .and_then(|p| p.value_reference.as_ref())
            .ok_or_else(|| {
                Error::validation_fields([("Parameters.parameter", "missing task_id parameter")])
            })?;

        let task_id = task_ref.parse_id().ok_or_else(|| {
            Error::validation_fields([("Parameters.parameter", "invalid task_id parameter format")])
        })?;

        Ok(ConfirmRequest {
            otp_code,
            task_id: task_id.to_string(),
        })
    }

    /// Extract `confirmationMethod` and the embedded `patient` from an
    /// update-identity request.
    pub(crate) fn extract_identity_params(params: &Parameters) -> Result<IdentityUpdateRequest> {
        let confirmation_method = params
            .find("confirmationMethod")
            .and_then(|p| p.value_string.clone())
            .unwrap_or_default();

        let patient_resource = params.find("patient").and_then(|p| p.resource.clone());

        let (confirmation_method, patient_resource) = match patient_resource {
            Some(resource) if !confirmation_method.is_empty() => {
                (confirmation_method, resource)
            }
            _ => {
                return Err(Error::validation(
                    "patient or confirmation method parameter is empty",
                ))
            }
        };

        let patient = serde_json::from_value(patient_resource).map_err(|e| {
            Error::validation_fields([("Parameters.parameter[1]", e.to_string())])
        })?;

        Ok(IdentityUpdateRequest {
            confirmation_method,
            patient,
        })
    }

    pub(crate) async fn get_task(&self, id: &str) -> Result<Task> {
        self.store.get_task_by_id(id).await.map_err(|e| {
            if e.is_not_exist() {
                Error::NotExist("such patient request does not exist".to_string())
            } else {
                e
            }
        })
    }

    pub(crate) fn validate_confirm_task(task: &Task) -> Result<()> {
        if task.status != TaskStatus::InProgress {
            return Err(Error::validation("such patient request is not active"));
        }
        Ok(())
    }

    /// Fetch the Parameters referenced by `task.input[index]`.
    pub(crate) async fn task_parameters(&self, task: &Task, index: usize) -> Result<Parameters> {
        if task.input.len() < index + 1 {
            return Err(Error::validation(format!(
                "expected task input to have at least {} elements",
                index + 1
            )));
        }

        let reference = task.input[index]
            .value_reference
            .as_ref()
            .ok_or_else(|| Error::validation("task input valueReference is empty"))?;

        let id = reference.parse_id().ok_or_else(|| {
            Error::validation(format!(
                "invalid task reference format: {}",
                reference.reference
            ))
        })?;

        self.store.get_parameters_by_id(id).await.map_err(|e| {
            if e.is_not_exist() {
                Error::NotExist("parameters for such patient request do not exist".to_string())
            } else {
                e
            }
        })
    }

    /// Issue an OTP for the workflow and log it; delivery is an external
    /// concern.
    pub(crate) async fn issue_otp(&self, phone: &str, task_id: &str) -> Result<Otp> {
        let otp = self.otp.generate_by_phone(phone, task_id).await?;

        if otp.code.is_empty() {
            return Err(Error::Internal("otp is empty".to_string()));
        }

        tracing::info!(code = %otp.code, phone = %otp.value, "generated otp");

        Ok(otp)
    }

    pub(crate) async fn validate_otp(&self, task_id: &str, code: &str, value: &str) -> Result<()> {
        let result = self
            .otp
            .validate(&ValidateOtp {
                code: code.to_string(),
                value: value.to_string(),
                process_id: task_id.to_string(),
            })
            .await;

        match result {
            Err(e) if e.is_not_exist() => Err(Error::NotExist(
                "otp for such patient request does not exist".to_string(),
            )),
            other => other,
        }
    }

    /// Search active patients once per identifier in priority order; any
    /// hit is a duplicate person.
    pub(crate) async fn ensure_no_duplicate_patients(&self, patient: &Patient) -> Result<()> {
        let patients = self.search_patients_by_ident(&patient.identifier).await?;

        if !patients.is_empty() {
            return Err(Error::validation("such person already exists"));
        }

        Ok(())
    }

    pub(crate) async fn search_patients_by_ident(
        &self,
        identifiers: &[sijil_models::Identifier],
    ) -> Result<Vec<Patient>> {
        let mut identifiers = identifiers.to_vec();
        identifiers::sort_identifiers(&mut identifiers);

        for (i, ident) in identifiers.iter().enumerate() {
            let coding = ident.type_.coding.first().ok_or_else(|| {
                Error::validation(format!("empty coding for identifier {i}"))
            })?;

            let patients = self
                .store
                .search_patients(&PatientSearch {
                    identifier: Some(IdentifierSearch {
                        value: ident.value.clone(),
                        type_: format!(
                            "{}|{}",
                            coding.system.as_deref().unwrap_or_default(),
                            coding.code.as_deref().unwrap_or_default()
                        ),
                    }),
                    ..PatientSearch::default()
                })
                .await?;

            if !patients.is_empty() {
                return Ok(patients);
            }
        }

        Ok(Vec::new())
    }

    /// In-progress tasks already tracking the same identifiers.
    pub(crate) async fn search_tasks_by_ident(&self, patient: &Patient) -> Result<Vec<Task>> {
        let mut identifiers = patient.identifier.clone();
        identifiers::sort_identifiers(&mut identifiers);

        for (i, ident) in identifiers.iter().enumerate() {
            let coding = ident.type_.coding.first().ok_or_else(|| {
                Error::validation_fields([(format!("Identifier[{i}].type"), "empty coding")])
            })?;

            let tasks = self
                .store
                .search_tasks(&TaskSearch {
                    identifier: Some(IdentifierSearch {
                        value: ident.value.clone(),
                        type_: format!(
                            "{}|{}",
                            coding.system.as_deref().unwrap_or_default(),
                            coding.code.as_deref().unwrap_or_default()
                        ),
                    }),
                    ..TaskSearch::default()
                })
                .await?;

            let active: Vec<Task> = tasks
                .into_iter()
                .filter(|t| t.status == TaskStatus::InProgress)
                .collect();

            if !active.is_empty() {
                return Ok(active);
            }
        }

        Ok(Vec::new())
    }

    /// In-progress tasks tracking the same mobile phone + birthdate.
    pub(crate) async fn search_tasks_by_telecom(&self, patient: &Patient) -> Result<Vec<Task>> {
        for telecom in &patient.telecom {
            if !telecom.is_mobile_phone() {
                continue;
            }

            let birth_date = patient
                .birth_date
                .clone()
                .ok_or_else(|| Error::validation("expected patient to have a birthdate"))?;

            let tasks = self
                .store
                .search_tasks(&TaskSearch {
                    telecom: Some(TaskTelecomSearch {
                        value: telecom.value.clone().unwrap_or_default(),
                        system: TELECOM_SYSTEM_PHONE.to_string(),
                        use_: TELECOM_USE_MOBILE.to_string(),
                        birth_date,
                    }),
                    ..TaskSearch::default()
                })
                .await?;

            let active: Vec<Task> = tasks
                .into_iter()
                .filter(|t| t.status == TaskStatus::InProgress)
                .collect();

            if !active.is_empty() {
                return Ok(active);
            }
        }

        Ok(Vec::new())
    }

    /// Fraud cap check: active patients sharing the subject's mobile phone
    /// and birthdate.
    pub(crate) async fn ensure_below_fraud_cap(
        &self,
        patient: &Patient,
        phone: &str,
    ) -> Result<()> {
        let birth_date = patient
            .birth_date
            .clone()
            .ok_or_else(|| Error::validation("expected patient to have a birthdate"))?;

        let patients = self
            .store
            .search_patients(&PatientSearch {
                phone: Some(PatientPhoneSearch {
                    phone: phone.to_string(),
                    birth_date,
                }),
                ..PatientSearch::default()
            })
            .await?;

        if patients.len() >= MAX_PATIENTS_WITH_SAME_PHONE {
            return Err(Error::validation("too many persons with same phone"));
        }

        Ok(())
    }

    /// Compensating write after a post-confirmation validation failure:
    /// flip the task to rejected and attach the confirm Parameters. This is
    /// a secondary commit, not a rollback - its own failure is logged and
    /// the original error is what the caller sees.
    pub(crate) async fn reject_task(&self, task: &Task, confirm_params: &Parameters) {
        let mut task = task.clone();
        task.status = TaskStatus::Rejected;
        task.input
            .push(resource_task_input(RESOURCE_PARAMETERS, &confirm_params.id));

        let mut bundle = Bundle::transaction(Self::new_id());
        bundle.post(RESOURCE_PARAMETERS, confirm_params);
        bundle.put(RESOURCE_TASK, &task.id, &task);

        if let Err(e) = self.store.create_bundle(&bundle).await {
            tracing::warn!(task_id = %task.id, error = %e, "failed to reject task");
        }
    }
}
