//! Create-patient workflow: validate the submitted document, detect
//! duplicate persons and in-flight requests, issue an OTP and commit the
//! pending workflow task.

use super::{identifiers, PatientService, BUSINESS_STATUS_OTP_CODE_SENT};
use crate::{Error, Result};
use sijil_models::{
    resource_task_input, to_map, Bundle, CodeableConcept, Parameters, Patient, Task, TaskStatus,
    IDENT_NATIONAL_ID, PROFILE_TASK_PATIENT_CREATE, RESOURCE_PARAMETERS, RESOURCE_TASK,
};

/// Top-level patient keys a create request must not carry.
const FORBIDDEN_PARAMS: [&str; 7] = [
    "deceasedBoolean",
    "deceasedDateTime",
    "multipleBirth",
    "photo",
    "generalPractitioner",
    "managingOrganization",
    "link",
];

impl PatientService {
    pub async fn create_patient(&self, params: &Parameters) -> Result<Task> {
        let patient = Self::unmarshal_patient_param(params, 0)?;

        self.validate_create_parameters(params, &patient).await?;

        Self::validate_patient_profile(params.meta.as_ref(), patient.meta.as_ref())?;

        identifiers::validate_identity_rules(&patient, 0)?;

        self.validate_by_doc_registry(&patient).await?;

        self.ensure_no_duplicate_patients(&patient).await?;

        let duplicate_tasks = self.search_duplicate_tasks(&patient).await?;

        let task = prepare_create_task(params);

        let phone = patient
            .mobile_phone()
            .and_then(|t| t.value.clone())
            .ok_or_else(|| Error::validation_fields([("Telecom", "no mobile phone found")]))?;

        self.issue_otp(&phone, &task.id).await?;

        self.commit_create_bundle(params, &task, duplicate_tasks)
            .await?;

        Ok(task)
    }

    async fn validate_create_parameters(
        &self,
        params: &Parameters,
        patient: &Patient,
    ) -> Result<()> {
        self.store.validate_parameters(params).await?;

        if params.parameter.len() != 1 {
            return Err(Error::validation_fields([(
                "Parameters",
                "expected to have 1 element",
            )]));
        }

        if patient.active != Some(true) {
            return Err(Error::validation_fields([(
                "Parameters.parameter[0].resource.active",
                "should have true value",
            )]));
        }

        // The forbidden-keys check runs over the submitted document itself,
        // not the typed view: an explicit `"photo": null` must count.
        let resource_map = match &params.parameter[0].resource {
            Some(serde_json::Value::Object(map)) => map.clone(),
            Some(other) => to_map(other).map_err(|e| {
                Error::validation_fields([("Parameters.parameter[0].resource", e.to_string())])
            })?,
            None => Default::default(),
        };

        let offenders: Vec<&str> = FORBIDDEN_PARAMS
            .iter()
            .copied()
            .filter(|key| resource_map.contains_key(*key))
            .collect();

        if !offenders.is_empty() {
            return Err(Error::validation_fields([(
                "Parameters.parameter[0].resource",
                format!("forbidden parameters: {}", offenders.join(",")),
            )]));
        }

        Ok(())
    }

    /// Every national-id document must be known to the external registry.
    async fn validate_by_doc_registry(&self, patient: &Patient) -> Result<()> {
        for (i, ident) in patient.identifier.iter().enumerate() {
            if ident.type_.first_code() != Some(IDENT_NATIONAL_ID) {
                continue;
            }

            let result = self.registry.search(ident).await?;

            if !result.is_valid {
                return Err(Error::validation_fields([(
                    format!("Identifiers[{i}]"),
                    "document is not valid",
                )]));
            }
        }

        Ok(())
    }

    /// In-flight requests for the same person, found by identifier first
    /// and by mobile phone + birthdate only when no identifier matched.
    async fn search_duplicate_tasks(&self, patient: &Patient) -> Result<Vec<Task>> {
        let tasks = self.search_tasks_by_ident(patient).await?;

        if !tasks.is_empty() {
            return Ok(tasks);
        }

        self.search_tasks_by_telecom(patient).await
    }

    async fn commit_create_bundle(
        &self,
        params: &Parameters,
        task: &Task,
        duplicates: Vec<Task>,
    ) -> Result<Bundle> {
        let mut bundle = Bundle::transaction(Self::new_id());
        bundle.post(RESOURCE_PARAMETERS, params);
        bundle.post(RESOURCE_TASK, task);

        for mut duplicate in duplicates {
            duplicate.status = TaskStatus::Canceled;
            bundle.put(RESOURCE_TASK, &duplicate.id, &duplicate);
        }

        self.store.create_bundle(&bundle).await
    }
}

fn prepare_create_task(params: &Parameters) -> Task {
    let mut task =
        Task::new_workflow(PatientService::new_id(), PROFILE_TASK_PATIENT_CREATE);
    task.status = TaskStatus::InProgress;
    task.business_status = Some(CodeableConcept::from_text(BUSINESS_STATUS_OTP_CODE_SENT));
    task.input
        .push(resource_task_input(RESOURCE_PARAMETERS, &params.id));
    task
}
