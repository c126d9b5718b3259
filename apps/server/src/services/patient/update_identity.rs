//! Update-patient-identity workflow: validate the replacement identifiers,
//! supersede duplicate in-flight requests and park the change behind an OTP
//! sent to the requested confirmation phone.

use super::{identifiers, PatientService, BUSINESS_STATUS_CONFIRM_IDENTITY_UPDATE};
use crate::{Error, Result};
use sijil_models::{
    resource_task_input, Bundle, CodeableConcept, Parameters, Patient, Task, TaskStatus,
    PROFILE_TASK_PATIENT_UPDATE_IDENTITY, RESOURCE_PARAMETERS, RESOURCE_TASK,
};
use std::collections::HashSet;

impl PatientService {
    pub async fn update_patient_identity(&self, id: &str, params: &Parameters) -> Result<Task> {
        self.store.validate_parameters(params).await?;

        let request = Self::extract_identity_params(params)?;

        Self::validate_patient_profile(params.meta.as_ref(), request.patient.meta.as_ref())?;

        if request.patient.id != id {
            return Err(Error::validation("url id and patient id are not equal"));
        }

        let db_patient = self.store.get_patient_by_id(id).await?;

        Self::validate_stored_patient(&db_patient)?;

        // The incoming document carries the new identity; the stored one is
        // only guarded, not validated.
        identifiers::validate_identity_rules(&request.patient, 1)?;

        self.ensure_no_duplicate_patients(&request.patient).await?;

        let duplicate_tasks = self.search_duplicate_identity_tasks(&request.patient).await?;

        let task = prepare_identity_task(params);

        self.issue_otp(&request.confirmation_method, &task.id).await?;

        self.commit_identity_bundle(params, &task, duplicate_tasks)
            .await?;

        Ok(task)
    }

    /// Identifier-matching in-progress tasks, deduplicated by task id.
    async fn search_duplicate_identity_tasks(&self, patient: &Patient) -> Result<Vec<Task>> {
        let tasks = self.search_tasks_by_ident(patient).await?;

        let mut seen = HashSet::new();
        Ok(tasks
            .into_iter()
            .filter(|t| t.status == TaskStatus::InProgress && seen.insert(t.id.clone()))
            .collect())
    }

    async fn commit_identity_bundle(
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

fn prepare_identity_task(params: &Parameters) -> Task {
    let mut task = Task::new_workflow(
        PatientService::new_id(),
        PROFILE_TASK_PATIENT_UPDATE_IDENTITY,
    );
    task.status = TaskStatus::InProgress;
    task.business_status = Some(CodeableConcept::from_text(
        BUSINESS_STATUS_CONFIRM_IDENTITY_UPDATE,
    ));
    task.input
        .push(resource_task_input(RESOURCE_PARAMETERS, &params.id));
    task
}
