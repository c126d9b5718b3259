//! Confirm-update-identity workflow: validate the OTP issued for the
//! pending identity change, re-check duplicates, merge the new identity
//! into the stored patient and complete the task.

use super::{merge, PatientService, BUSINESS_STATUS_IDENTITY_UPDATED};
use crate::{Error, Result};
use sijil_models::{
    resource_task_input, resource_task_output, Bundle, CodeableConcept, Parameters, Patient, Task,
    TaskStatus, RESOURCE_PARAMETERS, RESOURCE_PATIENT, RESOURCE_TASK,
};

impl PatientService {
    pub async fn confirm_update_patient_identity(
        &self,
        id: &str,
        params: &Parameters,
    ) -> Result<Task> {
        self.store.validate_parameters(params).await?;

        let confirm = Self::extract_confirm_params(params)?;

        let mut task = self.get_task(&confirm.task_id).await?;

        Self::validate_confirm_task(&task)?;

        let origin_params = self.task_parameters(&task, 0).await?;

        let request = Self::extract_identity_params(&origin_params)?;

        if request.patient.id != id {
            return Err(Error::validation("url id and patient id are not equal"));
        }

        let db_patient = self.store.get_patient_by_id(id).await?;

        Self::validate_stored_patient(&db_patient)?;

        self.validate_otp(&confirm.task_id, &confirm.otp_code, &request.confirmation_method)
            .await?;

        if let Err(e) = self.ensure_no_duplicate_patients(&request.patient).await {
            if e.is_validation() {
                self.reject_task(&task, params).await;
            }
            return Err(e);
        }

        let patient = merge::merge_patient(&db_patient, &request.patient)?;

        complete_identity_task(&mut task, &patient, params);

        self.commit_confirm_identity_bundle(&task, &patient, params)
            .await?;

        Ok(task)
    }

    async fn commit_confirm_identity_bundle(
        &self,
        task: &Task,
        patient: &Patient,
        otp_params: &Parameters,
    ) -> Result<Bundle> {
        let mut bundle = Bundle::transaction(Self::new_id());
        bundle.post(RESOURCE_PARAMETERS, otp_params);
        bundle.put(RESOURCE_PATIENT, &patient.id, patient);
        bundle.put(RESOURCE_TASK, &task.id, task);

        self.store.create_bundle(&bundle).await
    }
}

fn complete_identity_task(task: &mut Task, patient: &Patient, otp_params: &Parameters) {
    task.status = TaskStatus::Completed;
    task.business_status = Some(CodeableConcept::from_text(BUSINESS_STATUS_IDENTITY_UPDATED));
    task.input
        .push(resource_task_input(RESOURCE_PARAMETERS, &otp_params.id));
    task.output
        .push(resource_task_output(RESOURCE_PATIENT, &patient.id));
}
