//! Confirm-create workflow: bind the submitted OTP to the pending task,
//! re-check duplicates against persisted patients and commit the new
//! Patient together with the completed task.

use super::{PatientService, BUSINESS_STATUS_PATIENT_CREATED};
use crate::{Error, Result};
use sijil_models::{
    resource_task_input, resource_task_output, Bundle, CodeableConcept, ContactPoint, Parameters,
    Patient, Task, TaskStatus, RESOURCE_PARAMETERS, RESOURCE_PATIENT, RESOURCE_TASK,
};

impl PatientService {
    pub async fn confirm_create_patient(&self, params: &Parameters) -> Result<Task> {
        self.store.validate_parameters(params).await?;

        let confirm = Self::extract_confirm_params(params)?;

        let mut task = self.get_task(&confirm.task_id).await?;

        Self::validate_confirm_task(&task)?;

        let patient_params = self.task_parameters(&task, 0).await?;

        let patient = Self::unmarshal_patient_param(&patient_params, 0)?;

        let telecom = extract_mobile_phone(&patient)?;
        let phone = telecom.value.clone().unwrap_or_default();

        self.validate_otp(&confirm.task_id, &confirm.otp_code, &phone)
            .await?;

        if let Err(e) = self.ensure_no_duplicate_patients(&patient).await {
            if e.is_validation() {
                self.reject_task(&task, params).await;
            }
            return Err(e);
        }

        self.ensure_below_fraud_cap(&patient, &phone).await?;

        complete_create_task(&mut task, &patient, params);

        self.commit_confirm_bundle(&task, &patient, params).await?;

        Ok(task)
    }

    async fn commit_confirm_bundle(
        &self,
        task: &Task,
        patient: &Patient,
        otp_params: &Parameters,
    ) -> Result<Bundle> {
        let mut bundle = Bundle::transaction(Self::new_id());
        bundle.post(RESOURCE_PARAMETERS, otp_params);
        bundle.post(RESOURCE_PATIENT, patient);
        bundle.put(RESOURCE_TASK, &task.id, task);

        self.store.create_bundle(&bundle).await
    }
}

fn extract_mobile_phone(patient: &Patient) -> Result<&ContactPoint> {
    patient.mobile_phone().ok_or_else(|| {
        Error::validation("phone number for such patient request not found")
    })
}

fn complete_create_task(task: &mut Task, patient: &Patient, otp_params: &Parameters) {
    task.status = TaskStatus::Completed;
    task.business_status = Some(CodeableConcept::from_text(BUSINESS_STATUS_PATIENT_CREATED));
    task.input
        .push(resource_task_input(RESOURCE_PARAMETERS, &otp_params.id));
    task.output
        .push(resource_task_output(RESOURCE_PATIENT, &patient.id));
}
