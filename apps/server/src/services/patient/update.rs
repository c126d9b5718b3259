//! Update-patient workflow (non-identity fields): merge the submitted
//! demographic details into the stored patient and commit a completed task.
//! No OTP gate - none of these fields identify the person.

use super::{merge, PatientService};
use crate::{Error, Result};
use sijil_models::{
    resource_task_input, Bundle, Parameters, Patient, Task, TaskStatus,
    PROFILE_TASK_PATIENT_UPDATE, RESOURCE_PARAMETERS, RESOURCE_PATIENT, RESOURCE_TASK,
};

/// Caller-facing names of the fields this operation can change.
const UPDATE_PARAMETER_NAMES: [&str; 8] = [
    "maritalStatus",
    "communication",
    "contact",
    "religion",
    "importance",
    "occupation",
    "citizenship",
    "nationality",
];

impl PatientService {
    pub async fn update_patient(&self, id: &str, params: &Parameters) -> Result<Task> {
        let patient = Self::unmarshal_patient_param(params, 0)?;

        validate_update_parameters(&patient)?;

        Self::validate_patient_profile(params.meta.as_ref(), patient.meta.as_ref())?;

        self.store.validate_parameters(params).await?;

        if patient.id != id {
            return Err(Error::validation("url id and patient id are not equal"));
        }

        let mut db_patient = self.store.get_patient_by_id(id).await?;

        Self::validate_stored_patient(&db_patient)?;

        merge::apply_update_params(&mut db_patient, &patient);

        let task = prepare_update_task(params);

        self.commit_update_bundle(params, &task, &db_patient).await?;

        Ok(task)
    }

    pub(crate) async fn commit_update_bundle(
        &self,
        params: &Parameters,
        task: &Task,
        patient: &Patient,
    ) -> Result<Bundle> {
        let mut bundle = Bundle::transaction(Self::new_id());
        bundle.post(RESOURCE_PARAMETERS, params);
        bundle.post(RESOURCE_TASK, task);
        bundle.put(RESOURCE_PATIENT, &patient.id, patient);

        self.store.create_bundle(&bundle).await
    }
}

fn validate_update_parameters(patient: &Patient) -> Result<()> {
    if patient.marital_status.is_some()
        || !patient.contact.is_empty()
        || !patient.communication.is_empty()
        || !patient.extension.is_empty()
    {
        return Ok(());
    }

    Err(Error::validation_fields([(
        "Parameters.parameter.resource[0]",
        format!(
            "at least one of the parameters should be present: {}",
            UPDATE_PARAMETER_NAMES.join(",")
        ),
    )]))
}

/// Update tasks complete immediately; there is no confirmation step.
pub(crate) fn prepare_update_task(params: &Parameters) -> Task {
    let mut task = Task::new_workflow(PatientService::new_id(), PROFILE_TASK_PATIENT_UPDATE);
    task.status = TaskStatus::Completed;
    task.input
        .push(resource_task_input(RESOURCE_PARAMETERS, &params.id));
    task
}
