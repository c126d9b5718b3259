//! Update-patient-email workflow: same shape as the demographic update but
//! restricted to a single email telecom entry.

use super::{merge, update::prepare_update_task, PatientService};
use crate::{Error, Result};
use sijil_models::{Parameters, Patient, Task};

const EMAIL_PARAMETER_NAMES: [&str; 1] = ["telecom"];

impl PatientService {
    pub async fn update_patient_email(&self, id: &str, params: &Parameters) -> Result<Task> {
        let patient = Self::unmarshal_patient_param(params, 0)?;

        if patient.id != id {
            return Err(Error::validation("input id and patient id are not equal"));
        }

        validate_telecom_count(&patient)?;

        Self::validate_patient_profile(params.meta.as_ref(), patient.meta.as_ref())?;

        self.store.validate_parameters(params).await?;

        let mut db_patient = self.store.get_patient_by_id(id).await?;

        Self::validate_stored_patient(&db_patient)?;

        merge::apply_email_telecom(&mut db_patient, &patient);

        let task = prepare_update_task(params);

        self.commit_update_bundle(params, &task, &db_patient).await?;

        Ok(task)
    }
}

fn validate_telecom_count(patient: &Patient) -> Result<()> {
    if patient.telecom.len() == 1 {
        return Ok(());
    }

    Err(Error::validation_fields([(
        "Parameters.parameter.resource[0]",
        format!(
            "at least one of the parameters should be present: {}",
            EMAIL_PARAMETER_NAMES.join(",")
        ),
    )]))
}
