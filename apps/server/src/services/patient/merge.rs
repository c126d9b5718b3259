//! Merge policies: demographic update, email upsert and the full identity
//! merge used by confirm-update-identity.

use crate::{Error, Result};
use sijil_models::{
    from_map, to_map, Extension, Patient, EXTENSION_PATIENT_IMPORTANCE,
    EXTENSION_PATIENT_OCCUPATION, EXTENSION_PATIENT_RELIGION, TELECOM_SYSTEM_EMAIL,
};

/// Extension URLs the demographic update may touch.
const UPDATE_EXTENSION_URLS: [&str; 3] = [
    EXTENSION_PATIENT_RELIGION,
    EXTENSION_PATIENT_IMPORTANCE,
    EXTENSION_PATIENT_OCCUPATION,
];

/// Demographic update: copy `maritalStatus` when present, replace
/// `communication`/`contact` when non-empty, and upsert allowlisted
/// extensions by URL.
pub(crate) fn apply_update_params(db_patient: &mut Patient, patient: &Patient) {
    if let Some(marital_status) = &patient.marital_status {
        db_patient.marital_status = Some(marital_status.clone());
    }

    if !patient.communication.is_empty() {
        db_patient.communication = patient.communication.clone();
    }

    if !patient.contact.is_empty() {
        db_patient.contact = patient.contact.clone();
    }

    for ext in &patient.extension {
        if !UPDATE_EXTENSION_URLS.contains(&ext.url.as_str()) {
            continue;
        }

        match db_patient.extension.iter_mut().find(|e| e.url == ext.url) {
            Some(existing) => *existing = ext.clone(),
            None => db_patient.extension.push(ext.clone()),
        }
    }
}

/// Email upsert: for each submitted `email` telecom, update the first
/// stored entry with the same system or append a new one.
pub(crate) fn apply_email_telecom(db_patient: &mut Patient, patient: &Patient) {
    for telecom in &patient.telecom {
        if telecom.system.as_deref() != Some(TELECOM_SYSTEM_EMAIL) {
            continue;
        }

        match db_patient
            .telecom
            .iter_mut()
            .find(|t| t.system == telecom.system)
        {
            Some(existing) => existing.value = telecom.value.clone(),
            None => db_patient.telecom.push(telecom.clone()),
        }
    }
}

/// Identity merge: every top-level key of the new document overwrites the
/// stored one except `meta` and `extension`; extensions are concatenated so
/// the stored history is never dropped (duplicate URLs are accepted).
pub(crate) fn merge_patient(db_patient: &Patient, patient: &Patient) -> Result<Patient> {
    let mut stored = db_patient.clone();
    stored.extension = merge_extensions(&db_patient.extension, &patient.extension);

    let mut stored_map =
        to_map(&stored).map_err(|e| Error::validation(format!("merge failed: {e}")))?;
    let new_map = to_map(patient).map_err(|e| Error::validation(format!("merge failed: {e}")))?;

    for (key, value) in new_map {
        if key == "meta" || key == "extension" {
            continue;
        }
        stored_map.insert(key, value);
    }

    from_map(stored_map).map_err(|e| Error::validation(format!("merge failed: {e}")))
}

fn merge_extensions(stored: &[Extension], new: &[Extension]) -> Vec<Extension> {
    let mut result = stored.to_vec();
    result.extend(new.iter().cloned());
    result
}
