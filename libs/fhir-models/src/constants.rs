//! Closed vocabularies: resource type names, profile URIs, identifier
//! document codes and telecom codes used by the MPI workflows.

pub const RESOURCE_PATIENT: &str = "Patient";
pub const RESOURCE_TASK: &str = "Task";
pub const RESOURCE_PARAMETERS: &str = "Parameters";
pub const RESOURCE_BUNDLE: &str = "Bundle";
pub const RESOURCE_OPERATION_OUTCOME: &str = "OperationOutcome";

/// Coding system for task input/output type codings.
pub const CODING_SYSTEM_RESOURCE_TYPES: &str = "http://hl7.org/fhir/resource-types";

// Request (Parameters) profiles, one per endpoint.
pub const PROFILE_PATIENT_CREATE_REQUEST: &str =
    "http://ksa-ehealth.sa/fhir/StructureDefinition/ksa-ehealth-parameters-patient-create-request";
pub const PROFILE_PATIENT_UPDATE_REQUEST: &str =
    "http://ksa-ehealth.sa/fhir/StructureDefinition/ksa-ehealth-parameters-patient-update";
pub const PROFILE_PATIENT_UPDATE_IDENTITY_REQUEST: &str =
    "http://ksa-ehealth.sa/fhir/StructureDefinition/ksa-ehealth-parameters-patient-update-identity";
pub const PROFILE_PATIENT_UPDATE_EMAIL_REQUEST: &str =
    "http://ksa-ehealth.sa/fhir/StructureDefinition/ksa-ehealth-parameters-patient-update-email";
pub const PROFILE_PATIENT_CONFIRM_CREATE_REQUEST: &str =
    "http://ksa-ehealth.sa/fhir/StructureDefinition/ksa-ehealth-parameters-patient-confirm-request";
pub const PROFILE_PATIENT_CONFIRM_UPDATE_IDENTITY_REQUEST: &str =
    "http://ksa-ehealth.sa/fhir/StructureDefinition/ksa-ehealth-parameters-patient-confirm-identity";

// Embedded patient profiles, keyed off the request profile.
pub const PROFILE_PATIENT_IDENTIFIED: &str =
    "http://ksa-ehealth.sa/fhir/StructureDefinition/ksa-ehealth-patient-identified";
pub const PROFILE_PATIENT_OPERATION_UPDATE: &str =
    "http://ksa-ehealth.sa/fhir/StructureDefinition/ksa-ehealth-patient-operation-update";
pub const PROFILE_PATIENT_OPERATION_UPDATE_IDENTITY: &str =
    "http://ksa-ehealth.sa/fhir/StructureDefinition/ksa-ehealth-patient-operation-update-identity";
pub const PROFILE_PATIENT_OPERATION_UPDATE_EMAIL: &str =
    "http://ksa-ehealth.sa/fhir/StructureDefinition/ksa-ehealth-patient-operation-update-email";

// Task profiles, one per workflow family.
pub const PROFILE_TASK_PATIENT_CREATE: &str =
    "http://ksa-ehealth.sa/fhir/StructureDefinition/ksa-ehealth-task-patient-create";
pub const PROFILE_TASK_PATIENT_UPDATE: &str =
    "http://ksa-ehealth.sa/fhir/StructureDefinition/ksa-ehealth-task-patient-update";
pub const PROFILE_TASK_PATIENT_UPDATE_IDENTITY: &str =
    "http://ksa-ehealth.sa/fhir/StructureDefinition/ksa-ehealth-task-patient-update-identity";

/// Nationality extension URL; the ISO country code sits in the inner
/// `code` extension's `valueCodeableConcept.coding[0].code`.
pub const EXTENSION_PATIENT_NATIONALITY: &str =
    "http://ksa-ehealth.sa/fhir/StructureDefinition/ksa-ehealth-patient-nationality";

// Extension URLs the non-identity update flow is allowed to upsert.
pub const EXTENSION_PATIENT_RELIGION: &str =
    "http://nphies.sa/fhir/ksa/nphies-fs/StructureDefinition/extension-patient-religion";
pub const EXTENSION_PATIENT_IMPORTANCE: &str =
    "http://nphies.sa/fhir/ksa/nphies-fs/StructureDefinition/extension-patient-importance";
pub const EXTENSION_PATIENT_OCCUPATION: &str =
    "http://nphies.sa/fhir/ksa/nphies-fs/StructureDefinition/extension-patient-occupation";

// Identifier document codes (v2-0203 style).
pub const IDENT_NATIONAL_ID: &str = "NI";
pub const IDENT_PERMANENT_RESIDENT_CARD: &str = "PRC";
pub const IDENT_BORDER_NUMBER: &str = "BN";
pub const IDENT_DISPLACED_PERSON: &str = "DP";
pub const IDENT_GCC_NUMBER: &str = "GCC";
pub const IDENT_JURISDICTIONAL_HEALTH_NUMBER: &str = "JHN";
pub const IDENT_VISA: &str = "VS";
pub const IDENT_PASSPORT: &str = "PPN";
pub const IDENT_CITIZENSHIP_CARD: &str = "CZ";

pub const NATIONALITY_CODE_SA: &str = "SA";

pub const TELECOM_SYSTEM_PHONE: &str = "phone";
pub const TELECOM_SYSTEM_EMAIL: &str = "email";
pub const TELECOM_USE_MOBILE: &str = "mobile";

pub const TASK_INTENT_ORDER: &str = "order";
