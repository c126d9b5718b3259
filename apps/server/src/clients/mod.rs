//! Outbound collaborators: the clinical store, the OTP service and the
//! external document registry. Each is a trait seam with an HTTP-backed
//! implementation; the engine only sees the traits.

pub mod doc_registry;
pub mod fhir;
pub mod otp;

pub use doc_registry::{DocRegistryClient, DocumentRegistry, RegistrySearchResult};
pub use fhir::{ClinicalStore, FhirClient};
pub use otp::{Otp, OtpClient, OtpService, ValidateOtp};

/// Task search criteria; exactly one of the members is set per call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TaskSearch {
    pub telecom: Option<TaskTelecomSearch>,
    pub identifier: Option<IdentifierSearch>,
}

/// Mobile-contact search: phone value + use/system + subject birthdate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskTelecomSearch {
    pub value: String,
    pub use_: String,
    pub system: String,
    pub birth_date: String,
}

/// Identifier token search; `type_` is the `system|code` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierSearch {
    pub value: String,
    pub type_: String,
}

/// Patient search criteria; exactly one of the members is set per call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PatientSearch {
    pub phone: Option<PatientPhoneSearch>,
    pub identifier: Option<IdentifierSearch>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatientPhoneSearch {
    pub phone: String,
    pub birth_date: String,
}
