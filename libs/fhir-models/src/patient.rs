//! Patient resource.

use crate::complex::{CodeableConcept, ContactPoint, Extension, Identifier, Meta};
use crate::EXTENSION_PATIENT_NATIONALITY;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The subset of Patient the MPI workflows interpret, with a catch-all for
/// everything else (names, addresses, gender, ...) so documents round-trip
/// losslessly through the generic-map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(
        rename = "resourceType",
        default = "default_resource_type",
        skip_serializing_if = "String::is_empty"
    )]
    pub resource_type: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub deceased_boolean: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub marital_status: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contact: Vec<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub communication: Vec<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_resource_type() -> String {
    crate::RESOURCE_PATIENT.to_string()
}

impl Patient {
    /// First `phone`/`mobile` contact point.
    pub fn mobile_phone(&self) -> Option<&ContactPoint> {
        self.telecom.iter().find(|t| t.is_mobile_phone())
    }

    /// ISO country code from the nationality extension, walking
    /// `…patient-nationality` → inner `code` extension →
    /// `valueCodeableConcept.coding[0].code`.
    pub fn nationality_code(&self) -> Option<&str> {
        for ext in &self.extension {
            if ext.url != EXTENSION_PATIENT_NATIONALITY {
                continue;
            }
            for inner in &ext.extension {
                if inner.url != "code" {
                    continue;
                }
                if let Some(concept) = &inner.value_codeable_concept {
                    if let Some(code) = concept.first_code() {
                        return Some(code);
                    }
                }
            }
        }
        None
    }
}
