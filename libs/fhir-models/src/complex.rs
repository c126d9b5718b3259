//! FHIR complex datatypes shared across resources.
//!
//! No validation here - just data representation. Unknown properties are
//! preserved through the `extra` catch-alls where a datatype participates
//! in the lossless map round trip.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Resource metadata header; only `profile` is interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Meta {
    pub fn with_profile(profile: &str) -> Self {
        Self {
            profile: vec![profile.to_string()],
            extra: Map::new(),
        }
    }
}

/// Coding - a reference to a code defined by a terminology system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Coding {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    pub fn from_text(text: &str) -> Self {
        Self {
            coding: Vec::new(),
            text: Some(text.to_string()),
        }
    }

    /// `code` of the first coding, if any.
    pub fn first_code(&self) -> Option<&str> {
        self.coding.first().and_then(|c| c.code.as_deref())
    }

    /// `system` of the first coding, if any.
    pub fn first_system(&self) -> Option<&str> {
        self.coding.first().and_then(|c| c.system.as_deref())
    }
}

/// Contact point (phone, email, etc.)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContactPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>, // phone | fax | email | pager | url | sms | other

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(rename = "use", skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>, // home | work | temp | old | mobile

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<u32>,
}

impl ContactPoint {
    /// True for a `phone`/`mobile` contact point.
    pub fn is_mobile_phone(&self) -> bool {
        self.system.as_deref() == Some(crate::TELECOM_SYSTEM_PHONE)
            && self.use_.as_deref() == Some(crate::TELECOM_USE_MOBILE)
    }
}

/// Time period with optional open ends. FHIR dateTime values may be a plain
/// date or a full timestamp; both are kept verbatim as strings and parsed
/// only where a comparison is needed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Period {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// An identifier intended for computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Identifier {
    #[serde(rename = "type", default, skip_serializing_if = "is_default_concept")]
    pub type_: CodeableConcept,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub value: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn is_default_concept(c: &CodeableConcept) -> bool {
    c.coding.is_empty() && c.text.is_none()
}

/// A reference from one resource to another, always textual
/// (`ResourceType/id`), never an in-memory pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Reference {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reference: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    pub fn to(resource_type: &str, id: &str) -> Self {
        Self {
            reference: format!("{resource_type}/{id}"),
            display: None,
        }
    }

    /// Parse the id out of a `ResourceType/id` reference.
    pub fn parse_id(&self) -> Option<&str> {
        match self.reference.split_once('/') {
            Some((type_part, id)) if !type_part.is_empty() && !id.is_empty() => Some(id),
            _ => None,
        }
    }
}

/// FHIR Extension. Nested extensions and `valueCodeableConcept` are typed
/// because the nationality rule walks them; every other `value[x]` choice
/// stays in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Extension {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,

    #[serde(rename = "valueCodeableConcept", skip_serializing_if = "Option::is_none")]
    pub value_codeable_concept: Option<CodeableConcept>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
