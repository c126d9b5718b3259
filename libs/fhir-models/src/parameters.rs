//! Parameters resource - the operation input container.

use crate::complex::{Meta, Reference};
use crate::RESOURCE_PARAMETERS;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Parameters {
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

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameter: Vec<Parameter>,
}

fn default_resource_type() -> String {
    RESOURCE_PARAMETERS.to_string()
}

/// A single named parameter; either an embedded resource or a scalar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Embedded resource kept as raw JSON; typed decoding happens at the
    /// use-case boundary where the expected shape is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_reference: Option<Reference>,
}

impl Parameters {
    /// Find a parameter by name.
    pub fn find(&self, name: &str) -> Option<&Parameter> {
        self.parameter.iter().find(|p| p.name == name)
    }
}
