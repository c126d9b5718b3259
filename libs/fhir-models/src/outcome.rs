//! OperationOutcome - the error (and validation) response resource.

use crate::RESOURCE_OPERATION_OUTCOME;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOutcome {
    #[serde(rename = "resourceType", default = "default_resource_type")]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub issue: Vec<OperationOutcomeIssue>,
}

fn default_resource_type() -> String {
    RESOURCE_OPERATION_OUTCOME.to_string()
}

impl Default for OperationOutcome {
    fn default() -> Self {
        Self {
            resource_type: default_resource_type(),
            issue: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct OperationOutcomeIssue {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub severity: String, // fatal | error | warning | information

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,

    /// FHIRPath-ish location of the offending element, one entry per issue.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub expression: Vec<String>,
}

impl OperationOutcome {
    pub fn error(code: &str, diagnostics: &str) -> Self {
        Self {
            resource_type: default_resource_type(),
            issue: vec![OperationOutcomeIssue {
                severity: "error".to_string(),
                code: code.to_string(),
                diagnostics: Some(diagnostics.to_string()),
                expression: Vec::new(),
            }],
        }
    }

    /// First diagnostics string, useful when relaying upstream outcomes.
    pub fn first_diagnostics(&self) -> Option<&str> {
        self.issue.iter().find_map(|i| i.diagnostics.as_deref())
    }
}
