//! Task resource - the workflow tracker.

use crate::complex::{CodeableConcept, Coding, Meta, Reference};
use crate::{CODING_SYSTEM_RESOURCE_TYPES, RESOURCE_TASK, TASK_INTENT_ORDER};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Task lifecycle. `InProgress` is the only non-terminal state; the engine
/// never transitions a task out of a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    InProgress,
    Completed,
    Rejected,
    Canceled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Task {
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

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_status: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub intent: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub input: Vec<TaskInput>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<TaskOutput>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_resource_type() -> String {
    RESOURCE_TASK.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_reference: Option<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskOutput {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value_reference: Option<Reference>,
}

/// Typed reference input pointing at another resource, as carried by
/// workflow tasks (`input[0]` is always the originating Parameters).
pub fn resource_task_input(resource_type: &str, id: &str) -> TaskInput {
    TaskInput {
        type_: Some(CodeableConcept {
            coding: vec![Coding {
                system: Some(CODING_SYSTEM_RESOURCE_TYPES.to_string()),
                code: Some(resource_type.to_string()),
                ..Coding::default()
            }],
            text: None,
        }),
        value_reference: Some(Reference::to(resource_type, id)),
        value_string: None,
    }
}

/// Typed reference output, the `output[]` counterpart of
/// [`resource_task_input`].
pub fn resource_task_output(resource_type: &str, id: &str) -> TaskOutput {
    TaskOutput {
        type_: Some(CodeableConcept {
            coding: vec![Coding {
                system: Some(CODING_SYSTEM_RESOURCE_TYPES.to_string()),
                code: Some(resource_type.to_string()),
                ..Coding::default()
            }],
            text: None,
        }),
        value_reference: Some(Reference::to(resource_type, id)),
    }
}

impl Task {
    /// Skeleton for a freshly created workflow task.
    pub fn new_workflow(id: String, profile: &str) -> Self {
        Self {
            id,
            resource_type: RESOURCE_TASK.to_string(),
            meta: Some(Meta::with_profile(profile)),
            intent: TASK_INTENT_ORDER.to_string(),
            authored_on: Some(Utc::now()),
            ..Task::default()
        }
    }
}
