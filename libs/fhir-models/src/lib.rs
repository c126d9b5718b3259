//! Typed FHIR resource model for the Sijil master patient index.
//!
//! Only the resources and datatypes the MPI workflows touch are modeled as
//! typed fields; everything else is preserved verbatim through
//! `#[serde(flatten)]` catch-all maps so that a resource survives a
//! serialize → map → deserialize round trip without loss. The generic-map
//! view is what the forbidden-keys check and the identity merge operate on.

mod bundle;
mod complex;
mod constants;
mod outcome;
mod parameters;
mod patient;
mod task;

pub use bundle::{Bundle, BundleEntry, BundleEntryRequest, BundleType};
pub use complex::{
    CodeableConcept, Coding, ContactPoint, Extension, Identifier, Meta, Period, Reference,
};
pub use constants::*;
pub use outcome::{OperationOutcome, OperationOutcomeIssue};
pub use parameters::{Parameter, Parameters};
pub use patient::Patient;
pub use task::{resource_task_input, resource_task_output, Task, TaskInput, TaskOutput, TaskStatus};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// Lossless resource → generic map conversion via canonical JSON
/// serialization.
pub fn to_map<T: Serialize>(resource: &T) -> serde_json::Result<Map<String, Value>> {
    match serde_json::to_value(resource)? {
        Value::Object(map) => Ok(map),
        other => Err(serde::ser::Error::custom(format!(
            "expected a JSON object, got {other}"
        ))),
    }
}

/// Generic map → typed resource conversion, the inverse of [`to_map`].
pub fn from_map<T: DeserializeOwned>(map: Map<String, Value>) -> serde_json::Result<T> {
    serde_json::from_value(Value::Object(map))
}
