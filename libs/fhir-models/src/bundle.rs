//! Bundle resource - transaction commits and search results.

use crate::RESOURCE_BUNDLE;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum BundleType {
    #[default]
    Transaction,
    TransactionResponse,
    Searchset,
    Batch,
    BatchResponse,
    Collection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Bundle {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,

    #[serde(
        rename = "resourceType",
        default = "default_resource_type",
        skip_serializing_if = "String::is_empty"
    )]
    pub resource_type: String,

    #[serde(rename = "type", default)]
    pub type_: BundleType,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,
}

fn default_resource_type() -> String {
    RESOURCE_BUNDLE.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub full_url: String,

    /// Entry resources stay raw: a transaction mixes Parameters, Tasks and
    /// Patients, and search responses can carry anything the store returns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<BundleEntryRequest>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct BundleEntryRequest {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub method: String, // POST | PUT

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String, // resource type, or "Type/id"
}

impl Bundle {
    /// Fresh transaction bundle with a generated-elsewhere id.
    pub fn transaction(id: String) -> Self {
        Self {
            id,
            resource_type: RESOURCE_BUNDLE.to_string(),
            type_: BundleType::Transaction,
            entry: Vec::new(),
        }
    }

    /// Append a `POST {resource_type}` entry.
    pub fn post<T: Serialize>(&mut self, resource_type: &str, resource: &T) {
        self.entry.push(BundleEntry {
            full_url: String::new(),
            resource: serde_json::to_value(resource).ok(),
            request: Some(BundleEntryRequest {
                method: "POST".to_string(),
                url: resource_type.to_string(),
            }),
        });
    }

    /// Append a `PUT {resource_type}/{id}` entry.
    pub fn put<T: Serialize>(&mut self, resource_type: &str, id: &str, resource: &T) {
        self.entry.push(BundleEntry {
            full_url: String::new(),
            resource: serde_json::to_value(resource).ok(),
            request: Some(BundleEntryRequest {
                method: "PUT".to_string(),
                url: format!("{resource_type}/{id}"),
            }),
        });
    }
}
