//! External document registry client - identifier validity lookup.

use crate::Result;
use async_trait::async_trait;
use sijil_models::Identifier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrySearchResult {
    pub is_valid: bool,
}

#[async_trait]
pub trait DocumentRegistry: Send + Sync {
    async fn search(&self, identifier: &Identifier) -> Result<RegistrySearchResult>;
}

/// Registry integration is contract-only for now: the request is logged and
/// every document is reported valid until the registry endpoint goes live.
#[derive(Debug, Clone, Default)]
pub struct DocRegistryClient;

impl DocRegistryClient {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DocumentRegistry for DocRegistryClient {
    async fn search(&self, identifier: &Identifier) -> Result<RegistrySearchResult> {
        let code = identifier.type_.first_code().unwrap_or_default();

        tracing::info!(
            code,
            value = %identifier.value,
            "sending request to external registry"
        );

        Ok(RegistrySearchResult { is_valid: true })
    }
}
