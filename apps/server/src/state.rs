//! Shared application state

use crate::{
    clients::{ClinicalStore, DocRegistryClient, DocumentRegistry, FhirClient, OtpClient, OtpService},
    config::Config,
    services::PatientService,
};
use std::sync::Arc;

/// Shared application state passed to all handlers. The engine holds no
/// workflow state; the clients manage their own connection pools.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub patient_service: Arc<PatientService>,
}

impl AppState {
    /// Wire the HTTP-backed clients into the engine.
    pub fn new(config: Config) -> Self {
        let store: Arc<dyn ClinicalStore> = Arc::new(FhirClient::new(&config.clinical.base_url));
        let otp: Arc<dyn OtpService> = Arc::new(OtpClient::new(&config.otp));
        let registry: Arc<dyn DocumentRegistry> = Arc::new(DocRegistryClient::new());

        Self::with_clients(config, store, otp, registry)
    }

    /// State over externally supplied clients; integration tests inject
    /// in-memory fakes through this.
    pub fn with_clients(
        config: Config,
        store: Arc<dyn ClinicalStore>,
        otp: Arc<dyn OtpService>,
        registry: Arc<dyn DocumentRegistry>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            patient_service: Arc::new(PatientService::new(store, otp, registry)),
        }
    }
}
