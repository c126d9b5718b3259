//! Shared test support: in-memory fakes for the three collaborators,
//! request fixtures and a router harness.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::{Method, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sijil_models::{
    Bundle, OperationOutcome, Parameters, Patient, Task, PROFILE_PATIENT_CONFIRM_CREATE_REQUEST,
    PROFILE_PATIENT_CONFIRM_UPDATE_IDENTITY_REQUEST, PROFILE_PATIENT_CREATE_REQUEST,
    PROFILE_PATIENT_IDENTIFIED, PROFILE_PATIENT_OPERATION_UPDATE,
    PROFILE_PATIENT_OPERATION_UPDATE_EMAIL, PROFILE_PATIENT_OPERATION_UPDATE_IDENTITY,
    PROFILE_PATIENT_UPDATE_EMAIL_REQUEST, PROFILE_PATIENT_UPDATE_IDENTITY_REQUEST,
    PROFILE_PATIENT_UPDATE_REQUEST,
};
use sijil_mpi::api::create_router;
use sijil_mpi::clients::{
    ClinicalStore, DocumentRegistry, Otp, OtpService, PatientSearch, RegistrySearchResult,
    TaskSearch, ValidateOtp,
};
use sijil_mpi::config::{ClinicalStoreConfig, Config, LoggingConfig, OtpConfig, ServerConfig};
use sijil_mpi::services::PatientService;
use sijil_mpi::state::AppState;
use sijil_mpi::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// In-memory clinical store. Seeded collections stand in for persisted
/// resources; every search/commit argument is recorded for assertions.
#[derive(Default)]
pub struct TestStore {
    pub bundles: Mutex<Vec<Bundle>>,
    pub tasks: Mutex<Vec<Task>>,
    pub patients: Mutex<Vec<Patient>>,
    pub parameters: Mutex<Vec<Parameters>>,
    /// Returned by identifier-criteria patient searches.
    pub dupl_patients: Mutex<Vec<Patient>>,
    /// Returned by phone-criteria patient searches (fraud cap).
    pub phone_patients: Mutex<Vec<Patient>>,
    pub validate_calls: AtomicUsize,
    pub task_search_args: Mutex<Vec<TaskSearch>>,
    pub patient_search_args: Mutex<Vec<PatientSearch>>,
}

#[async_trait]
impl ClinicalStore for TestStore {
    async fn validate_parameters(&self, _params: &Parameters) -> Result<OperationOutcome> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(OperationOutcome::default())
    }

    async fn create_bundle(&self, bundle: &Bundle) -> Result<Bundle> {
        self.bundles.lock().unwrap().push(bundle.clone());
        Ok(bundle.clone())
    }

    async fn get_patient_by_id(&self, id: &str) -> Result<Patient> {
        self.patients
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| Error::NotExist("not found".to_string()))
    }

    async fn get_task_by_id(&self, id: &str) -> Result<Task> {
        self.tasks
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| Error::NotExist("not found".to_string()))
    }

    async fn get_parameters_by_id(&self, id: &str) -> Result<Parameters> {
        self.parameters
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| Error::NotExist("not found".to_string()))
    }

    async fn search_tasks(&self, search: &TaskSearch) -> Result<Vec<Task>> {
        self.task_search_args.lock().unwrap().push(search.clone());
        Ok(self.tasks.lock().unwrap().clone())
    }

    async fn search_patients(&self, search: &PatientSearch) -> Result<Vec<Patient>> {
        self.patient_search_args.lock().unwrap().push(search.clone());
        if search.phone.is_some() {
            Ok(self.phone_patients.lock().unwrap().clone())
        } else {
            Ok(self.dupl_patients.lock().unwrap().clone())
        }
    }
}

/// In-memory OTP service: issued codes are keyed by process id (the task
/// id), so tests can assert the OTP ↔ workflow binding.
#[derive(Default)]
pub struct TestOtp {
    pub otps: Mutex<HashMap<String, Otp>>,
}

pub const TEST_OTP_CODE: &str = "1234";

impl TestOtp {
    pub fn seed(&self, process_id: &str, code: &str, value: &str) {
        self.otps.lock().unwrap().insert(
            process_id.to_string(),
            Otp {
                code: code.to_string(),
                value: value.to_string(),
                ..Otp::default()
            },
        );
    }
}

#[async_trait]
impl OtpService for TestOtp {
    async fn generate_by_phone(&self, phone: &str, process_id: &str) -> Result<Otp> {
        let otp = Otp {
            code: TEST_OTP_CODE.to_string(),
            value: phone.to_string(),
            ..Otp::default()
        };
        self.otps
            .lock()
            .unwrap()
            .insert(process_id.to_string(), otp.clone());
        Ok(otp)
    }

    async fn validate(&self, params: &ValidateOtp) -> Result<()> {
        match self.otps.lock().unwrap().get(&params.process_id) {
            Some(otp) if otp.code == params.code && otp.value == params.value => Ok(()),
            _ => Err(Error::NotExist("not found".to_string())),
        }
    }
}

#[derive(Default)]
pub struct TestRegistry {
    pub invalid: AtomicBool,
}

#[async_trait]
impl DocumentRegistry for TestRegistry {
    async fn search(&self, _identifier: &sijil_models::Identifier) -> Result<RegistrySearchResult> {
        Ok(RegistrySearchResult {
            is_valid: !self.invalid.load(Ordering::SeqCst),
        })
    }
}

pub struct TestEnv {
    pub store: Arc<TestStore>,
    pub otp: Arc<TestOtp>,
    pub registry: Arc<TestRegistry>,
    pub service: PatientService,
}

pub fn test_env() -> TestEnv {
    let store = Arc::new(TestStore::default());
    let otp = Arc::new(TestOtp::default());
    let registry = Arc::new(TestRegistry::default());

    let service = PatientService::new(store.clone(), otp.clone(), registry.clone());

    TestEnv {
        store,
        otp,
        registry,
        service,
    }
}

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        clinical: ClinicalStoreConfig {
            base_url: "http://clinical.test/fhir".to_string(),
        },
        otp: OtpConfig {
            base_url: "http://otp.test".to_string(),
            request_timeout_seconds: 1,
        },
        logging: LoggingConfig {
            level: "error".to_string(),
            json: false,
        },
    }
}

pub fn test_app(env: &TestEnv) -> Router {
    let state = AppState::with_clients(
        test_config(),
        env.store.clone(),
        env.otp.clone(),
        env.registry.clone(),
    );
    create_router(state)
}

/// Drive one request through the router and decode the JSON response.
pub async fn request(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            axum::body::Body::from(value.to_string())
        }
        None => axum::body::Body::empty(),
    };

    let response = app
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response");

    let status = response.status();
    let bytes = response.into_body().collect().await.expect("body").to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };

    (status, value)
}

// --- fixtures -----------------------------------------------------------

pub const CREATE_PARAMS_ID: &str = "9e293127-8ffc-462c-aea0-d5464794b526";
pub const UPDATE_IDENTITY_PARAMS_ID: &str = "244a8e88-c0b0-4d60-b5d7-14afbe79f5f5";
pub const UPDATE_IDENTITY_TASK_ID: &str = "6dc1c86e-3b4e-4e97-860c-9196bd9aa412";
pub const CREATE_PHONE: &str = "+380673212121";
pub const IDENTITY_PHONE: &str = "+380672200333";
pub const VALID_NI: &str = "1058529940";

fn nationality_extension(code: &str) -> Value {
    json!({
        "url": "http://ksa-ehealth.sa/fhir/StructureDefinition/ksa-ehealth-patient-nationality",
        "extension": [{
            "url": "code",
            "valueCodeableConcept": {
                "coding": [{
                    "code": code,
                    "system": "urn:iso:std:iso:3166:-2",
                    "display": "Saudi, Saudi Arabian"
                }]
            }
        }]
    })
}

pub fn create_patient_body() -> Value {
    json!({
        "resourceType": "Parameters",
        "id": CREATE_PARAMS_ID,
        "meta": {"profile": [PROFILE_PATIENT_CREATE_REQUEST]},
        "parameter": [{
            "name": "patient",
            "resource": {
                "resourceType": "Patient",
                "id": CREATE_PARAMS_ID,
                "meta": {"profile": [PROFILE_PATIENT_IDENTIFIED]},
                "extension": [nationality_extension("SA")],
                "identifier": [{
                    "type": {
                        "coding": [{
                            "system": "http://terminology.hl7.org/CodeSystem/v2-0203",
                            "code": "NI"
                        }]
                    },
                    "system": "urn:oid:1.2.36.146.595.217.0.1",
                    "value": VALID_NI,
                    "period": {"start": "2020-05-06", "end": "2050-01-01"},
                    "assigner": {"display": "Acme Healthcare"}
                }],
                "active": true,
                "name": [{
                    "use": "official",
                    "family": "Chalmers",
                    "given": ["Peter", "James"]
                }],
                "telecom": [{
                    "system": "phone",
                    "value": CREATE_PHONE,
                    "use": "mobile",
                    "rank": 2
                }],
                "gender": "male",
                "birthDate": "2020-12-25",
                "maritalStatus": {
                    "coding": [{
                        "system": "http://terminology.hl7.org/CodeSystem/v3-MaritalStatus",
                        "code": "M"
                    }]
                }
            }
        }]
    })
}

pub fn update_patient_body() -> Value {
    let concept = |text: &str| {
        json!({
            "coding": [{"code": "code", "system": "system", "display": "display"}],
            "text": text
        })
    };

    json!({
        "resourceType": "Parameters",
        "id": CREATE_PARAMS_ID,
        "meta": {"profile": [PROFILE_PATIENT_UPDATE_REQUEST]},
        "parameter": [{
            "name": "patient",
            "resource": {
                "resourceType": "Patient",
                "id": CREATE_PARAMS_ID,
                "meta": {"profile": [PROFILE_PATIENT_OPERATION_UPDATE]},
                "extension": [
                    {
                        "url": "http://nphies.sa/fhir/ksa/nphies-fs/StructureDefinition/extension-patient-religion",
                        "valueCodeableConcept": concept("religion")
                    },
                    {
                        "url": "http://nphies.sa/fhir/ksa/nphies-fs/StructureDefinition/extension-patient-importance",
                        "valueCodeableConcept": concept("importance")
                    },
                    {
                        "url": "http://nphies.sa/fhir/ksa/nphies-fs/StructureDefinition/extension-patient-occupation",
                        "valueCodeableConcept": concept("occupation")
                    },
                    {
                        "url": "http://nphies.sa/fhir/ksa/nphies-fs/StructureDefinition/extension-patient-citizenship",
                        "valueCodeableConcept": concept("citizenship")
                    }
                ],
                "contact": [{
                    "relationship": [concept("relationship")],
                    "name": {"family": "family", "given": ["given1"]},
                    "telecom": [{"system": "phone", "value": "(03) 3410 5613", "use": "mobile"}]
                }],
                "communication": [{
                    "language": concept("language"),
                    "preferred": false
                }],
                "maritalStatus": {
                    "coding": [{
                        "system": "http://terminology.hl7.org/CodeSystem/v3-MaritalStatus",
                        "code": "M"
                    }]
                }
            }
        }]
    })
}

pub fn update_email_body() -> Value {
    json!({
        "resourceType": "Parameters",
        "id": "9e293127-8ffc-462c-aea0-d5464794b527",
        "meta": {"profile": [PROFILE_PATIENT_UPDATE_EMAIL_REQUEST]},
        "parameter": [{
            "name": "patient",
            "resource": {
                "resourceType": "Patient",
                "id": "9e293127-8ffc-462c-aea0-d5464794b527",
                "meta": {"profile": [PROFILE_PATIENT_OPERATION_UPDATE_EMAIL]},
                "telecom": [{"system": "email", "value": "test@test1.test"}]
            }
        }]
    })
}

pub fn update_identity_body() -> Value {
    json!({
        "resourceType": "Parameters",
        "id": UPDATE_IDENTITY_PARAMS_ID,
        "meta": {"profile": [PROFILE_PATIENT_UPDATE_IDENTITY_REQUEST]},
        "parameter": [
            {"name": "confirmationMethod", "valueString": IDENTITY_PHONE},
            {
                "name": "patient",
                "resource": {
                    "resourceType": "Patient",
                    "id": UPDATE_IDENTITY_PARAMS_ID,
                    "meta": {"profile": [PROFILE_PATIENT_OPERATION_UPDATE_IDENTITY]},
                    "extension": [nationality_extension("SA")],
                    "identifier": [{
                        "type": {
                            "coding": [{
                                "system": "http://terminology.hl7.org/CodeSystem/v2-0203",
                                "code": "NI"
                            }]
                        },
                        "system": "http://nphies.sa/identifier/passportnumber",
                        "value": VALID_NI,
                        "period": {"start": "2022-02-15", "end": "2050-01-01"},
                        "assigner": {"display": "Acme Healthcare"}
                    }],
                    "name": [{
                        "use": "official",
                        "family": "AL-SAUD",
                        "given": ["Ahmad", "Hussain"]
                    }],
                    "gender": "male",
                    "birthDate": "1992-10-02"
                }
            }
        ]
    })
}

pub fn update_identity_body_without_params() -> Value {
    json!({
        "resourceType": "Parameters",
        "id": UPDATE_IDENTITY_PARAMS_ID,
        "meta": {"profile": [PROFILE_PATIENT_UPDATE_IDENTITY_REQUEST]},
        "parameter": []
    })
}

pub fn confirm_create_body(otp: &str, task_id: &str) -> Value {
    json!({
        "resourceType": "Parameters",
        "id": CREATE_PARAMS_ID,
        "meta": {"profile": [PROFILE_PATIENT_CONFIRM_CREATE_REQUEST]},
        "parameter": [
            {"name": "otp", "valueString": otp},
            {"name": "task_id", "valueReference": {"reference": format!("Task/{task_id}")}}
        ]
    })
}

pub fn confirm_identity_body(otp: &str, task_id: &str) -> Value {
    json!({
        "resourceType": "Parameters",
        "id": "b488aa02-f181-4b50-bdca-63b74c5ee447",
        "meta": {"profile": [PROFILE_PATIENT_CONFIRM_UPDATE_IDENTITY_REQUEST]},
        "parameter": [
            {"name": "otp", "valueString": otp},
            {"name": "task_id", "valueReference": {"reference": format!("Task/{task_id}")}}
        ]
    })
}

// --- decoding helpers ---------------------------------------------------

pub fn parameters_from(value: Value) -> Parameters {
    serde_json::from_value(value).expect("Parameters fixture")
}

pub fn patient_param(params: &Parameters, index: usize) -> Patient {
    serde_json::from_value(
        params.parameter[index]
            .resource
            .clone()
            .expect("patient resource"),
    )
    .expect("Patient fixture")
}

pub fn set_patient_param(params: &mut Parameters, index: usize, patient: &Patient) {
    params.parameter[index].resource = Some(serde_json::to_value(patient).expect("patient json"));
}

/// Decode the `i`-th bundle entry into a typed resource.
pub fn entry_resource<T: serde::de::DeserializeOwned>(bundle: &Bundle, index: usize) -> T {
    serde_json::from_value(bundle.entry[index].resource.clone().expect("entry resource"))
        .expect("typed entry")
}

pub fn entry_request(bundle: &Bundle, index: usize) -> (String, String) {
    let request = bundle.entry[index].request.clone().expect("entry request");
    (request.method, request.url)
}

/// An in-progress task whose first input references the given Parameters.
pub fn seeded_task(id: &str, params_id: &str) -> Task {
    serde_json::from_value(json!({
        "resourceType": "Task",
        "id": id,
        "status": "in-progress",
        "input": [{
            "valueReference": {"reference": format!("Parameters/{params_id}")}
        }]
    }))
    .expect("task fixture")
}

/// A stored patient with the given id and activity flags.
pub fn stored_patient(id: &str, active: Option<bool>, deceased: Option<bool>) -> Patient {
    let mut patient = Patient {
        id: id.to_string(),
        resource_type: "Patient".to_string(),
        active,
        ..Patient::default()
    };
    patient.deceased_boolean = deceased;
    patient
}

/// Today's date in the format FHIR periods carry.
pub fn today() -> String {
    chrono::Utc::now().date_naive().format("%Y-%m-%d").to_string()
}
