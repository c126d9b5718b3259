//! Create-patient workflow tests against in-memory collaborators.

mod support;

use serde_json::Value;
use sijil_models::{Parameters, Task, TaskStatus, PROFILE_TASK_PATIENT_CREATE};
use support::*;

#[tokio::test]
async fn create_patient_success() {
    let env = test_env();
    let params = parameters_from(create_patient_body());

    let task = env.service.create_patient(&params).await.expect("create");

    assert_eq!(env.store.validate_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(env.store.patient_search_args.lock().unwrap().len(), 1);

    let bundles = env.store.bundles.lock().unwrap();
    assert_eq!(bundles.len(), 1);
    assert_eq!(bundles[0].entry.len(), 2);

    let bundle_params: Parameters = entry_resource(&bundles[0], 0);
    assert_eq!(bundle_params, params);
    assert_eq!(entry_request(&bundles[0], 0), ("POST".into(), "Parameters".into()));

    let bundle_task: Task = entry_resource(&bundles[0], 1);
    assert_eq!(bundle_task, task);
    assert_eq!(entry_request(&bundles[0], 1), ("POST".into(), "Task".into()));

    assert_eq!(task.status, TaskStatus::InProgress);
    assert_eq!(
        task.business_status.as_ref().unwrap().text.as_deref(),
        Some("OTP code sent")
    );
    assert_eq!(task.intent, "order");
    assert!(task.authored_on.is_some());
    assert!(!task.id.is_empty());
    assert_eq!(
        task.meta.as_ref().unwrap().profile,
        [PROFILE_TASK_PATIENT_CREATE]
    );
    assert_eq!(task.input.len(), 1);
    assert_eq!(
        task.input[0].value_reference.as_ref().unwrap().reference,
        format!("Parameters/{CREATE_PARAMS_ID}")
    );

    // The OTP is bound to the workflow through the task id.
    let otps = env.otp.otps.lock().unwrap();
    assert_eq!(otps.len(), 1);
    assert_eq!(otps[&task.id].value, CREATE_PHONE);
}

#[tokio::test]
async fn create_patient_rejects_inactive_and_forbidden_params() {
    let env = test_env();
    let mut params = parameters_from(create_patient_body());
    let mut patient = patient_param(&params, 0);

    patient.active = Some(false);
    set_patient_param(&mut params, 0, &patient);

    let err = env.service.create_patient(&params).await.unwrap_err();
    assert!(err.to_string().contains("should have true value"), "{err}");

    // Explicit nulls still count as present keys.
    patient.active = Some(true);
    let mut resource = serde_json::to_value(&patient).unwrap();
    resource["deceasedBoolean"] = Value::Null;
    resource["photo"] = Value::Null;
    params.parameter[0].resource = Some(resource);

    let err = env.service.create_patient(&params).await.unwrap_err();
    assert!(
        err.to_string()
            .contains("forbidden parameters: deceasedBoolean,photo"),
        "{err}"
    );
}

#[tokio::test]
async fn create_patient_internal_rules() {
    let env = test_env();
    let mut params = parameters_from(create_patient_body());
    let mut patient = patient_param(&params, 0);

    let extensions = std::mem::take(&mut patient.extension);
    set_patient_param(&mut params, 0, &patient);

    let err = env.service.create_patient(&params).await.unwrap_err();
    assert!(err.to_string().contains("nationality is not passed"), "{err}");

    patient.extension = extensions;
    patient.identifier[0].period.as_mut().unwrap().end = Some("2010-01-01".to_string());
    set_patient_param(&mut params, 0, &patient);

    let err = env.service.create_patient(&params).await.unwrap_err();
    assert!(err.to_string().contains("identifier is expired"), "{err}");

    // An identifier expiring today is still usable.
    patient.identifier[0].period.as_mut().unwrap().end = Some(today());
    let valid_value = patient.identifier[0].value.clone();
    patient.identifier[0].value = "1234567890".to_string();
    set_patient_param(&mut params, 0, &patient);

    let err = env.service.create_patient(&params).await.unwrap_err();
    assert!(
        err.to_string().contains("invalid identifier value format"),
        "{err}"
    );

    patient.identifier[0].value = valid_value;
    patient.identifier[0].type_.coding[0].code = Some("some-code".to_string());
    set_patient_param(&mut params, 0, &patient);

    let err = env.service.create_patient(&params).await.unwrap_err();
    assert!(
        err.to_string()
            .contains("identifier code should be one of NI,DP,CZ,JHN"),
        "{err}"
    );

    patient.identifier[0].type_.coding[0].code = Some("NI".to_string());
    set_patient_param(&mut params, 0, &patient);

    env.service.create_patient(&params).await.expect("valid again");
}

#[tokio::test]
async fn create_patient_detects_duplicate_patients() {
    let env = test_env();
    let params = parameters_from(create_patient_body());
    let patient = patient_param(&params, 0);

    env.service.create_patient(&params).await.expect("no duplicates");

    {
        let args = env.store.patient_search_args.lock().unwrap();
        assert_eq!(args.len(), 1);
        let ident = args[0].identifier.as_ref().unwrap();
        assert_eq!(ident.value, VALID_NI);
        assert_eq!(
            ident.type_,
            "http://terminology.hl7.org/CodeSystem/v2-0203|NI"
        );
    }

    env.store.dupl_patients.lock().unwrap().push(patient);

    let err = env.service.create_patient(&params).await.unwrap_err();
    assert!(err.to_string().contains("such person already exists"), "{err}");
}

#[tokio::test]
async fn create_patient_cancels_duplicate_tasks() {
    let env = test_env();
    let params = parameters_from(create_patient_body());

    env.service.create_patient(&params).await.expect("create");
    {
        // No identifier hit, so the telecom search ran as well.
        let args = env.store.task_search_args.lock().unwrap();
        assert_eq!(args.len(), 2);
        assert!(args[0].identifier.is_some() && args[0].telecom.is_none());
        let telecom = args[1].telecom.as_ref().unwrap();
        assert_eq!(telecom.value, CREATE_PHONE);
        assert_eq!(telecom.system, "phone");
        assert_eq!(telecom.use_, "mobile");
        assert_eq!(telecom.birth_date, "2020-12-25");
        assert!(args[1].identifier.is_none());
    }

    // A found task that is not in-progress is not a duplicate.
    env.store.tasks.lock().unwrap().push(Task {
        id: "t-done".to_string(),
        status: TaskStatus::Completed,
        ..Task::default()
    });
    env.service.create_patient(&params).await.expect("create");
    assert_eq!(env.store.bundles.lock().unwrap()[1].entry.len(), 2);

    // An in-progress duplicate gets canceled inside the same bundle.
    env.store.tasks.lock().unwrap()[0].status = TaskStatus::InProgress;
    env.service.create_patient(&params).await.expect("create");

    let bundles = env.store.bundles.lock().unwrap();
    let bundle = bundles.last().unwrap();
    assert_eq!(bundle.entry.len(), 3);
    assert_eq!(entry_request(bundle, 2), ("PUT".into(), "Task/t-done".into()));
    let canceled: Task = entry_resource(bundle, 2);
    assert_eq!(canceled.status, TaskStatus::Canceled);
}

#[tokio::test]
async fn create_patient_requires_mobile_phone() {
    let env = test_env();
    let mut params = parameters_from(create_patient_body());
    let mut patient = patient_param(&params, 0);

    patient.telecom[0].system = Some("not-existing-system".to_string());
    patient.telecom[0].use_ = Some("not-existing-use".to_string());
    set_patient_param(&mut params, 0, &patient);

    let err = env.service.create_patient(&params).await.unwrap_err();
    assert!(err.to_string().contains("no mobile phone found"), "{err}");

    // phone system alone is not enough, the use must be mobile too
    patient.telecom[0].system = Some("phone".to_string());
    set_patient_param(&mut params, 0, &patient);

    let err = env.service.create_patient(&params).await.unwrap_err();
    assert!(err.to_string().contains("no mobile phone found"), "{err}");

    patient.telecom[0].use_ = Some("mobile".to_string());
    set_patient_param(&mut params, 0, &patient);

    env.service.create_patient(&params).await.expect("create");
    assert_eq!(env.otp.otps.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn create_patient_rejects_invalid_registry_document() {
    let env = test_env();
    env.registry
        .invalid
        .store(true, std::sync::atomic::Ordering::SeqCst);

    let params = parameters_from(create_patient_body());
    let err = env.service.create_patient(&params).await.unwrap_err();
    assert!(err.to_string().contains("document is not valid"), "{err}");
}

#[tokio::test]
async fn embedded_patient_profile_must_match_operation() {
    let env = test_env();

    // create
    let mut params = parameters_from(create_patient_body());
    let mut patient = patient_param(&params, 0);
    patient.meta.as_mut().unwrap().profile[0].push_str("123");
    set_patient_param(&mut params, 0, &patient);

    let err = env.service.create_patient(&params).await.unwrap_err();
    assert!(
        err.to_string()
            .contains("given patient profile is not supported for current operation"),
        "{err}"
    );

    // update
    let mut params = parameters_from(update_patient_body());
    let mut patient = patient_param(&params, 0);
    patient.meta.as_mut().unwrap().profile[0].push_str("123");
    set_patient_param(&mut params, 0, &patient);

    let err = env
        .service
        .update_patient(CREATE_PARAMS_ID, &params)
        .await
        .unwrap_err();
    assert!(
        err.to_string()
            .contains("given patient profile is not supported for current operation"),
        "{err}"
    );

    // update-identity (patient is the second parameter)
    let mut params = parameters_from(update_identity_body());
    let mut patient = patient_param(&params, 1);
    patient.meta.as_mut().unwrap().profile[0].push_str("123");
    set_patient_param(&mut params, 1, &patient);

    let err = env
        .service
        .update_patient_identity(UPDATE_IDENTITY_PARAMS_ID, &params)
        .await
        .unwrap_err();
    assert!(
        err.to_string()
            .contains("given patient profile is not supported for current operation"),
        "{err}"
    );
}

#[tokio::test]
async fn create_patient_rejects_empty_parameters() {
    let env = test_env();

    let err = env
        .service
        .create_patient(&Parameters::default())
        .await
        .unwrap_err();
    assert!(
        err.to_string().contains("expected to have at least 1 elements"),
        "{err}"
    );

    let mut params = parameters_from(create_patient_body());
    params.parameter.push(params.parameter[0].clone());

    let err = env.service.create_patient(&params).await.unwrap_err();
    assert!(err.to_string().contains("expected to have 1 element"), "{err}");
}
