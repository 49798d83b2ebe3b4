#![allow(clippy::unwrap_used, clippy::expect_used)]

use schemapack_core::core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};
use schemapack_core::drift::check_drift;
use schemapack_core::errors::SchemaPackError;
use schemapack_core::logging_facility::test_capture::init_test_capture;
use schemapack_core::model::{ConstructSchema, PackageDefinition};
use schemapack_core::{apply_package, log_op_end, log_op_error, log_op_start};
use schemapack_core::{ApplyOptions, Document};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    capture.assert_event_exists(op_name, EVENT_START);
}

#[test]
fn test_log_op_end_macro_records_duration() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let ends: Vec<_> = capture
        .events_for_op(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END))
        .collect();
    assert_eq!(ends.len(), 1);
    assert_eq!(ends[0].field("duration_ms"), Some("42"));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err = SchemaPackError::PackageNotFound {
        package_id: "p1".to_string(),
    };
    log_op_error!(op_name, err, duration_ms = 10);

    let errors: Vec<_> = capture
        .events_for_op(op_name)
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .collect();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field("err.code"), Some("ERR_NOT_FOUND"));
}

#[test]
fn test_apply_package_logs_single_start_and_end() {
    let capture = init_test_capture();
    let def = PackageDefinition::new("pkg-log-apply", "Logged")
        .with_schema(ConstructSchema::new("svc", "Service"));

    let mut doc = Document::new();
    apply_package(&mut doc, &def, &ApplyOptions::default()).unwrap();

    let starts = capture.package_events("apply_package", EVENT_START, "pkg-log-apply");
    let ends = capture.package_events("apply_package", EVENT_END, "pkg-log-apply");

    assert_eq!(starts.len(), 1);
    assert_eq!(ends.len(), 1);
    assert_eq!(ends[0].field("status"), Some("Applied"));
    assert!(ends[0].field("duration_ms").is_some());
}

#[test]
fn test_check_drift_failure_logs_error_code() {
    let capture = init_test_capture();
    let doc = Document::new();

    assert!(check_drift(&doc, "pkg-log-missing").is_err());

    let errors = capture.package_events("check_drift", EVENT_END_ERROR, "pkg-log-missing");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field("err.code"), Some("ERR_NOT_FOUND"));
}

#[test]
fn test_op_macros_usable_as_match_arms() {
    let capture = init_test_capture();
    let op_name = "test_match_arm_unique_4";

    for outcome in [Ok(3_u64), Err("pkg-arm")] {
        match outcome {
            Ok(ms) => log_op_end!(op_name, duration_ms = ms),
            Err(package_id) => log_op_error!(
                op_name,
                SchemaPackError::PackageNotFound {
                    package_id: package_id.to_string(),
                },
                duration_ms = 0,
                package_id = package_id
            ),
        }
    }

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END));
    assert_eq!(events[1].event.as_deref(), Some(EVENT_END_ERROR));
    assert_eq!(events[1].package_id.as_deref(), Some("pkg-arm"));
}
