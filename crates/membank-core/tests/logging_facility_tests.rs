#![allow(clippy::unwrap_used, clippy::expect_used)]

use membank_core::errors::{ExError, ExErrorKind, MembankError};
use membank_core::logging_facility::test_capture::init_test_capture;
use membank_core::{log_op_end, log_op_error, log_op_start};
use membank_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    let start_events = capture.count_events(|e| {
        e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_START)
    });
    assert_eq!(start_events, 1, "Should have captured one start event");
}

#[test]
fn test_log_op_end_macro_records_duration() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let events = capture.events_for_op(op_name);
    assert_eq!(events.len(), 1, "Should have exactly one end event");
    assert_eq!(events[0].event.as_deref(), Some(EVENT_END));
    assert_eq!(events[0].fields.get("duration_ms"), Some(&"42".to_string()));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    let err: ExError = MembankError::ReservedName {
        table: "put".to_string(),
    }
    .into();
    log_op_error!(op_name, &err, duration_ms = 10);

    capture.assert_event_exists(op_name, EVENT_END_ERROR);
    let events = capture.events_for_op(op_name);
    assert_eq!(
        events[0].fields.get("err.code"),
        Some(&"ERR_VALIDATION".to_string())
    );
    assert_eq!(
        events[0].fields.get("err.kind"),
        Some(&format!("{:?}", ExErrorKind::Validation))
    );
}

#[test]
fn test_start_fields_carry_table() {
    let capture = init_test_capture();
    let op_name = "test_log_fields_unique_4";

    log_op_start!(op_name, table = "dog", field = "breed");

    let events = capture.events_for_op(op_name);
    assert_eq!(events[0].table.as_deref(), Some("dog"));
    assert_eq!(events[0].fields.get("field"), Some(&"breed".to_string()));
}

#[test]
#[should_panic(expected = "Expected event")]
fn test_assert_event_exists_fails_for_missing_event() {
    let capture = init_test_capture();
    capture.assert_event_exists("nonexistent_op_truly_unique_999", EVENT_START);
}
