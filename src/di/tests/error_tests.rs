use crate::di::{Args, ArgumentRecord, ArgumentSource, TypeKey};
use crate::test_utils::mocks::Clock;
use crate::MockerError;
use std::sync::Arc;

#[test]
fn test_not_found_error() {
    let error = MockerError::not_found::<String>();
    assert!(matches!(error, MockerError::NotFound(_)));
    assert!(error.to_string().contains("String"));
}

#[test]
fn test_not_found_key_includes_mock_name() {
    let error = MockerError::not_found_key(&TypeKey::named::<dyn Clock>("wall"));
    assert!(error.to_string().contains("Clock[wall]"));
}

#[test]
fn test_ambiguous_error() {
    let error = MockerError::ambiguous::<u8>("2 constructors match (u8)");
    assert!(matches!(error, MockerError::AmbiguousConstructor { .. }));
    assert!(error.to_string().contains("u8"));
    assert!(error.to_string().contains("2 constructors match"));
}

#[test]
fn test_construction_error() {
    let error = MockerError::construction::<String>("bad input");
    assert!(matches!(error, MockerError::ConstructionFailed { .. }));
    assert!(error.to_string().contains("String"));
    assert!(error.to_string().contains("bad input"));
}

#[test]
fn test_invalid_argument_error() {
    let error = MockerError::invalid("empty name");
    assert_eq!(error.to_string(), "Invalid argument: empty name");
}

#[test]
fn test_no_resolvable_constructor_lists_candidates() {
    let error = MockerError::NoResolvableConstructor {
        type_name: "Service".to_string(),
        blocked: vec!["new(a: u8) needs 'a' (u8)".to_string(), "other".to_string()],
    };
    assert_eq!(
        error.to_string(),
        "No resolvable constructor for Service: new(a: u8) needs 'a' (u8); other"
    );
}

#[test]
fn test_error_equality() {
    assert_eq!(
        MockerError::not_found::<String>(),
        MockerError::not_found::<String>()
    );
    assert_ne!(MockerError::not_found::<String>(), MockerError::not_found::<i32>());
}

#[test]
fn test_args_report_type_mismatch() {
    let records = vec![ArgumentRecord::new(
        "attempts",
        TypeKey::of::<u32>(),
        ArgumentSource::Value,
        Arc::new(3u32),
    )];
    let args = Args::new("RetryPolicy", &records);

    assert_eq!(args.value::<u32>(0), Ok(3));

    let mismatch = args.value::<String>(0).unwrap_err();
    assert!(matches!(mismatch, MockerError::ConstructionFailed { .. }));
    assert!(mismatch.to_string().contains("argument 0"));

    let missing = match args.object::<dyn Clock>(1) {
        Err(error) => error,
        Ok(_) => panic!("expected a missing argument"),
    };
    assert!(missing.to_string().contains("missing argument 1"));
}
