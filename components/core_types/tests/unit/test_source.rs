//! Unit tests for source locations and traceback frames

use core_types::{CallType, SourceLocation, StackFrame};

#[test]
fn test_location_prefix() {
    let loc = SourceLocation::new(Some("lib.js"), 40);
    assert_eq!(loc.prefix(), "lib.js:40: ");
}

#[test]
fn test_location_without_file() {
    let loc = SourceLocation::new(None, 1);
    assert_eq!(loc.to_string(), "<unknown>:1");
    assert!(loc.filename.is_none());
}

#[test]
fn test_location_equality() {
    assert_eq!(
        SourceLocation::new(Some("a"), 1),
        SourceLocation::new(Some("a"), 1)
    );
    assert_ne!(
        SourceLocation::new(Some("a"), 1),
        SourceLocation::new(Some("a"), 2)
    );
}

#[test]
fn test_construct_frame_without_name() {
    let frame = StackFrame {
        call_type: CallType::Construct,
        function_name: None,
        location: Some(SourceLocation::new(Some("x.js"), 9)),
    };
    assert_eq!(frame.to_string(), "x.js:9: new ?");
}
