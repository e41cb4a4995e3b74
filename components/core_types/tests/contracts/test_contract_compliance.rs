//! Contract compliance tests for core_types
//!
//! These tests verify that the public surface other components rely on
//! exists with the expected shapes and behaviour.

use core_types::{
    number_to_string, string_to_number, to_int32, to_integer, to_uint16, to_uint32, CallType,
    Completion, CompletionKind, ErrorKind, Interner, JsError, Name, ObjRef, Reference,
    SourceLocation, StackFrame, Value,
};

#[cfg(test)]
mod value_contract_tests {
    use super::*;

    /// Contract: Value has every primitive and internal variant
    #[test]
    fn test_value_variants_exist() {
        let mut names = Interner::new();
        let _: Vec<Value> = vec![
            Value::Undefined,
            Value::Null,
            Value::Boolean(true),
            Value::Number(1.0),
            Value::from("s"),
            Value::Object(ObjRef::new(0, 0)),
            Value::Reference(Reference {
                base: None,
                name: names.intern("x"),
            }),
            Value::Completion(Box::new(Completion::normal())),
        ];
    }

    /// Contract: ObjRef compares by index and generation
    #[test]
    fn test_objref_identity() {
        assert_eq!(ObjRef::new(1, 1), ObjRef::new(1, 1));
        assert_ne!(ObjRef::new(1, 1), ObjRef::new(1, 2));
        assert_eq!(ObjRef::new(9, 4).generation(), 4);
    }

    /// Contract: completion kinds are distinguishable
    #[test]
    fn test_completion_kinds() {
        let kinds = [
            CompletionKind::Normal,
            CompletionKind::Break,
            CompletionKind::Continue,
            CompletionKind::Return,
            CompletionKind::Throw,
        ];
        for (i, a) in kinds.iter().enumerate() {
            for (j, b) in kinds.iter().enumerate() {
                assert_eq!(i == j, a == b);
            }
        }
    }
}

#[cfg(test)]
mod name_contract_tests {
    use super::*;

    /// Contract: interning is idempotent and identity-based
    #[test]
    fn test_intern_contract() {
        let mut names = Interner::new();
        let a: Name = names.intern("valueOf");
        let b: Name = names.intern("valueOf");
        assert_eq!(a, b);
        assert_eq!(a.identity(), b.identity());
        assert_eq!(a.as_str(), "valueOf");
    }
}

#[cfg(test)]
mod conversion_contract_tests {
    use super::*;

    /// Contract: ToInt32(NaN) = ToInt32(Infinity) = 0, ToInt32(2^32 + 5) = 5
    #[test]
    fn test_to_int32_contract() {
        assert_eq!(to_int32(f64::NAN), 0);
        assert_eq!(to_int32(f64::INFINITY), 0);
        assert_eq!(to_int32(2f64.powi(32) + 5.0), 5);
    }

    /// Contract: ToUint32 and ToUint16 wrap instead of saturating
    #[test]
    fn test_unsigned_wrap_contract() {
        assert_eq!(to_uint32(-2.0), u32::MAX - 1);
        assert_eq!(to_uint16(70000.0), 4464);
    }

    /// Contract: ToInteger keeps infinities and zeroes NaN
    #[test]
    fn test_to_integer_contract() {
        assert_eq!(to_integer(f64::NAN), 0.0);
        assert_eq!(to_integer(f64::NEG_INFINITY), f64::NEG_INFINITY);
        assert_eq!(to_integer(2.9), 2.0);
    }

    /// Contract: number and string conversions agree on simple values
    #[test]
    fn test_number_string_contract() {
        assert_eq!(number_to_string(255.0), "255");
        assert_eq!(string_to_number("255"), 255.0);
        assert_eq!(string_to_number("0xff"), 255.0);
    }
}

#[cfg(test)]
mod error_contract_tests {
    use super::*;

    /// Contract: JsError displays its message and exposes its kind
    #[test]
    fn test_js_error_contract() {
        let error = JsError {
            kind: Some(ErrorKind::ReferenceError),
            message: "ReferenceError: x is not defined".to_string(),
            location: Some(SourceLocation::new(Some("m.js"), 2)),
            stack: vec![StackFrame {
                call_type: CallType::Call,
                function_name: None,
                location: None,
            }],
        };
        assert!(error.is(ErrorKind::ReferenceError));
        assert_eq!(format!("{}", error), "ReferenceError: x is not defined");
    }
}
