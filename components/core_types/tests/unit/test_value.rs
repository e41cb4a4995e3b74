//! Unit tests for the Value enum

use core_types::{Completion, CompletionKind, Interner, ObjRef, Reference, Value};

#[cfg(test)]
mod value_creation_tests {
    use super::*;

    #[test]
    fn test_value_from_primitives() {
        assert_eq!(Value::from(true), Value::Boolean(true));
        assert_eq!(Value::from(3), Value::Number(3.0));
        assert_eq!(Value::from(7u32), Value::Number(7.0));
        assert_eq!(Value::from("abc").as_str(), Some("abc"));
        assert_eq!(Value::from(String::from("x")), Value::from("x"));
    }

    #[test]
    fn test_value_default_is_undefined() {
        assert_eq!(Value::default(), Value::Undefined);
    }

    #[test]
    fn test_value_object_handle() {
        let r = ObjRef::new(5, 2);
        let v = Value::from(r);
        assert_eq!(v.as_object(), Some(r));
        assert_eq!(v.type_of(), "object");
    }

    #[test]
    fn test_value_reference_kind() {
        let mut names = Interner::new();
        let v = Value::Reference(Reference {
            base: None,
            name: names.intern("missing"),
        });
        assert!(!v.is_primitive());
        assert_eq!(v.type_of(), "reference");
    }

    #[test]
    fn test_value_completion_kind() {
        let v = Value::Completion(Box::new(Completion::jump(CompletionKind::Break, Some(4))));
        match v {
            Value::Completion(c) => {
                assert_eq!(c.kind, CompletionKind::Break);
                assert_eq!(c.target, Some(4));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}

#[cfg(test)]
mod value_truthiness_tests {
    use super::*;

    #[test]
    fn test_falsy_values() {
        for v in [
            Value::Undefined,
            Value::Null,
            Value::Boolean(false),
            Value::Number(0.0),
            Value::Number(-0.0),
            Value::Number(f64::NAN),
            Value::from(""),
        ] {
            assert!(!v.is_truthy(), "{:?} should be falsy", v);
        }
    }

    #[test]
    fn test_truthy_values() {
        for v in [
            Value::Boolean(true),
            Value::Number(-1.0),
            Value::Number(f64::INFINITY),
            Value::from("0"),
            Value::Object(ObjRef::new(0, 0)),
        ] {
            assert!(v.is_truthy(), "{:?} should be truthy", v);
        }
    }
}

#[cfg(test)]
mod value_typeof_tests {
    use super::*;

    #[test]
    fn test_type_of_primitives() {
        assert_eq!(Value::Undefined.type_of(), "undefined");
        assert_eq!(Value::Null.type_of(), "object");
        assert_eq!(Value::Boolean(true).type_of(), "boolean");
        assert_eq!(Value::Number(1.0).type_of(), "number");
        assert_eq!(Value::from("s").type_of(), "string");
    }

    #[test]
    fn test_nullish() {
        assert!(Value::Undefined.is_nullish());
        assert!(Value::Null.is_nullish());
        assert!(!Value::Number(0.0).is_nullish());
    }
}
