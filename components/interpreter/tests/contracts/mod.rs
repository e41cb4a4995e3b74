//! Contract tests for the interpreter API
//!
//! These tests pin down the behavioural guarantees embedders rely on.

use std::cell::Cell;
use std::collections::HashSet;
use std::rc::Rc;

use core_types::{Completion, ErrorKind, JsString, Value};
use interpreter::{
    Arg, Attributes, EmptyBody, HostBody, Interpreter, JsResult, Scope, SystemHooks, HASH_BUCKETS,
};
use proptest::prelude::*;

/// Hooks that turn a fatal condition into a test panic.
struct PanicOnAbort;

impl SystemHooks for PanicOnAbort {
    fn abort(&self, message: &str) -> ! {
        panic!("abort: {}", message)
    }
}

fn bucket(name: &core_types::Name) -> usize {
    let addr = name.identity();
    ((addr >> 4) ^ addr) % HASH_BUCKETS
}

/// Test set_prototype contract: cycles are refused and leave the link alone
#[test]
fn test_prototype_cycle_contract() {
    let mut interp = Interpreter::new();
    let a = interp.new_object();
    let b = interp.new_object_with_proto(Some(a));
    let c = interp.new_object_with_proto(Some(b));
    let before = interp.prototype_of(a);

    let caught = interp
        .try_catch(|interp| interp.set_prototype(a, Some(c)))
        .unwrap_err();
    assert!(interp.describe(&caught.value).starts_with("TypeError"));
    assert_eq!(interp.prototype_of(a), before);

    let caught = interp
        .try_catch(|interp| interp.set_prototype(a, Some(a)))
        .unwrap_err();
    assert!(interp.describe(&caught.value).starts_with("TypeError"));
    assert_eq!(interp.prototype_of(a), before);
}

/// Test put contract: plain writes to read-only properties change nothing
#[test]
fn test_readonly_put_contract() {
    let mut interp = Interpreter::new();
    let obj = interp.new_object();
    let x = interp.intern("x");
    interp.put(obj, &x, Value::from("original"), Attributes::READONLY).unwrap();

    for value in [Value::Number(1.0), Value::Null, Value::from("other")] {
        interp.put(obj, &x, value, Attributes::empty()).unwrap();
        assert_eq!(interp.get(obj, &x).unwrap(), Value::from("original"));
        assert_eq!(interp.own_attributes(obj, &x), Some(Attributes::READONLY));
    }
}

/// Test put contract on built-ins: `length` of a function is read-only
#[test]
fn test_readonly_length_contract() {
    let mut interp = Interpreter::new();
    let f = interp.new_function(None, &["a", "b"], Rc::new(EmptyBody));
    interp.put_str(f, "length", Value::Number(9.0), Attributes::empty()).unwrap();
    assert_eq!(interp.get_str(f, "length").unwrap(), Value::Number(2.0));
}

/// Test delete contract: don't-delete properties survive
#[test]
fn test_dont_delete_contract() {
    let mut interp = Interpreter::new();
    let obj = interp.new_object();
    let kept = interp.intern("kept");
    interp.put(obj, &kept, Value::Number(1.0), Attributes::DONTDELETE).unwrap();

    assert!(!interp.delete(obj, &kept).unwrap());
    assert!(interp.has_property(obj, &kept).unwrap());
    assert_eq!(interp.get(obj, &kept).unwrap(), Value::Number(1.0));

    let global = interp.global();
    let nan = interp.intern("NaN");
    assert!(!interp.delete(global, &nan).unwrap());
    assert!(interp.has_property(global, &nan).unwrap());
}

/// Test enumerator contract: each new name once, insertion order per bucket
#[test]
fn test_enumeration_order_contract() {
    let mut interp = Interpreter::new();
    let obj = interp.new_object();
    let inserted: Vec<_> = (0..64).map(|i| interp.intern(&format!("p{}", i))).collect();
    for name in &inserted {
        interp.put(obj, name, Value::Null, Attributes::empty()).unwrap();
    }

    let listed: Vec<_> = interp.enumerator(obj).unwrap().map(|e| e.name).collect();
    assert_eq!(listed.len(), inserted.len());
    let unique: HashSet<_> = listed.iter().cloned().collect();
    assert_eq!(unique.len(), inserted.len());
    assert!(inserted.iter().all(|n| unique.contains(n)));

    for b in 0..HASH_BUCKETS {
        let expected: Vec<_> = inserted.iter().filter(|n| bucket(n) == b).collect();
        let actual: Vec<_> = listed.iter().filter(|n| bucket(n) == b).collect();
        assert_eq!(actual, expected, "bucket {} out of insertion order", b);
    }
}

/// Test instantiate_function contract: equivalent scopes share one instance
#[test]
fn test_joined_function_cache_contract() {
    let mut interp = Interpreter::new();
    let core = interp.make_function_core(Some("f"), &[], Rc::new(EmptyBody));
    let holder = interp.new_object();
    let global_scope = interp.global_scope();

    let s1 = Scope::new(holder, Some(Rc::clone(&global_scope)));
    let s2 = Scope::new(holder, Some(Rc::clone(&global_scope)));
    let f1 = interp.instantiate_function(&core, &s1);
    let f2 = interp.instantiate_function(&core, &s2);
    assert_eq!(f1, f2);
}

/// Test instantiate_function contract: distinct scopes share properties
#[test]
fn test_joined_function_properties_contract() {
    let mut interp = Interpreter::new();
    let core = interp.make_function_core(Some("f"), &[], Rc::new(EmptyBody));
    let a = interp.new_object();
    let b = interp.new_object();
    let global_scope = interp.global_scope();

    let f1 = interp.instantiate_function(&core, &Scope::new(a, Some(Rc::clone(&global_scope))));
    let f2 = interp.instantiate_function(&core, &Scope::new(b, Some(Rc::clone(&global_scope))));
    assert_ne!(f1, f2);
    assert!(interp.joined(f1, f2));

    interp.put_str(f1, "extra", Value::Number(5.0), Attributes::empty()).unwrap();
    assert_eq!(interp.get_str(f2, "extra").unwrap(), Value::Number(5.0));
}

/// Test call contract: the recursion budget stops the third nested call
#[test]
fn test_recursion_budget_contract() {
    let mut interp = Interpreter::new();
    interp.set_recursion_limit(Some(2));

    let c_ran = Rc::new(Cell::new(false));
    let flag = Rc::clone(&c_ran);
    let c = interp.make_native_function("c", 0, move |_, _, _, _| {
        flag.set(true);
        Ok(Value::Undefined)
    });
    let b = interp.make_native_function("b", 0, move |interp, _, _, _| interp.call(c, None, &[]));
    let a = interp.make_native_function("a", 0, move |interp, _, _, _| interp.call(b, None, &[]));

    let err = interp.call_function(a, None, &[]).unwrap_err();
    assert!(err.is(ErrorKind::Error));
    assert!(err.message.contains("recursion limit"));
    assert!(!c_ran.get());
    assert_eq!(interp.recursion_limit(), Some(2));
}

/// Test call contract: a throw caught inside a call restores the budget
#[test]
fn test_recursion_budget_restored_inside_call_contract() {
    let mut interp = Interpreter::new();
    interp.set_recursion_limit(Some(1));
    let inner = interp.make_native_function("inner", 0, |_, _, _, _| Ok(Value::Undefined));
    let outer = interp.make_native_function("outer", 0, move |interp, _, _, _| {
        let before = interp.recursion_limit();
        let failed = interp.try_catch(|interp| interp.call(inner, None, &[])).is_err();
        assert_eq!(interp.recursion_limit(), before);
        Ok(Value::Boolean(failed))
    });

    assert_eq!(interp.call_function(outer, None, &[]).unwrap(), Value::Boolean(true));
    assert_eq!(interp.recursion_limit(), Some(1));
}

/// Test throw_error_from contract: a failing error constructor is fatal
#[test]
#[should_panic(expected = "abort")]
fn test_error_construction_failure_contract() {
    let mut interp = Interpreter::with_hooks(Rc::new(PanicOnAbort));
    let broken = interp.make_native_constructor(
        "BrokenError",
        1,
        |_, _, _, _| Ok(Value::Undefined),
        |interp, _, _| Err(interp.throw_value(Value::from("nested"))),
    );
    let _ = interp.try_catch(|interp| -> JsResult<()> { Err(interp.throw_error_from(broken, "outer")) });
}

/// Test throw_error contract: no handler at all is fatal
#[test]
#[should_panic(expected = "uncaught error")]
fn test_error_without_handler_contract() {
    let mut interp = Interpreter::with_hooks(Rc::new(PanicOnAbort));
    let _ = interp.throw_error(ErrorKind::TypeError, "nobody listening");
}

/// Test parse_args contract: optional outputs are left alone
#[test]
fn test_parse_args_optional_contract() {
    let mut interp = Interpreter::new();
    let mut text: JsString = "".into();
    let mut number = -7.5;
    interp
        .parse_args(
            &[Value::Number(12.0)],
            "s|n",
            &mut [Arg::Str(&mut text), Arg::Number(&mut number)],
        )
        .unwrap();
    assert_eq!(&*text, "12");
    assert_eq!(number, -7.5);
}

/// Test to_int32 contract on special values
#[test]
fn test_to_int32_contract() {
    let mut interp = Interpreter::new();
    assert_eq!(interp.to_int32(&Value::Number(f64::NAN)).unwrap(), 0);
    assert_eq!(interp.to_int32(&Value::Number(f64::INFINITY)).unwrap(), 0);
    assert_eq!(interp.to_int32(&Value::Number(4294967296.0 + 5.0)).unwrap(), 5);
    assert_eq!(interp.to_int32(&Value::from("4294967301")).unwrap(), 5);
}

/// Test call contract: a host body's return completion is the call result
#[test]
fn test_return_completion_contract() {
    let mut interp = Interpreter::new();
    let body = HostBody::new(|_, _| Ok(Completion::returning(Value::from("done"))));
    let f = interp.new_function(None, &[], Rc::new(body));
    assert_eq!(interp.call_function(f, None, &[]).unwrap(), Value::from("done"));

    let body = HostBody::new(|_, _| Ok(Completion::normal()));
    let g = interp.new_function(None, &[], Rc::new(body));
    assert_eq!(interp.call_function(g, None, &[]).unwrap(), Value::Undefined);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_readonly_value_unchanged(initial in any::<i32>(), writes in proptest::collection::vec(any::<i32>(), 1..8)) {
        let mut interp = Interpreter::new();
        let obj = interp.new_object();
        let x = interp.intern("x");
        interp.put(obj, &x, Value::from(initial), Attributes::READONLY).unwrap();
        for w in writes {
            interp.put(obj, &x, Value::from(w), Attributes::empty()).unwrap();
        }
        prop_assert_eq!(interp.get(obj, &x).unwrap(), Value::from(initial));
    }

    #[test]
    fn prop_enumeration_yields_each_name_once(names in proptest::collection::hash_set("[a-z]{1,6}", 0..40)) {
        let mut interp = Interpreter::new();
        let obj = interp.new_object();
        for name in &names {
            interp.put_str(obj, name, Value::Null, Attributes::empty()).unwrap();
        }
        let listed: Vec<String> = interp
            .enumerator(obj)
            .unwrap()
            .map(|e| e.name.to_string())
            .collect();
        prop_assert_eq!(listed.len(), names.len());
        let listed: HashSet<String> = listed.into_iter().collect();
        prop_assert_eq!(listed, names);
    }

    #[test]
    fn prop_int32_through_interpreter(n in any::<i32>(), k in -100i64..100) {
        let mut interp = Interpreter::new();
        let shifted = n as f64 + (k as f64) * 4294967296.0;
        prop_assert_eq!(interp.to_int32(&Value::Number(shifted)).unwrap(), n);
    }
}
