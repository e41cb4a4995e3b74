//! Integration tests for the interpreter
//!
//! These tests drive the runtime the way an embedder with an evaluator
//! would: function bodies are host closures that resolve names through the
//! execution context and call back into the interpreter.

use std::cell::Cell;
use std::rc::Rc;

use core_types::{CallType, Completion, ErrorKind, SourceLocation, Value};
use interpreter::{
    module_index, register_module, Attributes, Compatibility, DefaultSystem, ExecutionContext,
    HostBody, Interpreter, InterpreterConfig, JsCompat, JsResult, Module,
};

fn number(interp: &mut Interpreter, ctx: &ExecutionContext, name: &str) -> JsResult<f64> {
    let value = ctx.lookup(interp, name)?;
    interp.to_number(&value)
}

// ============================================================================
// Constructors and Prototypes
// ============================================================================

/// function Point(x, y) { this.x = x; this.y = y; }
/// Point.prototype.norm1 = function () { return this.x + this.y; };
#[test]
fn test_constructor_with_prototype_method() {
    let mut interp = Interpreter::new();

    let point_body = HostBody::new(|interp, ctx| {
        let x = ctx.lookup(interp, "x")?;
        let y = ctx.lookup(interp, "y")?;
        interp.put_str(ctx.this, "x", x, Attributes::empty())?;
        interp.put_str(ctx.this, "y", y, Attributes::empty())?;
        Ok(Completion::normal())
    });
    let point = interp.new_function(Some("Point"), &["x", "y"], Rc::new(point_body));

    let norm_body = HostBody::new(|interp, ctx| {
        let x = interp.get_str(ctx.this, "x")?;
        let y = interp.get_str(ctx.this, "y")?;
        let sum = interp.to_number(&x)? + interp.to_number(&y)?;
        Ok(Completion::returning(Value::Number(sum)))
    });
    let norm = interp.new_function(Some("norm1"), &[], Rc::new(norm_body));
    let proto = interp.get_str(point, "prototype").unwrap().as_object().unwrap();
    interp.put_str(proto, "norm1", Value::Object(norm), Attributes::empty()).unwrap();

    let p = interp
        .construct_object(point, &[Value::Number(3.0), Value::Number(4.0)])
        .unwrap()
        .as_object()
        .unwrap();
    let method = interp.get_str(p, "norm1").unwrap().as_object().unwrap();
    assert_eq!(interp.call_function(method, Some(p), &[]).unwrap(), Value::Number(7.0));

    let constructor = interp.get_str(p, "constructor").unwrap();
    assert_eq!(constructor, Value::Object(point));
    assert!(interp.has_instance(point, &Value::Object(p)).unwrap());
}

/// Recursion through the global binding: function fact(n) { ... }
#[test]
fn test_recursive_function_through_global() {
    let mut interp = Interpreter::new();
    let body = HostBody::new(|interp, ctx| {
        let n = number(interp, ctx, "n")?;
        if n <= 1.0 {
            return Ok(Completion::returning(Value::Number(1.0)));
        }
        let fact = ctx.lookup(interp, "fact")?;
        let Some(fact) = fact.as_object() else {
            return Err(interp.throw_error(ErrorKind::TypeError, "fact is not a function"));
        };
        let rest = interp.call(fact, None, &[Value::Number(n - 1.0)])?;
        Ok(Completion::returning(Value::Number(n * interp.to_number(&rest)?)))
    });
    let fact = interp.new_function(Some("fact"), &["n"], Rc::new(body));
    let global = interp.global();
    interp.put_str(global, "fact", Value::Object(fact), Attributes::empty()).unwrap();

    let result = interp.call_function(fact, None, &[Value::Number(10.0)]).unwrap();
    assert_eq!(result, Value::Number(3628800.0));
    assert_eq!(interp.call_depth(), 0);
}

/// A counter closure: each call of the outer function gets fresh state.
#[test]
fn test_closures_keep_separate_activations() {
    let mut interp = Interpreter::new();
    let increment = interp.make_function_core(
        Some("increment"),
        &[],
        Rc::new(HostBody::new(|interp, ctx| {
            let count = number(interp, ctx, "count")? + 1.0;
            ctx.assign(interp, "count", Value::Number(count))?;
            Ok(Completion::returning(Value::Number(count)))
        })),
    );
    let make_counter = HostBody::new(move |interp, ctx| {
        ctx.declare_var(interp, "count")?;
        ctx.assign(interp, "count", Value::Number(0.0))?;
        let f = interp.instantiate_function(&increment, &ctx.scope);
        Ok(Completion::returning(Value::Object(f)))
    });
    let make_counter = interp.new_function(Some("makeCounter"), &[], Rc::new(make_counter));

    let first = interp.call_function(make_counter, None, &[]).unwrap().as_object().unwrap();
    let second = interp.call_function(make_counter, None, &[]).unwrap().as_object().unwrap();
    assert_ne!(first, second);
    assert!(interp.joined(first, second));

    for expected in 1..=3 {
        let n = interp.call_function(first, None, &[]).unwrap();
        assert_eq!(n, Value::Number(expected as f64));
    }
    assert_eq!(interp.call_function(second, None, &[]).unwrap(), Value::Number(1.0));
}

// ============================================================================
// Errors Reaching the Host
// ============================================================================

#[test]
fn test_js_error_carries_throw_time_stack() {
    let mut interp = Interpreter::new();
    let inner = interp.make_native_function("inner", 0, |interp, _, _, _| {
        interp.set_location(Some(SourceLocation::new(Some("lib.js"), 30)));
        Err(interp.throw_error(ErrorKind::RangeError, "out of range"))
    });
    let outer = interp.make_native_function("outer", 0, move |interp, _, _, _| {
        interp.set_location(Some(SourceLocation::new(Some("main.js"), 3)));
        interp.call(inner, None, &[])
    });

    let err = interp.call_function(outer, None, &[]).unwrap_err();
    assert!(err.is(ErrorKind::RangeError));
    assert_eq!(err.message, "RangeError: lib.js:30: out of range");
    assert_eq!(err.location, Some(SourceLocation::new(Some("lib.js"), 30)));

    let names: Vec<_> = err.stack.iter().map(|f| f.function_name.clone()).collect();
    assert_eq!(names, vec![Some("outer".to_string()), Some("inner".to_string())]);
    assert_eq!(err.stack[1].location, Some(SourceLocation::new(Some("main.js"), 3)));
    assert_eq!(interp.call_depth(), 0);
}

#[test]
fn test_js_error_for_user_error_subclass() {
    let mut interp = Interpreter::new();
    let type_error_proto = interp.intrinsics().error_prototype(ErrorKind::TypeError);
    let custom_proto = interp.new_object_with_proto(Some(type_error_proto));
    interp
        .put_str(custom_proto, "name", Value::from("ValidationError"), Attributes::DONTENUM)
        .unwrap();
    let thrower = interp.make_native_function("validate", 0, move |interp, _, _, _| {
        let error = interp.new_object_with_proto(Some(custom_proto));
        interp.put_str(error, "message", Value::from("field missing"), Attributes::empty())?;
        Err(interp.throw_value(Value::Object(error)))
    });

    let err = interp.call_function(thrower, None, &[]).unwrap_err();
    assert!(err.is(ErrorKind::TypeError));
    assert_eq!(err.message, "ValidationError: field missing");
}

#[test]
fn test_js_error_for_thrown_string() {
    let mut interp = Interpreter::new();
    let thrower = interp.make_native_function("thrower", 0, |interp, _, _, _| {
        Err(interp.throw_value(Value::from("plain")))
    });
    let err = interp.call_function(thrower, None, &[]).unwrap_err();
    assert_eq!(err.kind, None);
    assert_eq!(err.to_string(), "plain");
}

#[test]
fn test_error_constructor_called_as_function() {
    let mut interp = Interpreter::new();
    let ctor = interp.intrinsics().error_constructor(ErrorKind::SyntaxError);
    let error = interp.call_function(ctor, None, &[Value::from("bad token")]).unwrap();
    let error = error.as_object().unwrap();
    assert_eq!(interp.class_name(error), "Error");
    assert_eq!(
        interp.get_str(error, "message").unwrap(),
        Value::from("bad token")
    );
    let text = interp.try_catch(|interp| interp.to_string(&Value::Object(error))).unwrap();
    assert_eq!(&*text, "SyntaxError: bad token");
}

// ============================================================================
// Garbage Collection
// ============================================================================

#[test]
fn test_collection_frees_unreachable_objects() {
    let mut interp = Interpreter::new();
    let kept = interp.new_object();
    let global = interp.global();
    interp.put_str(global, "kept", Value::Object(kept), Attributes::empty()).unwrap();
    let garbage: Vec<_> = (0..10).map(|_| interp.new_object()).collect();

    let stats = interp.collect_garbage(std::iter::empty());
    assert!(stats.freed >= garbage.len());
    assert!(interp.is_live(kept));
    assert!(garbage.iter().all(|g| !interp.is_live(*g)));
}

#[test]
fn test_closure_activation_survives_collection() {
    let mut interp = Interpreter::new();
    let reader = interp.make_function_core(
        Some("reader"),
        &[],
        Rc::new(HostBody::new(|interp, ctx| Ok(Completion::returning(ctx.lookup(interp, "secret")?)))),
    );
    let make = HostBody::new(move |interp, ctx| {
        let f = interp.instantiate_function(&reader, &ctx.scope);
        Ok(Completion::returning(Value::Object(f)))
    });
    let make = interp.new_function(Some("make"), &["secret"], Rc::new(make));
    let global = interp.global();
    interp.put_str(global, "make", Value::Object(make), Attributes::empty()).unwrap();

    let f = interp
        .call_function(make, None, &[Value::from("hidden")])
        .unwrap()
        .as_object()
        .unwrap();
    interp.add_root(f);
    interp.collect_garbage(std::iter::empty());
    assert_eq!(interp.call_function(f, None, &[]).unwrap(), Value::from("hidden"));

    interp.remove_root(f);
    interp.collect_garbage(std::iter::empty());
    assert!(!interp.is_live(f));
}

/// function Box(a) { gc(); this.a = a; this.n = arguments.length; }
#[test]
fn test_collection_during_call_keeps_running_frame() {
    let mut interp = Interpreter::new();
    let freed = Rc::new(Cell::new(0));
    let freed_in_body = Rc::clone(&freed);
    let body = HostBody::new(move |interp, ctx| {
        let stats = interp.collect_garbage(std::iter::empty());
        freed_in_body.set(stats.freed);
        assert!(interp.is_live(ctx.activation));
        assert!(interp.is_live(ctx.this));
        let a = ctx.lookup(interp, "a")?;
        let arguments = ctx.lookup(interp, "arguments")?;
        let Value::Object(arguments) = arguments else {
            return Ok(Completion::normal());
        };
        let count = interp.get_str(arguments, "length")?;
        interp.put_str(ctx.this, "a", a, Attributes::empty())?;
        interp.put_str(ctx.this, "n", count, Attributes::empty())?;
        Ok(Completion::normal())
    });
    let boxed = interp.new_function(Some("Box"), &["a"], Rc::new(body));
    let payload = interp.new_object();
    let garbage = interp.new_object();

    let result = interp
        .construct_object(boxed, &[Value::Object(payload), Value::Number(2.0)])
        .unwrap()
        .as_object()
        .unwrap();
    assert!(freed.get() >= 1);
    assert!(!interp.is_live(garbage));
    assert!(interp.is_live(payload));
    assert_eq!(interp.get_str(result, "a").unwrap(), Value::Object(payload));
    assert_eq!(interp.get_str(result, "n").unwrap(), Value::Number(2.0));

    interp.collect_garbage(std::iter::empty());
    assert!(!interp.is_live(payload));
}

#[test]
fn test_builtins_survive_repeated_collection() {
    let mut interp = Interpreter::new();
    for _ in 0..3 {
        interp.collect_garbage(std::iter::empty());
    }
    let boolean = interp.intrinsics().boolean_constructor;
    assert_eq!(
        interp.call_function(boolean, None, &[Value::Number(1.0)]).unwrap(),
        Value::Boolean(true)
    );
    assert!(interp.heap_stats().collections >= 3);
}

// ============================================================================
// Modules
// ============================================================================

/// Counts the calls of a global `tick` function in its private slot.
struct TickModule;

impl Module for TickModule {
    fn name(&self) -> &str {
        "tick"
    }

    fn version(&self) -> u32 {
        2
    }

    fn alloc(&self, interp: &mut Interpreter) {
        if let Some(index) = module_index(&TICK) {
            interp.set_module_private(index, Box::new(0u32));
        }
    }

    fn init(&self, interp: &mut Interpreter) -> JsResult<()> {
        let tick = interp.make_native_function("tick", 0, |interp, _, _, _| {
            let Some(index) = module_index(&TICK) else {
                return Ok(Value::Undefined);
            };
            let count = interp
                .module_private_mut(index)
                .and_then(|slot| slot.downcast_mut::<u32>());
            match count {
                Some(count) => {
                    *count += 1;
                    Ok(Value::from(*count))
                }
                None => Ok(Value::Undefined),
            }
        });
        let global = interp.global();
        interp.put_str(global, "tick", Value::Object(tick), Attributes::DONTENUM)
    }
}

static TICK: TickModule = TickModule;

#[test]
fn test_module_installs_global_with_private_state() {
    let index = register_module(&TICK).unwrap();
    assert_eq!(register_module(&TICK).unwrap(), index);

    let mut interp = Interpreter::new();
    assert!(interp.modules().iter().any(|m| m.name() == "tick"));
    let global = interp.global();
    let tick = interp.get_str(global, "tick").unwrap().as_object().unwrap();

    interp.call_function(tick, None, &[]).unwrap();
    let second = interp.call_function(tick, None, &[]).unwrap();
    assert_eq!(second, Value::Number(2.0));

    let mut other = Interpreter::new();
    let global = other.global();
    let tick = other.get_str(global, "tick").unwrap().as_object().unwrap();
    assert_eq!(other.call_function(tick, None, &[]).unwrap(), Value::Number(1.0));
}

/// Registers [`BASE`] from its own one-time setup.
struct DependentModule;

impl Module for DependentModule {
    fn name(&self) -> &str {
        "dependent"
    }

    fn mod_init(&self) -> Result<(), String> {
        register_module(&BASE).map(|_| ()).map_err(|e| e.to_string())
    }

    fn init(&self, _interp: &mut Interpreter) -> JsResult<()> {
        Ok(())
    }
}

struct BaseModule;

impl Module for BaseModule {
    fn name(&self) -> &str {
        "base"
    }

    fn init(&self, _interp: &mut Interpreter) -> JsResult<()> {
        Ok(())
    }
}

static DEPENDENT: DependentModule = DependentModule;
static BASE: BaseModule = BaseModule;

#[test]
fn test_module_registers_dependency_during_setup() {
    let dependent = register_module(&DEPENDENT).unwrap();
    let base = module_index(&BASE).unwrap();
    assert!(base < dependent);
    assert_eq!(register_module(&BASE).unwrap(), base);

    let interp = Interpreter::new();
    let names: Vec<_> = interp.modules().iter().map(|m| m.name().to_string()).collect();
    let base_at = names.iter().position(|n| n == "base").unwrap();
    let dependent_at = names.iter().position(|n| n == "dependent").unwrap();
    assert!(base_at < dependent_at);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_from_json() {
    let config: InterpreterConfig =
        serde_json::from_str(r#"{ "recursion_limit": 3, "locale": "fr-FR" }"#).unwrap();
    let mut interp = Interpreter::with_config(Rc::new(DefaultSystem), config.clone());
    assert_eq!(interp.recursion_limit(), Some(3));
    assert_eq!(interp.locale(), Some("fr-FR"));

    let json = serde_json::to_string(interp.config()).unwrap();
    let back: InterpreterConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);

    interp.set_recursion_limit(Some(0));
    interp.reinitialize();
    assert_eq!(interp.recursion_limit(), Some(3));
}

#[test]
fn test_compat_level_changes_behaviour_end_to_end() {
    let config = InterpreterConfig {
        compat: Some(Compatibility::default().with_js(JsCompat::Js12)),
        ..InterpreterConfig::default()
    };
    let mut interp = Interpreter::with_config(Rc::new(DefaultSystem), config);
    let seen = Rc::new(Cell::new(false));
    let seen_in_body = Rc::clone(&seen);
    let body = HostBody::new(move |interp, ctx| {
        let arguments = ctx.lookup(interp, "arguments")?;
        let text = interp.to_string(&arguments)?;
        seen_in_body.set(&*text == "[0=1]");
        Ok(Completion::normal())
    });
    let f = interp.new_function(None, &[], Rc::new(body));
    interp.call_function(f, None, &[Value::Number(1.0)]).unwrap();
    assert!(seen.get());

    let boolean = interp.intrinsics().boolean_constructor;
    let wrapped = interp.construct_object(boolean, &[Value::Boolean(false)]).unwrap();
    assert!(!interp.to_boolean(&wrapped).unwrap());
}

#[test]
fn test_traceback_frames_name_constructs() {
    let mut interp = Interpreter::new();
    let frames = Rc::new(std::cell::RefCell::new(Vec::new()));
    let frames_in_body = Rc::clone(&frames);
    let body = HostBody::new(move |interp, _| {
        *frames_in_body.borrow_mut() = interp.traceback();
        Ok(Completion::normal())
    });
    let widget = interp.new_function(Some("Widget"), &[], Rc::new(body));
    interp.construct_object(widget, &[]).unwrap();

    let frames = frames.borrow();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].call_type, CallType::Construct);
    assert_eq!(frames[0].to_string(), "new Widget");
}
