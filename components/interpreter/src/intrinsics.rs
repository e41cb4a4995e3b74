//! Built-in objects the core itself depends on.
//!
//! Setup happens in two phases. [`Intrinsics::allocate`] creates the objects
//! directly on a fresh heap, before any interpreter exists, so that every
//! later allocation can find `Object.prototype` and `Function.prototype`.
//! [`init`] then fills them in through the interpreter.
//!
//! Only what the coercion protocol and the error engine rely on lives here:
//! the `Object`, `Boolean`, `Number` and `String` constructors with their
//! prototypes, `Function.prototype`, and the native error constructors.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use core_types::{ErrorKind, Interner, ObjRef, Value};
use memory_manager::{Heap, OutOfMemory, Trace, Tracer};

use crate::cfunction::{NativeConstructFn, NativeFn, NativeFunction};
use crate::exception::JsResult;
use crate::function::{self, FunctionCore, FunctionInstance};
use crate::native::NativeObject;
use crate::object::ObjectClass;
use crate::property::{Attributes, PropertyTable};
use crate::scope::Scope;
use crate::Interpreter;

const ERROR_KINDS: usize = ErrorKind::ALL.len();

/// Handles of the built-in objects.
#[derive(Debug, Clone)]
pub struct Intrinsics {
    /// The global object
    pub global: ObjRef,
    /// `Object.prototype`, root of every ordinary chain
    pub object_prototype: ObjRef,
    /// `Object`
    pub object_constructor: ObjRef,
    /// `Function.prototype`
    pub function_prototype: ObjRef,
    /// `Boolean.prototype`
    pub boolean_prototype: ObjRef,
    /// `Boolean`
    pub boolean_constructor: ObjRef,
    /// `Number.prototype`
    pub number_prototype: ObjRef,
    /// `Number`
    pub number_constructor: ObjRef,
    /// `String.prototype`
    pub string_prototype: ObjRef,
    /// `String`
    pub string_constructor: ObjRef,
    error_constructors: [ObjRef; ERROR_KINDS],
    error_prototypes: [ObjRef; ERROR_KINDS],
}

impl Intrinsics {
    /// Constructor of the native error `kind`.
    pub fn error_constructor(&self, kind: ErrorKind) -> ObjRef {
        self.error_constructors[kind as usize]
    }

    /// Prototype of the native error `kind`.
    pub fn error_prototype(&self, kind: ErrorKind) -> ObjRef {
        self.error_prototypes[kind as usize]
    }

    /// Native error kind whose prototype is `proto`.
    pub fn error_kind_of_prototype(&self, proto: ObjRef) -> Option<ErrorKind> {
        ErrorKind::ALL
            .iter()
            .copied()
            .find(|kind| self.error_prototype(*kind) == proto)
    }

    /// Every built-in handle, for the collector's root set.
    pub fn roots(&self) -> impl Iterator<Item = ObjRef> + '_ {
        [
            self.global,
            self.object_prototype,
            self.object_constructor,
            self.function_prototype,
            self.boolean_prototype,
            self.boolean_constructor,
            self.number_prototype,
            self.number_constructor,
            self.string_prototype,
            self.string_constructor,
        ]
        .into_iter()
        .chain(self.error_constructors.iter().copied())
        .chain(self.error_prototypes.iter().copied())
    }

    /// Allocate every built-in on `heap` with its final prototype link and
    /// no properties.
    pub(crate) fn allocate(heap: &mut Heap<dyn ObjectClass>, interner: &mut Interner) -> Result<Self, OutOfMemory> {
        let object_prototype = heap.allocate(Rc::new(NativeObject::new("Object")), None)?;
        let global = heap.allocate(Rc::new(NativeObject::new("global")), Some(object_prototype))?;

        let common = heap.allocate(Rc::new(NativeObject::new("Object")), Some(object_prototype))?;
        let core = FunctionCore::bootstrap(common);
        let function_prototype = heap.allocate(
            Rc::new(FunctionInstance::bootstrap(core, Scope::new(global, None))),
            Some(object_prototype),
        )?;

        let mut native = |name: &str, func: Rc<NativeFn>, construct: Rc<NativeConstructFn>| {
            let f = NativeFunction::bootstrap(interner.intern(name), func, Some(construct));
            heap.allocate(Rc::new(f), Some(function_prototype))
        };
        let object_constructor = native("Object", Rc::new(object_call), Rc::new(object_construct))?;
        let boolean_constructor = native("Boolean", Rc::new(boolean_call), Rc::new(boolean_construct))?;
        let number_constructor = native("Number", Rc::new(number_call), Rc::new(number_construct))?;
        let string_constructor = native("String", Rc::new(string_call), Rc::new(string_construct))?;

        let mut error_constructors = [object_constructor; ERROR_KINDS];
        for kind in ErrorKind::ALL {
            error_constructors[kind as usize] = native(kind.name(), error_call(kind), error_construct(kind))?;
        }

        let mut wrapper = |class: &'static str, value: Value| {
            heap.allocate(Rc::new(PrimitiveWrapper::new(class, value)), Some(object_prototype))
        };
        let boolean_prototype = wrapper("Boolean", Value::Boolean(false))?;
        let number_prototype = wrapper("Number", Value::Number(0.0))?;
        let string_prototype = wrapper("String", Value::from(""))?;

        let base_error = heap.allocate(Rc::new(NativeObject::new("Error")), Some(object_prototype))?;
        let mut error_prototypes = [base_error; ERROR_KINDS];
        for kind in ErrorKind::ALL.into_iter().filter(|k| *k != ErrorKind::Error) {
            error_prototypes[kind as usize] = heap.allocate(Rc::new(NativeObject::new("Error")), Some(base_error))?;
        }

        Ok(Self {
            global,
            object_prototype,
            object_constructor,
            function_prototype,
            boolean_prototype,
            boolean_constructor,
            number_prototype,
            number_constructor,
            string_prototype,
            string_constructor,
            error_constructors,
            error_prototypes,
        })
    }
}

/// A Boolean, Number or String object wrapping a primitive.
pub struct PrimitiveWrapper {
    class: &'static str,
    value: Value,
    props: RefCell<PropertyTable>,
}

impl PrimitiveWrapper {
    fn new(class: &'static str, value: Value) -> Self {
        Self {
            class,
            value,
            props: RefCell::new(PropertyTable::new()),
        }
    }

    /// The wrapped primitive.
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Trace for PrimitiveWrapper {
    fn trace(&self, tracer: &mut Tracer) {
        self.props.borrow().trace(tracer);
    }
}

impl ObjectClass for PrimitiveWrapper {
    fn class_name(&self) -> &str {
        self.class
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn properties(&self) -> Option<&RefCell<PropertyTable>> {
        Some(&self.props)
    }
}

impl Interpreter {
    /// Wrap `value` in an object of `class` inheriting from `proto`.
    ///
    /// String wrappers get a read-only `length`.
    pub(crate) fn wrap_primitive(&mut self, class: &'static str, value: Value, proto: ObjRef) -> ObjRef {
        let wrapper = PrimitiveWrapper::new(class, value);
        if let Value::String(s) = &wrapper.value {
            let length = s.encode_utf16().count() as u32;
            wrapper
                .props
                .borrow_mut()
                .put(&self.names().length, Value::from(length), Attributes::LENGTH);
        }
        self.alloc(Rc::new(wrapper), Some(proto))
    }
}

/// Populate the built-ins and install them on the global object.
pub(crate) fn init(interp: &mut Interpreter) {
    let i = interp.intrinsics().clone();
    let names = interp.names().clone();

    interp.define_own(i.object_constructor, &names.length, Value::from(1u32), Attributes::LENGTH);
    link(interp, i.object_constructor, i.object_prototype);
    interp.define_native_method(i.object_prototype, "toString", 0, object_to_string);
    interp.define_native_method(i.object_prototype, "valueOf", 0, object_value_of);
    interp.define_native_method(i.object_prototype, "hasOwnProperty", 1, object_has_own_property);

    let core = interp.object(i.function_prototype).function_core().cloned();
    let Some(core) = core else {
        interp.fatal("Function.prototype has no function core");
    };
    let with_prototype = !interp.compat().js_extensions();
    interp.init_function_properties(&core, i.function_prototype, with_prototype);
    interp.define_native_method(i.function_prototype, "toString", 0, function::proto_to_string);
    interp.define_native_method(i.function_prototype, "call", 1, function::proto_call);
    interp.define_native_method(i.function_prototype, "apply", 2, function::proto_apply);

    for kind in ErrorKind::ALL {
        let ctor = i.error_constructor(kind);
        let proto = i.error_prototype(kind);
        interp.define_own(ctor, &names.length, Value::from(1u32), Attributes::LENGTH);
        link(interp, ctor, proto);
        interp.define_own(proto, &names.name, Value::from(kind.name()), Attributes::DONTENUM);
        interp.define_own(proto, &names.message, Value::from(""), Attributes::DONTENUM);
    }
    interp.define_native_method(i.error_prototype(ErrorKind::Error), "toString", 0, error_to_string);

    interp.define_own(i.string_prototype, &names.length, Value::from(0u32), Attributes::LENGTH);
    for (class, ctor, proto) in [
        ("Boolean", i.boolean_constructor, i.boolean_prototype),
        ("Number", i.number_constructor, i.number_prototype),
        ("String", i.string_constructor, i.string_prototype),
    ] {
        interp.define_own(ctor, &names.length, Value::from(1u32), Attributes::LENGTH);
        link(interp, ctor, proto);
        interp.define_native_method(proto, "toString", 0, move |interp, _, this, _| {
            let value = this_primitive(interp, this, class)?;
            Ok(match value {
                Value::String(_) => value,
                other => Value::from(other.to_string()),
            })
        });
        interp.define_native_method(proto, "valueOf", 0, move |interp, _, this, _| {
            this_primitive(interp, this, class)
        });
    }

    let mut globals = vec![
        ("Object", Value::Object(i.object_constructor)),
        ("Boolean", Value::Object(i.boolean_constructor)),
        ("Number", Value::Object(i.number_constructor)),
        ("String", Value::Object(i.string_constructor)),
    ];
    globals.extend(
        ErrorKind::ALL
            .iter()
            .map(|kind| (kind.name(), Value::Object(i.error_constructor(*kind)))),
    );
    for (name, value) in globals {
        let key = interp.intern(name);
        interp.define_own(i.global, &key, value, Attributes::DONTENUM);
    }
    for (name, value) in [
        ("NaN", Value::Number(f64::NAN)),
        ("Infinity", Value::Number(f64::INFINITY)),
        ("undefined", Value::Undefined),
    ] {
        let key = interp.intern(name);
        interp.define_own(i.global, &key, value, Attributes::DONTENUM | Attributes::DONTDELETE);
    }
    log::debug!("built-in objects initialised");
}

fn link(interp: &mut Interpreter, ctor: ObjRef, proto: ObjRef) {
    let names = interp.names().clone();
    interp.define_own(
        ctor,
        &names.prototype,
        Value::Object(proto),
        Attributes::READONLY | Attributes::DONTENUM | Attributes::DONTDELETE,
    );
    interp.define_own(proto, &names.constructor, Value::Object(ctor), Attributes::DONTENUM);
}

fn first(args: &[Value]) -> &Value {
    args.first().unwrap_or(&Value::Undefined)
}

fn this_object(interp: &Interpreter, this: Option<ObjRef>) -> ObjRef {
    this.unwrap_or_else(|| interp.global())
}

fn this_primitive(interp: &mut Interpreter, this: Option<ObjRef>, class: &'static str) -> JsResult<Value> {
    let value = this.and_then(|t| {
        let o = interp.object(t);
        let value = o
            .as_any()
            .downcast_ref::<PrimitiveWrapper>()
            .filter(|w| w.class == class)
            .map(|w| w.value.clone());
        value
    });
    match value {
        Some(value) => Ok(value),
        None => {
            let message = format!("{}.prototype method called on an incompatible object", class);
            Err(interp.throw_error(ErrorKind::TypeError, &message))
        }
    }
}

fn object_call(interp: &mut Interpreter, _callee: ObjRef, _this: Option<ObjRef>, args: &[Value]) -> JsResult<Value> {
    match first(args) {
        Value::Undefined | Value::Null => Ok(Value::Object(interp.new_object())),
        value => Ok(Value::Object(interp.to_object(value)?)),
    }
}

fn object_construct(interp: &mut Interpreter, callee: ObjRef, args: &[Value]) -> JsResult<Value> {
    object_call(interp, callee, None, args)
}

fn object_to_string(interp: &mut Interpreter, _callee: ObjRef, this: Option<ObjRef>, _args: &[Value]) -> JsResult<Value> {
    let this = this_object(interp, this);
    Ok(Value::from(format!("[object {}]", interp.class_name(this))))
}

fn object_value_of(interp: &mut Interpreter, _callee: ObjRef, this: Option<ObjRef>, _args: &[Value]) -> JsResult<Value> {
    Ok(Value::Object(this_object(interp, this)))
}

fn object_has_own_property(
    interp: &mut Interpreter,
    _callee: ObjRef,
    this: Option<ObjRef>,
    args: &[Value],
) -> JsResult<Value> {
    let this = this_object(interp, this);
    let key = interp.to_string(first(args))?;
    let key = interp.intern(&key);
    Ok(Value::Boolean(interp.has_own_property(this, &key)?))
}

fn boolean_call(interp: &mut Interpreter, _callee: ObjRef, _this: Option<ObjRef>, args: &[Value]) -> JsResult<Value> {
    Ok(Value::Boolean(interp.to_boolean(first(args))?))
}

fn boolean_construct(interp: &mut Interpreter, callee: ObjRef, args: &[Value]) -> JsResult<Value> {
    let value = boolean_call(interp, callee, None, args)?;
    let proto = interp.intrinsics().boolean_prototype;
    Ok(Value::Object(interp.wrap_primitive("Boolean", value, proto)))
}

fn number_call(interp: &mut Interpreter, _callee: ObjRef, _this: Option<ObjRef>, args: &[Value]) -> JsResult<Value> {
    match args.first() {
        None => Ok(Value::Number(0.0)),
        Some(value) => Ok(Value::Number(interp.to_number(value)?)),
    }
}

fn number_construct(interp: &mut Interpreter, callee: ObjRef, args: &[Value]) -> JsResult<Value> {
    let value = number_call(interp, callee, None, args)?;
    let proto = interp.intrinsics().number_prototype;
    Ok(Value::Object(interp.wrap_primitive("Number", value, proto)))
}

fn string_call(interp: &mut Interpreter, _callee: ObjRef, _this: Option<ObjRef>, args: &[Value]) -> JsResult<Value> {
    match args.first() {
        None => Ok(Value::from("")),
        Some(value) => Ok(Value::String(interp.to_string(value)?)),
    }
}

fn string_construct(interp: &mut Interpreter, callee: ObjRef, args: &[Value]) -> JsResult<Value> {
    let value = string_call(interp, callee, None, args)?;
    let proto = interp.intrinsics().string_prototype;
    Ok(Value::Object(interp.wrap_primitive("String", value, proto)))
}

/// Build a native error of `kind`; a defined first argument becomes the
/// message.
fn create_error(interp: &mut Interpreter, kind: ErrorKind, args: &[Value]) -> JsResult<Value> {
    let proto = interp.intrinsics().error_prototype(kind);
    let error = interp.alloc(Rc::new(NativeObject::new("Error")), Some(proto));
    let message = first(args);
    if !matches!(message, Value::Undefined) {
        let message = interp.to_string(message)?;
        let key = interp.names().message.clone();
        interp.define_own(error, &key, Value::String(message), Attributes::DEFAULT);
    }
    Ok(Value::Object(error))
}

fn error_call(kind: ErrorKind) -> Rc<NativeFn> {
    Rc::new(
        move |interp: &mut Interpreter, _callee: ObjRef, _this: Option<ObjRef>, args: &[Value]| {
            create_error(interp, kind, args)
        },
    )
}

fn error_construct(kind: ErrorKind) -> Rc<NativeConstructFn> {
    Rc::new(move |interp: &mut Interpreter, _callee: ObjRef, args: &[Value]| {
        create_error(interp, kind, args)
    })
}

/// `Error.prototype.toString`
fn error_to_string(interp: &mut Interpreter, _callee: ObjRef, this: Option<ObjRef>, _args: &[Value]) -> JsResult<Value> {
    let this = this_object(interp, this);
    let name_key = interp.names().name.clone();
    let message_key = interp.names().message.clone();
    let name = match interp.get(this, &name_key)? {
        Value::String(name) => name.to_string(),
        _ => "Error".to_string(),
    };
    match interp.get(this, &message_key)? {
        Value::String(message) if !message.is_empty() => Ok(Value::from(format!("{}: {}", name, message))),
        _ => Ok(Value::from(name)),
    }
}
