//! Native (host-implemented) functions.
//!
//! Every built-in is a [`NativeFunction`] wrapping a Rust closure with the
//! fixed native calling convention: interpreter, callee, receiver and
//! actual arguments in, a value or a throw out.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use core_types::{ErrorKind, Name, ObjRef, Value};
use memory_manager::{Trace, Tracer};

use crate::exception::JsResult;
use crate::object::ObjectClass;
use crate::property::{Attributes, PropertyTable};
use crate::system::SecurityDomain;
use crate::Interpreter;

/// Signature of a native call.
///
/// Arguments are the interpreter, the function object itself, the receiver
/// (`None` when the caller supplied none) and the actual arguments.
pub type NativeFn = dyn Fn(&mut Interpreter, ObjRef, Option<ObjRef>, &[Value]) -> JsResult<Value>;

/// Signature of a native construct.
pub type NativeConstructFn = dyn Fn(&mut Interpreter, ObjRef, &[Value]) -> JsResult<Value>;

/// A function implemented in Rust.
///
/// Handles captured by the closures are not traced; anything they refer to
/// must be reachable some other way.
pub struct NativeFunction {
    name: Name,
    sec_domain: Option<SecurityDomain>,
    func: Rc<NativeFn>,
    constructor: Option<Rc<NativeConstructFn>>,
    props: RefCell<PropertyTable>,
}

impl NativeFunction {
    /// A function with an empty property table and no recorded domain.
    pub(crate) fn bootstrap(name: Name, func: Rc<NativeFn>, constructor: Option<Rc<NativeConstructFn>>) -> Self {
        Self {
            name,
            sec_domain: None,
            func,
            constructor,
            props: RefCell::new(PropertyTable::new()),
        }
    }

    /// Function name.
    pub fn name(&self) -> &Name {
        &self.name
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("constructor", &self.constructor.is_some())
            .finish()
    }
}

impl Trace for NativeFunction {
    fn trace(&self, tracer: &mut Tracer) {
        self.props.borrow().trace(tracer);
    }
}

impl ObjectClass for NativeFunction {
    fn class_name(&self) -> &str {
        "Function"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn properties(&self) -> Option<&RefCell<PropertyTable>> {
        Some(&self.props)
    }

    fn has_call(&self) -> bool {
        true
    }

    fn call(
        &self,
        interp: &mut Interpreter,
        callee: ObjRef,
        this: Option<ObjRef>,
        args: &[Value],
    ) -> JsResult<Value> {
        (self.func)(interp, callee, this, args)
    }

    fn has_construct(&self) -> bool {
        self.constructor.is_some()
    }

    fn construct(&self, interp: &mut Interpreter, callee: ObjRef, args: &[Value]) -> JsResult<Value> {
        match &self.constructor {
            Some(constructor) => constructor(interp, callee, args),
            None => Err(interp.throw_error(ErrorKind::TypeError, "not a constructor")),
        }
    }

    fn security_domain(&self) -> Option<SecurityDomain> {
        self.sec_domain.clone()
    }

    fn function_name(&self) -> Option<Name> {
        Some(self.name.clone())
    }
}

impl Interpreter {
    /// Wrap `func` as a callable object.
    ///
    /// # Arguments
    ///
    /// * `name` - Function name, used by `toString` and tracebacks
    /// * `length` - Value of the `length` property
    /// * `func` - The implementation
    ///
    /// # Returns
    ///
    /// The new function object, inheriting from `Function.prototype` and
    /// recording the current security domain.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::Value;
    /// use interpreter::Interpreter;
    ///
    /// let mut interp = Interpreter::new();
    /// let double = interp.make_native_function("double", 1, |interp, _, _, args| {
    ///     let n = interp.to_number(args.first().unwrap_or(&Value::Undefined))?;
    ///     Ok(Value::Number(n * 2.0))
    /// });
    ///
    /// let result = interp.call_function(double, None, &[Value::Number(21.0)]).unwrap();
    /// assert_eq!(result, Value::Number(42.0));
    /// ```
    pub fn make_native_function<F>(&mut self, name: &str, length: u32, func: F) -> ObjRef
    where
        F: Fn(&mut Interpreter, ObjRef, Option<ObjRef>, &[Value]) -> JsResult<Value> + 'static,
    {
        self.make_native(name, length, Rc::new(func), None)
    }

    /// Wrap a call/construct pair as a constructor object.
    pub fn make_native_constructor<F, C>(&mut self, name: &str, length: u32, func: F, construct: C) -> ObjRef
    where
        F: Fn(&mut Interpreter, ObjRef, Option<ObjRef>, &[Value]) -> JsResult<Value> + 'static,
        C: Fn(&mut Interpreter, ObjRef, &[Value]) -> JsResult<Value> + 'static,
    {
        self.make_native(name, length, Rc::new(func), Some(Rc::new(construct)))
    }

    pub(crate) fn make_native(
        &mut self,
        name: &str,
        length: u32,
        func: Rc<NativeFn>,
        constructor: Option<Rc<NativeConstructFn>>,
    ) -> ObjRef {
        let name = self.intern(name);
        let mut props = PropertyTable::new();
        props.put(&self.names().length, Value::from(length), Attributes::LENGTH);
        let f = NativeFunction {
            name,
            sec_domain: self.sec_domain.clone(),
            func,
            constructor,
            props: RefCell::new(props),
        };
        let function_prototype = self.intrinsics().function_prototype;
        self.alloc(Rc::new(f), Some(function_prototype))
    }

    /// Install a native method `name` on `obj` with built-in attributes.
    pub fn define_native_method<F>(&mut self, obj: ObjRef, name: &str, length: u32, func: F) -> ObjRef
    where
        F: Fn(&mut Interpreter, ObjRef, Option<ObjRef>, &[Value]) -> JsResult<Value> + 'static,
    {
        let f = self.make_native_function(name, length, func);
        let key = self.intern(name);
        self.define_own(obj, &key, Value::Object(f), Attributes::DEFAULT);
        f
    }
}
