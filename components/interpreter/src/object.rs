//! Object dispatch.
//!
//! Every heap object implements [`ObjectClass`]. The property operations
//! default to ordinary native-object behaviour over the table returned by
//! [`ObjectClass::properties`]; the optional capabilities (call, construct,
//! has-instance, security domain) default to "unsupported".
//!
//! Callers go through the `Interpreter` methods in this module rather than
//! the trait directly, so that calls and constructs are guarded and stale
//! handles are caught.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use core_types::{CallType, ErrorKind, Name, ObjRef, Value};
use memory_manager::{Finalizer, Trace};

use crate::exception::JsResult;
use crate::function::FunctionCore;
use crate::native;
use crate::property::{Attributes, Enumerator, PropertyTable};
use crate::system::SecurityDomain;
use crate::Interpreter;

/// Preferred type for default-value conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hint {
    /// Try `toString` first
    String,
    /// Try `valueOf` first
    Number,
}

/// Operations every object kind provides.
///
/// Implementations receive the interpreter and their own handle (`this`) so
/// they can consult the prototype link and re-enter the runtime.
pub trait ObjectClass: Trace + 'static {
    /// The `[[Class]]` name.
    fn class_name(&self) -> &str;

    /// Downcasting support.
    fn as_any(&self) -> &dyn Any;

    /// Own property storage, if the object keeps any.
    fn properties(&self) -> Option<&RefCell<PropertyTable>> {
        None
    }

    /// `[[Get]]`
    fn get(&self, interp: &mut Interpreter, this: ObjRef, name: &Name) -> JsResult<Value> {
        native::get(interp, this, self.properties(), name)
    }

    /// `[[Put]]`; a non-empty `attributes` bypasses the can-put check.
    fn put(
        &self,
        interp: &mut Interpreter,
        this: ObjRef,
        name: &Name,
        value: Value,
        attributes: Attributes,
    ) -> JsResult<()> {
        native::put(interp, this, self.properties(), name, value, attributes)
    }

    /// `[[CanPut]]`
    fn can_put(&self, interp: &mut Interpreter, this: ObjRef, name: &Name) -> JsResult<bool> {
        native::can_put(interp, this, self.properties(), name)
    }

    /// `[[HasProperty]]`
    fn has_property(&self, interp: &mut Interpreter, this: ObjRef, name: &Name) -> JsResult<bool> {
        native::has_property(interp, this, self.properties(), name)
    }

    /// True if `name` is an own property.
    fn has_own_property(&self, _interp: &mut Interpreter, _this: ObjRef, name: &Name) -> JsResult<bool> {
        Ok(self
            .properties()
            .map_or(false, |props| props.borrow().contains(name)))
    }

    /// `[[Delete]]`; returns false for a don't-delete property.
    fn delete(&self, _interp: &mut Interpreter, _this: ObjRef, name: &Name) -> JsResult<bool> {
        Ok(native::delete(self.properties(), name))
    }

    /// `[[DefaultValue]]`
    fn default_value(&self, interp: &mut Interpreter, this: ObjRef, hint: Option<Hint>) -> JsResult<Value> {
        native::default_value(interp, this, hint)
    }

    /// Own property names; `None` if the object cannot be enumerated.
    fn enumerator(&self, _interp: &mut Interpreter, _this: ObjRef) -> JsResult<Option<Enumerator>> {
        Ok(self.properties().map(|props| Enumerator::new(&props.borrow())))
    }

    /// True if the object implements [`ObjectClass::call`].
    fn has_call(&self) -> bool {
        false
    }

    /// `[[Call]]`
    fn call(
        &self,
        interp: &mut Interpreter,
        _callee: ObjRef,
        _this: Option<ObjRef>,
        _args: &[Value],
    ) -> JsResult<Value> {
        Err(interp.throw_error(ErrorKind::TypeError, "object is not callable"))
    }

    /// True if the object implements [`ObjectClass::construct`].
    fn has_construct(&self) -> bool {
        false
    }

    /// `[[Construct]]`
    fn construct(&self, interp: &mut Interpreter, _callee: ObjRef, _args: &[Value]) -> JsResult<Value> {
        Err(interp.throw_error(ErrorKind::TypeError, "object is not a constructor"))
    }

    /// `[[HasInstance]]`; objects without one answer false.
    fn has_instance(&self, _interp: &mut Interpreter, _this: ObjRef, _value: &Value) -> JsResult<bool> {
        Ok(false)
    }

    /// Security domain active where this object was defined.
    fn security_domain(&self) -> Option<SecurityDomain> {
        None
    }

    /// Shared function core, for function instances.
    fn function_core(&self) -> Option<&Rc<FunctionCore>> {
        None
    }

    /// Declared name, for traceback rendering.
    fn function_name(&self) -> Option<Name> {
        None
    }
}

impl Interpreter {
    /// Borrow the object behind `r`. A stale handle is fatal.
    pub fn object(&self, r: ObjRef) -> Rc<dyn ObjectClass> {
        match self.heap.get(r) {
            Some(obj) => obj,
            None => self.fatal(&format!("dangling object handle {}", r)),
        }
    }

    /// True if `r` is a live object of concrete type `T`.
    pub fn is_kind<T: ObjectClass>(&self, r: ObjRef) -> bool {
        self.heap.get(r).map_or(false, |obj| obj.as_any().is::<T>())
    }

    /// Allocate `obj` with the given prototype link. Heap exhaustion is fatal.
    pub fn alloc(&mut self, obj: Rc<dyn ObjectClass>, prototype: Option<ObjRef>) -> ObjRef {
        match self.heap.allocate(obj, prototype) {
            Ok(r) => r,
            Err(e) => self.fatal(&e.to_string()),
        }
    }

    /// Allocate a host object that runs `finalizer` once when a collection
    /// reclaims it. Heap exhaustion is fatal.
    pub fn alloc_finalized(
        &mut self,
        obj: Rc<dyn ObjectClass>,
        prototype: Option<ObjRef>,
        finalizer: Finalizer<dyn ObjectClass>,
    ) -> ObjRef {
        match self.heap.allocate_finalized(obj, prototype, finalizer) {
            Ok(r) => r,
            Err(e) => self.fatal(&e.to_string()),
        }
    }

    /// Prototype link of `obj`.
    pub fn prototype_of(&self, obj: ObjRef) -> Option<ObjRef> {
        self.heap.prototype(obj)
    }

    /// Replace the prototype link of `obj`, refusing cycles with a TypeError.
    ///
    /// A function instance on the new chain whose shared property holder
    /// is `obj` counts as a cycle, since lookups on the instance go through
    /// that holder.
    pub fn set_prototype(&mut self, obj: ObjRef, prototype: Option<ObjRef>) -> JsResult<()> {
        let mut p = prototype;
        while let Some(candidate) = p {
            if self.joined(obj, candidate) || self.shares_properties_with(candidate, obj) {
                return Err(self.throw_error(ErrorKind::TypeError, "cyclic prototype chain"));
            }
            p = self.prototype_of(candidate);
        }
        self.heap.set_prototype(obj, prototype);
        Ok(())
    }

    /// True if `instance` is a function whose properties live on `holder`.
    fn shares_properties_with(&self, instance: ObjRef, holder: ObjRef) -> bool {
        self.heap
            .get(instance)
            .and_then(|o| o.function_core().and_then(|core| core.common()))
            == Some(holder)
    }

    /// True if `a` and `b` are the same object or joined function instances.
    pub fn joined(&self, a: ObjRef, b: ObjRef) -> bool {
        if a == b {
            return true;
        }
        match (self.heap.get(a), self.heap.get(b)) {
            (Some(oa), Some(ob)) => match (oa.function_core(), ob.function_core()) {
                (Some(ca), Some(cb)) => Rc::ptr_eq(ca, cb),
                _ => false,
            },
            _ => false,
        }
    }

    /// Class name of `obj`.
    pub fn class_name(&self, obj: ObjRef) -> String {
        self.object(obj).class_name().to_string()
    }

    /// `[[Get]]` on `obj`.
    pub fn get(&mut self, obj: ObjRef, name: &Name) -> JsResult<Value> {
        let o = self.object(obj);
        o.get(self, obj, name)
    }

    /// `[[Get]]` with a name given as text.
    pub fn get_str(&mut self, obj: ObjRef, name: &str) -> JsResult<Value> {
        let name = self.intern(name);
        self.get(obj, &name)
    }

    /// `[[Put]]` on `obj`.
    pub fn put(&mut self, obj: ObjRef, name: &Name, value: Value, attributes: Attributes) -> JsResult<()> {
        log::trace!("put {}.{} attrs={:?}", obj, name, attributes);
        let o = self.object(obj);
        o.put(self, obj, name, value, attributes)
    }

    /// `[[Put]]` with a name given as text.
    pub fn put_str(&mut self, obj: ObjRef, name: &str, value: Value, attributes: Attributes) -> JsResult<()> {
        let name = self.intern(name);
        self.put(obj, &name, value, attributes)
    }

    /// `[[CanPut]]` on `obj`.
    pub fn can_put(&mut self, obj: ObjRef, name: &Name) -> JsResult<bool> {
        let o = self.object(obj);
        o.can_put(self, obj, name)
    }

    /// `[[HasProperty]]` on `obj`.
    pub fn has_property(&mut self, obj: ObjRef, name: &Name) -> JsResult<bool> {
        let o = self.object(obj);
        o.has_property(self, obj, name)
    }

    /// True if `name` is an own property of `obj`.
    pub fn has_own_property(&mut self, obj: ObjRef, name: &Name) -> JsResult<bool> {
        let o = self.object(obj);
        o.has_own_property(self, obj, name)
    }

    /// `[[Delete]]` on `obj`.
    pub fn delete(&mut self, obj: ObjRef, name: &Name) -> JsResult<bool> {
        let o = self.object(obj);
        o.delete(self, obj, name)
    }

    /// `[[DefaultValue]]` on `obj`.
    pub fn default_value(&mut self, obj: ObjRef, hint: Option<Hint>) -> JsResult<Value> {
        let o = self.object(obj);
        o.default_value(self, obj, hint)
    }

    /// Own property names of `obj`, or an empty sequence if it has none.
    pub fn enumerator(&mut self, obj: ObjRef) -> JsResult<Enumerator> {
        let o = self.object(obj);
        Ok(o.enumerator(self, obj)?.unwrap_or_else(Enumerator::empty))
    }

    /// True if `value` is a callable object.
    pub fn is_callable(&self, value: &Value) -> bool {
        match value {
            Value::Object(r) => self.heap.get(*r).map_or(false, |o| o.has_call()),
            _ => false,
        }
    }

    /// True if `value` is a constructor.
    pub fn is_constructor(&self, value: &Value) -> bool {
        match value {
            Value::Object(r) => self.heap.get(*r).map_or(false, |o| o.has_construct()),
            _ => false,
        }
    }

    /// Call `func` with receiver `this`, under the call guard.
    ///
    /// # Arguments
    ///
    /// * `func` - The callee
    /// * `this` - Receiver; functions substitute the global object for `None`
    /// * `args` - Actual arguments
    ///
    /// # Returns
    ///
    /// The call's result. A non-callable `func` throws a TypeError.
    pub fn call(&mut self, func: ObjRef, this: Option<ObjRef>, args: &[Value]) -> JsResult<Value> {
        let o = self.object(func);
        if !o.has_call() {
            return Err(self.throw_error(ErrorKind::TypeError, "not a function"));
        }
        let guard = self.enter_call(func, o.security_domain(), CallType::Call)?;
        let mark = self.pin_frame(this.into_iter().chain(args.iter().filter_map(Value::as_object)));
        let result = o.call(self, func, this, args);
        self.unpin_frame(mark);
        self.leave_call(guard);
        result
    }

    /// Construct with `func`, under the call guard.
    pub fn construct(&mut self, func: ObjRef, args: &[Value]) -> JsResult<Value> {
        let o = self.object(func);
        if !o.has_construct() {
            return Err(self.throw_error(ErrorKind::TypeError, "not a constructor"));
        }
        let guard = self.enter_call(func, o.security_domain(), CallType::Construct)?;
        let mark = self.pin_frame(args.iter().filter_map(Value::as_object));
        let result = o.construct(self, func, args);
        self.unpin_frame(mark);
        self.leave_call(guard);
        result
    }

    /// Construct without the recursion and domain guard.
    pub(crate) fn construct_unguarded(&mut self, func: ObjRef, args: &[Value]) -> JsResult<Value> {
        let o = self.object(func);
        o.construct(self, func, args)
    }

    /// `[[HasInstance]]` of `func` applied to `value`.
    pub fn has_instance(&mut self, func: ObjRef, value: &Value) -> JsResult<bool> {
        let o = self.object(func);
        o.has_instance(self, func, value)
    }

    /// Security domain recorded by `obj`.
    pub fn security_domain_of(&self, obj: ObjRef) -> Option<SecurityDomain> {
        self.object(obj).security_domain()
    }
}
