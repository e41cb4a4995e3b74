//! Ordinary ("native") objects.
//!
//! The functions here implement the standard property algorithms over an
//! optional [`PropertyTable`]; [`ObjectClass`] uses them as its defaults and
//! specialised objects call them for everything they do not intercept.

use std::any::Any;
use std::cell::RefCell;

use core_types::{ErrorKind, Name, ObjRef, Value};
use memory_manager::{Trace, Tracer};

use crate::exception::JsResult;
use crate::object::{Hint, ObjectClass};
use crate::property::{Attributes, PropertyTable};
use crate::Interpreter;

/// An object that is nothing but a property table.
pub struct NativeObject {
    class: &'static str,
    props: RefCell<PropertyTable>,
}

impl NativeObject {
    /// An empty object of the given class.
    pub fn new(class: &'static str) -> Self {
        Self {
            class,
            props: RefCell::new(PropertyTable::new()),
        }
    }
}

impl Trace for NativeObject {
    fn trace(&self, tracer: &mut Tracer) {
        self.props.borrow().trace(tracer);
    }
}

impl ObjectClass for NativeObject {
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
    /// A new empty object inheriting from `Object.prototype`.
    pub fn new_object(&mut self) -> ObjRef {
        let proto = self.intrinsics().object_prototype;
        self.new_object_with_proto(Some(proto))
    }

    /// A new empty object with an explicit prototype link.
    pub fn new_object_with_proto(&mut self, prototype: Option<ObjRef>) -> ObjRef {
        self.alloc(std::rc::Rc::new(NativeObject::new("Object")), prototype)
    }
}

fn is_proto_name(interp: &Interpreter, name: &Name) -> bool {
    interp.compat().js_extensions() && *name == interp.names().proto
}

/// `[[Get]]`: own table, then the prototype chain, else undefined.
pub fn get(
    interp: &mut Interpreter,
    this: ObjRef,
    props: Option<&RefCell<PropertyTable>>,
    name: &Name,
) -> JsResult<Value> {
    if is_proto_name(interp, name) {
        return Ok(interp
            .prototype_of(this)
            .map_or(Value::Null, Value::Object));
    }
    let own = props.and_then(|p| p.borrow().get(name).cloned());
    if let Some(value) = own {
        return Ok(value);
    }
    match interp.prototype_of(this) {
        Some(proto) => interp.get(proto, name),
        None => Ok(Value::Undefined),
    }
}

/// `[[Put]]`: silently ignored when can-put fails and no authority is given.
pub fn put(
    interp: &mut Interpreter,
    this: ObjRef,
    props: Option<&RefCell<PropertyTable>>,
    name: &Name,
    value: Value,
    attributes: Attributes,
) -> JsResult<()> {
    if is_proto_name(interp, name) {
        return put_proto(interp, this, value);
    }
    if attributes.is_empty() && !interp.can_put(this, name)? {
        log::trace!("put of read-only {} on {} ignored", name, this);
        return Ok(());
    }
    if let Some(props) = props {
        props.borrow_mut().put(name, value, attributes);
    }
    Ok(())
}

fn put_proto(interp: &mut Interpreter, this: ObjRef, value: Value) -> JsResult<()> {
    match value {
        Value::Null => interp.set_prototype(this, None),
        Value::Object(proto) => interp.set_prototype(this, Some(proto)),
        _ => Err(interp.throw_error(
            ErrorKind::TypeError,
            "__proto__ must be an object or null",
        )),
    }
}

/// `[[CanPut]]`: own read-only blocks, else ask the prototype.
pub fn can_put(
    interp: &mut Interpreter,
    this: ObjRef,
    props: Option<&RefCell<PropertyTable>>,
    name: &Name,
) -> JsResult<bool> {
    let own = props.and_then(|p| p.borrow().attributes(name));
    if let Some(attributes) = own {
        return Ok(!attributes.contains(Attributes::READONLY));
    }
    match interp.prototype_of(this) {
        Some(proto) => interp.can_put(proto, name),
        None => Ok(true),
    }
}

/// `[[HasProperty]]`: own table, then the prototype chain.
pub fn has_property(
    interp: &mut Interpreter,
    this: ObjRef,
    props: Option<&RefCell<PropertyTable>>,
    name: &Name,
) -> JsResult<bool> {
    if props.map_or(false, |p| p.borrow().contains(name)) {
        return Ok(true);
    }
    match interp.prototype_of(this) {
        Some(proto) => interp.has_property(proto, name),
        None => Ok(false),
    }
}

/// `[[Delete]]`: own table only; a don't-delete entry stays and fails.
pub fn delete(props: Option<&RefCell<PropertyTable>>, name: &Name) -> bool {
    let Some(props) = props else {
        return true;
    };
    let mut table = props.borrow_mut();
    match table.attributes(name) {
        None => true,
        Some(attributes) if attributes.contains(Attributes::DONTDELETE) => false,
        Some(_) => {
            table.remove(name);
            true
        }
    }
}

/// `[[DefaultValue]]`: try `toString`/`valueOf` in hint order.
///
/// The first callable method returning a primitive wins. If neither does,
/// a TypeError is thrown, or under JavaScript compatibility a
/// `[object Class]` string is produced instead.
pub fn default_value(interp: &mut Interpreter, this: ObjRef, hint: Option<Hint>) -> JsResult<Value> {
    let names = interp.names();
    let order = match hint {
        Some(Hint::String) => [names.to_string.clone(), names.value_of.clone()],
        Some(Hint::Number) | None => [names.value_of.clone(), names.to_string.clone()],
    };
    for method in &order {
        let f = interp.get(this, method)?;
        if let Value::Object(f) = f {
            if interp.is_callable(&Value::Object(f)) {
                let result = interp.call(f, Some(this), &[])?;
                if !matches!(result, Value::Object(_)) {
                    return Ok(result);
                }
            }
        }
    }
    if interp.compat().js_extensions() {
        let class = interp.class_name(this);
        return Ok(Value::from(format!("[object {}]", class)));
    }
    let message = match hint {
        Some(Hint::String) => "cannot convert object to string",
        _ => "cannot convert object to number",
    };
    Err(interp.throw_error(ErrorKind::TypeError, message))
}
