//! Activation and arguments objects.
//!
//! The activation holds a call's local bindings. Formal parameters are not
//! stored in its property table but in a raw argument vector addressed by
//! position, so duplicate parameter names resolve to the last one and
//! surplus arguments stay reachable. The arguments object aliases the same
//! vector by numeric index until an index is deleted.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use core_types::{ErrorKind, Name, ObjRef, Value};
use memory_manager::{Trace, Tracer};

use crate::exception::JsResult;
use crate::function::FunctionCore;
use crate::native;
use crate::object::{Hint, ObjectClass};
use crate::property::{Attributes, PropertyTable};
use crate::Interpreter;

type ArgVector = Rc<RefCell<Vec<Value>>>;

/// Variable object of one function call.
pub struct Activation {
    core: Rc<FunctionCore>,
    argv: ArgVector,
    props: RefCell<PropertyTable>,
}

impl Activation {
    /// Current value of the parameter at `index`.
    pub fn argument(&self, index: usize) -> Option<Value> {
        self.argv.borrow().get(index).cloned()
    }
}

impl Trace for Activation {
    fn trace(&self, tracer: &mut Tracer) {
        tracer.mark_values(self.argv.borrow().iter());
        self.props.borrow().trace(tracer);
        tracer.mark_opt(self.core.common());
    }
}

impl ObjectClass for Activation {
    fn class_name(&self) -> &str {
        "Activation"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn properties(&self) -> Option<&RefCell<PropertyTable>> {
        Some(&self.props)
    }

    fn get(&self, interp: &mut Interpreter, this: ObjRef, name: &Name) -> JsResult<Value> {
        if let Some(i) = self.core.param_index(name) {
            return Ok(self.argv.borrow()[i].clone());
        }
        native::get(interp, this, Some(&self.props), name)
    }

    fn put(
        &self,
        interp: &mut Interpreter,
        this: ObjRef,
        name: &Name,
        value: Value,
        attributes: Attributes,
    ) -> JsResult<()> {
        if let Some(i) = self.core.param_index(name) {
            self.argv.borrow_mut()[i] = value;
            return Ok(());
        }
        native::put(interp, this, Some(&self.props), name, value, attributes)
    }

    fn default_value(&self, interp: &mut Interpreter, _this: ObjRef, _hint: Option<Hint>) -> JsResult<Value> {
        Err(interp.throw_error(
            ErrorKind::TypeError,
            "activation object has no default value",
        ))
    }
}

/// The `arguments` object of one call.
pub struct Arguments {
    argv: ArgVector,
    argc: usize,
    deleted: RefCell<Vec<bool>>,
    props: RefCell<PropertyTable>,
}

impl Arguments {
    /// Number of actual arguments.
    pub fn argc(&self) -> usize {
        self.argc
    }

    fn index_of(&self, name: &Name) -> Option<usize> {
        let i = name.array_index()? as usize;
        if i < self.argc && !self.deleted.borrow()[i] {
            Some(i)
        } else {
            None
        }
    }
}

impl Trace for Arguments {
    fn trace(&self, tracer: &mut Tracer) {
        tracer.mark_values(self.argv.borrow().iter());
        self.props.borrow().trace(tracer);
    }
}

impl ObjectClass for Arguments {
    fn class_name(&self) -> &str {
        "Arguments"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn properties(&self) -> Option<&RefCell<PropertyTable>> {
        Some(&self.props)
    }

    fn get(&self, interp: &mut Interpreter, this: ObjRef, name: &Name) -> JsResult<Value> {
        if let Some(i) = self.index_of(name) {
            return Ok(self.argv.borrow()[i].clone());
        }
        native::get(interp, this, Some(&self.props), name)
    }

    fn put(
        &self,
        interp: &mut Interpreter,
        this: ObjRef,
        name: &Name,
        value: Value,
        attributes: Attributes,
    ) -> JsResult<()> {
        if let Some(i) = self.index_of(name) {
            self.argv.borrow_mut()[i] = value;
            return Ok(());
        }
        native::put(interp, this, Some(&self.props), name, value, attributes)
    }

    fn delete(&self, _interp: &mut Interpreter, _this: ObjRef, name: &Name) -> JsResult<bool> {
        if let Some(i) = self.index_of(name) {
            self.deleted.borrow_mut()[i] = true;
        }
        Ok(native::delete(Some(&self.props), name))
    }

    fn default_value(&self, interp: &mut Interpreter, this: ObjRef, hint: Option<Hint>) -> JsResult<Value> {
        if !interp.compat().js_extensions() {
            return native::default_value(interp, this, hint);
        }
        let values: Vec<Value> = self.argv.borrow()[..self.argc].to_vec();
        let mut parts = Vec::with_capacity(values.len());
        for (i, v) in values.iter().enumerate() {
            let s = interp.to_string(v)?;
            parts.push(format!("{}={}", i, s));
        }
        Ok(Value::from(format!("[{}]", parts.join(", "))))
    }
}

/// Build the activation and arguments objects for a call of `callee`.
///
/// Returns `(activation, arguments)`.
pub(crate) fn create(
    interp: &mut Interpreter,
    callee: ObjRef,
    core: &Rc<FunctionCore>,
    args: &[Value],
) -> (ObjRef, ObjRef) {
    let nparams = core.params().len();
    let argc = args.len();
    let mut values = args.to_vec();
    values.resize(nparams.max(argc), Value::Undefined);
    let argv: ArgVector = Rc::new(RefCell::new(values));
    let names = interp.names().clone();

    let mut arg_props = PropertyTable::new();
    arg_props.put(&names.callee, Value::Object(callee), Attributes::DONTENUM);
    arg_props.put(&names.length, Value::Number(argc as f64), Attributes::DONTENUM);
    for i in 0..argc {
        let index = interp.intern(&i.to_string());
        arg_props.put(&index, Value::Undefined, Attributes::DONTENUM);
    }
    let arguments = Arguments {
        argv: Rc::clone(&argv),
        argc,
        deleted: RefCell::new(vec![false; argc]),
        props: RefCell::new(arg_props),
    };
    let object_prototype = interp.intrinsics().object_prototype;
    let arguments = interp.alloc(Rc::new(arguments), Some(object_prototype));

    let mut act_props = PropertyTable::new();
    act_props.put(&names.arguments, Value::Object(arguments), Attributes::DONTDELETE);
    for param in core.params() {
        act_props.put(param, Value::Undefined, Attributes::DONTDELETE);
    }
    let activation = Activation {
        core: Rc::clone(core),
        argv,
        props: RefCell::new(act_props),
    };
    let activation = interp.alloc(Rc::new(activation), None);
    log::trace!("activation {} for {} ({} args)", activation, callee, argc);
    (activation, arguments)
}
