//! Execution context handed to function bodies.

use std::rc::Rc;

use core_types::{ObjRef, Value};

use crate::exception::JsResult;
use crate::property::Attributes;
use crate::scope::Scope;
use crate::Interpreter;

/// Runtime state of one piece of executing code.
///
/// For a function call the activation and the variable object are the same
/// object and variables are created don't-delete. Global code uses the
/// global object for both.
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    /// Activation object of the call
    pub activation: ObjRef,
    /// Object receiving `var` declarations
    pub variable: ObjRef,
    /// Attributes given to declared variables
    pub var_attrs: Attributes,
    /// Value of `this`
    pub this: ObjRef,
    /// Scope chain for identifier resolution
    pub scope: Rc<Scope>,
}

impl ExecutionContext {
    /// Context for global code.
    pub fn global(interp: &Interpreter) -> Self {
        let global = interp.global();
        Self {
            activation: global,
            variable: global,
            var_attrs: Attributes::empty(),
            this: global,
            scope: interp.global_scope(),
        }
    }

    /// Resolve `name` on the scope chain and read it.
    ///
    /// An unresolvable name throws a ReferenceError.
    pub fn lookup(&self, interp: &mut Interpreter, name: &str) -> JsResult<Value> {
        let name = interp.intern(name);
        let reference = interp.scope_lookup(&self.scope, &name)?;
        interp.get_value(&reference)
    }

    /// Resolve `name` on the scope chain and assign to it.
    pub fn assign(&self, interp: &mut Interpreter, name: &str, value: Value) -> JsResult<()> {
        let name = interp.intern(name);
        let reference = interp.scope_lookup(&self.scope, &name)?;
        interp.put_value(&reference, value)
    }

    /// Declare a variable on the variable object, leaving an existing
    /// binding's value alone.
    pub fn declare_var(&self, interp: &mut Interpreter, name: &str) -> JsResult<()> {
        let name = interp.intern(name);
        if interp.has_property(self.variable, &name)? {
            return Ok(());
        }
        interp.put(self.variable, &name, Value::Undefined, self.var_attrs)
    }
}
