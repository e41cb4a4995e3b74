//! Function cores and function instances.
//!
//! A [`FunctionCore`] is what the parser produces for one syntactic function:
//! parameter names, body and declared name. Instantiating it against a scope
//! chain yields a [`FunctionInstance`] object. All instances of one core are
//! joined: they share a single property table (the core's "common" object),
//! and an instantiation whose scope is equivalent to the cached instance's
//! scope returns that same instance.

use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use core_types::{Completion, CompletionKind, ErrorKind, Name, ObjRef, Value};
use memory_manager::{Trace, Tracer};

use crate::activation::{self, Arguments};
use crate::context::ExecutionContext;
use crate::exception::JsResult;
use crate::native::{self, NativeObject};
use crate::object::{Hint, ObjectClass};
use crate::property::{Attributes, Enumerator, Property};
use crate::scope::Scope;
use crate::system::SecurityDomain;
use crate::Interpreter;

/// Executable body of a function.
///
/// Parsed function bodies implement this; so do host-written bodies used
/// to embed behaviour without source text.
pub trait FunctionBody {
    /// Run the body in `ctx`.
    ///
    /// Only normal and return completions may escape a function body.
    fn execute(&self, interp: &mut Interpreter, ctx: &mut ExecutionContext) -> JsResult<Completion>;

    /// True if the body has no statements; calls skip it entirely.
    fn is_empty(&self) -> bool {
        false
    }

    /// Source text, used by `Function.prototype.toString`.
    fn source_text(&self) -> &str {
        ""
    }

    /// Report object handles held by the body.
    fn trace(&self, _tracer: &mut Tracer) {}
}

/// A body with no statements.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyBody;

impl FunctionBody for EmptyBody {
    fn execute(&self, _interp: &mut Interpreter, _ctx: &mut ExecutionContext) -> JsResult<Completion> {
        Ok(Completion::normal())
    }

    fn is_empty(&self) -> bool {
        true
    }
}

/// A body implemented by a Rust closure.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use core_types::{Completion, Value};
/// use interpreter::{HostBody, Interpreter};
///
/// let mut interp = Interpreter::new();
/// let body = HostBody::new(|_, _| Ok(Completion::returning(Value::Number(42.0))));
/// let f = interp.new_function(Some("answer"), &[], Rc::new(body));
///
/// let result = interp.call_function(f, None, &[]).unwrap();
/// assert_eq!(result, Value::Number(42.0));
/// ```
pub struct HostBody<F> {
    run: F,
    source: String,
}

impl<F> HostBody<F>
where
    F: Fn(&mut Interpreter, &mut ExecutionContext) -> JsResult<Completion>,
{
    /// Wrap `run`.
    pub fn new(run: F) -> Self {
        Self {
            run,
            source: String::new(),
        }
    }

    /// Wrap `run`, reporting `source` as its text.
    pub fn with_source(run: F, source: impl Into<String>) -> Self {
        Self {
            run,
            source: source.into(),
        }
    }
}

impl<F> FunctionBody for HostBody<F>
where
    F: Fn(&mut Interpreter, &mut ExecutionContext) -> JsResult<Completion>,
{
    fn execute(&self, interp: &mut Interpreter, ctx: &mut ExecutionContext) -> JsResult<Completion> {
        (self.run)(interp, ctx)
    }

    fn source_text(&self) -> &str {
        &self.source
    }
}

/// Shared description of one syntactic function.
pub struct FunctionCore {
    params: Vec<Name>,
    body: Rc<dyn FunctionBody>,
    name: Option<Name>,
    sec_domain: Option<SecurityDomain>,
    is_empty: bool,
    common: Cell<Option<ObjRef>>,
    cache: Cell<Option<ObjRef>>,
}

impl FunctionCore {
    /// Formal parameter names, in declaration order.
    pub fn params(&self) -> &[Name] {
        &self.params
    }

    /// Declared name, if any.
    pub fn name(&self) -> Option<&Name> {
        self.name.as_ref()
    }

    /// The body.
    pub fn body(&self) -> &Rc<dyn FunctionBody> {
        &self.body
    }

    /// Security domain active when the function was defined.
    pub fn security_domain(&self) -> Option<&SecurityDomain> {
        self.sec_domain.as_ref()
    }

    /// The shared property object, once the core has been instantiated.
    pub fn common(&self) -> Option<ObjRef> {
        self.common.get()
    }

    /// Position of the last parameter called `name`.
    pub(crate) fn param_index(&self, name: &Name) -> Option<usize> {
        self.params.iter().rposition(|p| p == name)
    }

    /// The empty core behind `Function.prototype`, with its common object
    /// already allocated.
    pub(crate) fn bootstrap(common: ObjRef) -> Rc<FunctionCore> {
        Rc::new(FunctionCore {
            params: Vec::new(),
            body: Rc::new(EmptyBody),
            name: None,
            sec_domain: None,
            is_empty: true,
            common: Cell::new(Some(common)),
            cache: Cell::new(None),
        })
    }
}

impl fmt::Debug for FunctionCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionCore")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("is_empty", &self.is_empty)
            .field("common", &self.common.get())
            .finish()
    }
}

/// A closure: a function core bound to a captured scope chain.
pub struct FunctionInstance {
    core: Rc<FunctionCore>,
    scope: Rc<Scope>,
}

impl FunctionInstance {
    /// The shared core.
    pub fn core(&self) -> &Rc<FunctionCore> {
        &self.core
    }

    /// The captured scope chain.
    pub fn scope(&self) -> &Rc<Scope> {
        &self.scope
    }

    fn common(&self, interp: &Interpreter) -> ObjRef {
        match self.core.common.get() {
            Some(common) => common,
            None => interp.fatal("function instance without a common object"),
        }
    }

    pub(crate) fn bootstrap(core: Rc<FunctionCore>, scope: Rc<Scope>) -> Self {
        Self { core, scope }
    }
}

impl Trace for FunctionInstance {
    fn trace(&self, tracer: &mut Tracer) {
        tracer.mark_opt(self.core.common.get());
        tracer.mark_opt(self.core.cache.get());
        self.scope.trace(tracer);
        self.core.body.trace(tracer);
    }
}

impl ObjectClass for FunctionInstance {
    fn class_name(&self) -> &str {
        "Function"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn get(&self, interp: &mut Interpreter, _this: ObjRef, name: &Name) -> JsResult<Value> {
        let common = self.common(interp);
        interp.get(common, name)
    }

    fn put(
        &self,
        interp: &mut Interpreter,
        _this: ObjRef,
        name: &Name,
        value: Value,
        attributes: Attributes,
    ) -> JsResult<()> {
        let common = self.common(interp);
        interp.put(common, name, value, attributes)
    }

    fn can_put(&self, interp: &mut Interpreter, _this: ObjRef, name: &Name) -> JsResult<bool> {
        let common = self.common(interp);
        interp.can_put(common, name)
    }

    fn has_property(&self, interp: &mut Interpreter, _this: ObjRef, name: &Name) -> JsResult<bool> {
        let common = self.common(interp);
        interp.has_property(common, name)
    }

    fn has_own_property(&self, interp: &mut Interpreter, _this: ObjRef, name: &Name) -> JsResult<bool> {
        let common = self.common(interp);
        interp.has_own_property(common, name)
    }

    fn delete(&self, interp: &mut Interpreter, _this: ObjRef, name: &Name) -> JsResult<bool> {
        let common = self.common(interp);
        interp.delete(common, name)
    }

    fn enumerator(&self, interp: &mut Interpreter, _this: ObjRef) -> JsResult<Option<Enumerator>> {
        let common = self.common(interp);
        let o = interp.object(common);
        o.enumerator(interp, common)
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
        if self.core.is_empty {
            return Ok(Value::Undefined);
        }

        let (activation, arguments) = activation::create(interp, callee, &self.core, args);
        let scope = Scope::new(activation, Some(Rc::clone(&self.scope)));
        let mut ctx = ExecutionContext {
            activation,
            variable: activation,
            var_attrs: Attributes::DONTDELETE,
            this: this.unwrap_or_else(|| interp.global()),
            scope,
        };

        let common = self.common(interp);
        let saved = if interp.compat().js_extensions() {
            Some(swap_arguments(interp, common, arguments))
        } else {
            None
        };

        let displaced = saved
            .as_ref()
            .and_then(|saved| saved.as_ref())
            .and_then(|property| property.value.as_object());
        let mark = interp.pin_frame([activation, arguments, ctx.this].into_iter().chain(displaced));
        let result = self.core.body.execute(interp, &mut ctx);
        interp.unpin_frame(mark);

        if let Some(saved) = saved {
            restore_arguments(interp, common, saved);
        }

        let completion = result?;
        match completion.kind {
            CompletionKind::Normal => Ok(Value::Undefined),
            CompletionKind::Return => Ok(completion.value.unwrap_or(Value::Undefined)),
            kind => interp.fatal(&format!("{:?} completion escaped a function body", kind)),
        }
    }

    fn has_construct(&self) -> bool {
        true
    }

    fn construct(&self, interp: &mut Interpreter, callee: ObjRef, args: &[Value]) -> JsResult<Value> {
        let prototype = interp.names().prototype.clone();
        let proto = match interp.get(callee, &prototype)? {
            Value::Object(proto) => proto,
            _ => interp.intrinsics().object_prototype,
        };
        let obj = interp.new_object_with_proto(Some(proto));
        let result = self.call(interp, callee, Some(obj), args)?;
        Ok(match result {
            Value::Object(_) => result,
            _ => Value::Object(obj),
        })
    }

    fn has_instance(&self, interp: &mut Interpreter, this: ObjRef, value: &Value) -> JsResult<bool> {
        let Value::Object(mut v) = *value else {
            return Ok(false);
        };
        let prototype = interp.names().prototype.clone();
        let proto = match interp.get(this, &prototype)? {
            Value::Object(proto) => proto,
            _ => {
                return Err(interp.throw_error(ErrorKind::TypeError, "function prototype is not an object"))
            }
        };
        while let Some(p) = interp.prototype_of(v) {
            if interp.joined(p, proto) {
                return Ok(true);
            }
            v = p;
        }
        Ok(false)
    }

    fn security_domain(&self) -> Option<SecurityDomain> {
        self.core.sec_domain.clone()
    }

    fn function_core(&self) -> Option<&Rc<FunctionCore>> {
        Some(&self.core)
    }

    fn function_name(&self) -> Option<Name> {
        self.core.name.clone()
    }

    fn default_value(&self, interp: &mut Interpreter, this: ObjRef, hint: Option<Hint>) -> JsResult<Value> {
        native::default_value(interp, this, hint)
    }
}

/// Install the call's arguments object as `f.arguments`, returning the
/// previous own property so it can be put back.
fn swap_arguments(interp: &mut Interpreter, common: ObjRef, arguments: ObjRef) -> Option<Property> {
    let name = interp.names().arguments.clone();
    let o = interp.object(common);
    let props = o.properties()?;
    let mut table = props.borrow_mut();
    let saved = table.remove(&name);
    table.put(
        &name,
        Value::Object(arguments),
        Attributes::DONTDELETE | Attributes::READONLY | Attributes::DONTENUM,
    );
    saved
}

fn restore_arguments(interp: &mut Interpreter, common: ObjRef, saved: Option<Property>) {
    let name = interp.names().arguments.clone();
    let o = interp.object(common);
    if let Some(props) = o.properties() {
        let mut table = props.borrow_mut();
        table.remove(&name);
        if let Some(saved) = saved {
            table.put(&saved.name, saved.value, saved.attributes);
        }
    }
}

impl Interpreter {
    /// Create a function core from a parameter list and body.
    ///
    /// The core records the security domain active now.
    pub fn make_function_core(
        &mut self,
        name: Option<&str>,
        params: &[&str],
        body: Rc<dyn FunctionBody>,
    ) -> Rc<FunctionCore> {
        let params = params.iter().map(|p| self.intern(p)).collect();
        let name = name.map(|n| self.intern(n));
        let is_empty = body.is_empty();
        Rc::new(FunctionCore {
            params,
            body,
            name,
            sec_domain: self.sec_domain.clone(),
            is_empty,
            common: Cell::new(None),
            cache: Cell::new(None),
        })
    }

    /// Create (or reuse) the function instance of `core` closing over `scope`.
    ///
    /// The first instantiation creates the shared property object with its
    /// `length` and `prototype` properties. Later instantiations return the
    /// cached instance when its scope is equivalent to `scope`.
    pub fn instantiate_function(&mut self, core: &Rc<FunctionCore>, scope: &Rc<Scope>) -> ObjRef {
        if let Some(cached) = core.cache.get() {
            let same_scope = self
                .heap
                .get(cached)
                .and_then(|o| {
                    o.as_any()
                        .downcast_ref::<FunctionInstance>()
                        .map(|fi| self.scope_eq(&fi.scope, scope))
                });
            match same_scope {
                Some(true) => {
                    log::trace!("joined function cache hit for {}", cached);
                    return cached;
                }
                Some(false) => {}
                None => core.cache.set(None),
            }
        }

        let function_prototype = self.intrinsics().function_prototype;
        let instance = Rc::new(FunctionInstance {
            core: Rc::clone(core),
            scope: Rc::clone(scope),
        });
        let f = self.alloc(instance, Some(function_prototype));

        if core.common.get().filter(|c| self.heap.contains(*c)).is_none() {
            let common = self.alloc(Rc::new(NativeObject::new("Object")), Some(function_prototype));
            core.common.set(Some(common));
            self.init_function_properties(core, f, true);
        }
        if core.cache.get().is_none() {
            core.cache.set(Some(f));
        }
        f
    }

    /// Install `length`, `prototype` and (under JavaScript compatibility)
    /// `arguments` on a core's common object.
    pub(crate) fn init_function_properties(&mut self, core: &FunctionCore, f: ObjRef, with_prototype: bool) {
        let Some(common) = core.common.get() else {
            return;
        };
        let names = self.names().clone();
        let proto_obj = if with_prototype {
            let proto_obj = self.new_object();
            self.define_own(proto_obj, &names.constructor, Value::Object(f), Attributes::DONTENUM);
            Some(proto_obj)
        } else {
            None
        };
        self.define_own(
            common,
            &names.length,
            Value::Number(core.params.len() as f64),
            Attributes::LENGTH,
        );
        if let Some(proto_obj) = proto_obj {
            self.define_own(common, &names.prototype, Value::Object(proto_obj), Attributes::DONTDELETE);
        }
        if self.compat().js_extensions() {
            self.define_own(
                common,
                &names.arguments,
                Value::Null,
                Attributes::DONTDELETE | Attributes::READONLY | Attributes::DONTENUM,
            );
        }
    }

    /// Create a function from `params` and `body`, closing over the global
    /// scope.
    pub fn new_function(&mut self, name: Option<&str>, params: &[&str], body: Rc<dyn FunctionBody>) -> ObjRef {
        let core = self.make_function_core(name, params, body);
        let scope = self.global_scope();
        self.instantiate_function(&core, &scope)
    }
}

/// `Function.prototype.toString`
pub(crate) fn proto_to_string(
    interp: &mut Interpreter,
    _callee: ObjRef,
    this: Option<ObjRef>,
    _args: &[Value],
) -> JsResult<Value> {
    let this = this.unwrap_or_else(|| interp.global());
    let o = interp.object(this);

    let Some(fi) = o.as_any().downcast_ref::<FunctionInstance>() else {
        if !o.has_call() {
            return Err(interp.throw_error(ErrorKind::TypeError, "not a function"));
        }
        let name = o
            .function_name()
            .map_or_else(|| o.class_name().to_string(), |n| n.to_string());
        if interp.compat().js_extensions() && o.has_construct() {
            return Ok(Value::from(format!("function () {{ /* constructor {} */ }}", name)));
        }
        return Ok(Value::from(format!("function {}() {{ [native code] }}", name)));
    };
    let core = &fi.core;
    let params: Vec<&str> = core.params.iter().map(Name::as_str).collect();
    let text = format!(
        "function {}({}) {{{}\n}}\n",
        core.name.as_ref().map_or("", Name::as_str),
        params.join(", "),
        core.body.source_text()
    );
    Ok(Value::from(text))
}

fn receiver(interp: &mut Interpreter, value: Option<&Value>) -> JsResult<ObjRef> {
    match value {
        None | Some(Value::Undefined) | Some(Value::Null) => Ok(interp.global()),
        Some(v) => interp.to_object(v),
    }
}

/// `Function.prototype.call`
pub(crate) fn proto_call(
    interp: &mut Interpreter,
    _callee: ObjRef,
    this: Option<ObjRef>,
    args: &[Value],
) -> JsResult<Value> {
    let target = match this {
        Some(t) if interp.is_callable(&Value::Object(t)) => t,
        _ => return Err(interp.throw_error(ErrorKind::TypeError, "call: receiver is not callable")),
    };
    let this_arg = receiver(interp, args.first())?;
    let rest = args.get(1..).unwrap_or(&[]);
    interp.call(target, Some(this_arg), rest)
}

/// `Function.prototype.apply`
pub(crate) fn proto_apply(
    interp: &mut Interpreter,
    _callee: ObjRef,
    this: Option<ObjRef>,
    args: &[Value],
) -> JsResult<Value> {
    let target = match this {
        Some(t) if interp.is_callable(&Value::Object(t)) => t,
        _ => return Err(interp.throw_error(ErrorKind::TypeError, "apply: receiver is not callable")),
    };
    let this_arg = receiver(interp, args.first())?;

    let call_args = match args.get(1) {
        None | Some(Value::Undefined) | Some(Value::Null) => Vec::new(),
        Some(Value::Object(list))
            if interp.is_kind::<Arguments>(*list) || interp.class_name(*list) == "Array" =>
        {
            let list = *list;
            let length_name = interp.names().length.clone();
            let length = interp.get(list, &length_name)?;
            let length = interp.to_uint32(&length)?;
            let mut call_args = Vec::with_capacity(length as usize);
            for i in 0..length {
                let index = interp.intern(&i.to_string());
                call_args.push(interp.get(list, &index)?);
            }
            call_args
        }
        Some(_) => {
            return Err(interp.throw_error(
                ErrorKind::TypeError,
                "apply: second argument is not an array or arguments object",
            ))
        }
    };
    interp.call(target, Some(this_arg), &call_args)
}
