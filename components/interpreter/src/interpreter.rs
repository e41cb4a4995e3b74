//! The interpreter instance.
//!
//! An [`Interpreter`] owns everything one script environment needs: its
//! heap, interned names, built-in objects, handler stack, traceback,
//! recursion budget, compatibility setting and active security domain.
//! Nothing is shared between instances, and an instance must only be used
//! from one thread at a time.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use core_types::{Interner, JsError, Name, ObjRef, SourceLocation, Value};
use memory_manager::{CollectStats, Heap, HeapStats};

use crate::config::{Compatibility, InterpreterConfig};
use crate::exception::{Caught, TryContext};
use crate::intrinsics::{self, Intrinsics};
use crate::module::Module;
use crate::object::ObjectClass;
use crate::property::Attributes;
use crate::scope::Scope;
use crate::system::{DefaultSystem, SecurityDomain, SystemHooks};
use crate::traceback::TracebackEntry;

/// Names the runtime looks up often, interned once per interpreter.
#[derive(Debug, Clone)]
pub struct WellKnownNames {
    /// `length`
    pub length: Name,
    /// `prototype`
    pub prototype: Name,
    /// `constructor`
    pub constructor: Name,
    /// `arguments`
    pub arguments: Name,
    /// `callee`
    pub callee: Name,
    /// `toString`
    pub to_string: Name,
    /// `valueOf`
    pub value_of: Name,
    /// `__proto__`
    pub proto: Name,
    /// `name`
    pub name: Name,
    /// `message`
    pub message: Name,
}

impl WellKnownNames {
    fn new(interner: &mut Interner) -> Self {
        Self {
            length: interner.intern("length"),
            prototype: interner.intern("prototype"),
            constructor: interner.intern("constructor"),
            arguments: interner.intern("arguments"),
            callee: interner.intern("callee"),
            to_string: interner.intern("toString"),
            value_of: interner.intern("valueOf"),
            proto: interner.intern("__proto__"),
            name: interner.intern("name"),
            message: interner.intern("message"),
        }
    }
}

/// One script environment.
///
/// # Examples
///
/// ```
/// use core_types::Value;
/// use interpreter::{Attributes, Interpreter};
///
/// let mut interp = Interpreter::new();
/// let global = interp.global();
/// interp.put_str(global, "x", Value::Number(1.0), Attributes::empty()).unwrap();
/// assert_eq!(interp.get_str(global, "x").unwrap(), Value::Number(1.0));
/// ```
pub struct Interpreter {
    pub(crate) heap: Heap<dyn ObjectClass>,
    interner: Interner,
    names: WellKnownNames,
    intrinsics: Intrinsics,
    global_scope: Rc<Scope>,
    pub(crate) try_stack: Vec<TryContext>,
    pub(crate) location: Option<SourceLocation>,
    pub(crate) traceback: Vec<TracebackEntry>,
    frame_roots: Vec<ObjRef>,
    pub(crate) recursion_limit: Option<u32>,
    pub(crate) sec_domain: Option<SecurityDomain>,
    compat: Compatibility,
    random_seed: u32,
    locale: Option<String>,
    config: InterpreterConfig,
    pub(crate) modules: Vec<&'static dyn Module>,
    pub(crate) module_private: Vec<Option<Box<dyn Any>>>,
    roots: HashMap<ObjRef, usize>,
    pub(crate) hooks: Rc<dyn SystemHooks>,
}

impl Interpreter {
    /// An interpreter using [`DefaultSystem`] hooks.
    pub fn new() -> Self {
        Self::with_hooks(Rc::new(DefaultSystem))
    }

    /// An interpreter using the host's hooks and their default settings.
    pub fn with_hooks(hooks: Rc<dyn SystemHooks>) -> Self {
        Self::with_config(hooks, InterpreterConfig::default())
    }

    /// An interpreter using the host's hooks, with `config` overriding their
    /// defaults.
    ///
    /// Built-in objects are created first, then every registered module is
    /// allocated and initialised. Failure at any step is fatal.
    pub fn with_config(hooks: Rc<dyn SystemHooks>, config: InterpreterConfig) -> Self {
        let mut heap: Heap<dyn ObjectClass> = Heap::with_hooks(hooks.memory_hooks());
        let mut interner = Interner::new();
        let names = WellKnownNames::new(&mut interner);
        let intrinsics = match Intrinsics::allocate(&mut heap, &mut interner) {
            Ok(intrinsics) => intrinsics,
            Err(e) => hooks.abort(&format!("cannot allocate built-in objects: {}", e)),
        };

        let compat = config.compat.unwrap_or_else(|| hooks.default_compat());
        let recursion_limit = if config.unlimited_recursion {
            None
        } else {
            config.recursion_limit.or_else(|| hooks.default_recursion_limit())
        };
        let locale = config.locale.clone().or_else(|| hooks.default_locale());

        let mut interp = Interpreter {
            heap,
            interner,
            names,
            global_scope: Scope::new(intrinsics.global, None),
            intrinsics,
            try_stack: Vec::new(),
            location: None,
            traceback: Vec::new(),
            frame_roots: Vec::new(),
            recursion_limit,
            sec_domain: None,
            compat,
            random_seed: hooks.random_seed(),
            locale,
            config,
            modules: Vec::new(),
            module_private: Vec::new(),
            roots: HashMap::new(),
            hooks,
        };
        intrinsics::init(&mut interp);
        interp.init_modules();
        log::debug!(
            "interpreter initialised: compat={:?} recursion_limit={:?} objects={}",
            interp.compat,
            interp.recursion_limit,
            interp.heap.len()
        );
        interp
    }

    /// Discard all state and initialise afresh with the same hooks and
    /// configuration.
    pub fn reinitialize(&mut self) {
        log::debug!("reinitialising interpreter");
        *self = Interpreter::with_config(Rc::clone(&self.hooks), self.config.clone());
    }

    /// Configuration the interpreter was created with.
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }

    /// The host hooks.
    pub fn hooks(&self) -> &Rc<dyn SystemHooks> {
        &self.hooks
    }

    /// Canonical name for `s`.
    pub fn intern(&mut self, s: &str) -> Name {
        self.interner.intern(s)
    }

    /// Pre-interned names.
    pub fn names(&self) -> &WellKnownNames {
        &self.names
    }

    /// Built-in object handles.
    pub fn intrinsics(&self) -> &Intrinsics {
        &self.intrinsics
    }

    /// The global object.
    pub fn global(&self) -> ObjRef {
        self.intrinsics.global
    }

    /// Scope chain holding only the global object.
    pub fn global_scope(&self) -> Rc<Scope> {
        Rc::clone(&self.global_scope)
    }

    /// Active compatibility setting.
    pub fn compat(&self) -> Compatibility {
        self.compat
    }

    /// Remaining call budget; `None` is unlimited.
    pub fn recursion_limit(&self) -> Option<u32> {
        self.recursion_limit
    }

    /// Replace the remaining call budget.
    pub fn set_recursion_limit(&mut self, limit: Option<u32>) {
        self.recursion_limit = limit;
    }

    /// Security domain of the code currently running.
    pub fn security_domain(&self) -> Option<&SecurityDomain> {
        self.sec_domain.as_ref()
    }

    /// Set the domain for code the host is about to run.
    pub fn set_security_domain(&mut self, domain: Option<SecurityDomain>) {
        self.sec_domain = domain;
    }

    /// Seed for random number generation.
    pub fn random_seed(&self) -> u32 {
        self.random_seed
    }

    /// Locale name, if one was configured.
    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    /// Location the evaluator is currently at.
    pub fn location(&self) -> Option<&SourceLocation> {
        self.location.as_ref()
    }

    /// Record the evaluator's position, used for error prefixes and
    /// tracebacks.
    pub fn set_location(&mut self, location: Option<SourceLocation>) {
        self.location = location;
    }

    fn own_table_holder(&self, obj: ObjRef) -> ObjRef {
        let o = self.object(obj);
        let common = o.function_core().and_then(|core| core.common());
        common.unwrap_or(obj)
    }

    /// Store an own property directly, bypassing every check.
    ///
    /// For installing built-ins. Function instances store into their
    /// shared property object. An object without a property table is
    /// fatal.
    pub fn define_own(&mut self, obj: ObjRef, name: &Name, value: Value, attributes: Attributes) {
        let target = self.own_table_holder(obj);
        let o = self.object(target);
        let Some(props) = o.properties() else {
            self.fatal(&format!("{} has no property table", target));
        };
        props.borrow_mut().put(name, value, attributes);
    }

    /// Attributes of an own property, if present.
    pub fn own_attributes(&self, obj: ObjRef, name: &Name) -> Option<Attributes> {
        let target = self.own_table_holder(obj);
        let o = self.object(target);
        let attributes = o.properties().and_then(|props| props.borrow().attributes(name));
        attributes
    }

    /// Keep `obj` alive across collections until a matching
    /// [`Interpreter::remove_root`].
    pub fn add_root(&mut self, obj: ObjRef) {
        *self.roots.entry(obj).or_insert(0) += 1;
    }

    /// Undo one [`Interpreter::add_root`].
    pub fn remove_root(&mut self, obj: ObjRef) {
        if let Some(count) = self.roots.get_mut(&obj) {
            *count -= 1;
            if *count == 0 {
                self.roots.remove(&obj);
            }
        }
    }

    /// Keep `objs` alive until [`Interpreter::unpin_frame`] is called with
    /// the returned mark.
    pub(crate) fn pin_frame<I>(&mut self, objs: I) -> usize
    where
        I: IntoIterator<Item = ObjRef>,
    {
        let mark = self.frame_roots.len();
        self.frame_roots.extend(objs);
        mark
    }

    /// Drop every frame root pinned since `mark`.
    pub(crate) fn unpin_frame(&mut self, mark: usize) {
        self.frame_roots.truncate(mark);
    }

    /// Collect every object not reachable from the interpreter's roots or
    /// from `extra`.
    ///
    /// Objects of active calls are roots: the receiver and arguments of
    /// every guarded call, plus the activation and arguments object of
    /// every running function body. Other handles held only by native code
    /// (local variables, closure captures, scopes a body pushes itself)
    /// are not; pass them in `extra`.
    pub fn collect_garbage<I>(&mut self, extra: I) -> CollectStats
    where
        I: IntoIterator<Item = ObjRef>,
    {
        let mut roots: Vec<ObjRef> = self.intrinsics.roots().collect();
        roots.extend(self.global_scope.objects());
        roots.extend(self.roots.keys().copied());
        roots.extend(
            self.try_stack
                .iter()
                .filter_map(|context| context.thrown.as_ref().and_then(Value::as_object)),
        );
        roots.extend(self.traceback.iter().map(|entry| entry.callee));
        roots.extend(self.frame_roots.iter().copied());
        roots.extend(extra);
        self.heap.collect(roots)
    }

    /// Collect if the memory hooks say one is due.
    pub fn maybe_collect(&mut self) -> Option<CollectStats> {
        if self.heap.should_collect() {
            Some(self.collect_garbage(std::iter::empty()))
        } else {
            None
        }
    }

    /// Heap occupancy.
    pub fn heap_stats(&self) -> HeapStats {
        self.heap.stats()
    }

    /// True if `obj` is still allocated.
    pub fn is_live(&self, obj: ObjRef) -> bool {
        self.heap.contains(obj)
    }

    /// Call `func` from the host.
    ///
    /// The call runs under its own handler; a throw that escapes it is
    /// returned as a [`JsError`].
    pub fn call_function(&mut self, func: ObjRef, this: Option<ObjRef>, args: &[Value]) -> Result<Value, JsError> {
        let result = self.try_catch(|interp| interp.call(func, this, args));
        result.map_err(|caught| self.to_js_error(caught))
    }

    /// Construct with `func` from the host.
    pub fn construct_object(&mut self, func: ObjRef, args: &[Value]) -> Result<Value, JsError> {
        let result = self.try_catch(|interp| interp.construct(func, args));
        result.map_err(|caught| self.to_js_error(caught))
    }

    /// Summarise a caught value for the host.
    ///
    /// The kind is that of the nearest native error prototype on the
    /// value's chain. The message is the value's string conversion, or a
    /// diagnostic rendering if that conversion throws.
    pub fn to_js_error(&mut self, caught: Caught) -> JsError {
        let kind = match &caught.value {
            Value::Object(obj) => {
                let mut kind = None;
                let mut current = self.prototype_of(*obj);
                while let Some(proto) = current {
                    kind = self.intrinsics.error_kind_of_prototype(proto);
                    if kind.is_some() {
                        break;
                    }
                    current = self.prototype_of(proto);
                }
                kind
            }
            _ => None,
        };
        let message = match self.try_catch(|interp| interp.to_string(&caught.value)) {
            Ok(s) => s.to_string(),
            Err(_) => self.describe(&caught.value),
        };
        JsError {
            kind,
            message,
            location: caught.location,
            stack: caught.stack,
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interpreter")
            .field("heap", &self.heap)
            .field("compat", &self.compat)
            .field("recursion_limit", &self.recursion_limit)
            .field("try_depth", &self.try_stack.len())
            .field("call_depth", &self.traceback.len())
            .field("sec_domain", &self.sec_domain)
            .finish()
    }
}
