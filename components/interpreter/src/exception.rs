//! Exception engine.
//!
//! A throw is a `Err(Thrown)` propagated with `?`. The thrown value itself is
//! parked in the innermost [`TryContext`] on the interpreter's handler stack,
//! and [`Interpreter::try_catch`] is the only place that takes it back out.
//! A throw with no handler installed, or a failure while building an error
//! object, goes to the host's abort hook.

use std::mem;

use core_types::{CallType, ErrorKind, ObjRef, SourceLocation, StackFrame, Value};
use thiserror::Error;

use crate::system::SecurityDomain;
use crate::traceback::TracebackEntry;
use crate::Interpreter;

/// Marker carried by `Err` while a throw unwinds.
///
/// It has no payload: the value is in the handler stack. Only the
/// interpreter can create one, so holding a `Thrown` proves the value was
/// recorded.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("script exception in flight")]
pub struct Thrown {
    _private: (),
}

/// Result of any operation that may throw.
pub type JsResult<T> = Result<T, Thrown>;

/// One handler frame.
#[derive(Debug, Default)]
pub(crate) struct TryContext {
    pub(crate) thrown: Option<Value>,
    pub(crate) location: Option<SourceLocation>,
    pub(crate) stack: Vec<StackFrame>,
}

/// A value caught by [`Interpreter::try_catch`].
#[derive(Debug, Clone, PartialEq)]
pub struct Caught {
    /// The thrown value
    pub value: Value,
    /// Location current when it was thrown
    pub location: Option<SourceLocation>,
    /// Calls active when it was thrown, outermost first
    pub stack: Vec<StackFrame>,
}

/// State saved by [`Interpreter::enter_call`] and restored by
/// [`Interpreter::leave_call`].
#[must_use]
#[derive(Debug)]
pub(crate) struct CallGuard {
    recursion_limit: Option<u32>,
    sec_domain: Option<SecurityDomain>,
    traceback_len: usize,
}

impl Interpreter {
    /// Run `body` under a fresh handler.
    ///
    /// # Arguments
    ///
    /// * `body` - Guarded code; it throws by returning `Err(Thrown)`
    ///
    /// # Returns
    ///
    /// The body's value, or the value it threw.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::Value;
    /// use interpreter::Interpreter;
    ///
    /// let mut interp = Interpreter::new();
    /// let caught = interp
    ///     .try_catch(|interp| -> interpreter::JsResult<()> {
    ///         Err(interp.throw_value(Value::Number(7.0)))
    ///     })
    ///     .unwrap_err();
    /// assert_eq!(caught.value, Value::Number(7.0));
    /// ```
    pub fn try_catch<T, F>(&mut self, body: F) -> Result<T, Caught>
    where
        F: FnOnce(&mut Interpreter) -> crate::JsResult<T>,
    {
        let depth = self.try_stack.len();
        self.try_stack.push(TryContext::default());
        let result = body(self);
        if self.try_stack.len() != depth + 1 {
            self.fatal("try-context stack corrupted");
        }
        let context = match self.try_stack.pop() {
            Some(context) => context,
            None => self.fatal("try-context stack corrupted"),
        };
        match result {
            Ok(value) => Ok(value),
            Err(Thrown { .. }) => match context.thrown {
                Some(value) => Err(Caught {
                    value,
                    location: context.location,
                    stack: context.stack,
                }),
                None => self.fatal("exception propagated without a thrown value"),
            },
        }
    }

    /// Number of handlers currently installed.
    pub fn try_depth(&self) -> usize {
        self.try_stack.len()
    }

    /// Throw `value` to the innermost handler.
    ///
    /// With no handler installed this is fatal.
    pub fn throw_value(&mut self, value: Value) -> Thrown {
        let location = self.location.clone();
        let stack = self.traceback();
        self.record_throw(value, location, stack)
    }

    /// Throw a caught value again, keeping its original location.
    pub fn rethrow(&mut self, caught: Caught) -> Thrown {
        self.record_throw(caught.value, caught.location, caught.stack)
    }

    fn record_throw(&mut self, value: Value, location: Option<SourceLocation>, stack: Vec<StackFrame>) -> Thrown {
        if self.try_stack.is_empty() {
            let description = self.describe(&value);
            self.fatal(&format!("uncaught exception: {}", description));
        }
        log::trace!("throw {:?}", value);
        if let Some(context) = self.try_stack.last_mut() {
            context.thrown = Some(value);
            context.location = location;
            context.stack = stack;
        }
        Thrown { _private: () }
    }

    /// Construct and throw a native error of `kind`.
    pub fn throw_error(&mut self, kind: ErrorKind, message: &str) -> Thrown {
        let ctor = self.intrinsics().error_constructor(kind);
        self.throw_error_from(ctor, message)
    }

    /// Construct an error with `ctor` and throw it.
    ///
    /// The message is prefixed with the current location. The constructor
    /// runs with the handler stack detached, so a throw while building the
    /// error is fatal rather than recursive.
    pub fn throw_error_from(&mut self, ctor: ObjRef, message: &str) -> Thrown {
        let message = match &self.location {
            Some(location) => format!("{}{}", location.prefix(), message),
            None => message.to_string(),
        };
        if self.try_stack.is_empty() {
            self.fatal(&format!("uncaught error: {}", message));
        }
        let saved = mem::take(&mut self.try_stack);
        let error = self.construct_unguarded(ctor, &[Value::from(message.as_str())]);
        self.try_stack = saved;
        match error {
            Ok(error) => self.throw_value(error),
            Err(_) => self.fatal(&format!("failed to construct error: {}", message)),
        }
    }

    /// Report an unrecoverable condition to the host and never return.
    ///
    /// The message and the rendered traceback are logged at error level
    /// before the abort hook runs.
    pub fn fatal(&self, message: &str) -> ! {
        log::error!("{}", message);
        let traceback = self.render_traceback();
        if !traceback.is_empty() {
            log::error!("{}", traceback);
        }
        self.hooks.abort(message)
    }

    /// Render a value for diagnostics without running script code.
    ///
    /// Objects show their class, plus `name: message` when those are found
    /// as plain string properties along the prototype chain.
    pub fn describe(&self, value: &Value) -> String {
        let Value::Object(obj) = value else {
            return value.to_string();
        };
        let Some(o) = self.heap.get(*obj) else {
            return format!("<dead object {}>", obj);
        };
        let name = self.raw_string_property(*obj, &self.names().name);
        let message = self.raw_string_property(*obj, &self.names().message);
        match (name, message) {
            (Some(name), Some(message)) if !message.is_empty() => format!("{}: {}", name, message),
            (Some(name), _) => name,
            _ => format!("[object {}]", o.class_name()),
        }
    }

    fn raw_string_property(&self, obj: ObjRef, name: &core_types::Name) -> Option<String> {
        let mut current = Some(obj);
        while let Some(r) = current {
            let o = self.heap.get(r)?;
            if let Some(props) = o.properties() {
                if let Some(value) = props.borrow().get(name) {
                    return value.as_str().map(str::to_string);
                }
            }
            current = self.heap.prototype(r);
        }
        None
    }

    /// Enter a guarded call or construct of `callee`.
    ///
    /// Spends one unit of the recursion budget (throwing if it is already
    /// spent), switches to the callee's security domain and records a
    /// traceback entry.
    pub(crate) fn enter_call(
        &mut self,
        callee: ObjRef,
        domain: Option<SecurityDomain>,
        call_type: CallType,
    ) -> crate::JsResult<CallGuard> {
        let guard = CallGuard {
            recursion_limit: self.recursion_limit,
            sec_domain: self.sec_domain.clone(),
            traceback_len: self.traceback.len(),
        };
        match self.recursion_limit {
            Some(0) => {
                log::debug!("recursion limit reached calling {}", callee);
                return Err(self.throw_error(ErrorKind::Error, "recursion limit reached"));
            }
            Some(n) => self.recursion_limit = Some(n - 1),
            None => {}
        }
        if self.sec_domain != domain {
            self.hooks
                .transit_security_domain(self.sec_domain.as_ref(), domain.as_ref());
            self.sec_domain = domain;
        }
        self.traceback.push(TracebackEntry {
            callee,
            call_type,
            location: self.location.clone(),
        });
        Ok(guard)
    }

    /// Undo [`Interpreter::enter_call`] on any exit path.
    pub(crate) fn leave_call(&mut self, guard: CallGuard) {
        self.recursion_limit = guard.recursion_limit;
        if self.sec_domain != guard.sec_domain {
            self.hooks
                .transit_security_domain(self.sec_domain.as_ref(), guard.sec_domain.as_ref());
            self.sec_domain = guard.sec_domain;
        }
        self.traceback.truncate(guard.traceback_len);
    }
}
