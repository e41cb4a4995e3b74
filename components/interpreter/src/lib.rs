//! Execution core of an embeddable ECMAScript runtime
//!
//! This crate provides the machinery every language construct is expressed
//! in terms of:
//! - Objects as property tables behind a capability trait ([`ObjectClass`])
//! - Function cores, joined closures, activations and `arguments` objects
//! - Scope chains and identifier resolution
//! - A handler-stack exception engine with a host abort hook
//! - The type conversion protocol (ToPrimitive, ToNumber, ...)
//! - Native functions and a format-driven argument decoder
//! - Host extension modules and system hooks
//!
//! Parsing is not part of this crate: function bodies are supplied through
//! the [`FunctionBody`] trait.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use core_types::{Completion, Value};
//! use interpreter::{HostBody, Interpreter};
//!
//! let mut interp = Interpreter::new();
//!
//! // function add(a, b) { return a + b; } over numbers
//! let body = HostBody::new(|interp, ctx| {
//!     let a = ctx.lookup(interp, "a")?;
//!     let b = ctx.lookup(interp, "b")?;
//!     let sum = interp.to_number(&a)? + interp.to_number(&b)?;
//!     Ok(Completion::returning(Value::Number(sum)))
//! });
//! let add = interp.new_function(Some("add"), &["a", "b"], Rc::new(body));
//!
//! let result = interp
//!     .call_function(add, None, &[Value::Number(2.0), Value::from("40")])
//!     .unwrap();
//! assert_eq!(result, Value::Number(42.0));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod activation;
pub mod args;
pub mod cfunction;
pub mod coerce;
pub mod config;
pub mod context;
pub mod enumerate;
pub mod exception;
pub mod function;
pub mod interpreter;
pub mod intrinsics;
pub mod module;
pub mod native;
pub mod object;
pub mod property;
pub mod scope;
pub mod system;
pub mod traceback;

// Re-export main types at crate root
pub use activation::{Activation, Arguments};
pub use args::Arg;
pub use cfunction::{NativeConstructFn, NativeFn, NativeFunction};
pub use config::{CompatFlags, Compatibility, InterpreterConfig, JsCompat};
pub use context::ExecutionContext;
pub use exception::{Caught, JsResult, Thrown};
pub use function::{EmptyBody, FunctionBody, FunctionCore, FunctionInstance, HostBody};
pub use interpreter::{Interpreter, WellKnownNames};
pub use intrinsics::{Intrinsics, PrimitiveWrapper};
pub use module::{module_index, register_module, registered_modules, Module, ModuleError, MAX_MODULES};
pub use native::NativeObject;
pub use object::{Hint, ObjectClass};
pub use property::{Attributes, EnumEntry, Enumerator, Property, PropertyTable, HASH_BUCKETS};
pub use scope::Scope;
pub use system::{DefaultSystem, SecurityDomain, SystemHooks};
pub use traceback::TracebackEntry;
