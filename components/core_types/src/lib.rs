//! Core value types shared by the execution core.
//!
//! This crate provides the foundational types of the runtime: value
//! representation, interned names, error kinds, source locations and the
//! numeric conversions that do not require an interpreter.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of script values
//! - [`ObjRef`] - Handle to a heap object
//! - [`Name`] / [`Interner`] - Identity-compared property names
//! - [`Completion`] - Internal control-flow records
//! - [`JsError`] - Exception summary handed to embedding hosts
//! - [`SourceLocation`] / [`StackFrame`] - Location and traceback data
//!
//! # Examples
//!
//! ```
//! use core_types::{to_int32, Interner, Value};
//!
//! let mut names = Interner::new();
//! let length = names.intern("length");
//! assert_eq!(Value::from(&length), Value::from("length"));
//!
//! assert_eq!(to_int32(4294967301.0), 5);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod convert;
mod error;
mod name;
mod source;
mod value;

pub use convert::{
    number_to_string, string_to_number, to_int32, to_integer, to_uint16, to_uint32,
};
pub use error::{ErrorKind, JsError};
pub use name::{Interner, Name};
pub use source::{CallType, SourceLocation, StackFrame};
pub use value::{Completion, CompletionKind, JsString, ObjRef, Reference, Value};
