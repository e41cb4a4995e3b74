//! Error kinds and the host-facing error type.
//!
//! Script errors are ordinary objects inside the interpreter. This module
//! names their kinds and provides [`JsError`], the summary handed to a host
//! when a throw escapes every handler the host installed.

use std::fmt;

use thiserror::Error;

use crate::{SourceLocation, StackFrame};

/// The kind of a native error.
///
/// These correspond to the built-in error constructors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ErrorKind {
    /// Generic `Error`
    Error,
    /// Error in eval()
    EvalError,
    /// Value out of allowed range
    RangeError,
    /// Unresolvable reference
    ReferenceError,
    /// Syntax error in program text
    SyntaxError,
    /// Operation applied to a value of the wrong type
    TypeError,
    /// Malformed URI in a URI handling function
    URIError,
}

impl ErrorKind {
    /// Every kind, in constructor installation order.
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::Error,
        ErrorKind::EvalError,
        ErrorKind::RangeError,
        ErrorKind::ReferenceError,
        ErrorKind::SyntaxError,
        ErrorKind::TypeError,
        ErrorKind::URIError,
    ];

    /// Constructor name, also the `name` property of the prototype.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::Error => "Error",
            ErrorKind::EvalError => "EvalError",
            ErrorKind::RangeError => "RangeError",
            ErrorKind::ReferenceError => "ReferenceError",
            ErrorKind::SyntaxError => "SyntaxError",
            ErrorKind::TypeError => "TypeError",
            ErrorKind::URIError => "URIError",
        }
    }

    /// Parse a constructor name.
    pub fn from_name(name: &str) -> Option<ErrorKind> {
        Self::ALL.iter().copied().find(|k| k.name() == name)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A script exception that reached the host.
///
/// `kind` is set when the thrown value was one of the native error objects;
/// a script may throw any value, in which case it is `None` and `message`
/// holds the value's string rendering.
///
/// # Examples
///
/// ```
/// use core_types::{ErrorKind, JsError};
///
/// let error = JsError {
///     kind: Some(ErrorKind::TypeError),
///     message: "TypeError: not a function".to_string(),
///     location: None,
///     stack: vec![],
/// };
///
/// assert_eq!(error.to_string(), "TypeError: not a function");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct JsError {
    /// Native error kind, if the thrown value was a native error
    pub kind: Option<ErrorKind>,
    /// String rendering of the thrown value
    pub message: String,
    /// Where the throw happened, when the evaluator recorded it
    pub location: Option<SourceLocation>,
    /// Calls active at the throw, outermost first
    pub stack: Vec<StackFrame>,
}

impl JsError {
    /// True if this is a native error of `kind`.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == Some(kind)
    }
}
