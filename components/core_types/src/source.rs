//! Source locations and traceback frames.
//!
//! Locations are recorded by the evaluator as it runs and are used to prefix
//! runtime error messages and to render tracebacks.

use std::fmt;
use std::rc::Rc;

/// A position in program text, as precise as the evaluator tracks it.
///
/// # Examples
///
/// ```
/// use core_types::SourceLocation;
///
/// let loc = SourceLocation::new(Some("main.js"), 12);
/// assert_eq!(loc.prefix(), "main.js:12: ");
/// assert_eq!(SourceLocation::new(None, 3).prefix(), "<unknown>:3: ");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    /// File or program name, if known
    pub filename: Option<Rc<str>>,
    /// 1-based line number
    pub line: u32,
}

impl SourceLocation {
    /// Create a location.
    pub fn new(filename: Option<&str>, line: u32) -> Self {
        Self {
            filename: filename.map(Rc::from),
            line,
        }
    }

    /// Message prefix of the form `file:line: `.
    pub fn prefix(&self) -> String {
        format!("{}: ", self)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = self.filename.as_deref().unwrap_or("<unknown>");
        write!(f, "{}:{}", file, self.line)
    }
}

/// How a traceback frame was entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallType {
    /// Ordinary function call
    Call,
    /// `new` expression
    Construct,
}

/// One rendered entry of a call traceback.
///
/// `function_name` is the callee's declared name. A construct through an
/// anonymous constructor falls back to the constructor's class name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackFrame {
    /// Call or construct
    pub call_type: CallType,
    /// Function or class name, if any
    pub function_name: Option<String>,
    /// Call-site location
    pub location: Option<SourceLocation>,
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(loc) = &self.location {
            write!(f, "{}: ", loc)?;
        }
        match (self.call_type, &self.function_name) {
            (CallType::Construct, Some(name)) => write!(f, "new {}", name),
            (CallType::Construct, None) => write!(f, "new ?"),
            (CallType::Call, Some(name)) => write!(f, "call {}()", name),
            (CallType::Call, None) => write!(f, "call <anonymous function>"),
        }
    }
}
