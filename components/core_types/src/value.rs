//! Script value representation.
//!
//! This module provides the `Value` enum carried on the evaluation stack,
//! the `ObjRef` heap handle, transient `Reference`s produced by identifier
//! resolution and the internal `Completion` records used for control flow.

use std::fmt;
use std::rc::Rc;

use crate::convert::number_to_string;
use crate::name::Name;

/// Shared, immutable string payload of a script string value.
pub type JsString = Rc<str>;

/// Handle to an object living in an interpreter heap.
///
/// Handles are plain indices paired with a generation counter so that a
/// handle to a collected slot can never alias a newer object. Comparing two
/// handles compares object identity.
///
/// # Examples
///
/// ```
/// use core_types::ObjRef;
///
/// let a = ObjRef::new(3, 0);
/// let b = ObjRef::new(3, 1);
/// assert_ne!(a, b);
/// assert_eq!(a.index(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjRef {
    index: u32,
    generation: u32,
}

impl ObjRef {
    /// Create a handle from a slot index and generation.
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Slot index in the owning heap.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation of the slot when this handle was issued.
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// A resolved (or unresolvable) identifier reference.
///
/// `base` is `None` when scope lookup failed to find the name anywhere;
/// reading through such a reference is a reference error.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    /// Object holding the binding, if one was found
    pub base: Option<ObjRef>,
    /// Interned property name
    pub name: Name,
}

/// Kind of a completion record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompletionKind {
    /// Statement finished normally
    Normal,
    /// `break` out of a labelled statement
    Break,
    /// `continue` a loop
    Continue,
    /// `return` from a function body
    Return,
    /// A value was thrown
    Throw,
}

/// Control-flow signal produced by executing statements and function bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// What kind of transfer this is
    pub kind: CompletionKind,
    /// Carried value, if any
    pub value: Option<Value>,
    /// Break/continue target tag
    pub target: Option<u32>,
}

impl Completion {
    /// A normal completion without a value.
    pub fn normal() -> Self {
        Self {
            kind: CompletionKind::Normal,
            value: None,
            target: None,
        }
    }

    /// A return completion carrying `value`.
    pub fn returning(value: Value) -> Self {
        Self {
            kind: CompletionKind::Return,
            value: Some(value),
            target: None,
        }
    }

    /// A break or continue completion aimed at `target`.
    pub fn jump(kind: CompletionKind, target: Option<u32>) -> Self {
        Self {
            kind,
            value: None,
            target,
        }
    }
}

/// Represents any script value.
///
/// Primitive values are stored inline; objects are referred to through
/// [`ObjRef`] handles into the interpreter heap. `Reference` and
/// `Completion` are internal kinds that scripted code never observes.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let number = Value::Number(42.0);
/// assert!(number.is_truthy());
/// assert_eq!(number.type_of(), "number");
/// assert!(!Value::from("").is_truthy());
/// ```
#[derive(Clone, Default)]
pub enum Value {
    /// The undefined value
    #[default]
    Undefined,
    /// The null value
    Null,
    /// A boolean
    Boolean(bool),
    /// An IEEE 754 double
    Number(f64),
    /// An immutable string
    String(JsString),
    /// An object handle
    Object(ObjRef),
    /// Transient identifier reference
    Reference(Reference),
    /// Internal control-flow record
    Completion(Box<Completion>),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "Undefined"),
            Value::Null => write!(f, "Null"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(&&**s).finish(),
            Value::Object(r) => f.debug_tuple("Object").field(r).finish(),
            Value::Reference(r) => f
                .debug_struct("Reference")
                .field("base", &r.base)
                .field("name", &r.name.as_str())
                .finish(),
            Value::Completion(c) => f.debug_tuple("Completion").field(c).finish(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) => true,
            (Value::Null, Value::Null) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Reference(a), Value::Reference(b)) => a == b,
            (Value::Completion(a), Value::Completion(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<ObjRef> for Value {
    fn from(r: ObjRef) -> Self {
        Value::Object(r)
    }
}

impl From<&Name> for Value {
    fn from(name: &Name) -> Self {
        Value::String(name.to_js_string())
    }
}

impl Value {
    /// Returns whether this value is truthy when it is a primitive.
    ///
    /// Objects are always truthy. References and completions are never
    /// converted and report `false`.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::{ObjRef, Value};
    ///
    /// assert!(!Value::Undefined.is_truthy());
    /// assert!(!Value::Number(f64::NAN).is_truthy());
    /// assert!(!Value::Number(-0.0).is_truthy());
    /// assert!(Value::Object(ObjRef::new(0, 0)).is_truthy());
    /// ```
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Boolean(b) => *b,
            Value::Number(n) => !n.is_nan() && *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Object(_) => true,
            Value::Reference(_) | Value::Completion(_) => false,
        }
    }

    /// Returns the `typeof` category of this value.
    ///
    /// Callable objects report `"function"`, which only the interpreter can
    /// decide; this method reports `"object"` for every object handle.
    pub fn type_of(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "object",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Object(_) => "object",
            Value::Reference(_) => "reference",
            Value::Completion(_) => "completion",
        }
    }

    /// True for undefined, null, booleans, numbers and strings.
    pub fn is_primitive(&self) -> bool {
        matches!(
            self,
            Value::Undefined
                | Value::Null
                | Value::Boolean(_)
                | Value::Number(_)
                | Value::String(_)
        )
    }

    /// True for undefined or null.
    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// The object handle, if this value is an object.
    pub fn as_object(&self) -> Option<ObjRef> {
        match self {
            Value::Object(r) => Some(*r),
            _ => None,
        }
    }

    /// The number, if this value is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string payload, if this value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// Renders primitives the way ToString does. Objects render as their handle.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&number_to_string(*n)),
            Value::String(s) => f.write_str(s),
            Value::Object(r) => write!(f, "[object {}]", r),
            Value::Reference(r) => write!(f, "<reference {}>", r.name),
            Value::Completion(c) => write!(f, "<completion {:?}>", c.kind),
        }
    }
}
