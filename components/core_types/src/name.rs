//! Interned property names.
//!
//! Every property key is canonicalised once per interpreter so that name
//! comparison and hashing use pointer identity instead of content.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use crate::value::JsString;

/// An interned string.
///
/// Two names are equal only when they come from the same [`Interner`] entry.
/// Names from different interners never compare equal, even when their
/// contents match.
#[derive(Clone)]
pub struct Name(Rc<str>);

impl Name {
    /// Text of the name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The name as a script string payload (shares the buffer).
    pub fn to_js_string(&self) -> JsString {
        Rc::clone(&self.0)
    }

    /// Address of the canonical buffer, used as the hash key.
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.0) as *const u8 as usize
    }

    /// If the name is a canonical array index (`0`, `17`, not `017`), its value.
    pub fn array_index(&self) -> Option<u32> {
        let s = self.as_str();
        if s.is_empty() || (s.len() > 1 && s.starts_with('0')) {
            return None;
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse::<u32>().ok().filter(|&n| n != u32::MAX)
    }
}

impl PartialEq for Name {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Name {}

impl Hash for Name {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", &*self.0)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical string table.
///
/// # Examples
///
/// ```
/// use core_types::Interner;
///
/// let mut interner = Interner::new();
/// let a = interner.intern("length");
/// let b = interner.intern(&String::from("length"));
/// assert_eq!(a, b);
/// assert_eq!(interner.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Interner {
    strings: HashSet<Rc<str>>,
}

impl Interner {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the canonical name for `s`, adding it on first use.
    pub fn intern(&mut self, s: &str) -> Name {
        if let Some(existing) = self.strings.get(s) {
            return Name(Rc::clone(existing));
        }
        let rc: Rc<str> = Rc::from(s);
        self.strings.insert(Rc::clone(&rc));
        Name(rc)
    }

    /// Look up `s` without inserting it.
    pub fn get(&self, s: &str) -> Option<Name> {
        self.strings.get(s).map(|rc| Name(Rc::clone(rc)))
    }

    /// Number of distinct names.
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// True if nothing has been interned.
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
