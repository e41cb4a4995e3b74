//! Interpreter configuration.
//!
//! Compatibility settings select between strict ECMA-262 behaviour and the
//! extensions historically shipped by browser JavaScript engines. The
//! remaining settings cover the recursion budget and locale.

use serde::{Deserialize, Serialize};

bitflags::bitflags! {
    /// Independent compatibility switches.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct CompatFlags: u32 {
        /// Follow the ECMA-262 edition 3 errata
        const ECMA_262_3B = 1 << 1;
        /// Accept ill-formed UTF-16 when converting strings
        const UTF_UNSAFE = 1 << 2;
        /// Treat `<!--` as a line comment
        const SGML_COMMENTS = 1 << 3;
    }
}

/// JavaScript extension level.
///
/// Levels are ordered; every feature enabled at one level stays enabled at
/// the levels above it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum JsCompat {
    /// Strict ECMAScript, no extensions
    #[default]
    None,
    /// JavaScript 1.1
    Js11,
    /// JavaScript 1.2
    Js12,
    /// JavaScript 1.3
    Js13,
    /// JavaScript 1.4
    Js14,
    /// JavaScript 1.5
    Js15,
}

/// Complete compatibility setting of an interpreter.
///
/// # Examples
///
/// ```
/// use interpreter::{Compatibility, JsCompat};
///
/// let strict = Compatibility::default();
/// assert!(!strict.js_extensions());
///
/// let js = Compatibility::default().with_js(JsCompat::Js12);
/// assert!(js.js_at_least(JsCompat::Js11));
/// assert!(js.js_at_most(JsCompat::Js12));
/// assert!(!js.js_at_least(JsCompat::Js13));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Compatibility {
    /// Independent switches
    pub flags: CompatFlags,
    /// JavaScript extension level
    pub js: JsCompat,
}

impl Compatibility {
    /// Same flags at a different JavaScript level.
    pub fn with_js(mut self, js: JsCompat) -> Self {
        self.js = js;
        self
    }

    /// True when any JavaScript extension level is active.
    pub fn js_extensions(&self) -> bool {
        self.js != JsCompat::None
    }

    /// True when extensions are on and the level is at least `level`.
    pub fn js_at_least(&self, level: JsCompat) -> bool {
        self.js_extensions() && self.js >= level
    }

    /// True when extensions are on and the level is at most `level`.
    pub fn js_at_most(&self, level: JsCompat) -> bool {
        self.js_extensions() && self.js <= level
    }
}

impl Default for Compatibility {
    fn default() -> Self {
        Self {
            flags: CompatFlags::ECMA_262_3B,
            js: JsCompat::None,
        }
    }
}

/// Settings applied when an interpreter is (re)initialised.
///
/// Unset fields fall back to the defaults reported by the system hooks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Compatibility setting
    pub compat: Option<Compatibility>,
    /// Maximum call depth; `None` takes the host default
    pub recursion_limit: Option<u32>,
    /// Disable the recursion limit even if the host sets one
    pub unlimited_recursion: bool,
    /// Locale name handed to locale-sensitive built-ins
    pub locale: Option<String>,
}
