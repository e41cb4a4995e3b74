//! Host extension modules.
//!
//! A module adds objects to every interpreter created after it is
//! registered. Registration is process-wide; each interpreter takes a
//! snapshot of the registry when it is initialised and runs every module's
//! [`Module::alloc`] and then every module's [`Module::init`], in
//! registration order.
//!
//! # Examples
//!
//! ```
//! use core_types::Value;
//! use interpreter::{register_module, Attributes, Interpreter, JsResult, Module};
//!
//! struct Answer;
//!
//! impl Module for Answer {
//!     fn name(&self) -> &str {
//!         "answer"
//!     }
//!
//!     fn init(&self, interp: &mut Interpreter) -> JsResult<()> {
//!         let global = interp.global();
//!         interp.put_str(global, "answer", Value::Number(42.0), Attributes::DONTENUM)
//!     }
//! }
//!
//! static ANSWER: Answer = Answer;
//!
//! register_module(&ANSWER).unwrap();
//! let mut interp = Interpreter::new();
//! let global = interp.global();
//! assert_eq!(interp.get_str(global, "answer").unwrap(), Value::Number(42.0));
//! ```

use std::any::Any;

use parking_lot::Mutex;
use thiserror::Error;

use crate::exception::JsResult;
use crate::Interpreter;

/// Most modules the registry holds.
pub const MAX_MODULES: usize = 256;

/// An extension registered by the host.
pub trait Module: Sync {
    /// Module name, for diagnostics.
    fn name(&self) -> &str;

    /// Module version, for diagnostics.
    fn version(&self) -> u32 {
        0
    }

    /// One-time setup run at registration. An error unregisters the module.
    fn mod_init(&self) -> Result<(), String> {
        Ok(())
    }

    /// Create the module's objects in a new interpreter.
    ///
    /// Runs before any module's [`Module::init`], with no handler
    /// installed.
    fn alloc(&self, _interp: &mut Interpreter) {}

    /// Populate the module's objects. A throw here is fatal.
    fn init(&self, interp: &mut Interpreter) -> JsResult<()>;
}

/// Registration failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleError {
    /// The registry already holds [`MAX_MODULES`] modules
    #[error("too many modules (limit {MAX_MODULES})")]
    TooManyModules,
    /// The module's [`Module::mod_init`] failed
    #[error("module {name} failed to initialise: {reason}")]
    InitFailed {
        /// Module name
        name: String,
        /// Reason reported by the module
        reason: String,
    },
}

static REGISTRY: Mutex<Vec<&'static dyn Module>> = parking_lot::const_mutex(Vec::new());

fn same_module(a: &'static dyn Module, b: &'static dyn Module) -> bool {
    std::ptr::eq(
        a as *const dyn Module as *const (),
        b as *const dyn Module as *const (),
    )
}

/// Register `module` for every interpreter initialised from now on.
///
/// Registering the same module again returns its existing index.
/// [`Module::mod_init`] runs without the registry locked, so it may
/// register modules of its own; those take the lower indices.
///
/// # Returns
///
/// The module's index, which addresses its private slot in each
/// interpreter.
pub fn register_module(module: &'static dyn Module) -> Result<usize, ModuleError> {
    if let Some(index) = admit(&REGISTRY.lock(), module)? {
        return Ok(index);
    }
    if let Err(reason) = module.mod_init() {
        log::warn!("module {} failed to initialise: {}", module.name(), reason);
        return Err(ModuleError::InitFailed {
            name: module.name().to_string(),
            reason,
        });
    }
    let mut registry = REGISTRY.lock();
    if let Some(index) = admit(&registry, module)? {
        return Ok(index);
    }
    let index = registry.len();
    registry.push(module);
    log::debug!("registered module {} v{} at {}", module.name(), module.version(), index);
    Ok(index)
}

/// Existing index of `module`, or `None` if there is room to add it.
fn admit(registry: &[&'static dyn Module], module: &'static dyn Module) -> Result<Option<usize>, ModuleError> {
    if let Some(index) = registry.iter().position(|m| same_module(*m, module)) {
        return Ok(Some(index));
    }
    if registry.len() >= MAX_MODULES {
        log::warn!("module {} rejected: registry full", module.name());
        return Err(ModuleError::TooManyModules);
    }
    Ok(None)
}

/// Index of `module`, if registered.
pub fn module_index(module: &'static dyn Module) -> Option<usize> {
    REGISTRY.lock().iter().position(|m| same_module(*m, module))
}

/// The registered modules, in registration order.
pub fn registered_modules() -> Vec<&'static dyn Module> {
    REGISTRY.lock().clone()
}

impl Interpreter {
    /// Run module allocation then initialisation for this interpreter.
    pub(crate) fn init_modules(&mut self) {
        let modules = registered_modules();
        for module in &modules {
            log::debug!("allocating module {}", module.name());
            module.alloc(self);
        }
        for module in &modules {
            log::debug!("initialising module {}", module.name());
            if let Err(caught) = self.try_catch(|interp| module.init(interp)) {
                let description = self.describe(&caught.value);
                self.fatal(&format!("module {} failed: {}", module.name(), description));
            }
        }
        self.modules = modules;
    }

    /// Modules this interpreter was initialised with.
    pub fn modules(&self) -> &[&'static dyn Module] {
        &self.modules
    }

    /// Private data stored by the module at `index`.
    pub fn module_private(&self, index: usize) -> Option<&dyn Any> {
        self.module_private
            .get(index)
            .and_then(|slot| slot.as_deref())
    }

    /// Mutable private data of the module at `index`.
    pub fn module_private_mut(&mut self, index: usize) -> Option<&mut dyn Any> {
        self.module_private
            .get_mut(index)
            .and_then(|slot| slot.as_deref_mut())
    }

    /// Store private data for the module at `index`, returning what was
    /// there before.
    pub fn set_module_private(&mut self, index: usize, data: Box<dyn Any>) -> Option<Box<dyn Any>> {
        if index >= MAX_MODULES {
            self.fatal(&format!("module index {} out of range", index));
        }
        if self.module_private.len() <= index {
            self.module_private.resize_with(index + 1, || None);
        }
        self.module_private[index].replace(data)
    }
}
