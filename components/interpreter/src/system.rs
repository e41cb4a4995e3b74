//! Host services.
//!
//! [`SystemHooks`] is the seam an embedding application implements to link
//! the core into its environment: fatal-error handling, clock, randomness,
//! default settings, security domain transitions and memory policy.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use memory_manager::{DefaultMemoryHooks, MemoryHooks};

use crate::config::Compatibility;

/// Opaque tag naming a trust context.
///
/// Domains compare by identity: clones of one domain are equal, two domains
/// built from equal tags are not.
///
/// # Examples
///
/// ```
/// use interpreter::SecurityDomain;
///
/// let trusted = SecurityDomain::new("chrome");
/// let page = SecurityDomain::new("chrome");
/// assert_eq!(trusted, trusted.clone());
/// assert_ne!(trusted, page);
/// assert_eq!(trusted.downcast_ref::<&str>(), Some(&"chrome"));
/// ```
#[derive(Clone)]
pub struct SecurityDomain(Rc<dyn Any>);

impl SecurityDomain {
    /// Wrap a host tag.
    pub fn new<T: Any>(tag: T) -> Self {
        SecurityDomain(Rc::new(tag))
    }

    /// Borrow the host tag.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for SecurityDomain {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for SecurityDomain {}

impl fmt::Debug for SecurityDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecurityDomain({:p})", self.addr())
    }
}

/// Services supplied by the embedding host.
pub trait SystemHooks {
    /// Terminate after an unrecoverable condition. Must not return.
    fn abort(&self, message: &str) -> !;

    /// Wall-clock time in milliseconds since the Unix epoch.
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64() * 1000.0)
            .unwrap_or(0.0)
    }

    /// Seed for the interpreter's random number generator.
    fn random_seed(&self) -> u32 {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32))
            .unwrap_or(0);
        nanos ^ std::process::id().rotate_left(16)
    }

    /// Call depth budget for new interpreters; `None` is unlimited.
    fn default_recursion_limit(&self) -> Option<u32> {
        None
    }

    /// Compatibility setting for new interpreters.
    fn default_compat(&self) -> Compatibility {
        Compatibility::default()
    }

    /// Locale for new interpreters.
    fn default_locale(&self) -> Option<String> {
        None
    }

    /// Notified whenever a call or construct changes the active domain.
    fn transit_security_domain(&self, _from: Option<&SecurityDomain>, _to: Option<&SecurityDomain>) {}

    /// Allocation policy for a new interpreter heap.
    fn memory_hooks(&self) -> Rc<dyn MemoryHooks> {
        Rc::new(DefaultMemoryHooks::new())
    }
}

/// Hooks used when the host supplies none.
///
/// Aborting logs the message and terminates the process.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultSystem;

impl SystemHooks for DefaultSystem {
    fn abort(&self, message: &str) -> ! {
        log::error!("fatal: {}", message);
        std::process::abort()
    }
}
