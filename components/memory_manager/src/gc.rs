//! Tracing protocol for the mark/sweep collector.
//!
//! Every heap-resident type implements [`Trace`], reporting the object
//! handles it holds. The collector drives a [`Tracer`] worklist from the
//! roots outward; anything never reported is swept.

use core_types::{ObjRef, Value};

/// Mark colors used during collection.
///
/// Gray objects are the ones waiting on the tracer worklist, so only the two
/// terminal colors are stored in object headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MarkColor {
    /// Not (yet) proven reachable
    White = 0,
    /// Reachable and scanned
    Black = 2,
}

/// Types that hold object handles.
pub trait Trace {
    /// Report every handle reachable from `self` to `tracer`.
    fn trace(&self, tracer: &mut Tracer);
}

/// Worklist of handles discovered during the mark phase.
#[derive(Debug, Default)]
pub struct Tracer {
    pending: Vec<ObjRef>,
}

impl Tracer {
    /// Create an empty worklist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a handle.
    pub fn mark(&mut self, obj: ObjRef) {
        self.pending.push(obj);
    }

    /// Report an optional handle.
    pub fn mark_opt(&mut self, obj: Option<ObjRef>) {
        if let Some(obj) = obj {
            self.pending.push(obj);
        }
    }

    /// Report every handle held by a value.
    pub fn mark_value(&mut self, value: &Value) {
        match value {
            Value::Object(r) => self.pending.push(*r),
            Value::Reference(r) => self.mark_opt(r.base),
            Value::Completion(c) => {
                if let Some(v) = &c.value {
                    self.mark_value(v);
                }
            }
            _ => {}
        }
    }

    /// Report every handle held by a sequence of values.
    pub fn mark_values<'a, I>(&mut self, values: I)
    where
        I: IntoIterator<Item = &'a Value>,
    {
        for v in values {
            self.mark_value(v);
        }
    }

    pub(crate) fn pop(&mut self) -> Option<ObjRef> {
        self.pending.pop()
    }

    /// Number of handles waiting to be scanned.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True if nothing is waiting to be scanned.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Trace for Value {
    fn trace(&self, tracer: &mut Tracer) {
        tracer.mark_value(self);
    }
}
