//! Call traceback.
//!
//! Every guarded call or construct pushes a [`TracebackEntry`] and pops it on
//! the way out, whatever the outcome. The list is a root set for the
//! collector and the source of host-facing stack frames.

use core_types::{CallType, ObjRef, SourceLocation, StackFrame};
use memory_manager::{Trace, Tracer};

use crate::Interpreter;

/// One active call.
#[derive(Debug, Clone, PartialEq)]
pub struct TracebackEntry {
    /// The function being called or constructed
    pub callee: ObjRef,
    /// Call or construct
    pub call_type: CallType,
    /// Location current at the call site
    pub location: Option<SourceLocation>,
}

impl Trace for TracebackEntry {
    fn trace(&self, tracer: &mut Tracer) {
        tracer.mark(self.callee);
    }
}

impl Interpreter {
    /// Active calls, outermost first.
    pub fn traceback(&self) -> Vec<StackFrame> {
        self.traceback
            .iter()
            .map(|entry| self.stack_frame(entry))
            .collect()
    }

    /// Number of active guarded calls.
    pub fn call_depth(&self) -> usize {
        self.traceback.len()
    }

    fn stack_frame(&self, entry: &TracebackEntry) -> StackFrame {
        let object = self.heap.get(entry.callee);
        let mut function_name = object
            .as_ref()
            .and_then(|o| o.function_name())
            .map(|name| name.to_string());
        if function_name.is_none() && entry.call_type == CallType::Construct {
            function_name = object.map(|o| o.class_name().to_string());
        }
        StackFrame {
            call_type: entry.call_type,
            function_name,
            location: entry.location.clone(),
        }
    }

    /// Render the active calls, innermost first.
    ///
    /// Returns an empty string when no call is active.
    ///
    /// # Examples
    ///
    /// ```
    /// use interpreter::Interpreter;
    ///
    /// let interp = Interpreter::new();
    /// assert_eq!(interp.render_traceback(), "");
    /// ```
    pub fn render_traceback(&self) -> String {
        if self.traceback.is_empty() {
            return String::new();
        }
        let mut out = String::from("traceback:");
        for entry in self.traceback.iter().rev() {
            out.push_str("\n\t");
            out.push_str(&self.stack_frame(entry).to_string());
        }
        out
    }
}
