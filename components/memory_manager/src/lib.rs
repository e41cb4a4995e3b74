//! Memory Manager - Tracing collector and heap management
//!
//! This component provides:
//! - A handle-addressed object heap ([`Heap`]) with per-object GC headers
//! - Mark/sweep collection driven by the [`Trace`] protocol
//! - Finalizers run when objects are reclaimed
//! - Host allocation hooks ([`MemoryHooks`]) for accounting, limits and
//!   collection scheduling

pub mod gc;
pub mod heap;
pub mod hooks;

// Re-export main types
pub use gc::{MarkColor, Trace, Tracer};
pub use heap::{CollectStats, Finalizer, Heap, HeapStats, ObjectHeader, OutOfMemory};
pub use hooks::{DefaultMemoryHooks, MemoryHooks, DEFAULT_COLLECT_THRESHOLD};
