//! Object heap with mark/sweep collection.
//!
//! The heap is an arena of slots addressed by [`ObjRef`] handles. Each slot
//! carries a small header (prototype link, mark color, accounted size and an
//! optional finalizer) next to a shared pointer to the object itself, so
//! callers can hold an object while re-entering the heap.
//!
//! Collection never runs implicitly. The owner calls [`Heap::collect`] at a
//! safe point with the complete root set.

use std::fmt;
use std::mem;
use std::rc::Rc;

use core_types::ObjRef;
use thiserror::Error;

use crate::gc::{MarkColor, Trace, Tracer};
use crate::hooks::{DefaultMemoryHooks, MemoryHooks};

/// Callback run when an object is swept.
pub type Finalizer<T> = Box<dyn FnOnce(&T)>;

/// Allocation refused by the host's memory hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("out of memory: allocation of {requested} bytes refused")]
pub struct OutOfMemory {
    /// Size of the refused allocation
    pub requested: usize,
}

/// Heap occupancy counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeapStats {
    /// Objects currently allocated
    pub live_objects: usize,
    /// Bytes currently allocated
    pub live_bytes: usize,
    /// Bytes allocated since the last collection
    pub bytes_since_collect: usize,
    /// Collections performed
    pub collections: usize,
    /// Objects reclaimed over the heap's lifetime
    pub total_freed: usize,
}

/// Outcome of one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectStats {
    /// Objects that survived
    pub live: usize,
    /// Objects reclaimed
    pub freed: usize,
    /// Bytes reclaimed
    pub freed_bytes: usize,
}

/// GC header kept alongside every object.
#[derive(Debug, Clone, Copy)]
pub struct ObjectHeader {
    /// Prototype link; `None` only at the root of a chain
    pub prototype: Option<ObjRef>,
    /// Mark state for the current collection
    pub color: MarkColor,
    /// Bytes accounted to the memory hooks
    pub size: usize,
}

struct Entry<T: ?Sized> {
    header: ObjectHeader,
    value: Rc<T>,
    finalizer: Option<Finalizer<T>>,
}

struct Slot<T: ?Sized> {
    generation: u32,
    entry: Option<Entry<T>>,
}

/// Arena of traced objects.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
/// use memory_manager::{Heap, Trace, Tracer};
///
/// struct Leaf;
/// impl Trace for Leaf {
///     fn trace(&self, _tracer: &mut Tracer) {}
/// }
///
/// let mut heap: Heap<Leaf> = Heap::new();
/// let kept = heap.allocate(Rc::new(Leaf), None).unwrap();
/// let dropped = heap.allocate(Rc::new(Leaf), None).unwrap();
///
/// let stats = heap.collect([kept]);
/// assert_eq!(stats.freed, 1);
/// assert!(heap.contains(kept));
/// assert!(!heap.contains(dropped));
/// ```
pub struct Heap<T: ?Sized + Trace> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    hooks: Rc<dyn MemoryHooks>,
    stats: HeapStats,
}

impl<T: ?Sized + Trace> Heap<T> {
    /// Creates a heap with unlimited default hooks.
    pub fn new() -> Self {
        Self::with_hooks(Rc::new(DefaultMemoryHooks::new()))
    }

    /// Creates a heap governed by `hooks`.
    pub fn with_hooks(hooks: Rc<dyn MemoryHooks>) -> Self {
        Heap {
            slots: Vec::new(),
            free: Vec::new(),
            hooks,
            stats: HeapStats::default(),
        }
    }

    /// Allocates a new object.
    ///
    /// # Arguments
    ///
    /// * `value` - The object
    /// * `prototype` - Its initial prototype link
    ///
    /// # Returns
    ///
    /// The handle of the new object, or [`OutOfMemory`] if the hooks
    /// refused the allocation.
    pub fn allocate(&mut self, value: Rc<T>, prototype: Option<ObjRef>) -> Result<ObjRef, OutOfMemory> {
        self.insert(value, prototype, None)
    }

    /// Allocates a new object with a finalizer run when it is swept.
    pub fn allocate_finalized(
        &mut self,
        value: Rc<T>,
        prototype: Option<ObjRef>,
        finalizer: Finalizer<T>,
    ) -> Result<ObjRef, OutOfMemory> {
        self.insert(value, prototype, Some(finalizer))
    }

    fn insert(
        &mut self,
        value: Rc<T>,
        prototype: Option<ObjRef>,
        finalizer: Option<Finalizer<T>>,
    ) -> Result<ObjRef, OutOfMemory> {
        let size = mem::size_of_val(&*value) + mem::size_of::<ObjectHeader>();
        if !self.hooks.allocate(size) {
            return Err(OutOfMemory { requested: size });
        }

        let entry = Entry {
            header: ObjectHeader {
                prototype,
                color: MarkColor::White,
                size,
            },
            value,
            finalizer,
        };

        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let slot = &mut self.slots[index as usize];
        slot.entry = Some(entry);

        self.stats.live_objects += 1;
        self.stats.live_bytes += size;
        self.stats.bytes_since_collect += size;
        Ok(ObjRef::new(index, slot.generation))
    }

    fn entry(&self, r: ObjRef) -> Option<&Entry<T>> {
        self.slots
            .get(r.index() as usize)
            .filter(|slot| slot.generation == r.generation())
            .and_then(|slot| slot.entry.as_ref())
    }

    fn entry_mut(&mut self, r: ObjRef) -> Option<&mut Entry<T>> {
        self.slots
            .get_mut(r.index() as usize)
            .filter(|slot| slot.generation == r.generation())
            .and_then(|slot| slot.entry.as_mut())
    }

    /// Returns the object behind `r`, or `None` for a stale handle.
    pub fn get(&self, r: ObjRef) -> Option<Rc<T>> {
        self.entry(r).map(|e| Rc::clone(&e.value))
    }

    /// True if `r` refers to a live object.
    pub fn contains(&self, r: ObjRef) -> bool {
        self.entry(r).is_some()
    }

    /// Returns the header of `r`.
    pub fn header(&self, r: ObjRef) -> Option<&ObjectHeader> {
        self.entry(r).map(|e| &e.header)
    }

    /// Prototype link of `r`; `None` at a chain root or for a stale handle.
    pub fn prototype(&self, r: ObjRef) -> Option<ObjRef> {
        self.entry(r).and_then(|e| e.header.prototype)
    }

    /// Replaces the prototype link of `r`.
    ///
    /// Returns false for a stale handle. Cycle checks belong to the caller.
    pub fn set_prototype(&mut self, r: ObjRef, prototype: Option<ObjRef>) -> bool {
        match self.entry_mut(r) {
            Some(e) => {
                e.header.prototype = prototype;
                true
            }
            None => false,
        }
    }

    /// Current counters.
    pub fn stats(&self) -> HeapStats {
        self.stats
    }

    /// Number of live objects.
    pub fn len(&self) -> usize {
        self.stats.live_objects
    }

    /// True if no objects are live.
    pub fn is_empty(&self) -> bool {
        self.stats.live_objects == 0
    }

    /// Asks the hooks whether a collection is due.
    pub fn should_collect(&self) -> bool {
        self.hooks.should_collect(&self.stats)
    }

    /// Runs a full mark/sweep collection.
    ///
    /// # Arguments
    ///
    /// * `roots` - Every handle the owner can still reach directly
    ///
    /// # Returns
    ///
    /// Counts of surviving and reclaimed objects.
    pub fn collect<I>(&mut self, roots: I) -> CollectStats
    where
        I: IntoIterator<Item = ObjRef>,
    {
        let mut tracer = Tracer::new();
        for root in roots {
            tracer.mark(root);
        }
        self.mark(&mut tracer);
        let stats = self.sweep();

        self.stats.collections += 1;
        self.stats.bytes_since_collect = 0;
        self.stats.total_freed += stats.freed;
        log::debug!(
            "collection {}: {} live, {} freed ({} bytes)",
            self.stats.collections,
            stats.live,
            stats.freed,
            stats.freed_bytes
        );
        stats
    }

    fn mark(&mut self, tracer: &mut Tracer) {
        while let Some(r) = tracer.pop() {
            let value = match self.entry_mut(r) {
                Some(e) if e.header.color == MarkColor::White => {
                    e.header.color = MarkColor::Black;
                    tracer.mark_opt(e.header.prototype);
                    Rc::clone(&e.value)
                }
                _ => continue,
            };
            value.trace(tracer);
        }
    }

    fn sweep(&mut self) -> CollectStats {
        let mut stats = CollectStats::default();
        let mut dead = Vec::new();

        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(entry) = slot.entry.as_mut() else {
                continue;
            };
            if entry.header.color == MarkColor::Black {
                entry.header.color = MarkColor::White;
                stats.live += 1;
                continue;
            }
            if let Some(entry) = slot.entry.take() {
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                dead.push(entry);
            }
        }

        for mut entry in dead {
            stats.freed += 1;
            stats.freed_bytes += entry.header.size;
            self.stats.live_objects -= 1;
            self.stats.live_bytes -= entry.header.size;
            self.hooks.free(entry.header.size);
            if let Some(finalizer) = entry.finalizer.take() {
                finalizer(&entry.value);
            }
        }
        stats
    }
}

impl<T: ?Sized + Trace> Default for Heap<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized + Trace> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heap")
            .field("slots", &self.slots.len())
            .field("free", &self.free.len())
            .field("stats", &self.stats)
            .finish()
    }
}
