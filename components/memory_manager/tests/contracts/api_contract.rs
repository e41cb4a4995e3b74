//! Contract tests verifying the memory_manager API matches what the
//! interpreter relies on.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use core_types::{ObjRef, Value};
use memory_manager::{DefaultMemoryHooks, Heap, HeapStats, MemoryHooks, Trace, Tracer};

struct Cellular {
    slots: RefCell<Vec<Value>>,
}

impl Trace for Cellular {
    fn trace(&self, tracer: &mut Tracer) {
        tracer.mark_values(self.slots.borrow().iter());
    }
}

fn cell(values: Vec<Value>) -> Rc<Cellular> {
    Rc::new(Cellular {
        slots: RefCell::new(values),
    })
}

struct CountingHooks {
    allocations: Cell<usize>,
    frees: Cell<usize>,
}

impl MemoryHooks for CountingHooks {
    fn allocate(&self, _bytes: usize) -> bool {
        self.allocations.set(self.allocations.get() + 1);
        true
    }

    fn free(&self, _bytes: usize) {
        self.frees.set(self.frees.get() + 1);
    }

    fn should_collect(&self, stats: &HeapStats) -> bool {
        stats.live_objects > 2
    }
}

/// Test Heap contract: new() -> Self
#[test]
fn contract_heap_new() {
    let heap: Heap<Cellular> = Heap::new();
    assert!(heap.is_empty());
    assert_eq!(heap.stats().collections, 0);
}

/// Test Heap contract: allocate(value, prototype) -> Result<ObjRef, OutOfMemory>
#[test]
fn contract_heap_allocate() {
    let mut heap: Heap<Cellular> = Heap::new();
    let r = heap.allocate(cell(vec![]), None).expect("allocation admitted");
    assert!(heap.contains(r));
    assert_eq!(heap.prototype(r), None);
}

/// Test Heap contract: values stored in objects keep their targets alive
#[test]
fn contract_heap_traces_values() {
    let mut heap: Heap<Cellular> = Heap::new();
    let inner = heap.allocate(cell(vec![]), None).unwrap();
    let outer = heap
        .allocate(cell(vec![Value::Number(1.0), Value::Object(inner)]), None)
        .unwrap();
    let stats = heap.collect([outer]);
    assert_eq!(stats.freed, 0);
    assert!(heap.contains(inner));
}

/// Test Heap contract: every admitted allocation is released through the hooks
#[test]
fn contract_hooks_see_allocate_and_free() {
    let hooks = Rc::new(CountingHooks {
        allocations: Cell::new(0),
        frees: Cell::new(0),
    });
    let mut heap: Heap<Cellular> = Heap::with_hooks(hooks.clone());
    for _ in 0..3 {
        heap.allocate(cell(vec![]), None).unwrap();
    }
    assert!(heap.should_collect());
    heap.collect(Vec::<ObjRef>::new());
    assert_eq!(hooks.allocations.get(), 3);
    assert_eq!(hooks.frees.get(), 3);
    assert!(!heap.should_collect());
}

/// Test DefaultMemoryHooks contract: a limit refuses the overflowing allocation
#[test]
fn contract_default_hooks_limit() {
    let mut heap: Heap<Cellular> = Heap::with_hooks(Rc::new(DefaultMemoryHooks::with_limit(4096)));
    let mut refused = false;
    for _ in 0..1000 {
        if heap.allocate(cell(vec![]), None).is_err() {
            refused = true;
            break;
        }
    }
    assert!(refused);
}
