//! Property storage for native objects.
//!
//! A [`PropertyTable`] is a fixed-size bucketed hash table keyed by the
//! identity of interned names. New entries go to the tail of their bucket, so
//! iteration within one bucket follows first-insertion order.

use std::fmt;
use std::vec;

use core_types::{Name, Value};
use memory_manager::{Trace, Tracer};

/// Number of hash buckets in every property table.
pub const HASH_BUCKETS: usize = 257;

bitflags::bitflags! {
    /// Property attribute bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Attributes: u8 {
        /// Writes without authority are ignored
        const READONLY = 1 << 0;
        /// Skipped by `for..in`
        const DONTENUM = 1 << 1;
        /// `delete` fails
        const DONTDELETE = 1 << 2;
        /// Reserved for the runtime's own bookkeeping
        const INTERNAL = 1 << 3;
    }
}

impl Attributes {
    /// Attributes of a built-in `length` property.
    pub const LENGTH: Attributes = Attributes::READONLY
        .union(Attributes::DONTENUM)
        .union(Attributes::DONTDELETE);

    /// Attributes of built-in methods and constants.
    pub const DEFAULT: Attributes = Attributes::DONTENUM;
}

/// One named, attributed value.
#[derive(Debug, Clone)]
pub struct Property {
    /// Interned key
    pub name: Name,
    /// Current value
    pub value: Value,
    /// Attribute bits
    pub attributes: Attributes,
}

fn bucket_of(name: &Name) -> usize {
    let addr = name.identity();
    ((addr >> 4) ^ addr) % HASH_BUCKETS
}

/// Hash table of own properties.
///
/// # Examples
///
/// ```
/// use core_types::{Interner, Value};
/// use interpreter::{Attributes, PropertyTable};
///
/// let mut names = Interner::new();
/// let x = names.intern("x");
/// let mut table = PropertyTable::new();
///
/// table.put(&x, Value::Number(1.0), Attributes::READONLY);
/// table.put(&x, Value::Number(2.0), Attributes::empty());
///
/// assert_eq!(table.get(&x), Some(&Value::Number(2.0)));
/// assert_eq!(table.attributes(&x), Some(Attributes::READONLY));
/// ```
pub struct PropertyTable {
    buckets: Vec<Vec<Property>>,
    len: usize,
}

impl PropertyTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            buckets: vec![Vec::new(); HASH_BUCKETS],
            len: 0,
        }
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the table holds nothing.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The property named `name`, if present.
    pub fn find(&self, name: &Name) -> Option<&Property> {
        self.buckets[bucket_of(name)].iter().find(|p| p.name == *name)
    }

    fn find_mut(&mut self, name: &Name) -> Option<&mut Property> {
        self.buckets[bucket_of(name)]
            .iter_mut()
            .find(|p| p.name == *name)
    }

    /// Value of `name`, if present.
    pub fn get(&self, name: &Name) -> Option<&Value> {
        self.find(name).map(|p| &p.value)
    }

    /// Attributes of `name`, if present.
    pub fn attributes(&self, name: &Name) -> Option<Attributes> {
        self.find(name).map(|p| p.attributes)
    }

    /// True if `name` is present.
    pub fn contains(&self, name: &Name) -> bool {
        self.find(name).is_some()
    }

    /// Store `value` under `name`.
    ///
    /// A new entry is appended with `attributes`. An existing entry keeps its
    /// attributes unless `attributes` is non-empty. No permission checks are
    /// made here.
    pub fn put(&mut self, name: &Name, value: Value, attributes: Attributes) {
        if let Some(p) = self.find_mut(name) {
            p.value = value;
            if !attributes.is_empty() {
                p.attributes = attributes;
            }
            return;
        }
        self.buckets[bucket_of(name)].push(Property {
            name: name.clone(),
            value,
            attributes,
        });
        self.len += 1;
    }

    /// Remove and return `name`, ignoring attributes.
    pub fn remove(&mut self, name: &Name) -> Option<Property> {
        let bucket = &mut self.buckets[bucket_of(name)];
        let pos = bucket.iter().position(|p| p.name == *name)?;
        self.len -= 1;
        Some(bucket.remove(pos))
    }

    /// All properties, bucket by bucket.
    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.buckets.iter().flatten()
    }
}

impl Default for PropertyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PropertyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|p| (p.name.as_str(), &p.value)))
            .finish()
    }
}

impl Trace for PropertyTable {
    fn trace(&self, tracer: &mut Tracer) {
        tracer.mark_values(self.iter().map(|p| &p.value));
    }
}

/// One name produced by an enumerator.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumEntry {
    /// Property name
    pub name: Name,
    /// Present but hidden from `for..in`
    pub dont_enum: bool,
}

/// One-shot sequence of own property names.
///
/// The names are copied eagerly when the enumerator is created, not read
/// from the table as the walk advances. Properties added or deleted during
/// the walk are not reflected.
#[derive(Debug)]
pub struct Enumerator {
    entries: vec::IntoIter<EnumEntry>,
}

impl Enumerator {
    /// Enumerate the properties of `table`.
    pub fn new(table: &PropertyTable) -> Self {
        Self::from_entries(
            table
                .iter()
                .map(|p| EnumEntry {
                    name: p.name.clone(),
                    dont_enum: p.attributes.contains(Attributes::DONTENUM),
                })
                .collect(),
        )
    }

    /// Enumerate an explicit list.
    pub fn from_entries(entries: Vec<EnumEntry>) -> Self {
        Self {
            entries: entries.into_iter(),
        }
    }

    /// An enumerator yielding nothing.
    pub fn empty() -> Self {
        Self::from_entries(Vec::new())
    }
}

impl Iterator for Enumerator {
    type Item = EnumEntry;

    fn next(&mut self) -> Option<EnumEntry> {
        self.entries.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.entries.size_hint()
    }
}
