//! Unit tests for interned names

use core_types::{Interner, Value};
use std::collections::HashSet;

#[test]
fn test_interned_names_hash_by_identity() {
    let mut names = Interner::new();
    let mut set = HashSet::new();
    set.insert(names.intern("a"));
    set.insert(names.intern("a"));
    set.insert(names.intern("b"));
    assert_eq!(set.len(), 2);
}

#[test]
fn test_name_value_shares_text() {
    let mut names = Interner::new();
    let n = names.intern("prototype");
    assert_eq!(Value::from(&n), Value::from("prototype"));
    assert_eq!(n.to_string(), "prototype");
}

#[test]
fn test_interner_lookup() {
    let mut names = Interner::new();
    let n = names.intern("x");
    assert_eq!(names.get("x"), Some(n));
    assert_eq!(names.len(), 1);
}
