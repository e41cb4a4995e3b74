//! Full `for..in` enumeration.

use std::collections::HashSet;

use core_types::{Name, ObjRef};

use crate::exception::JsResult;
use crate::Interpreter;

impl Interpreter {
    /// Names `for..in` visits on `obj`: its own and inherited enumerable
    /// properties.
    ///
    /// A name is reported once, decided by its shallowest occurrence on the
    /// prototype chain, so an own don't-enum property hides an enumerable
    /// inherited one. Under JavaScript compatibility array indices come
    /// first in numeric order, followed by the other names sorted.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_types::Value;
    /// use interpreter::{Attributes, Interpreter};
    ///
    /// let mut interp = Interpreter::new();
    /// let obj = interp.new_object();
    /// interp.put_str(obj, "shown", Value::Null, Attributes::empty()).unwrap();
    /// interp.put_str(obj, "hidden", Value::Null, Attributes::DONTENUM).unwrap();
    ///
    /// let names: Vec<String> = interp
    ///     .try_catch(|interp| interp.enumerate_all(obj))
    ///     .unwrap()
    ///     .iter()
    ///     .map(|n| n.to_string())
    ///     .collect();
    /// assert_eq!(names, vec!["shown"]);
    /// ```
    pub fn enumerate_all(&mut self, obj: ObjRef) -> JsResult<Vec<Name>> {
        let mut seen: HashSet<Name> = HashSet::new();
        let mut names = Vec::new();
        let mut current = Some(obj);
        while let Some(o) = current {
            for entry in self.enumerator(o)? {
                if !seen.insert(entry.name.clone()) {
                    continue;
                }
                if !entry.dont_enum {
                    names.push(entry.name);
                }
            }
            current = self.prototype_of(o);
        }

        if self.compat().js_extensions() {
            names.sort_by(|a, b| match (a.array_index(), b.array_index()) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.as_str().cmp(b.as_str()),
            });
        }
        Ok(names)
    }
}
