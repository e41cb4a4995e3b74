//! Scope chains and identifier resolution.

use std::rc::Rc;

use core_types::{ErrorKind, Name, ObjRef, Reference, Value};
use memory_manager::{Trace, Tracer};

use crate::exception::JsResult;
use crate::property::Attributes;
use crate::Interpreter;

/// One link of a scope chain.
///
/// Chains are immutable and shared: a closure keeps the chain it was
/// created in, and each call prepends its activation to that chain.
#[derive(Debug, Clone)]
pub struct Scope {
    /// Object whose properties are the bindings of this link
    pub object: ObjRef,
    /// Enclosing scope; `None` after the global object
    pub next: Option<Rc<Scope>>,
}

impl Scope {
    /// A chain with `object` in front of `next`.
    pub fn new(object: ObjRef, next: Option<Rc<Scope>>) -> Rc<Scope> {
        Rc::new(Scope { object, next })
    }

    /// Objects of the chain, nearest first.
    pub fn objects(self: &Rc<Self>) -> impl Iterator<Item = ObjRef> {
        let mut current = Some(Rc::clone(self));
        std::iter::from_fn(move || {
            let scope = current.take()?;
            current = scope.next.clone();
            Some(scope.object)
        })
    }
}

impl Trace for Scope {
    fn trace(&self, tracer: &mut Tracer) {
        tracer.mark(self.object);
        let mut next = self.next.as_deref();
        while let Some(scope) = next {
            tracer.mark(scope.object);
            next = scope.next.as_deref();
        }
    }
}

impl Interpreter {
    /// Resolve `name` against `scope`, nearest binding first.
    ///
    /// The result names the object holding the binding. When no object on
    /// the chain has the property, the reference has no base.
    pub fn scope_lookup(&mut self, scope: &Rc<Scope>, name: &Name) -> JsResult<Reference> {
        for object in scope.objects() {
            if self.has_property(object, name)? {
                log::trace!("scope_lookup: found {} in {}", name, object);
                return Ok(Reference {
                    base: Some(object),
                    name: name.clone(),
                });
            }
        }
        log::trace!("scope_lookup: {} not found", name);
        Ok(Reference {
            base: None,
            name: name.clone(),
        })
    }

    /// GetValue on a reference; an unresolved one is a ReferenceError.
    pub fn get_value(&mut self, reference: &Reference) -> JsResult<Value> {
        match reference.base {
            Some(base) => self.get(base, &reference.name),
            None => {
                let message = format!("{} is not defined", reference.name);
                Err(self.throw_error(ErrorKind::ReferenceError, &message))
            }
        }
    }

    /// PutValue on a reference; an unresolved one writes to the global object.
    pub fn put_value(&mut self, reference: &Reference, value: Value) -> JsResult<()> {
        let base = match reference.base {
            Some(base) => base,
            None => self.global(),
        };
        self.put(base, &reference.name, value, Attributes::empty())
    }

    /// True if the two chains cannot be told apart by a closure.
    ///
    /// Links are compared with [`Interpreter::joined`], skipping runs of
    /// joined objects. Mutually recursive chains may compare unequal even
    /// when they are equivalent, which only costs an extra allocation.
    pub fn scope_eq(&self, a: &Rc<Scope>, b: &Rc<Scope>) -> bool {
        let mut s1 = Some(a);
        let mut s2 = Some(b);
        while let (Some(x), Some(y)) = (s1, s2) {
            if Rc::ptr_eq(x, y) {
                return true;
            }
            if !self.joined(x.object, y.object) {
                return false;
            }
            s1 = self.skip_joined(x);
            s2 = self.skip_joined(y);
        }
        s1.is_none() && s2.is_none()
    }

    fn skip_joined<'a>(&self, scope: &'a Rc<Scope>) -> Option<&'a Rc<Scope>> {
        let mut next = scope.next.as_ref();
        while let Some(s) = next {
            if !self.joined(s.object, scope.object) {
                break;
            }
            next = s.next.as_ref();
        }
        next
    }
}
