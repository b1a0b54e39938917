//! Lexical environments.
//!
//! A [`Context`] maps names to values and points at its parent. Contexts
//! are reference counted: the interpreter's stack holds one handle per
//! active block, loop iteration or call, and every closure holds a handle
//! to the context it was created in, so a context lives as long as either
//! still needs it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::value::Value;

#[derive(Default)]
pub struct Context {
    values: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Context>>,
}

impl Context {
    pub fn root() -> Rc<Self> {
        Rc::new(Context::default())
    }

    pub fn child(parent: &Rc<Context>) -> Rc<Self> {
        Rc::new(Context {
            values: RefCell::new(HashMap::new()),
            parent: Some(parent.clone()),
        })
    }

    /// Binds `name` in this context, shadowing any outer binding.
    pub fn declare(&self, name: impl Into<String>, value: Value) {
        self.values.borrow_mut().insert(name.into(), value);
    }

    /// Looks `name` up here and then outward through the parents.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = Some(self);
        while let Some(context) = current {
            if let Some(value) = context.values.borrow().get(name) {
                return Some(value.clone());
            }
            current = context.parent.as_deref();
        }
        None
    }

    /// Overwrites the nearest existing binding of `name`. Returns `false`
    /// if no context on the chain defines it.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        self.update(name, |slot| {
            *slot = value;
        })
        .is_some()
    }

    /// Runs `update` on the nearest existing binding of `name` and returns
    /// the binding's value afterwards.
    pub fn update(&self, name: &str, update: impl FnOnce(&mut Value)) -> Option<Value> {
        let mut current = Some(self);
        while let Some(context) = current {
            if let Some(slot) = context.values.borrow_mut().get_mut(name) {
                update(slot);
                return Some(slot.clone());
            }
            current = context.parent.as_deref();
        }
        None
    }

    pub fn is_declared_here(&self, name: &str) -> bool {
        self.values.borrow().contains_key(name)
    }
}
