use crate::value::Value;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// One lexical scope: its own bindings plus a shared link to the scope it is
/// nested in. The global scope has no `outer`.
#[derive(Debug, Default)]
pub struct Environment {
    store: HashMap<String, Value>,
    outer: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            store: HashMap::new(),
            outer: None,
        }
    }

    /// A fresh global scope, ready to be shared.
    pub fn new_global() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    /// A fresh child scope of `outer`.
    pub fn enclosed(outer: &Rc<RefCell<Environment>>) -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Environment {
            store: HashMap::new(),
            outer: Some(Rc::clone(outer)),
        }))
    }

    /// Look `name` up in this scope, then outward.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.store.get(name) {
            Some(value.clone())
        } else if let Some(outer) = &self.outer {
            outer.borrow().get(name)
        } else {
            None
        }
    }

    /// Does any scope on the chain bind `name`?
    pub fn resolves(&self, name: &str) -> bool {
        self.store.contains_key(name)
            || self
                .outer
                .as_ref()
                .is_some_and(|outer| outer.borrow().resolves(name))
    }

    /// Bind `name` in this scope only. Fails if this scope already binds it;
    /// shadowing an outer binding is fine.
    pub fn declare(&mut self, name: &str, value: Value) -> Result<Value, String> {
        if self.store.contains_key(name) {
            debug!("Rejected redeclaration of '{}'", name);
            return Err(format!("{} declared in for loop initialization", name));
        }

        self.store.insert(name.to_string(), value.clone());

        Ok(value)
    }

    /// Overwrite `name` in the nearest scope that binds it.
    pub fn reassign(&mut self, name: &str, value: Value) -> Result<Value, String> {
        if let Some(slot) = self.store.get_mut(name) {
            *slot = value.clone();
            Ok(value)
        } else if let Some(outer) = &self.outer {
            outer.borrow_mut().reassign(name, value)
        } else {
            Err(format!("identifier not found: {}", name))
        }
    }
}
