use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use log::trace;

use super::{DataWrapper, Node};

thread_local! {
    static GLOBAL: Rc<DependencyRegistry> = Rc::new(DependencyRegistry::new());
}

/// Weak multimap from a referenced instance id to the wrappers bound to it.
///
/// A wrapper registered twice under one key holds two entries and needs two
/// removals. Entries whose wrapper was dropped are pruned on lookup.
#[derive(Default)]
pub struct DependencyRegistry {
    entries: RefCell<HashMap<String, Vec<Weak<Node>>>>,
}

impl DependencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registry shared by every wrapper on this thread unless another
    /// one is injected through [`DataWrapper::root_with_registry`].
    pub fn global() -> Rc<Self> {
        GLOBAL.with(Rc::clone)
    }

    pub(crate) fn add(&self, key: &str, node: &Rc<Node>) {
        trace!("dependency add: {key}");
        self.entries
            .borrow_mut()
            .entry(key.to_owned())
            .or_default()
            .push(Rc::downgrade(node));
    }

    pub(crate) fn remove(&self, key: &str, node: &Rc<Node>) -> bool {
        let mut entries = self.entries.borrow_mut();
        let Some(list) = entries.get_mut(key) else {
            return false;
        };
        let target = Rc::as_ptr(node);
        let Some(idx) = list.iter().position(|weak| Weak::as_ptr(weak) == target) else {
            return false;
        };
        list.remove(idx);
        if list.is_empty() {
            entries.remove(key);
        }
        trace!("dependency remove: {key}");
        true
    }

    /// Live wrappers registered under `key`, each listed once.
    pub fn dependents(&self, key: &str) -> Vec<DataWrapper> {
        let mut entries = self.entries.borrow_mut();
        let Some(list) = entries.get_mut(key) else {
            return Vec::new();
        };
        list.retain(|weak| weak.strong_count() > 0);
        let mut out: Vec<DataWrapper> = Vec::with_capacity(list.len());
        for node in list.iter().filter_map(Weak::upgrade) {
            if !out.iter().any(|w| Rc::ptr_eq(&w.node, &node)) {
                out.push(DataWrapper { node });
            }
        }
        if list.is_empty() {
            entries.remove(key);
        }
        out
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .borrow()
            .get(key)
            .is_some_and(|list| list.iter().any(|weak| weak.strong_count() > 0))
    }

    /// Number of keys that still have at least one entry.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl std::fmt::Debug for DependencyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.borrow();
        let mut keys: Vec<&String> = entries.keys().collect();
        keys.sort();
        f.debug_struct("DependencyRegistry").field("keys", &keys).finish()
    }
}
