use alloc::{collections::BTreeMap, rc::Rc, vec::Vec};
use core::any::Any;

use crate::declaration::Key;

/// Resolved instances of one initialization pass, insertion-ordered by first
/// resolution.
///
/// Returned by [`crate::Container::init`] as the final snapshot and by
/// [`crate::Container::inject_all`] as the in-progress snapshot. Cloning is
/// shallow; instances stay shared.
#[derive(Clone)]
pub struct Instances {
    entries: Vec<(Key, Rc<dyn Any>)>,
    index: BTreeMap<Key, usize>,
}

impl Instances {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    /// Resolved instance for `key`, downcast to `T`.
    ///
    /// `None` if the key is absent or holds a different type.
    #[must_use]
    pub fn get<T: 'static>(&self, key: &str) -> Option<Rc<T>> {
        self.get_raw(key).cloned().and_then(|value| value.downcast().ok())
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in first-resolution order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_ref())
    }

    /// Entries in first-resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Rc<dyn Any>)> {
        self.entries.iter().map(|(key, value)| (key.as_ref(), value))
    }

    pub(crate) fn get_raw(&self, key: &str) -> Option<&Rc<dyn Any>> {
        self.index.get(key).map(|&at| &self.entries[at].1)
    }

    pub(crate) fn insert(&mut self, key: Key, value: Rc<dyn Any>) {
        if let Some(&at) = self.index.get(&key) {
            self.entries[at].1 = value;
        } else {
            self.index.insert(key.clone(), self.entries.len());
            self.entries.push((key, value));
        }
    }
}

#[cfg(feature = "debug")]
impl core::fmt::Debug for Instances {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}

#[cfg(feature = "eq")]
impl PartialEq for Instances {
    fn eq(&self, other: &Self) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }
        for ((key_a, value_a), (key_b, value_b)) in self.entries.iter().zip(other.entries.iter()) {
            if key_a != key_b || (**value_a).type_id() != (**value_b).type_id() {
                return false;
            }
        }
        true
    }
}

#[cfg(feature = "eq")]
impl Eq for Instances {}
