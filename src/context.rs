use alloc::{
    borrow::Cow,
    collections::{BTreeMap, BTreeSet},
    rc::Rc,
    string::String,
    vec::Vec,
};
use core::any::Any;

use crate::{
    declaration::{Declaration, Key},
    errors::ResolveErrorKind,
    instances::Instances,
    registry::{Overrides, Registry},
};

/// Mutable state of one initialization pass: the effective provider map,
/// the memoized instances, and the in-progress resolution chain.
pub(crate) struct Context {
    providers: BTreeMap<Key, Declaration>,
    instances: Instances,
    visited: BTreeSet<Key>,
    chain: Vec<Key>,
}

pub(crate) enum Entered {
    Memoized(Rc<dyn Any>),
    Pending(Option<Declaration>),
}

impl Context {
    #[must_use]
    pub(crate) fn new(registry: &Registry, overrides: Overrides) -> Self {
        let mut providers = registry.declarations().clone();
        for (key, declaration) in overrides.into_entries() {
            providers.insert(key, declaration);
        }

        Self {
            providers,
            instances: Instances::new(),
            visited: BTreeSet::new(),
            chain: Vec::new(),
        }
    }

    /// Steps `key` into resolution: a memoized hit, a cycle error, or marks
    /// the key in-progress and hands back its effective provider.
    ///
    /// A key in `visited` but not yet memoized is mid-resolution; meeting it
    /// again is a cycle, not a cache miss.
    pub(crate) fn enter(&mut self, key: &str) -> Result<Entered, ResolveErrorKind> {
        if let Some(value) = self.instances.get_raw(key) {
            return Ok(Entered::Memoized(value.clone()));
        }

        if self.visited.contains(key) {
            return Err(ResolveErrorKind::CircularDependency {
                key: Cow::Owned(String::from(key)),
                chain: self.chain.clone().into_boxed_slice(),
            });
        }

        let key = self.owned_key(key);
        self.visited.insert(key.clone());
        self.chain.push(key.clone());

        Ok(Entered::Pending(self.providers.get(&key).cloned()))
    }

    /// Memoizes a produced value and pops the key off the in-progress chain.
    pub(crate) fn complete(&mut self, key: &str, value: Rc<dyn Any>) {
        debug_assert_eq!(self.chain.last().map(|owned| &**owned), Some(key));

        if let Some(owned) = self.chain.pop() {
            self.visited.remove(key);
            self.instances.insert(owned, value);
        }
    }

    pub(crate) fn provider(&self, key: &str) -> Option<&Declaration> {
        self.providers.get(key)
    }

    #[must_use]
    pub(crate) fn snapshot(&self) -> Instances {
        self.instances.clone()
    }

    #[must_use]
    pub(crate) fn into_instances(self) -> Instances {
        self.instances
    }

    fn owned_key(&self, key: &str) -> Key {
        match self.providers.get_key_value(key) {
            Some((key, _)) => key.clone(),
            None => Cow::Owned(String::from(key)),
        }
    }
}
