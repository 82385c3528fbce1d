use alloc::{collections::BTreeMap, vec::Vec};

use crate::declaration::{Declaration, Key};

/// Immutable mapping from key to declaration, kept in declared order.
///
/// Owned by one [`crate::Container`]; read-only after construction.
#[derive(Default, Clone)]
pub struct Registry {
    declarations: BTreeMap<Key, Declaration>,
    order: Vec<Key>,
}

impl Registry {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            declarations: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    /// Registers a declaration under `key`.
    ///
    /// Redeclaring a key replaces its declaration but keeps its position in
    /// the declared order.
    #[must_use]
    pub fn provide(mut self, key: impl Into<Key>, declaration: Declaration) -> Self {
        let key = key.into();
        if self.declarations.insert(key.clone(), declaration).is_none() {
            self.order.push(key);
        }
        self
    }

    /// New registry equal to this one with `declarations` taking precedence;
    /// keys unknown to this registry are appended after the existing ones.
    ///
    /// `self` and any sibling extensions are unaffected.
    #[must_use]
    pub fn extend(&self, declarations: Overrides) -> Self {
        let mut registry = self.clone();
        for (key, declaration) in declarations.into_entries() {
            if registry.declarations.insert(key.clone(), declaration).is_none() {
                registry.order.push(key);
            }
        }
        registry
    }

    /// Keys in declared order.
    pub(crate) fn keys(&self) -> impl Iterator<Item = &Key> {
        self.order.iter()
    }

    pub(crate) fn declarations(&self) -> &BTreeMap<Key, Declaration> {
        &self.declarations
    }
}

#[cfg(feature = "debug")]
impl core::fmt::Debug for Registry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.order.iter()).finish()
    }
}

/// Partial key to declaration mapping, supplied to [`crate::Container::init`]
/// as per-pass overrides or to [`crate::Container::extend`] as the derived
/// declarations. The last entry for a key wins.
#[derive(Default, Clone)]
pub struct Overrides {
    declarations: BTreeMap<Key, Declaration>,
    order: Vec<Key>,
}

impl Overrides {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            declarations: BTreeMap::new(),
            order: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<Key>, declaration: Declaration) -> Self {
        let key = key.into();
        if self.declarations.insert(key.clone(), declaration).is_none() {
            self.order.push(key);
        }
        self
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub(crate) fn into_entries(self) -> impl Iterator<Item = (Key, Declaration)> {
        let Self { mut declarations, order } = self;
        order.into_iter().filter_map(move |key| {
            let declaration = declarations.remove(&key)?;
            Some((key, declaration))
        })
    }
}
