use alloc::{borrow::Cow, rc::Rc, string::String};
use core::{
    any::{Any, TypeId},
    cell::RefCell,
};
use tracing::{debug, error, info_span};

use crate::{
    context::{Context, Entered},
    declaration::{Declaration, DeclarationKind},
    errors::ResolveErrorKind,
    instances::Instances,
    registry::{Overrides, Registry},
};

/// The public container: owns a registry, runs initialization passes over
/// it, and serves keyed lookups for the duration of one pass.
///
/// Cloning is cheap and yields a handle to the same container.
#[derive(Clone)]
pub struct Container {
    inner: Rc<ContainerInner>,
}

struct ContainerInner {
    registry: Registry,
    parent: Option<Container>,
    /// `Some` for the duration of one initialization pass; intentionally
    /// left in place when the pass fails.
    context: RefCell<Option<Context>>,
    /// Descendant container currently initializing, if any.
    active: RefCell<Option<Container>>,
}

impl Container {
    #[inline]
    #[must_use]
    pub fn new(registry: Registry) -> Self {
        Self {
            inner: Rc::new(ContainerInner {
                registry,
                parent: None,
                context: RefCell::new(None),
                active: RefCell::new(None),
            }),
        }
    }

    /// Derives a container whose registry is this one's with `declarations`
    /// taking precedence, linked back to `self` as its parent.
    ///
    /// While the derived container initializes, lookups through `self` (and
    /// transitively through its ancestors) are redirected to the derived
    /// container's resolution context.
    #[must_use]
    pub fn extend(&self, declarations: Overrides) -> Self {
        Self {
            inner: Rc::new(ContainerInner {
                registry: self.inner.registry.extend(declarations),
                parent: Some(self.clone()),
                context: RefCell::new(None),
                active: RefCell::new(None),
            }),
        }
    }

    /// Runs one initialization pass: resolves every declared key in declared
    /// order and returns the resolved instances.
    ///
    /// `overrides` must cover every key declared [`external`](crate::external);
    /// overrides for other keys shadow their registered declaration for this
    /// pass only. Passes are independent, nothing is memoized across calls.
    ///
    /// On error the resolution context is left in place for diagnosis; a
    /// container whose pass failed should be discarded, not reused.
    ///
    /// # Errors
    /// - [`ResolveErrorKind::NoProvider`] if a required override is missing,
    ///   or a producer requests an undeclared key
    /// - [`ResolveErrorKind::CircularDependency`] if resolution re-enters a
    ///   key that is still being resolved
    /// - [`ResolveErrorKind::Instantiate`] if a producer fails
    pub fn init(&self, overrides: Overrides) -> Result<Instances, ResolveErrorKind> {
        let span = info_span!("init");
        let _guard = span.enter();

        self.register_active();
        self.inner.context.replace(Some(Context::new(&self.inner.registry, overrides)));
        debug!("Context created");

        {
            let guard = self.inner.context.borrow();
            let context = guard.as_ref().expect("context is set for the duration of init");
            for key in self.inner.registry.keys() {
                if matches!(
                    context.provider(key),
                    Some(Declaration {
                        kind: DeclarationKind::External
                    })
                ) {
                    let err = ResolveErrorKind::NoProvider { key: key.clone() };
                    error!("{}", err);
                    return Err(err);
                }
            }
        }

        for key in self.inner.registry.keys() {
            self.resolve_raw(key)?;
        }

        let context = self
            .inner
            .context
            .replace(None)
            .expect("context is set for the duration of init");
        self.clear_active();
        debug!("Context torn down");

        Ok(context.into_instances())
    }

    /// Resolves `key` through the currently active resolution context and
    /// downcasts the instance to `Dep`.
    ///
    /// Callable only while an initialization pass runs on this container or
    /// on a descendant derived from it with [`Self::extend`]; the descendant
    /// case is how components wired against an ancestor observe the derived
    /// container's overrides.
    ///
    /// # Errors
    /// - [`ResolveErrorKind::NotInitialized`] outside any initialization pass
    /// - [`ResolveErrorKind::NoProvider`] if `key` has no usable declaration
    /// - [`ResolveErrorKind::CircularDependency`] if `key` is already being
    ///   resolved
    /// - [`ResolveErrorKind::IncorrectType`] if the instance is not a `Dep`
    pub fn inject<Dep: 'static>(&self, key: &str) -> Result<Rc<Dep>, ResolveErrorKind> {
        let Some(resolver) = self.active_resolver() else {
            let err = ResolveErrorKind::NotInitialized;
            error!("{}", err);
            return Err(err);
        };

        let value = resolver.resolve_raw(key)?;
        match value.downcast::<Dep>() {
            Ok(value) => Ok(value),
            Err(incorrect_type) => {
                let err = ResolveErrorKind::IncorrectType {
                    key: Cow::Owned(String::from(key)),
                    expected: TypeId::of::<Dep>(),
                    actual: (*incorrect_type).type_id(),
                };
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Snapshot of everything resolved so far in the active pass.
    ///
    /// Nothing is resolved on the caller's behalf; `init` resolves every
    /// declared key eagerly, so the snapshot is complete once `init` returns.
    ///
    /// # Errors
    /// - [`ResolveErrorKind::NotInitialized`] outside any initialization pass
    pub fn inject_all(&self) -> Result<Instances, ResolveErrorKind> {
        let Some(resolver) = self.active_resolver() else {
            let err = ResolveErrorKind::NotInitialized;
            error!("{}", err);
            return Err(err);
        };

        let guard = resolver.inner.context.borrow();
        match guard.as_ref() {
            Some(context) => Ok(context.snapshot()),
            None => {
                let err = ResolveErrorKind::NotInitialized;
                error!("{}", err);
                Err(err)
            }
        }
    }
}

impl Container {
    fn resolve_raw(&self, key: &str) -> Result<Rc<dyn Any>, ResolveErrorKind> {
        let span = info_span!("resolve", key);
        let _guard = span.enter();

        let entered = {
            let mut guard = self.inner.context.borrow_mut();
            let Some(context) = guard.as_mut() else {
                let err = ResolveErrorKind::NotInitialized;
                error!("{}", err);
                return Err(err);
            };
            match context.enter(key) {
                Ok(entered) => entered,
                Err(err) => {
                    error!("{}", err);
                    return Err(err);
                }
            }
        };

        let declaration = match entered {
            Entered::Memoized(value) => {
                debug!("Found in instances");
                return Ok(value);
            }
            Entered::Pending(declaration) => declaration,
        };

        let value = match declaration.map(|declaration| declaration.kind) {
            None | Some(DeclarationKind::External) => {
                let err = ResolveErrorKind::NoProvider {
                    key: Cow::Owned(String::from(key)),
                };
                error!("{}", err);
                return Err(err);
            }
            Some(DeclarationKind::Value(value)) => value,
            // The context borrow is released by now, so producers can
            // re-enter `inject` for their own dependencies.
            Some(DeclarationKind::Factory(producer) | DeclarationKind::Class(producer)) => match producer(self) {
                Ok(value) => value,
                Err(err) => {
                    error!("{}", err);
                    return Err(err);
                }
            },
        };

        let mut guard = self.inner.context.borrow_mut();
        if let Some(context) = guard.as_mut() {
            context.complete(key, value.clone());
        }
        debug!("Resolved");

        Ok(value)
    }

    /// The container whose context should serve lookups: this one mid-pass,
    /// or the most-derived descendant registered as the active resolver.
    fn active_resolver(&self) -> Option<Container> {
        if self.inner.context.borrow().is_some() {
            return Some(self.clone());
        }

        let active = self.inner.active.borrow().clone();
        match active {
            Some(active) => active.active_resolver(),
            None => None,
        }
    }

    fn register_active(&self) {
        let mut ancestor = self.inner.parent.clone();
        while let Some(container) = ancestor {
            container.inner.active.replace(Some(self.clone()));
            ancestor = container.inner.parent.clone();
        }
    }

    fn clear_active(&self) {
        let mut ancestor = self.inner.parent.clone();
        while let Some(container) = ancestor {
            container.inner.active.replace(None);
            ancestor = container.inner.parent.clone();
        }
    }
}
