use alloc::{borrow::Cow, rc::Rc};
use core::any::Any;

use crate::{container::Container, errors::ResolveErrorKind};

/// Key a declaration is registered under.
pub type Key = Cow<'static, str>;

pub(crate) type BoxedCloneProducer = Rc<dyn Fn(&Container) -> Result<Rc<dyn Any>, ResolveErrorKind>>;

/// Construction seam for [`class`] declarations.
///
/// Collaborators are pulled by key from the initializing container, not
/// passed as parameters.
pub trait Construct: Sized + 'static {
    /// # Errors
    /// Returns the error of any failed [`Container::inject`] call, or a
    /// construction failure of its own.
    fn construct(container: &Container) -> Result<Self, ResolveErrorKind>;
}

/// A registered recipe (or placeholder) for producing a keyed value.
///
/// Built with [`external`], [`value`], [`factory`] or [`class`]; immutable
/// once registered. Cloning shares the underlying producer.
#[derive(Clone)]
pub struct Declaration {
    pub(crate) kind: DeclarationKind,
}

#[derive(Clone)]
pub(crate) enum DeclarationKind {
    External,
    Value(Rc<dyn Any>),
    Factory(BoxedCloneProducer),
    Class(BoxedCloneProducer),
}

#[cfg(feature = "debug")]
impl core::fmt::Debug for Declaration {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self.kind {
            DeclarationKind::External => "Declaration::External",
            DeclarationKind::Value(_) => "Declaration::Value",
            DeclarationKind::Factory(_) => "Declaration::Factory",
            DeclarationKind::Class(_) => "Declaration::Class",
        })
    }
}

/// Declares a key with no producer; its value must be supplied as an
/// override at initialization time.
#[inline]
#[must_use]
pub fn external() -> Declaration {
    Declaration {
        kind: DeclarationKind::External,
    }
}

/// Declares a pre-computed value, returned as-is on resolution.
#[inline]
#[must_use]
pub fn value<T: 'static>(value: T) -> Declaration {
    Declaration {
        kind: DeclarationKind::Value(Rc::new(value)),
    }
}

/// Declares a producer invoked once per initialization pass.
///
/// The producer receives the initializing container and may pull its own
/// dependencies from it with [`Container::inject`].
#[must_use]
pub fn factory<T, Err, F>(producer: F) -> Declaration
where
    T: 'static,
    Err: Into<ResolveErrorKind>,
    F: Fn(&Container) -> Result<T, Err> + 'static,
{
    Declaration {
        kind: DeclarationKind::Factory(Rc::new(move |container| {
            producer(container).map(|value| Rc::new(value) as Rc<dyn Any>).map_err(Into::into)
        })),
    }
}

/// Declares a type constructed through its [`Construct`] impl once per
/// initialization pass.
#[must_use]
pub fn class<T: Construct>() -> Declaration {
    Declaration {
        kind: DeclarationKind::Class(Rc::new(|container| {
            T::construct(container).map(|value| Rc::new(value) as Rc<dyn Any>)
        })),
    }
}
