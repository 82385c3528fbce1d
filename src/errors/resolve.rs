use alloc::boxed::Box;
use core::any::TypeId;

use super::instantiate::InstantiateErrorKind;
use crate::declaration::Key;

#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("Inject called outside an initialization context")]
    NotInitialized,
    #[error("No provider for key {key:?}")]
    NoProvider { key: Key },
    #[error("Circular dependency detected in {key:?}. Resolution chain: {}", .chain.join(" -> "))]
    CircularDependency { key: Key, chain: Box<[Key]> },
    #[error("Incorrect instance type for key {key:?}. Actual: {actual:?}, expected: {expected:?}")]
    IncorrectType { key: Key, expected: TypeId, actual: TypeId },
    #[error(transparent)]
    Instantiate(#[from] InstantiateErrorKind),
}
