#![no_std]

extern crate alloc;

pub(crate) mod container;
pub(crate) mod context;
pub(crate) mod declaration;
pub(crate) mod errors;
pub(crate) mod instances;
pub(crate) mod registry;

pub use container::Container;
pub use declaration::{class, external, factory, value, Construct, Declaration, Key};
pub use errors::{InstantiateErrorKind, ResolveErrorKind};
pub use instances::Instances;
pub use registry::{Overrides, Registry};
