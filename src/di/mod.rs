//! Auto-mocking construction for unit tests
//!
//! A [`Mocker`] builds a type under test by picking one of its declared
//! constructors and filling every parameter from explicit arguments, the
//! [`MockRegistry`], registered factories, or freshly created mocks. Each
//! constructor call is kept in the [`ConstructionHistory`].

pub mod capability;
pub mod constructor;
pub mod history;
pub mod instance;
pub mod mocker;
pub mod registry;
pub mod selector;

pub use capability::{ArgValue, Capability, Mock, TypeKey};
pub use constructor::{
    Args, Arguments, Constructible, Constructor, ConstructorBuilder, ConstructorInfo, Param,
    ParamKind, Signature, Visibility,
};
pub use history::{ArgumentRecord, ArgumentSource, ConstructionHistory, ConstructorModel};
pub use instance::{InstanceModel, Lifetime};
pub use mocker::{FixtureState, Mocker};
pub use registry::{EntryOrigin, MockEntry, MockRegistry};
pub use selector::ConstructorSelector;

#[cfg(test)]
mod tests;
