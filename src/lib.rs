//! Auto-mocking test support.
//!
//! Given a type under test whose dependencies arrive through its constructor,
//! [`Mocker`] picks the best constructor, creates a mock for every capability
//! nothing else provides, and keeps both the mocks and a record of the
//! constructor call for later assertions.

pub mod config;
pub mod di;
pub mod errors;

#[cfg(test)]
mod test_utils;

pub use config::MockerOptions;
pub use di::{
    ArgValue, ArgumentRecord, ArgumentSource, Args, Arguments, Capability, ConstructionHistory,
    Constructible, Constructor, ConstructorBuilder, ConstructorInfo, ConstructorModel,
    ConstructorSelector, EntryOrigin, FixtureState, InstanceModel, Lifetime, Mock, MockEntry,
    MockRegistry, Mocker, Param, ParamKind, Signature, TypeKey, Visibility,
};
pub use errors::{MockerError, Result};
