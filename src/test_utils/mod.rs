//! Test utilities shared by the unit tests
//!
//! Capability traits with hand-written mocks, and types under test with a
//! range of constructor shapes.

pub mod fixtures;
pub mod mocks;
