use indexmap::IndexMap;
use std::ops::Index;
use std::sync::Arc;
use tracing::debug;

use super::capability::{ArgValue, Capability, Mock, TypeKey};
use super::constructor::ConstructorInfo;

/// Where a resolved argument came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentSource {
    /// Passed explicitly by the test
    Explicit,
    /// Mock created on demand
    AutoMock,
    /// Mock seeded by the test
    CustomMock,
    /// Real implementation registered for a capability
    Instance,
    /// Registered value
    Value,
    /// Produced by a registered factory
    Factory,
    /// `Default::default()` of a value type, with default values enabled
    DefaultValue,
    /// `Default::default()` of a concrete dependency
    Constructed,
}

/// One argument passed to a constructor
#[derive(Debug, Clone)]
pub struct ArgumentRecord {
    parameter: &'static str,
    key: TypeKey,
    source: ArgumentSource,
    value: ArgValue,
}

impl ArgumentRecord {
    pub(crate) fn new(
        parameter: &'static str,
        key: TypeKey,
        source: ArgumentSource,
        value: ArgValue,
    ) -> Self {
        Self {
            parameter,
            key,
            source,
            value,
        }
    }

    pub fn parameter(&self) -> &'static str {
        self.parameter
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn source(&self) -> ArgumentSource {
        self.source
    }

    pub fn raw(&self) -> &ArgValue {
        &self.value
    }

    /// The capability object passed for this argument
    pub fn object<C: Capability + ?Sized>(&self) -> Option<Arc<C>> {
        self.value.downcast_ref::<Arc<C>>().cloned()
    }

    pub fn value<V: Clone + 'static>(&self) -> Option<V> {
        self.value.downcast_ref::<V>().cloned()
    }

    /// Whether this argument is the object of `mock`
    pub fn is_mock<C: Capability + ?Sized>(&self, mock: &Mock<C>) -> bool {
        self.object::<C>()
            .is_some_and(|object| mock.is_object(&object))
    }
}

/// A constructor invocation: which constructor ran and with what
#[derive(Debug, Clone)]
pub struct ConstructorModel {
    constructor: ConstructorInfo,
    arguments: Vec<ArgumentRecord>,
}

impl ConstructorModel {
    pub(crate) fn new(constructor: ConstructorInfo, arguments: Vec<ArgumentRecord>) -> Self {
        Self {
            constructor,
            arguments,
        }
    }

    pub fn constructor(&self) -> &ConstructorInfo {
        &self.constructor
    }

    pub fn arguments(&self) -> &[ArgumentRecord] {
        &self.arguments
    }

    pub fn argument(&self, parameter: &str) -> Option<&ArgumentRecord> {
        self.arguments.iter().find(|arg| arg.parameter == parameter)
    }
}

/// Append-only log of constructor invocations, grouped by constructed type
/// in order of first construction.
#[derive(Debug, Default)]
pub struct ConstructionHistory {
    records: IndexMap<TypeKey, Vec<ConstructorModel>>,
}

impl ConstructionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, key: TypeKey, model: ConstructorModel) {
        debug!(
            target_type = %key,
            constructor = %model.constructor,
            "Recorded construction"
        );
        self.records.entry(key).or_default().push(model);
    }

    /// Number of distinct constructed types
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Total number of recorded constructions
    pub fn construction_count(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn contains_type<T: ?Sized + 'static>(&self) -> bool {
        self.contains_key(&TypeKey::of::<T>())
    }

    pub fn contains_key(&self, key: &TypeKey) -> bool {
        self.records.contains_key(key)
    }

    pub fn get<T: ?Sized + 'static>(&self) -> Option<&[ConstructorModel]> {
        self.records.get(&TypeKey::of::<T>()).map(Vec::as_slice)
    }

    pub fn get_index(&self, index: usize) -> Option<(&TypeKey, &[ConstructorModel])> {
        self.records
            .get_index(index)
            .map(|(key, models)| (key, models.as_slice()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypeKey, &[ConstructorModel])> {
        self.records
            .iter()
            .map(|(key, models)| (key, models.as_slice()))
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }
}

impl Index<&TypeKey> for ConstructionHistory {
    type Output = [ConstructorModel];

    fn index(&self, key: &TypeKey) -> &Self::Output {
        match self.records.get(key) {
            Some(models) => models.as_slice(),
            None => panic!("no constructions recorded for {}", key),
        }
    }
}

impl Index<usize> for ConstructionHistory {
    type Output = [ConstructorModel];

    fn index(&self, index: usize) -> &Self::Output {
        self.records[index].as_slice()
    }
}
