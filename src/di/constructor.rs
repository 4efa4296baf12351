//! Constructor descriptors for types built by the [`Mocker`](crate::Mocker)
//!
//! Rust has no runtime reflection over constructors, so a type under test
//! describes its constructors explicitly by implementing [`Constructible`].

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use super::capability::{ArgValue, Capability, Mock, TypeKey};
use super::history::ArgumentRecord;
use super::registry::MockRegistry;
use crate::errors::{MockerError, Result};

/// A type whose constructors can be resolved automatically
pub trait Constructible: Sized + 'static {
    /// Candidate constructors, in declaration order
    fn constructors() -> Vec<Constructor<Self>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    NonPublic,
}

/// How a parameter is filled when nothing is registered for it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Interface-like dependency, mocked on demand
    Capability,
    /// Primitive or value type; needs a registered value or default values enabled
    Value,
    /// Concrete dependency built through its own `Default` impl
    Concrete,
}

type CreateMockFn = fn(&mut MockRegistry, &TypeKey) -> Result<ArgValue>;
type DefaultFn = fn() -> ArgValue;

#[derive(Clone, Copy)]
enum Fallback {
    Mock(CreateMockFn),
    Value(DefaultFn),
    Concrete(DefaultFn),
}

/// One constructor parameter
#[derive(Clone)]
pub struct Param {
    name: &'static str,
    key: TypeKey,
    fallback: Fallback,
}

impl Param {
    pub fn capability<C: Capability + ?Sized>(name: &'static str) -> Self {
        Self {
            name,
            key: TypeKey::of::<C>(),
            fallback: Fallback::Mock(create_mock_object::<C>),
        }
    }

    /// A capability parameter bound to the mock registered under `mock_name`
    pub fn named_capability<C: Capability + ?Sized>(
        name: &'static str,
        mock_name: &str,
    ) -> Self {
        Self {
            name,
            key: TypeKey::named::<C>(mock_name),
            fallback: Fallback::Mock(create_mock_object::<C>),
        }
    }

    pub fn value<T: Clone + Default + Send + Sync + 'static>(name: &'static str) -> Self {
        Self {
            name,
            key: TypeKey::of::<T>(),
            fallback: Fallback::Value(default_value::<T>),
        }
    }

    pub fn concrete<T: Clone + Default + Send + Sync + 'static>(name: &'static str) -> Self {
        Self {
            name,
            key: TypeKey::of::<T>(),
            fallback: Fallback::Concrete(default_value::<T>),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn kind(&self) -> ParamKind {
        match self.fallback {
            Fallback::Mock(_) => ParamKind::Capability,
            Fallback::Value(_) => ParamKind::Value,
            Fallback::Concrete(_) => ParamKind::Concrete,
        }
    }

    pub(crate) fn create_mock(&self, registry: &mut MockRegistry) -> Option<Result<ArgValue>> {
        match self.fallback {
            Fallback::Mock(create) => Some(create(registry, &self.key)),
            _ => None,
        }
    }

    pub(crate) fn default_value(&self) -> Option<ArgValue> {
        match self.fallback {
            Fallback::Value(default) | Fallback::Concrete(default) => Some(default()),
            Fallback::Mock(_) => None,
        }
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Param")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("kind", &self.kind())
            .finish()
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.key)
    }
}

fn create_mock_object<C: Capability + ?Sized>(
    registry: &mut MockRegistry,
    key: &TypeKey,
) -> Result<ArgValue> {
    let mock = registry.get_or_create_mock::<C>(key.name())?;
    Ok(Arc::new(mock.object()))
}

fn default_value<T: Default + Send + Sync + 'static>() -> ArgValue {
    Arc::new(T::default())
}

/// Ordered parameter types pinning down one constructor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature(Vec<TypeKey>);

impl Signature {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: ?Sized + 'static>(mut self) -> Self {
        self.0.push(TypeKey::of::<T>());
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn types(&self) -> &[TypeKey] {
        &self.0
    }

    /// Exact match on parameter types, in order and count. Mock names are ignored.
    pub fn matches(&self, params: &[Param]) -> bool {
        self.0.len() == params.len()
            && self
                .0
                .iter()
                .zip(params)
                .all(|(ty, param)| ty.type_id() == param.key().type_id())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, ty) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", ty)?;
        }
        write!(f, ")")
    }
}

/// Explicit constructor arguments supplied by a test.
///
/// Each argument fills the first still-unfilled parameter of the same type.
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<(TypeKey, ArgValue)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.values.push((TypeKey::of::<T>(), Arc::new(value)));
        self
    }

    pub fn object<C: Capability + ?Sized>(mut self, object: Arc<C>) -> Self {
        self.values.push((TypeKey::of::<C>(), Arc::new(object)));
        self
    }

    pub fn mock<C: Capability + ?Sized>(self, mock: &Mock<C>) -> Self {
        self.object(mock.object())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Types of the arguments, in order
    pub fn signature(&self) -> Signature {
        Signature(self.values.iter().map(|(key, _)| key.clone()).collect())
    }

    /// First argument not yet `used` whose type matches `param`
    pub(crate) fn find(&self, param: &Param, used: &[bool]) -> Option<(usize, ArgValue)> {
        self.values
            .iter()
            .enumerate()
            .find(|(i, (key, _))| {
                !used.get(*i).copied().unwrap_or(false) && key.type_id() == param.key().type_id()
            })
            .map(|(i, (_, value))| (i, Arc::clone(value)))
    }
}

/// Description of one constructor, as recorded in the history
#[derive(Debug, Clone)]
pub struct ConstructorInfo {
    name: &'static str,
    visibility: Visibility,
    params: Vec<Param>,
}

impl ConstructorInfo {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    pub fn signature(&self) -> Signature {
        Signature(self.params.iter().map(|p| p.key().unnamed()).collect())
    }
}

impl fmt::Display for ConstructorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")
    }
}

type InvokeFn<T> = Box<dyn Fn(&Args<'_>) -> Result<T>>;

/// A candidate constructor of `T`
pub struct Constructor<T> {
    info: ConstructorInfo,
    invoke: InvokeFn<T>,
}

impl<T: 'static> Constructor<T> {
    /// Start describing a public constructor
    pub fn new(name: &'static str) -> ConstructorBuilder<T> {
        ConstructorBuilder {
            info: ConstructorInfo {
                name,
                visibility: Visibility::Public,
                params: Vec::new(),
            },
            target: PhantomData,
        }
    }
}

impl<T> Constructor<T> {
    pub fn info(&self) -> &ConstructorInfo {
        &self.info
    }

    pub(crate) fn call(&self, args: &Args<'_>) -> Result<T> {
        (self.invoke)(args)
    }
}

impl<T> fmt::Debug for Constructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

pub struct ConstructorBuilder<T> {
    info: ConstructorInfo,
    target: PhantomData<fn() -> T>,
}

impl<T> ConstructorBuilder<T> {
    pub fn non_public(mut self) -> Self {
        self.info.visibility = Visibility::NonPublic;
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.info.params.push(param);
        self
    }

    pub fn capability<C: Capability + ?Sized>(self, name: &'static str) -> Self {
        self.param(Param::capability::<C>(name))
    }

    pub fn named_capability<C: Capability + ?Sized>(
        self,
        name: &'static str,
        mock_name: &str,
    ) -> Self {
        self.param(Param::named_capability::<C>(name, mock_name))
    }

    pub fn value<V: Clone + Default + Send + Sync + 'static>(self, name: &'static str) -> Self {
        self.param(Param::value::<V>(name))
    }

    pub fn concrete<V: Clone + Default + Send + Sync + 'static>(self, name: &'static str) -> Self {
        self.param(Param::concrete::<V>(name))
    }

    pub fn invoke(self, invoke: impl Fn(&Args<'_>) -> Result<T> + 'static) -> Constructor<T> {
        Constructor {
            info: self.info,
            invoke: Box::new(invoke),
        }
    }
}

/// Resolved arguments handed to a constructor's invoke function
pub struct Args<'a> {
    type_name: &'static str,
    records: &'a [ArgumentRecord],
}

impl<'a> Args<'a> {
    pub(crate) fn new(type_name: &'static str, records: &'a [ArgumentRecord]) -> Self {
        Self { type_name, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Capability object at `index`
    pub fn object<C: Capability + ?Sized>(&self, index: usize) -> Result<Arc<C>> {
        self.record(index)?
            .object::<C>()
            .ok_or_else(|| self.mismatch(index, std::any::type_name::<C>()))
    }

    /// Value at `index`
    pub fn value<V: Clone + 'static>(&self, index: usize) -> Result<V> {
        self.record(index)?
            .value::<V>()
            .ok_or_else(|| self.mismatch(index, std::any::type_name::<V>()))
    }

    fn record(&self, index: usize) -> Result<&'a ArgumentRecord> {
        self.records.get(index).ok_or_else(|| MockerError::ConstructionFailed {
            type_name: self.type_name.to_string(),
            reason: format!("missing argument {}", index),
        })
    }

    fn mismatch(&self, index: usize, expected: &str) -> MockerError {
        MockerError::ConstructionFailed {
            type_name: self.type_name.to_string(),
            reason: format!("argument {} is not a {}", index, expected),
        }
    }
}
