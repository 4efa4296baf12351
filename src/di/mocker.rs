use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::capability::{ArgValue, Capability, Mock, TypeKey};
use super::constructor::{Arguments, Constructible, Signature};
use super::history::ConstructionHistory;
use super::instance::{InstanceModel, Lifetime};
use super::registry::MockRegistry;
use super::selector::ConstructorSelector;
use crate::config::MockerOptions;
use crate::errors::{MockerError, Result};

/// Progress of a fixture. Only moves forward until [`Mocker::reset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum FixtureState {
    #[default]
    Unconfigured,
    /// Mocks, values or factories have been registered
    Configured,
    /// At least one instance has been built
    Constructed,
}

/// Builds types under test, mocking every dependency nothing else provides.
///
/// One `Mocker` belongs to one test fixture; it owns the mock registry and the
/// construction history for that fixture.
///
/// # Example
///
/// ```rust
/// use automocker::{capability, Constructible, Constructor, Mocker};
/// use std::sync::Arc;
///
/// pub trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// #[derive(Default)]
/// pub struct FixedClock;
///
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 {
///         7
///     }
/// }
///
/// capability!(dyn Clock => FixedClock);
///
/// struct Scheduler {
///     clock: Arc<dyn Clock>,
/// }
///
/// impl Constructible for Scheduler {
///     fn constructors() -> Vec<Constructor<Self>> {
///         vec![Constructor::new("new")
///             .capability::<dyn Clock>("clock")
///             .invoke(|args| Ok(Scheduler { clock: args.object(0)? }))]
///     }
/// }
///
/// let mut mocker = Mocker::new();
/// let scheduler = mocker.create_instance::<Scheduler>().unwrap();
/// assert_eq!(scheduler.clock.now(), 7);
///
/// let clock = mocker.get_mock::<dyn Clock>().unwrap();
/// assert!(clock.is_object(&scheduler.clock));
/// ```
#[derive(Debug, Default)]
pub struct Mocker {
    pub(super) options: MockerOptions,
    pub(super) registry: MockRegistry,
    pub(super) models: FxHashMap<TypeKey, InstanceModel>,
    pub(super) history: ConstructionHistory,
    state: FixtureState,
    resolving: Vec<TypeKey>,
}

impl Mocker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: MockerOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &MockerOptions {
        &self.options
    }

    pub fn registry(&self) -> &MockRegistry {
        &self.registry
    }

    pub fn history(&self) -> &ConstructionHistory {
        &self.history
    }

    pub fn state(&self) -> FixtureState {
        self.state
    }

    /// Instance model registered for `T`
    pub fn model<T: 'static>(&self) -> Option<&InstanceModel> {
        self.models.get(&TypeKey::of::<T>())
    }

    /// Build `T`, mocking every dependency nothing else provides
    pub fn create_instance<T: Constructible>(&mut self) -> Result<T> {
        self.construct::<T>(None, None)
    }

    /// Build `T`, passing `arguments` to the parameters of matching types
    pub fn create_instance_with<T: Constructible>(&mut self, arguments: Arguments) -> Result<T> {
        self.construct::<T>(None, Some(arguments))
    }

    /// Build `T` through the constructor whose parameter types are exactly `signature`
    pub fn create_instance_with_signature<T: Constructible>(
        &mut self,
        signature: Signature,
    ) -> Result<T> {
        self.construct::<T>(Some(signature), None)
    }

    pub fn get_mock<C: Capability + ?Sized>(&mut self) -> Result<Mock<C>> {
        let mock = self.registry.get_or_create_mock::<C>(None)?;
        self.configured();
        Ok(mock)
    }

    pub fn get_named_mock<C: Capability + ?Sized>(&mut self, name: &str) -> Result<Mock<C>> {
        let mock = self.registry.get_or_create_mock::<C>(Some(name))?;
        self.configured();
        Ok(mock)
    }

    /// Object registered for `C`, or the object of a newly created mock
    pub fn get_object<C: Capability + ?Sized>(&mut self) -> Result<Arc<C>> {
        if let Some(object) = self.registry.object::<C>(None) {
            return Ok(object);
        }
        self.get_mock::<C>().map(|mock| mock.object())
    }

    /// Object registered for `C`; fails instead of creating a mock
    pub fn get_required_object<C: Capability + ?Sized>(&self) -> Result<Arc<C>> {
        self.registry
            .object::<C>(None)
            .ok_or_else(MockerError::not_found::<C>)
    }

    pub fn get_value<T: Clone + 'static>(&self) -> Option<T> {
        self.registry.value::<T>()
    }

    pub fn get_required_value<T: Clone + 'static>(&self) -> Result<T> {
        self.get_value::<T>().ok_or_else(MockerError::not_found::<T>)
    }

    /// Use `mock` for `C` instead of an auto-created one
    pub fn add_custom_mock<C: Capability + ?Sized>(&mut self, mock: C::Mock) -> Result<Mock<C>> {
        let mock = self.registry.add_custom_mock::<C>(mock, None)?;
        self.configured();
        Ok(mock)
    }

    pub fn add_named_custom_mock<C: Capability + ?Sized>(
        &mut self,
        name: &str,
        mock: C::Mock,
    ) -> Result<Mock<C>> {
        let mock = self.registry.add_custom_mock::<C>(mock, Some(name))?;
        self.configured();
        Ok(mock)
    }

    /// Use a real implementation for `C`
    pub fn use_instance<C: Capability + ?Sized>(&mut self, instance: Arc<C>) {
        self.registry.use_instance::<C>(instance);
        self.configured();
    }

    /// Use `value` for every parameter of type `T`
    pub fn use_value<T: Send + Sync + 'static>(&mut self, value: T) {
        self.registry.use_value(value);
        self.configured();
    }

    /// Let the mock for `C` also serve requests for `D`
    pub fn combine<C, D>(&mut self) -> Result<Mock<C>>
    where
        C: Capability + ?Sized,
        D: Capability<Mock = C::Mock> + ?Sized,
    {
        let mock = self.registry.combine::<C, D>()?;
        self.configured();
        Ok(mock)
    }

    /// Produce `T` with `factory` instead of resolving a constructor
    pub fn add_type<T: Send + Sync + 'static>(
        &mut self,
        factory: impl Fn(&mut Mocker) -> Result<T> + Send + Sync + 'static,
    ) -> Result<()> {
        self.model_mut::<T>().set_factory(factory)?;
        self.configured();
        Ok(())
    }

    pub fn add_type_with_lifetime<T: Clone + Send + Sync + 'static>(
        &mut self,
        factory: impl Fn(&mut Mocker) -> Result<T> + Send + Sync + 'static,
        lifetime: Lifetime,
    ) -> Result<()> {
        self.add_type(factory)?;
        if lifetime == Lifetime::Singleton {
            self.model_mut::<T>().set_singleton::<T>();
        }
        Ok(())
    }

    /// Arguments used whenever `T` is created without explicit ones
    pub fn set_arguments<T: 'static>(&mut self, arguments: Arguments) -> Result<()> {
        self.model_mut::<T>().set_arguments(arguments)?;
        self.configured();
        Ok(())
    }

    /// Tear the fixture down: forget every mock, model and recorded construction
    pub fn reset(&mut self) {
        debug!(
            entries = self.registry.len(),
            constructions = self.history.construction_count(),
            "Resetting mocker"
        );
        self.registry.clear();
        self.models.clear();
        self.history.clear();
        self.resolving.clear();
        self.state = FixtureState::Unconfigured;
    }

    /// Run the factory registered for `key`, if any
    pub(super) fn produce(&mut self, key: &TypeKey) -> Result<Option<ArgValue>> {
        let Some(model) = self.models.get(key) else {
            return Ok(None);
        };
        let Some(create) = model.create_func() else {
            return Ok(None);
        };
        let singleton = model.lifetime() == Lifetime::Singleton;

        self.enter(key)?;
        let produced = create(self);
        self.resolving.pop();

        let value: ArgValue = Arc::from(produced?);
        if singleton {
            self.registry.insert_value(key.clone(), Arc::clone(&value));
        }
        self.seal(key);
        Ok(Some(value))
    }

    #[instrument(skip(self, signature, arguments), fields(target = std::any::type_name::<T>()))]
    fn construct<T: Constructible>(
        &mut self,
        signature: Option<Signature>,
        arguments: Option<Arguments>,
    ) -> Result<T> {
        let key = TypeKey::of::<T>();
        self.enter(&key)?;
        let result = self.construct_entered::<T>(&key, signature, arguments);
        self.resolving.pop();

        if result.is_ok() {
            self.seal(&key);
            self.state = FixtureState::Constructed;
        }
        result
    }

    fn construct_entered<T: Constructible>(
        &mut self,
        key: &TypeKey,
        signature: Option<Signature>,
        arguments: Option<Arguments>,
    ) -> Result<T> {
        let model = self.models.get(key).cloned();
        if let Some(model) = &model {
            if model.has_factory() {
                debug!(target_type = %key, "Creating instance from factory");
                return self.create_from_factory::<T>(key, model);
            }
        }

        let arguments = arguments
            .or_else(|| model.and_then(|model| model.arguments().cloned()))
            .unwrap_or_default();
        let (_, instance) = ConstructorSelector::resolve::<T>(self, signature.as_ref(), &arguments)?;
        Ok(instance)
    }

    fn create_from_factory<T: 'static>(&mut self, key: &TypeKey, model: &InstanceModel) -> Result<T> {
        let share = match model.lifetime() {
            Lifetime::Singleton => model.share(),
            Lifetime::Transient => None,
        };

        if let Some(share) = share {
            if let Some(cached) = self.registry.lookup(key).and_then(|(value, _)| share(value)) {
                return downcast::<T>(cached);
            }
        }

        let create = model
            .create_func()
            .ok_or_else(|| MockerError::construction::<T>("no factory registered"))?;
        let produced = create(self)?;

        match share {
            Some(share) => {
                let value: ArgValue = Arc::from(produced);
                self.registry.insert_value(key.clone(), Arc::clone(&value));
                let owned = share(&value)
                    .ok_or_else(|| MockerError::construction::<T>("factory produced another type"))?;
                downcast::<T>(owned)
            }
            None => downcast::<T>(produced),
        }
    }

    fn enter(&mut self, key: &TypeKey) -> Result<()> {
        if self.resolving.contains(key) {
            let mut chain: Vec<String> = self.resolving.iter().map(ToString::to_string).collect();
            chain.push(key.to_string());
            return Err(MockerError::CircularDependency(chain.join(" -> ")));
        }
        self.resolving.push(key.clone());
        Ok(())
    }

    fn seal(&mut self, key: &TypeKey) {
        if let Some(model) = self.models.get_mut(key) {
            model.seal();
        }
    }

    fn configured(&mut self) {
        if self.state == FixtureState::Unconfigured {
            self.state = FixtureState::Configured;
        }
    }

    fn model_mut<T: 'static>(&mut self) -> &mut InstanceModel {
        let key = TypeKey::of::<T>();
        self.models
            .entry(key.clone())
            .or_insert_with(|| InstanceModel::new(key))
    }
}

fn downcast<T: 'static>(value: Box<dyn std::any::Any + Send + Sync>) -> Result<T> {
    value
        .downcast::<T>()
        .map(|value| *value)
        .map_err(|_| MockerError::construction::<T>("factory produced another type"))
}
