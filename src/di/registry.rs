use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use super::capability::{ArgValue, Capability, Mock, TypeKey};
use crate::errors::{MockerError, Result};

/// How a registry entry came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrigin {
    /// Created on demand with the capability's default mock
    AutoMock,
    /// Supplied by the test before construction
    CustomMock,
    /// A real implementation registered for a capability
    Instance,
    /// A plain value registered for a value or concrete type
    Value,
}

/// Views a mock handle as an alias capability's object
type RebindFn = fn(&ArgValue) -> Option<ArgValue>;

/// Another capability served by an entry's mock
#[derive(Clone)]
struct Alias {
    key: TypeKey,
    object: ArgValue,
    rebind: RebindFn,
}

impl std::fmt::Debug for Alias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Alias").field("key", &self.key).finish_non_exhaustive()
    }
}

/// One registered mock, instance or value
#[derive(Debug, Clone)]
pub struct MockEntry {
    key: TypeKey,
    origin: EntryOrigin,
    object: ArgValue,
    handle: Option<ArgValue>,
    aliases: Vec<Alias>,
}

impl MockEntry {
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    pub fn origin(&self) -> EntryOrigin {
        self.origin
    }

    pub fn is_mock(&self) -> bool {
        self.handle.is_some()
    }

    /// Other types this entry answers for, in the order they were combined
    pub fn aliases(&self) -> impl Iterator<Item = &TypeKey> {
        self.aliases.iter().map(|alias| &alias.key)
    }

    fn provides(&self, key: &TypeKey) -> Option<&ArgValue> {
        if &self.key == key {
            return Some(&self.object);
        }
        self.aliases
            .iter()
            .find(|alias| &alias.key == key)
            .map(|alias| &alias.object)
    }
}

/// Registry of mocks and values for one fixture.
///
/// Entries keep their registration order. Lookups try exact key matches first,
/// then entries combined to also answer for the key, in registration order.
#[derive(Debug, Default)]
pub struct MockRegistry {
    entries: Vec<MockEntry>,
    exact: FxHashMap<TypeKey, usize>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[MockEntry] {
        &self.entries
    }

    pub fn contains(&self, key: &TypeKey) -> bool {
        self.position(key).is_some()
    }

    /// Position of the first entry answering for `key`.
    ///
    /// Returns `Ok(None)` when nothing matches, or `NotFound` if
    /// `throw_if_missing` is set.
    pub fn index_of(&self, key: &TypeKey, throw_if_missing: bool) -> Result<Option<usize>> {
        match self.position(key) {
            Some(index) => Ok(Some(index)),
            None if throw_if_missing => Err(MockerError::not_found_key(key)),
            None => Ok(None),
        }
    }

    /// Return the mock registered for `C` (and `name`), creating it on first use.
    pub fn get_or_create_mock<C: Capability + ?Sized>(
        &mut self,
        name: Option<&str>,
    ) -> Result<Mock<C>> {
        let key = capability_key::<C>(name)?;
        if let Some(index) = self.position(&key) {
            return self.mock_at::<C>(index, &key);
        }

        let handle = Arc::new(C::Mock::default());
        let object = C::upcast(Arc::clone(&handle));
        debug!(capability = %key, mock = std::any::type_name::<C::Mock>(), "Created mock");
        self.insert(MockEntry {
            key: key.clone(),
            origin: EntryOrigin::AutoMock,
            object: Arc::new(Arc::clone(&object)),
            handle: Some(handle.clone()),
            aliases: Vec::new(),
        });
        Ok(Mock::new(key, handle, object))
    }

    /// Seed the registry with a hand-built mock for `C`.
    ///
    /// Replaces whatever was registered under the same key. Capabilities
    /// combined into the replaced mock are served by the new one.
    pub fn add_custom_mock<C: Capability + ?Sized>(
        &mut self,
        mock: C::Mock,
        name: Option<&str>,
    ) -> Result<Mock<C>> {
        let key = capability_key::<C>(name)?;
        let handle = Arc::new(mock);
        let object = C::upcast(Arc::clone(&handle));
        self.insert(MockEntry {
            key: key.clone(),
            origin: EntryOrigin::CustomMock,
            object: Arc::new(Arc::clone(&object)),
            handle: Some(handle.clone()),
            aliases: Vec::new(),
        });
        Ok(Mock::new(key, handle, object))
    }

    /// Register a real implementation for `C`
    pub fn use_instance<C: Capability + ?Sized>(&mut self, instance: Arc<C>) {
        self.insert(MockEntry {
            key: TypeKey::of::<C>(),
            origin: EntryOrigin::Instance,
            object: Arc::new(instance),
            handle: None,
            aliases: Vec::new(),
        });
    }

    /// Register a value for parameters of type `T`
    pub fn use_value<T: Send + Sync + 'static>(&mut self, value: T) {
        self.insert_value(TypeKey::of::<T>(), Arc::new(value));
    }

    pub(crate) fn insert_value(&mut self, key: TypeKey, value: ArgValue) {
        self.insert(MockEntry {
            key,
            origin: EntryOrigin::Value,
            object: value,
            handle: None,
            aliases: Vec::new(),
        });
    }

    /// Let the mock for `C` also answer requests for `D`.
    pub fn combine<C, D>(&mut self) -> Result<Mock<C>>
    where
        C: Capability + ?Sized,
        D: Capability<Mock = C::Mock> + ?Sized,
    {
        let alias = TypeKey::of::<D>();
        if alias.is::<C>() {
            return Err(MockerError::invalid(format!(
                "cannot combine {} with itself",
                alias
            )));
        }

        let mock = self.get_or_create_mock::<C>(None)?;
        let index = self
            .position(mock.key())
            .ok_or_else(|| MockerError::not_found_key(mock.key()))?;
        let entry = &mut self.entries[index];
        if entry.provides(&alias).is_none() {
            let object = D::upcast(Arc::clone(mock.handle()));
            debug!(capability = %mock.key(), alias = %alias, "Combined mock");
            entry.aliases.push(Alias {
                key: alias,
                object: Arc::new(object),
                rebind: rebind::<D>,
            });
        }
        Ok(mock)
    }

    /// Object registered for `key` (exact match first, then aliases)
    pub fn lookup(&self, key: &TypeKey) -> Option<(&ArgValue, EntryOrigin)> {
        let index = self.position(key)?;
        let entry = &self.entries[index];
        entry.provides(key).map(|object| (object, entry.origin))
    }

    /// Capability object registered for `C`, without creating anything
    pub fn object<C: Capability + ?Sized>(&self, name: Option<&str>) -> Option<Arc<C>> {
        let key = match name {
            Some(name) => TypeKey::named::<C>(name),
            None => TypeKey::of::<C>(),
        };
        self.lookup(&key)
            .and_then(|(object, _)| object.downcast_ref::<Arc<C>>().cloned())
    }

    /// Value registered for `T`
    pub fn value<T: Clone + 'static>(&self) -> Option<T> {
        self.lookup(&TypeKey::of::<T>())
            .and_then(|(value, _)| value.downcast_ref::<T>().cloned())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.exact.clear();
    }

    fn position(&self, key: &TypeKey) -> Option<usize> {
        if let Some(&index) = self.exact.get(key) {
            return Some(index);
        }
        self.entries
            .iter()
            .position(|entry| entry.aliases.iter().any(|alias| &alias.key == key))
    }

    fn mock_at<C: Capability + ?Sized>(&self, index: usize, key: &TypeKey) -> Result<Mock<C>> {
        let entry = &self.entries[index];
        let handle = entry
            .handle
            .clone()
            .and_then(|handle| handle.downcast::<C::Mock>().ok())
            .ok_or_else(|| {
                MockerError::invalid(format!(
                    "{} is registered as {:?}, not as a mock",
                    key, entry.origin
                ))
            })?;
        let object = entry
            .provides(key)
            .and_then(|object| object.downcast_ref::<Arc<C>>().cloned())
            .ok_or_else(|| MockerError::not_found_key(key))?;
        Ok(Mock::new(key.clone(), handle, object))
    }

    fn insert(&mut self, mut entry: MockEntry) {
        match self.exact.get(&entry.key) {
            Some(&index) => {
                let previous = &self.entries[index];
                entry.aliases = carry_aliases(previous, &entry);
                if previous.origin == EntryOrigin::AutoMock && entry.origin != EntryOrigin::AutoMock
                {
                    warn!(
                        key = %entry.key,
                        "Replacing auto-created mock; instances built earlier keep the old one"
                    );
                }
                self.entries[index] = entry;
            }
            None => {
                debug!(key = %entry.key, origin = ?entry.origin, "Registered entry");
                self.exact.insert(entry.key.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }
}

/// Re-attach the aliases of `previous` to the mock of its replacement
fn carry_aliases(previous: &MockEntry, replacement: &MockEntry) -> Vec<Alias> {
    let mut aliases = Vec::with_capacity(previous.aliases.len());
    for alias in &previous.aliases {
        match replacement.handle.as_ref().and_then(|handle| (alias.rebind)(handle)) {
            Some(object) => aliases.push(Alias {
                key: alias.key.clone(),
                object,
                rebind: alias.rebind,
            }),
            None => warn!(
                key = %replacement.key,
                alias = %alias.key,
                "Replacement cannot serve combined capability; alias dropped"
            ),
        }
    }
    aliases
}

fn rebind<D: Capability + ?Sized>(handle: &ArgValue) -> Option<ArgValue> {
    let mock = Arc::clone(handle).downcast::<D::Mock>().ok()?;
    Some(Arc::new(D::upcast(mock)))
}

fn capability_key<C: Capability + ?Sized>(name: Option<&str>) -> Result<TypeKey> {
    match name {
        Some("") => Err(MockerError::invalid(format!(
            "mock name for {} must not be empty",
            std::any::type_name::<C>()
        ))),
        Some(name) => Ok(TypeKey::named::<C>(name)),
        None => Ok(TypeKey::of::<C>()),
    }
}
