use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// Type-erased value shared between the registry, resolved arguments and the
/// construction history.
pub type ArgValue = Arc<dyn Any + Send + Sync>;

/// Identity of a requested type, optionally scoped by a mock name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeKey {
    type_id: TypeId,
    type_name: &'static str,
    name: Option<String>,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            name: None,
        }
    }

    pub fn named<T: ?Sized + 'static>(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::of::<T>()
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The same type without its mock name
    pub fn unnamed(&self) -> Self {
        Self {
            type_id: self.type_id,
            type_name: self.type_name,
            name: None,
        }
    }

    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}[{}]", self.type_name, name),
            None => write!(f, "{}", self.type_name),
        }
    }
}

/// A trait-object type that the registry knows how to mock.
///
/// Implemented on `dyn Trait`, usually through [`capability!`](crate::capability).
/// The trait must have `Send + Sync` as supertraits.
pub trait Capability: Send + Sync + 'static {
    /// Mock created when nothing else is registered for this capability
    type Mock: Default + Send + Sync + 'static;

    /// View a mock as the capability it stands in for
    fn upcast(mock: Arc<Self::Mock>) -> Arc<Self>;
}

/// Declare which mock type backs a capability trait.
///
/// ```rust
/// use automocker::capability;
///
/// pub trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// #[derive(Default)]
/// pub struct MockClock;
///
/// impl Clock for MockClock {
///     fn now(&self) -> u64 {
///         0
///     }
/// }
///
/// capability!(dyn Clock => MockClock);
/// ```
#[macro_export]
macro_rules! capability {
    ($(dyn $capability:path => $mock:ty),+ $(,)?) => {
        $(
            impl $crate::Capability for dyn $capability {
                type Mock = $mock;

                fn upcast(mock: ::std::sync::Arc<$mock>) -> ::std::sync::Arc<Self> {
                    mock
                }
            }
        )+
    };
}

/// Handle to a registered mock: the concrete double plus the object injected
/// into constructors.
pub struct Mock<C: Capability + ?Sized> {
    key: TypeKey,
    handle: Arc<C::Mock>,
    object: Arc<C>,
}

impl<C: Capability + ?Sized> Mock<C> {
    pub(crate) fn new(key: TypeKey, handle: Arc<C::Mock>, object: Arc<C>) -> Self {
        Self {
            key,
            handle,
            object,
        }
    }

    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// The concrete mock, for configuring and inspecting calls
    pub fn handle(&self) -> &Arc<C::Mock> {
        &self.handle
    }

    /// The capability view of the mock, as passed to constructors
    pub fn object(&self) -> Arc<C> {
        Arc::clone(&self.object)
    }

    /// Reference equality of the underlying mocks
    pub fn ptr_eq(&self, other: &Mock<C>) -> bool {
        Arc::ptr_eq(&self.handle, &other.handle)
    }

    /// Whether `object` is this mock's object
    pub fn is_object(&self, object: &Arc<C>) -> bool {
        Arc::ptr_eq(&self.object, object)
    }
}

impl<C: Capability + ?Sized> Clone for Mock<C> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            handle: Arc::clone(&self.handle),
            object: Arc::clone(&self.object),
        }
    }
}

impl<C: Capability + ?Sized> std::ops::Deref for Mock<C> {
    type Target = C::Mock;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<C: Capability + ?Sized> fmt::Debug for Mock<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mock")
            .field("key", &self.key)
            .field("mock", &std::any::type_name::<C::Mock>())
            .finish()
    }
}
