use std::any::Any;
use std::sync::Arc;

use super::capability::{ArgValue, TypeKey};
use super::constructor::Arguments;
use super::mocker::Mocker;
use crate::errors::{MockerError, Result};

/// Lifetime of values produced by a registered factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifetime {
    /// Run the factory for every request
    #[default]
    Transient,
    /// Run the factory once and reuse the value for the rest of the fixture
    Singleton,
}

pub(crate) type CreateFunc =
    Arc<dyn Fn(&mut Mocker) -> Result<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// Clones a cached singleton back into an owned value
pub(crate) type ShareFunc = fn(&ArgValue) -> Option<Box<dyn Any + Send + Sync>>;

/// How to produce an instance of one type
#[derive(Clone)]
pub struct InstanceModel {
    instance_type: TypeKey,
    create_func: Option<CreateFunc>,
    share: Option<ShareFunc>,
    arguments: Option<Arguments>,
    lifetime: Lifetime,
    sealed: bool,
}

impl InstanceModel {
    pub fn new(instance_type: TypeKey) -> Self {
        Self {
            instance_type,
            create_func: None,
            share: None,
            arguments: None,
            lifetime: Lifetime::Transient,
            sealed: false,
        }
    }

    pub fn instance_type(&self) -> &TypeKey {
        &self.instance_type
    }

    pub fn has_factory(&self) -> bool {
        self.create_func.is_some()
    }

    pub fn arguments(&self) -> Option<&Arguments> {
        self.arguments.as_ref()
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    /// Whether an instance has already been built from this model
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub(crate) fn set_factory<T: Send + Sync + 'static>(
        &mut self,
        factory: impl Fn(&mut Mocker) -> Result<T> + Send + Sync + 'static,
    ) -> Result<()> {
        self.ensure_unsealed()?;
        self.create_func = Some(Arc::new(move |mocker: &mut Mocker| {
            factory(mocker).map(|value| Box::new(value) as Box<dyn Any + Send + Sync>)
        }));
        self.lifetime = Lifetime::Transient;
        self.share = None;
        Ok(())
    }

    pub(crate) fn set_singleton<T: Clone + Send + Sync + 'static>(&mut self) {
        self.lifetime = Lifetime::Singleton;
        self.share = Some(share_value::<T>);
    }

    pub(crate) fn set_arguments(&mut self, arguments: Arguments) -> Result<()> {
        self.ensure_unsealed()?;
        self.arguments = Some(arguments);
        Ok(())
    }

    pub(crate) fn create_func(&self) -> Option<CreateFunc> {
        self.create_func.clone()
    }

    pub(crate) fn share(&self) -> Option<ShareFunc> {
        self.share
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }

    fn ensure_unsealed(&self) -> Result<()> {
        if self.sealed {
            return Err(MockerError::invalid(format!(
                "{} has already been constructed; its instance model can no longer change",
                self.instance_type
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for InstanceModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceModel")
            .field("instance_type", &self.instance_type)
            .field("has_factory", &self.create_func.is_some())
            .field("arguments", &self.arguments.as_ref().map(Arguments::len))
            .field("lifetime", &self.lifetime)
            .field("sealed", &self.sealed)
            .finish()
    }
}

fn share_value<T: Clone + Send + Sync + 'static>(
    value: &ArgValue,
) -> Option<Box<dyn Any + Send + Sync>> {
    value
        .downcast_ref::<T>()
        .map(|value| Box::new(value.clone()) as Box<dyn Any + Send + Sync>)
}
