use tracing::{debug, instrument, warn};

use super::capability::TypeKey;
use super::constructor::{
    Args, Arguments, Constructible, Constructor, ConstructorInfo, Param, ParamKind, Signature,
    Visibility,
};
use super::history::{ArgumentRecord, ArgumentSource, ConstructorModel};
use super::mocker::Mocker;
use super::registry::EntryOrigin;
use crate::errors::{MockerError, Result};

/// Picks a constructor for a type and resolves its arguments.
///
/// Selection:
/// 1. with an explicit signature, the single constructor whose parameter types
///    match it exactly;
/// 2. otherwise the constructor with the most parameters, all resolvable;
/// 3. ties go to the constructor declared first.
pub struct ConstructorSelector;

impl ConstructorSelector {
    #[instrument(skip_all, fields(target = std::any::type_name::<T>()))]
    pub fn resolve<T: Constructible>(
        mocker: &mut Mocker,
        signature: Option<&Signature>,
        explicit: &Arguments,
    ) -> Result<(ConstructorModel, T)> {
        let target = TypeKey::of::<T>();
        let include_non_public = mocker.options.non_public_constructors;
        let candidates: Vec<Constructor<T>> = T::constructors()
            .into_iter()
            .filter(|c| include_non_public || c.info().visibility() == Visibility::Public)
            .collect();

        let index = match signature {
            Some(signature) => Self::select_exact(&target, &candidates, signature)?,
            None => Self::select_best(mocker, &target, &candidates, explicit)?,
        };
        let constructor = &candidates[index];
        debug!(constructor = %constructor.info(), "Selected constructor");

        let arguments = Self::resolve_arguments(mocker, &target, constructor.info(), explicit)?;
        let instance = constructor.call(&Args::new(target.type_name(), &arguments))?;

        let model = ConstructorModel::new(constructor.info().clone(), arguments);
        mocker.history.record(target, model.clone());
        Ok((model, instance))
    }

    fn select_exact<T>(
        target: &TypeKey,
        candidates: &[Constructor<T>],
        signature: &Signature,
    ) -> Result<usize> {
        let matching: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| signature.matches(c.info().params()))
            .map(|(i, _)| i)
            .collect();

        match matching.as_slice() {
            [index] => Ok(*index),
            [] => Err(MockerError::AmbiguousConstructor {
                type_name: target.to_string(),
                reason: format!("no constructor matches {}", signature),
            }),
            many => Err(MockerError::AmbiguousConstructor {
                type_name: target.to_string(),
                reason: format!("{} constructors match {}", many.len(), signature),
            }),
        }
    }

    fn select_best<T>(
        mocker: &Mocker,
        target: &TypeKey,
        candidates: &[Constructor<T>],
        explicit: &Arguments,
    ) -> Result<usize> {
        let mut best: Option<usize> = None;
        let mut blocked = Vec::new();

        for (index, candidate) in candidates.iter().enumerate() {
            let info = candidate.info();
            let mut used = vec![false; explicit.len()];
            match info
                .params()
                .iter()
                .find(|param| !Self::can_resolve(mocker, param, explicit, &mut used))
            {
                Some(param) => {
                    debug!(constructor = %info, parameter = param.name(), "Constructor not resolvable");
                    blocked.push(format!("{} needs '{}' ({})", info, param.name(), param.key()));
                }
                None => {
                    let better = best.map_or(true, |current| {
                        info.param_count() > candidates[current].info().param_count()
                    });
                    if better {
                        best = Some(index);
                    }
                }
            }
        }

        best.ok_or_else(|| {
            if candidates.is_empty() {
                blocked.push("no constructors declared".to_string());
            }
            MockerError::NoResolvableConstructor {
                type_name: target.to_string(),
                blocked,
            }
        })
    }

    /// Whether `param` could be filled, without creating anything.
    ///
    /// An explicit argument that would fill `param` is marked in `used`, so
    /// each one counts for a single parameter of the candidate.
    fn can_resolve(mocker: &Mocker, param: &Param, explicit: &Arguments, used: &mut [bool]) -> bool {
        if let Some((index, _)) = explicit.find(param, used) {
            used[index] = true;
            return true;
        }
        if mocker.registry.contains(param.key()) {
            return true;
        }
        if mocker
            .models
            .get(&param.key().unnamed())
            .is_some_and(|model| model.has_factory())
        {
            return true;
        }
        match param.kind() {
            ParamKind::Capability | ParamKind::Concrete => true,
            ParamKind::Value => mocker.options.default_values,
        }
    }

    fn resolve_arguments(
        mocker: &mut Mocker,
        target: &TypeKey,
        constructor: &ConstructorInfo,
        explicit: &Arguments,
    ) -> Result<Vec<ArgumentRecord>> {
        let mut used = vec![false; explicit.len()];
        let mut arguments = Vec::with_capacity(constructor.param_count());

        for param in constructor.params() {
            let record = Self::resolve_argument(mocker, target, param, explicit, &mut used)?;
            debug!(
                parameter = param.name(),
                source = ?record.source(),
                "Resolved argument"
            );
            arguments.push(record);
        }

        let unused = used.iter().filter(|used| !**used).count();
        if unused > 0 {
            warn!(
                constructor = %constructor,
                unused,
                "Explicit arguments did not match any parameter"
            );
        }
        Ok(arguments)
    }

    fn resolve_argument(
        mocker: &mut Mocker,
        target: &TypeKey,
        param: &Param,
        explicit: &Arguments,
        used: &mut [bool],
    ) -> Result<ArgumentRecord> {
        let record = |source, value| ArgumentRecord::new(param.name(), param.key().clone(), source, value);

        if let Some((index, value)) = explicit.find(param, used) {
            used[index] = true;
            return Ok(record(ArgumentSource::Explicit, value));
        }

        if let Some((value, origin)) = mocker.registry.lookup(param.key()) {
            let source = match origin {
                EntryOrigin::AutoMock => ArgumentSource::AutoMock,
                EntryOrigin::CustomMock => ArgumentSource::CustomMock,
                EntryOrigin::Instance => ArgumentSource::Instance,
                EntryOrigin::Value => ArgumentSource::Value,
            };
            return Ok(record(source, value.clone()));
        }

        if let Some(value) = mocker.produce(&param.key().unnamed())? {
            return Ok(record(ArgumentSource::Factory, value));
        }

        match param.kind() {
            ParamKind::Capability => {
                let created = param
                    .create_mock(&mut mocker.registry)
                    .ok_or_else(|| unresolvable(target, param))??;
                Ok(record(ArgumentSource::AutoMock, created))
            }
            ParamKind::Value if mocker.options.default_values => {
                let value = param
                    .default_value()
                    .ok_or_else(|| unresolvable(target, param))?;
                Ok(record(ArgumentSource::DefaultValue, value))
            }
            ParamKind::Value => Err(unresolvable(target, param)),
            ParamKind::Concrete => {
                let value = param
                    .default_value()
                    .ok_or_else(|| unresolvable(target, param))?;
                Ok(record(ArgumentSource::Constructed, value))
            }
        }
    }
}

fn unresolvable(target: &TypeKey, param: &Param) -> MockerError {
    MockerError::UnresolvableParameter {
        type_name: target.to_string(),
        parameter: param.name().to_string(),
        parameter_type: param.key().to_string(),
    }
}
