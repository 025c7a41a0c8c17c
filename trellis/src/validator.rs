//! Static checks of the registration graph

use crate::{
    Contract, Lifetime,
    error::Error,
    registry::{Registration, Registry}
};
use std::{any::TypeId, collections::HashSet};

/// Full check: every registration, in registration order
pub(crate) fn validate(registry: &Registry) -> Result<(), Error> {
    let mut walker = Walker::new(registry, Mode::Full);
    registry
        .ordered()
        .into_iter()
        .try_for_each(|registration| walker.visit(registration))
}

/// Captive dependency check of every singleton, in registration order
pub(crate) fn validate_captive(registry: &Registry) -> Result<(), Error> {
    let mut walker = Walker::new(registry, Mode::Captive);
    registry
        .ordered()
        .into_iter()
        .filter(|registration| registration.lifetime() == Lifetime::Singleton)
        .try_for_each(|registration| walker.visit(registration))
}

/// Check run once before the first construction of a singleton.
///
/// Rejects captive dependencies and cycles so that construction never
/// waits for an initialization guard it already holds.
pub(crate) fn check_singleton(registry: &Registry, registration: &Registration) -> Result<(), Error> {
    Walker::new(registry, Mode::Singleton).visit(registration)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Any unresolvable dependency is an error
    Full,
    /// Cycles and captive dependencies only; missing dependencies are left to the resolver
    Singleton,
    /// Captive dependencies only
    Captive,
}

/// Depth-first walk over declared signatures
struct Walker<'a> {
    registry: &'a Registry,
    mode: Mode,
    path: Vec<(Contract, Lifetime)>,
    /// Contracts whose closure is known to be sound, with or without a singleton above them
    done: HashSet<(TypeId, bool)>
}

impl<'a> Walker<'a> {
    fn new(registry: &'a Registry, mode: Mode) -> Self {
        Self {
            registry,
            mode,
            path: Vec::new(),
            done: HashSet::new()
        }
    }

    fn visit(&mut self, registration: &'a Registration) -> Result<(), Error> {
        let contract = registration.contract();
        let lifetime = registration.lifetime();

        if let Some(start) = self.path.iter().position(|(c, _)| *c == contract) {
            return match self.mode {
                Mode::Captive => Ok(()),
                _ => Err(Error::CircularDependency(self.chain(start, contract)))
            };
        }

        let captor = self.path
            .iter()
            .position(|(_, lifetime)| *lifetime == Lifetime::Singleton);
        if lifetime == Lifetime::Scoped {
            if let Some(start) = captor {
                return Err(Error::CaptiveDependency {
                    singleton: self.path[start].0.name(),
                    scoped: contract.name(),
                    path: self.chain(start, contract)
                });
            }
        }

        let key = (contract.id(), captor.is_some() || lifetime == Lifetime::Singleton);
        if self.done.contains(&key) {
            return Ok(());
        }

        let dependencies = match registration.signature().inspect(contract) {
            Ok(dependencies) => dependencies,
            Err(err) if self.mode == Mode::Full => return Err(err),
            Err(_) => return Ok(())
        };

        let registry = self.registry;
        self.path.push((contract, lifetime));
        for dependency in dependencies {
            match registry.lookup(dependency.contract) {
                Ok(next) => self.visit(next)?,
                Err(Error::NotRegistered(_)) if dependency.optional => (),
                Err(err) if self.mode == Mode::Full => return Err(err),
                Err(_) => ()
            }
        }
        self.path.pop();

        self.done.insert(key);
        Ok(())
    }

    /// Names on the path from `start`, closed by `last`
    fn chain(&self, start: usize, last: Contract) -> Vec<&'static str> {
        self.path[start..]
            .iter()
            .map(|(c, _)| c.name())
            .chain(std::iter::once(last.name()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use crate::{Container, ContainerBuilder, Dc, Lifetime, error::Error};

    struct Config;
    struct Session;
    struct Repo;
    #[derive(Debug)]
    struct Service;

    fn name<T>() -> &'static str {
        std::any::type_name::<T>()
    }

    fn captive_graph() -> Container {
        let mut builder = ContainerBuilder::new();
        builder.register_scoped_factory(|| Session);
        builder.register_transient_factory(|_: Dc<Session>| Ok(Repo));
        builder.register_singleton_factory(|_: Dc<Repo>| Ok(Service));
        builder.build().unwrap()
    }

    #[test]
    fn it_detects_transitive_captive_dependency() {
        let container = captive_graph();

        let err = container.validate_captive_dependencies().unwrap_err();

        assert_eq!(err, Error::CaptiveDependency {
            singleton: name::<Service>(),
            scoped: name::<Session>(),
            path: vec![name::<Service>(), name::<Repo>(), name::<Session>()]
        });
    }

    #[test]
    fn it_detects_captive_dependency_before_first_construction() {
        let container = captive_graph();
        let scope = container.create_scope();

        let err = scope.resolve::<Service>().unwrap_err();

        assert!(matches!(err, Error::CaptiveDependency { .. }));
        // the outcome is cached
        assert_eq!(scope.resolve::<Service>().unwrap_err(), err);
    }

    #[test]
    fn it_accepts_scoped_depending_on_singleton() {
        let mut builder = ContainerBuilder::new();
        builder.register_singleton(Config);
        builder.register_scoped_factory(|_: Dc<Config>| Ok(Session));

        let container = builder.build().unwrap();

        assert!(container.validate_captive_dependencies().is_ok());
        assert!(container.validate().is_ok());
        assert!(container.create_scope().resolve::<Session>().is_ok());
    }

    #[test]
    fn it_ignores_missing_dependencies_when_checking_captives() {
        let mut builder = ContainerBuilder::new();
        builder.register_singleton_factory(|_: Dc<Repo>| Ok(Service));

        let container = builder.build().unwrap();

        assert!(container.validate_captive_dependencies().is_ok());
        assert_eq!(container.validate().unwrap_err(), Error::NotRegistered(name::<Repo>()));
    }

    #[test]
    fn it_skips_missing_optional_dependency() {
        let mut builder = ContainerBuilder::new();
        builder.register_transient_factory(|_: Option<Dc<Repo>>| Ok(Service));

        let container = builder.build().unwrap();

        assert!(container.validate().is_ok());
    }

    #[test]
    fn it_reports_cycles_with_full_chain() {
        let mut builder = ContainerBuilder::new();
        builder.register_as::<Repo, _, _>(Lifetime::Transient, |_: Dc<Service>| Ok(Repo));
        builder.register_as::<Service, _, _>(Lifetime::Transient, |_: Dc<Repo>| Ok(Service));

        let container = builder.build().unwrap();

        assert_eq!(container.validate().unwrap_err(), Error::CircularDependency(vec![
            name::<Repo>(),
            name::<Service>(),
            name::<Repo>()
        ]));
        assert!(container.validate_captive_dependencies().is_ok());
    }

    #[test]
    fn it_reports_self_dependency() {
        let mut builder = ContainerBuilder::new();
        builder.register_transient_factory(|_: Dc<Repo>| Ok(Repo));

        let container = builder.build().unwrap();

        assert_eq!(container.validate().unwrap_err(), Error::CircularDependency(vec![
            name::<Repo>(),
            name::<Repo>()
        ]));
    }

    #[test]
    fn it_reports_first_failure_in_registration_order() {
        let mut builder = ContainerBuilder::new();
        builder.register_transient_factory(|_: Dc<Config>| Ok(Repo));
        builder.register_transient_factory(|_: Dc<Session>| Ok(Service));

        let container = builder.build().unwrap();

        assert_eq!(container.validate().unwrap_err(), Error::NotRegistered(name::<Config>()));
    }

    #[test]
    fn it_reuses_sound_subgraphs() {
        let mut builder = ContainerBuilder::new();
        builder.register_singleton(Config);
        builder.register_transient_factory(|_: Dc<Config>| Ok(Session));
        builder.register_transient_factory(|_: Dc<Session>, _: Dc<Config>| Ok(Repo));
        builder.register_singleton_factory(|_: Dc<Repo>, _: Dc<Session>| Ok(Service));

        let container = builder.build().unwrap();

        assert!(container.validate().is_ok());
        assert!(container.resolve::<Service>().is_ok());
    }
}
