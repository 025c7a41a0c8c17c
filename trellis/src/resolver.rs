//! Recursive resolution of dependency graphs

use crate::{
    Container, Contract, FromResolver, GenericFactory, Lifetime,
    error::Error,
    registry::{ArcService, Created, Registration, ResolverFn, ServiceEntry, SingletonSlot},
    scope::ScopeState,
    validator
};
use std::{
    cell::{Cell, RefCell},
    fmt::{Debug, Formatter},
    sync::Arc
};

/// Resolves services for a single top-level request.
///
/// A resolver owns the resolution path: the chain of contracts currently being constructed.
/// It is handed to factories and [`Inject`](crate::Inject) implementations
/// so that nested resolutions share the path and the scope of the original request.
///
/// While a service is being constructed, it may only resolve the dependencies
/// its [`Signature`](crate::Signature) declares; anything else fails with
/// [`Error::UndeclaredDependency`].
pub struct Resolver<'a> {
    container: &'a Container,
    scope: Option<&'a ScopeState>,
    path: RefCell<Vec<(Contract, Lifetime)>>
}

impl Debug for Resolver<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("scoped", &self.scope.is_some())
            .field("path", &self.path.borrow())
            .finish()
    }
}

impl<'a> Resolver<'a> {
    /// Creates a resolver with an empty resolution path
    #[inline]
    pub(crate) fn new(container: &'a Container, scope: Option<&'a ScopeState>) -> Self {
        Self { container, scope, path: RefCell::new(Vec::new()) }
    }

    /// Returns `true` if the resolver has a scope to cache scoped services in
    #[inline]
    pub fn is_scoped(&self) -> bool {
        self.scope.is_some()
    }

    /// Resolves a service and returns a shared pointer
    #[inline]
    pub fn resolve<C: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<C>, Error> {
        let service = self.resolve_any(Contract::of::<C>())?;
        downcast::<C>(&service)
    }

    /// Resolves a service, or returns `None` if its contract is not registered.
    ///
    /// Failures of the service's own dependencies are still reported as errors.
    #[inline]
    pub fn try_resolve<C: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<C>>, Error> {
        let contract = Contract::of::<C>();
        self.check_declared(contract)?;
        if self.is_absent(contract) {
            Ok(None)
        } else {
            self.resolve::<C>().map(Some)
        }
    }

    /// Returns `true` if `contract` is neither registered nor known as an implementation
    #[inline]
    pub(crate) fn is_absent(&self, contract: Contract) -> bool {
        matches!(self.container.registry().lookup(contract), Err(Error::NotRegistered(_)))
    }

    /// Calls `f` with its arguments resolved by this resolver
    pub fn call<F, Args>(&self, f: F) -> Result<F::Output, Error>
    where
        F: GenericFactory<Args>,
        Args: FromResolver
    {
        let args = Args::from_resolver(self)?;
        f.call(args)
    }

    pub(crate) fn resolve_any(&self, contract: Contract) -> Result<ArcService, Error> {
        self.check_cycle(contract)?;
        self.check_declared(contract)?;

        let registration = self.container.registry().lookup(contract)?;
        let result = match registration.entry() {
            ServiceEntry::Singleton(slot) => self.resolve_singleton(registration, slot),
            ServiceEntry::Scoped(factory) => self.resolve_scoped(registration, factory),
            ServiceEntry::Transient(factory) => self.create(registration, factory),
        };

        #[cfg(feature = "tracing")]
        if let Err(err) = &result {
            if self.path.borrow().is_empty() {
                tracing::debug!(contract = contract.name(), error = %err, "failed to resolve service");
            }
        }

        result
    }

    fn check_cycle(&self, contract: Contract) -> Result<(), Error> {
        let path = self.path.borrow();
        match path.iter().position(|(c, _)| *c == contract) {
            None => Ok(()),
            Some(start) => {
                let cycle = path[start..]
                    .iter()
                    .map(|(c, _)| c.name())
                    .chain(std::iter::once(contract.name()))
                    .collect();
                Err(Error::CircularDependency(cycle))
            }
        }
    }

    /// Only edges the validator can see may be taken at runtime
    fn check_declared(&self, contract: Contract) -> Result<(), Error> {
        let path = self.path.borrow();
        let Some((service, _)) = path.last() else {
            return Ok(());
        };
        let declared = self.container
            .registry()
            .lookup(*service)
            .is_ok_and(|registration| registration.signature().declares(contract));
        if declared {
            Ok(())
        } else {
            Err(Error::UndeclaredDependency {
                service: service.name(),
                dependency: contract.name()
            })
        }
    }

    #[inline]
    fn under_singleton(&self) -> bool {
        self.path
            .borrow()
            .iter()
            .any(|(_, lifetime)| *lifetime == Lifetime::Singleton)
    }

    fn check_captive(&self, scoped: Contract) -> Result<(), Error> {
        let path = self.path.borrow();
        match path.iter().position(|(_, lifetime)| *lifetime == Lifetime::Singleton) {
            None => Ok(()),
            Some(start) => Err(Error::CaptiveDependency {
                singleton: path[start].0.name(),
                scoped: scoped.name(),
                path: path[start..]
                    .iter()
                    .map(|(c, _)| c.name())
                    .chain(std::iter::once(scoped.name()))
                    .collect()
            })
        }
    }

    fn resolve_singleton(&self, registration: &Registration, slot: &SingletonSlot) -> Result<ArcService, Error> {
        if let Some(service) = slot.get() {
            return Ok(service.clone());
        }

        let registry = self.container.registry();
        slot.check_once(|| validator::check_singleton(registry, registration))?;

        let factory = slot
            .factory()
            .ok_or(Error::ResolveFailed(registration.contract().name()))?;

        let guard = slot.lock();
        if let Some(service) = slot.get() {
            return Ok(service.clone());
        }

        let contract = registration.contract();
        if guard.replace(true) {
            // re-entered from its own factory through a captured container handle
            return Err(Error::CircularDependency(vec![contract.name(), contract.name()]));
        }
        let _initializing = Initializing(&guard);

        // singletons never see the caller's scope
        let detached = Resolver {
            container: self.container,
            scope: None,
            path: RefCell::new(self.path.borrow().clone())
        };
        let service = detached.create(registration, factory)?;

        #[cfg(feature = "tracing")]
        tracing::debug!(contract = contract.name(), "singleton initialized");

        Ok(slot.set(service))
    }

    fn resolve_scoped(&self, registration: &Registration, factory: &ResolverFn) -> Result<ArcService, Error> {
        let contract = registration.contract();
        self.check_captive(contract)?;

        let scope = self.scope.ok_or(Error::ScopeRequired(contract.name()))?;
        if let Some(service) = scope.get(contract)? {
            return Ok(service);
        }

        let service = self.create(registration, factory)?;
        scope.insert(contract, service)
    }

    fn create(&self, registration: &Registration, factory: &ResolverFn) -> Result<ArcService, Error> {
        let contract = registration.contract();
        registration.signature().inspect(contract)?;

        // release hooks without a scope are kept by the container, only singletons may leave them there
        if registration.is_releasing()
            && self.scope.is_none()
            && registration.lifetime() != Lifetime::Singleton
            && !self.under_singleton() {
            return Err(Error::ScopeRequired(contract.name()));
        }

        self.path.borrow_mut().push((contract, registration.lifetime()));
        let created = factory(self);
        self.path.borrow_mut().pop();

        let Created { service, teardown } = created?;
        if let Some(teardown) = teardown {
            match self.scope {
                Some(scope) => scope.own(teardown),
                None => self.container.own(teardown),
            }
        }
        Ok(service)
    }
}

/// Lowers the initialization flag of a singleton slot, even if its factory panics
struct Initializing<'a>(&'a Cell<bool>);

impl Drop for Initializing<'_> {
    #[inline]
    fn drop(&mut self) {
        self.0.set(false);
    }
}

#[inline]
pub(crate) fn downcast<C: ?Sized + Send + Sync + 'static>(service: &ArcService) -> Result<Arc<C>, Error> {
    service
        .downcast_ref::<Arc<C>>()
        .cloned()
        .ok_or(Error::ResolveFailed(std::any::type_name::<C>()))
}
