//! Request-bound scopes of scoped services

use crate::{
    Container, Contract, FromResolver, GenericFactory, Resolver,
    error::Error,
    registry::{ArcService, TypeIdMap},
    resource::Teardown
};
use http::{Extensions, request::Parts};
use parking_lot::Mutex;
use std::{
    fmt::{Debug, Formatter},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering}
    }
};

/// Cache and ownership boundary of the services created for a single unit of work.
///
/// - **Singleton** services are shared with the container and every other scope.
/// - **Scoped** services are created lazily the first time they are resolved
///   within this scope and reused afterwards.
/// - **Transient** services are created on every resolution.
///
/// Release hooks of resources created within the scope run when it is closed,
/// or when the last handle to it is dropped if [`Scope::close`] is never called.
///
/// A scope is meant to be used by one unit of work at a time; clones share the same
/// cache, so that the scope can travel with a request through [`Extensions`].
#[derive(Clone)]
pub struct Scope {
    container: Container,
    state: Arc<ScopeState>
}

impl Debug for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Scope {
    #[inline]
    pub(crate) fn new(container: Container) -> Self {
        #[cfg(feature = "tracing")]
        tracing::trace!("DI scope opened");

        Self { container, state: Arc::new(ScopeState::default()) }
    }

    /// Container this scope has been created from
    #[inline]
    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Creates a resolver bound to this scope with an empty resolution path
    #[inline]
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.container, Some(&self.state))
    }

    /// Resolves a service and returns a shared pointer
    #[inline]
    pub fn resolve<C: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<C>, Error> {
        self.state.ensure_open()?;
        self.resolver().resolve::<C>()
    }

    /// Resolves a service, or returns `None` if its contract is not registered
    #[inline]
    pub fn try_resolve<C: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<C>>, Error> {
        self.state.ensure_open()?;
        self.resolver().try_resolve::<C>()
    }

    /// Resolves a service and returns a cloned instance.
    /// `T` must implement [`Clone`] otherwise use [`Scope::resolve`] method
    /// that returns a shared pointer.
    #[inline]
    pub fn resolve_cloned<T: Send + Sync + Clone + 'static>(&self) -> Result<T, Error> {
        self.resolve::<T>()
            .map(|s| s.as_ref().clone())
    }

    /// Calls `f` with its arguments resolved within this scope.
    ///
    /// # Example
    /// ```
    /// use trellis::{ContainerBuilder, Dc};
    ///
    /// #[derive(Default)]
    /// struct Greeter;
    ///
    /// impl Greeter {
    ///     fn greet(&self, name: &str) -> String {
    ///         format!("Hello, {name}!")
    ///     }
    /// }
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder.register_scoped::<Greeter>();
    /// let container = builder.build().unwrap();
    ///
    /// let name = String::from("Ada");
    /// let message = container.in_scope(|scope| {
    ///     scope.call(move |greeter: Dc<Greeter>| Ok(greeter.greet(&name)))
    /// });
    ///
    /// assert_eq!(message.unwrap(), "Hello, Ada!");
    /// ```
    #[inline]
    pub fn call<F, Args>(&self, f: F) -> Result<F::Output, Error>
    where
        F: GenericFactory<Args>,
        Args: FromResolver
    {
        self.state.ensure_open()?;
        self.resolver().call(f)
    }

    /// Returns `true` once the scope has been closed
    #[inline]
    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }

    /// Closes the scope: runs the release hooks of the resources created within it,
    /// most recent first, and drops its scoped instances.
    ///
    /// Clones of this scope that are still alive can no longer resolve services.
    #[inline]
    pub fn close(self) {
        self.state.release();
    }
}

impl<'a> TryFrom<&'a Extensions> for &'a Scope {
    type Error = Error;

    #[inline]
    fn try_from(extensions: &'a Extensions) -> Result<Self, Self::Error> {
        extensions.get::<Scope>()
            .ok_or(Error::ScopeMissing)
    }
}

impl TryFrom<&Extensions> for Scope {
    type Error = Error;

    #[inline]
    fn try_from(extensions: &Extensions) -> Result<Self, Self::Error> {
        let res: Result<&Scope, Error> = extensions.try_into();
        res.cloned()
    }
}

impl TryFrom<&Parts> for Scope {
    type Error = Error;

    #[inline]
    fn try_from(parts: &Parts) -> Result<Self, Self::Error> {
        Scope::try_from(&parts.extensions)
    }
}

/// Shared state behind every clone of a [`Scope`]
#[derive(Default)]
pub(crate) struct ScopeState {
    instances: Mutex<TypeIdMap<ArcService>>,
    teardowns: Mutex<Vec<Teardown>>,
    closed: AtomicBool
}

impl ScopeState {
    #[inline]
    fn ensure_open(&self) -> Result<(), Error> {
        if self.closed.load(Ordering::Acquire) {
            Err(Error::ScopeClosed)
        } else {
            Ok(())
        }
    }

    #[inline]
    pub(crate) fn get(&self, contract: Contract) -> Result<Option<ArcService>, Error> {
        self.ensure_open()?;
        Ok(self.instances.lock().get(&contract.id()).cloned())
    }

    /// Caches the instance unless one is already there and returns the cached one
    #[inline]
    pub(crate) fn insert(&self, contract: Contract, service: ArcService) -> Result<ArcService, Error> {
        self.ensure_open()?;
        let mut instances = self.instances.lock();
        Ok(instances
            .entry(contract.id())
            .or_insert(service)
            .clone())
    }

    #[inline]
    pub(crate) fn own(&self, teardown: Teardown) {
        self.teardowns.lock().push(teardown);
    }

    fn release(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let teardowns = std::mem::take(&mut *self.teardowns.lock());

        #[cfg(feature = "tracing")]
        tracing::trace!(teardowns = teardowns.len(), "DI scope closed");

        for teardown in teardowns.into_iter().rev() {
            teardown();
        }
        self.instances.lock().clear();
    }
}

impl Drop for ScopeState {
    #[inline]
    fn drop(&mut self) {
        self.release();
    }
}

impl Container {
    /// Runs `f` within a new scope and closes the scope afterwards,
    /// whatever `f` returns.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use trellis::ContainerBuilder;
    ///
    /// #[derive(Default)]
    /// struct RequestContext;
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder.register_scoped::<RequestContext>();
    /// let container = builder.build().unwrap();
    ///
    /// let same = container.in_scope(|scope| {
    ///     let first = scope.resolve::<RequestContext>()?;
    ///     let second = scope.resolve::<RequestContext>()?;
    ///     Ok::<_, trellis::error::Error>(Arc::ptr_eq(&first, &second))
    /// });
    ///
    /// assert!(same.unwrap());
    /// ```
    pub fn in_scope<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&Scope) -> R
    {
        let scope = self.create_scope();
        let result = f(&scope);
        scope.close();
        result
    }
}
