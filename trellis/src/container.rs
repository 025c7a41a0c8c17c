//! Dependency Injection container and tools

use crate::{
    Contract, Implements, Inject, Lifetime, Resolver, Resource, Scope, Signature,
    error::Error,
    registry::{ArcService, Created, Registration, Registry, ResolverFn, ServiceEntry},
    resource::Teardown,
    validator
};
use parking_lot::Mutex;
use std::{
    fmt::{Debug, Formatter},
    sync::Arc
};

pub use self::{
    factory::GenericFactory,
    from_resolver::FromResolver
};

pub mod factory;
pub mod from_resolver;

/// Represents a DI container builder,
/// that is able to add/register dependencies with a specific lifetimes.
///
/// Every `register_*` method without the `_as` suffix binds the produced type to itself.
/// The `_as` variants bind an implementation to a contract, usually a trait object,
/// which the implementation satisfies through [`Implements`].
#[derive(Debug)]
pub struct ContainerBuilder {
    registry: Registry,
    duplicates: Vec<Contract>,
    validate: bool
}

impl Default for ContainerBuilder {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerBuilder {
    /// Creates a new DI container builder
    #[inline]
    pub fn new() -> Self {
        Self {
            registry: Registry::default(),
            duplicates: Vec::new(),
            validate: false
        }
    }

    /// Validates the whole registration graph when the container is built.
    ///
    /// See [`Container::validate`].
    #[inline]
    pub fn with_validation(mut self) -> Self {
        self.validate = true;
        self
    }

    /// Forgets every registration made so far
    #[inline]
    pub fn reset(&mut self) -> &mut Self {
        self.registry.reset();
        self.duplicates.clear();
        self
    }

    /// Number of registered contracts
    #[inline]
    pub fn len(&self) -> usize {
        self.registry.len()
    }

    /// Returns `true` if nothing has been registered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.registry.len() == 0
    }

    /// Build a DI container.
    ///
    /// Fails with [`Error::DuplicateRegistration`] if a contract has been registered more than once,
    /// and with any structural error if validation has been turned on with [`ContainerBuilder::with_validation`].
    pub fn build(self) -> Result<Container, Error> {
        if let Some(contract) = self.duplicates.first() {
            #[cfg(feature = "tracing")]
            tracing::warn!(contract = contract.name(), "duplicate service registration");

            return Err(Error::DuplicateRegistration(contract.name()));
        }

        let validate = self.validate;
        let container = Container {
            inner: Arc::new(ContainerInner {
                registry: self.registry,
                teardowns: Mutex::new(Vec::new())
            })
        };

        if validate {
            container.validate()?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(services = container.len(), "DI container built");

        Ok(container)
    }

    /// Register a singleton service
    #[inline]
    pub fn register_singleton<T: Send + Sync + 'static>(&mut self, instance: T) -> &mut Self {
        self.register_instance_as::<T, T>(instance)
    }

    /// Register an already constructed implementation as the singleton of contract `C`
    pub fn register_instance_as<C, T>(&mut self, instance: T) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>
    {
        let service: Arc<C> = Arc::new(instance).upcast();
        let entry = ServiceEntry::instance(Arc::new(service) as ArcService);
        self.store(Registration::new(
            Contract::of::<C>(),
            Contract::of::<T>(),
            Signature::new(),
            entry));
        self
    }

    /// Register a singleton service that is constructed by `factory` on its first resolution
    #[inline]
    pub fn register_singleton_factory<T, F, Args>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = T>,
        Args: FromResolver + 'static
    {
        self.register_as::<T, F, Args>(Lifetime::Singleton, factory)
    }

    /// Register a singleton service that is constructed as [`Inject`] on its first resolution
    #[inline]
    pub fn register_singleton_lazy<T: Inject>(&mut self) -> &mut Self {
        self.register_inject_as::<T, T>(Lifetime::Singleton)
    }

    /// Register a singleton resource, released when the container is dropped
    #[inline]
    pub fn register_singleton_resource<T, F, Args>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = Resource<T>>,
        Args: FromResolver + 'static
    {
        self.register_resource_as::<T, T, F, Args>(Lifetime::Singleton, factory)
    }

    /// Register a scoped service
    #[inline]
    pub fn register_scoped_factory<T, F, Args>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = T>,
        Args: FromResolver + 'static
    {
        self.register_as::<T, F, Args>(Lifetime::Scoped, factory)
    }

    /// Register a scoped service that required to be resolved as [`Default`]
    #[inline]
    pub fn register_scoped_default<T>(&mut self) -> &mut Self
    where
        T: Default + Send + Sync + 'static
    {
        self.register_scoped_factory(T::default)
    }

    /// Register a scoped service that required to be resolved as [`Inject`]
    #[inline]
    pub fn register_scoped<T: Inject>(&mut self) -> &mut Self {
        self.register_inject_as::<T, T>(Lifetime::Scoped)
    }

    /// Register a scoped resource, released when the scope that resolved it is closed
    #[inline]
    pub fn register_scoped_resource<T, F, Args>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = Resource<T>>,
        Args: FromResolver + 'static
    {
        self.register_resource_as::<T, T, F, Args>(Lifetime::Scoped, factory)
    }

    /// Register a transient service
    #[inline]
    pub fn register_transient_factory<T, F, Args>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: GenericFactory<Args, Output = T>,
        Args: FromResolver + 'static
    {
        self.register_as::<T, F, Args>(Lifetime::Transient, factory)
    }

    /// Register a transient service that required to be resolved as [`Default`]
    #[inline]
    pub fn register_transient_default<T>(&mut self) -> &mut Self
    where
        T: Default + Send + Sync + 'static
    {
        self.register_transient_factory(T::default)
    }

    /// Register a transient service that required to be resolved as [`Inject`]
    #[inline]
    pub fn register_transient<T: Inject>(&mut self) -> &mut Self {
        self.register_inject_as::<T, T>(Lifetime::Transient)
    }

    /// Register `factory` as the constructor of contract `C`.
    ///
    /// The factory arguments are resolved as dependencies and make up the constructor signature.
    ///
    /// # Example
    /// ```
    /// use trellis::{ContainerBuilder, Dc, Lifetime, implements};
    ///
    /// trait Repository: Send + Sync {
    ///     fn find(&self, id: u32) -> Option<String>;
    /// }
    ///
    /// #[derive(Default)]
    /// struct Database;
    ///
    /// struct SqlRepository {
    ///     _db: Dc<Database>
    /// }
    ///
    /// impl Repository for SqlRepository {
    ///     fn find(&self, id: u32) -> Option<String> {
    ///         Some(format!("user {id}"))
    ///     }
    /// }
    ///
    /// implements! { dyn Repository: SqlRepository }
    ///
    /// let mut builder = ContainerBuilder::new();
    /// builder.register_singleton(Database);
    /// builder.register_as::<dyn Repository, _, _>(Lifetime::Transient, |db: Dc<Database>| {
    ///     Ok(SqlRepository { _db: db })
    /// });
    ///
    /// let container = builder.build().unwrap();
    /// let repo = container.resolve::<dyn Repository>().unwrap();
    ///
    /// assert_eq!(repo.find(1).as_deref(), Some("user 1"));
    /// ```
    pub fn register_as<C, F, Args>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        F: GenericFactory<Args>,
        F::Output: Implements<C>,
        Args: FromResolver + 'static
    {
        let mut signature = Signature::new();
        Args::describe(&mut signature, None);
        self.insert::<C, F::Output>(lifetime, signature, false, move |resolver| {
            let args = Args::from_resolver(resolver)?;
            factory.call(args).map(Resource::new)
        })
    }

    /// Register the [`Inject`] type `T` as the implementation of contract `C`.
    ///
    /// [`Inject::on_startup`] runs on every constructed instance before it is handed out.
    pub fn register_inject_as<C, T>(&mut self, lifetime: Lifetime) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Inject + Implements<C>
    {
        self.insert::<C, T>(lifetime, T::signature(), false, |resolver| {
            T::inject(resolver).map(|service| Resource::new(service).on_startup(T::on_startup))
        })
    }

    /// Register a resource provider as the constructor of contract `C`.
    ///
    /// The release hook of every produced [`Resource`] runs when its owner goes away:
    /// the scope that resolved it, or the container for singletons and their dependencies.
    /// Scoped and transient resources therefore need a scope to be resolved in,
    /// unless a singleton depends on them.
    pub fn register_resource_as<C, T, F, Args>(&mut self, lifetime: Lifetime, factory: F) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>,
        F: GenericFactory<Args, Output = Resource<T>>,
        Args: FromResolver + 'static
    {
        let mut signature = Signature::new();
        Args::describe(&mut signature, None);
        self.insert::<C, T>(lifetime, signature, true, move |resolver| {
            let args = Args::from_resolver(resolver)?;
            factory.call(args)
        })
    }

    fn insert<C, T>(
        &mut self,
        lifetime: Lifetime,
        signature: Signature,
        releasing: bool,
        create: impl Fn(&Resolver<'_>) -> Result<Resource<T>, Error> + Send + Sync + 'static
    ) -> &mut Self
    where
        C: ?Sized + Send + Sync + 'static,
        T: Implements<C>
    {
        let factory: ResolverFn = Box::new(move |resolver: &Resolver<'_>| {
            let (value, teardown) = create(resolver)?.start()?;
            let service: Arc<C> = value.upcast();
            Ok(Created { service: Arc::new(service) as ArcService, teardown })
        });
        self.store(Registration::new(
            Contract::of::<C>(),
            Contract::of::<T>(),
            signature,
            ServiceEntry::new(lifetime, factory))
            .releasing(releasing));
        self
    }

    fn store(&mut self, registration: Registration) {
        #[cfg(feature = "tracing")]
        tracing::trace!(
            contract = registration.contract().name(),
            lifetime = %registration.lifetime(),
            signature = %registration.signature(),
            "service registered");

        if let Some(replaced) = self.registry.register(registration) {
            self.duplicates.push(replaced.contract());
        }
    }
}

/// Represents a DI container, that is able to resolve generic dependencies
///
/// Cloning is cheap: every clone shares the same registrations and singletons.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>
}

struct ContainerInner {
    registry: Registry,
    /// Release hooks of resources created outside of any scope
    teardowns: Mutex<Vec<Teardown>>
}

impl Drop for ContainerInner {
    fn drop(&mut self) {
        let teardowns = std::mem::take(self.teardowns.get_mut());

        #[cfg(feature = "tracing")]
        if !teardowns.is_empty() {
            tracing::debug!(teardowns = teardowns.len(), "releasing container resources");
        }

        for teardown in teardowns.into_iter().rev() {
            teardown();
        }
    }
}

impl Debug for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("services", &self.len())
            .finish()
    }
}

impl Default for Container {
    #[inline]
    fn default() -> Self {
        Self {
            inner: Arc::new(ContainerInner {
                registry: Registry::default(),
                teardowns: Mutex::new(Vec::new())
            })
        }
    }
}

impl Container {
    #[inline]
    pub(crate) fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Takes ownership of a release hook that has no scope to run in
    #[inline]
    pub(crate) fn own(&self, teardown: Teardown) {
        self.inner.teardowns.lock().push(teardown);
    }

    /// Creates a new dependency-injection scope:
    ///
    /// - **Singleton** services are shared: the scope reuses the container's
    ///   singleton instances.
    /// - **Scoped** services are isolated: they are not instantiated upfront and
    ///   will be lazily created the first time they are resolved within this scope.
    /// - **Transient** services preserve their lifetime semantics: each resolution
    ///   returns a newly constructed instance.
    ///
    /// This method is typically used to create request-level or operation-level
    /// scopes when resolving services that should not live for the entire lifetime
    /// of the root container.
    #[inline]
    #[doc(alias = "open_scope")]
    pub fn create_scope(&self) -> Scope {
        Scope::new(self.clone())
    }

    /// Creates a resolver without a scope and with an empty resolution path
    #[inline]
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(self, None)
    }

    /// Resolves a service outside any scope and returns a shared pointer.
    ///
    /// Scoped services and transient resources cannot be resolved this way,
    /// see [`Container::create_scope`].
    #[inline]
    pub fn resolve<C: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<C>, Error> {
        self.resolver().resolve::<C>()
    }

    /// Resolves a service, or returns `None` if its contract is not registered
    #[inline]
    pub fn try_resolve<C: ?Sized + Send + Sync + 'static>(&self) -> Result<Option<Arc<C>>, Error> {
        self.resolver().try_resolve::<C>()
    }

    /// Calls `f` with its arguments resolved outside any scope
    #[inline]
    pub fn call<F, Args>(&self, f: F) -> Result<F::Output, Error>
    where
        F: GenericFactory<Args>,
        Args: FromResolver
    {
        self.resolver().call(f)
    }

    /// Resolves a service and returns a cloned instance.
    /// `T` must implement [`Clone`] otherwise use [`Container::resolve`] method
    /// that returns a shared pointer.
    #[inline]
    pub fn resolve_cloned<T: Send + Sync + Clone + 'static>(&self) -> Result<T, Error> {
        self.resolve::<T>()
            .map(|s| s.as_ref().clone())
    }

    /// Returns `true` if contract `C` is registered
    #[inline]
    pub fn is_registered<C: ?Sized + 'static>(&self) -> bool {
        self.registry().contains(Contract::of::<C>())
    }

    /// Lifetime of contract `C`, if registered
    #[inline]
    pub fn lifetime_of<C: ?Sized + 'static>(&self) -> Option<Lifetime> {
        self.registry()
            .lookup(Contract::of::<C>())
            .ok()
            .map(|r| r.lifetime())
    }

    /// Number of registered contracts
    #[inline]
    pub fn len(&self) -> usize {
        self.registry().len()
    }

    /// Returns `true` if nothing is registered
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets every registration and singleton of this handle.
    ///
    /// Handles cloned earlier and the scopes created from them keep the previous registrations.
    pub fn reset(&mut self) {
        #[cfg(feature = "tracing")]
        tracing::debug!(services = self.len(), "DI container reset");

        *self = Self::default();
    }

    /// Checks the whole registration graph, in registration order, for
    /// non-introspectable constructors, missing dependencies, cycles and captive dependencies.
    ///
    /// Every edge checked here is enforced at runtime: a constructor may only resolve
    /// the dependencies its signature declares.
    pub fn validate(&self) -> Result<(), Error> {
        validator::validate(self.registry()).inspect_err(|_err| {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_err, "DI container validation failed");
        })
    }

    /// Checks that no singleton transitively depends on a scoped service.
    ///
    /// The same check runs for each singleton before its first construction.
    pub fn validate_captive_dependencies(&self) -> Result<(), Error> {
        validator::validate_captive(self.registry()).inspect_err(|_err| {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_err, "captive dependency detected");
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex, atomic::{AtomicUsize, Ordering}};
    use super::{Error, ContainerBuilder, Inject, Lifetime, Resolver, Resource, Signature};
    use crate::Dc;

    trait Cache: Send + Sync {
        fn get(&self, key: &str) -> Option<String>;
        fn set(&self, key: &str, value: &str);
    }

    #[derive(Clone, Default, Debug)]
    struct InMemoryCache {
        inner: Arc<Mutex<HashMap<String, String>>>
    }

    impl Cache for InMemoryCache {
        fn get(&self, key: &str) -> Option<String> {
            self.inner
                .lock()
                .unwrap()
                .get(key)
                .cloned()
        }

        fn set(&self, key: &str, value: &str) {
            self.inner
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
        }
    }

    crate::implements! { dyn Cache: InMemoryCache }

    #[derive(Clone)]
    struct CacheWrapper {
        inner: Arc<InMemoryCache>
    }

    impl Inject for CacheWrapper {
        fn inject(resolver: &Resolver<'_>) -> Result<Self, Error> {
            let inner = resolver.resolve::<InMemoryCache>()?;
            Ok(Self { inner })
        }

        fn signature() -> Signature {
            Signature::new().with::<InMemoryCache>("inner")
        }
    }

    #[test]
    fn it_registers_singleton() {
        let mut container = ContainerBuilder::new();
        container.register_singleton(InMemoryCache::default());

        let container = container.build().unwrap();

        let cache = container.resolve::<InMemoryCache>().unwrap();
        cache.set("key", "value");

        let cache = container.resolve::<InMemoryCache>().unwrap();
        let key = cache.get("key").unwrap();

        assert_eq!(key, "value");
    }

    #[test]
    fn it_registers_transient() {
        let mut container = ContainerBuilder::new();
        container.register_transient_default::<InMemoryCache>();

        let container = container.build().unwrap();

        let cache = container.resolve::<InMemoryCache>().unwrap();
        cache.set("key", "value");

        let cache = container.resolve::<InMemoryCache>().unwrap();
        let key = cache.get("key");

        assert!(key.is_none());
    }

    #[test]
    fn it_registers_scoped() {
        let mut container = ContainerBuilder::new();
        container.register_scoped_default::<InMemoryCache>();

        let container = container.build().unwrap();

        let first = container.create_scope();
        let cache = first.resolve::<InMemoryCache>().unwrap();
        cache.set("key", "value 1");

        // a new scope gets a new instance of InMemoryCache
        {
            let scope = container.create_scope();
            let cache = scope.resolve::<InMemoryCache>().unwrap();
            cache.set("key", "value 2");

            let cache = scope.resolve::<InMemoryCache>().unwrap();
            let key = cache.get("key").unwrap();

            assert_eq!(key, "value 2");
        }

        {
            let scope = container.create_scope();
            let cache = scope.resolve::<InMemoryCache>().unwrap();
            let key = cache.get("key");

            assert!(key.is_none());
        }

        let key = first.resolve::<InMemoryCache>().unwrap().get("key").unwrap();

        assert_eq!(key, "value 1");
    }

    #[test]
    fn it_resolves_inner_dependencies() {
        let mut container = ContainerBuilder::new();

        container.register_singleton(InMemoryCache::default());
        container.register_scoped::<CacheWrapper>();

        let container = container.build().unwrap();

        {
            let scope = container.create_scope();
            let cache = scope.resolve::<CacheWrapper>().unwrap();
            cache.inner.set("key", "value 1");
        }

        let cache = container.resolve::<InMemoryCache>().unwrap();
        let key = cache.get("key").unwrap();

        assert_eq!(key, "value 1");
    }

    #[test]
    fn it_resolves_inner_scoped_dependencies() {
        let mut container = ContainerBuilder::new();

        container.register_scoped_default::<InMemoryCache>();
        container.register_scoped::<CacheWrapper>();

        let container = container.build().unwrap();

        let scope = container.create_scope();
        let cache = scope.resolve::<CacheWrapper>().unwrap();
        cache.inner.set("key1", "value 1");

        let cache = scope.resolve::<CacheWrapper>().unwrap();
        cache.inner.set("key2", "value 2");

        let cache = scope.resolve::<CacheWrapper>().unwrap();

        assert_eq!(cache.inner.get("key1").unwrap(), "value 1");
        assert_eq!(cache.inner.get("key2").unwrap(), "value 2");
    }

    #[test]
    fn it_resolves_by_interface() {
        let mut container = ContainerBuilder::new();
        container.register_instance_as::<dyn Cache, _>(InMemoryCache::default());

        let container = container.build().unwrap();

        container.resolve::<dyn Cache>().unwrap().set("key", "value");
        let key = container.resolve::<dyn Cache>().unwrap().get("key");

        assert_eq!(key.as_deref(), Some("value"));
        assert!(matches!(container.resolve::<InMemoryCache>(), Err(Error::InterfaceMismatch { .. })));
    }

    #[test]
    fn it_returns_error_when_resolve_unregistered() {
        let container = ContainerBuilder::new().build().unwrap();

        let cache = container.resolve::<CacheWrapper>();

        assert!(matches!(cache, Err(Error::NotRegistered(_))));
    }

    #[test]
    fn it_returns_error_when_resolve_unregistered_from_scope() {
        let scope = ContainerBuilder::new()
            .build()
            .unwrap()
            .create_scope();

        let cache = scope.resolve::<CacheWrapper>();

        assert!(cache.is_err());
    }

    #[test]
    fn it_returns_none_when_try_resolve_unregistered() {
        let container = ContainerBuilder::new().build().unwrap();

        assert!(container.try_resolve::<CacheWrapper>().unwrap().is_none());
    }

    #[test]
    fn it_rejects_duplicate_registration() {
        let mut container = ContainerBuilder::new();
        container.register_singleton(InMemoryCache::default());
        container.register_transient_default::<InMemoryCache>();

        let err = container.build().unwrap_err();

        assert_eq!(err, Error::DuplicateRegistration(std::any::type_name::<InMemoryCache>()));
    }

    #[test]
    fn it_validates_on_build_when_enabled() {
        let mut container = ContainerBuilder::new().with_validation();
        container.register_scoped::<CacheWrapper>();

        let err = container.build().unwrap_err();

        assert_eq!(err, Error::NotRegistered(std::any::type_name::<InMemoryCache>()));
    }

    #[test]
    fn it_builds_without_validation_by_default() {
        let mut container = ContainerBuilder::new();
        container.register_scoped::<CacheWrapper>();

        assert!(container.build().is_ok());
    }

    #[test]
    fn it_reports_lifetimes() {
        let mut container = ContainerBuilder::new();
        container.register_singleton(1_u8);
        container.register_scoped_default::<InMemoryCache>();
        container.register_transient::<CacheWrapper>();

        let container = container.build().unwrap();

        assert_eq!(container.len(), 3);
        assert!(container.is_registered::<u8>());
        assert!(!container.is_registered::<u16>());
        assert_eq!(container.lifetime_of::<u8>(), Some(Lifetime::Singleton));
        assert_eq!(container.lifetime_of::<InMemoryCache>(), Some(Lifetime::Scoped));
        assert_eq!(container.lifetime_of::<CacheWrapper>(), Some(Lifetime::Transient));
    }

    #[test]
    fn it_resets_builder() {
        let mut container = ContainerBuilder::new();
        container.register_singleton(InMemoryCache::default());
        container.register_singleton(InMemoryCache::default());

        container.reset();
        container.register_transient_default::<InMemoryCache>();

        let container = container.build().unwrap();

        assert_eq!(container.lifetime_of::<InMemoryCache>(), Some(Lifetime::Transient));
    }

    #[test]
    fn it_resets_container() {
        let mut container = ContainerBuilder::new();
        container.register_singleton(InMemoryCache::default());

        let mut container = container.build().unwrap();
        let cloned = container.clone();

        container.reset();

        assert!(container.is_empty());
        assert!(matches!(container.resolve::<InMemoryCache>(), Err(Error::NotRegistered(_))));
        assert!(cloned.resolve::<InMemoryCache>().is_ok());
    }

    #[test]
    fn it_releases_singleton_resource_when_dropped() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();

        let mut container = ContainerBuilder::new();
        container.register_singleton_resource(move || {
            let counter = counter.clone();
            Resource::new(InMemoryCache::default())
                .on_release(move |_| { counter.fetch_add(1, Ordering::SeqCst); })
        });

        let container = container.build().unwrap();
        let cloned = container.clone();

        container.resolve::<InMemoryCache>().unwrap();
        cloned.resolve::<InMemoryCache>().unwrap();
        drop(container);

        assert_eq!(released.load(Ordering::SeqCst), 0);

        drop(cloned);

        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn it_shares_singleton_between_transients() {
        let mut container = ContainerBuilder::new();
        container.register_singleton(InMemoryCache::default());
        container.register_transient_factory(|inner: Dc<InMemoryCache>| {
            Ok(CacheWrapper { inner: inner.into_inner() })
        });

        let container = container.build().unwrap();

        let first = container.resolve::<CacheWrapper>().unwrap();
        let second = container.resolve::<CacheWrapper>().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first.inner, &second.inner));
    }

    #[test]
    fn it_calls_function_with_resolved_arguments() {
        let mut container = ContainerBuilder::new();
        container.register_singleton(InMemoryCache::default());
        container.register_transient::<CacheWrapper>();

        let container = container.build().unwrap();
        container.resolve::<InMemoryCache>().unwrap().set("key", "value");

        let value = container
            .call(|wrapper: Dc<CacheWrapper>| wrapper.inner.get("key").ok_or(Error::other("missing")))
            .unwrap();

        assert_eq!(value, "value");
        assert_eq!(
            container.call(|_: Dc<dyn Cache>| Ok(())).unwrap_err(),
            Error::NotRegistered(std::any::type_name::<dyn Cache>())
        );
    }

    #[test]
    fn it_requires_scope_for_transient_resource() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();

        let mut container = ContainerBuilder::new();
        container.register_resource_as::<InMemoryCache, _, _, _>(Lifetime::Transient, move || {
            let counter = counter.clone();
            Resource::new(InMemoryCache::default())
                .on_release(move |_| { counter.fetch_add(1, Ordering::SeqCst); })
        });

        let container = container.build().unwrap();

        for _ in 0..100 {
            let err = container.resolve::<InMemoryCache>().unwrap_err();
            assert_eq!(err, Error::ScopeRequired(std::any::type_name::<InMemoryCache>()));
        }

        container.in_scope(|scope| {
            for _ in 0..100 {
                scope.resolve::<InMemoryCache>().unwrap();
            }
        });

        assert_eq!(released.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn it_lets_singleton_own_its_transient_resource() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();

        let mut container = ContainerBuilder::new();
        container.register_resource_as::<InMemoryCache, _, _, _>(Lifetime::Transient, move || {
            let counter = counter.clone();
            Resource::new(InMemoryCache::default())
                .on_release(move |_| { counter.fetch_add(1, Ordering::SeqCst); })
        });
        container.register_singleton_lazy::<CacheWrapper>();

        let container = container.build().unwrap();

        container.resolve::<CacheWrapper>().unwrap();
        container.resolve::<CacheWrapper>().unwrap();
        drop(container);

        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn it_registers_factory_with_dependencies_as_interface() {
        let mut container = ContainerBuilder::new();
        container.register_singleton(InMemoryCache::default());
        container.register_as::<dyn Cache, _, _>(Lifetime::Transient, |c: Dc<InMemoryCache>| {
            Ok(c.cloned())
        });

        let container = container.build().unwrap();

        container.resolve::<dyn Cache>().unwrap().set("key", "value");

        let key = container.resolve::<InMemoryCache>().unwrap().get("key");

        assert_eq!(key.as_deref(), Some("value"));
    }
}
