//! Registration bookkeeping

use crate::{
    Contract, Lifetime, Resolver, Signature,
    error::Error,
    resource::Teardown
};
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::{
    any::{Any, TypeId},
    cell::Cell,
    collections::HashMap,
    fmt::Debug,
    hash::{BuildHasherDefault, Hasher},
    sync::{Arc, OnceLock}
};

/// A shared, type-erased instance.
///
/// The concrete type behind it is always `Arc<C>` where `C` is the registered contract,
/// which allows contracts to be unsized trait objects.
pub(crate) type ArcService = Arc<
    dyn Any
    + Send
    + Sync
>;

/// What a factory hands back to the resolver
pub(crate) struct Created {
    pub(crate) service: ArcService,
    pub(crate) teardown: Option<Teardown>
}

pub(crate) type ResolverFn = Box<
    dyn Fn(&Resolver<'_>) -> Result<Created, Error>
    + Send
    + Sync
>;

/// Process-wide storage of a singleton instance
pub(crate) struct SingletonSlot {
    cell: OnceLock<ArcService>,
    /// Held by the initializing thread; the flag is raised while its factory runs
    init: ReentrantMutex<Cell<bool>>,
    checked: OnceLock<Result<(), Error>>,
    factory: Option<ResolverFn>
}

impl SingletonSlot {
    #[inline]
    fn lazy(factory: ResolverFn) -> Self {
        Self {
            cell: OnceLock::new(),
            init: ReentrantMutex::new(Cell::new(false)),
            checked: OnceLock::new(),
            factory: Some(factory)
        }
    }

    #[inline]
    fn ready(service: ArcService) -> Self {
        Self {
            cell: OnceLock::from(service),
            init: ReentrantMutex::new(Cell::new(false)),
            checked: OnceLock::from(Ok(())),
            factory: None
        }
    }

    #[inline]
    pub(crate) fn get(&self) -> Option<&ArcService> {
        self.cell.get()
    }

    /// Exclusive initialization guard. Only the holder may run the factory.
    ///
    /// The guard is reentrant so that a factory resolving its own singleton
    /// through the container finds the raised flag instead of blocking forever.
    #[inline]
    pub(crate) fn lock(&self) -> ReentrantMutexGuard<'_, Cell<bool>> {
        self.init.lock()
    }

    /// Stores the instance. Must be called while holding [`SingletonSlot::lock`].
    #[inline]
    pub(crate) fn set(&self, service: ArcService) -> ArcService {
        self.cell.get_or_init(|| service).clone()
    }

    /// Runs `check` once and caches its outcome
    #[inline]
    pub(crate) fn check_once(&self, check: impl FnOnce() -> Result<(), Error>) -> Result<(), Error> {
        self.checked.get_or_init(check).clone()
    }

    #[inline]
    pub(crate) fn factory(&self) -> Option<&ResolverFn> {
        self.factory.as_ref()
    }
}

pub(crate) enum ServiceEntry {
    Singleton(SingletonSlot),
    Scoped(ResolverFn),
    Transient(ResolverFn),
}

impl ServiceEntry {
    #[inline]
    pub(crate) fn new(lifetime: Lifetime, factory: ResolverFn) -> Self {
        match lifetime {
            Lifetime::Singleton => ServiceEntry::Singleton(SingletonSlot::lazy(factory)),
            Lifetime::Scoped => ServiceEntry::Scoped(factory),
            Lifetime::Transient => ServiceEntry::Transient(factory),
        }
    }

    #[inline]
    pub(crate) fn instance(service: ArcService) -> Self {
        ServiceEntry::Singleton(SingletonSlot::ready(service))
    }

    #[inline]
    pub(crate) fn lifetime(&self) -> Lifetime {
        match self {
            ServiceEntry::Singleton(_) => Lifetime::Singleton,
            ServiceEntry::Scoped(_) => Lifetime::Scoped,
            ServiceEntry::Transient(_) => Lifetime::Transient,
        }
    }
}

impl Debug for ServiceEntry {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ServiceEntry({})", self.lifetime())
    }
}

/// Binding of a contract to its implementation, constructor signature and lifetime
#[derive(Debug)]
pub(crate) struct Registration {
    contract: Contract,
    implementation: Contract,
    signature: Signature,
    entry: ServiceEntry,
    /// Produces resources with a release hook
    releasing: bool,
    order: usize
}

impl Registration {
    #[inline]
    pub(crate) fn new(
        contract: Contract,
        implementation: Contract,
        signature: Signature,
        entry: ServiceEntry
    ) -> Self {
        Self { contract, implementation, signature, entry, releasing: false, order: 0 }
    }

    /// Marks the registration as a resource provider
    #[inline]
    pub(crate) fn releasing(mut self, releasing: bool) -> Self {
        self.releasing = releasing;
        self
    }

    #[inline]
    pub(crate) fn is_releasing(&self) -> bool {
        self.releasing
    }

    #[inline]
    pub(crate) fn contract(&self) -> Contract {
        self.contract
    }

    #[inline]
    pub(crate) fn implementation(&self) -> Contract {
        self.implementation
    }

    #[inline]
    pub(crate) fn signature(&self) -> &Signature {
        &self.signature
    }

    #[inline]
    pub(crate) fn entry(&self) -> &ServiceEntry {
        &self.entry
    }

    #[inline]
    pub(crate) fn lifetime(&self) -> Lifetime {
        self.entry.lifetime()
    }
}

#[derive(Default)]
pub(crate) struct TypeIdHasher(u64);

impl Hasher for TypeIdHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    #[cold]
    fn write(&mut self, bytes: &[u8]) {
        // only reached by toolchains that hash TypeId through write_u128
        for chunk in bytes.chunks(8) {
            let mut buf = [0u8; 8];
            buf[..chunk.len()].copy_from_slice(chunk);
            self.0 ^= u64::from_ne_bytes(buf);
        }
    }

    #[inline]
    fn write_u64(&mut self, id: u64) {
        self.0 = id;
    }
}

pub(crate) type TypeIdMap<V> = HashMap<
    TypeId,
    V,
    BuildHasherDefault<TypeIdHasher>
>;

/// Mapping from contract identity to its registration
#[derive(Debug, Default)]
pub(crate) struct Registry {
    services: TypeIdMap<Registration>,
    /// Implementation types bound to a contract other than themselves
    implementations: TypeIdMap<Contract>,
    counter: usize
}

impl Registry {
    /// Stores the registration and returns the one it replaced, if any
    pub(crate) fn register(&mut self, mut registration: Registration) -> Option<Registration> {
        self.counter += 1;
        registration.order = self.counter;

        let contract = registration.contract;
        let implementation = registration.implementation;
        if implementation != contract {
            self.implementations.insert(implementation.id(), contract);
        }
        self.services.insert(contract.id(), registration)
    }

    /// Looks up the registration of `contract`.
    ///
    /// Fails with [`Error::InterfaceMismatch`] if `contract` is only known
    /// as the implementation of another contract.
    pub(crate) fn lookup(&self, contract: Contract) -> Result<&Registration, Error> {
        if let Some(registration) = self.services.get(&contract.id()) {
            return Ok(registration);
        }
        match self.implementations.get(&contract.id()) {
            Some(registered) => Err(Error::InterfaceMismatch {
                requested: contract.name(),
                registered: registered.name()
            }),
            None => Err(Error::NotRegistered(contract.name()))
        }
    }

    #[inline]
    pub(crate) fn contains(&self, contract: Contract) -> bool {
        self.services.contains_key(&contract.id())
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.services.len()
    }

    /// Registrations in the order they have been made
    pub(crate) fn ordered(&self) -> Vec<&Registration> {
        let mut registrations = self.services.values().collect::<Vec<_>>();
        registrations.sort_by_key(|r| r.order);
        registrations
    }

    /// Restores the pristine initial state
    pub(crate) fn reset(&mut self) {
        self.services.clear();
        self.implementations.clear();
        self.counter = 0;
    }
}
