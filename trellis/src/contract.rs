//! Service contracts, lifetimes and contract-to-implementation binding

use std::{
    any::TypeId,
    fmt::{Display, Formatter},
    hash::{Hash, Hasher},
    sync::Arc
};

/// Identity of a service that dependent code requests.
///
/// A contract is usually a trait object type such as `dyn Repository`,
/// or a concrete type when a service is consumed directly by its own type.
#[derive(Debug, Clone, Copy)]
pub struct Contract {
    id: TypeId,
    name: &'static str
}

impl Contract {
    /// Returns the contract identity of `C`
    #[inline]
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: std::any::type_name::<C>()
        }
    }

    /// Type id of the contract
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Full type name of the contract
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Contract {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Contract {}

impl Hash for Contract {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for Contract {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Service lifetime that controls how resolved instances are cached and shared.
///
/// - **Singleton**: created once on first resolution and shared across
///   all scopes and threads for as long as the container lives.
/// - **Scoped**: created once per [`Scope`](crate::Scope), reused for every
///   resolution within that scope and never visible to another one.
/// - **Transient**: created anew on every resolution, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// One instance per container
    Singleton,
    /// One instance per scope
    Scoped,
    /// A new instance per resolution
    Transient,
}

impl Display for Lifetime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Lifetime::Singleton => f.write_str("singleton"),
            Lifetime::Scoped => f.write_str("scoped"),
            Lifetime::Transient => f.write_str("transient"),
        }
    }
}

/// Binds an implementation to the contract `C` it satisfies.
///
/// Every type implements its own contract (self-binding). Implementations of trait
/// object contracts are usually declared with the [`implements!`](crate::implements) macro.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use trellis::Implements;
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// struct FixedClock;
///
/// impl Clock for FixedClock {
///     fn now(&self) -> u64 { 42 }
/// }
///
/// impl Implements<dyn Clock> for FixedClock {
///     fn upcast(self: Arc<Self>) -> Arc<dyn Clock> {
///         self
///     }
/// }
/// ```
pub trait Implements<C: ?Sized>: Send + Sync + 'static {
    /// Converts a shared implementation into a shared contract
    fn upcast(self: Arc<Self>) -> Arc<C>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    #[inline]
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// Implements [`Implements`] for one or more types satisfying a trait object contract.
///
/// # Example
/// ```
/// use trellis::implements;
///
/// trait Repository: Send + Sync {}
///
/// struct SqlRepository;
/// struct InMemoryRepository;
///
/// impl Repository for SqlRepository {}
/// impl Repository for InMemoryRepository {}
///
/// implements! { dyn Repository: SqlRepository, InMemoryRepository }
/// ```
#[macro_export]
macro_rules! implements {
    ($contract:ty : $($implementation:ty),+ $(,)?) => {
        $(impl $crate::Implements<$contract> for $implementation {
            #[inline]
            fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$contract> {
                self
            }
        })+
    };
}
