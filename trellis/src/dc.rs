//! Injection handle for factory arguments and request extractors

use crate::{
    Contract, FromResolver, ParameterKind, Resolver, Scope, Signature,
    error::Error
};
use http::{Extensions, request::Parts};
use std::{
    fmt::{Debug, Formatter},
    ops::{Deref, DerefMut},
    sync::Arc
};

/// `Dc` stands for Dependency Container.
///
/// This struct wraps a resolved service `T` that is **shared** through an [`Arc`].
/// As a factory argument it declares `T` as a required dependency;
/// `Option<Dc<T>>` declares an optional one.
///
/// # Example
/// ```
/// use std::{
///     collections::HashMap,
///     sync::{Arc, Mutex}
/// };
/// use trellis::{ContainerBuilder, Dc};
///
/// #[derive(Default)]
/// struct InMemoryCache {
///     inner: Arc<Mutex<HashMap<String, String>>>
/// }
///
/// struct UserService {
///     cache: Dc<InMemoryCache>
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder.register_singleton(InMemoryCache::default());
/// builder.register_scoped_factory(|cache: Dc<InMemoryCache>| Ok(UserService { cache }));
///
/// let container = builder.build().unwrap();
/// let scope = container.create_scope();
/// let users = scope.resolve::<UserService>().unwrap();
///
/// assert!(users.cache.inner.lock().unwrap().is_empty());
/// ```
pub struct Dc<T: ?Sized + Send + Sync>(Arc<T>);

impl<T: ?Sized + Send + Sync> Clone for Dc<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: ?Sized + Send + Sync + Debug> Debug for Dc<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Dc").field(&&*self.0).finish()
    }
}

impl<T: ?Sized + Send + Sync> Deref for Dc<T> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Clone + Send + Sync> DerefMut for Dc<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        Arc::make_mut(&mut self.0)
    }
}

impl<T: ?Sized + Send + Sync> From<Arc<T>> for Dc<T> {
    #[inline]
    fn from(inner: Arc<T>) -> Self {
        Self(inner)
    }
}

impl<T: ?Sized + Send + Sync> Dc<T> {
    /// Unwraps the inner [`Arc`]
    #[inline]
    pub fn into_inner(self) -> Arc<T> {
        self.0
    }
}

impl<T: Send + Sync + Clone> Dc<T> {
    /// Clones and returns the inner `T`.
    ///
    /// Equivalent to calling [`Clone::clone`] on the inner `T`.
    #[inline]
    pub fn cloned(&self) -> T {
        self.0.as_ref().clone()
    }
}

impl<T: ?Sized + Send + Sync + 'static> FromResolver for Dc<T> {
    #[inline]
    fn from_resolver(resolver: &Resolver<'_>) -> Result<Self, Error> {
        resolver
            .resolve::<T>()
            .map(Dc)
    }

    #[inline]
    fn describe(signature: &mut Signature, name: Option<&'static str>) {
        signature.push(name, ParameterKind::Contract(Contract::of::<T>()));
    }
}

/// Resolves from the [`Scope`] carried by the request
impl<T: ?Sized + Send + Sync + 'static> TryFrom<&Extensions> for Dc<T> {
    type Error = Error;

    #[inline]
    fn try_from(extensions: &Extensions) -> Result<Self, Self::Error> {
        let scope: &Scope = extensions.try_into()?;
        scope.resolve::<T>().map(Dc)
    }
}

impl<T: ?Sized + Send + Sync + 'static> TryFrom<&Parts> for Dc<T> {
    type Error = Error;

    #[inline]
    fn try_from(parts: &Parts) -> Result<Self, Self::Error> {
        Self::try_from(&parts.extensions)
    }
}
