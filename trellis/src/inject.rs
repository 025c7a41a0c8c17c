//! Utilities to inject and resolve dependencies

use crate::{Resolver, Signature};
use crate::error::Error;

/// A trait that adds the ability to inject dependencies when resolving a type from the DI container
///
/// If there is no need to inject other dependencies, the `struct` must implement the `Default` trait
///
/// # Example
/// ```
/// use trellis::ContainerBuilder;
///
/// #[derive(Default)]
/// struct ScopedService;
///
/// let mut builder = ContainerBuilder::new();
/// builder.register_scoped::<ScopedService>();
///
/// let container = builder.build().unwrap();
/// let scope = container.create_scope();
/// let service = scope.resolve::<ScopedService>();
///
/// assert!(service.is_ok());
/// ```
///
/// If it's required to construct a `struct` from other dependencies, the `Inject` can be implemented manually.
/// The [`Inject::signature`] must then list every dependency [`Inject::inject`] resolves, in the same order,
/// so that the validator can see them.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use trellis::{ContainerBuilder, Inject, Resolver, Signature, error::Error};
///
/// #[derive(Default)]
/// struct ScopedService;
///
/// struct TransientService {
///     service: Arc<ScopedService>
/// }
///
/// impl Inject for TransientService {
///     fn inject(resolver: &Resolver<'_>) -> Result<Self, Error> {
///         let service = resolver.resolve::<ScopedService>()?;
///         Ok(Self { service })
///     }
///
///     fn signature() -> Signature {
///         Signature::new().with::<ScopedService>("service")
///     }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder.register_scoped::<ScopedService>();
/// builder.register_transient::<TransientService>();
///
/// let container = builder.build().unwrap();
/// container.in_scope(|scope| {
///     let transient = scope.resolve::<TransientService>().unwrap();
///     let scoped = scope.resolve::<ScopedService>().unwrap();
///     assert!(Arc::ptr_eq(&transient.service, &scoped));
/// });
/// ```
///
/// With the `macros` feature, `#[derive(Inject)]` generates both methods from the struct fields.
pub trait Inject: Sized + Send + Sync + 'static {
    /// Constructs `Self`, resolving its dependencies
    fn inject(resolver: &Resolver<'_>) -> Result<Self, Error>;

    /// Constructor parameters of `Self`, in the order [`Inject::inject`] resolves them
    #[inline]
    fn signature() -> Signature {
        Signature::new()
    }

    /// Initializes the constructed instance before it is cached or handed out.
    ///
    /// An error fails the resolution; nothing is cached.
    #[inline]
    fn on_startup(&self) -> Result<(), Error> {
        Ok(())
    }
}

impl<T: Default + Send + Sync + 'static> Inject for T {
    #[inline]
    fn inject(_: &Resolver<'_>) -> Result<Self, Error> {
        Ok(Self::default())
    }
}
