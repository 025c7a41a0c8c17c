//! Dependency injection container with singleton, scoped and transient lifetimes.
//!
//! Services are registered on a [`ContainerBuilder`] against a contract, either the
//! concrete type itself or a trait object it implements, and resolved as fully wired
//! object graphs from the built [`Container`] or from a [`Scope`].
//!
//! Every registration carries the signature of its constructor: the argument types of a
//! factory closure, or [`Inject::signature`]. The resolver walks these signatures to detect
//! circular dependencies, and the validator walks them to find singletons that would
//! capture scoped services.
//!
//! # Example
//! ```
//! use std::sync::Arc;
//! use trellis::{ContainerBuilder, Dc, Lifetime, implements};
//!
//! trait Repository: Send + Sync {
//!     fn name(&self) -> String;
//! }
//!
//! #[derive(Default)]
//! struct InMemoryRepository;
//!
//! impl Repository for InMemoryRepository {
//!     fn name(&self) -> String {
//!         "in-memory".into()
//!     }
//! }
//!
//! implements! { dyn Repository: InMemoryRepository }
//!
//! struct UserService {
//!     repo: Arc<dyn Repository>
//! }
//!
//! let mut builder = ContainerBuilder::new().with_validation();
//! builder.register_inject_as::<dyn Repository, InMemoryRepository>(Lifetime::Singleton);
//! builder.register_scoped_factory(|repo: Dc<dyn Repository>| Ok(UserService { repo: repo.into_inner() }));
//!
//! let container = builder.build().unwrap();
//!
//! container.in_scope(|scope| {
//!     let users = scope.resolve::<UserService>().unwrap();
//!     assert_eq!(users.repo.name(), "in-memory");
//! });
//! ```

extern crate self as trellis;

pub use crate::{
    container::{Container, ContainerBuilder, GenericFactory, FromResolver},
    contract::{Contract, Implements, Lifetime},
    dc::Dc,
    inject::Inject,
    resolver::Resolver,
    resource::Resource,
    scope::Scope,
    signature::{Dependency, Parameter, ParameterKind, Signature},
};

#[cfg(feature = "macros")]
pub use trellis_macros::Inject;

pub mod error;
pub mod container;
pub mod contract;
pub mod dc;
pub mod inject;
pub mod resolver;
pub mod resource;
pub mod scope;
pub mod signature;

mod registry;
mod validator;
