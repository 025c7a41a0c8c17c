//! Describes dependency injection errors

use std::{
    borrow::Cow,
    fmt::{Display, Formatter}
};

/// Errors produced while registering, validating or resolving services.
///
/// All the structural kinds (see [`Error::is_structural`]) describe a defect in the
/// registration graph or at a usage site; none of them is worth retrying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A required contract has no registration
    NotRegistered(&'static str),

    /// A contract depends, directly or transitively, on itself.
    ///
    /// Holds the cycle in resolution order, starting and ending with the same contract,
    /// e.g. `[A, B, C, A]`.
    CircularDependency(Vec<&'static str>),

    /// A dependency was requested by its implementation type
    /// while only the contract it implements is registered
    InterfaceMismatch {
        /// The type that was requested
        requested: &'static str,
        /// The contract the requested type is registered under
        registered: &'static str
    },

    /// A singleton transitively depends on a scoped service
    CaptiveDependency {
        /// The singleton that would capture the scoped service
        singleton: &'static str,
        /// The scoped service that would be captured
        scoped: &'static str,
        /// Dependency chain from the singleton to the scoped service, both included
        path: Vec<&'static str>
    },

    /// A service resolved a dependency its signature does not declare
    UndeclaredDependency {
        /// The service being constructed
        service: &'static str,
        /// The contract it requested
        dependency: &'static str
    },

    /// A constructor parameter is neither a dependency contract nor has a default value
    NonIntrospectable {
        /// The service whose constructor cannot be inspected
        service: &'static str,
        /// The offending parameter
        parameter: Cow<'static, str>
    },

    /// The same contract has been registered more than once
    DuplicateRegistration(&'static str),

    /// A scoped service was requested outside any scope
    ScopeRequired(&'static str),

    /// A service was requested from a scope that has already been closed
    ScopeClosed,

    /// The request does not carry a DI scope
    ScopeMissing,

    /// A resolved instance could not be cast to the requested type
    ResolveFailed(&'static str),

    /// A factory reported an error
    Other(Cow<'static, str>)
}

impl Error {
    /// Creates an [`Error::Other`] from any message.
    ///
    /// Factories use it to report their own failures.
    #[inline]
    pub fn other(msg: impl Into<Cow<'static, str>>) -> Self {
        Error::Other(msg.into())
    }

    /// Returns `true` for errors caused by a defect of the registration graph
    /// or of a usage site rather than by a failing factory.
    pub fn is_structural(&self) -> bool {
        matches!(self,
            Error::NotRegistered(_) |
            Error::CircularDependency(_) |
            Error::InterfaceMismatch { .. } |
            Error::CaptiveDependency { .. } |
            Error::UndeclaredDependency { .. } |
            Error::NonIntrospectable { .. } |
            Error::DuplicateRegistration(_))
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NotRegistered(type_name) => write!(f, "Services Error: service not registered: {type_name}"),
            Error::CircularDependency(cycle) => write!(f, "Services Error: circular dependency detected: {}", cycle.join(" -> ")),
            Error::InterfaceMismatch { requested, registered } => write!(
                f,
                "Services Error: {requested} is not registered as a contract, request it as {registered} instead"
            ),
            Error::CaptiveDependency { singleton, scoped, path } => write!(
                f,
                "Services Error: singleton {singleton} depends on scoped service {scoped}: {}",
                path.join(" -> ")
            ),
            Error::UndeclaredDependency { service, dependency } => write!(
                f,
                "Services Error: {service} resolved {dependency} without declaring it in its signature"
            ),
            Error::NonIntrospectable { service, parameter } => write!(
                f,
                "Services Error: unable to inspect the constructor of {service}: parameter `{parameter}` is neither a dependency nor has a default value"
            ),
            Error::DuplicateRegistration(type_name) => write!(f, "Services Error: service registered more than once: {type_name}"),
            Error::ScopeRequired(type_name) => write!(f, "Services Error: scoped service requested outside of a scope: {type_name}"),
            Error::ScopeClosed => write!(f, "Services Error: DI scope is already closed"),
            Error::ScopeMissing => write!(f, "Services Error: DI scope is missing"),
            Error::ResolveFailed(type_name) => write!(f, "Services Error: unable to resolve the service: {type_name}"),
            Error::Other(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}
