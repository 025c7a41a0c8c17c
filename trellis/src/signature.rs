//! Constructor signatures declared at compile time
//!
//! A [`Signature`] is the ordered list of parameters a service constructor takes.
//! Factory closures get theirs from the argument types (see [`FromResolver`](crate::FromResolver)),
//! [`Inject`](crate::Inject) types declare it explicitly or via `#[derive(Inject)]`.

use crate::{Contract, error::Error};
use std::{
    borrow::Cow,
    fmt::{Display, Formatter}
};

/// What a single constructor parameter expects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    /// A required dependency
    Contract(Contract),
    /// A dependency that is injected if registered and left empty otherwise
    Optional(Contract),
    /// A value the service provides itself; never resolved
    Default,
    /// A catch-all parameter; never resolved
    CatchAll,
    /// A parameter without a dependency type and without a default value
    Untyped(&'static str),
}

/// A single constructor parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    position: usize,
    name: Option<&'static str>,
    kind: ParameterKind
}

impl Parameter {
    /// Zero-based position of the parameter in the constructor
    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Parameter name, if the constructor declares one
    #[inline]
    pub fn name(&self) -> Option<&'static str> {
        self.name
    }

    /// What the parameter expects
    #[inline]
    pub fn kind(&self) -> &ParameterKind {
        &self.kind
    }

    fn label(&self) -> Cow<'static, str> {
        match self.name {
            Some(name) => Cow::Borrowed(name),
            None => Cow::Owned(format!("#{}", self.position))
        }
    }
}

impl Display for Parameter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = self.label();
        match &self.kind {
            ParameterKind::Contract(c) => write!(f, "{label}: {c}"),
            ParameterKind::Optional(c) => write!(f, "{label}: Option<{c}>"),
            ParameterKind::Default => write!(f, "{label} = default"),
            ParameterKind::CatchAll => write!(f, "{label}: .."),
            ParameterKind::Untyped(type_name) => write!(f, "{label}: {type_name}"),
        }
    }
}

/// A dependency produced by [`Signature::inspect`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    /// Requested contract
    pub contract: Contract,
    /// Whether the dependency may be absent
    pub optional: bool
}

/// Ordered list of the parameters a service constructor takes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    parameters: Vec<Parameter>
}

impl Signature {
    /// Creates an empty signature
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a required dependency on `C`
    #[inline]
    pub fn with<C: ?Sized + 'static>(mut self, name: &'static str) -> Self {
        self.push(Some(name), ParameterKind::Contract(Contract::of::<C>()));
        self
    }

    /// Appends an optional dependency on `C`
    #[inline]
    pub fn with_optional<C: ?Sized + 'static>(mut self, name: &'static str) -> Self {
        self.push(Some(name), ParameterKind::Optional(Contract::of::<C>()));
        self
    }

    /// Appends a parameter
    pub fn push(&mut self, name: Option<&'static str>, kind: ParameterKind) -> &mut Self {
        let position = self.parameters.len();
        self.parameters.push(Parameter { position, name, kind });
        self
    }

    /// Declared parameters in constructor order
    #[inline]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Returns `true` if `contract` is a required or optional dependency
    pub fn declares(&self, contract: Contract) -> bool {
        self.parameters.iter().any(|p| matches!(
            p.kind,
            ParameterKind::Contract(c) | ParameterKind::Optional(c) if c == contract
        ))
    }

    /// Returns `true` if the constructor takes no parameters
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Produces the dependencies `service` requires, in constructor order.
    ///
    /// Default and catch-all parameters are skipped. Fails on the first parameter
    /// that is neither a dependency nor has a default value.
    pub fn inspect(&self, service: Contract) -> Result<Vec<Dependency>, Error> {
        let mut dependencies = Vec::with_capacity(self.parameters.len());
        for parameter in &self.parameters {
            match parameter.kind {
                ParameterKind::Contract(contract) => dependencies.push(Dependency { contract, optional: false }),
                ParameterKind::Optional(contract) => dependencies.push(Dependency { contract, optional: true }),
                ParameterKind::Default | ParameterKind::CatchAll => (),
                ParameterKind::Untyped(_) => return Err(Error::NonIntrospectable {
                    service: service.name(),
                    parameter: parameter.to_string().into()
                }),
            }
        }
        Ok(dependencies)
    }
}

impl Display for Signature {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("(")?;
        for (i, parameter) in self.parameters.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{parameter}")?;
        }
        f.write_str(")")
    }
}
