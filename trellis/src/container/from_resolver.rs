//! Extractors for fetching factory arguments from DI container

use super::Error;
use crate::{Contract, Resolver, Signature, ParameterKind};
use std::{marker::PhantomData, sync::Arc};

/// A trait that defines how to extract the `Self` from DI container
/// and how `Self` appears in a constructor signature.
pub trait FromResolver: Sized + Send + Sync {
    /// Extracts `Self` from DI container
    fn from_resolver(resolver: &Resolver<'_>) -> Result<Self, Error>;

    /// Appends the parameters `Self` takes to the constructor signature
    fn describe(signature: &mut Signature, name: Option<&'static str>);
}

/// A catch-all marker parameter: takes nothing from the container
impl<T: ?Sized + Send + Sync> FromResolver for PhantomData<T> {
    #[inline]
    fn from_resolver(_: &Resolver<'_>) -> Result<Self, Error> {
        Ok(PhantomData)
    }

    #[inline]
    fn describe(signature: &mut Signature, name: Option<&'static str>) {
        signature.push(name, ParameterKind::CatchAll);
    }
}

impl FromResolver for () {
    #[inline]
    fn from_resolver(_: &Resolver<'_>) -> Result<Self, Error> {
        Ok(())
    }

    #[inline]
    fn describe(_: &mut Signature, _: Option<&'static str>) {}
}

impl<C: ?Sized + Send + Sync + 'static> FromResolver for Arc<C> {
    #[inline]
    fn from_resolver(resolver: &Resolver<'_>) -> Result<Self, Error> {
        resolver.resolve::<C>()
    }

    #[inline]
    fn describe(signature: &mut Signature, name: Option<&'static str>) {
        signature.push(name, ParameterKind::Contract(Contract::of::<C>()));
    }
}

impl<T: FromResolver> FromResolver for Option<T> {
    fn from_resolver(resolver: &Resolver<'_>) -> Result<Self, Error> {
        // only the absence of the requested contract itself yields `None`,
        // a missing transitive dependency is still an error
        let mut inner = Signature::new();
        T::describe(&mut inner, None);
        let absent = inner.parameters()
            .iter()
            .any(|p| matches!(p.kind(), ParameterKind::Contract(c) if resolver.is_absent(*c)));
        if absent {
            Ok(None)
        } else {
            T::from_resolver(resolver).map(Some)
        }
    }

    fn describe(signature: &mut Signature, name: Option<&'static str>) {
        let mut inner = Signature::new();
        T::describe(&mut inner, name);
        for parameter in inner.parameters() {
            let kind = match parameter.kind() {
                ParameterKind::Contract(contract) => ParameterKind::Optional(*contract),
                kind => kind.clone()
            };
            signature.push(parameter.name(), kind);
        }
    }
}

macro_rules! define_generic_from_resolver {
    ($($T: ident),*) => {
        impl<$($T: FromResolver),+> FromResolver for ($($T,)+) {
            #[inline]
            #[allow(non_snake_case)]
            fn from_resolver(resolver: &Resolver<'_>) -> Result<Self, Error>{
                let tuple = (
                    $(
                    $T::from_resolver(resolver)?,
                    )*
                );
                Ok(tuple)
            }

            #[inline]
            fn describe(signature: &mut Signature, _: Option<&'static str>) {
                $(
                $T::describe(signature, None);
                )*
            }
        }
    }
}

define_generic_from_resolver! { T1 }
define_generic_from_resolver! { T1, T2 }
define_generic_from_resolver! { T1, T2, T3 }
define_generic_from_resolver! { T1, T2, T3, T4 }
define_generic_from_resolver! { T1, T2, T3, T4, T5 }
define_generic_from_resolver! { T1, T2, T3, T4, T5, T6 }
