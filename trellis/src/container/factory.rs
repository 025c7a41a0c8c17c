//! Constructor closures and the signatures their arguments declare

use super::Error;

/// A service constructor: a closure taking up to six resolved dependencies.
///
/// `Args` is the tuple of argument types. It is resolved through
/// [`FromResolver`](crate::FromResolver) right before the call and, at registration time,
/// describes the constructor [`Signature`](crate::Signature) that cycle detection,
/// captive checks and validation walk.
///
/// A closure without arguments returns the service itself and cannot fail.
/// A closure with arguments returns `Result<Output, Error>`, so that it may
/// report its own failures with [`Error::other`].
pub trait GenericFactory<Args>: Send + Sync + 'static {
    /// The constructed service
    type Output;

    /// Constructs the service from already resolved arguments
    fn call(&self, args: Args) -> Result<Self::Output, Error>;
}

impl<F, R> GenericFactory<()> for F
where
    F: Fn() -> R + Send + Sync + 'static
{
    type Output = R;

    #[inline]
    fn call(&self, _: ()) -> Result<R, Error> {
        Ok(self())
    }
}

macro_rules! impl_constructor ({ $($arg:ident)* } => {
    impl<F, R, $($arg,)*> GenericFactory<($($arg,)*)> for F
    where
        F: Fn($($arg),*) -> Result<R, Error> + Send + Sync + 'static,
    {
        type Output = R;

        #[inline]
        #[allow(non_snake_case)]
        fn call(&self, ($($arg,)*): ($($arg,)*)) -> Result<R, Error> {
            self($($arg),*)
        }
    }
});

impl_constructor! { A1 }
impl_constructor! { A1 A2 }
impl_constructor! { A1 A2 A3 }
impl_constructor! { A1 A2 A3 A4 }
impl_constructor! { A1 A2 A3 A4 A5 }
impl_constructor! { A1 A2 A3 A4 A5 A6 }

#[cfg(test)]
mod tests {
    use crate::{ContainerBuilder, Dc};
    use super::*;

    #[derive(Debug, Clone, Copy)]
    struct X(i32);

    #[derive(Debug, Clone, Copy)]
    struct Y(i32);

    #[derive(Debug, Clone, Copy)]
    struct Point(X, Y);

    #[test]
    fn it_calls_factory_without_arguments() {
        let factory = || X(1);

        let x = factory.call(()).unwrap();

        assert_eq!(x.0, 1);
    }

    #[test]
    fn it_propagates_factory_error() {
        let factory = |x: X| -> Result<Y, Error> {
            if x.0 < 0 { Err(Error::other("negative")) } else { Ok(Y(x.0)) }
        };

        let err = factory.call((X(-1),)).unwrap_err();

        assert_eq!(err.to_string(), "negative");
    }

    #[test]
    fn it_constructs_from_resolved_dependencies() {
        let mut container = ContainerBuilder::new();
        container.register_transient_factory(|| X(1));
        container.register_transient_factory(|| Y(2));
        container.register_transient_factory(|x: Dc<X>, y: Dc<Y>| Ok(Point(*x, *y)));

        let container = container.build().unwrap();

        let point = container.resolve::<Point>().unwrap();

        assert_eq!(point.0.0, 1);
        assert_eq!(point.1.0, 2);
    }
}
