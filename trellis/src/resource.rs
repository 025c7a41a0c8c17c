//! Resource providers: instances with a startup and a release hook

use crate::error::Error;
use std::{
    fmt::{Debug, Formatter},
    sync::Arc
};

type ReleaseFn<T> = Box<
    dyn FnOnce(&T)
    + Send
    + Sync
>;

type StartupFn<T> = Box<
    dyn FnOnce(&T) -> Result<(), Error>
    + Send
    + Sync
>;

/// A type-erased release hook that is ready to run
pub(crate) type Teardown = Box<
    dyn FnOnce()
    + Send
    + Sync
>;

/// A value produced by a resource factory together with the hooks that start and release it.
///
/// The startup hook runs once the value is constructed, before anyone can resolve it.
/// If it fails, the release hook runs right away and the resolution fails.
///
/// The release hook runs when the owner of the resolved instance goes away: the [`Scope`](crate::Scope)
/// that resolved it, or the container itself for singletons and for services
/// resolved outside of any scope.
///
/// # Example
/// ```
/// use trellis::{ContainerBuilder, Resource};
///
/// struct Connection { id: u32 }
///
/// let mut builder = ContainerBuilder::new();
/// builder.register_scoped_resource(|| Resource::new(Connection { id: 1 })
///     .on_release(|conn| println!("closing connection {}", conn.id)));
///
/// let container = builder.build().unwrap();
/// container.in_scope(|scope| {
///     let conn = scope.resolve::<Connection>().unwrap();
///     assert_eq!(conn.id, 1);
/// }); // "closing connection 1"
/// ```
pub struct Resource<T> {
    value: T,
    startup: Option<StartupFn<T>>,
    release: Option<ReleaseFn<T>>
}

impl<T: Debug> Debug for Resource<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resource")
            .field("value", &self.value)
            .field("startup", &self.startup.is_some())
            .field("release", &self.release.is_some())
            .finish()
    }
}

impl<T> From<T> for Resource<T> {
    #[inline]
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T> Resource<T> {
    /// Wraps a value that needs no release
    #[inline]
    pub fn new(value: T) -> Self {
        Self { value, startup: None, release: None }
    }

    /// Sets the hook that initializes the value after construction
    #[inline]
    pub fn on_startup<F>(mut self, startup: F) -> Self
    where
        F: FnOnce(&T) -> Result<(), Error> + Send + Sync + 'static
    {
        self.startup = Some(Box::new(startup));
        self
    }

    /// Sets the hook that releases the value
    #[inline]
    pub fn on_release<F>(mut self, release: F) -> Self
    where
        F: FnOnce(&T) + Send + Sync + 'static
    {
        self.release = Some(Box::new(release));
        self
    }

    /// Returns the wrapped value, dropping its hooks
    #[inline]
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: Send + Sync + 'static> Resource<T> {
    /// Runs the startup hook, then moves the value into a shared pointer
    /// and binds the release hook to it
    pub(crate) fn start(self) -> Result<(Arc<T>, Option<Teardown>), Error> {
        let Self { value, startup, release } = self;
        if let Some(startup) = startup {
            if let Err(err) = startup(&value) {
                if let Some(release) = release {
                    release(&value);
                }
                return Err(err);
            }
        }

        let value = Arc::new(value);
        let teardown = release.map(|release| {
            let value = value.clone();
            Box::new(move || release(&value)) as Teardown
        });
        Ok((value, teardown))
    }
}
