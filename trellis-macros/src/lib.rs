//! Proc-Macros for the trellis Dependency Injection container
//!

use proc_macro::TokenStream;
use syn::parse_macro_input;

mod inject;

/// Implements the `Inject` trait for a struct, resolving every field from the container.
///
/// Each field becomes a constructor parameter, in declaration order:
/// - `Dc<T>` and `Arc<T>` fields are required dependencies on `T`;
/// - `Option<Dc<T>>` fields are optional dependencies, `None` if `T` is not registered;
/// - `PhantomData` fields take nothing from the container;
/// - fields marked with `#[inject(default)]` are initialized with [`Default::default`].
///
/// Primitive fields (numbers, `bool`, `char`, `String`) without `#[inject(default)]`
/// have nothing to be resolved from, so the type is reported as non-introspectable
/// when it is resolved or validated.
///
/// `#[inject(on_startup = method)]` on the struct runs `fn method(&self) -> Result<(), Error>`
/// on every constructed instance, see `Inject::on_startup`.
///
/// # Example
/// ```ignore
/// use trellis::{Dc, Inject};
///
/// #[derive(Inject)]
/// struct UserService {
///     repo: Dc<dyn Repository>,
///     audit: Option<Dc<AuditLog>>,
///     #[inject(default)]
///     retries: u32,
/// }
///
/// // This expands to:
/// // impl Inject for UserService {
/// //     fn inject(resolver: &Resolver<'_>) -> Result<Self, Error> {
/// //         Ok(Self {
/// //             repo: <Dc<dyn Repository> as FromResolver>::from_resolver(resolver)?,
/// //             audit: <Option<Dc<AuditLog>> as FromResolver>::from_resolver(resolver)?,
/// //             retries: Default::default(),
/// //         })
/// //     }
/// //
/// //     fn signature() -> Signature { /* (repo, audit, retries = default) */ }
/// // }
/// ```
#[proc_macro_derive(Inject, attributes(inject))]
pub fn derive_inject(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as syn::DeriveInput);
    inject::expand_inject(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
