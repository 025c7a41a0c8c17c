//! Macros for dependency injection

use proc_macro2::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Field, Fields, Ident, Type};

const PRIMITIVES: &[&str] = &[
    "bool", "char", "str", "String",
    "i8", "i16", "i32", "i64", "i128", "isize",
    "u8", "u16", "u32", "u64", "u128", "usize",
    "f32", "f64",
];

/// How a field is obtained
#[derive(Debug, PartialEq)]
enum Source {
    /// Resolved through `FromResolver`
    Resolved,
    /// `#[inject(default)]`
    Default,
    /// Primitive with nothing to be resolved from
    Untyped(String),
}

/// Creates a derive-macro for the `Inject` trait
pub(super) fn expand_inject(input: &DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(name, "`Inject` can only be derived for structs"));
    };

    let mut inits = Vec::with_capacity(data.fields.len());
    let mut params = Vec::with_capacity(data.fields.len());
    let mut bounds = Vec::new();

    for field in data.fields.iter() {
        let ty = &field.ty;
        let param_name = match &field.ident {
            Some(ident) => {
                let ident = ident.to_string();
                quote! { ::core::option::Option::Some(#ident) }
            },
            None => quote! { ::core::option::Option::None }
        };

        match classify(field)? {
            Source::Resolved => {
                bounds.push(quote! { #ty: ::trellis::FromResolver });
                inits.push(quote! { <#ty as ::trellis::FromResolver>::from_resolver(resolver)? });
                params.push(quote! {
                    <#ty as ::trellis::FromResolver>::describe(&mut signature, #param_name);
                });
            },
            Source::Default => {
                inits.push(quote! { ::core::default::Default::default() });
                params.push(quote! {
                    signature.push(#param_name, ::trellis::ParameterKind::Default);
                });
            },
            Source::Untyped(type_name) => {
                inits.push(quote! { ::core::default::Default::default() });
                params.push(quote! {
                    signature.push(#param_name, ::trellis::ParameterKind::Untyped(#type_name));
                });
            }
        }
    }

    let body = match &data.fields {
        Fields::Named(fields) => {
            let idents = fields.named.iter().map(|f| &f.ident);
            quote! { Self { #(#idents: #inits),* } }
        },
        Fields::Unnamed(_) => quote! { Self(#(#inits),*) },
        Fields::Unit => quote! { Self },
    };

    let on_startup = startup_hook(input)?.map(|hook| quote! {
        #[inline]
        fn on_startup(&self) -> ::core::result::Result<(), ::trellis::error::Error> {
            Self::#hook(self)
        }
    });

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let mut predicates = where_clause
        .map(|w| w.predicates.iter().map(|p| quote! { #p }).collect::<Vec<_>>())
        .unwrap_or_default();
    // concrete field types need no bound
    if !input.generics.params.is_empty() {
        predicates.extend(bounds);
    }

    Ok(quote! {
        impl #impl_generics ::trellis::Inject for #name #ty_generics
        where
            #(#predicates,)*
        {
            #[inline]
            #[allow(unused_variables)]
            fn inject(resolver: &::trellis::Resolver<'_>) -> ::core::result::Result<Self, ::trellis::error::Error> {
                ::core::result::Result::Ok(#body)
            }

            fn signature() -> ::trellis::Signature {
                #[allow(unused_mut)]
                let mut signature = ::trellis::Signature::new();
                #(#params)*
                signature
            }

            #on_startup
        }
    })
}

/// `#[inject(on_startup = method)]` on the struct itself
fn startup_hook(input: &DeriveInput) -> syn::Result<Option<Ident>> {
    let mut hook = None;
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("inject")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("on_startup") {
                hook = Some(meta.value()?.parse::<Ident>()?);
                Ok(())
            } else {
                Err(meta.error("unsupported inject attribute, expected `on_startup = method`"))
            }
        })?;
    }
    Ok(hook)
}

fn classify(field: &Field) -> syn::Result<Source> {
    let mut default = false;
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("inject")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("default") {
                default = true;
                Ok(())
            } else {
                Err(meta.error("unsupported inject attribute, expected `default`"))
            }
        })?;
    }

    if default {
        return Ok(Source::Default);
    }

    Ok(match primitive(&field.ty) {
        Some(type_name) => Source::Untyped(type_name),
        None => Source::Resolved
    })
}

fn primitive(ty: &Type) -> Option<String> {
    match ty {
        Type::Path(path) if path.qself.is_none() => {
            let ident = path.path.get_ident()?.to_string();
            PRIMITIVES.contains(&ident.as_str()).then_some(ident)
        },
        Type::Reference(reference) => primitive(&reference.elem).map(|t| format!("&{t}")),
        _ => None
    }
}
