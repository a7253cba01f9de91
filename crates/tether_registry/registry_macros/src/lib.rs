//! Procedural macros for the `tether_registry` crate.
//!
//! This crate provides `#[derive(Consumer)]`, which declares a component's
//! dependency slots from its `#[inject]` fields.
//!
//! # Example
//!
//! ```ignore
//! use tether_registry::prelude::*;
//!
//! #[derive(Default, Consumer)]
//! struct Turret {
//!     #[inject]
//!     targeting: Inject<dyn Targeting>,
//!     #[inject(name = "allies")]
//!     friendly: Collect<dyn Unit>,
//!     // Not a slot.
//!     heat: f32,
//! }
//! ```

mod crate_path;

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input};

/// Derives `Consumer` from the fields annotated with `#[inject]`.
///
/// Each annotated field must be an `Inject<R>` or a `Collect<T>`. Slots are
/// declared in field order and named after the field, unless a name is
/// given with `#[inject(name = "...")]`. Unannotated fields are ignored.
///
/// # Generated Code
///
/// For a struct like:
/// ```ignore
/// #[derive(Consumer)]
/// struct Hud {
///     #[inject]
///     clock: Inject<dyn Clock>,
/// }
/// ```
///
/// The macro generates:
/// ```ignore
/// impl Consumer for Hud {
///     fn declare_slots(slots: &mut Slots<Self>) {
///         slots.slot::<Inject<dyn Clock>>("clock", |this| &this.clock);
///     }
/// }
/// ```
#[proc_macro_derive(Consumer, attributes(inject))]
pub fn derive_consumer(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    match expand_consumer(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_consumer(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            Fields::Unit => {
                return Ok(consumer_impl(input, &[]));
            }
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Consumer can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Consumer can only be derived for structs",
            ));
        }
    };

    let mut declarations = Vec::new();
    for field in fields {
        let Some(attr) = field.attrs.iter().find(|attr| attr.path().is_ident("inject")) else {
            continue;
        };
        // Named fields always have an ident.
        let Some(ident) = &field.ident else {
            continue;
        };

        let mut name = LitStr::new(&ident.to_string(), ident.span());
        if matches!(attr.meta, syn::Meta::List(_)) {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    name = meta.value()?.parse()?;
                    Ok(())
                } else {
                    Err(meta.error("expected `name = \"...\"`"))
                }
            })?;
        }
        if name.value().is_empty() {
            return Err(syn::Error::new_spanned(&name, "slot name must not be empty"));
        }

        let ty = &field.ty;
        declarations.push(quote! {
            slots.slot::<#ty>(#name, |this| &this.#ident);
        });
    }

    Ok(consumer_impl(input, &declarations))
}

fn consumer_impl(
    input: &DeriveInput,
    declarations: &[proc_macro2::TokenStream],
) -> proc_macro2::TokenStream {
    let tr = crate_path::tether_registry_path();
    let ident = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let body = if declarations.is_empty() {
        quote! {
            let _ = slots;
        }
    } else {
        quote! {
            #(#declarations)*
        }
    };

    quote! {
        impl #impl_generics #tr::Consumer for #ident #ty_generics #where_clause {
            fn declare_slots(slots: &mut #tr::Slots<Self>) {
                #body
            }
        }
    }
}
