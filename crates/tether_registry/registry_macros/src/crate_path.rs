//! Where the derive finds `tether_registry` from the deriving crate.
//!
//! Derived impls name `Consumer` and `Slots` by absolute path, and that path
//! depends on how the deriving crate reached the registry. Inside
//! `tether_registry` itself (its own tests and doctests) the crate refers to
//! itself by name through `extern crate self`. A direct dependency may be
//! renamed in `Cargo.toml`, so its local name is looked up. Crates that only
//! depend on the `tether` facade go through its re-export.

use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};

const REGISTRY: &str = "tether_registry";
const FACADE: &str = "tether";

/// Returns the path derived impls use to reach `tether_registry`.
pub(crate) fn tether_registry_path() -> TokenStream {
    if let Ok(found) = crate_name(REGISTRY) {
        return match found {
            FoundCrate::Itself => quote!(tether_registry),
            FoundCrate::Name(local) => local_ident(&local),
        };
    }

    match crate_name(FACADE) {
        Ok(FoundCrate::Name(local)) => {
            let facade = local_ident(&local);
            quote!(#facade::tether_registry)
        }
        // Neither is listed; let the compiler report the missing crate.
        _ => quote!(tether_registry),
    }
}

fn local_ident(name: &str) -> TokenStream {
    let ident = format_ident!("{}", name);
    quote!(#ident)
}
