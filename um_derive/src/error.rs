//! Derive macro for error types.
//!
//! Generates `std::fmt::Display` and `std::error::Error` implementations for
//! error enums. Replacement for the `thiserror` crate, cut down to the enum
//! shapes this workspace actually declares.
//!
//! # Usage
//!
//! ```ignore
//! use um_derive::Error;
//!
//! #[derive(Debug, Error)]
//! pub enum MachineError {
//!     #[error("division by zero at offset {offset}")]
//!     DivisionByZero { offset: usize },
//!
//!     #[error("cannot read program image: {0}")]
//!     ImageIo(String),
//!
//!     #[error("segment 0 cannot be abandoned")]
//!     AbandonCodeSegment,
//! }
//! ```
//!
//! Tuple fields are referenced positionally (`{0}`, `{1}`), struct fields by
//! name (`{field}`); format specs like `{value:#x}` pass straight through.

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input};

/// Derives `Display` and `Error` for an enum whose every variant carries an
/// `#[error("...")]` message.
pub fn derive_error(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "Error derive only supports enums",
        ));
    };

    let arms = data
        .variants
        .iter()
        .map(variant_arm)
        .collect::<syn::Result<Vec<_>>>()?;

    Ok(quote! {
        impl ::std::fmt::Display for #name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self {
                    #(#arms)*
                }
            }
        }

        impl ::std::error::Error for #name {}
    })
}

/// Builds one `match` arm for a variant: destructures its fields under
/// stable names and hands every binding to `write!` as a named argument.
fn variant_arm(variant: &syn::Variant) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &variant.ident;
    let message = message_for(variant)?;

    // All three field shapes collapse to a pattern plus one binding list.
    let (pattern, bindings, format) = match &variant.fields {
        Fields::Unit => (quote! { Self::#ident }, Vec::new(), message),
        Fields::Named(fields) => {
            let bindings: Vec<syn::Ident> = fields
                .named
                .iter()
                .filter_map(|field| field.ident.clone())
                .collect();
            let pattern = quote! { Self::#ident { #(#bindings),* } };
            (pattern, bindings, message)
        }
        Fields::Unnamed(fields) => {
            let bindings: Vec<syn::Ident> = (0..fields.unnamed.len())
                .map(|position| format_ident!("p{position}"))
                .collect();
            let pattern = quote! { Self::#ident(#(#bindings),*) };
            (pattern, bindings, rename_positional_args(&message))
        }
    };

    Ok(quote! {
        #pattern => write!(f, #format #(, #bindings = #bindings)*),
    })
}

/// Pulls the message out of the variant's `#[error("...")]` attribute.
fn message_for(variant: &syn::Variant) -> syn::Result<String> {
    for attr in &variant.attrs {
        if attr.path().is_ident("error") {
            let lit: LitStr = attr.parse_args().map_err(|_| {
                syn::Error::new_spanned(
                    attr,
                    "#[error] takes a format string, e.g. #[error(\"invalid opcode {opcode}\")]",
                )
            })?;
            return Ok(lit.value());
        }
    }

    Err(syn::Error::new_spanned(
        variant,
        format!(
            "variant `{}` is missing its #[error(\"...\")] message",
            variant.ident
        ),
    ))
}

/// Rewrites positional references like `{0}` to the `p0` bindings the
/// generated arm destructures. A single pass over the string; format specs
/// like `{0:x}` pass through with the reference renamed.
fn rename_positional_args(message: &str) -> String {
    let mut renamed = String::with_capacity(message.len() + 4);
    let mut rest = message.chars().peekable();
    while let Some(ch) = rest.next() {
        renamed.push(ch);
        if ch == '{' && rest.peek().is_some_and(char::is_ascii_digit) {
            renamed.push('p');
        }
    }
    renamed
}
