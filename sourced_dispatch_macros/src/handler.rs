use proc_macro::TokenStream;
use quote::quote;
use syn::{punctuated::Punctuated, DeriveInput, Path, Token};

pub fn derive_handler(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let messages = match extract_handled(&input) {
        Ok(messages) => messages,
        Err(err) => return err.to_compile_error().into(),
    };

    let entries = messages.iter().map(|message| {
        quote! {
            (
                <#message as sourced_dispatch::Message>::static_type(),
                sourced_dispatch::MethodDescriptor::handler::<Self, #message>(),
            )
        }
    });

    let expanded = quote! {
        impl #impl_generics sourced_dispatch::HandlerSet for #name #ty_generics #where_clause {
            fn handled_messages() -> ::std::vec::Vec<(
                sourced_dispatch::MessageType,
                sourced_dispatch::MethodDescriptor,
            )> {
                ::std::vec![#(#entries),*]
            }
        }
    };

    TokenStream::from(expanded)
}

fn extract_handled(input: &DeriveInput) -> syn::Result<Vec<Path>> {
    let mut messages = Vec::new();

    for attr in &input.attrs {
        if !attr.path().is_ident("handles") {
            continue;
        }
        let list = attr.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated)?;
        messages.extend(list);
    }

    if messages.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Handler derive: expected at least one #[handles(MessageType, ...)] entry",
        ));
    }

    Ok(messages)
}
