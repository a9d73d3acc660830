use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, LitStr};

pub fn derive_message(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let display_name = match extract_name(&input) {
        Ok(name) => name,
        Err(err) => return err.to_compile_error().into(),
    };

    let expanded = quote! {
        impl #impl_generics sourced_dispatch::Message for #name #ty_generics #where_clause {
            fn static_type() -> sourced_dispatch::MessageType
            where
                Self: Sized,
            {
                sourced_dispatch::MessageType::new::<Self>(#display_name)
            }

            fn message_type(&self) -> sourced_dispatch::MessageType {
                <Self as sourced_dispatch::Message>::static_type()
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    };

    TokenStream::from(expanded)
}

fn extract_name(input: &DeriveInput) -> syn::Result<String> {
    for attr in &input.attrs {
        if !attr.path().is_ident("message") {
            continue;
        }

        let mut name = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                name = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported message attribute, expected `name`"))
            }
        })?;

        if let Some(n) = name {
            return Ok(n);
        }
    }

    // Default: the struct name
    Ok(input.ident.to_string())
}
