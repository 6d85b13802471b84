use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr};

pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let collection = match extract_collection(&input) {
        Ok(collection) => collection,
        Err(err) => return err.to_compile_error().into(),
    };

    let id_field = match extract_id_field(&input) {
        Ok(field) => field,
        Err(err) => return err.to_compile_error().into(),
    };

    let expanded = quote! {
        impl bucceo::Record for #name {
            const COLLECTION: &'static str = #collection;

            fn id(&self) -> &str {
                &self.#id_field
            }

            fn set_id(&mut self, id: String) {
                self.#id_field = id;
            }
        }
    };

    TokenStream::from(expanded)
}

fn extract_collection(input: &DeriveInput) -> syn::Result<String> {
    for attr in &input.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }

        let mut collection = None;
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("collection") {
                let value: LitStr = meta.value()?.parse()?;
                collection = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported record attribute, expected `collection`"))
            }
        })?;

        if let Some(c) = collection {
            if c.is_empty() {
                return Err(syn::Error::new_spanned(attr, "collection key must not be empty"));
            }
            return Ok(c);
        }
    }

    // Default: snake_case struct name + "s"
    let name = input.ident.to_string();
    Ok(format!("{}s", to_snake_case(&name)))
}

fn extract_id_field(input: &DeriveInput) -> syn::Result<syn::Ident> {
    let Data::Struct(data_struct) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Record can only be derived for structs",
        ));
    };
    let Fields::Named(fields) = &data_struct.fields else {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Record requires a struct with named fields",
        ));
    };

    for field in &fields.named {
        for attr in &field.attrs {
            if !attr.path().is_ident("record") {
                continue;
            }
            let mut is_id = false;
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("id") {
                    is_id = true;
                    Ok(())
                } else {
                    Err(meta.error("unsupported field attribute, expected `id`"))
                }
            })?;
            if is_id {
                if let Some(ident) = &field.ident {
                    return Ok(ident.clone());
                }
            }
        }
    }

    // Default: look for a field named "id"
    fields
        .named
        .iter()
        .filter_map(|field| field.ident.as_ref())
        .find(|ident| *ident == "id")
        .cloned()
        .ok_or_else(|| {
            syn::Error::new_spanned(
                &input.ident,
                "Record derive: no field marked with #[record(id)] and no field named `id`",
            )
        })
}

fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, ch) in s.chars().enumerate() {
        if ch.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else {
            result.push(ch);
        }
    }
    result
}
