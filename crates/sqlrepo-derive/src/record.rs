//! Record derive macro implementation

use crate::attrs::{self, FieldInfo};
use heck::ToSnakeCase;
use proc_macro2::TokenStream;
use quote::quote;
use std::collections::HashSet;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let table = attrs::container_attrs(&input)?
        .table
        .unwrap_or_else(|| name.to_string().to_snake_case());
    let fields = attrs::fields(&input, "Record")?;
    let columns: Vec<&FieldInfo> = fields.iter().filter(|f| !f.skip).collect();

    if columns.is_empty() {
        return Err(syn::Error::new_spanned(
            &input,
            "Record requires at least one non-skipped field",
        ));
    }

    let mut seen = HashSet::with_capacity(columns.len());
    for field in &columns {
        if !seen.insert(field.column.to_ascii_lowercase()) {
            return Err(syn::Error::new_spanned(
                field.ident,
                format!("duplicate column '{}'", field.column),
            ));
        }
    }

    let mut ids = columns.iter().filter(|f| f.id);
    let id = match (ids.next(), ids.next()) {
        (Some(id), None) => id,
        (None, _) => {
            return Err(syn::Error::new_spanned(
                &input,
                "Record requires exactly one field marked #[record(id)]",
            ));
        }
        (Some(_), Some(second)) => {
            return Err(syn::Error::new_spanned(
                second.ident,
                "only one field may be marked #[record(id)]",
            ));
        }
    };

    let column_names: Vec<&str> = columns.iter().map(|f| f.column.as_str()).collect();
    let column_count = columns.len();
    let primary_key = &id.column;
    let id_ident = id.ident;

    let inserts = columns.iter().map(|field| {
        let ident = field.ident;
        let column = &field.column;
        quote! {
            projection.insert(#column, sqlrepo::Value::from(::core::clone::Clone::clone(&self.#ident)));
        }
    });

    Ok(quote! {
        impl #impl_generics sqlrepo::Record for #name #ty_generics #where_clause {
            const TABLE: &'static str = #table;
            const COLUMNS: &'static [&'static str] = &[#(#column_names),*];
            const PRIMARY_KEY: &'static str = #primary_key;

            fn projection(&self) -> sqlrepo::Projection {
                let mut projection = sqlrepo::Projection::with_capacity(#column_count);
                #(#inserts)*
                projection
            }

            fn primary_key(&self) -> (&'static str, sqlrepo::Value) {
                (
                    #primary_key,
                    sqlrepo::Value::from(::core::clone::Clone::clone(&self.#id_ident)),
                )
            }
        }
    })
}
