//! FromRow derive macro implementation

use crate::attrs;
use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Result};

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = attrs::fields(&input, "FromRow")?;

    let field_extracts: Vec<_> = fields
        .iter()
        .map(|field| {
            let field_name = field.ident;
            if field.skip {
                let ty = field.ty;
                quote! {
                    #field_name: <#ty as ::core::default::Default>::default()
                }
            } else {
                let column_name = &field.column;
                quote! {
                    #field_name: row.try_get_column(#column_name)?
                }
            }
        })
        .collect();

    Ok(quote! {
        impl #impl_generics sqlrepo::FromRow for #name #ty_generics #where_clause {
            fn from_row(row: &sqlrepo::Row) -> sqlrepo::RepoResult<Self> {
                Ok(Self {
                    #(#field_extracts),*
                })
            }
        }
    })
}
