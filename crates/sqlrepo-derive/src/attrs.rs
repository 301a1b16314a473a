//! `#[record(...)]` attribute parsing shared by both derives.

use crate::sql_ident::{parse_column, parse_sql_ident_with_span, parse_table};
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Fields, Ident, LitStr, Result, Type};

#[derive(Default)]
pub(crate) struct ContainerAttrs {
    pub table: Option<String>,
}

pub(crate) struct FieldInfo<'a> {
    pub ident: &'a Ident,
    pub ty: &'a Type,
    pub column: String,
    pub id: bool,
    pub skip: bool,
}

pub(crate) fn container_attrs(input: &DeriveInput) -> Result<ContainerAttrs> {
    let mut out = ContainerAttrs::default();
    for attr in &input.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                let lit: LitStr = meta.value()?.parse()?;
                out.table = Some(parse_table(&lit)?);
                Ok(())
            } else {
                Err(meta.error("unknown struct attribute, expected `table = \"...\"`"))
            }
        })?;
    }
    Ok(out)
}

/// Named fields of a struct with their `#[record(...)]` settings applied.
pub(crate) fn fields<'a>(input: &'a DeriveInput, derive: &str) -> Result<Vec<FieldInfo<'a>>> {
    let named = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    format!("{derive} can only be derived for structs with named fields"),
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                format!("{derive} can only be derived for structs"),
            ));
        }
    };

    named.iter().map(field_info).collect()
}

fn field_info(field: &syn::Field) -> Result<FieldInfo<'_>> {
    let ident = field
        .ident
        .as_ref()
        .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;

    let mut column = None;
    let mut id = false;
    let mut skip = false;
    for attr in &field.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                id = true;
                Ok(())
            } else if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else if meta.path.is_ident("column") {
                let lit: LitStr = meta.value()?.parse()?;
                column = Some(parse_column(&lit)?);
                Ok(())
            } else {
                Err(meta.error("unknown field attribute, expected `id`, `skip` or `column = \"...\"`"))
            }
        })?;
    }

    if skip && (id || column.is_some()) {
        return Err(syn::Error::new_spanned(
            field,
            "`skip` cannot be combined with `id` or `column`",
        ));
    }

    let column = match column {
        Some(column) => column,
        None => parse_sql_ident_with_span(&ident.unraw().to_string(), ident.span(), "column")?,
    };

    Ok(FieldInfo {
        ident,
        ty: &field.ty,
        column,
        id,
        skip,
    })
}
