use proc_macro2::Span;
use syn::{Error, LitStr, Result};

pub(crate) fn is_valid_sql_ident(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !(first.is_ascii_alphabetic() || first == '_') {
        return false;
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A column name: one identifier.
pub(crate) fn parse_column(lit: &LitStr) -> Result<String> {
    parse_sql_ident_with_span(lit.value().trim(), lit.span(), "column")
}

/// A table name: one identifier, optionally schema-qualified (`schema.table`).
pub(crate) fn parse_table(lit: &LitStr) -> Result<String> {
    let raw = lit.value();
    let raw = raw.trim();
    let parts = raw
        .split('.')
        .map(|part| parse_sql_ident_with_span(part, lit.span(), "table"))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join("."))
}

pub(crate) fn parse_sql_ident_with_span(s: &str, span: Span, what: &str) -> Result<String> {
    let s = s.trim();
    if s.is_empty() {
        return Err(Error::new(span, format!("{what} must not be empty")));
    }
    if !is_valid_sql_ident(s) {
        return Err(Error::new(
            span,
            format!("{what} must be a valid SQL identifier (expected [A-Za-z_][A-Za-z0-9_]*)"),
        ));
    }
    Ok(s.to_string())
}
