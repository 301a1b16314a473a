//! Derive macros for sqlrepo
//!
//! Provides `#[derive(FromRow)]` and `#[derive(Record)]` macros. Both read the
//! same `#[record(...)]` attributes.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod attrs;
mod from_row;
mod record;
mod sql_ident;

/// Derive `FromRow` trait for a struct.
///
/// # Example
///
/// ```ignore
/// use sqlrepo::FromRow;
///
/// #[derive(FromRow)]
/// struct Person {
///     id: i64,
///     #[record(column = "full_name")]
///     name: String,
///     #[record(skip)]
///     cached_greeting: String,
/// }
/// ```
///
/// # Attributes
///
/// - `#[record(column = "name")]` - Map field to a different column name
/// - `#[record(skip)]` - Not a column; filled with `Default::default()`
#[proc_macro_derive(FromRow, attributes(record))]
pub fn derive_from_row(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    from_row::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}

/// Derive the `Record` contract for a struct.
///
/// The struct must also implement `FromRow` (usually derived alongside), and
/// every non-skipped field type must be `Clone + Into<sqlrepo::Value>`.
///
/// # Example
///
/// ```ignore
/// use sqlrepo::{FromRow, Record};
///
/// #[derive(FromRow, Record)]
/// #[record(table = "persons")]
/// struct Person {
///     #[record(id)]
///     id: i64,
///     name: String,
/// }
/// ```
///
/// # Generated
///
/// - `TABLE` - from `#[record(table = "...")]`, else the struct name in snake_case
/// - `COLUMNS` - non-skipped fields in declaration order
/// - `PRIMARY_KEY` - the column of the `#[record(id)]` field
/// - `projection()` / `primary_key()` - field values as `sqlrepo::Value`
///
/// # Attributes
///
/// - `#[record(table = "name")]` - Table name, optionally `schema.table`
/// - `#[record(id)]` - Mark field as primary key (exactly one required)
/// - `#[record(column = "name")]` - Map field to different column name
/// - `#[record(skip)]` - Exclude field from the record's columns
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    record::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
