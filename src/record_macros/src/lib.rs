mod codegen;
mod parser;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Derives `record_core::Record`.
///
/// Every named field is listed in declaration order together with its raw
/// `#[ddb("...")]` and `#[ddb_gsi("...")]` strings. The strings are not
/// interpreted here; `record_core` parses them at run time against the
/// repository configuration.
#[proc_macro_derive(Record, attributes(ddb, ddb_gsi))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match parser::parse_fields(&input) {
        Ok(defs) => codegen::generate_impl(&input, &defs).into(),
        Err(err) => err.to_compile_error().into(),
    }
}
