mod record;

use proc_macro::TokenStream;

// ============================================================================
// #[derive(Record)] derive macro
// ============================================================================

/// Derive macro for the `Record` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Clone, Serialize, Deserialize, Record)]
/// #[record(collection = "diving_certs_data_v2")]
/// struct Certification {
///     #[record(id)]
///     pub id: String,
///     pub title: String,
/// }
/// ```
///
/// - `#[record(collection = "...")]` sets the storage key the collection lives under.
///   If omitted, defaults to snake_case struct name + "s".
/// - `#[record(id)]` marks the `String` field used as the unique identifier.
///   If omitted, defaults to a field named `id`.
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    record::derive_record(input)
}
