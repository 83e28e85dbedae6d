//! Loading configuration documents from disk.
//!
//! Build scripts are parsed by a tolerant line-oriented reader of the Kotlin DSL subset used by
//! Flutter app modules; TOML and JSON documents are the serde form of [`ConfigDocument`].
//!
//! [`ConfigDocument`]: gradleplan_types::document::ConfigDocument

mod error;
mod kts;
mod load;

pub use error::IngestError;
pub use kts::parse_kts;
pub use load::{
    DOC_TOML_NAME, DocumentFormat, discover_documents, load_document, parse_document, parse_json,
    parse_toml,
};
