// ABOUTME: Main library entry point for Harvest, a declarative HTML record extractor.
// ABOUTME: Re-exports the public API: Client, Schema, SchemaBuilder, Field, Related, Record, HarvestError.

//! Harvest - declarative extraction of typed records from HTML pages.
//!
//! A [`Schema`] declares a root selector, a set of fields read from each
//! match, and related members that point at other schemas, either within
//! the same fragment or behind a followed link. Lookups turn a document into
//! [`Record`]s; related members are fetched lazily and cached per record.
//!
//! # Example
//!
//! ```
//! use digests_harvest::{Client, FetchOptions, Field, Result, Schema};
//!
//! let client = Client::with_fetcher(|_: &str, _: &FetchOptions| -> Result<String> {
//!     Ok(r#"<p class="item"><a href="/a">First</a></p>"#.to_string())
//! });
//!
//! let item = Schema::builder("Item")
//!     .selector("p.item")
//!     .base_url("http://localhost")
//!     .field("label", Field::text().selector("a"))
//!     .field("url", Field::attribute("href").selector("a"))
//!     .build()?;
//!
//! let record = item.one(&client, "", 0)?;
//! assert_eq!(record.text("label"), Some("First"));
//! assert_eq!(record.text("url"), Some("/a"));
//! # Ok::<(), digests_harvest::HarvestError>(())
//! ```

pub mod client;
pub mod dom;
pub mod error;
pub mod extractors;
pub mod options;
pub mod record;
pub mod resource;
pub mod schema;
pub mod urls;

pub use crate::client::{Client, Source};
pub use crate::dom::Fragment;
pub use crate::error::{ErrorCode, HarvestError, Result};
pub use crate::extractors::fields::{ExtractionKind, Field};
pub use crate::options::{ClientBuilder, Options, SchemaOptions};
pub use crate::record::Record;
pub use crate::resource::{FetchOptions, Fetcher, HttpFetcher};
pub use crate::schema::loader::SchemaCatalog;
pub use crate::schema::{CleanHook, Related, Schema, SchemaBuilder, Target};
