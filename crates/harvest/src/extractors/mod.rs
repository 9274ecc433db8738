// ABOUTME: Field extraction: selector cache, selector extractor, field descriptors and coercions.
// ABOUTME: Everything needed to turn one fragment plus one field declaration into a cleaned value.

//! Field extraction module.
//!
//! Submodules:
//! - `compiled`: process-wide cache of parsed CSS selectors.
//! - `select`: first-match text and attribute extraction from a fragment.
//! - `fields`: field descriptors with their cleaning pipeline.
//! - `coerce`: built-in, absence-tolerant coercions.

pub mod coerce;
pub mod compiled;
pub mod fields;
pub mod select;
