// ABOUTME: Related-record descriptors and their resolution against an owning record.
// ABOUTME: Resolves in-fragment, selected sub-fragment, or followed-link sources into target-schema records.

//! Related records.
//!
//! A [`Related`] member names a target schema and where its records live:
//!
//! - neither selector nor follow attribute: inside the owning record's fragment;
//! - a selector: inside the first sub-fragment matching it;
//! - a follow attribute: in the document the attribute's URL points to,
//!   resolved against the owning schema's base URL and fetched fresh.
//!
//! "Not found" at any step yields an empty sequence, never an error.

use std::fmt;
use std::sync::Arc;

use crate::dom::Fragment;
use crate::error::Result;
use crate::extractors::compiled::get_or_compile;
use crate::record::Record;
use crate::schema::Schema;
use crate::urls;

/// The schema related records are built with.
#[derive(Clone)]
pub enum Target {
    Schema(Arc<Schema>),
    /// The runtime schema of the owning record.
    SelfType,
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Schema(schema) => write!(f, "Schema({})", schema.name()),
            Target::SelfType => write!(f, "SelfType"),
        }
    }
}

/// A lazily resolved related-record member.
#[derive(Debug, Clone)]
pub struct Related {
    target: Target,
    selector: Option<String>,
    follow: Option<String>,
}

impl Related {
    pub fn to(schema: &Arc<Schema>) -> Self {
        Self::new(Target::Schema(Arc::clone(schema)))
    }

    /// Records of the owning record's own schema, e.g. a "next page" link.
    pub fn to_self() -> Self {
        Self::new(Target::SelfType)
    }

    pub fn new(target: Target) -> Self {
        Self {
            target,
            selector: None,
            follow: None,
        }
    }

    /// Search within the first element matching `css` instead of the whole record.
    pub fn selector(mut self, css: impl Into<String>) -> Self {
        self.selector = Some(css.into());
        self
    }

    /// Treat `attribute` of the source element as a link and search the linked document.
    pub fn follow(mut self, attribute: impl Into<String>) -> Self {
        self.follow = Some(attribute.into());
        self
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn selector_str(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    pub fn follow_attribute(&self) -> Option<&str> {
        self.follow.as_deref()
    }

    /// Build the related records of `owner`.
    pub(crate) fn resolve(&self, owner: &Record) -> Result<Vec<Record>> {
        let source = match self.selector.as_deref() {
            None => Some(owner.fragment().clone()),
            Some(css) => get_or_compile(css).and_then(|m| owner.fragment().select_first(&m)),
        };
        let Some(source) = source else {
            return Ok(Vec::new());
        };

        let target = match &self.target {
            Target::Schema(schema) => Arc::clone(schema),
            Target::SelfType => Arc::clone(owner.schema()),
        };

        let Some(attribute) = self.follow.as_deref() else {
            return target.collect_within(&source, owner.client());
        };

        let path = source.attr(attribute).unwrap_or_default();
        let url = urls::resolve(&owner.schema().options().base_url, &path);
        if url.is_empty() {
            return Ok(Vec::new());
        }

        tracing::debug!(
            owner = %owner.schema().name(),
            target = %target.name(),
            url = %url,
            "following related link"
        );

        let doc = owner
            .client()
            .load(&url, &target.options().fetch_options)?;
        target.collect_within(&Fragment::root(doc), owner.client())
    }
}
