// ABOUTME: Schema registry: SchemaBuilder flattens declared and inherited fields into an immutable Schema.
// ABOUTME: Ancestors' fields come first in base order, local declarations last and winning on collision.

//! Schemas.
//!
//! A [`Schema`] is built once, through [`SchemaBuilder`], and shared behind an
//! `Arc`. Building resolves everything lookups need later: the flattened field
//! table (inherited fields first, local last), the clean hook of each field,
//! the related-record table, options and compiled selectors.
//!
//! ```
//! use digests_harvest::{Field, Related, Schema};
//!
//! let link = Schema::builder("Link")
//!     .selector("p.p_with_link")
//!     .base_url("http://localhost")
//!     .field("label", Field::text().selector(".link"))
//!     .field("url", Field::attribute("href").selector(".link"))
//!     .build()
//!     .unwrap();
//!
//! let index = Schema::builder("Index")
//!     .base_url("http://localhost")
//!     .related("links", Related::to(&link).selector("a.link").follow("href"))
//!     .related("next_page", Related::to_self().selector("a.next").follow("href"))
//!     .build()
//!     .unwrap();
//! # let _ = index;
//! ```

pub mod loader;
pub mod lookup;
pub mod related;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use scraper::Selector;
use serde_json::Value;

use crate::error::{HarvestError, Result};
use crate::extractors::compiled::compile_checked;
use crate::extractors::fields::Field;
use crate::options::{is_forwardable, SchemaOptions, DEFAULT_SELECTOR};
use crate::resource::FetchOptions;

pub use self::related::{Related, Target};

/// Per-field override run after cleaning, the `clean_<field>` hook of a schema.
pub type CleanHook = Arc<dyn Fn(Value) -> anyhow::Result<Value> + Send + Sync>;

/// One row of the flattened field table.
#[derive(Clone)]
pub(crate) struct FieldEntry {
    pub name: String,
    pub field: Field,
    pub hook: Option<CleanHook>,
}

/// One row of the related-record table.
#[derive(Clone)]
pub(crate) struct RelatedEntry {
    pub name: String,
    pub related: Related,
}

/// An immutable, fully resolved schema.
pub struct Schema {
    name: String,
    fields: Vec<FieldEntry>,
    related: Vec<RelatedEntry>,
    options: SchemaOptions,
    root: Selector,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &SchemaOptions {
        &self.options
    }

    /// Field names in construction order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|e| e.name.as_str())
    }

    /// Related-record names in declaration order.
    pub fn related_names(&self) -> impl Iterator<Item = &str> {
        self.related.iter().map(|e| e.name.as_str())
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|e| e.name == name).map(|e| &e.field)
    }

    /// Whether the schema carries a clean hook for `field`, own or inherited.
    pub fn has_clean_hook(&self, field: &str) -> bool {
        self.field_index(field)
            .map(|i| self.fields[i].hook.is_some())
            .unwrap_or(false)
    }

    pub(crate) fn entries(&self) -> &[FieldEntry] {
        &self.fields
    }

    pub(crate) fn related_entries(&self) -> &[RelatedEntry] {
        &self.related
    }

    pub(crate) fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|e| e.name == name)
    }

    pub(crate) fn related_index(&self, name: &str) -> Option<usize> {
        self.related.iter().position(|e| e.name == name)
    }

    pub(crate) fn root_selector(&self) -> &Selector {
        &self.root
    }

    fn hook_for(&self, field: &str) -> Option<CleanHook> {
        self.fields
            .iter()
            .find(|e| e.name == field)
            .and_then(|e| e.hook.clone())
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("fields", &self.field_names().collect::<Vec<_>>())
            .field("related", &self.related_names().collect::<Vec<_>>())
            .field("options", &self.options)
            .finish()
    }
}

/// Declares a schema. Nothing is resolved until [`SchemaBuilder::build`].
pub struct SchemaBuilder {
    name: String,
    bases: Vec<Arc<Schema>>,
    fields: Vec<(String, Field)>,
    related: Vec<(String, Related)>,
    hooks: Vec<(String, CleanHook)>,
    selector: Option<String>,
    base_url: Option<String>,
    fetch_options: FetchOptions,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bases: Vec::new(),
            fields: Vec::new(),
            related: Vec::new(),
            hooks: Vec::new(),
            selector: None,
            base_url: None,
            fetch_options: FetchOptions::new(),
        }
    }

    /// Inherit fields, hooks, related records and options from `base`.
    ///
    /// Bases are consulted in the order they are added.
    pub fn extends(mut self, base: &Arc<Schema>) -> Self {
        self.bases.push(Arc::clone(base));
        self
    }

    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.push((name.into(), field));
        self
    }

    pub fn related(mut self, name: impl Into<String>, related: Related) -> Self {
        self.related.push((name.into(), related));
        self
    }

    /// Register the `clean_<field>` hook: it receives the cleaned value and
    /// its result becomes the field's value.
    pub fn clean<F>(mut self, field: impl Into<String>, hook: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let hook: CleanHook = Arc::new(hook);
        self.hooks.push((field.into(), hook));
        self
    }

    /// Root selector; each match becomes one record.
    pub fn selector(mut self, css: impl Into<String>) -> Self {
        self.selector = Some(css.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set one entry of the options block.
    ///
    /// `selector` and `base_url` set those options; keys starting with `_`
    /// are ignored; anything else is forwarded to the fetcher on every lookup.
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let key = key.into();
        if key == "selector" {
            return self.selector(value);
        }
        if key == "base_url" {
            return self.base_url(value);
        }
        if !is_forwardable(&key) {
            tracing::warn!(schema = %self.name, option = %key, "ignoring private schema option");
            return self;
        }
        self.fetch_options.insert(key, value.into());
        self
    }

    /// Resolve the declaration into an immutable schema.
    pub fn build(self) -> Result<Arc<Schema>> {
        let name = self.name;
        let invalid =
            |msg: String| HarvestError::invalid_schema(&name, "Build", Some(anyhow::anyhow!(msg)));

        let mut local_names = HashSet::new();
        for (field, _) in &self.fields {
            if !local_names.insert(field.as_str()) {
                return Err(invalid(format!("field {:?} declared twice", field)));
            }
        }
        let mut local_related = HashSet::new();
        for (rel, _) in &self.related {
            if !local_related.insert(rel.as_str()) || local_names.contains(rel.as_str()) {
                return Err(invalid(format!("member {:?} declared twice", rel)));
            }
        }

        // Inherited fields first. A name keeps the slot of the first base that
        // declares it and the definition of the last one.
        let mut fields: Vec<FieldEntry> = Vec::new();
        for base in &self.bases {
            for entry in base.entries() {
                if local_names.contains(entry.name.as_str()) {
                    continue;
                }
                match fields.iter_mut().find(|e| e.name == entry.name) {
                    Some(existing) => existing.field = entry.field.clone(),
                    None => fields.push(entry.clone()),
                }
            }
        }
        for (field_name, field) in self.fields {
            fields.push(FieldEntry {
                name: field_name,
                field,
                hook: None,
            });
        }
        // Inherited hooks come from the first base that has one.
        for entry in &mut fields {
            entry.hook = self
                .bases
                .iter()
                .find_map(|base| base.hook_for(&entry.name));
        }

        for (field_name, hook) in self.hooks {
            match fields.iter_mut().find(|e| e.name == field_name) {
                Some(entry) => entry.hook = Some(hook),
                None => {
                    return Err(invalid(format!(
                        "clean hook for undeclared field {:?}",
                        field_name
                    )))
                }
            }
        }

        let mut related: Vec<RelatedEntry> = Vec::new();
        for base in &self.bases {
            for entry in base.related_entries() {
                let shadowed = local_related.contains(entry.name.as_str())
                    || related.iter().any(|e| e.name == entry.name);
                if !shadowed {
                    related.push(entry.clone());
                }
            }
        }
        related.extend(
            self.related
                .into_iter()
                .map(|(name, related)| RelatedEntry { name, related }),
        );

        if let Some(clash) = related
            .iter()
            .find(|r| fields.iter().any(|f| f.name == r.name))
        {
            return Err(invalid(format!(
                "{:?} is both a field and a related record",
                clash.name
            )));
        }

        let first_base = self.bases.first().map(|b| b.options());
        let selector = self
            .selector
            .or_else(|| first_base.map(|o| o.selector.clone()))
            .unwrap_or_else(|| DEFAULT_SELECTOR.to_string());
        let base_url = self
            .base_url
            .or_else(|| first_base.map(|o| o.base_url.clone()))
            .unwrap_or_default();
        let mut fetch_options = FetchOptions::new();
        for base in self.bases.iter().rev() {
            fetch_options.extend(base.options().fetch_options.clone());
        }
        fetch_options.extend(self.fetch_options);

        let root = compile_checked(&selector).map_err(invalid)?;
        for entry in &fields {
            if let Some(css) = entry.field.selector_str() {
                compile_checked(css).map_err(invalid)?;
            }
        }
        for entry in &related {
            if let Some(css) = entry.related.selector_str() {
                compile_checked(css).map_err(invalid)?;
            }
        }

        tracing::debug!(
            schema = %name,
            fields = fields.len(),
            related = related.len(),
            selector = %selector,
            "registered schema"
        );

        Ok(Arc::new(Schema {
            name,
            fields,
            related,
            options: SchemaOptions {
                selector,
                base_url,
                fetch_options,
            },
            root,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn base() -> Arc<Schema> {
        Schema::builder("Base")
            .selector("article")
            .base_url("http://localhost")
            .option("accept-language", "en")
            .field("title", Field::text().selector("h1"))
            .field("summary", Field::text().selector(".summary"))
            .clean("title", |v| Ok(v))
            .related("author", Related::to_self().selector(".author"))
            .build()
            .unwrap()
    }

    #[test]
    fn defaults_when_nothing_declared() {
        let schema = Schema::builder("Empty").build().unwrap();
        assert_eq!(schema.options().selector, "html");
        assert_eq!(schema.options().base_url, "");
        assert_eq!(schema.field_names().count(), 0);
    }

    #[test]
    fn inherited_fields_come_first_and_local_wins() {
        let child = Schema::builder("Child")
            .extends(&base())
            .field("body", Field::text().selector(".body"))
            .field("summary", Field::attribute("content").selector("meta"))
            .build()
            .unwrap();

        assert_eq!(
            child.field_names().collect::<Vec<_>>(),
            vec!["title", "body", "summary"]
        );
        let summary = child.field("summary").unwrap();
        assert_eq!(summary.attribute_name(), Some("content"));
    }

    #[test]
    fn multiple_bases_in_declaration_order() {
        let a = Schema::builder("A")
            .field("a1", Field::text())
            .field("shared", Field::text().selector(".from-a"))
            .build()
            .unwrap();
        let b = Schema::builder("B")
            .field("b1", Field::text())
            .field("shared", Field::text().selector(".from-b"))
            .build()
            .unwrap();
        let c = Schema::builder("C")
            .extends(&a)
            .extends(&b)
            .field("c1", Field::text())
            .build()
            .unwrap();

        assert_eq!(
            c.field_names().collect::<Vec<_>>(),
            vec!["a1", "shared", "b1", "c1"]
        );
        assert_eq!(c.field("shared").unwrap().selector_str(), Some(".from-b"));
    }

    #[test]
    fn later_base_definition_is_extracted() {
        let a = Schema::builder("A")
            .field("shared", Field::text().selector(".from-a"))
            .build()
            .unwrap();
        let b = Schema::builder("B")
            .field("shared", Field::text().selector(".from-b"))
            .build()
            .unwrap();
        let c = Schema::builder("C")
            .selector("div")
            .extends(&a)
            .extends(&b)
            .build()
            .unwrap();

        let client = crate::client::Client::with_fetcher(
            |url: &str, _: &FetchOptions| -> Result<String> {
                Err(HarvestError::fetch(url, "Fetch", None))
            },
        );
        let records = c
            .all_from(
                &client,
                r#"<div><span class="from-a">A</span><span class="from-b">B</span></div>"#,
            )
            .unwrap();
        assert_eq!(records[0].text("shared"), Some("B"));
    }

    #[test]
    fn hook_comes_from_first_base_that_has_one() {
        let a = Schema::builder("A")
            .field("shared", Field::text().selector(".from-a"))
            .clean("shared", |_| Ok(Value::from("hooked-a")))
            .build()
            .unwrap();
        let b = Schema::builder("B")
            .field("shared", Field::text().selector(".from-b"))
            .clean("shared", |_| Ok(Value::from("hooked-b")))
            .build()
            .unwrap();
        let plain = Schema::builder("Plain")
            .field("shared", Field::text().selector(".plain"))
            .build()
            .unwrap();

        let c = Schema::builder("C").extends(&a).extends(&b).build().unwrap();
        let hook = c.hook_for("shared").unwrap();
        assert_eq!(hook(Value::Null).unwrap(), Value::from("hooked-a"));
        assert_eq!(c.field("shared").unwrap().selector_str(), Some(".from-b"));

        let d = Schema::builder("D").extends(&plain).extends(&b).build().unwrap();
        let hook = d.hook_for("shared").unwrap();
        assert_eq!(hook(Value::Null).unwrap(), Value::from("hooked-b"));
    }

    #[test]
    fn hooks_are_inherited_and_overridable() {
        let child = Schema::builder("Child")
            .extends(&base())
            .field("title", Field::text().selector("h2"))
            .build()
            .unwrap();
        assert!(child.has_clean_hook("title"));
        assert!(!child.has_clean_hook("summary"));
    }

    #[test]
    fn options_inherit_from_first_base() {
        let child = Schema::builder("Child")
            .extends(&base())
            .option("accept", "text/html")
            .build()
            .unwrap();
        let opts = child.options();
        assert_eq!(opts.selector, "article");
        assert_eq!(opts.base_url, "http://localhost");
        assert_eq!(opts.fetch_options.len(), 2);
    }

    #[test]
    fn reserved_options_are_never_fetch_options() {
        let schema = Schema::builder("S")
            .option("selector", "p")
            .option("base_url", "http://localhost")
            .option("_internal", "x")
            .option("extra_attribute", "value")
            .build()
            .unwrap();
        let opts = schema.options();
        assert_eq!(opts.selector, "p");
        assert_eq!(opts.base_url, "http://localhost");
        assert_eq!(
            opts.fetch_options.keys().collect::<Vec<_>>(),
            vec!["extra_attribute"]
        );
    }

    #[test]
    fn related_records_are_inherited() {
        let child = Schema::builder("Child").extends(&base()).build().unwrap();
        assert_eq!(child.related_names().collect::<Vec<_>>(), vec!["author"]);
    }

    #[test]
    fn rejects_hook_for_unknown_field() {
        let err = Schema::builder("S")
            .clean("missing", |v| Ok(v))
            .build()
            .unwrap_err();
        assert!(err.is_invalid_schema());
    }

    #[test]
    fn rejects_duplicate_members() {
        let err = Schema::builder("S")
            .field("x", Field::text())
            .field("x", Field::text())
            .build()
            .unwrap_err();
        assert!(err.is_invalid_schema());

        let err = Schema::builder("S")
            .field("x", Field::text())
            .related("x", Related::to_self())
            .build()
            .unwrap_err();
        assert!(err.is_invalid_schema());
    }

    #[test]
    fn rejects_invalid_selectors() {
        let err = Schema::builder("S").selector("[[[").build().unwrap_err();
        assert!(err.is_invalid_schema());

        let err = Schema::builder("S")
            .field("x", Field::text().selector("a["))
            .build()
            .unwrap_err();
        assert!(err.is_invalid_schema());
    }
}
