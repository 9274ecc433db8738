// ABOUTME: Field descriptors: one extraction rule plus its cleaning and coercion pipeline.
// ABOUTME: Text fields trim their value, attribute fields keep it verbatim, absence stays Null.

//! Field descriptors.
//!
//! A [`Field`] pairs a selector extractor (text or attribute) with a cleaning
//! pipeline. Declare fields through the constructors and attach them to a
//! schema with `SchemaBuilder::field`:
//!
//! ```
//! use digests_harvest::Field;
//!
//! let label = Field::text().selector(".link");
//! let url = Field::attribute("href").selector(".link");
//! # let _ = (label, url);
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::dom::Fragment;
use crate::extractors::coerce::Coercion;
use crate::extractors::select::{extract_attribute, extract_text};

/// What a field reads from its matched element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionKind {
    Text,
    Attribute,
}

/// A declared field: where to look, what to read, how to clean it.
#[derive(Clone)]
pub struct Field {
    selector: Option<String>,
    kind: ExtractionKind,
    attribute: Option<String>,
    coercion: Option<Coercion>,
}

impl Field {
    /// A field of the given kind reading the record's own element.
    pub fn new(kind: ExtractionKind) -> Self {
        Self {
            selector: None,
            kind,
            attribute: None,
            coercion: None,
        }
    }

    /// A text field.
    pub fn text() -> Self {
        Self::new(ExtractionKind::Text)
    }

    /// An attribute field reading `name`.
    pub fn attribute(name: impl Into<String>) -> Self {
        Self {
            attribute: Some(name.into()),
            ..Self::new(ExtractionKind::Attribute)
        }
    }

    /// Read from the first element matching `css` instead of the record's own element.
    pub fn selector(mut self, css: impl Into<String>) -> Self {
        self.selector = Some(css.into());
        self
    }

    /// Apply `f` to the cleaned value. `f` also receives absence as `Value::Null`.
    pub fn coerce<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.coercion = Some(Arc::new(f));
        self
    }

    pub(crate) fn with_coercion(mut self, coercion: Coercion) -> Self {
        self.coercion = Some(coercion);
        self
    }

    pub fn selector_str(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    pub fn kind(&self) -> ExtractionKind {
        self.kind
    }

    pub fn attribute_name(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    /// Raw extracted value. An attribute field without an attribute name is always absent.
    pub fn get_value(&self, fragment: &Fragment) -> Option<String> {
        let selector = self.selector.as_deref();
        match self.kind {
            ExtractionKind::Text => extract_text(fragment, selector),
            ExtractionKind::Attribute => {
                let name = self.attribute.as_deref()?;
                extract_attribute(fragment, selector, name)
            }
        }
    }

    /// Default cleaning followed by the configured coercion.
    pub fn clean(&self, raw: Option<String>) -> anyhow::Result<Value> {
        let cleaned = match raw {
            None => Value::Null,
            Some(s) => match self.kind {
                ExtractionKind::Text => Value::String(s.trim().to_string()),
                ExtractionKind::Attribute => Value::String(s),
            },
        };
        match &self.coercion {
            Some(f) => f(cleaned),
            None => Ok(cleaned),
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("selector", &self.selector)
            .field("kind", &self.kind)
            .field("attribute", &self.attribute)
            .field("coercion", &self.coercion.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;
    use serde_json::json;

    const SAMPLE_HTML: &str = r#"
        <html>
            <body>
                <p id="p_id">
                    Some text.
                    <a class="link" href=" http://github.com/matiasb ">Link text.</a>
                    <a class="link" href="http://github.com/matiasb/demiurge">Another link.</a>
                </p>
            </body>
        </html>
    "#;

    fn root() -> Fragment {
        Fragment::root(parse_document(SAMPLE_HTML))
    }

    #[test]
    fn test_text_field_reads_first_match() {
        let field = Field::text().selector(".link");
        assert_eq!(field.get_value(&root()).as_deref(), Some("Link text."));
    }

    #[test]
    fn test_clean_trims_text() {
        let field = Field::text();
        assert_eq!(
            field.clean(Some("   Hello world. ".to_string())).unwrap(),
            json!("Hello world.")
        );
    }

    #[test]
    fn test_clean_absence_is_null() {
        assert_eq!(Field::text().clean(None).unwrap(), Value::Null);
    }

    #[test]
    fn test_attribute_value_kept_verbatim() {
        let field = Field::attribute("href").selector(".link");
        let raw = field.get_value(&root());
        assert_eq!(
            field.clean(raw).unwrap(),
            json!(" http://github.com/matiasb ")
        );
    }

    #[test]
    fn test_attribute_without_name_is_absent() {
        let field = Field::new(ExtractionKind::Attribute).selector(".link");
        assert_eq!(field.get_value(&root()), None);
    }

    #[test]
    fn test_missing_attribute_is_absent() {
        let field = Field::attribute("href").selector("p");
        assert_eq!(field.get_value(&root()), None);
    }

    #[test]
    fn test_coercion_sees_cleaned_value_and_absence() {
        let field = Field::text().coerce(|v| {
            Ok(match v {
                Value::String(s) => json!(s.len()),
                Value::Null => json!(0),
                other => other,
            })
        });
        assert_eq!(field.clean(Some("  abc  ".to_string())).unwrap(), json!(3));
        assert_eq!(field.clean(None).unwrap(), json!(0));
    }

    #[test]
    fn test_coercion_failure_propagates() {
        let field = Field::text().coerce(|_| Err(anyhow::anyhow!("boom")));
        let err = field.clean(Some("x".to_string())).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
