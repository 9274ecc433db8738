// ABOUTME: Loads schema definitions from JSON into a SchemaCatalog of named, built schemas.
// ABOUTME: Definitions reference earlier schemas by name for inheritance and related targets.

//! JSON schema definitions.
//!
//! A definition file is an array of schemas. Each schema may extend and point
//! related members at schemas defined before it, or at `"self"`:
//!
//! ```json
//! [
//!   {
//!     "name": "Link",
//!     "options": { "selector": "p.p_with_link", "base_url": "http://localhost" },
//!     "fields": [
//!       { "name": "label", "selector": ".link" },
//!       { "name": "url", "kind": "attribute", "selector": ".link", "attribute": "href" }
//!     ]
//!   },
//!   {
//!     "name": "Index",
//!     "options": { "base_url": "http://localhost" },
//!     "related": [
//!       { "name": "links", "target": "Link", "selector": "a.link", "follow": "href" },
//!       { "name": "next_page", "target": "self", "selector": "a.next", "follow": "href" }
//!     ]
//!   }
//! ]
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{HarvestError, Result};
use crate::extractors::coerce;
use crate::extractors::fields::{ExtractionKind, Field};
use crate::schema::{Related, Schema, SchemaBuilder};

/// Target name that refers to the owning record's own schema.
pub const SELF_TARGET: &str = "self";

/// Extraction kind as spelled in definition files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KindDefinition {
    #[default]
    Text,
    Attribute,
}

/// One declared field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub kind: KindDefinition,
    #[serde(default)]
    pub attribute: Option<String>,
    /// Name of a built-in coercion.
    #[serde(default)]
    pub coerce: Option<String>,
}

/// One declared related member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedDefinition {
    pub name: String,
    pub target: String,
    #[serde(default)]
    pub selector: Option<String>,
    #[serde(default)]
    pub follow: Option<String>,
}

/// One schema as written in a definition file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub name: String,
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub related: Vec<RelatedDefinition>,
}

/// Named schemas built from definitions.
#[derive(Debug, Default, Clone)]
pub struct SchemaCatalog {
    map: HashMap<String, Arc<Schema>>,
    order: Vec<String>,
}

impl SchemaCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and build every schema in a JSON definition array.
    pub fn from_json(json: &str) -> Result<Self> {
        let defs: Vec<SchemaDefinition> = serde_json::from_str(json).map_err(|e| {
            HarvestError::invalid_schema("", "Load", Some(anyhow::anyhow!("invalid JSON: {}", e)))
        })?;
        let mut catalog = Self::new();
        for def in defs {
            catalog.define(def)?;
        }
        Ok(catalog)
    }

    /// Read a JSON definition file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            HarvestError::invalid_schema(
                path.display().to_string(),
                "Load",
                Some(anyhow::anyhow!("failed to read: {}", e)),
            )
        })?;
        Self::from_json(&json)
    }

    /// Build one definition against the schemas already in the catalog.
    pub fn define(&mut self, def: SchemaDefinition) -> Result<Arc<Schema>> {
        let name = def.name.clone();
        if self.map.contains_key(&name) {
            return Err(self.error(&name, format!("schema {:?} defined twice", name)));
        }

        let mut builder = SchemaBuilder::new(&name);
        for base in &def.extends {
            builder = builder.extends(self.lookup(&name, base)?);
        }
        for (key, value) in def.options {
            builder = builder.option(key, value);
        }
        for field in def.fields {
            let (field_name, built) = self.build_field(&name, field)?;
            builder = builder.field(field_name, built);
        }
        for rel in def.related {
            let related = if rel.target == SELF_TARGET {
                Related::to_self()
            } else {
                Related::to(self.lookup(&name, &rel.target)?)
            };
            let related = match rel.selector {
                Some(css) => related.selector(css),
                None => related,
            };
            let related = match rel.follow {
                Some(attr) => related.follow(attr),
                None => related,
            };
            builder = builder.related(rel.name, related);
        }

        let schema = builder.build()?;
        self.map.insert(name.clone(), Arc::clone(&schema));
        self.order.push(name);
        Ok(schema)
    }

    fn build_field(&self, schema: &str, def: FieldDefinition) -> Result<(String, Field)> {
        let kind = match def.kind {
            KindDefinition::Text => ExtractionKind::Text,
            KindDefinition::Attribute => ExtractionKind::Attribute,
        };
        let mut field = match (kind, def.attribute) {
            (ExtractionKind::Attribute, Some(attr)) => Field::attribute(attr),
            (kind, _) => Field::new(kind),
        };
        if let Some(css) = def.selector {
            field = field.selector(css);
        }
        if let Some(coercion) = def.coerce {
            let f = coerce::builtin(&coercion).ok_or_else(|| {
                self.error(schema, format!("unknown coercion {:?}", coercion))
            })?;
            field = field.with_coercion(f);
        }
        Ok((def.name, field))
    }

    fn lookup(&self, schema: &str, name: &str) -> Result<&Arc<Schema>> {
        self.map.get(name).ok_or_else(|| {
            self.error(
                schema,
                format!("unknown schema {:?}; define it before referencing it", name),
            )
        })
    }

    fn error(&self, schema: &str, msg: String) -> HarvestError {
        HarvestError::invalid_schema(schema, "Load", Some(anyhow::anyhow!(msg)))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<Schema>> {
        self.map.get(name)
    }

    /// Schema names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
