// ABOUTME: Record: one schema instance bound to one fragment with eagerly cleaned field values.
// ABOUTME: Related members resolve on first access into a write-once per-record cache.

use std::fmt;
use std::sync::Arc;

use once_cell::unsync::OnceCell;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::client::Client;
use crate::dom::Fragment;
use crate::error::{HarvestError, Result};
use crate::schema::Schema;

/// A populated instance of a schema.
///
/// Field values are computed at construction, in field-table order. Related
/// members are computed on first access and cached on this instance; the
/// cache slot is written exactly once, so later accesses never re-fetch.
pub struct Record {
    schema: Arc<Schema>,
    fragment: Fragment,
    values: Vec<Value>,
    related: Vec<OnceCell<Vec<Record>>>,
    client: Client,
}

impl Record {
    /// Populate a record from `fragment`. Performs no I/O.
    pub(crate) fn new(schema: Arc<Schema>, fragment: Fragment, client: Client) -> Result<Self> {
        let mut values = Vec::with_capacity(schema.entries().len());
        for entry in schema.entries() {
            let member = || format!("{}.{}", schema.name(), entry.name);
            let raw = entry.field.get_value(&fragment);
            let mut value = entry
                .field
                .clean(raw)
                .map_err(|e| HarvestError::coercion(member(), e))?;
            if let Some(hook) = &entry.hook {
                value = hook(value).map_err(|e| HarvestError::coercion(member(), e))?;
            }
            values.push(value);
        }
        let related = schema
            .related_entries()
            .iter()
            .map(|_| OnceCell::new())
            .collect();

        Ok(Self {
            schema,
            fragment,
            values,
            related,
            client,
        })
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn fragment(&self) -> &Fragment {
        &self.fragment
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    /// Value of a declared field; `Value::Null` when nothing matched.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.schema.field_index(field).map(|i| &self.values[i])
    }

    /// String value of a declared field, if it holds one.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// Field names and values in construction order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema.field_names().zip(self.values.iter())
    }

    /// Records of a related member, resolved on first access.
    ///
    /// A failed resolution (for example a fetch error) leaves the slot empty,
    /// so the next access tries again.
    pub fn related(&self, name: &str) -> Result<&[Record]> {
        let index = self.schema.related_index(name).ok_or_else(|| {
            HarvestError::unknown_member(self.member(name), "Related")
        })?;
        let slot = &self.related[index];
        let records = slot.get_or_try_init(|| {
            let descriptor = &self.schema.related_entries()[index].related;
            tracing::debug!(member = %self.member(name), "resolving related records");
            descriptor.resolve(self)
        })?;
        Ok(records.as_slice())
    }

    /// Whether a related member has already been resolved.
    pub fn is_resolved(&self, name: &str) -> bool {
        self.schema
            .related_index(name)
            .map(|i| self.related[i].get().is_some())
            .unwrap_or(false)
    }

    /// Assigning to a record always fails: fields are fixed at construction
    /// and related members are derived.
    pub fn set(&mut self, name: &str, _value: Value) -> Result<()> {
        if self.schema.related_index(name).is_some() {
            return Err(HarvestError::setting_derived_field(self.member(name)));
        }
        if self.schema.field_index(name).is_some() {
            return Err(HarvestError::read_only_field(self.member(name)));
        }
        Err(HarvestError::unknown_member(self.member(name), "Set"))
    }

    /// Inner markup of the record's fragment.
    pub fn html(&self) -> String {
        self.fragment.inner_html()
    }

    pub fn outer_html(&self) -> String {
        self.fragment.outer_html()
    }

    fn member(&self, name: &str) -> String {
        format!("{}.{}", self.schema.name(), name)
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (name, value) in self.fields() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.schema.name());
        for (name, value) in self.fields() {
            s.field(name, value);
        }
        s.finish_non_exhaustive()
    }
}
