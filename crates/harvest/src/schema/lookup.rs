// ABOUTME: Lookup facade: one, all and all_from turn a document into records of a schema.
// ABOUTME: Applies the root selector, constructs one record per match in document order.

use std::rc::Rc;
use std::sync::Arc;

use ego_tree::NodeId;
use scraper::Html;

use crate::client::{Client, Source};
use crate::dom::Fragment;
use crate::error::{HarvestError, Result};
use crate::record::Record;
use crate::schema::Schema;
use crate::urls;

impl Schema {
    /// Construct a record bound to `node` of `doc`.
    ///
    /// Fails with `InvalidSource` if `node` is not an element of `doc`.
    pub fn construct(
        self: &Arc<Self>,
        doc: Rc<Html>,
        node: NodeId,
        client: &Client,
    ) -> Result<Record> {
        let fragment = Fragment::new(doc, node)?;
        Record::new(Arc::clone(self), fragment, client.clone())
    }

    /// Records for every root-selector match within `fragment`, in document order.
    pub fn collect_within(
        self: &Arc<Self>,
        fragment: &Fragment,
        client: &Client,
    ) -> Result<Vec<Record>> {
        fragment
            .select_all(self.root_selector())
            .into_iter()
            .map(|m| Record::new(Arc::clone(self), m, client.clone()))
            .collect()
    }

    /// Records parsed from an explicit source.
    ///
    /// Markup is parsed directly; a `Source::Url` is fetched with this
    /// schema's fetch options. Zero matches is an empty vector.
    pub fn all_from(
        self: &Arc<Self>,
        client: &Client,
        source: impl Into<Source>,
    ) -> Result<Vec<Record>> {
        let doc = client.parse(source.into(), &self.options().fetch_options)?;
        self.collect_within(&Fragment::root(doc), client)
    }

    /// Every record at `path`, resolved against the schema's base URL.
    pub fn all(self: &Arc<Self>, client: &Client, path: &str) -> Result<Vec<Record>> {
        let root = self.load(client, path)?;
        self.collect_within(&root, client)
    }

    /// The record at `index` among the matches at `path`.
    ///
    /// Fails with `RecordNotFound` when there is no such match.
    pub fn one(self: &Arc<Self>, client: &Client, path: &str, index: usize) -> Result<Record> {
        let root = self.load(client, path)?;
        let matched = root
            .select_all(self.root_selector())
            .into_iter()
            .nth(index)
            .ok_or_else(|| HarvestError::record_not_found(self.name(), index))?;
        Record::new(Arc::clone(self), matched, client.clone())
    }

    fn load(&self, client: &Client, path: &str) -> Result<Fragment> {
        let url = urls::join(&self.options().base_url, path);
        tracing::debug!(schema = %self.name(), url = %url, "looking up records");
        let doc = client.load(&url, &self.options().fetch_options)?;
        Ok(Fragment::root(doc))
    }
}
