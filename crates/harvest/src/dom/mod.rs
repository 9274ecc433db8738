// ABOUTME: Parsed-document handles: Fragment binds a shared scraper::Html to one element node.
// ABOUTME: Provides descendant-or-self selection, text, attribute and markup access for fragments.

//! Document fragments.
//!
//! A [`Fragment`] is a cheap handle (shared document + node id) to one element
//! of a parsed document. Records keep their fragment for the lifetime of the
//! record, so the document is reference counted instead of copied.

use std::fmt;
use std::rc::Rc;

use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};

use crate::error::{HarvestError, Result};

/// Parse markup into a shared document.
pub fn parse_document(html: &str) -> Rc<Html> {
    Rc::new(Html::parse_document(html))
}

/// A handle to one element of a parsed document.
#[derive(Clone)]
pub struct Fragment {
    doc: Rc<Html>,
    node: NodeId,
}

impl Fragment {
    /// Bind `node` of `doc` as a fragment.
    ///
    /// Fails with `InvalidSource` when the id does not name an element of `doc`.
    pub fn new(doc: Rc<Html>, node: NodeId) -> Result<Self> {
        let is_element = doc
            .tree
            .get(node)
            .map(|n| n.value().is_element())
            .unwrap_or(false);
        if !is_element {
            return Err(HarvestError::invalid_source(
                format!("{:?}", node),
                "Fragment",
                Some(anyhow::anyhow!("node is not an element of the document")),
            ));
        }
        Ok(Self { doc, node })
    }

    /// The document's root element as a fragment.
    pub fn root(doc: Rc<Html>) -> Self {
        let node = doc.root_element().id();
        Self { doc, node }
    }

    pub fn document(&self) -> &Rc<Html> {
        &self.doc
    }

    pub fn node_id(&self) -> NodeId {
        self.node
    }

    pub(crate) fn element(&self) -> ElementRef<'_> {
        self.doc
            .tree
            .get(self.node)
            .and_then(ElementRef::wrap)
            .expect("fragment node validated at construction")
    }

    fn sibling(&self, node: NodeId) -> Self {
        Self {
            doc: Rc::clone(&self.doc),
            node,
        }
    }

    /// All elements matching `selector` among this element and its
    /// descendants, in document order.
    pub fn select_all(&self, selector: &Selector) -> Vec<Fragment> {
        let el = self.element();
        let own = selector.matches(&el).then_some(el.id());
        own.into_iter()
            .chain(el.select(selector).map(|m| m.id()))
            .map(|id| self.sibling(id))
            .collect()
    }

    /// The first element matching `selector`, descendant-or-self.
    pub fn select_first(&self, selector: &Selector) -> Option<Fragment> {
        let el = self.element();
        if selector.matches(&el) {
            return Some(self.clone());
        }
        el.select(selector).next().map(|m| self.sibling(m.id()))
    }

    /// Text content with whitespace runs collapsed into single spaces.
    pub fn text(&self) -> String {
        let joined: String = self.element().text().collect();
        normalize_whitespace(&joined)
    }

    /// Raw attribute value, untouched.
    pub fn attr(&self, name: &str) -> Option<String> {
        self.element().value().attr(name).map(str::to_string)
    }

    pub fn inner_html(&self) -> String {
        self.element().inner_html()
    }

    pub fn outer_html(&self) -> String {
        self.element().html()
    }
}

impl fmt::Debug for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fragment")
            .field("node", &self.node)
            .field("tag", &self.element().value().name())
            .finish()
    }
}

/// Normalizes whitespace in a string by collapsing runs of whitespace into single spaces.
pub(crate) fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_HTML: &str = r#"
        <html>
        <body>
            <div class="section" id="outer">
                <p class="x">First <a href="/one">one</a></p>
                <div class="section" id="inner"><p class="x">Second</p></div>
            </div>
        </body>
        </html>
    "#;

    fn sel(css: &str) -> Selector {
        Selector::parse(css).unwrap()
    }

    #[test]
    fn root_is_html_element() {
        let frag = Fragment::root(parse_document(SAMPLE_HTML));
        assert_eq!(frag.element().value().name(), "html");
    }

    #[test]
    fn select_all_includes_self_in_document_order() {
        let root = Fragment::root(parse_document(SAMPLE_HTML));
        let outer = root.select_first(&sel("#outer")).unwrap();

        let sections = outer.select_all(&sel("div.section"));
        let ids: Vec<_> = sections.iter().filter_map(|f| f.attr("id")).collect();
        assert_eq!(ids, vec!["outer", "inner"]);
    }

    #[test]
    fn select_first_prefers_self() {
        let root = Fragment::root(parse_document(SAMPLE_HTML));
        let outer = root.select_first(&sel("#outer")).unwrap();
        let again = outer.select_first(&sel("div.section")).unwrap();
        assert_eq!(again.node_id(), outer.node_id());
    }

    #[test]
    fn text_collapses_whitespace() {
        let root = Fragment::root(parse_document(SAMPLE_HTML));
        let p = root.select_first(&sel("p.x")).unwrap();
        assert_eq!(p.text(), "First one");
    }

    #[test]
    fn attr_is_verbatim() {
        let doc = parse_document(r#"<a href="  /padded  ">x</a>"#);
        let a = Fragment::root(doc).select_first(&sel("a")).unwrap();
        assert_eq!(a.attr("href").as_deref(), Some("  /padded  "));
        assert_eq!(a.attr("title"), None);
    }

    #[test]
    fn new_rejects_non_element_nodes() {
        let doc = parse_document("<p>text</p>");
        let text_node = doc
            .tree
            .nodes()
            .find(|n| n.value().is_text())
            .map(|n| n.id())
            .unwrap();

        let err = Fragment::new(Rc::clone(&doc), text_node).unwrap_err();
        assert!(err.is_invalid_source());

        let root_id = doc.root_element().id();
        assert!(Fragment::new(doc, root_id).is_ok());
    }

    #[test]
    fn html_accessors() {
        let doc = parse_document(r#"<div id="d"><b>bold</b></div>"#);
        let d = Fragment::root(doc).select_first(&sel("#d")).unwrap();
        assert_eq!(d.inner_html(), "<b>bold</b>");
        assert_eq!(d.outer_html(), r#"<div id="d"><b>bold</b></div>"#);
    }
}
