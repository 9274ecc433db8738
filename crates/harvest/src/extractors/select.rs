// ABOUTME: Selector extractor: first-match text or attribute extraction from a document fragment.
// ABOUTME: Absence (no match, unset attribute, invalid selector) is returned as None, never an error.

//! Selector-based value extraction.
//!
//! Key behaviors:
//! - Only the first match (document order, descendant-or-self) is read.
//! - With no selector the fragment itself is read.
//! - Text is whitespace-normalized and trimmed; attribute values are verbatim.

use crate::dom::Fragment;
use crate::extractors::compiled::get_or_compile;

/// Resolves the element to read from: the fragment itself or its first match.
fn target(fragment: &Fragment, selector: Option<&str>) -> Option<Fragment> {
    match selector {
        None => Some(fragment.clone()),
        Some(css) => {
            let matcher = get_or_compile(css)?;
            fragment.select_first(&matcher)
        }
    }
}

/// Trimmed text of the first element matching `selector` within `fragment`.
pub fn extract_text(fragment: &Fragment, selector: Option<&str>) -> Option<String> {
    target(fragment, selector).map(|el| el.text())
}

/// Value of `attribute` on the first element matching `selector` within `fragment`.
pub fn extract_attribute(
    fragment: &Fragment,
    selector: Option<&str>,
    attribute: &str,
) -> Option<String> {
    target(fragment, selector).and_then(|el| el.attr(attribute))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_document;

    const SAMPLE_HTML: &str = r#"
        <html>
            <body>
                <p id="p_id">
                    Some text.
                    <a class="link" href="http://github.com/matiasb">Link text.</a>
                    <a class="link" href="http://github.com/matiasb/demiurge">Another link.</a>
                </p>
            </body>
        </html>
    "#;

    fn root() -> Fragment {
        Fragment::root(parse_document(SAMPLE_HTML))
    }

    #[test]
    fn test_text_without_selector_reads_fragment() {
        assert_eq!(
            extract_text(&root(), None).as_deref(),
            Some("Some text. Link text. Another link.")
        );
    }

    #[test]
    fn test_text_first_match_only() {
        assert_eq!(
            extract_text(&root(), Some(".link")).as_deref(),
            Some("Link text.")
        );
    }

    #[test]
    fn test_text_not_found_is_absent() {
        assert_eq!(extract_text(&root(), Some(".not-found")), None);
    }

    #[test]
    fn test_invalid_selector_is_absent() {
        assert_eq!(extract_text(&root(), Some("[[[invalid")), None);
    }

    #[test]
    fn test_attribute_first_match() {
        assert_eq!(
            extract_attribute(&root(), Some(".link"), "href").as_deref(),
            Some("http://github.com/matiasb")
        );
    }

    #[test]
    fn test_attribute_without_selector() {
        let p = extract_attribute(&root(), Some("p"), "id");
        assert_eq!(p.as_deref(), Some("p_id"));

        let para = target(&root(), Some("p")).unwrap();
        assert_eq!(extract_attribute(&para, None, "id").as_deref(), Some("p_id"));
    }

    #[test]
    fn test_unset_attribute_is_absent() {
        assert_eq!(extract_attribute(&root(), Some("p"), "href"), None);
    }
}
