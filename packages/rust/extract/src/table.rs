//! Structural table lookup.
//!
//! The register renders every section as a `<table>` and distinguishes them only
//! by presentational attributes. A [`Fingerprint`] names that attribute set so a
//! parser can pick "the listing table" out of a dozen layout tables.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

pub(crate) static ANY: LazyLock<Selector> = LazyLock::new(|| static_selector("*"));
pub(crate) static TABLE: LazyLock<Selector> = LazyLock::new(|| static_selector("table"));
pub(crate) static TR: LazyLock<Selector> = LazyLock::new(|| static_selector("tr"));
pub(crate) static TD: LazyLock<Selector> = LazyLock::new(|| static_selector("td"));
pub(crate) static ANCHOR: LazyLock<Selector> = LazyLock::new(|| static_selector("a[href]"));

fn static_selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid CSS")
}

// ---------------------------------------------------------------------------
// Fingerprint
// ---------------------------------------------------------------------------

/// Tag name plus the exact attribute values an element must carry.
///
/// Values compare trimmed and ASCII-case-insensitively; attributes not named in
/// the fingerprint are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fingerprint {
    pub tag: &'static str,
    pub attrs: &'static [(&'static str, &'static str)],
}

impl Fingerprint {
    pub const fn new(tag: &'static str, attrs: &'static [(&'static str, &'static str)]) -> Self {
        Self { tag, attrs }
    }

    /// Whether `el` has this fingerprint's tag and every listed attribute value.
    pub fn matches(&self, el: &ElementRef<'_>) -> bool {
        let value = el.value();
        if !value.name().eq_ignore_ascii_case(self.tag) {
            return false;
        }

        self.attrs.iter().all(|(name, expected)| {
            value
                .attr(name)
                .is_some_and(|actual| actual.trim().eq_ignore_ascii_case(expected.trim()))
        })
    }
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// All elements matching `fingerprint`, in document order.
pub fn locate_all<'a>(
    doc: &'a Html,
    fingerprint: &'a Fingerprint,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    doc.select(&ANY).filter(move |el| fingerprint.matches(el))
}

/// The element matching `fingerprint` after skipping the first `skip` matches.
///
/// `None` means the section is absent from this page.
pub fn locate<'a>(doc: &'a Html, fingerprint: &'a Fingerprint, skip: usize) -> Option<ElementRef<'a>> {
    locate_all(doc, fingerprint).nth(skip)
}

/// The first `<table>` in the document, whatever its attributes.
pub fn first_table(doc: &Html) -> Option<ElementRef<'_>> {
    doc.select(&TABLE).next()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHELL: Fingerprint = Fingerprint::new("table", &[("border", "1"), ("width", "100%")]);

    #[test]
    fn matches_ignores_case_and_padding() {
        let doc = Html::parse_document(
            r#"<table BORDER=" 1 " Width="100%" class="x"><tr><td>a</td></tr></table>"#,
        );
        assert!(locate(&doc, &SHELL, 0).is_some());
    }

    #[test]
    fn missing_attribute_does_not_match() {
        let doc = Html::parse_document(r#"<table border="1"><tr><td>a</td></tr></table>"#);
        assert!(locate(&doc, &SHELL, 0).is_none());
    }

    #[test]
    fn skip_selects_later_match() {
        let doc = Html::parse_document(
            r#"<table border="1" width="100%" id="shell"><tr><td>
                 <table border="1" width="100%" id="data"><tr><td>x</td></tr></table>
               </td></tr></table>"#,
        );

        let first = locate(&doc, &SHELL, 0).unwrap();
        let second = locate(&doc, &SHELL, 1).unwrap();
        assert_eq!(first.value().attr("id"), Some("shell"));
        assert_eq!(second.value().attr("id"), Some("data"));
        assert!(locate(&doc, &SHELL, 2).is_none());
        assert_eq!(locate_all(&doc, &SHELL).count(), 2);
    }

    #[test]
    fn tag_must_match() {
        let fp = Fingerprint::new("div", &[("border", "1")]);
        let doc = Html::parse_document(r#"<table border="1"><tr><td>a</td></tr></table>"#);
        assert!(locate(&doc, &fp, 0).is_none());
    }
}
