//! CSS selector based text extraction.
//!
//! Pages are parsed with an HTML5 tree builder, so unclosed `<p>`/`<li>`
//! elements and character references (`&#8217;`, `&mdash;`) behave the way
//! a browser renders them. Any selector the `scraper` crate understands
//! works, including descendant and attribute selectors.

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use super::traits::Extractor;

/// Extractor backed by a real HTML parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorExtractor;

impl SelectorExtractor {
    pub fn new() -> Self {
        Self
    }
}

/// Text content of `element` with whitespace collapsed.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

impl Extractor for SelectorExtractor {
    fn extract(&self, html: &str, selector: &str) -> Vec<String> {
        let selector = match Selector::parse(selector) {
            Ok(s) => s,
            Err(e) => {
                debug!(selector, error = %e, "unsupported selector");
                return Vec::new();
            }
        };

        let document = Html::parse_document(html);
        document.select(&selector).map(element_text).collect()
    }
}
