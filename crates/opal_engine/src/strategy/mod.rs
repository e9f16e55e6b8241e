//! Site-specific extraction strategies.
//!
//! A strategy turns one page of markup plus the URL it came from into records.
//! Strategies never touch the network; fetching, batching and serialization
//! belong to the [`Orchestrator`](crate::Orchestrator).

mod court;
mod news;

use ego_tree::NodeRef;
use opal_core::ParsedRecord;
use scraper::node::Node;
use scraper::{ElementRef, Selector};

pub use court::CourtCaseStrategy;
pub use news::{NewsArticleStrategy, NewsSite, UNKNOWN_AUTHOR, UNKNOWN_DATE, UNTITLED};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractionError {
    #[error("no <{element}> element found on {url}")]
    MissingElement { element: &'static str, url: String },
}

pub trait ExtractionStrategy: Send + Sync {
    /// Name the strategy is registered under.
    fn name(&self) -> &str;

    /// Extracts the records of one page. Missing optional fields fall back to defaults;
    /// an error means the page holds nothing usable at all.
    fn parse_article(&self, html: &str, url: &str) -> Result<Vec<ParsedRecord>, ExtractionError>;

    /// True when the site builds its content client-side and must be fetched
    /// through a script-capable driver.
    fn requires_rendering(&self) -> bool {
        false
    }
}

pub(crate) fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

pub(crate) fn first_match<'a>(scope: ElementRef<'a>, css: &str) -> Option<ElementRef<'a>> {
    selector(css).and_then(|sel| scope.select(&sel).next())
}

/// Text nodes below `element` in document order, skipping script-like subtrees.
pub(crate) fn text_nodes<'a>(element: ElementRef<'a>) -> Vec<&'a str> {
    let mut out = Vec::new();
    for child in element.children() {
        collect_text(child, &mut out);
    }
    out
}

fn collect_text<'a>(node: NodeRef<'a, Node>, out: &mut Vec<&'a str>) {
    match node.value() {
        Node::Text(text) => out.push(text),
        Node::Element(el) => {
            if matches!(el.name(), "script" | "style" | "noscript" | "template") {
                return;
            }
            for child in node.children() {
                collect_text(child, out);
            }
        }
        _ => {}
    }
}

/// All visible text of `element`, concatenated as-is.
pub(crate) fn visible_text(element: ElementRef<'_>) -> String {
    text_nodes(element).concat()
}

/// Each text node trimmed, blanks dropped, the rest joined without separator.
pub(crate) fn stripped_text(element: ElementRef<'_>) -> String {
    text_nodes(element)
        .into_iter()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::{first_match, stripped_text, visible_text};

    #[test]
    fn text_helpers_skip_scripts() {
        let doc = Html::parse_fragment(
            "<div id=\"x\"> Hello <b>big</b>\n<script>var a = 1;</script> world </div>",
        );
        let div = first_match(doc.root_element(), "#x").unwrap();
        assert_eq!(visible_text(div), " Hello big\n world ");
        assert_eq!(stripped_text(div), "Hellobigworld");
    }
}
