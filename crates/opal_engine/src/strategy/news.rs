use opal_core::{NewsRecord, ParsedRecord};
use scraper::{ElementRef, Html};

use super::{first_match, selector, visible_text, ExtractionError, ExtractionStrategy};

pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
pub const UNKNOWN_DATE: &str = "Unknown Date";
/// Title used when the page has an empty `<title></title>` element.
pub const UNTITLED: &str = "No Title";

/// News sites with a known byline layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsSite {
    /// 1819news.com: `div.author-date` holding `<a>author</a> | date`.
    News1819,
    /// Alabama Daily News: `span.author.vcard a` and `span.post-date a`.
    DailyNews,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewsArticleStrategy {
    site: NewsSite,
}

impl NewsArticleStrategy {
    pub fn new(site: NewsSite) -> Self {
        Self { site }
    }

    pub fn site(&self) -> NewsSite {
        self.site
    }

    fn byline(&self, root: ElementRef<'_>) -> (String, String) {
        match self.site {
            NewsSite::News1819 => byline_1819(root),
            NewsSite::DailyNews => byline_daily_news(root),
        }
    }
}

impl ExtractionStrategy for NewsArticleStrategy {
    fn name(&self) -> &str {
        match self.site {
            NewsSite::News1819 => "Parser1819",
            NewsSite::DailyNews => "ParserDailyNews",
        }
    }

    fn parse_article(&self, html: &str, url: &str) -> Result<Vec<ParsedRecord>, ExtractionError> {
        let doc = Html::parse_document(html);
        let root = doc.root_element();
        let (author, date) = self.byline(root);
        let record = NewsRecord::new(url, title(root), author, date, paragraph_lines(&doc));
        Ok(vec![record.into()])
    }
}

/// `<title>` text, trimmed; empty string when the page has no title element.
///
/// A whitespace-only title trims to `""`.
fn title(root: ElementRef<'_>) -> String {
    match first_match(root, "title") {
        Some(el) => {
            let text = visible_text(el);
            if text.is_empty() {
                UNTITLED.to_string()
            } else {
                text.trim().to_string()
            }
        }
        None => String::new(),
    }
}

fn byline_1819(root: ElementRef<'_>) -> (String, String) {
    let Some(block) = first_match(root, "div.author-date") else {
        return (UNKNOWN_AUTHOR.to_string(), UNKNOWN_DATE.to_string());
    };
    let author = first_match(block, "a")
        .map(|a| visible_text(a).trim().to_string())
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
    // "Author | June 1, 2025": the date is the segment after the first bar.
    let date = visible_text(block)
        .split('|')
        .nth(1)
        .map(|segment| segment.trim().to_string())
        .unwrap_or_default();
    (author, date)
}

fn byline_daily_news(root: ElementRef<'_>) -> (String, String) {
    let link_text = |css: &str| {
        first_match(root, css)
            .and_then(|span| first_match(span, "a"))
            .map(|a| visible_text(a).trim().to_string())
    };
    let author = link_text("span.author.vcard").unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
    let date = link_text("span.post-date").unwrap_or_else(|| UNKNOWN_DATE.to_string());
    (author, date)
}

/// Non-empty lines of every `<p>`, trimmed, in document order.
fn paragraph_lines(doc: &Html) -> Vec<String> {
    let Some(p) = selector("p") else {
        return Vec::new();
    };
    doc.select(&p)
        .flat_map(|para| {
            visible_text(para)
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use scraper::Html;

    use super::{byline_1819, paragraph_lines, title, UNTITLED};

    #[test]
    fn empty_title_element_is_marked_untitled() {
        let doc = Html::parse_document("<html><head><title></title></head></html>");
        assert_eq!(title(doc.root_element()), UNTITLED);
    }

    #[test]
    fn whitespace_title_trims_to_empty() {
        let doc = Html::parse_document("<html><head><title>   </title></head></html>");
        assert_eq!(title(doc.root_element()), "");
    }

    #[test]
    fn byline_without_bar_leaves_date_empty() {
        let doc = Html::parse_document(r#"<div class="author-date"><a>Jane</a></div>"#);
        assert_eq!(
            byline_1819(doc.root_element()),
            ("Jane".to_string(), String::new())
        );
    }

    #[test]
    fn paragraphs_split_on_newlines() {
        let doc = Html::parse_document("<p>one\n\n  two  </p><p>   </p><p>three</p>");
        assert_eq!(paragraph_lines(&doc), ["one", "two", "three"]);
    }
}
