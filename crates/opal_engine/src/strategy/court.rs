use opal_core::{CaseNumber, CourtCaseRecord, ParsedRecord};
use scraper::{ElementRef, Html};

use super::{first_match, selector, stripped_text, ExtractionError, ExtractionStrategy};

/// Columns a results row needs: court, case number, title, classification, filed, status.
const MIN_CELLS: usize = 6;

/// Court-portal search results: one record per row of the first table.
///
/// The portal renders the table client-side, so pages must come from a
/// script-capable fetcher.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CourtCaseStrategy;

impl ExtractionStrategy for CourtCaseStrategy {
    fn name(&self) -> &str {
        "court"
    }

    fn parse_article(&self, html: &str, url: &str) -> Result<Vec<ParsedRecord>, ExtractionError> {
        let doc = Html::parse_document(html);
        let table = first_match(doc.root_element(), "table").ok_or_else(|| {
            ExtractionError::MissingElement {
                element: "table",
                url: url.to_string(),
            }
        })?;
        let (Some(tr), Some(td)) = (selector("tr"), selector("td")) else {
            return Ok(Vec::new());
        };

        let records = table
            .select(&tr)
            .skip(1)
            .filter_map(|row| {
                let cells: Vec<ElementRef<'_>> = row.select(&td).collect();
                parse_row(&cells)
            })
            .map(ParsedRecord::from)
            .collect();
        Ok(records)
    }

    fn requires_rendering(&self) -> bool {
        true
    }
}

fn parse_row(cells: &[ElementRef<'_>]) -> Option<CourtCaseRecord> {
    if cells.len() < MIN_CELLS {
        return None;
    }
    let case_number = match first_match(cells[1], "a") {
        Some(link) => CaseNumber {
            text: stripped_text(link),
            link: link.value().attr("href").unwrap_or_default().to_string(),
        },
        None => CaseNumber {
            text: stripped_text(cells[1]),
            link: String::new(),
        },
    };
    Some(CourtCaseRecord {
        court: stripped_text(cells[0]),
        case_number,
        case_title: stripped_text(cells[2]),
        classification: stripped_text(cells[3]),
        filed_date: stripped_text(cells[4]),
        status: stripped_text(cells[5]),
    })
}
