//! Alabama Appeals Court public portal: search criteria and page URLs.
//!
//! The portal keeps all search state in a single `criteria` query value written
//! in a `~`-separated object notation, e.g.
//! `~(advanced~false~courtID~'ID~page~(size~25~number~0~totalElements~0~totalPages~0)~...)`
//! where `(`, `)`, `'` and `*` are percent-encoded.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Duration, NaiveDate};
use regex::Regex;
use url::Url;

pub const COURT_SEARCH_BASE_URL: &str =
    "https://publicportal.alappeals.gov/portal/search/case/results";

const COURT_HOST: &str = "publicportal.alappeals.gov";
const COURT_RESULTS_PATH: &str = "/portal/search/case/results";

const ALL_CATEGORIES_ID: u32 = 1_000_000;
const CONTAINS_CASE_NUMBER_QUERY: u32 = 10_463;
const CONTAINS_CASE_TITLE_QUERY: u32 = 300_054;
const DEFAULT_PAGE_SIZE: u32 = 25;
const DEFAULT_SORT_FIELD: &str = "caseHeader.filedDate";

/// Encoded date separator: `*2f` with the asterisk percent-encoded.
const DATE_SEPARATOR: &str = "%2a2f";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CriteriaError {
    #[error("unknown court {0:?}; expected civil, criminal or supreme")]
    UnknownCourt(String),
    #[error("unknown date period {0:?}; expected 7d, 1m, 3m, 6m, 1y or START..END")]
    UnknownDatePeriod(String),
    #[error("invalid date {0:?}; expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("date range start {start} is after end {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
    #[error("unknown case category {0:?}")]
    UnknownCategory(String),
    #[error("category {category} is not available for {court}")]
    CategoryNotAvailable { category: CaseCategory, court: Court },
    #[error("no court id known for {0}; pass one explicitly")]
    MissingCourtId(Court),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Court {
    Civil,
    Criminal,
    Supreme,
}

impl Court {
    pub fn name(self) -> &'static str {
        match self {
            Court::Civil => "Alabama Civil Court of Appeals",
            Court::Criminal => "Alabama Court of Criminal Appeals",
            Court::Supreme => "Alabama Supreme Court",
        }
    }

    pub fn case_prefix(self) -> &'static str {
        match self {
            Court::Civil => "CL",
            Court::Criminal => "CR",
            Court::Supreme => "SC",
        }
    }

    /// Portal id of the court, where one is known ahead of time.
    /// Ids for the other courts are assigned by the portal and must be supplied.
    pub fn known_id(self) -> Option<&'static str> {
        match self {
            Court::Civil => Some("68f021c4-6a44-4735-9a76-5360b2e8af13"),
            Court::Criminal | Court::Supreme => None,
        }
    }

    pub fn categories(self) -> &'static [CaseCategory] {
        use CaseCategory::*;
        match self {
            Court::Civil | Court::Criminal => &[Appeal, Certiorari, OriginalProceeding, Petition],
            Court::Supreme => &[
                Appeal,
                Certiorari,
                OriginalProceeding,
                Petition,
                CertifiedQuestion,
            ],
        }
    }

    /// Suggested case number pattern, e.g. `CL-2025-####`.
    pub fn case_number_hint(self, year: i32) -> String {
        format!("{}-{year}-####", self.case_prefix())
    }
}

impl fmt::Display for Court {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Court {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "civil" => Ok(Court::Civil),
            "criminal" => Ok(Court::Criminal),
            "supreme" => Ok(Court::Supreme),
            _ => Err(CriteriaError::UnknownCourt(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaseCategory {
    Appeal,
    Certiorari,
    OriginalProceeding,
    Petition,
    CertifiedQuestion,
}

impl CaseCategory {
    pub fn id(self) -> u32 {
        match self {
            CaseCategory::Appeal => 1_000_001,
            CaseCategory::Certiorari => 1_000_002,
            CaseCategory::OriginalProceeding => 1_000_003,
            CaseCategory::Petition => 1_000_004,
            CaseCategory::CertifiedQuestion => 1_000_005,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CaseCategory::Appeal => "Appeal",
            CaseCategory::Certiorari => "Certiorari",
            CaseCategory::OriginalProceeding => "Original Proceeding",
            CaseCategory::Petition => "Petition",
            CaseCategory::CertifiedQuestion => "Certified Question",
        }
    }
}

impl fmt::Display for CaseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CaseCategory {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        [
            CaseCategory::Appeal,
            CaseCategory::Certiorari,
            CaseCategory::OriginalProceeding,
            CaseCategory::Petition,
            CaseCategory::CertifiedQuestion,
        ]
        .into_iter()
        .find(|category| category.label().eq_ignore_ascii_case(wanted))
        .ok_or_else(|| CriteriaError::UnknownCategory(s.to_string()))
    }
}

/// Filed-date filter of a court search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePeriod {
    LastWeek,
    LastMonth,
    LastQuarter,
    LastHalfYear,
    LastYear,
    Custom { start: NaiveDate, end: NaiveDate },
}

impl DatePeriod {
    fn choice(self) -> &'static str {
        match self {
            DatePeriod::LastWeek => "-7d",
            DatePeriod::LastMonth => "-1m",
            DatePeriod::LastQuarter => "-3m",
            DatePeriod::LastHalfYear => "-6m",
            DatePeriod::LastYear => "-1y",
            DatePeriod::Custom { .. } => "custom",
        }
    }

    /// Inclusive date range the period covers when evaluated on `today`.
    pub fn range(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let days = match self {
            DatePeriod::LastWeek => 7,
            DatePeriod::LastMonth => 30,
            DatePeriod::LastQuarter => 90,
            DatePeriod::LastHalfYear => 180,
            DatePeriod::LastYear => 365,
            DatePeriod::Custom { start, end } => return (start, end),
        };
        (today - Duration::days(days), today)
    }
}

impl FromStr for DatePeriod {
    type Err = CriteriaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed {
            "7d" => return Ok(DatePeriod::LastWeek),
            "1m" => return Ok(DatePeriod::LastMonth),
            "3m" => return Ok(DatePeriod::LastQuarter),
            "6m" => return Ok(DatePeriod::LastHalfYear),
            "1y" => return Ok(DatePeriod::LastYear),
            _ => {}
        }
        let (start, end) = trimmed
            .split_once("..")
            .ok_or_else(|| CriteriaError::UnknownDatePeriod(s.to_string()))?;
        let start = parse_date(start)?;
        let end = parse_date(end)?;
        if start > end {
            return Err(CriteriaError::InvertedRange { start, end });
        }
        Ok(DatePeriod::Custom { start, end })
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, CriteriaError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| CriteriaError::InvalidDate(raw.trim().to_string()))
}

fn portal_date(date: NaiveDate) -> String {
    date.format(&format!("%m{DATE_SEPARATOR}%d{DATE_SEPARATOR}%Y"))
        .to_string()
}

fn quote_component(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Builder for portal search URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourtSearch {
    court: Court,
    court_id: Option<String>,
    period: DatePeriod,
    category: Option<CaseCategory>,
    case_number: Option<String>,
    case_title: Option<String>,
    exclude_closed: bool,
    sort_descending: bool,
    page_size: u32,
}

impl CourtSearch {
    pub fn new(court: Court) -> Self {
        Self {
            court,
            court_id: court.known_id().map(str::to_string),
            period: DatePeriod::LastYear,
            category: None,
            case_number: None,
            case_title: None,
            exclude_closed: false,
            sort_descending: true,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn court(&self) -> Court {
        self.court
    }

    pub fn with_court_id(mut self, id: impl Into<String>) -> Self {
        self.court_id = Some(id.into());
        self
    }

    pub fn with_period(mut self, period: DatePeriod) -> Self {
        self.period = period;
        self
    }

    pub fn with_category(mut self, category: CaseCategory) -> Result<Self, CriteriaError> {
        if !self.court.categories().contains(&category) {
            return Err(CriteriaError::CategoryNotAvailable {
                category,
                court: self.court,
            });
        }
        self.category = Some(category);
        Ok(self)
    }

    pub fn with_case_number(mut self, case_number: impl Into<String>) -> Self {
        self.case_number = Some(case_number.into());
        self
    }

    pub fn with_case_title(mut self, title: impl Into<String>) -> Self {
        self.case_title = Some(title.into());
        self
    }

    pub fn exclude_closed(mut self, exclude: bool) -> Self {
        self.exclude_closed = exclude;
        self
    }

    pub fn sort_descending(mut self, descending: bool) -> Self {
        self.sort_descending = descending;
        self
    }

    /// Encoded `criteria` value for results page `page_number`.
    pub fn criteria(&self, page_number: u32, today: NaiveDate) -> Result<String, CriteriaError> {
        let court_id = self
            .court_id
            .as_deref()
            .ok_or(CriteriaError::MissingCourtId(self.court))?;
        let (start, end) = self.period.range(today);

        let mut case_parts = vec![
            format!(
                "caseCategoryID~{}",
                self.category.map_or(ALL_CATEGORIES_ID, CaseCategory::id)
            ),
            format!("caseNumberQueryTypeID~{CONTAINS_CASE_NUMBER_QUERY}"),
            format!("caseTitleQueryTypeID~{CONTAINS_CASE_TITLE_QUERY}"),
            format!("filedDateChoice~%27{}", self.period.choice()),
            format!("filedDateStart~%27{}", portal_date(start)),
            format!("filedDateEnd~%27{}", portal_date(end)),
            format!("excludeClosed~{}", self.exclude_closed),
        ];
        if let Some(number) = &self.case_number {
            case_parts.push(format!("caseNumber~{}", quote_component(number)));
        }
        if let Some(title) = &self.case_title {
            case_parts.push(format!("caseTitle~{}", quote_component(title)));
        }

        let parts = [
            "advanced~false".to_string(),
            format!("courtID~%27{court_id}"),
            format!(
                "page~%28size~{}~number~{page_number}~totalElements~0~totalPages~0%29",
                self.page_size
            ),
            format!(
                "sort~%28sortBy~%27{DEFAULT_SORT_FIELD}~sortDesc~{}%29",
                self.sort_descending
            ),
            format!("case~%28{}%29", case_parts.join("~")),
        ];
        Ok(format!("~%28{}%29", parts.join("~")))
    }

    pub fn build_url(&self, page_number: u32, today: NaiveDate) -> Result<String, CriteriaError> {
        Ok(format!(
            "{COURT_SEARCH_BASE_URL}?criteria={}",
            self.criteria(page_number, today)?
        ))
    }
}

/// Page position encoded in a portal results URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CourtPageInfo {
    pub number: Option<u32>,
    pub total_pages: Option<u32>,
}

fn page_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"page~(?:\(|%28)(?:[A-Za-z]+~[^~()%]*~)*?number~(\d+)")
            .expect("valid page number regex")
    })
}

fn total_pages_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"totalPages~(\d+)").expect("valid total pages regex"))
}

/// Reads the current page number and total page count from a results URL.
pub fn parse_court_url(url: &str) -> CourtPageInfo {
    let number = page_number_regex()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok());
    let total_pages = total_pages_regex()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok());
    CourtPageInfo {
        number,
        total_pages,
    }
}

/// Rewrites the page number of a results URL. URLs without one are returned unchanged.
pub fn court_page_url(url: &str, page_number: u32) -> String {
    match page_number_regex().captures(url).and_then(|caps| caps.get(1)) {
        Some(m) => format!("{}{page_number}{}", &url[..m.start()], &url[m.end()..]),
        None => url.to_string(),
    }
}

/// True if `url` points at the portal's case search results.
pub fn is_court_url(url: &str) -> bool {
    Url::parse(url)
        .map(|parsed| {
            parsed.host_str() == Some(COURT_HOST) && parsed.path().starts_with(COURT_RESULTS_PATH)
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_date_periods() {
        assert_eq!("7d".parse::<DatePeriod>().unwrap(), DatePeriod::LastWeek);
        assert_eq!("1y".parse::<DatePeriod>().unwrap(), DatePeriod::LastYear);
        let custom: DatePeriod = "2024-01-01..2024-03-31".parse().unwrap();
        assert_eq!(
            custom,
            DatePeriod::Custom {
                start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
            }
        );
        assert!(matches!(
            "2024-03-31..2024-01-01".parse::<DatePeriod>(),
            Err(CriteriaError::InvertedRange { .. })
        ));
        assert!(matches!(
            "2w".parse::<DatePeriod>(),
            Err(CriteriaError::UnknownDatePeriod(_))
        ));
    }

    #[test]
    fn portal_dates_use_encoded_separator() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 11).unwrap();
        assert_eq!(portal_date(date), "06%2a2f11%2a2f2024");
    }

    #[test]
    fn quotes_spaces_as_percent_twenty() {
        assert_eq!(quote_component("Smith v. Jones"), "Smith%20v.%20Jones");
    }

    #[test]
    fn category_must_belong_to_court() {
        let err = CourtSearch::new(Court::Civil)
            .with_category(CaseCategory::CertifiedQuestion)
            .unwrap_err();
        assert!(matches!(err, CriteriaError::CategoryNotAvailable { .. }));
        assert!(CourtSearch::new(Court::Supreme)
            .with_court_id("x")
            .with_category(CaseCategory::CertifiedQuestion)
            .is_ok());
    }

    #[test]
    fn case_number_hint_uses_court_prefix() {
        assert_eq!(Court::Criminal.case_number_hint(2025), "CR-2025-####");
    }
}
