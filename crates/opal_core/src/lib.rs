//! OPAL core: record types, court-portal URL math and the pure crawl state machine.
mod court;
mod effect;
mod msg;
mod record;
mod state;
mod update;

pub use court::{
    court_page_url, is_court_url, parse_court_url, CaseCategory, Court, CourtPageInfo,
    CourtSearch, CriteriaError, DatePeriod, COURT_SEARCH_BASE_URL,
};
pub use effect::{CrawlOutcome, Effect};
pub use msg::{BatchResultKind, Msg};
pub use record::{CaseNumber, CourtCaseRecord, LineContent, NewsRecord, ParsedRecord, ResultSet};
pub use state::{normalize_url_for_dedupe, BatchId, BatchSummary, CrawlState, CrawlSummary, SessionState};
pub use update::update;
