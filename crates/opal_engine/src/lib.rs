//! OPAL engine: fetching, extraction, pagination and output.
mod batch;
mod browser;
mod decode;
mod fetch;
mod orchestrator;
mod paginate;
mod persist;
mod registry;
pub mod strategy;
mod types;

pub use batch::{fetch_batch, BatchError, FetchBatch, UrlFailure};
pub use browser::{BrowserError, BrowserFetcher, BrowserSettings, DEFAULT_DEVTOOLS_URL};
pub use decode::{decode_html, DecodeError, DecodedHtml};
pub use fetch::{
    FetchSettings, Fetcher, LogProgressSink, NullProgressSink, ProgressSink, ReqwestFetcher,
    DEFAULT_USER_AGENT,
};
pub use orchestrator::{
    BatchOutcome, BatchReport, ExtractionFailure, Orchestrator, OrchestratorError,
};
pub use paginate::{
    discover_links, CourtPaginator, ListingLinks, ListingPage, ListingPaginator, Paginator,
};
pub use persist::{ensure_output_dir, output_filename, AtomicFileWriter, PersistError};
pub use registry::{ParserRegistry, RegistryError, StrategyFactory};
pub use strategy::{ExtractionError, ExtractionStrategy};
pub use types::{EngineEvent, FailureKind, FetchError, FetchMetadata, FetchOutput, JobId};
