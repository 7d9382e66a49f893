pub mod crawler;
pub mod extractor;
pub mod fetcher;
pub mod record;

pub use crawler::Orchestrator;
pub use fetcher::Fetcher;
pub use record::PageRecord;
