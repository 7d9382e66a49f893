pub mod classifier;
pub mod config;
pub mod error;
pub mod lexicon;
pub mod normalizer;
pub mod pipeline;
pub mod scorer;
pub mod stats;
pub mod storage;

pub use config::{JobConfig, OutputFormat};
pub use error::CoreError;
pub use lexicon::Lexicon;
