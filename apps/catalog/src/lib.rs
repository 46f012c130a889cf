//! Exercise catalog runtime: batched loading, faceted browsing and answer
//! checking on top of `exercise-core`.

pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod manifest;
pub mod session;
pub mod source;
pub mod view;

pub use config::CatalogConfig;
pub use error::{CatalogError, Result, SourceError};
pub use loader::{enrich_exercise, BatchOutcome, CatalogLoader, LoadState, Pagination};
pub use manifest::{ManifestEntry, ManifestError, ManifestReport};
pub use session::{CatalogSession, Feedback, Presenter, QuestionKey, SOLUTION_PLACEHOLDER};
pub use source::{ConfiguredSource, FsSource, HttpSource, MemorySource, RecordSource};
pub use view::{View, ViewResolver};
