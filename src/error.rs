//! Error taxonomy for retrieval and extraction.

use thiserror::Error;

/// Failures surfaced by the fetch tiers and the extraction engine.
///
/// Retrieval and extraction errors are recovered locally by the resolution
/// pipeline (direct tier escalates to the rendered tier); only exhaustion of
/// both tiers becomes a per-offer user-visible failure.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Malformed URL or config, rejected before any I/O.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Network error, timeout, or non-2xx response.
    #[error("retrieval failed: {0}")]
    Retrieval(String),

    /// Page retrieved, but no extraction strategy matched.
    #[error("no price found in page")]
    ExtractionMiss,

    /// Headless render sidecar failure.
    #[error("render failed: {0}")]
    Render(String),
}

pub type Result<T> = std::result::Result<T, Error>;
