//! Error types for the slice-finding engine.

use thiserror::Error;

/// Catch-all error for this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// `addedX`/`oldX` disagree on column count, or `newE`'s row count
    /// does not match `addedX`'s.
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),
    /// A prior lattice was supplied without the params that produced it.
    /// Incremental runs must reuse the parameters of the run whose
    /// lattice they extend, or scores and lattice shape would silently
    /// stop being comparable.
    #[error("prevLattice was supplied but params was empty")]
    MissingParams,
    /// Error that does not originate from this crate.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
