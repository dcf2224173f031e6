//! Incremental lattice-enumeration engine for finding high-error data
//! slices in a labeled dataset.
//!
//! Given a feature matrix and a per-row error signal, [`Engine::run`]
//! enumerates conjunctions of feature-value predicates ("slices") and
//! returns the `k` slices whose rows have the most concentrated error,
//! weighing support against error concentration via [`Params::alpha`].
//! Subsequent calls can resume from a prior run's state ([`PriorRun`])
//! and only pay for the rows added since, pruning away lattice regions
//! a prior run already proved too small to matter.

#![warn(missing_docs)]

mod basic;
mod driver;
mod encode;
mod error;
mod eval;
mod lattice;
mod offsets;
mod pairs;
mod params;
mod score;
mod topk;
mod unchanged;

pub use driver::{DebugRow, DebugStats, Engine, PriorRun, RunOutput};
pub use error::{Error, Result};
pub use lattice::DecodedLattice;
pub use offsets::FeatureOffsets;
pub use params::Params;
pub use score::Stats;
