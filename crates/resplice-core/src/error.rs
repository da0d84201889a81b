//! Error taxonomy of the engine
//!
//! Configuration and invariant errors abort a request before or during
//! construction; `NoPathFound` is the only failure that can occur after
//! substantial computation and carries diagnostics. `SpliceRejected` is a
//! local, non-fatal condition swallowed inside the search strategies.

use crate::path::Path;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or inconsistent detection/search parameters. Detected eagerly,
    /// before any computation starts.
    #[error("configuration error: {0}")]
    Config(String),

    /// The built graph failed its structural postcondition. Indicates a bug
    /// in cut generation or boundary merging, not a user error.
    #[error("automaton invariant violated: {0}")]
    AutomatonInvariant(String),

    /// A search strategy exhausted its budget without any path reaching the
    /// end segment. Carries the best partial attempt if one exists.
    #[error("no path found after examining {examined} candidates")]
    NoPathFound {
        examined: usize,
        best_partial: Option<Path>,
    },
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Error::AutomatonInvariant(msg.into())
    }
}

/// A loop or cut insertion attempt was structurally invalid, e.g. the path
/// shares no segment with the loop. The affected candidate is discarded and
/// the search continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("splice rejected: no valid insertion point")]
pub struct SpliceRejected;
