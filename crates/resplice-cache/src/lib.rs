//! On-disk cache for detected cut lists
//!
//! Cut detection is deterministic, so a .cuts file keyed by buffer length
//! and detector configuration can stand in for a fresh analysis. [`probe`]
//! is the usual entry point: it returns the cached cuts when the entry
//! matches and `None` when the analysis has to be redone.

pub mod error;
pub mod format;
pub mod reader;
pub mod writer;

pub use error::{CacheError, Result};
pub use format::{CutsFile, CutsHeader, MAGIC, VERSION};
pub use reader::CutsReader;
pub use writer::CutsWriter;

use resplice_core::{Cut, CutConfig};
use std::path::Path;

/// Load a cache entry if it exists and matches the requested analysis.
///
/// A missing file and a stale or corrupt entry both yield `None`; only
/// genuine i/o or decode failures surface as errors.
pub fn probe(path: &Path, num_samples: usize, config: &CutConfig) -> Result<Option<Vec<Cut>>> {
    if !path.exists() {
        return Ok(None);
    }
    match CutsReader::read(path) {
        Ok(file) => {
            if file.header.num_samples != num_samples as u64 || &file.config != config {
                log::info!("cache entry {} is for a different analysis", path.display());
                return Ok(None);
            }
            log::info!("loaded {} cuts from {}", file.cuts.len(), path.display());
            Ok(Some(file.cuts))
        }
        Err(CacheError::Stale) | Err(CacheError::ChecksumMismatch) | Err(CacheError::BadMagic) => {
            log::warn!("ignoring unusable cache entry {}", path.display());
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Store a cache entry for later [`probe`] calls.
pub fn store(path: &Path, num_samples: usize, config: &CutConfig, cuts: &[Cut]) -> Result<()> {
    CutsWriter::write(path, num_samples, config, cuts)
}
