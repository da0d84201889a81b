//! Configuration for cut detection and resequencing requests
//!
//! Defaults match the original driver's values (256 candidate cuts, keep 40,
//! shrink 16, weight factor 1.2).

use crate::error::{Error, Result};
use crate::types::Keypoint;
use serde::{Deserialize, Serialize};

/// Minimum allowed jump distance for a cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinCutLength {
    /// Disallow only the diagonal of each self-comparison block.
    Block,
    /// Disallow any cut jumping fewer than this many samples.
    Samples(usize),
}

/// Parameters of the hierarchical cut detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CutConfig {
    /// Block pairs kept at the top analysis level.
    pub num_cuts: usize,
    /// Cuts kept after the final ranking; `None` keeps all.
    pub num_keep: Option<usize>,
    /// Integer factor by which the block length shrinks per level.
    pub block_length_shrink: usize,
    /// Number of recursion levels; `None` derives the maximum from the
    /// buffer length.
    pub num_levels: Option<usize>,
    /// Per-level weight multiplier for accumulated parent costs.
    pub weight_factor: f64,
    pub min_cut_length: MinCutLength,
    /// Number of innermost levels compared on raw samples instead of
    /// magnitude spectra.
    pub raw_levels: usize,
}

impl Default for CutConfig {
    fn default() -> Self {
        Self {
            num_cuts: 256,
            num_keep: Some(40),
            block_length_shrink: 16,
            num_levels: None,
            weight_factor: 1.2,
            min_cut_length: MinCutLength::Block,
            raw_levels: 1,
        }
    }
}

impl CutConfig {
    /// Validate parameters that do not depend on the buffer; buffer-dependent
    /// checks happen in the detector.
    pub fn validate(&self) -> Result<()> {
        if self.block_length_shrink <= 1 {
            return Err(Error::config("block_length_shrink must be > 1"));
        }
        if self.num_cuts == 0 {
            return Err(Error::config("num_cuts must be > 0"));
        }
        if self.num_keep == Some(0) {
            return Err(Error::config("num_keep must be > 0 or unset"));
        }
        if let Some(levels) = self.num_levels {
            if levels == 0 {
                return Err(Error::config("num_levels must be > 0 or unset"));
            }
        }
        if !(self.weight_factor.is_finite() && self.weight_factor > 0.0) {
            return Err(Error::config("weight_factor must be finite and > 0"));
        }
        if self.raw_levels == 0 {
            return Err(Error::config("raw_levels must be > 0"));
        }
        Ok(())
    }
}

/// An ordered list of keypoints anchoring source positions to positions in
/// the output timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub keypoints: Vec<Keypoint>,
}

impl Request {
    pub fn new(keypoints: Vec<Keypoint>) -> Self {
        Self { keypoints }
    }

    /// Build a request from parallel source/target position lists.
    pub fn from_positions(sources: &[usize], targets: &[usize]) -> Result<Self> {
        if sources.len() != targets.len() {
            return Err(Error::config(
                "source and target keypoint lists must have equal length",
            ));
        }
        Ok(Self::new(
            sources
                .iter()
                .zip(targets)
                .map(|(&s, &t)| Keypoint::new(s, t))
                .collect(),
        ))
    }

    pub fn validate(&self) -> Result<()> {
        if self.keypoints.len() < 2 {
            return Err(Error::config("a request needs at least two keypoints"));
        }
        if self.keypoints[0].target != 0 {
            return Err(Error::config("the first target keypoint must be 0"));
        }
        for pair in self.keypoints.windows(2) {
            if pair[1].source <= pair[0].source {
                return Err(Error::config(
                    "source keypoints must be strictly increasing",
                ));
            }
            if pair[1].target <= pair[0].target {
                return Err(Error::config(
                    "target keypoints must be strictly increasing",
                ));
            }
        }
        Ok(())
    }

    /// Total duration of the requested output timeline.
    pub fn target_duration(&self) -> usize {
        self.keypoints.last().map_or(0, |k| k.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cut_config_is_valid() {
        assert!(CutConfig::default().validate().is_ok());
    }

    #[test]
    fn test_shrink_of_one_is_rejected() {
        let config = CutConfig {
            block_length_shrink: 1,
            ..CutConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_request_validation() {
        let ok = Request::from_positions(&[0, 10_000], &[0, 7000]).unwrap();
        assert!(ok.validate().is_ok());
        assert_eq!(ok.target_duration(), 7000);

        let single = Request::from_positions(&[0], &[0]).unwrap();
        assert!(single.validate().is_err());

        let nonzero_start = Request::from_positions(&[0, 10_000], &[5, 7000]).unwrap();
        assert!(nonzero_start.validate().is_err());

        let decreasing = Request::from_positions(&[0, 5000, 4000], &[0, 3000, 6000]).unwrap();
        assert!(decreasing.validate().is_err());
    }

    #[test]
    fn test_zero_target_duration_is_a_config_error() {
        // Equal consecutive targets would request a zero-length piece.
        let request = Request::from_positions(&[0, 10_000], &[0, 0]).unwrap();
        assert!(matches!(request.validate(), Err(Error::Config(_))));
    }
}
