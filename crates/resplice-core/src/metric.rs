//! Feature extraction and the normalized distance between sample blocks
//!
//! The innermost resolution compares raw samples; coarser resolutions compare
//! magnitude spectra. The feature choice is a parameter so callers can swap
//! in mel or cepstral features without touching the detector.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which feature vector to derive from a sample block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// The block's samples, unchanged. Used at sample-accurate resolutions.
    RawSamples,
    /// Magnitude of the block's discrete Fourier transform.
    MagnitudeSpectrum,
}

/// Extracts feature vectors from equal-length sample blocks.
///
/// The FFT plan is created once per block length and reused for every block
/// of an analysis level.
pub struct FeatureExtractor {
    kind: FeatureKind,
    fft: Option<Arc<dyn Fft<f64>>>,
}

impl FeatureExtractor {
    pub fn new(kind: FeatureKind, block_length: usize) -> Self {
        let fft = match kind {
            FeatureKind::RawSamples => None,
            FeatureKind::MagnitudeSpectrum => {
                Some(FftPlanner::new().plan_fft_forward(block_length))
            }
        };
        Self { kind, fft }
    }

    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    pub fn extract(&self, block: &[f64]) -> Vec<f64> {
        match &self.fft {
            None => block.to_vec(),
            Some(fft) => {
                debug_assert_eq!(block.len(), fft.len());
                let mut buffer: Vec<Complex<f64>> =
                    block.iter().map(|&s| Complex::new(s, 0.0)).collect();
                fft.process(&mut buffer);
                buffer.iter().map(|c| c.norm()).collect()
            }
        }
    }
}

/// Normalized squared-Euclidean distance between two equal-length feature
/// vectors: `|u - v|^2 / (|u - v|^2 + |u + v|^2)`.
///
/// Scale-invariant and bounded to [0, 1]. Two all-zero vectors (silence)
/// yield 0: silence may always be jump-spliced for free.
pub fn normalized_distance(u: &[f64], v: &[f64]) -> f64 {
    debug_assert_eq!(u.len(), v.len());
    let mut diff = 0.0;
    let mut sum = 0.0;
    for (&a, &b) in u.iter().zip(v) {
        diff += (a - b) * (a - b);
        sum += (a + b) * (a + b);
    }
    let norm = diff + sum;
    if norm == 0.0 {
        0.0
    } else {
        diff / norm
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_identical_blocks_have_zero_distance() {
        let u = [0.5, -0.25, 0.75, 0.1];
        assert_relative_eq!(normalized_distance(&u, &u), 0.0);
    }

    #[test]
    fn test_all_zero_blocks_are_free() {
        let z = [0.0; 8];
        assert_relative_eq!(normalized_distance(&z, &z), 0.0);
    }

    #[test]
    fn test_opposite_blocks_have_maximal_distance() {
        let u = [1.0, -0.5, 0.25];
        let v = [-1.0, 0.5, -0.25];
        // u + v is all zero, so the whole norm sits in the difference term.
        assert_relative_eq!(normalized_distance(&u, &v), 1.0);
    }

    #[test]
    fn test_distance_is_symmetric_and_bounded() {
        let u = [0.1, 0.9, -0.4, 0.2];
        let v = [-0.3, 0.5, 0.8, -0.6];
        let d = normalized_distance(&u, &v);
        assert_relative_eq!(d, normalized_distance(&v, &u));
        assert!((0.0..=1.0).contains(&d));
    }

    #[test]
    fn test_distance_is_scale_invariant() {
        let u = [0.1, 0.9, -0.4, 0.2];
        let v = [-0.3, 0.5, 0.8, -0.6];
        let u2: Vec<f64> = u.iter().map(|x| x * 3.0).collect();
        let v2: Vec<f64> = v.iter().map(|x| x * 3.0).collect();
        assert_relative_eq!(
            normalized_distance(&u, &v),
            normalized_distance(&u2, &v2),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_raw_features_pass_through() {
        let extractor = FeatureExtractor::new(FeatureKind::RawSamples, 4);
        let block = [0.25, -0.5, 0.0, 1.0];
        assert_eq!(extractor.extract(&block), block.to_vec());
    }

    #[test]
    fn test_spectrum_of_constant_block_concentrates_in_dc() {
        let extractor = FeatureExtractor::new(FeatureKind::MagnitudeSpectrum, 8);
        let spectrum = extractor.extract(&[1.0; 8]);
        assert_eq!(spectrum.len(), 8);
        assert_relative_eq!(spectrum[0], 8.0, epsilon = 1e-9);
        for bin in &spectrum[1..] {
            assert_relative_eq!(*bin, 0.0, epsilon = 1e-9);
        }
    }
}
