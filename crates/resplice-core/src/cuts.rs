//! Hierarchical cut detection
//!
//! Finds perceptually seamless jump candidates by a multi-resolution
//! self-similarity search: the buffer is compared against itself in coarse
//! blocks, the most similar block pairs are refined recursively with a
//! shrinking block length down to single samples, and the per-level distances
//! are combined into one weighted cost per sample-accurate cut.
//!
//! Fully deterministic: identical buffer and configuration yield an
//! identical cut list.

use crate::config::{CutConfig, MinCutLength};
use crate::error::{Error, Result};
use crate::metric::{normalized_distance, FeatureExtractor, FeatureKind};
use crate::types::{sort_by_cost, Cut, SamplePos};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// One block pair selected for refinement: absolute block start positions
/// and the feature distance at this level.
struct Selection {
    start1: SamplePos,
    start2: SamplePos,
    distance: f64,
    child: Option<AnalysisLayer>,
}

/// One level of the recursive self-similarity analysis.
struct AnalysisLayer {
    selections: Vec<Selection>,
}

/// Max-heap entry used for bounded partial selection of the smallest
/// distance matrix entries. Ties break on block indices to keep the
/// selection deterministic.
struct HeapEntry {
    distance: f64,
    i: usize,
    j: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then(self.i.cmp(&other.i))
            .then(self.j.cmp(&other.j))
    }
}

impl AnalysisLayer {
    fn build(
        samples: &[f64],
        range1: (SamplePos, SamplePos),
        range2: (SamplePos, SamplePos),
        block_length: usize,
        num_keep: usize,
        config: &CutConfig,
    ) -> Self {
        let shrink = config.block_length_shrink;
        let (start1, end1) = range1;
        let (start2, end2) = range2;
        let num_blocks1 = (end1 - start1) / block_length;
        let num_blocks2 = (end2 - start2) / block_length;

        if block_length >= shrink.saturating_pow(3) {
            log::debug!(
                "finding cuts between [{start1}, {end1}) and [{start2}, {end2}), \
                 block length {block_length}, keeping {num_keep}"
            );
        }

        // Innermost levels compare raw samples, coarser ones magnitude spectra.
        let kind = if block_length < shrink.saturating_pow(config.raw_levels as u32) {
            FeatureKind::RawSamples
        } else {
            FeatureKind::MagnitudeSpectrum
        };
        let extractor = FeatureExtractor::new(kind, block_length);

        let features1: Vec<Vec<f64>> = (0..num_blocks1)
            .into_par_iter()
            .map(|i| {
                let at = start1 + i * block_length;
                extractor.extract(&samples[at..at + block_length])
            })
            .collect();
        let features2: Vec<Vec<f64>> = if range1 == range2 {
            features1.clone()
        } else {
            (0..num_blocks2)
                .into_par_iter()
                .map(|j| {
                    let at = start2 + j * block_length;
                    extractor.extract(&samples[at..at + block_length])
                })
                .collect()
        };

        let distances: Vec<Vec<f64>> = (0..num_blocks1)
            .into_par_iter()
            .map(|i| {
                (0..num_blocks2)
                    .map(|j| {
                        if Self::excluded(config, range1, range2, block_length, i, j) {
                            f64::INFINITY
                        } else {
                            normalized_distance(&features1[i], &features2[j])
                        }
                    })
                    .collect()
            })
            .collect();

        // Bounded partial selection of the globally smallest entries.
        let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::with_capacity(num_keep + 1);
        for (i, row) in distances.iter().enumerate() {
            for (j, &distance) in row.iter().enumerate() {
                if !distance.is_finite() {
                    continue;
                }
                heap.push(HeapEntry { distance, i, j });
                if heap.len() > num_keep {
                    heap.pop();
                }
            }
        }
        let best = heap.into_sorted_vec();

        // Keep at least one refinement per selected child.
        let matrix_size = num_blocks1 * num_blocks2;
        let child_keep = (num_keep / matrix_size.max(1)).max(1);
        let new_block_length = (block_length / shrink).max(1);

        let selections: Vec<Selection> = best
            .into_par_iter()
            .map(|entry| {
                let block_start1 = start1 + entry.i * block_length;
                let block_start2 = start2 + entry.j * block_length;
                let child = (block_length > 1).then(|| {
                    AnalysisLayer::build(
                        samples,
                        (block_start1, block_start1 + block_length),
                        (block_start2, block_start2 + block_length),
                        new_block_length,
                        child_keep,
                        config,
                    )
                });
                Selection {
                    start1: block_start1,
                    start2: block_start2,
                    distance: entry.distance,
                    child,
                }
            })
            .collect();

        Self { selections }
    }

    /// Whether the block pair `(i, j)` may not be cut at all.
    fn excluded(
        config: &CutConfig,
        range1: (SamplePos, SamplePos),
        range2: (SamplePos, SamplePos),
        block_length: usize,
        i: usize,
        j: usize,
    ) -> bool {
        match config.min_cut_length {
            // A jump from a block to itself is a no-op, not a genuine cut.
            MinCutLength::Block => range1 == range2 && i == j,
            MinCutLength::Samples(min) => {
                let block_start1 = range1.0 + i * block_length;
                let block_start2 = range2.0 + j * block_length;
                let block_end1 = block_start1 + block_length;
                let block_end2 = block_start2 + block_length;
                // Largest jump any sample pair inside this block pair could
                // make; below the minimum, no refinement can succeed.
                let reach = (block_end2 - 1)
                    .abs_diff(block_start1)
                    .max((block_end1 - 1).abs_diff(block_start2));
                reach < min
            }
        }
    }

    /// Flatten the recursion tree bottom-up, combining each level's distance
    /// with the accumulated, level-weighted parent cost.
    fn collect(&self, weight_factor: f64, weight: f64, out: &mut Vec<Cut>) {
        let child_weight = weight * weight_factor;
        for selection in &self.selections {
            match &selection.child {
                Some(child) => {
                    let parent_cost = weight * selection.distance;
                    let mut child_cuts = Vec::new();
                    child.collect(weight_factor, child_weight, &mut child_cuts);
                    out.extend(
                        child_cuts
                            .into_iter()
                            .map(|c| Cut::new(c.start, c.end, c.cost + parent_cost)),
                    );
                }
                None => out.push(Cut::new(
                    selection.start1,
                    selection.start2,
                    weight * selection.distance,
                )),
            }
        }
    }
}

/// Number of levels that fit the buffer: the largest `n` such that at least
/// two blocks of length `shrink^(n-1)` fit.
fn max_levels(num_samples: usize, shrink: usize) -> usize {
    let mut levels = 1;
    let mut block_length = 1usize;
    while let Some(next) = block_length.checked_mul(shrink) {
        if next.saturating_mul(2) > num_samples {
            break;
        }
        block_length = next;
        levels += 1;
    }
    levels
}

/// Search the whole buffer for jump candidates and return them sorted
/// ascending by cost, truncated to `num_keep`.
pub fn find_cuts(samples: &[f64], config: &CutConfig) -> Result<Vec<Cut>> {
    config.validate()?;
    let shrink = config.block_length_shrink;
    if samples.len() < 2 {
        return Err(Error::config("buffer too short for cut analysis"));
    }

    let num_levels = config
        .num_levels
        .unwrap_or_else(|| max_levels(samples.len(), shrink));
    let block_length = shrink
        .checked_pow((num_levels - 1) as u32)
        .filter(|b| b.saturating_mul(2) <= samples.len())
        .ok_or_else(|| {
            Error::config("num_levels produces a block length larger than the buffer")
        })?;

    // The tail that does not fill a whole block is never cut-searched.
    let analyzed = block_length * (samples.len() / block_length);
    log::info!(
        "cut analysis: {analyzed} of {} samples, {num_levels} levels, top block length {block_length}",
        samples.len()
    );

    let root = AnalysisLayer::build(
        &samples[..analyzed],
        (0, analyzed),
        (0, analyzed),
        block_length,
        config.num_cuts,
        config,
    );

    let mut cuts = Vec::new();
    root.collect(config.weight_factor, 1.0, &mut cuts);

    // Postcondition: any cut below the minimum jump length is forbidden.
    if let MinCutLength::Samples(min) = config.min_cut_length {
        for cut in &mut cuts {
            if cut.jump_length() < min {
                cut.cost = f64::INFINITY;
            }
        }
    }
    cuts.retain(|c| c.cost.is_finite());

    sort_by_cost(&mut cuts);
    if let Some(keep) = config.num_keep {
        cuts.truncate(keep);
    }
    log::info!("kept {} cuts", cuts.len());
    Ok(cuts)
}
