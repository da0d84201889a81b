//! Immutable path values and the shared cost model
//!
//! A `Path` is an ordered sequence of segments with the cost of the edge
//! entering each segment (the first entry is always 0), anchored by the
//! keypoint pair it connects. Paths are value types: every splice or append
//! returns a new `Path`, so in-flight search candidates never alias.

use crate::types::{Keypoint, SamplePos, Segment};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Weights of the cost function used to rank paths everywhere in the engine.
///
/// `cost = duration_penalty * (duration - target)^2
///       + cut_penalty * sum(edge costs)
///       + repetition_penalty * (product of segment occurrence counts - 1)`
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CostParams {
    pub duration_penalty: f64,
    pub cut_penalty: f64,
    pub repetition_penalty: f64,
}

impl Default for CostParams {
    fn default() -> Self {
        Self {
            duration_penalty: 1e2,
            cut_penalty: 1e1,
            repetition_penalty: 1e3,
        }
    }
}

/// An ordered sequence of playback segments with incoming edge costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    segments: Vec<Segment>,
    costs: Vec<f64>,
    start_keypoint: Keypoint,
    end_keypoint: Keypoint,
}

impl Path {
    /// An empty path anchored at the given keypoints.
    pub fn empty(start_keypoint: Keypoint, end_keypoint: Keypoint) -> Self {
        Self {
            segments: Vec::new(),
            costs: Vec::new(),
            start_keypoint,
            end_keypoint,
        }
    }

    /// Assemble a path from parallel segment and edge-cost sequences.
    pub fn from_parts(
        segments: Vec<Segment>,
        costs: Vec<f64>,
        start_keypoint: Keypoint,
        end_keypoint: Keypoint,
    ) -> Self {
        debug_assert_eq!(segments.len(), costs.len());
        debug_assert!(costs.first().map_or(true, |&c| c == 0.0));
        Self {
            segments,
            costs,
            start_keypoint,
            end_keypoint,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn edge_costs(&self) -> &[f64] {
        &self.costs
    }

    pub fn keypoints(&self) -> (Keypoint, Keypoint) {
        (self.start_keypoint, self.end_keypoint)
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Sample position where playback starts; the start keypoint for an
    /// empty path.
    pub fn start(&self) -> SamplePos {
        self.segments
            .first()
            .map_or(self.start_keypoint.source, |s| s.start)
    }

    /// Sample position where playback currently ends; the start keypoint for
    /// an empty path.
    pub fn end(&self) -> SamplePos {
        self.segments
            .last()
            .map_or(self.start_keypoint.source, |s| s.end)
    }

    /// Total number of output samples this path plays.
    pub fn duration(&self) -> usize {
        self.segments.iter().map(Segment::duration).sum()
    }

    /// Duration the path is asked to approximate.
    pub fn target_duration(&self) -> usize {
        self.end_keypoint.target - self.start_keypoint.target
    }

    /// Sum of all edge costs paid along the path.
    pub fn cut_cost(&self) -> f64 {
        self.costs.iter().sum()
    }

    /// Product of per-segment occurrence counts, minus one. Zero when no
    /// segment repeats; grows super-linearly with repetition.
    pub fn repetition_measure(&self) -> f64 {
        let mut counts: HashMap<Segment, u32> = HashMap::new();
        for segment in &self.segments {
            *counts.entry(*segment).or_insert(0) += 1;
        }
        counts.values().map(|&c| c as f64).product::<f64>() - 1.0
    }

    /// The scalar used to rank candidates everywhere; lower is better.
    pub fn cost(&self, params: &CostParams) -> f64 {
        let duration_error = self.duration() as f64 - self.target_duration() as f64;
        params.duration_penalty * duration_error * duration_error
            + params.cut_penalty * self.cut_cost()
            + params.repetition_penalty * self.repetition_measure()
    }

    /// A new path with `segment` appended, paying `cost` on the edge into it.
    pub fn appended(&self, cost: f64, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        let mut costs = self.costs.clone();
        segments.push(segment);
        costs.push(cost);
        Self {
            segments,
            costs,
            start_keypoint: self.start_keypoint,
            end_keypoint: self.end_keypoint,
        }
    }

    /// Concatenate another path onto this one. When the shared boundary
    /// segment appears at both ends it is merged, together with its edge cost.
    pub fn concat(&self, other: &Path) -> Self {
        let skip = usize::from(
            !self.segments.is_empty() && self.segments.last() == other.segments.first(),
        );
        let mut segments = self.segments.clone();
        let mut costs = self.costs.clone();
        segments.extend_from_slice(&other.segments[skip..]);
        costs.extend_from_slice(&other.costs[skip..]);
        Self {
            segments,
            costs,
            start_keypoint: self.start_keypoint,
            end_keypoint: other.end_keypoint,
        }
    }
}

/// A cycle of segments used to pad the duration of a path.
///
/// `costs[k]` is the cost of the edge entering `segments[k]`; `costs[0]`
/// closes the cycle from the last segment back to the first. A loop can be
/// rotated to start at any of its segments and spliced into a path that
/// touches one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loop {
    pub segments: Vec<Segment>,
    pub costs: Vec<f64>,
}

impl Loop {
    pub fn new(segments: Vec<Segment>, costs: Vec<f64>) -> Self {
        debug_assert_eq!(segments.len(), costs.len());
        Self { segments, costs }
    }

    pub fn duration(&self) -> usize {
        self.segments.iter().map(Segment::duration).sum()
    }

    pub fn cut_cost(&self) -> f64 {
        self.costs.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn keypoints(target: usize) -> (Keypoint, Keypoint) {
        (Keypoint::new(0, 0), Keypoint::new(10_000, target))
    }

    fn three_segment_path(target: usize) -> Path {
        let (a, b) = keypoints(target);
        Path::from_parts(
            vec![
                Segment::new(0, 2000),
                Segment::new(2000, 5000),
                Segment::new(5000, 10_000),
            ],
            vec![0.0, 0.1, 0.0],
            a,
            b,
        )
    }

    #[test]
    fn test_duration_and_cut_cost() {
        let path = three_segment_path(10_000);
        assert_eq!(path.duration(), 10_000);
        assert_relative_eq!(path.cut_cost(), 0.1);
    }

    #[test]
    fn test_cost_components() {
        let params = CostParams {
            duration_penalty: 2.0,
            cut_penalty: 10.0,
            repetition_penalty: 100.0,
        };
        // duration 10000, target 9000 => duration error 1000^2 * 2
        let path = three_segment_path(9000);
        assert_relative_eq!(path.cost(&params), 2.0 * 1e6 + 10.0 * 0.1);
    }

    #[test]
    fn test_repetition_measure_grows_with_repeats() {
        let (a, b) = keypoints(10_000);
        let no_repeat = three_segment_path(10_000);
        assert_relative_eq!(no_repeat.repetition_measure(), 0.0);

        let repeated = Path::from_parts(
            vec![
                Segment::new(0, 2000),
                Segment::new(2000, 5000),
                Segment::new(2000, 5000),
                Segment::new(2000, 5000),
            ],
            vec![0.0, 0.1, 0.2, 0.2],
            a,
            b,
        );
        assert_relative_eq!(repeated.repetition_measure(), 2.0);
    }

    #[test]
    fn test_appended_does_not_mutate_original() {
        let (a, b) = keypoints(10_000);
        let path = Path::empty(a, b).appended(0.0, Segment::new(0, 2000));
        let longer = path.appended(0.5, Segment::new(5000, 10_000));
        assert_eq!(path.segments().len(), 1);
        assert_eq!(longer.segments().len(), 2);
        assert_eq!(longer.end(), 10_000);
        assert_relative_eq!(longer.cut_cost(), 0.5);
    }

    #[test]
    fn test_concat_merges_shared_boundary_segment() {
        let first = Path::from_parts(
            vec![Segment::new(0, 2000), Segment::new(2000, 5000)],
            vec![0.0, 0.1],
            Keypoint::new(0, 0),
            Keypoint::new(5000, 5000),
        );
        let second = Path::from_parts(
            vec![Segment::new(2000, 5000), Segment::new(5000, 10_000)],
            vec![0.0, 0.0],
            Keypoint::new(2000, 5000),
            Keypoint::new(10_000, 13_000),
        );
        let joined = first.concat(&second);
        assert_eq!(joined.segments().len(), 3);
        assert_eq!(joined.duration(), 10_000);
        assert_relative_eq!(joined.cut_cost(), 0.1);
        assert_eq!(joined.keypoints().1, Keypoint::new(10_000, 13_000));
    }

    #[test]
    fn test_concat_without_shared_boundary() {
        let first = Path::from_parts(
            vec![Segment::new(0, 2000)],
            vec![0.0],
            Keypoint::new(0, 0),
            Keypoint::new(2000, 2000),
        );
        let second = Path::from_parts(
            vec![Segment::new(5000, 10_000)],
            vec![0.0],
            Keypoint::new(5000, 2000),
            Keypoint::new(10_000, 7000),
        );
        let joined = first.concat(&second);
        assert_eq!(joined.segments().len(), 2);
        assert_eq!(joined.duration(), 7000);
    }

    #[test]
    fn test_loop_duration() {
        let lp = Loop::new(
            vec![Segment::new(2000, 5000), Segment::new(5000, 7000)],
            vec![0.3, 0.0],
        );
        assert_eq!(lp.duration(), 5000);
        assert_relative_eq!(lp.cut_cost(), 0.3);
    }
}
