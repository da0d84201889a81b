//! Core value types shared across the engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a sample in the source buffer.
pub type SamplePos = usize;

/// A candidate jump in the source recording: stop playing at `start`, resume
/// at `end`. Cost 0 is a free splice, infinity a forbidden one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cut {
    pub start: SamplePos,
    pub end: SamplePos,
    pub cost: f64,
}

impl Cut {
    pub fn new(start: SamplePos, end: SamplePos, cost: f64) -> Self {
        Self { start, end, cost }
    }

    /// Absolute distance jumped over by this cut.
    pub fn jump_length(&self) -> usize {
        self.start.abs_diff(self.end)
    }
}

/// Sort cuts ascending by cost, the canonical ranking order.
pub fn sort_by_cost(cuts: &mut [Cut]) {
    cuts.sort_by(|a, b| a.cost.total_cmp(&b.cost));
}

/// Sort cuts by (start, end), the chronological order assumed by the
/// cut-list based search strategies.
pub fn sort_chronologically(cuts: &mut [Cut]) {
    cuts.sort_by(|a, b| (a.start, a.end).cmp(&(b.start, b.end)));
}

/// A contiguous, non-overlapping slice of source samples, the atomic unit of
/// playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub start: SamplePos,
    pub end: SamplePos,
}

impl Segment {
    pub fn new(start: SamplePos, end: SamplePos) -> Self {
        debug_assert!(start < end);
        Self { start, end }
    }

    pub fn duration(&self) -> usize {
        self.end - self.start
    }

    pub fn contains(&self, pos: SamplePos) -> bool {
        self.start <= pos && pos < self.end
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}--{}", self.start, self.end)
    }
}

/// Anchors a position in the source recording to a position in the desired
/// output timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keypoint {
    pub source: SamplePos,
    pub target: SamplePos,
}

impl Keypoint {
    pub fn new(source: SamplePos, target: SamplePos) -> Self {
        Self { source, target }
    }
}
