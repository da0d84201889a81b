//! Path search strategies
//!
//! Five interchangeable strategies produce a `Path` between two keypoints
//! over a shared `SegmentAutomaton`, all ranked by the same cost model.
//! Strategies are selected through `StrategyConfig`, which doubles as the
//! serialized form used by configuration files and the command line.

use crate::automaton::SegmentAutomaton;
use crate::error::{Error, Result};
use crate::path::{CostParams, Path};
use crate::types::{Cut, Keypoint, SamplePos};
use serde::{Deserialize, Serialize};

pub mod breadth;
pub mod depthfirst;
pub mod genetic;
pub mod greedy;
pub mod loops;

#[cfg(test)]
mod tests;

pub use breadth::{BreadthConfig, BreadthSearch};
pub use depthfirst::{DepthFirstConfig, DepthFirstSearch};
pub use genetic::{GeneticConfig, GeneticSearch};
pub use greedy::{GreedyConfig, GreedySearch};
pub use loops::{LoopConfig, LoopDedup, LoopSampling, LoopSearch};

/// Everything a strategy needs to search: the automaton, the cut set in
/// chronological order, and the cost weights.
pub struct SearchContext<'a> {
    pub automaton: &'a SegmentAutomaton,
    /// Cuts sorted by `(start, end)`, as produced by `sort_chronologically`.
    pub cuts: &'a [Cut],
    pub cost: CostParams,
}

impl<'a> SearchContext<'a> {
    pub fn new(automaton: &'a SegmentAutomaton, cuts: &'a [Cut], cost: CostParams) -> Self {
        Self {
            automaton,
            cuts,
            cost,
        }
    }

    /// Segment index where a piece starting at this keypoint begins. The
    /// keypoint snaps back to the start of its containing segment.
    pub fn start_index(&self, keypoint: Keypoint) -> Result<usize> {
        self.automaton.containing(keypoint.source).ok_or_else(|| {
            Error::config(format!(
                "start keypoint {} outside the analyzed range",
                keypoint.source
            ))
        })
    }

    /// Segment index where a piece ending at this keypoint finishes. The
    /// keypoint snaps forward to the end of its containing segment; a
    /// keypoint sitting exactly on a boundary selects the segment ending
    /// there.
    pub fn end_index(&self, keypoint: Keypoint) -> Result<usize> {
        let (range_start, range_end) = self.automaton.range();
        if keypoint.source == range_end {
            return Ok(self.automaton.terminal());
        }
        if keypoint.source <= range_start {
            return Err(Error::config(format!(
                "end keypoint {} at or before the range start",
                keypoint.source
            )));
        }
        match self.automaton.index_of_start(keypoint.source) {
            Some(index) => Ok(index - 1),
            None => self.automaton.containing(keypoint.source).ok_or_else(|| {
                Error::config(format!(
                    "end keypoint {} outside the analyzed range",
                    keypoint.source
                ))
            }),
        }
    }

    /// Source position playback must start from, after boundary snapping.
    pub fn snapped_start(&self, keypoint: Keypoint) -> Result<SamplePos> {
        Ok(self.automaton.segment(self.start_index(keypoint)?).start)
    }

    /// Source position playback must stop at, after boundary snapping.
    pub fn snapped_end(&self, keypoint: Keypoint) -> Result<SamplePos> {
        Ok(self.automaton.segment(self.end_index(keypoint)?).end)
    }

    /// The snapped playback window of one piece.
    pub(super) fn window(&self, start: Keypoint, end: Keypoint) -> Result<PieceWindow> {
        Ok(PieceWindow {
            start: self.snapped_start(start)?,
            end: self.snapped_end(end)?,
        })
    }
}

/// Playback window of one piece, after keypoint snapping.
#[derive(Debug, Clone, Copy)]
pub(super) struct PieceWindow {
    pub start: SamplePos,
    pub end: SamplePos,
}

/// Decode a playback-ordered cut list into the path it plays: from the
/// window start to the first cut, jump, and so on until the window end.
pub(super) fn decode_cuts(
    cuts: &[Cut],
    start: Keypoint,
    end: Keypoint,
    window: PieceWindow,
) -> Path {
    let mut segments = Vec::with_capacity(cuts.len() + 1);
    let mut costs = Vec::with_capacity(cuts.len() + 1);
    let mut position = window.start;
    costs.push(0.0);
    for cut in cuts {
        segments.push(crate::types::Segment::new(position, cut.start));
        costs.push(cut.cost);
        position = cut.end;
    }
    segments.push(crate::types::Segment::new(position, window.end));
    Path::from_parts(segments, costs, start, end)
}

/// A path search strategy between two keypoints.
pub trait PathSearch {
    fn name(&self) -> &'static str;

    /// Find a path from `start` to `end` whose duration approximates the
    /// difference of the keypoint targets, minimizing the shared cost model.
    fn search(&self, ctx: &SearchContext<'_>, start: Keypoint, end: Keypoint) -> Result<Path>;
}

/// Strategy selection plus per-strategy parameters, in one serializable
/// value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum StrategyConfig {
    Greedy(GreedyConfig),
    Loops(LoopConfig),
    Genetic(GeneticConfig),
    Breadth(BreadthConfig),
    DepthFirst(DepthFirstConfig),
}

impl StrategyConfig {
    /// A strategy with default parameters, selected by name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "greedy" => Ok(Self::Greedy(GreedyConfig::default())),
            "loops" => Ok(Self::Loops(LoopConfig::default())),
            "genetic" => Ok(Self::Genetic(GeneticConfig::default())),
            "breadth" => Ok(Self::Breadth(BreadthConfig::default())),
            "depth_first" => Ok(Self::DepthFirst(DepthFirstConfig::default())),
            other => Err(Error::config(format!("unknown search strategy '{other}'"))),
        }
    }

    pub fn build(&self) -> Box<dyn PathSearch> {
        match self {
            Self::Greedy(config) => Box::new(GreedySearch::new(config.clone())),
            Self::Loops(config) => Box::new(LoopSearch::new(config.clone())),
            Self::Genetic(config) => Box::new(GeneticSearch::new(config.clone())),
            Self::Breadth(config) => Box::new(BreadthSearch::new(config.clone())),
            Self::DepthFirst(config) => Box::new(DepthFirstSearch::new(config.clone())),
        }
    }
}
