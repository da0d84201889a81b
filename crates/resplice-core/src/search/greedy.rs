//! Greedy best-first search
//!
//! Keeps a priority queue of partial paths ordered by the shared cost model
//! and always expands the cheapest one. Partial paths longer than the target
//! plus a grace period are discarded, which bounds the search even in graphs
//! full of backward jumps. The first `num_paths` completed paths compete and
//! the cheapest wins.

use super::{PathSearch, SearchContext};
use crate::error::{Error, Result};
use crate::path::Path;
use crate::types::Keypoint;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreedyConfig {
    /// Completed paths collected before returning the best of them.
    pub num_paths: usize,
    /// Extra samples a partial path may overshoot the target by before it is
    /// discarded.
    pub grace_period: usize,
}

impl Default for GreedyConfig {
    fn default() -> Self {
        Self {
            num_paths: 50,
            grace_period: 0,
        }
    }
}

struct Candidate {
    cost: f64,
    tick: usize,
    node: usize,
    path: Path,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost && self.tick == other.tick
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then(self.tick.cmp(&other.tick))
    }
}

pub struct GreedySearch {
    config: GreedyConfig,
}

impl GreedySearch {
    pub fn new(config: GreedyConfig) -> Self {
        Self { config }
    }
}

impl PathSearch for GreedySearch {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn search(&self, ctx: &SearchContext<'_>, start: Keypoint, end: Keypoint) -> Result<Path> {
        let start_index = ctx.start_index(start)?;
        let end_index = ctx.end_index(end)?;
        let target = end.target - start.target;
        let limit = target + self.config.grace_period;

        let mut tick = 0usize;
        let mut heap: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();
        let mut push = |heap: &mut BinaryHeap<Reverse<Candidate>>, node: usize, path: Path| {
            let cost = path.cost(&ctx.cost);
            heap.push(Reverse(Candidate {
                cost,
                tick,
                node,
                path,
            }));
            tick += 1;
        };

        let mut examined = 0usize;
        let mut complete: Vec<Path> = Vec::new();
        let mut best_partial: Option<(f64, Path)> = None;

        let seed = Path::empty(start, end).appended(0.0, ctx.automaton.segment(start_index));
        if start_index == end_index {
            complete.push(seed.clone());
        }
        push(&mut heap, start_index, seed);

        'search: while let Some(Reverse(candidate)) = heap.pop() {
            examined += 1;
            match &best_partial {
                Some((cost, _)) if *cost <= candidate.cost => {}
                _ => best_partial = Some((candidate.cost, candidate.path.clone())),
            }
            for &(edge_cost, successor) in ctx.automaton.node(candidate.node).edges() {
                let next = candidate
                    .path
                    .appended(edge_cost, ctx.automaton.segment(successor));
                if successor == end_index {
                    // Record the arrival, but keep walking through the end
                    // segment while the path can still grow: its own jump
                    // edges may be the only way to stretch further.
                    complete.push(next.clone());
                    if complete.len() >= self.config.num_paths {
                        break 'search;
                    }
                }
                if next.duration() <= limit {
                    push(&mut heap, successor, next);
                }
            }
        }

        log::debug!(
            "greedy search examined {} candidates, {} complete",
            examined,
            complete.len()
        );
        complete
            .into_iter()
            .min_by(|a, b| a.cost(&ctx.cost).total_cmp(&b.cost(&ctx.cost)))
            .ok_or(Error::NoPathFound {
                examined,
                best_partial: best_partial.map(|(_, path)| path),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::SegmentAutomaton;
    use crate::path::CostParams;
    use crate::types::Cut;

    #[test]
    fn test_identity_path_when_target_matches_span() {
        let cuts = vec![Cut::new(5000, 2000, 0.1)];
        let automaton = SegmentAutomaton::build(&cuts, 0, 10_000, &[]).unwrap();
        let ctx = SearchContext::new(&automaton, &cuts, CostParams::default());
        let search = GreedySearch::new(GreedyConfig::default());
        let path = search
            .search(&ctx, Keypoint::new(0, 0), Keypoint::new(10_000, 10_000))
            .unwrap();
        assert_eq!(path.duration(), 10_000);
        assert_eq!(path.cut_cost(), 0.0);
    }

    #[test]
    fn test_backward_jump_stretches_to_target() {
        let cuts = vec![Cut::new(5000, 2000, 0.1)];
        let automaton = SegmentAutomaton::build(&cuts, 0, 10_000, &[]).unwrap();
        let ctx = SearchContext::new(&automaton, &cuts, CostParams::default());
        let search = GreedySearch::new(GreedyConfig::default());
        // One extra pass over [2000, 5000) lands exactly on 13000.
        let path = search
            .search(&ctx, Keypoint::new(0, 0), Keypoint::new(10_000, 13_000))
            .unwrap();
        assert_eq!(path.duration(), 13_000);
        assert_eq!(path.segments().len(), 4);
    }

    #[test]
    fn test_loops_through_the_end_segment() {
        let cuts = vec![Cut::new(5000, 2000, 0.1)];
        let automaton = SegmentAutomaton::build(&cuts, 0, 10_000, &[]).unwrap();
        let ctx = SearchContext::new(&automaton, &cuts, CostParams::default());
        let search = GreedySearch::new(GreedyConfig::default());
        // The piece ends at 5000; stretching it to 8000 takes one pass of
        // the jump leaving the end segment itself.
        let path = search
            .search(&ctx, Keypoint::new(0, 0), Keypoint::new(5000, 8000))
            .unwrap();
        assert_eq!(path.duration(), 8000);
        assert_eq!(path.end(), 5000);
    }

    #[test]
    fn test_no_path_within_grace_reports_failure() {
        // The only route to the end crosses a segment that alone overshoots
        // the target, so every partial path dies before reaching the end.
        let automaton = SegmentAutomaton::build(&[], 0, 10_000, &[2000, 8000]).unwrap();
        let ctx = SearchContext::new(&automaton, &[], CostParams::default());
        let search = GreedySearch::new(GreedyConfig {
            num_paths: 5,
            grace_period: 0,
        });
        let result = search.search(&ctx, Keypoint::new(0, 0), Keypoint::new(10_000, 1000));
        match result {
            Err(Error::NoPathFound { examined, .. }) => assert!(examined > 0),
            other => panic!("expected NoPathFound, got {other:?}"),
        }
    }
}
