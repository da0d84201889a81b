//! Bounded depth-first search
//!
//! Walks the automaton with an explicit stack, trying the cheapest edge of
//! each segment first, and accepts a path when it reaches the end segment
//! with a duration inside an acceptance window around the target. The stack
//! depth is bounded by the target duration measured in average segments, and
//! branches that already overshoot the window are pruned, so the walk
//! terminates even in graphs dense with backward jumps.

use super::{PathSearch, SearchContext};
use crate::error::{Error, Result};
use crate::path::Path;
use crate::types::Keypoint;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthFirstConfig {
    /// Complete paths collected before returning the best of them.
    pub num_paths: usize,
    /// Stack depth bound, as a multiple of the target duration divided by
    /// the average segment duration.
    pub stack_factor: f64,
    /// The acceptance window is the average segment duration divided by
    /// this.
    pub duration_divisor: f64,
}

impl Default for DepthFirstConfig {
    fn default() -> Self {
        Self {
            num_paths: 10,
            stack_factor: 1.5,
            duration_divisor: 2.0,
        }
    }
}

struct Frame {
    node: usize,
    /// Next edge index to try on this node.
    edge: usize,
    /// Cost paid entering this node.
    cost_in: f64,
}

pub struct DepthFirstSearch {
    config: DepthFirstConfig,
}

impl DepthFirstSearch {
    pub fn new(config: DepthFirstConfig) -> Self {
        Self { config }
    }
}

impl PathSearch for DepthFirstSearch {
    fn name(&self) -> &'static str {
        "depth_first"
    }

    fn search(&self, ctx: &SearchContext<'_>, start: Keypoint, end: Keypoint) -> Result<Path> {
        let start_index = ctx.start_index(start)?;
        let end_index = ctx.end_index(end)?;
        let target = (end.target - start.target) as f64;

        let average = ctx.automaton.average_segment_duration();
        let window = average / self.config.duration_divisor;
        let max_depth = ((self.config.stack_factor * target / average).ceil() as usize).max(2);

        let make_path = |stack: &[Frame], final_cost: f64| {
            let mut path = Path::empty(start, end);
            for frame in stack {
                path = path.appended(frame.cost_in, ctx.automaton.segment(frame.node));
            }
            path.appended(final_cost, ctx.automaton.segment(end_index))
        };

        let mut stack = vec![Frame {
            node: start_index,
            edge: 0,
            cost_in: 0.0,
        }];
        let mut duration = ctx.automaton.segment(start_index).duration();
        let mut found: Vec<Path> = Vec::new();
        let mut near_miss: Option<(f64, Path)> = None;
        let mut examined = 0usize;

        while let Some(top) = stack.len().checked_sub(1) {
            let node = stack[top].node;
            let edge = stack[top].edge;
            let edges = ctx.automaton.node(node).edges();
            if edge >= edges.len() || stack.len() > max_depth {
                duration -= ctx.automaton.segment(node).duration();
                stack.pop();
                continue;
            }
            stack[top].edge += 1;

            let (cost, successor) = edges[edge];
            let next_duration = duration + ctx.automaton.segment(successor).duration();
            if successor == end_index {
                examined += 1;
                let error = (next_duration as f64 - target).abs();
                if error < window {
                    found.push(make_path(&stack, cost));
                    if found.len() >= self.config.num_paths {
                        break;
                    }
                } else {
                    let path = make_path(&stack, cost);
                    let path_cost = path.cost(&ctx.cost);
                    match &near_miss {
                        Some((best, _)) if *best <= path_cost => {}
                        _ => near_miss = Some((path_cost, path)),
                    }
                }
                // The end segment is walked like any other frame below: its
                // own jump edges may be the only way to keep stretching.
            }
            if next_duration as f64 > target + window {
                continue;
            }
            stack.push(Frame {
                node: successor,
                edge: 0,
                cost_in: cost,
            });
            duration = next_duration;
        }

        log::debug!(
            "depth-first search examined {} arrivals, {} accepted",
            examined,
            found.len()
        );
        found
            .into_iter()
            .min_by(|a, b| a.cost(&ctx.cost).total_cmp(&b.cost(&ctx.cost)))
            .ok_or(Error::NoPathFound {
                examined,
                best_partial: near_miss.map(|(_, path)| path),
            })
    }
}
