//! Bounded breadth enumeration
//!
//! Exhaustively enumerates every playback-ordered cut list of up to
//! `max_num_cuts` cuts, in increasing cut-count order, and keeps the
//! cheapest decoded path. Exact within its bound, exponential beyond it; an
//! optional deadline caps the runtime and returns the best path seen so far.

use super::{decode_cuts, PathSearch, PieceWindow, SearchContext};
use crate::error::Result;
use crate::path::Path;
use crate::types::{Cut, Keypoint};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreadthConfig {
    /// Maximum number of cuts per enumerated path.
    pub max_num_cuts: usize,
    /// Soft deadline; `None` enumerates the full bound.
    pub max_runtime_ms: Option<u64>,
}

impl Default for BreadthConfig {
    fn default() -> Self {
        Self {
            max_num_cuts: 4,
            max_runtime_ms: None,
        }
    }
}

pub struct BreadthSearch {
    config: BreadthConfig,
}

impl BreadthSearch {
    pub fn new(config: BreadthConfig) -> Self {
        Self { config }
    }
}

fn can_append(list: &[Cut], cut: Cut, window: PieceWindow) -> bool {
    let previous = list.last().map_or(window.start, |c| c.end);
    previous < cut.start && cut.start < window.end && cut.end < window.end
}

impl PathSearch for BreadthSearch {
    fn name(&self) -> &'static str {
        "breadth"
    }

    fn search(&self, ctx: &SearchContext<'_>, start: Keypoint, end: Keypoint) -> Result<Path> {
        let window = ctx.window(start, end)?;
        let pool: Vec<Cut> = ctx
            .cuts
            .iter()
            .filter(|c| c.start > window.start && c.start < window.end && c.end >= window.start && c.end < window.end)
            .copied()
            .collect();

        let deadline = self
            .config
            .max_runtime_ms
            .map(|ms| Instant::now() + Duration::from_millis(ms));

        let mut queue: VecDeque<Vec<Cut>> = VecDeque::new();
        queue.push_back(Vec::new());
        let mut examined = 0usize;
        let mut best: Option<(f64, Path)> = None;

        while let Some(list) = queue.pop_front() {
            examined += 1;
            let path = decode_cuts(&list, start, end, window);
            let cost = path.cost(&ctx.cost);
            match &best {
                Some((best_cost, _)) if *best_cost <= cost => {}
                _ => best = Some((cost, path)),
            }
            // Scored before the deadline check, so even a zero budget still
            // yields the straight path.
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    log::debug!("breadth search hit its deadline after {examined} paths");
                    break;
                }
            }
            if list.len() < self.config.max_num_cuts {
                for &cut in &pool {
                    if can_append(&list, cut, window) {
                        let mut longer = list.clone();
                        longer.push(cut);
                        queue.push_back(longer);
                    }
                }
            }
        }

        log::debug!("breadth search examined {examined} paths");
        // The empty cut list is scored before the first deadline check, so a
        // best path exists even when the budget is already spent.
        let (_, path) = best.expect("enumeration starts with the empty cut list");
        Ok(path)
    }
}
