//! Loop augmentation search
//!
//! Starts from the duration-shortest path between the keypoints (Dijkstra
//! over segment durations) and stretches it toward the target by splicing in
//! loops. Loops are cycles through the automaton closed by a jump edge; they
//! are enumerated once, then sampled and spliced over a fixed number of
//! improvement rounds.

use super::{PathSearch, SearchContext};
use crate::automaton::SegmentAutomaton;
use crate::error::{Error, Result, SpliceRejected};
use crate::path::{Loop, Path};
use crate::types::{Keypoint, Segment};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// How enumerated loops are deduplicated before sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopDedup {
    /// Keep one loop per distinct duration. Coarse but keeps the pool small.
    ByDuration,
    /// Keep every distinct segment sequence.
    ByIdentity,
}

/// How a loop is picked for splicing in each round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopSampling {
    Uniform,
    /// Always the loop whose duration is closest to the missing duration.
    NearestMissing,
    /// Normally distributed around the nearest-missing loop.
    Gaussian,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopConfig {
    pub seed: u64,
    /// Population size kept between rounds.
    pub num_paths: usize,
    /// Maximum number of improvement rounds.
    pub iterations: usize,
    /// Splice attempts per surviving path per round.
    pub new_paths_per_iteration: usize,
    /// Stop early after this many rounds without a better best path.
    pub max_rounds_without_change: usize,
    pub dedup: LoopDedup,
    pub sampling: LoopSampling,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            num_paths: 10,
            iterations: 100,
            new_paths_per_iteration: 10,
            max_rounds_without_change: 10,
            dedup: LoopDedup::ByDuration,
            sampling: LoopSampling::Gaussian,
        }
    }
}

pub struct LoopSearch {
    config: LoopConfig,
}

impl LoopSearch {
    pub fn new(config: LoopConfig) -> Self {
        Self { config }
    }

    /// Enumerate the loop pool: one duration-shortest cycle per jump edge,
    /// plus the straight cycle for each backward jump. Sorted ascending by
    /// duration and deduplicated per the configuration.
    fn collect_loops(&self, automaton: &SegmentAutomaton) -> Vec<Loop> {
        let mut loops = Vec::new();
        for (index, node) in automaton.nodes().iter().enumerate() {
            for &(cost, target) in node.edges() {
                if cost == 0.0 && target == index + 1 {
                    continue;
                }
                if let Some((nodes, mut costs)) = shortest_route(automaton, target, index) {
                    costs[0] = cost;
                    loops.push(Loop::new(
                        nodes.iter().map(|&n| automaton.segment(n)).collect(),
                        costs,
                    ));
                }
                if target <= index {
                    let segments: Vec<Segment> =
                        (target..=index).map(|n| automaton.segment(n)).collect();
                    let mut costs = vec![0.0; segments.len()];
                    costs[0] = cost;
                    loops.push(Loop::new(segments, costs));
                }
            }
        }
        loops.sort_by(|a, b| {
            (a.duration(), &a.segments, &a.costs[..1])
                .partial_cmp(&(b.duration(), &b.segments, &b.costs[..1]))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        match self.config.dedup {
            LoopDedup::ByDuration => loops.dedup_by_key(|l| l.duration()),
            LoopDedup::ByIdentity => loops.dedup_by(|a, b| a.segments == b.segments),
        }
        loops
    }

    fn pick<'l>(&self, loops: &'l [Loop], missing: i64, rng: &mut StdRng) -> &'l Loop {
        match self.config.sampling {
            LoopSampling::Uniform => &loops[rng.gen_range(0..loops.len())],
            LoopSampling::NearestMissing => &loops[nearest_index(loops, missing)],
            LoopSampling::Gaussian => {
                let center = nearest_index(loops, missing) as f64;
                let sigma = (loops.len() as f64 / 4.0).max(1.0);
                let index = (center + standard_normal(rng) * sigma)
                    .round()
                    .clamp(0.0, (loops.len() - 1) as f64);
                &loops[index as usize]
            }
        }
    }
}

impl PathSearch for LoopSearch {
    fn name(&self) -> &'static str {
        "loops"
    }

    fn search(&self, ctx: &SearchContext<'_>, start: Keypoint, end: Keypoint) -> Result<Path> {
        let start_index = ctx.start_index(start)?;
        let end_index = ctx.end_index(end)?;
        let target = (end.target - start.target) as i64;

        let (nodes, costs) =
            shortest_route(ctx.automaton, start_index, end_index).ok_or(Error::NoPathFound {
                examined: 0,
                best_partial: None,
            })?;
        let base = Path::from_parts(
            nodes.iter().map(|&n| ctx.automaton.segment(n)).collect(),
            costs,
            start,
            end,
        );

        let loops = self.collect_loops(ctx.automaton);
        log::debug!("loop search over a pool of {} loops", loops.len());
        if loops.is_empty() {
            return Ok(base);
        }

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut population = vec![base];
        let mut best_cost = population[0].cost(&ctx.cost);
        let mut stalled = 0usize;

        for round in 0..self.config.iterations {
            let mut next = population.clone();
            for path in &population {
                let missing = target - path.duration() as i64;
                for _ in 0..self.config.new_paths_per_iteration {
                    let candidate_loop = self.pick(&loops, missing, &mut rng);
                    match splice(path, candidate_loop, &mut rng) {
                        Ok(spliced) => next.push(spliced),
                        Err(SpliceRejected) => {}
                    }
                }
            }
            next.sort_by(|a, b| a.cost(&ctx.cost).total_cmp(&b.cost(&ctx.cost)));
            next.dedup();
            next.truncate(self.config.num_paths);

            let round_best = next[0].cost(&ctx.cost);
            if round_best < best_cost {
                best_cost = round_best;
                stalled = 0;
            } else {
                stalled += 1;
            }
            population = next;
            if stalled >= self.config.max_rounds_without_change {
                log::debug!("loop search converged after {} rounds", round + 1);
                break;
            }
        }
        Ok(population.swap_remove(0))
    }
}

/// Duration-shortest route between two segments. Returns the node sequence
/// and the cost of the edge entering each node (the first entry is 0).
fn shortest_route(
    automaton: &SegmentAutomaton,
    from: usize,
    to: usize,
) -> Option<(Vec<usize>, Vec<f64>)> {
    let n = automaton.len();
    let mut dist = vec![usize::MAX; n];
    let mut prev: Vec<Option<(usize, f64)>> = vec![None; n];
    let mut heap: BinaryHeap<Reverse<(usize, usize)>> = BinaryHeap::new();

    dist[from] = automaton.segment(from).duration();
    heap.push(Reverse((dist[from], from)));
    while let Some(Reverse((d, u))) = heap.pop() {
        if d > dist[u] {
            continue;
        }
        if u == to {
            break;
        }
        for &(cost, v) in automaton.node(u).edges() {
            let next = d + automaton.segment(v).duration();
            if next < dist[v] {
                dist[v] = next;
                prev[v] = Some((u, cost));
                heap.push(Reverse((next, v)));
            }
        }
    }
    if dist[to] == usize::MAX {
        return None;
    }

    let mut nodes = vec![to];
    let mut costs = Vec::new();
    let mut current = to;
    while current != from {
        let (parent, cost) = prev[current]?;
        nodes.push(parent);
        costs.push(cost);
        current = parent;
    }
    nodes.reverse();
    costs.push(0.0);
    costs.reverse();
    Some((nodes, costs))
}

/// Splice a loop into a path at a randomly chosen shared segment. The loop is
/// rotated so it starts at the shared segment, inserted before it, and the
/// closing edge pays the loop's jump cost.
fn splice(path: &Path, lp: &Loop, rng: &mut StdRng) -> std::result::Result<Path, SpliceRejected> {
    let anchors: Vec<(usize, usize)> = path
        .segments()
        .iter()
        .enumerate()
        .flat_map(|(i, ps)| {
            lp.segments
                .iter()
                .enumerate()
                .filter(move |(_, ls)| *ls == ps)
                .map(move |(j, _)| (i, j))
        })
        .collect();
    if anchors.is_empty() {
        return Err(SpliceRejected);
    }
    let (i, j) = anchors[rng.gen_range(0..anchors.len())];

    let segments_in = path.segments();
    let costs_in = path.edge_costs();
    let mut segments = Vec::with_capacity(segments_in.len() + lp.segments.len());
    segments.extend_from_slice(&segments_in[..i]);
    segments.extend_from_slice(&lp.segments[j..]);
    segments.extend_from_slice(&lp.segments[..j]);
    segments.extend_from_slice(&segments_in[i..]);

    let mut costs = Vec::with_capacity(costs_in.len() + lp.costs.len());
    costs.extend_from_slice(&costs_in[..=i]);
    costs.extend_from_slice(&lp.costs[j + 1..]);
    costs.extend_from_slice(&lp.costs[..=j]);
    costs.extend_from_slice(&costs_in[i + 1..]);

    let (start, end) = path.keypoints();
    Ok(Path::from_parts(segments, costs, start, end))
}

fn nearest_index(loops: &[Loop], missing: i64) -> usize {
    loops
        .iter()
        .enumerate()
        .min_by_key(|(_, l)| (l.duration() as i64 - missing).abs())
        .map(|(index, _)| index)
        .unwrap_or(0)
}

/// Box-Muller transform over the seeded generator.
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::CostParams;
    use crate::types::Cut;
    use approx::assert_relative_eq;

    fn fixture() -> (SegmentAutomaton, Vec<Cut>) {
        let cuts = vec![Cut::new(5000, 2000, 0.1)];
        let automaton = SegmentAutomaton::build(&cuts, 0, 10_000, &[]).unwrap();
        (automaton, cuts)
    }

    #[test]
    fn test_shortest_route_follows_continuations() {
        let (automaton, _) = fixture();
        let (nodes, costs) = shortest_route(&automaton, 0, 2).unwrap();
        assert_eq!(nodes, vec![0, 1, 2]);
        assert_eq!(costs, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_collect_loops_finds_the_backward_cycle() {
        let (automaton, _) = fixture();
        let search = LoopSearch::new(LoopConfig::default());
        let loops = search.collect_loops(&automaton);
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].duration(), 3000);
        assert_relative_eq!(loops[0].cut_cost(), 0.1);
    }

    #[test]
    fn test_splice_preserves_duration_arithmetic() {
        let (automaton, _) = fixture();
        let search = LoopSearch::new(LoopConfig::default());
        let loops = search.collect_loops(&automaton);
        let (nodes, costs) = shortest_route(&automaton, 0, 2).unwrap();
        let path = Path::from_parts(
            nodes.iter().map(|&n| automaton.segment(n)).collect(),
            costs,
            Keypoint::new(0, 0),
            Keypoint::new(10_000, 13_000),
        );
        let mut rng = StdRng::seed_from_u64(7);
        let spliced = splice(&path, &loops[0], &mut rng).unwrap();
        assert_eq!(spliced.duration(), path.duration() + loops[0].duration());
        assert_relative_eq!(spliced.cut_cost(), 0.1);
        // Adjacent segments either continue or jump backward over played
        // material; the splice never fabricates a forward skip.
        for pair in spliced.segments().windows(2) {
            assert!(pair[1].start <= pair[0].end);
        }
    }

    #[test]
    fn test_splice_without_shared_segment_is_rejected() {
        let path = Path::from_parts(
            vec![Segment::new(0, 1000)],
            vec![0.0],
            Keypoint::new(0, 0),
            Keypoint::new(1000, 1000),
        );
        let lp = Loop::new(vec![Segment::new(5000, 6000)], vec![0.5]);
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(splice(&path, &lp, &mut rng), Err(SpliceRejected));
    }

    #[test]
    fn test_search_pads_toward_target() {
        let (automaton, cuts) = fixture();
        let ctx = SearchContext::new(&automaton, &cuts, CostParams::default());
        let search = LoopSearch::new(LoopConfig::default());
        let path = search
            .search(&ctx, Keypoint::new(0, 0), Keypoint::new(10_000, 13_000))
            .unwrap();
        assert_eq!(path.duration(), 13_000);
        assert_eq!(path.start(), 0);
        assert_eq!(path.end(), 10_000);
    }

    #[test]
    fn test_same_seed_same_path() {
        let (automaton, cuts) = fixture();
        let ctx = SearchContext::new(&automaton, &cuts, CostParams::default());
        let search = LoopSearch::new(LoopConfig::default());
        let a = search
            .search(&ctx, Keypoint::new(0, 0), Keypoint::new(10_000, 16_000))
            .unwrap();
        let b = search
            .search(&ctx, Keypoint::new(0, 0), Keypoint::new(10_000, 16_000))
            .unwrap();
        assert_eq!(a, b);
    }
}
