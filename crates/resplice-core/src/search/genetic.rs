//! Genetic search
//!
//! Individuals are cut lists in playback order; the path they encode plays
//! from the piece start to the first cut, jumps, and so on until the piece
//! end. Crossover joins a prefix of one parent with a compatible suffix of
//! another, mutation inserts or removes cuts, and selection keeps the
//! cheapest distinct individuals under the shared cost model. The empty
//! individual is always valid, so this strategy cannot fail to produce a
//! path.

use super::{decode_cuts, PathSearch, PieceWindow, SearchContext};
use crate::error::Result;
use crate::path::Path;
use crate::types::{Cut, Keypoint, SamplePos};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneticConfig {
    pub seed: u64,
    /// Individuals surviving each generation.
    pub num_individuals: usize,
    pub num_generations: usize,
    /// Children bred per generation before selection.
    pub num_children: usize,
    /// Probability that a child gains a random cut.
    pub add_probability: f64,
    /// Probability that a child loses a run of cuts.
    pub remove_probability: f64,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            num_individuals: 50,
            num_generations: 100,
            num_children: 50,
            add_probability: 0.4,
            remove_probability: 0.4,
        }
    }
}

pub struct GeneticSearch {
    config: GeneticConfig,
}

impl GeneticSearch {
    pub fn new(config: GeneticConfig) -> Self {
        Self { config }
    }

    fn mutate(&self, individual: &mut Vec<Cut>, pool: &[Cut], window: PieceWindow, rng: &mut StdRng) {
        if !pool.is_empty() && rng.gen::<f64>() < self.config.add_probability {
            let cut = pool[rng.gen_range(0..pool.len())];
            let slots: Vec<usize> = (0..=individual.len())
                .filter(|&p| insertion_fits(individual, p, cut, window))
                .collect();
            if let Some(&slot) = pick(&slots, rng) {
                individual.insert(slot, cut);
            }
        }
        if !individual.is_empty() && rng.gen::<f64>() < self.config.remove_probability {
            let from = rng.gen_range(0..individual.len());
            let count = rng.gen_range(1..=individual.len() - from);
            let before = if from == 0 {
                window.start
            } else {
                individual[from - 1].end
            };
            let after = if from + count == individual.len() {
                window.end
            } else {
                individual[from + count].start
            };
            if before < after {
                individual.drain(from..from + count);
            }
        }
    }

    fn crossover(&self, a: &[Cut], b: &[Cut], rng: &mut StdRng) -> Vec<Cut> {
        let joints: Vec<(usize, usize)> = a
            .iter()
            .enumerate()
            .flat_map(|(i, ca)| {
                b.iter()
                    .enumerate()
                    .filter(move |(_, cb)| ca.end < cb.start)
                    .map(move |(j, _)| (i, j))
            })
            .collect();
        match pick(&joints, rng) {
            Some(&(i, j)) => {
                let mut child = a[..=i].to_vec();
                child.extend_from_slice(&b[j..]);
                child
            }
            None => a.to_vec(),
        }
    }
}

impl PathSearch for GeneticSearch {
    fn name(&self) -> &'static str {
        "genetic"
    }

    fn search(&self, ctx: &SearchContext<'_>, start: Keypoint, end: Keypoint) -> Result<Path> {
        let window = ctx.window(start, end)?;
        let pool: Vec<Cut> = ctx
            .cuts
            .iter()
            .filter(|c| {
                c.start > window.start
                    && c.start < window.end
                    && c.end >= window.start
                    && c.end < window.end
            })
            .copied()
            .collect();

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut population: Vec<Vec<Cut>> = Vec::with_capacity(self.config.num_individuals);
        for _ in 0..self.config.num_individuals {
            let mut individual = Vec::new();
            for _ in 0..rng.gen_range(0..4) {
                self.mutate(&mut individual, &pool, window, &mut rng);
            }
            population.push(individual);
        }

        for _ in 0..self.config.num_generations {
            let mut children = Vec::with_capacity(self.config.num_children);
            for _ in 0..self.config.num_children {
                let a = &population[rng.gen_range(0..population.len())];
                let b = &population[rng.gen_range(0..population.len())];
                let mut child = self.crossover(a, b, &mut rng);
                self.mutate(&mut child, &pool, window, &mut rng);
                children.push(child);
            }
            population.append(&mut children);

            let mut scored: Vec<(f64, Vec<Cut>)> = population
                .drain(..)
                .map(|individual| {
                    let cost = decode_cuts(&individual, start, end, window).cost(&ctx.cost);
                    (cost, individual)
                })
                .collect();
            scored.sort_by(|a, b| a.0.total_cmp(&b.0).then_with(|| identity(&a.1).cmp(&identity(&b.1))));
            scored.dedup_by(|a, b| identity(&a.1) == identity(&b.1));
            scored.truncate(self.config.num_individuals);
            population = scored.into_iter().map(|(_, individual)| individual).collect();
        }

        log::debug!(
            "genetic search finished with {} individuals over a pool of {} cuts",
            population.len(),
            pool.len()
        );
        let best = population
            .into_iter()
            .map(|individual| decode_cuts(&individual, start, end, window))
            .min_by(|a, b| a.cost(&ctx.cost).total_cmp(&b.cost(&ctx.cost)))
            .unwrap_or_else(|| decode_cuts(&[], start, end, window));
        Ok(best)
    }
}

/// Whether inserting `cut` at list position `p` keeps playback strictly
/// forward between consecutive jumps.
fn insertion_fits(individual: &[Cut], p: usize, cut: Cut, window: PieceWindow) -> bool {
    let before = if p == 0 {
        window.start
    } else {
        individual[p - 1].end
    };
    let after = if p == individual.len() {
        window.end
    } else {
        individual[p].start
    };
    before < cut.start && cut.end < after
}

fn identity(cuts: &[Cut]) -> Vec<(SamplePos, SamplePos)> {
    cuts.iter().map(|c| (c.start, c.end)).collect()
}

fn pick<'a, T>(items: &'a [T], rng: &mut StdRng) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        Some(&items[rng.gen_range(0..items.len())])
    }
}
