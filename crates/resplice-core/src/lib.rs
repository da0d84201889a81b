//! Audio re-sequencing engine
//!
//! Detects low-cost splice points in a recording via multi-resolution
//! self-similarity analysis, builds a segment automaton from them, and
//! searches it for a playback path whose duration matches a requested
//! timeline. The top-level entry points are [`resequence`], which runs the
//! whole pipeline on raw samples, and [`resequence_with_cuts`], which reuses
//! a previously detected cut set.

pub mod automaton;
pub mod compose;
pub mod config;
pub mod cuts;
pub mod error;
pub mod metric;
pub mod path;
pub mod search;
pub mod types;

pub use automaton::{SegmentAutomaton, SegmentNode};
pub use compose::PiecewiseComposer;
pub use config::{CutConfig, MinCutLength, Request};
pub use cuts::find_cuts;
pub use error::{Error, Result};
pub use path::{CostParams, Loop, Path};
pub use search::{PathSearch, SearchContext, StrategyConfig};
pub use types::{Cut, Keypoint, SamplePos, Segment};

/// Re-sequence a recording: detect cuts, build the automaton over the whole
/// buffer, and compose a path for the request.
pub fn resequence(
    samples: &[f64],
    cut_config: &CutConfig,
    strategy: &StrategyConfig,
    cost: CostParams,
    request: &Request,
) -> Result<Path> {
    let cuts = find_cuts(samples, cut_config)?;
    log::info!("detected {} cuts in {} samples", cuts.len(), samples.len());
    resequence_with_cuts(samples.len(), &cuts, strategy, cost, request)
}

/// Re-sequence with an already detected cut set, e.g. one loaded from a
/// cache. Keypoint source positions become segment boundaries, so every
/// piece starts and ends exactly on a keypoint.
pub fn resequence_with_cuts(
    num_samples: usize,
    cuts: &[Cut],
    strategy: &StrategyConfig,
    cost: CostParams,
    request: &Request,
) -> Result<Path> {
    request.validate()?;
    let boundaries: Vec<SamplePos> = request.keypoints.iter().map(|k| k.source).collect();
    let automaton = SegmentAutomaton::build(cuts, 0, num_samples, &boundaries)?;
    log::debug!("automaton holds {} segments", automaton.len());

    let mut chronological = cuts.to_vec();
    types::sort_chronologically(&mut chronological);

    let composer = PiecewiseComposer::new(strategy.build(), cost);
    composer.compose(&automaton, &chronological, request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resequence_with_known_cuts() {
        let cuts = vec![Cut::new(5000, 2000, 0.1)];
        let request = Request::from_positions(&[0, 10_000], &[0, 13_000]).unwrap();
        let strategy = StrategyConfig::from_name("greedy").unwrap();
        let path = resequence_with_cuts(
            10_000,
            &cuts,
            &strategy,
            CostParams::default(),
            &request,
        )
        .unwrap();
        assert_eq!(path.duration(), 13_000);
        assert_eq!(path.start(), 0);
        assert_eq!(path.end(), 10_000);
    }

    #[test]
    fn test_invalid_request_fails_fast() {
        let request = Request::from_positions(&[0, 10_000], &[5, 13_000]).unwrap();
        let strategy = StrategyConfig::from_name("greedy").unwrap();
        assert!(matches!(
            resequence_with_cuts(10_000, &[], &strategy, CostParams::default(), &request),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_end_to_end_on_a_periodic_buffer() {
        // Four nearly identical periods offer cheap cuts at period offsets;
        // asking for six periods forces the search to loop. The jitter keeps
        // block distances distinct, the way real recordings behave.
        let period = 256;
        let mut samples = Vec::with_capacity(period * 4);
        let mut state = 0x9e3779b97f4a7c15u64;
        for i in 0..period * 4 {
            let phase = (i % period) as f64 / period as f64;
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let jitter = (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5;
            samples.push((phase * std::f64::consts::TAU).sin() + 1e-3 * jitter);
        }
        let cut_config = CutConfig {
            num_cuts: 16,
            num_keep: Some(8),
            block_length_shrink: 4,
            ..CutConfig::default()
        };
        let request = Request::from_positions(&[0, samples.len()], &[0, period * 6]).unwrap();
        let strategy = StrategyConfig::from_name("greedy").unwrap();
        let path = resequence(
            &samples,
            &cut_config,
            &strategy,
            CostParams::default(),
            &request,
        )
        .unwrap();
        assert_eq!(path.start(), 0);
        assert_eq!(path.end(), samples.len());
        // Never shorter than the straight playthrough, never past the
        // target plus one final segment.
        assert!(path.duration() >= samples.len());
        assert!(
            path.duration() <= period * 6 + samples.len(),
            "duration {}",
            path.duration()
        );
    }
}
