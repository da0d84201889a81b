//! Piecewise composition of a full request
//!
//! A request with N keypoints is solved as N-1 independent piece searches,
//! concatenated in order. Each piece's target is adjusted by the duration
//! drift the previous pieces accumulated, so small per-piece errors do not
//! pile up over a long request.

use crate::automaton::SegmentAutomaton;
use crate::config::Request;
use crate::error::Result;
use crate::path::{CostParams, Path};
use crate::search::{PathSearch, SearchContext};
use crate::types::{Cut, Keypoint};

pub struct PiecewiseComposer {
    strategy: Box<dyn PathSearch>,
    cost: CostParams,
}

impl PiecewiseComposer {
    pub fn new(strategy: Box<dyn PathSearch>, cost: CostParams) -> Self {
        Self { strategy, cost }
    }

    /// Solve every piece of the request and concatenate the results,
    /// merging shared boundary segments.
    pub fn compose(
        &self,
        automaton: &SegmentAutomaton,
        cuts: &[Cut],
        request: &Request,
    ) -> Result<Path> {
        request.validate()?;
        let ctx = SearchContext::new(automaton, cuts, self.cost);

        let mut result: Option<Path> = None;
        for pair in request.keypoints.windows(2) {
            let produced = result.as_ref().map_or(0, Path::duration);
            let to = pair[1];
            // Aim each piece at the absolute timeline position of its end
            // keypoint, measured from what has actually been produced.
            let from_target = if produced > to.target {
                log::debug!(
                    "piece ending at {} already overshot by {} samples",
                    to.source,
                    produced - to.target
                );
                to.target
            } else {
                produced
            };
            let from = Keypoint::new(pair[0].source, from_target);
            log::debug!(
                "searching piece {}..{} for {} samples with {}",
                from.source,
                to.source,
                to.target - from.target,
                self.strategy.name()
            );
            let piece = self.strategy.search(&ctx, from, to)?;
            result = Some(match result {
                None => piece,
                Some(path) => path.concat(&piece),
            });
        }
        // validate() guarantees at least one piece.
        Ok(result.expect("a valid request has at least two keypoints"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::search::StrategyConfig;
    use crate::types::{sort_chronologically, Cut};

    fn composer() -> PiecewiseComposer {
        let strategy = StrategyConfig::from_name("greedy").unwrap().build();
        PiecewiseComposer::new(strategy, CostParams::default())
    }

    fn fixture(boundaries: &[usize]) -> (SegmentAutomaton, Vec<Cut>) {
        let mut cuts = vec![Cut::new(5000, 2000, 0.1)];
        let automaton = SegmentAutomaton::build(&cuts, 0, 10_000, boundaries).unwrap();
        sort_chronologically(&mut cuts);
        (automaton, cuts)
    }

    #[test]
    fn test_single_piece_request() {
        let (automaton, cuts) = fixture(&[]);
        let request = Request::from_positions(&[0, 10_000], &[0, 13_000]).unwrap();
        let path = composer().compose(&automaton, &cuts, &request).unwrap();
        assert_eq!(path.duration(), 13_000);
        assert_eq!(path.start(), 0);
        assert_eq!(path.end(), 10_000);
    }

    #[test]
    fn test_two_piece_request_concatenates_in_order() {
        let (automaton, cuts) = fixture(&[5000]);
        // First piece stretches [0, 5000) to 8000 samples, second plays
        // [5000, 10000) unchanged.
        let request = Request::from_positions(&[0, 5000, 10_000], &[0, 8000, 13_000]).unwrap();
        let path = composer().compose(&automaton, &cuts, &request).unwrap();
        assert_eq!(path.duration(), 13_000);
        assert_eq!(path.start(), 0);
        assert_eq!(path.end(), 10_000);
        // The loop pass happens before the 5000 boundary.
        let boundary = path
            .segments()
            .iter()
            .position(|s| s.start == 5000)
            .unwrap();
        assert!(path.segments()[..boundary]
            .iter()
            .all(|s| s.end <= 5000));
    }

    #[test]
    fn test_compose_is_deterministic_across_reruns() {
        let (automaton, cuts) = fixture(&[5000]);
        let request = Request::from_positions(&[0, 5000, 10_000], &[0, 8000, 13_000]).unwrap();
        let composer = composer();
        let first = composer.compose(&automaton, &cuts, &request).unwrap();
        let second = composer.compose(&automaton, &cuts, &request).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.cost(&CostParams::default()),
            second.cost(&CostParams::default())
        );
    }

    #[test]
    fn test_duration_drift_carries_into_the_next_piece() {
        let mut cuts = vec![Cut::new(5000, 2000, 0.1), Cut::new(8000, 6000, 0.1)];
        let automaton = SegmentAutomaton::build(&cuts, 0, 10_000, &[5000]).unwrap();
        sort_chronologically(&mut cuts);
        // The first piece can only produce 5000 or 8000 samples and settles
        // on 5000, missing its 6000 target. The second piece aims at the
        // remaining 9000 instead of its nominal 8000 and lands the request
        // exactly.
        let request = Request::from_positions(&[0, 5000, 10_000], &[0, 6000, 14_000]).unwrap();
        let path = composer().compose(&automaton, &cuts, &request).unwrap();
        assert_eq!(path.duration(), 14_000);
        assert_eq!(path.end(), 10_000);
    }

    #[test]
    fn test_invalid_request_is_rejected_before_searching() {
        let (automaton, cuts) = fixture(&[]);
        let request = Request::from_positions(&[0], &[0]).unwrap();
        assert!(matches!(
            composer().compose(&automaton, &cuts, &request),
            Err(Error::Config(_))
        ));
    }
}
