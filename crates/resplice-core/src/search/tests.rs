//! Behavior shared by every search strategy.

use super::*;
use crate::automaton::SegmentAutomaton;
use crate::types::Segment;

fn fixture() -> (SegmentAutomaton, Vec<Cut>) {
    let cuts = vec![Cut::new(5000, 2000, 0.1)];
    let automaton = SegmentAutomaton::build(&cuts, 0, 10_000, &[]).unwrap();
    (automaton, cuts)
}

fn all_strategies() -> Vec<StrategyConfig> {
    ["greedy", "loops", "genetic", "breadth", "depth_first"]
        .iter()
        .map(|name| StrategyConfig::from_name(name).unwrap())
        .collect()
}

#[test]
fn test_registry_resolves_every_strategy() {
    for config in all_strategies() {
        let strategy = config.build();
        assert!(!strategy.name().is_empty());
    }
}

#[test]
fn test_unknown_strategy_name_is_rejected() {
    assert!(matches!(
        StrategyConfig::from_name("simulated_annealing"),
        Err(Error::Config(_))
    ));
}

#[test]
fn test_every_strategy_connects_the_keypoints() {
    let (automaton, cuts) = fixture();
    let ctx = SearchContext::new(&automaton, &cuts, CostParams::default());
    for config in all_strategies() {
        let strategy = config.build();
        // 13000 samples is reachable exactly: one extra pass over the loop.
        let path = strategy
            .search(&ctx, Keypoint::new(0, 0), Keypoint::new(10_000, 13_000))
            .unwrap_or_else(|e| panic!("{} failed: {e}", strategy.name()));
        assert_eq!(path.start(), 0, "{}", strategy.name());
        assert_eq!(path.end(), 10_000, "{}", strategy.name());
        assert_eq!(path.duration(), 13_000, "{}", strategy.name());
    }
}

#[test]
fn test_every_strategy_returns_the_straight_path_for_a_matching_target() {
    let (automaton, cuts) = fixture();
    let ctx = SearchContext::new(&automaton, &cuts, CostParams::default());
    for config in all_strategies() {
        let strategy = config.build();
        let path = strategy
            .search(&ctx, Keypoint::new(0, 0), Keypoint::new(10_000, 10_000))
            .unwrap_or_else(|e| panic!("{} failed: {e}", strategy.name()));
        assert_eq!(path.duration(), 10_000, "{}", strategy.name());
        assert_eq!(path.cut_cost(), 0.0, "{}", strategy.name());
    }
}

#[test]
fn test_undershootable_target_settles_on_the_straight_path() {
    let (automaton, cuts) = fixture();
    let ctx = SearchContext::new(&automaton, &cuts, CostParams::default());
    // 7000 samples cannot be hit: the only jump makes paths longer. The
    // straight 10000 sample playthrough is the cheapest achievable answer.
    let strategy = StrategyConfig::from_name("greedy").unwrap().build();
    let path = strategy
        .search(&ctx, Keypoint::new(0, 0), Keypoint::new(10_000, 7000))
        .unwrap();
    assert_eq!(
        path.segments(),
        &[
            Segment::new(0, 2000),
            Segment::new(2000, 5000),
            Segment::new(5000, 10_000),
        ]
    );
    assert_eq!(path.duration(), 10_000);
    assert_eq!(path.cut_cost(), 0.0);
}

#[test]
fn test_keypoints_snap_to_segment_boundaries() {
    let automaton = SegmentAutomaton::build(&[], 0, 10_000, &[7000]).unwrap();
    let ctx = SearchContext::new(&automaton, &[], CostParams::default());

    // On a boundary: the end keypoint selects the segment ending there.
    let on_boundary = Keypoint::new(7000, 7000);
    assert_eq!(ctx.end_index(on_boundary).unwrap(), 0);
    assert_eq!(ctx.snapped_end(on_boundary).unwrap(), 7000);
    assert_eq!(ctx.start_index(on_boundary).unwrap(), 1);
    assert_eq!(ctx.snapped_start(on_boundary).unwrap(), 7000);

    // Inside a segment: start snaps back, end snaps forward, so the full
    // segment is included either way.
    let inside = Keypoint::new(6500, 6500);
    assert_eq!(ctx.snapped_start(inside).unwrap(), 0);
    assert_eq!(ctx.snapped_end(inside).unwrap(), 7000);

    // The range end maps to the terminal segment.
    let at_end = Keypoint::new(10_000, 10_000);
    assert_eq!(ctx.end_index(at_end).unwrap(), automaton.terminal());
}

#[test]
fn test_decode_cuts_round_trip_positions() {
    let window = PieceWindow {
        start: 0,
        end: 10_000,
    };
    let path = decode_cuts(
        &[Cut::new(4000, 8000, 0.2)],
        Keypoint::new(0, 0),
        Keypoint::new(10_000, 6000),
        window,
    );
    assert_eq!(
        path.segments(),
        &[Segment::new(0, 4000), Segment::new(8000, 10_000)]
    );
    assert_eq!(path.duration(), 6000);
}
