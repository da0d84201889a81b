//! The segment automaton
//!
//! A directed graph of playback segments: every non-terminal segment has one
//! zero-cost edge to its immediate successor ("continue playing") and zero or
//! more positive-cost jump edges derived from cuts. Segments live in an arena
//! indexed by position; edges are `(cost, target index)` pairs, so the graph
//! is forward-only and free of reference cycles. Once built, the automaton is
//! immutable and safe to share between searches.

use crate::error::{Error, Result};
use crate::types::{Cut, SamplePos, Segment};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// A segment with its outgoing edges, sorted ascending by cost.
#[derive(Debug, Clone)]
pub struct SegmentNode {
    pub segment: Segment,
    edges: Vec<(f64, usize)>,
}

impl SegmentNode {
    /// Outgoing edges as `(cost, target index)`, cheapest first.
    pub fn edges(&self) -> &[(f64, usize)] {
        &self.edges
    }

    /// The zero-cost edge to the immediate successor, if any.
    pub fn continue_edge(&self) -> Option<(f64, usize)> {
        self.edges.first().filter(|(cost, _)| *cost == 0.0).copied()
    }
}

/// Immutable graph of segments over an analysis range.
#[derive(Debug, Clone)]
pub struct SegmentAutomaton {
    nodes: Vec<SegmentNode>,
    by_start: BTreeMap<SamplePos, usize>,
    range: (SamplePos, SamplePos),
}

impl SegmentAutomaton {
    /// Build the automaton over `[range_start, range_end)` from a cut set and
    /// additional boundary points (keypoints).
    ///
    /// Cuts whose endpoints fall outside the range cannot produce edges and
    /// are dropped. The structural postcondition is validated; a violation is
    /// a fatal construction error.
    pub fn build(
        cuts: &[Cut],
        range_start: SamplePos,
        range_end: SamplePos,
        boundaries: &[SamplePos],
    ) -> Result<Self> {
        if range_start >= range_end {
            return Err(Error::config("automaton range must be non-empty"));
        }

        let usable: Vec<&Cut> = cuts
            .iter()
            .filter(|cut| {
                let ok = cut.start > range_start
                    && cut.start < range_end
                    && cut.end >= range_start
                    && cut.end < range_end
                    && cut.start != cut.end;
                if !ok {
                    log::debug!("dropping out-of-range cut {}--{}", cut.start, cut.end);
                }
                ok
            })
            .collect();

        let mut breakpoints: BTreeSet<SamplePos> = BTreeSet::new();
        breakpoints.insert(range_start);
        breakpoints.insert(range_end);
        for cut in &usable {
            breakpoints.insert(cut.start);
            breakpoints.insert(cut.end);
        }
        for &point in boundaries {
            if point > range_start && point < range_end {
                breakpoints.insert(point);
            }
        }

        let points: Vec<SamplePos> = breakpoints.into_iter().collect();
        let mut nodes: Vec<SegmentNode> = points
            .windows(2)
            .map(|pair| SegmentNode {
                segment: Segment::new(pair[0], pair[1]),
                edges: Vec::new(),
            })
            .collect();

        let by_start: BTreeMap<SamplePos, usize> = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.segment.start, index))
            .collect();
        let by_end: HashMap<SamplePos, usize> = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (node.segment.end, index))
            .collect();

        // Zero-cost "continue playing" edges between consecutive segments.
        for index in 0..nodes.len().saturating_sub(1) {
            nodes[index].edges.push((0.0, index + 1));
        }

        // Weighted jump edges, one per usable cut.
        for cut in &usable {
            let from = by_end[&cut.start];
            let to = by_start[&cut.end];
            if nodes[from].edges.iter().any(|(cost, _)| *cost == cut.cost) {
                return Err(Error::invariant(format!(
                    "duplicate edge cost {} on segment {}",
                    cut.cost, nodes[from].segment
                )));
            }
            nodes[from].edges.push((cut.cost, to));
        }

        for node in &mut nodes {
            node.edges.sort_by(|a, b| a.0.total_cmp(&b.0));
        }

        let automaton = Self {
            nodes,
            by_start,
            range: (range_start, range_end),
        };
        automaton.validate()?;
        Ok(automaton)
    }

    /// Check the structural postcondition: every non-terminal segment has a
    /// zero-cost edge to its immediate successor and no duplicate edge costs;
    /// the terminal segment has no outgoing edges.
    pub fn validate(&self) -> Result<()> {
        let terminal = self.nodes.len() - 1;
        for (index, node) in self.nodes.iter().enumerate() {
            if index == terminal {
                if !node.edges.is_empty() {
                    return Err(Error::invariant(format!(
                        "terminal segment {} has outgoing edges",
                        node.segment
                    )));
                }
                continue;
            }
            match node.continue_edge() {
                Some((_, target)) if target == index + 1 => {}
                _ => {
                    return Err(Error::invariant(format!(
                        "segment {} lacks its zero-cost continue edge",
                        node.segment
                    )));
                }
            }
            for pair in node.edges.windows(2) {
                if pair[0].0 == pair[1].0 {
                    return Err(Error::invariant(format!(
                        "segment {} has duplicate edge cost {}",
                        node.segment, pair[0].0
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn range(&self) -> (SamplePos, SamplePos) {
        self.range
    }

    pub fn node(&self, index: usize) -> &SegmentNode {
        &self.nodes[index]
    }

    pub fn segment(&self, index: usize) -> Segment {
        self.nodes[index].segment
    }

    pub fn nodes(&self) -> &[SegmentNode] {
        &self.nodes
    }

    /// Index of the terminal segment.
    pub fn terminal(&self) -> usize {
        self.nodes.len() - 1
    }

    /// Index of the segment starting exactly at `pos`.
    pub fn index_of_start(&self, pos: SamplePos) -> Option<usize> {
        self.by_start.get(&pos).copied()
    }

    /// Index of the segment containing `pos`; the terminal segment also
    /// claims the range end itself.
    pub fn containing(&self, pos: SamplePos) -> Option<usize> {
        if pos < self.range.0 || pos > self.range.1 {
            return None;
        }
        let index = *self.by_start.range(..=pos).next_back()?.1;
        Some(index.min(self.terminal()))
    }

    pub fn average_segment_duration(&self) -> f64 {
        let total: usize = self.nodes.iter().map(|n| n.segment.duration()).sum();
        total as f64 / self.nodes.len() as f64
    }
}
