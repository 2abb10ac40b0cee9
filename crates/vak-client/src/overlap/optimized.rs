// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use super::{Agreement, Edge, EdgeList, InvalidRange, Overlap};

/// Incremental engine.
///
/// The answer to the previous [`find`](Overlap::find) plus the number of
/// intervals added since is an upper bound on the next answer, so the search
/// starts there instead of at the total. Each search is a single sweep in
/// each direction that records where every count is first reached.
#[derive(Clone, Debug, Default)]
pub struct OptimizedOverlap {
    edges: EdgeList,
    wanted: usize,
}

impl OptimizedOverlap {
    /// Empty accumulator.
    pub fn new() -> Self {
        OptimizedOverlap::default()
    }

    /// `first[w - 1]` is the value of the first edge, in sweep order, at
    /// which `w` intervals are open. Counts above `limit` are not recorded.
    fn first_reached<'a, I>(edges: I, sign: i64, limit: usize) -> Vec<f64>
    where
        I: Iterator<Item = &'a Edge>,
    {
        let mut first = Vec::with_capacity(limit);
        let mut chime: i64 = 0;
        for e in edges {
            chime += sign * i64::from(e.sign);
            // Chime moves in steps of one, so each new maximum is a new count.
            if chime > first.len() as i64 {
                first.push(e.value);
                if first.len() == limit {
                    break;
                }
            }
        }
        first
    }
}

impl Overlap for OptimizedOverlap {
    fn add(&mut self, lo: f64, hi: f64) -> Result<(), InvalidRange> {
        self.edges.insert(lo, hi)?;
        self.wanted += 1;
        Ok(())
    }

    fn find(&mut self) -> Agreement {
        let edges = self.edges.edges();
        let limit = self.wanted.min(self.edges.intervals());
        let left = Self::first_reached(edges.iter(), -1, limit);
        let right = Self::first_reached(edges.iter().rev(), 1, limit);

        let mut wanted = limit;
        while wanted > 0 {
            if let (Some(&lo), Some(&hi)) = (left.get(wanted - 1), right.get(wanted - 1)) {
                if lo <= hi {
                    self.wanted = wanted;
                    return (wanted, Some(lo), Some(hi));
                }
            }
            wanted -= 1;
        }
        self.wanted = 0;
        (0, None, None)
    }
}
