// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use super::{Agreement, EdgeList, InvalidRange, Overlap};

/// Straightforward engine: every [`find`](Overlap::find) tries every count
/// from the number of intervals down to one.
#[derive(Clone, Debug, Default)]
pub struct ReferenceOverlap {
    edges: EdgeList,
}

impl ReferenceOverlap {
    /// Empty accumulator.
    pub fn new() -> Self {
        ReferenceOverlap::default()
    }

    fn bounds_for(&self, wanted: usize) -> Option<(f64, f64)> {
        let wanted = wanted as i64;
        let edges = self.edges.edges();

        let mut chime: i64 = 0;
        let mut lo = None;
        for e in edges {
            chime -= i64::from(e.sign);
            if chime >= wanted {
                lo = Some(e.value);
                break;
            }
        }

        chime = 0;
        let mut hi = None;
        for e in edges.iter().rev() {
            chime += i64::from(e.sign);
            if chime >= wanted {
                hi = Some(e.value);
                break;
            }
        }

        match (lo, hi) {
            (Some(lo), Some(hi)) if lo <= hi => Some((lo, hi)),
            _ => None,
        }
    }
}

impl Overlap for ReferenceOverlap {
    fn add(&mut self, lo: f64, hi: f64) -> Result<(), InvalidRange> {
        self.edges.insert(lo, hi)
    }

    fn find(&mut self) -> Agreement {
        for wanted in (1..=self.edges.intervals()).rev() {
            if let Some((lo, hi)) = self.bounds_for(wanted) {
                return (wanted, Some(lo), Some(hi));
            }
        }
        (0, None, None)
    }
}
