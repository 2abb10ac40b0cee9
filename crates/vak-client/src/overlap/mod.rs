// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! Byzantine-tolerant interval overlap (Marzullo's algorithm).
//!
//! Each server contributes a correctness interval `[lo, hi]`. [`Overlap::find`]
//! reports the largest number of intervals that share a common region and
//! the bounds of that region:
//!
//! 1. Every interval becomes two edges, `(lo, -1)` and `(hi, +1)`, kept sorted
//!    by value with `-1` before `+1` on ties, so touching intervals overlap.
//! 2. For a candidate count `wanted`, a left-to-right sweep finds the first
//!    edge where `wanted` intervals are open, and a right-to-left sweep the
//!    last one.
//! 3. The largest `wanted` whose two bounds are ordered wins.
//!
//! Two engines implement this: [`ReferenceOverlap`] rescans every count on
//! each call and [`OptimizedOverlap`] carries its answer between calls.
//! [`CrossCheck`] runs several engines side by side and panics if they
//! disagree.
//!
//! ```
//! use vak_client::overlap::{Overlap, OptimizedOverlap};
//!
//! let mut o = OptimizedOverlap::new();
//! o.add(1.0, 4.0).unwrap();
//! o.add(2.0, 3.0).unwrap();
//! o.add(5.0, 6.0).unwrap();
//! assert_eq!(o.find(), (2, Some(2.0), Some(3.0)));
//! ```

mod cross_check;
mod optimized;
mod reference;

pub use cross_check::CrossCheck;
pub use optimized::OptimizedOverlap;
pub use reference::ReferenceOverlap;

use std::cmp::Ordering;
use std::fmt;

/// Count of agreeing intervals and the bounds of their common region.
///
/// `(0, None, None)` when no intervals have been added.
pub type Agreement = (usize, Option<f64>, Option<f64>);

/// An accumulator of correctness intervals.
pub trait Overlap {
    /// Add the interval `[lo, hi]`.
    ///
    /// Fails without changing state when `lo > hi` or either bound is NaN.
    fn add(&mut self, lo: f64, hi: f64) -> Result<(), InvalidRange>;

    /// Largest agreeing count and the bounds of its region.
    fn find(&mut self) -> Agreement;
}

/// An interval with `lo > hi`, or with a NaN bound.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InvalidRange {
    /// Lower bound passed in.
    pub lo: f64,
    /// Upper bound passed in.
    pub hi: f64,
}

impl fmt::Display for InvalidRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid range: lo {} is not <= hi {}", self.lo, self.hi)
    }
}

impl std::error::Error for InvalidRange {}

/// Edge opening an interval.
pub(crate) const OPEN: i32 = -1;
/// Edge closing an interval.
pub(crate) const CLOSE: i32 = 1;

/// One end of an interval.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Edge {
    pub(crate) value: f64,
    pub(crate) sign: i32,
}

impl Edge {
    /// Sort by value, opening edges first on ties.
    fn order(&self, other: &Edge) -> Ordering {
        self.value
            .partial_cmp(&other.value)
            .unwrap_or(Ordering::Equal)
            .then(self.sign.cmp(&other.sign))
    }
}

/// Edges of every accepted interval, sorted.
#[derive(Clone, Debug, Default)]
pub(crate) struct EdgeList {
    edges: Vec<Edge>,
}

impl EdgeList {
    /// Validate and insert both edges of `[lo, hi]`.
    pub(crate) fn insert(&mut self, lo: f64, hi: f64) -> Result<(), InvalidRange> {
        if lo.is_nan() || hi.is_nan() || lo > hi {
            return Err(InvalidRange { lo, hi });
        }
        for edge in [
            Edge {
                value: lo,
                sign: OPEN,
            },
            Edge {
                value: hi,
                sign: CLOSE,
            },
        ] {
            let pos = self
                .edges
                .partition_point(|e| e.order(&edge) != Ordering::Greater);
            self.edges.insert(pos, edge);
        }
        Ok(())
    }

    /// Number of intervals.
    pub(crate) fn intervals(&self) -> usize {
        self.edges.len() / 2
    }

    pub(crate) fn edges(&self) -> &[Edge] {
        &self.edges
    }
}
