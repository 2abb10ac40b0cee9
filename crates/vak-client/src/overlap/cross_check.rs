// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use super::{Agreement, InvalidRange, OptimizedOverlap, Overlap, ReferenceOverlap};

/// Largest difference tolerated between bounds reported by two engines.
pub const BOUND_TOLERANCE: f64 = 1e-9;

/// Runs several engines on the same input and panics when they disagree.
///
/// The first engine's answer is returned.
pub struct CrossCheck {
    engines: Vec<(&'static str, Box<dyn Overlap + Send>)>,
}

impl fmt::Debug for CrossCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.engines.iter().map(|(n, _)| *n).collect();
        f.debug_struct("CrossCheck").field("engines", &names).finish()
    }
}

impl Default for CrossCheck {
    fn default() -> Self {
        CrossCheck::new()
    }
}

impl CrossCheck {
    /// Reference and optimized engines side by side.
    pub fn new() -> Self {
        let reference: Box<dyn Overlap + Send> = Box::new(ReferenceOverlap::new());
        let optimized: Box<dyn Overlap + Send> = Box::new(OptimizedOverlap::new());
        CrossCheck::with_engines(vec![("reference", reference), ("optimized", optimized)])
    }

    /// Arbitrary named engines. The list must not be empty.
    pub fn with_engines(engines: Vec<(&'static str, Box<dyn Overlap + Send>)>) -> Self {
        assert!(!engines.is_empty(), "cross-check needs at least one engine");
        CrossCheck { engines }
    }
}

fn bound_agrees(a: Option<f64>, b: Option<f64>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => (a - b).abs() <= BOUND_TOLERANCE,
        _ => false,
    }
}

impl Overlap for CrossCheck {
    fn add(&mut self, lo: f64, hi: f64) -> Result<(), InvalidRange> {
        let mut results = self.engines.iter_mut().map(|(n, e)| (*n, e.add(lo, hi)));
        let (first_name, first) = results
            .next()
            .unwrap_or(("none", Err(InvalidRange { lo, hi })));
        for (name, result) in results {
            if result.is_ok() != first.is_ok() {
                panic!(
                    "overlap engines disagree on add({lo}, {hi}): {first_name} gave {first:?}, {name} gave {result:?}"
                );
            }
        }
        first
    }

    fn find(&mut self) -> Agreement {
        let mut results = self.engines.iter_mut().map(|(n, e)| (*n, e.find()));
        let (first_name, first) = results.next().unwrap_or(("none", (0, None, None)));
        for (name, result) in results {
            let agrees =
                result.0 == first.0 && bound_agrees(result.1, first.1) && bound_agrees(result.2, first.2);
            if !agrees {
                panic!(
                    "overlap engines disagree on find(): {first_name} gave {first:?}, {name} gave {result:?}"
                );
            }
        }
        first
    }
}
