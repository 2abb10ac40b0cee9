// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

use proptest::prelude::*;
use vak_client::overlap::{Agreement, OptimizedOverlap, Overlap, ReferenceOverlap};

/// Small integer-valued bounds so ties and touching edges are common.
fn interval() -> impl Strategy<Value = (f64, f64)> {
    (-20i32..20, 0i32..10).prop_map(|(lo, width)| (f64::from(lo), f64::from(lo + width)))
}

fn intervals() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec(interval(), 0..12)
}

fn run<O: Overlap>(mut engine: O, intervals: &[(f64, f64)]) -> Agreement {
    for &(lo, hi) in intervals {
        engine.add(lo, hi).unwrap();
    }
    engine.find()
}

proptest! {
    /// Both engines give the same answer after every add.
    #[test]
    fn optimized_matches_reference_incrementally(ivs in intervals()) {
        let mut reference = ReferenceOverlap::new();
        let mut optimized = OptimizedOverlap::new();
        for (lo, hi) in ivs {
            reference.add(lo, hi).unwrap();
            optimized.add(lo, hi).unwrap();
            prop_assert_eq!(reference.find(), optimized.find());
        }
    }

    /// Agreement does not depend on insertion order.
    #[test]
    fn result_is_permutation_invariant(
        (original, shuffled) in intervals().prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
    ) {
        let expected = run(ReferenceOverlap::new(), &original);
        let reversed: Vec<_> = original.iter().rev().copied().collect();
        prop_assert_eq!(run(ReferenceOverlap::new(), &reversed), expected);
        prop_assert_eq!(run(ReferenceOverlap::new(), &shuffled), expected);
        prop_assert_eq!(run(OptimizedOverlap::new(), &shuffled), expected);
    }

    /// The reported region lies inside `count` of the intervals.
    #[test]
    fn region_is_covered_by_count_intervals(ivs in intervals()) {
        let (count, lo, hi) = run(ReferenceOverlap::new(), &ivs);
        if ivs.is_empty() {
            prop_assert_eq!((count, lo, hi), (0, None, None));
        } else {
            let (lo, hi) = (lo.unwrap(), hi.unwrap());
            prop_assert!(count >= 1 && count <= ivs.len());
            prop_assert!(lo <= hi);
            // Intervals containing the lower and upper bounds each number at least `count`.
            let at_lo = ivs.iter().filter(|&&(a, b)| a <= lo && lo <= b).count();
            let at_hi = ivs.iter().filter(|&&(a, b)| a <= hi && hi <= b).count();
            prop_assert!(at_lo >= count, "{} intervals at lo, count {}", at_lo, count);
            prop_assert!(at_hi >= count, "{} intervals at hi, count {}", at_hi, count);
        }
    }

    /// The agreeing count never decreases as intervals are added.
    #[test]
    fn count_is_monotonic(ivs in intervals()) {
        let mut engine = OptimizedOverlap::new();
        let mut last = 0;
        for (lo, hi) in ivs {
            engine.add(lo, hi).unwrap();
            let (count, _, _) = engine.find();
            prop_assert!(count >= last);
            last = count;
        }
    }

    /// A rejected interval changes nothing.
    #[test]
    fn invalid_add_leaves_state(ivs in intervals(), lo in 1.0f64..10.0, gap in 0.001f64..5.0) {
        let mut reference = ReferenceOverlap::new();
        let mut optimized = OptimizedOverlap::new();
        for &(a, b) in &ivs {
            reference.add(a, b).unwrap();
            optimized.add(a, b).unwrap();
        }
        let before = reference.find();
        prop_assert!(reference.add(lo, lo - gap).is_err());
        prop_assert!(optimized.add(lo, lo - gap).is_err());
        prop_assert_eq!(reference.find(), before);
        prop_assert_eq!(optimized.find(), before);
    }
}
