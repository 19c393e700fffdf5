//! Property-based tests for hmm-math distributions and tables.
//!
//! Uses proptest to verify normalization and copy semantics across many
//! random inputs.

use hmm_math::{approx_eq, stable_sum, ConditionalTable, Distribution, ProbabilityError};
use proptest::prelude::*;

/// Tolerance for floating point comparisons.
const TOL: f64 = 1e-9;

fn outcomes(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("s{i}")).collect()
}

fn masses_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(0.0f64..10.0, 1..12)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Any non-degenerate mass vector normalizes to total 1.
    #[test]
    fn normalize_sums_to_one(masses in masses_strategy()) {
        prop_assume!(stable_sum(masses.iter().copied()) > 0.0);
        let names = outcomes(masses.len());
        let mut d = Distribution::from_pairs(names.into_iter().zip(masses)).unwrap();
        d.normalize().unwrap();
        prop_assert!(approx_eq(d.total(), 1.0, TOL), "total={}", d.total());
        for &m in d.masses() {
            prop_assert!((0.0..=1.0 + TOL).contains(&m));
        }
    }

    /// Normalization preserves mass ratios.
    #[test]
    fn normalize_preserves_ratios(a in 0.01f64..5.0, b in 0.01f64..5.0) {
        let mut d = Distribution::from_pairs([("a", a), ("b", b)]).unwrap();
        d.normalize().unwrap();
        let ratio = d.probability_of(&"a").unwrap() / d.probability_of(&"b").unwrap();
        prop_assert!(approx_eq(ratio, a / b, 1e-9 * (a / b).max(1.0)));
    }

    /// Mutating a copy never touches the original, and vice versa.
    #[test]
    fn duplicate_independence(masses in masses_strategy(), pick in 0usize..12, value in 0.0f64..3.0) {
        let names = outcomes(masses.len());
        let target = names[pick % names.len()].clone();
        let mut original = Distribution::from_pairs(names.into_iter().zip(masses.clone())).unwrap();
        let mut copy = original.duplicate();

        copy.set_probability_of(&target, value).unwrap();
        prop_assert_eq!(original.masses(), masses.as_slice());

        original.set_probability_of(&target, value + 1.0).unwrap();
        prop_assert_eq!(copy.probability_of(&target).unwrap(), value);
    }

    /// Row sums report exactly what was written.
    #[test]
    fn table_row_sum_matches_entries(row in prop::collection::vec(0.0f64..1.0, 1..8)) {
        let cols = outcomes(row.len());
        let mut t = ConditionalTable::new(["r".to_string()], cols.clone()).unwrap();
        for (c, p) in cols.iter().zip(row.iter()) {
            t.set(&"r".to_string(), c, *p).unwrap();
        }
        let expected = stable_sum(row.iter().copied());
        prop_assert!(approx_eq(t.row_sum(&"r".to_string()).unwrap(), expected, TOL));
        prop_assert_eq!(t.malformed_rows(1e-6).is_empty(), (expected - 1.0).abs() <= 1e-6);
    }
}

#[test]
fn all_zero_distribution_is_degenerate() {
    let mut d = Distribution::new(outcomes(5)).unwrap();
    assert!(matches!(
        d.normalize(),
        Err(ProbabilityError::Degenerate { .. })
    ));
}
