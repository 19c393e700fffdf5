//! Finite discrete probability distribution over an ordered outcome set.
//!
//! The outcome set is fixed at construction and shared between copies, so
//! [`Distribution::duplicate`] only copies the mass vector. Masses are not
//! required to sum to 1 between operations: callers compose unnormalized
//! intermediate values and call [`Distribution::normalize`] when done.

use std::collections::BTreeMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use super::error::{Axis, ProbabilityError, Result};
use super::index::KeyIndex;
use super::stable::{is_normalizable, stable_sum};

/// Discrete distribution: outcome -> non-negative mass.
#[derive(Debug, Clone)]
pub struct Distribution<K: Eq + Hash> {
    index: Arc<KeyIndex<K>>,
    masses: Vec<f64>,
}

impl<K> Distribution<K>
where
    K: Eq + Hash + Clone + Display,
{
    /// Create a distribution with every mass set to 0.
    ///
    /// Fails with [`ProbabilityError::DuplicateKey`] if an outcome repeats.
    pub fn new<I>(outcomes: I) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
    {
        let index = KeyIndex::new(outcomes, Axis::Outcome)?;
        let masses = vec![0.0; index.len()];
        Ok(Self {
            index: Arc::new(index),
            masses,
        })
    }

    /// Create the uniform distribution over `outcomes`.
    pub fn uniform<I>(outcomes: I) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
    {
        let mut dist = Self::new(outcomes)?;
        if !dist.masses.is_empty() {
            let p = 1.0 / dist.masses.len() as f64;
            dist.masses.fill(p);
        }
        Ok(dist)
    }

    /// Create a distribution from `(outcome, mass)` pairs, in order.
    pub fn from_pairs<I>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, f64)>,
    {
        let (outcomes, masses): (Vec<K>, Vec<f64>) = pairs.into_iter().unzip();
        let index = KeyIndex::new(outcomes, Axis::Outcome)?;
        Ok(Self {
            index: Arc::new(index),
            masses,
        })
    }

    /// Outcomes in construction order.
    pub fn states(&self) -> &[K] {
        self.index.keys()
    }

    /// Masses in the same order as [`Distribution::states`].
    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn len(&self) -> usize {
        self.masses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masses.is_empty()
    }

    pub fn contains(&self, outcome: &K) -> bool {
        self.index.contains(outcome)
    }

    /// Position of `outcome` in the outcome order.
    pub fn position(&self, outcome: &K) -> Result<usize> {
        self.index.position(outcome)
    }

    /// Mass currently assigned to `outcome`.
    pub fn probability_of(&self, outcome: &K) -> Result<f64> {
        let pos = self.index.position(outcome)?;
        Ok(self.masses[pos])
    }

    /// Overwrite the mass for `outcome`. No range check is applied.
    pub fn set_probability_of(&mut self, outcome: &K, value: f64) -> Result<()> {
        let pos = self.index.position(outcome)?;
        self.masses[pos] = value;
        Ok(())
    }

    /// Independent copy with the same outcomes and current masses.
    pub fn duplicate(&self) -> Self {
        self.clone()
    }

    /// New distribution over the same outcomes carrying `masses`.
    pub fn with_masses(&self, masses: Vec<f64>) -> Result<Self> {
        if masses.len() != self.masses.len() {
            return Err(ProbabilityError::ShapeMismatch {
                expected: self.masses.len(),
                actual: masses.len(),
            });
        }
        Ok(Self {
            index: Arc::clone(&self.index),
            masses,
        })
    }

    /// Whether both distributions range over the same ordered outcomes.
    pub fn same_outcomes(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.index, &other.index) || self.index.keys() == other.index.keys()
    }

    /// Sum of all masses.
    pub fn total(&self) -> f64 {
        stable_sum(self.masses.iter().copied())
    }

    /// Scale all masses so they sum to 1.
    ///
    /// A zero (or non-finite) total is a degenerate distribution: this
    /// returns [`ProbabilityError::Degenerate`] and leaves the masses as
    /// they were.
    pub fn normalize(&mut self) -> Result<()> {
        let total = self.total();
        if !is_normalizable(total) {
            return Err(ProbabilityError::Degenerate { total });
        }
        for m in &mut self.masses {
            *m /= total;
        }
        Ok(())
    }

    /// Iterate `(outcome, mass)` pairs in outcome order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, f64)> + '_ {
        self.index.keys().iter().zip(self.masses.iter().copied())
    }

    /// Masses keyed by outcome text, for reports.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.iter().map(|(k, m)| (k.to_string(), m)).collect()
    }

    /// Outcome with the largest mass (first one on ties).
    pub fn most_likely(&self) -> Option<(&K, f64)> {
        let mut best: Option<(&K, f64)> = None;
        for (k, m) in self.iter() {
            match best {
                Some((_, bm)) if bm >= m => {}
                _ => best = Some((k, m)),
            }
        }
        best
    }

    /// Shannon entropy in nats. Zero masses contribute nothing.
    pub fn entropy(&self) -> f64 {
        -stable_sum(
            self.masses
                .iter()
                .filter(|&&p| p > 0.0)
                .map(|&p| p * p.ln()),
        )
    }
}

impl<K> PartialEq for Distribution<K>
where
    K: Eq + Hash,
{
    fn eq(&self, other: &Self) -> bool {
        self.index.keys() == other.index.keys() && self.masses == other.masses
    }
}

impl<K> Serialize for Distribution<K>
where
    K: Eq + Hash + Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.masses.len()))?;
        for (k, m) in self.index.keys().iter().zip(self.masses.iter()) {
            map.serialize_entry(k, m)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approx_eq;

    fn weather() -> Distribution<String> {
        Distribution::from_pairs([("Sunny".to_string(), 0.05), ("Rainy".to_string(), 0.4)])
            .unwrap()
    }

    #[test]
    fn new_starts_at_zero() {
        let d = Distribution::new(["a", "b"]).unwrap();
        assert_eq!(d.masses(), &[0.0, 0.0]);
        assert_eq!(d.states(), &["a", "b"]);
    }

    #[test]
    fn uniform_sums_to_one() {
        let d = Distribution::uniform(["a", "b", "c", "d"]).unwrap();
        assert!(approx_eq(d.total(), 1.0, 1e-12));
        assert!(approx_eq(d.probability_of(&"c").unwrap(), 0.25, 1e-12));
    }

    #[test]
    fn uniform_over_nothing_is_empty() {
        let d = Distribution::<&str>::uniform([]).unwrap();
        assert!(d.is_empty());
        assert!(d.most_likely().is_none());
    }

    #[test]
    fn unknown_outcome_is_domain_error() {
        let mut d = Distribution::new(["a"]).unwrap();
        assert!(matches!(
            d.probability_of(&"z"),
            Err(ProbabilityError::UnknownKey {
                axis: Axis::Outcome,
                ..
            })
        ));
        assert!(d.set_probability_of(&"z", 1.0).is_err());
    }

    #[test]
    fn set_allows_unnormalized_values() {
        let mut d = Distribution::new(["a", "b"]).unwrap();
        d.set_probability_of(&"a", 3.0).unwrap();
        d.set_probability_of(&"b", 1.0).unwrap();
        assert_eq!(d.total(), 4.0);
        d.normalize().unwrap();
        assert!(approx_eq(d.probability_of(&"a").unwrap(), 0.75, 1e-12));
    }

    #[test]
    fn normalize_umbrella_update() {
        let mut d = weather();
        d.normalize().unwrap();
        assert!(approx_eq(d.probability_of(&"Sunny".to_string()).unwrap(), 1.0 / 9.0, 1e-12));
        assert!(approx_eq(d.probability_of(&"Rainy".to_string()).unwrap(), 8.0 / 9.0, 1e-12));
    }

    #[test]
    fn normalize_degenerate_fails_and_keeps_masses() {
        let mut d = Distribution::new(["a", "b"]).unwrap();
        let err = d.normalize().unwrap_err();
        assert_eq!(err, ProbabilityError::Degenerate { total: 0.0 });
        assert_eq!(d.masses(), &[0.0, 0.0]);
    }

    #[test]
    fn duplicate_is_independent() {
        let sunny = "Sunny".to_string();
        let mut original = weather();
        let mut copy = original.duplicate();
        copy.set_probability_of(&sunny, 0.9).unwrap();
        assert_eq!(original.probability_of(&sunny).unwrap(), 0.05);
        assert!(copy.same_outcomes(&original));

        original.set_probability_of(&sunny, 0.3).unwrap();
        assert_eq!(copy.probability_of(&sunny).unwrap(), 0.9);
        original.normalize().unwrap();
        assert_eq!(copy.masses(), &[0.9, 0.4]);
    }

    fn same<K: Eq + Hash>(a: &Distribution<K>, b: &Distribution<K>) -> bool {
        a == b
    }

    fn to_json<K: Eq + Hash + Serialize>(d: &Distribution<K>) -> serde_json::Value {
        serde_json::to_value(d).unwrap()
    }

    #[test]
    fn eq_and_serialize_need_only_hashable_keys() {
        let d = weather();
        assert!(same(&d, &d.duplicate()));
        assert!(!same(&d, &d.with_masses(vec![0.5, 0.5]).unwrap()));
        assert_eq!(to_json(&d)["Rainy"], 0.4);
    }

    #[test]
    fn with_masses_checks_shape() {
        let d = weather();
        assert!(d.with_masses(vec![0.5, 0.5]).is_ok());
        assert_eq!(
            d.with_masses(vec![1.0]).unwrap_err(),
            ProbabilityError::ShapeMismatch {
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn most_likely_prefers_first_on_ties() {
        let d = Distribution::uniform(["x", "y"]).unwrap();
        assert_eq!(d.most_likely().map(|(k, _)| *k), Some("x"));
        let d = weather();
        assert_eq!(d.most_likely().map(|(k, _)| k.as_str()), Some("Rainy"));
    }

    #[test]
    fn entropy_bounds() {
        let uniform = Distribution::uniform(["a", "b", "c", "d"]).unwrap();
        assert!(approx_eq(uniform.entropy(), 4f64.ln(), 1e-12));
        let certain = Distribution::from_pairs([("a", 1.0), ("b", 0.0)]).unwrap();
        assert!(certain.entropy().abs() < 1e-12);
    }

    #[test]
    fn serializes_in_outcome_order() {
        let d = Distribution::from_pairs([("z", 0.25), ("a", 0.75)]).unwrap();
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"z":0.25,"a":0.75}"#);
    }
}
