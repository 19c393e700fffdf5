//! Ordered key set with O(1) position lookup.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use super::error::{Axis, ProbabilityError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyIndex<K: Eq + Hash> {
    keys: Vec<K>,
    positions: HashMap<K, usize>,
    axis: Axis,
}

impl<K> KeyIndex<K>
where
    K: Eq + Hash + Clone + Display,
{
    pub(crate) fn new<I>(keys: I, axis: Axis) -> Result<Self>
    where
        I: IntoIterator<Item = K>,
    {
        let keys: Vec<K> = keys.into_iter().collect();
        let mut positions = HashMap::with_capacity(keys.len());
        for (pos, key) in keys.iter().enumerate() {
            if positions.insert(key.clone(), pos).is_some() {
                return Err(ProbabilityError::DuplicateKey {
                    axis,
                    key: key.to_string(),
                });
            }
        }
        Ok(Self {
            keys,
            positions,
            axis,
        })
    }

    pub(crate) fn position(&self, key: &K) -> Result<usize> {
        self.positions
            .get(key)
            .copied()
            .ok_or_else(|| ProbabilityError::UnknownKey {
                axis: self.axis,
                key: key.to_string(),
            })
    }

    pub(crate) fn contains(&self, key: &K) -> bool {
        self.positions.contains_key(key)
    }
}

impl<K: Eq + Hash> KeyIndex<K> {
    pub(crate) fn keys(&self) -> &[K] {
        &self.keys
    }

    pub(crate) fn len(&self) -> usize {
        self.keys.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_follow_insertion_order() {
        let idx = KeyIndex::new(["b", "a", "c"], Axis::Outcome).unwrap();
        assert_eq!(idx.position(&"b").unwrap(), 0);
        assert_eq!(idx.position(&"c").unwrap(), 2);
        assert_eq!(idx.keys(), &["b", "a", "c"]);
    }

    #[test]
    fn rejects_duplicates() {
        let err = KeyIndex::new(["a", "a"], Axis::Row).unwrap_err();
        assert_eq!(
            err,
            ProbabilityError::DuplicateKey {
                axis: Axis::Row,
                key: "a".to_string()
            }
        );
    }

    #[test]
    fn unknown_key_names_axis() {
        let idx = KeyIndex::new(["a"], Axis::Column).unwrap();
        let err = idx.position(&"z").unwrap_err();
        assert_eq!(err.to_string(), "unknown column key 'z'");
    }
}
