//! Sparse N-dimensional accumulator.
//!
//! Every per-item, per-choice, and per-group tally in the engine lives in a
//! [`SparseArray`]. Indices are unbounded: setting a previously unseen index
//! simply records it, and reading any unset index yields the fill value.

use std::collections::HashMap;
use std::ops::{Add, Mul};

use crate::error::{ItemalError, Result};

/// A sparse array of fixed rank keyed by non-negative integer tuples.
#[derive(Debug, Clone)]
pub struct SparseArray<T> {
    rank: usize,
    fill: T,
    values: HashMap<Vec<usize>, T>,
}

impl<T: Copy> SparseArray<T> {
    /// Create an empty array of the given rank. Rank zero holds a single
    /// value at the empty index.
    pub fn new(rank: usize, fill: T) -> Self {
        Self {
            rank,
            fill,
            values: HashMap::new(),
        }
    }

    /// Read the value at `index`, or the fill value if it was never set.
    pub fn get(&self, index: &[usize]) -> Result<T> {
        self.check_rank(index)?;
        Ok(self.values.get(index).copied().unwrap_or(self.fill))
    }

    /// Store `value` at `index`.
    pub fn set(&mut self, index: &[usize], value: T) -> Result<()> {
        self.check_rank(index)?;
        self.values.insert(index.to_vec(), value);
        Ok(())
    }

    /// Number of explicitly set entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn check_rank(&self, index: &[usize]) -> Result<()> {
        if index.len() == self.rank {
            Ok(())
        } else {
            Err(ItemalError::RankMismatch {
                expected: self.rank,
                found: index.len(),
            })
        }
    }
}

impl<T: Copy + Add<Output = T>> SparseArray<T> {
    /// Add `delta` to the value at `index`.
    pub fn add(&mut self, index: &[usize], delta: T) -> Result<()> {
        let current = self.get(index)?;
        self.set(index, current + delta)
    }
}

impl<T: Copy + Mul<Output = T>> SparseArray<T> {
    /// Multiply the value at `index` by `factor`.
    pub fn scale(&mut self, index: &[usize], factor: T) -> Result<()> {
        let current = self.get(index)?;
        self.set(index, current * factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn unset_index_reads_fill_value() {
        let arr = SparseArray::new(2, 7u32);
        assert_eq!(arr.get(&[0, 0]).unwrap(), 7);
        assert_eq!(arr.get(&[10_000, 3]).unwrap(), 7);
        assert!(arr.is_empty());
    }

    #[test]
    fn set_records_distant_indices() {
        let mut arr = SparseArray::new(3, 0.0f64);
        arr.set(&[4, 1, 9], 2.5).unwrap();
        arr.set(&[400, 0, 90_000], 1.0).unwrap();
        assert_eq!(arr.get(&[4, 1, 9]).unwrap(), 2.5);
        assert_eq!(arr.get(&[400, 0, 90_000]).unwrap(), 1.0);
        assert_eq!(arr.get(&[4, 1, 8]).unwrap(), 0.0);
        assert_eq!(arr.len(), 2);
    }

    #[test]
    fn wrong_rank_is_an_error() {
        let mut arr = SparseArray::new(2, 0i64);
        assert_eq!(
            arr.get(&[1]),
            Err(ItemalError::RankMismatch {
                expected: 2,
                found: 1
            })
        );
        assert!(arr.set(&[1, 2, 3], 4).is_err());
        assert!(arr.is_empty());
    }

    #[test]
    fn add_and_scale() {
        let mut arr = SparseArray::new(1, 1.0f64);
        arr.add(&[3], 2.0).unwrap();
        arr.scale(&[3], 4.0).unwrap();
        assert_eq!(arr.get(&[3]).unwrap(), 12.0);
        arr.scale(&[0], 5.0).unwrap();
        assert_eq!(arr.get(&[0]).unwrap(), 5.0);
    }

    #[test]
    fn zero_rank_holds_one_value() {
        let mut arr = SparseArray::new(0, 0u8);
        arr.add(&[], 3).unwrap();
        assert_eq!(arr.get(&[]).unwrap(), 3);
        assert_eq!(
            arr.get(&[0]),
            Err(ItemalError::RankMismatch {
                expected: 0,
                found: 1
            })
        );
    }

    proptest! {
        #[test]
        fn reads_never_mutate(i in 0usize..500, j in 0usize..500) {
            let arr = SparseArray::new(2, -1i32);
            prop_assert_eq!(arr.get(&[i, j]).unwrap(), -1);
            prop_assert!(arr.is_empty());
        }

        #[test]
        fn repeated_adds_sum(indices in proptest::collection::vec((0usize..20, 0usize..20), 1..60)) {
            let mut arr = SparseArray::new(2, 0u64);
            for (i, j) in &indices {
                arr.add(&[*i, *j], 1).unwrap();
            }
            let total: u64 = (0..20)
                .flat_map(|i| (0..20).map(move |j| (i, j)))
                .map(|(i, j)| arr.get(&[i, j]).unwrap())
                .sum();
            prop_assert_eq!(total, indices.len() as u64);
        }
    }
}
