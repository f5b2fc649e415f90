//! Dense potential tables.
//!
//! A factor over variables with range sizes `[r0, r1, .., rk]` stores one
//! entry per joint assignment in row-major order: the first variable is the
//! most significant digit of the linear index.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

pub type Assignment = SmallVec<[usize; 8]>;

/// Dense table of potentials.
///
/// Equality and hashing compare the bit patterns of the entries (with `-0.0`
/// folded onto `0.0`), so factors can live in hash sets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Factor {
    values: Vec<f64>,
}

impl Factor {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }

    /// Factor of `size` entries, all equal to `value`.
    pub fn constant(size: usize, value: f64) -> Self {
        Self {
            values: vec![value; size],
        }
    }

    pub fn ones(size: usize) -> Self {
        Self::constant(size, 1.0)
    }

    /// Build a factor over `sizes` by evaluating `f` at every assignment.
    pub fn from_fn(sizes: &[usize], mut f: impl FnMut(&[usize]) -> f64) -> Self {
        let total: usize = sizes.iter().product();
        let mut values = Vec::with_capacity(total);
        let mut assignment: Assignment = sizes.iter().map(|_| 0).collect();
        for _ in 0..total {
            values.push(f(&assignment));
            increment(&mut assignment, sizes);
        }
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    /// Entry at `assignment` over a table shaped by `sizes`.
    pub fn at(&self, sizes: &[usize], assignment: &[usize]) -> f64 {
        self.values[index_of(sizes, assignment)]
    }

    pub fn is_all_ones(&self) -> bool {
        self.values.iter().all(|v| *v == 1.0)
    }

    pub fn check_size(&self, expected: usize) -> Result<()> {
        if self.values.len() == expected {
            Ok(())
        } else {
            Err(Error::FactorSize {
                expected,
                actual: self.values.len(),
            })
        }
    }

    pub fn map(&self, f: impl Fn(f64) -> f64) -> Factor {
        Self {
            values: self.values.iter().map(|v| f(*v)).collect(),
        }
    }

    /// Entries divided by their sum. A zero table is returned unchanged.
    pub fn normalized(&self) -> Factor {
        let total: f64 = self.values.iter().sum();
        if total == 0.0 {
            return self.clone();
        }
        self.map(|v| v / total)
    }

    fn bits(&self) -> impl Iterator<Item = u64> + '_ {
        self.values
            .iter()
            .map(|v| if *v == 0.0 { 0u64 } else { v.to_bits() })
    }
}

/// Advance a row-major assignment to the next one; wraps to all zeros.
pub fn increment(assignment: &mut [usize], sizes: &[usize]) {
    for i in (0..assignment.len()).rev() {
        assignment[i] += 1;
        if assignment[i] < sizes[i] {
            return;
        }
        assignment[i] = 0;
    }
}

pub fn index_of(sizes: &[usize], assignment: &[usize]) -> usize {
    sizes
        .iter()
        .zip(assignment)
        .fold(0, |acc, (size, value)| acc * size + value)
}

pub fn assignment_of(sizes: &[usize], mut index: usize) -> Assignment {
    let mut out: Assignment = sizes.iter().map(|_| 0).collect();
    for i in (0..sizes.len()).rev() {
        if sizes[i] > 0 {
            out[i] = index % sizes[i];
            index /= sizes[i];
        }
    }
    out
}

impl PartialEq for Factor {
    fn eq(&self, other: &Self) -> bool {
        self.values.len() == other.values.len() && self.bits().eq(other.bits())
    }
}

impl Eq for Factor {}

impl Hash for Factor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.values.len().hash(state);
        for b in self.bits() {
            b.hash(state);
        }
    }
}

impl PartialOrd for Factor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Factor {
    fn cmp(&self, other: &Self) -> Ordering {
        let normal = |v: &f64| if *v == 0.0 { 0.0 } else { *v };
        self.values
            .iter()
            .map(normal)
            .zip(other.values.iter().map(normal))
            .map(|(a, b)| a.total_cmp(&b))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| self.values.len().cmp(&other.values.len()))
    }
}

#[cfg(test)]
#[path = "tests/factor.rs"]
mod tests;
