//! Saturating cost arithmetic for comparing candidate macro-operations.
//!
//! A cost estimates the size of the largest factor an operation would
//! materialise. Anything past `u128::MAX` collapses into [`Cost::Infinite`],
//! so comparisons stay total even when the estimate itself is astronomical.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Cost {
    Finite(u128),
    Infinite,
}

impl Cost {
    pub const ZERO: Cost = Cost::Finite(0);

    pub fn is_infinite(&self) -> bool {
        matches!(self, Cost::Infinite)
    }

    pub fn finite(&self) -> Option<u128> {
        match self {
            Cost::Finite(n) => Some(*n),
            Cost::Infinite => None,
        }
    }

    pub fn saturating_mul(self, other: Cost) -> Cost {
        match (self, other) {
            (Cost::Finite(0), _) | (_, Cost::Finite(0)) => Cost::ZERO,
            (Cost::Finite(a), Cost::Finite(b)) => a.checked_mul(b).map_or(Cost::Infinite, Cost::Finite),
            _ => Cost::Infinite,
        }
    }

    pub fn saturating_add(self, other: Cost) -> Cost {
        match (self, other) {
            (Cost::Finite(a), Cost::Finite(b)) => a.checked_add(b).map_or(Cost::Infinite, Cost::Finite),
            _ => Cost::Infinite,
        }
    }

    /// `base^exp`, saturating.
    pub fn pow(base: u128, exp: u128) -> Cost {
        let mut acc = Cost::Finite(1);
        if base <= 1 || exp == 0 {
            return if exp == 0 { acc } else { Cost::Finite(base) };
        }
        for _ in 0..exp {
            acc = acc.saturating_mul(Cost::Finite(base));
            if acc.is_infinite() {
                break;
            }
        }
        acc
    }

    /// Integer division; an infinite dividend stays infinite.
    pub fn div(self, divisor: u128) -> Cost {
        match self {
            Cost::Finite(n) => Cost::Finite(n.checked_div(divisor).unwrap_or(0)),
            Cost::Infinite => Cost::Infinite,
        }
    }
}

impl From<usize> for Cost {
    fn from(n: usize) -> Self {
        Cost::Finite(n as u128)
    }
}

impl From<u128> for Cost {
    fn from(n: u128) -> Self {
        Cost::Finite(n)
    }
}

impl fmt::Display for Cost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cost::Finite(n) => write!(f, "{}", n),
            Cost::Infinite => f.write_str("∞"),
        }
    }
}

/// Cost of fully expanding a counting formula:
/// `(|F| / |range(cf)|) * |range(inner)|^n`.
pub fn full_expand_cost(
    factor_size: usize,
    counting_range_size: usize,
    inner_range_size: usize,
    domain_size: usize,
) -> Cost {
    Cost::from(factor_size)
        .div(counting_range_size as u128)
        .saturating_mul(Cost::pow(inner_range_size as u128, domain_size as u128))
}

/// Number of histograms with `buckets` buckets summing to `n`:
/// `C(n + buckets - 1, buckets - 1)`, saturating.
pub fn histogram_count(n: usize, buckets: usize) -> Cost {
    if buckets == 0 {
        return if n == 0 { Cost::Finite(1) } else { Cost::ZERO };
    }
    let k = (buckets - 1) as u128;
    let total = n as u128 + k;
    let k = k.min(total - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        // acc * (total - i) is always divisible by (i + 1)
        match acc.checked_mul(total - i) {
            Some(v) => acc = v / (i + 1),
            None => return Cost::Infinite,
        }
    }
    Cost::Finite(acc)
}

#[cfg(test)]
#[path = "tests/cost.rs"]
mod tests;
