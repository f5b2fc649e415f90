//! Lifted elimination of one random-variable set from the whole marginal.

use crate::cost::Cost;
use crate::distribution::{Marginal, RandomVariableSet};
use crate::error::{Error, Result};
use crate::matching::{compare, renaming, Relation, View};
use crate::parfactor::{same_variables, Parfactor, StdParfactor};

#[cfg(feature = "tracing")]
use crate::trace::{debug, debug_span};

/// Multiply every parfactor holding a random-variable set and sum the set
/// out of the product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalSumOut {
    eliminated: RandomVariableSet,
    /// Parfactors as they appear in the marginal.
    involved: Vec<Parfactor>,
    /// The same parfactors renamed onto the set's logical variables.
    aligned: Vec<StdParfactor>,
}

impl GlobalSumOut {
    /// None unless the set can be eliminated on its own:
    /// - it is not preservable
    /// - every parfactor holding one of its random variables is standard
    ///   and holds the whole set exactly once
    /// - renamed onto the set, those parfactors have exactly the set's
    ///   logical variables and constraints
    pub fn new(marginal: &Marginal, eliminated: RandomVariableSet) -> Option<Self> {
        if marginal.is_preservable(&eliminated) {
            return None;
        }
        let target = View::of_set(&eliminated);
        let vars = eliminated.prv().free_variables();
        let mut involved = Vec::new();
        let mut aligned = Vec::new();
        for p in marginal.distribution().sorted() {
            let mut hit = None;
            for (k, q) in p.prvs().iter().enumerate() {
                match compare(&View::of(q, p.constraints()), &target) {
                    Relation::Disjoint => {}
                    r if r.is_identical() && hit.is_none() => hit = Some(k),
                    _ => return None,
                }
            }
            let Some(k) = hit else {
                continue;
            };
            let s = p.as_standard()?;
            let q = &s.prvs()[k];
            if !same_variables(&s.logical_variables(), &q.free_variables()) {
                return None;
            }
            let rho = renaming(&target, &View::of(q, s.constraints()))?;
            let renamed = s.apply(&rho)?;
            if !renamed.prvs()[k].same_formula(eliminated.prv())
                || renamed.constraints() != eliminated.constraints()
                || !same_variables(&renamed.logical_variables(), &vars)
            {
                return None;
            }
            aligned.push(renamed.replace_prv(k, eliminated.prv().clone()));
            involved.push(p.clone());
        }
        if involved.is_empty() {
            return None;
        }
        Some(Self {
            eliminated,
            involved,
            aligned,
        })
    }

    /// One candidate per distinct group of parfactors, scanning every Prv of
    /// every standard parfactor.
    pub fn candidates(marginal: &Marginal) -> Vec<GlobalSumOut> {
        let mut out: Vec<GlobalSumOut> = Vec::new();
        for p in marginal.distribution().sorted() {
            let Some(s) = p.as_standard() else {
                continue;
            };
            for rvs in s.random_variable_sets() {
                if !same_variables(&rvs.prv().free_variables(), &s.logical_variables()) {
                    continue;
                }
                let Some(op) = Self::new(marginal, rvs) else {
                    continue;
                };
                if !out.iter().any(|o| same_group(&o.involved, &op.involved)) {
                    out.push(op);
                }
            }
        }
        out
    }

    pub fn eliminated(&self) -> &RandomVariableSet {
        &self.eliminated
    }

    pub fn involved(&self) -> &[Parfactor] {
        &self.involved
    }

    /// Size of the product before summation.
    pub fn cost(&self) -> Cost {
        let mut prvs = Vec::new();
        for p in &self.aligned {
            for q in p.prvs() {
                if !prvs.contains(q) {
                    prvs.push(q.clone());
                }
            }
        }
        prvs.iter()
            .fold(Cost::Finite(1), |acc, q| acc.saturating_mul(Cost::from(q.range_size())))
    }

    /// Number of ground random variables removed.
    pub fn random_variables_eliminated(&self) -> Cost {
        self.eliminated.ground_count()
    }

    pub fn run(&self, marginal: &Marginal) -> Result<Marginal> {
        #[cfg(feature = "tracing")]
        let _span = debug_span!("global_sum_out", set = %self.eliminated).entered();

        let mut parts = self.aligned.iter();
        let first = parts
            .next()
            .ok_or_else(|| Error::NotPresent(self.eliminated.to_string()))?;
        let product = parts.try_fold(first.clone(), |acc, p| acc.multiply(p))?;
        let summed = product.sum_out(self.eliminated.prv())?;

        #[cfg(feature = "tracing")]
        debug!(multiplied = self.aligned.len(), result = %summed, "global_sum_out_done");

        let mut distribution = marginal.distribution().clone();
        for p in &self.involved {
            if !distribution.remove(p) {
                return Err(Error::NotPresent(p.to_string()));
            }
        }
        if let Some(p) = summed.normalize() {
            distribution.add(p);
        }
        Ok(marginal.with_distribution(distribution))
    }
}

fn same_group(a: &[Parfactor], b: &[Parfactor]) -> bool {
    a.len() == b.len() && a.iter().all(|p| b.contains(p))
}
