//! Sets of parfactors and the marginals built on them.

use crate::constraint::{count_groundings, fmt_constraints, restrict_to, ConstraintSet};
use crate::cost::Cost;
use crate::error::{Error, Result};
use crate::matching::{self, View};
use crate::parfactor::{Parfactor, StdParfactor};
use crate::prv::Prv;
use hashbrown::HashSet;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::BuildHasherDefault;

pub type ParfactorSet = HashSet<Parfactor, BuildHasherDefault<FxHasher>>;

/// A Prv together with the constraints on its free variables: the set of
/// ground random variables it denotes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RandomVariableSet {
    prv: Prv,
    constraints: ConstraintSet,
}

impl RandomVariableSet {
    /// Keeps only the constraints whose variables are free in `prv`.
    pub fn new(prv: Prv, constraints: &ConstraintSet) -> Self {
        let constraints = restrict_to(constraints, &prv.free_variables());
        Self { prv, constraints }
    }

    pub fn prv(&self) -> &Prv {
        &self.prv
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    /// Number of ground random variables in the set.
    pub fn ground_count(&self) -> Cost {
        match &self.prv {
            Prv::Standard(p) => count_groundings(&p.variables(), &self.constraints),
            Prv::Counting(cf) => {
                let mut constraints = self.constraints.clone();
                constraints.extend(cf.constraints().iter().cloned());
                count_groundings(&cf.inner().variables(), &constraints)
            }
        }
    }
}

impl fmt::Display for RandomVariableSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : ", self.prv)?;
        fmt_constraints(&self.constraints, f)
    }
}

/// Product of a set of parfactors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    parfactors: ParfactorSet,
}

impl Distribution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Multiply a parfactor into the distribution. An equal parfactor that
    /// is already present is replaced by their product; false in that case.
    pub fn add(&mut self, parfactor: impl Into<Parfactor>) -> bool {
        let mut parfactor = parfactor.into();
        let mut fresh = true;
        while self.parfactors.remove(&parfactor) {
            parfactor = parfactor.squared();
            fresh = false;
        }
        self.parfactors.insert(parfactor);
        fresh
    }

    pub fn remove(&mut self, parfactor: &Parfactor) -> bool {
        self.parfactors.remove(parfactor)
    }

    pub fn contains(&self, parfactor: &Parfactor) -> bool {
        self.parfactors.contains(parfactor)
    }

    pub fn len(&self) -> usize {
        self.parfactors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parfactors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parfactor> {
        self.parfactors.iter()
    }

    /// Parfactors in a deterministic order.
    pub fn sorted(&self) -> Vec<&Parfactor> {
        let mut out: Vec<&Parfactor> = self.parfactors.iter().collect();
        out.sort();
        out
    }

    /// Distinct random-variable sets of all parfactors.
    pub fn random_variable_sets(&self) -> Vec<RandomVariableSet> {
        let mut out: Vec<RandomVariableSet> = Vec::new();
        for p in self.sorted() {
            for rvs in p.random_variable_sets() {
                if !out.contains(&rvs) {
                    out.push(rvs);
                }
            }
        }
        out
    }

    /// Multiply everything into one parfactor.
    ///
    /// Parfactors without random variables fold in as
    /// `value^(#groundings)`. The rest must become multipliable once their
    /// logical variables are renamed to agree.
    pub fn product(&self) -> Result<StdParfactor> {
        let mut scalar = 1.0;
        let mut acc: Option<StdParfactor> = None;
        for p in self.sorted() {
            let parts = match p {
                Parfactor::Standard(s) => vec![s.clone()],
                Parfactor::Aggregation(a) => a.to_std_parfactors()?,
            };
            for part in parts {
                if part.is_constant() {
                    let value = part.factor().get(0).unwrap_or(1.0);
                    scalar *= match part.grounding_count() {
                        Cost::Finite(n) => value.powf(n as f64),
                        Cost::Infinite => value.powf(f64::INFINITY),
                    };
                    continue;
                }
                acc = Some(match acc {
                    None => part,
                    Some(a) => {
                        let part = matching::align(&a, &part).unwrap_or(part);
                        a.multiply(&part)?
                    }
                });
            }
        }
        let answer = match acc {
            Some(a) => a,
            None => StdParfactor::builder().values([1.0]).build()?,
        };
        if scalar == 1.0 {
            return Ok(answer);
        }
        StdParfactor::builder()
            .constraints(answer.constraints().iter().cloned())
            .prvs(answer.prvs().iter().cloned())
            .factor(answer.factor().map(|v| v * scalar))
            .build()
    }
}

impl<P: Into<Parfactor>> FromIterator<P> for Distribution {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut out = Self::new();
        out.extend(iter);
        out
    }
}

impl<P: Into<Parfactor>> Extend<P> for Distribution {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        for p in iter {
            self.add(p);
        }
    }
}

/// Vector counterpart of [`Distribution::add`].
pub(crate) fn push_folded(parfactors: &mut Vec<Parfactor>, parfactor: Parfactor) {
    let mut parfactor = parfactor;
    while let Some(i) = parfactors.iter().position(|p| *p == parfactor) {
        parfactors.remove(i);
        parfactor = parfactor.squared();
    }
    parfactors.push(parfactor);
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for p in self.sorted() {
            writeln!(f, "{}", p)?;
        }
        Ok(())
    }
}

/// A distribution plus the random-variable sets that must survive
/// elimination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marginal {
    distribution: Distribution,
    preservable: Vec<RandomVariableSet>,
}

impl Marginal {
    pub fn builder() -> MarginalBuilder {
        MarginalBuilder::default()
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    pub fn preservable(&self) -> &[RandomVariableSet] {
        &self.preservable
    }

    /// Same preservable sets over another distribution.
    pub fn with_distribution(&self, distribution: Distribution) -> Marginal {
        Self {
            distribution,
            preservable: self.preservable.clone(),
        }
    }

    /// True if `rvs` lies inside some preservable set.
    pub fn is_preservable(&self, rvs: &RandomVariableSet) -> bool {
        let view = View::of_set(rvs);
        self.preservable
            .iter()
            .any(|q| matching::is_contained(&view, &View::of_set(q)))
    }

    /// Random-variable sets still waiting to be eliminated.
    pub fn non_preservable_sets(&self) -> Vec<RandomVariableSet> {
        self.distribution
            .random_variable_sets()
            .into_iter()
            .filter(|rvs| !self.is_preservable(rvs))
            .collect()
    }

    /// True once only preservable random variables remain.
    pub fn is_done(&self) -> bool {
        self.distribution
            .iter()
            .flat_map(Parfactor::random_variable_sets)
            .all(|rvs| self.is_preservable(&rvs))
    }

    /// The answer potential over the preservable random variables.
    pub fn answer(&self) -> Result<StdParfactor> {
        if !self.is_done() {
            return Err(Error::NotEliminable(
                "marginal still holds non-preservable random variables".to_string(),
            ));
        }
        self.distribution.product()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(input: &str) -> serde_json::Result<Marginal> {
        serde_json::from_str(input)
    }
}

impl fmt::Display for Marginal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.distribution.fmt(f)?;
        f.write_str("preservable: ")?;
        for (i, q) in self.preservable.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            q.fmt(f)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarginalBuilder {
    distribution: Distribution,
    preservable: Vec<RandomVariableSet>,
}

impl MarginalBuilder {
    pub fn parfactor(mut self, parfactor: impl Into<Parfactor>) -> Self {
        self.distribution.add(parfactor);
        self
    }

    pub fn parfactors<P: Into<Parfactor>>(mut self, parfactors: impl IntoIterator<Item = P>) -> Self {
        self.distribution.extend(parfactors);
        self
    }

    pub fn distribution(mut self, distribution: Distribution) -> Self {
        self.distribution.extend(distribution.parfactors);
        self
    }

    pub fn preservable(mut self, rvs: RandomVariableSet) -> Self {
        if !self.preservable.contains(&rvs) {
            self.preservable.push(rvs);
        }
        self
    }

    /// Shorthand for a preservable Prv without constraints.
    pub fn query(self, prv: impl Into<Prv>) -> Self {
        self.preservable(RandomVariableSet::new(prv.into(), &ConstraintSet::new()))
    }

    pub fn build(self) -> Marginal {
        Marginal {
            distribution: self.distribution,
            preservable: self.preservable,
        }
    }
}

#[cfg(test)]
#[path = "tests/distribution.rs"]
mod tests;
