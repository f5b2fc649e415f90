//! Parameterized random variables.
//!
//! A [`StdPrv`] is an atom `f(t1, .., tn)` over a finite range. A
//! [`CountingFormula`] `#_{A:C_A}[f(.., A, ..)]` groups the ground random
//! variables of its inner atom over the bound variable `A`; its values are
//! histograms counting how many individuals took each range value.

use crate::constraint::{fmt_constraints, Constraint, ConstraintSet};
use crate::cost::histogram_count;
use crate::error::{Error, Result};
use crate::subst::{Binding, Substitution};
use crate::term::{LogicalVariable, Population, Term};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;

/// Ordered set of values a random variable can take.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Range {
    values: Arc<[Arc<str>]>,
}

impl Range {
    pub fn new<'a>(values: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            values: values.into_iter().map(Arc::from).collect(),
        }
    }

    /// `{false, true}`, in that order.
    pub fn boolean() -> Self {
        Self::new(["false", "true"])
    }

    pub fn size(&self) -> usize {
        self.values.len()
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|v| v.as_ref())
    }

    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.values.iter().position(|v| v.as_ref() == value)
    }
}

/// A standard parameterized random variable `f(t1, .., tn)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StdPrv {
    functor: Arc<str>,
    terms: SmallVec<[Term; 3]>,
    range: Range,
}

impl StdPrv {
    pub fn new<T: Into<Term>>(functor: &str, range: Range, terms: impl IntoIterator<Item = T>) -> Self {
        Self {
            functor: Arc::from(functor),
            terms: terms.into_iter().map(Into::into).collect(),
            range,
        }
    }

    pub fn boolean<T: Into<Term>>(functor: &str, terms: impl IntoIterator<Item = T>) -> Self {
        Self::new(functor, Range::boolean(), terms)
    }

    pub fn functor(&self) -> &str {
        &self.functor
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    pub fn arity(&self) -> usize {
        self.terms.len()
    }

    pub fn range(&self) -> &Range {
        &self.range
    }

    pub fn range_size(&self) -> usize {
        self.range.size()
    }

    /// Distinct logical variables, in argument order.
    pub fn variables(&self) -> Vec<LogicalVariable> {
        let mut out: Vec<LogicalVariable> = Vec::new();
        for v in self.terms.iter().filter_map(Term::as_variable) {
            if !out.contains(v) {
                out.push(v.clone());
            }
        }
        out
    }

    pub fn is_ground(&self) -> bool {
        self.terms.iter().all(Term::is_constant)
    }

    pub fn contains(&self, term: &Term) -> bool {
        self.terms.contains(term)
    }

    pub fn apply(&self, subst: &Substitution) -> StdPrv {
        Self {
            functor: self.functor.clone(),
            terms: self.terms.iter().map(|t| subst.apply(t)).collect(),
            range: self.range.clone(),
        }
    }
}

impl fmt::Display for StdPrv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.functor)?;
        if self.terms.is_empty() {
            return Ok(());
        }
        f.write_str("(")?;
        for (i, t) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            t.fmt(f)?;
        }
        f.write_str(")")
    }
}

/// Counts per range value of the inner atom of a counting formula.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Histogram(SmallVec<[usize; 4]>);

impl Histogram {
    pub fn new(counts: impl IntoIterator<Item = usize>) -> Self {
        Self(counts.into_iter().collect())
    }

    pub fn counts(&self) -> &[usize] {
        &self.0
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// `n! / Π h[i]!`, the number of assignments that produce this histogram.
    pub fn multinomial(&self) -> f64 {
        let mut acc = 1.0;
        let mut seen = 0usize;
        for &h in self.0.iter() {
            for k in 1..=h {
                seen += 1;
                acc = acc * seen as f64 / k as f64;
            }
        }
        acc
    }

    /// All histograms with `buckets` buckets summing to `n`, in
    /// lexicographically descending order: `(n, 0) (n-1, 1) .. (0, n)`.
    pub fn all(buckets: usize, n: usize) -> Vec<Histogram> {
        let mut out = Vec::new();
        let mut current: SmallVec<[usize; 4]> = SmallVec::new();
        fill(buckets, n, &mut current, &mut out);
        out
    }
}

fn fill(buckets: usize, remaining: usize, current: &mut SmallVec<[usize; 4]>, out: &mut Vec<Histogram>) {
    if current.len() + 1 == buckets {
        current.push(remaining);
        out.push(Histogram(current.clone()));
        current.pop();
        return;
    }
    if buckets == 0 {
        if remaining == 0 {
            out.push(Histogram(SmallVec::new()));
        }
        return;
    }
    for first in (0..=remaining).rev() {
        current.push(first);
        fill(buckets, remaining - first, current, out);
        current.pop();
    }
}

impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, h) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", h)?;
        }
        f.write_str(")")
    }
}

/// `#_{A:C_A}[f(.., A, ..)]`.
///
/// The bound variable is local: substitutions never touch it, and every
/// constraint in `C_A` mentions it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CountingFormula {
    bound: LogicalVariable,
    inner: StdPrv,
    constraints: ConstraintSet,
}

impl CountingFormula {
    pub fn new(
        bound: LogicalVariable,
        inner: StdPrv,
        constraints: impl IntoIterator<Item = Constraint>,
    ) -> Result<Self> {
        let constraints: ConstraintSet = constraints.into_iter().collect();
        if !inner.contains(&Term::Variable(bound.clone())) {
            return Err(Error::InvalidParfactor(format!(
                "bound variable {} does not occur in {}",
                bound, inner
            )));
        }
        if let Some(c) = constraints.iter().find(|c| !c.mentions(&bound) || c.is_contradiction()) {
            return Err(Error::InvalidParfactor(format!(
                "constraint {} is not a constraint on {}",
                c, bound
            )));
        }
        Ok(Self {
            bound,
            inner,
            constraints,
        })
    }

    pub fn bound(&self) -> &LogicalVariable {
        &self.bound
    }

    pub fn inner(&self) -> &StdPrv {
        &self.inner
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    /// Individuals of the bound variable not excluded by a constant.
    pub fn individuals(&self) -> Population {
        self.bound.individuals_satisfying(&self.constraints)
    }

    fn variable_exclusions(&self) -> usize {
        self.constraints
            .iter()
            .filter(|c| c.other_side(&self.bound).is_some_and(|t| t.is_variable()))
            .count()
    }

    pub fn has_variable_constraints(&self) -> bool {
        self.variable_exclusions() > 0
    }

    /// Number of individuals counted for any grounding of the free variables.
    pub fn domain_size(&self) -> usize {
        self.individuals()
            .len()
            .saturating_sub(self.variable_exclusions())
    }

    pub fn range(&self) -> Vec<Histogram> {
        Histogram::all(self.inner.range_size(), self.domain_size())
    }

    pub fn range_size(&self) -> usize {
        histogram_count(self.domain_size(), self.inner.range_size())
            .finite()
            .map_or(usize::MAX, |n| usize::try_from(n).unwrap_or(usize::MAX))
    }

    /// Size of the range of the inner atom.
    pub fn prv_range_size(&self) -> usize {
        self.inner.range_size()
    }

    /// Free variables: those of the inner atom other than the bound one,
    /// then those only mentioned by `C_A`.
    pub fn free_variables(&self) -> Vec<LogicalVariable> {
        let mut out: Vec<LogicalVariable> = self
            .inner
            .variables()
            .into_iter()
            .filter(|v| *v != self.bound)
            .collect();
        for c in &self.constraints {
            if let Some(Term::Variable(v)) = c.other_side(&self.bound) {
                if !out.contains(&v) {
                    out.push(v);
                }
            }
        }
        out
    }

    pub fn apply(&self, subst: &Substitution) -> CountingFormula {
        let subst = subst.without(|v| *v == self.bound);
        Self {
            bound: self.bound.clone(),
            inner: self.inner.apply(&subst),
            constraints: self.constraints.iter().filter_map(|c| c.apply(&subst)).collect(),
        }
    }

    /// Rename the bound variable.
    pub fn with_bound(&self, bound: LogicalVariable) -> CountingFormula {
        let rename = Substitution::single(Binding::new(self.bound.clone(), bound.clone()));
        Self {
            inner: self.inner.apply(&rename),
            constraints: self.constraints.iter().filter_map(|c| c.apply(&rename)).collect(),
            bound,
        }
    }

    /// True if `individual` can be split out of the counted group: a
    /// constant of the population that is not excluded, or another variable
    /// over the same population that is not already excluded.
    pub fn is_expandable(&self, individual: &Term) -> bool {
        match individual {
            Term::Constant(c) => {
                !self.has_variable_constraints() && self.individuals().contains(c)
            }
            Term::Variable(v) => {
                *v != self.bound
                    && v.population() == self.bound.population()
                    && !self
                        .constraints
                        .contains(&Constraint::new(self.bound.clone(), v.clone()))
            }
        }
    }

    /// Split `individual` out of the group: returns the inner atom grounded
    /// on it and the residual formula, or None when nobody is left.
    pub fn expand(&self, individual: &Term) -> Result<(StdPrv, Option<CountingFormula>)> {
        if !self.is_expandable(individual) {
            return Err(Error::NotExpandable {
                formula: self.to_string(),
                individual: individual.to_string(),
            });
        }
        let grounded = self
            .inner
            .apply(&Substitution::single(Binding::new(self.bound.clone(), individual.clone())));
        let mut constraints = self.constraints.clone();
        constraints.insert(Constraint::new(self.bound.clone(), individual.clone()));
        let residual = Self {
            bound: self.bound.clone(),
            inner: self.inner.clone(),
            constraints,
        };
        let residual = (residual.domain_size() > 0).then_some(residual);
        Ok((grounded, residual))
    }
}

impl fmt::Display for CountingFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}:", self.bound)?;
        fmt_constraints(&self.constraints, f)?;
        write!(f, "[{}]", self.inner)
    }
}

/// A standard atom or a counting formula.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Prv {
    Standard(StdPrv),
    Counting(CountingFormula),
}

impl Prv {
    pub fn range_size(&self) -> usize {
        match self {
            Prv::Standard(p) => p.range_size(),
            Prv::Counting(cf) => cf.range_size(),
        }
    }

    /// The atom whose ground instances this random variable ranges over.
    pub fn atom(&self) -> &StdPrv {
        match self {
            Prv::Standard(p) => p,
            Prv::Counting(cf) => cf.inner(),
        }
    }

    pub fn functor(&self) -> &str {
        self.atom().functor()
    }

    pub fn free_variables(&self) -> Vec<LogicalVariable> {
        match self {
            Prv::Standard(p) => p.variables(),
            Prv::Counting(cf) => cf.free_variables(),
        }
    }

    pub fn mentions(&self, var: &LogicalVariable) -> bool {
        self.free_variables().contains(var)
    }

    pub fn bound_variable(&self) -> Option<&LogicalVariable> {
        match self {
            Prv::Standard(_) => None,
            Prv::Counting(cf) => Some(cf.bound()),
        }
    }

    pub fn is_counting(&self) -> bool {
        matches!(self, Prv::Counting(_))
    }

    pub fn as_standard(&self) -> Option<&StdPrv> {
        match self {
            Prv::Standard(p) => Some(p),
            Prv::Counting(_) => None,
        }
    }

    pub fn as_counting(&self) -> Option<&CountingFormula> {
        match self {
            Prv::Standard(_) => None,
            Prv::Counting(cf) => Some(cf),
        }
    }

    pub fn apply(&self, subst: &Substitution) -> Prv {
        match self {
            Prv::Standard(p) => Prv::Standard(p.apply(subst)),
            Prv::Counting(cf) => Prv::Counting(cf.apply(subst)),
        }
    }

    /// Syntactic equality up to the name of a counting formula's bound variable.
    pub fn same_formula(&self, other: &Prv) -> bool {
        match (self, other) {
            (Prv::Counting(a), Prv::Counting(b)) => *a == b.with_bound(a.bound().clone()),
            _ => self == other,
        }
    }
}

impl From<StdPrv> for Prv {
    fn from(p: StdPrv) -> Self {
        Prv::Standard(p)
    }
}

impl From<CountingFormula> for Prv {
    fn from(cf: CountingFormula) -> Self {
        Prv::Counting(cf)
    }
}

impl fmt::Display for Prv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Prv::Standard(p) => p.fmt(f),
            Prv::Counting(cf) => cf.fmt(f),
        }
    }
}

#[cfg(test)]
#[path = "tests/prv.rs"]
mod tests;
