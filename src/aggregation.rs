//! Aggregation parfactors.
//!
//! `⟨C, p(.., A, ..), c(..), F_p, ⊗, context⟩` says that every ground child
//! `c(..)` is the aggregation `⊗` of its parents `p(.., a, ..)` over the
//! individuals `a` of the extra variable `A`. `F_p` weighs the parents
//! together with the context Prvs.

use crate::constraint::{apply_all, fmt_constraints, is_satisfiable, Constraint, ConstraintSet};
use crate::distribution::RandomVariableSet;
use crate::error::{Error, Result};
use crate::factor::Factor;
use crate::parfactor::{push_unique, SplitResult, StdParfactor};
use crate::prv::{CountingFormula, Histogram, Prv, StdPrv};
use crate::subst::{Binding, Substitution};
use crate::term::{LogicalVariable, Term};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic aggregation over an ordered range.
///
/// `Or` and `And` are `Max` and `Min` over `false < true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operator {
    Or,
    And,
    Max,
    Min,
}

impl Operator {
    /// Index of the aggregated value of a histogram over `buckets` values.
    /// The empty histogram yields the operator's identity.
    pub fn over_histogram(&self, histogram: &Histogram) -> usize {
        let counts = histogram.counts();
        let last = counts.len().saturating_sub(1);
        match self {
            Operator::Or | Operator::Max => counts.iter().rposition(|&n| n > 0).unwrap_or(0),
            Operator::And | Operator::Min => counts.iter().position(|&n| n > 0).unwrap_or(last),
        }
    }

    /// Aggregate a list of value indices. None if a value is not below
    /// `buckets`.
    pub fn apply(&self, values: impl IntoIterator<Item = usize>, buckets: usize) -> Option<usize> {
        let mut counts = vec![0; buckets];
        for v in values {
            *counts.get_mut(v)? += 1;
        }
        Some(self.over_histogram(&Histogram::new(counts)))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operator::Or => "OR",
            Operator::And => "AND",
            Operator::Max => "MAX",
            Operator::Min => "MIN",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AggregationParfactor {
    constraints: ConstraintSet,
    parent: StdPrv,
    child: StdPrv,
    context: Vec<StdPrv>,
    factor: Factor,
    operator: Operator,
    extra: LogicalVariable,
}

impl AggregationParfactor {
    pub fn builder(parent: StdPrv, child: StdPrv, operator: Operator) -> AggregationParfactorBuilder {
        AggregationParfactorBuilder {
            parent,
            child,
            operator,
            context: Vec::new(),
            constraints: ConstraintSet::new(),
            factor: None,
        }
    }

    pub fn parent(&self) -> &StdPrv {
        &self.parent
    }

    pub fn child(&self) -> &StdPrv {
        &self.child
    }

    pub fn context(&self) -> &[StdPrv] {
        &self.context
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// The parent variable that does not occur in the child.
    pub fn extra_variable(&self) -> &LogicalVariable {
        &self.extra
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    /// Weights over the parent and the context Prvs.
    pub fn factor(&self) -> &Factor {
        &self.factor
    }

    pub fn constraints_on_extra(&self) -> ConstraintSet {
        self.constraints
            .iter()
            .filter(|c| c.mentions(&self.extra))
            .cloned()
            .collect()
    }

    pub fn constraints_not_on_extra(&self) -> ConstraintSet {
        self.constraints
            .iter()
            .filter(|c| !c.mentions(&self.extra))
            .cloned()
            .collect()
    }

    /// Parent, child, then context.
    pub fn prvs(&self) -> Vec<Prv> {
        let mut out = vec![Prv::Standard(self.parent.clone()), Prv::Standard(self.child.clone())];
        out.extend(self.context.iter().cloned().map(Prv::Standard));
        out
    }

    /// Logical variables other than the extra one.
    pub fn logical_variables(&self) -> Vec<LogicalVariable> {
        let mut out = Vec::new();
        for p in std::iter::once(&self.parent)
            .chain(std::iter::once(&self.child))
            .chain(self.context.iter())
        {
            for v in p.variables() {
                push_unique(&mut out, &v);
            }
        }
        for c in &self.constraints {
            for v in c.variables() {
                push_unique(&mut out, v);
            }
        }
        out.retain(|v| *v != self.extra);
        out
    }

    pub fn random_variable_sets(&self) -> Vec<RandomVariableSet> {
        self.prvs()
            .into_iter()
            .map(|p| RandomVariableSet::new(p, &self.constraints))
            .collect()
    }

    /// Apply a substitution; the extra variable is local and never bound.
    pub fn apply(&self, subst: &Substitution) -> Option<AggregationParfactor> {
        let subst = subst.without(|v| *v == self.extra);
        Some(Self {
            constraints: apply_all(&self.constraints, &subst)?,
            parent: self.parent.apply(&subst),
            child: self.child.apply(&subst),
            context: self.context.iter().map(|p| p.apply(&subst)).collect(),
            factor: self.factor.clone(),
            operator: self.operator,
            extra: self.extra.clone(),
        })
    }

    /// The deterministic part is idempotent, so only the parent weights
    /// are squared.
    pub fn squared(&self) -> AggregationParfactor {
        Self {
            factor: self.factor.map(|v| v * v),
            ..self.clone()
        }
    }

    /// Splits never touch the extra variable; overlaps on it are resolved by
    /// converting to standard parfactors first.
    pub fn is_splittable(&self, binding: &Binding) -> bool {
        let vars = self.logical_variables();
        let x = binding.source();
        if binding.is_trivial() || !vars.contains(x) {
            return false;
        }
        let target_ok = match binding.target() {
            Term::Constant(c) => x.population().contains(c),
            Term::Variable(y) => vars.contains(y) && y.population() == x.population(),
        };
        target_ok
            && !self.constraints.contains(&Constraint::from_binding(binding))
            && apply_all(&self.constraints, &Substitution::single(binding.clone())).is_some()
    }

    pub fn split_on(&self, binding: &Binding) -> Result<SplitResult<AggregationParfactor>> {
        if !self.is_splittable(binding) {
            return Err(Error::NotSplittable(binding.to_string()));
        }
        let fragment = self
            .apply(&Substitution::single(binding.clone()))
            .ok_or_else(|| Error::NotSplittable(binding.to_string()))?;
        let mut residual = self.clone();
        residual.constraints.insert(Constraint::from_binding(binding));
        Ok(SplitResult { fragment, residual })
    }

    /// None if no grounding of the free variables satisfies the
    /// constraints; free variables with a single individual become constants.
    pub fn normalize(self) -> Option<AggregationParfactor> {
        let mut current = self;
        loop {
            let vars = current.logical_variables();
            if !is_satisfiable(&vars, &current.constraints) {
                return None;
            }
            let singleton = vars.iter().find_map(|v| {
                let domain = v.individuals_satisfying(&current.constraints);
                if domain.len() == 1 {
                    domain.individual_at(0).map(|c| Binding::new(v.clone(), c.clone()))
                } else {
                    None
                }
            });
            match singleton {
                Some(b) => current = current.apply(&Substitution::single(b))?,
                None => return Some(current),
            }
        }
    }

    /// Equivalent standard parfactors:
    /// `⟨C, [p, context..], F_p⟩` (left out when `F_p` is all ones) and
    /// `⟨C \ C_A, [#_{A:C_A}[p], c], F_⊗⟩` with `F_⊗(h, v) = 1` iff `⊗(h) = v`.
    pub fn to_std_parfactors(&self) -> Result<Vec<StdParfactor>> {
        let mut out = Vec::with_capacity(2);
        if !self.factor.is_all_ones() {
            out.push(
                StdParfactor::builder()
                    .constraints(self.constraints.iter().cloned())
                    .prv(self.parent.clone())
                    .prvs(self.context.iter().cloned())
                    .factor(self.factor.clone())
                    .build()?,
            );
        }
        let cf = CountingFormula::new(self.extra.clone(), self.parent.clone(), self.constraints_on_extra())?;
        let histograms = cf.range();
        let buckets = self.child.range_size();
        let op = self.operator;
        let values = histograms.iter().flat_map(|h| {
            let v = op.over_histogram(h);
            (0..buckets).map(move |c| if c == v { 1.0 } else { 0.0 })
        });
        out.push(
            StdParfactor::builder()
                .constraints(self.constraints_not_on_extra())
                .prv(cf)
                .prv(self.child.clone())
                .values(values)
                .build()?,
        );
        Ok(out)
    }
}

impl fmt::Display for AggregationParfactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<")?;
        fmt_constraints(&self.constraints, f)?;
        write!(f, ", {}, {}, {}", self.parent, self.child, self.operator)?;
        if !self.context.is_empty() {
            f.write_str(", [")?;
            for (i, p) in self.context.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                p.fmt(f)?;
            }
            f.write_str("]")?;
        }
        f.write_str(">")
    }
}

/// Assembles and validates an [`AggregationParfactor`].
#[derive(Debug, Clone)]
pub struct AggregationParfactorBuilder {
    parent: StdPrv,
    child: StdPrv,
    operator: Operator,
    context: Vec<StdPrv>,
    constraints: ConstraintSet,
    factor: Option<Factor>,
}

impl AggregationParfactorBuilder {
    pub fn context(mut self, prv: StdPrv) -> Self {
        self.context.push(prv);
        self
    }

    pub fn constraint(mut self, c: Constraint) -> Self {
        self.constraints.insert(c);
        self
    }

    pub fn constraints(mut self, cs: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints.extend(cs);
        self
    }

    pub fn values(mut self, values: impl IntoIterator<Item = f64>) -> Self {
        self.factor = Some(Factor::new(values));
        self
    }

    pub fn factor(mut self, factor: Factor) -> Self {
        self.factor = Some(factor);
        self
    }

    pub fn build(self) -> Result<AggregationParfactor> {
        let child_vars = self.child.variables();
        let mut extra = self
            .parent
            .variables()
            .into_iter()
            .filter(|v| !child_vars.contains(v));
        let extra = match (extra.next(), extra.next()) {
            (Some(a), None) => a,
            _ => {
                return Err(Error::InvalidAggregation(format!(
                    "{} must have exactly one variable not in {}",
                    self.parent, self.child
                )))
            }
        };
        if let Some(v) = child_vars.iter().find(|v| !self.parent.variables().contains(v)) {
            return Err(Error::InvalidAggregation(format!(
                "child variable {} does not occur in {}",
                v, self.parent
            )));
        }
        if self.parent.range() != self.child.range() {
            return Err(Error::InvalidAggregation(format!(
                "{} and {} have different ranges",
                self.parent, self.child
            )));
        }
        if let Some(p) = self.context.iter().find(|p| p.variables().contains(&extra)) {
            return Err(Error::InvalidAggregation(format!(
                "context {} mentions the extra variable {}",
                p, extra
            )));
        }
        let expected = self
            .context
            .iter()
            .fold(self.parent.range_size(), |acc, p| acc.saturating_mul(p.range_size()));
        let factor = self.factor.unwrap_or_else(|| Factor::ones(expected));
        factor.check_size(expected)?;
        Ok(AggregationParfactor {
            constraints: self.constraints,
            parent: self.parent,
            child: self.child,
            context: self.context,
            factor,
            operator: self.operator,
            extra,
        })
    }
}

#[cfg(test)]
#[path = "tests/aggregation.rs"]
mod tests;
