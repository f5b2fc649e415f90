//! Parfactors: constrained, parameterized potentials.
//!
//! A [`StdParfactor`] `⟨C, V, F⟩` stands for one ground factor per grounding
//! of its logical variables that satisfies `C`. Every transformation returns
//! a new value.

use crate::aggregation::AggregationParfactor;
use crate::constraint::{
    apply_all, count_groundings, fmt_constraints, groundings, is_satisfiable, restrict_to,
    Constraint, ConstraintSet,
};
use crate::cost::Cost;
use crate::distribution::RandomVariableSet;
use crate::error::{Error, Result};
use crate::factor::{Assignment, Factor};
use crate::prv::{CountingFormula, Histogram, Prv};
use crate::subst::{Binding, Substitution};
use crate::term::{LogicalVariable, Term};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// The two halves of a split: the instance under the binding and the
/// rest, which carries the complementary inequality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitResult<P> {
    pub fragment: P,
    pub residual: P,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StdParfactor {
    constraints: ConstraintSet,
    prvs: Vec<Prv>,
    factor: Factor,
}

pub(crate) fn push_unique(out: &mut Vec<LogicalVariable>, v: &LogicalVariable) {
    if !out.contains(v) {
        out.push(v.clone());
    }
}

pub(crate) fn same_variables(a: &[LogicalVariable], b: &[LogicalVariable]) -> bool {
    a.len() == b.len() && a.iter().all(|v| b.contains(v))
}

/// `a / b` as a float, for grounding-count ratios.
fn ratio(a: Cost, b: Cost) -> f64 {
    match (a, b) {
        (_, Cost::Finite(0)) => 0.0,
        (Cost::Finite(a), Cost::Finite(b)) => a as f64 / b as f64,
        (Cost::Infinite, _) => f64::INFINITY,
        (Cost::Finite(_), Cost::Infinite) => 0.0,
    }
}

impl StdParfactor {
    pub fn builder() -> StdParfactorBuilder {
        StdParfactorBuilder::default()
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn prvs(&self) -> &[Prv] {
        &self.prvs
    }

    pub fn factor(&self) -> &Factor {
        &self.factor
    }

    pub fn sizes(&self) -> Vec<usize> {
        self.prvs.iter().map(Prv::range_size).collect()
    }

    pub fn factor_size(&self) -> usize {
        self.factor.len()
    }

    /// True if the parfactor has no random variables left.
    pub fn is_constant(&self) -> bool {
        self.prvs.is_empty()
    }

    /// Free logical variables of the Prvs.
    pub fn prv_variables(&self) -> Vec<LogicalVariable> {
        let mut out = Vec::new();
        for p in &self.prvs {
            for v in p.free_variables() {
                push_unique(&mut out, &v);
            }
        }
        out
    }

    /// Free logical variables of the Prvs, then those only in constraints.
    pub fn logical_variables(&self) -> Vec<LogicalVariable> {
        let mut out = self.prv_variables();
        for c in &self.constraints {
            for v in c.variables() {
                push_unique(&mut out, v);
            }
        }
        out
    }

    pub fn position(&self, prv: &Prv) -> Option<usize> {
        self.prvs.iter().position(|p| p == prv)
    }

    pub fn occurrences(&self, prv: &Prv) -> usize {
        self.prvs.iter().filter(|p| *p == prv).count()
    }

    pub fn contains(&self, prv: &Prv) -> bool {
        self.position(prv).is_some()
    }

    /// Groundings of the logical variables that satisfy the constraints.
    pub fn groundings(&self) -> Vec<Substitution> {
        groundings(&self.logical_variables(), &self.constraints)
    }

    pub fn grounding_count(&self) -> Cost {
        count_groundings(&self.logical_variables(), &self.constraints)
    }

    pub fn random_variable_sets(&self) -> Vec<RandomVariableSet> {
        self.prvs
            .iter()
            .map(|p| RandomVariableSet::new(p.clone(), &self.constraints))
            .collect()
    }

    /// Apply a substitution to the Prvs and the constraints. Returns None
    /// when a constraint is violated, i.e. the instance is empty.
    pub fn apply(&self, subst: &Substitution) -> Option<StdParfactor> {
        let constraints = apply_all(&self.constraints, subst)?;
        Some(Self {
            constraints,
            prvs: self.prvs.iter().map(|p| p.apply(subst)).collect(),
            factor: self.factor.clone(),
        })
    }

    /// Rebuild the table over `prvs`; `lookup` maps a new assignment to an
    /// entry of the old table.
    fn rebuild(
        &self,
        prvs: Vec<Prv>,
        constraints: ConstraintSet,
        lookup: impl FnMut(&[usize]) -> f64,
    ) -> StdParfactor {
        let sizes: Vec<usize> = prvs.iter().map(Prv::range_size).collect();
        Self {
            constraints,
            prvs,
            factor: Factor::from_fn(&sizes, lookup),
        }
    }

    pub(crate) fn replace_prv(&self, index: usize, prv: Prv) -> StdParfactor {
        let mut out = self.clone();
        out.prvs[index] = prv;
        out
    }

    // ========== COUNTING ==========

    /// True iff `lv` occurs free in exactly one Prv, that Prv is a standard
    /// atom, and `lv` ranges over the same number of individuals for every
    /// grounding of the other variables.
    pub fn is_countable(&self, lv: &LogicalVariable) -> bool {
        let mut holders = self.prvs.iter().filter(|p| p.mentions(lv));
        let holder = match (holders.next(), holders.next()) {
            (Some(p), None) => p,
            _ => return false,
        };
        if holder.is_counting() {
            return false;
        }
        let own = lv.individuals_satisfying(&self.constraints);
        let others: Vec<LogicalVariable> = self
            .constraints
            .iter()
            .filter_map(|c| c.other_side(lv))
            .filter_map(|t| t.as_variable().cloned())
            .collect();
        others.iter().enumerate().all(|(i, y)| {
            y.population() == lv.population()
                && y
                    .individuals_satisfying(&self.constraints)
                    .iter()
                    .all(|c| own.contains(c))
                && others[..i]
                    .iter()
                    .all(|z| self.constraints.contains(&Constraint::new(y.clone(), z.clone())))
        })
    }

    /// Replace the Prv holding `lv` by the counting formula over `lv`:
    /// `F'(rest, h) = Π_v F(rest, v)^h[v]`.
    pub fn count(&self, lv: &LogicalVariable) -> Result<StdParfactor> {
        if !self.is_countable(lv) {
            return Err(Error::NotCountable(lv.clone()));
        }
        let i = self
            .prvs
            .iter()
            .position(|p| p.mentions(lv))
            .ok_or_else(|| Error::NotCountable(lv.clone()))?;
        let inner = self.prvs[i]
            .as_standard()
            .cloned()
            .ok_or_else(|| Error::NotCountable(lv.clone()))?;
        let (on_lv, rest): (ConstraintSet, ConstraintSet) =
            self.constraints.iter().cloned().partition(|c| c.mentions(lv));
        let cf = CountingFormula::new(lv.clone(), inner, on_lv)?;
        let histograms = cf.range();

        #[cfg(feature = "tracing")]
        trace!(formula = %cf, histograms = histograms.len(), "count");

        let old_sizes = self.sizes();
        let mut prvs = self.prvs.clone();
        prvs[i] = Prv::Counting(cf);
        let mut old: Assignment = old_sizes.iter().map(|_| 0).collect();
        Ok(self.rebuild(prvs, rest, |a| {
            old.copy_from_slice(a);
            let mut product = 1.0;
            for (v, &n) in histograms[a[i]].counts().iter().enumerate() {
                old[i] = v;
                product *= self.factor.at(&old_sizes, &old).powi(n as i32);
            }
            product
        }))
    }

    // ========== EXPANSION ==========

    /// True iff `cf` occurs here and `individual` can be split out of it
    /// for every grounding of this parfactor.
    pub fn is_expandable(&self, cf: &CountingFormula, individual: &Term) -> bool {
        self.contains(&Prv::Counting(cf.clone()))
            && cf.is_expandable(individual)
            && match individual {
                Term::Variable(x) => self.logical_variables().contains(x),
                Term::Constant(_) => true,
            }
            && self.expansion_prerequisite(cf, individual).is_none()
    }

    /// A split that must happen before `individual` can be expanded out of
    /// `cf`: every individual excluded from the group must also be excluded
    /// from the range of `individual`.
    pub fn expansion_prerequisite(&self, cf: &CountingFormula, individual: &Term) -> Option<Binding> {
        let bound = cf.bound();
        for c in cf.constraints() {
            let excluded = match c.other_side(bound) {
                Some(t) => t,
                None => continue,
            };
            match (&excluded, individual) {
                (Term::Variable(y), t) => {
                    if !self.entails(y, t) {
                        return Some(Binding::new(y.clone(), t.clone()));
                    }
                }
                (Term::Constant(c), Term::Variable(x)) => {
                    if !self.entails(x, &excluded) {
                        return Some(Binding::new(x.clone(), c.clone()));
                    }
                }
                (Term::Constant(_), Term::Constant(_)) => {}
            }
        }
        None
    }

    /// True if the constraints guarantee `var ≠ term`.
    fn entails(&self, var: &LogicalVariable, term: &Term) -> bool {
        match term {
            Term::Constant(c) => {
                !var.population().contains(c)
                    || self.constraints.contains(&Constraint::new(var.clone(), c.clone()))
            }
            Term::Variable(v) => {
                v != var && self.constraints.contains(&Constraint::new(var.clone(), v.clone()))
            }
        }
    }

    /// Replace `cf` by its grounded instance on `individual` followed by the
    /// residual formula that excludes it.
    pub fn expand(&self, cf: &CountingFormula, individual: &Term) -> Result<StdParfactor> {
        let i = self
            .position(&Prv::Counting(cf.clone()))
            .filter(|_| self.is_expandable(cf, individual))
            .ok_or_else(|| Error::NotExpandable {
                formula: cf.to_string(),
                individual: individual.to_string(),
            })?;
        let (grounded, residual) = cf.expand(individual)?;

        #[cfg(feature = "tracing")]
        trace!(formula = %cf, %individual, "expand");

        let old_sizes = self.sizes();
        let old_range = cf.range();
        let index: FxHashMap<&Histogram, usize> =
            old_range.iter().enumerate().map(|(k, h)| (h, k)).collect();
        let residual_range = residual.as_ref().map(CountingFormula::range);
        let buckets = cf.prv_range_size();
        let shift = usize::from(residual.is_some());

        let mut prvs = Vec::with_capacity(self.prvs.len() + shift);
        prvs.extend_from_slice(&self.prvs[..i]);
        prvs.push(Prv::Standard(grounded));
        if let Some(r) = residual {
            prvs.push(Prv::Counting(r));
        }
        prvs.extend_from_slice(&self.prvs[i + 1..]);

        let mut old: Assignment = old_sizes.iter().map(|_| 0).collect();
        Ok(self.rebuild(prvs, self.constraints.clone(), |a| {
            let mut counts: SmallVec<[usize; 4]> = match &residual_range {
                Some(range) => range[a[i + 1]].counts().iter().copied().collect(),
                None => (0..buckets).map(|_| 0).collect(),
            };
            counts[a[i]] += 1;
            let h = Histogram::new(counts);
            old[..i].copy_from_slice(&a[..i]);
            old[i] = index.get(&h).copied().unwrap_or(0);
            old[i + 1..].copy_from_slice(&a[i + 1 + shift..]);
            self.factor.at(&old_sizes, &old)
        }))
    }

    // ========== MULTIPLICATION ==========

    /// Two parfactors multiply when they range over the same logical
    /// variables under the same constraints, so their groundings coincide.
    pub fn is_multipliable(&self, other: &StdParfactor) -> bool {
        self.constraints == other.constraints
            && same_variables(&self.logical_variables(), &other.logical_variables())
    }

    /// Pointwise product over the union of the Prvs.
    pub fn multiply(&self, other: &StdParfactor) -> Result<StdParfactor> {
        if !self.is_multipliable(other) {
            return Err(Error::NotMultipliable(format!("{} and {}", self, other)));
        }
        let mut prvs = self.prvs.clone();
        let positions: Vec<usize> = other
            .prvs
            .iter()
            .map(|p| match prvs.iter().position(|q| q == p) {
                Some(k) => k,
                None => {
                    prvs.push(p.clone());
                    prvs.len() - 1
                }
            })
            .collect();
        let own_sizes = self.sizes();
        let other_sizes = other.sizes();
        let n = self.prvs.len();
        let mut projected: Assignment = positions.iter().map(|_| 0).collect();
        Ok(self.rebuild(prvs, self.constraints.clone(), |a| {
            for (slot, &k) in projected.iter_mut().zip(&positions) {
                *slot = a[k];
            }
            self.factor.at(&own_sizes, &a[..n]) * other.factor.at(&other_sizes, &projected)
        }))
    }

    /// Product of the parfactor with an identical copy of itself.
    pub fn squared(&self) -> StdParfactor {
        Self {
            factor: self.factor.map(|v| v * v),
            ..self.clone()
        }
    }

    // ========== SPLITTING ==========

    /// True iff the binding's source is a logical variable of this parfactor,
    /// its target is a legal value for it that the constraints do not already
    /// exclude, and the instance under the binding is not empty.
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

    pub fn split_on(&self, binding: &Binding) -> Result<SplitResult<StdParfactor>> {
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

    // ========== SUM OUT ==========

    /// Sum `prv` out of the table.
    ///
    /// Counting formulas weigh every histogram by its multinomial
    /// coefficient. Variables that only occur in constraints raise the table
    /// to their number of groundings first; variables that vanish with `prv`
    /// raise the summed table to theirs.
    pub fn sum_out(&self, prv: &Prv) -> Result<StdParfactor> {
        let i = match self.occurrences(prv) {
            0 => return Err(Error::NotPresent(prv.to_string())),
            1 => self.position(prv).ok_or_else(|| Error::NotPresent(prv.to_string()))?,
            _ => return Err(Error::NotEliminable(prv.to_string())),
        };
        let all = self.logical_variables();
        let in_prvs = self.prv_variables();
        let mut remaining_prvs = self.prvs.clone();
        remaining_prvs.remove(i);
        let mut remaining = Vec::new();
        for p in &remaining_prvs {
            for v in p.free_variables() {
                push_unique(&mut remaining, &v);
            }
        }
        let before = ratio(
            count_groundings(&all, &self.constraints),
            count_groundings(&in_prvs, &self.constraints),
        );
        let after = ratio(
            count_groundings(&in_prvs, &self.constraints),
            count_groundings(&remaining, &self.constraints),
        );
        let weights: Vec<f64> = match prv {
            Prv::Counting(cf) => cf.range().iter().map(Histogram::multinomial).collect(),
            Prv::Standard(p) => vec![1.0; p.range_size()],
        };

        #[cfg(feature = "tracing")]
        trace!(%prv, before, after, "sum_out");

        let old_sizes = self.sizes();
        let constraints = restrict_to(&self.constraints, &remaining);
        let mut old: Assignment = old_sizes.iter().map(|_| 0).collect();
        Ok(self.rebuild(remaining_prvs, constraints, |a| {
            old[..i].copy_from_slice(&a[..i]);
            old[i + 1..].copy_from_slice(&a[i..]);
            let mut total = 0.0;
            for (v, w) in weights.iter().enumerate() {
                old[i] = v;
                let entry = self.factor.at(&old_sizes, &old);
                total += w * if before == 1.0 { entry } else { entry.powf(before) };
            }
            if after == 1.0 {
                total
            } else {
                total.powf(after)
            }
        }))
    }

    // ========== NORMAL FORM ==========

    /// Bring the parfactor into normal form:
    /// - None if no grounding satisfies the constraints
    /// - a logical variable with one remaining individual becomes that constant
    /// - counting formulas over zero or one individual are dropped or grounded
    /// - repeated occurrences of the same Prv are merged on the diagonal
    pub fn normalize(self) -> Option<StdParfactor> {
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
                None => break,
            }
        }
        Some(current.simplify_counting().merge_duplicates())
    }

    fn simplify_counting(self) -> StdParfactor {
        let mut current = self;
        loop {
            let found = current.prvs.iter().enumerate().find_map(|(i, p)| {
                let cf = p.as_counting()?;
                match cf.domain_size() {
                    0 => Some((i, None)),
                    1 if !cf.has_variable_constraints() => cf.individuals().individual_at(0).map(|c| {
                        let b = Binding::new(cf.bound().clone(), c.clone());
                        (i, Some(cf.inner().apply(&Substitution::single(b))))
                    }),
                    _ => None,
                }
            });
            current = match found {
                None => return current,
                Some((i, None)) => current.drop_dimension(i, 0),
                Some((i, Some(grounded))) => current.replace_prv(i, Prv::Standard(grounded)),
            };
        }
    }

    /// Fix Prv `i` to `value` and remove it.
    fn drop_dimension(&self, i: usize, value: usize) -> StdParfactor {
        let old_sizes = self.sizes();
        let mut prvs = self.prvs.clone();
        prvs.remove(i);
        let mut old: Assignment = old_sizes.iter().map(|_| 0).collect();
        self.rebuild(prvs, self.constraints.clone(), |a| {
            old[..i].copy_from_slice(&a[..i]);
            old[i] = value;
            old[i + 1..].copy_from_slice(&a[i..]);
            self.factor.at(&old_sizes, &old)
        })
    }

    fn merge_duplicates(self) -> StdParfactor {
        let mut current = self;
        loop {
            let found = (0..current.prvs.len()).find_map(|j| {
                current.prvs[..j]
                    .iter()
                    .position(|p| *p == current.prvs[j])
                    .map(|i| (i, j))
            });
            let (i, j) = match found {
                Some(pair) => pair,
                None => return current,
            };
            let old_sizes = current.sizes();
            let mut prvs = current.prvs.clone();
            prvs.remove(j);
            let mut old: Assignment = old_sizes.iter().map(|_| 0).collect();
            current = current.rebuild(prvs, current.constraints.clone(), |a| {
                old[..j].copy_from_slice(&a[..j]);
                old[j] = a[i];
                old[j + 1..].copy_from_slice(&a[j..]);
                current.factor.at(&old_sizes, &old)
            });
        }
    }

    /// A split that establishes the normal form of the constraints: for
    /// every `X ≠ Y`, both variables exclude the same constants.
    pub fn normal_form_violation(&self) -> Option<Binding> {
        for c in &self.constraints {
            let y = match c.second().as_variable() {
                Some(y) => y,
                None => continue,
            };
            let x = c.first();
            if x.population() != y.population() {
                continue;
            }
            let dx = x.individuals_satisfying(&self.constraints);
            let dy = y.individuals_satisfying(&self.constraints);
            if let Some(k) = dx.iter().find(|k| !dy.contains(k)) {
                return Some(Binding::new(x.clone(), k.clone()));
            }
            if let Some(k) = dy.iter().find(|k| !dx.contains(k)) {
                return Some(Binding::new(y.clone(), k.clone()));
            };
        }
        None
    }
}

impl fmt::Display for StdParfactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<")?;
        fmt_constraints(&self.constraints, f)?;
        f.write_str(", [")?;
        for (i, p) in self.prvs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            p.fmt(f)?;
        }
        f.write_str("], [")?;
        for (i, v) in self.factor.values().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", v)?;
        }
        f.write_str("]>")
    }
}

/// Assembles and validates a [`StdParfactor`].
///
/// Without explicit values the factor is all ones.
#[derive(Debug, Clone, Default)]
pub struct StdParfactorBuilder {
    constraints: ConstraintSet,
    prvs: Vec<Prv>,
    factor: Option<Factor>,
}

impl StdParfactorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constraint(mut self, c: Constraint) -> Self {
        self.constraints.insert(c);
        self
    }

    pub fn constraints(mut self, cs: impl IntoIterator<Item = Constraint>) -> Self {
        self.constraints.extend(cs);
        self
    }

    pub fn prv(mut self, prv: impl Into<Prv>) -> Self {
        self.prvs.push(prv.into());
        self
    }

    pub fn prvs<P: Into<Prv>>(mut self, prvs: impl IntoIterator<Item = P>) -> Self {
        self.prvs.extend(prvs.into_iter().map(Into::into));
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

    pub fn build(self) -> Result<StdParfactor> {
        let expected = self
            .prvs
            .iter()
            .try_fold(1usize, |acc, p| acc.checked_mul(p.range_size()))
            .ok_or_else(|| Error::InvalidParfactor("factor size overflows".to_string()))?;
        let factor = self.factor.unwrap_or_else(|| Factor::ones(expected));
        factor.check_size(expected)?;
        if let Some(c) = self.constraints.iter().find(|c| c.is_contradiction()) {
            return Err(Error::InvalidParfactor(format!("constraint {} is never satisfied", c)));
        }
        for cf in self.prvs.iter().filter_map(Prv::as_counting) {
            let bound = cf.bound();
            let free_elsewhere = self.prvs.iter().any(|p| p.mentions(bound))
                || self.constraints.iter().any(|c| c.mentions(bound));
            if free_elsewhere {
                return Err(Error::InvalidParfactor(format!(
                    "bound variable {} of {} also occurs free",
                    bound, cf
                )));
            }
        }
        Ok(StdParfactor {
            constraints: self.constraints,
            prvs: self.prvs,
            factor,
        })
    }
}

/// Closed set of parfactor kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Parfactor {
    Standard(StdParfactor),
    Aggregation(AggregationParfactor),
}

impl Parfactor {
    pub fn constraints(&self) -> &ConstraintSet {
        match self {
            Parfactor::Standard(p) => p.constraints(),
            Parfactor::Aggregation(a) => a.constraints(),
        }
    }

    pub fn prvs(&self) -> Vec<Prv> {
        match self {
            Parfactor::Standard(p) => p.prvs().to_vec(),
            Parfactor::Aggregation(a) => a.prvs(),
        }
    }

    /// Logical variables that splits may bind. The extra variable of an
    /// aggregation parfactor is not one of them.
    pub fn logical_variables(&self) -> Vec<LogicalVariable> {
        match self {
            Parfactor::Standard(p) => p.logical_variables(),
            Parfactor::Aggregation(a) => a.logical_variables(),
        }
    }

    pub fn factor_size(&self) -> usize {
        match self {
            Parfactor::Standard(p) => p.factor_size(),
            Parfactor::Aggregation(a) => a.factor().len(),
        }
    }

    pub fn as_standard(&self) -> Option<&StdParfactor> {
        match self {
            Parfactor::Standard(p) => Some(p),
            Parfactor::Aggregation(_) => None,
        }
    }

    pub fn as_aggregation(&self) -> Option<&AggregationParfactor> {
        match self {
            Parfactor::Standard(_) => None,
            Parfactor::Aggregation(a) => Some(a),
        }
    }

    pub fn is_aggregation(&self) -> bool {
        matches!(self, Parfactor::Aggregation(_))
    }

    pub fn random_variable_sets(&self) -> Vec<RandomVariableSet> {
        match self {
            Parfactor::Standard(p) => p.random_variable_sets(),
            Parfactor::Aggregation(a) => a.random_variable_sets(),
        }
    }

    pub fn apply(&self, subst: &Substitution) -> Option<Parfactor> {
        match self {
            Parfactor::Standard(p) => p.apply(subst).map(Parfactor::Standard),
            Parfactor::Aggregation(a) => a.apply(subst).map(Parfactor::Aggregation),
        }
    }

    pub fn is_splittable(&self, binding: &Binding) -> bool {
        match self {
            Parfactor::Standard(p) => p.is_splittable(binding),
            Parfactor::Aggregation(a) => a.is_splittable(binding),
        }
    }

    pub fn split_on(&self, binding: &Binding) -> Result<SplitResult<Parfactor>> {
        Ok(match self {
            Parfactor::Standard(p) => {
                let r = p.split_on(binding)?;
                SplitResult {
                    fragment: Parfactor::Standard(r.fragment),
                    residual: Parfactor::Standard(r.residual),
                }
            }
            Parfactor::Aggregation(a) => {
                let r = a.split_on(binding)?;
                SplitResult {
                    fragment: Parfactor::Aggregation(r.fragment),
                    residual: Parfactor::Aggregation(r.residual),
                }
            }
        })
    }

    pub fn normalize(self) -> Option<Parfactor> {
        match self {
            Parfactor::Standard(p) => p.normalize().map(Parfactor::Standard),
            Parfactor::Aggregation(a) => a.normalize().map(Parfactor::Aggregation),
        }
    }

    /// Two identical parfactors in one product collapse into this one.
    pub fn squared(&self) -> Parfactor {
        match self {
            Parfactor::Standard(p) => Parfactor::Standard(p.squared()),
            Parfactor::Aggregation(a) => Parfactor::Aggregation(a.squared()),
        }
    }
}

impl From<StdParfactor> for Parfactor {
    fn from(p: StdParfactor) -> Self {
        Parfactor::Standard(p)
    }
}

impl From<AggregationParfactor> for Parfactor {
    fn from(a: AggregationParfactor) -> Self {
        Parfactor::Aggregation(a)
    }
}

impl fmt::Display for Parfactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parfactor::Standard(p) => p.fmt(f),
            Parfactor::Aggregation(a) => a.fmt(f),
        }
    }
}

#[cfg(test)]
#[path = "tests/parfactor.rs"]
mod tests;
