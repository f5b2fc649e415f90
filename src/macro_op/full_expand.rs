use crate::cost::{full_expand_cost, Cost};
use crate::distribution::Marginal;
use crate::error::{Error, Result};
use crate::parfactor::{Parfactor, StdParfactor};
use crate::prv::CountingFormula;
use crate::term::Term;

use super::shatter::shatter;

#[cfg(feature = "tracing")]
use crate::trace::debug_span;

/// Expand a counting formula on every individual it counts, then shatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullExpand {
    parfactor: StdParfactor,
    formula: CountingFormula,
}

impl FullExpand {
    /// None unless `formula` occurs in `parfactor`, counts at least one
    /// individual, and has no inequality against another variable.
    pub fn new(parfactor: StdParfactor, formula: CountingFormula) -> Option<Self> {
        let applicable = parfactor.contains(&formula.clone().into())
            && !formula.has_variable_constraints()
            && formula.domain_size() > 0;
        applicable.then_some(Self { parfactor, formula })
    }

    pub fn parfactor(&self) -> &StdParfactor {
        &self.parfactor
    }

    pub fn formula(&self) -> &CountingFormula {
        &self.formula
    }

    /// Every counting formula of every standard parfactor that can be
    /// expanded completely.
    pub fn candidates(marginal: &Marginal) -> Vec<FullExpand> {
        let mut out = Vec::new();
        for p in marginal.distribution().sorted() {
            let Some(s) = p.as_standard() else {
                continue;
            };
            for cf in s.prvs().iter().filter_map(|q| q.as_counting()) {
                if let Some(op) = Self::new(s.clone(), cf.clone()) {
                    out.push(op);
                }
            }
        }
        out
    }

    pub fn cost(&self) -> Cost {
        full_expand_cost(
            self.parfactor.factor_size(),
            self.formula.range_size(),
            self.formula.prv_range_size(),
            self.formula.domain_size(),
        )
    }

    pub fn run(&self, marginal: &Marginal) -> Result<Marginal> {
        #[cfg(feature = "tracing")]
        let _span = debug_span!("full_expand", formula = %self.formula).entered();

        let mut expanded = self.parfactor.clone();
        let mut current = Some(self.formula.clone());
        for c in self.formula.individuals().iter() {
            let Some(cf) = current.take() else {
                break;
            };
            let individual = Term::Constant(c.clone());
            let (_, residual) = cf.expand(&individual)?;
            expanded = expanded.expand(&cf, &individual)?;
            current = residual;
        }

        let mut distribution = marginal.distribution().clone();
        if !distribution.remove(&Parfactor::Standard(self.parfactor.clone())) {
            return Err(Error::NotPresent(self.parfactor.to_string()));
        }
        if let Some(p) = expanded.normalize() {
            distribution.add(p);
        }
        shatter(&marginal.with_distribution(distribution))
    }
}
