use crate::cost::{histogram_count, Cost};
use crate::distribution::{Marginal, RandomVariableSet};
use crate::error::{Error, Result};
use crate::parfactor::{Parfactor, StdParfactor};
use crate::term::LogicalVariable;

#[cfg(feature = "tracing")]
use crate::trace::debug_span;

/// Replace the Prv holding a countable logical variable by a counting
/// formula over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountingConvert {
    parfactor: StdParfactor,
    variable: LogicalVariable,
}

impl CountingConvert {
    /// None unless `variable` is countable in `parfactor`, some other Prv of
    /// the parfactor does not mention it, and the Prv holding it is not
    /// preservable.
    pub fn new(marginal: &Marginal, parfactor: StdParfactor, variable: LogicalVariable) -> Option<Self> {
        if !parfactor.is_countable(&variable) {
            return None;
        }
        let holder = parfactor.prvs().iter().find(|p| p.mentions(&variable))?;
        if !parfactor.prvs().iter().any(|p| !p.mentions(&variable)) {
            return None;
        }
        let rvs = RandomVariableSet::new(holder.clone(), parfactor.constraints());
        if marginal.is_preservable(&rvs) {
            return None;
        }
        Some(Self { parfactor, variable })
    }

    pub fn parfactor(&self) -> &StdParfactor {
        &self.parfactor
    }

    pub fn variable(&self) -> &LogicalVariable {
        &self.variable
    }

    pub fn candidates(marginal: &Marginal) -> Vec<CountingConvert> {
        let mut out = Vec::new();
        for p in marginal.distribution().sorted() {
            let Some(s) = p.as_standard() else {
                continue;
            };
            for lv in s.prv_variables() {
                if let Some(op) = Self::new(marginal, s.clone(), lv) {
                    out.push(op);
                }
            }
        }
        out
    }

    /// Size of the factor after conversion:
    /// `|F| / |range(holder)| * #histograms`.
    pub fn cost(&self) -> Cost {
        let Some(holder) = self.parfactor.prvs().iter().find(|p| p.mentions(&self.variable)) else {
            return Cost::Infinite;
        };
        let constraints = self.parfactor.constraints();
        let excluded_vars = constraints
            .iter()
            .filter(|c| c.other_side(&self.variable).is_some_and(|t| t.is_variable()))
            .count();
        let domain = self
            .variable
            .individuals_satisfying(constraints)
            .len()
            .saturating_sub(excluded_vars);
        let rest = self.parfactor.factor_size() / holder.range_size().max(1);
        Cost::from(rest).saturating_mul(histogram_count(domain, holder.range_size()))
    }

    pub fn run(&self, marginal: &Marginal) -> Result<Marginal> {
        #[cfg(feature = "tracing")]
        let _span = debug_span!("counting_convert", variable = %self.variable).entered();

        let counted = self.parfactor.count(&self.variable)?;
        let mut distribution = marginal.distribution().clone();
        if !distribution.remove(&Parfactor::Standard(self.parfactor.clone())) {
            return Err(Error::NotPresent(self.parfactor.to_string()));
        }
        if let Some(p) = counted.normalize() {
            distribution.add(p);
        }
        Ok(marginal.with_distribution(distribution))
    }
}
