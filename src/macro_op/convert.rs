use crate::aggregation::AggregationParfactor;
use crate::cost::Cost;
use crate::distribution::Marginal;
use crate::error::{Error, Result};
use crate::parfactor::Parfactor;

#[cfg(feature = "tracing")]
use crate::trace::debug_span;

/// Replace an aggregation parfactor by its equivalent standard parfactors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertAggregation {
    parfactor: AggregationParfactor,
}

impl ConvertAggregation {
    pub fn new(parfactor: AggregationParfactor) -> Self {
        Self { parfactor }
    }

    pub fn parfactor(&self) -> &AggregationParfactor {
        &self.parfactor
    }

    pub fn candidates(marginal: &Marginal) -> Vec<ConvertAggregation> {
        marginal
            .distribution()
            .sorted()
            .into_iter()
            .filter_map(Parfactor::as_aggregation)
            .cloned()
            .map(Self::new)
            .collect()
    }

    pub fn cost(&self) -> Cost {
        Cost::ZERO
    }

    pub fn run(&self, marginal: &Marginal) -> Result<Marginal> {
        #[cfg(feature = "tracing")]
        let _span = debug_span!("convert_aggregation", parfactor = %self.parfactor).entered();

        let mut distribution = marginal.distribution().clone();
        if !distribution.remove(&Parfactor::Aggregation(self.parfactor.clone())) {
            return Err(Error::NotPresent(self.parfactor.to_string()));
        }
        for p in self.parfactor.to_std_parfactors()? {
            if let Some(p) = p.normalize() {
                distribution.add(p);
            }
        }
        Ok(marginal.with_distribution(distribution))
    }
}
