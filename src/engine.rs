//! Engine - the elimination driver.
//!
//! Each step picks one macro-operation for the current marginal:
//! 1. Convert a remaining aggregation parfactor
//! 2. Shatter, if any two occurrences still partially overlap
//! 3. The cheapest lifted operation (sum-out, counting, expansion)
//! 4. Otherwise the cheapest propositionalization
//!
//! Ties on cost go to the operation kind with the lower priority number.

use crate::cost::Cost;
use crate::distribution::Marginal;
use crate::error::{Error, Result};
use crate::macro_op::{
    is_shattered, ConvertAggregation, CountingConvert, FullExpand, GlobalSumOut, MacroOperation,
    OperationKind, Propositionalize, Shatter,
};
use crate::metrics::EngineMetrics;
use crate::parfactor::StdParfactor;

#[cfg(feature = "tracing")]
use crate::trace::{debug, debug_span, info};

/// Factor entries an operation may build unless configured otherwise.
pub const DEFAULT_MAX_FACTOR_SIZE: Cost = Cost::Finite(1 << 24);

/// Configuration for the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Steps allowed before giving up.
    pub max_steps: usize,
    /// Largest factor an operation may build; None means unlimited.
    pub max_factor_size: Option<Cost>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: 10_000,
            max_factor_size: Some(DEFAULT_MAX_FACTOR_SIZE),
        }
    }
}

impl EngineConfig {
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_max_factor_size(mut self, limit: Cost) -> Self {
        self.max_factor_size = Some(limit);
        self
    }

    pub fn without_factor_size_limit(mut self) -> Self {
        self.max_factor_size = None;
        self
    }

    fn admits(&self, cost: Cost) -> bool {
        self.max_factor_size.map_or(true, |limit| cost <= limit)
    }
}

/// Result of a single step of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepResult {
    /// An operation ran and replaced the marginal.
    Applied { kind: OperationKind, cost: Cost },
    /// Only preservable random variables remain.
    Done,
}

/// Elimination driver over one marginal.
pub struct Engine {
    marginal: Marginal,
    config: EngineConfig,
    steps: usize,
    /// Kind and cost of every applied operation, in order.
    history: Vec<(OperationKind, Cost)>,
    metrics: EngineMetrics,
}

impl Engine {
    pub fn new(marginal: Marginal, config: EngineConfig) -> Self {
        Self {
            marginal,
            config,
            steps: 0,
            history: Vec::new(),
            metrics: EngineMetrics::new(),
        }
    }

    pub fn with_defaults(marginal: Marginal) -> Self {
        Self::new(marginal, EngineConfig::default())
    }

    pub fn marginal(&self) -> &Marginal {
        &self.marginal
    }

    pub fn into_marginal(self) -> Marginal {
        self.marginal
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn history(&self) -> &[(OperationKind, Cost)] {
        &self.history
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn is_done(&self) -> bool {
        self.marginal.is_done()
    }

    /// The operation the next step would run, or None once done.
    pub fn next_operation(&self) -> Result<Option<MacroOperation>> {
        let m = &self.marginal;
        if m.is_done() {
            return Ok(None);
        }
        if let Some(op) = ConvertAggregation::candidates(m).into_iter().next() {
            return Ok(Some(op.into()));
        }
        if !is_shattered(m)? {
            return Ok(Some(Shatter::new().into()));
        }

        let mut smallest_rejected = None;
        let lifted = GlobalSumOut::candidates(m)
            .into_iter()
            .map(MacroOperation::from)
            .chain(CountingConvert::candidates(m).into_iter().map(MacroOperation::from))
            .chain(FullExpand::candidates(m).into_iter().map(MacroOperation::from));
        if let Some(op) = self.cheapest(lifted, &mut smallest_rejected) {
            return Ok(Some(op));
        }
        let grounding = Propositionalize::candidates(m)
            .into_iter()
            .map(MacroOperation::from);
        if let Some(op) = self.cheapest(grounding, &mut smallest_rejected) {
            return Ok(Some(op));
        }

        match (smallest_rejected, self.config.max_factor_size) {
            (Some(cost), Some(limit)) => Err(Error::FactorTooLarge { cost, limit }),
            _ => Err(Error::Stalled),
        }
    }

    /// Cheapest admissible candidate; the cost of the cheapest rejected one
    /// is kept in `smallest_rejected`.
    fn cheapest(
        &self,
        candidates: impl Iterator<Item = MacroOperation>,
        smallest_rejected: &mut Option<Cost>,
    ) -> Option<MacroOperation> {
        let mut best: Option<((Cost, u8), MacroOperation)> = None;
        let mut rejected = 0u64;
        for op in candidates {
            let rank = op.rank();
            if !self.config.admits(rank.0) {
                rejected += 1;
                *smallest_rejected = Some(smallest_rejected.map_or(rank.0, |c| c.min(rank.0)));
                continue;
            }
            if best.as_ref().map_or(true, |(r, _)| rank < *r) {
                best = Some((rank, op));
            }
        }
        self.metrics.record_rejected(rejected);
        best.map(|(_, op)| op)
    }

    /// Run one operation.
    pub fn step(&mut self) -> Result<StepResult> {
        let op = match self.next_operation()? {
            Some(op) => op,
            None => return Ok(StepResult::Done),
        };
        if self.steps >= self.config.max_steps {
            return Err(Error::StepLimit(self.config.max_steps));
        }
        let kind = op.kind();
        let cost = op.cost();

        #[cfg(feature = "tracing")]
        let _span = debug_span!("engine_step", step = self.steps, %kind, %cost).entered();
        #[cfg(feature = "tracing")]
        debug!(operation = %op, "engine_apply");

        self.marginal = op.run(&self.marginal)?;
        self.steps += 1;
        self.history.push((kind, cost));

        self.metrics.record_step();
        self.metrics.record_operation(kind);
        self.metrics.record_eliminated(saturate(op.random_variables_eliminated()));
        self.metrics.update_max_factor_size(saturate(cost));

        #[cfg(feature = "tracing")]
        debug!(
            parfactors = self.marginal.distribution().len(),
            remaining = self.marginal.non_preservable_sets().len(),
            "engine_step_done"
        );

        Ok(StepResult::Applied { kind, cost })
    }

    /// Step until only preservable random variables remain.
    pub fn run(&mut self) -> Result<&Marginal> {
        while let StepResult::Applied { .. } = self.step()? {}

        #[cfg(feature = "tracing")]
        info!(steps = self.steps, "engine_done");

        Ok(&self.marginal)
    }

    /// Run to completion and multiply what is left.
    pub fn answer(&mut self) -> Result<StdParfactor> {
        self.run()?;
        self.marginal.answer()
    }
}

fn saturate(cost: Cost) -> u64 {
    cost.finite()
        .and_then(|c| u64::try_from(c).ok())
        .unwrap_or(u64::MAX)
}

/// Convenience function: eliminate everything but the preservable sets.
pub fn eliminate(marginal: Marginal) -> Result<Marginal> {
    let mut engine = Engine::with_defaults(marginal);
    engine.run()?;
    Ok(engine.into_marginal())
}

/// Convenience function: the answer potential over the preservable sets.
pub fn query(marginal: Marginal) -> Result<StdParfactor> {
    Engine::with_defaults(marginal).answer()
}

#[cfg(test)]
#[path = "tests/engine.rs"]
mod tests;
