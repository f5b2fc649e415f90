//! Elimination metrics collection for profiling and analysis.
//!
//! Aggregate counters for the driver loop: how often each macro-operation
//! ran, how many ground random variables were summed out, and the largest
//! factor any chosen operation was expected to build. With the `tracing`
//! feature disabled every operation is a no-op.
//!
//! # Usage
//!
//! ```rust,ignore
//! use cfove::metrics::EngineMetrics;
//!
//! let metrics = EngineMetrics::new();
//! // ... run the engine ...
//! let report = metrics.report();
//! println!("Steps: {}, sum-outs: {}", report.steps, report.global_sum_outs);
//! ```

use crate::macro_op::OperationKind;

#[cfg(feature = "tracing")]
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters collected while eliminating.
///
/// All counters use relaxed ordering.
#[cfg(feature = "tracing")]
pub struct EngineMetrics {
    /// Driver steps taken
    pub steps: AtomicU64,
    pub conversions: AtomicU64,
    pub shatters: AtomicU64,
    pub counting_converts: AtomicU64,
    pub global_sum_outs: AtomicU64,
    pub full_expands: AtomicU64,
    pub propositionalizations: AtomicU64,
    /// Ground random variables summed out
    pub random_variables_eliminated: AtomicU64,
    /// Candidates skipped for exceeding the factor size limit
    pub rejected_candidates: AtomicU64,
    /// Largest cost among the chosen operations
    pub max_factor_size: AtomicU64,
}

#[cfg(feature = "tracing")]
impl EngineMetrics {
    pub fn new() -> Self {
        Self {
            steps: AtomicU64::new(0),
            conversions: AtomicU64::new(0),
            shatters: AtomicU64::new(0),
            counting_converts: AtomicU64::new(0),
            global_sum_outs: AtomicU64::new(0),
            full_expands: AtomicU64::new(0),
            propositionalizations: AtomicU64::new(0),
            random_variables_eliminated: AtomicU64::new(0),
            rejected_candidates: AtomicU64::new(0),
            max_factor_size: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_step(&self) {
        self.steps.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one applied operation of `kind`.
    #[inline]
    pub fn record_operation(&self, kind: OperationKind) {
        let counter = match kind {
            OperationKind::ConvertAggregation => &self.conversions,
            OperationKind::Shatter => &self.shatters,
            OperationKind::CountingConvert => &self.counting_converts,
            OperationKind::GlobalSumOut => &self.global_sum_outs,
            OperationKind::FullExpand => &self.full_expands,
            OperationKind::Propositionalize => &self.propositionalizations,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_eliminated(&self, count: u64) {
        self.random_variables_eliminated
            .fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_rejected(&self, count: u64) {
        self.rejected_candidates.fetch_add(count, Ordering::Relaxed);
    }

    /// Raise the recorded maximum factor size to `size` if it is larger.
    #[inline]
    pub fn update_max_factor_size(&self, size: u64) {
        let mut current = self.max_factor_size.load(Ordering::Relaxed);
        while size > current {
            match self.max_factor_size.compare_exchange_weak(
                current,
                size,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(c) => current = c,
            }
        }
    }

    pub fn report(&self) -> MetricsReport {
        MetricsReport {
            steps: self.steps.load(Ordering::Relaxed),
            conversions: self.conversions.load(Ordering::Relaxed),
            shatters: self.shatters.load(Ordering::Relaxed),
            counting_converts: self.counting_converts.load(Ordering::Relaxed),
            global_sum_outs: self.global_sum_outs.load(Ordering::Relaxed),
            full_expands: self.full_expands.load(Ordering::Relaxed),
            propositionalizations: self.propositionalizations.load(Ordering::Relaxed),
            random_variables_eliminated: self.random_variables_eliminated.load(Ordering::Relaxed),
            rejected_candidates: self.rejected_candidates.load(Ordering::Relaxed),
            max_factor_size: self.max_factor_size.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        self.steps.store(0, Ordering::Relaxed);
        self.conversions.store(0, Ordering::Relaxed);
        self.shatters.store(0, Ordering::Relaxed);
        self.counting_converts.store(0, Ordering::Relaxed);
        self.global_sum_outs.store(0, Ordering::Relaxed);
        self.full_expands.store(0, Ordering::Relaxed);
        self.propositionalizations.store(0, Ordering::Relaxed);
        self.random_variables_eliminated.store(0, Ordering::Relaxed);
        self.rejected_candidates.store(0, Ordering::Relaxed);
        self.max_factor_size.store(0, Ordering::Relaxed);
    }
}

#[cfg(feature = "tracing")]
impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of the counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsReport {
    pub steps: u64,
    pub conversions: u64,
    pub shatters: u64,
    pub counting_converts: u64,
    pub global_sum_outs: u64,
    pub full_expands: u64,
    pub propositionalizations: u64,
    pub random_variables_eliminated: u64,
    pub rejected_candidates: u64,
    pub max_factor_size: u64,
}

impl MetricsReport {
    pub fn operations(&self, kind: OperationKind) -> u64 {
        match kind {
            OperationKind::ConvertAggregation => self.conversions,
            OperationKind::Shatter => self.shatters,
            OperationKind::CountingConvert => self.counting_converts,
            OperationKind::GlobalSumOut => self.global_sum_outs,
            OperationKind::FullExpand => self.full_expands,
            OperationKind::Propositionalize => self.propositionalizations,
        }
    }

    /// Share of steps that stayed lifted, i.e. did not ground a variable.
    pub fn lifted_rate(&self) -> f64 {
        if self.steps == 0 {
            1.0
        } else {
            1.0 - self.propositionalizations as f64 / self.steps as f64
        }
    }

    /// Ground random variables removed per sum-out.
    pub fn eliminated_per_sum_out(&self) -> f64 {
        if self.global_sum_outs == 0 {
            0.0
        } else {
            self.random_variables_eliminated as f64 / self.global_sum_outs as f64
        }
    }
}

impl std::fmt::Display for MetricsReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Elimination Metrics ===")?;
        writeln!(f, "Steps:              {}", self.steps)?;
        for kind in OperationKind::ALL {
            writeln!(f, "  {:<20}{}", kind.name(), self.operations(kind))?;
        }
        writeln!(
            f,
            "Eliminated:         {} ({:.1} per sum-out)",
            self.random_variables_eliminated,
            self.eliminated_per_sum_out()
        )?;
        writeln!(f, "Lifted steps:       {:.1}%", self.lifted_rate() * 100.0)?;
        writeln!(f, "Rejected:           {}", self.rejected_candidates)?;
        writeln!(f, "Max factor size:    {}", self.max_factor_size)?;
        Ok(())
    }
}

#[cfg(not(feature = "tracing"))]
pub struct EngineMetrics;

#[cfg(not(feature = "tracing"))]
impl EngineMetrics {
    #[inline]
    pub fn new() -> Self {
        EngineMetrics
    }
    #[inline]
    pub fn record_step(&self) {}
    #[inline]
    pub fn record_operation(&self, _kind: OperationKind) {}
    #[inline]
    pub fn record_eliminated(&self, _count: u64) {}
    #[inline]
    pub fn record_rejected(&self, _count: u64) {}
    #[inline]
    pub fn update_max_factor_size(&self, _size: u64) {}
    #[inline]
    pub fn report(&self) -> MetricsReport {
        MetricsReport::default()
    }
    #[inline]
    pub fn reset(&self) {}
}

#[cfg(not(feature = "tracing"))]
impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}
