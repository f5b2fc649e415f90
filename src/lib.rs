//! Lifted first-order variable elimination over parfactors.
//!
//! A [`Marginal`] holds a set of parfactors and the random-variable sets that
//! must survive. The [`Engine`] repeatedly picks the cheapest
//! macro-operation until only those sets remain.

pub mod aggregation;
pub mod constraint;
pub mod cost;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod factor;
pub mod macro_op;
pub mod matching;
pub mod metrics;
pub mod parfactor;
pub mod prv;
pub mod subst;
pub mod term;
pub mod trace;
pub mod unify;

#[cfg(test)]
pub(crate) mod test_utils;

pub use aggregation::{AggregationParfactor, Operator};
pub use constraint::{Constraint, ConstraintSet};
pub use cost::Cost;
pub use distribution::{Distribution, Marginal, RandomVariableSet};
pub use engine::{eliminate, query, Engine, EngineConfig, StepResult, DEFAULT_MAX_FACTOR_SIZE};
pub use error::{Error, Result};
pub use factor::Factor;
pub use parfactor::{Parfactor, StdParfactor};
pub use prv::{CountingFormula, Histogram, Prv, Range, StdPrv};
pub use subst::{Binding, Substitution};
pub use term::{Constant, LogicalVariable, Term};
