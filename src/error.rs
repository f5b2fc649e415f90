use crate::cost::Cost;
use crate::term::LogicalVariable;
use thiserror::Error;

/// Errors raised by the parfactor algebra and the elimination driver.
///
/// Structural variants (`NotCountable` .. `NotPresent`) mean a guard was
/// ignored by the caller; the driver never triggers them when it respects
/// the `is_*` checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("logical variable {0} is already bound in this substitution")]
    DuplicateBinding(LogicalVariable),

    #[error("cannot compose substitutions: both bind {0}")]
    OverlappingDomains(LogicalVariable),

    #[error("logical variable {0} is not countable in this parfactor")]
    NotCountable(LogicalVariable),

    #[error("counting formula {formula} cannot be expanded on {individual}")]
    NotExpandable { formula: String, individual: String },

    #[error("parfactor cannot be split on {0}")]
    NotSplittable(String),

    #[error("parfactors are not multipliable: {0}")]
    NotMultipliable(String),

    #[error("{0} cannot be summed out of this parfactor")]
    NotEliminable(String),

    #[error("{0} does not occur in this parfactor")]
    NotPresent(String),

    #[error("factor has {actual} entries, expected {expected}")]
    FactorSize { expected: usize, actual: usize },

    #[error("invalid parfactor: {0}")]
    InvalidParfactor(String),

    #[error("invalid aggregation parfactor: {0}")]
    InvalidAggregation(String),

    #[error("no macro-operation applies but non-preservable random variables remain")]
    Stalled,

    #[error("step limit of {0} reached before elimination finished")]
    StepLimit(usize),

    #[error("cheapest operation costs {cost}, above the limit of {limit}")]
    FactorTooLarge { cost: Cost, limit: Cost },
}

pub type Result<T> = std::result::Result<T, Error>;
