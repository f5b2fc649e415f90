//! Macro-operations: the steps the elimination driver chooses between.
//!
//! Every operation is a pure function from one [`Marginal`] to the next,
//! together with an estimate of the largest factor it builds.

mod convert;
mod counting_convert;
mod full_expand;
mod global_sum_out;
mod propositionalize;
mod shatter;

pub use convert::ConvertAggregation;
pub use counting_convert::CountingConvert;
pub use full_expand::FullExpand;
pub use global_sum_out::GlobalSumOut;
pub use propositionalize::Propositionalize;
pub use shatter::{is_shattered, shatter, Shatter};

use crate::cost::Cost;
use crate::distribution::Marginal;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OperationKind {
    ConvertAggregation,
    Shatter,
    CountingConvert,
    GlobalSumOut,
    FullExpand,
    Propositionalize,
}

impl OperationKind {
    pub const ALL: [OperationKind; 6] = [
        OperationKind::ConvertAggregation,
        OperationKind::Shatter,
        OperationKind::CountingConvert,
        OperationKind::GlobalSumOut,
        OperationKind::FullExpand,
        OperationKind::Propositionalize,
    ];

    /// Tie-break between equal costs; lower runs first.
    pub fn priority(&self) -> u8 {
        match self {
            OperationKind::ConvertAggregation => 0,
            OperationKind::Shatter => 1,
            OperationKind::CountingConvert | OperationKind::GlobalSumOut => 2,
            OperationKind::FullExpand => 3,
            OperationKind::Propositionalize => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::ConvertAggregation => "convert_aggregation",
            OperationKind::Shatter => "shatter",
            OperationKind::CountingConvert => "counting_convert",
            OperationKind::GlobalSumOut => "global_sum_out",
            OperationKind::FullExpand => "full_expand",
            OperationKind::Propositionalize => "propositionalize",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Closed set of macro-operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroOperation {
    ConvertAggregation(ConvertAggregation),
    Shatter(Shatter),
    CountingConvert(CountingConvert),
    GlobalSumOut(GlobalSumOut),
    FullExpand(FullExpand),
    Propositionalize(Propositionalize),
}

impl MacroOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            MacroOperation::ConvertAggregation(_) => OperationKind::ConvertAggregation,
            MacroOperation::Shatter(_) => OperationKind::Shatter,
            MacroOperation::CountingConvert(_) => OperationKind::CountingConvert,
            MacroOperation::GlobalSumOut(_) => OperationKind::GlobalSumOut,
            MacroOperation::FullExpand(_) => OperationKind::FullExpand,
            MacroOperation::Propositionalize(_) => OperationKind::Propositionalize,
        }
    }

    /// Estimated size of the largest factor the operation builds.
    pub fn cost(&self) -> Cost {
        match self {
            MacroOperation::ConvertAggregation(op) => op.cost(),
            MacroOperation::Shatter(op) => op.cost(),
            MacroOperation::CountingConvert(op) => op.cost(),
            MacroOperation::GlobalSumOut(op) => op.cost(),
            MacroOperation::FullExpand(op) => op.cost(),
            MacroOperation::Propositionalize(op) => op.cost(),
        }
    }

    /// Ground random variables the operation removes; zero for structural
    /// operations.
    pub fn random_variables_eliminated(&self) -> Cost {
        match self {
            MacroOperation::GlobalSumOut(op) => op.random_variables_eliminated(),
            _ => Cost::ZERO,
        }
    }

    pub fn run(&self, marginal: &Marginal) -> Result<Marginal> {
        match self {
            MacroOperation::ConvertAggregation(op) => op.run(marginal),
            MacroOperation::Shatter(op) => op.run(marginal),
            MacroOperation::CountingConvert(op) => op.run(marginal),
            MacroOperation::GlobalSumOut(op) => op.run(marginal),
            MacroOperation::FullExpand(op) => op.run(marginal),
            MacroOperation::Propositionalize(op) => op.run(marginal),
        }
    }

    /// Ordering key of the driver: cheaper first, then by kind.
    pub fn rank(&self) -> (Cost, u8) {
        (self.cost(), self.kind().priority())
    }
}

impl fmt::Display for MacroOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MacroOperation::ConvertAggregation(op) => write!(f, "convert {}", op.parfactor()),
            MacroOperation::Shatter(_) => f.write_str("shatter"),
            MacroOperation::CountingConvert(op) => {
                write!(f, "count {} in {}", op.variable(), op.parfactor())
            }
            MacroOperation::GlobalSumOut(op) => write!(f, "sum out {}", op.eliminated()),
            MacroOperation::FullExpand(op) => {
                write!(f, "expand {} in {}", op.formula(), op.parfactor())
            }
            MacroOperation::Propositionalize(op) => {
                write!(f, "ground {} in {}", op.variable(), op.parfactor())
            }
        }
    }
}

macro_rules! impl_from_operation {
    ($($variant:ident),*) => {
        $(
            impl From<$variant> for MacroOperation {
                fn from(op: $variant) -> Self {
                    MacroOperation::$variant(op)
                }
            }
        )*
    };
}

impl_from_operation!(
    ConvertAggregation,
    Shatter,
    CountingConvert,
    GlobalSumOut,
    FullExpand,
    Propositionalize
);

#[cfg(test)]
#[path = "../tests/macro_op.rs"]
mod tests;
