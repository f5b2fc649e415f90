use crate::constraint::Constraint;
use crate::distribution::Marginal;
use crate::parfactor::{Parfactor, StdParfactor};
use crate::prv::{CountingFormula, Prv, StdPrv};
use crate::term::{Constant, LogicalVariable, Term};

pub(crate) fn lv(name: &str, prefix: &str, size: usize) -> LogicalVariable {
    LogicalVariable::with_population(name, prefix, size)
}

pub(crate) fn constant(name: &str) -> Constant {
    Constant::new(name)
}

pub(crate) fn boolean_prv<T: Into<Term>>(functor: &str, terms: impl IntoIterator<Item = T>) -> StdPrv {
    StdPrv::boolean(functor, terms)
}

pub(crate) fn atom(functor: &str) -> StdPrv {
    StdPrv::boolean(functor, Vec::<Term>::new())
}

pub(crate) fn neq(x: &LogicalVariable, t: impl Into<Term>) -> Constraint {
    Constraint::new(x.clone(), t)
}

pub(crate) fn counting(
    bound: &LogicalVariable,
    inner: StdPrv,
    constraints: impl IntoIterator<Item = Constraint>,
) -> CountingFormula {
    CountingFormula::new(bound.clone(), inner, constraints)
        .expect("valid counting formula")
}

pub(crate) fn parfactor<P: Into<Prv>>(
    constraints: impl IntoIterator<Item = Constraint>,
    prvs: impl IntoIterator<Item = P>,
    values: &[f64],
) -> StdParfactor {
    StdParfactor::builder()
        .constraints(constraints)
        .prvs(prvs)
        .values(values.iter().copied())
        .build()
        .expect("valid parfactor")
}

pub(crate) fn marginal<P: Into<Parfactor>>(parfactors: impl IntoIterator<Item = P>) -> Marginal {
    Marginal::builder().parfactors(parfactors).build()
}

/// The sprinkler network: one `rain`, a `sprinkler` and `wet_grass` per
/// lot, with `lot1` singled out.
pub(crate) struct Sprinkler {
    pub lot: LogicalVariable,
    pub lot1: Constant,
    pub rain: StdPrv,
    pub sprinkler: StdPrv,
    pub wet_grass: StdPrv,
    pub sprinkler_lot1: StdPrv,
    pub wet_grass_lot1: StdPrv,
}

pub(crate) const F_RAIN: [f64; 2] = [0.8, 0.2];
pub(crate) const F_SPRINKLER: [f64; 2] = [0.6, 0.4];
pub(crate) const F_WET: [f64; 8] = [1.0, 0.0, 0.2, 0.8, 0.1, 0.9, 0.01, 0.99];

impl Sprinkler {
    pub fn new(lots: usize) -> Self {
        let lot = lv("Lot", "lot", lots);
        let lot1 = constant("lot1");
        Self {
            rain: atom("rain"),
            sprinkler: boolean_prv("sprinkler", [&lot]),
            wet_grass: boolean_prv("wet_grass", [&lot]),
            sprinkler_lot1: boolean_prv("sprinkler", [&lot1]),
            wet_grass_lot1: boolean_prv("wet_grass", [&lot1]),
            lot,
            lot1,
        }
    }

    pub fn lot_not_lot1(&self) -> Constraint {
        neq(&self.lot, &self.lot1)
    }
}
