//! Shared constructors and a brute-force evaluator for the integration tests.

#![allow(dead_code)]

use cfove::constraint::groundings;
use cfove::factor::{assignment_of, index_of};
use cfove::{
    Constant, Constraint, ConstraintSet, LogicalVariable, Marginal, Parfactor, Prv,
    StdParfactor, StdPrv, Term,
};

pub fn lv(name: &str, size: usize) -> LogicalVariable {
    LogicalVariable::with_population(name, "x", size)
}

pub fn constant(name: &str) -> Constant {
    Constant::new(name)
}

pub fn boolean_prv<T: Into<Term>>(functor: &str, terms: impl IntoIterator<Item = T>) -> StdPrv {
    StdPrv::boolean(functor, terms)
}

pub fn atom(functor: &str) -> StdPrv {
    StdPrv::boolean(functor, Vec::<Term>::new())
}

pub fn neq(x: &LogicalVariable, t: impl Into<Term>) -> Constraint {
    Constraint::new(x.clone(), t)
}

pub fn parfactor<P: Into<Prv>>(
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

pub const F_RAIN: [f64; 2] = [0.8, 0.2];
pub const F_SPRINKLER: [f64; 2] = [0.6, 0.4];
pub const F_WET: [f64; 8] = [1.0, 0.0, 0.2, 0.8, 0.1, 0.9, 0.01, 0.99];

/// Sprinkler network with `wet_grass(lot1)` observed true.
pub fn sprinkler(lots: usize, query: StdPrv) -> Marginal {
    let lot = LogicalVariable::with_population("Lot", "lot", lots);
    let rain = atom("rain");
    let spr = boolean_prv("sprinkler", [&lot]);
    let wet = boolean_prv("wet_grass", [&lot]);
    Marginal::builder()
        .parfactor(parfactor([], [rain.clone()], &F_RAIN))
        .parfactor(parfactor([], [spr.clone()], &F_SPRINKLER))
        .parfactor(parfactor([], [rain, spr, wet], &F_WET))
        .parfactor(parfactor(
            [],
            [boolean_prv("wet_grass", [constant("lot1")])],
            &[0.0, 1.0],
        ))
        .query(query)
        .build()
}

/// Ground atoms denoted by every occurrence of every Prv of a standard
/// parfactor, one entry per occurrence.
pub fn ground_sets(p: &StdParfactor) -> Vec<Vec<Prv>> {
    let gs = p.groundings();
    p.prvs()
        .iter()
        .map(|q| {
            let mut atoms: Vec<Prv> = gs.iter().map(|g| q.apply(g)).collect();
            atoms.sort();
            atoms.dedup();
            atoms
        })
        .collect()
}

/// Every ground instance of every standard parfactor of the marginal.
pub fn ground_parfactors(m: &Marginal) -> Vec<StdParfactor> {
    let parfactors: Vec<StdParfactor> = m
        .distribution()
        .iter()
        .map(|p| match p {
            Parfactor::Standard(s) => s.clone(),
            Parfactor::Aggregation(_) => panic!("brute force needs standard parfactors, got {p}"),
        })
        .collect();
    ground_all(&parfactors)
}

pub fn ground_all(parfactors: &[StdParfactor]) -> Vec<StdParfactor> {
    let mut out = Vec::new();
    for s in parfactors {
        for g in s.groundings() {
            out.push(s.apply(&g).expect("grounding satisfies the constraints"));
        }
    }
    out
}

/// Unnormalised potential over `query` by summing the ground joint.
pub fn brute_force(m: &Marginal, query: &StdPrv) -> Vec<f64> {
    brute_force_ground(&ground_parfactors(m), query)
}

/// Brute force over a plain list of parfactors, so that equal entries
/// each contribute.
pub fn brute_force_parfactors(parfactors: &[StdParfactor], query: &StdPrv) -> Vec<f64> {
    brute_force_ground(&ground_all(parfactors), query)
}

fn brute_force_ground(ground: &[StdParfactor], query: &StdPrv) -> Vec<f64> {
    let mut atoms: Vec<Prv> = Vec::new();
    for p in ground {
        for q in p.prvs() {
            assert!(!q.is_counting(), "brute force needs standard Prvs");
            if !atoms.contains(q) {
                atoms.push(q.clone());
            }
        }
    }
    let q = Prv::from(query.clone());
    let qi = atoms.iter().position(|a| *a == q).expect("query atom occurs");
    let sizes: Vec<usize> = atoms.iter().map(Prv::range_size).collect();
    let total: usize = sizes.iter().product();

    let mut out = vec![0.0; q.range_size()];
    for index in 0..total {
        let assignment = assignment_of(&sizes, index);
        let weight: f64 = ground
            .iter()
            .map(|p| {
                let local: Vec<usize> = p
                    .prvs()
                    .iter()
                    .map(|r| {
                        let k = atoms.iter().position(|a| a == r).expect("atom collected");
                        assignment[k]
                    })
                    .collect();
                p.factor().values()[index_of(&p.sizes(), &local)]
            })
            .product();
        out[assignment[qi]] += weight;
    }
    out
}

pub fn normalized(values: &[f64]) -> Vec<f64> {
    let total: f64 = values.iter().sum();
    values.iter().map(|v| v / total).collect()
}

/// Ground atoms for `vars` in every grounding permitted by `constraints`.
pub fn instances(prv: &StdPrv, vars: &[LogicalVariable], constraints: &ConstraintSet) -> Vec<StdPrv> {
    groundings(vars, constraints)
        .iter()
        .map(|g| prv.apply(g))
        .collect()
}
