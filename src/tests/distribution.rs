use super::*;
use crate::test_utils::{atom, boolean_prv, constant, counting, lv, marginal, neq, parfactor};

// ========== RANDOM VARIABLE SET TESTS ==========

#[test]
fn random_variable_set_keeps_own_constraints() {
    let x = lv("X", "x", 3);
    let y = lv("Y", "x", 3);
    let cs: ConstraintSet = [neq(&x, constant("x1")), neq(&y, constant("x2"))]
        .into_iter()
        .collect();
    let rvs = RandomVariableSet::new(boolean_prv("f", [&x]).into(), &cs);
    assert_eq!(rvs.constraints().len(), 1);
    assert_eq!(rvs.ground_count(), Cost::Finite(2));
}

#[test]
fn counting_set_counts_inner_groundings() {
    let a = lv("A", "x", 3);
    let cf = counting(&a, boolean_prv("f", [&a]), [neq(&a, constant("x1"))]);
    let rvs = RandomVariableSet::new(cf.into(), &ConstraintSet::new());
    assert_eq!(rvs.ground_count(), Cost::Finite(2));
}

// ========== DISTRIBUTION TESTS ==========

#[test]
fn duplicate_parfactors_fold_into_their_product() {
    let p = parfactor([], [atom("a")], &[1.0, 2.0]);
    let mut d = Distribution::new();
    assert!(d.add(p.clone()));
    assert!(!d.add(p.clone()));
    assert_eq!(d.len(), 1);
    assert!(!d.contains(&p.clone().into()));
    assert!(d.contains(&parfactor([], [atom("a")], &[1.0, 4.0]).into()));
}

#[test]
fn folding_cascades_through_equal_squares() {
    let mut d: Distribution = [
        parfactor([], [atom("a")], &[1.0, 2.0]),
        parfactor([], [atom("a")], &[1.0, 4.0]),
    ]
    .into_iter()
    .collect();
    assert_eq!(d.len(), 2);

    d.add(parfactor([], [atom("a")], &[1.0, 2.0]));
    assert_eq!(d.len(), 1);
    assert!(d.contains(&parfactor([], [atom("a")], &[1.0, 16.0]).into()));
}

#[test]
fn evidence_folds_into_itself() {
    let e = parfactor([], [atom("a")], &[0.0, 1.0]);
    let d: Distribution = [e.clone(), e.clone()].into_iter().collect();
    assert_eq!(d.len(), 1);
    assert!(d.contains(&e.into()));
}

#[test]
fn sorted_is_deterministic() {
    let d: Distribution = [
        parfactor([], [atom("b")], &[1.0, 2.0]),
        parfactor([], [atom("a")], &[1.0, 2.0]),
    ]
    .into_iter()
    .collect();
    let order: Vec<String> = d.sorted().iter().map(|p| p.to_string()).collect();
    assert_eq!(order, ["<{}, [a], [1, 2]>", "<{}, [b], [1, 2]>"]);
}

#[test]
fn random_variable_sets_are_distinct() {
    let x = lv("X", "x", 3);
    let d: Distribution = [
        parfactor([], [boolean_prv("f", [&x])], &[1.0, 2.0]),
        parfactor([], [boolean_prv("f", [&x]), boolean_prv("g", [&x])], &[1.0; 4]),
    ]
    .into_iter()
    .collect();
    assert_eq!(d.random_variable_sets().len(), 2);
}

#[test]
fn product_of_ground_parfactors() {
    let d: Distribution = [
        parfactor([], [atom("a")], &[1.0, 2.0]),
        parfactor([], [atom("b")], &[3.0, 4.0]),
    ]
    .into_iter()
    .collect();
    let p = d.product().unwrap();
    assert_eq!(p.prvs(), &[Prv::from(atom("a")), Prv::from(atom("b"))]);
    assert_eq!(p.factor().values(), &[3.0, 4.0, 6.0, 8.0]);
}

#[test]
fn constant_parfactors_fold_in_per_grounding() {
    let x = lv("X", "x", 3);
    let d: Distribution = [
        parfactor([], [atom("a")], &[1.0, 2.0]),
        parfactor([neq(&x, constant("x1"))], Vec::<Prv>::new(), &[2.0]),
    ]
    .into_iter()
    .collect();
    assert_eq!(d.product().unwrap().factor().values(), &[4.0, 8.0]);
}

#[test]
fn product_aligns_variable_names() {
    let x = lv("X", "x", 3);
    let y = lv("Y", "x", 3);
    let d: Distribution = [
        parfactor([], [boolean_prv("f", [&x])], &[1.0, 2.0]),
        parfactor([], [boolean_prv("f", [&y]), boolean_prv("g", [&y])], &[1.0, 2.0, 3.0, 4.0]),
    ]
    .into_iter()
    .collect();
    let p = d.product().unwrap();
    assert_eq!(p.prvs().len(), 2);
    assert_eq!(p.logical_variables().len(), 1);
}

#[test]
fn empty_product_is_one() {
    let p = Distribution::new().product().unwrap();
    assert!(p.is_constant());
    assert_eq!(p.factor().values(), &[1.0]);
}

// ========== MARGINAL TESTS ==========

#[test]
fn preservable_sets_cover_their_instances() {
    let x = lv("X", "x", 3);
    let m = Marginal::builder()
        .parfactor(parfactor([], [boolean_prv("f", [&x])], &[1.0, 2.0]))
        .query(boolean_prv("f", [&x]))
        .build();
    let instance = RandomVariableSet::new(
        boolean_prv("f", [constant("x2")]).into(),
        &ConstraintSet::new(),
    );
    assert!(m.is_preservable(&instance));
    assert!(m.is_done());
}

#[test]
fn marginal_with_hidden_variables_is_not_done() {
    let x = lv("X", "x", 3);
    let m = Marginal::builder()
        .parfactor(parfactor([], [boolean_prv("f", [&x])], &[1.0, 2.0]))
        .query(boolean_prv("f", [constant("x1")]))
        .build();
    assert!(!m.is_done());
    assert_eq!(m.non_preservable_sets().len(), 1);
    assert!(matches!(m.answer(), Err(Error::NotEliminable(_))));
}

#[test]
fn answer_multiplies_remaining_parfactors() {
    let m = Marginal::builder()
        .parfactors([
            parfactor([], [atom("a")], &[1.0, 2.0]),
            parfactor([], [atom("a")], &[3.0, 4.0]),
        ])
        .query(atom("a"))
        .build();
    assert_eq!(m.answer().unwrap().factor().values(), &[3.0, 8.0]);
}

#[test]
fn builder_dedups_preservable_sets() {
    let m = Marginal::builder().query(atom("a")).query(atom("a")).build();
    assert_eq!(m.preservable().len(), 1);
    assert!(m.distribution().is_empty());
}

#[test]
fn with_distribution_keeps_preservable() {
    let m = marginal([parfactor([], [atom("a")], &[1.0, 2.0])]);
    let n = Marginal::builder().query(atom("b")).build().with_distribution(m.distribution().clone());
    assert_eq!(n.preservable().len(), 1);
    assert_eq!(n.distribution().len(), 1);
}

#[test]
fn marginal_survives_json() {
    let x = lv("X", "x", 3);
    let m = Marginal::builder()
        .parfactor(parfactor([neq(&x, constant("x1"))], [boolean_prv("f", [&x])], &[0.25, 0.75]))
        .query(atom("a"))
        .build();
    let json = m.to_json().unwrap();
    assert_eq!(Marginal::from_json(&json).unwrap(), m);
    assert!(Marginal::from_json("{").is_err());
}
