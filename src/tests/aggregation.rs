use super::*;
use crate::prv::Range;
use crate::test_utils::{atom, boolean_prv, constant, lv, neq};

fn or_over(parent: StdPrv, child: StdPrv) -> AggregationParfactorBuilder {
    AggregationParfactor::builder(parent, child, Operator::Or)
}

// ========== OPERATOR TESTS ==========

#[test]
fn or_and_over_histograms() {
    assert_eq!(Operator::Or.over_histogram(&Histogram::new([2, 0])), 0);
    assert_eq!(Operator::Or.over_histogram(&Histogram::new([1, 1])), 1);
    assert_eq!(Operator::And.over_histogram(&Histogram::new([1, 1])), 0);
    assert_eq!(Operator::And.over_histogram(&Histogram::new([0, 2])), 1);
}

#[test]
fn empty_histogram_yields_identity() {
    let empty = Histogram::new([0, 0]);
    assert_eq!(Operator::Or.over_histogram(&empty), 0);
    assert_eq!(Operator::And.over_histogram(&empty), 1);
}

#[test]
fn max_min_over_values() {
    assert_eq!(Operator::Max.apply([0, 2, 1], 3), Some(2));
    assert_eq!(Operator::Min.apply([2, 1, 2], 3), Some(1));
    assert_eq!(Operator::Or.apply([0, 0, 1], 2), Some(1));
    assert_eq!(Operator::And.apply([0, 1, 1], 2), Some(0));
    assert_eq!(Operator::Or.apply([0usize; 0], 2), Some(0));
}

#[test]
fn values_outside_the_range_are_rejected() {
    assert_eq!(Operator::Max.apply([0, 3], 3), None);
    assert_eq!(Operator::Or.apply([2], 2), None);
    assert_eq!(Operator::And.apply([0], 0), None);
}

// ========== BUILDER TESTS ==========

#[test]
fn extra_variable_is_the_one_missing_from_the_child() {
    let x = lv("X", "x", 3);
    let a = lv("A", "a", 2);
    let agg = or_over(boolean_prv("p", [&x, &a]), boolean_prv("c", [&x]))
        .build()
        .unwrap();
    assert_eq!(agg.extra_variable(), &a);
    assert_eq!(agg.logical_variables(), vec![x]);
    assert_eq!(agg.prvs().len(), 2);
}

#[test]
fn builder_rejects_malformed_aggregations() {
    let x = lv("X", "x", 3);
    let a = lv("A", "a", 2);
    assert!(matches!(
        or_over(boolean_prv("p", [&x]), boolean_prv("c", [&x])).build(),
        Err(Error::InvalidAggregation(_))
    ));
    let three = Range::new(["lo", "mid", "hi"]);
    assert!(or_over(StdPrv::new("p", three, [&a]), atom("c")).build().is_err());
    assert!(or_over(boolean_prv("p", [&a]), atom("c"))
        .context(boolean_prv("q", [&a]))
        .build()
        .is_err());
    assert!(or_over(boolean_prv("p", [&a]), atom("c"))
        .values([1.0, 2.0, 3.0])
        .build()
        .is_err());
}

// ========== CONVERSION TESTS ==========

#[test]
fn or_converts_to_deterministic_counting_factor() {
    let a = lv("A", "a", 2);
    let agg = or_over(boolean_prv("p", [&a]), atom("c")).build().unwrap();
    let out = agg.to_std_parfactors().unwrap();
    assert_eq!(out.len(), 1);
    let f = &out[0];
    assert!(f.prvs()[0].is_counting());
    assert_eq!(f.prvs()[1], Prv::from(atom("c")));
    // (2,0) -> false, (1,1) -> true, (0,2) -> true
    assert_eq!(f.factor().values(), &[1.0, 0.0, 0.0, 1.0, 0.0, 1.0]);
}

#[test]
fn parent_weights_become_their_own_parfactor() {
    let a = lv("A", "a", 2);
    let agg = AggregationParfactor::builder(boolean_prv("p", [&a]), atom("c"), Operator::And)
        .values([0.3, 0.7])
        .build()
        .unwrap();
    let out = agg.to_std_parfactors().unwrap();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0].prvs(), &[Prv::from(boolean_prv("p", [&a]))]);
    assert_eq!(out[0].factor().values(), &[0.3, 0.7]);
    // AND: only (0,2) is true
    assert_eq!(out[1].factor().values(), &[1.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
}

#[test]
fn constraints_on_extra_move_into_the_counting_formula() {
    let x = lv("X", "x", 3);
    let a = lv("A", "a", 3);
    let agg = or_over(boolean_prv("p", [&x, &a]), boolean_prv("c", [&x]))
        .constraint(neq(&a, constant("a1")))
        .constraint(neq(&x, constant("x1")))
        .build()
        .unwrap();
    assert_eq!(agg.constraints_on_extra().len(), 1);
    let out = agg.to_std_parfactors().unwrap();
    let f = out.last().unwrap();
    assert_eq!(f.constraints().len(), 1);
    assert!(f.constraints().contains(&neq(&x, constant("x1"))));
    let cf = f.prvs()[0].as_counting().unwrap();
    assert_eq!(cf.domain_size(), 2);
}

// ========== SUBSTITUTION TESTS ==========

#[test]
fn apply_never_binds_extra_variable() {
    let x = lv("X", "x", 3);
    let a = lv("A", "a", 2);
    let agg = or_over(boolean_prv("p", [&x, &a]), boolean_prv("c", [&x]))
        .build()
        .unwrap();
    let subst = Substitution::from_bindings([
        Binding::new(x.clone(), constant("x1")),
        Binding::new(a.clone(), constant("a1")),
    ])
    .unwrap();
    let applied = agg.apply(&subst).unwrap();
    assert_eq!(
        applied.parent(),
        &boolean_prv("p", [Term::from(constant("x1")), Term::from(&a)])
    );
    assert_eq!(applied.child(), &boolean_prv("c", [constant("x1")]));
}

#[test]
fn split_on_child_variable() {
    let x = lv("X", "x", 3);
    let a = lv("A", "a", 2);
    let agg = or_over(boolean_prv("p", [&x, &a]), boolean_prv("c", [&x]))
        .build()
        .unwrap();
    assert!(!agg.is_splittable(&Binding::new(a.clone(), constant("a1"))));
    let split = agg.split_on(&Binding::new(x.clone(), constant("x2"))).unwrap();
    assert_eq!(split.fragment.child(), &boolean_prv("c", [constant("x2")]));
    assert!(split.residual.constraints().contains(&neq(&x, constant("x2"))));
}

#[test]
fn normalize_grounds_singleton_free_variables() {
    let x = lv("X", "x", 1);
    let a = lv("A", "a", 2);
    let agg = or_over(boolean_prv("p", [&x, &a]), boolean_prv("c", [&x]))
        .build()
        .unwrap()
        .normalize()
        .unwrap();
    assert_eq!(agg.child(), &boolean_prv("c", [constant("x1")]));
    assert_eq!(agg.extra_variable(), &a);
}

#[test]
fn display() {
    let a = lv("A", "a", 2);
    let agg = or_over(boolean_prv("p", [&a]), atom("c")).build().unwrap();
    assert_eq!(agg.to_string(), "<{}, p(A), c, OR>");
}
