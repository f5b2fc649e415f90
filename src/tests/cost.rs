use super::*;

#[test]
fn full_expand_cost_example() {
    // |F| = 6, |range(cf)| = 2, |range(inner)| = 2, three individuals
    assert_eq!(full_expand_cost(6, 2, 2, 3), Cost::Finite(24));
}

#[test]
fn histogram_counts() {
    assert_eq!(histogram_count(3, 2), Cost::Finite(4));
    assert_eq!(histogram_count(15, 2), Cost::Finite(16));
    assert_eq!(histogram_count(2, 3), Cost::Finite(6));
    assert_eq!(histogram_count(0, 4), Cost::Finite(1));
    assert_eq!(histogram_count(0, 0), Cost::Finite(1));
    assert_eq!(histogram_count(2, 0), Cost::ZERO);
}

#[test]
fn overflow_saturates_to_infinite() {
    let big = Cost::pow(2, 200);
    assert!(big.is_infinite());
    assert_eq!(Cost::Finite(u128::MAX).saturating_mul(Cost::Finite(2)), Cost::Infinite);
    assert_eq!(Cost::Finite(u128::MAX).saturating_add(Cost::Finite(1)), Cost::Infinite);
    assert!(full_expand_cost(4, 2, 2, 1_000).is_infinite());
}

#[test]
fn infinite_is_larger_than_any_finite_cost() {
    assert!(Cost::Infinite > Cost::Finite(u128::MAX));
    assert_eq!(Cost::Infinite, Cost::Infinite);
    assert!(Cost::ZERO < Cost::Finite(1));
}

#[test]
fn arithmetic_on_infinite() {
    assert_eq!(Cost::Infinite.saturating_mul(Cost::Finite(3)), Cost::Infinite);
    assert_eq!(Cost::Infinite.div(2), Cost::Infinite);
    assert_eq!(Cost::Finite(7).div(2), Cost::Finite(3));
    assert_eq!(Cost::Finite(7).finite(), Some(7));
    assert_eq!(Cost::Infinite.finite(), None);
}

#[test]
fn display() {
    assert_eq!(Cost::Finite(24).to_string(), "24");
    assert_eq!(Cost::Infinite.to_string(), "∞");
}
