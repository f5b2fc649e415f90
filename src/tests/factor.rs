use super::*;

#[test]
fn from_fn_is_row_major() {
    let f = Factor::from_fn(&[2, 3], |a| (a[0] * 10 + a[1]) as f64);
    assert_eq!(f.values(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
    assert_eq!(f.at(&[2, 3], &[1, 2]), 12.0);
}

#[test]
fn index_and_assignment_agree() {
    let sizes = [2, 3, 2];
    for i in 0..12 {
        let a = assignment_of(&sizes, i);
        assert_eq!(index_of(&sizes, &a), i);
    }
    assert_eq!(assignment_of(&sizes, 7).as_slice(), &[1, 0, 1]);
}

#[test]
fn increment_wraps_around() {
    let mut a = [1, 2];
    increment(&mut a, &[2, 3]);
    assert_eq!(a, [0, 0]);
    let mut a = [0, 2];
    increment(&mut a, &[2, 3]);
    assert_eq!(a, [1, 0]);
}

#[test]
fn empty_shape_has_one_entry() {
    let f = Factor::from_fn(&[], |_| 4.0);
    assert_eq!(f.values(), &[4.0]);
}

#[test]
fn check_size_reports_mismatch() {
    let f = Factor::new([1.0, 2.0]);
    assert!(f.check_size(2).is_ok());
    assert_eq!(
        f.check_size(4),
        Err(Error::FactorSize {
            expected: 4,
            actual: 2
        })
    );
}

#[test]
fn normalized_sums_to_one() {
    let f = Factor::new([1.0, 3.0]).normalized();
    assert_eq!(f.values(), &[0.25, 0.75]);
    let zero = Factor::constant(3, 0.0);
    assert_eq!(zero.normalized(), zero);
}

#[test]
fn ones_and_map() {
    let f = Factor::ones(3);
    assert!(f.is_all_ones());
    assert!(!f.map(|v| v * 2.0).is_all_ones());
    assert_eq!(f.get(2), Some(1.0));
    assert_eq!(f.get(3), None);
}

#[test]
fn negative_zero_equals_zero() {
    let a = Factor::new([0.0, 1.0]);
    let b = Factor::new([-0.0, 1.0]);
    assert_eq!(a, b);
    let mut set = std::collections::HashSet::new();
    set.insert(a);
    assert!(set.contains(&b));
    assert_eq!(Factor::new([0.0]).cmp(&Factor::new([-0.0])), Ordering::Equal);
}

#[test]
fn ordering_is_total() {
    let a = Factor::new([0.1, 0.9]);
    let b = Factor::new([0.2, 0.8]);
    assert!(a < b);
    assert!(Factor::new([0.1]) < Factor::new([0.1, 0.0]));
}
