mod common;

use cfove::macro_op::{is_shattered, shatter};
use cfove::unify::mgu;
use approx::relative_eq;
use cfove::{
    Binding, Constraint, Engine, LogicalVariable, Marginal, Parfactor, Prv, StdParfactor, StdPrv,
    Term,
};
use common::{
    atom, brute_force_parfactors, constant, ground_sets, instances, lv, neq, normalized, parfactor,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

const FUNCTORS: [(&str, usize); 2] = [("f", 1), ("g", 2)];
const SLOTS: u8 = 5;

#[derive(Clone, Debug)]
struct RawAtom {
    functor: usize,
    args: Vec<u8>,
}

#[derive(Clone, Debug)]
struct RawParfactor {
    atoms: Vec<RawAtom>,
    excluded: Vec<(u8, u8)>,
}

fn raw_atom_strategy() -> impl Strategy<Value = RawAtom> {
    (0..FUNCTORS.len(), prop::collection::vec(0..SLOTS, 2..=2))
        .prop_map(|(functor, args)| RawAtom { functor, args })
}

fn raw_parfactor_strategy() -> impl Strategy<Value = RawParfactor> {
    (
        prop::collection::vec(raw_atom_strategy(), 1..=2),
        prop::collection::vec((0u8..2, 0u8..3), 0..=2),
    )
        .prop_map(|(atoms, excluded)| RawParfactor { atoms, excluded })
}

/// A generated parfactor with small positive weights, optionally joined
/// with the 0-ary atom `h`.
#[derive(Clone, Debug)]
struct RawWeighted {
    parfactor: RawParfactor,
    with_h: bool,
    weights: Vec<u8>,
}

fn raw_weighted_strategy() -> impl Strategy<Value = RawWeighted> {
    (
        raw_parfactor_strategy(),
        any::<bool>(),
        prop::collection::vec(1u8..=4, 8..=8),
    )
        .prop_map(|(parfactor, with_h, weights)| RawWeighted {
            parfactor,
            with_h,
            weights,
        })
}

prop_compose! {
    fn network_strategy()
        (
            size in 2usize..=3,
            parfactors in prop::collection::vec(raw_weighted_strategy(), 1..=3),
            prior in (1u8..=4, 1u8..=4),
        )
        -> (usize, Vec<RawWeighted>, (u8, u8))
    {
        (size, parfactors, prior)
    }
}

prop_compose! {
    fn marginal_parts_strategy()
        (
            size in 2usize..=3,
            parfactors in prop::collection::vec(raw_parfactor_strategy(), 1..=3),
        )
        -> (usize, Vec<RawParfactor>)
    {
        (size, parfactors)
    }
}

struct Vocabulary {
    size: usize,
    vars: [LogicalVariable; 2],
}

impl Vocabulary {
    fn new(size: usize) -> Self {
        Self {
            size,
            vars: [lv("X", size), lv("Y", size)],
        }
    }

    /// Slots 0 and 1 are the variables, the rest are individuals.
    fn term(&self, slot: u8) -> Term {
        match slot {
            0 | 1 => Term::from(&self.vars[slot as usize]),
            c => Term::from(constant(&format!("x{}", (c as usize - 2) % self.size + 1))),
        }
    }

    fn atom(&self, raw: &RawAtom) -> StdPrv {
        let (name, arity) = FUNCTORS[raw.functor];
        StdPrv::boolean(name, raw.args[..arity].iter().map(|s| self.term(*s)))
    }

    fn parfactor(&self, raw: &RawParfactor) -> StdParfactor {
        let (constraints, prvs) = self.scope(raw);
        StdParfactor::builder()
            .constraints(constraints)
            .prvs(prvs)
            .build()
            .expect("generated parfactor is valid")
    }

    fn weighted(&self, raw: &RawWeighted) -> StdParfactor {
        let (constraints, mut prvs) = self.scope(&raw.parfactor);
        if raw.with_h {
            prvs.push(Prv::from(atom("h")));
        }
        let size = 1usize << prvs.len();
        StdParfactor::builder()
            .constraints(constraints)
            .prvs(prvs)
            .values(raw.weights[..size].iter().map(|w| f64::from(*w)))
            .build()
            .expect("generated parfactor is valid")
    }

    /// Constraints and distinct Prvs of a generated parfactor.
    fn scope(&self, raw: &RawParfactor) -> (Vec<Constraint>, Vec<Prv>) {
        let mut prvs: Vec<Prv> = Vec::new();
        for a in &raw.atoms {
            let p = Prv::from(self.atom(a));
            if !prvs.contains(&p) {
                prvs.push(p);
            }
        }
        let used: Vec<LogicalVariable> = self
            .vars
            .iter()
            .filter(|x| prvs.iter().any(|p| p.mentions(x)))
            .cloned()
            .collect();
        let constraints = raw
            .excluded
            .iter()
            .map(|(v, c)| (&self.vars[*v as usize], (*c as usize) % self.size + 1))
            .filter(|(x, _)| used.contains(*x))
            .map(|(x, c)| neq(x, constant(&format!("x{c}"))))
            .collect();
        (constraints, prvs)
    }

    fn marginal(&self, raw: &[RawParfactor]) -> Marginal {
        Marginal::builder()
            .parfactors(raw.iter().map(|p| self.parfactor(p)))
            .build()
    }
}

fn standard(p: &Parfactor) -> &StdParfactor {
    p.as_standard().expect("only standard parfactors are generated")
}

fn all_ground_atoms(m: &Marginal) -> BTreeSet<Prv> {
    m.distribution()
        .iter()
        .flat_map(|p| ground_sets(standard(p)))
        .flatten()
        .collect()
}

/// Ground tuples of a parfactor, one per grounding.
fn ground_tuples(p: &StdParfactor) -> BTreeSet<Vec<Prv>> {
    p.groundings()
        .iter()
        .map(|g| p.prvs().iter().map(|q| q.apply(g)).collect())
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 128, .. ProptestConfig::default() })]

    #[test]
    fn shattered_occurrences_are_identical_or_disjoint(
        (size, raw) in marginal_parts_strategy()
    ) {
        let vocab = Vocabulary::new(size);
        let m = vocab.marginal(&raw);
        let s = shatter(&m).expect("shatter succeeds on standard parfactors");

        let sets: Vec<BTreeSet<Prv>> = s
            .distribution()
            .iter()
            .flat_map(|p| ground_sets(standard(p)))
            .map(|atoms| atoms.into_iter().collect())
            .collect();
        for (i, a) in sets.iter().enumerate() {
            for b in &sets[..i] {
                prop_assert!(a == b || a.is_disjoint(b), "{:?} vs {:?} in {}", a, b, s);
            }
        }
        prop_assert_eq!(all_ground_atoms(&s), all_ground_atoms(&m));
    }

    #[test]
    fn shatter_is_idempotent((size, raw) in marginal_parts_strategy()) {
        let vocab = Vocabulary::new(size);
        let once = shatter(&vocab.marginal(&raw)).expect("shatter succeeds");
        prop_assert!(is_shattered(&once).expect("check succeeds"));
        let twice = shatter(&once).expect("shatter succeeds");
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn mgu_agrees_with_ground_instances(
        size in 2usize..=3,
        left in raw_atom_strategy(),
        mut right in raw_atom_strategy(),
    ) {
        let vocab = Vocabulary::new(size);
        right.functor = left.functor;
        let p1 = vocab.atom(&left);
        let p2 = vocab.atom(&right);

        prop_assert!(mgu(&p1, &p1).expect("reflexive").is_empty());

        // X and Y are shared by both atoms, so one grounding covers both
        let overlap = instances(&p1, &vocab.vars, &Default::default())
            .into_iter()
            .zip(instances(&p2, &vocab.vars, &Default::default()))
            .any(|(a, b)| a == b);
        match mgu(&p1, &p2) {
            Some(subst) => {
                prop_assert!(overlap);
                let unified = p1.apply(&subst);
                prop_assert_eq!(&unified, &p2.apply(&subst));
                prop_assert_eq!(unified.apply(&subst), unified);
            }
            None => prop_assert!(!overlap),
        }
    }

    #[test]
    fn lifted_answer_matches_brute_force((size, raw, prior) in network_strategy()) {
        let vocab = Vocabulary::new(size);
        let h = atom("h");
        let mut parts = vec![parfactor([], [h.clone()], &[f64::from(prior.0), f64::from(prior.1)])];
        parts.extend(raw.iter().map(|p| vocab.weighted(p)));
        let exact = normalized(&brute_force_parfactors(&parts, &h));

        let m = Marginal::builder().parfactors(parts).query(h.clone()).build();
        let answer = Engine::with_defaults(m).answer().expect("elimination succeeds");
        prop_assert_eq!(answer.prvs(), &[Prv::from(h)]);
        let got = normalized(answer.factor().values());
        for (g, e) in got.iter().zip(&exact) {
            prop_assert!(
                relative_eq!(*g, *e, epsilon = 1e-9, max_relative = 1e-6),
                "got {:?}, exact {:?}",
                got,
                exact
            );
        }
    }

    #[test]
    fn split_pieces_partition_the_groundings(
        size in 2usize..=3,
        raw in raw_parfactor_strategy(),
        var in 0u8..2,
        target in 0u8..SLOTS,
    ) {
        let vocab = Vocabulary::new(size);
        let p = vocab.parfactor(&raw);
        let binding = Binding::new(vocab.vars[var as usize].clone(), vocab.term(target));
        prop_assume!(p.is_splittable(&binding));

        let split = p.split_on(&binding).expect("splittable");
        let fragment = ground_tuples(&split.fragment);
        let residual = ground_tuples(&split.residual);
        prop_assert!(fragment.is_disjoint(&residual));
        let union: BTreeSet<Vec<Prv>> = fragment.union(&residual).cloned().collect();
        prop_assert_eq!(union, ground_tuples(&p));
    }
}
