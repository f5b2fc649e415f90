//! Comparison of the ground sets denoted by two Prv occurrences.
//!
//! Both sides are viewed as an atom plus the constraints on its variables.
//! The right side is renamed apart, the atoms are unified, and the
//! equivalence classes of the unifier tell which side must be refined for
//! the two sets to become identical or disjoint.

use crate::constraint::{apply_all, is_satisfiable, restrict_to, Constraint, ConstraintSet};
use crate::distribution::RandomVariableSet;
use crate::parfactor::StdParfactor;
use crate::prv::{Prv, StdPrv};
use crate::subst::{Binding, Substitution};
use crate::term::{LogicalVariable, Term};
use crate::unify::mgu;

#[cfg(feature = "tracing")]
use crate::trace::trace;

/// Ground random variables of one Prv occurrence: every instance of `atom`
/// satisfying `constraints`. For a counting formula the atom is its inner
/// Prv and `bound` names the counted variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    atom: StdPrv,
    constraints: ConstraintSet,
    bound: Option<LogicalVariable>,
}

impl View {
    pub fn of(prv: &Prv, constraints: &ConstraintSet) -> View {
        match prv {
            Prv::Standard(p) => View {
                constraints: restrict_to(constraints, &p.variables()),
                atom: p.clone(),
                bound: None,
            },
            Prv::Counting(cf) => View {
                constraints: restrict_to(
                    constraints.iter().chain(cf.constraints()),
                    &cf.inner().variables(),
                ),
                atom: cf.inner().clone(),
                bound: Some(cf.bound().clone()),
            },
        }
    }

    pub fn of_set(rvs: &RandomVariableSet) -> View {
        Self::of(rvs.prv(), rvs.constraints())
    }

    pub fn atom(&self) -> &StdPrv {
        &self.atom
    }

    pub fn constraints(&self) -> &ConstraintSet {
        &self.constraints
    }

    pub fn bound(&self) -> Option<&LogicalVariable> {
        self.bound.as_ref()
    }

    fn names(&self) -> Vec<String> {
        self.atom
            .variables()
            .iter()
            .map(|v| v.name().to_string())
            .collect()
    }

    /// Rename variables whose names clash with `other`. Returns the renamed
    /// view and the substitution leading back to the original names.
    fn renamed_apart(&self, other: &View) -> (View, Substitution) {
        let mut taken = other.names();
        taken.extend(self.names());
        let mut forward = Substitution::new();
        let mut back = Substitution::new();
        let others = other.names();
        for v in self.atom.variables() {
            if !others.iter().any(|n| n == v.name()) {
                continue;
            }
            let mut name = format!("{}'", v.name());
            while taken.contains(&name) {
                name.push('\'');
            }
            taken.push(name.clone());
            let fresh = v.renamed(&name);
            // variables of an atom are distinct
            let _ = forward.bind(v.clone(), fresh.clone());
            let _ = back.bind(fresh, v);
        }
        let rename = |v: &LogicalVariable| {
            forward
                .apply(&Term::Variable(v.clone()))
                .as_variable()
                .cloned()
                .unwrap_or_else(|| v.clone())
        };
        let view = View {
            atom: self.atom.apply(&forward),
            constraints: self
                .constraints
                .iter()
                .filter_map(|c| c.apply(&forward))
                .collect(),
            bound: self.bound.as_ref().map(rename),
        };
        (view, back)
    }
}

/// How one side must change before the two sets are identical or disjoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refinement {
    /// Split the parfactor on the binding.
    Split(Binding),
    /// Expand the counting formula of the occurrence on this individual.
    Expand(Term),
}

impl Refinement {
    fn apply(self, subst: &Substitution) -> Refinement {
        match self {
            Refinement::Split(b) => {
                let source = subst
                    .apply(&Term::Variable(b.source().clone()))
                    .as_variable()
                    .cloned()
                    .unwrap_or_else(|| b.source().clone());
                Refinement::Split(Binding::new(source, subst.apply(b.target())))
            }
            Refinement::Expand(t) => Refinement::Expand(subst.apply(&t)),
        }
    }
}

/// Relation between the ground sets of two occurrences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Relation {
    Disjoint,
    /// The sets share ground random variables. A side with no refinement is
    /// contained in the other, so `left: None, right: None` means identical.
    Overlap {
        left: Option<Refinement>,
        right: Option<Refinement>,
    },
}

impl Relation {
    pub fn is_disjoint(&self) -> bool {
        matches!(self, Relation::Disjoint)
    }

    pub fn is_identical(&self) -> bool {
        matches!(
            self,
            Relation::Overlap {
                left: None,
                right: None
            }
        )
    }
}

fn respects_populations(theta: &Substitution) -> bool {
    theta.iter().all(|b| match b.target() {
        Term::Constant(c) => b.source().population().contains(c),
        Term::Variable(v) => v.population() == b.source().population(),
    })
}

struct Unified {
    right: View,
    back: Substitution,
    theta: Substitution,
}

fn unify_views(a: &View, b: &View) -> Option<Unified> {
    let (right, back) = b.renamed_apart(a);
    let theta = mgu(&a.atom, &right.atom)?;
    if !respects_populations(&theta) {
        return None;
    }
    let mut all = a.constraints.clone();
    all.extend(right.constraints.iter().cloned());
    let merged = apply_all(&all, &theta)?;
    if !is_satisfiable(&a.atom.apply(&theta).variables(), &merged) {
        return None;
    }
    Some(Unified { right, back, theta })
}

pub fn compare(a: &View, b: &View) -> Relation {
    let u = match unify_views(a, b) {
        Some(u) => u,
        None => return Relation::Disjoint,
    };
    let left = refinement(a, &u.right, &u.theta);
    let right = refinement(&u.right, a, &u.theta).map(|r| r.apply(&u.back));

    #[cfg(feature = "tracing")]
    trace!(left = ?left, right = ?right, "compare_overlap");

    Relation::Overlap { left, right }
}

/// True if every ground random variable of `a` is one of `b`.
pub fn is_contained(a: &View, b: &View) -> bool {
    matches!(compare(a, b), Relation::Overlap { left: None, .. })
}

/// The first refinement `own` needs to fit inside `other`, if any.
fn refinement(own: &View, other: &View, theta: &Substitution) -> Option<Refinement> {
    let own_vars = own.atom.variables();
    let image = |v: &LogicalVariable| theta.apply(&Term::Variable(v.clone()));

    // a variable the other side only has for one constant
    for x in &own_vars {
        if let Term::Constant(c) = image(x) {
            return Some(refine_on(own, x, Term::Constant(c)));
        }
    }
    // two variables the other side only has when equal
    for (j, y) in own_vars.iter().enumerate() {
        if let Some(x) = own_vars[..j].iter().find(|x| image(*x) == image(y)) {
            return Some(refine_on(own, x, Term::Variable(y.clone())));
        }
    }
    // an inequality of the other side that ours does not imply
    let to_own = |t: Term| -> Option<Term> {
        match t {
            Term::Constant(_) => Some(t),
            Term::Variable(_) => own_vars
                .iter()
                .find(|x| image(*x) == t)
                .map(|x| Term::Variable(x.clone())),
        }
    };
    for c in &other.constraints {
        let s = to_own(theta.apply(&Term::Variable(c.first().clone())));
        let t = to_own(theta.apply(c.second()));
        let (s, t) = match (s, t) {
            (Some(s), Some(t)) => (s, t),
            _ => continue,
        };
        if let Some(k) = Constraint::between(&s, &t) {
            if !entailed(own, &k) {
                return Some(refine_on(own, k.first(), k.second().clone()));
            }
        }
    }
    None
}

fn entailed(own: &View, k: &Constraint) -> bool {
    own.constraints.contains(k)
        || k
            .second()
            .as_constant()
            .is_some_and(|c| !k.first().population().contains(c))
}

fn refine_on(own: &View, x: &LogicalVariable, t: Term) -> Refinement {
    match &own.bound {
        Some(a) if a == x => Refinement::Expand(t),
        Some(a) if t.as_variable() == Some(a) => Refinement::Expand(Term::Variable(x.clone())),
        _ => Refinement::Split(Binding::new(x.clone(), t)),
    }
}

/// Renaming of the free variables of `b` onto those of `a`, when both
/// denote the same ground set through the same kind of Prv.
pub fn renaming(a: &View, b: &View) -> Option<Substitution> {
    if !compare(a, b).is_identical() {
        return None;
    }
    let u = unify_views(a, b)?;
    let image = |v: &LogicalVariable| u.theta.apply(&Term::Variable(v.clone()));
    let a_vars = a.atom.variables();
    let mut out = Substitution::new();
    for y2 in u.right.atom.variables() {
        let x = a_vars.iter().find(|x| image(*x) == image(&y2))?;
        let counted = u.right.bound.as_ref() == Some(&y2);
        if counted != (a.bound.as_ref() == Some(x)) {
            return None;
        }
        if counted {
            continue;
        }
        let y = u.back.apply(&Term::Variable(y2.clone())).as_variable()?.clone();
        if y != *x {
            out.bind(y, x.clone()).ok()?;
        }
    }
    Some(out)
}

/// Rename `p` so that it becomes multipliable with `target`, matching one
/// of its Prvs against an identical Prv of `target`.
pub fn align(target: &StdParfactor, p: &StdParfactor) -> Option<StdParfactor> {
    if target.is_multipliable(p) {
        return Some(p.clone());
    }
    for q in p.prvs() {
        let qv = View::of(q, p.constraints());
        for r in target.prvs() {
            let rho = match renaming(&View::of(r, target.constraints()), &qv) {
                Some(rho) => rho,
                None => continue,
            };
            if let Some(candidate) = p.apply(&rho) {
                if target.is_multipliable(&candidate) {
                    return Some(candidate);
                }
            }
        }
    }
    None
}

#[cfg(test)]
#[path = "tests/matching.rs"]
mod tests;
