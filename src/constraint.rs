use crate::cost::Cost;
use crate::subst::{Binding, Substitution};
use crate::term::{Constant, LogicalVariable, Population, Term};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Ordered set of constraints; ordering keeps hashing and display stable.
pub type ConstraintSet = BTreeSet<Constraint>;

/// An inequality constraint `X ≠ t`, where `X` is a logical variable and `t`
/// is a constant or another logical variable.
///
/// Inequalities between two variables are stored with the smaller variable
/// first, so `X ≠ Y` and `Y ≠ X` compare equal. Inequalities between two
/// constants are never built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Constraint {
    first: LogicalVariable,
    second: Term,
}

impl Constraint {
    pub fn new(first: LogicalVariable, second: impl Into<Term>) -> Self {
        match second.into() {
            Term::Variable(other) if other < first => Self {
                first: other,
                second: Term::Variable(first),
            },
            second => Self { first, second },
        }
    }

    /// Build `t1 ≠ t2`, orienting `c ≠ X` into `X ≠ c`.
    /// Returns None for two constants.
    pub fn between(t1: &Term, t2: &Term) -> Option<Self> {
        match (t1, t2) {
            (Term::Variable(x), t) => Some(Self::new(x.clone(), t.clone())),
            (t, Term::Variable(x)) => Some(Self::new(x.clone(), t.clone())),
            (Term::Constant(_), Term::Constant(_)) => None,
        }
    }

    /// `X/t` becomes `X ≠ t`.
    pub fn from_binding(binding: &Binding) -> Self {
        Self::new(binding.source().clone(), binding.target().clone())
    }

    pub fn first(&self) -> &LogicalVariable {
        &self.first
    }

    pub fn second(&self) -> &Term {
        &self.second
    }

    pub fn contains(&self, term: &Term) -> bool {
        self.first_as_term_eq(term) || &self.second == term
    }

    fn first_as_term_eq(&self, term: &Term) -> bool {
        term.as_variable() == Some(&self.first)
    }

    pub fn mentions(&self, var: &LogicalVariable) -> bool {
        &self.first == var || self.second.as_variable() == Some(var)
    }

    pub fn variables(&self) -> impl Iterator<Item = &LogicalVariable> {
        std::iter::once(&self.first).chain(self.second.as_variable())
    }

    /// The constant `c` if this is `var ≠ c`.
    pub fn excluded_constant(&self, var: &LogicalVariable) -> Option<&Constant> {
        if &self.first == var {
            self.second.as_constant()
        } else {
            None
        }
    }

    /// The other side if this is an inequality between `var` and a term.
    pub fn other_side(&self, var: &LogicalVariable) -> Option<Term> {
        if &self.first == var {
            Some(self.second.clone())
        } else if self.second.as_variable() == Some(var) {
            Some(Term::Variable(self.first.clone()))
        } else {
            None
        }
    }

    /// `X ≠ X` can never hold.
    pub fn is_contradiction(&self) -> bool {
        self.first_as_term_eq(&self.second)
    }

    /// Apply a single binding.
    ///
    /// | constraint | binding | result |
    /// |---|---|---|
    /// | X≠Y | X/q | Y≠q |
    /// | X≠Y | Y/q | X≠q |
    /// | X≠Y | X/W | W≠Y |
    /// | X≠Y | Y/W | X≠W |
    /// | X≠t | X/q | None |
    /// | X≠t | Y/q | X≠t |
    /// | X≠t | X/W | W≠t |
    /// | X≠t | Y/W | X≠t |
    pub fn apply_binding(&self, binding: &Binding) -> Option<Constraint> {
        self.apply(&Substitution::single(binding.clone()))
    }

    /// Apply a substitution to both sides. Returns None when both sides
    /// become constants.
    pub fn apply(&self, subst: &Substitution) -> Option<Constraint> {
        let first = subst.apply(&Term::Variable(self.first.clone()));
        let second = subst.apply(&self.second);
        Constraint::between(&first, &second)
    }

    /// True if the substitution makes both sides the same term.
    pub fn is_violated_by(&self, subst: &Substitution) -> bool {
        subst.apply(&Term::Variable(self.first.clone())) == subst.apply(&self.second)
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}≠{}", self.first, self.second)
    }
}

/// Apply a substitution to every constraint of a set.
///
/// Returns None if some constraint is violated, i.e. the instance denotes no
/// grounding at all. Constraints that become trivially true are dropped.
pub fn apply_all(constraints: &ConstraintSet, subst: &Substitution) -> Option<ConstraintSet> {
    let mut out = ConstraintSet::new();
    for c in constraints {
        if c.is_violated_by(subst) {
            return None;
        }
        if let Some(rewritten) = c.apply(subst) {
            out.insert(rewritten);
        }
    }
    Some(out)
}

/// Constraints all of whose variables are in `vars`.
pub fn restrict_to<'a>(
    constraints: impl IntoIterator<Item = &'a Constraint>,
    vars: &[LogicalVariable],
) -> ConstraintSet {
    constraints
        .into_iter()
        .filter(|c| c.variables().all(|v| vars.contains(v)))
        .cloned()
        .collect()
}

/// Constraints that mention `var`.
pub fn on_variable<'a>(
    constraints: impl IntoIterator<Item = &'a Constraint>,
    var: &LogicalVariable,
) -> ConstraintSet {
    constraints
        .into_iter()
        .filter(|c| c.mentions(var))
        .cloned()
        .collect()
}

/// Depth-first search over groundings of `vars`. `visit` returns false to stop.
fn search(
    vars: &[LogicalVariable],
    constraints: &ConstraintSet,
    assigned: &mut Vec<Constant>,
    visit: &mut dyn FnMut(&[Constant]) -> bool,
) -> bool {
    let idx = assigned.len();
    if idx == vars.len() {
        return visit(assigned);
    }
    let var = &vars[idx];
    let taken: Vec<Constant> = constraints
        .iter()
        .filter_map(|c| c.other_side(var))
        .filter_map(|t| match t {
            Term::Variable(other) => vars[..idx].iter().position(|v| *v == other),
            Term::Constant(_) => None,
        })
        .map(|j| assigned[j].clone())
        .collect();
    for c in var.individuals_satisfying(constraints).iter() {
        if taken.contains(c) {
            continue;
        }
        assigned.push(c.clone());
        let go_on = search(vars, constraints, assigned, visit);
        assigned.pop();
        if !go_on {
            return false;
        }
    }
    true
}

fn to_substitution(vars: &[LogicalVariable], values: &[Constant]) -> Substitution {
    let mut subst = Substitution::new();
    for (v, c) in vars.iter().zip(values) {
        // vars are distinct, so binding cannot fail
        let _ = subst.bind(v.clone(), c.clone());
    }
    subst
}

/// Every grounding of `vars` that satisfies `constraints`. Constraints on
/// other variables are ignored.
pub fn groundings(vars: &[LogicalVariable], constraints: &ConstraintSet) -> Vec<Substitution> {
    let mut out = Vec::new();
    search(vars, constraints, &mut Vec::new(), &mut |values| {
        out.push(to_substitution(vars, values));
        true
    });
    out
}

pub fn first_grounding(vars: &[LogicalVariable], constraints: &ConstraintSet) -> Option<Substitution> {
    let mut found = None;
    search(vars, constraints, &mut Vec::new(), &mut |values| {
        found = Some(to_substitution(vars, values));
        false
    });
    found
}

pub fn is_satisfiable(vars: &[LogicalVariable], constraints: &ConstraintSet) -> bool {
    first_grounding(vars, constraints).is_some()
}

/// Number of groundings of `vars` satisfying `constraints`.
///
/// Uses the product `Π (|D(Xi)| - #earlier neighbours)` when every group of
/// earlier neighbours is pairwise constrained and draws from the domain of
/// the later variable; otherwise counts by enumeration.
pub fn count_groundings(vars: &[LogicalVariable], constraints: &ConstraintSet) -> Cost {
    let domains: Vec<Population> = vars
        .iter()
        .map(|v| v.individuals_satisfying(constraints))
        .collect();
    let constrained = |i: usize, j: usize| {
        constraints.contains(&Constraint::new(vars[i].clone(), vars[j].clone()))
    };

    let mut total = Cost::Finite(1);
    for i in 0..vars.len() {
        let neighbours: Vec<usize> = (0..i).filter(|&j| constrained(i, j)).collect();
        let closed_form = neighbours.iter().all(|&j| {
            domains[j].iter().all(|c| domains[i].contains(c))
                && neighbours.iter().all(|&k| k == j || constrained(j, k))
        });
        if !closed_form {
            return count_by_enumeration(vars, constraints);
        }
        let free = domains[i].len().saturating_sub(neighbours.len());
        total = total.saturating_mul(Cost::from(free));
    }
    total
}

fn count_by_enumeration(vars: &[LogicalVariable], constraints: &ConstraintSet) -> Cost {
    let mut n: u128 = 0;
    search(vars, constraints, &mut Vec::new(), &mut |_| {
        n = n.saturating_add(1);
        true
    });
    Cost::Finite(n)
}

pub(crate) fn fmt_constraints(constraints: &ConstraintSet, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str("{")?;
    for (i, c) in constraints.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        fmt::Display::fmt(c, f)?;
    }
    f.write_str("}")
}

#[cfg(test)]
#[path = "tests/constraint.rs"]
mod tests;
