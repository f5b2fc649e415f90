use crate::prv::StdPrv;
use crate::subst::{Binding, Substitution};
use crate::term::Term;
use smallvec::SmallVec;

#[cfg(feature = "tracing")]
use crate::trace::{debug_span, trace};

/// Most general unifier of two atoms, or None if they cannot be unified.
///
/// Works through one equation per argument position with an explicit
/// worklist. Every resolved equation becomes a binding that is applied to
/// the pending equations and to the bindings found so far, so the result is
/// idempotent. Variables are bound right to left, which keeps the names of
/// the first atom in the unified atom.
pub fn mgu(p1: &StdPrv, p2: &StdPrv) -> Option<Substitution> {
    #[cfg(feature = "tracing")]
    let _span = debug_span!("mgu", %p1, %p2).entered();

    if p1.functor() != p2.functor() || p1.arity() != p2.arity() {
        #[cfg(feature = "tracing")]
        trace!("mgu_functor_mismatch");
        return None;
    }

    let mut subst = Substitution::new();
    let mut worklist: SmallVec<[(Term, Term); 8]> = p1
        .terms()
        .iter()
        .cloned()
        .zip(p2.terms().iter().cloned())
        .rev()
        .collect();

    while let Some((a, b)) = worklist.pop() {
        if a == b {
            continue;
        }
        let binding = match (&a, &b) {
            (_, Term::Variable(v)) => Binding::new(v.clone(), a.clone()),
            (Term::Variable(v), Term::Constant(_)) => Binding::new(v.clone(), b.clone()),
            (Term::Constant(_), Term::Constant(_)) => {
                #[cfg(feature = "tracing")]
                trace!(%a, %b, "mgu_constant_clash");
                return None;
            }
        };
        let step = Substitution::single(binding.clone());
        for (x, y) in worklist.iter_mut() {
            *x = step.apply(x);
            *y = step.apply(y);
        }
        // source is unbound: every earlier binding was applied to it
        subst.extend_normalized(binding).ok()?;
    }

    #[cfg(feature = "tracing")]
    trace!(bindings = subst.len(), "mgu_success");

    Some(subst)
}

/// True if the two atoms have a common instance.
pub fn unifiable(p1: &StdPrv, p2: &StdPrv) -> bool {
    mgu(p1, p2).is_some()
}

#[cfg(test)]
#[path = "tests/unify.rs"]
mod tests;
