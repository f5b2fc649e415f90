//! Shattering: refine parfactors until any two Prv occurrences denote
//! identical or disjoint sets of ground random variables.
//!
//! The loop finds one overlap at a time, refines the parfactor on the side
//! that is not yet contained in the other, normalizes the pieces, and starts
//! over. Preservable sets take part as fixed partners: parfactor Prvs are
//! refined against them, never the other way round.

use crate::cost::Cost;
use crate::distribution::{push_folded, Distribution, Marginal, RandomVariableSet};
use crate::error::{Error, Result};
use crate::matching::{compare, Refinement, Relation, View};
use crate::parfactor::Parfactor;
use crate::prv::CountingFormula;
use crate::subst::Binding;
use crate::term::Term;

#[cfg(feature = "tracing")]
use crate::trace::{debug, debug_span, trace};

/// Structural operation that brings a marginal into shattered form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Shatter;

impl Shatter {
    pub fn new() -> Self {
        Shatter
    }

    /// Shattering never builds a larger factor than it splits.
    pub fn cost(&self) -> Cost {
        Cost::ZERO
    }

    pub fn run(&self, marginal: &Marginal) -> Result<Marginal> {
        shatter(marginal)
    }
}

/// One refinement of one parfactor.
#[derive(Debug, Clone, PartialEq)]
enum Action {
    Split(Binding),
    Expand(CountingFormula, Term),
    Convert,
}

/// Occurrence of a Prv: parfactor index, Prv index, and its ground set.
struct Occurrence {
    parfactor: usize,
    prv: usize,
    view: View,
}

fn occurrences(parfactors: &[Parfactor]) -> Vec<Occurrence> {
    let mut out = Vec::new();
    for (i, p) in parfactors.iter().enumerate() {
        for (k, q) in p.prvs().iter().enumerate() {
            out.push(Occurrence {
                parfactor: i,
                prv: k,
                view: View::of(q, p.constraints()),
            });
        }
    }
    out
}

/// First refinement the current parfactors need, if any.
fn next_action(
    parfactors: &[Parfactor],
    preservable: &[RandomVariableSet],
) -> Result<Option<(usize, Action)>> {
    for (i, p) in parfactors.iter().enumerate() {
        if let Some(b) = p.as_standard().and_then(|s| s.normal_form_violation()) {
            return Ok(Some((i, Action::Split(b))));
        }
    }

    let occs = occurrences(parfactors);
    for (j, o2) in occs.iter().enumerate() {
        for o1 in &occs[..j] {
            if o1.parfactor == o2.parfactor && o1.prv == o2.prv {
                continue;
            }
            match compare(&o1.view, &o2.view) {
                Relation::Disjoint => {}
                Relation::Overlap { left: Some(r), .. } => {
                    let action = refine(&parfactors[o1.parfactor], o1.prv, r)?;
                    return Ok(Some((o1.parfactor, action)));
                }
                Relation::Overlap { right: Some(r), .. } => {
                    let action = refine(&parfactors[o2.parfactor], o2.prv, r)?;
                    return Ok(Some((o2.parfactor, action)));
                }
                Relation::Overlap { .. } => {}
            }
        }
    }

    let queries: Vec<View> = preservable.iter().map(View::of_set).collect();
    for o in &occs {
        for q in &queries {
            if let Relation::Overlap { left: Some(r), .. } = compare(&o.view, q) {
                let action = refine(&parfactors[o.parfactor], o.prv, r)?;
                return Ok(Some((o.parfactor, action)));
            }
        }
    }
    Ok(None)
}

/// Translate a refinement of Prv `index` into an action on `p`.
fn refine(p: &Parfactor, index: usize, refinement: Refinement) -> Result<Action> {
    match (p, refinement) {
        (Parfactor::Aggregation(a), Refinement::Split(b)) => {
            let extra = a.extra_variable();
            if b.source() == extra || b.target().as_variable() == Some(extra) {
                Ok(Action::Convert)
            } else {
                Ok(Action::Split(b))
            }
        }
        (Parfactor::Aggregation(_), Refinement::Expand(_)) => Ok(Action::Convert),
        (Parfactor::Standard(_), Refinement::Split(b)) => Ok(Action::Split(b)),
        (Parfactor::Standard(s), Refinement::Expand(t)) => {
            let not_expandable = |cf: &str| Error::NotExpandable {
                formula: cf.to_string(),
                individual: t.to_string(),
            };
            let cf = s
                .prvs()
                .get(index)
                .and_then(|q| q.as_counting())
                .ok_or_else(|| not_expandable(&p.to_string()))?;
            if s.is_expandable(cf, &t) {
                return Ok(Action::Expand(cf.clone(), t.clone()));
            }
            if cf.is_expandable(&t) {
                if let Some(b) = s.expansion_prerequisite(cf, &t) {
                    return Ok(Action::Split(b));
                }
            }
            Err(not_expandable(&cf.to_string()))
        }
    }
}

/// Apply `action` to `p`; the results are normalized and empty pieces dropped.
fn perform(p: &Parfactor, action: Action) -> Result<Vec<Parfactor>> {
    #[cfg(feature = "tracing")]
    trace!(parfactor = %p, action = ?action, "shatter_refine");

    let pieces = match (action, p) {
        (Action::Split(b), _) => {
            let r = p.split_on(&b)?;
            vec![r.fragment, r.residual]
        }
        (Action::Expand(cf, t), Parfactor::Standard(s)) => vec![Parfactor::Standard(s.expand(&cf, &t)?)],
        (Action::Expand(cf, t), Parfactor::Aggregation(_)) => {
            return Err(Error::NotExpandable {
                formula: cf.to_string(),
                individual: t.to_string(),
            })
        }
        (Action::Convert, Parfactor::Aggregation(a)) => a
            .to_std_parfactors()?
            .into_iter()
            .map(Parfactor::Standard)
            .collect(),
        (Action::Convert, Parfactor::Standard(_)) => {
            return Err(Error::InvalidAggregation(format!("{} is not an aggregation parfactor", p)))
        }
    };
    Ok(pieces.into_iter().filter_map(Parfactor::normalize).collect())
}

/// Normalized copies of the parfactors, without the empty ones.
fn normalized(distribution: &Distribution) -> Vec<Parfactor> {
    let mut out: Vec<Parfactor> = Vec::new();
    for p in distribution.sorted() {
        if let Some(n) = p.clone().normalize() {
            push_folded(&mut out, n);
        }
    }
    out
}

/// Shatter the marginal. Preservable sets are left untouched.
pub fn shatter(marginal: &Marginal) -> Result<Marginal> {
    #[cfg(feature = "tracing")]
    let _span = debug_span!("shatter", parfactors = marginal.distribution().len()).entered();

    let mut parfactors = normalized(marginal.distribution());
    while let Some((i, action)) = next_action(&parfactors, marginal.preservable())? {
        let pieces = perform(&parfactors[i], action)?;
        parfactors.remove(i);
        for piece in pieces {
            push_folded(&mut parfactors, piece);
        }
    }

    #[cfg(feature = "tracing")]
    debug!(parfactors = parfactors.len(), "shatter_done");

    Ok(marginal.with_distribution(parfactors.into_iter().collect()))
}

/// True if the marginal needs no further shattering.
pub fn is_shattered(marginal: &Marginal) -> Result<bool> {
    let parfactors: Vec<Parfactor> = marginal.distribution().sorted().into_iter().cloned().collect();
    Ok(next_action(&parfactors, marginal.preservable())?.is_none())
}
