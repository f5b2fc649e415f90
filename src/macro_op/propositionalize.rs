use crate::cost::Cost;
use crate::distribution::Marginal;
use crate::error::{Error, Result};
use crate::parfactor::{Parfactor, StdParfactor};
use crate::subst::Binding;
use crate::term::LogicalVariable;

use super::shatter::shatter;

#[cfg(feature = "tracing")]
use crate::trace::{debug_span, trace};

/// Ground one logical variable of one parfactor, one parfactor per
/// individual, then shatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Propositionalize {
    parfactor: StdParfactor,
    variable: LogicalVariable,
}

impl Propositionalize {
    pub fn new(parfactor: StdParfactor, variable: LogicalVariable) -> Option<Self> {
        parfactor
            .logical_variables()
            .contains(&variable)
            .then_some(Self { parfactor, variable })
    }

    pub fn parfactor(&self) -> &StdParfactor {
        &self.parfactor
    }

    pub fn variable(&self) -> &LogicalVariable {
        &self.variable
    }

    pub fn candidates(marginal: &Marginal) -> Vec<Propositionalize> {
        let mut out = Vec::new();
        for p in marginal.distribution().sorted() {
            let Some(s) = p.as_standard() else {
                continue;
            };
            for lv in s.logical_variables() {
                if let Some(op) = Self::new(s.clone(), lv) {
                    out.push(op);
                }
            }
        }
        out
    }

    /// Total size of the ground parfactors: `|F| * |D(lv)|`.
    pub fn cost(&self) -> Cost {
        let domain = self
            .variable
            .individuals_satisfying(self.parfactor.constraints())
            .len();
        Cost::from(self.parfactor.factor_size()).saturating_mul(Cost::from(domain))
    }

    pub fn run(&self, marginal: &Marginal) -> Result<Marginal> {
        #[cfg(feature = "tracing")]
        let _span = debug_span!("propositionalize", variable = %self.variable).entered();

        let individuals = self
            .variable
            .individuals_satisfying(self.parfactor.constraints());
        let mut pieces = Vec::with_capacity(individuals.len());
        let mut rest = Some(self.parfactor.clone());
        for c in individuals.iter() {
            let Some(current) = rest.take() else {
                break;
            };
            if !current.logical_variables().contains(&self.variable) {
                rest = Some(current);
                break;
            }
            let split = current.split_on(&Binding::new(self.variable.clone(), c.clone()))?;

            #[cfg(feature = "tracing")]
            trace!(individual = %c, "propositionalize_split");

            pieces.extend(split.fragment.normalize());
            rest = split.residual.normalize();
        }
        pieces.extend(rest);

        let mut distribution = marginal.distribution().clone();
        if !distribution.remove(&Parfactor::Standard(self.parfactor.clone())) {
            return Err(Error::NotPresent(self.parfactor.to_string()));
        }
        distribution.extend(pieces);
        shatter(&marginal.with_distribution(distribution))
    }
}
