use crate::error::{Error, Result};
use crate::term::{LogicalVariable, Term};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// A single replacement `X/t`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Binding {
    source: LogicalVariable,
    target: Term,
}

impl Binding {
    pub fn new(source: LogicalVariable, target: impl Into<Term>) -> Self {
        Self {
            source,
            target: target.into(),
        }
    }

    pub fn source(&self) -> &LogicalVariable {
        &self.source
    }

    pub fn target(&self) -> &Term {
        &self.target
    }

    /// A binding `X/X` changes nothing.
    pub fn is_trivial(&self) -> bool {
        self.target.as_variable() == Some(&self.source)
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.target)
    }
}

/// A substitution maps logical variables to terms.
///
/// Source variables are pairwise distinct. Unbound variables map to
/// themselves, so the empty substitution is the identity. Application is
/// simultaneous: targets are never rewritten again.
///
/// Bindings are kept sorted by source, so equality and hashing do not
/// depend on the order they were added in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<Binding>", into = "Vec<Binding>")]
pub struct Substitution {
    bindings: SmallVec<[Binding; 4]>,
}

impl Substitution {
    /// The identity substitution.
    pub fn new() -> Self {
        Self {
            bindings: SmallVec::new(),
        }
    }

    pub fn single(binding: Binding) -> Self {
        let mut bindings = SmallVec::new();
        bindings.push(binding);
        Self { bindings }
    }

    /// Build a substitution, rejecting a variable bound twice.
    pub fn from_bindings(bindings: impl IntoIterator<Item = Binding>) -> Result<Self> {
        let mut subst = Self::new();
        for b in bindings {
            subst.push(b)?;
        }
        Ok(subst)
    }

    /// Bind `var` to `term`. Fails if `var` is already bound.
    pub fn bind(&mut self, var: LogicalVariable, term: impl Into<Term>) -> Result<()> {
        self.push(Binding::new(var, term))
    }

    fn push(&mut self, binding: Binding) -> Result<()> {
        match self.bindings.binary_search_by(|b| b.source().cmp(binding.source())) {
            Ok(_) => Err(Error::DuplicateBinding(binding.source().clone())),
            Err(at) => {
                self.bindings.insert(at, binding);
                Ok(())
            }
        }
    }

    pub fn get(&self, var: &LogicalVariable) -> Option<&Term> {
        self.bindings
            .iter()
            .find(|b| b.source() == var)
            .map(|b| b.target())
    }

    pub fn is_bound(&self, var: &LogicalVariable) -> bool {
        self.get(var).is_some()
    }

    /// True if applying this substitution changes nothing.
    pub fn is_identity(&self) -> bool {
        self.bindings.iter().all(Binding::is_trivial)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub fn domain(&self) -> impl Iterator<Item = &LogicalVariable> {
        self.bindings.iter().map(Binding::source)
    }

    /// Union of two substitutions with disjoint domains.
    pub fn compose(&self, other: &Substitution) -> Result<Substitution> {
        if let Some(shared) = other.domain().find(|v| self.is_bound(v)) {
            return Err(Error::OverlappingDomains(shared.clone()));
        }
        let mut out = self.clone();
        for b in other.iter() {
            out.push(b.clone())?;
        }
        Ok(out)
    }

    /// Replace a bound variable by its image; anything else is returned as is.
    pub fn apply(&self, term: &Term) -> Term {
        match term {
            Term::Variable(v) => self.get(v).cloned().unwrap_or_else(|| term.clone()),
            Term::Constant(_) => term.clone(),
        }
    }

    /// Rewrite every target with `binding`, then append it.
    ///
    /// Keeps the substitution idempotent while bindings are accumulated one
    /// at a time, which is what the work-list unifier needs.
    pub(crate) fn extend_normalized(&mut self, binding: Binding) -> Result<()> {
        let step = Substitution::single(binding.clone());
        for b in self.bindings.iter_mut() {
            b.target = step.apply(&b.target);
        }
        self.push(binding)
    }

    /// Drop the bindings whose source satisfies `pred`.
    pub fn without(&self, pred: impl Fn(&LogicalVariable) -> bool) -> Substitution {
        Self {
            bindings: self
                .bindings
                .iter()
                .filter(|b| !pred(b.source()))
                .cloned()
                .collect(),
        }
    }
}

impl From<Binding> for Substitution {
    fn from(b: Binding) -> Self {
        Substitution::single(b)
    }
}

impl TryFrom<Vec<Binding>> for Substitution {
    type Error = Error;

    fn try_from(bindings: Vec<Binding>) -> Result<Self> {
        Self::from_bindings(bindings)
    }
}

impl From<Substitution> for Vec<Binding> {
    fn from(subst: Substitution) -> Self {
        subst.bindings.into_vec()
    }
}

impl fmt::Display for Substitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, b) in self.bindings.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            b.fmt(f)?;
        }
        f.write_str("}")
    }
}

#[cfg(test)]
#[path = "tests/subst.rs"]
mod tests;
