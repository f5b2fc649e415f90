use crate::constraint::Constraint;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// An individual of some population, e.g. `lot1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Constant(Arc<str>);

impl Constant {
    pub fn new(name: &str) -> Self {
        Self(Arc::from(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Finite, ordered domain of a logical variable.
///
/// Guarantees:
/// - Individuals keep the order they were given in
/// - Membership never changes after creation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Population {
    individuals: Arc<[Constant]>,
}

impl Population {
    /// Create a population from a list of individuals.
    /// Duplicates are kept out; the first occurrence wins.
    pub fn new(individuals: impl IntoIterator<Item = Constant>) -> Self {
        let mut unique: Vec<Constant> = Vec::new();
        for c in individuals {
            if !unique.contains(&c) {
                unique.push(c);
            }
        }
        Self {
            individuals: unique.into(),
        }
    }

    /// Create the population `prefix1 .. prefixN`.
    pub fn numbered(prefix: &str, size: usize) -> Self {
        Self::new((1..=size).map(|i| Constant::new(&format!("{}{}", prefix, i))))
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn contains(&self, c: &Constant) -> bool {
        self.individuals.contains(c)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Constant> {
        self.individuals.iter()
    }

    pub fn individual_at(&self, index: usize) -> Option<&Constant> {
        self.individuals.get(index)
    }
}

/// A logical variable ranging over a finite population.
///
/// Two logical variables are the same iff they have the same name and the
/// same population.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogicalVariable {
    name: Arc<str>,
    population: Population,
}

impl LogicalVariable {
    pub fn new(name: &str, population: Population) -> Self {
        Self {
            name: Arc::from(name),
            population,
        }
    }

    /// Shorthand for a variable over `prefix1 .. prefixN`.
    pub fn with_population(name: &str, prefix: &str, size: usize) -> Self {
        Self::new(name, Population::numbered(prefix, size))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    /// Same population under another name.
    pub fn renamed(&self, name: &str) -> Self {
        Self::new(name, self.population.clone())
    }

    /// Individuals not excluded by a `self ≠ c` constraint in `constraints`.
    /// Constraints between two logical variables exclude nobody here.
    pub fn individuals_satisfying<'a>(
        &self,
        constraints: impl IntoIterator<Item = &'a Constraint>,
    ) -> Population {
        let excluded: Vec<&Constant> = constraints
            .into_iter()
            .filter_map(|c| c.excluded_constant(self))
            .collect();
        Population::new(
            self.population
                .iter()
                .filter(|c| !excluded.contains(c))
                .cloned(),
        )
    }
}

impl fmt::Display for LogicalVariable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A term is either a logical variable or a constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Term {
    Variable(LogicalVariable),
    Constant(Constant),
}

impl Term {
    pub fn as_variable(&self) -> Option<&LogicalVariable> {
        match self {
            Term::Variable(v) => Some(v),
            Term::Constant(_) => None,
        }
    }

    pub fn as_constant(&self) -> Option<&Constant> {
        match self {
            Term::Variable(_) => None,
            Term::Constant(c) => Some(c),
        }
    }

    pub fn is_variable(&self) -> bool {
        matches!(self, Term::Variable(_))
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, Term::Constant(_))
    }
}

impl From<LogicalVariable> for Term {
    fn from(v: LogicalVariable) -> Self {
        Term::Variable(v)
    }
}

impl From<&LogicalVariable> for Term {
    fn from(v: &LogicalVariable) -> Self {
        Term::Variable(v.clone())
    }
}

impl From<Constant> for Term {
    fn from(c: Constant) -> Self {
        Term::Constant(c)
    }
}

impl From<&Constant> for Term {
    fn from(c: &Constant) -> Self {
        Term::Constant(c.clone())
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Variable(v) => v.fmt(f),
            Term::Constant(c) => c.fmt(f),
        }
    }
}

#[cfg(test)]
#[path = "tests/term.rs"]
mod tests;
