//! Flow constraints.
//!
//! A flow constraint `τ⁺ ≤ τ⁻` asserts that a producer's output type flows
//! into a consumer's input type. Constraints are generated by walking the
//! AST (the checker crate) and solved in order by biunification.

use crate::intern::TypeId;
use jsty_common::Span;

/// One flow constraint with the source location that produced it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Constraint {
    /// The producing (positive) side.
    pub sub: TypeId,
    /// The consuming (negative) side.
    pub sup: TypeId,
    pub span: Span,
}

impl Constraint {
    #[must_use]
    pub const fn new(sub: TypeId, sup: TypeId, span: Span) -> Self {
        Self { sub, sup, span }
    }
}

/// An ordered list of flow constraints.
#[derive(Clone, Debug, Default)]
pub struct ConstraintSet {
    constraints: Vec<Constraint>,
}

impl ConstraintSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sub: TypeId, sup: TypeId, span: Span) {
        self.constraints.push(Constraint::new(sub, sup, span));
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Constraint] {
        &self.constraints
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }
}

impl IntoIterator for ConstraintSet {
    type Item = Constraint;
    type IntoIter = std::vec::IntoIter<Constraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.constraints.into_iter()
    }
}

impl<'a> IntoIterator for &'a ConstraintSet {
    type Item = &'a Constraint;
    type IntoIter = std::slice::Iter<'a, Constraint>;

    fn into_iter(self) -> Self::IntoIter {
        self.constraints.iter()
    }
}
