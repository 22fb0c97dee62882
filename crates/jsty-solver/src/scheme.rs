//! Polymorphic typing schemes for rank-1 let-polymorphism.
//!
//! Variables carry a generalization level; `generalize` quantifies every
//! variable whose level is deeper than the enclosing scope, and
//! `instantiate` replaces quantified variables with fresh ones. Scheme
//! subsumption reuses the biunification solver rather than ad-hoc
//! matching.

use crate::biunify::biunify;
use crate::constraint::Constraint;
use crate::intern::{TypeData, TypeId, TypeStore};
use jsty_common::Span;
use rustc_hash::FxHashMap;

/// A typing scheme `∀ vars. body`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeScheme {
    /// Quantified variable ids.
    pub vars: Vec<u32>,
    pub body: TypeId,
}

impl TypeScheme {
    /// A monomorphic scheme.
    #[must_use]
    pub const fn mono(body: TypeId) -> Self {
        Self {
            vars: Vec::new(),
            body,
        }
    }

    /// Generalize `ty` over every variable introduced at a level deeper
    /// than `outer_level` (i.e. free in `ty` but not in the enclosing
    /// environment).
    #[must_use]
    pub fn generalize(store: &TypeStore, ty: TypeId, outer_level: u32) -> Self {
        let mut vars: Vec<u32> = store
            .free_vars(ty)
            .into_iter()
            .filter(|&v| var_level(store, ty, v).is_some_and(|lvl| lvl > outer_level))
            .collect();
        vars.sort_unstable();
        Self { vars, body: ty }
    }

    /// Replace quantified variables with fresh ones at `level`.
    pub fn instantiate(&self, store: &mut TypeStore, level: u32) -> TypeId {
        if self.vars.is_empty() {
            return self.body;
        }
        let mut result = self.body;
        let fresh: FxHashMap<u32, TypeId> = self
            .vars
            .iter()
            .map(|&v| (v, store.fresh_var(None, level)))
            .collect();
        for (&old, &new) in &fresh {
            result = store.substitute(result, old, new);
        }
        result
    }

    /// Whether `self` is at least as general as `other`: instantiating
    /// `self` can be made to flow into `other`'s body. Decided by the
    /// biunification solver.
    pub fn subsumes(&self, store: &mut TypeStore, other: &Self) -> bool {
        let instantiated = self.instantiate(store, u32::MAX);
        let constraint = Constraint::new(instantiated, other.body, Span::dummy());
        biunify(store, &[constraint]).is_ok()
    }
}

/// Find the level of variable `v` by locating one of its occurrences.
fn var_level(store: &TypeStore, ty: TypeId, v: u32) -> Option<u32> {
    match store.data(ty) {
        TypeData::Var { id, level, .. } if *id == v => Some(*level),
        TypeData::Var { .. }
        | TypeData::Prim { .. }
        | TypeData::Top
        | TypeData::Bottom
        | TypeData::Any { .. }
        | TypeData::Never
        | TypeData::Unknown => None,
        TypeData::Function(shape) => shape
            .params
            .iter()
            .find_map(|p| var_level(store, p.ty, v))
            .or_else(|| var_level(store, shape.ret, v)),
        TypeData::Record { fields } => fields.iter().find_map(|f| var_level(store, f.ty, v)),
        TypeData::Array { elem, tuple } => var_level(store, *elem, v).or_else(|| {
            tuple
                .as_ref()
                .and_then(|ts| ts.iter().find_map(|&t| var_level(store, t, v)))
        }),
        TypeData::Promise { resolved } => var_level(store, *resolved, v),
        TypeData::Class(shape) => var_level(store, shape.instance, v)
            .or_else(|| var_level(store, shape.statics, v)),
        TypeData::Union(members) | TypeData::Intersection(members) => {
            members.iter().find_map(|&m| var_level(store, m, v))
        }
        TypeData::Recursive { var, body } => {
            if *var == v {
                None
            } else {
                var_level(store, *body, v)
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/scheme_tests.rs"]
mod tests;
