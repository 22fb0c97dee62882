//! Typing states at CFG points.
//!
//! A state is an environment, a per-expression type map, and a
//! reachability flag. The unreachable state is the distinguished bottom
//! of the join: joining with it takes the other side verbatim.

use crate::env::TypeEnvironment;
use jsty_common::Span;
use jsty_solver::{TypeId, TypeStore};
use rustc_hash::FxHashMap;

/// Key for the per-expression type map: the expression's span.
pub type ExprKey = (u32, u32);

#[must_use]
pub fn expr_key(span: Span) -> ExprKey {
    (span.start, span.end)
}

/// The typing state at one CFG point.
#[derive(Clone, Debug, Default)]
pub struct TypingState {
    pub env: TypeEnvironment,
    pub expr_types: FxHashMap<ExprKey, TypeId>,
    pub reachable: bool,
}

impl TypingState {
    /// The distinguished unreachable state.
    #[must_use]
    pub fn unreachable() -> Self {
        Self {
            env: TypeEnvironment::new(),
            expr_types: FxHashMap::default(),
            reachable: false,
        }
    }

    #[must_use]
    pub fn reachable(env: TypeEnvironment) -> Self {
        Self {
            env,
            expr_types: FxHashMap::default(),
            reachable: true,
        }
    }

    pub fn record_expr(&mut self, span: Span, ty: TypeId) {
        self.expr_types.insert(expr_key(span), ty);
    }
}

/// Join two states.
///
/// Both reachable: environment-wise union of binding types, ANDing
/// `definitely_assigned`. One reachable: that one. Neither: unreachable.
#[must_use]
pub fn join_states(store: &mut TypeStore, a: &TypingState, b: &TypingState) -> TypingState {
    match (a.reachable, b.reachable) {
        (false, false) => TypingState::unreachable(),
        (true, false) => a.clone(),
        (false, true) => b.clone(),
        (true, true) => {
            let flat_a = a.env.flatten();
            let flat_b = b.env.flatten();
            let mut merged = FxHashMap::default();

            for (name, binding_a) in &flat_a {
                match flat_b.get(name) {
                    Some(binding_b) => {
                        let mut joined = binding_a.clone();
                        joined.ty = store.union(vec![binding_a.ty, binding_b.ty]);
                        joined.definitely_assigned =
                            binding_a.definitely_assigned && binding_b.definitely_assigned;
                        joined.possibly_mutated =
                            binding_a.possibly_mutated || binding_b.possibly_mutated;
                        merged.insert(name.clone(), joined);
                    }
                    None => {
                        // Visible on one path only: keep, but it may be
                        // unassigned on the other.
                        let mut kept = binding_a.clone();
                        kept.definitely_assigned = false;
                        merged.insert(name.clone(), kept);
                    }
                }
            }
            for (name, binding_b) in &flat_b {
                if !flat_a.contains_key(name) {
                    let mut kept = binding_b.clone();
                    kept.definitely_assigned = false;
                    merged.insert(name.clone(), kept);
                }
            }

            let mut expr_types = a.expr_types.clone();
            for (key, &ty_b) in &b.expr_types {
                match expr_types.get(key).copied() {
                    Some(ty_a) if ty_a != ty_b => {
                        let joined = store.union(vec![ty_a, ty_b]);
                        expr_types.insert(*key, joined);
                    }
                    Some(_) => {}
                    None => {
                        expr_types.insert(*key, ty_b);
                    }
                }
            }

            TypingState {
                env: TypeEnvironment::from_flat(merged),
                expr_types,
                reachable: true,
            }
        }
    }
}

/// Structural equality over environments and reachability; used to detect
/// the fixed point. The expression map is a byproduct and does not gate
/// convergence.
#[must_use]
pub fn states_equal(a: &TypingState, b: &TypingState) -> bool {
    if a.reachable != b.reachable {
        return false;
    }
    if !a.reachable {
        return true;
    }
    a.env == b.env
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
