//! Edge-condition narrowing.
//!
//! An edge's condition refines the state that flows across it. The
//! recognized patterns are all sound: `typeof x === "..."` comparisons,
//! `x === null` / `x === undefined` / `x != null`, and bare truthiness.
//! Compound conditions narrow through `!`, `&&` (true edge), and `||`
//! (false edge).

use crate::checker::Checker;
use crate::state::TypingState;
use jsty_ast::{BinaryOp, Expr, LogicalOp, UnaryOp};
use jsty_cfg::NarrowCond;
use jsty_solver::TypeId;
use jsty_solver::narrow::{
    TypeofKind, keep_nullable, narrow_falsy, narrow_out_typeof, narrow_to_typeof,
    narrow_truthy, remove_nullable,
};

impl Checker {
    /// Apply an edge's narrowing condition to a state. The refinement
    /// lands in a child environment, leaving the incoming one untouched.
    pub(crate) fn apply_condition(&mut self, state: &mut TypingState, cond: &NarrowCond<'_>) {
        if !state.reachable {
            return;
        }
        state.env = state.env.child();
        self.narrow_by(state, cond.expr, cond.when_truthy);
    }

    fn narrow_by(&mut self, state: &mut TypingState, expr: &Expr, truthy: bool) {
        match expr {
            // `!e` flips the edge sense.
            Expr::Unary {
                op: UnaryOp::Not,
                argument,
                ..
            } => self.narrow_by(state, argument, !truthy),

            // `a && b` holds both on the true edge; `a || b` fails both
            // on the false edge. The other edges admit no sound refinement.
            Expr::Logical {
                op: LogicalOp::And,
                left,
                right,
                ..
            } if truthy => {
                self.narrow_by(state, left, true);
                self.narrow_by(state, right, true);
            }
            Expr::Logical {
                op: LogicalOp::Or,
                left,
                right,
                ..
            } if !truthy => {
                self.narrow_by(state, left, false);
                self.narrow_by(state, right, false);
            }

            Expr::Binary {
                op, left, right, ..
            } if op.is_equality() => {
                let positive = truthy != op.is_negated_equality();
                let strict = matches!(op, BinaryOp::StrictEq | BinaryOp::StrictNotEq);
                self.narrow_equality(state, left, right, positive, strict);
            }

            // Truthiness of a bare name.
            Expr::Ident { name, .. } => {
                let Some(binding) = state.env.lookup(name) else {
                    return;
                };
                let current = binding.ty;
                let narrowed = if truthy {
                    narrow_truthy(&mut self.store, current)
                } else {
                    narrow_falsy(&mut self.store, current)
                };
                self.apply_refinement(state, name.clone(), narrowed);
            }

            _ => {}
        }
    }

    fn narrow_equality(
        &mut self,
        state: &mut TypingState,
        left: &Expr,
        right: &Expr,
        positive: bool,
        strict: bool,
    ) {
        // typeof x === "kind" (either operand order).
        if let Some((name, kind)) = typeof_comparison(left, right) {
            let Some(binding) = state.env.lookup(name) else {
                return;
            };
            let current = binding.ty;
            match kind {
                Some(kind) => {
                    let narrowed = if positive {
                        narrow_to_typeof(&mut self.store, current, kind)
                    } else {
                        narrow_out_typeof(&mut self.store, current, kind)
                    };
                    self.apply_refinement(state, name.to_string(), narrowed);
                }
                // A typo'd typeof string can never match.
                None if positive => state.reachable = false,
                None => {}
            }
            return;
        }

        // x === null / x === undefined (either operand order).
        if let Some((name, null_side, undef_side)) = nullish_comparison(left, right, strict) {
            let Some(binding) = state.env.lookup(name) else {
                return;
            };
            let current = binding.ty;
            let narrowed = if positive {
                keep_nullable(&mut self.store, current, null_side, undef_side)
            } else {
                remove_nullable(&mut self.store, current, null_side, undef_side)
            };
            self.apply_refinement(state, name.to_string(), narrowed);
        }
    }

    fn apply_refinement(&mut self, state: &mut TypingState, name: String, narrowed: TypeId) {
        state.env.refine(&name, narrowed);
        // A contradiction makes the edge dead.
        if narrowed == TypeId::NEVER {
            state.reachable = false;
        }
    }
}

/// Match `typeof x <op> "kind"` in either operand order. Returns the
/// variable name and the parsed kind (`None` for unknown kind strings).
fn typeof_comparison<'a>(
    left: &'a Expr,
    right: &'a Expr,
) -> Option<(&'a str, Option<TypeofKind>)> {
    let (typeof_expr, literal) = match (is_typeof(left), is_typeof(right)) {
        (Some(name), None) => (name, right.string_value()?),
        (None, Some(name)) => (name, left.string_value()?),
        _ => return None,
    };
    Some((typeof_expr, TypeofKind::parse(literal)))
}

fn is_typeof(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Unary {
            op: UnaryOp::TypeOf,
            argument,
            ..
        } => argument.ident_name(),
        _ => None,
    }
}

/// Match `x <op> null` / `x <op> undefined` in either operand order.
/// Returns (name, affects-null, affects-undefined): loose comparisons
/// against null affect both nullable members.
fn nullish_comparison<'a>(
    left: &'a Expr,
    right: &'a Expr,
    strict: bool,
) -> Option<(&'a str, bool, bool)> {
    let (name, literal) = match (left.ident_name(), right.ident_name()) {
        (Some(name), _) if is_nullish_literal(right) => (name, right),
        (_, Some(name)) if is_nullish_literal(left) => (name, left),
        _ => return None,
    };
    match literal {
        Expr::Null { .. } => Some((name, true, !strict)),
        Expr::Undefined { .. } => Some((name, !strict, true)),
        _ => None,
    }
}

fn is_nullish_literal(expr: &Expr) -> bool {
    matches!(expr, Expr::Null { .. } | Expr::Undefined { .. })
}
