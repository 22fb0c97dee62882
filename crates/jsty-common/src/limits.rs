//! Centralized limits and thresholds for the analyzer.
//!
//! This module provides shared constants for iteration ceilings, recursion
//! depths, and capacity limits used throughout the codebase. Centralizing
//! these values prevents duplicate definitions with inconsistent values and
//! documents the rationale for each limit.

// =============================================================================
// Iteration Ceilings
// =============================================================================

/// Maximum iterations of the fixed-point loop over the CFG.
///
/// The dataflow solver iterates in reverse post-order until no block's
/// entry/exit state changes. Widening guarantees termination for programs
/// whose loops only widen literals to their bases, but the ceiling bounds
/// pathological inputs. Hitting it records a `did-not-converge` diagnostic
/// and keeps the last states.
pub const MAX_FIXPOINT_ITERATIONS: u32 = 2_000;

/// Maximum biunification steps for one constraint set.
///
/// Each structural decomposition or atomic elimination counts as one step.
/// Bounds the disjunctive search on union-right / intersection-left
/// constraints. Exceeding the budget records an `unsatisfiable` error for
/// the remaining constraints.
pub const MAX_BIUNIFY_STEPS: u32 = 100_000;

/// Maximum candidate branches explored per disjunctive constraint.
///
/// Union on the right / intersection on the left of a flow constraint
/// requires trying members until one satisfies. The search is bounded per
/// constraint so one bad union cannot blow the step budget.
pub const MAX_DISJUNCT_BRANCHES: usize = 64;

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum depth for expression transfer recursion.
///
/// Each nested expression adds a frame; past this depth the transfer
/// function returns `any` instead of recursing further.
pub const MAX_EXPR_DEPTH: u32 = 500;

/// Maximum depth when converting an automaton back to a type.
///
/// Cycles are re-tied with recursive binders, so a correct automaton never
/// hits this; it guards against malformed inputs.
pub const MAX_DECOMPILE_DEPTH: u32 = 1_000;

// =============================================================================
// Capacity Limits
// =============================================================================

/// Maximum states in a single type automaton.
///
/// A polar type produces at most one state per subterm; minimization only
/// shrinks. A cap well above anything a real program produces keeps
/// construction finite on adversarial inputs.
pub const MAX_AUTOMATON_STATES: usize = 100_000;

/// Inline capacity for type lists (union members, parameters, transitions).
///
/// Most unions and parameter lists in real code have fewer than 8 members,
/// so `SmallVec<[T; TYPE_LIST_INLINE]>` avoids heap allocation in the
/// common case.
pub const TYPE_LIST_INLINE: usize = 8;

/// Maximum union members displayed in a diagnostic message.
///
/// Longer unions are elided with `| ...` to keep messages readable.
pub const UNION_MEMBER_DIAGNOSTIC_LIMIT: usize = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixpoint_ceiling_is_in_the_low_thousands() {
        assert!(MAX_FIXPOINT_ITERATIONS >= 1_000);
        assert!(MAX_FIXPOINT_ITERATIONS <= 10_000);
    }
}
