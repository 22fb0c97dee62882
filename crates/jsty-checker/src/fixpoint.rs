//! The iterative fixed-point solver.
//!
//! Blocks are visited in reverse post-order until no entry or exit state
//! changes, or the iteration ceiling is hit (which records a
//! `did-not-converge` diagnostic and keeps the last states). Loop-mutated
//! variables are widened from literal types to their bases at the header
//! join, which bounds the ascending chains literals would otherwise form.
//!
//! After convergence a reporting pass re-runs transfer from the final
//! entry states; only that pass records diagnostics, annotations, and the
//! final expression types.

use crate::checker::Checker;
use crate::hoist;
use crate::state::{TypingState, join_states, states_equal};
use jsty_ast::{AssignTarget, Expr, ForHead, Pattern, Stmt, VarDecl};
use jsty_cfg::{BlockId, BlockItem, ControlFlowGraph, Terminator, build_cfg};
use jsty_common::DiagnosticKind;
use jsty_common::Spanned;
use jsty_common::limits::MAX_FIXPOINT_ITERATIONS;
use jsty_solver::{TypeId, widen_literal};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, trace};

/// What a finished flow hands back to its caller.
pub(crate) struct FlowOutcome {
    /// Join of every `return` (the CFG exit contributes `undefined` when
    /// the body can complete normally); `never` if nothing returns.
    pub return_type: TypeId,
}

impl Checker {
    /// Build the CFG of `body` and solve it to a fixed point starting
    /// from `initial`.
    pub(crate) fn run_flow(&mut self, body: &[Stmt], mut initial: TypingState) -> FlowOutcome {
        let cfg = build_cfg(body);
        self.total_blocks += cfg.block_count();
        let n = cfg.block_count();

        hoist::hoist_declarations(&mut initial.env, body);

        let mut entry_states: Vec<TypingState> = vec![TypingState::unreachable(); n];
        let mut exit_states: Vec<TypingState> = vec![TypingState::unreachable(); n];
        entry_states[cfg.entry.index()] = initial;

        // Names assigned inside each loop, per header, for widening.
        let widen_sets = loop_widen_sets(&cfg);

        let decl_mark = self.pending_decls.len();
        let saved_returns = std::mem::take(&mut self.return_types);

        // Fixed-point iterations never report; the reporting pass below
        // re-runs transfer from the converged states exactly once.
        let was_reporting = self.reporting;
        self.reporting = false;

        let mut iterations = 0;
        let mut converged = false;
        while iterations < MAX_FIXPOINT_ITERATIONS {
            iterations += 1;
            let mut changed = false;

            for &block in &cfg.rpo {
                if block != cfg.entry {
                    let mut entry = self.join_predecessors(&cfg, block, &exit_states);
                    if let Some(widen) = widen_sets.get(&block) {
                        self.widen_loop_names(&mut entry, widen);
                    }
                    if !states_equal(&entry, &entry_states[block.index()]) {
                        entry_states[block.index()] = entry;
                        changed = true;
                    }
                }
                let entry = entry_states[block.index()].clone();
                let exit = self.transfer_block(&cfg, block, entry);
                if !states_equal(&exit, &exit_states[block.index()]) {
                    exit_states[block.index()] = exit;
                    changed = true;
                }
            }

            trace!(iteration = iterations, changed, "fixpoint sweep");
            if !changed {
                converged = true;
                break;
            }
        }
        self.total_iterations += iterations;
        debug!(iterations, converged, blocks = n, "flow solved");

        self.reporting = was_reporting;

        // Reporting pass: re-run transfer from the final states. Runs
        // even when not reporting, to collect return types.
        self.return_types.clear();
        for &block in &cfg.rpo {
            let entry = entry_states[block.index()].clone();
            if !entry.reachable {
                continue;
            }
            let exit = self.transfer_block(&cfg, block, entry);
            if self.reporting {
                for (&key, &ty) in &exit.expr_types {
                    self.expr_types_final.insert(key, ty);
                }
            }
            exit_states[block.index()] = exit;
        }

        if self.reporting {
            for issue in &cfg.issues {
                self.diagnostics.push(issue.clone());
            }
            if !converged {
                self.report(
                    DiagnosticKind::DidNotConverge,
                    format!("analysis did not reach a fixed point in {iterations} iterations"),
                    body.first().map_or(jsty_common::Span::at(0), Spanned::span),
                );
            }
            for block in &cfg.blocks {
                if !entry_states[block.id.index()].reachable
                    && !block.items.is_empty()
                    && !block.span.is_dummy()
                {
                    self.report(
                        DiagnosticKind::UnreachableCode,
                        "unreachable code",
                        block.span,
                    );
                }
            }
            self.flush_decls(decl_mark, &exit_states);
        } else {
            self.pending_decls.truncate(decl_mark);
        }

        let returns = std::mem::replace(&mut self.return_types, saved_returns);
        let return_type = if returns.is_empty() {
            TypeId::NEVER
        } else {
            self.store.union(returns.into_vec())
        };

        FlowOutcome { return_type }
    }

    /// Entry state: the join of predecessor exits, each refined by its
    /// edge's narrowing condition.
    fn join_predecessors(
        &mut self,
        cfg: &ControlFlowGraph<'_>,
        block: BlockId,
        exit_states: &[TypingState],
    ) -> TypingState {
        let mut joined = TypingState::unreachable();
        let incoming: Vec<_> = cfg.predecessors(block).copied().collect();
        for edge in incoming {
            let mut state = exit_states[edge.source.index()].clone();
            if let Some(cond) = &edge.cond {
                self.apply_condition(&mut state, cond);
            }
            joined = join_states(&mut self.store, &joined, &state);
        }
        joined
    }

    fn widen_loop_names(&mut self, state: &mut TypingState, names: &FxHashSet<String>) {
        if !state.reachable {
            return;
        }
        for name in names {
            if let Some(binding) = state.env.lookup(name) {
                let current = binding.ty;
                let widened = widen_literal(&mut self.store, current);
                if widened != current {
                    state.env.refine(name, widened);
                }
            }
        }
    }
}

/// For each loop header, the names assigned anywhere inside its natural
/// loop(s). These are the bindings widening coarsens at the header join.
fn loop_widen_sets(cfg: &ControlFlowGraph<'_>) -> FxHashMap<BlockId, FxHashSet<String>> {
    let mut sets: FxHashMap<BlockId, FxHashSet<String>> = FxHashMap::default();
    let headers: FxHashSet<BlockId> = cfg
        .back_edges
        .iter()
        .map(|&e| cfg.edge(e).target)
        .collect();
    for header in headers {
        let mut names = FxHashSet::default();
        for block_id in cfg.loop_blocks(header) {
            let block = cfg.block(block_id);
            for item in &block.items {
                collect_assigned_in_item(item, &mut names);
            }
            match &block.terminator {
                Some(Terminator::Branch { test, .. }) => collect_assigned_in_expr(test, &mut names),
                Some(Terminator::Switch { discriminant, .. }) => {
                    collect_assigned_in_expr(discriminant, &mut names);
                }
                Some(Terminator::Return {
                    argument: Some(arg),
                }) => collect_assigned_in_expr(arg, &mut names),
                Some(Terminator::Throw { argument, .. }) => {
                    collect_assigned_in_expr(argument, &mut names);
                }
                _ => {}
            }
        }
        sets.insert(header, names);
    }
    sets
}

fn collect_assigned_in_item(item: &BlockItem<'_>, names: &mut FxHashSet<String>) {
    match item {
        BlockItem::Stmt(stmt) => collect_assigned_in_stmt(stmt, names),
        BlockItem::VarDecl(decl) => collect_assigned_in_var_decl(decl, names),
        BlockItem::Expr(expr) => collect_assigned_in_expr(expr, names),
        BlockItem::IterBinding { head, .. } => match head {
            ForHead::VarDecl(decl) => {
                for declarator in &decl.declarators {
                    collect_pattern_names(&declarator.pattern, names);
                }
            }
            ForHead::Pattern { pattern, .. } => collect_pattern_names(pattern, names),
        },
        BlockItem::CatchBinding { .. } => {}
    }
}

fn collect_assigned_in_stmt(stmt: &Stmt, names: &mut FxHashSet<String>) {
    match stmt {
        Stmt::Expr { expr, .. } => collect_assigned_in_expr(expr, names),
        Stmt::VarDecl(decl) => collect_assigned_in_var_decl(decl, names),
        _ => {}
    }
}

fn collect_assigned_in_var_decl(decl: &VarDecl, names: &mut FxHashSet<String>) {
    for declarator in &decl.declarators {
        if let Some(init) = &declarator.init {
            collect_assigned_in_expr(init, names);
        }
    }
}

fn collect_pattern_names(pattern: &Pattern, names: &mut FxHashSet<String>) {
    match pattern {
        Pattern::Ident { name, .. } => {
            names.insert(name.clone());
        }
        Pattern::Array { elements, .. } => {
            for element in elements.iter().flatten() {
                collect_pattern_names(element, names);
            }
        }
        Pattern::Object {
            properties, rest, ..
        } => {
            for prop in properties {
                collect_pattern_names(&prop.value, names);
            }
            if let Some(rest) = rest {
                collect_pattern_names(rest, names);
            }
        }
        Pattern::Assign { target, .. } => collect_pattern_names(target, names),
        Pattern::Rest { argument, .. } => collect_pattern_names(argument, names),
    }
}

/// Walk an expression tree for assignment and update targets.
fn collect_assigned_in_expr(expr: &Expr, names: &mut FxHashSet<String>) {
    match expr {
        Expr::Assign { target, value, .. } => {
            match target {
                AssignTarget::Ident { name, .. } => {
                    names.insert(name.clone());
                }
                AssignTarget::Pattern { pattern, .. } => collect_pattern_names(pattern, names),
                AssignTarget::Member { object, .. } => collect_assigned_in_expr(object, names),
                AssignTarget::Index { object, index, .. } => {
                    collect_assigned_in_expr(object, names);
                    collect_assigned_in_expr(index, names);
                }
            }
            collect_assigned_in_expr(value, names);
        }
        Expr::Update { argument, .. } => {
            if let Some(name) = argument.ident_name() {
                names.insert(name.to_string());
            }
        }
        Expr::Unary { argument, .. } | Expr::Spread { argument, .. } | Expr::Await { argument, .. } => {
            collect_assigned_in_expr(argument, names);
        }
        Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
            collect_assigned_in_expr(left, names);
            collect_assigned_in_expr(right, names);
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
            ..
        } => {
            collect_assigned_in_expr(test, names);
            collect_assigned_in_expr(consequent, names);
            collect_assigned_in_expr(alternate, names);
        }
        Expr::Call { callee, args, .. } => {
            collect_assigned_in_expr(callee, names);
            for arg in args {
                collect_assigned_in_expr(arg, names);
            }
        }
        Expr::New { callee, args, .. } => {
            collect_assigned_in_expr(callee, names);
            for arg in args {
                collect_assigned_in_expr(arg, names);
            }
        }
        Expr::Member { object, .. } => collect_assigned_in_expr(object, names),
        Expr::Index { object, index, .. } => {
            collect_assigned_in_expr(object, names);
            collect_assigned_in_expr(index, names);
        }
        Expr::Array { elements, .. } => {
            for element in elements.iter().flatten() {
                collect_assigned_in_expr(element, names);
            }
        }
        Expr::Sequence { exprs, .. } | Expr::Template { exprs, .. } => {
            for e in exprs {
                collect_assigned_in_expr(e, names);
            }
        }
        _ => {}
    }
}
