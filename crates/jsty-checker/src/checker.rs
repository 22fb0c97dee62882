//! The analyzer driver.
//!
//! `analyze` seeds the global environment, runs the flow-sensitive fixed
//! point over the program's CFG (and, recursively, over every function
//! body), then shapes annotations and diagnostics for the caller.
//!
//! Diagnostics are only recorded during the reporting pass that re-runs
//! transfer from the converged states, so the fixed-point iterations never
//! duplicate them.

use crate::annotations::{Analysis, Annotation, AnnotationKind, finalize_annotations};
use crate::builtins::seed_globals;
use crate::state::TypingState;
use jsty_ast::Program;
use jsty_common::{Diagnostic, DiagnosticKind, LineMap, Span, diagnostics::sort_diagnostics};
use jsty_solver::{TypeId, TypeStore, simplify_for_output, type_string};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// A declaration observed during the reporting pass, waiting for its
/// final (post-fixpoint) type.
pub(crate) struct PendingDecl {
    pub name: String,
    pub span: Span,
    pub node_type: &'static str,
    pub kind: AnnotationKind,
    /// The type at the declaration site; used when no exit state sees the
    /// name (declarations in unreachable code).
    pub decl_ty: TypeId,
    /// Fixed types (parameters, properties) skip the exit-state join.
    pub fixed: bool,
}

/// Analyzer state shared across all flows of one file.
pub(crate) struct Checker {
    pub store: TypeStore,
    pub diagnostics: Vec<Diagnostic>,
    pub annotations: Vec<Annotation>,
    pub pending_decls: Vec<PendingDecl>,
    /// Declaration spans already annotated (dedupe across passes).
    pub recorded_spans: FxHashSet<(u32, u32)>,
    /// True only during the post-convergence reporting pass.
    pub reporting: bool,
    /// Expression-transfer recursion depth.
    pub depth: u32,
    /// Generalization level for the constraint path.
    pub level: u32,
    /// Return types collected for the innermost flow.
    pub return_types: SmallVec<[TypeId; 8]>,
    pub total_iterations: u32,
    pub total_blocks: usize,
    pub expr_types_final: FxHashMap<(u32, u32), TypeId>,
}

impl Checker {
    pub(crate) fn new() -> Self {
        Self {
            store: TypeStore::new(),
            diagnostics: Vec::new(),
            annotations: Vec::new(),
            pending_decls: Vec::new(),
            recorded_spans: FxHashSet::default(),
            reporting: false,
            depth: 0,
            level: 0,
            return_types: SmallVec::new(),
            total_iterations: 0,
            total_blocks: 0,
            expr_types_final: FxHashMap::default(),
        }
    }

    /// Record a diagnostic; suppressed outside the reporting pass.
    pub(crate) fn report(&mut self, kind: DiagnosticKind, message: impl Into<String>, span: Span) {
        if self.reporting {
            self.diagnostics.push(Diagnostic::new(kind, message, span));
        }
    }

    /// `any` carrying the reason a diagnostic assigned it.
    pub(crate) fn any_because(&mut self, reason: &str) -> TypeId {
        self.store.any_with_reason(reason)
    }

    /// Queue a declaration annotation (reporting pass only, once per
    /// span).
    pub(crate) fn record_decl(
        &mut self,
        name: &str,
        span: Span,
        node_type: &'static str,
        kind: AnnotationKind,
        decl_ty: TypeId,
        fixed: bool,
    ) {
        if !self.reporting || !self.recorded_spans.insert((span.start, span.end)) {
            return;
        }
        self.pending_decls.push(PendingDecl {
            name: name.to_string(),
            span,
            node_type,
            kind,
            decl_ty,
            fixed,
        });
    }
}

/// Analyze a parsed program. `source` is used only to map offsets to
/// line/column positions; pass the original text when available.
#[must_use]
pub fn analyze(program: &Program, source: &str) -> Analysis {
    let mut ck = Checker::new();
    let globals = seed_globals(&mut ck.store);
    let initial = TypingState::reachable(globals.child());

    // The outermost flow reports; nested flows inherit the flag.
    ck.reporting = true;
    ck.run_flow(&program.body, initial);

    let line_map = if source.is_empty() {
        LineMap::empty()
    } else {
        LineMap::build(source)
    };

    let mut errors = ck.diagnostics;
    for diag in &mut errors {
        let pos = line_map.position(diag.span.start);
        diag.line = pos.line;
        diag.column = pos.column;
    }
    sort_diagnostics(&mut errors);

    let mut annotations = ck.annotations;
    finalize_annotations(&mut annotations, &line_map);

    let expr_types = ck
        .expr_types_final
        .iter()
        .map(|(&key, &ty)| (key, type_string(&ck.store, ty)))
        .collect();

    Analysis {
        annotations,
        errors,
        iterations: ck.total_iterations,
        block_count: ck.total_blocks,
        expr_types,
    }
}

impl Checker {
    /// Turn the pending declarations of one finished flow into
    /// annotations, joining each name over the flow's final exit states.
    pub(crate) fn flush_decls(&mut self, from_index: usize, exit_states: &[TypingState]) {
        let pending: Vec<PendingDecl> = self.pending_decls.split_off(from_index);
        for decl in pending {
            let final_ty = if decl.fixed {
                decl.decl_ty
            } else {
                let mut seen = Vec::new();
                for state in exit_states.iter().filter(|s| s.reachable) {
                    if let Some(binding) = state.env.lookup(&decl.name) {
                        seen.push(binding.ty);
                    }
                }
                if seen.is_empty() {
                    decl.decl_ty
                } else {
                    self.store.union(seen)
                }
            };
            let simplified = simplify_for_output(&mut self.store, final_ty);
            let rendered = type_string(&self.store, simplified);
            self.annotations.push(Annotation {
                start: decl.span.start,
                end: decl.span.end,
                line: 0,
                column: 0,
                node_type: decl.node_type,
                name: Some(decl.name),
                ty: simplified,
                type_string: rendered,
                kind: decl.kind,
            });
        }
    }
}
