//! Lowering from a statement list to basic blocks.
//!
//! The builder keeps a current block, appending items until a statement
//! terminates it. Break/continue resolve to concrete targets at build time
//! through a stack of enclosing loop/switch/label scopes; a throw resolves
//! to the nearest enclosing catch through a handler stack. Ill-formed
//! jumps record an issue and leave the successor edge out; construction
//! never panics.
//!
//! After a terminator is written, any further statements in the same
//! source block open a fresh block with no predecessors; the checker
//! reports it as unreachable.

use crate::dominators;
use crate::graph::{
    BasicBlock, BlockId, BlockItem, ControlFlowGraph, Edge, EdgeId, EdgeKind, NarrowCond,
    Terminator,
};
use jsty_ast::{Expr, ForInit, Stmt};
use jsty_common::{Diagnostic, DiagnosticKind, Span, Spanned};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;

/// Build the CFG of a statement list.
#[must_use]
pub fn build_cfg<'a>(body: &'a [Stmt]) -> ControlFlowGraph<'a> {
    let mut builder = Builder::new();
    builder.lower_stmts(body);
    builder.finish()
}

/// An enclosing construct a `break` can target.
struct BreakScope<'a> {
    target: BlockId,
    label: Option<&'a str>,
    /// Loops and switches accept unlabeled breaks; labeled statements
    /// require their label.
    accepts_unlabeled: bool,
}

/// An enclosing loop a `continue` can target.
struct ContinueScope<'a> {
    target: BlockId,
    label: Option<&'a str>,
}

struct Builder<'a> {
    blocks: Vec<BasicBlock<'a>>,
    edges: Vec<Edge<'a>>,
    entry: BlockId,
    exit: BlockId,
    current: BlockId,
    breakables: Vec<BreakScope<'a>>,
    continuables: Vec<ContinueScope<'a>>,
    /// Catch blocks of enclosing try statements, innermost last.
    handlers: Vec<BlockId>,
    /// Label waiting to attach to the next loop statement.
    pending_label: Option<&'a str>,
    issues: Vec<Diagnostic>,
}

impl<'a> Builder<'a> {
    fn new() -> Self {
        let mut builder = Self {
            blocks: Vec::new(),
            edges: Vec::new(),
            entry: BlockId(0),
            exit: BlockId(1),
            current: BlockId(0),
            breakables: Vec::new(),
            continuables: Vec::new(),
            handlers: Vec::new(),
            pending_label: None,
            issues: Vec::new(),
        };
        builder.entry = builder.new_block();
        builder.exit = builder.new_block();
        builder.current = builder.entry;
        builder
    }

    fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(BasicBlock::new(id));
        id
    }

    fn add_edge(
        &mut self,
        source: BlockId,
        target: BlockId,
        kind: EdgeKind,
        cond: Option<NarrowCond<'a>>,
    ) -> EdgeId {
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Edge {
            id,
            source,
            target,
            kind,
            cond,
        });
        id
    }

    fn is_terminated(&self) -> bool {
        self.blocks[self.current.index()].terminator.is_some()
    }

    fn terminate(&mut self, terminator: Terminator<'a>) {
        let block = &mut self.blocks[self.current.index()];
        if block.terminator.is_none() {
            block.terminator = Some(terminator);
        }
    }

    /// Append an item, opening a fresh (unreachable) block if the current
    /// one already terminated.
    fn append(&mut self, item: BlockItem<'a>, span: Span) {
        if self.is_terminated() {
            self.current = self.new_block();
        }
        let block = &mut self.blocks[self.current.index()];
        if block.span.is_dummy() {
            block.span = span;
        }
        block.items.push(item);
    }

    /// Seal the current block with a fallthrough to `target` unless it
    /// already terminated, then continue in `target`.
    fn seal_into(&mut self, target: BlockId, kind: EdgeKind, cond: Option<NarrowCond<'a>>) {
        if !self.is_terminated() {
            self.terminate(Terminator::Fallthrough { target });
            self.add_edge(self.current, target, kind, cond);
        }
        self.current = target;
    }

    fn lower_stmts(&mut self, stmts: &'a [Stmt]) {
        for stmt in stmts {
            self.lower_stmt(stmt);
        }
    }

    fn lower_stmt(&mut self, stmt: &'a Stmt) {
        // A pending label only attaches to the statement lowered next.
        let label = self.pending_label.take();
        match stmt {
            Stmt::VarDecl(_)
            | Stmt::Function { .. }
            | Stmt::Class { .. }
            | Stmt::Expr { .. }
            | Stmt::Empty { .. }
            | Stmt::Debugger { .. } => {
                self.append(BlockItem::Stmt(stmt), stmt.span());
            }

            Stmt::Block { body, .. } => self.lower_stmts(body),

            Stmt::If {
                test,
                consequent,
                alternate,
                ..
            } => self.lower_if(test, consequent, alternate.as_deref()),

            Stmt::While { test, body, .. } => self.lower_while(test, body, label),
            Stmt::DoWhile { body, test, .. } => self.lower_do_while(body, test, label),
            Stmt::For {
                init,
                test,
                update,
                body,
                ..
            } => self.lower_for(init.as_deref(), test.as_ref(), update.as_ref(), body, label),
            Stmt::ForIn {
                left, right, body, ..
            } => self.lower_for_in_of(left, right, body, false, label),
            Stmt::ForOf {
                left, right, body, ..
            } => self.lower_for_in_of(left, right, body, true, label),

            Stmt::Switch {
                discriminant,
                cases,
                ..
            } => self.lower_switch(discriminant, cases, label),

            Stmt::Try {
                block,
                handler,
                finalizer,
                ..
            } => self.lower_try(block, handler.as_ref(), finalizer.as_deref()),

            Stmt::Throw { argument, .. } => {
                let handler = self.handlers.last().copied();
                self.append_marker(stmt.span());
                self.terminate(Terminator::Throw { argument, handler });
                if let Some(catch) = handler {
                    self.add_edge(self.current, catch, EdgeKind::Exception, None);
                }
            }

            Stmt::Return { argument, .. } => {
                self.append_marker(stmt.span());
                self.terminate(Terminator::Return {
                    argument: argument.as_ref(),
                });
            }

            Stmt::Break { label: jump, span } => {
                self.append_marker(*span);
                let jump = jump.as_deref();
                let target = self.resolve_break(jump);
                if target.is_none() {
                    self.issue_bad_jump("break", jump, *span);
                }
                self.terminate(Terminator::Break {
                    target,
                    label: jump,
                });
                if let Some(target) = target {
                    self.add_edge(self.current, target, EdgeKind::Break, None);
                }
            }

            Stmt::Continue { label: jump, span } => {
                self.append_marker(*span);
                let jump = jump.as_deref();
                let target = self.resolve_continue(jump);
                if target.is_none() {
                    self.issue_bad_jump("continue", jump, *span);
                }
                self.terminate(Terminator::Continue {
                    target,
                    label: jump,
                });
                if let Some(target) = target {
                    self.add_edge(self.current, target, EdgeKind::Continue, None);
                }
            }

            Stmt::Labeled {
                label: name, body, ..
            } => {
                if is_loop(body) {
                    self.pending_label = Some(name);
                    self.lower_stmt(body);
                } else {
                    let end = self.new_block();
                    self.breakables.push(BreakScope {
                        target: end,
                        label: Some(name),
                        accepts_unlabeled: false,
                    });
                    self.lower_stmt(body);
                    self.breakables.pop();
                    self.seal_into(end, EdgeKind::Normal, None);
                }
            }
        }
    }

    /// Ensure the current block records a span even when the statement
    /// only produces a terminator.
    fn append_marker(&mut self, span: Span) {
        if self.is_terminated() {
            self.current = self.new_block();
        }
        let block = &mut self.blocks[self.current.index()];
        if block.span.is_dummy() {
            block.span = span;
        }
    }

    fn lower_if(&mut self, test: &'a Expr, consequent: &'a Stmt, alternate: Option<&'a Stmt>) {
        if self.is_terminated() {
            self.current = self.new_block();
        }
        let cons = self.new_block();
        let merge = self.new_block();
        let alt = if alternate.is_some() {
            self.new_block()
        } else {
            merge
        };

        self.terminate(Terminator::Branch {
            test,
            consequent: cons,
            alternate: alt,
        });
        self.add_edge(
            self.current,
            cons,
            EdgeKind::TrueBranch,
            Some(NarrowCond {
                expr: test,
                when_truthy: true,
            }),
        );
        self.add_edge(
            self.current,
            alt,
            EdgeKind::FalseBranch,
            Some(NarrowCond {
                expr: test,
                when_truthy: false,
            }),
        );

        self.current = cons;
        self.lower_stmt(consequent);
        self.seal_into(merge, EdgeKind::Normal, None);

        if let Some(alternate) = alternate {
            self.current = alt;
            self.lower_stmt(alternate);
            self.seal_into(merge, EdgeKind::Normal, None);
        }
        self.current = merge;
    }

    fn lower_while(&mut self, test: &'a Expr, body: &'a Stmt, label: Option<&'a str>) {
        let header = self.new_block();
        self.seal_into(header, EdgeKind::Normal, None);

        let body_block = self.new_block();
        let exit = self.new_block();
        self.terminate(Terminator::Branch {
            test,
            consequent: body_block,
            alternate: exit,
        });
        self.add_edge(
            header,
            body_block,
            EdgeKind::TrueBranch,
            Some(NarrowCond {
                expr: test,
                when_truthy: true,
            }),
        );
        self.add_edge(
            header,
            exit,
            EdgeKind::FalseBranch,
            Some(NarrowCond {
                expr: test,
                when_truthy: false,
            }),
        );

        self.breakables.push(BreakScope {
            target: exit,
            label,
            accepts_unlabeled: true,
        });
        self.continuables.push(ContinueScope {
            target: header,
            label,
        });
        self.current = body_block;
        self.lower_stmt(body);
        if !self.is_terminated() {
            self.terminate(Terminator::Fallthrough { target: header });
            self.add_edge(self.current, header, EdgeKind::BackEdge, None);
        }
        self.continuables.pop();
        self.breakables.pop();
        self.current = exit;
    }

    fn lower_do_while(&mut self, body: &'a Stmt, test: &'a Expr, label: Option<&'a str>) {
        let body_block = self.new_block();
        self.seal_into(body_block, EdgeKind::Normal, None);
        let test_block = self.new_block();
        let exit = self.new_block();

        self.breakables.push(BreakScope {
            target: exit,
            label,
            accepts_unlabeled: true,
        });
        self.continuables.push(ContinueScope {
            target: test_block,
            label,
        });
        self.lower_stmt(body);
        self.seal_into(test_block, EdgeKind::Normal, None);
        self.continuables.pop();
        self.breakables.pop();

        self.terminate(Terminator::Branch {
            test,
            consequent: body_block,
            alternate: exit,
        });
        self.add_edge(
            test_block,
            body_block,
            EdgeKind::BackEdge,
            Some(NarrowCond {
                expr: test,
                when_truthy: true,
            }),
        );
        self.add_edge(
            test_block,
            exit,
            EdgeKind::FalseBranch,
            Some(NarrowCond {
                expr: test,
                when_truthy: false,
            }),
        );
        self.current = exit;
    }

    fn lower_for(
        &mut self,
        init: Option<&'a ForInit>,
        test: Option<&'a Expr>,
        update: Option<&'a Expr>,
        body: &'a Stmt,
        label: Option<&'a str>,
    ) {
        match init {
            Some(ForInit::VarDecl(decl)) => self.append(BlockItem::VarDecl(decl), decl.span),
            Some(ForInit::Expr { expr, span }) => self.append(BlockItem::Expr(expr), *span),
            None => {}
        }

        let header = self.new_block();
        self.seal_into(header, EdgeKind::Normal, None);

        let body_block = self.new_block();
        let exit = self.new_block();
        let update_block = update.map(|_| self.new_block());
        let continue_target = update_block.unwrap_or(header);

        match test {
            Some(test) => {
                self.terminate(Terminator::Branch {
                    test,
                    consequent: body_block,
                    alternate: exit,
                });
                self.add_edge(
                    header,
                    body_block,
                    EdgeKind::TrueBranch,
                    Some(NarrowCond {
                        expr: test,
                        when_truthy: true,
                    }),
                );
                self.add_edge(
                    header,
                    exit,
                    EdgeKind::FalseBranch,
                    Some(NarrowCond {
                        expr: test,
                        when_truthy: false,
                    }),
                );
            }
            None => {
                // `for (;;)` runs until a break.
                self.terminate(Terminator::Fallthrough { target: body_block });
                self.add_edge(header, body_block, EdgeKind::Normal, None);
            }
        }

        self.breakables.push(BreakScope {
            target: exit,
            label,
            accepts_unlabeled: true,
        });
        self.continuables.push(ContinueScope {
            target: continue_target,
            label,
        });
        self.current = body_block;
        self.lower_stmt(body);
        match update_block {
            Some(update_id) => {
                self.seal_into(update_id, EdgeKind::Normal, None);
                let update = update.expect("update block implies update expr");
                self.append(BlockItem::Expr(update), update.span());
                self.terminate(Terminator::Fallthrough { target: header });
                self.add_edge(update_id, header, EdgeKind::BackEdge, None);
            }
            None => {
                if !self.is_terminated() {
                    self.terminate(Terminator::Fallthrough { target: header });
                    self.add_edge(self.current, header, EdgeKind::BackEdge, None);
                }
            }
        }
        self.continuables.pop();
        self.breakables.pop();
        self.current = exit;
    }

    fn lower_for_in_of(
        &mut self,
        left: &'a jsty_ast::ForHead,
        right: &'a Expr,
        body: &'a Stmt,
        of: bool,
        label: Option<&'a str>,
    ) {
        let header = self.new_block();
        self.seal_into(header, EdgeKind::Normal, None);
        let body_block = self.new_block();
        let exit = self.new_block();

        // The has-next condition is proxied by the iterable expression.
        self.terminate(Terminator::Branch {
            test: right,
            consequent: body_block,
            alternate: exit,
        });
        self.add_edge(
            header,
            body_block,
            EdgeKind::TrueBranch,
            Some(NarrowCond {
                expr: right,
                when_truthy: true,
            }),
        );
        self.add_edge(
            header,
            exit,
            EdgeKind::FalseBranch,
            Some(NarrowCond {
                expr: right,
                when_truthy: false,
            }),
        );

        self.breakables.push(BreakScope {
            target: exit,
            label,
            accepts_unlabeled: true,
        });
        self.continuables.push(ContinueScope {
            target: header,
            label,
        });
        self.current = body_block;
        // The loop-variable assignment lives at the body head.
        self.append(
            BlockItem::IterBinding {
                head: left,
                iterable: right,
                of,
            },
            right.span(),
        );
        self.lower_stmt(body);
        if !self.is_terminated() {
            self.terminate(Terminator::Fallthrough { target: header });
            self.add_edge(self.current, header, EdgeKind::BackEdge, None);
        }
        self.continuables.pop();
        self.breakables.pop();
        self.current = exit;
    }

    fn lower_switch(
        &mut self,
        discriminant: &'a Expr,
        cases: &'a [jsty_ast::SwitchCase],
        label: Option<&'a str>,
    ) {
        if self.is_terminated() {
            self.current = self.new_block();
        }
        let switch_block = self.current;
        let exit = self.new_block();

        // One block per clause, in source order, for C-style fallthrough.
        let clause_blocks: Vec<BlockId> = cases.iter().map(|_| self.new_block()).collect();
        let mut case_targets = Vec::new();
        let mut default = exit;
        for (case, &block) in cases.iter().zip(&clause_blocks) {
            match &case.test {
                Some(test) => case_targets.push((test, block)),
                None => default = block,
            }
        }

        self.terminate(Terminator::Switch {
            discriminant,
            cases: case_targets.clone(),
            default,
        });
        for &(_, target) in &case_targets {
            self.add_edge(switch_block, target, EdgeKind::Normal, None);
        }
        self.add_edge(switch_block, default, EdgeKind::Normal, None);

        self.breakables.push(BreakScope {
            target: exit,
            label,
            accepts_unlabeled: true,
        });
        for (i, (case, &block)) in cases.iter().zip(&clause_blocks).enumerate() {
            self.current = block;
            self.lower_stmts(&case.body);
            // An unterminated clause falls through to the next one.
            let next = clause_blocks.get(i + 1).copied().unwrap_or(exit);
            if !self.is_terminated() {
                self.terminate(Terminator::Fallthrough { target: next });
                self.add_edge(self.current, next, EdgeKind::Normal, None);
            }
        }
        self.breakables.pop();
        self.current = exit;
    }

    fn lower_try(
        &mut self,
        block: &'a [Stmt],
        handler: Option<&'a jsty_ast::CatchClause>,
        finalizer: Option<&'a [Stmt]>,
    ) {
        if self.is_terminated() {
            self.current = self.new_block();
        }
        let body = self.new_block();
        let catch = handler.map(|_| self.new_block());
        let finally = finalizer.map(|_| self.new_block());
        let continuation = self.new_block();

        self.terminate(Terminator::Try {
            body,
            catch,
            finally,
            continuation,
            catch_binding: handler.and_then(|h| h.param.as_ref()),
        });
        self.add_edge(self.current, body, EdgeKind::Normal, None);
        if let Some(catch) = catch {
            // Any statement in the protected body may transfer here.
            self.add_edge(body, catch, EdgeKind::Exception, None);
        }

        // `finally` is linked on all normal and exceptional exits.
        let after_body = finally.unwrap_or(continuation);
        let after_kind = if finally.is_some() {
            EdgeKind::Finally
        } else {
            EdgeKind::Normal
        };

        if let Some(catch) = catch {
            self.handlers.push(catch);
        }
        self.current = body;
        self.lower_stmts(block);
        self.seal_into(after_body, after_kind, None);
        if catch.is_some() {
            self.handlers.pop();
        }

        if let (Some(catch_block), Some(clause)) = (catch, handler) {
            self.current = catch_block;
            if let Some(param) = &clause.param {
                self.append(BlockItem::CatchBinding { param }, clause.span);
            } else {
                self.append_marker(clause.span);
            }
            self.lower_stmts(&clause.body);
            self.seal_into(after_body, after_kind, None);
        }

        if let (Some(finally_block), Some(stmts)) = (finally, finalizer) {
            self.current = finally_block;
            self.lower_stmts(stmts);
            self.seal_into(continuation, EdgeKind::Normal, None);
        }
        self.current = continuation;
    }

    fn resolve_break(&self, label: Option<&str>) -> Option<BlockId> {
        match label {
            Some(name) => self
                .breakables
                .iter()
                .rev()
                .find(|s| s.label == Some(name))
                .map(|s| s.target),
            None => self
                .breakables
                .iter()
                .rev()
                .find(|s| s.accepts_unlabeled)
                .map(|s| s.target),
        }
    }

    fn resolve_continue(&self, label: Option<&str>) -> Option<BlockId> {
        match label {
            Some(name) => self
                .continuables
                .iter()
                .rev()
                .find(|s| s.label == Some(name))
                .map(|s| s.target),
            None => self.continuables.last().map(|s| s.target),
        }
    }

    fn issue_bad_jump(&mut self, kind: &str, label: Option<&str>, span: Span) {
        let message = match label {
            Some(name) => format!("no enclosing target labeled '{name}' for '{kind}'"),
            None => format!("no enclosing target for '{kind}'"),
        };
        self.issues
            .push(Diagnostic::new(DiagnosticKind::UndefinedVariable, message, span));
    }

    fn finish(mut self) -> ControlFlowGraph<'a> {
        // The last open block falls through to the program exit.
        let exit = self.exit;
        if !self.is_terminated() {
            self.terminate(Terminator::Fallthrough { target: exit });
            self.add_edge(self.current, exit, EdgeKind::Normal, None);
        }
        // Leftover blocks (e.g. unreachable trailers) fall through too.
        for i in 0..self.blocks.len() {
            if self.blocks[i].terminator.is_none() && BlockId(i as u32) != exit {
                self.blocks[i].terminator = Some(Terminator::Fallthrough { target: exit });
                self.add_edge(BlockId(i as u32), exit, EdgeKind::Normal, None);
            }
        }
        self.blocks[exit.index()].terminator = Some(Terminator::Return { argument: None });

        let mut preds: FxHashMap<BlockId, SmallVec<[EdgeId; 2]>> = FxHashMap::default();
        let mut succs: FxHashMap<BlockId, SmallVec<[EdgeId; 2]>> = FxHashMap::default();
        for edge in &self.edges {
            succs.entry(edge.source).or_default().push(edge.id);
            preds.entry(edge.target).or_default().push(edge.id);
        }

        debug!(
            blocks = self.blocks.len(),
            edges = self.edges.len(),
            "cfg constructed"
        );

        let mut cfg = ControlFlowGraph {
            blocks: self.blocks,
            edges: self.edges,
            entry: self.entry,
            exit,
            preds,
            succs,
            back_edges: rustc_hash::FxHashSet::default(),
            dominators: Vec::new(),
            post_dominators: Vec::new(),
            rpo: Vec::new(),
            issues: self.issues,
        };
        dominators::analyze(&mut cfg);
        cfg
    }
}

fn is_loop(stmt: &Stmt) -> bool {
    matches!(
        stmt,
        Stmt::While { .. }
            | Stmt::DoWhile { .. }
            | Stmt::For { .. }
            | Stmt::ForIn { .. }
            | Stmt::ForOf { .. }
    )
}

#[cfg(test)]
#[path = "tests/builder_tests.rs"]
mod tests;
