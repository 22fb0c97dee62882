//! Basic blocks, terminators, and edges.

use fixedbitset::FixedBitSet;
use jsty_ast::{Expr, ForHead, Pattern, Stmt, VarDecl};
use jsty_common::{Diagnostic, Span};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Handle to a basic block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

impl BlockId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EdgeId(pub u32);

impl EdgeId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One work item inside a block. Most items are borrowed statements; loop
/// plumbing introduces expression and binding items that have no statement
/// of their own.
#[derive(Clone, Copy, Debug)]
pub enum BlockItem<'a> {
    Stmt(&'a Stmt),
    /// `for (let i = 0; ...)` init declaration.
    VarDecl(&'a VarDecl),
    /// A bare expression evaluated for effect (for-init exprs, for-update).
    Expr(&'a Expr),
    /// The loop-variable assignment at the head of a `for…in`/`for…of`
    /// body.
    IterBinding {
        head: &'a ForHead,
        iterable: &'a Expr,
        of: bool,
    },
    /// The `catch (e)` binding at the head of a handler block.
    CatchBinding { param: &'a Pattern },
}

/// Block terminators. Every block has exactly one after construction.
#[derive(Clone, Debug)]
pub enum Terminator<'a> {
    Fallthrough {
        target: BlockId,
    },
    Branch {
        test: &'a Expr,
        consequent: BlockId,
        alternate: BlockId,
    },
    Switch {
        discriminant: &'a Expr,
        /// Ordered (case-test, target) pairs.
        cases: Vec<(&'a Expr, BlockId)>,
        /// The default clause's block, or the switch exit when absent.
        default: BlockId,
    },
    Return {
        argument: Option<&'a Expr>,
    },
    Throw {
        argument: &'a Expr,
        /// Nearest enclosing catch, or none (the throw exits the function).
        handler: Option<BlockId>,
    },
    Break {
        /// Resolved at build time; `None` records an ill-formed jump.
        target: Option<BlockId>,
        label: Option<&'a str>,
    },
    Continue {
        target: Option<BlockId>,
        label: Option<&'a str>,
    },
    Try {
        body: BlockId,
        catch: Option<BlockId>,
        finally: Option<BlockId>,
        continuation: BlockId,
        catch_binding: Option<&'a Pattern>,
    },
}

/// Edge kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    Normal,
    TrueBranch,
    FalseBranch,
    Exception,
    Finally,
    BackEdge,
    Break,
    Continue,
}

/// The narrowing condition an edge carries: the tested expression and
/// whether the edge is taken when it is truthy.
#[derive(Clone, Copy, Debug)]
pub struct NarrowCond<'a> {
    pub expr: &'a Expr,
    pub when_truthy: bool,
}

/// One CFG edge.
#[derive(Clone, Copy, Debug)]
pub struct Edge<'a> {
    pub id: EdgeId,
    pub source: BlockId,
    pub target: BlockId,
    pub kind: EdgeKind,
    pub cond: Option<NarrowCond<'a>>,
}

/// An ordered sequence of items plus one terminator.
#[derive(Clone, Debug)]
pub struct BasicBlock<'a> {
    pub id: BlockId,
    pub items: Vec<BlockItem<'a>>,
    pub terminator: Option<Terminator<'a>>,
    /// Span of the first item, for unreachable-code reporting.
    pub span: Span,
}

impl<'a> BasicBlock<'a> {
    pub(crate) fn new(id: BlockId) -> Self {
        Self {
            id,
            items: Vec::new(),
            terminator: None,
            span: Span::dummy(),
        }
    }
}

/// The constructed control-flow graph.
#[derive(Debug)]
pub struct ControlFlowGraph<'a> {
    pub blocks: Vec<BasicBlock<'a>>,
    pub edges: Vec<Edge<'a>>,
    pub entry: BlockId,
    /// The program-end block (fallthrough off the last statement).
    pub exit: BlockId,
    pub preds: FxHashMap<BlockId, SmallVec<[EdgeId; 2]>>,
    pub succs: FxHashMap<BlockId, SmallVec<[EdgeId; 2]>>,
    /// Edges `u -> v` where `v` dominates `u`.
    pub back_edges: FxHashSet<EdgeId>,
    /// Dominator sets, indexed by block.
    pub dominators: Vec<FixedBitSet>,
    /// Post-dominator sets, indexed by block.
    pub post_dominators: Vec<FixedBitSet>,
    /// Reverse post-order, computed once.
    pub rpo: Vec<BlockId>,
    /// Ill-formed-source conditions recorded during construction.
    pub issues: Vec<Diagnostic>,
}

impl<'a> ControlFlowGraph<'a> {
    #[must_use]
    pub fn block(&self, id: BlockId) -> &BasicBlock<'a> {
        &self.blocks[id.index()]
    }

    #[must_use]
    pub fn edge(&self, id: EdgeId) -> &Edge<'a> {
        &self.edges[id.index()]
    }

    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Outgoing edges of a block.
    pub fn successors(&self, id: BlockId) -> impl Iterator<Item = &Edge<'a>> {
        self.succs
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&e| self.edge(e))
    }

    /// Incoming edges of a block.
    pub fn predecessors(&self, id: BlockId) -> impl Iterator<Item = &Edge<'a>> {
        self.preds
            .get(&id)
            .into_iter()
            .flatten()
            .map(|&e| self.edge(e))
    }

    /// Whether `a` dominates `b`.
    #[must_use]
    pub fn dominates(&self, a: BlockId, b: BlockId) -> bool {
        self.dominators[b.index()].contains(a.index())
    }

    #[must_use]
    pub fn is_back_edge(&self, edge: EdgeId) -> bool {
        self.back_edges.contains(&edge)
    }

    /// Whether `block` is the target of any back edge (a loop header).
    #[must_use]
    pub fn is_loop_header(&self, block: BlockId) -> bool {
        self.back_edges
            .iter()
            .any(|&e| self.edge(e).target == block)
    }

    /// The natural loop of a back edge `u -> v`: `v` plus every block that
    /// reaches `u` without passing through `v`.
    #[must_use]
    pub fn natural_loop(&self, back_edge: EdgeId) -> FxHashSet<BlockId> {
        let edge = self.edge(back_edge);
        let header = edge.target;
        let mut body = FxHashSet::default();
        body.insert(header);
        let mut stack = vec![edge.source];
        while let Some(block) = stack.pop() {
            if !body.insert(block) {
                continue;
            }
            for pred in self.predecessors(block) {
                stack.push(pred.source);
            }
        }
        body
    }

    /// All blocks in any natural loop headed at `header`.
    #[must_use]
    pub fn loop_blocks(&self, header: BlockId) -> FxHashSet<BlockId> {
        let mut blocks = FxHashSet::default();
        for &e in &self.back_edges {
            if self.edge(e).target == header {
                blocks.extend(self.natural_loop(e));
            }
        }
        blocks
    }
}
