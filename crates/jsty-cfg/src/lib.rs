//! Control-flow graph construction.
//!
//! Lowers a statement list to basic blocks with explicit terminators and
//! typed edges. Branch edges carry narrowing conditions (the tested
//! expression plus a when-truthy flag) that the checker applies when
//! propagating states. The graph also carries reverse post-order,
//! dominators, post-dominators, the back-edge set, and natural-loop
//! membership for widening.
//!
//! Blocks borrow the caller's AST; the CFG never outlives the program it
//! was built from.

pub mod builder;
pub mod dominators;
pub mod graph;

pub use builder::build_cfg;
pub use graph::{
    BasicBlock, BlockId, BlockItem, ControlFlowGraph, Edge, EdgeId, EdgeKind, NarrowCond,
    Terminator,
};
