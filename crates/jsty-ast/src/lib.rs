//! AST contract for the jsty analyzer.
//!
//! The analyzer consumes a read-only, already-parsed AST; parsing itself is
//! an external collaborator. Every node carries a byte-offset `Span`, and
//! the whole tree is serde round-trippable so a parser can hand us JSON.
//!
//! The node set covers the JavaScript-shaped grammar the analyzer types:
//! declarations, control flow, literals, and the full expression grammar
//! including classes, destructuring, and spread.

pub mod node;
pub mod ops;

pub use node::{
    AssignTarget, CatchClause, Class, ClassMember, Declarator, Expr, ForHead, ForInit, Function,
    FunctionBody, MethodKind, ObjectKey, ObjectProp, ObjectPatternProp, Param, Pattern, Program,
    Stmt, SwitchCase, VarDecl, VarKind,
};
pub use ops::{AssignOp, BinaryOp, LogicalOp, UnaryOp, UpdateOp};
