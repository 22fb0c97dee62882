//! Flow-sensitive type inference over a lowered CFG.
//!
//! The primary path is direct dataflow: CFG construction, per-block
//! transfer, and an RPO fixed point with edge-condition narrowing and
//! loop widening. A constraint-generation front-end (`constraints`)
//! targets the biunification solver where polymorphic generalization
//! matters.
//!
//! The public surface is `analyze`, which returns sorted annotations and
//! the diagnostic list.

pub mod annotations;
pub mod builtins;
pub mod checker;
pub mod constraints;
pub mod env;
mod expr;
mod fixpoint;
mod hoist;
mod narrowing;
pub mod state;
mod stmt;

pub use annotations::{Analysis, Annotation, AnnotationKind};
pub use checker::analyze;
pub use constraints::{GeneratedConstraints, generate};
pub use env::{Binding, BindingKind, TypeEnvironment};
pub use state::{TypingState, join_states, states_equal};

// AST builders shared by unit and integration tests.
pub mod test_fixtures;
