//! Type lattice, constraint solving, and type automata.
//!
//! This crate is the language-independent half of the analyzer:
//! - `intern`: hash-consed type storage with `TypeId` handles
//! - `lattice`: union/intersection smart constructors, record join/meet,
//!   free variables, substitution, alpha-aware equality
//! - `subtype`: structural subtype checking
//! - `narrow`: sound narrowing primitives (typeof, nullability, truthiness)
//! - `constraint` / `biunify`: flow constraints and the biunification solver
//! - `automaton`: polar-type automata and partition-refinement minimization
//! - `simplify`: output-side simplification
//! - `display`: type rendering for annotations
//!
//! Everything here is instance-local: the `TypeStore` owns the type-variable
//! counter, so independent analyses never share state.

pub mod automaton;
pub mod biunify;
pub mod constraint;
pub mod display;
pub mod intern;
pub mod lattice;
pub mod narrow;
pub mod scheme;
pub mod simplify;
pub mod subtype;

pub use automaton::{ArrowParam, Head, Polarity, StateId, TransLabel, TypeAutomaton};
pub use biunify::{Bisubstitution, TypeError, TypeErrorKind, biunify};
pub use constraint::{Constraint, ConstraintSet};
pub use display::type_string;
pub use intern::{
    ClassShape, FieldShape, FunctionShape, LiteralValue, Number, ParamShape, PrimKind, TypeData,
    TypeId, TypeStore,
};
pub use narrow::TypeofKind;
pub use scheme::TypeScheme;
pub use simplify::{simplify_for_output, widen_literal};
pub use subtype::SubtypeChecker;
