//! Common types and utilities for the jsty type inferrer.
//!
//! This crate provides foundational types used across all jsty crates:
//! - Source spans (`Span`, `Spanned`)
//! - Position/line-map types for line/column source locations
//! - Diagnostics (`Diagnostic`, `DiagnosticKind`)
//! - Centralized limits and thresholds

// Span - Source location tracking (byte offsets)
pub mod span;
pub use span::{Span, Spanned};

// Position/LineMap types for line/column source locations
pub mod position;
pub use position::{LineMap, Position};

// Diagnostics - analysis errors as data
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticKind};

// Centralized limits and thresholds
pub mod limits;
