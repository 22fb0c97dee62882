//! Diagnostics - analysis errors as data.
//!
//! Analysis never aborts on a diagnostic: every error is recorded here and
//! the offending expression or declaration is assigned `any` with a reason.
//! The caller decides whether diagnostics are warnings or fatal.

use crate::position::Position;
use crate::span::Span;
use serde::{Deserialize, Serialize};

/// The closed taxonomy of diagnostics the analyzer can produce.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// Structural mismatch between a required and an inferred type.
    IncompatibleTypes,
    /// A record lacks a required field at a use site.
    MissingProperty,
    /// Call target is not a function.
    NotCallable,
    /// `new` target is not a class or constructor.
    NotConstructable,
    /// Too many/few arguments relative to a signature.
    ArgumentCount,
    /// Occurs-check failure in biunification.
    InfiniteType,
    /// Write to a `const` binding.
    ConstAssignment,
    /// Name not in scope.
    UndefinedVariable,
    /// Field not present on the object type.
    UndefinedProperty,
    /// Statements after a terminator in the same source block.
    UnreachableCode,
    /// The fixed-point loop hit its iteration ceiling.
    DidNotConverge,
    /// No unique solution in the constraint backend.
    Ambiguous,
    /// No solution at all in the constraint backend.
    Unsatisfiable,
}

impl DiagnosticKind {
    /// Stable kebab-case name, as rendered in reports and JSON.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IncompatibleTypes => "incompatible-types",
            Self::MissingProperty => "missing-property",
            Self::NotCallable => "not-callable",
            Self::NotConstructable => "not-constructable",
            Self::ArgumentCount => "argument-count",
            Self::InfiniteType => "infinite-type",
            Self::ConstAssignment => "const-assignment",
            Self::UndefinedVariable => "undefined-variable",
            Self::UndefinedProperty => "undefined-property",
            Self::UnreachableCode => "unreachable-code",
            Self::DidNotConverge => "did-not-converge",
            Self::Ambiguous => "ambiguous",
            Self::Unsatisfiable => "unsatisfiable",
        }
    }

    /// Whether this kind is advisory rather than a type error.
    #[must_use]
    pub const fn is_warning(self) -> bool {
        matches!(self, Self::UnreachableCode | Self::DidNotConverge)
    }
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single diagnostic with its source location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    pub span: Span,
    /// 0-indexed line of `span.start`, filled by the annotation pass.
    pub line: u32,
    /// 0-indexed column of `span.start`, filled by the annotation pass.
    pub column: u32,
    /// AST node type that triggered the diagnostic, when known.
    #[serde(rename = "nodeType", skip_serializing_if = "Option::is_none")]
    pub node_type: Option<&'static str>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
            line: 0,
            column: 0,
            node_type: None,
        }
    }

    #[must_use]
    pub fn with_node_type(mut self, node_type: &'static str) -> Self {
        self.node_type = Some(node_type);
        self
    }

    /// Fill in the line/column fields from a resolved position.
    #[must_use]
    pub const fn at_position(mut self, pos: Position) -> Self {
        self.line = pos.line;
        self.column = pos.column;
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}: {}: {}",
            self.line + 1,
            self.column + 1,
            self.kind,
            self.message
        )
    }
}

/// Sort diagnostics by source start offset, then kind name.
///
/// The diagnostic list is a stable, ordered record; downstream tools rely
/// on this ordering being deterministic.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        a.span
            .start
            .cmp(&b.span.start)
            .then_with(|| a.span.end.cmp(&b.span.end))
            .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
    });
}

#[cfg(test)]
#[path = "tests/diagnostics_tests.rs"]
mod tests;
