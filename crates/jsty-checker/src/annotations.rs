//! The analyzer's output surface: annotations and the analysis result.

use jsty_common::{Diagnostic, LineMap, Span};
use jsty_solver::TypeId;
use rustc_hash::FxHashMap;
use serde::Serialize;

/// What kind of declaration an annotation describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    Variable,
    Const,
    Function,
    Class,
    Parameter,
    Property,
}

/// One inferred annotation, anchored to its declaration site.
#[derive(Clone, Debug, Serialize)]
pub struct Annotation {
    pub start: u32,
    pub end: u32,
    pub line: u32,
    pub column: u32,
    #[serde(rename = "nodeType")]
    pub node_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Handle into the analysis's type store (debugging only).
    #[serde(skip)]
    pub ty: TypeId,
    #[serde(rename = "typeString")]
    pub type_string: String,
    pub kind: AnnotationKind,
}

impl Annotation {
    #[must_use]
    pub const fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }
}

/// The result of analyzing one file.
#[derive(Debug, Default, Serialize)]
pub struct Analysis {
    /// Sorted by source start offset.
    pub annotations: Vec<Annotation>,
    pub errors: Vec<Diagnostic>,
    /// Debug payload: fixed-point iterations across all flows.
    pub iterations: u32,
    /// Debug payload: basic blocks across all flows.
    pub block_count: usize,
    /// Debug payload: final type strings per expression span.
    #[serde(skip)]
    pub expr_types: FxHashMap<(u32, u32), String>,
}

impl Analysis {
    /// The final type string of the expression at `span`, when recorded.
    #[must_use]
    pub fn expr_type_at(&self, span: Span) -> Option<&str> {
        self.expr_types
            .get(&(span.start, span.end))
            .map(String::as_str)
    }

    /// The annotation for a declared name, when present.
    #[must_use]
    pub fn annotation_for(&self, name: &str) -> Option<&Annotation> {
        self.annotations
            .iter()
            .find(|a| a.name.as_deref() == Some(name))
    }

    /// Whether any non-warning diagnostic was produced.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| !e.kind.is_warning())
    }
}

/// Sort annotations by start offset (then end, then name) and fill in
/// line/column from the line map. Stable ordering for downstream tools.
pub(crate) fn finalize_annotations(annotations: &mut [Annotation], line_map: &LineMap) {
    annotations.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.end.cmp(&b.end))
            .then_with(|| a.name.cmp(&b.name))
    });
    for annotation in annotations.iter_mut() {
        let pos = line_map.position(annotation.start);
        annotation.line = pos.line;
        annotation.column = pos.column;
    }
}
