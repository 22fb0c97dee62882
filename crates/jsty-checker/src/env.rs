//! Typing environments.
//!
//! A `TypeEnvironment` is a scoped, parent-linked mapping from names to
//! bindings. Extension is copy-on-write: creating a child never modifies
//! the parent, which lets narrowing produce a refined environment per
//! branch without touching the incoming one.

use jsty_common::Span;
use jsty_solver::TypeId;
use rustc_hash::{FxHashMap, FxHashSet};
use std::rc::Rc;

/// How a name was introduced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BindingKind {
    Var,
    Let,
    Const,
    Param,
    Function,
    Class,
    Import,
}

impl BindingKind {
    /// Whether writes to the binding are rejected.
    #[must_use]
    pub const fn is_const(self) -> bool {
        matches!(self, BindingKind::Const)
    }
}

/// One name binding.
#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    pub name: String,
    pub ty: TypeId,
    pub decl_span: Span,
    pub kind: BindingKind,
    /// False for hoisted `var`s before their initializer runs.
    pub definitely_assigned: bool,
    /// True once any write beyond the initializer is seen.
    pub possibly_mutated: bool,
}

impl Binding {
    pub fn new(name: impl Into<String>, ty: TypeId, kind: BindingKind, decl_span: Span) -> Self {
        Self {
            name: name.into(),
            ty,
            decl_span,
            kind,
            definitely_assigned: true,
            possibly_mutated: false,
        }
    }
}

/// A parent-linked, copy-on-write environment.
#[derive(Clone, Debug, Default)]
pub struct TypeEnvironment {
    scope: FxHashMap<String, Binding>,
    parent: Option<Rc<TypeEnvironment>>,
}

impl TypeEnvironment {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A child environment sharing this one as its parent. Writes to the
    /// child shadow, never mutate, the parent.
    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            scope: FxHashMap::default(),
            parent: Some(Rc::new(self.clone())),
        }
    }

    /// Look a name up through the scope chain.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        if let Some(binding) = self.scope.get(name) {
            return Some(binding);
        }
        self.parent.as_ref().and_then(|p| p.lookup(name))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Introduce (or shadow) a binding in the local scope.
    pub fn declare(&mut self, binding: Binding) {
        self.scope.insert(binding.name.clone(), binding);
    }

    /// Update the type of an existing binding; the updated copy lands in
    /// the local scope (copy-on-write against the parent chain).
    /// Returns false when the name is unbound.
    pub fn assign(&mut self, name: &str, ty: TypeId) -> bool {
        match self.lookup(name) {
            Some(binding) => {
                let mut updated = binding.clone();
                updated.ty = ty;
                updated.definitely_assigned = true;
                updated.possibly_mutated = true;
                self.scope.insert(name.to_string(), updated);
                true
            }
            None => false,
        }
    }

    /// Replace the type of a binding without marking it mutated (used by
    /// narrowing, which refines rather than writes).
    pub fn refine(&mut self, name: &str, ty: TypeId) -> bool {
        match self.lookup(name) {
            Some(binding) => {
                let mut updated = binding.clone();
                updated.ty = ty;
                self.scope.insert(name.to_string(), updated);
                true
            }
            None => false,
        }
    }

    /// All names visible from this environment.
    #[must_use]
    pub fn visible_names(&self) -> FxHashSet<String> {
        let mut names = match &self.parent {
            Some(parent) => parent.visible_names(),
            None => FxHashSet::default(),
        };
        names.extend(self.scope.keys().cloned());
        names
    }

    /// Flatten the chain into a single-scope environment. Joins produce
    /// flattened environments so equality stays structural.
    #[must_use]
    pub fn flatten(&self) -> FxHashMap<String, Binding> {
        let mut flat = match &self.parent {
            Some(parent) => parent.flatten(),
            None => FxHashMap::default(),
        };
        for (name, binding) in &self.scope {
            flat.insert(name.clone(), binding.clone());
        }
        flat
    }

    /// Build an environment from a flat binding map.
    #[must_use]
    pub fn from_flat(bindings: FxHashMap<String, Binding>) -> Self {
        Self {
            scope: bindings,
            parent: None,
        }
    }
}

impl PartialEq for TypeEnvironment {
    fn eq(&self, other: &Self) -> bool {
        self.flatten() == other.flatten()
    }
}

#[cfg(test)]
#[path = "tests/env_tests.rs"]
mod tests;
