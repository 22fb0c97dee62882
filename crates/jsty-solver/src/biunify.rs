//! Biunification: solving flow constraints into a bisubstitution.
//!
//! Constraints decompose structurally first (functions contravariant in
//! parameters, records field-wise with width on the positive side, arrays
//! and promises covariant), then atomic variable constraints extend the
//! bisubstitution: `α ≤ τ` composes `[α ⊓ τ / α⁻]`, `τ ≤ α` composes
//! `[α ⊔ τ / α⁺]`. The occurs check rejects unguarded self-reference with
//! an infinite-type error.
//!
//! Solving never throws: all errors are collected and returned as data.

use crate::constraint::Constraint;
use crate::display::diagnostic_type_string;
use crate::intern::{TypeData, TypeId, TypeStore};
use crate::subtype::SubtypeChecker;
use jsty_common::Span;
use jsty_common::limits::{MAX_BIUNIFY_STEPS, MAX_DISJUNCT_BRANCHES};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

/// Error kinds the solver can produce, mirrored onto the diagnostic
/// taxonomy by the checker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypeErrorKind {
    IncompatibleTypes,
    InfiniteType,
    MissingProperty,
    NotCallable,
    NotConstructable,
    ArgumentCount,
    Ambiguous,
    Unsatisfiable,
}

impl TypeErrorKind {
    /// The diagnostic kind this error surfaces as.
    #[must_use]
    pub const fn diagnostic_kind(self) -> jsty_common::DiagnosticKind {
        use jsty_common::DiagnosticKind as D;
        match self {
            Self::IncompatibleTypes => D::IncompatibleTypes,
            Self::InfiniteType => D::InfiniteType,
            Self::MissingProperty => D::MissingProperty,
            Self::NotCallable => D::NotCallable,
            Self::NotConstructable => D::NotConstructable,
            Self::ArgumentCount => D::ArgumentCount,
            Self::Ambiguous => D::Ambiguous,
            Self::Unsatisfiable => D::Unsatisfiable,
        }
    }
}

/// A structured solver error with its source location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeError {
    pub kind: TypeErrorKind,
    pub message: String,
    pub span: Span,
}

impl TypeError {
    pub fn new(kind: TypeErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }
}

/// The pair of polar substitutions produced by solving.
///
/// `pos` maps a variable to its replacement at positive occurrences
/// (`α ⊔ lower-bounds`), `neg` at negative occurrences
/// (`α ⊓ upper-bounds`). A stable bisubstitution satisfies
/// `ξ(α⁻) ≤ ξ(α⁺)` and `ξ ∘ ξ = ξ`.
#[derive(Clone, Debug, Default)]
pub struct Bisubstitution {
    pub pos: FxHashMap<u32, TypeId>,
    pub neg: FxHashMap<u32, TypeId>,
}

/// Polarity of a position during application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Pol {
    Pos,
    Neg,
}

impl Pol {
    const fn flip(self) -> Self {
        match self {
            Pol::Pos => Pol::Neg,
            Pol::Neg => Pol::Pos,
        }
    }
}

impl Bisubstitution {
    /// Apply the substitution to a type at positive polarity.
    pub fn apply_pos(&self, store: &mut TypeStore, ty: TypeId) -> TypeId {
        self.apply(store, ty, Pol::Pos, &mut FxHashSet::default())
    }

    /// Apply the substitution to a type at negative polarity.
    pub fn apply_neg(&self, store: &mut TypeStore, ty: TypeId) -> TypeId {
        self.apply(store, ty, Pol::Neg, &mut FxHashSet::default())
    }

    fn lookup(&self, var: u32, pol: Pol) -> Option<TypeId> {
        match pol {
            Pol::Pos => self.pos.get(&var).copied(),
            Pol::Neg => self.neg.get(&var).copied(),
        }
    }

    fn apply(
        &self,
        store: &mut TypeStore,
        ty: TypeId,
        pol: Pol,
        visiting: &mut FxHashSet<(u32, bool)>,
    ) -> TypeId {
        match store.data(ty).clone() {
            TypeData::Var { id, .. } => {
                let key = (id, pol == Pol::Pos);
                if !visiting.insert(key) {
                    return ty;
                }
                let result = match self.lookup(id, pol) {
                    Some(entry) if entry != ty => self.apply(store, entry, pol, visiting),
                    _ => ty,
                };
                visiting.remove(&key);
                result
            }
            TypeData::Prim { .. }
            | TypeData::Top
            | TypeData::Bottom
            | TypeData::Any { .. }
            | TypeData::Never
            | TypeData::Unknown
            | TypeData::Class(_) => ty,
            TypeData::Function(mut shape) => {
                for param in &mut shape.params {
                    param.ty = self.apply(store, param.ty, pol.flip(), visiting);
                }
                shape.ret = self.apply(store, shape.ret, pol, visiting);
                store.intern(TypeData::Function(shape))
            }
            TypeData::Record { mut fields } => {
                for field in &mut fields {
                    field.ty = self.apply(store, field.ty, pol, visiting);
                }
                store.intern(TypeData::Record { fields })
            }
            TypeData::Array { elem, tuple } => {
                let elem = self.apply(store, elem, pol, visiting);
                let tuple = tuple.map(|ts| {
                    ts.into_iter()
                        .map(|t| self.apply(store, t, pol, visiting))
                        .collect()
                });
                store.intern(TypeData::Array { elem, tuple })
            }
            TypeData::Promise { resolved } => {
                let resolved = self.apply(store, resolved, pol, visiting);
                store.promise(resolved)
            }
            TypeData::Union(members) => {
                let members = members
                    .into_iter()
                    .map(|m| self.apply(store, m, pol, visiting))
                    .collect();
                store.union(members)
            }
            TypeData::Intersection(members) => {
                let members = members
                    .into_iter()
                    .map(|m| self.apply(store, m, pol, visiting))
                    .collect();
                store.intersection(members)
            }
            TypeData::Recursive { var, body } => {
                let body = self.apply(store, body, pol, visiting);
                store.recursive(var, body)
            }
        }
    }
}

/// Solve a constraint list in order.
///
/// Returns the bisubstitution on success, or every error encountered
/// (solving continues past errors so the caller sees all of them).
pub fn biunify(
    store: &mut TypeStore,
    constraints: &[Constraint],
) -> Result<Bisubstitution, Vec<TypeError>> {
    let mut solver = Biunifier {
        store,
        lower: FxHashMap::default(),
        upper: FxHashMap::default(),
        seen: FxHashSet::default(),
        errors: Vec::new(),
        steps: 0,
    };
    for constraint in constraints {
        solver.flow(constraint.sub, constraint.sup, constraint.span);
    }
    let subst = solver.finish();
    if solver.errors.is_empty() {
        Ok(subst)
    } else {
        Err(solver.errors)
    }
}

struct Biunifier<'a> {
    store: &'a mut TypeStore,
    /// Lower bounds per variable (`τ ≤ α` recorded τ).
    lower: FxHashMap<u32, Vec<TypeId>>,
    /// Upper bounds per variable (`α ≤ τ` recorded τ).
    upper: FxHashMap<u32, Vec<TypeId>>,
    /// Already-processed pairs; closes cycles through variable bounds.
    seen: FxHashSet<(TypeId, TypeId)>,
    errors: Vec<TypeError>,
    steps: u32,
}

impl Biunifier<'_> {
    fn flow(&mut self, sub: TypeId, sup: TypeId, span: Span) {
        if sub == sup || !self.seen.insert((sub, sup)) {
            return;
        }
        self.steps += 1;
        if self.steps > MAX_BIUNIFY_STEPS {
            if self
                .errors
                .last()
                .is_none_or(|e| e.kind != TypeErrorKind::Unsatisfiable)
            {
                self.errors.push(TypeError::new(
                    TypeErrorKind::Unsatisfiable,
                    "constraint solving exceeded its step budget",
                    span,
                ));
            }
            return;
        }
        trace!(sub = sub.0, sup = sup.0, "flow");

        match (self.store.data(sub).clone(), self.store.data(sup).clone()) {
            // Gradual and extremal cases first.
            (TypeData::Any { .. } | TypeData::Unknown, _)
            | (_, TypeData::Any { .. } | TypeData::Unknown)
            | (TypeData::Never | TypeData::Bottom, _)
            | (_, TypeData::Top) => {}

            // Recursive types flow through their bodies; `seen` closes the
            // loop.
            (TypeData::Recursive { var, body }, _) => {
                let unrolled = self.store.substitute(body, var, sub);
                self.flow(unrolled, sup, span);
            }
            (_, TypeData::Recursive { var, body }) => {
                let unrolled = self.store.substitute(body, var, sup);
                self.flow(sub, unrolled, span);
            }

            // Union on the left / intersection on the right split into
            // per-member constraints.
            (TypeData::Union(members), _) => {
                for m in members {
                    self.flow(m, sup, span);
                }
            }
            (_, TypeData::Intersection(members)) => {
                for m in members {
                    self.flow(sub, m, span);
                }
            }

            // Atomic variable rules.
            (TypeData::Var { id, .. }, _) => self.bound_above(id, sub, sup, span),
            (_, TypeData::Var { id, .. }) => self.bound_below(id, sup, sub, span),

            // Union on the right / intersection on the left: some member
            // must satisfy (bounded disjunctive search).
            (_, TypeData::Union(members)) => {
                self.disjunct(sub, sup, &members, span, /* sub_side: */ false);
            }
            (TypeData::Intersection(members), _) => {
                self.disjunct(sub, sup, &members, span, /* sub_side: */ true);
            }

            // Structural descent.
            (TypeData::Function(fa), TypeData::Function(fb)) => {
                if fa.required_params() > fb.params.len() {
                    let msg = format!(
                        "expected a function taking {} argument(s), found one requiring {}",
                        fb.params.len(),
                        fa.required_params()
                    );
                    self.errors
                        .push(TypeError::new(TypeErrorKind::ArgumentCount, msg, span));
                    return;
                }
                for (pa, pb) in fa.params.iter().zip(&fb.params) {
                    // Contravariant.
                    self.flow(pb.ty, pa.ty, span);
                }
                // Covariant.
                self.flow(fa.ret, fb.ret, span);
            }

            (TypeData::Record { fields: have }, TypeData::Record { fields: need }) => {
                for field in &need {
                    match have.iter().find(|f| f.name == field.name) {
                        Some(found) => self.flow(found.ty, field.ty, span),
                        None if field.optional => {}
                        None => {
                            let msg = format!(
                                "property '{}' is missing in type '{}'",
                                field.name,
                                diagnostic_type_string(self.store, sub)
                            );
                            self.errors.push(TypeError::new(
                                TypeErrorKind::MissingProperty,
                                msg,
                                span,
                            ));
                        }
                    }
                }
            }

            (
                TypeData::Array { elem: ea, tuple: ta },
                TypeData::Array { elem: eb, tuple: tb },
            ) => match (ta, tb) {
                (Some(xs), Some(ys)) => {
                    if xs.len() != ys.len() {
                        let msg = format!(
                            "tuple of length {} is not assignable to tuple of length {}",
                            xs.len(),
                            ys.len()
                        );
                        self.errors.push(TypeError::new(
                            TypeErrorKind::IncompatibleTypes,
                            msg,
                            span,
                        ));
                        return;
                    }
                    for (x, y) in xs.into_iter().zip(ys) {
                        self.flow(x, y, span);
                    }
                }
                (Some(xs), None) => {
                    for x in xs {
                        self.flow(x, eb, span);
                    }
                }
                _ => self.flow(ea, eb, span),
            },

            (TypeData::Promise { resolved: ra }, TypeData::Promise { resolved: rb }) => {
                self.flow(ra, rb, span);
            }

            // Classes: nominal via the extends chain, structural via the
            // instance record.
            (TypeData::Class(ca), TypeData::Class(cb)) => {
                let mut checker = SubtypeChecker::new(self.store);
                if !checker.is_subtype_of(sub, sup) {
                    let msg = format!("class '{}' is not assignable to class '{}'", ca.name, cb.name);
                    self.errors
                        .push(TypeError::new(TypeErrorKind::IncompatibleTypes, msg, span));
                }
            }
            (TypeData::Class(ca), TypeData::Record { .. }) => {
                let instance = ca.instance;
                self.flow(instance, sup, span);
            }

            // Literal vs base: literal <= base is fine, the reverse is not.
            (
                TypeData::Prim { kind: ka, value: va },
                TypeData::Prim { kind: kb, value: vb },
            ) => {
                let ok = ka == kb && (vb.is_none() || va == vb);
                if !ok {
                    self.incompatible(sub, sup, span);
                }
            }

            _ => self.incompatible(sub, sup, span),
        }
    }

    /// `α ≤ τ`: record τ as an upper bound and propagate existing lower
    /// bounds through it.
    fn bound_above(&mut self, var: u32, var_ty: TypeId, bound: TypeId, span: Span) {
        if self.occurs(var, bound) {
            let msg = format!(
                "cannot construct the infinite type '{} ≤ {}'",
                diagnostic_type_string(self.store, var_ty),
                diagnostic_type_string(self.store, bound)
            );
            self.errors
                .push(TypeError::new(TypeErrorKind::InfiniteType, msg, span));
            return;
        }
        self.upper.entry(var).or_default().push(bound);
        let lowers = self.lower.get(&var).cloned().unwrap_or_default();
        for lb in lowers {
            self.flow(lb, bound, span);
        }
    }

    /// `τ ≤ α`: record τ as a lower bound and propagate it through existing
    /// upper bounds.
    fn bound_below(&mut self, var: u32, var_ty: TypeId, bound: TypeId, span: Span) {
        if self.occurs(var, bound) {
            let msg = format!(
                "cannot construct the infinite type '{} ≤ {}'",
                diagnostic_type_string(self.store, bound),
                diagnostic_type_string(self.store, var_ty)
            );
            self.errors
                .push(TypeError::new(TypeErrorKind::InfiniteType, msg, span));
            return;
        }
        self.lower.entry(var).or_default().push(bound);
        let uppers = self.upper.get(&var).cloned().unwrap_or_default();
        for ub in uppers {
            self.flow(bound, ub, span);
        }
    }

    /// Occurs check: `var` appearing free in its own bound would require an
    /// infinite type (recursive binders are the only sanctioned cycle).
    fn occurs(&self, var: u32, ty: TypeId) -> bool {
        self.store.free_vars(ty).contains(&var)
    }

    /// Bounded disjunctive search: `sub ≤ union(members)` (or dually
    /// `intersection(members) ≤ sup` when `sub_side`). Accept the first
    /// member that already holds structurally, else descend into the only
    /// head-compatible candidate, else fail.
    fn disjunct(
        &mut self,
        sub: TypeId,
        sup: TypeId,
        members: &[TypeId],
        span: Span,
        sub_side: bool,
    ) {
        let members = &members[..members.len().min(MAX_DISJUNCT_BRANCHES)];

        // First: an already-satisfied branch ends the search.
        let mut checker = SubtypeChecker::new(self.store);
        let satisfied = members.iter().any(|&m| {
            if sub_side {
                checker.is_subtype_of(m, sup)
            } else {
                checker.is_subtype_of(sub, m)
            }
        });
        if satisfied {
            return;
        }

        // Second: exactly one head-compatible candidate gets the descent.
        let target = if sub_side { sup } else { sub };
        let candidates: Vec<TypeId> = members
            .iter()
            .copied()
            .filter(|&m| self.heads_compatible(target, m))
            .collect();
        match candidates.len() {
            1 => {
                if sub_side {
                    self.flow(candidates[0], sup, span);
                } else {
                    self.flow(sub, candidates[0], span);
                }
            }
            0 => self.incompatible(sub, sup, span),
            // Several branches could absorb the flow: no unique solution.
            _ => {
                let msg = format!(
                    "constraint '{}' ≤ '{}' has no unique solution",
                    diagnostic_type_string(self.store, sub),
                    diagnostic_type_string(self.store, sup)
                );
                self.errors
                    .push(TypeError::new(TypeErrorKind::Ambiguous, msg, span));
            }
        }
    }

    fn heads_compatible(&self, a: TypeId, b: TypeId) -> bool {
        use std::mem::discriminant;
        let da = self.store.data(a);
        let db = self.store.data(b);
        match (da, db) {
            // Primitive heads only overlap within one base kind.
            (TypeData::Prim { kind: ka, .. }, TypeData::Prim { kind: kb, .. }) => ka == kb,
            (TypeData::Var { .. }, _) | (_, TypeData::Var { .. }) => true,
            _ => discriminant(da) == discriminant(db),
        }
    }

    fn incompatible(&mut self, sub: TypeId, sup: TypeId, span: Span) {
        let msg = format!(
            "type '{}' is not assignable to type '{}'",
            diagnostic_type_string(self.store, sub),
            diagnostic_type_string(self.store, sup)
        );
        self.errors
            .push(TypeError::new(TypeErrorKind::IncompatibleTypes, msg, span));
    }

    /// Fold the recorded bounds into the bisubstitution:
    /// `ξ⁺(α) = α ⊔ ⋃ lower`, `ξ⁻(α) = α ⊓ ⋂ upper`, then resolve entries
    /// through each other until stable so `ξ ∘ ξ = ξ`.
    fn finish(&mut self) -> Bisubstitution {
        let mut subst = Bisubstitution::default();
        let vars: FxHashSet<u32> = self
            .lower
            .keys()
            .chain(self.upper.keys())
            .copied()
            .collect();
        for var in vars {
            let var_ty = self.store.var_ref(var, 0);
            if let Some(lowers) = self.lower.get(&var) {
                let mut members = vec![var_ty];
                members.extend(lowers.iter().copied());
                let joined = self.store.union(members);
                subst.pos.insert(var, joined);
            }
            if let Some(uppers) = self.upper.get(&var) {
                let mut members = vec![var_ty];
                members.extend(uppers.iter().copied());
                let met = self.store.intersection(members);
                subst.neg.insert(var, met);
            }
        }

        // Idempotence: push entries through each other until nothing moves.
        for _ in 0..8 {
            let mut changed = false;
            let pos_keys: Vec<u32> = subst.pos.keys().copied().collect();
            for var in pos_keys {
                let entry = subst.pos[&var];
                let resolved = subst.apply_pos(self.store, entry);
                if resolved != entry {
                    subst.pos.insert(var, resolved);
                    changed = true;
                }
            }
            let neg_keys: Vec<u32> = subst.neg.keys().copied().collect();
            for var in neg_keys {
                let entry = subst.neg[&var];
                let resolved = subst.apply_neg(self.store, entry);
                if resolved != entry {
                    subst.neg.insert(var, resolved);
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
        subst
    }
}

#[cfg(test)]
#[path = "tests/biunify_tests.rs"]
mod tests;
