//! Output-side simplification.
//!
//! Annotations want the smallest type that means the same thing. The pass
//! composes structural cleanup (degenerate unknown/never members, literal
//! unions widened to their base, boolean literal pairs collapsed) with a
//! `type -> automaton -> minimize -> type` round trip, except for record
//! types, which are simplified in place: the automaton round trip merges
//! record heads by label set and would lose field-type precision.

use crate::automaton::{Polarity, TypeAutomaton};
use crate::intern::{LiteralValue, PrimKind, TypeData, TypeId, TypeStore};
use jsty_common::limits::UNION_MEMBER_DIAGNOSTIC_LIMIT;
use rustc_hash::{FxHashMap, FxHashSet};

/// Widen a literal type to its primitive base; unions widen member-wise.
/// Used at loop headers to guarantee fixed-point termination.
pub fn widen_literal(store: &mut TypeStore, ty: TypeId) -> TypeId {
    match store.data(ty).clone() {
        TypeData::Prim {
            kind,
            value: Some(_),
        } => kind.base_id(),
        TypeData::Union(members) => {
            let widened = members
                .into_iter()
                .map(|m| widen_literal(store, m))
                .collect();
            store.union(widened)
        }
        _ => ty,
    }
}

/// Simplify a type for user-facing output.
pub fn simplify_for_output(store: &mut TypeStore, ty: TypeId) -> TypeId {
    let cleaned = cleanup(store, ty, &mut FxHashMap::default());
    if contains_record(store, cleaned, &mut FxHashSet::default()) {
        // Records round-trip lossily; keep the structural cleanup only.
        return cleaned;
    }
    let automaton = TypeAutomaton::from_type(store, cleaned, Polarity::Pos);
    let minimized = automaton.minimize();
    minimized.to_type(store)
}

/// Structural cleanup: degenerate union members, literal widening on long
/// unions, boolean pair collapse. Applied recursively.
fn cleanup(store: &mut TypeStore, ty: TypeId, memo: &mut FxHashMap<TypeId, TypeId>) -> TypeId {
    if let Some(&done) = memo.get(&ty) {
        return done;
    }
    // Break cycles through recursive types conservatively.
    memo.insert(ty, ty);

    let result = match store.data(ty).clone() {
        TypeData::Union(members) => {
            let mut cleaned: Vec<TypeId> =
                members.into_iter().map(|m| cleanup(store, m, memo)).collect();

            // `unknown`/`never` members are degenerate next to real types.
            if cleaned.len() > 1 {
                cleaned.retain(|&m| {
                    !matches!(store.data(m), TypeData::Unknown | TypeData::Never)
                });
            }

            // true | false collapses to boolean.
            let has_true = cleaned
                .iter()
                .any(|&m| matches!(store.data(m).literal(), Some(LiteralValue::Bool(true))));
            let has_false = cleaned
                .iter()
                .any(|&m| matches!(store.data(m).literal(), Some(LiteralValue::Bool(false))));
            if has_true && has_false {
                cleaned.retain(|&m| {
                    !matches!(store.data(m).literal(), Some(LiteralValue::Bool(_)))
                });
                cleaned.push(TypeId::BOOLEAN);
            }

            // A long all-literal union of one base widens to the base.
            if cleaned.len() > UNION_MEMBER_DIAGNOSTIC_LIMIT {
                let bases: FxHashSet<PrimKind> = cleaned
                    .iter()
                    .filter_map(|&m| store.data(m).literal().map(LiteralValue::base_kind))
                    .collect();
                let all_literals = cleaned
                    .iter()
                    .all(|&m| store.data(m).literal().is_some());
                if all_literals && bases.len() == 1 {
                    let base = bases.into_iter().next().expect("one base");
                    cleaned = vec![base.base_id()];
                }
            }

            store.union(cleaned)
        }
        TypeData::Intersection(members) => {
            let cleaned = members.into_iter().map(|m| cleanup(store, m, memo)).collect();
            store.intersection(cleaned)
        }
        TypeData::Function(mut shape) => {
            for param in &mut shape.params {
                param.ty = cleanup(store, param.ty, memo);
            }
            shape.ret = cleanup(store, shape.ret, memo);
            store.intern(TypeData::Function(shape))
        }
        TypeData::Record { mut fields } => {
            for field in &mut fields {
                field.ty = cleanup(store, field.ty, memo);
            }
            store.intern(TypeData::Record { fields })
        }
        TypeData::Array { elem, tuple } => {
            let elem = cleanup(store, elem, memo);
            let tuple = tuple.map(|ts| ts.into_iter().map(|t| cleanup(store, t, memo)).collect());
            store.intern(TypeData::Array { elem, tuple })
        }
        TypeData::Promise { resolved } => {
            let resolved = cleanup(store, resolved, memo);
            store.promise(resolved)
        }
        TypeData::Recursive { var, body } => {
            let body = cleanup(store, body, memo);
            store.recursive(var, body)
        }
        _ => ty,
    };
    memo.insert(ty, result);
    result
}

fn contains_record(store: &TypeStore, ty: TypeId, visiting: &mut FxHashSet<TypeId>) -> bool {
    if !visiting.insert(ty) {
        return false;
    }
    let found = match store.data(ty) {
        TypeData::Record { .. } | TypeData::Class(_) => true,
        TypeData::Function(shape) => {
            let shape = shape.clone();
            shape
                .params
                .iter()
                .any(|p| contains_record(store, p.ty, visiting))
                || contains_record(store, shape.ret, visiting)
        }
        TypeData::Array { elem, tuple } => {
            contains_record(store, *elem, visiting)
                || tuple
                    .as_ref()
                    .is_some_and(|ts| ts.iter().any(|&t| contains_record(store, t, visiting)))
        }
        TypeData::Promise { resolved } => contains_record(store, *resolved, visiting),
        TypeData::Union(members) | TypeData::Intersection(members) => {
            let members = members.clone();
            members.iter().any(|&m| contains_record(store, m, visiting))
        }
        TypeData::Recursive { body, .. } => contains_record(store, *body, visiting),
        _ => false,
    };
    visiting.remove(&ty);
    found
}

#[cfg(test)]
#[path = "tests/simplify_unit_tests.rs"]
mod tests;
