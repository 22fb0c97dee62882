//! Sound narrowing primitives.
//!
//! These implement the type-level half of edge-condition narrowing: given
//! an incoming type and a refinement (a `typeof` kind, nullability, or
//! truthiness), produce the refined type for the matching edge. All
//! refinements are sound: they only remove values the condition excludes,
//! never invent precision the condition does not justify.

use crate::intern::{PrimKind, TypeData, TypeId, TypeStore};
use bitflags::bitflags;

/// The operand kinds a `typeof` comparison can name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeofKind {
    String,
    Number,
    Boolean,
    Undefined,
    Function,
    Object,
    Symbol,
    BigInt,
}

impl TypeofKind {
    /// Parse the string literal on the right of a `typeof` comparison.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "string" => Self::String,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "undefined" => Self::Undefined,
            "function" => Self::Function,
            "object" => Self::Object,
            "symbol" => Self::Symbol,
            "bigint" => Self::BigInt,
            _ => return None,
        })
    }

    /// The base type this kind narrows an untyped value to, when one
    /// exists (`object` and `function` have no single base).
    #[must_use]
    pub fn base_type(self, store: &mut TypeStore) -> TypeId {
        match self {
            Self::String => TypeId::STRING,
            Self::Number => TypeId::NUMBER,
            Self::Boolean => TypeId::BOOLEAN,
            Self::Undefined => TypeId::UNDEFINED,
            Self::Symbol => TypeId::SYMBOL,
            Self::BigInt => TypeId::BIGINT,
            // typeof x === "object" includes null.
            Self::Object => {
                let empty = store.record(Vec::new());
                store.union(vec![empty, TypeId::NULL])
            }
            Self::Function => {
                let rest = crate::intern::ParamShape::new("args", TypeId::ANY).rest();
                store.function(vec![rest], TypeId::ANY)
            }
        }
    }
}

bitflags! {
    /// Three-valued match result for one union member against a condition.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct MemberFit: u8 {
        /// Some values of the member satisfy the condition.
        const MAY_MATCH = 1 << 0;
        /// Some values of the member violate the condition.
        const MAY_MISS = 1 << 1;
    }
}

/// How one type relates to a `typeof` kind.
fn typeof_fit(store: &TypeStore, ty: TypeId, kind: TypeofKind) -> MemberFit {
    let matches = |k: TypeofKind| {
        if k == kind {
            MemberFit::MAY_MATCH
        } else {
            MemberFit::MAY_MISS
        }
    };
    match store.data(ty) {
        TypeData::Prim { kind: prim, .. } => match prim {
            PrimKind::Bool => matches(TypeofKind::Boolean),
            PrimKind::Num => matches(TypeofKind::Number),
            PrimKind::Str => matches(TypeofKind::String),
            PrimKind::Undef => matches(TypeofKind::Undefined),
            PrimKind::Sym => matches(TypeofKind::Symbol),
            PrimKind::BigInt => matches(TypeofKind::BigInt),
            // typeof null === "object"
            PrimKind::Null => matches(TypeofKind::Object),
        },
        TypeData::Function(_) => matches(TypeofKind::Function),
        // A class value is a constructor function; its instances are objects.
        TypeData::Class(_) => matches(TypeofKind::Function),
        TypeData::Record { .. } | TypeData::Array { .. } | TypeData::Promise { .. } => {
            matches(TypeofKind::Object)
        }
        // Untyped values may fall either way.
        _ => MemberFit::MAY_MATCH | MemberFit::MAY_MISS,
    }
}

/// Narrow `ty` along the true edge of `typeof x === kind`.
pub fn narrow_to_typeof(store: &mut TypeStore, ty: TypeId, kind: TypeofKind) -> TypeId {
    let members = store.union_members(ty);
    let mut kept = Vec::new();
    for member in members {
        let fit = typeof_fit(store, member, kind);
        if fit.contains(MemberFit::MAY_MATCH) {
            if fit.contains(MemberFit::MAY_MISS) {
                // An untyped member narrows to the kind's base.
                kept.push(kind.base_type(store));
            } else {
                kept.push(member);
            }
        }
    }
    store.union(kept)
}

/// Narrow `ty` along the false edge of `typeof x === kind`.
pub fn narrow_out_typeof(store: &mut TypeStore, ty: TypeId, kind: TypeofKind) -> TypeId {
    let members = store.union_members(ty);
    let mut kept = Vec::new();
    for member in members {
        let fit = typeof_fit(store, member, kind);
        if fit.contains(MemberFit::MAY_MISS) {
            kept.push(member);
        }
    }
    store.union(kept)
}

/// Remove `null` and/or `undefined` members (the true edge of `x != null`
/// removes both; strict comparisons remove one).
pub fn remove_nullable(
    store: &mut TypeStore,
    ty: TypeId,
    remove_null: bool,
    remove_undefined: bool,
) -> TypeId {
    let members = store.union_members(ty);
    let kept: Vec<TypeId> = members
        .into_iter()
        .filter(|&m| match store.data(m) {
            TypeData::Prim {
                kind: PrimKind::Null,
                ..
            } => !remove_null,
            TypeData::Prim {
                kind: PrimKind::Undef,
                ..
            } => !remove_undefined,
            _ => true,
        })
        .collect();
    store.union(kept)
}

/// Keep only the nullable members (the true edge of `x === null` /
/// `x === undefined`). An untyped value narrows to the named member(s).
pub fn keep_nullable(
    store: &mut TypeStore,
    ty: TypeId,
    keep_null: bool,
    keep_undefined: bool,
) -> TypeId {
    let mut named = Vec::new();
    if keep_null {
        named.push(TypeId::NULL);
    }
    if keep_undefined {
        named.push(TypeId::UNDEFINED);
    }
    let members = store.union_members(ty);
    let mut kept = Vec::new();
    for member in members {
        match store.data(member) {
            TypeData::Prim {
                kind: PrimKind::Null,
                ..
            } if keep_null => kept.push(member),
            TypeData::Prim {
                kind: PrimKind::Undef,
                ..
            } if keep_undefined => kept.push(member),
            TypeData::Any { .. } | TypeData::Unknown | TypeData::Var { .. } => {
                kept.extend(named.iter().copied());
            }
            _ => {}
        }
    }
    store.union(kept)
}

/// Whether every value of the type is falsy.
#[must_use]
pub fn is_definitely_falsy(store: &TypeStore, ty: TypeId) -> bool {
    match store.data(ty) {
        TypeData::Prim {
            kind: PrimKind::Null | PrimKind::Undef,
            ..
        } => true,
        TypeData::Prim {
            value: Some(lit), ..
        } => lit.is_falsy(),
        TypeData::Never => true,
        TypeData::Union(members) => {
            let members = members.clone();
            members.iter().all(|&m| is_definitely_falsy(store, m))
        }
        _ => false,
    }
}

/// Whether every value of the type is truthy.
#[must_use]
pub fn is_definitely_truthy(store: &TypeStore, ty: TypeId) -> bool {
    match store.data(ty) {
        TypeData::Prim {
            value: Some(lit), ..
        } => !lit.is_falsy(),
        TypeData::Function(_)
        | TypeData::Record { .. }
        | TypeData::Array { .. }
        | TypeData::Promise { .. }
        | TypeData::Class(_) => true,
        TypeData::Union(members) => {
            let members = members.clone();
            members.iter().all(|&m| is_definitely_truthy(store, m))
        }
        _ => false,
    }
}

/// Narrow along the true edge of a truthiness test: remove members that
/// are definitely falsy.
pub fn narrow_truthy(store: &mut TypeStore, ty: TypeId) -> TypeId {
    let members = store.union_members(ty);
    let mut kept = Vec::new();
    for member in members {
        if is_definitely_falsy(store, member) {
            continue;
        }
        // A bare boolean can only be true here.
        if member == TypeId::BOOLEAN {
            kept.push(store.literal_bool(true));
        } else {
            kept.push(member);
        }
    }
    store.union(kept)
}

/// Narrow along the false edge of a truthiness test: keep the members
/// that can be falsy, refined to their falsy subset where that subset is
/// expressible.
pub fn narrow_falsy(store: &mut TypeStore, ty: TypeId) -> TypeId {
    let members = store.union_members(ty);
    let mut kept = Vec::new();
    for member in members {
        if is_definitely_truthy(store, member) {
            continue;
        }
        match store.data(member) {
            TypeData::Prim {
                kind: PrimKind::Bool,
                value: None,
            } => kept.push(store.literal_bool(false)),
            TypeData::Prim {
                kind: PrimKind::Num,
                value: None,
            } => kept.push(store.literal_number(0.0)),
            TypeData::Prim {
                kind: PrimKind::Str,
                value: None,
            } => kept.push(store.literal_string("")),
            _ => kept.push(member),
        }
    }
    store.union(kept)
}

#[cfg(test)]
#[path = "tests/narrow_tests.rs"]
mod tests;
