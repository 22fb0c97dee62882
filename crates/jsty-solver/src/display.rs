//! Type rendering for annotations and diagnostics.
//!
//! Output follows the surface-language convention: literals print as
//! themselves (`42`, `"hi"`, `true`), functions as `(x: T) => R`, records
//! as `{ a: T }`, unions with `|`.

use crate::intern::{LiteralValue, PrimKind, TypeData, TypeId, TypeStore};
use jsty_common::limits::UNION_MEMBER_DIAGNOSTIC_LIMIT;
use rustc_hash::FxHashMap;

/// Render `ty` as a user-facing string.
#[must_use]
pub fn type_string(store: &TypeStore, ty: TypeId) -> String {
    let mut printer = Printer {
        store,
        binder_names: FxHashMap::default(),
        depth: 0,
    };
    printer.print(ty, false)
}

/// Render `ty` for a diagnostic message: long unions are elided.
#[must_use]
pub fn diagnostic_type_string(store: &TypeStore, ty: TypeId) -> String {
    if let TypeData::Union(members) = store.data(ty) {
        if members.len() > UNION_MEMBER_DIAGNOSTIC_LIMIT {
            let shown: Vec<String> = members
                .iter()
                .take(UNION_MEMBER_DIAGNOSTIC_LIMIT)
                .map(|&m| type_string(store, m))
                .collect();
            return format!("{} | ...", shown.join(" | "));
        }
    }
    type_string(store, ty)
}

struct Printer<'a> {
    store: &'a TypeStore,
    /// Recursive binder var -> display name (`t0`, `t1`, …).
    binder_names: FxHashMap<u32, String>,
    depth: u32,
}

impl Printer<'_> {
    fn print(&mut self, ty: TypeId, nested: bool) -> String {
        if self.depth > 64 {
            return "...".into();
        }
        self.depth += 1;
        let out = self.print_inner(ty, nested);
        self.depth -= 1;
        out
    }

    fn print_inner(&mut self, ty: TypeId, nested: bool) -> String {
        match self.store.data(ty) {
            TypeData::Var { id, name, .. } => match (self.binder_names.get(id), name) {
                (Some(bound), _) => bound.clone(),
                (None, Some(name)) => format!("'{name}"),
                (None, None) => format!("'t{id}"),
            },
            TypeData::Prim { kind, value } => match value {
                None => kind.name().to_string(),
                Some(LiteralValue::Bool(b)) => b.to_string(),
                Some(LiteralValue::Number(n)) => format_number(n.0),
                Some(LiteralValue::String(s)) => format!("{s:?}"),
                Some(LiteralValue::BigInt(digits)) => format!("{digits}n"),
            },
            TypeData::Function(shape) => {
                let shape = shape.clone();
                let params: Vec<String> = shape
                    .params
                    .iter()
                    .map(|p| {
                        let prefix = if p.rest { "..." } else { "" };
                        let opt = if p.optional { "?" } else { "" };
                        format!("{prefix}{}{opt}: {}", p.name, self.print(p.ty, false))
                    })
                    .collect();
                let ret = self.print(shape.ret, true);
                let arrow = format!("({}) => {}", params.join(", "), ret);
                let prefixed = if shape.is_async {
                    format!("async {arrow}")
                } else {
                    arrow
                };
                if nested {
                    format!("({prefixed})")
                } else {
                    prefixed
                }
            }
            TypeData::Record { fields } => {
                if fields.is_empty() {
                    return "{}".into();
                }
                let fields = fields.clone();
                let parts: Vec<String> = fields
                    .iter()
                    .map(|f| {
                        let ro = if f.readonly { "readonly " } else { "" };
                        let opt = if f.optional { "?" } else { "" };
                        format!("{ro}{}{opt}: {}", f.name, self.print(f.ty, false))
                    })
                    .collect();
                format!("{{ {} }}", parts.join("; "))
            }
            TypeData::Array { elem, tuple } => match tuple {
                Some(elems) => {
                    let elems = elems.clone();
                    let parts: Vec<String> =
                        elems.iter().map(|&e| self.print(e, false)).collect();
                    format!("[{}]", parts.join(", "))
                }
                None => {
                    let elem = *elem;
                    let inner = self.print(elem, true);
                    if needs_parens_in_array(self.store, elem) {
                        format!("({inner})[]")
                    } else {
                        format!("{inner}[]")
                    }
                }
            },
            TypeData::Promise { resolved } => {
                let resolved = *resolved;
                format!("Promise<{}>", self.print(resolved, false))
            }
            TypeData::Class(shape) => shape.name.clone(),
            TypeData::Union(members) => {
                let members = members.clone();
                let parts: Vec<String> = members.iter().map(|&m| self.print(m, true)).collect();
                let joined = parts.join(" | ");
                if nested {
                    format!("({joined})")
                } else {
                    joined
                }
            }
            TypeData::Intersection(members) => {
                let members = members.clone();
                let parts: Vec<String> = members.iter().map(|&m| self.print(m, true)).collect();
                let joined = parts.join(" & ");
                if nested {
                    format!("({joined})")
                } else {
                    joined
                }
            }
            TypeData::Recursive { var, body } => {
                let (var, body) = (*var, *body);
                let name = format!("t{}", self.binder_names.len());
                self.binder_names.insert(var, name.clone());
                let body_str = self.print(body, false);
                self.binder_names.remove(&var);
                format!("rec {name}. {body_str}")
            }
            TypeData::Top => "top".into(),
            TypeData::Bottom => "bottom".into(),
            TypeData::Any { .. } => "any".into(),
            TypeData::Never => "never".into(),
            TypeData::Unknown => "unknown".into(),
        }
    }
}

fn needs_parens_in_array(store: &TypeStore, ty: TypeId) -> bool {
    matches!(
        store.data(ty),
        TypeData::Union(_) | TypeData::Intersection(_) | TypeData::Function(_)
    )
}

/// Integral numbers print without a trailing `.0`.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.is_finite() && value.abs() < 1e21 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// `typeof`-style name of a type, when statically known.
#[must_use]
pub fn typeof_name(store: &TypeStore, ty: TypeId) -> Option<&'static str> {
    match store.data(ty) {
        TypeData::Prim { kind, .. } => Some(match kind {
            PrimKind::Bool => "boolean",
            PrimKind::Num => "number",
            PrimKind::Str => "string",
            PrimKind::Undef => "undefined",
            PrimKind::Sym => "symbol",
            PrimKind::BigInt => "bigint",
            PrimKind::Null => "object",
        }),
        TypeData::Function(_) | TypeData::Class(_) => Some("function"),
        TypeData::Record { .. } | TypeData::Array { .. } | TypeData::Promise { .. } => {
            Some("object")
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/display_tests.rs"]
mod tests;
