//! Structural subtype checking.
//!
//! Used to validate call arguments, to confirm biunification results, and
//! by the disjunctive branches of the solver. The check is coinductive:
//! an in-progress pair is assumed to hold, which terminates recursive
//! types.
//!
//! Class types are both nominally tagged and structurally compatible:
//! `a <= b` holds for classes when `b` is on `a`'s extends chain, or when
//! `a`'s instance record is a structural subtype of `b`'s.

use crate::intern::{TypeData, TypeId, TypeStore};
use rustc_hash::{FxHashMap, FxHashSet};

/// A subtype checker with a result cache over one store.
pub struct SubtypeChecker<'a> {
    store: &'a TypeStore,
    cache: FxHashMap<(TypeId, TypeId), bool>,
    in_progress: FxHashSet<(TypeId, TypeId)>,
    /// Recursive binder var -> the recursive type it unrolls to.
    binder_env: FxHashMap<u32, TypeId>,
}

impl<'a> SubtypeChecker<'a> {
    #[must_use]
    pub fn new(store: &'a TypeStore) -> Self {
        Self {
            store,
            cache: FxHashMap::default(),
            in_progress: FxHashSet::default(),
            binder_env: FxHashMap::default(),
        }
    }

    /// Whether `sub <= sup` in the subtyping lattice.
    pub fn is_subtype_of(&mut self, sub: TypeId, sup: TypeId) -> bool {
        let sub = self.resolve_binder(sub);
        let sup = self.resolve_binder(sup);
        if sub == sup {
            return true;
        }
        let key = (sub, sup);
        if let Some(&cached) = self.cache.get(&key) {
            return cached;
        }
        if !self.in_progress.insert(key) {
            // Coinductive assumption for recursive structures.
            return true;
        }
        let result = self.check(sub, sup);
        self.in_progress.remove(&key);
        self.cache.insert(key, result);
        result
    }

    fn check(&mut self, sub: TypeId, sup: TypeId) -> bool {
        let store = self.store;
        match (store.data(sub), store.data(sup)) {
            // Gradual escape hatch relates to everything.
            (TypeData::Any { .. }, _) | (_, TypeData::Any { .. }) => true,
            (TypeData::Unknown, _) | (_, TypeData::Unknown) => true,
            // Bottom and Never are universal subtypes; Top is the
            // universal supertype.
            (TypeData::Never | TypeData::Bottom, _) => true,
            (_, TypeData::Top) => true,
            (TypeData::Top, _) | (_, TypeData::Never | TypeData::Bottom) => false,

            // A recursive type relates through its unrolling; the binder
            // resolves back to the recursive type, and the in-progress set
            // closes the loop coinductively.
            (TypeData::Recursive { var, body }, _) => {
                let (var, body) = (*var, *body);
                self.binder_env.insert(var, sub);
                self.is_subtype_of(body, sup)
            }
            (_, TypeData::Recursive { var, body }) => {
                let (var, body) = (*var, *body);
                self.binder_env.insert(var, sup);
                self.is_subtype_of(sub, body)
            }

            // Unions/intersections decompose first.
            (TypeData::Union(members), _) => {
                let members = members.clone();
                members.iter().all(|&m| self.is_subtype_of(m, sup))
            }
            (_, TypeData::Intersection(members)) => {
                let members = members.clone();
                members.iter().all(|&m| self.is_subtype_of(sub, m))
            }
            (_, TypeData::Union(members)) => {
                let members = members.clone();
                members.iter().any(|&m| self.is_subtype_of(sub, m))
            }
            (TypeData::Intersection(members), _) => {
                let members = members.clone();
                members.iter().any(|&m| self.is_subtype_of(m, sup))
            }

            // Literal <= its base; the base is not a subtype of any literal.
            (
                TypeData::Prim { kind: ka, value: va },
                TypeData::Prim { kind: kb, value: vb },
            ) => ka == kb && (vb.is_none() || va == vb),

            (TypeData::Function(fa), TypeData::Function(fb)) => {
                let (fa, fb) = (fa.clone(), fb.clone());
                // Contravariant in parameters, covariant in return. The
                // subtype may accept fewer parameters (it ignores extras).
                if fa.required_params() > fb.params.len() {
                    return false;
                }
                for (pa, pb) in fa.params.iter().zip(&fb.params) {
                    if !self.is_subtype_of(pb.ty, pa.ty) {
                        return false;
                    }
                }
                self.is_subtype_of(fa.ret, fb.ret)
            }

            // Width subtyping: every required field of the supertype must
            // be present at a subtype-compatible type.
            (TypeData::Record { fields: fa }, TypeData::Record { fields: fb }) => {
                let (fa, fb) = (fa.clone(), fb.clone());
                fb.iter().all(|need| {
                    match fa.iter().find(|f| f.name == need.name) {
                        Some(have) => self.is_subtype_of(have.ty, need.ty),
                        None => need.optional,
                    }
                })
            }

            (
                TypeData::Array { elem: ea, tuple: ta },
                TypeData::Array { elem: eb, tuple: tb },
            ) => {
                let (ea, eb) = (*ea, *eb);
                match (ta.clone(), tb.clone()) {
                    // Tuple <= tuple: pointwise, same length.
                    (Some(xs), Some(ys)) => {
                        xs.len() == ys.len()
                            && xs.iter().zip(&ys).all(|(&x, &y)| self.is_subtype_of(x, y))
                    }
                    // Tuple <= array: every element fits the element type.
                    (Some(xs), None) => xs.iter().all(|&x| self.is_subtype_of(x, eb)),
                    (None, Some(_)) => false,
                    (None, None) => self.is_subtype_of(ea, eb),
                }
            }

            (TypeData::Promise { resolved: ra }, TypeData::Promise { resolved: rb }) => {
                let (ra, rb) = (*ra, *rb);
                self.is_subtype_of(ra, rb)
            }

            (TypeData::Class(ca), TypeData::Class(cb)) => {
                // Nominal: the extends chain.
                if ca.name == cb.name || self.extends_chain_contains(sub, &cb.name) {
                    return true;
                }
                // Structural: compatible instance records.
                let (ia, ib) = (ca.instance, cb.instance);
                self.is_subtype_of(ia, ib)
            }

            // A class instance used where a record is expected: structural.
            (TypeData::Class(ca), TypeData::Record { .. }) => {
                let instance = ca.instance;
                self.is_subtype_of(instance, sup)
            }

            (TypeData::Var { id: ia, .. }, TypeData::Var { id: ib, .. }) => ia == ib,

            _ => false,
        }
    }

    fn extends_chain_contains(&mut self, class_ty: TypeId, target: &str) -> bool {
        let mut current = Some(class_ty);
        let mut hops = 0;
        while let Some(ty) = current {
            if hops > 64 {
                return false;
            }
            hops += 1;
            match self.store.data(ty) {
                TypeData::Class(shape) => {
                    if shape.name == target {
                        return true;
                    }
                    current = shape.parent;
                }
                _ => return false,
            }
        }
        false
    }

    fn resolve_binder(&self, ty: TypeId) -> TypeId {
        match self.store.data(ty) {
            TypeData::Var { id, .. } => self.binder_env.get(id).copied().unwrap_or(ty),
            _ => ty,
        }
    }
}

#[cfg(test)]
#[path = "tests/subtype_tests.rs"]
mod tests;
