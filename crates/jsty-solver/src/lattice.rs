//! Lattice operations: union/intersection smart constructors, record
//! join/meet, free variables, substitution, and alpha-aware equality.
//!
//! Invariants maintained by the constructors:
//! - Unions never contain unions; `Never` is dropped; `Any`/`Top` absorb;
//!   literals are absorbed by their present base; all-record unions apply
//!   record join (domain intersection).
//! - Intersections never contain intersections; `Any`/`Top` are dropped;
//!   `Never`/`Bottom` absorb; all-record intersections apply record meet
//!   (domain union).
//! These are purely functional: they never fail.

use crate::intern::{FieldShape, TypeData, TypeId, TypeStore};
use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

/// Flatten buffer; most unions in real code stay inline.
type MemberBuf = SmallVec<[TypeId; 8]>;

impl TypeStore {
    // =========================================================================
    // Union
    // =========================================================================

    /// Build the join of `members`.
    pub fn union(&mut self, members: Vec<TypeId>) -> TypeId {
        let mut flat = MemberBuf::with_capacity(members.len());
        for member in members {
            self.flatten_union_into(member, &mut flat);
        }

        // Any absorbs everything; Top absorbs everything but Any.
        if let Some(&any) = flat
            .iter()
            .find(|&&m| matches!(self.data(m), TypeData::Any { .. }))
        {
            return any;
        }
        if flat.iter().any(|&m| matches!(self.data(m), TypeData::Top)) {
            return TypeId::TOP;
        }

        // Never is the identity.
        flat.retain(|m| !matches!(self.data(*m), TypeData::Never | TypeData::Bottom));

        // Dedup on the canonical handle.
        let mut seen = FxHashSet::default();
        flat.retain(|m| seen.insert(*m));

        // A literal is absorbed by its base when the base is present.
        let bases: FxHashSet<TypeId> = flat
            .iter()
            .filter(|&&m| {
                matches!(self.data(m), TypeData::Prim { value: None, .. })
            })
            .copied()
            .collect();
        flat.retain(|m| {
            let base = self.literal_base(*m);
            base == *m || !bases.contains(&base)
        });

        match flat.len() {
            0 => TypeId::NEVER,
            1 => flat[0],
            _ => {
                // Record join gives width subtyping for free.
                if flat.iter().all(|&m| self.data(m).is_record()) {
                    return self.record_join(&flat);
                }
                flat.sort();
                self.intern(TypeData::Union(flat.into_vec()))
            }
        }
    }

    fn flatten_union_into(&self, member: TypeId, out: &mut MemberBuf) {
        match self.data(member) {
            TypeData::Union(inner) => {
                for &m in inner.clone().iter() {
                    self.flatten_union_into(m, out);
                }
            }
            _ => out.push(member),
        }
    }

    /// Join all-record members by domain intersection; shared field types
    /// are joined pointwise.
    fn record_join(&mut self, members: &[TypeId]) -> TypeId {
        let records: Vec<Vec<FieldShape>> = members
            .iter()
            .map(|&m| match self.data(m) {
                TypeData::Record { fields } => fields.clone(),
                _ => unreachable!("record_join caller checked membership"),
            })
            .collect();

        let (first, rest) = records.split_first().expect("non-empty member list");
        let mut fields = Vec::new();
        'field: for field in first {
            let mut ty = field.ty;
            let mut optional = field.optional;
            let mut readonly = field.readonly;
            for other in rest {
                let Some(found) = other.iter().find(|f| f.name == field.name) else {
                    continue 'field;
                };
                ty = self.union(vec![ty, found.ty]);
                optional |= found.optional;
                readonly &= found.readonly;
            }
            fields.push(FieldShape {
                name: field.name.clone(),
                ty,
                optional,
                readonly,
            });
        }
        self.record(fields)
    }

    // =========================================================================
    // Intersection
    // =========================================================================

    /// Build the meet of `members`.
    pub fn intersection(&mut self, members: Vec<TypeId>) -> TypeId {
        let mut flat = MemberBuf::with_capacity(members.len());
        for member in members {
            self.flatten_intersection_into(member, &mut flat);
        }

        // Never/Bottom absorb.
        if flat.iter().any(|&m| matches!(self.data(m), TypeData::Never)) {
            return TypeId::NEVER;
        }
        if flat
            .iter()
            .any(|&m| matches!(self.data(m), TypeData::Bottom))
        {
            return TypeId::BOTTOM;
        }

        // Any and Top are identities.
        flat.retain(|m| !matches!(self.data(*m), TypeData::Any { .. } | TypeData::Top));

        let mut seen = FxHashSet::default();
        flat.retain(|m| seen.insert(*m));

        // A base is absorbed by its literal when the literal is present.
        let literal_bases: FxHashSet<TypeId> = flat
            .iter()
            .filter(|&&m| self.data(m).literal().is_some())
            .map(|&m| self.literal_base(m))
            .collect();
        flat.retain(|m| {
            self.data(*m).literal().is_some() || !literal_bases.contains(m)
        });

        match flat.len() {
            0 => TypeId::TOP,
            1 => flat[0],
            _ => {
                // Record meet takes the union of domains.
                if flat.iter().all(|&m| self.data(m).is_record()) {
                    return self.record_meet(&flat);
                }
                flat.sort();
                self.intern(TypeData::Intersection(flat.into_vec()))
            }
        }
    }

    fn flatten_intersection_into(&self, member: TypeId, out: &mut MemberBuf) {
        match self.data(member) {
            TypeData::Intersection(inner) => {
                for &m in inner.clone().iter() {
                    self.flatten_intersection_into(m, out);
                }
            }
            _ => out.push(member),
        }
    }

    /// Meet all-record members by domain union; shared field types are met
    /// pointwise, unshared fields are taken verbatim.
    fn record_meet(&mut self, members: &[TypeId]) -> TypeId {
        let records: Vec<Vec<FieldShape>> = members
            .iter()
            .map(|&m| match self.data(m) {
                TypeData::Record { fields } => fields.clone(),
                _ => unreachable!("record_meet caller checked membership"),
            })
            .collect();

        let mut merged: FxHashMap<String, FieldShape> = FxHashMap::default();
        let mut order = Vec::new();
        for record in &records {
            for field in record {
                match merged.get_mut(&field.name) {
                    None => {
                        order.push(field.name.clone());
                        merged.insert(field.name.clone(), field.clone());
                    }
                    Some(existing) => {
                        existing.ty = self.intersection(vec![existing.ty, field.ty]);
                        existing.optional &= field.optional;
                        existing.readonly |= field.readonly;
                    }
                }
            }
        }
        let fields = order
            .into_iter()
            .map(|name| merged.remove(&name).expect("field recorded in order"))
            .collect();
        self.record(fields)
    }

    // =========================================================================
    // Free variables and substitution
    // =========================================================================

    /// Variable ids occurring free in `ty`, respecting recursive binders.
    #[must_use]
    pub fn free_vars(&self, ty: TypeId) -> FxHashSet<u32> {
        let mut out = FxHashSet::default();
        let mut bound = FxHashSet::default();
        self.collect_free_vars(ty, &mut bound, &mut out, &mut FxHashSet::default());
        out
    }

    fn collect_free_vars(
        &self,
        ty: TypeId,
        bound: &mut FxHashSet<u32>,
        out: &mut FxHashSet<u32>,
        visiting: &mut FxHashSet<TypeId>,
    ) {
        if !visiting.insert(ty) {
            return;
        }
        match self.data(ty) {
            TypeData::Var { id, .. } => {
                if !bound.contains(id) {
                    out.insert(*id);
                }
            }
            TypeData::Prim { .. }
            | TypeData::Top
            | TypeData::Bottom
            | TypeData::Any { .. }
            | TypeData::Never
            | TypeData::Unknown => {}
            TypeData::Function(shape) => {
                let shape = shape.clone();
                for param in &shape.params {
                    self.collect_free_vars(param.ty, bound, out, visiting);
                }
                self.collect_free_vars(shape.ret, bound, out, visiting);
            }
            TypeData::Record { fields } => {
                for field in fields.clone() {
                    self.collect_free_vars(field.ty, bound, out, visiting);
                }
            }
            TypeData::Array { elem, tuple } => {
                let (elem, tuple) = (*elem, tuple.clone());
                self.collect_free_vars(elem, bound, out, visiting);
                for t in tuple.into_iter().flatten() {
                    self.collect_free_vars(t, bound, out, visiting);
                }
            }
            TypeData::Promise { resolved } => {
                self.collect_free_vars(*resolved, bound, out, visiting);
            }
            TypeData::Class(shape) => {
                let shape = shape.clone();
                if let Some(ctor) = &shape.ctor {
                    for param in &ctor.params {
                        self.collect_free_vars(param.ty, bound, out, visiting);
                    }
                    self.collect_free_vars(ctor.ret, bound, out, visiting);
                }
                self.collect_free_vars(shape.instance, bound, out, visiting);
                self.collect_free_vars(shape.statics, bound, out, visiting);
                if let Some(parent) = shape.parent {
                    self.collect_free_vars(parent, bound, out, visiting);
                }
            }
            TypeData::Union(members) | TypeData::Intersection(members) => {
                for m in members.clone() {
                    self.collect_free_vars(m, bound, out, visiting);
                }
            }
            TypeData::Recursive { var, body } => {
                let (var, body) = (*var, *body);
                let newly_bound = bound.insert(var);
                self.collect_free_vars(body, bound, out, visiting);
                if newly_bound {
                    bound.remove(&var);
                }
            }
        }
        visiting.remove(&ty);
    }

    /// Substitute `replacement` for free occurrences of variable `var`.
    /// Occurrences bound by a recursive binder of the same id are skipped.
    pub fn substitute(&mut self, ty: TypeId, var: u32, replacement: TypeId) -> TypeId {
        self.substitute_inner(ty, var, replacement, &mut FxHashMap::default())
    }

    fn substitute_inner(
        &mut self,
        ty: TypeId,
        var: u32,
        replacement: TypeId,
        memo: &mut FxHashMap<TypeId, TypeId>,
    ) -> TypeId {
        if let Some(&done) = memo.get(&ty) {
            return done;
        }
        let result = match self.data(ty).clone() {
            TypeData::Var { id, .. } => {
                if id == var {
                    replacement
                } else {
                    ty
                }
            }
            TypeData::Prim { .. }
            | TypeData::Top
            | TypeData::Bottom
            | TypeData::Any { .. }
            | TypeData::Never
            | TypeData::Unknown => ty,
            TypeData::Function(mut shape) => {
                for param in &mut shape.params {
                    param.ty = self.substitute_inner(param.ty, var, replacement, memo);
                }
                shape.ret = self.substitute_inner(shape.ret, var, replacement, memo);
                self.intern(TypeData::Function(shape))
            }
            TypeData::Record { mut fields } => {
                for field in &mut fields {
                    field.ty = self.substitute_inner(field.ty, var, replacement, memo);
                }
                self.intern(TypeData::Record { fields })
            }
            TypeData::Array { elem, tuple } => {
                let elem = self.substitute_inner(elem, var, replacement, memo);
                let tuple = tuple.map(|ts| {
                    ts.into_iter()
                        .map(|t| self.substitute_inner(t, var, replacement, memo))
                        .collect()
                });
                self.intern(TypeData::Array { elem, tuple })
            }
            TypeData::Promise { resolved } => {
                let resolved = self.substitute_inner(resolved, var, replacement, memo);
                self.intern(TypeData::Promise { resolved })
            }
            TypeData::Class(mut shape) => {
                if let Some(ctor) = &mut shape.ctor {
                    for param in &mut ctor.params {
                        param.ty = self.substitute_inner(param.ty, var, replacement, memo);
                    }
                    ctor.ret = self.substitute_inner(ctor.ret, var, replacement, memo);
                }
                shape.instance = self.substitute_inner(shape.instance, var, replacement, memo);
                shape.statics = self.substitute_inner(shape.statics, var, replacement, memo);
                if let Some(parent) = shape.parent {
                    shape.parent = Some(self.substitute_inner(parent, var, replacement, memo));
                }
                self.intern(TypeData::Class(shape))
            }
            TypeData::Union(members) => {
                let members = members
                    .into_iter()
                    .map(|m| self.substitute_inner(m, var, replacement, memo))
                    .collect();
                self.union(members)
            }
            TypeData::Intersection(members) => {
                let members = members
                    .into_iter()
                    .map(|m| self.substitute_inner(m, var, replacement, memo))
                    .collect();
                self.intersection(members)
            }
            TypeData::Recursive { var: binder, body } => {
                if binder == var {
                    // Bound occurrences stay untouched.
                    ty
                } else {
                    let body = self.substitute_inner(body, var, replacement, memo);
                    self.recursive(binder, body)
                }
            }
        };
        memo.insert(ty, result);
        result
    }

    // =========================================================================
    // Equality
    // =========================================================================

    /// Structural equality: alpha-equivalent on recursive binders,
    /// order-independent on unions/intersections.
    ///
    /// Hash-consing makes handle equality cover everything except binder
    /// renaming, so the slow path only runs when recursive types are
    /// involved.
    #[must_use]
    pub fn type_equals(&self, a: TypeId, b: TypeId) -> bool {
        if a == b {
            return true;
        }
        self.alpha_equals(a, b, &mut FxHashMap::default(), &mut FxHashSet::default())
    }

    fn alpha_equals(
        &self,
        a: TypeId,
        b: TypeId,
        binders: &mut FxHashMap<u32, u32>,
        visiting: &mut FxHashSet<(TypeId, TypeId)>,
    ) -> bool {
        if a == b && binders.is_empty() {
            return true;
        }
        if !visiting.insert((a, b)) {
            // Coinductive: a revisited pair is equal unless proven otherwise.
            return true;
        }
        let result = match (self.data(a), self.data(b)) {
            (TypeData::Var { id: ia, .. }, TypeData::Var { id: ib, .. }) => {
                binders.get(ia).copied().unwrap_or(*ia) == *ib
            }
            (TypeData::Prim { kind: ka, value: va }, TypeData::Prim { kind: kb, value: vb }) => {
                ka == kb && va == vb
            }
            (TypeData::Function(fa), TypeData::Function(fb)) => {
                fa.params.len() == fb.params.len()
                    && fa.is_async == fb.is_async
                    && fa.is_generator == fb.is_generator
                    && fa
                        .params
                        .iter()
                        .zip(&fb.params)
                        .all(|(pa, pb)| {
                            pa.optional == pb.optional
                                && pa.rest == pb.rest
                                && self.alpha_equals(pa.ty, pb.ty, binders, visiting)
                        })
                    && self.alpha_equals(fa.ret, fb.ret, binders, visiting)
            }
            (TypeData::Record { fields: fa }, TypeData::Record { fields: fb }) => {
                fa.len() == fb.len()
                    && fa.iter().zip(fb).all(|(x, y)| {
                        x.name == y.name
                            && x.optional == y.optional
                            && x.readonly == y.readonly
                            && self.alpha_equals(x.ty, y.ty, binders, visiting)
                    })
            }
            (
                TypeData::Array { elem: ea, tuple: ta },
                TypeData::Array { elem: eb, tuple: tb },
            ) => {
                self.alpha_equals(*ea, *eb, binders, visiting)
                    && match (ta, tb) {
                        (None, None) => true,
                        (Some(xs), Some(ys)) => {
                            xs.len() == ys.len()
                                && xs
                                    .iter()
                                    .zip(ys)
                                    .all(|(&x, &y)| self.alpha_equals(x, y, binders, visiting))
                        }
                        _ => false,
                    }
            }
            (TypeData::Promise { resolved: ra }, TypeData::Promise { resolved: rb }) => {
                self.alpha_equals(*ra, *rb, binders, visiting)
            }
            (TypeData::Class(ca), TypeData::Class(cb)) => {
                ca.name == cb.name
                    && self.alpha_equals(ca.instance, cb.instance, binders, visiting)
            }
            (TypeData::Union(ma), TypeData::Union(mb))
            | (TypeData::Intersection(ma), TypeData::Intersection(mb)) => {
                // Canonical sorted form makes pointwise comparison valid
                // unless binders differ; fall back to unordered matching.
                ma.len() == mb.len()
                    && ma.iter().all(|&x| {
                        mb.iter()
                            .any(|&y| self.alpha_equals(x, y, &mut binders.clone(), visiting))
                    })
            }
            (
                TypeData::Recursive { var: va, body: ba },
                TypeData::Recursive { var: vb, body: bb },
            ) => {
                let prior = binders.insert(*va, *vb);
                let eq = self.alpha_equals(*ba, *bb, binders, visiting);
                match prior {
                    Some(p) => {
                        binders.insert(*va, p);
                    }
                    None => {
                        binders.remove(va);
                    }
                }
                eq
            }
            (TypeData::Top, TypeData::Top)
            | (TypeData::Bottom, TypeData::Bottom)
            | (TypeData::Never, TypeData::Never)
            | (TypeData::Unknown, TypeData::Unknown)
            | (TypeData::Any { .. }, TypeData::Any { .. }) => true,
            _ => false,
        };
        visiting.remove(&(a, b));
        result
    }
}

#[cfg(test)]
#[path = "tests/lattice_tests.rs"]
mod tests;
