//! Type automata: a finite-state representation of polar types.
//!
//! Each state carries a polarity, a set of head constructors, transitions
//! labeled by structural position, and flow edges linking the negative and
//! positive occurrences of a variable. Two polar types are interconvertible
//! iff their automata accept the same language, so partition-refinement
//! minimization is a safe simplification pass.
//!
//! Construction creates one state per subterm; union/intersection members
//! attach their heads to the same state; recursive binders reuse the
//! binder's state as the jump target; contravariant transitions flip the
//! polarity of the target.

use crate::intern::{LiteralValue, ParamShape, PrimKind, TypeData, TypeId, TypeStore};
use fixedbitset::FixedBitSet;
use jsty_common::limits::{MAX_AUTOMATON_STATES, MAX_DECOMPILE_DEPTH};
use rustc_hash::FxHashMap;
use std::collections::{BTreeMap, BTreeSet};

/// Handle to a state within one automaton.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u32);

impl StateId {
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Polarity of a state: positive at output positions, negative at inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Polarity {
    Pos,
    Neg,
}

impl Polarity {
    #[must_use]
    pub const fn flip(self) -> Self {
        match self {
            Polarity::Pos => Polarity::Neg,
            Polarity::Neg => Polarity::Pos,
        }
    }
}

/// One parameter slot of an arrow head. Names and flags ride along so a
/// round trip through the automaton keeps signatures readable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArrowParam {
    pub name: String,
    pub optional: bool,
    pub rest: bool,
}

/// Head constructors a state can carry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Head {
    Var(u32),
    Arrow {
        params: Vec<ArrowParam>,
        is_async: bool,
        is_generator: bool,
    },
    Record {
        labels: BTreeSet<String>,
    },
    Array {
        tuple_len: Option<usize>,
    },
    Prim {
        kind: PrimKind,
        value: Option<LiteralValue>,
    },
    Promise,
    Class {
        name: String,
    },
    Top,
    Bottom,
    Any,
    Never,
    Unknown,
}

/// Transition labels: structural positions within a head constructor.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TransLabel {
    /// i-th parameter (contravariant).
    Domain(usize),
    /// Function range.
    Range,
    /// Record field.
    Field(String),
    /// Array element.
    Elem,
    /// i-th tuple element.
    TupleElem(usize),
    /// Promise resolved type.
    Resolved,
}

impl TransLabel {
    /// Whether the transition flips polarity.
    #[must_use]
    pub const fn contravariant(&self) -> bool {
        matches!(self, TransLabel::Domain(_))
    }
}

/// One automaton state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AutoState {
    pub polarity: Polarity,
    pub heads: BTreeSet<Head>,
    pub transitions: BTreeMap<TransLabel, BTreeSet<StateId>>,
    /// Flow edges to the opposite-polarity occurrences of shared variables.
    pub flow: BTreeSet<StateId>,
}

impl AutoState {
    fn new(polarity: Polarity) -> Self {
        Self {
            polarity,
            heads: BTreeSet::new(),
            transitions: BTreeMap::new(),
            flow: BTreeSet::new(),
        }
    }
}

/// A type automaton with a designated start state.
#[derive(Clone, Debug)]
pub struct TypeAutomaton {
    pub states: Vec<AutoState>,
    pub start: StateId,
    /// Class types encountered during construction, for reconstruction
    /// (class heads are nominal atoms in the automaton).
    class_types: FxHashMap<String, TypeId>,
}

impl TypeAutomaton {
    #[must_use]
    pub fn state(&self, id: StateId) -> &AutoState {
        &self.states[id.index()]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Build the automaton of `ty` at the given start polarity.
    #[must_use]
    pub fn from_type(store: &TypeStore, ty: TypeId, polarity: Polarity) -> Self {
        let mut builder = Builder {
            store,
            states: Vec::new(),
            memo: FxHashMap::default(),
            binder_states: FxHashMap::default(),
            var_occurrences: FxHashMap::default(),
            class_types: FxHashMap::default(),
            pending_merges: Vec::new(),
        };
        let start = builder.build(ty, polarity);
        builder.resolve_merges();
        builder.wire_flow_edges();
        TypeAutomaton {
            states: builder.states,
            start,
            class_types: builder.class_types,
        }
    }

    /// Minimize: drop unreachable states, partition-refine by
    /// (polarity, head signature), then split on transition targets and
    /// flow neighborhoods until stable, and merge each class to its
    /// representative.
    #[must_use]
    pub fn minimize(&self) -> Self {
        let reachable = self.reachable_set();

        // Dense renumbering of reachable states for the refinement arrays.
        let live: Vec<StateId> = (0..self.states.len())
            .filter(|&i| reachable.contains(i))
            .map(|i| StateId(i as u32))
            .collect();
        if live.is_empty() {
            return self.clone();
        }
        let dense: FxHashMap<StateId, usize> =
            live.iter().enumerate().map(|(i, &s)| (s, i)).collect();

        // Initial partition: (polarity, head signature).
        let mut class_of: Vec<usize> = vec![0; live.len()];
        {
            let mut groups: FxHashMap<(Polarity, Vec<Head>), usize> = FxHashMap::default();
            for (i, &sid) in live.iter().enumerate() {
                let state = self.state(sid);
                let sig = (
                    state.polarity,
                    state.heads.iter().cloned().collect::<Vec<_>>(),
                );
                let next = groups.len();
                class_of[i] = *groups.entry(sig).or_insert(next);
            }
        }

        // Refinement: split classes whose members disagree on the classes
        // of their transition targets or flow neighbors.
        loop {
            let mut groups: FxHashMap<(usize, Vec<(TransLabel, BTreeSet<usize>)>, BTreeSet<usize>), usize> =
                FxHashMap::default();
            let mut next_class = vec![0usize; live.len()];
            for (i, &sid) in live.iter().enumerate() {
                let state = self.state(sid);
                let transition_key: Vec<(TransLabel, BTreeSet<usize>)> = state
                    .transitions
                    .iter()
                    .map(|(label, targets)| {
                        let classes: BTreeSet<usize> = targets
                            .iter()
                            .filter_map(|t| dense.get(t).map(|&d| class_of[d]))
                            .collect();
                        (label.clone(), classes)
                    })
                    .collect();
                let flow_key: BTreeSet<usize> = state
                    .flow
                    .iter()
                    .filter_map(|t| dense.get(t).map(|&d| class_of[d]))
                    .collect();
                let key = (class_of[i], transition_key, flow_key);
                let fresh = groups.len();
                next_class[i] = *groups.entry(key).or_insert(fresh);
            }
            if next_class == class_of {
                break;
            }
            class_of = next_class;
        }

        // Merge each class to its first member.
        let class_count = class_of.iter().max().map_or(0, |&m| m + 1);
        let mut representative: Vec<Option<usize>> = vec![None; class_count];
        for (i, &class) in class_of.iter().enumerate() {
            if representative[class].is_none() {
                representative[class] = Some(i);
            }
        }

        let mut states = Vec::with_capacity(class_count);
        for class in 0..class_count {
            let rep = representative[class].expect("every class has a member");
            let old = self.state(live[rep]);
            let remap = |targets: &BTreeSet<StateId>| -> BTreeSet<StateId> {
                targets
                    .iter()
                    .filter_map(|t| dense.get(t).map(|&d| StateId(class_of[d] as u32)))
                    .collect()
            };
            states.push(AutoState {
                polarity: old.polarity,
                heads: old.heads.clone(),
                transitions: old
                    .transitions
                    .iter()
                    .map(|(label, targets)| (label.clone(), remap(targets)))
                    .collect(),
                flow: remap(&old.flow),
            });
        }

        let start_dense = dense[&self.start];
        TypeAutomaton {
            states,
            start: StateId(class_of[start_dense] as u32),
            class_types: self.class_types.clone(),
        }
    }

    fn reachable_set(&self) -> FixedBitSet {
        let mut reachable = FixedBitSet::with_capacity(self.states.len());
        let mut stack = vec![self.start];
        while let Some(state) = stack.pop() {
            if reachable.contains(state.index()) {
                continue;
            }
            reachable.insert(state.index());
            for targets in self.state(state).transitions.values() {
                stack.extend(targets.iter().copied());
            }
            // Flow neighbors are part of the represented type.
            stack.extend(self.state(state).flow.iter().copied());
        }
        reachable
    }

    /// Convert the automaton back to a type. Cycles become recursive
    /// binders; multiple heads aggregate into a union (positive state) or
    /// intersection (negative state).
    pub fn to_type(&self, store: &mut TypeStore) -> TypeId {
        let mut decompiler = Decompiler {
            automaton: self,
            store,
            on_stack: FxHashMap::default(),
            depth: 0,
        };
        decompiler.decompile(self.start)
    }

    /// Structural isomorphism up to state renumbering, checked by parallel
    /// traversal from the start states.
    #[must_use]
    pub fn isomorphic(&self, other: &Self) -> bool {
        let mut pairing: FxHashMap<StateId, StateId> = FxHashMap::default();
        let mut stack = vec![(self.start, other.start)];
        while let Some((a, b)) = stack.pop() {
            if let Some(&mapped) = pairing.get(&a) {
                if mapped != b {
                    return false;
                }
                continue;
            }
            let sa = self.state(a);
            let sb = other.state(b);
            if sa.polarity != sb.polarity
                || sa.heads != sb.heads
                || sa.transitions.len() != sb.transitions.len()
                || sa.flow.len() != sb.flow.len()
            {
                return false;
            }
            pairing.insert(a, b);
            for (label, targets_a) in &sa.transitions {
                let Some(targets_b) = sb.transitions.get(label) else {
                    return false;
                };
                if targets_a.len() != targets_b.len() {
                    return false;
                }
                for (&ta, &tb) in targets_a.iter().zip(targets_b) {
                    stack.push((ta, tb));
                }
            }
            for (&fa, &fb) in sa.flow.iter().zip(&sb.flow) {
                stack.push((fa, fb));
            }
        }
        true
    }
}

// =============================================================================
// Construction
// =============================================================================

struct Builder<'a> {
    store: &'a TypeStore,
    states: Vec<AutoState>,
    memo: FxHashMap<(TypeId, Polarity), StateId>,
    /// Recursive binder var -> the state being built for its body.
    binder_states: FxHashMap<u32, StateId>,
    /// Variable id -> (positive states, negative states) it occurs in.
    var_occurrences: FxHashMap<u32, (Vec<StateId>, Vec<StateId>)>,
    class_types: FxHashMap<String, TypeId>,
    /// Bound variables appearing as union/intersection members merge their
    /// binder's state into the member's state once construction finishes.
    pending_merges: Vec<(StateId, StateId)>,
}

impl Builder<'_> {
    fn alloc(&mut self, polarity: Polarity) -> StateId {
        assert!(
            self.states.len() < MAX_AUTOMATON_STATES,
            "automaton state cap exceeded"
        );
        let id = StateId(self.states.len() as u32);
        self.states.push(AutoState::new(polarity));
        id
    }

    fn build(&mut self, ty: TypeId, polarity: Polarity) -> StateId {
        // A bound variable jumps back to its binder's state.
        if let TypeData::Var { id, .. } = self.store.data(ty) {
            if let Some(&target) = self.binder_states.get(id) {
                return target;
            }
        }
        if let Some(&done) = self.memo.get(&(ty, polarity)) {
            return done;
        }
        let state = self.alloc(polarity);
        self.memo.insert((ty, polarity), state);
        self.add_to_state(state, ty, polarity);
        state
    }

    fn add_transition(&mut self, from: StateId, label: TransLabel, to: StateId) {
        self.states[from.index()]
            .transitions
            .entry(label)
            .or_default()
            .insert(to);
    }

    fn add_to_state(&mut self, state: StateId, ty: TypeId, polarity: Polarity) {
        match self.store.data(ty).clone() {
            TypeData::Var { id, .. } => {
                if let Some(&target) = self.binder_states.get(&id) {
                    // Bound occurrence as a union/intersection member: the
                    // binder's state merges in after construction, when its
                    // transitions exist.
                    if target != state {
                        self.pending_merges.push((state, target));
                    }
                    return;
                }
                self.states[state.index()].heads.insert(Head::Var(id));
                let occ = self.var_occurrences.entry(id).or_default();
                match polarity {
                    Polarity::Pos => occ.0.push(state),
                    Polarity::Neg => occ.1.push(state),
                }
            }
            TypeData::Prim { kind, value } => {
                self.states[state.index()]
                    .heads
                    .insert(Head::Prim { kind, value });
            }
            TypeData::Function(shape) => {
                let params = shape
                    .params
                    .iter()
                    .map(|p| ArrowParam {
                        name: p.name.clone(),
                        optional: p.optional,
                        rest: p.rest,
                    })
                    .collect();
                self.states[state.index()].heads.insert(Head::Arrow {
                    params,
                    is_async: shape.is_async,
                    is_generator: shape.is_generator,
                });
                for (i, param) in shape.params.iter().enumerate() {
                    let target = self.build(param.ty, polarity.flip());
                    self.add_transition(state, TransLabel::Domain(i), target);
                }
                let target = self.build(shape.ret, polarity);
                self.add_transition(state, TransLabel::Range, target);
            }
            TypeData::Record { fields } => {
                let labels = fields.iter().map(|f| f.name.clone()).collect();
                self.states[state.index()]
                    .heads
                    .insert(Head::Record { labels });
                for field in fields {
                    let target = self.build(field.ty, polarity);
                    self.add_transition(state, TransLabel::Field(field.name), target);
                }
            }
            TypeData::Array { elem, tuple } => {
                self.states[state.index()].heads.insert(Head::Array {
                    tuple_len: tuple.as_ref().map(Vec::len),
                });
                let target = self.build(elem, polarity);
                self.add_transition(state, TransLabel::Elem, target);
                if let Some(elems) = tuple {
                    for (i, t) in elems.into_iter().enumerate() {
                        let target = self.build(t, polarity);
                        self.add_transition(state, TransLabel::TupleElem(i), target);
                    }
                }
            }
            TypeData::Promise { resolved } => {
                self.states[state.index()].heads.insert(Head::Promise);
                let target = self.build(resolved, polarity);
                self.add_transition(state, TransLabel::Resolved, target);
            }
            TypeData::Class(shape) => {
                self.class_types.insert(shape.name.clone(), ty);
                self.states[state.index()]
                    .heads
                    .insert(Head::Class { name: shape.name });
            }
            TypeData::Union(members) | TypeData::Intersection(members) => {
                // All member heads attach to the same state.
                for m in members {
                    self.add_to_state(state, m, polarity);
                }
            }
            TypeData::Recursive { var, body } => {
                let prior = self.binder_states.insert(var, state);
                self.add_to_state(state, body, polarity);
                match prior {
                    Some(p) => {
                        self.binder_states.insert(var, p);
                    }
                    None => {
                        self.binder_states.remove(&var);
                    }
                }
            }
            TypeData::Top => {
                self.states[state.index()].heads.insert(Head::Top);
            }
            TypeData::Bottom => {
                self.states[state.index()].heads.insert(Head::Bottom);
            }
            TypeData::Any { .. } => {
                self.states[state.index()].heads.insert(Head::Any);
            }
            TypeData::Never => {
                self.states[state.index()].heads.insert(Head::Never);
            }
            TypeData::Unknown => {
                self.states[state.index()].heads.insert(Head::Unknown);
            }
        }
    }

    /// Copy heads and transitions of merged-in binder states, transitively.
    fn resolve_merges(&mut self) {
        for _ in 0..self.pending_merges.len().max(1) {
            let mut changed = false;
            for (into, from) in self.pending_merges.clone() {
                let source = self.states[from.index()].clone();
                let target = &mut self.states[into.index()];
                for head in source.heads {
                    changed |= target.heads.insert(head);
                }
                for (label, targets) in source.transitions {
                    let slot = target.transitions.entry(label).or_default();
                    for t in targets {
                        changed |= slot.insert(t);
                    }
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// Connect the negative and positive occurrences of each variable.
    fn wire_flow_edges(&mut self) {
        for (pos_states, neg_states) in self.var_occurrences.values() {
            for &n in neg_states {
                for &p in pos_states {
                    self.states[n.index()].flow.insert(p);
                    self.states[p.index()].flow.insert(n);
                }
            }
        }
    }
}

// =============================================================================
// Decompilation
// =============================================================================

struct Decompiler<'a, 'b> {
    automaton: &'a TypeAutomaton,
    store: &'b mut TypeStore,
    /// States currently on the DFS stack, with the binder var allocated
    /// for them once a cycle is observed.
    on_stack: FxHashMap<StateId, Option<u32>>,
    depth: u32,
}

impl Decompiler<'_, '_> {
    fn decompile(&mut self, state: StateId) -> TypeId {
        if let Some(entry) = self.on_stack.get_mut(&state) {
            // Cycle: hand back a variable bound by the enclosing binder.
            let var = match entry {
                Some(var) => *var,
                None => {
                    let var = self.store.fresh_var_id();
                    *entry = Some(var);
                    var
                }
            };
            return self.store.var_ref(var, 0);
        }
        self.depth += 1;
        if self.depth > MAX_DECOMPILE_DEPTH {
            self.depth -= 1;
            return TypeId::ANY;
        }
        self.on_stack.insert(state, None);

        let auto_state = self.automaton.state(state).clone();
        let polarity = auto_state.polarity;
        let mut parts = Vec::with_capacity(auto_state.heads.len());
        for head in &auto_state.heads {
            parts.push(self.head_type(head, &auto_state, polarity));
        }
        let body = match parts.len() {
            0 => match polarity {
                // An empty positive state is the bottom of joins; an empty
                // negative state is the top of meets.
                Polarity::Pos => TypeId::NEVER,
                Polarity::Neg => TypeId::TOP,
            },
            1 => parts[0],
            _ => match polarity {
                Polarity::Pos => self.store.union(parts),
                Polarity::Neg => self.store.intersection(parts),
            },
        };

        let binder = self
            .on_stack
            .remove(&state)
            .expect("state was pushed above");
        self.depth -= 1;
        match binder {
            Some(var) => self.store.recursive(var, body),
            None => body,
        }
    }

    /// Merge the targets of one transition into a single type.
    fn merge_targets(&mut self, state: &AutoState, label: &TransLabel) -> Option<TypeId> {
        let targets = state.transitions.get(label)?;
        let decompiled: Vec<TypeId> = targets.iter().map(|&t| self.decompile(t)).collect();
        let target_polarity = if label.contravariant() {
            state.polarity.flip()
        } else {
            state.polarity
        };
        Some(match decompiled.len() {
            1 => decompiled[0],
            _ => match target_polarity {
                Polarity::Pos => self.store.union(decompiled),
                Polarity::Neg => self.store.intersection(decompiled),
            },
        })
    }

    fn head_type(&mut self, head: &Head, state: &AutoState, _polarity: Polarity) -> TypeId {
        match head {
            Head::Var(id) => self.store.var_ref(*id, 0),
            Head::Prim { kind, value } => self.store.intern(TypeData::Prim {
                kind: *kind,
                value: value.clone(),
            }),
            Head::Arrow {
                params,
                is_async,
                is_generator,
            } => {
                let param_shapes: Vec<ParamShape> = params
                    .iter()
                    .enumerate()
                    .map(|(i, p)| {
                        let ty = self
                            .merge_targets(state, &TransLabel::Domain(i))
                            .unwrap_or(TypeId::ANY);
                        let mut shape = ParamShape::new(p.name.clone(), ty);
                        shape.optional = p.optional;
                        shape.rest = p.rest;
                        shape
                    })
                    .collect();
                let ret = self
                    .merge_targets(state, &TransLabel::Range)
                    .unwrap_or(TypeId::ANY);
                let mut shape = crate::intern::FunctionShape::new(param_shapes, ret);
                shape.is_async = *is_async;
                shape.is_generator = *is_generator;
                self.store.function_shape(shape)
            }
            Head::Record { labels } => {
                let fields = labels
                    .iter()
                    .map(|label| {
                        let ty = self
                            .merge_targets(state, &TransLabel::Field(label.clone()))
                            .unwrap_or(TypeId::ANY);
                        crate::intern::FieldShape::new(label.clone(), ty)
                    })
                    .collect();
                self.store.record(fields)
            }
            Head::Array { tuple_len } => match tuple_len {
                Some(len) => {
                    let elems: Vec<TypeId> = (0..*len)
                        .map(|i| {
                            self.merge_targets(state, &TransLabel::TupleElem(i))
                                .unwrap_or(TypeId::ANY)
                        })
                        .collect();
                    self.store.tuple(elems)
                }
                None => {
                    let elem = self
                        .merge_targets(state, &TransLabel::Elem)
                        .unwrap_or(TypeId::ANY);
                    self.store.array(elem)
                }
            },
            Head::Promise => {
                let resolved = self
                    .merge_targets(state, &TransLabel::Resolved)
                    .unwrap_or(TypeId::ANY);
                self.store.promise(resolved)
            }
            Head::Class { name } => self
                .automaton
                .class_types
                .get(name)
                .copied()
                .unwrap_or(TypeId::ANY),
            Head::Top => TypeId::TOP,
            Head::Bottom => TypeId::BOTTOM,
            Head::Any => TypeId::ANY,
            Head::Never => TypeId::NEVER,
            Head::Unknown => TypeId::UNKNOWN,
        }
    }
}

#[cfg(test)]
#[path = "tests/automaton_tests.rs"]
mod tests;
