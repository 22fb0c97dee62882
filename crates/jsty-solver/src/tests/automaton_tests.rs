use super::*;
use crate::intern::{FieldShape, ParamShape, TypeId, TypeStore};

#[test]
fn test_primitive_round_trip() {
    let mut store = TypeStore::new();
    let auto = TypeAutomaton::from_type(&store, TypeId::NUMBER, Polarity::Pos);
    assert_eq!(auto.len(), 1);
    let back = auto.to_type(&mut store);
    assert_eq!(back, TypeId::NUMBER);
}

#[test]
fn test_literal_round_trip() {
    let mut store = TypeStore::new();
    let lit = store.literal_string("hi");
    let auto = TypeAutomaton::from_type(&store, lit, Polarity::Pos);
    let back = auto.to_type(&mut store);
    assert_eq!(back, lit);
}

#[test]
fn test_function_polarity_flip() {
    let mut store = TypeStore::new();
    let f = store.function(vec![ParamShape::new("x", TypeId::STRING)], TypeId::NUMBER);
    let auto = TypeAutomaton::from_type(&store, f, Polarity::Pos);

    let start = auto.state(auto.start);
    assert_eq!(start.polarity, Polarity::Pos);
    let domain = start.transitions[&TransLabel::Domain(0)]
        .iter()
        .next()
        .copied()
        .expect("domain transition");
    let range = start.transitions[&TransLabel::Range]
        .iter()
        .next()
        .copied()
        .expect("range transition");
    // Contravariant position flips polarity; covariant keeps it.
    assert_eq!(auto.state(domain).polarity, Polarity::Neg);
    assert_eq!(auto.state(range).polarity, Polarity::Pos);

    let back = auto.to_type(&mut store);
    let crate::intern::TypeData::Function(shape) = store.data(back) else {
        panic!("expected function");
    };
    assert_eq!(shape.params[0].ty, TypeId::STRING);
    assert_eq!(shape.ret, TypeId::NUMBER);
}

#[test]
fn test_union_members_share_a_state() {
    let mut store = TypeStore::new();
    let u = store.union(vec![TypeId::STRING, TypeId::NUMBER]);
    let auto = TypeAutomaton::from_type(&store, u, Polarity::Pos);
    assert_eq!(auto.len(), 1);
    assert_eq!(auto.state(auto.start).heads.len(), 2);
    let back = auto.to_type(&mut store);
    assert_eq!(back, u);
}

#[test]
fn test_record_round_trip() {
    let mut store = TypeStore::new();
    let r = store.record(vec![
        FieldShape::new("a", TypeId::NUMBER),
        FieldShape::new("b", TypeId::STRING),
    ]);
    let auto = TypeAutomaton::from_type(&store, r, Polarity::Pos);
    let back = auto.to_type(&mut store);
    let crate::intern::TypeData::Record { fields } = store.data(back) else {
        panic!("expected record");
    };
    assert_eq!(fields.len(), 2);
    assert_eq!(fields[0].name, "a");
    assert_eq!(fields[0].ty, TypeId::NUMBER);
}

#[test]
fn test_recursive_type_cycle() {
    let mut store = TypeStore::new();
    let var = store.fresh_var_id();
    let node = store.var_ref(var, 0);
    let body = store.record(vec![FieldShape::new("next", node)]);
    let rec = store.recursive(var, body);

    let auto = TypeAutomaton::from_type(&store, rec, Polarity::Pos);
    // The binder reuses its state: the Field("next") transition points
    // back at the start.
    let start = auto.state(auto.start);
    let next = start.transitions[&TransLabel::Field("next".into())]
        .iter()
        .next()
        .copied()
        .expect("next transition");
    assert_eq!(next, auto.start);

    // Decompilation re-ties the cycle with a recursive binder.
    let back = auto.to_type(&mut store);
    assert!(matches!(
        store.data(back),
        crate::intern::TypeData::Recursive { .. }
    ));
    assert!(store.type_equals(back, rec));
}

#[test]
fn test_minimize_merges_duplicate_states() {
    let mut store = TypeStore::new();
    // (a: number, b: number) => number builds one state per subterm;
    // both domains minimize to one state.
    let f = store.function(
        vec![
            ParamShape::new("a", TypeId::NUMBER),
            ParamShape::new("b", TypeId::NUMBER),
        ],
        TypeId::NUMBER,
    );
    let auto = TypeAutomaton::from_type(&store, f, Polarity::Pos);
    let minimized = auto.minimize();
    assert!(minimized.len() <= auto.len());
    // Round trip preserves meaning.
    let back = minimized.to_type(&mut store);
    let crate::intern::TypeData::Function(shape) = store.data(back) else {
        panic!("expected function");
    };
    assert_eq!(shape.params.len(), 2);
    assert_eq!(shape.ret, TypeId::NUMBER);
}

#[test]
fn test_minimize_distinguishes_polarity() {
    let mut store = TypeStore::new();
    // number appears in both polarities; minimization must not merge a
    // positive state with a negative one.
    let f = store.function(vec![ParamShape::new("x", TypeId::NUMBER)], TypeId::NUMBER);
    let auto = TypeAutomaton::from_type(&store, f, Polarity::Pos);
    let minimized = auto.minimize();
    assert_eq!(minimized.len(), 3);
}

#[test]
fn test_minimization_is_idempotent_up_to_isomorphism() {
    // Law: round-tripping through minimize yields a type whose automaton
    // is isomorphic to the minimized automaton of the input.
    let mut store = TypeStore::new();
    let inner = store.record(vec![FieldShape::new("x", TypeId::NUMBER)]);
    let arr = store.array(inner);
    let f = store.function(vec![ParamShape::new("items", arr)], inner);

    let minimized = TypeAutomaton::from_type(&store, f, Polarity::Pos).minimize();
    let back = minimized.to_type(&mut store);
    let again = TypeAutomaton::from_type(&store, back, Polarity::Pos).minimize();
    assert!(minimized.isomorphic(&again));
}

#[test]
fn test_free_vars_get_flow_edges() {
    let mut store = TypeStore::new();
    let a = store.fresh_var(Some("a"), 0);
    // (x: a) => a: the negative occurrence flows into the positive one.
    let f = store.function(vec![ParamShape::new("x", a)], a);
    let auto = TypeAutomaton::from_type(&store, f, Polarity::Pos);

    let start = auto.state(auto.start);
    let domain = start.transitions[&TransLabel::Domain(0)]
        .iter()
        .next()
        .copied()
        .unwrap();
    let range = start.transitions[&TransLabel::Range]
        .iter()
        .next()
        .copied()
        .unwrap();
    assert!(auto.state(domain).flow.contains(&range));
    assert!(auto.state(range).flow.contains(&domain));
}

#[test]
fn test_unreachable_states_dropped() {
    let mut store = TypeStore::new();
    let r = store.record(vec![FieldShape::new("a", TypeId::NUMBER)]);
    let auto = TypeAutomaton::from_type(&store, r, Polarity::Pos);
    let minimized = auto.minimize();
    // Every state in the minimized automaton is reachable from the start.
    let mut seen = vec![false; minimized.len()];
    let mut stack = vec![minimized.start];
    while let Some(s) = stack.pop() {
        if std::mem::replace(&mut seen[s.index()], true) {
            continue;
        }
        for targets in minimized.state(s).transitions.values() {
            stack.extend(targets.iter().copied());
        }
    }
    assert!(seen.into_iter().all(|v| v));
}
