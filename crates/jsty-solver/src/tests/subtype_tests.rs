use super::*;
use crate::intern::{ClassShape, FieldShape, ParamShape, TypeStore};

#[test]
fn test_reflexivity_on_intrinsics() {
    let store = TypeStore::new();
    let mut checker = SubtypeChecker::new(&store);
    for ty in [
        TypeId::ANY,
        TypeId::UNKNOWN,
        TypeId::NEVER,
        TypeId::TOP,
        TypeId::BOTTOM,
        TypeId::BOOLEAN,
        TypeId::NUMBER,
        TypeId::STRING,
        TypeId::NULL,
        TypeId::UNDEFINED,
        TypeId::SYMBOL,
        TypeId::BIGINT,
    ] {
        assert!(checker.is_subtype_of(ty, ty), "reflexivity failed for {ty:?}");
    }
}

#[test]
fn test_literal_below_base_not_above() {
    let mut store = TypeStore::new();
    let lit = store.literal_number(42.0);
    let mut checker = SubtypeChecker::new(&store);
    assert!(checker.is_subtype_of(lit, TypeId::NUMBER));
    assert!(!checker.is_subtype_of(TypeId::NUMBER, lit));
}

#[test]
fn test_never_is_bottom_top_is_top() {
    let store = TypeStore::new();
    let mut checker = SubtypeChecker::new(&store);
    assert!(checker.is_subtype_of(TypeId::NEVER, TypeId::STRING));
    assert!(checker.is_subtype_of(TypeId::STRING, TypeId::TOP));
    assert!(!checker.is_subtype_of(TypeId::TOP, TypeId::STRING));
    assert!(!checker.is_subtype_of(TypeId::STRING, TypeId::NEVER));
}

#[test]
fn test_union_membership() {
    let mut store = TypeStore::new();
    let u = store.union(vec![TypeId::STRING, TypeId::NUMBER]);
    let mut checker = SubtypeChecker::new(&store);
    assert!(checker.is_subtype_of(TypeId::STRING, u));
    assert!(checker.is_subtype_of(u, u));
    assert!(!checker.is_subtype_of(TypeId::BOOLEAN, u));
    assert!(!checker.is_subtype_of(u, TypeId::STRING));
}

#[test]
fn test_record_width_subtyping() {
    let mut store = TypeStore::new();
    let wide = store.record(vec![
        FieldShape::new("a", TypeId::NUMBER),
        FieldShape::new("b", TypeId::STRING),
    ]);
    let narrow = store.record(vec![FieldShape::new("a", TypeId::NUMBER)]);
    let mut checker = SubtypeChecker::new(&store);
    assert!(checker.is_subtype_of(wide, narrow));
    assert!(!checker.is_subtype_of(narrow, wide));
}

#[test]
fn test_optional_fields_may_be_absent() {
    let mut store = TypeStore::new();
    let need = store.record(vec![FieldShape::new("a", TypeId::NUMBER).optional()]);
    let empty = store.record(vec![]);
    let mut checker = SubtypeChecker::new(&store);
    assert!(checker.is_subtype_of(empty, need));
}

#[test]
fn test_function_variance() {
    let mut store = TypeStore::new();
    let lit = store.literal_number(1.0);
    // (x: number) => 1  <=  (x: 1) => number
    let sub = store.function(vec![ParamShape::new("x", TypeId::NUMBER)], lit);
    let sup = store.function(vec![ParamShape::new("x", lit)], TypeId::NUMBER);
    let mut checker = SubtypeChecker::new(&store);
    assert!(checker.is_subtype_of(sub, sup));
    assert!(!checker.is_subtype_of(sup, sub));
}

#[test]
fn test_fewer_params_is_subtype() {
    let mut store = TypeStore::new();
    let thunk = store.function(vec![], TypeId::NUMBER);
    let unary = store.function(vec![ParamShape::new("x", TypeId::STRING)], TypeId::NUMBER);
    let mut checker = SubtypeChecker::new(&store);
    // A function ignoring its argument can stand in for one that takes it.
    assert!(checker.is_subtype_of(thunk, unary));
    assert!(!checker.is_subtype_of(unary, thunk));
}

#[test]
fn test_array_covariance() {
    let mut store = TypeStore::new();
    let lit = store.literal_number(1.0);
    let lit_arr = store.array(lit);
    let num_arr = store.array(TypeId::NUMBER);
    let mut checker = SubtypeChecker::new(&store);
    assert!(checker.is_subtype_of(lit_arr, num_arr));
    assert!(!checker.is_subtype_of(num_arr, lit_arr));
}

#[test]
fn test_tuple_against_array() {
    let mut store = TypeStore::new();
    let t = store.tuple(vec![TypeId::NUMBER, TypeId::NUMBER]);
    let arr = store.array(TypeId::NUMBER);
    let mut checker = SubtypeChecker::new(&store);
    assert!(checker.is_subtype_of(t, arr));
    assert!(!checker.is_subtype_of(arr, t));
}

#[test]
fn test_promise_covariance() {
    let mut store = TypeStore::new();
    let lit = store.literal_number(1.0);
    let p_lit = store.promise(lit);
    let p_num = store.promise(TypeId::NUMBER);
    let mut checker = SubtypeChecker::new(&store);
    assert!(checker.is_subtype_of(p_lit, p_num));
}

#[test]
fn test_recursive_type_against_unrolling() {
    let mut store = TypeStore::new();
    // rec t. { next: t } vs { next: { next: ... } } via coinduction.
    let var = store.fresh_var_id();
    let node = store.var_ref(var, 0);
    let body = store.record(vec![FieldShape::new("next", node)]);
    let rec = store.recursive(var, body);
    let mut checker = SubtypeChecker::new(&store);
    assert!(checker.is_subtype_of(rec, rec));
}

#[test]
fn test_class_nominal_and_structural() {
    let mut store = TypeStore::new();
    let animal_instance = store.record(vec![FieldShape::new("name", TypeId::STRING)]);
    let empty = store.record(vec![]);
    let animal = store.class(ClassShape {
        name: "Animal".into(),
        ctor: None,
        instance: animal_instance,
        statics: empty,
        parent: None,
    });
    let dog_instance = store.record(vec![
        FieldShape::new("name", TypeId::STRING),
        FieldShape::new("breed", TypeId::STRING),
    ]);
    let dog = store.class(ClassShape {
        name: "Dog".into(),
        ctor: None,
        instance: dog_instance,
        statics: empty,
        parent: Some(animal),
    });
    let mut checker = SubtypeChecker::new(&store);
    // Nominal: Dog extends Animal.
    assert!(checker.is_subtype_of(dog, animal));
    assert!(!checker.is_subtype_of(animal, dog));
    // Structural: a class fits a record its instance satisfies.
    let named = store.record(vec![FieldShape::new("name", TypeId::STRING)]);
    let mut checker = SubtypeChecker::new(&store);
    assert!(checker.is_subtype_of(dog, named));
}
