use super::*;
use crate::intern::{FieldShape, ParamShape, TypeId, TypeStore};

#[test]
fn test_literal_rendering() {
    let mut store = TypeStore::new();
    let n = store.literal_number(42.0);
    let s = store.literal_string("hi");
    let b = store.literal_bool(true);
    let big = store.literal_bigint("10");
    assert_eq!(type_string(&store, n), "42");
    assert_eq!(type_string(&store, s), "\"hi\"");
    assert_eq!(type_string(&store, b), "true");
    assert_eq!(type_string(&store, big), "10n");
}

#[test]
fn test_base_rendering() {
    let store = TypeStore::new();
    assert_eq!(type_string(&store, TypeId::NUMBER), "number");
    assert_eq!(type_string(&store, TypeId::STRING), "string");
    assert_eq!(type_string(&store, TypeId::NULL), "null");
    assert_eq!(type_string(&store, TypeId::UNDEFINED), "undefined");
    assert_eq!(type_string(&store, TypeId::ANY), "any");
    assert_eq!(type_string(&store, TypeId::NEVER), "never");
}

#[test]
fn test_function_rendering() {
    let mut store = TypeStore::new();
    let f = store.function(vec![ParamShape::new("v", TypeId::ANY)], TypeId::NUMBER);
    assert_eq!(type_string(&store, f), "(v: any) => number");
}

#[test]
fn test_rest_and_optional_params() {
    let mut store = TypeStore::new();
    let arr = store.array(TypeId::ANY);
    let f = store.function(
        vec![
            ParamShape::new("a", TypeId::NUMBER).optional(),
            ParamShape::new("rest", arr).rest(),
        ],
        TypeId::UNDEFINED,
    );
    assert_eq!(
        type_string(&store, f),
        "(a?: number, ...rest: any[]) => undefined"
    );
}

#[test]
fn test_record_rendering() {
    let mut store = TypeStore::new();
    let r = store.record(vec![
        FieldShape::new("b", TypeId::STRING),
        FieldShape::new("a", TypeId::NUMBER),
    ]);
    assert_eq!(type_string(&store, r), "{ a: number; b: string }");
    let empty = store.record(vec![]);
    assert_eq!(type_string(&store, empty), "{}");
}

#[test]
fn test_readonly_field_rendering() {
    let mut store = TypeStore::new();
    let r = store.record(vec![
        FieldShape::new("id", TypeId::NUMBER).readonly(),
        FieldShape::new("name", TypeId::STRING),
    ]);
    assert_eq!(
        type_string(&store, r),
        "{ readonly id: number; name: string }"
    );
}

#[test]
fn test_union_rendering() {
    let mut store = TypeStore::new();
    let u = store.union(vec![TypeId::NUMBER, TypeId::STRING]);
    assert_eq!(type_string(&store, u), "number | string");
}

#[test]
fn test_array_and_tuple_rendering() {
    let mut store = TypeStore::new();
    let arr = store.array(TypeId::NUMBER);
    assert_eq!(type_string(&store, arr), "number[]");

    let u = store.union(vec![TypeId::NUMBER, TypeId::STRING]);
    let union_arr = store.array(u);
    assert_eq!(type_string(&store, union_arr), "(number | string)[]");

    let t = store.tuple(vec![TypeId::STRING, TypeId::NUMBER]);
    assert_eq!(type_string(&store, t), "[string, number]");
}

#[test]
fn test_promise_rendering() {
    let mut store = TypeStore::new();
    let p = store.promise(TypeId::NUMBER);
    assert_eq!(type_string(&store, p), "Promise<number>");
}

#[test]
fn test_recursive_rendering_terminates() {
    let mut store = TypeStore::new();
    let var = store.fresh_var_id();
    let node = store.var_ref(var, 0);
    let arr = store.array(node);
    let rec = store.recursive(var, arr);
    assert_eq!(type_string(&store, rec), "rec t0. t0[]");
}

#[test]
fn test_diagnostic_elision() {
    let mut store = TypeStore::new();
    let members: Vec<TypeId> = (0..6).map(|i| store.literal_number(f64::from(i))).collect();
    let u = store.union(members);
    let rendered = diagnostic_type_string(&store, u);
    assert!(rendered.ends_with("| ..."), "got {rendered}");
}
