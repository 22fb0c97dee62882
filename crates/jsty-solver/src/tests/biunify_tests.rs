use super::*;
use crate::constraint::Constraint;
use crate::intern::{FieldShape, ParamShape, TypeData, TypeStore};
use crate::subtype::SubtypeChecker;
use jsty_common::Span;

fn c(sub: TypeId, sup: TypeId) -> Constraint {
    Constraint::new(sub, sup, Span::new(0, 1))
}

#[test]
fn test_empty_constraint_set() {
    let mut store = TypeStore::new();
    let subst = biunify(&mut store, &[]).expect("empty set solves");
    assert!(subst.pos.is_empty());
    assert!(subst.neg.is_empty());
}

#[test]
fn test_literal_below_base_ok() {
    let mut store = TypeStore::new();
    let lit = store.literal_number(42.0);
    assert!(biunify(&mut store, &[c(lit, TypeId::NUMBER)]).is_ok());
}

#[test]
fn test_base_below_literal_errors() {
    let mut store = TypeStore::new();
    let lit = store.literal_number(42.0);
    let errors = biunify(&mut store, &[c(TypeId::NUMBER, lit)]).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind, TypeErrorKind::IncompatibleTypes);
}

#[test]
fn test_mismatched_heads_error() {
    let mut store = TypeStore::new();
    let errors = biunify(&mut store, &[c(TypeId::STRING, TypeId::NUMBER)]).unwrap_err();
    assert_eq!(errors[0].kind, TypeErrorKind::IncompatibleTypes);
}

#[test]
fn test_var_lower_bound_enters_pos() {
    // num ≤ α composes [α ⊔ num / α⁺].
    let mut store = TypeStore::new();
    let alpha = store.fresh_var(Some("a"), 0);
    let TypeData::Var { id, .. } = *store.data(alpha) else {
        panic!()
    };
    let subst = biunify(&mut store, &[c(TypeId::NUMBER, alpha)]).expect("solves");
    let entry = subst.pos[&id];
    let expected = store.union(vec![alpha, TypeId::NUMBER]);
    assert_eq!(entry, expected);
}

#[test]
fn test_var_upper_bound_enters_neg() {
    // α ≤ num composes [α ⊓ num / α⁻].
    let mut store = TypeStore::new();
    let alpha = store.fresh_var(Some("a"), 0);
    let TypeData::Var { id, .. } = *store.data(alpha) else {
        panic!()
    };
    let subst = biunify(&mut store, &[c(alpha, TypeId::NUMBER)]).expect("solves");
    let entry = subst.neg[&id];
    let expected = store.intersection(vec![alpha, TypeId::NUMBER]);
    assert_eq!(entry, expected);
}

#[test]
fn test_transitive_flow_through_var() {
    // num ≤ α and α ≤ string must fail: the bounds meet.
    let mut store = TypeStore::new();
    let alpha = store.fresh_var(None, 0);
    let errors =
        biunify(&mut store, &[c(TypeId::NUMBER, alpha), c(alpha, TypeId::STRING)]).unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| e.kind == TypeErrorKind::IncompatibleTypes)
    );
}

#[test]
fn test_function_contravariance() {
    let mut store = TypeStore::new();
    let lit = store.literal_number(1.0);
    // (x: number) => 1 ≤ (x: 1) => number decomposes to 1 ≤ number twice.
    let sub = store.function(vec![ParamShape::new("x", TypeId::NUMBER)], lit);
    let sup = store.function(vec![ParamShape::new("x", lit)], TypeId::NUMBER);
    assert!(biunify(&mut store, &[c(sub, sup)]).is_ok());
    // The reverse direction fails in the parameter.
    assert!(biunify(&mut store, &[c(sup, sub)]).is_err());
}

#[test]
fn test_function_arity_error() {
    let mut store = TypeStore::new();
    let binary = store.function(
        vec![
            ParamShape::new("a", TypeId::NUMBER),
            ParamShape::new("b", TypeId::NUMBER),
        ],
        TypeId::NUMBER,
    );
    let thunk_consumer = store.function(vec![], TypeId::NUMBER);
    let errors = biunify(&mut store, &[c(binary, thunk_consumer)]).unwrap_err();
    assert_eq!(errors[0].kind, TypeErrorKind::ArgumentCount);
}

#[test]
fn test_record_width_ok_missing_field_errors() {
    let mut store = TypeStore::new();
    let wide = store.record(vec![
        FieldShape::new("a", TypeId::NUMBER),
        FieldShape::new("b", TypeId::STRING),
    ]);
    let narrow = store.record(vec![FieldShape::new("a", TypeId::NUMBER)]);
    // Extra fields on the positive side are discarded (width).
    assert!(biunify(&mut store, &[c(wide, narrow)]).is_ok());
    // A missing required field is an error.
    let errors = biunify(&mut store, &[c(narrow, wide)]).unwrap_err();
    assert_eq!(errors[0].kind, TypeErrorKind::MissingProperty);
    assert!(errors[0].message.contains("'b'"));
}

#[test]
fn test_union_left_splits() {
    let mut store = TypeStore::new();
    let u = store.union(vec![TypeId::STRING, TypeId::NUMBER]);
    // string | number ≤ number fails on the string member only.
    let errors = biunify(&mut store, &[c(u, TypeId::NUMBER)]).unwrap_err();
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_union_right_disjunction() {
    let mut store = TypeStore::new();
    let u = store.union(vec![TypeId::STRING, TypeId::NUMBER]);
    assert!(biunify(&mut store, &[c(TypeId::NUMBER, u)]).is_ok());
    assert!(biunify(&mut store, &[c(TypeId::BOOLEAN, u)]).is_err());
}

#[test]
fn test_occurs_check_infinite_type() {
    let mut store = TypeStore::new();
    let alpha = store.fresh_var(None, 0);
    let arr = store.array(alpha);
    // α ≤ α[] has no finite solution.
    let errors = biunify(&mut store, &[c(alpha, arr)]).unwrap_err();
    assert_eq!(errors[0].kind, TypeErrorKind::InfiniteType);
}

#[test]
fn test_promise_covariance() {
    let mut store = TypeStore::new();
    let lit = store.literal_number(1.0);
    let p_lit = store.promise(lit);
    let p_num = store.promise(TypeId::NUMBER);
    assert!(biunify(&mut store, &[c(p_lit, p_num)]).is_ok());
    assert!(biunify(&mut store, &[c(p_num, p_lit)]).is_err());
}

#[test]
fn test_soundness_apply_subst_yields_subtype() {
    // For every solved constraint τ⁺ ≤ τ⁻, applying the substitution
    // yields a provable subtype relation.
    let mut store = TypeStore::new();
    let alpha = store.fresh_var(None, 0);
    let lit = store.literal_number(7.0);
    let constraints = [c(lit, alpha), c(alpha, TypeId::NUMBER)];
    let subst = biunify(&mut store, &constraints).expect("solvable");
    for constraint in &constraints {
        let sub = subst.apply_pos(&mut store, constraint.sub);
        let sup = subst.apply_neg(&mut store, constraint.sup);
        let mut checker = SubtypeChecker::new(&store);
        assert!(
            checker.is_subtype_of(sub, sup),
            "substituted constraint must hold"
        );
    }
}

#[test]
fn test_subst_is_idempotent() {
    let mut store = TypeStore::new();
    let alpha = store.fresh_var(None, 0);
    let beta = store.fresh_var(None, 0);
    let constraints = [c(TypeId::NUMBER, alpha), c(alpha, beta)];
    let subst = biunify(&mut store, &constraints).expect("solvable");
    for &entry in subst.pos.values() {
        let once = subst.apply_pos(&mut store, entry);
        assert_eq!(once, entry, "pos entries are fully resolved");
    }
    for &entry in subst.neg.values() {
        let once = subst.apply_neg(&mut store, entry);
        assert_eq!(once, entry, "neg entries are fully resolved");
    }
}

#[test]
fn test_any_relates_to_everything() {
    let mut store = TypeStore::new();
    let record = store.record(vec![FieldShape::new("a", TypeId::NUMBER)]);
    assert!(biunify(&mut store, &[c(TypeId::ANY, record)]).is_ok());
    assert!(biunify(&mut store, &[c(record, TypeId::ANY)]).is_ok());
}

#[test]
fn test_overlapping_disjunction_is_ambiguous() {
    let mut store = TypeStore::new();
    let to_num = store.function(vec![], TypeId::NUMBER);
    let to_str = store.function(vec![], TypeId::STRING);
    let to_bool = store.function(vec![], TypeId::BOOLEAN);
    let u = store.union(vec![to_num, to_str]);
    // `() => boolean` satisfies neither branch, and both arrow heads
    // could absorb the flow: no unique solution.
    let errors = biunify(&mut store, &[c(to_bool, u)]).unwrap_err();
    assert_eq!(errors[0].kind, TypeErrorKind::Ambiguous);
}

#[test]
fn test_error_kinds_map_to_diagnostics() {
    use jsty_common::DiagnosticKind;
    assert_eq!(
        TypeErrorKind::MissingProperty.diagnostic_kind(),
        DiagnosticKind::MissingProperty
    );
    assert_eq!(
        TypeErrorKind::Ambiguous.diagnostic_kind(),
        DiagnosticKind::Ambiguous
    );
    assert_eq!(
        TypeErrorKind::InfiniteType.diagnostic_kind(),
        DiagnosticKind::InfiniteType
    );
}

#[test]
fn test_errors_carry_spans() {
    let mut store = TypeStore::new();
    let constraint = Constraint::new(TypeId::STRING, TypeId::NUMBER, Span::new(10, 20));
    let errors = biunify(&mut store, &[constraint]).unwrap_err();
    assert_eq!(errors[0].span, Span::new(10, 20));
}
