use super::*;
use jsty_common::Span;
use jsty_solver::TypeId;

fn binding(name: &str, ty: TypeId) -> Binding {
    Binding::new(name, ty, BindingKind::Let, Span::new(0, 1))
}

#[test]
fn test_declare_and_lookup() {
    let mut env = TypeEnvironment::new();
    env.declare(binding("x", TypeId::NUMBER));
    assert_eq!(env.lookup("x").map(|b| b.ty), Some(TypeId::NUMBER));
    assert!(env.lookup("y").is_none());
}

#[test]
fn test_child_sees_parent() {
    let mut parent = TypeEnvironment::new();
    parent.declare(binding("x", TypeId::NUMBER));
    let child = parent.child();
    assert_eq!(child.lookup("x").map(|b| b.ty), Some(TypeId::NUMBER));
}

#[test]
fn test_child_write_does_not_touch_parent() {
    let mut parent = TypeEnvironment::new();
    parent.declare(binding("x", TypeId::NUMBER));
    let mut child = parent.child();
    assert!(child.assign("x", TypeId::STRING));
    assert_eq!(child.lookup("x").map(|b| b.ty), Some(TypeId::STRING));
    // Copy-on-write: the parent still sees the original type.
    assert_eq!(parent.lookup("x").map(|b| b.ty), Some(TypeId::NUMBER));
}

#[test]
fn test_assign_unknown_name_fails() {
    let mut env = TypeEnvironment::new();
    assert!(!env.assign("missing", TypeId::NUMBER));
}

#[test]
fn test_assign_marks_mutation() {
    let mut env = TypeEnvironment::new();
    env.declare(binding("x", TypeId::NUMBER));
    env.assign("x", TypeId::STRING);
    let b = env.lookup("x").unwrap();
    assert!(b.possibly_mutated);
    assert!(b.definitely_assigned);
}

#[test]
fn test_refine_does_not_mark_mutation() {
    let mut env = TypeEnvironment::new();
    env.declare(binding("x", TypeId::NUMBER));
    env.refine("x", TypeId::STRING);
    assert!(!env.lookup("x").unwrap().possibly_mutated);
}

#[test]
fn test_shadowing() {
    let mut parent = TypeEnvironment::new();
    parent.declare(binding("x", TypeId::NUMBER));
    let mut child = parent.child();
    child.declare(binding("x", TypeId::STRING));
    assert_eq!(child.lookup("x").map(|b| b.ty), Some(TypeId::STRING));
}

#[test]
fn test_visible_names_and_flatten() {
    let mut parent = TypeEnvironment::new();
    parent.declare(binding("a", TypeId::NUMBER));
    let mut child = parent.child();
    child.declare(binding("b", TypeId::STRING));

    let names = child.visible_names();
    assert!(names.contains("a"));
    assert!(names.contains("b"));

    let flat = child.flatten();
    assert_eq!(flat.len(), 2);
    assert_eq!(flat["a"].ty, TypeId::NUMBER);
}

#[test]
fn test_env_equality_is_structural() {
    let mut a = TypeEnvironment::new();
    a.declare(binding("x", TypeId::NUMBER));
    let mut b_parent = TypeEnvironment::new();
    b_parent.declare(binding("x", TypeId::NUMBER));
    let b = b_parent.child();
    // Same visible bindings through different chain shapes.
    assert_eq!(a, b);
}
