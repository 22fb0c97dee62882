use super::*;
use crate::test_fixtures as fx;
use jsty_solver::{TypeStore, biunify};

#[test]
fn test_let_generates_flow_into_fresh_var() {
    fx::reset_spans();
    let body = vec![fx::let_decl("x", fx::num(42.0))];
    let mut store = TypeStore::new();
    let generated = generate(&mut store, &body);
    assert_eq!(generated.constraints.len(), 1);
    assert!(generated.bindings.contains_key("x"));
    assert!(biunify(&mut store, generated.constraints.as_slice()).is_ok());
}

#[test]
fn test_call_emits_arrow_constraint() {
    fx::reset_spans();
    // let f = (x) => x; f(1);
    let arrow = jsty_ast::Expr::Arrow {
        function: Box::new(jsty_ast::Function {
            name: None,
            params: vec![fx::param("x")],
            body: jsty_ast::FunctionBody::Expr {
                expr: Box::new(fx::ident("x")),
                span: fx::sp(1),
            },
            is_async: false,
            is_generator: false,
            is_arrow: true,
            span: fx::sp(8),
        }),
        span: fx::sp(8),
    };
    let body = vec![
        fx::let_decl("f", arrow),
        fx::expr_stmt(fx::call(fx::ident("f"), vec![fx::num(1.0)])),
    ];
    let mut store = TypeStore::new();
    let generated = generate(&mut store, &body);
    // One constraint binds f, one flows the identity into the call shape,
    // one flows the parameter through the body.
    assert!(generated.constraints.len() >= 2);
    assert!(
        biunify(&mut store, generated.constraints.as_slice()).is_ok(),
        "identity application solves"
    );
}

#[test]
fn test_let_polymorphism_generalizes() {
    fx::reset_spans();
    // let id = (x) => x; the scheme quantifies the parameter variable.
    let arrow = jsty_ast::Expr::Arrow {
        function: Box::new(jsty_ast::Function {
            name: None,
            params: vec![fx::param("x")],
            body: jsty_ast::FunctionBody::Expr {
                expr: Box::new(fx::ident("x")),
                span: fx::sp(1),
            },
            is_async: false,
            is_generator: false,
            is_arrow: true,
            span: fx::sp(8),
        }),
        span: fx::sp(8),
    };
    let body = vec![fx::let_decl("id", arrow)];
    let mut store = TypeStore::new();
    let generated = generate(&mut store, &body);
    let scheme = &generated.bindings["id"];
    assert!(
        !scheme.vars.is_empty(),
        "let-bound lambda generalizes its variables"
    );

    // Two instantiations are independent.
    let a = scheme.instantiate(&mut store, 0);
    let b = scheme.instantiate(&mut store, 0);
    assert_ne!(a, b);
}

#[test]
fn test_member_access_emits_record_constraint() {
    fx::reset_spans();
    // let o = { a: 1 }; o.a;
    let body = vec![
        fx::let_decl("o", fx::object(vec![("a", fx::num(1.0))])),
        fx::expr_stmt(fx::member(fx::ident("o"), "a")),
    ];
    let mut store = TypeStore::new();
    let generated = generate(&mut store, &body);
    assert!(biunify(&mut store, generated.constraints.as_slice()).is_ok());
}

#[test]
fn test_missing_member_fails_to_solve() {
    fx::reset_spans();
    let body = vec![
        fx::let_decl("o", fx::object(vec![("a", fx::num(1.0))])),
        fx::expr_stmt(fx::member(fx::ident("o"), "b")),
    ];
    let mut store = TypeStore::new();
    let generated = generate(&mut store, &body);
    let errors = biunify(&mut store, generated.constraints.as_slice()).unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| e.kind == jsty_solver::TypeErrorKind::MissingProperty)
    );
}

#[test]
fn test_numeric_operator_constrains_operands() {
    fx::reset_spans();
    // "hi" * 2 cannot solve.
    let body = vec![fx::expr_stmt(fx::binary(
        jsty_ast::BinaryOp::Mul,
        fx::str_lit("hi"),
        fx::num(2.0),
    ))];
    let mut store = TypeStore::new();
    let generated = generate(&mut store, &body);
    assert!(biunify(&mut store, generated.constraints.as_slice()).is_err());
}
