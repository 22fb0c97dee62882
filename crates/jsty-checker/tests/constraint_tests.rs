//! The constraint path end to end: generation (C6) into biunification
//! (C7), plus scheme subsumption on top of the solver.

use jsty_checker::test_fixtures as fx;
use jsty_checker::generate;
use jsty_solver::{TypeErrorKind, TypeId, TypeScheme, TypeStore, biunify};

fn arrow(params: Vec<jsty_ast::Param>, body: jsty_ast::Expr) -> jsty_ast::Expr {
    let body_span = fx::sp(1);
    let span = fx::sp(8);
    jsty_ast::Expr::Arrow {
        function: Box::new(jsty_ast::Function {
            name: None,
            params,
            body: jsty_ast::FunctionBody::Expr {
                expr: Box::new(body),
                span: body_span,
            },
            is_async: false,
            is_generator: false,
            is_arrow: true,
            span,
        }),
        span,
    }
}

#[test]
fn test_well_typed_program_solves() {
    fx::reset_spans();
    // let inc = (x) => x + 1; inc(41);
    let body = vec![
        fx::let_decl(
            "inc",
            arrow(
                vec![fx::param("x")],
                fx::binary(jsty_ast::BinaryOp::Add, fx::ident("x"), fx::num(1.0)),
            ),
        ),
        fx::expr_stmt(fx::call(fx::ident("inc"), vec![fx::num(41.0)])),
    ];
    let mut store = TypeStore::new();
    let generated = generate(&mut store, &body);
    assert!(biunify(&mut store, generated.constraints.as_slice()).is_ok());
}

#[test]
fn test_ill_typed_call_reports_span() {
    fx::reset_spans();
    // let f = (x) => x * 2; f is then flowed into a number position with
    // a string argument.
    let f = arrow(
        vec![fx::param("x")],
        fx::binary(jsty_ast::BinaryOp::Mul, fx::ident("x"), fx::num(2.0)),
    );
    let call = fx::call(fx::ident("f"), vec![fx::str_lit("oops")]);
    let body = vec![fx::let_decl("f", f), fx::expr_stmt(call)];

    let mut store = TypeStore::new();
    let generated = generate(&mut store, &body);
    let errors = biunify(&mut store, generated.constraints.as_slice()).unwrap_err();
    assert!(!errors.is_empty());
    for error in &errors {
        assert!(!error.span.is_dummy(), "solver errors carry locations");
    }
}

#[test]
fn test_error_taxonomy_from_constraints() {
    fx::reset_spans();
    // Missing property: ({ a: 1 }).b
    let body = vec![fx::expr_stmt(fx::member(
        fx::object(vec![("a", fx::num(1.0))]),
        "b",
    ))];
    let mut store = TypeStore::new();
    let generated = generate(&mut store, &body);
    let errors = biunify(&mut store, generated.constraints.as_slice()).unwrap_err();
    assert_eq!(errors[0].kind, TypeErrorKind::MissingProperty);
}

#[test]
fn test_scheme_subsumption_uses_solver() {
    let mut store = TypeStore::new();
    // ∀a. (x: a) => a subsumes (x: 1) => number? Instantiation flows the
    // literal through, so yes.
    let a = store.fresh_var(None, 1);
    let poly_body = store.function(
        vec![jsty_solver::intern::ParamShape::new("x", a)],
        a,
    );
    let poly = TypeScheme::generalize(&store, poly_body, 0);

    let one = store.literal_number(1.0);
    let target = store.function(
        vec![jsty_solver::intern::ParamShape::new("x", one)],
        TypeId::NUMBER,
    );
    let mono = TypeScheme::mono(target);
    assert!(poly.subsumes(&mut store, &mono));
    assert!(!mono.subsumes(&mut store, &poly) || poly.vars.is_empty());
}

#[test]
fn test_generated_bindings_by_name() {
    fx::reset_spans();
    let body = vec![
        fx::let_decl("x", fx::num(1.0)),
        fx::let_decl("y", fx::str_lit("s")),
    ];
    let mut store = TypeStore::new();
    let generated = generate(&mut store, &body);
    assert!(generated.bindings.contains_key("x"));
    assert!(generated.bindings.contains_key("y"));
}
