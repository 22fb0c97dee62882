//! End-to-end inference scenarios, driven through the public `analyze`
//! surface with programmatically built ASTs.

use jsty_checker::test_fixtures as fx;
use jsty_checker::{AnnotationKind, analyze};
use jsty_common::DiagnosticKind;

#[test]
fn test_literal_locals() {
    // const x = 42; const s = "hi"; const b = true;
    fx::reset_spans();
    let program = fx::program(vec![
        fx::const_decl("x", fx::num(42.0)),
        fx::const_decl("s", fx::str_lit("hi")),
        fx::const_decl("b", fx::bool_lit(true)),
    ]);
    let analysis = analyze(&program, "");

    assert!(analysis.errors.is_empty(), "errors: {:?}", analysis.errors);
    assert_eq!(analysis.annotation_for("x").unwrap().type_string, "42");
    assert_eq!(analysis.annotation_for("s").unwrap().type_string, "\"hi\"");
    assert_eq!(analysis.annotation_for("b").unwrap().type_string, "true");
    for name in ["x", "s", "b"] {
        assert_eq!(
            analysis.annotation_for(name).unwrap().kind,
            AnnotationKind::Const
        );
    }
}

#[test]
fn test_loop_widening() {
    // let n = 0; for (let i = 0; i < 10; i++) { n = n + 1; }
    fx::reset_spans();
    let program = fx::program(vec![
        fx::let_decl("n", fx::num(0.0)),
        fx::for_stmt(
            fx::let_decl("i", fx::num(0.0)),
            fx::binary(jsty_ast::BinaryOp::Lt, fx::ident("i"), fx::num(10.0)),
            jsty_ast::Expr::Update {
                op: jsty_ast::UpdateOp::Inc,
                argument: Box::new(fx::ident("i")),
                prefix: false,
                span: fx::sp(3),
            },
            vec![fx::expr_stmt(fx::assign_ident(
                "n",
                fx::binary(jsty_ast::BinaryOp::Add, fx::ident("n"), fx::num(1.0)),
            ))],
        ),
    ]);
    let analysis = analyze(&program, "");

    assert!(analysis.errors.is_empty(), "errors: {:?}", analysis.errors);
    assert_eq!(analysis.annotation_for("n").unwrap().type_string, "number");
    assert_eq!(analysis.annotation_for("i").unwrap().type_string, "number");
}

#[test]
fn test_conditional_narrowing() {
    // function f(v) { if (typeof v === "string") return v.length; return 0; }
    fx::reset_spans();
    let v_use = fx::ident("v");
    let v_use_span = jsty_common::Spanned::span(&v_use);
    let program = fx::program(vec![fx::function_decl(
        "f",
        vec![fx::param("v")],
        vec![
            fx::if_stmt(
                fx::binary(
                    jsty_ast::BinaryOp::StrictEq,
                    fx::typeof_of("v"),
                    fx::str_lit("string"),
                ),
                vec![fx::return_stmt(Some(fx::member(v_use, "length")))],
                None,
            ),
            fx::return_stmt(Some(fx::num(0.0))),
        ],
    )]);
    let analysis = analyze(&program, "");

    assert!(analysis.errors.is_empty(), "errors: {:?}", analysis.errors);
    assert_eq!(
        analysis.annotation_for("f").unwrap().type_string,
        "(v: any) => number"
    );
    // Inside the then-branch, v is string.
    assert_eq!(analysis.expr_type_at(v_use_span), Some("string"));
}

#[test]
fn test_const_reassignment() {
    // const x = 1; x = 2;
    fx::reset_spans();
    let program = fx::program(vec![
        fx::const_decl("x", fx::num(1.0)),
        fx::expr_stmt(fx::assign_ident("x", fx::num(2.0))),
    ]);
    let analysis = analyze(&program, "");

    assert_eq!(analysis.annotation_for("x").unwrap().type_string, "1");
    assert_eq!(analysis.errors.len(), 1);
    assert_eq!(analysis.errors[0].kind, DiagnosticKind::ConstAssignment);
}

#[test]
fn test_class_with_constructor_assigned_fields() {
    // class C { constructor(n) { this.n = n; } greet() { return "hi " + this.n; } }
    fx::reset_spans();
    let greet_body = vec![fx::return_stmt(Some(fx::binary(
        jsty_ast::BinaryOp::Add,
        fx::str_lit("hi "),
        fx::member(
            jsty_ast::Expr::This { span: fx::sp(4) },
            "n",
        ),
    )))];
    let program = fx::program(vec![fx::class_decl(
        "C",
        vec![
            fx::constructor(
                vec![fx::param("n")],
                vec![fx::expr_stmt(fx::assign_this_member("n", fx::ident("n")))],
            ),
            fx::method("greet", vec![], greet_body),
        ],
    )]);
    let analysis = analyze(&program, "");

    assert!(analysis.errors.is_empty(), "errors: {:?}", analysis.errors);
    let class_anno = analysis.annotation_for("C").unwrap();
    assert_eq!(class_anno.kind, AnnotationKind::Class);
    assert_eq!(class_anno.type_string, "C");

    // The instance record contains n; greet returns string.
    let n_anno = analysis
        .annotations
        .iter()
        .find(|a| a.name.as_deref() == Some("n") && a.kind == AnnotationKind::Property)
        .expect("constructor-assigned field annotated");
    assert_eq!(n_anno.node_type, "PropertyDefinition");
}

#[test]
fn test_class_accessors_declare_fields() {
    // class Box {
    //   constructor(v) { this._v = v; }
    //   get value() { return this._v; }
    //   set limit(v) { this._v = v; }
    // }
    // const b = new Box(1); b.value; b.limit;
    fx::reset_spans();
    let program = fx::program(vec![
        fx::class_decl(
            "Box",
            vec![
                fx::constructor(
                    vec![fx::param("v")],
                    vec![fx::expr_stmt(fx::assign_this_member("_v", fx::ident("v")))],
                ),
                fx::getter(
                    "value",
                    vec![fx::return_stmt(Some(fx::member(
                        jsty_ast::Expr::This { span: fx::sp(4) },
                        "_v",
                    )))],
                ),
                fx::setter(
                    "limit",
                    "v",
                    vec![fx::expr_stmt(fx::assign_this_member("_v", fx::ident("v")))],
                ),
            ],
        ),
        fx::const_decl("b", fx::new_expr(fx::ident("Box"), vec![fx::num(1.0)])),
        fx::expr_stmt(fx::member(fx::ident("b"), "value")),
        fx::expr_stmt(fx::member(fx::ident("b"), "limit")),
    ]);
    let analysis = analyze(&program, "");

    // Both accessor-backed fields are on the instance: reading them must
    // not diagnose missing-property.
    assert!(analysis.errors.is_empty(), "errors: {:?}", analysis.errors);

    // `b` renders the instance record: the getter-only field is readonly,
    // the setter-only field is a plain writable field.
    let b_anno = analysis.annotation_for("b").unwrap();
    assert!(
        b_anno.type_string.contains("readonly value"),
        "getter without setter is readonly: {}",
        b_anno.type_string
    );
    assert!(
        b_anno.type_string.contains("limit"),
        "setter-only field exists: {}",
        b_anno.type_string
    );
    assert!(
        !b_anno.type_string.contains("readonly limit"),
        "setter-backed field stays writable: {}",
        b_anno.type_string
    );
}

#[test]
fn test_union_join_on_records() {
    // const o = Math.random() < 0.5 ? { a: 1, b: 2 } : { a: 3, c: 4 };
    // o.b; o.c;
    fx::reset_spans();
    let test = fx::binary(
        jsty_ast::BinaryOp::Lt,
        fx::call(fx::member(fx::ident("Math"), "random"), vec![]),
        fx::num(0.5),
    );
    let program = fx::program(vec![
        fx::const_decl(
            "o",
            fx::conditional(
                test,
                fx::object(vec![("a", fx::num(1.0)), ("b", fx::num(2.0))]),
                fx::object(vec![("a", fx::num(3.0)), ("c", fx::num(4.0))]),
            ),
        ),
        fx::expr_stmt(fx::member(fx::ident("o"), "b")),
        fx::expr_stmt(fx::member(fx::ident("o"), "c")),
    ]);
    let analysis = analyze(&program, "");

    // Domain intersection keeps only `a`.
    let o_anno = analysis.annotation_for("o").unwrap();
    assert!(
        o_anno.type_string.contains("a:"),
        "o keeps field a: {}",
        o_anno.type_string
    );
    assert!(
        !o_anno.type_string.contains("b:") && !o_anno.type_string.contains("c:"),
        "b and c are dropped by the join: {}",
        o_anno.type_string
    );

    // Accessing the dropped fields diagnoses missing-property.
    let missing: Vec<_> = analysis
        .errors
        .iter()
        .filter(|e| e.kind == DiagnosticKind::MissingProperty)
        .collect();
    assert_eq!(missing.len(), 2, "errors: {:?}", analysis.errors);
}

#[test]
fn test_undefined_variable_is_any_plus_diagnostic() {
    fx::reset_spans();
    let program = fx::program(vec![fx::const_decl("x", fx::ident("missing"))]);
    let analysis = analyze(&program, "");
    assert_eq!(analysis.errors.len(), 1);
    assert_eq!(analysis.errors[0].kind, DiagnosticKind::UndefinedVariable);
    assert_eq!(analysis.annotation_for("x").unwrap().type_string, "any");
}

#[test]
fn test_logical_and_nullish_rules() {
    // const a = s || n;  const b = maybe ?? fallback;
    fx::reset_spans();
    let program = fx::program(vec![
        fx::const_decl("s", fx::str_lit("x")),
        fx::const_decl("n", fx::num(1.0)),
        fx::const_decl(
            "a",
            fx::logical(jsty_ast::LogicalOp::Or, fx::ident("s"), fx::ident("n")),
        ),
        // maybe: string | null
        fx::const_decl(
            "m",
            fx::conditional(fx::bool_lit(true), fx::str_lit("v"), fx::null()),
        ),
        fx::const_decl(
            "b",
            fx::logical(jsty_ast::LogicalOp::Nullish, fx::ident("m"), fx::num(0.0)),
        ),
    ]);
    let analysis = analyze(&program, "");
    assert!(analysis.errors.is_empty(), "errors: {:?}", analysis.errors);

    let a = analysis.annotation_for("a").unwrap();
    assert!(
        a.type_string.contains('|'),
        "|| joins both operands: {}",
        a.type_string
    );
    let b = analysis.annotation_for("b").unwrap();
    assert!(
        !b.type_string.contains("null"),
        "?? strips null from the left side: {}",
        b.type_string
    );
}

#[test]
fn test_call_rules() {
    fx::reset_spans();
    // function g(a) { return a; } g(1, 2, 3); g();
    let program = fx::program(vec![
        fx::function_decl(
            "g",
            vec![fx::param("a")],
            vec![fx::return_stmt(Some(fx::ident("a")))],
        ),
        fx::expr_stmt(fx::call(
            fx::ident("g"),
            vec![fx::num(1.0), fx::num(2.0), fx::num(3.0)],
        )),
        fx::expr_stmt(fx::call(fx::ident("g"), vec![])),
    ]);
    let analysis = analyze(&program, "");
    let arity: Vec<_> = analysis
        .errors
        .iter()
        .filter(|e| e.kind == DiagnosticKind::ArgumentCount)
        .collect();
    assert_eq!(arity.len(), 2, "errors: {:?}", analysis.errors);
}

#[test]
fn test_not_callable() {
    fx::reset_spans();
    let program = fx::program(vec![
        fx::const_decl("x", fx::num(1.0)),
        fx::expr_stmt(fx::call(fx::ident("x"), vec![])),
    ]);
    let analysis = analyze(&program, "");
    assert!(
        analysis
            .errors
            .iter()
            .any(|e| e.kind == DiagnosticKind::NotCallable)
    );
}

#[test]
fn test_new_on_class_yields_instance() {
    fx::reset_spans();
    // const d = new Date(); const t = d.getTime();
    let program = fx::program(vec![
        fx::const_decl("d", fx::new_expr(fx::ident("Date"), vec![])),
        fx::const_decl(
            "t",
            fx::call(fx::member(fx::ident("d"), "getTime"), vec![]),
        ),
    ]);
    let analysis = analyze(&program, "");
    assert!(analysis.errors.is_empty(), "errors: {:?}", analysis.errors);
    assert_eq!(analysis.annotation_for("t").unwrap().type_string, "number");
}

#[test]
fn test_unreachable_code_diagnostic() {
    fx::reset_spans();
    let program = fx::program(vec![fx::function_decl(
        "f",
        vec![],
        vec![
            fx::return_stmt(Some(fx::num(1.0))),
            fx::expr_stmt(fx::num(2.0)),
        ],
    )]);
    let analysis = analyze(&program, "");
    assert!(
        analysis
            .errors
            .iter()
            .any(|e| e.kind == DiagnosticKind::UnreachableCode),
        "errors: {:?}",
        analysis.errors
    );
}

#[test]
fn test_await_unwraps_promise() {
    fx::reset_spans();
    // async function f() { return 1; } has type () => Promise<1>.
    let program = fx::program(vec![Stmt::Function {
        function: Box::new(jsty_ast::Function {
            name: Some("f".into()),
            params: vec![],
            body: jsty_ast::FunctionBody::Block {
                body: vec![fx::return_stmt(Some(fx::num(1.0)))],
                span: fx::sp(2),
            },
            is_async: true,
            is_generator: false,
            is_arrow: false,
            span: fx::sp(10),
        }),
        span: fx::sp(10),
    }]);
    let analysis = analyze(&program, "");
    assert!(analysis.errors.is_empty());
    let f = analysis.annotation_for("f").unwrap();
    assert!(
        f.type_string.contains("Promise<"),
        "async wraps the return: {}",
        f.type_string
    );
}

use jsty_ast::Stmt;
