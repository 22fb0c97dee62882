//! Flow-sensitive narrowing through the full pipeline: the consequent of
//! a guard sees the refined type, the alternate sees the complement.

use jsty_checker::test_fixtures as fx;
use jsty_checker::analyze;
use jsty_common::Spanned;

/// A parameter of unknown type narrowed by `typeof`.
#[test]
fn test_typeof_narrows_consequent_and_alternate() {
    fx::reset_spans();
    let then_use = fx::ident("v");
    let then_span = then_use.span();
    let else_use = fx::ident("v");
    let else_span = else_use.span();

    let program = fx::program(vec![fx::function_decl(
        "f",
        vec![fx::param("v")],
        vec![fx::if_stmt(
            fx::binary(
                jsty_ast::BinaryOp::StrictEq,
                fx::typeof_of("v"),
                fx::str_lit("number"),
            ),
            vec![fx::expr_stmt(then_use)],
            Some(vec![fx::expr_stmt(else_use)]),
        )],
    )]);
    let analysis = analyze(&program, "");
    assert!(analysis.errors.is_empty(), "errors: {:?}", analysis.errors);
    assert_eq!(analysis.expr_type_at(then_span), Some("number"));
    // An untyped value stays untyped on the false edge.
    assert_eq!(analysis.expr_type_at(else_span), Some("any"));
}

/// `typeof x === "string"` on a union filters the union both ways.
#[test]
fn test_typeof_filters_union() {
    fx::reset_spans();
    let then_use = fx::ident("x");
    let then_span = then_use.span();
    let else_use = fx::ident("x");
    let else_span = else_use.span();

    // let x = cond ? "s" : 1;
    let program = fx::program(vec![
        fx::let_decl(
            "x",
            fx::conditional(fx::bool_lit(true), fx::str_lit("s"), fx::num(1.0)),
        ),
        fx::if_stmt(
            fx::binary(
                jsty_ast::BinaryOp::StrictEq,
                fx::typeof_of("x"),
                fx::str_lit("string"),
            ),
            vec![fx::expr_stmt(then_use)],
            Some(vec![fx::expr_stmt(else_use)]),
        ),
    ]);
    let analysis = analyze(&program, "");
    assert_eq!(analysis.expr_type_at(then_span), Some("\"s\""));
    assert_eq!(analysis.expr_type_at(else_span), Some("1"));
}

/// After `if (x !== null)`, the consequent drops null and the alternate
/// keeps only null.
#[test]
fn test_null_check_narrows() {
    fx::reset_spans();
    let then_use = fx::ident("x");
    let then_span = then_use.span();
    let else_use = fx::ident("x");
    let else_span = else_use.span();

    let program = fx::program(vec![
        fx::let_decl(
            "x",
            fx::conditional(fx::bool_lit(true), fx::str_lit("v"), fx::null()),
        ),
        fx::if_stmt(
            fx::binary(jsty_ast::BinaryOp::StrictNotEq, fx::ident("x"), fx::null()),
            vec![fx::expr_stmt(then_use)],
            Some(vec![fx::expr_stmt(else_use)]),
        ),
    ]);
    let analysis = analyze(&program, "");
    assert_eq!(analysis.expr_type_at(then_span), Some("\"v\""));
    assert_eq!(analysis.expr_type_at(else_span), Some("null"));
}

/// Loose `x != null` removes undefined as well.
#[test]
fn test_loose_null_check_removes_both() {
    fx::reset_spans();
    let then_use = fx::ident("x");
    let then_span = then_use.span();

    let program = fx::program(vec![
        fx::let_decl(
            "x",
            fx::conditional(fx::bool_lit(true), fx::num(1.0), fx::undefined()),
        ),
        fx::if_stmt(
            fx::binary(jsty_ast::BinaryOp::NotEq, fx::ident("x"), fx::null()),
            vec![fx::expr_stmt(then_use)],
            None,
        ),
    ]);
    let analysis = analyze(&program, "");
    assert_eq!(analysis.expr_type_at(then_span), Some("1"));
}

/// Truthiness removes definitely-falsy members on the true edge.
#[test]
fn test_truthiness_narrowing() {
    fx::reset_spans();
    let then_use = fx::ident("x");
    let then_span = then_use.span();

    let program = fx::program(vec![
        fx::let_decl(
            "x",
            fx::conditional(fx::bool_lit(true), fx::str_lit("v"), fx::null()),
        ),
        fx::if_stmt(fx::ident("x"), vec![fx::expr_stmt(then_use)], None),
    ]);
    let analysis = analyze(&program, "");
    assert_eq!(analysis.expr_type_at(then_span), Some("\"v\""));
}

/// Negation flips the narrowing sense.
#[test]
fn test_negated_guard() {
    fx::reset_spans();
    let then_use = fx::ident("x");
    let then_span = then_use.span();

    // if (!(typeof x === "string")) { x } narrows string away.
    let program = fx::program(vec![
        fx::let_decl(
            "x",
            fx::conditional(fx::bool_lit(true), fx::str_lit("s"), fx::num(1.0)),
        ),
        fx::if_stmt(
            fx::unary(
                jsty_ast::UnaryOp::Not,
                fx::binary(
                    jsty_ast::BinaryOp::StrictEq,
                    fx::typeof_of("x"),
                    fx::str_lit("string"),
                ),
            ),
            vec![fx::expr_stmt(then_use)],
            None,
        ),
    ]);
    let analysis = analyze(&program, "");
    assert_eq!(analysis.expr_type_at(then_span), Some("1"));
}

/// Narrowing refines a child environment; the merge block sees the
/// original binding again.
#[test]
fn test_merge_restores_union() {
    fx::reset_spans();
    let after_use = fx::ident("x");
    let after_span = after_use.span();

    let program = fx::program(vec![
        fx::let_decl(
            "x",
            fx::conditional(fx::bool_lit(true), fx::str_lit("s"), fx::num(1.0)),
        ),
        fx::if_stmt(
            fx::binary(
                jsty_ast::BinaryOp::StrictEq,
                fx::typeof_of("x"),
                fx::str_lit("string"),
            ),
            vec![fx::expr_stmt(fx::num(0.0))],
            None,
        ),
        fx::expr_stmt(after_use),
    ]);
    let analysis = analyze(&program, "");
    let after = analysis.expr_type_at(after_span).unwrap();
    assert!(
        after.contains("\"s\"") && after.contains('1'),
        "merge joins both narrow states back: {after}"
    );
}
