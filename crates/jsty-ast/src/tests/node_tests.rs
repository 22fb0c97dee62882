use super::*;

fn span(start: u32, end: u32) -> Span {
    Span::new(start, end)
}

#[test]
fn test_stmt_spans() {
    let stmt = Stmt::Return {
        argument: None,
        span: span(4, 11),
    };
    assert_eq!(stmt.span(), span(4, 11));
    assert_eq!(stmt.node_type(), "ReturnStatement");
}

#[test]
fn test_expr_node_types() {
    let num = Expr::Number {
        value: 42.0,
        span: span(0, 2),
    };
    assert_eq!(num.node_type(), "NumericLiteral");
    assert_eq!(num.span(), span(0, 2));

    let ident = Expr::Ident {
        name: "x".into(),
        span: span(0, 1),
    };
    assert_eq!(ident.ident_name(), Some("x"));
    assert_eq!(num.ident_name(), None);
}

#[test]
fn test_format_number_integral() {
    assert_eq!(format_number(42.0), "42");
    assert_eq!(format_number(-3.0), "-3");
    assert_eq!(format_number(1.5), "1.5");
}

#[test]
fn test_serde_round_trip() {
    let program = Program {
        body: vec![Stmt::VarDecl(VarDecl {
            kind: VarKind::Const,
            declarators: vec![Declarator {
                pattern: Pattern::Ident {
                    name: "x".into(),
                    span: span(6, 7),
                },
                init: Some(Expr::Number {
                    value: 42.0,
                    span: span(10, 12),
                }),
                span: span(6, 12),
            }],
            span: span(0, 13),
        })],
        span: span(0, 13),
    };

    let json = serde_json::to_string(&program).unwrap();
    let back: Program = serde_json::from_str(&json).unwrap();
    assert_eq!(back, program);
}

#[test]
fn test_serde_tagged_variants() {
    let expr = Expr::Binary {
        op: BinaryOp::Add,
        left: Box::new(Expr::Number {
            value: 1.0,
            span: span(0, 1),
        }),
        right: Box::new(Expr::Number {
            value: 2.0,
            span: span(4, 5),
        }),
        span: span(0, 5),
    };
    let value = serde_json::to_value(&expr).unwrap();
    assert_eq!(value["type"], "Binary");
    assert_eq!(value["op"], "add");
}

#[test]
fn test_assign_op_desugaring() {
    assert_eq!(AssignOp::Add.binary_op(), Some(BinaryOp::Add));
    assert_eq!(AssignOp::Assign.binary_op(), None);
    assert_eq!(AssignOp::Nullish.logical_op(), Some(LogicalOp::Nullish));
}

#[test]
fn test_object_key_static_names() {
    assert_eq!(
        ObjectKey::Ident {
            name: "a".into(),
            span: span(0, 1)
        }
        .as_static_name(),
        Some("a".into())
    );
    assert_eq!(
        ObjectKey::Number {
            value: 3.0,
            span: span(0, 1)
        }
        .as_static_name(),
        Some("3".into())
    );
    assert_eq!(
        ObjectKey::Computed {
            expr: Box::new(Expr::Ident {
                name: "k".into(),
                span: span(1, 2)
            }),
            span: span(0, 3)
        }
        .as_static_name(),
        None
    );
}
