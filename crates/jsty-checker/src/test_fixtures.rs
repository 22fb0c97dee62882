//! AST builders for tests.
//!
//! The analyzer consumes an already-parsed AST, so tests construct trees
//! directly. These helpers assign spans from a running cursor so that
//! annotation-ordering assertions see realistic offsets.

use jsty_ast::{
    AssignOp, AssignTarget, BinaryOp, Class, ClassMember, Declarator, Expr, ForInit, Function,
    FunctionBody, LogicalOp, MethodKind, Param, Pattern, Program, Stmt, SwitchCase, UnaryOp,
    VarDecl, VarKind,
};
use jsty_common::Span;
use std::cell::Cell;

thread_local! {
    static CURSOR: Cell<u32> = const { Cell::new(0) };
}

/// Allocate a fresh span of `len` bytes past everything allocated so far.
pub fn sp(len: u32) -> Span {
    CURSOR.with(|cursor| {
        let start = cursor.get();
        cursor.set(start + len + 1);
        Span::new(start, start + len)
    })
}

/// Reset the span cursor (call at the top of each test).
pub fn reset_spans() {
    CURSOR.with(|cursor| cursor.set(0));
}

pub fn program(body: Vec<Stmt>) -> Program {
    let span = Span::new(
        0,
        CURSOR.with(|c| c.get()),
    );
    Program { body, span }
}

// =============================================================================
// Expressions
// =============================================================================

pub fn num(value: f64) -> Expr {
    Expr::Number {
        value,
        span: sp(2),
    }
}

pub fn str_lit(value: &str) -> Expr {
    Expr::String {
        value: value.into(),
        span: sp(value.len() as u32 + 2),
    }
}

pub fn bool_lit(value: bool) -> Expr {
    Expr::Bool {
        value,
        span: sp(if value { 4 } else { 5 }),
    }
}

pub fn null() -> Expr {
    Expr::Null { span: sp(4) }
}

pub fn undefined() -> Expr {
    Expr::Undefined { span: sp(9) }
}

pub fn ident(name: &str) -> Expr {
    Expr::Ident {
        name: name.into(),
        span: sp(name.len() as u32),
    }
}

pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = left_to_right_span(&left, &right);
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span,
    }
}

pub fn logical(op: LogicalOp, left: Expr, right: Expr) -> Expr {
    let span = left_to_right_span(&left, &right);
    Expr::Logical {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span,
    }
}

pub fn unary(op: UnaryOp, argument: Expr) -> Expr {
    let span = sp(6);
    Expr::Unary {
        op,
        argument: Box::new(argument),
        span,
    }
}

pub fn typeof_of(name: &str) -> Expr {
    let argument = ident(name);
    let span = sp(7);
    Expr::Unary {
        op: UnaryOp::TypeOf,
        argument: Box::new(argument),
        span,
    }
}

pub fn member(object: Expr, property: &str) -> Expr {
    let span = sp(property.len() as u32 + 1);
    Expr::Member {
        object: Box::new(object),
        property: property.into(),
        optional: false,
        span,
    }
}

pub fn call(callee: Expr, args: Vec<Expr>) -> Expr {
    let span = sp(2);
    Expr::Call {
        callee: Box::new(callee),
        args,
        optional: false,
        span,
    }
}

pub fn new_expr(callee: Expr, args: Vec<Expr>) -> Expr {
    let span = sp(4);
    Expr::New {
        callee: Box::new(callee),
        args,
        span,
    }
}

pub fn assign_ident(name: &str, value: Expr) -> Expr {
    let target_span = sp(name.len() as u32);
    let span = sp(3);
    Expr::Assign {
        op: AssignOp::Assign,
        target: AssignTarget::Ident {
            name: name.into(),
            span: target_span,
        },
        value: Box::new(value),
        span,
    }
}

pub fn assign_this_member(property: &str, value: Expr) -> Expr {
    let this_span = sp(4);
    let target_span = sp(property.len() as u32 + 5);
    let span = sp(3);
    Expr::Assign {
        op: AssignOp::Assign,
        target: AssignTarget::Member {
            object: Box::new(Expr::This { span: this_span }),
            property: property.into(),
            span: target_span,
        },
        value: Box::new(value),
        span,
    }
}

pub fn conditional(test: Expr, consequent: Expr, alternate: Expr) -> Expr {
    let span = sp(8);
    Expr::Conditional {
        test: Box::new(test),
        consequent: Box::new(consequent),
        alternate: Box::new(alternate),
        span,
    }
}

pub fn object(fields: Vec<(&str, Expr)>) -> Expr {
    let properties = fields
        .into_iter()
        .map(|(name, value)| jsty_ast::ObjectProp::Init {
            key: jsty_ast::ObjectKey::Ident {
                name: name.into(),
                span: sp(name.len() as u32),
            },
            value,
            span: sp(4),
        })
        .collect();
    Expr::Object {
        properties,
        span: sp(2),
    }
}

pub fn array(elements: Vec<Expr>) -> Expr {
    Expr::Array {
        elements: elements.into_iter().map(Some).collect(),
        span: sp(2),
    }
}

fn left_to_right_span(left: &Expr, right: &Expr) -> Span {
    use jsty_common::Spanned;
    left.span().merge(right.span())
}

// =============================================================================
// Statements
// =============================================================================

pub fn decl(kind: VarKind, name: &str, init: Expr) -> Stmt {
    let pattern_span = sp(name.len() as u32);
    let span = sp(4);
    Stmt::VarDecl(VarDecl {
        kind,
        declarators: vec![Declarator {
            pattern: Pattern::Ident {
                name: name.into(),
                span: pattern_span,
            },
            init: Some(init),
            span,
        }],
        span,
    })
}

pub fn const_decl(name: &str, init: Expr) -> Stmt {
    decl(VarKind::Const, name, init)
}

pub fn let_decl(name: &str, init: Expr) -> Stmt {
    decl(VarKind::Let, name, init)
}

pub fn expr_stmt(expr: Expr) -> Stmt {
    let span = sp(1);
    Stmt::Expr { expr, span }
}

pub fn if_stmt(test: Expr, consequent: Vec<Stmt>, alternate: Option<Vec<Stmt>>) -> Stmt {
    let span = sp(3);
    let cons_span = sp(2);
    Stmt::If {
        test,
        consequent: Box::new(Stmt::Block {
            body: consequent,
            span: cons_span,
        }),
        alternate: alternate.map(|body| {
            let alt_span = sp(2);
            Box::new(Stmt::Block {
                body,
                span: alt_span,
            })
        }),
        span,
    }
}

pub fn while_stmt(test: Expr, body: Vec<Stmt>) -> Stmt {
    let span = sp(5);
    let body_span = sp(2);
    Stmt::While {
        test,
        body: Box::new(Stmt::Block {
            body,
            span: body_span,
        }),
        span,
    }
}

pub fn for_stmt(init: Stmt, test: Expr, update: Expr, body: Vec<Stmt>) -> Stmt {
    let Stmt::VarDecl(var_decl) = init else {
        panic!("for_stmt takes a variable declaration init");
    };
    let span = sp(3);
    let body_span = sp(2);
    Stmt::For {
        init: Some(Box::new(ForInit::VarDecl(var_decl))),
        test: Some(test),
        update: Some(update),
        body: Box::new(Stmt::Block {
            body,
            span: body_span,
        }),
        span,
    }
}

pub fn return_stmt(argument: Option<Expr>) -> Stmt {
    let span = sp(6);
    Stmt::Return { argument, span }
}

pub fn param(name: &str) -> Param {
    let span = sp(name.len() as u32);
    Param {
        pattern: Pattern::Ident {
            name: name.into(),
            span,
        },
        default: None,
        rest: false,
        span,
    }
}

pub fn function_decl(name: &str, params: Vec<Param>, body: Vec<Stmt>) -> Stmt {
    let span = sp(name.len() as u32 + 9);
    let body_span = sp(2);
    Stmt::Function {
        function: Box::new(Function {
            name: Some(name.into()),
            params,
            body: FunctionBody::Block {
                body,
                span: body_span,
            },
            is_async: false,
            is_generator: false,
            is_arrow: false,
            span,
        }),
        span,
    }
}

pub fn class_decl(name: &str, members: Vec<ClassMember>) -> Stmt {
    let span = sp(name.len() as u32 + 6);
    Stmt::Class {
        class: Box::new(Class {
            name: Some(name.into()),
            parent: None,
            members,
            span,
        }),
        span,
    }
}

pub fn constructor(params: Vec<Param>, body: Vec<Stmt>) -> ClassMember {
    let span = sp(11);
    let body_span = sp(2);
    ClassMember::Constructor {
        function: Box::new(Function {
            name: None,
            params,
            body: FunctionBody::Block {
                body,
                span: body_span,
            },
            is_async: false,
            is_generator: false,
            is_arrow: false,
            span,
        }),
        span,
    }
}

pub fn method(name: &str, params: Vec<Param>, body: Vec<Stmt>) -> ClassMember {
    let span = sp(name.len() as u32 + 4);
    let body_span = sp(2);
    ClassMember::Method {
        name: name.into(),
        function: Box::new(Function {
            name: None,
            params,
            body: FunctionBody::Block {
                body,
                span: body_span,
            },
            is_async: false,
            is_generator: false,
            is_arrow: false,
            span,
        }),
        kind: MethodKind::Method,
        is_static: false,
        span,
    }
}

pub fn getter(name: &str, body: Vec<Stmt>) -> ClassMember {
    let span = sp(name.len() as u32 + 8);
    let body_span = sp(2);
    ClassMember::Method {
        name: name.into(),
        function: Box::new(Function {
            name: None,
            params: vec![],
            body: FunctionBody::Block {
                body,
                span: body_span,
            },
            is_async: false,
            is_generator: false,
            is_arrow: false,
            span,
        }),
        kind: MethodKind::Get,
        is_static: false,
        span,
    }
}

pub fn setter(name: &str, param_name: &str, body: Vec<Stmt>) -> ClassMember {
    let params = vec![param(param_name)];
    let span = sp(name.len() as u32 + 8);
    let body_span = sp(2);
    ClassMember::Method {
        name: name.into(),
        function: Box::new(Function {
            name: None,
            params,
            body: FunctionBody::Block {
                body,
                span: body_span,
            },
            is_async: false,
            is_generator: false,
            is_arrow: false,
            span,
        }),
        kind: MethodKind::Set,
        is_static: false,
        span,
    }
}

pub fn switch_case(test: Option<Expr>, body: Vec<Stmt>) -> SwitchCase {
    SwitchCase {
        test,
        body,
        span: sp(5),
    }
}
