use crate::builder::build_cfg;
use crate::graph::Terminator;
use jsty_ast::{Expr, Stmt};
use jsty_common::Span;

fn span(n: u32) -> Span {
    Span::new(n, n + 1)
}

fn ident(name: &str, at: u32) -> Expr {
    Expr::Ident {
        name: name.into(),
        span: span(at),
    }
}

fn expr_stmt(expr: Expr, at: u32) -> Stmt {
    Stmt::Expr {
        expr,
        span: span(at),
    }
}

#[test]
fn test_entry_dominates_everything_reachable() {
    let body = vec![Stmt::If {
        test: ident("c", 0),
        consequent: Box::new(expr_stmt(ident("a", 5), 5)),
        alternate: Some(Box::new(expr_stmt(ident("b", 9), 9))),
        span: span(0),
    }];
    let cfg = build_cfg(&body);
    for &block in &cfg.rpo {
        assert!(
            cfg.dominates(cfg.entry, block),
            "entry must dominate {block:?}"
        );
    }
}

#[test]
fn test_every_block_dominates_itself() {
    let body = vec![Stmt::While {
        test: ident("c", 0),
        body: Box::new(expr_stmt(ident("x", 5), 5)),
        span: span(0),
    }];
    let cfg = build_cfg(&body);
    for block in &cfg.blocks {
        assert!(cfg.dominates(block.id, block.id));
    }
}

#[test]
fn test_branch_blocks_do_not_dominate_merge() {
    let body = vec![
        Stmt::If {
            test: ident("c", 0),
            consequent: Box::new(expr_stmt(ident("a", 5), 5)),
            alternate: Some(Box::new(expr_stmt(ident("b", 9), 9))),
            span: span(0),
        },
        expr_stmt(ident("after", 14), 14),
    ];
    let cfg = build_cfg(&body);

    let Some(Terminator::Branch {
        consequent,
        alternate,
        ..
    }) = cfg.block(cfg.entry).terminator
    else {
        panic!("expected branch");
    };
    // The merge block is the fallthrough target of the consequent.
    let Some(Terminator::Fallthrough { target: merge }) = cfg.block(consequent).terminator
    else {
        panic!("expected fallthrough");
    };
    assert!(!cfg.dominates(consequent, merge));
    assert!(!cfg.dominates(alternate, merge));
    assert!(cfg.dominates(cfg.entry, merge));
}

#[test]
fn test_loop_header_dominates_body() {
    let body = vec![Stmt::While {
        test: ident("c", 0),
        body: Box::new(expr_stmt(ident("x", 5), 5)),
        span: span(0),
    }];
    let cfg = build_cfg(&body);
    let &back_edge = cfg.back_edges.iter().next().expect("one back edge");
    let edge = cfg.edge(back_edge);
    assert!(cfg.dominates(edge.target, edge.source));
}

#[test]
fn test_post_dominators_from_exit() {
    let body = vec![expr_stmt(ident("a", 0), 0), expr_stmt(ident("b", 3), 3)];
    let cfg = build_cfg(&body);
    // The exit post-dominates the entry in a straight-line program.
    assert!(cfg.post_dominators[cfg.entry.index()].contains(cfg.exit.index()));
    assert!(cfg.post_dominators[cfg.exit.index()].contains(cfg.exit.index()));
}

#[test]
fn test_merge_post_dominates_branches() {
    let body = vec![
        Stmt::If {
            test: ident("c", 0),
            consequent: Box::new(expr_stmt(ident("a", 5), 5)),
            alternate: Some(Box::new(expr_stmt(ident("b", 9), 9))),
            span: span(0),
        },
        expr_stmt(ident("after", 14), 14),
    ];
    let cfg = build_cfg(&body);
    let Some(Terminator::Branch {
        consequent,
        alternate,
        ..
    }) = cfg.block(cfg.entry).terminator
    else {
        panic!("expected branch");
    };
    let Some(Terminator::Fallthrough { target: merge }) = cfg.block(consequent).terminator
    else {
        panic!("expected fallthrough");
    };
    assert!(cfg.post_dominators[consequent.index()].contains(merge.index()));
    assert!(cfg.post_dominators[alternate.index()].contains(merge.index()));
}
