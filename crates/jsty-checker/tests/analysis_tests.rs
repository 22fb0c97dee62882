//! Universal laws of the analysis surface: annotation ordering,
//! containment, and determinism.

use jsty_checker::test_fixtures as fx;
use jsty_checker::analyze;

fn sample_program() -> jsty_ast::Program {
    fx::reset_spans();
    fx::program(vec![
        fx::const_decl("x", fx::num(42.0)),
        fx::let_decl("y", fx::str_lit("hi")),
        fx::function_decl(
            "f",
            vec![fx::param("a"), fx::param("b")],
            vec![fx::return_stmt(Some(fx::binary(
                jsty_ast::BinaryOp::Add,
                fx::ident("a"),
                fx::ident("b"),
            )))],
        ),
        fx::expr_stmt(fx::call(fx::ident("f"), vec![fx::num(1.0), fx::num(2.0)])),
    ])
}

#[test]
fn test_annotations_sorted_by_start() {
    let program = sample_program();
    let analysis = analyze(&program, "");
    let starts: Vec<u32> = analysis.annotations.iter().map(|a| a.start).collect();
    let mut sorted = starts.clone();
    sorted.sort_unstable();
    assert_eq!(starts, sorted, "annotations must be sorted by start offset");
}

#[test]
fn test_annotation_spans_are_contained() {
    let program = sample_program();
    let source_end = program.span.end;
    let analysis = analyze(&program, "");
    for annotation in &analysis.annotations {
        assert!(annotation.start <= annotation.end);
        assert!(
            annotation.end <= source_end,
            "annotation {annotation:?} escapes the source"
        );
    }
}

#[test]
fn test_determinism() {
    // Repeated analysis of the same source yields identical output.
    let program = sample_program();
    let first = analyze(&program, "");
    let second = analyze(&program, "");

    let render = |a: &jsty_checker::Analysis| {
        let annos: Vec<String> = a
            .annotations
            .iter()
            .map(|x| format!("{}:{}:{:?}:{}", x.start, x.end, x.name, x.type_string))
            .collect();
        let errs: Vec<String> = a.errors.iter().map(ToString::to_string).collect();
        (annos, errs)
    };
    assert_eq!(render(&first), render(&second));
}

#[test]
fn test_diagnostics_sorted_by_start() {
    fx::reset_spans();
    let program = fx::program(vec![
        fx::const_decl("a", fx::ident("m1")),
        fx::const_decl("b", fx::ident("m2")),
        fx::const_decl("c", fx::ident("m3")),
    ]);
    let analysis = analyze(&program, "");
    assert_eq!(analysis.errors.len(), 3);
    let starts: Vec<u32> = analysis.errors.iter().map(|e| e.span.start).collect();
    let mut sorted = starts.clone();
    sorted.sort_unstable();
    assert_eq!(starts, sorted);
}

#[test]
fn test_line_column_resolution() {
    fx::reset_spans();
    let program = fx::program(vec![fx::const_decl("x", fx::ident("missing"))]);
    // Fake a two-line source so the diagnostic lands past line 0.
    let mut source = String::new();
    while (source.len() as u32) < program.span.end {
        source.push(if source.len() == 2 { '\n' } else { 'a' });
    }
    let analysis = analyze(&program, &source);
    assert_eq!(analysis.errors.len(), 1);
    let diag = &analysis.errors[0];
    if diag.span.start > 2 {
        assert_eq!(diag.line, 1);
    }
}

#[test]
fn test_annotations_serialize() {
    let program = sample_program();
    let analysis = analyze(&program, "");
    let json = serde_json::to_value(&analysis).expect("analysis serializes");
    assert!(json["annotations"].is_array());
    assert!(json["errors"].is_array());
    let first = &json["annotations"][0];
    assert!(first["typeString"].is_string());
    assert!(first["nodeType"].is_string());
    assert!(first["kind"].is_string());
}

#[test]
fn test_debug_payload_present() {
    let program = sample_program();
    let analysis = analyze(&program, "");
    assert!(analysis.iterations > 0);
    assert!(analysis.block_count > 0);
}

#[test]
fn test_bounded_convergence_for_widened_loops() {
    // A loop whose assignments only widen literals to their bases reaches
    // a fixed point in a small constant multiple of the block count.
    fx::reset_spans();
    let program = fx::program(vec![
        fx::let_decl("n", fx::num(0.0)),
        fx::while_stmt(
            fx::binary(jsty_ast::BinaryOp::Lt, fx::ident("n"), fx::num(10.0)),
            vec![fx::expr_stmt(fx::assign_ident(
                "n",
                fx::binary(jsty_ast::BinaryOp::Add, fx::ident("n"), fx::num(1.0)),
            ))],
        ),
    ]);
    let analysis = analyze(&program, "");
    assert!(analysis.errors.is_empty(), "errors: {:?}", analysis.errors);
    assert!(
        analysis.iterations <= 4 * analysis.block_count as u32,
        "{} iterations for {} blocks",
        analysis.iterations,
        analysis.block_count
    );
}

#[test]
fn test_empty_program() {
    fx::reset_spans();
    let program = fx::program(vec![]);
    let analysis = analyze(&program, "");
    assert!(analysis.annotations.is_empty());
    assert!(analysis.errors.is_empty());
}
