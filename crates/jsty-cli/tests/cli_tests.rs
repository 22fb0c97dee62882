//! CLI surface tests: JSON AST in, report/JSON out, exit codes.

use std::io::Write;
use std::process::Command;

fn jsty_binary() -> &'static str {
    env!("CARGO_BIN_EXE_jsty")
}

/// `const x = 42;` as the JSON a parser would hand us.
fn clean_ast() -> serde_json::Value {
    serde_json::json!({
        "body": [{
            "type": "VarDecl",
            "kind": "const",
            "declarators": [{
                "pattern": { "type": "Ident", "name": "x", "span": { "start": 6, "end": 7 } },
                "init": { "type": "Number", "value": 42.0, "span": { "start": 10, "end": 12 } },
                "span": { "start": 6, "end": 12 }
            }],
            "span": { "start": 0, "end": 13 }
        }],
        "span": { "start": 0, "end": 13 }
    })
}

/// `const x = 1; x = 2;` triggers a const-assignment diagnostic.
fn broken_ast() -> serde_json::Value {
    serde_json::json!({
        "body": [
            {
                "type": "VarDecl",
                "kind": "const",
                "declarators": [{
                    "pattern": { "type": "Ident", "name": "x", "span": { "start": 6, "end": 7 } },
                    "init": { "type": "Number", "value": 1.0, "span": { "start": 10, "end": 11 } },
                    "span": { "start": 6, "end": 11 }
                }],
                "span": { "start": 0, "end": 12 }
            },
            {
                "type": "Expr",
                "expr": {
                    "type": "Assign",
                    "op": "assign",
                    "target": { "type": "Ident", "name": "x", "span": { "start": 13, "end": 14 } },
                    "value": { "type": "Number", "value": 2.0, "span": { "start": 17, "end": 18 } },
                    "span": { "start": 13, "end": 18 }
                },
                "span": { "start": 13, "end": 19 }
            }
        ],
        "span": { "start": 0, "end": 19 }
    })
}

fn write_ast(value: &serde_json::Value) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "{value}").expect("write ast");
    file
}

#[test]
fn test_clean_file_exits_zero() {
    let ast = write_ast(&clean_ast());
    let output = Command::new(jsty_binary())
        .args(["check", ast.path().to_str().unwrap()])
        .output()
        .expect("run jsty");
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("x"));
    assert!(stdout.contains("42"));
}

#[test]
fn test_diagnostics_exit_nonzero() {
    let ast = write_ast(&broken_ast());
    let output = Command::new(jsty_binary())
        .args(["check", ast.path().to_str().unwrap()])
        .output()
        .expect("run jsty");
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("const-assignment"), "stdout: {stdout}");
}

#[test]
fn test_json_format() {
    let ast = write_ast(&clean_ast());
    let output = Command::new(jsty_binary())
        .args(["check", ast.path().to_str().unwrap(), "--format", "json"])
        .output()
        .expect("run jsty");
    assert!(output.status.success());
    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("valid JSON output");
    assert_eq!(parsed["annotations"][0]["typeString"], "42");
    assert_eq!(parsed["errors"], serde_json::json!([]));
}

#[test]
fn test_types_format() {
    let ast = write_ast(&clean_ast());
    let output = Command::new(jsty_binary())
        .args(["check", ast.path().to_str().unwrap(), "--format", "types"])
        .output()
        .expect("run jsty");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.lines().any(|l| l.trim() == "x: 42"), "stdout: {stdout}");
}

#[test]
fn test_missing_file_errors() {
    let output = Command::new(jsty_binary())
        .args(["check", "/nonexistent/path.json"])
        .output()
        .expect("run jsty");
    assert!(!output.status.success());
}
