//! Integration tests for the Lak interpreter.
//!
//! These tests exercise the driver surface (`parse_from_file`, `compile`,
//! `run_from_file`, `interpret_from_file`) against real files on disk,
//! plus the parse-error scenarios enumerated in the language design.

use lak::error::LakError;
use std::fs;
use tempfile::tempdir;

fn write_source(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

// === Driver surface: file-based parse/run/compile ===

#[test]
fn run_from_file_reads_and_evaluates() {
    let dir = tempdir().unwrap();
    let path = write_source(&dir, "hello.lak", r#"println("hello")"#);
    let value = lak::run_from_file(&path).unwrap();
    assert_eq!(value.to_string(), "[hello]");
}

#[test]
fn parse_from_file_yields_the_expected_shape() {
    let dir = tempdir().unwrap();
    let path = write_source(&dir, "call.lak", "f(1, 2)");
    let ast = lak::parse_from_file(&path).unwrap();
    match ast {
        lak::ast::Node::Call { operator, args } => {
            assert_eq!(operator.as_word(), Some("f"));
            assert_eq!(args.len(), 2);
        }
        other => panic!("expected a call, got {other:?}"),
    }
}

#[test]
fn compile_defaults_output_to_laki_extension() {
    let dir = tempdir().unwrap();
    let path = write_source(&dir, "prog.lak", "println(1)");
    lak::compile(&path, None).unwrap();
    assert!(dir.path().join("prog.laki").exists());
}

#[test]
fn compile_honors_explicit_output_path() {
    let dir = tempdir().unwrap();
    let path = write_source(&dir, "prog.lak", "println(1)");
    let out = dir.path().join("custom.laki");
    lak::compile(&path, Some(&out)).unwrap();
    assert!(out.exists());
}

#[test]
fn interpret_from_file_evaluates_a_compiled_ast() {
    let dir = tempdir().unwrap();
    let path = write_source(&dir, "prog.lak", "+(2, 3)");
    lak::compile(&path, None).unwrap();
    let laki = path.with_extension("laki");
    let value = lak::interpret_from_file(&laki).unwrap();
    assert_eq!(value.to_string(), "5");
}

#[test]
fn run_from_file_missing_file_is_a_syntax_error() {
    let missing = std::path::Path::new("/nonexistent/path/to/program.lak");
    let err = lak::run_from_file(missing).unwrap_err();
    assert!(matches!(err, LakError::Syntax { .. }));
}

// === Parse error scenarios ===

#[test]
fn unexpected_token_in_call() {
    let err = lak::parse("f(,)").unwrap_err();
    assert!(err.to_string().contains("Unexpected token"));
}

#[test]
fn expected_comma_or_close_paren() {
    let err = lak::parse("f(1 2)").unwrap_err();
    assert!(err.to_string().contains("Expected ',' or ')'"));
}

#[test]
fn unmatched_parenthesis() {
    let err = lak::parse("f(1))").unwrap_err();
    assert!(err.to_string().contains("Unmatched parenthesis"));
}

#[test]
fn unexpected_eof_inside_argument_list() {
    let err = lak::parse("f(1,").unwrap_err();
    assert!(err.to_string().contains("EOF"));
}

#[test]
fn unexpected_comma_after_program() {
    let err = lak::parse("f(1),").unwrap_err();
    assert!(err.to_string().contains("Unexpected comma after program"));
}

// === Lex error scenarios ===

#[test]
fn unterminated_string_is_invalid_token() {
    let err = lak::parse(r#"println("unterminated)"#).unwrap_err();
    assert!(matches!(err, LakError::Lex(_)));
}

#[test]
fn numbers_accept_sign_fraction_and_exponent() {
    let ast = lak::parse("-1.5e2").unwrap();
    assert_eq!(ast, lak::ast::Node::number(-150.0));
}

// === Evaluation error scenarios ===

#[test]
fn calling_a_non_callable_is_a_type_error() {
    let err = lak::run("do( let(x, 1), x() )").unwrap_err();
    assert!(matches!(err, LakError::Type { .. }));
}

#[test]
fn wrong_arity_user_function_is_a_type_error() {
    let err = lak::run("do( let(f, fn(a, a)), f() )").unwrap_err();
    assert!(matches!(err, LakError::Type { .. }));
}

#[test]
fn object_methods_see_self() {
    let value = lak::run(
        "do( \
           let(o, object(\"value\", 41, \"bump\", fn(+(element(self, \"value\"), 1)))), \
           element(o, \"bump\")() \
         )",
    )
    .unwrap();
    assert_eq!(value.to_string(), "42");
}

#[test]
fn dotted_method_call_sugar_resolves_like_element_lookup() {
    let value = lak::run(
        "do( \
           let(o, object(\"value\", 41, \"bump\", fn(+(element(self, \"value\"), 1)))), \
           o.bump() \
         )",
    )
    .unwrap();
    assert_eq!(value.to_string(), "42");
}

#[test]
fn dotted_assign_sets_an_object_field() {
    let value = lak::run(
        "do( \
           let(o, object(\"value\", 1)), \
           assign(o.value, 9), \
           element(o, \"value\") \
         )",
    )
    .unwrap();
    assert_eq!(value.to_string(), "9");
}

#[test]
fn foreach_sums_an_array() {
    let value = lak::run(
        "do( \
           let(total, 0), \
           foreach(item, arr(1, 2, 3), assign(total, +(total, item))), \
           total \
         )",
    )
    .unwrap();
    assert_eq!(value.to_string(), "6");
}
