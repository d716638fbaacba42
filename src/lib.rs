//! The Lak programming language: lexer, parser, tree-walking evaluator,
//! AST-level optimizer, source-to-source code generator, and a compiled-AST
//! serialization format.
//!
//! # Architecture
//!
//! 1. **Lexing** ([`lexer`]) - source text to tokens.
//! 2. **Parsing** ([`parser`]) - tokens to an [`ast::Node`] tree.
//! 3. **Optimizing** ([`optimizer`]) - constant folding and propagation.
//! 4. **Evaluating** ([`evaluator`]) - tree-walking interpretation against a
//!    [`scope::Scope`] chain populated by [`builtins`].
//! 5. **Code generation** ([`codegen`]) - optional source-to-source lowering.
//! 6. **Serialization** ([`serialize`]) - the `.laki` compiled-AST format.

pub mod ast;
pub mod builtins;
pub mod codegen;
pub mod error;
pub mod evaluator;
pub mod lexer;
pub mod optimizer;
pub mod parser;
pub mod scope;
pub mod serialize;
pub mod token;
pub mod value;

use ast::Node;
use error::LakError;
use scope::Scope;
use std::cell::RefCell;
use std::io::Write;
use std::path::Path;
use std::rc::Rc;
use value::Value;

/// Strips carriage returns before lexing (spec.md section 4.1: "Carriage
/// returns are stripped on input").
fn normalize_source(source: &str) -> String {
    source.replace('\r', "")
}

/// Parses a source string into an AST, without evaluating it.
pub fn parse(source: &str) -> Result<Node, LakError> {
    let normalized = normalize_source(source);
    let mut lexer = lexer::Lexer::new(&normalized);
    let tokens = lexer.tokenize()?;
    let mut parser = parser::Parser::new(tokens);
    Ok(parser.parse()?)
}

/// Reads and parses a `.lak` source file.
pub fn parse_from_file(path: &Path) -> Result<Node, LakError> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| LakError::syntax(format!("Failed to read file: {e}")))?;
    parse(&source)
}

/// Parses and writes the serialized AST to `output_path`, defaulting to the
/// source path with its extension replaced by `.laki` (spec.md section 6
/// `compile`).
pub fn compile(source_path: &Path, output_path: Option<&Path>) -> Result<(), LakError> {
    let ast = parse_from_file(source_path)?;
    let default_output = source_path.with_extension("laki");
    let output_path = output_path.unwrap_or(&default_output);
    serialize::write_to_file(&ast, output_path)
        .map_err(|e| LakError::syntax(format!("Failed to write compiled output: {e}")))
}

/// Builds a fresh top scope writing `println` output to stdout.
pub fn default_scope() -> Rc<Scope> {
    builtins::build_top_scope(Rc::new(RefCell::new(std::io::stdout())))
}

/// Evaluates an already-parsed AST against a fresh top scope.
pub fn interpret(ast: &Node) -> Result<Value, LakError> {
    evaluator::evaluate(ast, &default_scope())
}

/// Evaluates an already-parsed AST against a fresh top scope whose
/// `println` writes to `out`, for tests that need to observe output.
pub fn interpret_with_output(
    ast: &Node,
    out: Rc<RefCell<dyn Write>>,
) -> Result<Value, LakError> {
    let scope = builtins::build_top_scope(out);
    evaluator::evaluate(ast, &scope)
}

/// Reads and deserializes a `.laki` file, then evaluates it (spec.md
/// section 6 `interpretFromFile`).
pub fn interpret_from_file(path: &Path) -> Result<Value, LakError> {
    let ast = serialize::read_from_file(path)
        .map_err(|e| LakError::syntax(format!("Failed to read compiled AST: {e}")))?;
    interpret(&ast)
}

/// Parses, optimizes, and evaluates a source string (spec.md section 6
/// `run`).
pub fn run(source: &str) -> Result<Value, LakError> {
    let ast = parse(source)?;
    let optimized = optimizer::optimize(&ast);
    interpret(&optimized)
}

/// Reads, parses, optimizes, and evaluates a `.lak` source file (spec.md
/// section 6 `runFromFile`).
pub fn run_from_file(path: &Path) -> Result<Value, LakError> {
    let ast = parse_from_file(path)?;
    let optimized = optimizer::optimize(&ast);
    interpret(&optimized)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run_capturing(source: &str) -> (Value, String) {
        let ast = parse(source).unwrap();
        let optimized = optimizer::optimize(&ast);
        let buf = Rc::new(RefCell::new(Cursor::new(Vec::new())));
        let value = interpret_with_output(&optimized, buf.clone()).unwrap();
        let bytes = buf.borrow().get_ref().clone();
        (value, String::from_utf8(bytes).unwrap())
    }

    #[test]
    fn println_scenario() {
        let (value, output) = run_capturing("do( println(1, 2, 3) )");
        assert_eq!(output, "1 2 3\n");
        assert_eq!(value.to_string(), "[1, 2, 3]");
    }

    #[test]
    fn fixing_scope_scenario() {
        let (value, _) =
            run_capturing("do( let(x, 1), let(f, fn(assign(x, 2))), f(), x )");
        assert_eq!(value, Value::Number(2.0));
    }

    #[test]
    fn constant_fold_scenario() {
        let ast = parse("println(+(1, 2))").unwrap();
        let optimized = optimizer::optimize(&ast);
        match &optimized {
            Node::Call { args, .. } => {
                assert_eq!(args[0], Node::number(3.0));
            }
            _ => panic!("expected a call"),
        }
    }

    #[test]
    fn reassigning_a_tracked_function_unions_its_mutation_set() {
        // `f` is first known to mutate `a`. Reassigning it to a closure that
        // mutates nothing of its own must still carry `a` forward in the
        // union, not drop it - otherwise a later `f()` call fails to
        // invalidate `a`'s freshly re-established constant fact and
        // `println(a)` would be unsound folded away.
        let ast = parse(
            "do( \
               let(a, 1), \
               let(f, fn(assign(a, 99))), \
               assign(f, fn(println(1))), \
               let(a, 5), \
               f(), \
               println(a) \
             )",
        )
        .unwrap();
        let optimized = optimizer::optimize(&ast);
        match &optimized {
            Node::Call { args, .. } => match args.last().unwrap() {
                Node::Call { args: println_args, .. } => {
                    assert_eq!(println_args[0], Node::word("a"));
                }
                other => panic!("expected the final println call, got {other:?}"),
            },
            other => panic!("expected a do-call, got {other:?}"),
        }
    }

    #[test]
    fn propagation_invalidation_scenario() {
        let (_, output) = run_capturing(
            "do( let(x, 1), let(mut, fn(assign(x, 2))), mut(), println(x) )",
        );
        assert_eq!(output, "2\n");
    }

    #[test]
    fn unbound_assignment_is_a_reference_error() {
        let err = run("assign(y, 1)").unwrap_err();
        assert!(matches!(err, LakError::Reference { .. }));
    }

    #[test]
    fn binding_then_assigning_succeeds() {
        let value = run("do( let(y, 1), assign(y, 2), y )").unwrap();
        assert_eq!(value, Value::Number(2.0));
    }

    #[test]
    fn let_cannot_rebind_true() {
        let err = run("let(true, 5)").unwrap_err();
        assert!(matches!(err, LakError::Syntax { .. }));
    }

    #[test]
    fn assign_cannot_rebind_undefined() {
        let err = run("assign(undefined, 5)").unwrap_err();
        assert!(matches!(err, LakError::Syntax { .. }));
    }

    #[test]
    fn let_does_not_leak_out_of_run_block() {
        let err = run("do( do( let(z, 1) ), z )").unwrap_err();
        assert!(matches!(err, LakError::Reference { .. }));
    }

    #[test]
    fn parens_and_braces_are_interchangeable() {
        let a = parse("f(x)").unwrap();
        let b = parse("f{x}").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn mismatched_brackets_are_rejected() {
        assert!(parse("f(x}").is_err());
    }

    #[test]
    fn compiled_ast_round_trips_through_laki() {
        let dir = tempfile::tempdir().unwrap();
        let source_path = dir.path().join("prog.lak");
        std::fs::write(&source_path, "println(+(1, 2))").unwrap();

        compile(&source_path, None).unwrap();
        let laki_path = source_path.with_extension("laki");
        assert!(laki_path.exists());

        let direct = run_from_file(&source_path).unwrap();
        let (via_laki, output) = {
            let ast = serialize::read_from_file(&laki_path).unwrap();
            let optimized = optimizer::optimize(&ast);
            let buf = Rc::new(RefCell::new(Cursor::new(Vec::new())));
            let value = interpret_with_output(&optimized, buf.clone()).unwrap();
            let bytes = buf.borrow().get_ref().clone();
            (value, String::from_utf8(bytes).unwrap())
        };
        assert_eq!(direct.to_string(), via_laki.to_string());
        assert_eq!(output, "3\n");
    }
}
