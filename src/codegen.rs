//! Source-to-source code generator.
//!
//! Where the teacher's `Codegen` lowered an AST to LLVM IR and linked a
//! native executable, this one lowers an (optionally optimized) [`Node`]
//! tree to an equivalent expression string in a C-like target surface
//! syntax: calls as `operator(args...)`, keywords rendered with their own
//! shape, literals rendered as target-language literals. There is no
//! linker step; the output is a string the caller writes wherever it
//! likes.

use crate::ast::{Literal, Node};

/// Recursively maps a [`Node`] to target-language source text.
///
/// `let`-bound names are hoisted to a `var` declaration ahead of the
/// statement that first binds them, since the target surface syntax (unlike
/// this language) expects names declared before use in some constructs.
pub struct Codegen {
    hoisted: Vec<String>,
}

impl Codegen {
    pub fn new() -> Self {
        Codegen { hoisted: Vec::new() }
    }

    /// Lowers a full program node to a target-language source string,
    /// prefixed with hoisted `var` declarations collected during the walk.
    pub fn compile(&mut self, program: &Node) -> String {
        let body = self.generate(program);
        if self.hoisted.is_empty() {
            body
        } else {
            let decls: String = self
                .hoisted
                .iter()
                .map(|name| format!("var {name};\n"))
                .collect();
            format!("{decls}{body}")
        }
    }

    fn hoist(&mut self, name: &str) {
        if !self.hoisted.iter().any(|n| n == name) {
            self.hoisted.push(name.to_string());
        }
    }

    fn generate(&mut self, node: &Node) -> String {
        match node {
            Node::Value { value } => generate_literal(value),
            Node::Word { name } => name.clone(),
            Node::MethodCall { target, key, args } => {
                let target = self.generate(target);
                let args = self.generate_args(args);
                format!("{target}.{key}({args})")
            }
            Node::Call { operator, args } => match operator.as_word() {
                Some("let") | Some("def") | Some(":=") if args.len() == 2 => {
                    if let Some(name) = args[0].as_word() {
                        self.hoist(name);
                        let value = self.generate(&args[1]);
                        format!("{name} = {value}")
                    } else {
                        self.generate_call(operator, args)
                    }
                }
                Some("assign") | Some("set") | Some("=") if args.len() >= 2 => {
                    let target = self.generate(&args[0]);
                    let value = self.generate(&args[args.len() - 1]);
                    if args.len() == 2 {
                        format!("{target} = {value}")
                    } else {
                        let indices = self.generate_args(&args[1..args.len() - 1]);
                        format!("{target}[{indices}] = {value}")
                    }
                }
                Some("if") if args.len() == 2 || args.len() == 3 => {
                    let cond = self.generate(&args[0]);
                    let then = self.generate(&args[1]);
                    if let Some(else_) = args.get(2) {
                        let else_ = self.generate(else_);
                        format!("if ({cond}) {{ {then} }} else {{ {else_} }}")
                    } else {
                        format!("if ({cond}) {{ {then} }}")
                    }
                }
                Some("while") if args.len() == 2 => {
                    let cond = self.generate(&args[0]);
                    let body = self.generate(&args[1]);
                    format!("while ({cond}) {{ {body} }}")
                }
                Some("run") | Some("do") => {
                    let stmts: Vec<String> = args.iter().map(|a| self.generate(a)).collect();
                    format!("{{ {} }}", stmts.join("; "))
                }
                Some(op) if crate::builtins::is_foldable_operator(op) && args.len() == 2 => {
                    let lhs = self.generate(&args[0]);
                    let rhs = self.generate(&args[1]);
                    format!("({lhs} {op} {rhs})")
                }
                _ => self.generate_call(operator, args),
            },
        }
    }

    fn generate_call(&mut self, operator: &Node, args: &[Node]) -> String {
        let operator = self.generate(operator);
        let args = self.generate_args(args);
        format!("{operator}({args})")
    }

    fn generate_args(&mut self, args: &[Node]) -> String {
        args.iter()
            .map(|a| self.generate(a))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Default for Codegen {
    fn default() -> Self {
        Self::new()
    }
}

fn generate_literal(value: &Literal) -> String {
    match value {
        Literal::Number(n) => n.to_string(),
        Literal::String(s) => format!("{:?}", s),
        Literal::Bool(b) => b.to_string(),
        Literal::Undefined => "undefined".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowers_println_call() {
        let mut codegen = Codegen::new();
        let ast = Node::call(Node::word("println"), vec![Node::string("hi")]);
        assert_eq!(codegen.compile(&ast), "println(\"hi\")");
    }

    #[test]
    fn hoists_let_bound_names() {
        let mut codegen = Codegen::new();
        let ast = Node::call(
            Node::word("run"),
            vec![
                Node::call(Node::word("let"), vec![Node::word("x"), Node::number(1.0)]),
                Node::word("x"),
            ],
        );
        let out = codegen.compile(&ast);
        assert!(out.starts_with("var x;\n"));
        assert!(out.contains("x = 1"));
    }

    #[test]
    fn lowers_binary_operator() {
        let mut codegen = Codegen::new();
        let ast = Node::call(Node::word("+"), vec![Node::number(1.0), Node::number(2.0)]);
        assert_eq!(codegen.compile(&ast), "(1 + 2)");
    }
}
