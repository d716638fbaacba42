//! Abstract syntax tree produced by [`crate::parser`] and consumed by
//! [`crate::evaluator`], [`crate::optimizer`] and [`crate::codegen`].

use serde::{Deserialize, Serialize};

/// A literal value as it can appear directly in parsed source, or as the
/// result of constant folding in [`crate::optimizer`]. Distinct from
/// [`crate::value::Value`], which additionally covers run-time-only values
/// (arrays, objects, functions) that can never be written as a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Literal {
    Number(f64),
    String(String),
    Bool(bool),
    Undefined,
}

/// An AST node. `Value`/`Word`/`Call` are produced by the parser.
/// `MethodCall` is never produced by the parser itself — words may contain
/// `.`, so `o.bump(args)` lexes as one `Word` — but is synthesized via
/// [`Node::desugar_dotted_call`] wherever a dotted word is used as a call's
/// operator or an `assign` target (see [`crate::evaluator`] and
/// [`crate::builtins::eval_assign`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Value {
        value: Literal,
    },
    Word {
        name: String,
    },
    Call {
        operator: Box<Node>,
        args: Vec<Node>,
    },
    MethodCall {
        target: Box<Node>,
        key: String,
        args: Vec<Node>,
    },
}

impl Node {
    pub fn word(name: impl Into<String>) -> Node {
        Node::Word { name: name.into() }
    }

    pub fn call(operator: Node, args: Vec<Node>) -> Node {
        Node::Call {
            operator: Box::new(operator),
            args,
        }
    }

    pub fn number(value: f64) -> Node {
        Node::Value {
            value: Literal::Number(value),
        }
    }

    pub fn string(value: impl Into<String>) -> Node {
        Node::Value {
            value: Literal::String(value.into()),
        }
    }

    /// The name of the [`Word`](Node::Word) this node is, if any. Used
    /// pervasively by the evaluator and optimizer to check "is this call's
    /// operator a bare name" without a nested `match`.
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Node::Word { name } => Some(name),
            _ => None,
        }
    }

    /// Desugars a dotted [`Word`](Node::Word) like `o.bump` into a
    /// [`MethodCall`](Node::MethodCall) on `o` with key `"bump"`.
    ///
    /// The lexer's `WORD_STOP` set doesn't exclude `.`, so `o.bump(args)`
    /// parses as a single `Call(Word("o.bump"), args)` rather than anything
    /// already shaped like a method call; this is where that word is split
    /// back into target and key, at the two points that need to resolve it
    /// as one (a call's operator, and an `assign` target).
    pub fn desugar_dotted_call(&self, args: Vec<Node>) -> Option<Node> {
        let name = self.as_word()?;
        let (target, key) = name.rsplit_once('.')?;
        if target.is_empty() || key.is_empty() {
            return None;
        }
        Some(Node::MethodCall {
            target: Box::new(Node::word(target)),
            key: key.to_string(),
            args,
        })
    }
}
