//! `.laki` compiled-AST format: a tagged-JSON serialization of [`Node`]
//! satisfying spec.md section 6's round-trip guarantee — parsing a source
//! file then serializing the AST, reading it back, and deserializing
//! produces a structurally identical tree.

use crate::ast::Node;
use std::io;

/// Serializes an AST to its `.laki` textual form.
pub fn serialize(node: &Node) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(node)
}

/// Parses a `.laki` file's contents back into an AST.
pub fn deserialize(text: &str) -> Result<Node, serde_json::Error> {
    serde_json::from_str(text)
}

/// Writes an AST to `path` as `.laki`.
pub fn write_to_file(node: &Node, path: &std::path::Path) -> io::Result<()> {
    let text = serialize(node).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    std::fs::write(path, text)
}

/// Reads a `.laki` file and deserializes its AST.
pub fn read_from_file(path: &std::path::Path) -> io::Result<Node> {
    let text = std::fs::read_to_string(path)?;
    deserialize(&text).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Literal;

    #[test]
    fn round_trips_a_nested_call() {
        let ast = Node::call(
            Node::word("println"),
            vec![Node::call(
                Node::word("+"),
                vec![Node::number(1.0), Node::number(2.0)],
            )],
        );
        let text = serialize(&ast).unwrap();
        let back = deserialize(&text).unwrap();
        assert_eq!(ast, back);
    }

    #[test]
    fn round_trips_method_call() {
        let ast = Node::MethodCall {
            target: Box::new(Node::word("obj")),
            key: "greet".to_string(),
            args: vec![Node::Value { value: Literal::String("hi".to_string()) }],
        };
        let text = serialize(&ast).unwrap();
        let back = deserialize(&text).unwrap();
        assert_eq!(ast, back);
    }
}
