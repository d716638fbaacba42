//! AST-level optimizer: constant folding and scope-aware constant
//! propagation across nested lexical scopes and function boundaries,
//! conservatively invalidating constants through aliasing via function
//! calls.
//!
//! The optimizer is a post-order tree rewrite. It tracks known-constant
//! bindings in a scope chain parallel to the evaluator's own
//! [`crate::scope::Scope`] chain, plus a separate stack recording, per
//! function literal currently being analyzed, the names that function's
//! body may mutate — used to invalidate constants conservatively at call
//! sites instead of re-analyzing the callee's body each time.
//!
//! Any callable produced by something other than a direct named lookup or a
//! `fn`/`function`/`->` literal bound directly by `let`/`assign` defeats
//! this analysis entirely: such a call resets all tracked constants and its
//! subtree is left untouched, per the soundness note in the source design.

use crate::ast::{Literal, Node};
use crate::builtins::{fold_binary, is_foldable_operator};
use std::collections::{HashMap, HashSet};

#[derive(Clone)]
enum ConstFact {
    Literal(Literal),
    /// A tracked callable and the names it is known to mutate when called.
    Mutates(Vec<String>),
}

struct Optimizer {
    /// Scope chain of known facts, innermost frame last.
    const_stack: Vec<HashMap<String, ConstFact>>,
    /// One entry per function literal currently being analyzed, collecting
    /// the names assigned anywhere in its body.
    functions: Vec<HashSet<String>>,
}

fn is_fn_keyword(name: Option<&str>) -> bool {
    matches!(name, Some("fn") | Some("function") | Some("->"))
}

impl Optimizer {
    fn new() -> Self {
        Optimizer {
            const_stack: vec![HashMap::new()],
            functions: Vec::new(),
        }
    }

    fn push_scope(&mut self) {
        self.const_stack.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.const_stack.pop();
    }

    fn push_fn_scope(&mut self) {
        self.const_stack.push(HashMap::new());
        self.functions.push(HashSet::new());
    }

    fn pop_fn_scope(&mut self) -> Vec<String> {
        self.const_stack.pop();
        self.functions.pop().unwrap_or_default().into_iter().collect()
    }

    fn lookup(&self, name: &str) -> Option<ConstFact> {
        self.const_stack
            .iter()
            .rev()
            .find_map(|frame| frame.get(name).cloned())
    }

    /// Records that `name` was just (re)assigned, for whichever enclosing
    /// function literal's mutation set is being collected.
    fn record_mutation(&mut self, name: &str) {
        if let Some(top) = self.functions.last_mut() {
            top.insert(name.to_string());
        }
    }

    /// Removes any tracked fact for `name` across the whole chain, and
    /// records the mutation against the enclosing function being analyzed.
    fn remove_fact(&mut self, name: &str) {
        for frame in self.const_stack.iter_mut() {
            frame.remove(name);
        }
        self.record_mutation(name);
    }

    fn define_literal(&mut self, name: &str, value: Literal) {
        self.const_stack
            .last_mut()
            .expect("at least one frame")
            .insert(name.to_string(), ConstFact::Literal(value));
    }

    fn define_mutates(&mut self, name: &str, set: Vec<String>) {
        self.const_stack
            .last_mut()
            .expect("at least one frame")
            .insert(name.to_string(), ConstFact::Mutates(set));
    }

    /// Unions `new_set` into `name`'s previously tracked mutation set,
    /// `prior` being whatever was looked up *before* any `remove_fact`
    /// call for this same reassignment cleared it - the caller must capture
    /// that fact first, since by the time a new `fn` literal has been
    /// visited, the name's old fact is already gone from `const_stack`.
    fn union_mutates(&mut self, name: &str, prior: Option<Vec<String>>, new_set: Vec<String>) {
        let merged = match prior {
            Some(prev) => {
                let mut set: HashSet<String> = prev.into_iter().collect();
                set.extend(new_set);
                set.into_iter().collect()
            }
            None => new_set,
        };
        self.define_mutates(name, merged);
    }

    /// Invalidates every currently tracked constant, for a call through an
    /// indirect (non-`Word`) callable expression.
    fn invalidate_all(&mut self) {
        for frame in self.const_stack.iter_mut() {
            frame.clear();
        }
    }

    /// A call to a named, tracked callable invalidates the names it is
    /// known to mutate.
    fn invalidate_named_call(&mut self, name: &str) {
        if let Some(ConstFact::Mutates(mutated)) = self.lookup(name) {
            for victim in mutated {
                self.remove_fact(&victim);
            }
        }
    }

    fn visit(&mut self, node: &Node) -> Node {
        match node {
            Node::Value { .. } => node.clone(),
            Node::Word { name } => match self.lookup(name) {
                Some(ConstFact::Literal(value)) => Node::Value { value },
                _ => node.clone(),
            },
            Node::Call { operator, args } => self.visit_call(operator, args),
            Node::MethodCall { target, key, args } => Node::MethodCall {
                target: Box::new(self.visit(target)),
                key: key.clone(),
                args: args.iter().map(|a| self.visit(a)).collect(),
            },
        }
    }

    fn visit_call(&mut self, operator: &Node, args: &[Node]) -> Node {
        match operator.as_word() {
            Some("while") => self.visit_while(operator, args),
            Some("for") => self.visit_for(operator, args),
            Some("foreach") => self.visit_foreach(operator, args),
            Some("run") | Some("do") => self.visit_run(operator, args),
            Some("let") | Some("def") | Some(":=") => self.visit_let(operator, args),
            Some("assign") | Some("set") | Some("=") => self.visit_assign(operator, args),
            Some("object") => self.visit_object(operator, args),
            Some("fn") | Some("function") | Some("->") => {
                let (node, _mutation_set) = self.visit_fn_literal(operator, args);
                node
            }
            Some(op) if args.len() == 2 && is_foldable_operator(op) => {
                self.visit_foldable(operator, op, args)
            }
            Some(name) => {
                let new_args: Vec<Node> = args.iter().map(|a| self.visit(a)).collect();
                self.invalidate_named_call(name);
                Node::call(operator.clone(), new_args)
            }
            None => {
                self.invalidate_all();
                Node::call(operator.clone(), args.to_vec())
            }
        }
    }

    fn visit_foldable(&mut self, operator: &Node, op: &str, args: &[Node]) -> Node {
        let new_args: Vec<Node> = args.iter().map(|a| self.visit(a)).collect();
        if let [Node::Value { value: a }, Node::Value { value: b }] = new_args.as_slice() {
            if let Some(folded) = fold_binary(op, a, b) {
                return Node::Value { value: folded };
            }
        }
        Node::call(operator.clone(), new_args)
    }

    fn visit_fn_literal(&mut self, operator: &Node, args: &[Node]) -> (Node, Vec<String>) {
        self.push_fn_scope();
        let split_at = args.len().saturating_sub(1);
        let (params, body) = args.split_at(split_at);
        let new_body = body.first().map(|b| self.visit(b));
        let mutation_set = self.pop_fn_scope();

        let mut new_args: Vec<Node> = params.to_vec();
        if let Some(body) = new_body {
            new_args.push(body);
        }
        (Node::call(operator.clone(), new_args), mutation_set)
    }

    fn visit_while(&mut self, operator: &Node, args: &[Node]) -> Node {
        if args.len() != 2 {
            return Node::call(operator.clone(), args.iter().map(|a| self.visit(a)).collect());
        }
        self.push_scope();
        let cond = self.visit(&args[0]);
        let body = self.visit(&args[1]);
        self.pop_scope();
        Node::call(operator.clone(), vec![cond, body])
    }

    fn visit_for(&mut self, operator: &Node, args: &[Node]) -> Node {
        if args.len() != 4 {
            return Node::call(operator.clone(), args.iter().map(|a| self.visit(a)).collect());
        }
        self.push_scope();
        let init = self.visit(&args[0]);
        let cond = self.visit(&args[1]);
        self.push_scope();
        let body = self.visit(&args[3]);
        self.pop_scope();
        let update = self.visit(&args[2]);
        self.pop_scope();
        Node::call(operator.clone(), vec![init, cond, update, body])
    }

    fn visit_foreach(&mut self, operator: &Node, args: &[Node]) -> Node {
        if args.len() != 3 || args[0].as_word().is_none() {
            return Node::call(operator.clone(), args.iter().map(|a| self.visit(a)).collect());
        }
        let iterable = self.visit(&args[1]);
        self.push_scope();
        let body = self.visit(&args[2]);
        self.pop_scope();
        Node::call(operator.clone(), vec![args[0].clone(), iterable, body])
    }

    fn visit_run(&mut self, operator: &Node, args: &[Node]) -> Node {
        self.push_scope();
        let new_args: Vec<Node> = args.iter().map(|a| self.visit(a)).collect();
        self.pop_scope();
        Node::call(operator.clone(), new_args)
    }

    fn visit_object(&mut self, operator: &Node, args: &[Node]) -> Node {
        if args.len() % 2 != 0 {
            return Node::call(operator.clone(), args.iter().map(|a| self.visit(a)).collect());
        }
        self.push_scope();
        let new_args: Vec<Node> = args.iter().map(|a| self.visit(a)).collect();
        self.pop_scope();
        Node::call(operator.clone(), new_args)
    }

    fn visit_let(&mut self, operator: &Node, args: &[Node]) -> Node {
        if args.len() != 2 {
            let new_args: Vec<Node> = args.iter().map(|a| self.visit(a)).collect();
            return Node::call(operator.clone(), new_args);
        }
        let name = args[0].as_word();
        if let Some(name) = name {
            self.const_stack.last_mut().expect("at least one frame").remove(name);
        }

        let new_value = match &args[1] {
            Node::Call { operator: vop, args: fn_args } if is_fn_keyword(vop.as_word()) => {
                let (new_fn, mutation_set) = self.visit_fn_literal(vop, fn_args);
                if let Some(name) = name {
                    self.define_mutates(name, mutation_set);
                }
                new_fn
            }
            other => self.visit(other),
        };

        if let (Some(name), Node::Value { value }) = (name, &new_value) {
            self.define_literal(name, value.clone());
        }

        Node::call(operator.clone(), vec![args[0].clone(), new_value])
    }

    fn visit_assign(&mut self, operator: &Node, args: &[Node]) -> Node {
        if args.len() < 2 {
            let new_args: Vec<Node> = args.iter().map(|a| self.visit(a)).collect();
            return Node::call(operator.clone(), new_args);
        }
        let target = &args[0];
        let value_node = &args[args.len() - 1];
        let indices = &args[1..args.len() - 1];

        let name = target.as_word();
        // Capture the prior fact before `remove_fact` clears it, so a
        // reassignment to a new function literal can still union the old
        // mutation set in rather than silently overwriting it.
        let prior_mutates = name.and_then(|n| match self.lookup(n) {
            Some(ConstFact::Mutates(prev)) => Some(prev),
            _ => None,
        });
        if let Some(name) = name {
            self.remove_fact(name);
        }

        let new_indices: Vec<Node> = indices.iter().map(|a| self.visit(a)).collect();

        let new_value = match value_node {
            Node::Call { operator: vop, args: fn_args } if is_fn_keyword(vop.as_word()) => {
                let (new_fn, mutation_set) = self.visit_fn_literal(vop, fn_args);
                if let Some(name) = name {
                    self.union_mutates(name, prior_mutates, mutation_set);
                }
                new_fn
            }
            other => self.visit(other),
        };

        let mut new_args = vec![target.clone()];
        new_args.extend(new_indices);
        new_args.push(new_value);
        Node::call(operator.clone(), new_args)
    }
}

/// Optimizes a parsed AST, returning an equivalent tree with constants
/// folded and propagated where this can be done soundly.
pub fn optimize(node: &Node) -> Node {
    let mut optimizer = Optimizer::new();
    optimizer.visit(node)
}
