//! The built-in registry: spec.md section 4.3's keyword table (special
//! forms receiving unevaluated argument nodes) and section 2's top-scope
//! functions/operators (ordinary callables receiving evaluated arguments).
//!
//! Keywords are dispatched by name from [`eval_keyword`] rather than
//! stored in a runtime map, since the set is fixed and each one needs a
//! distinct shape of access to the unevaluated [`Node`] arguments — but the
//! design follows spec.md section 9's suggested `{ Special, Plain }` split:
//! this module is the `Special` side, [`build_top_scope`] installs the
//! `Plain` side as ordinary [`Value::Builtin`]s.

use crate::ast::{Literal, Node};
use crate::error::LakError;
use crate::evaluator::evaluate;
use crate::scope::Scope;
use crate::value::{value_to_literal, ObjectData, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

/// Keywords in source text are shadowable by neither `let` nor `assign`:
/// the evaluator checks this list *before* evaluating a call's operator.
pub fn is_keyword(name: &str) -> bool {
    matches!(
        name,
        "if" | "while"
            | "for"
            | "foreach"
            | "run"
            | "do"
            | "let"
            | "def"
            | ":="
            | "fn"
            | "function"
            | "->"
            | "assign"
            | "set"
            | "="
            | "object"
    )
}

/// `true`/`false`/`undefined` are shadowable by neither `let` nor `assign`,
/// the same as keywords (spec.md section 4.3) - they're ordinary top-scope
/// bindings (see [`build_top_scope`]) rather than entries in [`is_keyword`]
/// since reading them is unremarkable, but rebinding them is rejected here.
fn is_reserved_value_name(name: &str) -> bool {
    matches!(name, "true" | "false" | "undefined")
}

/// The fixed binary-operator set the optimizer is allowed to constant-fold
/// (spec.md section 2, section 4.4 point 3).
pub fn is_foldable_operator(name: &str) -> bool {
    matches!(
        name,
        "+" | "-" | "*" | "/" | "==" | "!=" | "<" | ">" | "&&" | "||"
    )
}

pub fn eval_keyword(name: &str, args: &[Node], scope: &Rc<Scope>) -> Result<Value, LakError> {
    match name {
        "if" => eval_if(args, scope),
        "while" => eval_while(args, scope),
        "for" => eval_for(args, scope),
        "foreach" => eval_foreach(args, scope),
        "run" | "do" => eval_run(args, scope),
        "let" | "def" | ":=" => eval_let(args, scope),
        "fn" | "function" | "->" => eval_fn(args, scope),
        "assign" | "set" | "=" => eval_assign(args, scope),
        "object" => eval_object(args, scope),
        other => unreachable!("{other} is not a registered keyword"),
    }
}

fn eval_if(args: &[Node], scope: &Rc<Scope>) -> Result<Value, LakError> {
    if args.len() != 2 && args.len() != 3 {
        return Err(LakError::syntax(format!(
            "if expects 2 or 3 arguments, got {}",
            args.len()
        )));
    }
    let cond = evaluate(&args[0], scope)?;
    if cond.is_truthy() {
        evaluate(&args[1], scope)
    } else if args.len() == 3 {
        evaluate(&args[2], scope)
    } else {
        Ok(Value::Undefined)
    }
}

fn eval_while(args: &[Node], scope: &Rc<Scope>) -> Result<Value, LakError> {
    if args.len() != 2 {
        return Err(LakError::syntax(format!(
            "while expects 2 arguments, got {}",
            args.len()
        )));
    }
    let body_scope = Scope::child(scope);
    loop {
        let cond = evaluate(&args[0], &body_scope)?;
        if !cond.is_truthy() {
            break;
        }
        evaluate(&args[1], &body_scope)?;
    }
    Ok(Value::Undefined)
}

fn eval_for(args: &[Node], scope: &Rc<Scope>) -> Result<Value, LakError> {
    if args.len() != 4 {
        return Err(LakError::syntax(format!(
            "for expects 4 arguments, got {}",
            args.len()
        )));
    }
    let body_scope = Scope::child(scope);
    evaluate(&args[0], &body_scope)?; // init
    loop {
        let cond = evaluate(&args[1], &body_scope)?;
        if !cond.is_truthy() {
            break;
        }
        evaluate(&args[3], &body_scope)?; // body
        evaluate(&args[2], &body_scope)?; // update
    }
    Ok(Value::Undefined)
}

fn eval_foreach(args: &[Node], scope: &Rc<Scope>) -> Result<Value, LakError> {
    if args.len() != 3 {
        return Err(LakError::syntax(format!(
            "foreach expects 3 arguments, got {}",
            args.len()
        )));
    }
    let name = args[0]
        .as_word()
        .ok_or_else(|| LakError::syntax("foreach's first argument must be a word"))?;
    let iterable = evaluate(&args[1], scope)?;
    let items: Vec<Value> = match &iterable {
        Value::Array(items) => items.borrow().clone(),
        Value::Object(obj) => obj.fields.borrow().values().cloned().collect(),
        Value::Str(s) => s.chars().map(|c| Value::str(c.to_string())).collect(),
        other => {
            return Err(LakError::type_error(format!(
                "{} is not iterable",
                other.type_name()
            )));
        }
    };
    for item in items {
        let iter_scope = Scope::child(scope);
        iter_scope.define(name, item);
        evaluate(&args[2], &iter_scope)?;
    }
    Ok(Value::Undefined)
}

fn eval_run(args: &[Node], scope: &Rc<Scope>) -> Result<Value, LakError> {
    let body_scope = Scope::child(scope);
    let mut result = Value::Undefined;
    for arg in args {
        result = evaluate(arg, &body_scope)?;
    }
    Ok(result)
}

fn eval_let(args: &[Node], scope: &Rc<Scope>) -> Result<Value, LakError> {
    if args.len() != 2 {
        return Err(LakError::syntax(format!(
            "let expects 2 arguments, got {}",
            args.len()
        )));
    }
    let name = args[0]
        .as_word()
        .ok_or_else(|| LakError::syntax("let's first argument must be a word"))?;
    if is_reserved_value_name(name) {
        return Err(LakError::syntax(format!("cannot rebind reserved name: {name}")));
    }
    let value = evaluate(&args[1], scope)?;
    scope.define(name, value.clone());
    Ok(value)
}

fn eval_fn(args: &[Node], scope: &Rc<Scope>) -> Result<Value, LakError> {
    if args.is_empty() {
        return Err(LakError::syntax("fn expects at least a body"));
    }
    let (param_nodes, body) = args.split_at(args.len() - 1);
    let mut params = Vec::with_capacity(param_nodes.len());
    for node in param_nodes {
        let name = node
            .as_word()
            .ok_or_else(|| LakError::syntax("fn parameters must be words"))?;
        params.push(name.to_string());
    }
    Ok(Value::Function(Rc::new(crate::value::LakFn {
        params,
        body: body[0].clone(),
        env: Rc::clone(scope),
    })))
}

fn eval_assign(args: &[Node], scope: &Rc<Scope>) -> Result<Value, LakError> {
    if args.len() < 2 {
        return Err(LakError::syntax(format!(
            "assign expects at least 2 arguments, got {}",
            args.len()
        )));
    }
    let value_node = &args[args.len() - 1];
    let index_nodes = &args[1..args.len() - 1];

    // A dotted word (`o.bump`) lexes as one `Word`, not a `MethodCall` -
    // desugar it here the same way `evaluate`'s `Call` arm does, so
    // `assign(o.bump, v)` sets the field rather than looking up a binding
    // literally named `o.bump`.
    let desugared = args[0].desugar_dotted_call(Vec::new());
    let target = desugared.as_ref().unwrap_or(&args[0]);

    match target {
        Node::Word { name } if index_nodes.is_empty() => {
            if is_reserved_value_name(name) {
                return Err(LakError::syntax(format!(
                    "cannot rebind reserved name: {name}"
                )));
            }
            let value = evaluate(value_node, scope)?;
            if scope.assign(name, value.clone()) {
                Ok(value)
            } else {
                Err(LakError::reference(format!("Undefined binding: {name}")))
            }
        }
        Node::Word { name } => {
            let container = scope
                .get(name)
                .ok_or_else(|| LakError::reference(format!("Undefined binding: {name}")))?;
            let indices = eval_all(index_nodes, scope)?;
            let value = evaluate(value_node, scope)?;
            assign_indexed(&container, &indices, value)
        }
        Node::MethodCall {
            target: inner, key, ..
        } => {
            let container = evaluate(inner, scope)?;
            let value = evaluate(value_node, scope)?;
            container.index_set(&Value::str(key.clone()), value)
        }
        Node::Call { operator, args: call_args }
            if operator.as_word() == Some("element") && call_args.len() == 2 =>
        {
            let container = evaluate(&call_args[0], scope)?;
            let index = evaluate(&call_args[1], scope)?;
            let value = evaluate(value_node, scope)?;
            container.index_set(&index, value)
        }
        _ => Err(LakError::syntax(
            "assign's first argument must be a word or an indexed reference",
        )),
    }
}

fn eval_all(nodes: &[Node], scope: &Rc<Scope>) -> Result<Vec<Value>, LakError> {
    nodes.iter().map(|n| evaluate(n, scope)).collect()
}

fn assign_indexed(container: &Value, indices: &[Value], value: Value) -> Result<Value, LakError> {
    if indices.len() == 1 {
        container.index_set(&indices[0], value)
    } else {
        let inner = container.index_get(&indices[0])?;
        assign_indexed(&inner, &indices[1..], value)
    }
}

fn eval_object(args: &[Node], scope: &Rc<Scope>) -> Result<Value, LakError> {
    if args.len() % 2 != 0 {
        return Err(LakError::syntax(format!(
            "object expects an even number of arguments, got {}",
            args.len()
        )));
    }
    let env = Scope::child(scope);
    let data = Rc::new(ObjectData {
        env: Rc::clone(&env),
        fields: RefCell::new(HashMap::new()),
    });
    env.define("self", Value::Object(Rc::clone(&data)));

    for pair in args.chunks(2) {
        let key = evaluate(&pair[0], &env)?;
        let key = key.as_str()?.to_string();
        let value = evaluate(&pair[1], &env)?;
        data.fields.borrow_mut().insert(key, value);
    }

    Ok(Value::Object(data))
}

/// Applies one of the fixed binary operators (spec.md section 2) to
/// already-evaluated values. Shared by the top-scope builtins below and by
/// [`crate::optimizer`]'s constant folding, so both agree on semantics.
pub fn apply_operator(op: &str, args: &[Value]) -> Result<Value, LakError> {
    let arity_error = || {
        LakError::type_error(format!(
            "operator '{op}' expects 2 arguments, got {}",
            args.len()
        ))
    };
    match op {
        "+" => {
            if args.len() != 2 {
                return Err(arity_error());
            }
            Ok(Value::Number(args[0].as_number()? + args[1].as_number()?))
        }
        "-" => {
            if args.len() != 2 {
                return Err(arity_error());
            }
            Ok(Value::Number(args[0].as_number()? - args[1].as_number()?))
        }
        "*" => {
            if args.len() != 2 {
                return Err(arity_error());
            }
            Ok(Value::Number(args[0].as_number()? * args[1].as_number()?))
        }
        "/" => {
            if args.len() != 2 {
                return Err(arity_error());
            }
            Ok(Value::Number(args[0].as_number()? / args[1].as_number()?))
        }
        "==" => {
            if args.len() != 2 {
                return Err(arity_error());
            }
            Ok(Value::Bool(args[0] == args[1]))
        }
        "!=" => {
            if args.len() != 2 {
                return Err(arity_error());
            }
            Ok(Value::Bool(args[0] != args[1]))
        }
        "<" => {
            if args.len() != 2 {
                return Err(arity_error());
            }
            Ok(Value::Bool(args[0].as_number()? < args[1].as_number()?))
        }
        ">" => {
            if args.len() != 2 {
                return Err(arity_error());
            }
            Ok(Value::Bool(args[0].as_number()? > args[1].as_number()?))
        }
        "&&" => {
            if args.len() != 2 {
                return Err(arity_error());
            }
            Ok(Value::Bool(args[0].is_truthy() && args[1].is_truthy()))
        }
        "||" => {
            if args.len() != 2 {
                return Err(arity_error());
            }
            Ok(Value::Bool(args[0].is_truthy() || args[1].is_truthy()))
        }
        other => Err(LakError::reference(format!("Undefined binding: {other}"))),
    }
}

/// Folds a binary operator applied to two literals, for
/// [`crate::optimizer`]. Returns `None` for operators outside the fixed
/// foldable set, or results with no literal representation.
pub fn fold_binary(op: &str, a: &Literal, b: &Literal) -> Option<Literal> {
    if !is_foldable_operator(op) {
        return None;
    }
    let values = [Value::from(a), Value::from(b)];
    let result = apply_operator(op, &values).ok()?;
    value_to_literal(&result)
}

fn arr(args: &[Value]) -> Result<Value, LakError> {
    Ok(Value::array(args.to_vec()))
}

fn length(args: &[Value]) -> Result<Value, LakError> {
    if args.len() != 1 {
        return Err(LakError::type_error(format!(
            "length expects 1 argument, got {}",
            args.len()
        )));
    }
    let n = match &args[0] {
        Value::Array(items) => items.borrow().len(),
        Value::Str(s) => s.chars().count(),
        Value::Object(obj) => obj.fields.borrow().len(),
        other => {
            return Err(LakError::type_error(format!(
                "{} has no length",
                other.type_name()
            )));
        }
    };
    Ok(Value::Number(n as f64))
}

fn element(args: &[Value]) -> Result<Value, LakError> {
    if args.len() != 2 {
        return Err(LakError::type_error(format!(
            "element expects 2 arguments, got {}",
            args.len()
        )));
    }
    args[0].index_get(&args[1])
}

fn keys(args: &[Value]) -> Result<Value, LakError> {
    if args.len() != 1 {
        return Err(LakError::type_error(format!(
            "keys expects 1 argument, got {}",
            args.len()
        )));
    }
    match &args[0] {
        Value::Object(obj) => Ok(Value::array(
            obj.fields.borrow().keys().map(|k| Value::str(k.clone())).collect(),
        )),
        other => Err(LakError::type_error(format!(
            "{} has no keys",
            other.type_name()
        ))),
    }
}

fn has(args: &[Value]) -> Result<Value, LakError> {
    if args.len() != 2 {
        return Err(LakError::type_error(format!(
            "has expects 2 arguments, got {}",
            args.len()
        )));
    }
    match &args[0] {
        Value::Object(obj) => {
            let key = args[1].as_str()?;
            Ok(Value::Bool(obj.fields.borrow().contains_key(key)))
        }
        Value::Array(items) => Ok(Value::Bool(items.borrow().contains(&args[1]))),
        other => Err(LakError::type_error(format!(
            "{} does not support membership checks",
            other.type_name()
        ))),
    }
}

fn map_hash(args: &[Value]) -> Result<Value, LakError> {
    if args.len() % 2 != 0 {
        return Err(LakError::type_error(format!(
            "map expects an even number of arguments, got {}",
            args.len()
        )));
    }
    let env = Scope::root();
    let data = Rc::new(ObjectData {
        env: Rc::clone(&env),
        fields: RefCell::new(HashMap::new()),
    });
    env.define("self", Value::Object(Rc::clone(&data)));
    for pair in args.chunks(2) {
        let key = pair[0].as_str()?.to_string();
        data.fields.borrow_mut().insert(key, pair[1].clone());
    }
    Ok(Value::Object(data))
}

/// Builds the top scope (spec.md section 3: "the outermost frame populated
/// with built-ins"), writing `println`'s output to `out`.
pub fn build_top_scope(out: Rc<RefCell<dyn Write>>) -> Rc<Scope> {
    let scope = Scope::root();

    for op in ["+", "-", "*", "/", "==", "!=", "<", ">", "&&", "||"] {
        let name = op.to_string();
        let builtin: Rc<crate::value::BuiltinFn> =
            Rc::new(move |args: &[Value]| apply_operator(&name, args));
        scope.define(op, Value::Builtin(builtin));
    }

    scope.define("arr", Value::Builtin(Rc::new(arr)));
    scope.define("array", Value::Builtin(Rc::new(arr)));
    scope.define("len", Value::Builtin(Rc::new(length)));
    scope.define("length", Value::Builtin(Rc::new(length)));
    scope.define("element", Value::Builtin(Rc::new(element)));
    scope.define("map", Value::Builtin(Rc::new(map_hash)));
    scope.define("hash", Value::Builtin(Rc::new(map_hash)));
    scope.define("keys", Value::Builtin(Rc::new(keys)));
    scope.define("has", Value::Builtin(Rc::new(has)));

    let println_builtin: Rc<crate::value::BuiltinFn> = Rc::new(move |args: &[Value]| {
        let line = args
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out.borrow_mut(), "{line}")
            .map_err(|e| LakError::type_error(format!("write failed: {e}")))?;
        Ok(Value::array(args.to_vec()))
    });
    scope.define("println", Value::Builtin(println_builtin));

    scope.define("true", Value::Bool(true));
    scope.define("false", Value::Bool(false));
    scope.define("undefined", Value::Undefined);

    scope
}
