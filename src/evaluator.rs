//! Tree-walking evaluator: [`evaluate`] dispatches on [`Node`] shape,
//! consulting [`crate::builtins::is_keyword`] before evaluating a call's
//! operator so that special forms can receive their arguments unevaluated
//! (spec.md section 4.3).

use crate::ast::Node;
use crate::builtins::{eval_keyword, is_keyword};
use crate::error::LakError;
use crate::scope::Scope;
use crate::value::Value;
use std::rc::Rc;

pub fn evaluate(node: &Node, scope: &Rc<Scope>) -> Result<Value, LakError> {
    match node {
        Node::Value { value } => Ok(Value::from(value)),

        Node::Word { name } => scope
            .get(name)
            .ok_or_else(|| LakError::reference(format!("Undefined binding: {name}"))),

        Node::Call { operator, args } => {
            if let Some(name) = operator.as_word() {
                if is_keyword(name) {
                    return eval_keyword(name, args, scope);
                }
            }
            if let Some(method_call) = operator.desugar_dotted_call(args.clone()) {
                return evaluate(&method_call, scope);
            }
            let callee = evaluate(operator, scope)?;
            let evaluated_args = args
                .iter()
                .map(|a| evaluate(a, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call_value(&callee, evaluated_args)
        }

        Node::MethodCall { target, key, args } => {
            let receiver = evaluate(target, scope)?;
            let method = receiver.index_get(&Value::str(key.clone()))?;
            let evaluated_args = args
                .iter()
                .map(|a| evaluate(a, scope))
                .collect::<Result<Vec<_>, _>>()?;
            call_value(&method, evaluated_args)
        }
    }
}

/// Applies an already-evaluated callee to already-evaluated arguments.
/// Functions get a fresh child scope of their closed-over environment
/// (spec.md section 3: calling binds parameters in a new frame whose
/// parent is the function's defining scope, not the call site's scope).
pub fn call_value(callee: &Value, args: Vec<Value>) -> Result<Value, LakError> {
    match callee {
        Value::Builtin(f) => f(&args),
        Value::Function(f) => {
            if f.params.len() != args.len() {
                return Err(LakError::type_error(format!(
                    "function expects {} argument(s), got {}",
                    f.params.len(),
                    args.len()
                )));
            }
            let call_scope = Scope::child(&f.env);
            for (name, value) in f.params.iter().zip(args) {
                call_scope.define(name, value);
            }
            evaluate(&f.body, &call_scope)
        }
        other => Err(LakError::type_error(format!(
            "{} is not callable",
            other.type_name()
        ))),
    }
}
