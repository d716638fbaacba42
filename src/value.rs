//! Run-time value universe for the evaluator, and the reference types
//! (arrays, objects, closures) that can never appear as a parsed
//! [`crate::ast::Literal`].

use crate::ast::{Literal, Node};
use crate::error::LakError;
use crate::scope::Scope;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A callable built-in. Boxed behind `Rc<dyn Fn>` rather than a bare `fn`
/// pointer so built-ins like `println` can close over a shared output sink
/// instead of always writing to process stdout (see [`crate::builtins`]).
pub type BuiltinFn = dyn Fn(&[Value]) -> Result<Value, LakError>;

/// A user-defined function: parameter names, an unevaluated body, and the
/// scope it closed over at the `fn`/`function`/`->` site (not the call
/// site) — this is what gives closures their lexical semantics.
pub struct LakFn {
    pub params: Vec<String>,
    pub body: Node,
    pub env: Rc<Scope>,
}

/// An object: a dedicated environment frame binding `self` to the object,
/// plus the field map itself. Methods are ordinary [`Value::Function`]s
/// stored as fields, closing over `env` so `self` is visible inside them;
/// fields are *not* mirrored into `env`'s bindings, so sibling fields are
/// reached through indexing (`element(self, "other")`), never as bare
/// names (spec.md section 3 "Object", section 9 open question (b)).
pub struct ObjectData {
    pub env: Rc<Scope>,
    pub fields: RefCell<HashMap<String, Value>>,
}

#[derive(Clone)]
pub enum Value {
    Number(f64),
    Str(Rc<str>),
    Bool(bool),
    Undefined,
    Array(Rc<RefCell<Vec<Value>>>),
    Object(Rc<ObjectData>),
    Function(Rc<LakFn>),
    Builtin(Rc<BuiltinFn>),
}

impl Value {
    pub fn str(s: impl Into<Rc<str>>) -> Value {
        Value::Str(s.into())
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// Only `Bool(false)` is falsy (spec.md section 4.3's `if`: "if not
    /// literal `false`"). `0`, `""` and `undefined` are all truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Bool(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Str(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Undefined => "undefined",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Builtin(_) => "builtin",
        }
    }

    pub fn as_number(&self) -> Result<f64, LakError> {
        match self {
            Value::Number(n) => Ok(*n),
            other => Err(LakError::type_error(format!(
                "expected a number, found {}",
                other.type_name()
            ))),
        }
    }

    pub fn as_str(&self) -> Result<&str, LakError> {
        match self {
            Value::Str(s) => Ok(s),
            other => Err(LakError::type_error(format!(
                "expected a string, found {}",
                other.type_name()
            ))),
        }
    }

    /// Indexed read: `element(container, index)`. Arrays index by number,
    /// objects by string key (missing keys read as `undefined`, matching
    /// the object literal's permissive field access).
    pub fn index_get(&self, index: &Value) -> Result<Value, LakError> {
        match self {
            Value::Array(items) => {
                let idx = array_index(index, items.borrow().len())?;
                Ok(items.borrow()[idx].clone())
            }
            Value::Object(obj) => {
                let key = index.as_str()?;
                Ok(obj.fields.borrow().get(key).cloned().unwrap_or(Value::Undefined))
            }
            Value::Str(s) => {
                let idx = array_index(index, s.chars().count())?;
                let ch = s.chars().nth(idx).expect("bounds checked above");
                Ok(Value::str(ch.to_string()))
            }
            other => Err(LakError::type_error(format!(
                "{} does not support indexing",
                other.type_name()
            ))),
        }
    }

    /// Indexed write, spec.md section 9 open question (a): modeled as
    /// `container['='](value, index)` at the value level, rejected on
    /// values with no indexed-assign operation.
    pub fn index_set(&self, index: &Value, value: Value) -> Result<Value, LakError> {
        match self {
            Value::Array(items) => {
                let mut items = items.borrow_mut();
                let idx = match index.as_number()? as i64 {
                    n if n >= 0 && (n as usize) < items.len() => n as usize,
                    n if n >= 0 && (n as usize) == items.len() => {
                        items.push(value.clone());
                        return Ok(value);
                    }
                    n => {
                        return Err(LakError::type_error(format!(
                            "array index {} out of bounds (length {})",
                            n,
                            items.len()
                        )));
                    }
                };
                items[idx] = value.clone();
                Ok(value)
            }
            Value::Object(obj) => {
                let key = index.as_str()?;
                obj.fields.borrow_mut().insert(key.to_string(), value.clone());
                Ok(value)
            }
            other => Err(LakError::type_error(format!(
                "{} does not support indexed assignment",
                other.type_name()
            ))),
        }
    }
}

impl From<&Literal> for Value {
    fn from(literal: &Literal) -> Value {
        match literal {
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::str(s.clone()),
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Undefined => Value::Undefined,
        }
    }
}

/// The inverse of [`From<&Literal>`], used by the optimizer to turn a
/// folded/propagated run-time value back into an AST literal. `None` for
/// any value with no literal representation (arrays, objects, closures) —
/// those can never legally result from folding the fixed operator set.
pub fn value_to_literal(value: &Value) -> Option<Literal> {
    match value {
        Value::Number(n) => Some(Literal::Number(*n)),
        Value::Str(s) => Some(Literal::String(s.to_string())),
        Value::Bool(b) => Some(Literal::Bool(*b)),
        Value::Undefined => Some(Literal::Undefined),
        _ => None,
    }
}

fn array_index(index: &Value, len: usize) -> Result<usize, LakError> {
    let n = index.as_number()?;
    if n < 0.0 || n.fract() != 0.0 || (n as usize) >= len {
        return Err(LakError::type_error(format!(
            "index {} out of bounds (length {})",
            n, len
        )));
    }
    Ok(n as usize)
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Undefined, Value::Undefined) => true,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::Str(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Undefined => write!(f, "undefined"),
            Value::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Object(_) => write!(f, "<object>"),
            Value::Function(_) => write!(f, "<function>"),
            Value::Builtin(_) => write!(f, "<builtin>"),
        }
    }
}
