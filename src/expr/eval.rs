//! Tree-walking evaluator for a compiled [`super::ast::Ast`].

use super::ast::{Ast, BinOp, UnOp};
use crate::error::EvalError;
use crate::value::Value;

/// The binding context a matcher is evaluated against: resolves dotted
/// identifiers (`r.sub`, `p.obj`, …) to runtime values, and dispatches
/// function calls. A call whose name matches a registered grouping type is
/// expected to be answered by the caller's role manager rather than the
/// ordinary function table — that interception happens inside the
/// `call_function` implementation the enforcer supplies, not in this
/// module, which only knows how to walk the tree.
pub trait Environment {
    fn resolve(&self, ident: &str) -> Value;
    fn call_function(&self, name: &str, args: Vec<Value>) -> Result<Value, EvalError>;
}

pub fn eval(ast: &Ast, env: &dyn Environment) -> Result<Value, EvalError> {
    match ast {
        Ast::Nil => Ok(Value::Nil),
        Ast::Bool(b) => Ok(Value::Bool(*b)),
        Ast::Int(i) => Ok(Value::Int(*i)),
        Ast::Float(f) => Ok(Value::Float(*f)),
        Ast::Str(s) => Ok(Value::Str(s.clone())),
        Ast::Ident(path) => Ok(resolve_dotted(path, env)),

        Ast::Unary(UnOp::Not, inner) => {
            let v = eval(inner, env)?;
            Ok(Value::Bool(!v.is_truthy()))
        }
        Ast::Unary(UnOp::Neg, inner) => {
            let v = eval(inner, env)?;
            match v {
                Value::Int(i) => Ok(Value::Int(-i)),
                Value::Float(f) => Ok(Value::Float(-f)),
                other => Err(EvalError::TypeError(format!(
                    "cannot negate {other:?}"
                ))),
            }
        }

        Ast::Binary(BinOp::Or, l, r) => {
            let left = eval(l, env)?;
            if left.is_truthy() {
                return Ok(Value::Bool(true));
            }
            let right = eval(r, env)?;
            Ok(Value::Bool(right.is_truthy()))
        }
        Ast::Binary(BinOp::And, l, r) => {
            let left = eval(l, env)?;
            if !left.is_truthy() {
                return Ok(Value::Bool(false));
            }
            let right = eval(r, env)?;
            Ok(Value::Bool(right.is_truthy()))
        }
        Ast::Binary(BinOp::Eq, l, r) => {
            let (left, right) = (eval(l, env)?, eval(r, env)?);
            Ok(Value::Bool(left.loose_eq(&right)))
        }
        Ast::Binary(BinOp::Ne, l, r) => {
            let (left, right) = (eval(l, env)?, eval(r, env)?);
            Ok(Value::Bool(!left.loose_eq(&right)))
        }
        Ast::Binary(op @ (BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge), l, r) => {
            let (left, right) = (eval(l, env)?, eval(r, env)?);
            Ok(Value::Bool(compare(&left, &right, *op)))
        }
        Ast::Binary(op @ (BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod), l, r) => {
            let (left, right) = (eval(l, env)?, eval(r, env)?);
            arithmetic(&left, &right, *op)
        }

        Ast::Ternary(cond, then_branch, else_branch) => {
            if eval(cond, env)?.is_truthy() {
                eval(then_branch, env)
            } else {
                eval(else_branch, env)
            }
        }

        Ast::In(l, r) => {
            let (left, right) = (eval(l, env)?, eval(r, env)?);
            Ok(eval_in(&left, &right))
        }

        Ast::Call(name, arg_exprs) => {
            let mut args = Vec::with_capacity(arg_exprs.len());
            for a in arg_exprs {
                args.push(eval(a, env)?);
            }
            env.call_function(name, args)
        }
    }
}

/// Dotted access: `r.sub.Owner` resolves `r.sub` via the environment, then
/// walks remaining segments as `Bag` field lookups, each returning `Nil` on
/// a missing key rather than erroring.
fn resolve_dotted(path: &str, env: &dyn Environment) -> Value {
    let mut parts = path.splitn(2, '.');
    let Some(root_field) = parts.next() else {
        return Value::Nil;
    };
    let rest = parts.next();

    // `r` and `p` roots are two segments deep at minimum (`r.sub`); ask the
    // environment for the full `r.sub`-shaped key, then walk any further
    // dotted segments as bag access.
    let Some(rest) = rest else {
        return env.resolve(root_field);
    };

    let mut segments = rest.split('.');
    let Some(field_name) = segments.next() else {
        return Value::Nil;
    };
    let base_key = format!("{root_field}.{field_name}");
    let mut value = env.resolve(&base_key);
    for seg in segments {
        value = value.get_field(seg);
    }
    value
}

fn compare(left: &Value, right: &Value, op: BinOp) -> bool {
    let ordering = match (left.as_f64(), right.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b),
        _ => left
            .as_display_string()
            .partial_cmp(&right.as_display_string()),
    };
    let Some(ordering) = ordering else { return false };
    match op {
        BinOp::Lt => ordering.is_lt(),
        BinOp::Le => ordering.is_le(),
        BinOp::Gt => ordering.is_gt(),
        BinOp::Ge => ordering.is_ge(),
        _ => unreachable!(),
    }
}

fn arithmetic(left: &Value, right: &Value, op: BinOp) -> Result<Value, EvalError> {
    if op == BinOp::Add {
        if let (Value::Str(a), b) = (left, right) {
            if !matches!(b, Value::Int(_) | Value::Float(_)) {
                return Ok(Value::Str(format!("{a}{b}")));
            }
        }
    }

    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return Err(EvalError::TypeError(format!(
            "arithmetic requires numeric operands, got {left:?} and {right:?}"
        )));
    };

    let both_int = matches!(left, Value::Int(_)) && matches!(right, Value::Int(_));

    let result = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
        BinOp::Mod => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a % b
        }
        _ => unreachable!(),
    };

    if both_int {
        Ok(Value::Int(result as i64))
    } else {
        Ok(Value::Float(result))
    }
}

/// `in` treats a `Bag` right-hand side as a set of values and a `Str`
/// right-hand side as a comma-separated pseudo-list, since the runtime
/// value model has no dedicated array variant.
fn eval_in(left: &Value, right: &Value) -> Value {
    match right {
        Value::Bag(map) => Value::Bool(map.values().any(|v| v.loose_eq(left))),
        Value::Str(s) => {
            let needle = left.as_display_string();
            Value::Bool(s.split(',').map(str::trim).any(|item| item == needle))
        }
        _ => Value::Bool(false),
    }
}
