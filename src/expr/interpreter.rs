//! Tree-walking evaluator for sequence expressions.
//!
//! Each generation step runs against a fresh [`Env`] holding `n` (the step
//! index), `sum` (a variadic builtin) and the history of values produced so
//! far. Element writes into `history` persist across steps; rebinding the
//! whole name only shadows it for the rest of the current step.

use std::collections::HashMap;

use super::parser::{BinOp, Expr};

/// Runtime value. Integer arithmetic stays integral until division, a float
/// operand, or overflow forces a promotion.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
  Int(i64),
  Float(f64),
  List(Vec<Value>),
  Builtin(Builtin),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
  Sum,
}

impl Value {
  fn as_f64(&self) -> Option<f64> {
    match self {
      Value::Int(v) => Some(*v as f64),
      Value::Float(v) => Some(*v),
      _ => None,
    }
  }

  /// JSON rendering for API responses. Non-finite floats and builtins have
  /// no JSON form and become null.
  pub fn to_json(&self) -> serde_json::Value {
    match self {
      Value::Int(v) => serde_json::Value::from(*v),
      Value::Float(v) => serde_json::Number::from_f64(*v)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null),
      Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
      Value::Builtin(_) => serde_json::Value::Null,
    }
  }
}

/// Evaluation environment for a single generation step.
pub struct Env {
  vars: HashMap<String, Value>,
  history: Vec<Value>,
}

impl Env {
  pub fn for_step(n: i64, history: Vec<Value>) -> Self {
    let mut vars = HashMap::new();
    vars.insert("n".to_string(), Value::Int(n));
    vars.insert("sum".to_string(), Value::Builtin(Builtin::Sum));
    Env { vars, history }
  }

  pub fn into_history(self) -> Vec<Value> {
    self.history
  }

  fn lookup(&self, name: &str) -> Value {
    if let Some(v) = self.vars.get(name) {
      return v.clone();
    }
    if name == "history" {
      return Value::List(self.history.clone());
    }
    // Unknown names read as 0 so partially written formulas still produce
    // something instead of failing.
    Value::Int(0)
  }
}

enum Place {
  Var(String),
  History,
  Temp(Vec<Value>),
}

/// Evaluate an expression tree against the environment.
pub fn evaluate(expr: &Expr, env: &mut Env) -> Result<Value, String> {
  match expr {
    Expr::Int(v) => Ok(Value::Int(*v)),
    Expr::Float(v) => Ok(Value::Float(*v)),
    Expr::Var(name) => Ok(env.lookup(name)),
    Expr::Array(elements) => {
      let mut items = Vec::with_capacity(elements.len());
      for element in elements {
        items.push(evaluate(element, env)?);
      }
      Ok(Value::List(items))
    }
    Expr::Bin { op, left, right } => {
      let left = evaluate(left, env)?;
      let right = evaluate(right, env)?;
      arith(*op, left, right)
    }
    Expr::Assign { name, value } => {
      let value = evaluate(value, env)?;
      env.vars.insert(name.clone(), value.clone());
      Ok(value)
    }
    Expr::Index { target, index } => {
      let items = match evaluate(target, env)? {
        Value::List(items) => items,
        _ => return Err("Tried indexing from a non list value".into()),
      };
      let idx = int_index(evaluate(index, env)?)?;
      Ok(match resolve_index(idx, items.len()) {
        Some(i) => items[i].clone(),
        None => Value::Int(0),
      })
    }
    Expr::SetIndex { target, index, value } => {
      // The write target is resolved as a place so that element writes into
      // named lists (history in particular) land in the environment rather
      // than in a clone. Writes into temporaries are evaluated and dropped.
      let mut place = match target.as_ref() {
        Expr::Var(name) => match env.vars.get(name) {
          Some(Value::List(_)) => Place::Var(name.clone()),
          Some(_) => return Err("Tried setting at index in a non list value".into()),
          None if name == "history" => Place::History,
          None => return Err("Tried setting at index in a non list value".into()),
        },
        other => match evaluate(other, env)? {
          Value::List(items) => Place::Temp(items),
          _ => return Err("Tried setting at index in a non list value".into()),
        },
      };
      let idx = int_index(evaluate(index, env)?)?;
      let new = evaluate(value, env)?;
      let items: &mut Vec<Value> = match place {
        Place::Var(ref name) => match env.vars.get_mut(name) {
          Some(Value::List(items)) => items,
          _ => return Err("Tried setting at index in a non list value".into()),
        },
        Place::History => &mut env.history,
        Place::Temp(ref mut items) => items,
      };
      match resolve_index(idx, items.len()) {
        Some(i) => {
          items[i] = new.clone();
          Ok(new)
        }
        None => Ok(Value::Int(0)),
      }
    }
    Expr::Call { callee, args } => {
      let callee = evaluate(callee, env)?;
      let builtin = match callee {
        Value::Builtin(builtin) => builtin,
        _ => return Err("Tried calling a non callable value".into()),
      };
      let mut values = Vec::with_capacity(args.len());
      for arg in args {
        values.push(evaluate(arg, env)?);
      }
      apply_builtin(builtin, values)
    }
  }
}

fn apply_builtin(builtin: Builtin, args: Vec<Value>) -> Result<Value, String> {
  match builtin {
    Builtin::Sum => {
      let mut acc = Value::Int(0);
      for arg in args {
        acc = arith(BinOp::Add, acc, arg)?;
      }
      Ok(acc)
    }
  }
}

fn int_index(idx: Value) -> Result<i64, String> {
  match idx {
    Value::Int(v) => Ok(v),
    _ => Err("List indices must be integers".into()),
  }
}

/// Negative indices count from the end, once. Anything still out of range
/// is None and reads as 0 / skips the write.
fn resolve_index(raw: i64, len: usize) -> Option<usize> {
  let len = len as i64;
  let idx = if raw < 0 { raw + len } else { raw };
  if idx >= 0 && idx < len {
    Some(idx as usize)
  } else {
    None
  }
}

fn arith(op: BinOp, left: Value, right: Value) -> Result<Value, String> {
  if let (Value::Int(a), Value::Int(b)) = (&left, &right) {
    return int_arith(op, *a, *b);
  }
  let (a, b) = match (left.as_f64(), right.as_f64()) {
    (Some(a), Some(b)) => (a, b),
    _ => return Err(format!("Unsupported operand types for '{}'", op.symbol())),
  };
  match op {
    BinOp::Add => Ok(Value::Float(a + b)),
    BinOp::Sub => Ok(Value::Float(a - b)),
    BinOp::Mul => Ok(Value::Float(a * b)),
    BinOp::Div => {
      if b == 0.0 {
        Err("Division by zero".into())
      } else {
        Ok(Value::Float(a / b))
      }
    }
    BinOp::Pow => {
      if a == 0.0 && b < 0.0 {
        Err("Zero cannot be raised to a negative power".into())
      } else {
        Ok(Value::Float(a.powf(b)))
      }
    }
  }
}

fn int_arith(op: BinOp, a: i64, b: i64) -> Result<Value, String> {
  // Integer results that overflow i64 spill into floats instead of failing.
  match op {
    BinOp::Add => Ok(match a.checked_add(b) {
      Some(v) => Value::Int(v),
      None => Value::Float(a as f64 + b as f64),
    }),
    BinOp::Sub => Ok(match a.checked_sub(b) {
      Some(v) => Value::Int(v),
      None => Value::Float(a as f64 - b as f64),
    }),
    BinOp::Mul => Ok(match a.checked_mul(b) {
      Some(v) => Value::Int(v),
      None => Value::Float(a as f64 * b as f64),
    }),
    BinOp::Div => {
      if b == 0 {
        Err("Division by zero".into())
      } else {
        // True division: 6/3 is 2.0, not 2.
        Ok(Value::Float(a as f64 / b as f64))
      }
    }
    BinOp::Pow => {
      if b < 0 {
        if a == 0 {
          return Err("Zero cannot be raised to a negative power".into());
        }
        return Ok(Value::Float((a as f64).powf(b as f64)));
      }
      match u32::try_from(b).ok().and_then(|e| a.checked_pow(e)) {
        Some(v) => Ok(Value::Int(v)),
        None => Ok(Value::Float((a as f64).powf(b as f64))),
      }
    }
  }
}
