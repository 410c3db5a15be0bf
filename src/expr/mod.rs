//! Expression engine for numeric sequences.
//!
//! A formula like `2*n+1` or `history[n-1]+history[n-2]` is scanned, parsed
//! and then evaluated once per step to extend a sequence. The seed supplies
//! the first values; generation starts at index `seed.len()`.

pub mod interpreter;
pub mod parser;
pub mod scanner;

pub use interpreter::Value;
pub use parser::Expr;

use interpreter::Env;

/// Scan and parse an expression without evaluating it.
pub fn compile(src: &str) -> Result<Expr, String> {
  parser::parse(&scanner::scan(src)?)
}

/// True when the expression scans and parses cleanly.
pub fn validate(src: &str) -> bool {
  compile(src).is_ok()
}

/// Generate the first `count` values of a sequence. The seed is returned
/// as-is (in full) when it already covers `count` values.
pub fn generate_values(expression: &str, seed: &[i64], count: usize) -> Result<Vec<Value>, String> {
  let tree = compile(expression)?;
  let mut history: Vec<Value> = seed.iter().map(|v| Value::Int(*v)).collect();
  for n in seed.len()..count {
    let mut env = Env::for_step(n as i64, std::mem::take(&mut history));
    let value = interpreter::evaluate(&tree, &mut env)?;
    history = env.into_history();
    history.push(value);
  }
  Ok(history)
}
