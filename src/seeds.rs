//! Seed data: the built-in sequence bank.

use crate::domain::{SequenceInfo, SequenceSource};

/// Minimal set of built-in sequences that guarantee the app is useful even
/// without external config. Formulas and fun facts are LaTeX fragments.
pub fn seed_sequences() -> Vec<SequenceInfo> {
  vec![
    SequenceInfo {
      text_id: "even".into(),
      name: "Even Numbers".into(),
      description: "Numbers divisible by two, climbing in steps of 2.".into(),
      formula: r"a_n = 2n".into(),
      expression: "2*n".into(),
      color: "#3b82f6".into(),
      fun_fact: r"2 + 4 + \dots + 2k = k(k+1)".into(),
      seed: vec![0],
      source: SequenceSource::Seed,
    },
    SequenceInfo {
      text_id: "odd".into(),
      name: "Odd Numbers".into(),
      description: "Every other number, starting from one.".into(),
      formula: r"a_n = 2n + 1".into(),
      expression: "2*n+1".into(),
      color: "#f59e0b".into(),
      fun_fact: r"1 + 3 + \dots + (2k-1) = k^2".into(),
      seed: vec![1],
      source: SequenceSource::Seed,
    },
    SequenceInfo {
      text_id: "fibonacci".into(),
      name: "Fibonacci".into(),
      description: "Each value is the sum of the two before it.".into(),
      formula: r"F_n = F_{n-1} + F_{n-2}".into(),
      expression: "history[n-1]+history[n-2]".into(),
      color: "#10b981".into(),
      fun_fact: r"F_{n+1}/F_n \to \varphi \approx 1.618".into(),
      seed: vec![0, 1],
      source: SequenceSource::Seed,
    },
    SequenceInfo {
      text_id: "squares".into(),
      name: "Perfect Squares".into(),
      description: "Numbers that are a whole number multiplied by itself.".into(),
      formula: r"a_n = n^2".into(),
      expression: "n^2".into(),
      color: "#8b5cf6".into(),
      fun_fact: r"n^2 = \sum_{i=1}^{n} (2i - 1)".into(),
      seed: vec![0],
      source: SequenceSource::Seed,
    },
    SequenceInfo {
      text_id: "powers-of-two".into(),
      name: "Powers of Two".into(),
      description: "Doubling from one, the backbone of binary.".into(),
      formula: r"a_n = 2^n".into(),
      expression: "2^n".into(),
      color: "#ef4444".into(),
      fun_fact: r"2^{10} = 1024 \approx 10^3".into(),
      seed: vec![1],
      source: SequenceSource::Seed,
    },
  ]
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::expr::{self, Value};

  #[test]
  fn every_builtin_generates_ten_values() {
    for s in seed_sequences() {
      let values = expr::generate_values(&s.expression, &s.seed, 10).expect("generate");
      assert_eq!(values.len(), 10, "sequence {}", s.text_id);
    }
  }

  #[test]
  fn builtin_runs_match_the_classics() {
    let by_id = |id: &str| {
      seed_sequences()
        .into_iter()
        .find(|s| s.text_id == id)
        .expect("builtin")
    };
    let run = |s: &SequenceInfo| expr::generate_values(&s.expression, &s.seed, 8).expect("generate");
    let ints = |values: &[i64]| values.iter().map(|v| Value::Int(*v)).collect::<Vec<_>>();

    assert_eq!(run(&by_id("even")), ints(&[0, 2, 4, 6, 8, 10, 12, 14]));
    assert_eq!(run(&by_id("odd")), ints(&[1, 3, 5, 7, 9, 11, 13, 15]));
    assert_eq!(run(&by_id("fibonacci")), ints(&[0, 1, 1, 2, 3, 5, 8, 13]));
    assert_eq!(run(&by_id("squares")), ints(&[0, 1, 4, 9, 16, 25, 36, 49]));
    assert_eq!(run(&by_id("powers-of-two")), ints(&[1, 2, 4, 8, 16, 32, 64, 128]));
  }
}
