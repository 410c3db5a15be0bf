//! Fill-in-the-blank rounds over generated sequence values.
//!
//! A round hides 3-4 of the values behind blanks; the player fills them in
//! and checks the whole round at once. Checking rebuilds the feedback map
//! and bumps the attempt counter; editing a blank clears its feedback until
//! the next check.

use std::collections::HashMap;

use rand::seq::SliceRandom;
use rand::Rng;

/// Values requested per round.
pub const ROUND_LEN: usize = 10;

/// One tile in a round. Blank tiles hide their value until checked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot {
  pub value: i64,
  pub is_blank: bool,
  pub index: usize,
}

/// Parsed user input for a blank. Anything that is not a whole number is
/// kept as `Invalid` and can never match.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Answer {
  Value(i64),
  Invalid,
}

pub fn parse_answer(input: &str) -> Answer {
  match input.trim().parse::<i64>() {
    Ok(v) => Answer::Value(v),
    Err(_) => Answer::Invalid,
  }
}

/// A single fill-in-the-blank round.
#[derive(Clone, Debug, Default)]
pub struct Round {
  pub slots: Vec<Slot>,
  pub attempts: u32,
  answers: HashMap<usize, Answer>,
  feedback: HashMap<usize, bool>,
}

impl Round {
  pub fn new(values: &[i64], blank_positions: &[usize]) -> Round {
    let slots = values
      .iter()
      .enumerate()
      .map(|(index, value)| Slot {
        value: *value,
        is_blank: blank_positions.contains(&index),
        index,
      })
      .collect();
    Round { slots, attempts: 0, answers: HashMap::new(), feedback: HashMap::new() }
  }

  /// Indices of the blank tiles, in display order.
  pub fn blank_indices(&self) -> Vec<usize> {
    self.slots.iter().filter(|s| s.is_blank).map(|s| s.index).collect()
  }

  /// Store an answer and clear any feedback for that tile.
  pub fn record_answer(&mut self, index: usize, answer: Answer) {
    self.answers.insert(index, answer);
    self.feedback.remove(&index);
  }

  /// Grade every blank against the stored answers. Missing and invalid
  /// answers grade as wrong.
  pub fn check_answers(&mut self) {
    let mut feedback = HashMap::new();
    for slot in self.slots.iter().filter(|s| s.is_blank) {
      let correct = matches!(self.answers.get(&slot.index), Some(Answer::Value(v)) if *v == slot.value);
      feedback.insert(slot.index, correct);
    }
    self.feedback = feedback;
    self.attempts += 1;
  }

  /// The stored answer for a tile, if any.
  pub fn answer(&self, index: usize) -> Option<Answer> {
    self.answers.get(&index).copied()
  }

  /// Grading for one tile; None until checked (or after an edit).
  pub fn feedback(&self, index: usize) -> Option<bool> {
    self.feedback.get(&index).copied()
  }

  /// True when every blank has been graded correct. A round with no blanks
  /// is trivially solved.
  pub fn all_correct(&self) -> bool {
    self
      .slots
      .iter()
      .filter(|s| s.is_blank)
      .all(|s| self.feedback.get(&s.index) == Some(&true))
  }
}

/// Build a round from generated values: 3-4 blanks, clamped to the number
/// of tiles so short (or empty) sequences still produce a finished round.
pub fn build_round<R: Rng + ?Sized>(values: &[i64], rng: &mut R) -> Round {
  let blanks = pick_blank_positions(rng, values.len());
  Round::new(values, &blanks)
}

fn pick_blank_positions<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Vec<usize> {
  let target = rng.gen_range(3..5);
  let k = target.min(len);
  let mut indices: Vec<usize> = (0..len).collect();
  let (picked, _) = indices.partial_shuffle(rng, k);
  picked.to_vec()
}

/// Tracks the active round across regenerations. A generation result is
/// only installed when its ticket matches the current epoch, so a slow
/// response for a previous selection cannot clobber the round the player
/// is actually in.
#[derive(Debug, Default)]
pub struct GameSession {
  epoch: u64,
  round: Option<Round>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundTicket(u64);

impl GameSession {
  /// Start a new round: invalidates outstanding tickets and clears the
  /// current round until the fresh values arrive.
  pub fn begin_round(&mut self) -> RoundTicket {
    self.epoch += 1;
    self.round = None;
    RoundTicket(self.epoch)
  }

  /// Install a finished round; false (and dropped) when the ticket is stale.
  pub fn complete_round(&mut self, ticket: RoundTicket, round: Round) -> bool {
    if ticket.0 != self.epoch {
      return false;
    }
    self.round = Some(round);
    true
  }

  pub fn round(&self) -> Option<&Round> {
    self.round.as_ref()
  }

  pub fn round_mut(&mut self) -> Option<&mut Round> {
    self.round.as_mut()
  }
}
