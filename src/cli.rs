//! Terminal client commands: learn, play, admin editing, validation.
//!
//! Every command talks to a running `seqdrill serve` instance over HTTP
//! (`SEQDRILL_API`, default localhost:3000). Failures surface as plain
//! messages or empty listings, never stack traces; the play loop keeps
//! running on bad input.

use std::io::{self, Write as _};

use clap::{Parser, Subcommand};
use rand::thread_rng;
use tracing::warn;

use crate::auth::password_digest;
use crate::client::api::ApiClient;
use crate::client::catalog::{load_catalog, Catalog};
use crate::client::session::{default_token_path, AdminSession};
use crate::game::{self, Answer, GameSession, Round, ROUND_LEN};
use crate::protocol::{SequenceCreateIn, SequenceOut, SequenceUpdateIn};
use crate::util::parse_seed_list;

#[derive(Parser)]
#[command(name = "seqdrill", version)]
#[command(about = "Numeric sequence trainer: serve the API, study sequences, drill the blanks.")]
pub struct Cli {
  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
  /// Run the HTTP API server
  Serve {
    /// Listen port (overrides PORT and the config file)
    #[arg(short, long)]
    port: Option<u16>,
  },
  /// Show a sequence: metadata, formula and a generated example run
  Learn {
    /// Sequence id; defaults to the first in the catalog
    sequence: Option<String>,
  },
  /// Fill-in-the-blank rounds against generated values
  Play {
    /// Sequence id; defaults to the first in the catalog
    sequence: Option<String>,
  },
  /// Manage sequences on the server (requires login)
  Admin {
    #[command(subcommand)]
    command: AdminCommands,
  },
  /// Ask the server whether an expression parses
  Validate {
    /// Expression, e.g. "2*n+1" or "history[n-1]+history[n-2]"
    expression: String,
  },
}

#[derive(Subcommand)]
pub enum AdminCommands {
  /// Log in and store the admin token
  Login,
  /// Forget the stored admin token
  Logout,
  /// List sequence ids on the server
  List,
  /// Create a sequence, prompting for each field
  Create,
  /// Edit an existing sequence, prompting per field (Enter keeps the value)
  Edit {
    /// Sequence id to edit
    id: String,
  },
  /// Delete a sequence
  Delete {
    /// Sequence id to delete
    id: String,
    /// Skip the confirmation prompt
    #[arg(short = 'y', long)]
    yes: bool,
  },
  /// Print the SHA-256 hex digest of a password (for the server config)
  Digest {
    /// Password to digest; prompted for when omitted
    password: Option<String>,
  },
}

/// Base URL the client commands talk to.
fn api_base() -> String {
  match std::env::var("SEQDRILL_API") {
    Ok(v) if !v.is_empty() => v,
    _ => "http://127.0.0.1:3000".to_string(),
  }
}

//
// learn
//

pub async fn run_learn(sequence: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
  let api = ApiClient::new(&api_base())?;
  let catalog = load_catalog(&api).await;
  let Some(seq) = pick_sequence(&api, &catalog, sequence.as_deref()) else {
    return Ok(());
  };
  if sequence.is_none() {
    println!("Sequences:");
    print_catalog(&catalog);
    println!();
  }

  println!("{}  [{}]", seq.name, seq.text_id);
  if !seq.description.is_empty() {
    println!("  {}", seq.description);
  }
  if !seq.formula.is_empty() {
    println!("  formula:    {}", seq.formula);
  }
  println!("  expression: {}", seq.expression);

  let values = generate_values(&api, &seq.text_id, ROUND_LEN as u32).await;
  if values.is_empty() {
    println!("  (no values: generation failed)");
  } else {
    let rendered: Vec<String> = values.iter().map(|v| v.to_string()).collect();
    println!("  first {}:   {}", values.len(), rendered.join(", "));
  }
  if !seq.fun_fact.is_empty() {
    println!();
    println!("  {}", seq.fun_fact);
  }
  Ok(())
}

/// Resolve the sequence to work with: the requested id, else the catalog
/// default. Prints guidance and returns None when nothing is usable.
fn pick_sequence<'a>(
  api: &ApiClient,
  catalog: &'a Catalog,
  requested: Option<&str>,
) -> Option<&'a SequenceOut> {
  if catalog.is_empty() {
    println!("No sequences available. Is the server running at {}?", api.base_url);
    return None;
  }
  match requested {
    Some(id) => match catalog.get(id) {
      Some(seq) => Some(seq),
      None => {
        println!("Unknown sequence '{}'. Available:", id);
        print_catalog(catalog);
        None
      }
    },
    None => catalog.default_sequence(),
  }
}

fn print_catalog(catalog: &Catalog) {
  for seq in &catalog.sequences {
    println!("  {:<16} {}", seq.text_id, seq.name);
  }
}

//
// play
//

pub async fn run_play(sequence: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
  let api = ApiClient::new(&api_base())?;
  let catalog = load_catalog(&api).await;
  let Some(seq) = pick_sequence(&api, &catalog, sequence.as_deref()) else {
    return Ok(());
  };
  let id = seq.text_id.clone();

  println!("Playing {}. Fill the blanks with `<position>=<number>`; `help` lists commands.", seq.name);
  let mut session = GameSession::default();
  if !start_round(&api, &id, &mut session).await {
    println!("Could not start a round: value generation failed.");
    return Ok(());
  }
  if let Some(round) = session.round() {
    render_round(round);
  }

  loop {
    let Some(line) = prompt_line("> ")? else {
      break;
    };
    match parse_play_command(&line) {
      PlayCommand::Empty => {}
      PlayCommand::Answer { index, answer } => {
        let Some(round) = session.round_mut() else { continue };
        if !round.blank_indices().contains(&index) {
          println!("Position {} is not a blank.", index);
          continue;
        }
        round.record_answer(index, answer);
        render_round(round);
      }
      PlayCommand::Check => {
        let Some(round) = session.round_mut() else { continue };
        round.check_answers();
        render_round(round);
        let blanks = round.blank_indices();
        let correct = blanks.iter().filter(|i| round.feedback(**i) == Some(true)).count();
        if round.attempts > 0 && round.all_correct() {
          println!(
            "Solved in {} attempt{}. `new` deals another round, `quit` stops.",
            round.attempts,
            if round.attempts == 1 { "" } else { "s" }
          );
        } else {
          println!("{}/{} correct.", correct, blanks.len());
        }
      }
      PlayCommand::New => {
        if start_round(&api, &id, &mut session).await {
          if let Some(round) = session.round() {
            render_round(round);
          }
        } else {
          println!("Could not start a round: value generation failed.");
        }
      }
      PlayCommand::Help => print_play_help(),
      PlayCommand::Quit => break,
      PlayCommand::Unknown => println!("Unrecognized command. `help` lists the commands."),
    }
  }
  Ok(())
}

/// Fetch fresh values and install a new round. The ticket check discards
/// the result if another round was started in the meantime.
async fn start_round(api: &ApiClient, id: &str, session: &mut GameSession) -> bool {
  let ticket = session.begin_round();
  let values = generate_values(api, id, ROUND_LEN as u32).await;
  if values.is_empty() {
    return false;
  }
  let round = game::build_round(&values, &mut thread_rng());
  session.complete_round(ticket, round)
}

/// Values for one round; empty on any failure.
async fn generate_values(api: &ApiClient, id: &str, count: u32) -> Vec<i64> {
  match api.generate(id, count).await {
    Ok(out) => out.result.iter().map(json_to_i64).collect(),
    Err(e) => {
      warn!(target: "game", %id, error = %e, "Value generation failed.");
      Vec::new()
    }
  }
}

fn json_to_i64(v: &serde_json::Value) -> i64 {
  v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)).unwrap_or(0)
}

#[derive(Debug, PartialEq, Eq)]
pub enum PlayCommand {
  Answer { index: usize, answer: Answer },
  Check,
  New,
  Help,
  Quit,
  Empty,
  Unknown,
}

pub fn parse_play_command(line: &str) -> PlayCommand {
  let line = line.trim();
  if line.is_empty() {
    return PlayCommand::Empty;
  }
  match line {
    "check" | "c" => return PlayCommand::Check,
    "new" | "n" => return PlayCommand::New,
    "help" | "h" | "?" => return PlayCommand::Help,
    "quit" | "q" | "exit" => return PlayCommand::Quit,
    _ => {}
  }
  if let Some((pos, val)) = line.split_once('=') {
    if let Ok(index) = pos.trim().parse::<usize>() {
      return PlayCommand::Answer { index, answer: game::parse_answer(val) };
    }
  }
  PlayCommand::Unknown
}

/// One line per round: `index:[value]` tiles, blanks as `_` until answered,
/// with a check mark or cross once graded.
fn render_round(round: &Round) {
  let mut tiles = Vec::with_capacity(round.slots.len());
  for slot in &round.slots {
    let shown = if slot.is_blank {
      match round.answer(slot.index) {
        Some(Answer::Value(v)) => v.to_string(),
        Some(Answer::Invalid) => "?".to_string(),
        None => "_".to_string(),
      }
    } else {
      slot.value.to_string()
    };
    let mark = match round.feedback(slot.index) {
      Some(true) => "✓",
      Some(false) => "✗",
      None => "",
    };
    tiles.push(format!("{}:[{}{}]", slot.index, shown, mark));
  }
  println!("{}", tiles.join(" "));
}

fn print_play_help() {
  println!("Commands:");
  println!("  <position>=<number>   fill a blank, e.g. `4=13`");
  println!("  check                 grade the current answers");
  println!("  new                   deal a fresh round");
  println!("  quit                  leave the game");
}

//
// admin
//

pub async fn run_admin(command: AdminCommands) -> Result<(), Box<dyn std::error::Error>> {
  let api = ApiClient::new(&api_base())?;
  let mut session = AdminSession::load(default_token_path());

  match command {
    AdminCommands::Login => {
      let Some(password) = prompt_line("Admin password: ")? else {
        return Ok(());
      };
      let token = api.login(&password).await?;
      session.set_token(&token)?;
      println!("Logged in. Token stored at {}.", session.path().display());
    }
    AdminCommands::Logout => {
      session.clear()?;
      println!("Logged out.");
    }
    AdminCommands::List => {
      for id in api.list_sequences().await? {
        println!("{}", id);
      }
    }
    AdminCommands::Create => {
      let token = require_token(&session)?;
      let Some(body) = prompt_create()? else {
        return Ok(());
      };
      let created = api.create_sequence(token, &body).await?;
      println!("Created '{}' ({}).", created.name, created.text_id);
    }
    AdminCommands::Edit { id } => {
      let token = require_token(&session)?;
      let current = api.get_sequence(&id).await?;
      let Some(body) = prompt_edit(&current)? else {
        println!("Nothing changed.");
        return Ok(());
      };
      let updated = api.update_sequence(token, &id, &body).await?;
      println!("Updated '{}'.", updated.text_id);
    }
    AdminCommands::Delete { id, yes } => {
      let token = require_token(&session)?;
      if !yes {
        let answer = prompt_line(&format!("Delete '{}'? [y/N] ", id))?.unwrap_or_default();
        if !matches!(answer.trim(), "y" | "Y" | "yes") {
          println!("Aborted.");
          return Ok(());
        }
      }
      api.delete_sequence(token, &id).await?;
      println!("Deleted '{}'.", id);
    }
    AdminCommands::Digest { password } => {
      let password = match password {
        Some(p) => p,
        None => match prompt_line("Password: ")? {
          Some(p) => p,
          None => return Ok(()),
        },
      };
      println!("{}", password_digest(&password));
    }
  }
  Ok(())
}

fn require_token(session: &AdminSession) -> Result<&str, Box<dyn std::error::Error>> {
  session
    .token()
    .ok_or_else(|| "Not logged in. Run `seqdrill admin login` first.".into())
}

/// Field-by-field entry for a new sequence. An empty required field (or
/// EOF) aborts. The server validates the expression on submit.
fn prompt_create() -> Result<Option<SequenceCreateIn>, Box<dyn std::error::Error>> {
  println!("New sequence (an empty required field aborts).");
  let Some(name) = read_field("Name: ")? else {
    println!("Aborted.");
    return Ok(None);
  };
  let Some(description) = read_field("Description: ")? else {
    println!("Aborted.");
    return Ok(None);
  };
  let Some(formula) = read_field("Display formula (e.g. a_n = 2n): ")? else {
    println!("Aborted.");
    return Ok(None);
  };
  let Some(expression) = read_field("Expression (e.g. 2*n): ")? else {
    println!("Aborted.");
    return Ok(None);
  };
  let color = match read_field("Color hex [#3b82f6]: ")? {
    Some(c) => c,
    None => "#3b82f6".to_string(),
  };
  let fun_fact = read_field("Fun fact (optional): ")?;
  let seed = read_field("Seed values, comma separated [0]: ")?
    .map(|s| parse_seed_list(&s))
    .or(Some(vec![0]));

  Ok(Some(SequenceCreateIn {
    id: None,
    name,
    description,
    formula,
    expression,
    color,
    fun_fact,
    seed,
  }))
}

/// Per-field edit; Enter keeps the shown value. Returns None when nothing
/// was entered at all.
fn prompt_edit(current: &SequenceOut) -> Result<Option<SequenceUpdateIn>, Box<dyn std::error::Error>> {
  println!("Editing '{}'. Press Enter to keep the shown value.", current.text_id);
  let seed_text = current.seed.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ");

  let body = SequenceUpdateIn {
    name: edit_field("Name", &current.name)?,
    description: edit_field("Description", &current.description)?,
    formula: edit_field("Display formula", &current.formula)?,
    expression: edit_field("Expression", &current.expression)?,
    color: edit_field("Color", &current.color)?,
    fun_fact: edit_field("Fun fact", &current.fun_fact)?,
    seed: edit_field("Seed", &seed_text)?.map(|s| parse_seed_list(&s)),
  };

  let untouched = body.name.is_none()
    && body.description.is_none()
    && body.formula.is_none()
    && body.expression.is_none()
    && body.color.is_none()
    && body.fun_fact.is_none()
    && body.seed.is_none();
  Ok(if untouched { None } else { Some(body) })
}

fn edit_field(label: &str, current: &str) -> Result<Option<String>, Box<dyn std::error::Error>> {
  read_field(&format!("{} [{}]: ", label, current))
}

/// Prompt and read one trimmed line; None on EOF or empty input.
fn read_field(prompt: &str) -> Result<Option<String>, Box<dyn std::error::Error>> {
  match prompt_line(prompt)? {
    Some(s) if !s.trim().is_empty() => Ok(Some(s.trim().to_string())),
    _ => Ok(None),
  }
}

/// Prompt and read one raw line; None on EOF.
fn prompt_line(prompt: &str) -> Result<Option<String>, Box<dyn std::error::Error>> {
  print!("{}", prompt);
  io::stdout().flush()?;
  let mut buf = String::new();
  if io::stdin().read_line(&mut buf)? == 0 {
    return Ok(None);
  }
  Ok(Some(buf.trim_end_matches(['\r', '\n']).to_string()))
}

//
// validate
//

pub async fn run_validate(expression: &str) -> Result<(), Box<dyn std::error::Error>> {
  let api = ApiClient::new(&api_base())?;
  if api.validate(expression).await? {
    println!("valid");
    Ok(())
  } else {
    println!("invalid");
    Err("Expression did not parse".into())
  }
}
