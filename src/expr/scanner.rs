//! Token scanner for the sequence expression language.

/// Lexical token. Number literals keep their int/float distinction so the
/// interpreter can do integer arithmetic where the source asked for it.
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
  Plus,
  Minus,
  Star,
  Slash,
  Caret,
  LParen,
  RParen,
  Equal,
  Comma,
  LBracket,
  RBracket,
  Int(i64),
  Float(f64),
  Ident(String),
  Eof,
}

struct Scanner {
  chars: Vec<char>,
  pos: usize,
  line: usize,
}

/// Scan an expression into tokens (always ends with `Eof`).
/// Whitespace is skipped; newlines only advance the line counter used in
/// error messages.
pub fn scan(src: &str) -> Result<Vec<Token>, String> {
  let mut sc = Scanner { chars: src.chars().collect(), pos: 0, line: 1 };
  let mut tokens = Vec::new();
  while let Some(c) = sc.advance() {
    match c {
      '+' => tokens.push(Token::Plus),
      '-' => tokens.push(Token::Minus),
      '*' => tokens.push(Token::Star),
      '/' => tokens.push(Token::Slash),
      '^' => tokens.push(Token::Caret),
      '(' => tokens.push(Token::LParen),
      ')' => tokens.push(Token::RParen),
      '=' => tokens.push(Token::Equal),
      ',' => tokens.push(Token::Comma),
      '[' => tokens.push(Token::LBracket),
      ']' => tokens.push(Token::RBracket),
      '\n' => sc.line += 1,
      '\r' | '\t' | ' ' => {}
      c if c.is_ascii_digit() => tokens.push(sc.read_number(sc.pos - 1)?),
      c if c.is_alphabetic() => tokens.push(sc.read_identifier(sc.pos - 1)),
      c => {
        return Err(format!("[line {}] Unexpected character '{}'", sc.line, c));
      }
    }
  }
  tokens.push(Token::Eof);
  Ok(tokens)
}

impl Scanner {
  fn advance(&mut self) -> Option<char> {
    let c = self.chars.get(self.pos).copied();
    if c.is_some() {
      self.pos += 1;
    }
    c
  }

  fn peek(&self) -> char {
    self.chars.get(self.pos).copied().unwrap_or('\0')
  }

  fn lexeme(&self, start: usize) -> String {
    self.chars[start..self.pos].iter().collect()
  }

  fn read_number(&mut self, start: usize) -> Result<Token, String> {
    while self.peek().is_ascii_digit() {
      self.pos += 1;
    }
    let mut is_float = false;
    if self.peek() == '.' {
      is_float = true;
      self.pos += 1;
      while self.peek().is_ascii_digit() {
        self.pos += 1;
      }
    }
    let lexeme = self.lexeme(start);
    if is_float {
      lexeme
        .parse::<f64>()
        .map(Token::Float)
        .map_err(|_| format!("[line {}] Invalid number literal '{}'", self.line, lexeme))
    } else {
      // Literals too big for i64 fall back to floats, matching how
      // arithmetic overflow is handled during evaluation.
      match lexeme.parse::<i64>() {
        Ok(v) => Ok(Token::Int(v)),
        Err(_) => lexeme
          .parse::<f64>()
          .map(Token::Float)
          .map_err(|_| format!("[line {}] Invalid number literal '{}'", self.line, lexeme)),
      }
    }
  }

  fn read_identifier(&mut self, start: usize) -> Token {
    while self.peek().is_alphanumeric() {
      self.pos += 1;
    }
    Token::Ident(self.lexeme(start))
  }
}
