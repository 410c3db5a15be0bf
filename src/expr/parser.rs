//! Recursive descent parser for the sequence expression language.
//!
//! Grammar, loosest binding first:
//!
//! ```text
//! expression -> assign
//! assign     -> term ( "=" assign )?
//! term       -> factor ( ("+" | "-") factor )*
//! factor     -> power ( ("*" | "/") power )*
//! power      -> postfix ( "^" postfix )*
//! postfix    -> primary ( "(" args ")" | "[" expression "]" )*
//! primary    -> INT | FLOAT | IDENT | "(" expression ")" | "[" elements "]"
//! ```
//!
//! Assignment targets are validated after parsing the left side: only a bare
//! variable or an index expression can be assigned to.

use super::scanner::Token;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
  Add,
  Sub,
  Mul,
  Div,
  Pow,
}

impl BinOp {
  pub fn symbol(self) -> &'static str {
    match self {
      BinOp::Add => "+",
      BinOp::Sub => "-",
      BinOp::Mul => "*",
      BinOp::Div => "/",
      BinOp::Pow => "^",
    }
  }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
  Int(i64),
  Float(f64),
  Var(String),
  Array(Vec<Expr>),
  Bin { op: BinOp, left: Box<Expr>, right: Box<Expr> },
  Assign { name: String, value: Box<Expr> },
  Index { target: Box<Expr>, index: Box<Expr> },
  SetIndex { target: Box<Expr>, index: Box<Expr>, value: Box<Expr> },
  Call { callee: Box<Expr>, args: Vec<Expr> },
}

/// Parse a token stream into a single expression tree.
/// Tokens after the first complete expression are ignored, so "2n" parses as
/// the constant 2.
pub fn parse(tokens: &[Token]) -> Result<Expr, String> {
  let mut parser = Parser { tokens, pos: 0 };
  parser.assign()
}

struct Parser<'a> {
  tokens: &'a [Token],
  pos: usize,
}

impl<'a> Parser<'a> {
  fn peek(&self) -> &Token {
    self.tokens.get(self.pos).unwrap_or(&Token::Eof)
  }

  fn advance(&mut self) -> Token {
    let t = self.peek().clone();
    if self.pos < self.tokens.len() {
      self.pos += 1;
    }
    t
  }

  fn eat(&mut self, expected: &Token) -> bool {
    if self.peek() == expected {
      self.pos += 1;
      true
    } else {
      false
    }
  }

  fn assign(&mut self) -> Result<Expr, String> {
    let expr = self.term()?;
    if self.eat(&Token::Equal) {
      let value = Box::new(self.assign()?);
      return match expr {
        Expr::Var(name) => Ok(Expr::Assign { name, value }),
        Expr::Index { target, index } => Ok(Expr::SetIndex { target, index, value }),
        _ => Err("Invalid assignment target (must be a variable name or array index)".into()),
      };
    }
    Ok(expr)
  }

  fn term(&mut self) -> Result<Expr, String> {
    let mut left = self.factor()?;
    loop {
      let op = match self.peek() {
        Token::Plus => BinOp::Add,
        Token::Minus => BinOp::Sub,
        _ => break,
      };
      self.pos += 1;
      let right = self.factor()?;
      left = Expr::Bin { op, left: Box::new(left), right: Box::new(right) };
    }
    Ok(left)
  }

  fn factor(&mut self) -> Result<Expr, String> {
    let mut left = self.power()?;
    loop {
      let op = match self.peek() {
        Token::Star => BinOp::Mul,
        Token::Slash => BinOp::Div,
        _ => break,
      };
      self.pos += 1;
      let right = self.power()?;
      left = Expr::Bin { op, left: Box::new(left), right: Box::new(right) };
    }
    Ok(left)
  }

  fn power(&mut self) -> Result<Expr, String> {
    let mut left = self.postfix()?;
    while self.eat(&Token::Caret) {
      let right = self.postfix()?;
      left = Expr::Bin { op: BinOp::Pow, left: Box::new(left), right: Box::new(right) };
    }
    Ok(left)
  }

  fn postfix(&mut self) -> Result<Expr, String> {
    let mut expr = self.primary()?;
    loop {
      if self.eat(&Token::LParen) {
        let mut args = Vec::new();
        if self.peek() != &Token::RParen {
          args.push(self.assign()?);
          while self.eat(&Token::Comma) {
            args.push(self.assign()?);
          }
        }
        if !self.eat(&Token::RParen) {
          return Err("Expected ')' after call arguments".into());
        }
        expr = Expr::Call { callee: Box::new(expr), args };
      } else if self.eat(&Token::LBracket) {
        let index = self.assign()?;
        if !self.eat(&Token::RBracket) {
          return Err("Expected ']' after index expression".into());
        }
        expr = Expr::Index { target: Box::new(expr), index: Box::new(index) };
      } else {
        break;
      }
    }
    Ok(expr)
  }

  fn primary(&mut self) -> Result<Expr, String> {
    match self.advance() {
      Token::Int(v) => Ok(Expr::Int(v)),
      Token::Float(v) => Ok(Expr::Float(v)),
      Token::Ident(name) => Ok(Expr::Var(name)),
      Token::LParen => {
        let expr = self.assign()?;
        if !self.eat(&Token::RParen) {
          return Err("Expected ')' after expression".into());
        }
        Ok(expr)
      }
      Token::LBracket => {
        let mut elements = Vec::new();
        if self.peek() != &Token::RBracket {
          elements.push(self.assign()?);
          while self.eat(&Token::Comma) {
            elements.push(self.assign()?);
          }
        }
        if !self.eat(&Token::RBracket) {
          return Err("Expected ']' after array elements".into());
        }
        Ok(Expr::Array(elements))
      }
      _ => Err("Expected expression".into()),
    }
  }
}
