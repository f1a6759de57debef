//! 算术表达式求值（itinera 的 calculator 工具后端）
//!
//! 仅支持 `+ - * /`、括号、一元正负号与小数；不支持变量、函数或任何代码执行。
//! 语法：
//! ```text
//! expr   := term (('+' | '-') term)*
//! term   := factor (('*' | '/') factor)*
//! factor := ('+' | '-') factor | number | '(' expr ')'
//! ```
//! 一元符号与括号的嵌套层数不超过 MAX_DEPTH。

use std::fmt;

/// 一元符号与括号的最大嵌套层数
pub const MAX_DEPTH: usize = 256;

/// 求值失败的原因，pos 为字符偏移（从 0 开始）
#[derive(Debug, Clone, PartialEq)]
pub enum CalcError {
    Empty,
    UnexpectedChar { ch: char, pos: usize },
    UnexpectedToken { pos: usize },
    UnexpectedEnd,
    InvalidNumber { text: String, pos: usize },
    DivisionByZero { pos: usize },
    TooDeep { pos: usize },
    NotFinite,
}

impl fmt::Display for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcError::Empty => write!(f, "empty expression"),
            CalcError::UnexpectedChar { ch, pos } => {
                write!(f, "unexpected character '{ch}' at position {pos}")
            }
            CalcError::UnexpectedToken { pos } => write!(f, "unexpected token at position {pos}"),
            CalcError::UnexpectedEnd => write!(f, "unexpected end of expression"),
            CalcError::InvalidNumber { text, pos } => {
                write!(f, "invalid number '{text}' at position {pos}")
            }
            CalcError::DivisionByZero { pos } => write!(f, "division by zero at position {pos}"),
            CalcError::TooDeep { pos } => {
                write!(f, "nesting deeper than {MAX_DEPTH} levels at position {pos}")
            }
            CalcError::NotFinite => write!(f, "result is not a finite number"),
        }
    }
}

impl std::error::Error for CalcError {}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn tokenize(input: &str) -> Result<Vec<(Token, usize)>, CalcError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let token = match c {
            c if c.is_whitespace() => {
                i += 1;
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| CalcError::InvalidNumber { text: text.clone(), pos: start })?;
                tokens.push((Token::Number(value), start));
                continue;
            }
            other => return Err(CalcError::UnexpectedChar { ch: other, pos: i }),
        };
        tokens.push((token, i));
        i += 1;
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<(Token, usize)>,
    cursor: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.cursor).map(|(t, _)| *t)
    }

    fn pos(&self) -> usize {
        self.tokens.get(self.cursor).map(|(_, p)| *p).unwrap_or(0)
    }

    fn descend(&mut self, pos: usize) -> Result<(), CalcError> {
        if self.depth >= MAX_DEPTH {
            return Err(CalcError::TooDeep { pos });
        }
        self.depth += 1;
        Ok(())
    }

    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.cursor += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.factor()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            let pos = self.pos();
            self.cursor += 1;
            let rhs = self.factor()?;
            value = if op == Token::Star {
                value * rhs
            } else {
                if rhs == 0.0 {
                    return Err(CalcError::DivisionByZero { pos });
                }
                value / rhs
            };
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, CalcError> {
        let pos = self.pos();
        match self.peek() {
            Some(Token::Minus) => {
                self.cursor += 1;
                self.descend(pos)?;
                let value = -self.factor()?;
                self.depth -= 1;
                Ok(value)
            }
            Some(Token::Plus) => {
                self.cursor += 1;
                self.descend(pos)?;
                let value = self.factor()?;
                self.depth -= 1;
                Ok(value)
            }
            Some(Token::Number(n)) => {
                self.cursor += 1;
                Ok(n)
            }
            Some(Token::LParen) => {
                self.cursor += 1;
                self.descend(pos)?;
                let value = self.expr()?;
                self.depth -= 1;
                match self.peek() {
                    Some(Token::RParen) => {
                        self.cursor += 1;
                        Ok(value)
                    }
                    Some(_) => Err(CalcError::UnexpectedToken { pos: self.pos() }),
                    None => Err(CalcError::UnexpectedEnd),
                }
            }
            Some(_) => Err(CalcError::UnexpectedToken { pos }),
            None => Err(CalcError::UnexpectedEnd),
        }
    }
}

/// 对算术表达式求值
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(CalcError::Empty);
    }
    let mut parser = Parser { tokens, cursor: 0, depth: 0 };
    let value = parser.expr()?;
    if parser.cursor < parser.tokens.len() {
        return Err(CalcError::UnexpectedToken { pos: parser.pos() });
    }
    if !value.is_finite() {
        return Err(CalcError::NotFinite);
    }
    Ok(value)
}
