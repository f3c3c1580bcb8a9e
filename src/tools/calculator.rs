//! Safe arithmetic evaluator
//!
//! Recursive-descent parser over a small grammar; nothing is executed
//! beyond the whitelisted functions and constants.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := primary (('**' | '^') unary)?
//! primary := number | name | name '(' args ')' | '(' expr ')'
//! ```
//!
//! Functions: `sqrt pow sin cos tan`. Constants: `pi e`.

use crate::errors::{FolioError, Result};
use crate::tools::types::{Tool, ToolResult};
use async_trait::async_trait;
use std::time::Instant;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Name(String),
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Power,
    LParen,
    RParen,
    Comma,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent part, e.g. 1e-3
                if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                    let mut j = i + 1;
                    if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let text: String = chars[start..i].iter().collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| FolioError::CalcError(format!("invalid number '{}'", text)))?;
                tokens.push(Token::Number(value));
            }
            'a'..='z' | 'A'..='Z' | '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                tokens.push(Token::Name(chars[start..i].iter().collect()));
            }
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                tokens.push(Token::Power);
                i += 2;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '^' => {
                tokens.push(Token::Power);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '%' => {
                tokens.push(Token::Percent);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            other => {
                return Err(FolioError::CalcError(format!(
                    "unexpected character '{}'",
                    other
                )))
            }
        }
    }

    Ok(tokens)
}

/// Nesting limit for parentheses, signs and exponents
const MAX_DEPTH: usize = 64;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(t) if t == expected => Ok(()),
            Some(t) => Err(FolioError::CalcError(format!(
                "expected {:?}, found {:?}",
                expected, t
            ))),
            None => Err(FolioError::CalcError(format!(
                "expected {:?}, found end of input",
                expected
            ))),
        }
    }

    fn expr(&mut self) -> Result<f64> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<f64> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(FolioError::CalcError("division by zero".to_string()));
                    }
                    value /= rhs;
                }
                Some(Token::Percent) => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(FolioError::CalcError("modulo by zero".to_string()));
                    }
                    value = floor_mod(value, rhs);
                }
                _ => return Ok(value),
            }
        }
    }

    // Every recursive path runs through here, so this bounds the stack
    fn unary(&mut self) -> Result<f64> {
        if self.depth >= MAX_DEPTH {
            return Err(FolioError::CalcError(format!(
                "expression nested deeper than {} levels",
                MAX_DEPTH
            )));
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Power) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Some(Token::Name(name)) => {
                if self.peek() == Some(&Token::LParen) {
                    self.pos += 1;
                    let args = self.args()?;
                    call(&name, &args)
                } else {
                    constant(&name)
                }
            }
            Some(t) => Err(FolioError::CalcError(format!("unexpected {:?}", t))),
            None => Err(FolioError::CalcError("unexpected end of input".to_string())),
        }
    }

    fn args(&mut self) -> Result<Vec<f64>> {
        let mut args = Vec::new();
        if self.peek() == Some(&Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                _ => return Err(FolioError::CalcError("expected ',' or ')'".to_string())),
            }
        }
    }
}

/// Modulo with the sign of the divisor
fn floor_mod(a: f64, b: f64) -> f64 {
    let r = a % b;
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

fn constant(name: &str) -> Result<f64> {
    match name {
        "pi" => Ok(std::f64::consts::PI),
        "e" => Ok(std::f64::consts::E),
        _ => Err(FolioError::CalcError(format!("name '{}' is not defined", name))),
    }
}

fn call(name: &str, args: &[f64]) -> Result<f64> {
    let arity = |n: usize| {
        if args.len() == n {
            Ok(())
        } else {
            Err(FolioError::CalcError(format!(
                "{}() takes exactly {} argument(s) ({} given)",
                name,
                n,
                args.len()
            )))
        }
    };

    match name {
        "sqrt" => {
            arity(1)?;
            if args[0] < 0.0 {
                return Err(FolioError::CalcError("math domain error".to_string()));
            }
            Ok(args[0].sqrt())
        }
        "pow" => {
            arity(2)?;
            Ok(args[0].powf(args[1]))
        }
        "sin" => {
            arity(1)?;
            Ok(args[0].sin())
        }
        "cos" => {
            arity(1)?;
            Ok(args[0].cos())
        }
        "tan" => {
            arity(1)?;
            Ok(args[0].tan())
        }
        _ => Err(FolioError::CalcError(format!("name '{}' is not defined", name))),
    }
}

/// Evaluate an arithmetic expression
pub fn evaluate(expression: &str) -> Result<f64> {
    let tokens = tokenize(expression)?;
    if tokens.is_empty() {
        return Err(FolioError::CalcError("empty expression".to_string()));
    }

    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(t) = parser.peek() {
        return Err(FolioError::CalcError(format!("unexpected {:?}", t)));
    }
    if !value.is_finite() {
        return Err(FolioError::CalcError("result is not a finite number".to_string()));
    }
    Ok(value)
}

/// Format a result; integral values print without a fraction
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Evaluate and format, or `"Error calculating: ..."`
pub fn calculate(expression: &str) -> String {
    match evaluate(expression) {
        Ok(value) => format_number(value),
        Err(FolioError::CalcError(msg)) => format!("Error calculating: {}", msg),
        Err(e) => format!("Error calculating: {}", e),
    }
}

/// Calculator tool
#[derive(Debug, Default, Clone)]
pub struct Calculator;

#[async_trait]
impl Tool for Calculator {
    fn name(&self) -> &str {
        "calculate"
    }

    fn signature(&self) -> String {
        "calculate(expression: string)".to_string()
    }

    fn description(&self) -> &str {
        "Safely evaluates math expressions.\n   - Supports: +, -, *, /, %, **, sqrt(), pow(), sin(), cos(), tan(), pi, e"
    }

    fn example(&self) -> &str {
        "calculate(\"sqrt(144) + 5\")"
    }

    async fn run(&self, input: &str) -> ToolResult {
        let start = Instant::now();
        let expression = input.trim().trim_matches('"');
        let output = calculate(expression);
        if output.starts_with("Error calculating:") {
            ToolResult::failure(self.name(), output, start.elapsed())
        } else {
            ToolResult::success(self.name(), output, start.elapsed())
        }
    }
}
