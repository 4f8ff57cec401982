//! TDB arithmetic expressions and temperature-ranged piecewise functions.
//!
//! Grammar (case-insensitive):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('+' | '-') unary | power
//! power   := primary ('**' unary)?
//! primary := number | 'T' | LN(expr) | EXP(expr) | name | '(' expr ')'
//! ```
//!
//! `**` binds tighter than unary minus, so `-T**2` is `-(T**2)`.

use std::collections::HashMap;

use crate::error::AppError;

/// Maximum nesting of function references during evaluation.
const MAX_CALL_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Const(f64),
    Temp,
    Func(String),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Ln(Box<Expr>),
    Exp(Box<Expr>),
}

/// Named functions available to expressions (the TDB `FUNCTION` table).
pub type FunctionTable = HashMap<String, Piecewise>;

impl Expr {
    pub fn parse(src: &str) -> Result<Expr, AppError> {
        let tokens = tokenize(src)?;
        let mut parser = Parser { tokens: &tokens, pos: 0 };
        let expr = parser.expr()?;
        if parser.pos != tokens.len() {
            return Err(AppError::new(
                3,
                format!("Unexpected trailing input in expression '{}'.", src.trim()),
            ));
        }
        Ok(expr)
    }

    pub fn eval(&self, t: f64, funcs: &FunctionTable) -> Result<f64, AppError> {
        self.eval_depth(t, funcs, 0)
    }

    fn eval_depth(&self, t: f64, funcs: &FunctionTable, depth: usize) -> Result<f64, AppError> {
        let ev = |e: &Expr| e.eval_depth(t, funcs, depth);
        Ok(match self {
            Expr::Const(v) => *v,
            Expr::Temp => t,
            Expr::Func(name) => {
                if depth >= MAX_CALL_DEPTH {
                    return Err(AppError::new(
                        3,
                        format!("Function reference depth exceeded at '{name}' (cycle?)."),
                    ));
                }
                let f = funcs
                    .get(name)
                    .ok_or_else(|| AppError::new(3, format!("Unknown function '{name}'.")))?;
                f.eval_depth(t, funcs, depth + 1)?
            }
            Expr::Neg(a) => -ev(a)?,
            Expr::Add(a, b) => ev(a)? + ev(b)?,
            Expr::Sub(a, b) => ev(a)? - ev(b)?,
            Expr::Mul(a, b) => ev(a)? * ev(b)?,
            Expr::Div(a, b) => ev(a)? / ev(b)?,
            Expr::Pow(a, b) => pow(ev(a)?, ev(b)?),
            Expr::Ln(a) => ev(a)?.ln(),
            Expr::Exp(a) => ev(a)?.exp(),
        })
    }
}

fn pow(base: f64, exponent: f64) -> f64 {
    if exponent.fract() == 0.0 && exponent.abs() <= i32::MAX as f64 {
        base.powi(exponent as i32)
    } else {
        base.powf(exponent)
    }
}

/// A temperature-ranged function: `Tlow expr; Thigh Y expr; ...; Thigh N`.
#[derive(Debug, Clone, PartialEq)]
pub struct Piecewise {
    pub t_low: f64,
    /// `(upper bound, expression)` pairs in ascending temperature order.
    pub segments: Vec<(f64, Expr)>,
}

impl Piecewise {
    pub fn parse(src: &str) -> Result<Piecewise, AppError> {
        let mut parts = src.split(';');
        let first = parts.next().unwrap_or("");
        let (t_low, rest) = split_first_word(first);
        let t_low = parse_temperature(t_low, src)?;

        let mut pending = Some(Expr::parse(rest)?);
        let mut segments = Vec::new();

        for part in parts {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let Some(expr) = pending.take() else {
                return Err(AppError::new(
                    3,
                    format!("Temperature range after terminating 'N' in '{}'.", src.trim()),
                ));
            };
            let (t_high, rest) = split_first_word(part);
            segments.push((parse_temperature(t_high, src)?, expr));

            let (flag, rest) = split_first_word(rest);
            match flag {
                "Y" => pending = Some(Expr::parse(rest)?),
                // Anything after `N` is a reference tag.
                "N" | "" => {}
                other => {
                    return Err(AppError::new(
                        3,
                        format!("Expected Y or N after range limit, got '{other}'."),
                    ));
                }
            }
        }

        if pending.is_some() {
            return Err(AppError::new(
                3,
                format!("Unterminated temperature range in '{}'.", src.trim()),
            ));
        }

        Ok(Piecewise { t_low, segments })
    }

    pub fn eval(&self, t: f64, funcs: &FunctionTable) -> Result<f64, AppError> {
        self.eval_depth(t, funcs, 0)
    }

    fn eval_depth(&self, t: f64, funcs: &FunctionTable, depth: usize) -> Result<f64, AppError> {
        let segment = self
            .segments
            .iter()
            .find(|(t_high, _)| t < *t_high)
            .or_else(|| self.segments.last())
            .ok_or_else(|| AppError::new(3, "Piecewise function has no ranges."))?;
        segment.1.eval_depth(t, funcs, depth)
    }
}

fn split_first_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(idx) => (&s[..idx], &s[idx..]),
        None => (s, ""),
    }
}

fn parse_temperature(token: &str, src: &str) -> Result<f64, AppError> {
    token.parse::<f64>().map_err(|_| {
        AppError::new(
            3,
            format!("Invalid temperature limit '{token}' in '{}'.", src.trim()),
        )
    })
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Num(f64),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Pow,
    LParen,
    RParen,
}

fn tokenize(src: &str) -> Result<Vec<Token>, AppError> {
    let chars: Vec<char> = src.chars().collect();
    let mut out = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            c if c.is_whitespace() => i += 1,
            '+' => {
                out.push(Token::Plus);
                i += 1;
            }
            '-' => {
                out.push(Token::Minus);
                i += 1;
            }
            '*' if chars.get(i + 1) == Some(&'*') => {
                out.push(Token::Pow);
                i += 2;
            }
            '*' => {
                out.push(Token::Star);
                i += 1;
            }
            '/' => {
                out.push(Token::Slash);
                i += 1;
            }
            '(' => {
                out.push(Token::LParen);
                i += 1;
            }
            ')' => {
                out.push(Token::RParen);
                i += 1;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                // Exponent: E, e, D or d followed by an optional sign and digits.
                if i < chars.len() && matches!(chars[i], 'E' | 'e' | 'D' | 'd') {
                    let mut j = i + 1;
                    if j < chars.len() && matches!(chars[j], '+' | '-') {
                        j += 1;
                    }
                    if j < chars.len() && chars[j].is_ascii_digit() {
                        while j < chars.len() && chars[j].is_ascii_digit() {
                            j += 1;
                        }
                        i = j;
                    }
                }
                let text: String = chars[start..i]
                    .iter()
                    .map(|c| if matches!(c, 'D' | 'd') { 'E' } else { *c })
                    .collect();
                let value = text
                    .parse::<f64>()
                    .map_err(|_| AppError::new(3, format!("Invalid number '{text}'.")))?;
                out.push(Token::Num(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let name: String = chars[start..i].iter().collect::<String>().to_ascii_uppercase();
                // `GHSERFE#` marks a function reference in some TDB dialects.
                if chars.get(i) == Some(&'#') {
                    i += 1;
                }
                out.push(Token::Ident(name));
            }
            other => {
                return Err(AppError::new(
                    3,
                    format!("Unexpected character '{other}' in expression '{}'.", src.trim()),
                ));
            }
        }
    }

    Ok(out)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let tok = self.tokens.get(self.pos);
        self.pos += 1;
        tok
    }

    fn expect(&mut self, want: &Token) -> Result<(), AppError> {
        match self.next() {
            Some(tok) if tok == want => Ok(()),
            other => Err(AppError::new(
                3,
                format!("Expected {want:?} in expression, found {other:?}."),
            )),
        }
    }

    fn expr(&mut self) -> Result<Expr, AppError> {
        let mut lhs = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    lhs = Expr::Add(Box::new(lhs), Box::new(self.term()?));
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    lhs = Expr::Sub(Box::new(lhs), Box::new(self.term()?));
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn term(&mut self) -> Result<Expr, AppError> {
        let mut lhs = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    lhs = Expr::Mul(Box::new(lhs), Box::new(self.unary()?));
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    lhs = Expr::Div(Box::new(lhs), Box::new(self.unary()?));
                }
                _ => return Ok(lhs),
            }
        }
    }

    fn unary(&mut self) -> Result<Expr, AppError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Expr::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<Expr, AppError> {
        let base = self.primary()?;
        if self.peek() == Some(&Token::Pow) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Expr::Pow(Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expr, AppError> {
        match self.next().cloned() {
            Some(Token::Num(v)) => Ok(Expr::Const(v)),
            Some(Token::LParen) => {
                let inner = self.expr()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Ident(name)) => match name.as_str() {
                "T" => Ok(Expr::Temp),
                "LN" | "LOG" => Ok(Expr::Ln(Box::new(self.call_argument()?))),
                "EXP" => Ok(Expr::Exp(Box::new(self.call_argument()?))),
                _ => Ok(Expr::Func(name)),
            },
            other => Err(AppError::new(
                3,
                format!("Unexpected token {other:?} in expression."),
            )),
        }
    }

    fn call_argument(&mut self) -> Result<Expr, AppError> {
        self.expect(&Token::LParen)?;
        let inner = self.expr()?;
        self.expect(&Token::RParen)?;
        Ok(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str, t: f64) -> f64 {
        Expr::parse(src).unwrap().eval(t, &FunctionTable::new()).unwrap()
    }

    #[test]
    fn precedence_and_powers() {
        assert_eq!(eval("1+2*3", 0.0), 7.0);
        assert_eq!(eval("-T**2", 3.0), -9.0);
        assert_eq!(eval("2**3**2", 0.0), 512.0);
        assert!((eval("77359*T**(-1)", 1000.0) - 77.359).abs() < 1e-12);
        assert!((eval("T*LN(T)", std::f64::consts::E) - std::f64::consts::E).abs() < 1e-12);
    }

    #[test]
    fn scientific_notation() {
        assert!((eval("2.29603E+31*T**(-9)", 2000.0) - 2.29603e31 / 2000f64.powi(9)).abs() < 1e-9);
        assert!((eval("6.4E-4*T**2", 10.0) - 0.064).abs() < 1e-15);
        assert_eq!(eval("1.5D2", 0.0), 150.0);
    }

    #[test]
    fn function_references_resolve_through_table() {
        let mut funcs = FunctionTable::new();
        funcs.insert("GHSERCC".into(), Piecewise::parse("298.15 -100+T; 6000 N").unwrap());
        let e = Expr::parse("+GHSERCC#+25000-10*T").unwrap();
        assert!((e.eval(1000.0, &funcs).unwrap() - (900.0 + 25000.0 - 10000.0)).abs() < 1e-9);

        let missing = Expr::parse("GHSERXX").unwrap().eval(300.0, &funcs);
        assert_eq!(missing.unwrap_err().exit_code(), 3);
    }

    #[test]
    fn cyclic_references_are_rejected() {
        let mut funcs = FunctionTable::new();
        funcs.insert("A".into(), Piecewise::parse("298.15 B; 6000 N").unwrap());
        funcs.insert("B".into(), Piecewise::parse("298.15 A; 6000 N").unwrap());
        assert!(Expr::parse("A").unwrap().eval(300.0, &funcs).is_err());
    }

    #[test]
    fn piecewise_selects_range() {
        let f = Piecewise::parse("298.15 +1+T; 1811.0 Y -2*T; 6000.0 N REF1").unwrap();
        let funcs = FunctionTable::new();
        assert_eq!(f.segments.len(), 2);
        assert_eq!(f.eval(1000.0, &funcs).unwrap(), 1001.0);
        assert_eq!(f.eval(2000.0, &funcs).unwrap(), -4000.0);
        // Out of range on either side clamps to the nearest segment.
        assert_eq!(f.eval(100.0, &funcs).unwrap(), 101.0);
        assert_eq!(f.eval(7000.0, &funcs).unwrap(), -14000.0);
    }

    #[test]
    fn malformed_inputs_are_errors() {
        assert!(Expr::parse("1 +").is_err());
        assert!(Expr::parse("(1").is_err());
        assert!(Expr::parse("1 $ 2").is_err());
        assert!(Piecewise::parse("298.15 1+T").is_err());
        assert!(Piecewise::parse("abc 1; 6000 N").is_err());
    }
}
