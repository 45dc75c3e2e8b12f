//! A small Python-flavoured expression REPL.
//!
//! One line is one statement: an assignment, a `print(...)` call, or an
//! expression whose repr is echoed. Supported values are int, float, str,
//! bool, None and list. There are no statements spanning lines, no
//! user-defined functions and no access to anything outside the REPL's own
//! variables.
//!
//! ```text
//! line ──▶ lex ──▶ Token* ──▶ Parser (Pratt) ──▶ Expr ──▶ eval ──▶ Value
//! ```

use std::collections::HashMap;
use std::fmt;

/// Identifiers refused anywhere in a line.
const FORBIDDEN: [&str; 5] = ["import", "eval", "exec", "open", "compile"];

/// Upper bound on lists built by `range` and repetition.
const MAX_SEQUENCE: usize = 10_000;

/// Deepest expression the parser accepts.
const MAX_NESTING: usize = 200;

// ============================================================================
// Values
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    None,
    List(Vec<Value>),
    /// Result of `type(x)`
    Type(&'static str),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bool(_) => "bool",
            Value::None => "NoneType",
            Value::List(_) => "list",
            Value::Type(_) => "type",
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bool(b) => *b,
            Value::None => false,
            Value::List(items) => !items.is_empty(),
            Value::Type(_) => true,
        }
    }

    /// The form the prompt echoes.
    pub fn repr(&self) -> String {
        match self {
            Value::Str(s) => format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'")),
            Value::List(items) => {
                let inner: Vec<String> = items.iter().map(Value::repr).collect();
                format!("[{}]", inner.join(", "))
            }
            other => other.to_string(),
        }
    }

    fn as_number(&self) -> Option<Number> {
        match self {
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Bool(b) => Some(Number::Int(i64::from(*b))),
            Value::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        let sign = if f > 0.0 { "" } else { "-" };
        format!("{}inf", sign)
    } else if f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{:.1}", f)
    } else {
        format!("{}", f)
    }
}

/// `str()` of a value.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => f.write_str(&format_float(*x)),
            Value::Str(s) => f.write_str(s),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::None => f.write_str("None"),
            Value::List(_) => f.write_str(&self.repr()),
            Value::Type(name) => write!(f, "<class '{}'>", name),
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn to_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// A Python-level exception, rendered the way the interpreter prints it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PyError {
    Syntax(String),
    Name(String),
    Type(String),
    Value(String),
    ZeroDivision(&'static str),
    Overflow,
    Forbidden(String),
}

impl fmt::Display for PyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Syntax(msg) => write!(f, "SyntaxError: {}", msg),
            Self::Name(name) => write!(f, "NameError: name '{}' is not defined", name),
            Self::Type(msg) => write!(f, "TypeError: {}", msg),
            Self::Value(msg) => write!(f, "ValueError: {}", msg),
            Self::ZeroDivision(msg) => write!(f, "ZeroDivisionError: {}", msg),
            Self::Overflow => write!(f, "OverflowError: integer result too large"),
            Self::Forbidden(what) => write!(f, "PermissionError: '{}' is not allowed here", what),
        }
    }
}

impl std::error::Error for PyError {}

pub type PyResult<T> = Result<T, PyError>;

// ============================================================================
// Lexer
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Op(&'static str),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Assign,
}

const OPERATORS: [&str; 13] = [
    "**", "//", "==", "!=", "<=", ">=", "+", "-", "*", "/", "%", "<", ">",
];

fn lex(line: &str) -> PyResult<Vec<Token>> {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if c == '#' {
            break;
        }
        let starts_number =
            c.is_ascii_digit() || (c == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit));
        if starts_number {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || matches!(chars[i], '.' | '_')) {
                i += 1;
            }
            let text: String = chars[start..i].iter().filter(|&&c| c != '_').collect();
            let token = if text.contains('.') {
                text.parse()
                    .map(Token::Float)
                    .map_err(|_| PyError::Syntax("invalid decimal literal".to_string()))?
            } else {
                text.parse().map(Token::Int).map_err(|_| PyError::Overflow)?
            };
            tokens.push(token);
            continue;
        }
        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }
        if c == '"' || c == '\'' {
            let mut text = String::new();
            i += 1;
            loop {
                match chars.get(i) {
                    None => {
                        return Err(PyError::Syntax(
                            "unterminated string literal".to_string(),
                        ))
                    }
                    Some(&q) if q == c => break,
                    Some('\\') => {
                        i += 1;
                        match chars.get(i) {
                            Some('n') => text.push('\n'),
                            Some('t') => text.push('\t'),
                            Some(&other) => text.push(other),
                            None => continue,
                        }
                    }
                    Some(&other) => text.push(other),
                }
                i += 1;
            }
            i += 1;
            tokens.push(Token::Str(text));
            continue;
        }
        let single = match c {
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            '[' => Some(Token::LBracket),
            ']' => Some(Token::RBracket),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(token) = single {
            tokens.push(token);
            i += 1;
            continue;
        }
        let rest: String = chars[i..chars.len().min(i + 2)].iter().collect();
        if let Some(op) = OPERATORS.iter().find(|op| rest.starts_with(**op)) {
            tokens.push(Token::Op(*op));
            i += op.len();
            continue;
        }
        if c == '=' {
            tokens.push(Token::Assign);
            i += 1;
            continue;
        }
        return Err(PyError::Syntax("invalid syntax".to_string()));
    }
    Ok(tokens)
}

// ============================================================================
// Parser
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
enum Expr {
    Literal(Value),
    Name(String),
    List(Vec<Expr>),
    Negate(Box<Expr>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Binary(&'static str, Box<Expr>, Box<Expr>),
    Call(String, Vec<Expr>),
    Index(Box<Expr>, Box<Expr>),
}

/// Left and right binding power of an infix operator.
fn infix_power(token: &Token) -> Option<(u8, u8)> {
    let power = match token {
        Token::Ident(word) if word == "or" => (1, 2),
        Token::Ident(word) if word == "and" => (3, 4),
        Token::Op("==" | "!=" | "<" | ">" | "<=" | ">=") => (7, 8),
        Token::Op("+" | "-") => (9, 10),
        Token::Op("*" | "/" | "//" | "%") => (11, 12),
        Token::Op("**") => (16, 15),
        _ => return None,
    };
    Some(power)
}

const NOT_POWER: u8 = 5;
const UNARY_POWER: u8 = 13;
const POSTFIX_POWER: u8 = 20;

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, wanted: Token) -> PyResult<()> {
        match self.next() {
            Some(token) if token == wanted => Ok(()),
            _ => Err(PyError::Syntax("invalid syntax".to_string())),
        }
    }

    fn finish(&self) -> PyResult<()> {
        if self.pos < self.tokens.len() {
            return Err(PyError::Syntax("invalid syntax".to_string()));
        }
        Ok(())
    }

    fn expr(&mut self, min_power: u8) -> PyResult<Expr> {
        self.depth += 1;
        let result = if self.depth > MAX_NESTING {
            Err(PyError::Syntax("too many nested parentheses".to_string()))
        } else {
            self.operand_chain(min_power)
        };
        self.depth -= 1;
        result
    }

    /// A prefix operand followed by every operator binding at least
    /// `min_power`. Each operator adds a level to the tree, so the chain
    /// shares the nesting limit.
    fn operand_chain(&mut self, min_power: u8) -> PyResult<Expr> {
        let mut lhs = self.prefix()?;
        let mut links = 0;
        loop {
            if self.depth + links > MAX_NESTING {
                return Err(PyError::Syntax("expression too long".to_string()));
            }
            match self.peek() {
                Some(Token::LBracket) if POSTFIX_POWER >= min_power => {
                    self.next();
                    let index = self.expr(0)?;
                    self.expect(Token::RBracket)?;
                    lhs = Expr::Index(Box::new(lhs), Box::new(index));
                    links += 1;
                    continue;
                }
                Some(token) => {
                    let Some((left, right)) = infix_power(token) else {
                        break;
                    };
                    if left < min_power {
                        break;
                    }
                    let token = self.next();
                    let rhs = self.expr(right)?;
                    lhs = match token {
                        Some(Token::Ident(word)) if word == "and" => {
                            Expr::And(Box::new(lhs), Box::new(rhs))
                        }
                        Some(Token::Ident(_)) => Expr::Or(Box::new(lhs), Box::new(rhs)),
                        Some(Token::Op(op)) => Expr::Binary(op, Box::new(lhs), Box::new(rhs)),
                        _ => return Err(PyError::Syntax("invalid syntax".to_string())),
                    };
                    links += 1;
                }
                None => break,
            }
        }
        Ok(lhs)
    }

    fn prefix(&mut self) -> PyResult<Expr> {
        let token = self
            .next()
            .ok_or_else(|| PyError::Syntax("unexpected EOF while parsing".to_string()))?;
        match token {
            Token::Int(i) => Ok(Expr::Literal(Value::Int(i))),
            Token::Float(f) => Ok(Expr::Literal(Value::Float(f))),
            Token::Str(s) => Ok(Expr::Literal(Value::Str(s))),
            Token::Op("-") => Ok(Expr::Negate(Box::new(self.expr(UNARY_POWER)?))),
            Token::Op("+") => self.expr(UNARY_POWER),
            Token::LParen => {
                let inner = self.expr(0)?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => Ok(Expr::List(self.sequence(Token::RBracket)?)),
            Token::Ident(word) => match word.as_str() {
                "True" => Ok(Expr::Literal(Value::Bool(true))),
                "False" => Ok(Expr::Literal(Value::Bool(false))),
                "None" => Ok(Expr::Literal(Value::None)),
                "not" => Ok(Expr::Not(Box::new(self.expr(NOT_POWER)?))),
                "and" | "or" => Err(PyError::Syntax("invalid syntax".to_string())),
                _ if self.peek() == Some(&Token::LParen) => {
                    self.next();
                    Ok(Expr::Call(word, self.sequence(Token::RParen)?))
                }
                _ => Ok(Expr::Name(word)),
            },
            _ => Err(PyError::Syntax("invalid syntax".to_string())),
        }
    }

    /// Comma-separated expressions up to `close`. A trailing comma is fine.
    fn sequence(&mut self, close: Token) -> PyResult<Vec<Expr>> {
        let mut items = Vec::new();
        loop {
            if self.peek() == Some(&close) {
                self.next();
                return Ok(items);
            }
            items.push(self.expr(0)?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(token) if token == close => return Ok(items),
                _ => return Err(PyError::Syntax("invalid syntax".to_string())),
            }
        }
    }
}

// ============================================================================
// Evaluation
// ============================================================================

fn type_error(op: &str, a: &Value, b: &Value) -> PyError {
    PyError::Type(format!(
        "unsupported operand type(s) for {}: '{}' and '{}'",
        op,
        a.type_name(),
        b.type_name()
    ))
}

fn repeat<T: Clone>(items: &[T], times: i64) -> PyResult<Vec<T>> {
    let times = usize::try_from(times).unwrap_or(0);
    if items.len().saturating_mul(times) > MAX_SEQUENCE {
        return Err(PyError::Overflow);
    }
    Ok((0..times).flat_map(|_| items.iter().cloned()).collect())
}

fn floor_div(a: i64, b: i64) -> i64 {
    let q = a / b;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q - 1
    } else {
        q
    }
}

fn floor_mod(a: i64, b: i64) -> i64 {
    let r = a % b;
    if r != 0 && ((r < 0) != (b < 0)) {
        r + b
    } else {
        r
    }
}

fn arithmetic(op: &'static str, a: &Value, b: &Value) -> PyResult<Value> {
    match (op, a, b) {
        ("+", Value::Str(x), Value::Str(y)) => return Ok(Value::Str(format!("{}{}", x, y))),
        ("+", Value::List(x), Value::List(y)) => {
            return Ok(Value::List(x.iter().chain(y).cloned().collect()))
        }
        ("*", Value::Str(s), Value::Int(n)) | ("*", Value::Int(n), Value::Str(s)) => {
            let chars: Vec<char> = s.chars().collect();
            return Ok(Value::Str(repeat(&chars, *n)?.into_iter().collect()));
        }
        ("*", Value::List(items), Value::Int(n)) | ("*", Value::Int(n), Value::List(items)) => {
            return Ok(Value::List(repeat(items, *n)?))
        }
        _ => {}
    }

    let (Some(x), Some(y)) = (a.as_number(), b.as_number()) else {
        return Err(type_error(op, a, b));
    };
    match (x, y) {
        (Number::Int(x), Number::Int(y)) => int_arithmetic(op, x, y),
        (x, y) => float_arithmetic(op, x.to_f64(), y.to_f64()),
    }
}

fn int_arithmetic(op: &str, x: i64, y: i64) -> PyResult<Value> {
    let result = match op {
        "+" => x.checked_add(y),
        "-" => x.checked_sub(y),
        "*" => x.checked_mul(y),
        "/" => {
            if y == 0 {
                return Err(PyError::ZeroDivision("division by zero"));
            }
            return Ok(Value::Float(x as f64 / y as f64));
        }
        "//" | "%" => {
            if y == 0 {
                return Err(PyError::ZeroDivision("integer division or modulo by zero"));
            }
            if x == i64::MIN && y == -1 {
                return Err(PyError::Overflow);
            }
            Some(if op == "//" { floor_div(x, y) } else { floor_mod(x, y) })
        }
        "**" => {
            if y < 0 {
                return float_arithmetic(op, x as f64, y as f64);
            }
            u32::try_from(y).ok().and_then(|exp| x.checked_pow(exp))
        }
        _ => None,
    };
    result.map(Value::Int).ok_or(PyError::Overflow)
}

fn float_arithmetic(op: &str, x: f64, y: f64) -> PyResult<Value> {
    let value = match op {
        "+" => x + y,
        "-" => x - y,
        "*" => x * y,
        "/" | "//" | "%" if y == 0.0 => {
            return Err(PyError::ZeroDivision("float division by zero"))
        }
        "/" => x / y,
        "//" => (x / y).floor(),
        "%" => x - y * (x / y).floor(),
        "**" => {
            if x == 0.0 && y < 0.0 {
                return Err(PyError::ZeroDivision(
                    "0.0 cannot be raised to a negative power",
                ));
            }
            x.powf(y)
        }
        _ => return Err(PyError::Syntax("invalid syntax".to_string())),
    };
    Ok(Value::Float(value))
}

fn equal(a: &Value, b: &Value) -> bool {
    match (a.as_number(), b.as_number()) {
        (Some(Number::Int(x)), Some(Number::Int(y))) => x == y,
        (Some(x), Some(y)) => x.to_f64() == y.to_f64(),
        _ => match (a, b) {
            (Value::List(x), Value::List(y)) => {
                x.len() == y.len() && x.iter().zip(y).all(|(p, q)| equal(p, q))
            }
            _ => a == b,
        },
    }
}

fn ordering(op: &str, a: &Value, b: &Value) -> PyResult<std::cmp::Ordering> {
    let ordered = match (a.as_number(), b.as_number()) {
        (Some(Number::Int(x)), Some(Number::Int(y))) => Some(x.cmp(&y)),
        (Some(x), Some(y)) => x.to_f64().partial_cmp(&y.to_f64()),
        _ => match (a, b) {
            (Value::Str(x), Value::Str(y)) => Some(x.cmp(y)),
            _ => None,
        },
    };
    ordered.ok_or_else(|| {
        PyError::Type(format!(
            "'{}' not supported between instances of '{}' and '{}'",
            op,
            a.type_name(),
            b.type_name()
        ))
    })
}

fn compare(op: &str, a: &Value, b: &Value) -> PyResult<Value> {
    use std::cmp::Ordering::{Greater, Less};
    let result = match op {
        "==" => equal(a, b),
        "!=" => !equal(a, b),
        "<" => ordering(op, a, b)? == Less,
        ">" => ordering(op, a, b)? == Greater,
        "<=" => ordering(op, a, b)? != Greater,
        ">=" => ordering(op, a, b)? != Less,
        _ => return Err(PyError::Syntax("invalid syntax".to_string())),
    };
    Ok(Value::Bool(result))
}

fn index(target: &Value, index: &Value) -> PyResult<Value> {
    let Value::Int(i) = index else {
        return Err(PyError::Type(format!(
            "indices must be integers, not {}",
            index.type_name()
        )));
    };
    let resolve = |len: usize| -> PyResult<usize> {
        let len = len as i64;
        let at = if *i < 0 { len + i } else { *i };
        if (0..len).contains(&at) {
            Ok(at as usize)
        } else {
            Err(PyError::Value("index out of range".to_string()))
        }
    };
    match target {
        Value::List(items) => Ok(items[resolve(items.len())?].clone()),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(Value::Str(chars[resolve(chars.len())?].to_string()))
        }
        other => Err(PyError::Type(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// Evaluates expressions against the REPL's variables, collecting `print`
/// output.
struct Evaluator<'a> {
    globals: &'a HashMap<String, Value>,
    printed: Vec<String>,
}

impl Evaluator<'_> {
    fn eval(&mut self, expr: &Expr) -> PyResult<Value> {
        match expr {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Name(name) => self
                .globals
                .get(name)
                .cloned()
                .ok_or_else(|| PyError::Name(name.clone())),
            Expr::List(items) => Ok(Value::List(
                items.iter().map(|e| self.eval(e)).collect::<PyResult<_>>()?,
            )),
            Expr::Negate(inner) => match self.eval(inner)? {
                Value::Float(f) => Ok(Value::Float(-f)),
                value => match value.as_number() {
                    Some(Number::Int(i)) => i.checked_neg().map(Value::Int).ok_or(PyError::Overflow),
                    _ => Err(PyError::Type(format!(
                        "bad operand type for unary -: '{}'",
                        value.type_name()
                    ))),
                },
            },
            Expr::Not(inner) => Ok(Value::Bool(!self.eval(inner)?.truthy())),
            Expr::And(lhs, rhs) => {
                let left = self.eval(lhs)?;
                if left.truthy() {
                    self.eval(rhs)
                } else {
                    Ok(left)
                }
            }
            Expr::Or(lhs, rhs) => {
                let left = self.eval(lhs)?;
                if left.truthy() {
                    Ok(left)
                } else {
                    self.eval(rhs)
                }
            }
            Expr::Binary(op, lhs, rhs) => {
                let a = self.eval(lhs)?;
                let b = self.eval(rhs)?;
                match *op {
                    "==" | "!=" | "<" | ">" | "<=" | ">=" => compare(op, &a, &b),
                    _ => arithmetic(op, &a, &b),
                }
            }
            Expr::Index(target, at) => {
                let target = self.eval(target)?;
                let at = self.eval(at)?;
                index(&target, &at)
            }
            Expr::Call(name, args) => {
                let args = args
                    .iter()
                    .map(|e| self.eval(e))
                    .collect::<PyResult<Vec<_>>>()?;
                self.call(name, args)
            }
        }
    }

    fn call(&mut self, name: &str, args: Vec<Value>) -> PyResult<Value> {
        let arity = |n: usize| -> PyResult<()> {
            if args.len() == n {
                Ok(())
            } else {
                Err(PyError::Type(format!(
                    "{}() takes exactly {} argument ({} given)",
                    name,
                    n,
                    args.len()
                )))
            }
        };
        match name {
            "print" => {
                let parts: Vec<String> = args.iter().map(Value::to_string).collect();
                self.printed.push(parts.join(" "));
                Ok(Value::None)
            }
            "len" => {
                arity(1)?;
                match &args[0] {
                    Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                    Value::List(items) => Ok(Value::Int(items.len() as i64)),
                    other => Err(PyError::Type(format!(
                        "object of type '{}' has no len()",
                        other.type_name()
                    ))),
                }
            }
            "str" => {
                arity(1)?;
                Ok(Value::Str(args[0].to_string()))
            }
            "int" => {
                arity(1)?;
                to_int(&args[0])
            }
            "float" => {
                arity(1)?;
                to_float(&args[0])
            }
            "abs" => {
                arity(1)?;
                match args[0].as_number() {
                    Some(Number::Int(i)) => i.checked_abs().map(Value::Int).ok_or(PyError::Overflow),
                    Some(Number::Float(f)) => Ok(Value::Float(f.abs())),
                    None => Err(PyError::Type(format!(
                        "bad operand type for abs(): '{}'",
                        args[0].type_name()
                    ))),
                }
            }
            "max" | "min" => extreme(name, args),
            "range" => range(&args),
            "type" => {
                arity(1)?;
                Ok(Value::Type(args[0].type_name()))
            }
            _ => Err(PyError::Name(name.to_string())),
        }
    }
}

fn to_int(value: &Value) -> PyResult<Value> {
    match value {
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
        Value::Str(s) => s.trim().parse().map(Value::Int).map_err(|_| {
            PyError::Value(format!(
                "invalid literal for int() with base 10: '{}'",
                s
            ))
        }),
        other => Err(PyError::Type(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn to_float(value: &Value) -> PyResult<Value> {
    match value.as_number() {
        Some(n) => Ok(Value::Float(n.to_f64())),
        None => match value {
            Value::Str(s) => s.trim().parse().map(Value::Float).map_err(|_| {
                PyError::Value(format!("could not convert string to float: '{}'", s))
            }),
            other => Err(PyError::Type(format!(
                "float() argument must be a string or a number, not '{}'",
                other.type_name()
            ))),
        },
    }
}

fn extreme(name: &str, args: Vec<Value>) -> PyResult<Value> {
    let items = if args.len() == 1 {
        match args.into_iter().next() {
            Some(Value::List(items)) => items,
            other => {
                return Err(PyError::Type(format!(
                    "'{}' object is not iterable",
                    other.as_ref().map_or("NoneType", Value::type_name)
                )))
            }
        }
    } else {
        args
    };
    let mut iter = items.into_iter();
    let mut best = iter
        .next()
        .ok_or_else(|| PyError::Value(format!("{}() arg is an empty sequence", name)))?;
    let op = if name == "max" { ">" } else { "<" };
    for item in iter {
        if compare(op, &item, &best)?.truthy() {
            best = item;
        }
    }
    Ok(best)
}

fn range(args: &[Value]) -> PyResult<Value> {
    let ints = args
        .iter()
        .map(|v| match v {
            Value::Int(i) => Ok(*i),
            Value::Bool(b) => Ok(i64::from(*b)),
            other => Err(PyError::Type(format!(
                "'{}' object cannot be interpreted as an integer",
                other.type_name()
            ))),
        })
        .collect::<PyResult<Vec<i64>>>()?;
    let (start, stop, step) = match ints[..] {
        [stop] => (0, stop, 1),
        [start, stop] => (start, stop, 1),
        [start, stop, step] => (start, stop, step),
        _ => {
            return Err(PyError::Type(format!(
                "range expected 1 to 3 arguments, got {}",
                ints.len()
            )))
        }
    };
    if step == 0 {
        return Err(PyError::Value("range() arg 3 must not be zero".to_string()));
    }
    let mut items = Vec::new();
    let mut at = start;
    while (step > 0 && at < stop) || (step < 0 && at > stop) {
        if items.len() == MAX_SEQUENCE {
            return Err(PyError::Overflow);
        }
        items.push(Value::Int(at));
        at = match at.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    Ok(Value::List(items))
}

// ============================================================================
// REPL
// ============================================================================

/// What one line of input produced.
#[derive(Clone, Debug, PartialEq)]
pub enum ReplOutcome {
    /// Text to show; empty for statements with no echo
    Text(String),
    /// `exit()` or `quit()`
    Exit,
}

/// Variables live for as long as the REPL does.
#[derive(Clone, Debug, Default)]
pub struct PythonRepl {
    globals: HashMap<String, Value>,
}

impl PythonRepl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    /// Run one line. Python errors come back as their traceback text.
    pub fn run(&mut self, line: &str) -> ReplOutcome {
        match self.execute(line) {
            Ok(outcome) => outcome,
            Err(err) => ReplOutcome::Text(err.to_string()),
        }
    }

    fn execute(&mut self, line: &str) -> PyResult<ReplOutcome> {
        if line.contains("__") {
            return Err(PyError::Forbidden("__".to_string()));
        }
        let tokens = lex(line)?;
        if let Some(word) = forbidden(&tokens) {
            return Err(PyError::Forbidden(word));
        }
        match tokens.as_slice() {
            [] => return Ok(ReplOutcome::Text(String::new())),
            [Token::Ident(name), Token::LParen, Token::RParen] if name == "exit" || name == "quit" => {
                return Ok(ReplOutcome::Exit);
            }
            _ => {}
        }

        let target = match tokens.as_slice() {
            [Token::Ident(name), Token::Assign, ..] => Some(name.clone()),
            _ => None,
        };
        let mut tokens = tokens;
        if target.is_some() {
            tokens.drain(..2);
        }
        if tokens.contains(&Token::Assign) {
            return Err(PyError::Syntax("invalid syntax".to_string()));
        }

        let mut parser = Parser::new(tokens);
        let expr = parser.expr(0)?;
        parser.finish()?;

        let mut evaluator = Evaluator {
            globals: &self.globals,
            printed: Vec::new(),
        };
        let value = evaluator.eval(&expr)?;
        let mut lines = evaluator.printed;
        match target {
            Some(name) => {
                if matches!(name.as_str(), "True" | "False" | "None") {
                    return Err(PyError::Syntax("cannot assign to literal".to_string()));
                }
                self.globals.insert(name, value);
            }
            None if value != Value::None => lines.push(value.repr()),
            None => {}
        }
        Ok(ReplOutcome::Text(lines.join("\n")))
    }
}

fn forbidden(tokens: &[Token]) -> Option<String> {
    tokens.iter().find_map(|token| match token {
        Token::Ident(word) if FORBIDDEN.contains(&word.as_str()) => Some(word.clone()),
        _ => None,
    })
}

#[cfg(test)]
#[path = "python_tests.rs"]
mod tests;
