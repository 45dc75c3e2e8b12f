//! Command-line parsing.
//!
//! Lines split on whitespace; there is no quoting. `$NAME` is replaced from
//! the environment and a trailing `> file` or `>> file` redirects output.

use std::collections::BTreeMap;

use crate::error::{ShellError, ShellResult};

/// Where command output goes instead of the terminal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Redirect {
    pub path: String,
    pub append: bool,
}

/// One parsed command line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    pub name: String,
    pub args: Vec<String>,
    pub redirect: Option<Redirect>,
}

impl Invocation {
    pub fn args(&self) -> Vec<&str> {
        self.args.iter().map(String::as_str).collect()
    }

    /// Arguments joined back with single spaces.
    pub fn rest(&self) -> String {
        self.args.join(" ")
    }
}

/// Parse `line`. Returns `None` for a blank line.
pub fn parse(line: &str, env: &BTreeMap<String, String>) -> ShellResult<Option<Invocation>> {
    let mut words: Vec<String> = Vec::new();
    let mut redirect = None;
    let mut tokens = line.split_whitespace();

    while let Some(token) = tokens.next() {
        let (append, target) = if let Some(rest) = token.strip_prefix(">>") {
            (true, rest)
        } else if let Some(rest) = token.strip_prefix('>') {
            (false, rest)
        } else {
            words.push(expand(token, env));
            continue;
        };
        let path = if target.is_empty() {
            tokens.next().map(str::to_string)
        } else {
            Some(target.to_string())
        };
        let path = path.ok_or_else(|| {
            ShellError::usage("sh: syntax error near unexpected token `newline'")
        })?;
        redirect = Some(Redirect {
            path: expand(&path, env),
            append,
        });
    }

    let mut words = words.into_iter();
    let Some(name) = words.next() else {
        return match redirect {
            Some(_) => Err(ShellError::usage(
                "sh: syntax error near unexpected token `>'",
            )),
            None => Ok(None),
        };
    };
    Ok(Some(Invocation {
        name,
        args: words.collect(),
        redirect,
    }))
}

/// Replace `$NAME` occurrences. Unknown names expand to nothing.
pub fn expand(token: &str, env: &BTreeMap<String, String>) -> String {
    if !token.contains('$') {
        return token.to_string();
    }
    let mut out = String::new();
    let mut chars = token.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let mut name = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_ascii_alphanumeric() || next == '_' {
                name.push(next);
                chars.next();
            } else {
                break;
            }
        }
        if name.is_empty() {
            out.push('$');
        } else if let Some(value) = env.get(&name) {
            out.push_str(value);
        }
    }
    out
}

/// Strip one pair of matching outer quotes.
pub fn unquote(text: &str) -> &str {
    for quote in ['"', '\''] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|t| t.strip_suffix(quote))
        {
            return inner;
        }
    }
    text
}

/// Single-letter flags and the remaining operands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Flags<'a> {
    letters: Vec<char>,
    pub operands: Vec<&'a str>,
}

impl<'a> Flags<'a> {
    /// Split `args` into flags (`-rf`, `-l`) and operands. A lone `-` and
    /// negative numbers are operands.
    pub fn parse(args: &[&'a str]) -> Self {
        let mut flags = Flags::default();
        for arg in args {
            match arg.strip_prefix('-') {
                Some(letters)
                    if !letters.is_empty()
                        && !letters.starts_with(|c: char| c.is_ascii_digit()) =>
                {
                    flags.letters.extend(letters.chars());
                }
                _ => flags.operands.push(arg),
            }
        }
        flags
    }

    pub fn has(&self, letter: char) -> bool {
        self.letters.contains(&letter)
    }

    pub fn any(&self, letters: &str) -> bool {
        letters.chars().any(|l| self.has(l))
    }
}

/// Remove `-n N` (or `-nN`) from `args`, returning the count.
pub fn take_count(args: &mut Vec<&str>, default: usize) -> ShellResult<usize> {
    let Some(index) = args.iter().position(|a| a.starts_with("-n")) else {
        return Ok(default);
    };
    let flag = args.remove(index);
    let value = match &flag[2..] {
        "" if index < args.len() => args.remove(index).to_string(),
        "" => return Err(ShellError::usage("option requires an argument -- 'n'")),
        inline => inline.to_string(),
    };
    value
        .parse()
        .map_err(|_| ShellError::usage(format!("invalid number of lines: '{}'", value)))
}
