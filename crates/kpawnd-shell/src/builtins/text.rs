//! Text builtins. They read files; there is no stdin.

use crate::engine::Engine;
use crate::error::{ShellError, ShellResult};
use crate::output::{Action, Output};
use crate::parser::{take_count, unquote, Flags, Invocation};
use crate::skeleton::GITHUB_URL;

const GITHUB_FILE: &str = "/etc/github";

pub(super) fn echo(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    if inv.redirect.is_none() && inv.args.len() == 1 && inv.args[0] == "github" {
        let url = sh
            .vfs
            .read_to_string(GITHUB_FILE)
            .map(|s| s.trim().to_string())
            .unwrap_or_default();
        let url = if url.is_empty() {
            GITHUB_URL.to_string()
        } else {
            url
        };
        return Ok(Action::Open(url).into());
    }
    let joined = inv.rest();
    Ok(Output::text(unquote(&joined)))
}

/// The single file operand of a line-oriented command.
fn single_file(sh: &Engine, cmd: &str, operands: &[&str]) -> ShellResult<String> {
    match operands {
        [operand] => sh.read_file(cmd, operand),
        [] => Err(ShellError::usage(format!("{}: missing file operand", cmd))),
        _ => Err(ShellError::usage(format!("{}: extra operand '{}'", cmd, operands[1]))),
    }
}

pub(super) fn head(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let mut args = inv.args();
    let n = take_count(&mut args, 10).map_err(|e| ShellError::usage(format!("head: {}", e)))?;
    let text = single_file(sh, "head", &args)?;
    Ok(Output::text(text.lines().take(n).collect::<Vec<_>>().join("\n")))
}

pub(super) fn tail(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let mut args = inv.args();
    let n = take_count(&mut args, 10).map_err(|e| ShellError::usage(format!("tail: {}", e)))?;
    let text = single_file(sh, "tail", &args)?;
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    Ok(Output::text(lines[start..].join("\n")))
}

pub(super) fn wc(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    if inv.args.is_empty() {
        return Err(ShellError::usage("wc: missing file operand"));
    }
    let mut rows = Vec::new();
    let mut totals = (0, 0, 0);
    for operand in &inv.args {
        let text = sh.read_file("wc", operand)?;
        let counts = (text.lines().count(), text.split_whitespace().count(), text.len());
        totals = (totals.0 + counts.0, totals.1 + counts.1, totals.2 + counts.2);
        rows.push(format!("{:7} {:7} {:7} {}", counts.0, counts.1, counts.2, operand));
    }
    if inv.args.len() > 1 {
        rows.push(format!("{:7} {:7} {:7} total", totals.0, totals.1, totals.2));
    }
    Ok(Output::text(rows.join("\n")))
}

pub(super) fn grep(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let args = inv.args();
    let flags = Flags::parse(&args);
    let Some((pattern, files)) = flags.operands.split_first() else {
        return Err(ShellError::usage("usage: grep [-i] [-n] <pattern> <file>..."));
    };
    if files.is_empty() {
        return Err(ShellError::usage("usage: grep [-i] [-n] <pattern> <file>..."));
    }
    let ignore_case = flags.has('i');
    let pattern = unquote(pattern);
    let needle = if ignore_case {
        pattern.to_lowercase()
    } else {
        pattern.to_string()
    };

    let mut hits = Vec::new();
    for file in files {
        let text = sh.read_file("grep", file)?;
        for (i, line) in text.lines().enumerate() {
            let matched = if ignore_case {
                line.to_lowercase().contains(&needle)
            } else {
                line.contains(&needle)
            };
            if !matched {
                continue;
            }
            let mut hit = String::new();
            if files.len() > 1 {
                hit.push_str(file);
                hit.push(':');
            }
            if flags.has('n') {
                hit.push_str(&format!("{}:", i + 1));
            }
            hit.push_str(line);
            hits.push(hit);
        }
    }
    Ok(Output::text(hits.join("\n")))
}

pub(super) fn sort(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let args = inv.args();
    let flags = Flags::parse(&args);
    let text = single_file(sh, "sort", &flags.operands)?;
    let mut lines: Vec<&str> = text.lines().collect();
    lines.sort_unstable();
    if flags.has('r') {
        lines.reverse();
    }
    Ok(Output::text(lines.join("\n")))
}

pub(super) fn uniq(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let text = single_file(sh, "uniq", &inv.args())?;
    let mut lines: Vec<&str> = text.lines().collect();
    lines.dedup();
    Ok(Output::text(lines.join("\n")))
}

/// Line diff over the longest common subsequence. Lines only in `a` are
/// marked `<`, lines only in `b` are marked `>`.
pub(crate) fn line_diff(a: &str, b: &str) -> Vec<String> {
    let a: Vec<&str> = a.lines().collect();
    let b: Vec<&str> = b.lines().collect();
    let mut lcs = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            lcs[i][j] = if a[i] == b[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            out.push(format!("< {}", a[i]));
            i += 1;
        } else {
            out.push(format!("> {}", b[j]));
            j += 1;
        }
    }
    out.extend(a[i..].iter().map(|line| format!("< {}", line)));
    out.extend(b[j..].iter().map(|line| format!("> {}", line)));
    out
}

pub(super) fn diff(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let [left, right] = inv.args()[..] else {
        return Err(ShellError::usage("usage: diff <file1> <file2>"));
    };
    let a = sh.read_file("diff", left)?;
    let b = sh.read_file("diff", right)?;
    Ok(Output::text(line_diff(&a, &b).join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_diff_identical() {
        assert!(line_diff("a\nb\n", "a\nb\n").is_empty());
    }

    #[test]
    fn test_line_diff_changes() {
        assert_eq!(
            line_diff("a\nb\nc\n", "a\nx\nc\nd\n"),
            vec!["< b", "> x", "> d"]
        );
        assert_eq!(line_diff("", "new"), vec!["> new"]);
        assert_eq!(line_diff("old", ""), vec!["< old"]);
    }
}
