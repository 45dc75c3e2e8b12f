//! Builtins that hand the terminal over to a full-screen program.

use kpawnd_vfs::VfsError;

use crate::engine::Engine;
use crate::error::{ShellError, ShellResult};
use crate::output::{Action, Output, Program};
use crate::parser::Invocation;

/// `nano`, `vi` and `vim` all open the same editor.
pub(super) fn edit(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let Some(operand) = inv.args.first() else {
        return Err(ShellError::usage(format!("Usage: {} <file>", inv.name)));
    };
    let filename = sh.canonical_target(&sh.abs(operand));
    if sh.vfs.is_dir(&filename) {
        return Err(ShellError::fs(
            format!("{}: {}", inv.name, operand),
            VfsError::IsADirectory,
        ));
    }
    let content = match sh.vfs.read(&filename) {
        Ok(bytes) => String::from_utf8_lossy(bytes).into_owned(),
        Err(_) => String::new(),
    };
    Ok(Action::Nano { filename, content }.into())
}

pub(super) fn python(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    if !inv.args.is_empty() {
        return Err(ShellError::usage(format!(
            "{}: script execution not supported",
            inv.name
        )));
    }
    sh.start_python();
    Ok(Action::PythonRepl.into())
}

pub(super) fn doom(_sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let level = match inv.args.first().map(String::as_str) {
        None => None,
        Some("easy" | "0") => Some(0),
        Some("normal" | "1") => Some(1),
        Some("hard" | "2") => Some(2),
        Some(other) => {
            return Err(ShellError::usage(format!(
                "doom: unknown difficulty '{}' (easy, normal, hard)",
                other
            )))
        }
    };
    Ok(Action::Launch(Program::Doom(level)).into())
}

pub(super) fn screensaver(_sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    Ok(Action::Launch(Program::Screensaver).into())
}

pub(super) fn grace(_sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    Ok(Action::Launch(Program::Grace).into())
}

pub(super) fn snake(_sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    Ok(Action::Launch(Program::Snake).into())
}
