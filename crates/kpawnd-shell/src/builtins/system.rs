//! Identity, process, environment and system-control builtins.

use kpawnd_boot::GRUB_CFG_PATH;
use kpawnd_diag::format_uptime;
use kpawnd_vfs::ROOT_OWNER;
use tracing::info;

use super::{lookup, Category, BUILTINS};
use crate::engine::Engine;
use crate::error::{ShellError, ShellResult};
use crate::output::{Action, Output};
use crate::parser::{unquote, Flags, Invocation};
use crate::process::{KillError, Killed};

pub(super) fn whoami(sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    Ok(Output::text(sh.user()))
}

pub(super) fn id(sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    let user = sh.user();
    if user == ROOT_OWNER {
        return Ok(Output::text("uid=0(root) gid=0(root) groups=0(root)"));
    }
    Ok(Output::text(format!(
        "uid=1000({u}) gid=1000({u}) groups=1000({u}),27(sudo)",
        u = user
    )))
}

pub(super) fn hostname(sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    Ok(Output::text(sh.hostname()))
}

pub(super) fn uname(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let args = inv.args();
    let flags = Flags::parse(&args);
    let host = sh.hostname();
    let kernel = &sh.config.kernel_version;
    let text = if flags.has('a') {
        format!(
            "Linux {} {} #1 SMP PREEMPT_DYNAMIC kpawnd {} wasm32 GNU/Linux",
            host, kernel, sh.config.version
        )
    } else {
        let mut fields = Vec::new();
        for (letter, value) in [
            ('s', "Linux"),
            ('n', host.as_str()),
            ('r', kernel.as_str()),
            ('m', "wasm32"),
            ('o', "GNU/Linux"),
        ] {
            if flags.has(letter) {
                fields.push(value);
            }
        }
        if fields.is_empty() {
            "Linux".to_string()
        } else {
            fields.join(" ")
        }
    };
    Ok(Output::text(text))
}

pub(super) fn uptime(sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    Ok(Output::text(format!(
        " up {}, 1 user, load average: 0.00, 0.00, 0.00",
        format_uptime(sh.uptime_secs)
    )))
}

pub(super) fn free(sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    Ok(Output::text(sh.memory_usage().render_free()))
}

pub(super) fn ps(sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    Ok(Output::text(sh.processes.render_ps("ps")))
}

pub(super) fn kill(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let args = inv.args();
    let flags = Flags::parse(&args);
    let Some(target) = flags.operands.last() else {
        return Err(ShellError::usage("kill: usage: kill <pid>"));
    };
    let pid: u32 = target.parse().map_err(|_| {
        ShellError::usage(format!(
            "kill: {}: arguments must be process or job IDs",
            target
        ))
    })?;
    let user = sh.user();
    match sh.processes.kill(pid, &user) {
        Ok(Killed::Init) => Ok(sh.kernel_panic()),
        Ok(Killed::Shell) => Ok(Action::Exit.into()),
        Ok(Killed::Process) => Ok(Output::empty()),
        Err(KillError::NoSuchProcess) => Err(ShellError::refused(format!(
            "kill: ({}) - No such process",
            pid
        ))),
        Err(KillError::NotPermitted) => {
            Err(ShellError::permission_denied(format!("kill: ({})", pid)))
        }
    }
}

pub(super) fn history(sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    let lines: Vec<String> = sh
        .history
        .iter()
        .enumerate()
        .map(|(i, line)| format!("{:5}  {}", i + 1, line))
        .collect();
    Ok(Output::text(lines.join("\n")))
}

fn render_env(sh: &Engine) -> String {
    sh.env
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(super) fn env(sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    Ok(Output::text(render_env(sh)))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(super) fn export(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    if inv.args.is_empty() {
        return Ok(Output::text(render_env(sh)));
    }
    for arg in &inv.args {
        let (name, value) = arg.split_once('=').unwrap_or((arg.as_str(), ""));
        if !is_identifier(name) {
            return Err(ShellError::usage(format!(
                "export: `{}': not a valid identifier",
                arg
            )));
        }
        sh.env
            .insert(name.to_string(), unquote(value).to_string());
    }
    Ok(Output::empty())
}

pub(super) fn alias(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    if inv.args.is_empty() {
        let lines: Vec<String> = sh
            .aliases
            .iter()
            .map(|(name, value)| format!("alias {}='{}'", name, value))
            .collect();
        return Ok(Output::text(lines.join("\n")));
    }
    let joined = inv.rest();
    match joined.split_once('=') {
        Some((name, value)) => {
            if !is_identifier(name) {
                return Err(ShellError::usage(format!(
                    "alias: `{}': invalid alias name",
                    name
                )));
            }
            sh.aliases
                .insert(name.to_string(), unquote(value).to_string());
            Ok(Output::empty())
        }
        None => match sh.aliases.get(&joined) {
            Some(value) => Ok(Output::text(format!("alias {}='{}'", joined, value))),
            None => Err(ShellError::refused(format!("alias: {}: not found", joined))),
        },
    }
}

pub(super) fn which(_sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    if inv.args.is_empty() {
        return Err(ShellError::usage("usage: which <command>..."));
    }
    let lines: Vec<String> = inv
        .args
        .iter()
        .map(|name| match lookup(name) {
            Some(builtin) => format!("/bin/{}", builtin.name),
            None => format!("which: no {} in (/bin:/sbin)", name),
        })
        .collect();
    Ok(Output::text(lines.join("\n")))
}

pub(super) fn help(_sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    let mut out = String::from("kpawnd shell, available commands:\n");
    for category in Category::ALL {
        out.push_str(&format!("\n{}:\n", category.title()));
        for builtin in BUILTINS.iter().filter(|b| b.category == category) {
            out.push_str(&format!("  {:<38} {}\n", builtin.usage, builtin.summary));
        }
    }
    Ok(Output::text(out.trim_end()))
}

pub(super) fn man(_sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let Some(name) = inv.args.first() else {
        return Err(ShellError::usage("What manual page do you want?"));
    };
    let builtin = lookup(name)
        .ok_or_else(|| ShellError::refused(format!("No manual entry for {}", name)))?;
    Ok(Output::text(format!(
        "{upper}(1)\n\nNAME\n    {name} - {summary}\n\nSYNOPSIS\n    {usage}",
        upper = builtin.name.to_uppercase(),
        name = builtin.name,
        summary = builtin.summary,
        usage = builtin.usage
    )))
}

pub(super) fn clear(_sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    Ok(Action::Clear.into())
}

pub(super) fn exit(_sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    Ok(Action::Exit.into())
}

pub(super) fn reboot(sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    if !sh.is_root() {
        return Err(ShellError::permission_denied("reboot"));
    }
    Ok(Action::Reboot.into())
}

pub(super) fn neofetch(sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    Ok(Output::text(sh.sysinfo().report()))
}

pub(super) fn sudo(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    if inv.args.is_empty() {
        return Err(ShellError::usage("usage: sudo <command>"));
    }
    let mut command = inv.rest();
    if let Some(redirect) = &inv.redirect {
        let arrow = if redirect.append { ">>" } else { ">" };
        command.push_str(&format!(" {} {}", arrow, redirect.path));
    }
    sh.session.begin_sudo(&command);
    Ok(Output::text(format!(
        "[sudo] password for {}:",
        sh.login_user()
    )))
}

pub(super) fn update_grub(sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    if !sh.is_root() {
        return Err(ShellError::permission_denied(
            "grub-mkconfig: /boot/grub/grub.cfg.new",
        ));
    }
    let kernel = sh.config.kernel_version.clone();
    let settings = match sh.vfs.read_to_string(GRUB_CFG_PATH) {
        Ok(existing) => sh.config.boot.clone().with_file(&existing),
        Err(_) => sh.config.boot.clone(),
    };
    let context = format!("grub-mkconfig: {}", GRUB_CFG_PATH);
    sh.vfs
        .mkdir_all("/boot/grub", ROOT_OWNER)
        .map_err(|e| ShellError::fs(context.clone(), e))?;
    sh.vfs
        .write(
            GRUB_CFG_PATH,
            settings.render_file(&kernel).as_bytes(),
            ROOT_OWNER,
        )
        .map_err(|e| ShellError::fs(context, e))?;
    info!(path = GRUB_CFG_PATH, "grub.cfg regenerated");

    let mut report = vec!["Generating grub configuration file ...".to_string()];
    for (label, path) in [
        ("linux image", format!("/boot/vmlinuz-{}", kernel)),
        ("initrd image", format!("/boot/initrd.img-{}", kernel)),
        ("memtest86+ image", "/boot/memtest86+.bin".to_string()),
    ] {
        if sh.vfs.exists(&path) {
            report.push(format!("Found {}: {}", label, path));
        }
    }
    report.push("done".to_string());
    Ok(Output::text(report.join("\n")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("PATH"));
        assert!(is_identifier("_x1"));
        assert!(!is_identifier("1x"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a-b"));
    }
}
