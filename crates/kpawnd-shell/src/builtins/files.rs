//! Filesystem builtins.

use kpawnd_vfs::{path, DirEntry, Vfs, VfsError};

use crate::engine::Engine;
use crate::error::{ShellError, ShellResult};
use crate::output::Output;
use crate::parser::{Flags, Invocation};
use crate::permissions::is_critical;

const DIR_BLOCK: usize = 4096;

fn perm_string(is_dir: bool) -> &'static str {
    if is_dir {
        "drwxr-xr-x"
    } else {
        "-rw-r--r--"
    }
}

fn long_row(entry: &DirEntry, name: &str) -> String {
    format!(
        "{} {:<8} {:>6} {}",
        perm_string(entry.is_dir()),
        entry.owner,
        entry.size,
        name
    )
}

pub(super) fn ls(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let args = inv.args();
    let flags = Flags::parse(&args);
    let long = flags.has('l');
    let all = flags.has('a');
    let targets = if flags.operands.is_empty() {
        vec!["."]
    } else {
        flags.operands.clone()
    };

    let mut sections = Vec::new();
    for target in &targets {
        let abs = sh.abs(target);
        let meta = sh
            .vfs
            .stat(&abs)
            .map_err(|e| ShellError::fs(format!("ls: cannot access '{}'", target), e))?;
        let body = if meta.is_dir() {
            let entries = sh
                .vfs
                .list(&abs)
                .map_err(|e| ShellError::fs(format!("ls: cannot open directory '{}'", target), e))?;
            let visible = entries
                .iter()
                .filter(|entry| all || !entry.name.starts_with('.'));
            if long {
                visible
                    .map(|entry| long_row(entry, &entry.name))
                    .collect::<Vec<_>>()
                    .join("\n")
            } else {
                visible
                    .map(|entry| entry.name.as_str())
                    .collect::<Vec<_>>()
                    .join("  ")
            }
        } else if long {
            let entry = DirEntry {
                name: path::file_name(&abs).to_string(),
                node_type: meta.node_type,
                size: meta.size,
                owner: meta.owner.clone(),
            };
            long_row(&entry, target)
        } else {
            target.to_string()
        };
        if targets.len() > 1 && meta.is_dir() {
            sections.push(format!("{}:\n{}", target, body));
        } else {
            sections.push(body);
        }
    }
    Ok(Output::text(sections.join("\n\n")))
}

pub(super) fn cd(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let target = match inv.args.first() {
        Some(target) => target.clone(),
        None => sh.home(),
    };
    let abs = sh.abs(&target);
    let canonical = sh
        .vfs
        .canonicalize(&abs)
        .map_err(|e| ShellError::fs(format!("cd: {}", target), e))?;
    if !sh.vfs.is_dir(&canonical) {
        return Err(ShellError::fs(
            format!("cd: {}", target),
            VfsError::NotADirectory,
        ));
    }
    sh.env.insert("PWD".to_string(), canonical.clone());
    sh.cwd = canonical;
    Ok(Output::empty())
}

pub(super) fn pwd(sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    Ok(Output::text(sh.cwd.clone()))
}

pub(super) fn cat(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    if inv.args.is_empty() {
        return Err(ShellError::usage("cat: missing operand"));
    }
    let mut out = String::new();
    for operand in &inv.args {
        out.push_str(&sh.read_file("cat", operand)?);
    }
    if out.ends_with('\n') {
        out.pop();
    }
    Ok(Output::text(out))
}

pub(super) fn touch(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    if inv.args.is_empty() {
        return Err(ShellError::usage("touch: missing file operand"));
    }
    let owner = sh.user();
    for operand in &inv.args {
        let context = format!("touch: cannot touch '{}'", operand);
        let target = sh.canonical_target(&sh.abs(operand));
        sh.check_modify(&target, &context)?;
        sh.vfs
            .touch(&target, &owner)
            .map_err(|e| ShellError::fs(context, e))?;
    }
    Ok(Output::empty())
}

pub(super) fn mkdir(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let args = inv.args();
    let flags = Flags::parse(&args);
    if flags.operands.is_empty() {
        return Err(ShellError::usage("mkdir: missing operand"));
    }
    let owner = sh.user();
    for operand in &flags.operands {
        let context = format!("mkdir: cannot create directory '{}'", operand);
        let target = sh.canonical_target(&sh.abs(operand));
        sh.check_modify(&target, &context)?;
        let made = if flags.has('p') {
            sh.vfs.mkdir_all(&target, &owner)
        } else {
            sh.vfs.mkdir(&target, &owner)
        };
        made.map_err(|e| ShellError::fs(context, e))?;
    }
    Ok(Output::empty())
}

pub(super) fn rm(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let args = inv.args();
    let flags = Flags::parse(&args);
    let recursive = flags.any("rR");
    let force = flags.has('f');
    if flags.operands.is_empty() {
        if force {
            return Ok(Output::empty());
        }
        return Err(ShellError::usage("rm: missing operand"));
    }

    for operand in &flags.operands {
        let context = format!("rm: cannot remove '{}'", operand);
        let target = sh.canonical_target(&sh.abs(operand));
        if target == "/" {
            return Err(ShellError::refused(
                "rm: it is dangerous to operate recursively on '/'\nrm: use --no-preserve-root to override this failsafe",
            ));
        }
        let meta = match sh.vfs.stat(&target) {
            Ok(meta) => meta,
            Err(_) if force => continue,
            Err(e) => return Err(ShellError::fs(context, e)),
        };
        if meta.is_dir() && !recursive {
            return Err(ShellError::fs(context, VfsError::IsADirectory));
        }
        sh.check_modify(&target, &context)?;
        sh.vfs
            .remove(&target, recursive)
            .map_err(|e| ShellError::fs(context, e))?;
        if is_critical(&target) {
            return Ok(sh.kernel_panic());
        }
    }
    Ok(Output::empty())
}

pub(super) fn rmdir(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    if inv.args.is_empty() {
        return Err(ShellError::usage("rmdir: missing operand"));
    }
    for operand in &inv.args {
        let context = format!("rmdir: failed to remove '{}'", operand);
        let target = sh.canonical_target(&sh.abs(operand));
        let meta = sh
            .vfs
            .stat(&target)
            .map_err(|e| ShellError::fs(context.clone(), e))?;
        if !meta.is_dir() {
            return Err(ShellError::fs(context, VfsError::NotADirectory));
        }
        sh.check_modify(&target, &context)?;
        sh.vfs
            .remove(&target, false)
            .map_err(|e| ShellError::fs(context, e))?;
    }
    Ok(Output::empty())
}

/// Where `src` lands when copied or moved to `dest`: inside `dest` when it
/// is an existing directory, otherwise at `dest` itself.
fn landing(sh: &Engine, src: &str, dest: &str) -> String {
    let dest = sh.canonical_target(&sh.abs(dest));
    if sh.vfs.is_dir(&dest) {
        path::join(&dest, path::file_name(src))
    } else {
        dest
    }
}

pub(super) fn cp(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let args = inv.args();
    let flags = Flags::parse(&args);
    let [src_arg, dest_arg] = flags.operands[..] else {
        return Err(ShellError::usage("usage: cp [-r] <src> <dest>"));
    };
    let src = sh
        .vfs
        .canonicalize(&sh.abs(src_arg))
        .map_err(|e| ShellError::fs(format!("cp: cannot stat '{}'", src_arg), e))?;
    if sh.vfs.is_dir(&src) && !flags.any("rR") {
        return Err(ShellError::refused(format!(
            "cp: -r not specified; omitting directory '{}'",
            src_arg
        )));
    }
    let dest = landing(sh, &src, dest_arg);
    let context = format!("cp: cannot create '{}'", dest_arg);
    sh.check_modify(&dest, &context)?;
    let owner = sh.user();
    sh.vfs
        .copy(&src, &dest, &owner)
        .map_err(|e| ShellError::fs(context, e))?;
    Ok(Output::empty())
}

pub(super) fn mv(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let [src_arg, dest_arg] = inv.args()[..] else {
        return Err(ShellError::usage("usage: mv <src> <dest>"));
    };
    let src = sh
        .vfs
        .canonicalize(&sh.abs(src_arg))
        .map_err(|e| ShellError::fs(format!("mv: cannot stat '{}'", src_arg), e))?;
    let dest = landing(sh, &src, dest_arg);
    let context = format!("mv: cannot move '{}' to '{}'", src_arg, dest_arg);
    sh.check_modify(&src, &context)?;
    sh.check_modify(&dest, &context)?;
    if src == "/" {
        return Err(ShellError::fs(context, VfsError::PermissionDenied));
    }
    sh.vfs
        .rename(&src, &dest)
        .map_err(|e| ShellError::fs(context, e))?;
    if is_critical(&src) {
        return Ok(sh.kernel_panic());
    }
    Ok(Output::empty())
}

pub(super) fn chown(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let args = inv.args();
    let flags = Flags::parse(&args);
    let Some((spec, paths)) = flags.operands.split_first() else {
        return Err(ShellError::usage("chown: missing operand"));
    };
    if paths.is_empty() {
        return Err(ShellError::usage(format!(
            "chown: missing operand after '{}'",
            spec
        )));
    }
    let owner = spec.split(':').next().unwrap_or(spec);
    if owner.is_empty() {
        return Err(ShellError::usage(format!("chown: invalid user: '{}'", spec)));
    }
    for operand in paths {
        let context = format!("chown: changing ownership of '{}'", operand);
        if !sh.is_root() {
            return Err(ShellError::permission_denied(context));
        }
        let abs = sh.abs(operand);
        sh.vfs
            .chown(&abs, owner, flags.has('R'))
            .map_err(|e| ShellError::fs(context, e))?;
    }
    Ok(Output::empty())
}

pub(super) fn chmod(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let Some((_mode, paths)) = inv.args.split_first() else {
        return Err(ShellError::usage("chmod: missing operand"));
    };
    if paths.is_empty() {
        return Err(ShellError::usage("chmod: missing operand"));
    }
    for operand in paths {
        let context = format!("chmod: changing permissions of '{}'", operand);
        let target = sh
            .vfs
            .canonicalize(&sh.abs(operand))
            .map_err(|e| ShellError::fs(format!("chmod: cannot access '{}'", operand), e))?;
        sh.check_modify(&target, &context)?;
    }
    Ok(Output::empty())
}

#[derive(Default)]
struct TreeCounts {
    dirs: usize,
    files: usize,
}

fn draw_tree(vfs: &Vfs, dir: &str, prefix: &str, out: &mut Vec<String>, counts: &mut TreeCounts) {
    let Ok(entries) = vfs.list(dir) else {
        return;
    };
    let visible: Vec<&DirEntry> = entries.iter().filter(|e| !e.name.starts_with('.')).collect();
    for (i, entry) in visible.iter().enumerate() {
        let last = i + 1 == visible.len();
        let (branch, indent) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        out.push(format!("{}{}{}", prefix, branch, entry.name));
        if entry.is_dir() {
            counts.dirs += 1;
            let child = path::join(dir, &entry.name);
            draw_tree(vfs, &child, &format!("{}{}", prefix, indent), out, counts);
        } else {
            counts.files += 1;
        }
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    format!("{} {}", n, if n == 1 { one } else { many })
}

pub(super) fn tree(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let operand = inv.args.first().map(String::as_str).unwrap_or(".");
    let abs = sh.abs(operand);
    let dir = sh
        .vfs
        .canonicalize(&abs)
        .map_err(|e| ShellError::fs(format!("tree: {}", operand), e))?;
    if !sh.vfs.is_dir(&dir) {
        return Err(ShellError::fs(
            format!("tree: {}", operand),
            VfsError::NotADirectory,
        ));
    }
    let mut lines = vec![operand.to_string()];
    let mut counts = TreeCounts::default();
    draw_tree(&sh.vfs, &dir, "", &mut lines, &mut counts);
    lines.push(String::new());
    lines.push(format!(
        "{}, {}",
        plural(counts.dirs, "directory", "directories"),
        plural(counts.files, "file", "files")
    ));
    Ok(Output::text(lines.join("\n")))
}

/// Shell-style glob over a single name: `*` and `?`.
pub(crate) fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();
    let (mut p, mut n) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while n < name.len() {
        match pattern.get(p) {
            Some('*') => {
                star = Some((p, n));
                p += 1;
            }
            Some(&c) if c == '?' || c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match star {
                Some((sp, sn)) => {
                    p = sp + 1;
                    n = sn + 1;
                    star = Some((sp, sn + 1));
                }
                None => return false,
            },
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}

pub(super) fn find(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let mut args = inv.args();
    let mut pattern = None;
    if let Some(i) = args.iter().position(|a| *a == "-name") {
        if i + 1 >= args.len() {
            return Err(ShellError::usage("find: missing argument to `-name'"));
        }
        pattern = Some(args.remove(i + 1));
        args.remove(i);
    }
    let operand = args.first().copied().unwrap_or(".");
    let root = sh
        .vfs
        .canonicalize(&sh.abs(operand))
        .map_err(|e| ShellError::fs(format!("find: '{}'", operand), e))?;
    let walked = sh
        .vfs
        .walk_tree(&root)
        .map_err(|e| ShellError::fs(format!("find: '{}'", operand), e))?;

    let base = operand.trim_end_matches('/');
    let found: Vec<String> = walked
        .into_iter()
        .filter(|(p, _)| pattern.map_or(true, |pat| glob_match(pat, path::file_name(p))))
        .map(|(p, _)| {
            let tail = if root == "/" { &p[..] } else { &p[root.len()..] };
            if tail.is_empty() {
                operand.to_string()
            } else {
                format!("{}{}", base, tail)
            }
        })
        .collect();
    Ok(Output::text(found.join("\n")))
}

pub(super) fn du(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    let operand = inv.args.first().map(String::as_str).unwrap_or(".");
    let walked = sh
        .vfs
        .walk_tree(&sh.abs(operand))
        .map_err(|e| ShellError::fs(format!("du: cannot access '{}'", operand), e))?;
    let bytes: usize = walked
        .iter()
        .map(|(_, meta)| if meta.is_dir() { DIR_BLOCK } else { meta.size })
        .sum();
    Ok(Output::text(format!("{}\t{}", bytes.div_ceil(1024), operand)))
}

pub(super) fn df(sh: &mut Engine, _inv: &Invocation) -> ShellResult<Output> {
    let usage = sh.vfs.usage();
    let total = u64::from(sh.config.memory_mb) * 1024;
    let used = ((usage.bytes + usage.directories * DIR_BLOCK) as u64)
        .div_ceil(1024)
        .min(total);
    let percent = if total == 0 { 0 } else { used * 100 / total };
    Ok(Output::text(format!(
        "Filesystem     1K-blocks    Used Available Use% Mounted on\nkpawndfs       {:>9} {:>7} {:>9} {:>3}% /",
        total,
        used,
        total - used,
        percent
    )))
}

fn describe(content: &[u8]) -> &'static str {
    if content.is_empty() {
        "empty"
    } else if content.starts_with(b"\x7fELF") {
        "ELF 64-bit LSB executable, x86-64"
    } else if content
        .iter()
        .all(|b| b.is_ascii_graphic() || b.is_ascii_whitespace())
    {
        "ASCII text"
    } else if std::str::from_utf8(content).is_ok() {
        "UTF-8 Unicode text"
    } else {
        "data"
    }
}

pub(super) fn file(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    if inv.args.is_empty() {
        return Err(ShellError::usage("usage: file <path>..."));
    }
    let lines: Vec<String> = inv
        .args
        .iter()
        .map(|operand| {
            let abs = sh.abs(operand);
            let kind = if sh.vfs.is_dir(&abs) {
                "directory"
            } else {
                match sh.vfs.read(&abs) {
                    Ok(content) => describe(content),
                    Err(_) => "cannot open (No such file or directory)",
                }
            };
            format!("{}: {}", operand, kind)
        })
        .collect();
    Ok(Output::text(lines.join("\n")))
}

pub(super) fn stat(sh: &mut Engine, inv: &Invocation) -> ShellResult<Output> {
    if inv.args.is_empty() {
        return Err(ShellError::usage("stat: missing operand"));
    }
    let mut blocks = Vec::new();
    for operand in &inv.args {
        let meta = sh
            .vfs
            .stat(&sh.abs(operand))
            .map_err(|e| ShellError::fs(format!("stat: cannot statx '{}'", operand), e))?;
        let kind = if meta.is_dir() {
            "directory"
        } else if meta.size == 0 {
            "regular empty file"
        } else {
            "regular file"
        };
        blocks.push(format!(
            "  File: {}\n  Size: {:<10} {}\nAccess: ({})  Owner: {}",
            operand,
            meta.size,
            kind,
            perm_string(meta.is_dir()),
            meta.owner
        ));
    }
    Ok(Output::text(blocks.join("\n")))
}
