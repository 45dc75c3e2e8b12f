//! Tab completion of the last word on a line.

use kpawnd_vfs::Vfs;

use crate::builtins;

/// Candidates for the last whitespace-delimited word of `partial`.
///
/// A word without `/` matches builtin names first, then entries of `cwd`.
/// A word with `/` matches entries of the directory it names and each
/// candidate keeps that directory prefix. Dotfiles are offered only when
/// the word starts with `.`.
pub fn complete(vfs: &Vfs, cwd: &str, home: &str, partial: &str) -> Vec<String> {
    let word = match partial.rfind(char::is_whitespace) {
        Some(i) => &partial[i + 1..],
        None => partial,
    };

    let mut matches: Vec<String> = Vec::new();
    let (dir, prefix, keep) = match word.rfind('/') {
        Some(i) => {
            let (dir_part, name) = word.split_at(i + 1);
            (expand_dir(dir_part, cwd, home), name, dir_part)
        }
        None => {
            matches.extend(builtins::names_with_prefix(word).map(str::to_string));
            (cwd.to_string(), word, "")
        }
    };

    if let Ok(entries) = vfs.list(&dir) {
        for entry in entries {
            if !entry.name.starts_with(prefix) {
                continue;
            }
            if entry.name.starts_with('.') && !prefix.starts_with('.') {
                continue;
            }
            let candidate = format!("{}{}", keep, entry.name);
            if !matches.contains(&candidate) {
                matches.push(candidate);
            }
        }
    }
    matches
}

/// Absolute form of the directory part of a word, `~` included.
fn expand_dir(dir_part: &str, cwd: &str, home: &str) -> String {
    let dir_part = match dir_part.strip_prefix('~') {
        Some(rest) => format!("{}{}", home, rest),
        None => dir_part.to_string(),
    };
    if dir_part.starts_with('/') {
        dir_part
    } else if cwd == "/" {
        format!("/{}", dir_part)
    } else {
        format!("{}/{}", cwd, dir_part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kpawnd_vfs::ROOT_OWNER;

    fn vfs() -> Vfs {
        let mut vfs = Vfs::new();
        vfs.mkdir_all("/home/alice/docs", "alice").unwrap();
        vfs.write("/home/alice/notes.txt", b"", "alice").unwrap();
        vfs.write("/home/alice/.secret", b"", "alice").unwrap();
        vfs.write("/home/alice/docs/plan.md", b"", "alice").unwrap();
        vfs.mkdir_all("/etc", ROOT_OWNER).unwrap();
        vfs.write("/etc/hostname", b"", ROOT_OWNER).unwrap();
        vfs.write("/etc/hosts", b"", ROOT_OWNER).unwrap();
        vfs
    }

    fn run(partial: &str) -> Vec<String> {
        complete(&vfs(), "/home/alice", "/home/alice", partial)
    }

    #[test]
    fn test_builtins_then_entries() {
        assert_eq!(run("whoa"), vec!["whoami"]);
        assert_eq!(run("no"), vec!["notes.txt"]);
        assert_eq!(run("cat no"), vec!["notes.txt"]);
        assert_eq!(run("d"), vec!["du", "df", "diff", "doom", "dig", "docs"]);
    }

    #[test]
    fn test_nested_directory() {
        assert_eq!(run("cat docs/p"), vec!["docs/plan.md"]);
        assert_eq!(run("cat /etc/ho"), vec!["/etc/hostname", "/etc/hosts"]);
        assert_eq!(run("ls ~/do"), vec!["~/docs"]);
        assert!(run("cat /missing/x").is_empty());
    }

    #[test]
    fn test_dotfiles_need_a_dot() {
        assert!(!run("cat ").contains(&".secret".to_string()));
        assert_eq!(run("cat .s"), vec![".secret"]);
    }
}
