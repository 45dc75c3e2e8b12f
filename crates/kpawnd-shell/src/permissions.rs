//! Who may change what.
//!
//! There are no permission bits. Root may do anything; everyone else may
//! change nodes they own, and anything under `/tmp` or their home.

use kpawnd_vfs::{Vfs, ROOT_OWNER};

/// Paths whose loss brings the system down.
pub const CRITICAL_PATHS: [&str; 2] = ["/bin/sh", "/sbin/init"];

/// Directories open to every user.
const SHARED_DIRS: [&str; 1] = ["/tmp"];

/// The identity a command runs as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Principal<'a> {
    pub user: &'a str,
    pub home: &'a str,
}

impl Principal<'_> {
    pub fn is_root(&self) -> bool {
        self.user == ROOT_OWNER
    }

    /// Whether `path` (absolute, canonical) may be created, written or
    /// removed. A missing path is judged by its parent.
    pub fn may_modify(&self, vfs: &Vfs, path: &str) -> bool {
        if self.is_root() {
            return true;
        }
        if within(path, self.home) || SHARED_DIRS.iter().any(|dir| within(path, dir)) {
            return true;
        }
        let judged = match vfs.resolve(path) {
            Ok(node) => node.owner().to_string(),
            Err(_) => match vfs.resolve(parent_of(path)) {
                Ok(parent) => parent.owner().to_string(),
                Err(_) => return false,
            },
        };
        judged == self.user
    }
}

/// `path` is `dir` or below it.
pub fn within(path: &str, dir: &str) -> bool {
    if dir == "/" {
        return true;
    }
    path == dir
        || path
            .strip_prefix(dir)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Whether removing or moving `path` takes a critical path with it.
pub fn is_critical(path: &str) -> bool {
    CRITICAL_PATHS.iter().any(|critical| within(critical, path))
}

fn parent_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) | None => "/",
        Some(i) => &path[..i],
    }
}
