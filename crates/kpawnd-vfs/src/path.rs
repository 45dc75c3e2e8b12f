//! Path utilities for the VFS.
//!
//! Paths are absolute and `/`-separated. `.` and `..` are kept as segments
//! here; the tree resolves them while walking so that a missing intermediate
//! directory is reported instead of being normalized away.

use crate::error::{VfsError, VfsResult};

/// One segment of an absolute path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    /// `.`
    Current,
    /// `..`
    Parent,
    /// Anything else
    Name(&'a str),
}

/// Split an absolute path into segments, skipping empty ones.
pub fn segments(path: &str) -> VfsResult<Vec<Segment<'_>>> {
    if !path.starts_with('/') {
        return Err(VfsError::invalid_path(format!(
            "path must be absolute: {}",
            path
        )));
    }

    Ok(path
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s {
            "." => Segment::Current,
            ".." => Segment::Parent,
            name => Segment::Name(name),
        })
        .collect())
}

/// Check that `name` can be stored as a directory entry.
pub fn validate_name(name: &str) -> VfsResult<()> {
    if name.is_empty() {
        return Err(VfsError::invalid_path("empty name"));
    }
    if name == "." || name == ".." {
        return Err(VfsError::invalid_path(format!("reserved name: {}", name)));
    }
    if name.contains('/') || name.contains('\0') {
        return Err(VfsError::invalid_path(format!("bad character in {}", name)));
    }
    Ok(())
}

/// Render canonical components back to an absolute path.
pub fn to_path<S: AsRef<str>>(components: &[S]) -> String {
    if components.is_empty() {
        return String::from("/");
    }
    let mut out = String::new();
    for c in components {
        out.push('/');
        out.push_str(c.as_ref());
    }
    out
}

/// Join a directory path and a child name.
pub fn join(parent: &str, name: &str) -> String {
    if parent.ends_with('/') {
        format!("{}{}", parent, name)
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Final component of a path, or `/` for root.
pub fn file_name(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("/")
}
