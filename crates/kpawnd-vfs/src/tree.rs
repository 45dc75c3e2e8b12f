//! The in-memory tree.
//!
//! Every mutating operation validates fully before touching the tree, so a
//! call either applies completely or leaves the node set unchanged.

use tracing::trace;

use crate::error::{VfsError, VfsResult};
use crate::node::{DirEntry, Metadata, Node, NodeKind, Usage};
use crate::path::{self, Segment};

/// Owner recorded on the root directory.
pub const ROOT_OWNER: &str = "root";

/// Canonical location of a path: the parent's components plus the leaf name.
/// The leaf is `None` when the path resolves to root.
struct Location {
    parent: Vec<String>,
    leaf: Option<String>,
}

impl Location {
    fn components(&self) -> Vec<String> {
        let mut out = self.parent.clone();
        out.extend(self.leaf.iter().cloned());
        out
    }
}

/// Hierarchical file store with insertion-ordered directories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Vfs {
    pub(crate) root: Node,
}

impl Default for Vfs {
    fn default() -> Self {
        Self::new()
    }
}

impl Vfs {
    /// Create a VFS holding only the root directory.
    pub fn new() -> Self {
        Self {
            root: Node::directory("", ROOT_OWNER),
        }
    }

    pub(crate) fn from_root(root: Node) -> Self {
        Self { root }
    }

    /// The root node.
    pub fn root(&self) -> &Node {
        &self.root
    }

    // ========== Resolution ==========

    fn node(&self, components: &[String]) -> Option<&Node> {
        components
            .iter()
            .try_fold(&self.root, |node, name| node.child(name))
    }

    fn node_mut(&mut self, components: &[String]) -> Option<&mut Node> {
        let mut node = &mut self.root;
        for name in components {
            node = node.child_mut(name)?;
        }
        Some(node)
    }

    /// Walk `segments`, requiring every visited segment to exist.
    fn walk(&self, segments: &[Segment<'_>]) -> VfsResult<Vec<String>> {
        let mut stack: Vec<String> = Vec::new();
        for segment in segments {
            let current = self.node(&stack).ok_or(VfsError::PathNotFound)?;
            if !current.is_dir() {
                return Err(VfsError::NotADirectory);
            }
            match segment {
                Segment::Current => {}
                Segment::Parent => {
                    stack.pop();
                }
                Segment::Name(name) => {
                    if current.child(name).is_none() {
                        return Err(VfsError::PathNotFound);
                    }
                    stack.push((*name).to_string());
                }
            }
        }
        Ok(stack)
    }

    /// Resolve everything but the final name; the parent must be a directory.
    fn locate(&self, path: &str) -> VfsResult<Location> {
        let segments = path::segments(path)?;
        match segments.split_last() {
            Some((Segment::Name(leaf), parent_segments)) => {
                let parent = self.walk(parent_segments)?;
                match self.node(&parent) {
                    Some(node) if node.is_dir() => Ok(Location {
                        parent,
                        leaf: Some((*leaf).to_string()),
                    }),
                    Some(_) => Err(VfsError::NotADirectory),
                    None => Err(VfsError::PathNotFound),
                }
            }
            _ => {
                let mut components = self.walk(&segments)?;
                let leaf = components.pop();
                Ok(Location {
                    parent: components,
                    leaf,
                })
            }
        }
    }

    /// Resolve `path` to its node.
    pub fn resolve(&self, path: &str) -> VfsResult<&Node> {
        let components = self.walk(&path::segments(path)?)?;
        self.node(&components).ok_or(VfsError::PathNotFound)
    }

    /// Resolve `path` to its canonical absolute form.
    pub fn canonicalize(&self, path: &str) -> VfsResult<String> {
        let components = self.walk(&path::segments(path)?)?;
        Ok(path::to_path(&components))
    }

    pub fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_ok()
    }

    pub fn is_dir(&self, path: &str) -> bool {
        self.resolve(path).map(Node::is_dir).unwrap_or(false)
    }

    pub fn stat(&self, path: &str) -> VfsResult<Metadata> {
        self.resolve(path).map(Node::metadata)
    }

    // ========== File Operations ==========

    /// Read a file's content.
    pub fn read(&self, path: &str) -> VfsResult<&[u8]> {
        self.resolve(path)?.content().ok_or(VfsError::IsADirectory)
    }

    /// Read a file as text, replacing invalid UTF-8.
    pub fn read_to_string(&self, path: &str) -> VfsResult<String> {
        Ok(String::from_utf8_lossy(self.read(path)?).into_owned())
    }

    /// Create or overwrite a file. An existing file keeps its owner.
    pub fn write(&mut self, path: &str, content: &[u8], owner: &str) -> VfsResult<()> {
        self.put(path, owner, |existing| {
            existing.clear();
            existing.extend_from_slice(content);
        })
    }

    /// Append to a file, creating it when missing.
    pub fn append(&mut self, path: &str, content: &[u8], owner: &str) -> VfsResult<()> {
        self.put(path, owner, |existing| existing.extend_from_slice(content))
    }

    /// Create an empty file if nothing exists at `path`.
    pub fn touch(&mut self, path: &str, owner: &str) -> VfsResult<()> {
        if self.exists(path) {
            return Ok(());
        }
        self.put(path, owner, |_| {})
    }

    fn put(&mut self, path: &str, owner: &str, edit: impl FnOnce(&mut Vec<u8>)) -> VfsResult<()> {
        let loc = self.locate(path)?;
        let leaf = loc.leaf.clone().ok_or(VfsError::IsADirectory)?;
        path::validate_name(&leaf)?;

        let parent = self.node_mut(&loc.parent).ok_or(VfsError::PathNotFound)?;
        match parent.child_mut(&leaf) {
            Some(node) => match &mut node.kind {
                NodeKind::File { content } => edit(content),
                NodeKind::Directory { .. } => return Err(VfsError::IsADirectory),
            },
            None => {
                let mut content = Vec::new();
                edit(&mut content);
                parent
                    .children_mut()
                    .ok_or(VfsError::NotADirectory)?
                    .push(Node::file(leaf, owner, content));
            }
        }
        trace!(path, "vfs write");
        Ok(())
    }

    // ========== Directory Operations ==========

    /// Create a single directory. Intermediate directories are not created.
    pub fn mkdir(&mut self, path: &str, owner: &str) -> VfsResult<()> {
        let loc = self.locate(path)?;
        let leaf = loc.leaf.clone().ok_or(VfsError::AlreadyExists)?;
        path::validate_name(&leaf)?;

        let parent = self.node_mut(&loc.parent).ok_or(VfsError::PathNotFound)?;
        if parent.child(&leaf).is_some() {
            return Err(VfsError::AlreadyExists);
        }
        parent
            .children_mut()
            .ok_or(VfsError::NotADirectory)?
            .push(Node::directory(leaf, owner));
        trace!(path, "vfs mkdir");
        Ok(())
    }

    /// Create a directory and any missing ancestors.
    pub fn mkdir_all(&mut self, path: &str, owner: &str) -> VfsResult<()> {
        let segments = path::segments(path)?;

        // Find the deepest existing prefix, then check the rest before creating.
        let mut existing: Vec<String> = Vec::new();
        let mut rest: Vec<&str> = Vec::new();
        for segment in &segments {
            if !rest.is_empty() {
                match segment {
                    Segment::Name(name) => rest.push(*name),
                    _ => {
                        return Err(VfsError::invalid_path(
                            "relative segment after a missing directory",
                        ))
                    }
                }
                continue;
            }
            let current = self.node(&existing).ok_or(VfsError::PathNotFound)?;
            if !current.is_dir() {
                return Err(VfsError::NotADirectory);
            }
            match segment {
                Segment::Current => {}
                Segment::Parent => {
                    existing.pop();
                }
                Segment::Name(name) => match current.child(name) {
                    Some(_) => existing.push((*name).to_string()),
                    None => rest.push(*name),
                },
            }
        }

        let base = self.node(&existing).ok_or(VfsError::PathNotFound)?;
        if !base.is_dir() {
            return Err(VfsError::NotADirectory);
        }
        for name in &rest {
            path::validate_name(name)?;
        }

        for name in rest {
            self.node_mut(&existing)
                .and_then(Node::children_mut)
                .ok_or(VfsError::NotADirectory)?
                .push(Node::directory(name, owner));
            existing.push(name.to_string());
        }
        Ok(())
    }

    /// List a directory in insertion order.
    pub fn list(&self, path: &str) -> VfsResult<Vec<DirEntry>> {
        let node = self.resolve(path)?;
        if !node.is_dir() {
            return Err(VfsError::NotADirectory);
        }
        Ok(node.children().iter().map(DirEntry::from_node).collect())
    }

    /// Remove a node. Root can never be removed.
    pub fn remove(&mut self, path: &str, recursive: bool) -> VfsResult<()> {
        let loc = self.locate(path)?;
        let leaf = loc.leaf.ok_or(VfsError::PermissionDenied)?;

        let parent = self.node_mut(&loc.parent).ok_or(VfsError::PathNotFound)?;
        let target = parent.child(&leaf).ok_or(VfsError::PathNotFound)?;
        if target.is_dir() && !recursive && !target.children().is_empty() {
            return Err(VfsError::NotEmpty);
        }
        if let Some(children) = parent.children_mut() {
            children.retain(|c| c.name != leaf);
        }
        trace!(path, recursive, "vfs remove");
        Ok(())
    }

    // ========== Moving and Copying ==========

    /// Move `from` to `to`. An existing file at `to` is replaced by a file;
    /// an existing directory at `to` is never replaced.
    pub fn rename(&mut self, from: &str, to: &str) -> VfsResult<()> {
        let src = self.locate(from)?;
        let src_leaf = src.leaf.clone().ok_or(VfsError::PermissionDenied)?;
        let src_components = src.components();
        let source = self.node(&src_components).ok_or(VfsError::PathNotFound)?;
        let source_is_dir = source.is_dir();

        let dst = self.locate(to)?;
        let dst_leaf = dst.leaf.clone().ok_or(VfsError::AlreadyExists)?;
        path::validate_name(&dst_leaf)?;
        let dst_components = dst.components();

        if dst_components == src_components {
            return Ok(());
        }
        if dst_components.starts_with(&src_components) {
            return Err(VfsError::invalid_path(
                "cannot move a directory into itself",
            ));
        }
        match self.node(&dst_components) {
            Some(existing) if existing.is_dir() => return Err(VfsError::AlreadyExists),
            Some(_) if source_is_dir => return Err(VfsError::NotADirectory),
            _ => {}
        }

        let mut moved = self.detach(&src.parent, &src_leaf)?;
        moved.name = dst_leaf.clone();
        let parent = self
            .node_mut(&dst.parent)
            .and_then(Node::children_mut)
            .ok_or(VfsError::PathNotFound)?;
        match parent.iter().position(|c| c.name == dst_leaf) {
            Some(i) => parent[i] = moved,
            None => parent.push(moved),
        }
        Ok(())
    }

    /// Copy `from` to `to`, recursively for directories. The copy is owned
    /// by `owner`. A file may overwrite a file; nothing overwrites a directory.
    pub fn copy(&mut self, from: &str, to: &str, owner: &str) -> VfsResult<()> {
        let src_components = self.walk(&path::segments(from)?)?;
        let source = self
            .node(&src_components)
            .ok_or(VfsError::PathNotFound)?
            .clone();

        let dst = self.locate(to)?;
        let dst_leaf = dst.leaf.clone().ok_or(VfsError::AlreadyExists)?;
        path::validate_name(&dst_leaf)?;
        let dst_components = dst.components();

        if source.is_dir() && dst_components.starts_with(&src_components) {
            return Err(VfsError::invalid_path(
                "cannot copy a directory into itself",
            ));
        }
        match self.node(&dst_components) {
            Some(existing) if existing.is_dir() => return Err(VfsError::IsADirectory),
            Some(_) if source.is_dir() => return Err(VfsError::AlreadyExists),
            _ => {}
        }

        let mut copy = source;
        copy.name = dst_leaf.clone();
        copy.set_owner_recursive(owner);
        let parent = self
            .node_mut(&dst.parent)
            .and_then(Node::children_mut)
            .ok_or(VfsError::PathNotFound)?;
        match parent.iter().position(|c| c.name == dst_leaf) {
            Some(i) => parent[i] = copy,
            None => parent.push(copy),
        }
        Ok(())
    }

    fn detach(&mut self, parent: &[String], leaf: &str) -> VfsResult<Node> {
        let children = self
            .node_mut(parent)
            .and_then(Node::children_mut)
            .ok_or(VfsError::PathNotFound)?;
        let index = children
            .iter()
            .position(|c| c.name == leaf)
            .ok_or(VfsError::PathNotFound)?;
        Ok(children.remove(index))
    }

    // ========== Ownership ==========

    /// Change the owner of a node, optionally for its whole subtree.
    pub fn chown(&mut self, path: &str, owner: &str, recursive: bool) -> VfsResult<()> {
        let components = self.walk(&path::segments(path)?)?;
        let node = self.node_mut(&components).ok_or(VfsError::PathNotFound)?;
        if recursive {
            node.set_owner_recursive(owner);
        } else {
            node.owner = owner.to_string();
        }
        Ok(())
    }

    // ========== Traversal ==========

    /// Pre-order walk of `path` and everything below it.
    pub fn walk_tree(&self, path: &str) -> VfsResult<Vec<(String, Metadata)>> {
        let components = self.walk(&path::segments(path)?)?;
        let start = self.node(&components).ok_or(VfsError::PathNotFound)?;
        let mut out = Vec::new();
        collect(start, path::to_path(&components), &mut out);
        Ok(out)
    }

    /// Totals over the whole tree.
    pub fn usage(&self) -> Usage {
        let mut usage = Usage::default();
        tally(&self.root, &mut usage);
        usage
    }
}

fn collect(node: &Node, at: String, out: &mut Vec<(String, Metadata)>) {
    let children: Vec<(String, &Node)> = node
        .children()
        .iter()
        .map(|c| (path::join(&at, c.name()), c))
        .collect();
    out.push((at, node.metadata()));
    for (child_path, child) in children {
        collect(child, child_path, out);
    }
}

fn tally(node: &Node, usage: &mut Usage) {
    if node.is_dir() {
        usage.directories += 1;
        for child in node.children() {
            tally(child, usage);
        }
    } else {
        usage.files += 1;
        usage.bytes += node.size();
    }
}

#[cfg(test)]
#[path = "tree_tests.rs"]
mod tree_tests;
