//! Tree nodes and the metadata views handed out to callers.

use serde::{Deserialize, Serialize};

use crate::serde_helpers::utf8_or_bytes;

/// Kind of a node, without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    File,
    Directory,
}

/// Payload of a node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    File {
        #[serde(with = "utf8_or_bytes")]
        content: Vec<u8>,
    },
    Directory {
        /// Children in insertion order
        children: Vec<Node>,
    },
}

/// A file or directory in the tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub(crate) name: String,
    pub(crate) owner: String,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub(crate) fn file(name: impl Into<String>, owner: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            kind: NodeKind::File { content },
        }
    }

    pub(crate) fn directory(name: impl Into<String>, owner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: owner.into(),
            kind: NodeKind::Directory {
                children: Vec::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn node_type(&self) -> NodeType {
        match self.kind {
            NodeKind::File { .. } => NodeType::File,
            NodeKind::Directory { .. } => NodeType::Directory,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    /// File content, or `None` for directories.
    pub fn content(&self) -> Option<&[u8]> {
        match &self.kind {
            NodeKind::File { content } => Some(content),
            NodeKind::Directory { .. } => None,
        }
    }

    /// Children in insertion order; empty for files.
    pub fn children(&self) -> &[Node] {
        match &self.kind {
            NodeKind::Directory { children } => children,
            NodeKind::File { .. } => &[],
        }
    }

    /// Byte length for files, child count for directories.
    pub fn size(&self) -> usize {
        match &self.kind {
            NodeKind::File { content } => content.len(),
            NodeKind::Directory { children } => children.len(),
        }
    }

    pub fn metadata(&self) -> Metadata {
        Metadata {
            node_type: self.node_type(),
            size: self.size(),
            owner: self.owner.clone(),
        }
    }

    pub(crate) fn child(&self, name: &str) -> Option<&Node> {
        self.children().iter().find(|c| c.name == name)
    }

    pub(crate) fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        match &mut self.kind {
            NodeKind::Directory { children } => children.iter_mut().find(|c| c.name == name),
            NodeKind::File { .. } => None,
        }
    }

    /// Mutable child list; `None` for files.
    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match &mut self.kind {
            NodeKind::Directory { children } => Some(children),
            NodeKind::File { .. } => None,
        }
    }

    /// Reassign this node and everything below it to `owner`.
    pub(crate) fn set_owner_recursive(&mut self, owner: &str) {
        self.owner = owner.to_string();
        if let NodeKind::Directory { children } = &mut self.kind {
            for child in children {
                child.set_owner_recursive(owner);
            }
        }
    }

    /// Total bytes stored at or below this node.
    pub fn total_bytes(&self) -> usize {
        match &self.kind {
            NodeKind::File { content } => content.len(),
            NodeKind::Directory { children } => children.iter().map(Node::total_bytes).sum(),
        }
    }
}

/// Metadata returned by `stat`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub node_type: NodeType,
    pub size: usize,
    pub owner: String,
}

impl Metadata {
    pub fn is_dir(&self) -> bool {
        self.node_type == NodeType::Directory
    }
}

/// Entry returned by `list`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    pub name: String,
    pub node_type: NodeType,
    pub size: usize,
    pub owner: String,
}

impl DirEntry {
    pub(crate) fn from_node(node: &Node) -> Self {
        Self {
            name: node.name.clone(),
            node_type: node.node_type(),
            size: node.size(),
            owner: node.owner.clone(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.node_type == NodeType::Directory
    }
}

/// Aggregate counts for `df`-style reporting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Usage {
    pub files: usize,
    pub directories: usize,
    pub bytes: usize,
}
