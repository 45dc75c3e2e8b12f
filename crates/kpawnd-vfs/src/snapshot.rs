//! Export and import of the whole tree as one string.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{VfsError, VfsResult};
use crate::node::Node;
use crate::path;
use crate::tree::Vfs;

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Serialized form of a [`Vfs`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub root: Node,
}

impl Vfs {
    /// Serialize the whole tree: names, kinds, contents and owners.
    pub fn export(&self) -> VfsResult<String> {
        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            root: self.root.clone(),
        };
        serde_json::to_string(&snapshot).map_err(|e| VfsError::snapshot(e.to_string()))
    }

    /// Rebuild a tree from [`Vfs::export`] output.
    pub fn import(blob: &str) -> VfsResult<Self> {
        let snapshot: Snapshot =
            serde_json::from_str(blob).map_err(|e| VfsError::snapshot(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(VfsError::snapshot(format!(
                "unsupported version {}",
                snapshot.version
            )));
        }
        if !snapshot.root.is_dir() {
            return Err(VfsError::snapshot("root is not a directory"));
        }
        for child in snapshot.root.children() {
            validate(child)?;
        }
        check_unique(&snapshot.root)?;

        let mut root = snapshot.root;
        root.name = String::new();
        info!(bytes = blob.len(), "vfs imported");
        Ok(Vfs::from_root(root))
    }
}

fn validate(node: &Node) -> VfsResult<()> {
    path::validate_name(node.name())?;
    check_unique(node)?;
    node.children().iter().try_for_each(validate)
}

fn check_unique(node: &Node) -> VfsResult<()> {
    let children = node.children();
    for (i, child) in children.iter().enumerate() {
        if children[..i].iter().any(|c| c.name() == child.name()) {
            return Err(VfsError::snapshot(format!(
                "duplicate entry '{}'",
                child.name()
            )));
        }
    }
    Ok(())
}
