//! kpawnd Virtual Filesystem
//!
//! An in-memory tree of files and directories backing the kpawnd terminal:
//!
//! - **Tree**: [`Vfs`] with insertion-ordered directories and per-node owners
//! - **Path**: absolute path segments, walked lexically through `.` and `..`
//! - **Snapshot**: lossless export to a single string and import back
//!
//! # Design Principles
//!
//! 1. **Atomic mutations**: every operation validates before it mutates
//! 2. **No policy**: ownership is recorded, access decisions belong to the shell
//! 3. **Single owner**: one engine owns one tree; there is no interior mutability
//!
//! # Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                        Vfs                            │
//! │   resolve · read · write · append · touch · mkdir     │
//! │   list · remove · rename · copy · chown · walk_tree   │
//! │                         │                             │
//! │                         ▼                             │
//! │   Node { name, owner, File { content } |              │
//! │                      Directory { children } }         │
//! │                         │                             │
//! │                         ▼                             │
//! │   Snapshot { version, root }  ⇄  JSON string          │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod node;
pub mod path;
pub mod serde_helpers;
pub mod snapshot;
pub mod tree;

pub use error::{VfsError, VfsResult};
pub use node::{DirEntry, Metadata, Node, NodeKind, NodeType, Usage};
pub use snapshot::{Snapshot, SNAPSHOT_VERSION};
pub use tree::{Vfs, ROOT_OWNER};
