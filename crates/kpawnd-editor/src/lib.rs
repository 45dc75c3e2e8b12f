//! Nano-style text editor buffer for kpawnd.
//!
//! [`NanoEditor`] owns its text until it is saved through a
//! [`kpawnd_vfs::Vfs`], at which point the VFS holds the authoritative copy.
//! Rendering and key mapping belong to the caller.

pub mod error;
pub mod nano;
pub mod viewport;

pub use error::{EditorError, EditorResult};
pub use nano::{NanoEditor, DEFAULT_WINDOW};
