//! kpawnd boot stage.
//!
//! Two independent, tick-driven pieces:
//!
//! - [`grub`]: the GRUB-style menu with its main, advanced, entry-editor and
//!   command-line screens, plus rescue mode when `grub.cfg` is gone
//! - [`bootlog`]: the deterministic firmware/kernel/init log played after
//!   the menu hands off
//!
//! Neither owns a clock. The caller decides how often to tick.

pub mod bootlog;
pub mod config;
pub mod grub;

pub use bootlog::{BootLine, BootLog, BootParams, BootPath, LineStatus, BOOT_COMPLETE};
pub use config::{BootConfig, DEFAULT_TIMEOUT_SECS, GRUB_CFG_PATH};
pub use grub::{BootTarget, GrubMenu, MenuEvent, MenuKey, MenuMode};
