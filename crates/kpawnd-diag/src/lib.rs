//! Diagnostics shown outside the shell proper: the memtest86+ screen and
//! the neofetch report. Both are pure generators over the inputs they are
//! given.

pub mod memtest;
pub mod sysinfo;

pub use memtest::{Memtest, TESTS};
pub use sysinfo::{format_uptime, Logo, SysInfo};
