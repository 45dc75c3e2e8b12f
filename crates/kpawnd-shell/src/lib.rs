//! kpawnd shell.
//!
//! The command interpreter at the centre of the kpawnd terminal:
//!
//! - **Engine**: [`Engine`] routes each submitted line to the login prompt,
//!   the sudo prompt or the builtin table, and owns the working directory
//! - **Builtins**: a fixed table of commands over the VFS
//! - **Session**: login stages and sudo escalation
//! - **Output**: plain text, a failure, or an [`Action`] the host performs
//!
//! # Invariants
//!
//! 1. No command runs before login completes
//! 2. While a sudo password is pending, the next line is consumed as the
//!    password and never recorded
//! 3. Once panicked, every line returns the same `KERNEL_PANIC` until
//!    [`Engine::reboot`]
//! 4. A failing command never takes the engine down; errors come back as
//!    [`Output::Failed`]

pub mod builtins;
pub mod completion;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod parser;
pub mod permissions;
pub mod process;
pub mod python;
pub mod session;
pub mod skeleton;

pub use builtins::{lookup, Builtin, Category, BUILTINS};
pub use config::EngineConfig;
pub use engine::{Engine, HostInfo, INIT_PANIC};
pub use error::{ShellError, ShellResult};
pub use output::{Action, Output, Program};
pub use python::{PythonRepl, ReplOutcome, Value};
pub use session::{Identity, LoginStage, Session};
