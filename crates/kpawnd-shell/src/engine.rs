//! The terminal engine.
//!
//! One [`Engine`] is one browser tab: it owns the filesystem, the session,
//! the working directory and every piece of transient state (sudo prompt,
//! Python prompt, boot playback, kernel panic). Input arrives one line at a
//! time through [`Engine::exec`]; nothing happens between calls except what
//! [`Engine::tick`] advances.
//!
//! # Line routing
//!
//! ```text
//! exec(line)
//!   ├─ panicked?            → KERNEL_PANIC
//!   ├─ login not done?      → login prompt
//!   ├─ sudo pending?        → password check → run parked command as root
//!   └─ otherwise            → history → alias → parse → builtin → redirect
//! ```

use std::collections::BTreeMap;

use kpawnd_boot::{BootLog, BootPath, GrubMenu, GRUB_CFG_PATH};
use kpawnd_diag::{Memtest, SysInfo};
use kpawnd_editor::{EditorError, NanoEditor};
use kpawnd_vfs::{path, DirEntry, Vfs, VfsError, ROOT_OWNER};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::builtins;
use crate::completion;
use crate::config::EngineConfig;
use crate::error::{ShellError, ShellResult};
use crate::output::{Action, Output};
use crate::parser::{self, Redirect};
use crate::permissions::{is_critical, Principal};
use crate::process::{MemoryUsage, ProcessTable};
use crate::python::{PythonRepl, ReplOutcome};
use crate::session::{Identity, LoginStage, LoginStep, Session};
use crate::skeleton::{self, home_dir};

/// Message carried by the panic raised when init or its shell disappears.
pub const INIT_PANIC: &str = "Attempted to kill init!";

/// Facts about the host that only the browser knows.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostInfo {
    pub resolution: String,
    pub terminal: String,
    pub cpu: String,
}

/// The simulated machine behind one terminal.
#[derive(Debug)]
pub struct Engine {
    pub(crate) config: EngineConfig,
    pub(crate) vfs: Vfs,
    pub(crate) session: Session,
    pub(crate) cwd: String,
    pub(crate) env: BTreeMap<String, String>,
    pub(crate) aliases: BTreeMap<String, String>,
    pub(crate) history: Vec<String>,
    pub(crate) processes: ProcessTable,
    pub(crate) uptime_secs: u64,
    /// A sudo-approved command is running
    elevated: bool,
    panic: Option<String>,
    python: Option<PythonRepl>,
    boot: Option<BootLog>,
    booted: bool,
    host: HostInfo,
}

impl Engine {
    /// A freshly installed machine waiting at the login prompt.
    pub fn new(config: EngineConfig) -> ShellResult<Self> {
        let vfs = skeleton::seed(&config, &config.default_user)
            .map_err(|e| ShellError::fs("kpawnd: seeding filesystem", e))?;
        Ok(Self::with_vfs(config, vfs))
    }

    /// A machine whose filesystem was saved earlier with [`export_vfs`].
    ///
    /// [`export_vfs`]: Engine::export_vfs
    pub fn restore(config: EngineConfig, blob: &str) -> ShellResult<Self> {
        let vfs = Vfs::import(blob).map_err(|e| ShellError::fs("kpawnd: import", e))?;
        info!("filesystem restored from snapshot");
        Ok(Self::with_vfs(config, vfs))
    }

    fn with_vfs(config: EngineConfig, vfs: Vfs) -> Self {
        let user = config.default_user.clone();
        let home = home_dir(&user);
        let mut engine = Self {
            processes: ProcessTable::boot(&user),
            cwd: home,
            env: BTreeMap::new(),
            aliases: BTreeMap::from([
                ("la".to_string(), "ls -a".to_string()),
                ("ll".to_string(), "ls -l".to_string()),
            ]),
            history: Vec::new(),
            session: Session::new(),
            uptime_secs: 0,
            elevated: false,
            panic: None,
            python: None,
            boot: None,
            booted: false,
            host: HostInfo::default(),
            vfs,
            config,
        };
        engine.reset_env(&user);
        engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn vfs(&self) -> &Vfs {
        &self.vfs
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    // ========== Identity ==========

    /// The logged-in user, or the configured default before login.
    pub fn login_user(&self) -> String {
        self.session
            .username()
            .unwrap_or(&self.config.default_user)
            .to_string()
    }

    /// The user commands currently run as.
    pub fn user(&self) -> String {
        if self.elevated {
            ROOT_OWNER.to_string()
        } else {
            self.login_user()
        }
    }

    pub fn is_root(&self) -> bool {
        self.elevated || self.login_user() == ROOT_OWNER
    }

    /// Home of the effective user.
    pub fn home(&self) -> String {
        home_dir(&self.user())
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    pub fn login_stage(&self) -> LoginStage {
        self.session.stage()
    }

    /// Log in directly as `username`, skipping the prompt.
    pub fn set_user(&mut self, username: &str) -> ShellResult<()> {
        self.session.set_user(username);
        self.on_login(username)
    }

    pub fn set_user_password(&mut self, password: &str) {
        self.session.set_password(password);
    }

    pub fn is_waiting_for_sudo(&self) -> bool {
        self.session.is_waiting_for_sudo()
    }

    /// Whether the next line should be masked on screen.
    pub fn input_is_secret(&self) -> bool {
        self.session.stage() == LoginStage::Password || self.session.is_waiting_for_sudo()
    }

    fn reset_env(&mut self, user: &str) {
        let home = home_dir(user);
        for (key, value) in [
            ("HOME", home.as_str()),
            ("USER", user),
            ("LOGNAME", user),
            ("SHELL", "/bin/sh"),
            ("PATH", "/bin:/sbin"),
            ("PWD", self.cwd.as_str()),
            ("TERM", "xterm-256color"),
        ] {
            self.env.insert(key.to_string(), value.to_string());
        }
        let hostname = self.hostname();
        self.env.insert("HOSTNAME".to_string(), hostname);
    }

    fn on_login(&mut self, user: &str) -> ShellResult<()> {
        skeleton::ensure_home(&mut self.vfs, user)
            .map_err(|e| ShellError::fs(format!("login: {}", home_dir(user)), e))?;
        self.cwd = home_dir(user);
        self.processes.set_shell_owner(user);
        self.reset_env(user);
        Ok(())
    }

    // ========== Prompt ==========

    /// `user@host:dir$ `, or the login prompt before login.
    pub fn prompt(&self) -> String {
        match self.session.stage() {
            LoginStage::Username => return format!("{} login: ", self.hostname()),
            LoginStage::Password => return "Password: ".to_string(),
            LoginStage::Done => {}
        }
        if self.python.is_some() {
            return ">>> ".to_string();
        }
        let user = self.login_user();
        let home = home_dir(&user);
        let shown = if self.cwd == home {
            "~".to_string()
        } else if let Some(rest) = self.cwd.strip_prefix(&format!("{}/", home)) {
            format!("~/{}", rest)
        } else {
            self.cwd.clone()
        };
        format!("{}@{}:{}$ ", user, self.hostname(), shown)
    }

    pub(crate) fn hostname(&self) -> String {
        self.vfs
            .read_to_string("/etc/hostname")
            .ok()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| self.config.hostname.clone())
    }

    // ========== Execution ==========

    /// Run one submitted line.
    pub fn exec(&mut self, line: &str) -> Output {
        if let Some(message) = &self.panic {
            return Action::KernelPanic(message.clone()).into();
        }
        if !self.session.is_logged_in() {
            return self.login(line);
        }
        if self.session.is_waiting_for_sudo() {
            return self.finish_sudo(line);
        }
        let line = line.trim();
        if line.is_empty() {
            return Output::empty();
        }
        self.history.push(line.to_string());
        self.run_line(line)
    }

    fn login(&mut self, line: &str) -> Output {
        match self.session.submit_login(line) {
            LoginStep::Username | LoginStep::Password => Output::empty(),
            LoginStep::Complete(identity) => {
                if let Err(err) = self.on_login(&identity.username) {
                    return err.into();
                }
                match self.vfs.read_to_string("/etc/motd") {
                    Ok(motd) => Output::text(motd.trim_end()),
                    Err(_) => Output::empty(),
                }
            }
        }
    }

    fn finish_sudo(&mut self, attempt: &str) -> Output {
        match self.session.authenticate(attempt) {
            Some(command) => {
                self.elevated = true;
                let out = self.run_line(&command);
                self.elevated = false;
                out
            }
            None => ShellError::AuthenticationFailed.into(),
        }
    }

    fn run_line(&mut self, line: &str) -> Output {
        match self.dispatch(line) {
            Ok(out) => out,
            Err(err) => Output::Failed(err),
        }
    }

    fn expand_alias(&self, line: &str) -> String {
        let (first, rest) = match line.split_once(char::is_whitespace) {
            Some((first, rest)) => (first, Some(rest)),
            None => (line, None),
        };
        match (self.aliases.get(first), rest) {
            (Some(expansion), Some(rest)) => format!("{} {}", expansion, rest),
            (Some(expansion), None) => expansion.clone(),
            (None, _) => line.to_string(),
        }
    }

    fn dispatch(&mut self, line: &str) -> ShellResult<Output> {
        let line = self.expand_alias(line);
        let Some(invocation) = parser::parse(&line, &self.env)? else {
            return Ok(Output::empty());
        };
        let builtin = builtins::lookup(&invocation.name)
            .ok_or_else(|| ShellError::UnrecognizedCommand(invocation.name.clone()))?;
        debug!(command = builtin.name, elevated = self.elevated, "dispatch");
        let out = (builtin.run)(self, &invocation)?;
        match (&invocation.redirect, out) {
            (Some(redirect), Output::Text(text)) if invocation.name != "sudo" => {
                self.write_redirect(redirect, &text)?;
                Ok(Output::empty())
            }
            (_, out) => Ok(out),
        }
    }

    fn write_redirect(&mut self, redirect: &Redirect, text: &str) -> ShellResult<()> {
        let context = format!("sh: {}", redirect.path);
        let target = self.canonical_target(&self.abs(&redirect.path));
        self.check_modify(&target, &context)?;
        let mut content = text.to_string();
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
        let owner = self.user();
        let written = if redirect.append {
            self.vfs.append(&target, content.as_bytes(), &owner)
        } else {
            self.vfs.write(&target, content.as_bytes(), &owner)
        };
        written.map_err(|e| ShellError::fs(context, e))
    }

    /// Candidates for the last word of `partial`.
    pub fn complete(&self, partial: &str) -> Vec<String> {
        completion::complete(&self.vfs, &self.cwd, &self.home(), partial)
    }

    // ========== Paths and permissions ==========

    /// Absolute form of `path`: `~` expanded, relative paths joined to the
    /// working directory. `.` and `..` are left for the VFS to walk.
    pub(crate) fn abs(&self, raw: &str) -> String {
        if raw == "~" {
            return self.home();
        }
        if let Some(rest) = raw.strip_prefix("~/") {
            return path::join(&self.home(), rest);
        }
        if raw.starts_with('/') {
            return raw.to_string();
        }
        path::join(&self.cwd, raw)
    }

    /// Canonical form of a path that may not exist yet: its parent is
    /// canonicalized and the leaf appended.
    pub(crate) fn canonical_target(&self, abs: &str) -> String {
        if let Ok(canonical) = self.vfs.canonicalize(abs) {
            return canonical;
        }
        let trimmed = abs.trim_end_matches('/');
        let (parent, leaf) = match trimmed.rfind('/') {
            Some(0) => ("/", &trimmed[1..]),
            Some(i) => (&trimmed[..i], &trimmed[i + 1..]),
            None => ("/", trimmed),
        };
        match self.vfs.canonicalize(parent) {
            Ok(parent) => path::join(&parent, leaf),
            Err(_) => abs.to_string(),
        }
    }

    pub(crate) fn check_modify(&self, canonical: &str, context: &str) -> ShellResult<()> {
        let user = self.user();
        let home = home_dir(&user);
        let principal = Principal {
            user: &user,
            home: &home,
        };
        if principal.may_modify(&self.vfs, canonical) {
            Ok(())
        } else {
            Err(ShellError::permission_denied(context))
        }
    }

    /// Contents of a file operand as text.
    pub(crate) fn read_file(&self, cmd: &str, operand: &str) -> ShellResult<String> {
        let abs = self.abs(operand);
        let bytes = self
            .vfs
            .read(&abs)
            .map_err(|e| ShellError::fs(format!("{}: {}", cmd, operand), e))?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    // ========== Host-facing filesystem ==========

    pub fn fs_read(&self, path: &str) -> ShellResult<String> {
        self.read_file("read", path)
    }

    pub fn fs_write(&mut self, path: &str, content: &str) -> ShellResult<()> {
        self.ensure_alive()?;
        let context = format!("write: {}", path);
        let target = self.canonical_target(&self.abs(path));
        self.check_modify(&target, &context)?;
        let owner = self.user();
        self.vfs
            .write(&target, content.as_bytes(), &owner)
            .map_err(|e| ShellError::fs(context, e))
    }

    pub fn fs_list(&self, path: &str) -> ShellResult<Vec<DirEntry>> {
        self.vfs
            .list(&self.abs(path))
            .map_err(|e| ShellError::fs(format!("list: {}", path), e))
    }

    pub fn fs_mkdir(&mut self, path: &str) -> ShellResult<()> {
        self.ensure_alive()?;
        let context = format!("mkdir: {}", path);
        let target = self.canonical_target(&self.abs(path));
        self.check_modify(&target, &context)?;
        let owner = self.user();
        self.vfs
            .mkdir(&target, &owner)
            .map_err(|e| ShellError::fs(context, e))
    }

    /// Remove a node. Taking init with it panics the machine.
    pub fn fs_rm(&mut self, path: &str, recursive: bool) -> ShellResult<()> {
        self.ensure_alive()?;
        let context = format!("rm: {}", path);
        let target = self.canonical_target(&self.abs(path));
        if target == "/" {
            return Err(ShellError::fs(context, VfsError::PermissionDenied));
        }
        self.check_modify(&target, &context)?;
        self.vfs
            .remove(&target, recursive)
            .map_err(|e| ShellError::fs(context, e))?;
        if is_critical(&target) {
            self.kernel_panic();
        }
        Ok(())
    }

    fn ensure_alive(&self) -> ShellResult<()> {
        match &self.panic {
            Some(message) => Err(ShellError::refused(format!("Kernel panic - {}", message))),
            None => Ok(()),
        }
    }

    /// Serialize the filesystem for storage.
    pub fn export_vfs(&self) -> ShellResult<String> {
        self.vfs
            .export()
            .map_err(|e| ShellError::fs("kpawnd: export", e))
    }

    /// Replace the filesystem with a saved one. The current tree is kept if
    /// the blob does not parse.
    pub fn import_vfs(&mut self, blob: &str) -> ShellResult<()> {
        self.vfs = Vfs::import(blob).map_err(|e| ShellError::fs("kpawnd: import", e))?;
        info!("filesystem imported");
        if !self.vfs.is_dir(&self.cwd) {
            self.cwd = "/".to_string();
        }
        Ok(())
    }

    // ========== Editor ==========

    /// Write an editor buffer back to its file as the effective user.
    pub fn save_editor(&mut self, editor: &mut NanoEditor) -> ShellResult<()> {
        let context = format!("nano: {}", editor.filename());
        let target = self.canonical_target(&self.abs(editor.filename()));
        self.check_modify(&target, &context)?;
        let owner = self.user();
        editor
            .save_to(&mut self.vfs, &target, &owner)
            .map_err(|e| match e {
                EditorError::Save { path, source } => {
                    ShellError::fs(format!("nano: {}", path), source)
                }
            })
    }

    // ========== Python ==========

    pub(crate) fn start_python(&mut self) {
        self.python.get_or_insert_with(PythonRepl::new);
    }

    pub fn is_in_python(&self) -> bool {
        self.python.is_some()
    }

    /// Evaluate one line at the `>>>` prompt, starting the REPL if needed.
    pub fn exec_python(&mut self, code: &str) -> Output {
        let repl = self.python.get_or_insert_with(PythonRepl::new);
        match repl.run(code) {
            ReplOutcome::Text(text) => Output::text(text),
            ReplOutcome::Exit => {
                self.python = None;
                Action::ExitPython.into()
            }
        }
    }

    // ========== Kernel panic and reboot ==========

    pub(crate) fn kernel_panic(&mut self) -> Output {
        error!(reason = INIT_PANIC, "kernel panic");
        self.panic = Some(INIT_PANIC.to_string());
        self.session.cancel_sudo();
        Action::KernelPanic(INIT_PANIC.to_string()).into()
    }

    pub fn panic_message(&self) -> Option<&str> {
        self.panic.as_deref()
    }

    /// Restart the machine. The filesystem and the logged-in identity
    /// survive; everything transient is dropped and init is put back if it
    /// was removed.
    pub fn reboot(&mut self) {
        info!(panicked = self.panic.is_some(), "reboot");
        self.panic = None;
        self.session.cancel_sudo();
        self.elevated = false;
        self.python = None;
        self.boot = None;
        self.booted = false;
        self.uptime_secs = 0;
        match skeleton::restore_init(&mut self.vfs) {
            Ok(restored) if !restored.is_empty() => info!(?restored, "init restored"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "could not restore init"),
        }
        let user = self.login_user();
        self.processes = ProcessTable::boot(&user);
        self.cwd = home_dir(&user);
        if !self.vfs.is_dir(&self.cwd) {
            self.cwd = "/".to_string();
        }
        self.env.insert("PWD".to_string(), self.cwd.clone());
    }

    // ========== Boot ==========

    /// A boot menu reflecting the current `grub.cfg`, or rescue mode if it
    /// is gone.
    pub fn grub_menu(&self) -> GrubMenu {
        let cfg = self.vfs.read_to_string(GRUB_CFG_PATH).ok();
        GrubMenu::from_config_file(
            cfg.as_deref(),
            self.config.boot.clone(),
            self.config.kernel_version.clone(),
        )
    }

    pub fn start_boot(&mut self, path: BootPath) {
        info!(?path, "boot started");
        let params = self.config.boot_params(&self.hostname());
        self.boot = Some(BootLog::new(path, &params));
        self.booted = false;
    }

    /// Next boot log line, or `None` when there is nothing left to show.
    pub fn next_boot_line(&mut self) -> Option<String> {
        let line = self.boot.as_mut()?.next_line()?.clone();
        if line.is_complete() {
            self.booted = true;
        }
        Some(line.to_string())
    }

    pub fn is_booted(&self) -> bool {
        self.booted
    }

    /// One second of machine time.
    pub fn tick(&mut self) {
        self.uptime_secs += 1;
    }

    // ========== Diagnostics ==========

    pub fn memtest(&self) -> Memtest {
        Memtest::new(self.config.memory_mb)
    }

    pub(crate) fn memory_usage(&self) -> MemoryUsage {
        MemoryUsage::new(
            self.config.memory_mb,
            self.processes.resident_kb(),
            self.vfs.usage().bytes,
        )
    }

    pub fn set_host_info(&mut self, host: HostInfo) {
        self.host = host;
    }

    /// Input for `neofetch`.
    pub fn sysinfo(&self) -> SysInfo {
        let memory = self.memory_usage();
        let packages = self
            .vfs
            .list("/bin")
            .map(|entries| entries.iter().filter(|e| !e.is_dir()).count())
            .unwrap_or(0);
        SysInfo {
            user: self.login_user(),
            hostname: self.hostname(),
            os: format!("kpawnd GNU/Linux {}", self.config.version),
            kernel: self.config.kernel_version.clone(),
            uptime_secs: self.uptime_secs,
            shell: "sh".to_string(),
            resolution: self.host.resolution.clone(),
            terminal: self.host.terminal.clone(),
            cpu: if self.host.cpu.is_empty() {
                "kpawnd virtual processor".to_string()
            } else {
                self.host.cpu.clone()
            },
            memory_used_mib: memory.used_kb / 1024,
            memory_total_mib: memory.total_kb / 1024,
            packages: u32::try_from(packages).unwrap_or(u32::MAX),
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
