//! Simulated process table backing `ps`, `kill` and `free`.

use kpawnd_vfs::ROOT_OWNER;

/// Process state letter as `ps` shows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProcState {
    Running,
    Sleeping,
}

impl ProcState {
    fn letter(self) -> char {
        match self {
            ProcState::Running => 'R',
            ProcState::Sleeping => 'S',
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Process {
    pub pid: u32,
    pub ppid: u32,
    pub owner: String,
    pub name: String,
    pub state: ProcState,
    pub rss_kb: u64,
}

/// Why a kill did not happen.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KillError {
    NoSuchProcess,
    NotPermitted,
}

/// Result of a successful kill.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Killed {
    Process,
    /// The caller's own shell
    Shell,
    /// pid 1
    Init,
}

pub const INIT_PID: u32 = 1;

#[derive(Clone, Debug)]
pub struct ProcessTable {
    procs: Vec<Process>,
    next_pid: u32,
    shell_pid: u32,
}

impl ProcessTable {
    /// The daemons of a booted system plus a login shell for `user`.
    pub fn boot(user: &str) -> Self {
        let mut table = Self {
            procs: Vec::new(),
            next_pid: 1,
            shell_pid: 0,
        };
        table.spawn(0, ROOT_OWNER, "init", 1_024);
        table.spawn(0, ROOT_OWNER, "kthreadd", 0);
        table.spawn(INIT_PID, ROOT_OWNER, "systemd-journald", 2_048);
        table.spawn(INIT_PID, ROOT_OWNER, "sshd", 1_536);
        table.spawn(INIT_PID, ROOT_OWNER, "getty", 512);
        table.shell_pid = table.spawn(INIT_PID, user, "sh", 768);
        table
    }

    fn spawn(&mut self, ppid: u32, owner: &str, name: &str, rss_kb: u64) -> u32 {
        let pid = self.next_pid;
        self.next_pid += 1;
        self.procs.push(Process {
            pid,
            ppid,
            owner: owner.to_string(),
            name: name.to_string(),
            state: ProcState::Sleeping,
            rss_kb,
        });
        pid
    }

    pub fn list(&self) -> &[Process] {
        &self.procs
    }

    pub fn shell_pid(&self) -> u32 {
        self.shell_pid
    }

    /// Hand out a pid for a short-lived command such as `ps` itself.
    pub fn next_transient_pid(&mut self) -> u32 {
        let pid = self.next_pid;
        self.next_pid += 1;
        pid
    }

    /// `ps` output. The running command is listed last.
    pub fn render_ps(&mut self, command: &str) -> String {
        let own_pid = self.next_transient_pid();
        let mut out = String::from("  PID  PPID USER     STAT CMD\n");
        for p in &self.procs {
            out.push_str(&format!(
                "{:5} {:5} {:<8} {}    {}\n",
                p.pid,
                p.ppid,
                p.owner,
                p.state.letter(),
                p.name
            ));
        }
        out.push_str(&format!(
            "{:5} {:5} {:<8} {}    {}",
            own_pid,
            self.shell_pid,
            self.owner_of(self.shell_pid).unwrap_or(ROOT_OWNER),
            ProcState::Running.letter(),
            command
        ));
        out
    }

    fn owner_of(&self, pid: u32) -> Option<&str> {
        self.procs
            .iter()
            .find(|p| p.pid == pid)
            .map(|p| p.owner.as_str())
    }

    /// Kill `pid` on behalf of `user`. Only root may signal other users.
    pub fn kill(&mut self, pid: u32, user: &str) -> Result<Killed, KillError> {
        let index = self
            .procs
            .iter()
            .position(|p| p.pid == pid)
            .ok_or(KillError::NoSuchProcess)?;
        if user != ROOT_OWNER && self.procs[index].owner != user {
            return Err(KillError::NotPermitted);
        }
        if pid == INIT_PID {
            return Ok(Killed::Init);
        }
        if pid == self.shell_pid {
            return Ok(Killed::Shell);
        }
        self.procs.remove(index);
        Ok(Killed::Process)
    }

    /// Total resident memory in KiB.
    pub fn resident_kb(&self) -> u64 {
        self.procs.iter().map(|p| p.rss_kb).sum()
    }

    /// Re-own the login shell after a user change.
    pub fn set_shell_owner(&mut self, user: &str) {
        let shell_pid = self.shell_pid;
        if let Some(shell) = self.procs.iter_mut().find(|p| p.pid == shell_pid) {
            shell.owner = user.to_string();
        }
    }
}

/// Memory split for `free` and `neofetch`, in KiB.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryUsage {
    pub total_kb: u64,
    pub used_kb: u64,
}

impl MemoryUsage {
    pub fn new(memory_mb: u32, resident_kb: u64, file_bytes: usize) -> Self {
        let total_kb = u64::from(memory_mb) * 1024;
        let files_kb = (file_bytes as u64).div_ceil(1024);
        Self {
            total_kb,
            used_kb: (resident_kb + files_kb).min(total_kb),
        }
    }

    pub fn free_kb(&self) -> u64 {
        self.total_kb - self.used_kb
    }

    pub fn render_free(&self) -> String {
        format!(
            "               total        used        free\nMem:     {:>10}  {:>10}  {:>10}\nSwap:    {:>10}  {:>10}  {:>10}",
            self.total_kb,
            self.used_kb,
            self.free_kb(),
            0,
            0,
            0
        )
    }
}
