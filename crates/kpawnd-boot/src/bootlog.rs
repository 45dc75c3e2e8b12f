//! Boot log sequencer.
//!
//! Produces the same finite list of lines for the same [`BootPath`] and
//! [`BootParams`]. The caller paces playback by calling
//! [`BootLog::next_line`] once per tick; abandoning playback midway is fine.

use std::fmt;

/// Which boot was chosen in the menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootPath {
    Normal,
    Recovery,
}

/// Status column of a service line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineStatus {
    Ok,
    Failed,
    Warn,
}

impl LineStatus {
    fn tag(self) -> &'static str {
        match self {
            LineStatus::Ok => "[  OK  ]",
            LineStatus::Failed => "[FAILED]",
            LineStatus::Warn => "[ WARN ]",
        }
    }
}

/// Marker printed for [`BootLine::Complete`].
pub const BOOT_COMPLETE: &str = "BOOT_COMPLETE";

/// One line of the boot log.
#[derive(Clone, Debug, PartialEq)]
pub enum BootLine {
    /// Firmware and loader output
    Plain(String),
    /// Kernel ring buffer line, timestamped in microseconds since boot
    Kernel { micros: u64, message: String },
    /// Init system unit line
    Unit { status: LineStatus, message: String },
    /// Sentinel closing every sequence
    Complete,
}

impl BootLine {
    pub fn status(&self) -> Option<LineStatus> {
        match self {
            BootLine::Unit { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, BootLine::Complete)
    }
}

impl fmt::Display for BootLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootLine::Plain(text) => f.write_str(text),
            BootLine::Kernel { micros, message } => {
                let secs = *micros as f64 / 1_000_000.0;
                write!(f, "[{:>12.6}] {}", secs, message)
            }
            BootLine::Unit { status, message } => write!(f, "{} {}", status.tag(), message),
            BootLine::Complete => f.write_str(BOOT_COMPLETE),
        }
    }
}

/// Values substituted into the log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BootParams {
    pub version: String,
    pub kernel_version: String,
    pub hostname: String,
    pub memory_mb: u32,
}

/// Replayable boot log.
#[derive(Clone, Debug)]
pub struct BootLog {
    path: BootPath,
    lines: Vec<BootLine>,
    cursor: usize,
}

impl BootLog {
    pub fn new(path: BootPath, params: &BootParams) -> Self {
        let mut lines = normal_sequence(params);
        if path == BootPath::Recovery {
            lines.truncate(recovery_cutoff(&lines));
        }
        lines.push(BootLine::Complete);
        Self {
            path,
            lines,
            cursor: 0,
        }
    }

    pub fn path(&self) -> BootPath {
        self.path
    }

    /// All lines, sentinel included.
    pub fn lines(&self) -> &[BootLine] {
        &self.lines
    }

    /// Next line to show, or `None` once the sentinel has been handed out.
    pub fn next_line(&mut self) -> Option<&BootLine> {
        let line = self.lines.get(self.cursor)?;
        self.cursor += 1;
        Some(line)
    }

    /// Whether the sentinel has been handed out.
    pub fn is_complete(&self) -> bool {
        self.cursor >= self.lines.len()
    }

    /// Lines handed out so far.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Start playback over.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}

/// Message of the last line a recovery boot shows before the sentinel.
const ROOT_MOUNTED: &str = "VFS: Mounted root (ext4 filesystem) readonly on device 8:1.";

fn recovery_cutoff(lines: &[BootLine]) -> usize {
    lines
        .iter()
        .position(|l| matches!(l, BootLine::Kernel { message, .. } if message == ROOT_MOUNTED))
        .map(|i| i + 1)
        .unwrap_or(lines.len())
}

fn normal_sequence(p: &BootParams) -> Vec<BootLine> {
    let plain = |s: &str| BootLine::Plain(s.to_string());
    let total_kb = u64::from(p.memory_mb) * 1024;
    let reserved_kb = 4096u64.min(total_kb);

    let mut lines = vec![
        plain("SeaBIOS (version 1.16.2-debian-1.16.2-1)"),
        plain(""),
        plain("iPXE (https://ipxe.org) 00:03.0 CA00 PCI2.10 PnP PMM+7EFD0F80+7EF30F80 CA00"),
        plain(""),
        plain("Booting from Hard Disk..."),
        plain("GRUB loading."),
        BootLine::Plain(format!("Loading Linux {} ...", p.kernel_version)),
        plain("Loading initial ramdisk ..."),
    ];

    let kernel_messages = [
        format!(
            "Linux version {} (builder@kpawnd) (gcc (Debian 12.2.0-14) 12.2.0) #1 SMP PREEMPT_DYNAMIC",
            p.kernel_version
        ),
        format!(
            "Command line: BOOT_IMAGE=/boot/vmlinuz-{} root=/dev/sda1 ro quiet",
            p.kernel_version
        ),
        "BIOS-provided physical RAM map:".to_string(),
        format!(
            "BIOS-e820: [mem 0x0000000000100000-0x{:016x}] usable",
            (total_kb * 1024).saturating_sub(1)
        ),
        format!(
            "Memory: {}K/{}K available ({}K kernel code, {}K reserved)",
            total_kb - reserved_kb,
            total_kb,
            reserved_kb / 2,
            reserved_kb
        ),
        "CPU: kpawnd virtual processor @ 2.40GHz".to_string(),
        "Calibrating delay loop (skipped), value calculated using timer frequency.. 4800.00 BogoMIPS".to_string(),
        "pid_max: default: 32768 minimum: 301".to_string(),
        "Mount-cache hash table entries: 512 (order: 0, 4096 bytes, linear)".to_string(),
        "NET: Registered PF_INET protocol family".to_string(),
        "Freeing unused kernel image (initmem) memory: 1024K".to_string(),
        "EXT4-fs (sda1): mounted filesystem with ordered data mode. Quota mode: none.".to_string(),
        ROOT_MOUNTED.to_string(),
        "Run /sbin/init as init process".to_string(),
    ];
    let mut micros = 0u64;
    for (i, message) in kernel_messages.into_iter().enumerate() {
        lines.push(BootLine::Kernel { micros, message });
        micros += 13_527 * (i as u64 + 1);
    }

    lines.push(BootLine::Plain(String::new()));
    lines.push(BootLine::Plain(format!(
        "Welcome to kpawnd GNU/Linux {}!",
        p.version
    )));
    lines.push(BootLine::Plain(String::new()));

    let units = [
        (LineStatus::Ok, "Created slice system-getty.slice."),
        (LineStatus::Ok, "Reached target Local File Systems."),
        (LineStatus::Ok, "Started Journal Service."),
        (LineStatus::Ok, "Started Load Kernel Modules."),
        (
            LineStatus::Warn,
            "Platform clock not synchronized, using tick counter.",
        ),
        (LineStatus::Ok, "Started Network Manager."),
        (LineStatus::Failed, "Failed to start Bluetooth service."),
        (LineStatus::Ok, "Started OpenSSH server daemon."),
        (LineStatus::Ok, "Started Getty on tty1."),
        (LineStatus::Ok, "Reached target Multi-User System."),
    ];
    lines.extend(units.iter().map(|(status, message)| BootLine::Unit {
        status: *status,
        message: message.to_string(),
    }));

    lines.push(BootLine::Plain(String::new()));
    lines.push(BootLine::Plain(format!(
        "kpawnd v{} {} tty1",
        p.version, p.hostname
    )));
    lines.push(BootLine::Plain(String::new()));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> BootParams {
        BootParams {
            version: "0.6.7".to_string(),
            kernel_version: "6.1.0-kpawnd".to_string(),
            hostname: "kpawnd".to_string(),
            memory_mb: 32,
        }
    }

    #[test]
    fn test_sequence_is_deterministic() {
        let a = BootLog::new(BootPath::Normal, &params());
        let b = BootLog::new(BootPath::Normal, &params());
        assert_eq!(a.lines(), b.lines());
    }

    #[test]
    fn test_sentinel_is_last() {
        for path in [BootPath::Normal, BootPath::Recovery] {
            let log = BootLog::new(path, &params());
            let (last, rest) = log.lines().split_last().unwrap();
            assert!(last.is_complete());
            assert!(rest.iter().all(|l| !l.is_complete()));
        }
    }

    #[test]
    fn test_recovery_is_strict_prefix_of_normal() {
        let normal = BootLog::new(BootPath::Normal, &params());
        let recovery = BootLog::new(BootPath::Recovery, &params());
        let body = &recovery.lines()[..recovery.lines().len() - 1];

        assert!(body.len() < normal.lines().len() - 1);
        assert_eq!(body, &normal.lines()[..body.len()]);
        assert_eq!(body.last().unwrap().to_string().split("] ").nth(1), Some(ROOT_MOUNTED));
    }

    #[test]
    fn test_line_formatting() {
        let kernel = BootLine::Kernel {
            micros: 1_234_567,
            message: "hello".to_string(),
        };
        assert_eq!(kernel.to_string(), "[    1.234567] hello");

        let unit = BootLine::Unit {
            status: LineStatus::Ok,
            message: "Started Journal Service.".to_string(),
        };
        assert_eq!(unit.to_string(), "[  OK  ] Started Journal Service.");
        assert_eq!(BootLine::Complete.to_string(), "BOOT_COMPLETE");
    }

    #[test]
    fn test_statuses_present() {
        let log = BootLog::new(BootPath::Normal, &params());
        let statuses: Vec<LineStatus> = log.lines().iter().filter_map(BootLine::status).collect();
        assert!(statuses.contains(&LineStatus::Ok));
        assert!(statuses.contains(&LineStatus::Warn));
        assert!(statuses.contains(&LineStatus::Failed));
    }

    #[test]
    fn test_playback_and_rewind() {
        let mut log = BootLog::new(BootPath::Recovery, &params());
        let total = log.lines().len();
        let mut seen = 0;
        while let Some(line) = log.next_line() {
            seen += 1;
            if line.is_complete() {
                break;
            }
        }
        assert_eq!(seen, total);
        assert!(log.is_complete());
        assert!(log.next_line().is_none());

        log.rewind();
        assert_eq!(log.position(), 0);
        assert!(matches!(log.next_line(), Some(BootLine::Plain(s)) if s.starts_with("SeaBIOS")));
    }

    #[test]
    fn test_memory_line_uses_params() {
        let log = BootLog::new(BootPath::Normal, &params());
        let text: Vec<String> = log.lines().iter().map(ToString::to_string).collect();
        assert!(text.iter().any(|l| l.contains("Memory: 28672K/32768K available")));
        assert!(text.iter().any(|l| l == "kpawnd v0.6.7 kpawnd tty1"));
    }
}
