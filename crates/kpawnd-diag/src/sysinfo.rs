//! neofetch-style system report.
//!
//! Everything shown comes from [`SysInfo`]; nothing here probes the host.

use serde::{Deserialize, Serialize};

/// Gap between the logo column and the info column.
const GUTTER: usize = 3;

/// Inputs for [`SysInfo::report`]. Empty strings render as `unknown`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SysInfo {
    pub user: String,
    pub hostname: String,
    pub os: String,
    pub kernel: String,
    pub uptime_secs: u64,
    pub shell: String,
    pub resolution: String,
    pub terminal: String,
    pub cpu: String,
    pub memory_used_mib: u64,
    pub memory_total_mib: u64,
    pub packages: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Logo {
    Tux,
    Windows,
    Apple,
}

impl Logo {
    /// Pick a logo from a free-form OS string.
    pub fn for_os(os: &str) -> Self {
        let os = os.to_ascii_lowercase();
        if os.contains("windows") {
            Logo::Windows
        } else if os.contains("mac") || os.contains("ios") || os.contains("darwin") {
            Logo::Apple
        } else {
            Logo::Tux
        }
    }

    pub fn art(self) -> &'static [&'static str] {
        match self {
            Logo::Tux => &[
                "     .--.     ",
                "    |o_o |    ",
                "    |:_/ |    ",
                "   //   \\ \\   ",
                "  (|     | )  ",
                " /'\\_   _/`\\  ",
                " \\___)=(___/  ",
            ],
            Logo::Windows => &[
                " ######  ###### ",
                " ######  ###### ",
                " ######  ###### ",
                "                ",
                " ######  ###### ",
                " ######  ###### ",
                " ######  ###### ",
            ],
            Logo::Apple => &[
                "        .:'   ",
                "    __ :'__   ",
                " .'`  `-'  ``.",
                ":          .-'",
                ":         :   ",
                " :         `-;",
                "  `.__.-.__.' ",
            ],
        }
    }
}

/// `1 day, 2 hours, 3 mins`, dropping leading zero units.
pub fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let mins = (secs % 3_600) / 60;

    let unit = |n: u64, word: &str| {
        if n == 1 {
            format!("1 {}", word)
        } else {
            format!("{} {}s", n, word)
        }
    };

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(unit(days, "day"));
    }
    if days > 0 || hours > 0 {
        parts.push(unit(hours, "hour"));
    }
    parts.push(unit(mins, "min"));
    parts.join(", ")
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        "unknown"
    } else {
        value
    }
}

impl SysInfo {
    /// Info column, one entry per row.
    pub fn rows(&self) -> Vec<String> {
        let title = format!("{}@{}", or_unknown(&self.user), or_unknown(&self.hostname));
        let rule = "-".repeat(title.chars().count());
        let memory = if self.memory_total_mib == 0 {
            "unknown".to_string()
        } else {
            format!("{}MiB / {}MiB", self.memory_used_mib, self.memory_total_mib)
        };

        vec![
            title,
            rule,
            format!("OS: {}", or_unknown(&self.os)),
            format!("Kernel: {}", or_unknown(&self.kernel)),
            format!("Uptime: {}", format_uptime(self.uptime_secs)),
            format!("Packages: {}", self.packages),
            format!("Shell: {}", or_unknown(&self.shell)),
            format!("Resolution: {}", or_unknown(&self.resolution)),
            format!("Terminal: {}", or_unknown(&self.terminal)),
            format!("CPU: {}", or_unknown(&self.cpu)),
            format!("Memory: {}", memory),
        ]
    }

    /// Logo beside the info column.
    pub fn report(&self) -> String {
        let art = Logo::for_os(&self.os).art();
        let width = art.iter().map(|l| l.chars().count()).max().unwrap_or(0) + GUTTER;
        let rows = self.rows();

        (0..art.len().max(rows.len()))
            .map(|i| {
                let left = art.get(i).copied().unwrap_or("");
                let right = rows.get(i).map(String::as_str).unwrap_or("");
                format!("{:<width$}{}", left, right, width = width)
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
