//! Boot menu settings and the `grub.cfg` file that carries them.

use serde::{Deserialize, Serialize};

/// Location of the bootloader configuration inside the VFS.
pub const GRUB_CFG_PATH: &str = "/boot/grub/grub.cfg";

/// Seconds before the highlighted entry boots on its own.
pub const DEFAULT_TIMEOUT_SECS: u32 = 5;

/// Settings for the boot menu.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootConfig {
    /// Countdown length in ticks
    pub timeout_secs: u32,
    /// Initially highlighted main menu entry
    pub default_entry: usize,
    /// Show a "UEFI Firmware Settings" entry
    pub firmware_entry: bool,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_entry: 0,
            firmware_entry: false,
        }
    }
}

impl BootConfig {
    /// Overlay `set timeout=N` / `set default=N` lines from a grub.cfg.
    /// Unknown or malformed lines are ignored, as GRUB's parser would skip
    /// them with a warning.
    pub fn with_file(mut self, cfg: &str) -> Self {
        for line in cfg.lines() {
            let Some(assignment) = line.trim().strip_prefix("set ") else {
                continue;
            };
            let Some((key, value)) = assignment.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"');
            match key.trim() {
                "timeout" => {
                    if let Ok(secs) = value.parse() {
                        self.timeout_secs = secs;
                    }
                }
                "default" => {
                    if let Ok(index) = value.parse() {
                        self.default_entry = index;
                    }
                }
                _ => {}
            }
        }
        self
    }

    /// Generate a grub.cfg describing these settings.
    pub fn render_file(&self, kernel_version: &str) -> String {
        format!(
            "# Automatically generated by update-grub\n\
             set default={default}\n\
             set timeout={timeout}\n\
             \n\
             menuentry 'kpawnd GNU/Linux' {{\n\
             \tlinux /boot/vmlinuz-{kernel} root=/dev/sda1 ro quiet\n\
             \tinitrd /boot/initrd.img-{kernel}\n\
             }}\n\
             submenu 'Advanced options for kpawnd GNU/Linux' {{\n\
             \tmenuentry 'kpawnd GNU/Linux, with Linux {kernel}' {{ }}\n\
             \tmenuentry 'kpawnd GNU/Linux, with Linux {kernel} (recovery mode)' {{ }}\n\
             }}\n\
             menuentry 'Memory test (memtest86+)' {{\n\
             \tlinux16 /boot/memtest86+.bin\n\
             }}\n",
            default = self.default_entry,
            timeout = self.timeout_secs,
            kernel = kernel_version,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rendered_file_parses_back() {
        let config = BootConfig {
            timeout_secs: 9,
            default_entry: 2,
            firmware_entry: false,
        };
        let file = config.render_file("6.1.0-kpawnd");
        assert!(file.contains("linux /boot/vmlinuz-6.1.0-kpawnd"));
        assert_eq!(BootConfig::default().with_file(&file), config);
    }

    #[test]
    fn test_malformed_lines_are_ignored() {
        let config = BootConfig::default().with_file("set timeout=soon\nset\nset default=\"1\"");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.default_entry, 1);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: BootConfig = serde_json::from_str(r#"{"firmware_entry":true}"#).unwrap();
        assert!(config.firmware_entry);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}
