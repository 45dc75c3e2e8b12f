//! GRUB-style boot menu state machine.
//!
//! The menu is driven entirely from outside: [`GrubMenu::handle_key`] for
//! input and [`GrubMenu::tick`] once per countdown second. It never boots by
//! itself; it reports a [`MenuEvent`] and the caller starts the boot log.
//!
//! ```text
//!              Enter on "Advanced options"
//!   ┌──────┐ ───────────────────────────────▶ ┌──────────┐
//!   │ Main │                                  │ Advanced │
//!   └──────┘ ◀─────────────────────────────── └──────────┘
//!     │  ▲        Enter on "Back" / Escape          │  ▲
//!   e │  │ Esc                                  e,c │  │ Esc
//!   c ▼  │                                          ▼  │
//!   EditCmdline / CommandLine (remember prior mode)
//! ```

use tracing::debug;

use crate::config::{BootConfig, GRUB_CFG_PATH};

/// Width of the text inside the menu box.
const BOX_WIDTH: usize = 76;

/// Rows inside the menu box.
const BOX_ROWS: usize = 12;

/// Which screen the menu is showing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuMode {
    Main,
    Advanced,
    EditCmdline,
    CommandLine,
}

/// Keys the menu understands. The caller maps raw key events onto these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuKey {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    Backspace,
    /// Ctrl-X or F10 in the entry editor
    BootEdited,
    Char(char),
}

/// What a boot path leads to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootTarget {
    Normal,
    Recovery,
    MemoryTest,
    FirmwareSetup,
}

/// Result of feeding the menu a key or a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuEvent {
    /// Nothing for the caller to do beyond re-rendering
    None,
    /// Leave the menu and start this boot path
    Boot(BootTarget),
    /// `reboot` was typed at the GRUB prompt
    Reboot,
}

/// One line of a menu.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Entry {
    Normal,
    AdvancedOptions,
    MemoryTest,
    Firmware,
    Back,
    Kernel,
    KernelRecovery,
}

impl Entry {
    fn label(self, kernel: &str) -> String {
        match self {
            Entry::Normal => "kpawnd GNU/Linux".to_string(),
            Entry::AdvancedOptions => "Advanced options for kpawnd GNU/Linux".to_string(),
            Entry::MemoryTest => "Memory test (memtest86+)".to_string(),
            Entry::Firmware => "UEFI Firmware Settings".to_string(),
            Entry::Back => "Back to main menu".to_string(),
            Entry::Kernel => format!("kpawnd GNU/Linux, with Linux {}", kernel),
            Entry::KernelRecovery => {
                format!("kpawnd GNU/Linux, with Linux {} (recovery mode)", kernel)
            }
        }
    }

    fn target(self) -> Option<BootTarget> {
        match self {
            Entry::Normal | Entry::Kernel => Some(BootTarget::Normal),
            Entry::KernelRecovery => Some(BootTarget::Recovery),
            Entry::MemoryTest => Some(BootTarget::MemoryTest),
            Entry::Firmware => Some(BootTarget::FirmwareSetup),
            Entry::AdvancedOptions | Entry::Back => None,
        }
    }

    /// Script shown by the entry editor, or `None` for entries without one.
    fn script(self, kernel: &str) -> Option<Vec<String>> {
        let linux = match self {
            Entry::Normal | Entry::Kernel => {
                format!("linux   /boot/vmlinuz-{} root=/dev/sda1 ro quiet", kernel)
            }
            Entry::KernelRecovery => {
                format!("linux   /boot/vmlinuz-{} root=/dev/sda1 ro single", kernel)
            }
            Entry::MemoryTest => {
                return Some(vec![
                    format!("setparams '{}'", self.label(kernel)),
                    String::new(),
                    "    linux16 /boot/memtest86+.bin".to_string(),
                ])
            }
            _ => return None,
        };
        Some(vec![
            format!("setparams '{}'", self.label(kernel)),
            String::new(),
            "    load_video".to_string(),
            "    insmod gzio".to_string(),
            "    insmod part_gpt".to_string(),
            "    insmod ext2".to_string(),
            "    search --no-floppy --fs-uuid --set=root 3e9f2c1a-kpawnd".to_string(),
            format!("    echo    'Loading Linux {} ...'", kernel),
            format!("    {}", linux),
            "    echo    'Loading initial ramdisk ...'".to_string(),
            format!("    initrd  /boot/initrd.img-{}", kernel),
        ])
    }
}

/// Entry editor state.
#[derive(Clone, Debug)]
struct ScriptEdit {
    prior: MenuMode,
    lines: Vec<String>,
    row: usize,
    col: usize,
}

/// `grub>` prompt state.
#[derive(Clone, Debug)]
struct Console {
    prior: MenuMode,
    input: String,
    transcript: Vec<String>,
}

/// The boot menu.
#[derive(Clone, Debug)]
pub struct GrubMenu {
    kernel_version: String,
    config: BootConfig,
    mode: MenuMode,
    main: Vec<Entry>,
    advanced: Vec<Entry>,
    selected: usize,
    /// Remaining countdown ticks; `None` once cancelled
    countdown: Option<u32>,
    rescue: bool,
    edit: Option<ScriptEdit>,
    console: Option<Console>,
    booted: Option<BootTarget>,
}

impl GrubMenu {
    /// Build a menu from settings.
    pub fn new(config: BootConfig, kernel_version: impl Into<String>) -> Self {
        let mut main = vec![Entry::Normal, Entry::AdvancedOptions, Entry::MemoryTest];
        if config.firmware_entry {
            main.push(Entry::Firmware);
        }
        let selected = config.default_entry.min(main.len() - 1);
        let countdown = Some(config.timeout_secs);
        Self {
            kernel_version: kernel_version.into(),
            config,
            mode: MenuMode::Main,
            main,
            advanced: vec![
                Entry::Back,
                Entry::Kernel,
                Entry::KernelRecovery,
                Entry::MemoryTest,
            ],
            selected,
            countdown,
            rescue: false,
            edit: None,
            console: None,
            booted: None,
        }
    }

    /// Build a menu from the contents of grub.cfg. A missing file leaves the
    /// menu in rescue mode.
    pub fn from_config_file(
        cfg: Option<&str>,
        defaults: BootConfig,
        kernel_version: impl Into<String>,
    ) -> Self {
        match cfg {
            Some(text) => Self::new(defaults.with_file(text), kernel_version),
            None => {
                debug!("grub.cfg missing, entering rescue mode");
                let mut menu = Self::new(defaults, kernel_version);
                menu.rescue = true;
                menu.countdown = None;
                menu
            }
        }
    }

    // ========== Accessors ==========

    pub fn mode(&self) -> MenuMode {
        self.mode
    }

    /// Index of the highlighted entry in the current list.
    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Labels of the current list (main or advanced).
    pub fn entries(&self) -> Vec<String> {
        self.current()
            .iter()
            .map(|e| e.label(&self.kernel_version))
            .collect()
    }

    /// Remaining countdown, `None` when cancelled or in rescue mode.
    pub fn countdown(&self) -> Option<u32> {
        self.countdown
    }

    pub fn is_rescue(&self) -> bool {
        self.rescue
    }

    /// Boot path chosen so far, if any.
    pub fn booted(&self) -> Option<BootTarget> {
        self.booted
    }

    pub fn config(&self) -> &BootConfig {
        &self.config
    }

    /// Lines of the entry editor, when it is open.
    pub fn edit_lines(&self) -> Option<&[String]> {
        self.edit.as_ref().map(|e| e.lines.as_slice())
    }

    fn current(&self) -> &[Entry] {
        match self.list_mode() {
            MenuMode::Advanced => &self.advanced,
            _ => &self.main,
        }
    }

    /// Mode whose list is on screen, looking through editor and console.
    fn list_mode(&self) -> MenuMode {
        match self.mode {
            MenuMode::EditCmdline => self.edit.as_ref().map_or(MenuMode::Main, |e| e.prior),
            MenuMode::CommandLine => self.console.as_ref().map_or(MenuMode::Main, |c| c.prior),
            mode => mode,
        }
    }

    // ========== Input ==========

    /// Advance the countdown by one second. Only ticks in `Main`.
    pub fn tick(&mut self) -> MenuEvent {
        if self.rescue || self.booted.is_some() || self.mode != MenuMode::Main {
            return MenuEvent::None;
        }
        match self.countdown {
            Some(remaining) if remaining > 1 => {
                self.countdown = Some(remaining - 1);
                MenuEvent::None
            }
            Some(_) => {
                self.countdown = None;
                self.activate()
            }
            None => MenuEvent::None,
        }
    }

    /// Feed one key to the menu.
    pub fn handle_key(&mut self, key: MenuKey) -> MenuEvent {
        if self.rescue || self.booted.is_some() {
            return MenuEvent::None;
        }
        match self.mode {
            MenuMode::Main | MenuMode::Advanced => {
                self.countdown = None;
                self.handle_menu_key(key)
            }
            MenuMode::EditCmdline => self.handle_edit_key(key),
            MenuMode::CommandLine => self.handle_console_key(key),
        }
    }

    fn handle_menu_key(&mut self, key: MenuKey) -> MenuEvent {
        match key {
            MenuKey::Up => {
                self.selected = self.selected.saturating_sub(1);
                MenuEvent::None
            }
            MenuKey::Down => {
                self.selected = (self.selected + 1).min(self.current().len() - 1);
                MenuEvent::None
            }
            MenuKey::Enter => self.activate(),
            MenuKey::Escape if self.mode == MenuMode::Advanced => {
                self.leave_advanced();
                MenuEvent::None
            }
            MenuKey::Char('e') => {
                let entry = self.current()[self.selected];
                if let Some(lines) = entry.script(&self.kernel_version) {
                    self.edit = Some(ScriptEdit {
                        prior: self.mode,
                        lines,
                        row: 0,
                        col: 0,
                    });
                    self.mode = MenuMode::EditCmdline;
                }
                MenuEvent::None
            }
            MenuKey::Char('c') => {
                self.console = Some(Console {
                    prior: self.mode,
                    input: String::new(),
                    transcript: Vec::new(),
                });
                self.mode = MenuMode::CommandLine;
                MenuEvent::None
            }
            _ => MenuEvent::None,
        }
    }

    /// Act on the highlighted entry as if Enter were pressed.
    fn activate(&mut self) -> MenuEvent {
        let entry = self.current()[self.selected];
        match entry {
            Entry::AdvancedOptions => {
                self.mode = MenuMode::Advanced;
                self.selected = 0;
                MenuEvent::None
            }
            Entry::Back => {
                self.leave_advanced();
                MenuEvent::None
            }
            other => match other.target() {
                Some(target) => self.boot(target),
                None => MenuEvent::None,
            },
        }
    }

    fn leave_advanced(&mut self) {
        self.mode = MenuMode::Main;
        self.selected = self
            .main
            .iter()
            .position(|e| *e == Entry::AdvancedOptions)
            .unwrap_or(0);
    }

    fn boot(&mut self, target: BootTarget) -> MenuEvent {
        debug!(?target, "grub boot");
        self.countdown = None;
        self.booted = Some(target);
        MenuEvent::Boot(target)
    }

    fn handle_edit_key(&mut self, key: MenuKey) -> MenuEvent {
        let Some(edit) = self.edit.as_mut() else {
            self.mode = MenuMode::Main;
            return MenuEvent::None;
        };
        match key {
            MenuKey::Escape => {
                self.mode = edit.prior;
                self.edit = None;
            }
            MenuKey::BootEdited => {
                let target = target_for_script(&edit.lines);
                self.mode = edit.prior;
                self.edit = None;
                return self.boot(target);
            }
            MenuKey::Up => {
                edit.row = edit.row.saturating_sub(1);
                edit.col = edit.col.min(edit.lines[edit.row].chars().count());
            }
            MenuKey::Down => {
                edit.row = (edit.row + 1).min(edit.lines.len() - 1);
                edit.col = edit.col.min(edit.lines[edit.row].chars().count());
            }
            MenuKey::Left => edit.col = edit.col.saturating_sub(1),
            MenuKey::Right => {
                edit.col = (edit.col + 1).min(edit.lines[edit.row].chars().count());
            }
            MenuKey::Enter => {
                let line = &mut edit.lines[edit.row];
                let at = byte_index(line, edit.col);
                let tail = line.split_off(at);
                edit.row += 1;
                edit.lines.insert(edit.row, tail);
                edit.col = 0;
            }
            MenuKey::Backspace => {
                if edit.col > 0 {
                    let line = &mut edit.lines[edit.row];
                    let at = byte_index(line, edit.col - 1);
                    line.remove(at);
                    edit.col -= 1;
                } else if edit.row > 0 {
                    let line = edit.lines.remove(edit.row);
                    edit.row -= 1;
                    edit.col = edit.lines[edit.row].chars().count();
                    edit.lines[edit.row].push_str(&line);
                }
            }
            MenuKey::Char(c) => {
                let line = &mut edit.lines[edit.row];
                let at = byte_index(line, edit.col);
                line.insert(at, c);
                edit.col += 1;
            }
        }
        MenuEvent::None
    }

    fn handle_console_key(&mut self, key: MenuKey) -> MenuEvent {
        let Some(console) = self.console.as_mut() else {
            self.mode = MenuMode::Main;
            return MenuEvent::None;
        };
        match key {
            MenuKey::Escape => {
                self.mode = console.prior;
                self.console = None;
            }
            MenuKey::Backspace => {
                console.input.pop();
            }
            MenuKey::Char(c) => console.input.push(c),
            MenuKey::Enter => {
                let input = std::mem::take(&mut console.input);
                console.transcript.push(format!("grub> {}", input));
                return self.run_console_command(input.trim());
            }
            _ => {}
        }
        MenuEvent::None
    }

    fn run_console_command(&mut self, input: &str) -> MenuEvent {
        let mut words = input.split_whitespace();
        let command = words.next().unwrap_or("");
        let output: Vec<String> = match command {
            "" => Vec::new(),
            "help" => vec!["boot  echo  exit  help  ls  normal  reboot  set".to_string()],
            "ls" => vec!["(hd0) (hd0,gpt1) (hd0,gpt2)".to_string()],
            "echo" => vec![words.collect::<Vec<_>>().join(" ")],
            "set" => vec![
                format!("default={}", self.config.default_entry),
                format!("timeout={}", self.config.timeout_secs),
                format!("prefix=(hd0,gpt2){}", GRUB_CFG_PATH.trim_end_matches("/grub.cfg")),
            ],
            "boot" => return self.boot(BootTarget::Normal),
            "reboot" => return MenuEvent::Reboot,
            "normal" | "exit" => {
                self.mode = self.console.as_ref().map_or(MenuMode::Main, |c| c.prior);
                self.console = None;
                return MenuEvent::None;
            }
            other => vec![format!("error: can't find command `{}'.", other)],
        };
        if let Some(console) = self.console.as_mut() {
            console.transcript.extend(output);
        }
        MenuEvent::None
    }

    // ========== Rendering ==========

    /// Text of the current screen.
    pub fn render(&self) -> String {
        if self.rescue {
            return rescue_screen();
        }
        match self.mode {
            MenuMode::Main | MenuMode::Advanced => self.render_menu(),
            MenuMode::EditCmdline => self.render_edit(),
            MenuMode::CommandLine => self.render_console(),
        }
    }

    fn render_menu(&self) -> String {
        let mut out = header();
        out.push_str(&box_top());
        let entries = self.entries();
        for (i, label) in entries.iter().enumerate() {
            let marker = if i == self.selected { '*' } else { ' ' };
            out.push_str(&box_row(&format!("{}{}", marker, label)));
        }
        for _ in entries.len()..BOX_ROWS {
            out.push_str(&box_row(""));
        }
        out.push_str(&box_bottom());
        out.push('\n');
        out.push_str("      Use the ^ and v keys to select which entry is highlighted.\n");
        out.push_str("      Press enter to boot the selected OS, `e' to edit the commands\n");
        out.push_str("      before booting or `c' for a command-line.");
        if self.mode == MenuMode::Advanced {
            out.push_str(" ESC to return\n      previous menu.");
        }
        out.push('\n');
        if let Some(secs) = self.countdown {
            out.push_str(&format!(
                "   The highlighted entry will be executed automatically in {}s.\n",
                secs
            ));
        }
        out
    }

    fn render_edit(&self) -> String {
        let mut out = header();
        out.push_str(&box_top());
        if let Some(edit) = &self.edit {
            for line in edit.lines.iter().take(BOX_ROWS) {
                out.push_str(&box_row(line));
            }
            for _ in edit.lines.len()..BOX_ROWS {
                out.push_str(&box_row(""));
            }
        }
        out.push_str(&box_bottom());
        out.push('\n');
        out.push_str("      Minimum Emacs-like screen editing is supported. TAB lists\n");
        out.push_str("      completions. Press Ctrl-x or F10 to boot, Ctrl-c or F2 for\n");
        out.push_str("      a command-line or ESC to discard edits and return to the GRUB\n");
        out.push_str("      menu.\n");
        out
    }

    fn render_console(&self) -> String {
        let mut out = header();
        out.push_str("   Minimal BASH-like line editing is supported. For the first word, TAB\n");
        out.push_str("   lists possible command completions. Anywhere else TAB lists possible\n");
        out.push_str("   device or file completions. ESC at any time exits.\n\n");
        if let Some(console) = &self.console {
            for line in &console.transcript {
                out.push_str(line);
                out.push('\n');
            }
            out.push_str(&format!("grub> {}", console.input));
        }
        out
    }
}

/// Pick the boot path an edited script leads to.
fn target_for_script(lines: &[String]) -> BootTarget {
    let kernel_line = lines
        .iter()
        .map(|l| l.trim())
        .find(|l| l.starts_with("linux"));
    match kernel_line {
        Some(line) if line.starts_with("linux16") && line.contains("memtest") => {
            BootTarget::MemoryTest
        }
        Some(line)
            if line
                .split_whitespace()
                .any(|arg| arg == "single" || arg == "recovery") =>
        {
            BootTarget::Recovery
        }
        _ => BootTarget::Normal,
    }
}

fn byte_index(line: &str, col: usize) -> usize {
    line.char_indices()
        .nth(col)
        .map(|(i, _)| i)
        .unwrap_or(line.len())
}

fn header() -> String {
    "\n\n                             GNU GRUB  version 2.06\n\n".to_string()
}

fn box_top() -> String {
    format!(" +{}+\n", "-".repeat(BOX_WIDTH))
}

fn box_bottom() -> String {
    format!(" +{}+\n", "-".repeat(BOX_WIDTH))
}

fn box_row(text: &str) -> String {
    let clipped: String = text.chars().take(BOX_WIDTH).collect();
    format!(" |{:<width$}|\n", clipped, width = BOX_WIDTH)
}

fn rescue_screen() -> String {
    format!(
        "error: file '{}' not found.\nEntering rescue mode...\ngrub rescue> ",
        GRUB_CFG_PATH
    )
}

#[cfg(test)]
#[path = "grub_tests.rs"]
mod grub_tests;
