//! Boot screen bindings.

use kpawnd_boot::{BootConfig, BootTarget, MenuEvent, MenuKey, MenuMode};
use wasm_bindgen::prelude::*;

use crate::log;

/// Map a `KeyboardEvent.key` value onto a menu key.
fn menu_key(key: &str, ctrl: bool) -> Option<MenuKey> {
    let key = match key {
        "ArrowUp" => MenuKey::Up,
        "ArrowDown" => MenuKey::Down,
        "ArrowLeft" => MenuKey::Left,
        "ArrowRight" => MenuKey::Right,
        "Enter" => MenuKey::Enter,
        "Escape" => MenuKey::Escape,
        "Backspace" => MenuKey::Backspace,
        "F10" => MenuKey::BootEdited,
        "x" | "X" if ctrl => MenuKey::BootEdited,
        _ if ctrl => return None,
        other => {
            let mut chars = other.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => MenuKey::Char(c),
                _ => return None,
            }
        }
    };
    Some(key)
}

/// Token for what the page should do next. Empty means just re-render.
fn event_token(event: MenuEvent) -> String {
    let token = match event {
        MenuEvent::None => "",
        MenuEvent::Reboot => "REBOOT",
        MenuEvent::Boot(BootTarget::Normal) => "BOOT_NORMAL",
        MenuEvent::Boot(BootTarget::Recovery) => "BOOT_RECOVERY",
        MenuEvent::Boot(BootTarget::MemoryTest) => "BOOT_MEMTEST",
        MenuEvent::Boot(BootTarget::FirmwareSetup) => "BOOT_FIRMWARE",
    };
    if !token.is_empty() {
        log(&format!("[kpawnd] grub: {}", token));
    }
    token.to_string()
}

/// The GRUB menu.
#[wasm_bindgen]
pub struct GrubMenu {
    inner: kpawnd_boot::GrubMenu,
}

impl From<kpawnd_boot::GrubMenu> for GrubMenu {
    fn from(inner: kpawnd_boot::GrubMenu) -> Self {
        Self { inner }
    }
}

#[wasm_bindgen]
impl GrubMenu {
    /// A menu with default settings, for pages that run it standalone.
    #[wasm_bindgen(constructor)]
    pub fn new(kernel_version: &str) -> GrubMenu {
        kpawnd_boot::GrubMenu::new(BootConfig::default(), kernel_version).into()
    }

    pub fn render(&self) -> String {
        self.inner.render()
    }

    /// One second of countdown.
    pub fn tick(&mut self) -> String {
        event_token(self.inner.tick())
    }

    /// Feed a `KeyboardEvent.key`. Unknown keys are ignored.
    pub fn key(&mut self, key: &str, ctrl: bool) -> String {
        match menu_key(key, ctrl) {
            Some(key) => event_token(self.inner.handle_key(key)),
            None => String::new(),
        }
    }

    /// `"main"`, `"advanced"`, `"edit"` or `"cmdline"`.
    pub fn mode(&self) -> String {
        match self.inner.mode() {
            MenuMode::Main => "main",
            MenuMode::Advanced => "advanced",
            MenuMode::EditCmdline => "edit",
            MenuMode::CommandLine => "cmdline",
        }
        .to_string()
    }

    pub fn selected(&self) -> usize {
        self.inner.selected()
    }

    pub fn countdown(&self) -> Option<u32> {
        self.inner.countdown()
    }

    pub fn is_rescue(&self) -> bool {
        self.inner.is_rescue()
    }
}

/// The memory tester.
#[wasm_bindgen]
pub struct Memtest {
    inner: kpawnd_diag::Memtest,
}

impl From<kpawnd_diag::Memtest> for Memtest {
    fn from(inner: kpawnd_diag::Memtest) -> Self {
        Self { inner }
    }
}

#[wasm_bindgen]
impl Memtest {
    #[wasm_bindgen(constructor)]
    pub fn new(memory_mb: u32) -> Memtest {
        kpawnd_diag::Memtest::new(memory_mb).into()
    }

    pub fn header(&self) -> String {
        self.inner.header()
    }

    /// Advance one step. Returns `false` once the run is over.
    pub fn tick(&mut self) -> bool {
        self.inner.tick()
    }

    pub fn cancel(&mut self) {
        self.inner.cancel();
    }

    pub fn current_line(&self) -> String {
        self.inner.current_line()
    }

    pub fn is_complete(&self) -> bool {
        self.inner.is_complete()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    pub fn errors(&self) -> u32 {
        self.inner.errors()
    }
}
