//! The terminal as the page sees it.

use kpawnd_boot::BootPath;
use kpawnd_shell::{Engine, EngineConfig, HostInfo, LoginStage};
use kpawnd_vfs::NodeType;
use wasm_bindgen::prelude::*;

use crate::grub::{GrubMenu, Memtest};
use crate::nano::NanoEditor;
use crate::{js_error, log};

fn config_from(json: Option<String>) -> Result<EngineConfig, JsValue> {
    match json {
        Some(json) if !json.trim().is_empty() => EngineConfig::from_json(&json).map_err(js_error),
        _ => Ok(EngineConfig::default()),
    }
}

fn set(obj: &js_sys::Object, key: &str, value: JsValue) {
    let _ = js_sys::Reflect::set(obj, &JsValue::from_str(key), &value);
}

/// One simulated machine behind one terminal tab.
#[wasm_bindgen]
pub struct System {
    engine: Engine,
}

#[wasm_bindgen]
impl System {
    /// A fresh machine. `config_json` may override any `EngineConfig` field.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<System, JsValue> {
        let engine = Engine::new(config_from(config_json)?).map_err(js_error)?;
        log("[kpawnd] new filesystem seeded");
        Ok(System { engine })
    }

    /// A machine whose filesystem was saved with `export_vfs`.
    pub fn restore(config_json: Option<String>, blob: &str) -> Result<System, JsValue> {
        let engine = Engine::restore(config_from(config_json)?, blob).map_err(js_error)?;
        log("[kpawnd] filesystem restored");
        Ok(System { engine })
    }

    // ========== Terminal ==========

    /// Run one line. The result is display text or a control token.
    pub fn exec(&mut self, line: &str) -> String {
        self.engine.exec(line).render()
    }

    pub fn prompt(&self) -> String {
        self.engine.prompt()
    }

    pub fn complete(&self, partial: &str) -> js_sys::Array {
        self.engine
            .complete(partial)
            .into_iter()
            .map(JsValue::from)
            .collect()
    }

    /// Whether the current line should be echoed as asterisks.
    pub fn input_is_secret(&self) -> bool {
        self.engine.input_is_secret()
    }

    /// `"username"`, `"password"` or `"done"`.
    pub fn login_stage(&self) -> String {
        match self.engine.login_stage() {
            LoginStage::Username => "username",
            LoginStage::Password => "password",
            LoginStage::Done => "done",
        }
        .to_string()
    }

    pub fn set_user(&mut self, username: &str) -> Result<(), JsValue> {
        self.engine.set_user(username).map_err(js_error)
    }

    pub fn set_user_password(&mut self, password: &str) {
        self.engine.set_user_password(password);
    }

    pub fn is_waiting_for_sudo(&self) -> bool {
        self.engine.is_waiting_for_sudo()
    }

    pub fn exec_python(&mut self, code: &str) -> String {
        self.engine.exec_python(code).render()
    }

    pub fn is_in_python_repl(&self) -> bool {
        self.engine.is_in_python()
    }

    // ========== Filesystem ==========

    /// Entries of a directory as `{ name, type, size, owner }` objects.
    pub fn fs_list(&self, path: &str) -> Result<js_sys::Array, JsValue> {
        let entries = self.engine.fs_list(path).map_err(js_error)?;
        Ok(entries
            .into_iter()
            .map(|entry| {
                let obj = js_sys::Object::new();
                let kind = match entry.node_type {
                    NodeType::File => "file",
                    NodeType::Directory => "dir",
                };
                set(&obj, "name", JsValue::from_str(&entry.name));
                set(&obj, "type", JsValue::from_str(kind));
                set(&obj, "size", JsValue::from_f64(entry.size as f64));
                set(&obj, "owner", JsValue::from_str(&entry.owner));
                JsValue::from(obj)
            })
            .collect())
    }

    pub fn fs_read(&self, path: &str) -> Result<String, JsValue> {
        self.engine.fs_read(path).map_err(js_error)
    }

    pub fn fs_write(&mut self, path: &str, content: &str) -> Result<(), JsValue> {
        self.engine.fs_write(path, content).map_err(js_error)
    }

    pub fn fs_mkdir(&mut self, path: &str) -> Result<(), JsValue> {
        self.engine.fs_mkdir(path).map_err(js_error)
    }

    pub fn fs_rm(&mut self, path: &str, recursive: bool) -> Result<(), JsValue> {
        self.engine.fs_rm(path, recursive).map_err(js_error)
    }

    /// Write an editor buffer back to its file.
    pub fn save_file(&mut self, editor: &mut NanoEditor) -> Result<(), JsValue> {
        self.engine.save_editor(&mut editor.inner).map_err(js_error)
    }

    pub fn export_vfs(&self) -> Result<String, JsValue> {
        self.engine.export_vfs().map_err(js_error)
    }

    pub fn import_vfs(&mut self, blob: &str) -> Result<(), JsValue> {
        self.engine.import_vfs(blob).map_err(js_error)?;
        log("[kpawnd] filesystem imported");
        Ok(())
    }

    // ========== Machine state ==========

    pub fn check_kernel_panic(&self) -> bool {
        self.engine.panic_message().is_some()
    }

    pub fn panic_message(&self) -> Option<String> {
        self.engine.panic_message().map(str::to_string)
    }

    pub fn reboot(&mut self) {
        log("[kpawnd] reboot");
        self.engine.reboot();
    }

    /// One second of machine time.
    pub fn tick(&mut self) {
        self.engine.tick();
    }

    /// `resolution`, `terminal` and `cpu` as reported by the browser, as JSON.
    pub fn set_host_info(&mut self, json: &str) -> Result<(), JsValue> {
        let host: HostInfo = serde_json::from_str(json).map_err(js_error)?;
        self.engine.set_host_info(host);
        Ok(())
    }

    // ========== Boot ==========

    /// The boot menu as the current `grub.cfg` describes it.
    pub fn grub_menu(&self) -> GrubMenu {
        GrubMenu::from(self.engine.grub_menu())
    }

    pub fn has_grub(&self) -> bool {
        !self.engine.grub_menu().is_rescue()
    }

    pub fn start_boot(&mut self, recovery: bool) {
        let path = if recovery {
            BootPath::Recovery
        } else {
            BootPath::Normal
        };
        self.engine.start_boot(path);
    }

    /// Next boot log line; `undefined` when the log is exhausted.
    pub fn next_boot_line(&mut self) -> Option<String> {
        self.engine.next_boot_line()
    }

    pub fn is_booted(&self) -> bool {
        self.engine.is_booted()
    }

    /// A memory test sized to this machine.
    pub fn memtest(&self) -> Memtest {
        Memtest::from(self.engine.memtest())
    }
}
