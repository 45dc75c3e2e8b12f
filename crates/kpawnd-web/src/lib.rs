//! kpawnd browser bindings.
//!
//! Thin `wasm-bindgen` wrappers over the host-independent crates. Nothing
//! here makes decisions; it converts between Rust types and what the page
//! script understands:
//!
//! - [`System`]: one terminal, answering each line with a display string or
//!   a control token such as `CLEAR` or `KERNEL_PANIC:...`
//! - [`GrubMenu`] and [`Memtest`]: the boot screens, driven by key names and
//!   once-a-second ticks
//! - [`NanoEditor`]: the editor buffer behind a `NANO:` token

mod grub;
mod nano;
mod system;

pub use grub::{GrubMenu, Memtest};
pub use nano::NanoEditor;
pub use system::System;

use wasm_bindgen::prelude::*;

/// Write a line to the browser console.
pub(crate) fn log(msg: &str) {
    web_sys::console::log_1(&JsValue::from_str(msg));
}

/// Error values handed back to JavaScript are plain strings.
pub(crate) fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Runs once when the module is instantiated.
#[wasm_bindgen(start)]
pub fn init_runtime() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
    log(&format!("[kpawnd] runtime {} ready", env!("CARGO_PKG_VERSION")));
}
