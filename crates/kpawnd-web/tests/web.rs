//! Browser binding tests, run with `wasm-pack test --node`.

#![cfg(target_arch = "wasm32")]

use kpawnd_web::{GrubMenu, Memtest, NanoEditor, System};
use wasm_bindgen_test::*;

fn logged_in() -> System {
    let mut system = System::new(None).unwrap();
    system.exec("alice");
    system.exec("pw");
    system
}

#[wasm_bindgen_test]
fn test_login_then_command() {
    let mut system = System::new(None).unwrap();
    assert_eq!(system.login_stage(), "username");
    system.exec("alice");
    assert!(system.input_is_secret());
    system.exec("pw");
    assert_eq!(system.login_stage(), "done");
    assert_eq!(system.exec("whoami"), "alice");
    assert_eq!(system.prompt(), "alice@kpawnd:~$ ");
}

#[wasm_bindgen_test]
fn test_config_json_overrides_defaults() {
    let mut system = System::new(Some(r#"{"hostname":"box"}"#.to_string())).unwrap();
    system.exec("alice");
    system.exec("pw");
    assert_eq!(system.exec("hostname"), "box");
    assert!(System::new(Some("{".to_string())).is_err());
}

#[wasm_bindgen_test]
fn test_actions_come_back_as_tokens() {
    let mut system = logged_in();
    assert_eq!(system.exec("clear"), "CLEAR");
    assert_eq!(system.exec("echo github"), "OPEN:https://www.github.com/kpawnd");
    assert_eq!(system.exec("nano x.txt"), "NANO:/home/alice/x.txt:");
}

#[wasm_bindgen_test]
fn test_editor_saves_through_system() {
    let mut system = logged_in();
    let mut editor = NanoEditor::new("/home/alice/x.txt", "");
    editor.insert("hello");
    assert!(editor.is_modified());
    system.save_file(&mut editor).unwrap();
    assert!(!editor.is_modified());
    assert_eq!(system.fs_read("x.txt").unwrap(), "hello");
    assert_eq!(system.fs_list("/home/alice").unwrap().length(), 2);
}

#[wasm_bindgen_test]
fn test_kernel_panic_and_reboot() {
    let mut system = logged_in();
    system.exec("sudo rm /bin/sh");
    assert_eq!(system.exec("pw"), "KERNEL_PANIC:Attempted to kill init!");
    assert!(system.check_kernel_panic());
    system.reboot();
    assert!(!system.check_kernel_panic());
    assert_eq!(system.exec("whoami"), "alice");
}

#[wasm_bindgen_test]
fn test_grub_menu_keys() {
    let mut menu = GrubMenu::new("6.1.0-kpawnd");
    assert_eq!(menu.key("ArrowDown", false), "");
    assert_eq!(menu.selected(), 1);
    assert_eq!(menu.countdown(), None);
    assert_eq!(menu.key("ArrowUp", false), "");
    assert_eq!(menu.key("Enter", false), "BOOT_NORMAL");
}

#[wasm_bindgen_test]
fn test_boot_log_from_system() {
    let mut system = logged_in();
    assert!(system.has_grub());
    system.start_boot(false);
    let mut last = String::new();
    while let Some(line) = system.next_boot_line() {
        last = line;
    }
    assert_eq!(last, "BOOT_COMPLETE");
    assert!(system.is_booted());
}

#[wasm_bindgen_test]
fn test_memtest_runs_to_completion() {
    let mut memtest = Memtest::new(1);
    let mut steps = 0;
    while memtest.tick() {
        steps += 1;
        assert!(steps < 10_000);
    }
    assert!(memtest.is_complete());
    assert_eq!(memtest.errors(), 0);
}
