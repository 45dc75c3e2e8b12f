use super::*;

fn engine() -> Engine {
    let mut sh = Engine::new(EngineConfig::default()).unwrap();
    sh.set_user("alice").unwrap();
    sh.set_user_password("pw");
    sh
}

fn run(sh: &mut Engine, line: &str) -> String {
    sh.exec(line).render()
}

fn sudo(sh: &mut Engine, line: &str) -> Output {
    let prompt = sh.exec(&format!("sudo {}", line));
    assert_eq!(prompt.render(), "[sudo] password for alice:");
    sh.exec("pw")
}

// ========== Login ==========

#[test]
fn test_login_prompt_flow() {
    let mut sh = Engine::new(EngineConfig::default()).unwrap();
    assert_eq!(sh.prompt(), "kpawnd login: ");
    assert!(!sh.input_is_secret());

    assert_eq!(run(&mut sh, "alice"), "");
    assert_eq!(sh.prompt(), "Password: ");
    assert!(sh.input_is_secret());

    let motd = run(&mut sh, "hunter2");
    assert!(motd.starts_with("Welcome to kpawnd"));
    assert_eq!(sh.login_stage(), LoginStage::Done);
    assert_eq!(sh.cwd(), "/home/alice");
    assert!(sh.vfs().exists("/home/alice/readme.txt"));
    assert_eq!(sh.prompt(), "alice@kpawnd:~$ ");
    assert!(sh.history().is_empty());
}

#[test]
fn test_nothing_runs_before_login() {
    let mut sh = Engine::new(EngineConfig::default()).unwrap();
    assert_eq!(run(&mut sh, "reboot"), "");
    assert_eq!(sh.login_stage(), LoginStage::Password);
    assert!(sh.history().is_empty());
}

#[test]
fn test_unrecognized_command() {
    let mut sh = engine();
    let out = sh.exec("frobnicate now");
    assert!(out.is_unrecognized());
    assert_eq!(out.render(), "sh: frobnicate: command not found");
    assert_eq!(sh.history(), ["frobnicate now"]);
}

#[test]
fn test_blank_line_is_not_recorded() {
    let mut sh = engine();
    assert_eq!(sh.exec("   "), Output::empty());
    assert!(sh.history().is_empty());
}

// ========== Sudo ==========

#[test]
fn test_sudo_runs_parked_command_as_root() {
    let mut sh = engine();
    assert_eq!(run(&mut sh, "reboot"), "reboot: Permission denied");

    assert_eq!(run(&mut sh, "sudo reboot"), "[sudo] password for alice:");
    assert!(sh.is_waiting_for_sudo());
    assert!(sh.input_is_secret());
    assert_eq!(sh.exec("pw"), Output::Action(Action::Reboot));
    assert!(!sh.is_waiting_for_sudo());
    assert_eq!(sh.user(), "alice");
    assert_eq!(sh.history(), ["reboot", "sudo reboot"]);
}

#[test]
fn test_sudo_wrong_password_drops_the_command() {
    let mut sh = engine();
    run(&mut sh, "sudo reboot");
    let out = sh.exec("letmein");
    assert_eq!(out, Output::Failed(ShellError::AuthenticationFailed));
    assert_eq!(out.render(), "sudo: Authentication failure");
    assert!(!sh.is_waiting_for_sudo());

    // The next line is an ordinary command again
    assert_eq!(run(&mut sh, "whoami"), "alice");
    assert!(!sh.history().iter().any(|line| line == "letmein"));
}

#[test]
fn test_sudo_whoami() {
    let mut sh = engine();
    assert_eq!(sudo(&mut sh, "whoami").render(), "root");
    assert_eq!(run(&mut sh, "whoami"), "alice");
}

#[test]
fn test_sudo_redirect_writes_as_root() {
    let mut sh = engine();
    assert_eq!(sudo(&mut sh, "echo hello > /etc/motd"), Output::empty());
    assert_eq!(sh.vfs().read_to_string("/etc/motd").unwrap(), "hello\n");
    assert_eq!(sh.vfs().stat("/etc/motd").unwrap().owner, "root");
}

// ========== Permissions and redirects ==========

#[test]
fn test_system_files_need_root() {
    let mut sh = engine();
    assert_eq!(
        run(&mut sh, "touch /etc/x"),
        "touch: cannot touch '/etc/x': Permission denied"
    );
    assert_eq!(run(&mut sh, "echo hi > /etc/motd"), "sh: /etc/motd: Permission denied");
    assert!(!sh.vfs().exists("/etc/x"));

    sudo(&mut sh, "touch /etc/x");
    assert_eq!(sh.vfs().stat("/etc/x").unwrap().owner, "root");
}

#[test]
fn test_tmp_is_shared() {
    let mut sh = engine();
    assert_eq!(run(&mut sh, "touch /tmp/scratch"), "");
    assert_eq!(sh.vfs().stat("/tmp/scratch").unwrap().owner, "alice");
}

#[test]
fn test_redirect_write_and_append() {
    let mut sh = engine();
    assert_eq!(run(&mut sh, "echo hello > notes.txt"), "");
    assert_eq!(run(&mut sh, "cat notes.txt"), "hello");
    run(&mut sh, "echo more >> notes.txt");
    assert_eq!(run(&mut sh, "cat notes.txt"), "hello\nmore");
    assert_eq!(sh.fs_read("notes.txt").unwrap(), "hello\nmore\n");
    assert_eq!(sh.vfs().stat("/home/alice/notes.txt").unwrap().owner, "alice");
}

#[test]
fn test_env_expansion() {
    let mut sh = engine();
    run(&mut sh, "export GREETING=hi");
    assert_eq!(run(&mut sh, "echo $GREETING $USER"), "hi alice");
    assert_eq!(run(&mut sh, "echo $NOPE."), ".");
}

// ========== Navigation ==========

#[test]
fn test_cd_and_prompt() {
    let mut sh = engine();
    run(&mut sh, "mkdir -p a/b");
    run(&mut sh, "cd a/b");
    assert_eq!(run(&mut sh, "pwd"), "/home/alice/a/b");
    assert_eq!(sh.prompt(), "alice@kpawnd:~/a/b$ ");

    run(&mut sh, "cd ..");
    assert_eq!(sh.cwd(), "/home/alice/a");
    run(&mut sh, "cd /etc");
    assert_eq!(sh.prompt(), "alice@kpawnd:/etc$ ");
    run(&mut sh, "cd");
    assert_eq!(sh.cwd(), "/home/alice");

    assert_eq!(run(&mut sh, "cd /nope"), "cd: /nope: No such file or directory");
    assert_eq!(run(&mut sh, "cd readme.txt"), "cd: readme.txt: Not a directory");
    assert_eq!(sh.cwd(), "/home/alice");
}

#[test]
fn test_long_listing_of_a_single_file() {
    let mut sh = engine();
    run(&mut sh, "echo hi > one.txt");
    assert_eq!(run(&mut sh, "ls -l one.txt"), "-rw-r--r-- alice         3 one.txt");
}

#[test]
fn test_aliases() {
    let mut sh = engine();
    run(&mut sh, "touch .hidden");
    assert_eq!(run(&mut sh, "ls"), "readme.txt");
    assert_eq!(run(&mut sh, "la"), "readme.txt  .hidden");

    run(&mut sh, "alias l='ls'");
    assert_eq!(run(&mut sh, "l"), "readme.txt");
    assert_eq!(run(&mut sh, "alias l"), "alias l='ls'");
}

#[test]
fn test_complete_uses_cwd() {
    let mut sh = engine();
    assert_eq!(sh.complete("cat rea"), vec!["readme.txt"]);
    run(&mut sh, "cd /etc");
    assert_eq!(sh.complete("cat os-"), vec!["os-release"]);
    assert_eq!(sh.complete("ho"), vec!["hostname", "host"]);
}

// ========== Actions ==========

#[test]
fn test_echo_github_opens_profile() {
    let mut sh = engine();
    assert_eq!(
        sh.exec("echo github"),
        Output::Action(Action::Open("https://www.github.com/kpawnd".to_string()))
    );
    assert_eq!(run(&mut sh, "echo github stars"), "github stars");
}

#[test]
fn test_nano_opens_buffer() {
    let mut sh = engine();
    run(&mut sh, "echo draft > plan.txt");
    assert_eq!(
        sh.exec("nano plan.txt"),
        Output::Action(Action::Nano {
            filename: "/home/alice/plan.txt".to_string(),
            content: "draft\n".to_string(),
        })
    );
    assert_eq!(
        sh.exec("vi fresh.txt"),
        Output::Action(Action::Nano {
            filename: "/home/alice/fresh.txt".to_string(),
            content: String::new(),
        })
    );
}

#[test]
fn test_save_editor_respects_permissions() {
    let mut sh = engine();
    let mut editor = NanoEditor::new("/home/alice/todo.txt", "one\ntwo");
    sh.save_editor(&mut editor).unwrap();
    assert_eq!(sh.fs_read("todo.txt").unwrap(), "one\ntwo");

    let mut editor = NanoEditor::new("/etc/passwd", "root::0:0");
    let err = sh.save_editor(&mut editor).unwrap_err();
    assert_eq!(err.to_string(), "nano: /etc/passwd: Permission denied");
    assert!(sh.fs_read("/etc/passwd").unwrap().starts_with("root:x:0:0"));
}

#[test]
fn test_python_repl() {
    let mut sh = engine();
    assert_eq!(sh.exec("python3"), Output::Action(Action::PythonRepl));
    assert!(sh.is_in_python());
    assert_eq!(sh.prompt(), ">>> ");

    assert_eq!(sh.exec_python("x = 6"), Output::empty());
    assert_eq!(sh.exec_python("x * 7"), Output::text("42"));
    assert_eq!(sh.exec_python("exit()"), Output::Action(Action::ExitPython));
    assert!(!sh.is_in_python());
    assert_eq!(sh.prompt(), "alice@kpawnd:~$ ");
}

// ========== Kernel panic ==========

#[test]
fn test_removing_init_shell_panics_until_reboot() {
    let mut sh = engine();
    let out = sudo(&mut sh, "rm /bin/sh");
    assert_eq!(out.render(), "KERNEL_PANIC:Attempted to kill init!");
    assert_eq!(sh.panic_message(), Some(INIT_PANIC));

    assert_eq!(run(&mut sh, "ls"), "KERNEL_PANIC:Attempted to kill init!");
    assert!(sh.fs_write("/tmp/x", "y").is_err());

    sh.reboot();
    assert_eq!(sh.panic_message(), None);
    assert!(sh.vfs().exists("/bin/sh"));
    assert_eq!(run(&mut sh, "whoami"), "alice");
}

#[test]
fn test_moving_sbin_panics() {
    let mut sh = engine();
    let out = sudo(&mut sh, "mv /sbin /old");
    assert_eq!(out.action(), Some(&Action::KernelPanic(INIT_PANIC.to_string())));
    sh.reboot();
    assert!(sh.vfs().exists("/sbin/init"));
}

#[test]
fn test_killing_init_panics() {
    let mut sh = engine();
    assert_eq!(run(&mut sh, "kill 1"), "kill: (1): Permission denied");
    assert_eq!(
        sudo(&mut sh, "kill 1").action(),
        Some(&Action::KernelPanic(INIT_PANIC.to_string()))
    );
}

#[test]
fn test_rm_root_is_refused() {
    let mut sh = engine();
    let out = sudo(&mut sh, "rm -rf /");
    assert!(matches!(out, Output::Failed(ShellError::Refused { .. })));
    assert!(out.render().starts_with("rm: it is dangerous to operate recursively on '/'"));
    assert!(sh.vfs().exists("/bin/sh"));
    assert_eq!(sh.panic_message(), None);
}

#[test]
fn test_fs_rm_of_init_panics() {
    let mut sh = engine();
    sh.set_user("root").unwrap();
    sh.fs_rm("/sbin/init", false).unwrap();
    assert_eq!(sh.panic_message(), Some(INIT_PANIC));
}

// ========== Boot ==========

#[test]
fn test_missing_grub_cfg_means_rescue() {
    let mut sh = engine();
    assert!(!sh.grub_menu().is_rescue());

    sudo(&mut sh, "rm /boot/grub/grub.cfg");
    assert!(sh.grub_menu().is_rescue());

    assert_eq!(
        run(&mut sh, "update-grub"),
        "grub-mkconfig: /boot/grub/grub.cfg.new: Permission denied"
    );
    let report = sudo(&mut sh, "update-grub").render();
    assert!(report.starts_with("Generating grub configuration file ..."));
    assert!(report.contains("Found linux image: /boot/vmlinuz-6.1.0-kpawnd"));
    assert!(!sh.grub_menu().is_rescue());
}

#[test]
fn test_boot_log_plays_to_completion() {
    let mut sh = engine();
    assert_eq!(sh.next_boot_line(), None);

    sh.start_boot(BootPath::Normal);
    let mut lines = Vec::new();
    while let Some(line) = sh.next_boot_line() {
        lines.push(line);
        assert!(lines.len() < 1000);
    }
    assert_eq!(lines.last().map(String::as_str), Some(kpawnd_boot::BOOT_COMPLETE));
    assert!(sh.is_booted());

    sh.reboot();
    assert!(!sh.is_booted());
}

#[test]
fn test_reboot_clears_transient_state() {
    let mut sh = engine();
    run(&mut sh, "cd /etc");
    sh.exec("python");
    sh.tick();
    sh.tick();
    assert_eq!(sh.sysinfo().uptime_secs, 2);

    sh.reboot();
    assert_eq!(sh.cwd(), "/home/alice");
    assert!(!sh.is_in_python());
    assert_eq!(sh.sysinfo().uptime_secs, 0);
    assert_eq!(sh.login_user(), "alice");
}

// ========== Host-facing API ==========

#[test]
fn test_fs_api() {
    let mut sh = engine();
    assert_eq!(
        sh.fs_mkdir("projects/site").unwrap_err().to_string(),
        "mkdir: projects/site: No such file or directory"
    );
    assert!(!sh.vfs().exists("/home/alice/projects"));
    sh.fs_mkdir("projects").unwrap();
    sh.fs_mkdir("projects/site").unwrap();
    assert_eq!(
        sh.fs_mkdir("projects").unwrap_err().to_string(),
        "mkdir: projects: File exists"
    );
    sh.fs_write("projects/site/index.html", "<h1>hi</h1>").unwrap();
    assert_eq!(sh.fs_read("/home/alice/projects/site/index.html").unwrap(), "<h1>hi</h1>");

    let names: Vec<String> = sh
        .fs_list("projects")
        .unwrap()
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    assert_eq!(names, vec!["site"]);

    assert!(sh.fs_rm("projects", false).is_err());
    sh.fs_rm("projects", true).unwrap();
    assert!(!sh.vfs().exists("/home/alice/projects"));

    assert_eq!(
        sh.fs_write("/etc/hostname", "pwned").unwrap_err().to_string(),
        "write: /etc/hostname: Permission denied"
    );
}

#[test]
fn test_export_and_restore() {
    let mut sh = engine();
    run(&mut sh, "echo keep > keep.txt");
    let blob = sh.export_vfs().unwrap();

    let restored = Engine::restore(EngineConfig::default(), &blob).unwrap();
    assert_eq!(
        restored.vfs().read_to_string("/home/alice/keep.txt").unwrap(),
        "keep\n"
    );

    let mut other = engine();
    assert!(other.import_vfs("not json").is_err());
    assert!(other.vfs().exists("/bin/sh"));
    other.import_vfs(&blob).unwrap();
    assert!(other.vfs().exists("/home/alice/keep.txt"));
}

#[test]
fn test_hostname_follows_etc_hostname() {
    let mut sh = engine();
    sudo(&mut sh, "echo box > /etc/hostname");
    assert_eq!(sh.prompt(), "alice@box:~$ ");
    assert_eq!(sh.sysinfo().hostname, "box");
}

#[test]
fn test_sysinfo_uses_host_info() {
    let mut sh = engine();
    sh.set_host_info(HostInfo {
        resolution: "1920x1080".to_string(),
        terminal: "xterm.js".to_string(),
        cpu: String::new(),
    });
    let info = sh.sysinfo();
    assert_eq!(info.user, "alice");
    assert_eq!(info.resolution, "1920x1080");
    assert_eq!(info.cpu, "kpawnd virtual processor");
    assert_eq!(info.memory_total_mib, 32);
    assert!(info.packages > 50);
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn completion_is_stable_and_prefixed(
            dir in prop_oneof![Just(""), Just("/etc/"), Just("/bin/"), Just("~/")],
            stem in "[a-z.]{0,3}",
        ) {
            let mut sh = engine();
            run(&mut sh, "touch notes.txt");
            let word = format!("{}{}", dir, stem);
            let line = format!("cat {}", word);

            let first = sh.complete(&line);
            prop_assert_eq!(&first, &sh.complete(&line));
            for candidate in &first {
                prop_assert!(candidate.starts_with(&word));
            }
        }

        #[test]
        fn wrong_sudo_password_always_clears_the_pending_command(
            attempt in "[A-Za-z0-9]{1,12}",
            command in prop_oneof![Just("reboot"), Just("rm /etc/motd"), Just("whoami")],
        ) {
            prop_assume!(attempt != "pw");
            let mut sh = engine();
            run(&mut sh, &format!("sudo {}", command));
            prop_assert!(sh.is_waiting_for_sudo());

            let out = sh.exec(&attempt);
            prop_assert_eq!(out, Output::Failed(ShellError::AuthenticationFailed));
            prop_assert!(!sh.is_waiting_for_sudo());
            prop_assert!(sh.vfs().exists("/etc/motd"));
            prop_assert!(!sh.history().iter().any(|line| *line == attempt));
            prop_assert_eq!(run(&mut sh, "whoami"), "alice");
        }
    }
}
