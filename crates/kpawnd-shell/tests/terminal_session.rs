//! Terminal Session Integration Tests
//!
//! Drives the engine the way the browser does: one line at a time through
//! `exec`, checking only the rendered output.

use kpawnd_shell::{Action, Engine, EngineConfig, Output, Program};

fn logged_in() -> Engine {
    let mut sh = Engine::new(EngineConfig::default()).unwrap();
    sh.exec("alice");
    sh.exec("pw");
    sh
}

fn run(sh: &mut Engine, line: &str) -> String {
    sh.exec(line).render()
}

fn write_lines(sh: &mut Engine, path: &str, lines: &[&str]) {
    sh.fs_write(path, &format!("{}\n", lines.join("\n"))).unwrap();
}

/// Text tools read the files the filesystem builtins create.
#[test]
fn test_text_pipeline_over_files() {
    let mut sh = logged_in();
    write_lines(&mut sh, "fruit.txt", &["pear", "Apple", "fig", "fig", "plum"]);

    assert_eq!(run(&mut sh, "head -n 2 fruit.txt"), "pear\nApple");
    assert_eq!(run(&mut sh, "tail -n 1 fruit.txt"), "plum");
    assert_eq!(run(&mut sh, "sort fruit.txt"), "Apple\nfig\nfig\npear\nplum");
    assert_eq!(run(&mut sh, "uniq fruit.txt"), "pear\nApple\nfig\nplum");
    assert_eq!(run(&mut sh, "grep -i apple fruit.txt"), "Apple");
    assert_eq!(run(&mut sh, "grep -n fig fruit.txt"), "3:fig\n4:fig");
    assert_eq!(run(&mut sh, "wc fruit.txt"), "      5       5      24 fruit.txt");
}

/// `diff` reports changed lines with `<` and `>` markers.
#[test]
fn test_diff_between_edits() {
    let mut sh = logged_in();
    write_lines(&mut sh, "a.txt", &["one", "two", "three"]);
    run(&mut sh, "cp a.txt b.txt");
    assert_eq!(run(&mut sh, "diff a.txt b.txt"), "");

    write_lines(&mut sh, "b.txt", &["one", "2", "three"]);
    assert_eq!(run(&mut sh, "diff a.txt b.txt"), "< two\n> 2");
}

/// Directory builtins agree with each other about the tree.
#[test]
fn test_tree_find_and_moves() {
    let mut sh = logged_in();
    run(&mut sh, "mkdir -p site/css");
    run(&mut sh, "touch site/index.html");
    run(&mut sh, "touch site/css/main.css");

    assert_eq!(
        run(&mut sh, "tree site"),
        "site\n├── css\n│   └── main.css\n└── index.html\n\n1 directory, 2 files"
    );
    assert_eq!(run(&mut sh, "find site -name *.css"), "site/css/main.css");

    run(&mut sh, "mv site/index.html site/css");
    assert_eq!(run(&mut sh, "ls site/css"), "main.css  index.html");
    assert_eq!(
        run(&mut sh, "rm site"),
        "rm: cannot remove 'site': Is a directory"
    );
    run(&mut sh, "rm -r site");
    assert_eq!(run(&mut sh, "ls"), "readme.txt");
}

/// Ownership follows whoever created the node; chown needs root.
#[test]
fn test_chown_needs_root() {
    let mut sh = logged_in();
    run(&mut sh, "touch mine.txt");
    assert_eq!(
        run(&mut sh, "chown bob mine.txt"),
        "chown: changing ownership of 'mine.txt': Permission denied"
    );
    sh.exec("sudo chown bob mine.txt");
    sh.exec("pw");
    assert_eq!(sh.vfs().stat("/home/alice/mine.txt").unwrap().owner, "bob");
}

/// System information builtins reflect the session.
#[test]
fn test_system_queries() {
    let mut sh = logged_in();
    assert_eq!(run(&mut sh, "whoami"), "alice");
    assert_eq!(
        run(&mut sh, "id"),
        "uid=1000(alice) gid=1000(alice) groups=1000(alice),27(sudo)"
    );
    assert_eq!(run(&mut sh, "hostname"), "kpawnd");
    assert_eq!(run(&mut sh, "uname"), "Linux");
    assert_eq!(run(&mut sh, "uname -sr"), "Linux 6.1.0-kpawnd");
    assert_eq!(run(&mut sh, "which ls nothere"), "/bin/ls\nwhich: no nothere in (/bin:/sbin)");
    assert_eq!(run(&mut sh, "man nothere"), "No manual entry for nothere");
    assert!(run(&mut sh, "man ls").starts_with("LS(1)"));
    assert!(run(&mut sh, "help").contains("Network:"));
    assert!(run(&mut sh, "neofetch").contains("alice@kpawnd"));
    assert!(run(&mut sh, "ps").contains("init"));
}

/// `history` numbers every recorded line, itself included.
#[test]
fn test_history_numbering() {
    let mut sh = logged_in();
    run(&mut sh, "pwd");
    run(&mut sh, "whoami");
    assert_eq!(
        run(&mut sh, "history"),
        "    1  pwd\n    2  whoami\n    3  history"
    );
}

/// Builtins that only ask the host to do something.
#[test]
fn test_host_actions() {
    let mut sh = logged_in();
    assert_eq!(sh.exec("clear"), Output::Action(Action::Clear));
    assert_eq!(sh.exec("exit"), Output::Action(Action::Exit));
    assert_eq!(run(&mut sh, "wget https://example.com/a.txt"), "FETCH:https://example.com/a.txt");
    assert_eq!(
        run(&mut sh, "curl -I https://example.com"),
        "CURL:GET:true:https://example.com"
    );
    assert_eq!(
        run(&mut sh, "curl -X post -d x=1 https://example.com"),
        "CURL:POST:false:https://example.com"
    );
    assert_eq!(run(&mut sh, "curl"), "curl: try 'curl --help' for more information");
    assert_eq!(run(&mut sh, "ping -c 3 example.com"), "PING:example.com");
    assert_eq!(run(&mut sh, "dig example.com"), "DNS:example.com");
    assert_eq!(run(&mut sh, "myip"), "MYIP");
    assert_eq!(
        sh.exec("doom hard"),
        Output::Action(Action::Launch(Program::Doom(Some(2))))
    );
    assert_eq!(run(&mut sh, "snake"), "LAUNCH_SNAKE");
}

/// Every rendered action parses back to the same action.
#[test]
fn test_rendered_actions_parse_back() {
    let mut sh = logged_in();
    for line in ["echo github", "nano readme.txt", "screensaver", "doom", "python"] {
        let out = sh.exec(line);
        let action = out.action().cloned().expect("action");
        assert_eq!(Action::from_token(&out.render()), Some(action), "{}", line);
    }
}
