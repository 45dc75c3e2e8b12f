use super::*;
use kpawnd_vfs::VfsError;

fn editor(content: &str) -> NanoEditor {
    NanoEditor::new("/home/user/notes.txt", content)
}

#[test]
fn test_empty_content_is_one_line() {
    let ed = editor("");
    assert_eq!(ed.lines(), &[String::new()]);
    assert_eq!(ed.cursor(), (0, 0));
    assert!(!ed.is_modified());
}

#[test]
fn test_content_roundtrip() {
    let ed = editor("one\ntwo\n");
    assert_eq!(ed.line_count(), 3);
    assert_eq!(ed.content(), "one\ntwo\n");
}

#[test]
fn test_newline_at_end_of_line() {
    let mut ed = editor("abc");
    ed.move_end();
    assert_eq!(ed.cursor(), (0, 3));

    ed.insert_newline();
    assert_eq!(ed.lines(), &["abc".to_string(), String::new()]);
    assert_eq!(ed.cursor(), (1, 0));
    assert!(ed.is_modified());
}

#[test]
fn test_newline_splits_line() {
    let mut ed = editor("hello world");
    for _ in 0..5 {
        ed.move_right();
    }
    ed.insert_newline();
    assert_eq!(ed.lines(), &["hello".to_string(), " world".to_string()]);
}

#[test]
fn test_insert_char() {
    let mut ed = editor("ac");
    ed.move_right();
    ed.insert_char('b');
    assert_eq!(ed.content(), "abc");
    assert_eq!(ed.cursor(), (0, 2));
}

#[test]
fn test_insert_multibyte() {
    let mut ed = editor("héllo");
    ed.move_end();
    ed.insert_char('!');
    ed.move_left();
    ed.move_left();
    ed.backspace();
    assert_eq!(ed.content(), "hélo!");
    assert_eq!(ed.cursor(), (0, 3));
}

#[test]
fn test_backspace_merges_lines() {
    let mut ed = editor("foo\nbar");
    ed.move_down();
    ed.backspace();
    assert_eq!(ed.lines(), &["foobar".to_string()]);
    assert_eq!(ed.cursor(), (0, 3));
}

#[test]
fn test_backspace_at_origin_is_noop() {
    let mut ed = editor("foo");
    ed.backspace();
    assert_eq!(ed.content(), "foo");
    assert!(!ed.is_modified());
}

#[test]
fn test_delete_merges_next_line() {
    let mut ed = editor("foo\nbar");
    ed.move_end();
    ed.delete();
    assert_eq!(ed.lines(), &["foobar".to_string()]);

    ed.move_home();
    ed.delete();
    assert_eq!(ed.content(), "oobar");
}

#[test]
fn test_cursor_wraps_horizontally() {
    let mut ed = editor("ab\ncd");
    ed.move_down();
    ed.move_left();
    assert_eq!(ed.cursor(), (0, 2));
    ed.move_right();
    assert_eq!(ed.cursor(), (1, 0));
}

#[test]
fn test_vertical_moves_clamp_column() {
    let mut ed = editor("long line\nab\n");
    ed.move_end();
    ed.move_down();
    assert_eq!(ed.cursor(), (1, 2));
    ed.move_down();
    ed.move_down();
    assert_eq!(ed.cursor(), (2, 0));
    ed.move_up();
    ed.move_up();
    ed.move_up();
    assert_eq!(ed.cursor(), (0, 0));
}

#[test]
fn test_cut_and_paste() {
    let mut ed = editor("one\ntwo\nthree");
    ed.move_down();
    ed.cut_line();
    assert_eq!(ed.lines(), &["one".to_string(), "three".to_string()]);
    assert_eq!(ed.clipboard(), Some("two"));

    ed.move_up();
    ed.paste();
    assert_eq!(ed.content(), "two\none\nthree");
    assert_eq!(ed.cursor(), (1, 0));
}

#[test]
fn test_cut_overwrites_clipboard() {
    let mut ed = editor("a\nb");
    ed.cut_line();
    ed.cut_line();
    assert_eq!(ed.clipboard(), Some("b"));
    assert_eq!(ed.lines(), &[String::new()]);
}

#[test]
fn test_cut_last_line_moves_cursor_up() {
    let mut ed = editor("a\nb");
    ed.move_down();
    ed.cut_line();
    assert_eq!(ed.cursor(), (0, 0));
}

#[test]
fn test_paste_without_clipboard() {
    let mut ed = editor("a");
    ed.paste();
    assert_eq!(ed.content(), "a");
    assert!(!ed.is_modified());
}

#[test]
fn test_find_wraps() {
    let mut ed = editor("needle\nhay\nneedle here");
    assert!(ed.find("needle"));
    assert_eq!(ed.cursor(), (2, 0));
    assert!(ed.find("needle"));
    assert_eq!(ed.cursor(), (0, 0));
    assert!(!ed.find("absent"));
}

#[test]
fn test_replace_all() {
    let mut ed = editor("cat cat\ndog cat");
    assert_eq!(ed.replace_all("cat", "cow"), 3);
    assert_eq!(ed.content(), "cow cow\ndog cow");
    assert!(ed.is_modified());
    assert_eq!(ed.replace_all("", "x"), 0);
}

#[test]
fn test_goto_line_clamps() {
    let mut ed = editor("1\n2\n3");
    ed.goto_line(2);
    assert_eq!(ed.cursor(), (1, 0));
    ed.goto_line(99);
    assert_eq!(ed.cursor(), (2, 0));
    ed.goto_line(0);
    assert_eq!(ed.cursor(), (0, 0));
}

#[test]
fn test_viewport_follows_cursor() {
    let content: Vec<String> = (0..100).map(|i| i.to_string()).collect();
    let mut ed = NanoEditor::new("/tmp/n", &content.join("\n")).with_window(10);
    assert_eq!(ed.viewport_top(), 0);

    ed.goto_line(51);
    assert_eq!(ed.viewport_top(), 45);
    assert_eq!(ed.visible_lines().len(), 10);

    ed.page_down();
    ed.page_down();
    ed.page_down();
    ed.page_down();
    ed.page_down();
    assert_eq!(ed.cursor(), (99, 0));
    assert_eq!(ed.viewport_top(), 90);

    ed.page_up();
    assert_eq!(ed.cursor(), (89, 0));
}

#[test]
fn test_join_near_end_keeps_viewport_clamped() {
    let text: Vec<String> = (0..30).map(|i| format!("line {}", i)).collect();
    let mut ed = editor(&text.join("\n")).with_window(20);
    ed.goto_line(26);
    ed.move_end();
    assert_eq!(ed.viewport_top(), 10);

    ed.delete();
    assert_eq!(ed.line_count(), 29);
    assert_eq!(ed.lines()[25], "line 25line 26");
    assert_eq!(ed.viewport_top(), 9);
    assert_eq!(ed.visible_lines().len(), 20);
}

#[test]
fn test_status() {
    let mut ed = editor("abc");
    assert_eq!(ed.status(), "[ line 1/1, col 1 ]");
    ed.insert_char('x');
    assert_eq!(ed.status(), "[ line 1/1, col 2 ] (modified)");
}

#[test]
fn test_save_clears_modified() {
    let mut vfs = Vfs::new();
    vfs.mkdir("/home", "root").unwrap();
    vfs.mkdir("/home/user", "user").unwrap();

    let mut ed = editor("draft");
    ed.insert_char('!');
    ed.save(&mut vfs, "user").unwrap();

    assert!(!ed.is_modified());
    assert_eq!(vfs.read("/home/user/notes.txt").unwrap(), b"!draft");
}

#[test]
fn test_failed_save_keeps_buffer() {
    let mut vfs = Vfs::new();
    let mut ed = editor("precious");
    ed.insert_char('*');

    let err = ed.save(&mut vfs, "user").unwrap_err();
    assert_eq!(
        err,
        EditorError::Save {
            path: "/home/user/notes.txt".to_string(),
            source: VfsError::PathNotFound,
        }
    );
    assert!(ed.is_modified());
    assert_eq!(ed.content(), "*precious");
}

mod proptests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Clone, Debug)]
    enum Op {
        Up,
        Down,
        Left,
        Right,
        Home,
        End,
        PageUp,
        PageDown,
        Insert(char),
        Newline,
        Backspace,
        Delete,
        Cut,
        Paste,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Up),
            Just(Op::Down),
            Just(Op::Left),
            Just(Op::Right),
            Just(Op::Home),
            Just(Op::End),
            Just(Op::PageUp),
            Just(Op::PageDown),
            any::<char>()
                .prop_filter("no newline", |c| *c != '\n')
                .prop_map(Op::Insert),
            Just(Op::Newline),
            Just(Op::Backspace),
            Just(Op::Delete),
            Just(Op::Cut),
            Just(Op::Paste),
        ]
    }

    proptest! {
        #[test]
        fn cursor_and_viewport_stay_in_bounds(
            text in "[a-z\n]{0,40}",
            ops in proptest::collection::vec(op(), 0..80),
        ) {
            let mut ed = NanoEditor::new("/f", &text).with_window(4);
            for op in ops {
                match op {
                    Op::Up => ed.move_up(),
                    Op::Down => ed.move_down(),
                    Op::Left => ed.move_left(),
                    Op::Right => ed.move_right(),
                    Op::Home => ed.move_home(),
                    Op::End => ed.move_end(),
                    Op::PageUp => ed.page_up(),
                    Op::PageDown => ed.page_down(),
                    Op::Insert(c) => ed.insert_char(c),
                    Op::Newline => ed.insert_newline(),
                    Op::Backspace => ed.backspace(),
                    Op::Delete => ed.delete(),
                    Op::Cut => ed.cut_line(),
                    Op::Paste => ed.paste(),
                }
                let (row, col) = ed.cursor();
                prop_assert!(!ed.lines().is_empty());
                prop_assert!(row < ed.line_count());
                prop_assert!(col <= ed.lines()[row].chars().count());
                prop_assert!(ed.viewport_top() <= row);
                prop_assert!(row < ed.viewport_top() + ed.window());
                prop_assert!(ed.viewport_top() <= ed.line_count().saturating_sub(ed.window()));
            }
        }
    }
}
