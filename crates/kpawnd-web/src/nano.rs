//! Editor binding. The page opens one of these when `exec` answers with a
//! `NANO:` token and hands it back to `System::save_file` on Ctrl-O.

use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct NanoEditor {
    pub(crate) inner: kpawnd_editor::NanoEditor,
}

#[wasm_bindgen]
impl NanoEditor {
    #[wasm_bindgen(constructor)]
    pub fn new(filename: &str, content: &str) -> NanoEditor {
        NanoEditor {
            inner: kpawnd_editor::NanoEditor::new(filename, content),
        }
    }

    pub fn filename(&self) -> String {
        self.inner.filename().to_string()
    }

    pub fn set_filename(&mut self, filename: &str) {
        self.inner.set_filename(filename);
    }

    /// Number of text rows the page can show.
    pub fn set_window(&mut self, rows: usize) {
        let editor = std::mem::replace(
            &mut self.inner,
            kpawnd_editor::NanoEditor::new("", ""),
        );
        self.inner = editor.with_window(rows);
    }

    pub fn content(&self) -> String {
        self.inner.content()
    }

    pub fn line_count(&self) -> usize {
        self.inner.line_count()
    }

    pub fn line(&self, row: usize) -> Option<String> {
        self.inner.lines().get(row).cloned()
    }

    /// Rows inside the viewport, joined with newlines.
    pub fn visible_lines(&self) -> String {
        self.inner.visible_lines().join("\n")
    }

    pub fn viewport_top(&self) -> usize {
        self.inner.viewport_top()
    }

    pub fn cursor_row(&self) -> usize {
        self.inner.cursor().0
    }

    pub fn cursor_col(&self) -> usize {
        self.inner.cursor().1
    }

    pub fn is_modified(&self) -> bool {
        self.inner.is_modified()
    }

    pub fn status(&self) -> String {
        self.inner.status()
    }

    // ========== Movement ==========

    pub fn move_up(&mut self) {
        self.inner.move_up();
    }

    pub fn move_down(&mut self) {
        self.inner.move_down();
    }

    pub fn move_left(&mut self) {
        self.inner.move_left();
    }

    pub fn move_right(&mut self) {
        self.inner.move_right();
    }

    pub fn move_home(&mut self) {
        self.inner.move_home();
    }

    pub fn move_end(&mut self) {
        self.inner.move_end();
    }

    pub fn page_up(&mut self) {
        self.inner.page_up();
    }

    pub fn page_down(&mut self) {
        self.inner.page_down();
    }

    /// Jump to a 1-based line.
    pub fn goto_line(&mut self, line: usize) {
        self.inner.goto_line(line);
    }

    // ========== Editing ==========

    /// Insert typed text; a `KeyboardEvent.key` is usually one character.
    pub fn insert(&mut self, text: &str) {
        self.inner.insert_str(text);
    }

    pub fn insert_newline(&mut self) {
        self.inner.insert_newline();
    }

    pub fn backspace(&mut self) {
        self.inner.backspace();
    }

    pub fn delete(&mut self) {
        self.inner.delete();
    }

    pub fn cut_line(&mut self) {
        self.inner.cut_line();
    }

    pub fn paste(&mut self) {
        self.inner.paste();
    }

    pub fn find(&mut self, query: &str) -> bool {
        self.inner.find(query)
    }

    pub fn replace_all(&mut self, from: &str, to: &str) -> usize {
        self.inner.replace_all(from, to)
    }
}
