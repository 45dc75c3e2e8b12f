//! The editor buffer.
//!
//! Columns count characters, not bytes. Every operation leaves the cursor
//! inside the buffer and the viewport covering the cursor row.

use kpawnd_vfs::Vfs;
use tracing::debug;

use crate::error::{EditorError, EditorResult};
use crate::viewport;

/// Rows shown when no window size is given.
pub const DEFAULT_WINDOW: usize = 20;

/// A nano-style editing session over one file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NanoEditor {
    filename: String,
    lines: Vec<String>,
    cursor_row: usize,
    cursor_col: usize,
    modified: bool,
    viewport_top: usize,
    window: usize,
    clipboard: Option<String>,
}

impl NanoEditor {
    /// Open a buffer over `content`. Empty content gives one empty line.
    pub fn new(filename: impl Into<String>, content: &str) -> Self {
        Self {
            filename: filename.into(),
            lines: content.split('\n').map(str::to_string).collect(),
            cursor_row: 0,
            cursor_col: 0,
            modified: false,
            viewport_top: 0,
            window: DEFAULT_WINDOW,
            clipboard: None,
        }
    }

    /// Set the number of visible rows.
    pub fn with_window(mut self, rows: usize) -> Self {
        self.window = rows.max(1);
        self.scroll();
        self
    }

    // ========== Accessors ==========

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Point the buffer at a new file name, as in "write out as".
    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = filename.into();
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// The buffer joined with newlines.
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }

    /// Cursor as `(row, col)`.
    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_row, self.cursor_col)
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn viewport_top(&self) -> usize {
        self.viewport_top
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn clipboard(&self) -> Option<&str> {
        self.clipboard.as_deref()
    }

    /// Lines currently inside the viewport.
    pub fn visible_lines(&self) -> &[String] {
        let end = (self.viewport_top + self.window).min(self.lines.len());
        &self.lines[self.viewport_top..end]
    }

    /// Status bar text, e.g. `[ line 3/10, col 5 ] (modified)`.
    pub fn status(&self) -> String {
        let mut status = format!(
            "[ line {}/{}, col {} ]",
            self.cursor_row + 1,
            self.lines.len(),
            self.cursor_col + 1
        );
        if self.modified {
            status.push_str(" (modified)");
        }
        status
    }

    // ========== Cursor Movement ==========

    pub fn move_up(&mut self) {
        if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.clamp_col();
        }
        self.scroll();
    }

    pub fn move_down(&mut self) {
        if self.cursor_row + 1 < self.lines.len() {
            self.cursor_row += 1;
            self.clamp_col();
        }
        self.scroll();
    }

    /// Move left, wrapping to the end of the previous line.
    pub fn move_left(&mut self) {
        if self.cursor_col > 0 {
            self.cursor_col -= 1;
        } else if self.cursor_row > 0 {
            self.cursor_row -= 1;
            self.cursor_col = self.line_len(self.cursor_row);
        }
        self.scroll();
    }

    /// Move right, wrapping to the start of the next line.
    pub fn move_right(&mut self) {
        if self.cursor_col < self.line_len(self.cursor_row) {
            self.cursor_col += 1;
        } else if self.cursor_row + 1 < self.lines.len() {
            self.cursor_row += 1;
            self.cursor_col = 0;
        }
        self.scroll();
    }

    pub fn move_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor_col = self.line_len(self.cursor_row);
    }

    pub fn page_up(&mut self) {
        self.cursor_row = self.cursor_row.saturating_sub(self.window);
        self.clamp_col();
        self.scroll();
    }

    pub fn page_down(&mut self) {
        self.cursor_row = (self.cursor_row + self.window).min(self.lines.len() - 1);
        self.clamp_col();
        self.scroll();
    }

    /// Jump to a 1-based line number, clamped to the buffer.
    pub fn goto_line(&mut self, line: usize) {
        self.cursor_row = line.saturating_sub(1).min(self.lines.len() - 1);
        self.cursor_col = 0;
        self.scroll();
    }

    // ========== Editing ==========

    pub fn insert_char(&mut self, c: char) {
        if c == '\n' {
            self.insert_newline();
            return;
        }
        let at = self.byte_at(self.cursor_row, self.cursor_col);
        self.lines[self.cursor_row].insert(at, c);
        self.cursor_col += 1;
        self.modified = true;
    }

    /// Insert text at the cursor; embedded newlines split lines.
    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars() {
            self.insert_char(c);
        }
    }

    /// Split the current line at the cursor.
    pub fn insert_newline(&mut self) {
        let at = self.byte_at(self.cursor_row, self.cursor_col);
        let tail = self.lines[self.cursor_row].split_off(at);
        self.cursor_row += 1;
        self.lines.insert(self.cursor_row, tail);
        self.cursor_col = 0;
        self.modified = true;
        self.scroll();
    }

    /// Delete the character before the cursor, joining lines at column 0.
    pub fn backspace(&mut self) {
        if self.cursor_col > 0 {
            let at = self.byte_at(self.cursor_row, self.cursor_col - 1);
            self.lines[self.cursor_row].remove(at);
            self.cursor_col -= 1;
            self.modified = true;
        } else if self.cursor_row > 0 {
            let line = self.lines.remove(self.cursor_row);
            self.cursor_row -= 1;
            self.cursor_col = self.line_len(self.cursor_row);
            self.lines[self.cursor_row].push_str(&line);
            self.modified = true;
            self.scroll();
        }
    }

    /// Delete the character under the cursor, joining lines at line end.
    pub fn delete(&mut self) {
        if self.cursor_col < self.line_len(self.cursor_row) {
            let at = self.byte_at(self.cursor_row, self.cursor_col);
            self.lines[self.cursor_row].remove(at);
            self.modified = true;
        } else if self.cursor_row + 1 < self.lines.len() {
            let next = self.lines.remove(self.cursor_row + 1);
            self.lines[self.cursor_row].push_str(&next);
            self.modified = true;
            self.scroll();
        }
    }

    /// Move the current line into the clipboard, replacing its contents.
    /// The last remaining line is emptied instead of removed.
    pub fn cut_line(&mut self) {
        let line = if self.lines.len() > 1 {
            let line = self.lines.remove(self.cursor_row);
            if self.cursor_row >= self.lines.len() {
                self.cursor_row = self.lines.len() - 1;
            }
            line
        } else {
            std::mem::take(&mut self.lines[0])
        };
        self.clipboard = Some(line);
        self.cursor_col = 0;
        self.modified = true;
        self.scroll();
    }

    /// Insert the clipboard line at the cursor. No-op when nothing was cut.
    pub fn paste(&mut self) {
        if let Some(text) = self.clipboard.clone() {
            self.insert_str(&text);
            self.insert_newline();
        }
    }

    // ========== Search ==========

    /// Move to the next occurrence of `query` after the cursor, wrapping
    /// around the end of the buffer. Returns whether a match was found.
    pub fn find(&mut self, query: &str) -> bool {
        if query.is_empty() {
            return false;
        }
        let rows = self.lines.len();
        for step in 0..=rows {
            let row = (self.cursor_row + step) % rows;
            let line = &self.lines[row];
            let from = if step == 0 {
                self.byte_at(row, self.cursor_col + 1).min(line.len())
            } else {
                0
            };
            if let Some(pos) = line[from..].find(query) {
                self.cursor_row = row;
                self.cursor_col = line[..from + pos].chars().count();
                self.scroll();
                return true;
            }
        }
        false
    }

    /// Replace every occurrence; returns how many were replaced.
    pub fn replace_all(&mut self, from: &str, to: &str) -> usize {
        if from.is_empty() {
            return 0;
        }
        let mut count = 0;
        for line in &mut self.lines {
            let hits = line.matches(from).count();
            if hits > 0 {
                *line = line.replace(from, to);
                count += hits;
            }
        }
        if count > 0 {
            self.modified = true;
            self.clamp_col();
        }
        count
    }

    // ========== Saving ==========

    /// Write the buffer to `path` as `owner`. On failure the buffer and the
    /// modified flag are left as they were.
    pub fn save_to(&mut self, vfs: &mut Vfs, path: &str, owner: &str) -> EditorResult<()> {
        vfs.write(path, self.content().as_bytes(), owner)
            .map_err(|source| EditorError::Save {
                path: path.to_string(),
                source,
            })?;
        self.modified = false;
        debug!(path, lines = self.lines.len(), "editor saved");
        Ok(())
    }

    /// Write the buffer to its own filename, which must be absolute.
    pub fn save(&mut self, vfs: &mut Vfs, owner: &str) -> EditorResult<()> {
        let path = self.filename.clone();
        self.save_to(vfs, &path, owner)
    }

    // ========== Internals ==========

    fn line_len(&self, row: usize) -> usize {
        self.lines[row].chars().count()
    }

    fn byte_at(&self, row: usize, col: usize) -> usize {
        let line = &self.lines[row];
        line.char_indices()
            .nth(col)
            .map(|(i, _)| i)
            .unwrap_or(line.len())
    }

    fn clamp_col(&mut self) {
        self.cursor_col = self.cursor_col.min(self.line_len(self.cursor_row));
    }

    fn scroll(&mut self) {
        self.viewport_top = viewport::start(self.cursor_row, self.lines.len(), self.window);
    }
}

#[cfg(test)]
#[path = "nano_tests.rs"]
mod nano_tests;
