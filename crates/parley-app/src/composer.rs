//! Message composer.
//!
//! Owns the input line and a cursor. The cursor counts characters, not
//! bytes, so multi-byte input never splits a code point.

/// Text input buffer with a character cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    buffer: String,
    /// Cursor position in characters, `0..=char_count`.
    cursor: usize,
}

impl Composer {
    /// Create an empty composer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.buffer
    }

    /// Cursor position in characters.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Insert a character at the cursor.
    pub fn insert(&mut self, c: char) {
        let at = self.byte_offset(self.cursor);
        self.buffer.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor. Returns `true` if the text
    /// changed.
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let at = self.byte_offset(self.cursor);
        self.buffer.remove(at);
        true
    }

    /// Delete the character at the cursor. Returns `true` if the text
    /// changed.
    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.char_count() {
            return false;
        }
        let at = self.byte_offset(self.cursor);
        self.buffer.remove(at);
        true
    }

    /// Move the cursor one character left.
    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    /// Move the cursor one character right.
    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.char_count());
    }

    /// Move the cursor to the start.
    pub fn home(&mut self) {
        self.cursor = 0;
    }

    /// Move the cursor to the end.
    pub fn end(&mut self) {
        self.cursor = self.char_count();
    }

    /// Take the text out and reset the cursor.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.buffer)
    }

    fn char_count(&self) -> usize {
        self.buffer.chars().count()
    }

    fn byte_offset(&self, chars: usize) -> usize {
        self.buffer.char_indices().nth(chars).map_or(self.buffer.len(), |(i, _)| i)
    }
}
