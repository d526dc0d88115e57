use std::cmp;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditOperation {
    InsertChar { col: usize, ch: char },
    DeleteChar { col: usize, ch: char },
}

/// Single-line label editor. Columns are counted in chars, not bytes.
#[derive(Debug, Clone)]
pub struct Editor {
    pub text: String,
    pub cursor_col: usize,
    pub scroll_col: usize, // Horizontal scroll (column offset)
    pub undo_stack: Vec<EditOperation>,
    pub max_history: usize,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor {
    pub fn new() -> Self {
        Self::from_string(String::new())
    }

    /// Start editing `content` with the cursor at the end
    pub fn from_string(content: String) -> Self {
        // labels are single line
        let text: String = content.lines().next().unwrap_or_default().to_string();
        let cursor_col = text.chars().count();
        Self {
            text,
            cursor_col,
            scroll_col: 0,
            undo_stack: Vec::new(),
            max_history: 100,
        }
    }

    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' || ch == '\r' {
            return;
        }
        let col = cmp::min(self.cursor_col, self.len());
        let mut chars: Vec<char> = self.text.chars().collect();
        chars.insert(col, ch);
        self.text = chars.into_iter().collect();
        self.cursor_col = col + 1;
        self.add_to_undo(EditOperation::InsertChar { col, ch });
    }

    /// Backspace. Returns false when there was nothing before the cursor.
    pub fn delete_char(&mut self) -> bool {
        let col = cmp::min(self.cursor_col, self.len());
        if col == 0 {
            return false;
        }
        let mut chars: Vec<char> = self.text.chars().collect();
        let ch = chars.remove(col - 1);
        self.text = chars.into_iter().collect();
        self.cursor_col = col - 1;
        self.add_to_undo(EditOperation::DeleteChar { col: col - 1, ch });
        true
    }

    /// Delete under the cursor. Returns false at the end of the text.
    pub fn delete_forward(&mut self) -> bool {
        let col = cmp::min(self.cursor_col, self.len());
        if col >= self.len() {
            return false;
        }
        let mut chars: Vec<char> = self.text.chars().collect();
        let ch = chars.remove(col);
        self.text = chars.into_iter().collect();
        self.add_to_undo(EditOperation::DeleteChar { col, ch });
        true
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor_col = self.cursor_col.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor_col < self.len() {
            self.cursor_col += 1;
        }
    }

    pub fn move_cursor_home(&mut self) {
        self.cursor_col = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor_col = self.len();
    }

    pub fn move_cursor_word_left(&mut self) {
        let chars: Vec<char> = self.text.chars().collect();
        let mut pos = cmp::min(self.cursor_col, chars.len());

        // Skip whitespace to the left
        while pos > 0 && chars[pos - 1].is_whitespace() {
            pos -= 1;
        }

        // Skip word characters to the left
        while pos > 0 && is_word_char(chars[pos - 1]) {
            pos -= 1;
        }

        self.cursor_col = pos;
    }

    pub fn move_cursor_word_right(&mut self) {
        let chars: Vec<char> = self.text.chars().collect();
        let mut pos = cmp::min(self.cursor_col, chars.len());

        while pos < chars.len() && is_word_char(chars[pos]) {
            pos += 1;
        }
        while pos < chars.len() && chars[pos].is_whitespace() {
            pos += 1;
        }

        self.cursor_col = pos;
    }

    fn add_to_undo(&mut self, op: EditOperation) {
        self.undo_stack.push(op);
        if self.undo_stack.len() > self.max_history {
            self.undo_stack.remove(0);
        }
    }

    pub fn undo(&mut self) -> bool {
        let Some(op) = self.undo_stack.pop() else {
            return false;
        };
        let mut chars: Vec<char> = self.text.chars().collect();
        match op {
            EditOperation::InsertChar { col, .. } => {
                if col < chars.len() {
                    chars.remove(col);
                }
                self.cursor_col = col;
            }
            EditOperation::DeleteChar { col, ch } => {
                let col = cmp::min(col, chars.len());
                chars.insert(col, ch);
                self.cursor_col = col + 1;
            }
        }
        self.text = chars.into_iter().collect();
        true
    }

    /// Keep the cursor inside a viewport `width` columns wide
    pub fn update_horizontal_scroll(&mut self, width: usize) {
        if width == 0 {
            return;
        }
        if self.cursor_col < self.scroll_col {
            self.scroll_col = self.cursor_col;
        } else if self.cursor_col >= self.scroll_col + width {
            self.scroll_col = self.cursor_col + 1 - width;
        }
    }

    /// The slice of text visible in a `width`-column viewport
    pub fn visible_text(&self, width: usize) -> String {
        self.text.chars().skip(self.scroll_col).take(width).collect()
    }

    /// Cursor column relative to the viewport
    pub fn visible_cursor(&self) -> usize {
        self.cursor_col.saturating_sub(self.scroll_col)
    }
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}
