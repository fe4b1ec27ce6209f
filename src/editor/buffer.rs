use ropey::Rope;

/// Cursor position, in chars. `goal_col` is the column vertical moves aim
/// for, so passing through a short line does not lose it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    pub line: usize,
    pub col: usize,
    goal_col: usize,
}

impl Cursor {
    pub const fn at(line: usize, col: usize) -> Self {
        Self {
            line,
            col,
            goal_col: col,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Rope-backed chart source with a cursor.
///
/// Every edit bumps [`EditorBuffer::revision`], which the app compares
/// against the last revision it pushed into the document.
pub struct EditorBuffer {
    rope: Rope,
    cursor: Cursor,
    revision: u64,
}

impl EditorBuffer {
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            cursor: Cursor::default(),
            revision: 0,
        }
    }

    pub fn empty() -> Self {
        Self::from_text("")
    }

    /// Replace the whole content and put the cursor at the start.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.cursor = Cursor::default();
        self.revision += 1;
    }

    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Edit counter. Changes whenever the text changes.
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Content of a line without its line ending.
    pub fn line_at(&self, idx: usize) -> Option<String> {
        (idx < self.rope.len_lines()).then(|| {
            let line = self.rope.line(idx).to_string();
            line.trim_end_matches('\n').trim_end_matches('\r').to_string()
        })
    }

    /// Length of a line in chars, without its line ending.
    pub fn line_len(&self, idx: usize) -> usize {
        self.line_at(idx).map_or(0, |s| s.chars().count())
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn insert_char(&mut self, ch: char) {
        if ch == '\n' {
            self.split_line();
            return;
        }
        let at = self.char_offset();
        self.rope.insert_char(at, ch);
        self.place(self.cursor.line, self.cursor.col + 1);
        self.touch();
    }

    /// Insert text at the cursor, leaving the cursor after it.
    ///
    /// `\r\n` and lone `\r` are normalised to `\n`.
    pub fn insert_str(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        self.rope.insert(self.char_offset(), &text);

        let Cursor { line, col, .. } = self.cursor;
        match text.rsplit_once('\n') {
            Some((_, tail)) => {
                self.place(line + text.matches('\n').count(), tail.chars().count());
            }
            None => self.place(line, col + text.chars().count()),
        }
        self.touch();
    }

    /// Split the current line at the cursor, carrying over its indentation.
    pub fn split_line(&mut self) {
        let indent: String = self
            .line_at(self.cursor.line)
            .unwrap_or_default()
            .chars()
            .take(self.cursor.col)
            .take_while(|c| *c == ' ' || *c == '\t')
            .collect();
        let at = self.char_offset();
        self.rope.insert(at, &format!("\n{indent}"));
        self.place(self.cursor.line + 1, indent.chars().count());
        self.touch();
    }

    /// Delete the char before the cursor (Backspace). Returns whether anything changed.
    pub fn delete_back(&mut self) -> bool {
        let Cursor { line, col, .. } = self.cursor;
        let at = self.char_offset();
        if col > 0 {
            self.rope.remove(at - 1..at);
            self.place(line, col - 1);
        } else if line > 0 {
            let joined_col = self.line_len(line - 1);
            // A "\r\n" ending goes as one unit.
            let crlf = at >= 2 && self.rope.char(at - 2) == '\r';
            self.rope.remove(at - if crlf { 2 } else { 1 }..at);
            self.place(line - 1, joined_col);
        } else {
            return false;
        }
        self.touch();
        true
    }

    /// Delete the char at the cursor (Delete). Returns whether anything changed.
    pub fn delete_forward(&mut self) -> bool {
        let at = self.char_offset();
        let total = self.rope.len_chars();
        if at >= total {
            return false;
        }
        let at_line_end = self.cursor.col >= self.line_len(self.cursor.line);
        let crlf = at_line_end && self.rope.char(at) == '\r' && at + 1 < total;
        self.rope.remove(at..at + if crlf { 2 } else { 1 });
        self.touch();
        true
    }

    pub fn move_cursor(&mut self, direction: Direction) {
        let Cursor {
            line,
            col,
            goal_col,
        } = self.cursor;
        let last = self.last_line();
        match direction {
            Direction::Left if col > 0 => self.place(line, col - 1),
            Direction::Left if line > 0 => self.place(line - 1, self.line_len(line - 1)),
            Direction::Right if col < self.line_len(line) => self.place(line, col + 1),
            Direction::Right if line < last => self.place(line + 1, 0),
            Direction::Up if line > 0 => self.aim(line - 1, goal_col),
            Direction::Down if line < last => self.aim(line + 1, goal_col),
            _ => {}
        }
    }

    pub const fn move_home(&mut self) {
        self.place(self.cursor.line, 0);
    }

    pub fn move_end(&mut self) {
        let line = self.cursor.line;
        self.place(line, self.line_len(line));
    }

    /// Back to the start of the previous word, or the end of the previous line.
    pub fn move_word_left(&mut self) {
        let Cursor { line, col, .. } = self.cursor;
        if col == 0 {
            if line > 0 {
                self.place(line - 1, self.line_len(line - 1));
            }
            return;
        }
        let chars: Vec<char> = self.line_at(line).unwrap_or_default().chars().collect();
        let before = &chars[..col.min(chars.len())];
        let gap = before.iter().rev().take_while(|c| !is_word_char(**c)).count();
        let word = before[..before.len() - gap]
            .iter()
            .rev()
            .take_while(|c| is_word_char(**c))
            .count();
        self.place(line, before.len() - gap - word);
    }

    /// Past the current word and the gap after it, or to the next line.
    pub fn move_word_right(&mut self) {
        let Cursor { line, col, .. } = self.cursor;
        if col >= self.line_len(line) {
            if line < self.last_line() {
                self.place(line + 1, 0);
            }
            return;
        }
        let chars: Vec<char> = self.line_at(line).unwrap_or_default().chars().collect();
        let after = &chars[col..];
        let word = after.iter().take_while(|c| is_word_char(**c)).count();
        let gap = after[word..]
            .iter()
            .take_while(|c| !is_word_char(**c))
            .count();
        self.place(line, col + word + gap);
    }

    /// Move to a position, clamped into the buffer.
    pub fn move_to(&mut self, line: usize, col: usize) {
        let line = line.min(self.last_line());
        self.place(line, col.min(self.line_len(line)));
    }

    pub fn move_to_start(&mut self) {
        self.cursor = Cursor::default();
    }

    pub fn move_to_end(&mut self) {
        let last = self.last_line();
        self.place(last, self.line_len(last));
    }

    const fn touch(&mut self) {
        self.revision += 1;
    }

    const fn place(&mut self, line: usize, col: usize) {
        self.cursor = Cursor::at(line, col);
    }

    fn aim(&mut self, line: usize, goal_col: usize) {
        self.cursor = Cursor {
            line,
            col: goal_col.min(self.line_len(line)),
            goal_col,
        };
    }

    fn last_line(&self) -> usize {
        self.line_count().saturating_sub(1)
    }

    fn char_offset(&self) -> usize {
        let Cursor { line, col, .. } = self.cursor;
        self.rope.line_to_char(line) + col.min(self.line_len(line))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

impl std::fmt::Debug for EditorBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorBuffer")
            .field("lines", &self.rope.len_lines())
            .field("cursor", &self.cursor)
            .field("revision", &self.revision)
            .finish()
    }
}
