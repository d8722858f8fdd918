//! Line-oriented output with prefixes and width-based wrapping.
//!
//! Used by the CommonMark and LaTeX backends. Block structure is expressed
//! through a prefix (`"> "`, list indentation) written at the start of every
//! line, and through pending line breaks: [`LineWriter::cr`] asks for the next
//! output to start on a new line, [`LineWriter::blankline`] for a blank line
//! in between. Pending breaks are only materialized when more output follows,
//! so closing several blocks at once never stacks empty lines.

/// How a chunk of text is escaped by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Escaping {
    /// Written as is.
    Literal,
    /// Inline text.
    Normal,
    /// Link or image title.
    Title,
    /// Link or image destination.
    Url,
}

/// Writes one (non-literal) character, escaped for the output format.
///
/// Receives the output buffer, the escaping mode, the character, the character
/// that follows it in the same chunk, and whether the line content has just
/// begun (only the line prefix and leading digits written so far).
pub(crate) type EscapeFn = fn(&mut String, Escaping, char, Option<char>, bool);

pub(crate) struct LineWriter {
    buf: String,
    prefix: String,
    width: usize,
    column: usize,
    need_cr: u8,
    last_breakable: Option<usize>,
    begin_line: bool,
    begin_content: bool,
    no_linebreaks: bool,
    in_tight_list_item: bool,
    escape: EscapeFn,
}

impl LineWriter {
    pub(crate) fn new(width: usize, escape: EscapeFn) -> Self {
        Self {
            buf: String::new(),
            prefix: String::new(),
            width,
            column: 0,
            need_cr: 0,
            last_breakable: None,
            begin_line: true,
            begin_content: true,
            no_linebreaks: false,
            in_tight_list_item: false,
            escape,
        }
    }

    pub(crate) fn width(&self) -> usize {
        self.width
    }

    /// Write a chunk. With `wrap`, spaces are potential line breaks.
    pub(crate) fn out(&mut self, text: &str, wrap: bool, escaping: Escaping) {
        let wrap = wrap && !self.no_linebreaks;
        self.flush_cr();

        let mut chars = text.chars().peekable();
        while let Some(c) = chars.next() {
            if c == ' ' && wrap {
                if !self.begin_line {
                    let last_nonspace = self.buf.len();
                    self.buf.push(' ');
                    self.column += 1;
                    self.begin_content = false;
                    while chars.next_if_eq(&' ').is_some() {}
                    // A break must not move block syntax to the start of a line.
                    if !chars.peek().is_some_and(|&next| starts_block(next)) {
                        self.last_breakable = Some(last_nonspace);
                    }
                }
            } else {
                if self.begin_line {
                    if c == '\n' {
                        self.buf.push_str(self.prefix.trim_end());
                    } else {
                        self.buf.push_str(&self.prefix);
                    }
                    self.column = self.prefix.chars().count();
                }
                if escaping == Escaping::Literal && c == '\n' {
                    self.newline();
                    continue;
                }
                if escaping == Escaping::Literal {
                    self.buf.push(c);
                    self.column += 1;
                } else {
                    let before = self.buf.len();
                    (self.escape)(
                        &mut self.buf,
                        escaping,
                        c,
                        chars.peek().copied(),
                        self.begin_content,
                    );
                    self.column += self.buf[before..].chars().count();
                }
                self.begin_line = false;
                self.begin_content = self.begin_content && c.is_ascii_digit();
            }

            self.wrap_if_needed();
        }
    }

    /// Write `text` unescaped and without wrapping.
    pub(crate) fn lit(&mut self, text: &str) {
        self.out(text, false, Escaping::Literal);
    }

    /// Ask for the next output to start on a fresh line.
    pub(crate) fn cr(&mut self) {
        self.need_cr = self.need_cr.max(1);
    }

    /// Ask for a blank line before the next output.
    pub(crate) fn blankline(&mut self) {
        self.need_cr = self.need_cr.max(2);
    }

    pub(crate) fn prefix_len(&self) -> usize {
        self.prefix.len()
    }

    pub(crate) fn push_prefix(&mut self, text: &str) {
        self.prefix.push_str(text);
    }

    pub(crate) fn truncate_prefix(&mut self, len: usize) {
        self.prefix.truncate(len);
    }

    /// Treat what follows as the start of line content (after a list marker).
    pub(crate) fn begin_content(&mut self) {
        self.begin_content = true;
    }

    /// Disable wrapping and soft line output, e.g. inside ATX headings.
    pub(crate) fn set_no_linebreaks(&mut self, value: bool) {
        self.no_linebreaks = value;
    }

    pub(crate) fn no_linebreaks(&self) -> bool {
        self.no_linebreaks
    }

    /// Inside a tight list item blank lines collapse to line breaks.
    pub(crate) fn set_in_tight_list_item(&mut self, value: bool) {
        self.in_tight_list_item = value;
    }

    /// Final output; non-empty output always ends with a newline.
    pub(crate) fn finish(mut self) -> String {
        if !self.buf.is_empty() && !self.buf.ends_with('\n') {
            self.buf.push('\n');
        }
        self.buf
    }

    fn newline(&mut self) {
        self.buf.push('\n');
        self.column = 0;
        self.begin_line = true;
        self.begin_content = true;
        self.last_breakable = None;
    }

    fn flush_cr(&mut self) {
        if self.in_tight_list_item && self.need_cr > 1 {
            self.need_cr = 1;
        }
        // `k` walks back over newlines already in the buffer so a pending break
        // never adds more empty lines than requested.
        let mut k = self.buf.len();
        while self.need_cr > 0 {
            if k == 0 || self.buf.as_bytes()[k - 1] == b'\n' {
                k = k.saturating_sub(1);
            } else {
                self.buf.push('\n');
                if self.need_cr > 1 {
                    self.buf.push_str(self.prefix.trim_end());
                }
            }
            self.column = 0;
            self.last_breakable = None;
            self.begin_line = true;
            self.begin_content = true;
            self.need_cr -= 1;
        }
    }

    fn wrap_if_needed(&mut self) {
        if self.width == 0 || self.column <= self.width || self.begin_line {
            return;
        }
        let Some(at) = self.last_breakable else {
            return;
        };
        let remainder = self.buf.split_off(at + 1);
        self.buf.truncate(at);
        self.buf.push('\n');
        self.buf.push_str(&self.prefix);
        self.buf.push_str(&remainder);
        self.column = self.prefix.chars().count() + remainder.chars().count();
        self.last_breakable = None;
        self.begin_line = false;
        self.begin_content = false;
    }
}

fn starts_block(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '-' | '+' | '*' | '=' | '#' | '>')
}
