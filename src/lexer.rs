//! Lexical analysis: splitting one raw input line into an argument vector.

use thiserror::Error;

/// Ways a line can be malformed beyond repair.
///
/// Either error aborts the line; nothing gets executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LexError {
    /// A `(` was left open, or a `)` had no opener, by the end of the line.
    #[error("mismatched brackets")]
    MismatchedBrackets,
    /// A `'` was left open by the end of the line.
    #[error("mismatched quotes")]
    MismatchedQuotes,
}

/// Splits a line into arguments.
///
/// Space and tab separate arguments, but only outside single quotes and
/// outside parentheses, so `echo (a b)` is two arguments and `'a b'` is
/// one. Quote characters are dropped; parentheses are kept literally.
/// A backslash escapes `'` and `\`; before any other character it
/// swallows both itself and that character. A `#` outside quotes and
/// parentheses truncates the line, as does an embedded newline, carriage
/// return or NUL. A line of pure whitespace yields an empty vector.
pub fn split_line(line: &str) -> Result<Vec<String>, LexError> {
    let mut splitter = SplittingFSM::new(line);
    splitter.split()
}

struct SplittingFSM {
    input: Vec<char>,
    pos: usize,
    /// Unmatched `(` count. May dip below zero mid-line; must end at zero.
    depth: i32,
    quoted: bool,
    buffer: String,
    /// Whether `buffer` belongs to a real in-progress argument. Quotes
    /// set this without adding text, which is how `''` becomes an empty
    /// argument while a run of spaces becomes nothing.
    started: bool,
    args: Vec<String>,
}

impl SplittingFSM {
    fn new(line: &str) -> Self {
        SplittingFSM {
            input: line.chars().collect(),
            pos: 0,
            depth: 0,
            quoted: false,
            buffer: String::new(),
            started: false,
            args: Vec::new(),
        }
    }

    fn split(&mut self) -> Result<Vec<String>, LexError> {
        while let Some(ch) = self.read_char() {
            match ch {
                '(' => {
                    self.push(ch);
                    if !self.quoted {
                        self.depth += 1;
                    }
                }
                ')' => {
                    self.push(ch);
                    if !self.quoted {
                        self.depth -= 1;
                    }
                }
                '\'' => {
                    self.quoted = !self.quoted;
                    self.started = true;
                }
                '\\' => match self.read_char() {
                    Some(escaped @ ('\'' | '\\')) => self.push(escaped),
                    // A backslash before anything else swallows both
                    // characters.
                    Some(_) | None => {}
                },
                ' ' | '\t' if self.depth == 0 && !self.quoted => self.close_arg(),
                '\n' | '\r' | '\0' => return self.finish(),
                '#' if self.depth == 0 && !self.quoted => return self.finish(),
                _ => self.push(ch),
            }
        }
        self.finish()
    }

    fn read_char(&mut self) -> Option<char> {
        let ch = self.input.get(self.pos).copied();
        if ch.is_some() {
            self.pos += 1;
        }
        ch
    }

    fn push(&mut self, ch: char) {
        self.buffer.push(ch);
        self.started = true;
    }

    fn close_arg(&mut self) {
        if self.started {
            self.args.push(std::mem::take(&mut self.buffer));
            self.started = false;
        }
    }

    fn finish(&mut self) -> Result<Vec<String>, LexError> {
        if self.depth != 0 {
            return Err(LexError::MismatchedBrackets);
        }
        if self.quoted {
            return Err(LexError::MismatchedQuotes);
        }
        self.close_arg();
        Ok(std::mem::take(&mut self.args))
    }
}
