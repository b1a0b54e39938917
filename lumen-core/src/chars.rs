//! Normalized character stream.
//!
//! The stream hands out one [`Scanned`] item per source character and
//! folds every newline spelling (`\n`, `\r\n`, `\r`, U+2028, U+2029)
//! into [`Symbol::Newline`] and every other whitespace character into
//! [`Symbol::Whitespace`]. Once the text is exhausted it keeps returning
//! [`Symbol::EndOfText`] at the position just past the last character.

use std::iter::Peekable;
use std::str::Chars;

use crate::position::Position;

/// What the token automata see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Char(char),
    Whitespace,
    Newline,
    EndOfText,
}

/// A normalized symbol together with the raw character it came from.
///
/// `raw` lets the lexer rebuild token text verbatim (a tab inside a
/// string literal stays a tab) while the automata only match on `symbol`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scanned {
    pub symbol: Symbol,
    pub raw: char,
    pub position: Position,
}

pub struct CharStream<'src> {
    chars: Peekable<Chars<'src>>,
    position: Position,
}

impl<'src> CharStream<'src> {
    pub fn new(source: &'src str) -> Self {
        CharStream {
            chars: source.chars().peekable(),
            position: Position::start(),
        }
    }

    pub fn next_scanned(&mut self) -> Scanned {
        let position = self.position;
        let Some(ch) = self.chars.next() else {
            return Scanned {
                symbol: Symbol::EndOfText,
                raw: '\0',
                position,
            };
        };

        let symbol = match ch {
            '\r' => {
                if self.chars.peek() == Some(&'\n') {
                    self.chars.next();
                }
                Symbol::Newline
            }
            '\n' | '\u{2028}' | '\u{2029}' => Symbol::Newline,
            c if c.is_whitespace() => Symbol::Whitespace,
            c => Symbol::Char(c),
        };

        if symbol == Symbol::Newline {
            self.position = Position::new(position.line + 1, 1);
        } else {
            self.position.column += 1;
        }

        Scanned {
            symbol,
            raw: if symbol == Symbol::Newline { '\n' } else { ch },
            position,
        }
    }
}
