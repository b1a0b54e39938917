//! Token automata.
//!
//! Each lexical category is a small state machine expressed as a pure
//! transition `(state, symbol) -> (state, status)`. The lexer runs one
//! instance per category side by side and keeps the longest completed
//! match; see [`crate::lexer`].

use crate::chars::Symbol;
use crate::token::TokenKind;

/// Longest content accepted for string literals and comments.
pub const MAX_TEXT_LENGTH: usize = 255;

/// Outcome of feeding one symbol to an automaton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The symbol cannot extend the token; the automaton is dropped.
    Deny,
    /// Valid prefix, but not a complete token yet.
    Possible,
    /// A complete token ending at this symbol; it may still grow.
    Completed,
    /// Malformed input that aborts tokenization.
    Fault(LexFault),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexFault {
    UnterminatedString,
    StringTooLong,
    CommentTooLong,
    IntegerTooLarge,
}

impl LexFault {
    pub fn message(&self) -> String {
        match self {
            LexFault::UnterminatedString => {
                "Unterminated string literal, expected closing quote".to_string()
            }
            LexFault::StringTooLong => {
                format!("String literal exceeds {MAX_TEXT_LENGTH} characters")
            }
            LexFault::CommentTooLong => format!("Comment exceeds {MAX_TEXT_LENGTH} characters"),
            LexFault::IntegerTooLarge => format!("Integer literal exceeds {}", i32::MAX),
        }
    }
}

/// Fixed spellings, in priority order. Earlier entries win ties.
const SPELLINGS: &[(&str, TokenKind)] = &[
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("loop", TokenKind::Loop),
    ("break", TokenKind::Break),
    ("true", TokenKind::Boolean),
    ("false", TokenKind::Boolean),
    ("null", TokenKind::Null),
    (";", TokenKind::EndOfStatement),
    (",", TokenKind::Comma),
    ("(", TokenKind::ParenOpen),
    (")", TokenKind::ParenClose),
    ("{", TokenKind::BraceOpen),
    ("}", TokenKind::BraceClose),
    ("==", TokenKind::Equal),
    ("!=", TokenKind::NotEqual),
    ("<", TokenKind::Less),
    ("<=", TokenKind::LessEqual),
    (">", TokenKind::Greater),
    (">=", TokenKind::GreaterEqual),
    ("&&", TokenKind::And),
    ("||", TokenKind::Or),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Multiply),
    ("/", TokenKind::Divide),
    ("=>", TokenKind::Arrow),
    ("=", TokenKind::Assign),
    (":=", TokenKind::Reassign),
    ("??=", TokenKind::NullAssign),
    ("??", TokenKind::NullCoalescing),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Automaton {
    Exact {
        spelling: &'static str,
        kind: TokenKind,
        matched: usize,
    },
    Identifier {
        length: usize,
    },
    Integer {
        value: u64,
        length: usize,
        leading_zero: bool,
    },
    Str {
        opened: bool,
        closed: bool,
        content: usize,
    },
    Comment {
        opened: bool,
        content: usize,
    },
}

impl Automaton {
    /// Fresh automata for every category, highest priority first.
    pub fn initial_set() -> Vec<Automaton> {
        let mut set: Vec<Automaton> = SPELLINGS
            .iter()
            .map(|&(spelling, kind)| Automaton::Exact {
                spelling,
                kind,
                matched: 0,
            })
            .collect();
        set.push(Automaton::Integer {
            value: 0,
            length: 0,
            leading_zero: false,
        });
        set.push(Automaton::Str {
            opened: false,
            closed: false,
            content: 0,
        });
        set.push(Automaton::Comment {
            opened: false,
            content: 0,
        });
        set.push(Automaton::Identifier { length: 0 });
        set
    }

    /// Token kind produced when this automaton is the winning match.
    pub fn kind(&self) -> TokenKind {
        match self {
            Automaton::Exact { kind, .. } => *kind,
            Automaton::Identifier { .. } => TokenKind::Identifier,
            Automaton::Integer { .. } => TokenKind::Integer,
            Automaton::Str { .. } => TokenKind::String,
            Automaton::Comment { .. } => TokenKind::Comment,
        }
    }

    pub fn step(self, symbol: Symbol) -> (Automaton, Status) {
        match self {
            Automaton::Exact {
                spelling,
                kind,
                matched,
            } => {
                let expected = spelling[matched..].chars().next();
                match (expected, symbol) {
                    (Some(want), Symbol::Char(got)) if want == got => {
                        let matched = matched + want.len_utf8();
                        let status = if matched == spelling.len() {
                            Status::Completed
                        } else {
                            Status::Possible
                        };
                        (
                            Automaton::Exact {
                                spelling,
                                kind,
                                matched,
                            },
                            status,
                        )
                    }
                    _ => (self, Status::Deny),
                }
            }

            Automaton::Identifier { length } => match symbol {
                Symbol::Char(c)
                    if is_identifier_start(c) || (length > 0 && c.is_alphanumeric()) =>
                {
                    (Automaton::Identifier { length: length + 1 }, Status::Completed)
                }
                _ => (self, Status::Deny),
            },

            Automaton::Integer {
                value,
                length,
                leading_zero,
            } => match symbol {
                // A leading zero is a whole token on its own.
                Symbol::Char(c) if c.is_ascii_digit() && !leading_zero => {
                    let digit = u64::from(c as u32 - '0' as u32);
                    let value = value * 10 + digit;
                    let next = Automaton::Integer {
                        value,
                        length: length + 1,
                        leading_zero: length == 0 && digit == 0,
                    };
                    if value > i32::MAX as u64 {
                        (next, Status::Fault(LexFault::IntegerTooLarge))
                    } else {
                        (next, Status::Completed)
                    }
                }
                _ => (self, Status::Deny),
            },

            Automaton::Str {
                opened,
                closed,
                content,
            } => {
                if closed {
                    return (self, Status::Deny);
                }
                if !opened {
                    return match symbol {
                        Symbol::Char('"') => (
                            Automaton::Str {
                                opened: true,
                                closed: false,
                                content: 0,
                            },
                            Status::Possible,
                        ),
                        _ => (self, Status::Deny),
                    };
                }
                match symbol {
                    Symbol::Char('"') => (
                        Automaton::Str {
                            opened,
                            closed: true,
                            content,
                        },
                        Status::Completed,
                    ),
                    Symbol::Newline | Symbol::EndOfText => {
                        (self, Status::Fault(LexFault::UnterminatedString))
                    }
                    Symbol::Char(_) | Symbol::Whitespace => {
                        let next = Automaton::Str {
                            opened,
                            closed,
                            content: content + 1,
                        };
                        if content + 1 > MAX_TEXT_LENGTH {
                            (next, Status::Fault(LexFault::StringTooLong))
                        } else {
                            (next, Status::Possible)
                        }
                    }
                }
            }

            Automaton::Comment { opened, content } => {
                if !opened {
                    return match symbol {
                        Symbol::Char('#') => (
                            Automaton::Comment {
                                opened: true,
                                content: 0,
                            },
                            Status::Completed,
                        ),
                        _ => (self, Status::Deny),
                    };
                }
                match symbol {
                    Symbol::Newline | Symbol::EndOfText => (self, Status::Deny),
                    Symbol::Char(_) | Symbol::Whitespace => {
                        let next = Automaton::Comment {
                            opened,
                            content: content + 1,
                        };
                        if content + 1 > MAX_TEXT_LENGTH {
                            (next, Status::Fault(LexFault::CommentTooLong))
                        } else {
                            (next, Status::Completed)
                        }
                    }
                }
            }
        }
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_alphabetic() || ch == '_'
}
