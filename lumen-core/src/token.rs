//! Tokens produced by the lexer.

use std::fmt;

use crate::position::Position;

/// Kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Special
    EndOfText,
    EndOfStatement, // ;
    Comma,          // ,

    // Grouping
    ParenOpen,  // (
    ParenClose, // )
    BraceOpen,  // {
    BraceClose, // }

    // Comparison
    Equal,        // ==
    NotEqual,     // !=
    Less,         // <
    LessEqual,    // <=
    Greater,      // >
    GreaterEqual, // >=

    // Logic
    And, // &&
    Or,  // ||

    // Arithmetic
    Plus,     // +
    Minus,    // -
    Multiply, // *
    Divide,   // /

    // Binding and functions
    Arrow,          // =>
    Assign,         // =
    Reassign,       // :=
    NullAssign,     // ??=
    NullCoalescing, // ??

    // Keywords
    If,
    Else,
    Loop,
    Break,

    // Literals
    Integer,
    String,
    Boolean,
    Null,

    Identifier,
    Comment,
}

impl TokenKind {
    /// Human readable description used in parse errors.
    pub fn describe(&self) -> &'static str {
        match self {
            TokenKind::EndOfText => "end of text",
            TokenKind::EndOfStatement => "';'",
            TokenKind::Comma => "','",
            TokenKind::ParenOpen => "'('",
            TokenKind::ParenClose => "')'",
            TokenKind::BraceOpen => "'{'",
            TokenKind::BraceClose => "'}'",
            TokenKind::Equal => "'=='",
            TokenKind::NotEqual => "'!='",
            TokenKind::Less => "'<'",
            TokenKind::LessEqual => "'<='",
            TokenKind::Greater => "'>'",
            TokenKind::GreaterEqual => "'>='",
            TokenKind::And => "'&&'",
            TokenKind::Or => "'||'",
            TokenKind::Plus => "'+'",
            TokenKind::Minus => "'-'",
            TokenKind::Multiply => "'*'",
            TokenKind::Divide => "'/'",
            TokenKind::Arrow => "'=>'",
            TokenKind::Assign => "'='",
            TokenKind::Reassign => "':='",
            TokenKind::NullAssign => "'??='",
            TokenKind::NullCoalescing => "'??'",
            TokenKind::If => "'if'",
            TokenKind::Else => "'else'",
            TokenKind::Loop => "'loop'",
            TokenKind::Break => "'break'",
            TokenKind::Integer => "integer literal",
            TokenKind::String => "string literal",
            TokenKind::Boolean => "boolean literal",
            TokenKind::Null => "'null'",
            TokenKind::Identifier => "identifier",
            TokenKind::Comment => "comment",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Payload carried by literal, identifier and comment tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenValue {
    None,
    Integer(i32),
    Text(String),
    Boolean(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: TokenValue,
    /// Position of the first character.
    pub position: Position,
    /// Number of normalized characters consumed.
    pub length: usize,
}

impl Token {
    pub fn text(&self) -> Option<&str> {
        match &self.value {
            TokenValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            TokenValue::None => write!(f, "{} {}", self.position, self.kind),
            TokenValue::Integer(value) => write!(f, "{} {} {value}", self.position, self.kind),
            TokenValue::Text(text) => write!(f, "{} {} {text:?}", self.position, self.kind),
            TokenValue::Boolean(value) => write!(f, "{} {} {value}", self.position, self.kind),
        }
    }
}
