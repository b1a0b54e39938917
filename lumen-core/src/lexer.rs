//! Lexer for Lumen.
//!
//! The lexer is pull-based: every call to [`Lexer::next_token`] skips
//! whitespace, then feeds the following characters to every token
//! automaton at once until none is left alive. The winning token is the
//! longest completed match; ties go to the automaton listed first in
//! [`Automaton::initial_set`], so keywords beat identifiers.
//!
//! Comments are returned as [`TokenKind::Comment`] tokens; the parser
//! is responsible for skipping them.

use crate::automata::{Automaton, Status};
use crate::chars::{CharStream, Scanned, Symbol};
use crate::error::CoreError;
use crate::token::{Token, TokenKind, TokenValue};

/// Lookahead buffer over the normalized character stream.
///
/// Characters are pulled from the stream on demand. `mark`/`rewind`
/// allow the lexer to read past the end of the winning token and come
/// back; `commit` drops everything before the cursor.
struct Lookahead<'src> {
    stream: CharStream<'src>,
    buffered: Vec<Scanned>,
    cursor: usize,
}

impl<'src> Lookahead<'src> {
    fn new(source: &'src str) -> Self {
        Lookahead {
            stream: CharStream::new(source),
            buffered: Vec::new(),
            cursor: 0,
        }
    }

    fn peek(&mut self) -> Scanned {
        while self.buffered.len() <= self.cursor {
            let scanned = self.stream.next_scanned();
            self.buffered.push(scanned);
        }
        self.buffered[self.cursor]
    }

    /// Consumes one character. End-of-text is never consumed.
    fn advance(&mut self) -> Scanned {
        let scanned = self.peek();
        if scanned.symbol != Symbol::EndOfText {
            self.cursor += 1;
        }
        scanned
    }

    fn mark(&self) -> usize {
        self.cursor
    }

    fn rewind(&mut self, mark: usize) {
        self.cursor = mark;
    }

    fn commit(&mut self) {
        self.buffered.drain(..self.cursor);
        self.cursor = 0;
    }

    /// Raw text of the already buffered characters in `from..to`.
    fn text(&self, from: usize, to: usize) -> String {
        self.buffered[from..to].iter().map(|s| s.raw).collect()
    }
}

pub struct Lexer<'src> {
    input: Lookahead<'src>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer {
            input: Lookahead::new(source),
        }
    }

    /// Produces the next token. After the end of the text has been
    /// reached every further call returns an end-of-text token.
    pub fn next_token(&mut self) -> Result<Token, CoreError> {
        while matches!(self.input.peek().symbol, Symbol::Whitespace | Symbol::Newline) {
            self.input.advance();
        }
        self.input.commit();

        let first = self.input.peek();
        if first.symbol == Symbol::EndOfText {
            return Ok(Token {
                kind: TokenKind::EndOfText,
                value: TokenValue::None,
                position: first.position,
                length: 0,
            });
        }

        let start = self.input.mark();
        let mut live = Automaton::initial_set();
        let mut best: Option<(Automaton, usize)> = None;
        let mut consumed = 0;

        while !live.is_empty() {
            let scanned = self.input.advance();
            consumed += 1;

            let mut survivors = Vec::with_capacity(live.len());
            for automaton in live {
                let (next, status) = automaton.step(scanned.symbol);
                match status {
                    Status::Deny => {}
                    Status::Possible => survivors.push(next),
                    Status::Completed => {
                        if best.is_none_or(|(_, length)| length < consumed) {
                            best = Some((next, consumed));
                        }
                        survivors.push(next);
                    }
                    Status::Fault(fault) => {
                        return Err(CoreError::lex(first.position, fault.message()));
                    }
                }
            }
            live = survivors;

            if scanned.symbol == Symbol::EndOfText {
                break;
            }
        }

        let Some((winner, length)) = best else {
            return Err(CoreError::lex(
                first.position,
                format!("Unexpected character '{}'", first.raw),
            ));
        };

        self.input.rewind(start);
        for _ in 0..length {
            self.input.advance();
        }

        let token = Token {
            kind: winner.kind(),
            value: self.token_value(&winner, start, length),
            position: first.position,
            length,
        };
        log::trace!("token {token}");
        Ok(token)
    }

    fn token_value(&self, winner: &Automaton, start: usize, length: usize) -> TokenValue {
        match winner {
            Automaton::Exact { spelling, kind, .. } => match kind {
                TokenKind::Boolean => TokenValue::Boolean(*spelling == "true"),
                _ => TokenValue::None,
            },
            // Range checked by the automaton.
            Automaton::Integer { value, .. } => TokenValue::Integer(*value as i32),
            Automaton::Identifier { .. } => {
                TokenValue::Text(self.input.text(start, start + length))
            }
            Automaton::Str { .. } => {
                TokenValue::Text(self.input.text(start + 1, start + length - 1))
            }
            Automaton::Comment { .. } => {
                TokenValue::Text(self.input.text(start + 1, start + length))
            }
        }
    }
}

/// Lex a whole source string, including comments and the final
/// end-of-text token.
pub fn tokenize(source: &str) -> Result<Vec<Token>, CoreError> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::EndOfText;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}
