use thiserror::Error;

use crate::position::Position;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to read source: {0}")]
    SourceIo(#[from] std::io::Error),
    #[error("lex error at {position}: {message}")]
    LexError { position: Position, message: String },
    #[error("parse error at {position}: {message}")]
    ParseError { position: Position, message: String },
    #[error("runtime error at {position}: {message}")]
    RuntimeError { position: Position, message: String },
}

impl CoreError {
    pub fn lex(position: Position, message: impl Into<String>) -> Self {
        CoreError::LexError {
            position,
            message: message.into(),
        }
    }

    pub fn parse(position: Position, message: impl Into<String>) -> Self {
        CoreError::ParseError {
            position,
            message: message.into(),
        }
    }

    pub fn runtime(position: Position, message: impl Into<String>) -> Self {
        CoreError::RuntimeError {
            position,
            message: message.into(),
        }
    }

    /// Source position the error refers to, if it has one.
    pub fn position(&self) -> Option<Position> {
        match self {
            CoreError::SourceIo(_) => None,
            CoreError::LexError { position, .. }
            | CoreError::ParseError { position, .. }
            | CoreError::RuntimeError { position, .. } => Some(*position),
        }
    }

    pub fn message(&self) -> String {
        match self {
            CoreError::SourceIo(err) => err.to_string(),
            CoreError::LexError { message, .. }
            | CoreError::ParseError { message, .. }
            | CoreError::RuntimeError { message, .. } => message.clone(),
        }
    }

    /// Attaches `position` to a runtime error that was raised without one.
    pub(crate) fn located_at(self, position: Position) -> Self {
        match self {
            CoreError::RuntimeError {
                position: unknown,
                message,
            } if unknown.is_unknown() => CoreError::RuntimeError { position, message },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_position_and_message() {
        let err = CoreError::runtime(Position::new(3, 7), "Cannot divide by zero");
        assert_eq!(err.to_string(), "runtime error at 3:7: Cannot divide by zero");
        assert_eq!(err.position(), Some(Position::new(3, 7)));
        assert_eq!(err.message(), "Cannot divide by zero");
    }

    #[test]
    fn io_errors_have_no_position() {
        let err = CoreError::from(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing.lm",
        ));
        assert_eq!(err.position(), None);
        assert_eq!(err.message(), "missing.lm");
        assert!(err.to_string().starts_with("failed to read source"));
    }

    #[test]
    fn restamps_only_unknown_positions() {
        let unknown =
            CoreError::runtime(Position::default(), "boom").located_at(Position::new(2, 4));
        assert_eq!(unknown.position(), Some(Position::new(2, 4)));

        let known =
            CoreError::runtime(Position::new(1, 1), "boom").located_at(Position::new(2, 4));
        assert_eq!(known.position(), Some(Position::new(1, 1)));
    }
}
