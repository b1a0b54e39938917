//! Recursive-descent parser for Lumen.
//!
//! Precedence layers, loosest first:
//!
//!   or (`||`) -> and (`&&`) -> relational (`== != < <= > >=`, single)
//!     -> null-coalescing (`??`) -> additive (`+ -`)
//!     -> multiplicative (`* /`) -> unary `-` -> call suffix -> factor
//!
//! The parser pulls tokens lazily from the [`Lexer`] into a lookahead
//! queue, so distinguishing `(a, b) => body` from a parenthesised group
//! can look as far ahead as the parameter list requires.

use std::collections::VecDeque;
use std::rc::Rc;

use crate::ast::{BinaryOperator, Block, Branch, Expression, Lambda, Literal, Statement};
use crate::error::CoreError;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind, TokenValue};

/// Deepest statement/expression nesting the parser accepts. Keeps
/// pathological inputs from exhausting the native stack.
pub const MAX_NESTING: usize = 64;

pub fn parse(source: &str) -> Result<Block, CoreError> {
    Parser::new(Lexer::new(source)).parse_program()
}

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    lookahead: VecDeque<Token>,
    depth: usize,
}

impl<'src> Parser<'src> {
    pub fn new(lexer: Lexer<'src>) -> Self {
        Parser {
            lexer,
            lookahead: VecDeque::new(),
            depth: 0,
        }
    }

    /// Parses top-level statements until end of text. Every top-level
    /// statement, including the last one, must be followed by `;`.
    pub fn parse_program(&mut self) -> Result<Block, CoreError> {
        let position = self.peek(0)?.position;
        let statements = self.parse_sequence(TokenKind::EndOfText, true)?;
        log::debug!("parsed program with {} top-level statements", statements.len());
        Ok(Block {
            statements,
            position,
        })
    }

    // -----------------------------------------------------------------
    // Token access
    // -----------------------------------------------------------------

    fn peek(&mut self, n: usize) -> Result<&Token, CoreError> {
        while self.lookahead.len() <= n {
            let token = self.lexer.next_token()?;
            if token.kind != TokenKind::Comment {
                self.lookahead.push_back(token);
            }
        }
        Ok(&self.lookahead[n])
    }

    fn peek_kind(&mut self, n: usize) -> Result<TokenKind, CoreError> {
        Ok(self.peek(n)?.kind)
    }

    fn advance(&mut self) -> Result<Token, CoreError> {
        if let Some(token) = self.lookahead.pop_front() {
            return Ok(token);
        }
        loop {
            let token = self.lexer.next_token()?;
            if token.kind != TokenKind::Comment {
                return Ok(token);
            }
        }
    }

    fn expect(&mut self, kind: TokenKind, production: &str) -> Result<Token, CoreError> {
        if self.peek_kind(0)? == kind {
            self.advance()
        } else {
            Err(self.unexpected(production)?)
        }
    }

    fn unexpected(&mut self, production: &str) -> Result<CoreError, CoreError> {
        let token = self.peek(0)?;
        Ok(CoreError::parse(
            token.position,
            format!("Expected {production} but found {}", token.kind),
        ))
    }

    /// Runs `parse` one nesting level deeper.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        if self.depth >= MAX_NESTING {
            let position = self.peek(0)?.position;
            return Err(CoreError::parse(position, "Exceeded nesting limit"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    fn parse_sequence(
        &mut self,
        closer: TokenKind,
        require_terminator: bool,
    ) -> Result<Vec<Statement>, CoreError> {
        let mut statements = Vec::new();
        while self.peek_kind(0)? != closer {
            statements.push(self.parse_statement()?);
            match self.peek_kind(0)? {
                TokenKind::EndOfStatement => {
                    self.advance()?;
                }
                kind if kind == closer && !require_terminator => break,
                _ => {
                    let position = self.peek(0)?.position;
                    return Err(CoreError::parse(
                        position,
                        "Statements should be separated by ';'",
                    ));
                }
            }
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Statement, CoreError> {
        self.nested(Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> Result<Statement, CoreError> {
        match self.peek_kind(0)? {
            TokenKind::If => self.parse_condition(),
            TokenKind::Loop => self.parse_loop(),
            TokenKind::Break => self.parse_break(),
            TokenKind::Identifier => match self.peek_kind(1)? {
                TokenKind::Assign | TokenKind::Reassign | TokenKind::NullAssign => {
                    self.parse_binding()
                }
                _ => Ok(Statement::Expression(self.parse_expression()?)),
            },
            _ => Ok(Statement::Expression(self.parse_expression()?)),
        }
    }

    fn parse_binding(&mut self) -> Result<Statement, CoreError> {
        let target = self.advance()?;
        let name = identifier_name(&target);
        let operator = self.advance()?;
        let value = Box::new(self.parse_statement()?);
        let position = target.position;
        Ok(match operator.kind {
            TokenKind::Assign => Statement::Declaration {
                name,
                value,
                position,
            },
            TokenKind::Reassign => Statement::Assignment {
                name,
                value,
                position,
            },
            _ => Statement::NullAssignment {
                name,
                value,
                position,
            },
        })
    }

    fn parse_condition(&mut self) -> Result<Statement, CoreError> {
        let position = self.expect(TokenKind::If, "'if'")?.position;
        let mut branches = vec![self.parse_branch()?];
        let mut otherwise = None;

        while self.peek_kind(0)? == TokenKind::Else {
            self.advance()?;
            if self.peek_kind(0)? == TokenKind::If {
                self.advance()?;
                branches.push(self.parse_branch()?);
            } else {
                otherwise = Some(Box::new(self.parse_statement()?));
                break;
            }
        }

        Ok(Statement::Condition {
            branches,
            otherwise,
            position,
        })
    }

    fn parse_branch(&mut self) -> Result<Branch, CoreError> {
        let guard = self.parse_statement()?;
        let body = self.parse_statement()?;
        Ok(Branch { guard, body })
    }

    fn parse_loop(&mut self) -> Result<Statement, CoreError> {
        let position = self.expect(TokenKind::Loop, "'loop'")?.position;
        let guard = Box::new(self.parse_statement()?);
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::Loop {
            guard,
            body,
            position,
        })
    }

    fn parse_break(&mut self) -> Result<Statement, CoreError> {
        let position = self.expect(TokenKind::Break, "'break'")?.position;
        let value = match self.peek_kind(0)? {
            TokenKind::EndOfStatement
            | TokenKind::BraceClose
            | TokenKind::EndOfText
            | TokenKind::Else => None,
            _ => Some(Box::new(self.parse_statement()?)),
        };
        Ok(Statement::Break { value, position })
    }

    // -----------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------

    pub fn parse_expression(&mut self) -> Result<Expression, CoreError> {
        self.nested(Self::parse_or)
    }

    fn parse_or(&mut self) -> Result<Expression, CoreError> {
        self.parse_left_chain(Self::parse_and, |kind| match kind {
            TokenKind::Or => Some(BinaryOperator::Or),
            _ => None,
        })
    }

    fn parse_and(&mut self) -> Result<Expression, CoreError> {
        self.parse_left_chain(Self::parse_relational, |kind| match kind {
            TokenKind::And => Some(BinaryOperator::And),
            _ => None,
        })
    }

    fn parse_relational(&mut self) -> Result<Expression, CoreError> {
        let left = self.parse_coalescing()?;
        let operator = match self.peek_kind(0)? {
            TokenKind::Equal => BinaryOperator::Equal,
            TokenKind::NotEqual => BinaryOperator::NotEqual,
            TokenKind::Less => BinaryOperator::Less,
            TokenKind::LessEqual => BinaryOperator::LessEqual,
            TokenKind::Greater => BinaryOperator::Greater,
            TokenKind::GreaterEqual => BinaryOperator::GreaterEqual,
            _ => return Ok(left),
        };
        let position = self.advance()?.position;
        let right = self.parse_coalescing()?;
        Ok(Expression::Binary {
            operator,
            left: Box::new(left),
            right: Box::new(right),
            position,
        })
    }

    fn parse_coalescing(&mut self) -> Result<Expression, CoreError> {
        self.parse_left_chain(Self::parse_additive, |kind| match kind {
            TokenKind::NullCoalescing => Some(BinaryOperator::NullCoalescing),
            _ => None,
        })
    }

    fn parse_additive(&mut self) -> Result<Expression, CoreError> {
        self.parse_left_chain(Self::parse_multiplicative, |kind| match kind {
            TokenKind::Plus => Some(BinaryOperator::Add),
            TokenKind::Minus => Some(BinaryOperator::Subtract),
            _ => None,
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, CoreError> {
        self.parse_left_chain(Self::parse_unary, |kind| match kind {
            TokenKind::Multiply => Some(BinaryOperator::Multiply),
            TokenKind::Divide => Some(BinaryOperator::Divide),
            _ => None,
        })
    }

    fn parse_left_chain(
        &mut self,
        operand: fn(&mut Self) -> Result<Expression, CoreError>,
        operator: fn(TokenKind) -> Option<BinaryOperator>,
    ) -> Result<Expression, CoreError> {
        let mut left = operand(self)?;
        while let Some(op) = operator(self.peek_kind(0)?) {
            let position = self.advance()?.position;
            let right = operand(self)?;
            left = Expression::Binary {
                operator: op,
                left: Box::new(left),
                right: Box::new(right),
                position,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, CoreError> {
        if self.peek_kind(0)? == TokenKind::Minus {
            let position = self.advance()?.position;
            let operand = self.nested(Self::parse_unary)?;
            return Ok(Expression::Negate {
                operand: Box::new(operand),
                position,
            });
        }
        self.parse_call()
    }

    fn parse_call(&mut self) -> Result<Expression, CoreError> {
        let mut callee = self.parse_factor()?;
        while self.peek_kind(0)? == TokenKind::ParenOpen {
            let position = self.advance()?.position;
            let mut arguments = Vec::new();
            if self.peek_kind(0)? != TokenKind::ParenClose {
                loop {
                    arguments.push(self.parse_expression()?);
                    if self.peek_kind(0)? == TokenKind::Comma {
                        self.advance()?;
                    } else {
                        break;
                    }
                }
            }
            self.expect(TokenKind::ParenClose, "')' after arguments")?;
            callee = Expression::Call {
                callee: Box::new(callee),
                arguments,
                position,
            };
        }
        Ok(callee)
    }

    fn parse_factor(&mut self) -> Result<Expression, CoreError> {
        let kind = self.peek_kind(0)?;
        match kind {
            TokenKind::Integer
            | TokenKind::String
            | TokenKind::Boolean
            | TokenKind::Null => {
                let token = self.advance()?;
                let value = match token.value {
                    TokenValue::Integer(value) => Literal::Integer(value),
                    TokenValue::Text(text) => Literal::String(text),
                    TokenValue::Boolean(value) => Literal::Boolean(value),
                    TokenValue::None => Literal::Null,
                };
                Ok(Expression::Constant {
                    value,
                    position: token.position,
                })
            }
            TokenKind::Identifier => {
                let token = self.advance()?;
                Ok(Expression::Variable {
                    name: identifier_name(&token),
                    position: token.position,
                })
            }
            TokenKind::BraceOpen => Ok(Expression::Block(self.parse_block()?)),
            TokenKind::ParenOpen => {
                if self.lambda_ahead()? {
                    self.parse_lambda()
                } else {
                    self.advance()?;
                    let inner = self.parse_expression()?;
                    self.expect(TokenKind::ParenClose, "')'")?;
                    Ok(inner)
                }
            }
            _ => Err(self.unexpected("expression")?),
        }
    }

    pub fn parse_block(&mut self) -> Result<Block, CoreError> {
        let position = self.expect(TokenKind::BraceOpen, "'{'")?.position;
        let statements = self.parse_sequence(TokenKind::BraceClose, false)?;
        self.expect(TokenKind::BraceClose, "'}'")?;
        Ok(Block {
            statements,
            position,
        })
    }

    /// True if the tokens from the current `(` spell `( [ident {, ident}] ) =>`.
    fn lambda_ahead(&mut self) -> Result<bool, CoreError> {
        let mut index = 1;
        if self.peek_kind(index)? == TokenKind::ParenClose {
            return Ok(self.peek_kind(index + 1)? == TokenKind::Arrow);
        }
        loop {
            if self.peek_kind(index)? != TokenKind::Identifier {
                return Ok(false);
            }
            match self.peek_kind(index + 1)? {
                TokenKind::Comma => index += 2,
                TokenKind::ParenClose => return Ok(self.peek_kind(index + 2)? == TokenKind::Arrow),
                _ => return Ok(false),
            }
        }
    }

    fn parse_lambda(&mut self) -> Result<Expression, CoreError> {
        let position = self.expect(TokenKind::ParenOpen, "'('")?.position;
        let mut parameters = Vec::new();
        while self.peek_kind(0)? != TokenKind::ParenClose {
            let parameter = self.expect(TokenKind::Identifier, "parameter name")?;
            parameters.push(identifier_name(&parameter));
            if self.peek_kind(0)? == TokenKind::Comma {
                self.advance()?;
            }
        }
        self.expect(TokenKind::ParenClose, "')'")?;
        self.expect(TokenKind::Arrow, "'=>'")?;
        let body = self.parse_statement()?;
        Ok(Expression::Lambda(Rc::new(Lambda {
            parameters,
            body,
            position,
        })))
    }
}

fn identifier_name(token: &Token) -> String {
    token.text().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;

    fn single(source: &str) -> Statement {
        let mut program = parse(source).expect("parse");
        assert_eq!(program.statements.len(), 1);
        program.statements.remove(0)
    }

    fn expression(source: &str) -> Expression {
        match single(source) {
            Statement::Expression(expression) => expression,
            other => panic!("expected expression, got {other:?}"),
        }
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let expr = expression("1 + 2 * 3;");
        let Expression::Binary {
            operator, right, ..
        } = expr
        else {
            panic!("expected binary");
        };
        assert_eq!(operator, BinaryOperator::Add);
        assert!(matches!(
            *right,
            Expression::Binary {
                operator: BinaryOperator::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn subtraction_is_left_associative() {
        let expr = expression("8 - 4 - 2;");
        let Expression::Binary { left, .. } = expr else {
            panic!("expected binary");
        };
        assert!(matches!(
            *left,
            Expression::Binary {
                operator: BinaryOperator::Subtract,
                ..
            }
        ));
    }

    #[test]
    fn coalescing_sits_between_relational_and_additive() {
        let expr = expression("a ?? b + 1 == c;");
        let Expression::Binary { operator, left, .. } = expr else {
            panic!("expected binary");
        };
        assert_eq!(operator, BinaryOperator::Equal);
        assert!(matches!(
            *left,
            Expression::Binary {
                operator: BinaryOperator::NullCoalescing,
                ..
            }
        ));
    }

    #[test]
    fn or_is_loosest() {
        let expr = expression("a && b || c;");
        assert!(matches!(
            expr,
            Expression::Binary {
                operator: BinaryOperator::Or,
                ..
            }
        ));
    }

    #[test]
    fn relational_is_not_chainable() {
        let err = parse("1 < 2 < 3;").unwrap_err();
        assert!(err.to_string().contains("Statements should be separated by ';'"));
    }

    #[test]
    fn distinguishes_binding_forms() {
        assert!(matches!(single("x = 1;"), Statement::Declaration { .. }));
        assert!(matches!(single("x := 1;"), Statement::Assignment { .. }));
        assert!(matches!(single("x ??= 1;"), Statement::NullAssignment { .. }));
    }

    #[test]
    fn parses_lambda_and_group() {
        let Statement::Declaration { value, .. } = single("f = (a, b) => a + b;") else {
            panic!("expected declaration");
        };
        let Statement::Expression(Expression::Lambda(lambda)) = *value else {
            panic!("expected lambda");
        };
        assert_eq!(lambda.parameters, vec!["a".to_string(), "b".to_string()]);

        assert!(matches!(expression("(a) + 1;"), Expression::Binary { .. }));
        assert!(matches!(expression("() => 1;"), Expression::Lambda(_)));
    }

    #[test]
    fn parses_chained_calls() {
        let expr = expression("f()(1, 2);");
        let Expression::Call {
            callee, arguments, ..
        } = expr
        else {
            panic!("expected call");
        };
        assert_eq!(arguments.len(), 2);
        assert!(matches!(*callee, Expression::Call { ref arguments, .. } if arguments.is_empty()));
    }

    #[test]
    fn parses_condition_chain() {
        let statement = single("if a {1} else if b {2} else {3};");
        let Statement::Condition {
            branches,
            otherwise,
            ..
        } = statement
        else {
            panic!("expected condition");
        };
        assert_eq!(branches.len(), 2);
        assert!(otherwise.is_some());
    }

    #[test]
    fn parses_loop_and_break() {
        let statement = single("loop true { break 3 };");
        let Statement::Loop { body, .. } = statement else {
            panic!("expected loop");
        };
        let Statement::Expression(Expression::Block(block)) = *body else {
            panic!("expected block body");
        };
        assert!(matches!(
            block.statements[0],
            Statement::Break { value: Some(_), .. }
        ));
    }

    #[test]
    fn allows_empty_block_and_missing_final_separator() {
        let expr = expression("{ a = 1; a };");
        let Expression::Block(block) = expr else {
            panic!("expected block");
        };
        assert_eq!(block.statements.len(), 2);
        assert!(matches!(expression("{};"), Expression::Block(b) if b.statements.is_empty()));
    }

    #[test]
    fn requires_separator_at_top_level() {
        let err = parse("x = 1 y = 2;").unwrap_err();
        assert!(matches!(err, CoreError::ParseError { .. }));
        assert!(err.to_string().contains("Statements should be separated by ';'"));

        let err = parse("x = 1").unwrap_err();
        assert!(err.to_string().contains("Statements should be separated by ';'"));
    }

    #[test]
    fn skips_comments() {
        let program = parse("# leading\nx = 1; # trailing\ny = 2;").expect("parse");
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn reports_unexpected_token_with_position() {
        let err = parse("x = ;").unwrap_err();
        assert!(err.to_string().contains("Expected expression"));
        assert_eq!(err.position(), Some(Position::new(1, 5)));
    }

    #[test]
    fn reports_unclosed_group() {
        let err = parse("(1 + 2;").unwrap_err();
        assert!(err.to_string().contains("Expected ')'"));
    }

    #[test]
    fn empty_program_is_empty_block() {
        let program = parse("  # nothing\n").expect("parse");
        assert!(program.statements.is_empty());
    }

    #[test]
    fn rejects_runaway_nesting() {
        let depth = 10_000;
        let groups = format!("{}1{};", "(".repeat(depth), ")".repeat(depth));
        let err = parse(&groups).unwrap_err();
        assert!(matches!(err, CoreError::ParseError { .. }));
        assert!(err.to_string().contains("Exceeded nesting limit"));

        let blocks = format!("{}{};", "{".repeat(depth), "}".repeat(depth));
        let err = parse(&blocks).unwrap_err();
        assert!(err.to_string().contains("Exceeded nesting limit"));

        let negations = format!("{}1;", "-".repeat(depth));
        let err = parse(&negations).unwrap_err();
        assert!(err.to_string().contains("Exceeded nesting limit"));

        let bindings = format!("{}1;", "x = ".repeat(depth));
        let err = parse(&bindings).unwrap_err();
        assert!(err.to_string().contains("Exceeded nesting limit"));
    }

    #[test]
    fn accepts_moderate_nesting() {
        let depth = MAX_NESTING / 2;
        let groups = format!("{}1{};", "(".repeat(depth), ")".repeat(depth));
        assert!(matches!(
            expression(&groups),
            Expression::Constant {
                value: Literal::Integer(1),
                ..
            }
        ));
    }
}
