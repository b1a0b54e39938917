//! Syntax tree produced by the parser.
//!
//! Statements and expressions are closed enums; the interpreter matches
//! on them exhaustively. Every node carries the position of the token
//! that introduced it.

use std::rc::Rc;

use crate::position::Position;

/// An ordered statement sequence delimited by `{ }` (or the whole program).
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `name = value`: binds in the current context, shadowing outer ones.
    Declaration {
        name: String,
        value: Box<Statement>,
        position: Position,
    },
    /// `name := value`: mutates the nearest existing binding.
    Assignment {
        name: String,
        value: Box<Statement>,
        position: Position,
    },
    /// `name ??= value`: mutates the nearest binding if it holds null.
    NullAssignment {
        name: String,
        value: Box<Statement>,
        position: Position,
    },
    /// `if g b (else if g b)* (else b)?`
    Condition {
        branches: Vec<Branch>,
        otherwise: Option<Box<Statement>>,
        position: Position,
    },
    /// `loop guard body`
    Loop {
        guard: Box<Statement>,
        body: Box<Statement>,
        position: Position,
    },
    /// `break` or `break value`
    Break {
        value: Option<Box<Statement>>,
        position: Position,
    },
    Expression(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Branch {
    pub guard: Statement,
    pub body: Statement,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Binary {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
        position: Position,
    },
    /// Unary `-`: arithmetic negation for integers, logical for booleans.
    Negate {
        operand: Box<Expression>,
        position: Position,
    },
    Constant {
        value: Literal,
        position: Position,
    },
    Variable {
        name: String,
        position: Position,
    },
    Block(Block),
    Lambda(Rc<Lambda>),
    Call {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
        position: Position,
    },
}

/// Binary operators, grouped by precedence layer (lowest first).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Or,
    And,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    NullCoalescing,
    Add,
    Subtract,
    Multiply,
    Divide,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Integer(i32),
    String(String),
    Boolean(bool),
    Null,
}

/// An unevaluated function literal. It only captures a context when the
/// interpreter evaluates it into a closure.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub parameters: Vec<String>,
    pub body: Statement,
    pub position: Position,
}

impl Statement {
    pub fn position(&self) -> Position {
        match self {
            Statement::Declaration { position, .. }
            | Statement::Assignment { position, .. }
            | Statement::NullAssignment { position, .. }
            | Statement::Condition { position, .. }
            | Statement::Loop { position, .. }
            | Statement::Break { position, .. } => *position,
            Statement::Expression(expression) => expression.position(),
        }
    }
}

impl Expression {
    pub fn position(&self) -> Position {
        match self {
            Expression::Binary { position, .. }
            | Expression::Negate { position, .. }
            | Expression::Constant { position, .. }
            | Expression::Variable { position, .. }
            | Expression::Call { position, .. } => *position,
            Expression::Block(block) => block.position,
            Expression::Lambda(lambda) => lambda.position,
        }
    }

    /// Name used for the callee in arity errors.
    pub fn describe_callee(&self) -> &str {
        match self {
            Expression::Variable { name, .. } => name,
            _ => "<lambda>",
        }
    }
}
