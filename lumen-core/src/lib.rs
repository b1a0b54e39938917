//! Core of the Lumen language.
//!
//! Lumen is a small dynamically typed, tree-interpreted language. The
//! pipeline is:
//!
//!   source .lm
//!     -> chars      (normalized character stream with positions)
//!     -> lexer      (competing token automata, longest match wins)
//!     -> parser     (precedence-layered recursive descent -> AST)
//!     -> interpreter (context chain, closures, natives, limits)
//!
//! Hosts (the CLI, tests) supply native functions and call
//! [`run`] or drive the stages individually.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod error;
pub mod position;

// ---------------------------------------------------------------------
// Front-end: characters, tokens, syntax
// ---------------------------------------------------------------------

pub mod ast;
pub mod automata;
pub mod chars;
pub mod lexer;
pub mod parser;
pub mod token;

// ---------------------------------------------------------------------
// Runtime: values, contexts, natives, evaluation
// ---------------------------------------------------------------------

pub mod context;
pub mod interpreter;
pub mod natives;
pub mod operations;
pub mod value;

// ---------------------------------------------------------------------
// Orchestration and script discovery
// ---------------------------------------------------------------------

pub mod runner;
pub mod scripts;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use ast::Block;
pub use error::CoreError;
pub use interpreter::{Interpreter, Limits};
pub use lexer::tokenize;
pub use natives::{HostFunction, NativeFunction};
pub use parser::parse;
pub use position::Position;
pub use runner::run;
pub use scripts::{ScriptFile, load_scripts};
pub use value::Value;
