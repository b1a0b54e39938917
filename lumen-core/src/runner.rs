//! Pipeline entry points: source text in, tokens / tree / value out.

use std::rc::Rc;

use crate::ast::Block;
use crate::error::CoreError;
use crate::interpreter::{Interpreter, Limits};
use crate::natives::NativeFunction;
use crate::parser::parse;
use crate::value::Value;

/// Parses `source` and evaluates it with the given natives and limits.
pub fn run(
    source: &str,
    natives: Vec<Rc<dyn NativeFunction>>,
    limits: Limits,
) -> Result<Value, CoreError> {
    let program: Block = parse(source)?;
    let mut interpreter = Interpreter::with_limits(natives, limits);
    interpreter.execute_program(&program)
}
