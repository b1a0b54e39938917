//! Native (host-provided) functions.
//!
//! Natives are registered with the [`Interpreter`] before a program
//! runs and become ordinary closures in the root context, so call sites
//! cannot tell them apart from user lambdas. This module does not define
//! any concrete natives; hosts such as the CLI supply them.

use std::fmt;

use crate::context::Context;
use crate::error::CoreError;
use crate::interpreter::Interpreter;
use crate::value::Value;

/// Contract every native function implements.
///
/// `execute` receives the call context, in which each declared
/// parameter is bound to its argument, and the interpreter so it can
/// call back into user closures.
pub trait NativeFunction {
    fn identifier(&self) -> &str;
    fn parameters(&self) -> &[String];
    fn execute(&self, interpreter: &mut Interpreter, context: &Context)
    -> Result<Value, CoreError>;
}

type HostBody = dyn Fn(&mut Interpreter, &Context) -> Result<Value, CoreError>;

/// A native built from a Rust closure.
pub struct HostFunction {
    identifier: String,
    parameters: Vec<String>,
    body: Box<HostBody>,
}

impl HostFunction {
    pub fn new<F>(identifier: &str, parameters: &[&str], body: F) -> Self
    where
        F: Fn(&mut Interpreter, &Context) -> Result<Value, CoreError> + 'static,
    {
        HostFunction {
            identifier: identifier.to_string(),
            parameters: parameters.iter().map(|p| p.to_string()).collect(),
            body: Box::new(body),
        }
    }
}

impl NativeFunction for HostFunction {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn parameters(&self) -> &[String] {
        &self.parameters
    }

    fn execute(
        &self,
        interpreter: &mut Interpreter,
        context: &Context,
    ) -> Result<Value, CoreError> {
        (self.body)(interpreter, context)
    }
}

impl fmt::Debug for HostFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostFunction")
            .field("identifier", &self.identifier)
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Reads a declared parameter out of a native's call context.
pub fn argument(context: &Context, name: &str) -> Value {
    context.lookup(name).unwrap_or(Value::Null)
}
