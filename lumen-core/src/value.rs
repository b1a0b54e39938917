//! Runtime values.

use std::fmt;
use std::rc::Rc;

use crate::ast::Lambda;
use crate::context::Context;
use crate::natives::NativeFunction;

#[derive(Clone)]
pub enum Value {
    Integer(i32),
    Boolean(bool),
    String(Rc<str>),
    Null,
    Closure(Rc<Closure>),
}

/// A function paired with the context that was current when it was
/// created. Native functions capture an empty context.
pub struct Closure {
    pub function: Function,
    pub captured: Rc<Context>,
}

#[derive(Clone)]
pub enum Function {
    Lambda(Rc<Lambda>),
    Native(Rc<dyn NativeFunction>),
}

impl Closure {
    pub fn parameters(&self) -> &[String] {
        match &self.function {
            Function::Lambda(lambda) => &lambda.parameters,
            Function::Native(native) => native.parameters(),
        }
    }
}

impl Value {
    pub fn string(text: impl AsRef<str>) -> Self {
        Value::String(Rc::from(text.as_ref()))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Boolean(_) => "boolean",
            Value::String(_) => "string",
            Value::Null => "null",
            Value::Closure(_) => "closure",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Boolean coercion: positive integers and non-empty strings are true.
    pub fn coerce_boolean(&self) -> Option<bool> {
        match self {
            Value::Integer(value) => Some(*value > 0),
            Value::Boolean(value) => Some(*value),
            Value::String(text) => Some(!text.is_empty()),
            Value::Null => Some(false),
            Value::Closure(_) => None,
        }
    }

    pub fn coerce_integer(&self) -> Option<i32> {
        match self {
            Value::Integer(value) => Some(*value),
            Value::Boolean(value) => Some(i32::from(*value)),
            Value::Null => Some(0),
            Value::String(_) | Value::Closure(_) => None,
        }
    }

    pub fn coerce_string(&self) -> Option<Rc<str>> {
        match self {
            Value::Integer(value) => Some(Rc::from(value.to_string())),
            Value::Boolean(value) => Some(Rc::from(value.to_string())),
            Value::String(text) => Some(text.clone()),
            Value::Null => Some(Rc::from("")),
            Value::Closure(_) => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "Integer({value})"),
            Value::Boolean(value) => write!(f, "Boolean({value})"),
            Value::String(text) => write!(f, "String({text:?})"),
            Value::Null => f.write_str("Null"),
            Value::Closure(closure) => write!(f, "Closure({closure})"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(value) => write!(f, "{value}"),
            Value::Boolean(value) => write!(f, "{value}"),
            Value::String(text) => f.write_str(text),
            Value::Null => f.write_str("null"),
            Value::Closure(closure) => write!(f, "{closure}"),
        }
    }
}

impl fmt::Display for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.function {
            Function::Lambda(lambda) => write!(f, "<lambda({})>", lambda.parameters.join(", ")),
            Function::Native(native) => write!(f, "<native {}>", native.identifier()),
        }
    }
}

/// Structural equality for tests and hosts; closures compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(left), Value::Integer(right)) => left == right,
            (Value::Boolean(left), Value::Boolean(right)) => left == right,
            (Value::String(left), Value::String(right)) => left == right,
            (Value::Null, Value::Null) => true,
            (Value::Closure(left), Value::Closure(right)) => Rc::ptr_eq(left, right),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coerces_to_boolean() {
        assert_eq!(Value::Integer(1).coerce_boolean(), Some(true));
        assert_eq!(Value::Integer(0).coerce_boolean(), Some(false));
        assert_eq!(Value::Integer(-3).coerce_boolean(), Some(false));
        assert_eq!(Value::string("").coerce_boolean(), Some(false));
        assert_eq!(Value::string("x").coerce_boolean(), Some(true));
        assert_eq!(Value::Null.coerce_boolean(), Some(false));
    }

    #[test]
    fn coerces_to_integer_and_string() {
        assert_eq!(Value::Boolean(true).coerce_integer(), Some(1));
        assert_eq!(Value::Null.coerce_integer(), Some(0));
        assert_eq!(Value::string("5").coerce_integer(), None);
        assert_eq!(Value::Integer(-7).coerce_string().as_deref(), Some("-7"));
        assert_eq!(Value::Boolean(false).coerce_string().as_deref(), Some("false"));
        assert_eq!(Value::Null.coerce_string().as_deref(), Some(""));
    }

    #[test]
    fn displays_values() {
        assert_eq!(Value::Integer(42).to_string(), "42");
        assert_eq!(Value::string("hi").to_string(), "hi");
        assert_eq!(Value::Null.to_string(), "null");
    }
}
