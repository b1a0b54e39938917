//! Operator semantics over runtime values.
//!
//! The short-circuiting operators (`||`, `&&`, `??`) live in the
//! interpreter because they control evaluation order; everything here
//! works on two already evaluated operands.

use std::rc::Rc;

use crate::ast::BinaryOperator;
use crate::error::CoreError;
use crate::position::Position;
use crate::value::Value;

pub fn binary(
    operator: BinaryOperator,
    left: &Value,
    right: &Value,
    position: Position,
) -> Result<Value, CoreError> {
    match operator {
        BinaryOperator::Equal => Ok(Value::Boolean(equals(left, right, position)?)),
        BinaryOperator::NotEqual => Ok(Value::Boolean(!equals(left, right, position)?)),
        BinaryOperator::Less => Ok(Value::Boolean(less(left, right, position)?)),
        BinaryOperator::Greater => Ok(Value::Boolean(less(right, left, position)?)),
        // `a <= b` is `!(b < a)` and `a >= b` is `!(a < b)`.
        BinaryOperator::LessEqual => Ok(Value::Boolean(!less(right, left, position)?)),
        BinaryOperator::GreaterEqual => Ok(Value::Boolean(!less(left, right, position)?)),
        BinaryOperator::Add => add(left, right, position),
        BinaryOperator::Subtract => {
            let (l, r) = integers(left, right, position)?;
            Ok(Value::Integer(l.wrapping_sub(r)))
        }
        BinaryOperator::Multiply => {
            let (l, r) = integers(left, right, position)?;
            Ok(Value::Integer(l.wrapping_mul(r)))
        }
        BinaryOperator::Divide => {
            let (l, r) = integers(left, right, position)?;
            if r == 0 {
                return Err(CoreError::runtime(position, "Cannot divide by zero"));
            }
            Ok(Value::Integer(l.wrapping_div(r)))
        }
        BinaryOperator::Or | BinaryOperator::And | BinaryOperator::NullCoalescing => {
            Err(CoreError::runtime(
                position,
                format!("Operator {operator:?} must be evaluated lazily"),
            ))
        }
    }
}

pub fn negate(operand: &Value, position: Position) -> Result<Value, CoreError> {
    match operand {
        Value::Integer(value) => Ok(Value::Integer(value.wrapping_neg())),
        Value::Boolean(value) => Ok(Value::Boolean(!value)),
        other => Err(CoreError::runtime(
            position,
            format!("Cannot negate value of type {}", other.type_name()),
        )),
    }
}

pub fn to_boolean(value: &Value, position: Position) -> Result<bool, CoreError> {
    value
        .coerce_boolean()
        .ok_or_else(|| coercion_error(value, "boolean", position))
}

pub fn to_integer(value: &Value, position: Position) -> Result<i32, CoreError> {
    value
        .coerce_integer()
        .ok_or_else(|| coercion_error(value, "integer", position))
}

pub fn to_string(value: &Value, position: Position) -> Result<Rc<str>, CoreError> {
    value
        .coerce_string()
        .ok_or_else(|| coercion_error(value, "string", position))
}

fn coercion_error(value: &Value, target: &str, position: Position) -> CoreError {
    CoreError::runtime(
        position,
        format!("Cannot coerce {} to {target}", value.type_name()),
    )
}

fn integers(left: &Value, right: &Value, position: Position) -> Result<(i32, i32), CoreError> {
    Ok((to_integer(left, position)?, to_integer(right, position)?))
}

/// Closures are only ever equal to the very same closure; any other
/// pairing involving a closure is unequal rather than an error.
fn equals(left: &Value, right: &Value, position: Position) -> Result<bool, CoreError> {
    match (left, right) {
        (Value::Closure(l), Value::Closure(r)) => Ok(Rc::ptr_eq(l, r)),
        (Value::Closure(_), _) | (_, Value::Closure(_)) => Ok(false),
        (Value::String(_), _) | (_, Value::String(_)) => {
            Ok(to_string(left, position)? == to_string(right, position)?)
        }
        _ => Ok(to_integer(left, position)? == to_integer(right, position)?),
    }
}

fn less(left: &Value, right: &Value, position: Position) -> Result<bool, CoreError> {
    if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
        let left = to_string(left, position)?;
        let right = to_string(right, position)?;
        return Ok(string_less(&left, &right));
    }
    Ok(to_integer(left, position)? < to_integer(right, position)?)
}

/// Compares character by character up to the shorter length only, so a
/// strict prefix is never less than the longer string.
fn string_less(left: &str, right: &str) -> bool {
    for (l, r) in left.chars().zip(right.chars()) {
        if l != r {
            return l < r;
        }
    }
    false
}

fn add(left: &Value, right: &Value, position: Position) -> Result<Value, CoreError> {
    if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
        let mut text = to_string(left, position)?.to_string();
        text.push_str(&to_string(right, position)?);
        return Ok(Value::string(text));
    }
    let (l, r) = integers(left, right, position)?;
    Ok(Value::Integer(l.wrapping_add(r)))
}
