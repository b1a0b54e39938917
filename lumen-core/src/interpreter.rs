//! Tree-walking interpreter for Lumen.
//!
//! The interpreter keeps a stack of [`Context`]s. Blocks, loop
//! iterations and calls push a fresh child context and pop it when they
//! finish, whether they finish normally or by error. Function calls
//! parent their context on the closure's captured context rather than on
//! the caller's, which is what gives closures lexical scope.

use std::rc::Rc;

use crate::ast::{BinaryOperator, Block, Expression, Literal, Statement};
use crate::context::Context;
use crate::error::CoreError;
use crate::natives::NativeFunction;
use crate::operations;
use crate::position::Position;
use crate::value::{Closure, Function, Value};

/// Resource guards applied during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of simultaneously active contexts (root included).
    pub max_depth: usize,
    /// Maximum number of iterations a single loop statement may run.
    pub max_loop_iterations: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            max_depth: 128,
            max_loop_iterations: 100_000,
        }
    }
}

/// Why evaluation stopped early.
enum Unwind {
    Break(Value, Position),
    Error(CoreError),
}

impl From<CoreError> for Unwind {
    fn from(error: CoreError) -> Self {
        Unwind::Error(error)
    }
}

type Flow = Result<Value, Unwind>;

pub struct Interpreter {
    limits: Limits,
    natives: Vec<Rc<dyn NativeFunction>>,
    stack: Vec<Rc<Context>>,
}

impl Interpreter {
    pub fn new(natives: Vec<Rc<dyn NativeFunction>>) -> Self {
        Interpreter::with_limits(natives, Limits::default())
    }

    pub fn with_limits(natives: Vec<Rc<dyn NativeFunction>>, limits: Limits) -> Self {
        for native in &natives {
            log::debug!("registered native {}", native.identifier());
        }
        let mut interpreter = Interpreter {
            limits,
            natives,
            stack: Vec::new(),
        };
        interpreter.reset();
        interpreter
    }

    /// Runs a whole program in a fresh root context and returns the
    /// value of its last statement.
    pub fn execute_program(&mut self, program: &Block) -> Result<Value, CoreError> {
        self.reset();
        log::debug!(
            "executing program with {} statements",
            program.statements.len()
        );
        let result = self.eval_block(program);
        self.reset();
        let value = finish(result)?;
        log::debug!("program finished with {value:?}");
        Ok(value)
    }

    /// Calls a closure with already evaluated arguments.
    pub fn call(
        &mut self,
        closure: &Rc<Closure>,
        arguments: Vec<Value>,
        position: Position,
    ) -> Result<Value, CoreError> {
        let label = match &closure.function {
            Function::Native(native) => native.identifier().to_string(),
            Function::Lambda(_) => "<lambda>".to_string(),
        };
        self.invoke(closure, arguments, position, &label)
    }

    /// Replaces the context stack with a new root holding the natives.
    fn reset(&mut self) {
        let root = Context::root();
        for native in &self.natives {
            let closure = Closure {
                function: Function::Native(native.clone()),
                // Natives only read their own arguments, so they capture
                // an empty context instead of the root they live in.
                captured: Context::root(),
            };
            root.declare(native.identifier(), Value::Closure(Rc::new(closure)));
        }
        self.stack = vec![root];
    }

    fn current(&self) -> Rc<Context> {
        self.stack.last().cloned().unwrap_or_else(Context::root)
    }

    fn enter(&mut self, context: Rc<Context>, position: Position) -> Result<(), CoreError> {
        if self.stack.len() >= self.limits.max_depth {
            return Err(CoreError::runtime(position, "Exceeded recursion limit"));
        }
        self.stack.push(context);
        Ok(())
    }

    fn leave(&mut self) {
        self.stack.pop();
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    fn exec(&mut self, statement: &Statement) -> Flow {
        match statement {
            Statement::Declaration { name, value, .. } => {
                let value = self.exec(value)?;
                self.current().declare(name.clone(), value.clone());
                Ok(value)
            }
            Statement::Assignment {
                name,
                value,
                position,
            } => {
                let value = self.exec(value)?;
                if self.current().assign(name, value.clone()) {
                    Ok(value)
                } else {
                    Err(undefined(name, *position).into())
                }
            }
            Statement::NullAssignment {
                name,
                value,
                position,
            } => {
                // The right-hand side is evaluated even when the binding
                // already holds a value.
                let value = self.exec(value)?;
                self.current()
                    .update(name, |slot| {
                        if slot.is_null() {
                            *slot = value;
                        }
                    })
                    .ok_or_else(|| undefined(name, *position).into())
            }
            Statement::Condition {
                branches,
                otherwise,
                ..
            } => {
                for branch in branches {
                    let guard = self.exec(&branch.guard)?;
                    if operations::to_boolean(&guard, branch.guard.position())? {
                        return self.exec(&branch.body);
                    }
                }
                match otherwise {
                    Some(body) => self.exec(body),
                    None => Ok(Value::Null),
                }
            }
            Statement::Loop {
                guard,
                body,
                position,
            } => self.exec_loop(guard, body, *position),
            Statement::Break { value, position } => {
                let value = match value {
                    Some(value) => self.exec(value)?,
                    None => Value::Null,
                };
                Err(Unwind::Break(value, *position))
            }
            Statement::Expression(expression) => self.eval(expression),
        }
    }

    fn exec_loop(&mut self, guard: &Statement, body: &Statement, position: Position) -> Flow {
        let mut iterations = 0;
        let mut last = Value::Null;
        loop {
            // A break in the guard belongs to this loop as well.
            let condition = match self.exec(guard) {
                Ok(value) => value,
                Err(Unwind::Break(value, _)) => return Ok(value),
                Err(error) => return Err(error),
            };
            if !operations::to_boolean(&condition, guard.position())? {
                return Ok(last);
            }
            if iterations >= self.limits.max_loop_iterations {
                return Err(CoreError::runtime(position, "Exceeded loop count limit").into());
            }
            iterations += 1;

            let context = Context::child(&self.current());
            self.enter(context, position)?;
            let result = self.exec(body);
            self.leave();

            match result {
                Ok(value) => last = value,
                Err(Unwind::Break(value, _)) => return Ok(value),
                Err(error) => return Err(error),
            }
        }
    }

    fn eval_block(&mut self, block: &Block) -> Flow {
        let context = Context::child(&self.current());
        self.enter(context, block.position)?;
        let mut last = Value::Null;
        let mut outcome = Ok(());
        for statement in &block.statements {
            match self.exec(statement) {
                Ok(value) => last = value,
                Err(unwind) => {
                    outcome = Err(unwind);
                    break;
                }
            }
        }
        self.leave();
        outcome.map(|()| last)
    }

    // -----------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------

    fn eval(&mut self, expression: &Expression) -> Flow {
        match expression {
            Expression::Binary {
                operator,
                left,
                right,
                position,
            } => self.eval_binary(*operator, left, right, *position),
            Expression::Negate { operand, position } => {
                let operand = self.eval(operand)?;
                Ok(operations::negate(&operand, *position)?)
            }
            Expression::Constant { value, .. } => Ok(match value {
                Literal::Integer(value) => Value::Integer(*value),
                Literal::String(text) => Value::string(text),
                Literal::Boolean(value) => Value::Boolean(*value),
                Literal::Null => Value::Null,
            }),
            Expression::Variable { name, position } => self
                .current()
                .lookup(name)
                .ok_or_else(|| undefined(name, *position).into()),
            Expression::Block(block) => self.eval_block(block),
            Expression::Lambda(lambda) => Ok(Value::Closure(Rc::new(Closure {
                function: Function::Lambda(lambda.clone()),
                captured: self.current(),
            }))),
            Expression::Call {
                callee,
                arguments,
                position,
            } => {
                let closure = match self.eval(callee)? {
                    Value::Closure(closure) => closure,
                    other => {
                        return Err(CoreError::runtime(
                            *position,
                            format!("Value of type {} is not callable", other.type_name()),
                        )
                        .into());
                    }
                };
                let mut values = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    values.push(self.eval(argument)?);
                }
                Ok(self.invoke(&closure, values, *position, callee.describe_callee())?)
            }
        }
    }

    fn eval_binary(
        &mut self,
        operator: BinaryOperator,
        left: &Expression,
        right: &Expression,
        position: Position,
    ) -> Flow {
        let lhs = self.eval(left)?;
        match operator {
            BinaryOperator::Or => {
                if operations::to_boolean(&lhs, left.position())? {
                    return Ok(Value::Boolean(true));
                }
                let rhs = self.eval(right)?;
                Ok(Value::Boolean(operations::to_boolean(&rhs, right.position())?))
            }
            BinaryOperator::And => {
                if !operations::to_boolean(&lhs, left.position())? {
                    return Ok(Value::Boolean(false));
                }
                let rhs = self.eval(right)?;
                Ok(Value::Boolean(operations::to_boolean(&rhs, right.position())?))
            }
            BinaryOperator::NullCoalescing => {
                if lhs.is_null() {
                    self.eval(right)
                } else {
                    Ok(lhs)
                }
            }
            _ => {
                let rhs = self.eval(right)?;
                Ok(operations::binary(operator, &lhs, &rhs, position)?)
            }
        }
    }

    // -----------------------------------------------------------------
    // Calls
    // -----------------------------------------------------------------

    fn invoke(
        &mut self,
        closure: &Rc<Closure>,
        arguments: Vec<Value>,
        position: Position,
        label: &str,
    ) -> Result<Value, CoreError> {
        let required = closure.parameters().len();
        if required != arguments.len() {
            return Err(CoreError::runtime(
                position,
                format!(
                    "Function {label} requires {required} arguments, but given {} arguments!",
                    arguments.len()
                ),
            ));
        }

        let context = Context::child(&closure.captured);
        for (parameter, argument) in closure.parameters().iter().zip(arguments) {
            context.declare(parameter.clone(), argument);
        }

        log::trace!("call {label} at {position} (depth {})", self.stack.len());
        self.enter(context.clone(), position)?;
        let result = match &closure.function {
            Function::Lambda(lambda) => finish(self.exec(&lambda.body)),
            Function::Native(native) => native
                .execute(self, &context)
                .map_err(|error| error.located_at(position)),
        };
        self.leave();
        result
    }
}

/// Turns an unwind that reached a function or program boundary into a result.
fn finish(flow: Flow) -> Result<Value, CoreError> {
    match flow {
        Ok(value) => Ok(value),
        Err(Unwind::Break(_, position)) => {
            Err(CoreError::runtime(position, "Break outside of loop"))
        }
        Err(Unwind::Error(error)) => Err(error),
    }
}

fn undefined(name: &str, position: Position) -> CoreError {
    CoreError::runtime(position, format!("Variable of name {name} was not defined!"))
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::natives::{HostFunction, argument};
    use crate::parser::parse;

    fn run_with(
        source: &str,
        natives: Vec<Rc<dyn NativeFunction>>,
        limits: Limits,
    ) -> Result<Value, CoreError> {
        let program = parse(source).expect("parse");
        Interpreter::with_limits(natives, limits).execute_program(&program)
    }

    fn run(source: &str) -> Result<Value, CoreError> {
        run_with(source, Vec::new(), Limits::default())
    }

    fn tally(calls: Rc<Cell<usize>>) -> Rc<dyn NativeFunction> {
        Rc::new(HostFunction::new("tally", &["value"], move |_, context| {
            calls.set(calls.get() + 1);
            Ok(argument(context, "value"))
        }))
    }

    #[test]
    fn empty_program_and_block_are_null() {
        assert_eq!(run("").expect("run"), Value::Null);
        assert_eq!(run("{};").expect("run"), Value::Null);
    }

    #[test]
    fn block_yields_last_statement() {
        assert_eq!(run("x = 1; { x; 2; 3 };").expect("run"), Value::Integer(3));
        assert_eq!(run("x = 7;").expect("run"), Value::Integer(7));
    }

    #[test]
    fn nested_declaration_does_not_leak() {
        let err = run("{ y = 1 }; y;").unwrap_err();
        assert!(matches!(err, CoreError::RuntimeError { .. }));
        assert!(err.to_string().contains("Variable of name y was not defined!"));

        assert_eq!(run("x = 1; { x = 5 }; x;").expect("run"), Value::Integer(1));
    }

    #[test]
    fn nested_assignment_mutates_ancestor() {
        assert_eq!(run("x = 1; { { x := 5 } }; x;").expect("run"), Value::Integer(5));
    }

    #[test]
    fn assigning_undefined_name_fails() {
        let err = run("z := 1;").unwrap_err();
        assert!(err.to_string().contains("Variable of name z was not defined!"));
        assert_eq!(err.position(), Some(Position::new(1, 1)));
    }

    #[test]
    fn closures_capture_independent_environments() {
        let source = r#"
            counter = () => { count = 3; () => { count := count + 1; count } };
            a = counter();
            b = counter();
            first = a();
            second = b();
            third = a();
            fourth = a();
            first + "," + second + "," + third + "," + fourth;
        "#;
        assert_eq!(run(source).expect("run"), Value::string("4,4,5,6"));
    }

    #[test]
    fn recursive_fibonacci() {
        let fib = "fib = (i) => if i <= 1 {1} else {fib(i - 1) + fib(i - 2)};";
        for (n, expected) in [(1, 1), (6, 13), (9, 55)] {
            let source = format!("{fib} fib({n});");
            assert_eq!(run(&source).expect("run"), Value::Integer(expected));
        }
    }

    #[test]
    fn chained_calls_and_curried_lambdas() {
        assert_eq!(
            run("adder = (a) => (b) => a + b; adder(2)(3);").expect("run"),
            Value::Integer(5)
        );
    }

    #[test]
    fn bare_lambda_is_not_invoked() {
        let value = run("() => 1;").expect("run");
        assert!(matches!(value, Value::Closure(_)));
    }

    #[test]
    fn coalescing_only_evaluates_right_side_on_null() {
        let calls = Rc::new(Cell::new(0));
        let value = run_with(
            "x = 5; x ?? tally(1);",
            vec![tally(calls.clone())],
            Limits::default(),
        )
        .expect("run");
        assert_eq!(value, Value::Integer(5));
        assert_eq!(calls.get(), 0);

        let value = run_with(
            "y = null; y ?? tally(2);",
            vec![tally(calls.clone())],
            Limits::default(),
        )
        .expect("run");
        assert_eq!(value, Value::Integer(2));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn null_assignment_always_evaluates_right_side() {
        let calls = Rc::new(Cell::new(0));
        let source = "a = null; a ??= tally(1); b = 2; kept = b ??= tally(3); a + b + kept;";
        let value = run_with(source, vec![tally(calls.clone())], Limits::default()).expect("run");
        assert_eq!(value, Value::Integer(5));
        assert_eq!(calls.get(), 2);

        let err = run("missing ??= 1;").unwrap_err();
        assert!(err.to_string().contains("Variable of name missing was not defined!"));
    }

    #[test]
    fn reports_arity_mismatch() {
        let err = run("f = (a) => a; f(1, 2);").unwrap_err();
        assert!(
            err.to_string()
                .contains("Function f requires 1 arguments, but given 2 arguments!")
        );
    }

    #[test]
    fn rejects_calling_non_closures() {
        let err = run("x = 1; x();").unwrap_err();
        assert!(err.to_string().contains("Value of type integer is not callable"));
    }

    #[test]
    fn integer_division() {
        assert_eq!(run("-7 / 2;").expect("run"), Value::Integer(-3));
        let err = run("1 / 0;").unwrap_err();
        assert!(err.to_string().contains("Cannot divide by zero"));
    }

    #[test]
    fn recursion_limit_aborts_evaluation() {
        let limits = Limits {
            max_depth: 32,
            ..Limits::default()
        };
        let err = run_with("f = (n) => f(n + 1); f(0);", Vec::new(), limits).unwrap_err();
        assert!(err.to_string().contains("Exceeded recursion limit"));
    }

    #[test]
    fn loops_until_guard_fails() {
        let source = "i = 0; total = 0; loop i < 5 { i := i + 1; total := total + i }; total;";
        assert_eq!(run(source).expect("run"), Value::Integer(15));
        assert_eq!(
            run("i = 0; loop i < 3 { i := i + 1; i * 10 };").expect("run"),
            Value::Integer(30)
        );
        assert_eq!(run("loop false { 1 };").expect("run"), Value::Null);
    }

    #[test]
    fn loop_limit_aborts_evaluation() {
        let limits = Limits {
            max_loop_iterations: 10,
            ..Limits::default()
        };
        let err = run_with("loop true {};", Vec::new(), limits).unwrap_err();
        assert!(err.to_string().contains("Exceeded loop count limit"));
        assert!(run_with("i = 0; loop i < 10 { i := i + 1 };", Vec::new(), limits).is_ok());
    }

    #[test]
    fn break_leaves_innermost_loop_with_value() {
        let source = "i = 0; loop true { i := i + 1; if i == 4 { break i * 2 } };";
        assert_eq!(run(source).expect("run"), Value::Integer(8));
        assert_eq!(run("loop true { break };").expect("run"), Value::Null);
    }

    #[test]
    fn break_outside_loop_is_fatal() {
        let err = run("break;").unwrap_err();
        assert!(err.to_string().contains("Break outside of loop"));

        let err = run("f = () => { break }; loop true { f() };").unwrap_err();
        assert!(err.to_string().contains("Break outside of loop"));
    }

    #[test]
    fn break_in_guard_leaves_that_loop() {
        assert_eq!(run("loop { break 7 } { 1 };").expect("run"), Value::Integer(7));

        let source = "n = 0; loop n < 3 { n := n + 1; loop { break 1 } { 2 } }; n;";
        assert_eq!(run(source).expect("run"), Value::Integer(3));
    }

    #[test]
    fn conditions_pick_first_truthy_branch() {
        let source = r#"x = 2; if x == 1 {"one"} else if x == 2 {"two"} else {"many"};"#;
        assert_eq!(run(source).expect("run"), Value::string("two"));
        assert_eq!(run("if 0 {1};").expect("run"), Value::Null);
        assert_eq!(run(r#"if "" {1} else {2};"#).expect("run"), Value::Integer(2));
    }

    #[test]
    fn guard_must_coerce_to_boolean() {
        let err = run("f = () => 1; if f {1};").unwrap_err();
        assert!(err.to_string().contains("Cannot coerce closure to boolean"));
    }

    #[test]
    fn logical_operators_short_circuit() {
        assert_eq!(run("false && undefined_name;").expect("run"), Value::Boolean(false));
        assert_eq!(run("true || undefined_name;").expect("run"), Value::Boolean(true));
        assert_eq!(run("0 || 3;").expect("run"), Value::Boolean(true));
    }

    #[test]
    fn compares_strings_by_common_prefix() {
        assert_eq!(run(r#""ab" < "ac";"#).expect("run"), Value::Boolean(true));
        assert_eq!(run(r#""a" < "ab";"#).expect("run"), Value::Boolean(false));
        assert_eq!(run(r#"1 == "1";"#).expect("run"), Value::Boolean(true));
    }

    #[test]
    fn closures_compare_by_identity() {
        let source = "f = () => 1; g = f; h = () => 1; (f == g) && (f != h) && (f != 1);";
        assert_eq!(run(source).expect("run"), Value::Boolean(true));
    }

    #[test]
    fn negation_follows_operand_type() {
        assert_eq!(run("-true;").expect("run"), Value::Boolean(false));
        assert_eq!(run("--3;").expect("run"), Value::Integer(3));
        let err = run(r#"-"x";"#).unwrap_err();
        assert!(err.to_string().contains("Cannot negate value of type string"));
    }

    #[test]
    fn natives_can_call_back_into_closures() {
        let apply: Rc<dyn NativeFunction> =
            Rc::new(HostFunction::new("apply", &["f", "x"], |interpreter, context| {
                match argument(context, "f") {
                    Value::Closure(closure) => {
                        interpreter.call(
                            &closure,
                            vec![argument(context, "x")],
                            Position::default(),
                        )
                    }
                    other => Err(CoreError::runtime(
                        Position::default(),
                        format!("apply expects a closure, got {}", other.type_name()),
                    )),
                }
            }));

        let value = run_with("apply((n) => n * 2, 21);", vec![apply.clone()], Limits::default())
            .expect("run");
        assert_eq!(value, Value::Integer(42));

        let err = run_with("apply(1, 2);", vec![apply], Limits::default()).unwrap_err();
        assert!(err.to_string().contains("apply expects a closure"));
        assert_eq!(err.position(), Some(Position::new(1, 6)));
    }

    #[test]
    fn runs_are_independent() {
        let mut interpreter = Interpreter::new(Vec::new());
        let first = parse("x = 1;").expect("parse");
        interpreter.execute_program(&first).expect("first run");
        let second = parse("x;").expect("parse");
        assert!(interpreter.execute_program(&second).is_err());
    }
}
