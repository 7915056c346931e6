//! Tree-walking evaluator.
//!
//! Every evaluation step returns `EvalResult<Value>`. The `Err` arm carries a
//! [`Signal`]: a language-level error, a `return` in flight, or a loop
//! `break`/`continue`. `?` therefore stops sibling evaluation the moment a
//! signal appears, and the signal is only turned back into a plain value at a
//! function-call boundary or at the top of the program.

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};
use thiserror::Error;

use crate::ast::{Block, Expression, InfixOperator, PrefixOperator, Program, Statement};
use crate::builtins;
use crate::environment::Environment;
use crate::value::{Function, Value, NULL};

/// Non-local control flow threaded through evaluation.
#[derive(Error, Debug)]
pub enum Signal {
    #[error("{0}")]
    Error(String),

    #[error("Return signal with value: {0}")]
    Return(Value),

    #[error("break outside of loop")]
    Break,

    #[error("continue outside of loop")]
    Continue,
}

impl Signal {
    /// Fold the signal into the value a completed program (or call) yields.
    fn into_value(self) -> Value {
        match self {
            Signal::Return(value) => value,
            Signal::Error(message) => Value::Error(message),
            loose @ (Signal::Break | Signal::Continue) => Value::Error(loose.to_string()),
        }
    }
}

/// Convenient alias for evaluation results.
pub type EvalResult<T> = Result<T, Signal>;

type Env = Rc<RefCell<Environment>>;

fn error<T, S: Into<String>>(message: S) -> EvalResult<T> {
    let message: String = message.into();
    debug!("Error: {}", message);
    Err(Signal::Error(message))
}

/// Evaluate `program` in `env`, sending `print` output to stdout.
pub fn evaluate(program: &Program, env: &Env) -> Value {
    Interpreter::new().evaluate(program, env)
}

/// Evaluator state: only the sink `print` writes to. Scopes are passed
/// explicitly, so one interpreter may run against any environment.
pub struct Interpreter<W: Write = io::Stdout> {
    out: W,
}

impl Interpreter<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(out: W) -> Self {
        info!("Initializing Interpreter");

        Self { out }
    }

    /// Give back the output sink, e.g. to inspect captured `print` output.
    pub fn into_output(self) -> W {
        self.out
    }

    /// Evaluate a whole program. Language-level failures come back as
    /// [`Value::Error`]; a top-level `return` yields its value.
    pub fn evaluate(&mut self, program: &Program, env: &Env) -> Value {
        debug!("Interpreting {} statements", program.statements.len());

        let value = match self.eval_statements(&program.statements, env) {
            Ok(value) => value,
            Err(signal) => signal.into_value(),
        };

        info!("Program evaluated to: {}", value);

        value
    }

    // ───────────────────────────── statements ─────────────────────────────

    /// Run statements in order; the last one's value is the result.
    fn eval_statements(&mut self, statements: &[Statement], env: &Env) -> EvalResult<Value> {
        let mut result: Value = NULL;

        for stmt in statements {
            result = self.eval_statement(stmt, env)?;
        }

        Ok(result)
    }

    /// Run a block in a fresh child scope of `env`.
    fn eval_scoped_block(&mut self, block: &Block, env: &Env) -> EvalResult<Value> {
        let scope: Env = Environment::enclosed(env);

        self.eval_statements(&block.statements, &scope)
    }

    fn eval_statement(&mut self, stmt: &Statement, env: &Env) -> EvalResult<Value> {
        match stmt {
            Statement::Let { name, value } => {
                debug!("Declaring '{}'", name);
                let value: Value = self.eval_expression(value, env)?;
                env.borrow_mut()
                    .declare(name, value)
                    .map_err(Signal::Error)?;
                Ok(NULL)
            }

            Statement::Assign { name, value } => {
                debug!("Assigning to '{}'", name);
                if !env.borrow().resolves(name) {
                    return error(format!("identifier not found: {}", name));
                }
                let value: Value = self.eval_expression(value, env)?;
                env.borrow_mut()
                    .reassign(name, value)
                    .map_err(Signal::Error)
            }

            Statement::Return(expr) => {
                let value: Value = match expr {
                    Some(expr) => self.eval_expression(expr, env)?,
                    None => NULL,
                };
                debug!("Returning value: {}", value);
                Err(Signal::Return(value))
            }

            Statement::For {
                init,
                condition,
                update,
                body,
            } => self.eval_for(init.as_deref(), condition.as_ref(), update.as_deref(), body, env),

            Statement::Break => Err(Signal::Break),

            Statement::Continue => Err(Signal::Continue),

            Statement::Expression(expr) => self.eval_expression(expr, env),
        }
    }

    fn eval_for(
        &mut self,
        init: Option<&Statement>,
        condition: Option<&Expression>,
        update: Option<&Statement>,
        body: &Block,
        env: &Env,
    ) -> EvalResult<Value> {
        debug!("Entering for loop");
        let loop_env: Env = Environment::enclosed(env);

        if let Some(init) = init {
            self.eval_statement(init, &loop_env)?;
        }

        loop {
            if let Some(condition) = condition {
                if !self.eval_expression(condition, &loop_env)?.is_truthy() {
                    break;
                }
            }

            match self.eval_scoped_block(body, &loop_env) {
                Ok(_) | Err(Signal::Continue) => {}
                Err(Signal::Break) => break,
                Err(other) => return Err(other),
            }

            if let Some(update) = update {
                self.eval_statement(update, &loop_env)?;
            }
        }

        debug!("Exited for loop");
        Ok(NULL)
    }

    // ───────────────────────────── expressions ────────────────────────────

    fn eval_expression(&mut self, expr: &Expression, env: &Env) -> EvalResult<Value> {
        match expr {
            Expression::Integer(n) => Ok(Value::Integer(*n)),

            Expression::Str(s) => Ok(Value::String(s.clone())),

            Expression::Boolean(b) => Ok(Value::Boolean(*b)),

            Expression::Identifier(name) => self.eval_identifier(name, env),

            Expression::Array(elements) => {
                let values: Vec<Value> = self.eval_expressions(elements, env)?;
                Ok(Value::array(values))
            }

            Expression::Prefix { operator, right } => {
                let right: Value = self.eval_expression(right, env)?;
                eval_prefix(*operator, right)
            }

            Expression::Infix {
                left,
                operator: InfixOperator::And,
                right,
            } => {
                if !self.eval_expression(left, env)?.is_truthy() {
                    return Ok(Value::Boolean(false));
                }
                let right: Value = self.eval_expression(right, env)?;
                Ok(Value::Boolean(right.is_truthy()))
            }

            Expression::Infix {
                left,
                operator: InfixOperator::Or,
                right,
            } => {
                if self.eval_expression(left, env)?.is_truthy() {
                    return Ok(Value::Boolean(true));
                }
                let right: Value = self.eval_expression(right, env)?;
                Ok(Value::Boolean(right.is_truthy()))
            }

            Expression::Infix {
                left,
                operator,
                right,
            } => {
                let left: Value = self.eval_expression(left, env)?;
                let right: Value = self.eval_expression(right, env)?;
                eval_infix(*operator, left, right)
            }

            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                let condition: Value = self.eval_expression(condition, env)?;
                if condition.is_truthy() {
                    self.eval_scoped_block(consequence, env)
                } else if let Some(alternative) = alternative {
                    self.eval_scoped_block(alternative, env)
                } else {
                    Ok(NULL)
                }
            }

            Expression::Function { parameters, body } => Ok(Value::Function(Rc::new(Function {
                parameters: parameters.clone(),
                body: Rc::clone(body),
                env: Rc::clone(env),
            }))),

            Expression::Call {
                function,
                arguments,
            } => {
                let callee: Value = self.eval_expression(function, env)?;
                let args: Vec<Value> = self.eval_expressions(arguments, env)?;
                self.apply_function(callee, args)
            }

            Expression::Index { left, index } => {
                let left: Value = self.eval_expression(left, env)?;
                let index: Value = self.eval_expression(index, env)?;
                eval_index(left, index)
            }
        }
    }

    /// Evaluate left to right, stopping at the first signal.
    fn eval_expressions(&mut self, exprs: &[Expression], env: &Env) -> EvalResult<Vec<Value>> {
        exprs
            .iter()
            .map(|expr| self.eval_expression(expr, env))
            .collect()
    }

    fn eval_identifier(&self, name: &str, env: &Env) -> EvalResult<Value> {
        let bound: Option<Value> = env.borrow().get(name);

        if let Some(value) = bound {
            return Ok(value);
        }

        match builtins::lookup(name) {
            Some(builtin) => Ok(Value::Builtin(builtin)),
            None => error(format!("identifier not found: {}", name)),
        }
    }

    fn apply_function(&mut self, callee: Value, args: Vec<Value>) -> EvalResult<Value> {
        match callee {
            Value::Function(function) => {
                if args.len() != function.parameters.len() {
                    return error(format!(
                        "wrong number of arguments. got={}, want={}",
                        args.len(),
                        function.parameters.len()
                    ));
                }

                let call_env: Env = Environment::enclosed(&function.env);
                for (param, arg) in function.parameters.iter().zip(args) {
                    call_env
                        .borrow_mut()
                        .declare(param, arg)
                        .map_err(Signal::Error)?;
                }

                match self.eval_statements(&function.body.statements, &call_env) {
                    Ok(value) | Err(Signal::Return(value)) => Ok(value),
                    Err(err @ Signal::Error(_)) => Err(err),
                    Err(loose) => error(loose.to_string()),
                }
            }

            Value::Builtin(builtin) => builtin
                .call(&args, &mut self.out)
                .map_err(Signal::Error),

            other => error(format!("not a function: {}", other.type_name())),
        }
    }
}

// ───────────────────────────── operators ─────────────────────────────

fn eval_prefix(operator: PrefixOperator, right: Value) -> EvalResult<Value> {
    match operator {
        PrefixOperator::Bang => Ok(Value::Boolean(!right.is_truthy())),
        PrefixOperator::Minus => match right {
            Value::Integer(n) => Ok(Value::Integer(n.wrapping_neg())),
            other => error(format!("unknown operator: -{}", other.type_name())),
        },
    }
}

fn eval_infix(operator: InfixOperator, left: Value, right: Value) -> EvalResult<Value> {
    match (&left, &right) {
        (Value::Integer(a), Value::Integer(b)) => eval_integer_infix(operator, *a, *b),

        (Value::String(a), Value::String(b)) => match operator {
            InfixOperator::Plus => Ok(Value::String(format!("{}{}", a, b))),
            InfixOperator::Equal => Ok(Value::Boolean(a == b)),
            InfixOperator::NotEqual => Ok(Value::Boolean(a != b)),
            _ => unknown_infix(operator, &left, &right),
        },

        _ if left.type_name() != right.type_name() => error(format!(
            "type mismatch: {} {} {}",
            left.type_name(),
            operator,
            right.type_name()
        )),

        _ => match operator {
            InfixOperator::Equal if !left.is_error() => Ok(Value::Boolean(left == right)),
            InfixOperator::NotEqual if !left.is_error() => Ok(Value::Boolean(left != right)),
            _ => unknown_infix(operator, &left, &right),
        },
    }
}

fn eval_integer_infix(operator: InfixOperator, a: i64, b: i64) -> EvalResult<Value> {
    let value = match operator {
        InfixOperator::Plus => Value::Integer(a.wrapping_add(b)),
        InfixOperator::Minus => Value::Integer(a.wrapping_sub(b)),
        InfixOperator::Multiply => Value::Integer(a.wrapping_mul(b)),
        InfixOperator::Divide => {
            if b == 0 {
                return error("division by zero");
            }
            Value::Integer(a.wrapping_div(b))
        }
        InfixOperator::Less => Value::Boolean(a < b),
        InfixOperator::Greater => Value::Boolean(a > b),
        InfixOperator::LessEqual => Value::Boolean(a <= b),
        InfixOperator::GreaterEqual => Value::Boolean(a >= b),
        InfixOperator::Equal => Value::Boolean(a == b),
        InfixOperator::NotEqual => Value::Boolean(a != b),
        InfixOperator::And | InfixOperator::Or => {
            return error(format!("unknown operator: INTEGER {} INTEGER", operator));
        }
    };

    Ok(value)
}

fn unknown_infix(operator: InfixOperator, left: &Value, right: &Value) -> EvalResult<Value> {
    error(format!(
        "unknown operator: {} {} {}",
        left.type_name(),
        operator,
        right.type_name()
    ))
}

fn eval_index(left: Value, index: Value) -> EvalResult<Value> {
    match (&left, &index) {
        (Value::Array(elements), Value::Integer(i)) => Ok(usize::try_from(*i)
            .ok()
            .and_then(|i| elements.get(i))
            .cloned()
            .unwrap_or(NULL)),

        (Value::Array(_), other) => {
            error(format!("index must be INTEGER, got {}", other.type_name()))
        }

        (other, _) => error(format!(
            "index operator not supported: {}",
            other.type_name()
        )),
    }
}
