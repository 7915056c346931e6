//! Runtime values of the Monkey language.
//!
//! `Value` is a closed set of variants. Heap-backed variants (arrays,
//! functions, compiled functions) sit behind `Rc` so cloning a value never
//! deep-copies, and two values can be compared by identity.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::ast::Block;
use crate::builtins::Builtin;
use crate::environment::Environment;

/// A user-defined function closed over the scope it was created in.
pub struct Function {
    pub parameters: Vec<String>,
    pub body: Rc<Block>,
    /// The defining scope itself, shared, never a copy.
    pub env: Rc<RefCell<Environment>>,
}

// The captured scope usually holds this very function, so it stays out of
// the debug output.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// A function lowered to bytecode by the alternate backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompiledFunction {
    pub instructions: Vec<u8>,
    pub num_locals: usize,
    pub num_parameters: usize,
}

#[derive(Debug, Clone)]
pub enum Value {
    Integer(i64),
    Boolean(bool),
    String(String),
    /// Immutable once built; "mutating" builtins return a fresh array.
    Array(Rc<Vec<Value>>),
    Null,
    Function(Rc<Function>),
    Builtin(Builtin),
    CompiledFunction(Rc<CompiledFunction>),
    Error(String),
}

/// The shared `null` sentinel.
pub const NULL: Value = Value::Null;

impl Value {
    pub fn array(elements: Vec<Value>) -> Self {
        Value::Array(Rc::new(elements))
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Value::Error(message.into())
    }

    /// Upper-case type tag used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::String(_) => "STRING",
            Value::Array(_) => "ARRAY",
            Value::Null => "NULL",
            Value::Function(_) => "FUNCTION",
            Value::Builtin(_) => "BUILTIN",
            Value::CompiledFunction(_) => "COMPILED_FUNCTION",
            Value::Error(_) => "ERROR",
        }
    }

    /// Truthiness used by `!`, `&&`, `||`, `if` and `for`.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Integer(n) => *n != 0,
            Value::Boolean(b) => *b,
            Value::String(s) => !s.is_empty(),
            Value::Array(elements) => !elements.is_empty(),
            Value::Null => false,
            Value::Function(_)
            | Value::Builtin(_)
            | Value::CompiledFunction(_)
            | Value::Error(_) => true,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }
}

impl PartialEq for Value {
    /// Scalars compare structurally, heap values by identity. Errors are
    /// never equal to anything.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Builtin(a), Value::Builtin(b)) => a.name() == b.name(),
            (Value::CompiledFunction(a), Value::CompiledFunction(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => {
                let mut buf = itoa::Buffer::new();
                f.write_str(buf.format(*n))
            }

            Value::Boolean(b) => write!(f, "{}", b),

            Value::String(s) => f.write_str(s),

            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, "]")
            }

            Value::Null => write!(f, "null"),

            Value::Function(func) => {
                write!(f, "fn({}) {{\n{}\n}}", func.parameters.join(", "), func.body)
            }

            Value::Builtin(builtin) => write!(f, "builtin function {}", builtin.name()),

            Value::CompiledFunction(func) => {
                write!(f, "CompiledFunction[{} bytes]", func.instructions.len())
            }

            Value::Error(message) => write!(f, "ERROR: {}", message),
        }
    }
}
