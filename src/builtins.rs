//! The fixed table of native functions.
//!
//! Builtins are resolved by name only after the environment chain has been
//! searched, so a user binding with the same name takes priority.

use std::fmt;
use std::io::Write;

use log::debug;
use phf::phf_map;

use crate::value::{Value, NULL};

/// Native implementation: arguments plus the `print` sink.
type BuiltinFn = fn(&[Value], &mut dyn Write) -> Result<Value, String>;

/// How many arguments a builtin accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Arity {
    Exactly(usize),
    Between(usize, usize),
}

impl Arity {
    fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exactly(want) => n == want,
            Arity::Between(lo, hi) => (lo..=hi).contains(&n),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exactly(n) => write!(f, "{}", n),
            Arity::Between(lo, hi) => write!(f, "{} or {}", lo, hi),
        }
    }
}

/// A native function value.
#[derive(Clone, Copy)]
pub struct Builtin {
    name: &'static str,
    arity: Arity,
    func: BuiltinFn,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

static BUILTINS: phf::Map<&'static str, Builtin> = phf_map! {
    "len"   => Builtin { name: "len",   arity: Arity::Exactly(1),    func: len },
    "first" => Builtin { name: "first", arity: Arity::Exactly(1),    func: first },
    "last"  => Builtin { name: "last",  arity: Arity::Exactly(1),    func: last },
    "rest"  => Builtin { name: "rest",  arity: Arity::Exactly(1),    func: rest },
    "push"  => Builtin { name: "push",  arity: Arity::Exactly(2),    func: push },
    "pop"   => Builtin { name: "pop",   arity: Arity::Exactly(1),    func: pop },
    "bool"  => Builtin { name: "bool",  arity: Arity::Exactly(1),    func: to_bool },
    "print" => Builtin { name: "print", arity: Arity::Between(0, 1), func: print },
};

/// Find a builtin by name.
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.get(name).copied()
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check the argument count, then run the native function.
    pub fn call(&self, args: &[Value], out: &mut dyn Write) -> Result<Value, String> {
        debug!("Calling builtin '{}' with {} argument(s)", self.name, args.len());

        if !self.arity.accepts(args.len()) {
            return Err(format!(
                "wrong number of arguments. got={}, want={}",
                args.len(),
                self.arity
            ));
        }

        (self.func)(args, out)
    }
}

// ───────────────────────────── implementations ─────────────────────────────

fn array_arg<'v>(name: &str, arg: &'v Value) -> Result<&'v [Value], String> {
    match arg {
        Value::Array(elements) => Ok(elements.as_slice()),
        other => Err(format!(
            "argument to `{}` must be ARRAY, got {}",
            name,
            other.type_name()
        )),
    }
}

fn len(args: &[Value], _out: &mut dyn Write) -> Result<Value, String> {
    match &args[0] {
        Value::String(s) => Ok(Value::Integer(s.len() as i64)),
        other => Err(format!(
            "argument to `len` not supported, got {}",
            other.type_name()
        )),
    }
}

fn first(args: &[Value], _out: &mut dyn Write) -> Result<Value, String> {
    let elements = array_arg("first", &args[0])?;

    Ok(elements.first().cloned().unwrap_or(NULL))
}

fn last(args: &[Value], _out: &mut dyn Write) -> Result<Value, String> {
    let elements = array_arg("last", &args[0])?;

    Ok(elements.last().cloned().unwrap_or(NULL))
}

fn rest(args: &[Value], _out: &mut dyn Write) -> Result<Value, String> {
    match array_arg("rest", &args[0])? {
        [] => Ok(NULL),
        [_, tail @ ..] => Ok(Value::array(tail.to_vec())),
    }
}

fn push(args: &[Value], _out: &mut dyn Write) -> Result<Value, String> {
    let elements = array_arg("push", &args[0])?;

    let mut pushed = Vec::with_capacity(elements.len() + 1);
    pushed.extend_from_slice(elements);
    pushed.push(args[1].clone());

    Ok(Value::array(pushed))
}

fn pop(args: &[Value], _out: &mut dyn Write) -> Result<Value, String> {
    match array_arg("pop", &args[0])? {
        [] => Ok(NULL),
        [init @ .., _] => Ok(Value::array(init.to_vec())),
    }
}

fn to_bool(args: &[Value], _out: &mut dyn Write) -> Result<Value, String> {
    Ok(Value::Boolean(args[0].is_truthy()))
}

fn print(args: &[Value], out: &mut dyn Write) -> Result<Value, String> {
    let written = match args.first() {
        Some(value) => writeln!(out, "{}", value),
        None => writeln!(out),
    };

    written.map_err(|e| format!("print failed: {}", e))?;

    Ok(NULL)
}
