pub mod ast;
pub mod builtins;
pub mod environment;
pub mod error;
pub mod frame;
pub mod interpreter;
pub mod parser;
pub mod repl;
pub mod scanner;
pub mod token;
pub mod value;
