//! Interactive read-eval-print loop over any reader/writer pair.

use std::io::{BufRead, Write};

use log::{debug, info};

use crate::ast::Statement;
use crate::environment::Environment;
use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::parser;

pub const PROMPT: &str = ">> ";

/// Read programs line by line until `input` is exhausted. All lines share one
/// global environment; errors are reported and the loop carries on.
pub fn start<R: BufRead, W: Write>(mut input: R, mut output: W) -> Result<()> {
    info!("Starting REPL");

    let env = Environment::new_global();
    let mut line = String::new();

    loop {
        write!(output, "{}", PROMPT)?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(output)?;
            break;
        }

        if line.trim().is_empty() {
            continue;
        }

        let program = match parser::parse(&line) {
            Ok(program) => program,
            Err(errors) => {
                for e in &errors {
                    writeln!(output, "\t{}", e)?;
                }
                continue;
            }
        };

        let value = Interpreter::with_output(&mut output).evaluate(&program, &env);
        debug!("REPL line evaluated to: {}", value);

        let declared = matches!(program.statements.last(), Some(Statement::Let { .. }));
        if value.is_error() || !declared {
            writeln!(output, "{}", value)?;
        }
    }

    info!("REPL finished");
    Ok(())
}
