mod expr;
pub mod interp_errors;
mod stmt;

use std::cell::RefCell;
use std::rc::Rc;

use tools::errors::{Diagnostic, ReportDiag};

use self::interp_errors::RuntimeError;

use super::environment::Environment;
use super::native_functions::clock_value;
use super::resolver::Locals;
use super::values::RuntimeVal;
use frontend::ast::Stmt;

/// Non-local exit bubbling out of statement execution. Only a function
/// call boundary catches `Return`; everything else propagates both
/// variants untouched with `?`.
#[derive(Debug)]
pub enum Interrupt {
    Error(RuntimeError),
    Return(RuntimeVal),
}

impl From<RuntimeError> for Interrupt {
    fn from(err: RuntimeError) -> Self {
        Interrupt::Error(err)
    }
}

pub struct Interpreter {
    pub globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: Locals,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Rc::new(RefCell::new(Environment::new()));
        globals.borrow_mut().define("clock".into(), clock_value());

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: Locals::new(),
        }
    }

    /// Merges freshly resolved depths into the table. Merging rather than
    /// replacing keeps entries from earlier REPL lines valid for closures
    /// that still point at them.
    pub fn add_locals(&mut self, locals: Locals) {
        self.locals.extend(locals);
    }

    /// Runs a resolved program. The first runtime error stops execution,
    /// side effects already performed stay.
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<(), Diagnostic> {
        for stmt in statements {
            self.execute(stmt).map_err(|interrupt| match interrupt {
                Interrupt::Error(e) => e.to_runtime_diagnostic(stmt.range),
                Interrupt::Return(_) => {
                    unreachable!("top-level return slipped past the resolver")
                }
            })?;
        }

        Ok(())
    }

    /// Runs statements in the given scope, restoring the previous scope
    /// on every exit path. Function calls and blocks both go through
    /// here.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        environment: Rc<RefCell<Environment>>,
    ) -> Result<(), Interrupt> {
        let previous = std::mem::replace(&mut self.environment, environment);
        let result = statements.iter().try_for_each(|stmt| self.execute(stmt));
        self.environment = previous;

        result
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
