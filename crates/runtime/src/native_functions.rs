use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use super::values::callable::NativeFunction;
use super::values::RuntimeVal;

#[derive(Debug, PartialEq, Error)]
pub enum NativeFnError {
    #[error("Function {0}: expected {1} arguments, found {2}")]
    WrongArgNumber(&'static str, usize, usize),
}

/// Seconds since the Unix epoch, as a number value. Enough to benchmark
/// interpreted code by subtracting two reads.
pub fn clock_value() -> RuntimeVal {
    RuntimeVal::NativeFunction(Rc::new(NativeFunction {
        name: "clock",
        arity: 0,
        func: native_clock,
    }))
}

fn native_clock(args: &[RuntimeVal]) -> Result<RuntimeVal, NativeFnError> {
    check_args_number("clock", args, 0)?;

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    Ok(RuntimeVal::Number(now.as_secs_f64()))
}

// --------
// Helpers
// --------
fn check_args_number(
    fn_name: &'static str,
    args: &[RuntimeVal],
    nb_expected: usize,
) -> Result<(), NativeFnError> {
    if args.len() != nb_expected {
        return Err(NativeFnError::WrongArgNumber(
            fn_name,
            nb_expected,
            args.len(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_returns_a_number() {
        let value = native_clock(&[]).unwrap();
        assert!(matches!(value, RuntimeVal::Number(n) if n > 0.));
    }

    #[test]
    fn clock_rejects_arguments() {
        let result = native_clock(&[RuntimeVal::Nil]);
        assert_eq!(result, Err(NativeFnError::WrongArgNumber("clock", 0, 1)));
    }
}
