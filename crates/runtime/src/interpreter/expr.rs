use std::rc::Rc;

use frontend::ast::{Expr, ExprId, ExprKind, Operator};

use super::interp_errors::RuntimeError;
use super::Interpreter;
use crate::values::callable::Callable;
use crate::values::class::{Instance, LoxClass};
use crate::values::RuntimeVal;

impl Interpreter {
    pub(super) fn evaluate(&mut self, expr: &Expr) -> Result<RuntimeVal, RuntimeError> {
        match &expr.kind {
            ExprKind::BoolLiteral { value } => Ok(RuntimeVal::Bool(*value)),
            ExprKind::NumberLiteral { value } => Ok(RuntimeVal::Number(*value)),
            ExprKind::StrLiteral { value } => Ok(RuntimeVal::Str(value.clone())),
            ExprKind::NilLiteral => Ok(RuntimeVal::Nil),
            ExprKind::Grouping { expr } => self.evaluate(expr),
            ExprKind::Unary { operator, right } => {
                let right = self.evaluate(right)?;

                match operator {
                    Operator::Bang => Ok(RuntimeVal::Bool(!right.is_truthy())),
                    Operator::Minus => match right {
                        RuntimeVal::Number(value) => Ok(RuntimeVal::Number(-value)),
                        other => Err(RuntimeError::InvalidOperandType {
                            operator: *operator,
                            operand: other.type_name(),
                        }),
                    },
                    _ => unreachable!("only '!' and '-' parse as unary operators"),
                }
            }
            ExprKind::Binary {
                operator,
                left,
                right,
            } => {
                let lhs = self.evaluate(left)?;
                let rhs = self.evaluate(right)?;

                binary_op(*operator, lhs, rhs)
            }
            ExprKind::Logical {
                operator,
                left,
                right,
            } => {
                // Short-circuit, yielding the deciding operand itself
                // rather than a bool
                let lhs = self.evaluate(left)?;

                match operator {
                    Operator::And if !lhs.is_truthy() => Ok(lhs),
                    Operator::Or if lhs.is_truthy() => Ok(lhs),
                    _ => self.evaluate(right),
                }
            }
            ExprKind::Variable { name } => self.look_up_variable(name, expr.id),
            ExprKind::Assign { name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(&expr.id) {
                    Some(depth) => {
                        self.environment
                            .borrow_mut()
                            .assign_at(name, value.clone(), *depth)?;
                    }
                    None => {
                        self.globals.borrow_mut().assign(name, value.clone())?;
                    }
                }

                // Assignment is an expression, chaining needs the value
                Ok(value)
            }
            ExprKind::Call { callee, arguments } => {
                let callee = self.evaluate(callee)?;

                let mut args: Vec<RuntimeVal> = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                self.call_value(callee, args)
            }
            ExprKind::Get { object, name } => match self.evaluate(object)? {
                RuntimeVal::Instance(instance) => Instance::get(&instance, name),
                other => Err(RuntimeError::PropertyOnNonInstance(other.type_name())),
            },
            ExprKind::Set {
                object,
                name,
                value,
            } => match self.evaluate(object)? {
                RuntimeVal::Instance(instance) => {
                    let value = self.evaluate(value)?;
                    instance.borrow_mut().set(name.clone(), value.clone());
                    Ok(value)
                }
                other => Err(RuntimeError::FieldOnNonInstance(other.type_name())),
            },
            ExprKind::This => self.look_up_variable("this", expr.id),
            ExprKind::Super { method } => self.evaluate_super(expr.id, method),
        }
    }

    fn look_up_variable(&self, name: &str, id: ExprId) -> Result<RuntimeVal, RuntimeError> {
        let value = match self.locals.get(&id) {
            Some(depth) => self.environment.borrow().get_at(name, *depth)?,
            // Not in the table means global
            None => self.globals.borrow().get(name)?,
        };

        Ok(value)
    }

    // The resolver guarantees a depth for every super expression, and the
    // class statement guarantees 'this' one scope below 'super'
    fn evaluate_super(&mut self, id: ExprId, method: &str) -> Result<RuntimeVal, RuntimeError> {
        let depth = *self
            .locals
            .get(&id)
            .expect("'super' expression without a resolved depth");

        let superclass = self.environment.borrow().get_at("super", depth)?;
        let instance = self.environment.borrow().get_at("this", depth - 1)?;

        let (RuntimeVal::Class(superclass), RuntimeVal::Instance(instance)) =
            (superclass, instance)
        else {
            unreachable!("'super' and 'this' are interpreter-managed bindings");
        };

        match superclass.find_method(method) {
            Some(found) => Ok(RuntimeVal::Function(Rc::new(found.bind(instance)))),
            None => Err(RuntimeError::UndefinedProperty(method.into())),
        }
    }

    fn call_value(
        &mut self,
        callee: RuntimeVal,
        args: Vec<RuntimeVal>,
    ) -> Result<RuntimeVal, RuntimeError> {
        match callee {
            RuntimeVal::Function(function) => {
                check_arity(function.arity(), args.len())?;
                function.call(self, args)
            }
            RuntimeVal::NativeFunction(function) => {
                check_arity(function.arity(), args.len())?;
                function.call(self, args)
            }
            RuntimeVal::Class(class) => {
                check_arity(class.arity(), args.len())?;
                LoxClass::instantiate(&class, self, args)
            }
            other => Err(RuntimeError::NotCallable(other.type_name())),
        }
    }
}

fn check_arity(expected: usize, actual: usize) -> Result<(), RuntimeError> {
    if expected != actual {
        return Err(RuntimeError::InvalidArgumentCount { expected, actual });
    }

    Ok(())
}

fn binary_op(
    operator: Operator,
    lhs: RuntimeVal,
    rhs: RuntimeVal,
) -> Result<RuntimeVal, RuntimeError> {
    match operator {
        // '+' adds numbers, but one string operand turns the whole thing
        // into concatenation. A nil operand next to a string poisons the
        // result to nil instead of erroring.
        Operator::Plus => match (&lhs, &rhs) {
            (RuntimeVal::Number(l), RuntimeVal::Number(r)) => Ok(RuntimeVal::Number(l + r)),
            _ if matches!(lhs, RuntimeVal::Str(_)) || matches!(rhs, RuntimeVal::Str(_)) => {
                if matches!(lhs, RuntimeVal::Nil) || matches!(rhs, RuntimeVal::Nil) {
                    return Ok(RuntimeVal::Nil);
                }

                Ok(RuntimeVal::Str(format!("{}{}", lhs, rhs)))
            }
            _ => Err(RuntimeError::InvalidOperandTypes {
                operator,
                left: lhs.type_name(),
                right: rhs.type_name(),
            }),
        },
        Operator::Minus | Operator::Star | Operator::Slash => {
            let (l, r) = number_operands(operator, &lhs, &rhs)?;

            let result = match operator {
                Operator::Minus => l - r,
                Operator::Star => l * r,
                // Division by zero follows IEEE 754 and yields infinity
                _ => l / r,
            };

            Ok(RuntimeVal::Number(result))
        }
        Operator::Greater | Operator::GreaterEqual | Operator::Less | Operator::LessEqual => {
            let (l, r) = number_operands(operator, &lhs, &rhs)?;

            let result = match operator {
                Operator::Greater => l > r,
                Operator::GreaterEqual => l >= r,
                Operator::Less => l < r,
                _ => l <= r,
            };

            Ok(RuntimeVal::Bool(result))
        }
        Operator::EqualEqual => Ok(RuntimeVal::Bool(lhs == rhs)),
        Operator::BangEqual => Ok(RuntimeVal::Bool(lhs != rhs)),
        _ => unreachable!("logical operators never reach binary evaluation"),
    }
}

fn number_operands(
    operator: Operator,
    lhs: &RuntimeVal,
    rhs: &RuntimeVal,
) -> Result<(f64, f64), RuntimeError> {
    match (lhs, rhs) {
        (RuntimeVal::Number(l), RuntimeVal::Number(r)) => Ok((*l, *r)),
        (RuntimeVal::Number(_), other) | (other, _) => Err(RuntimeError::InvalidOperandType {
            operator,
            operand: other.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(operator: Operator, lhs: RuntimeVal, rhs: RuntimeVal) -> Result<RuntimeVal, RuntimeError> {
        binary_op(operator, lhs, rhs)
    }

    #[test]
    fn add_numbers() {
        assert_eq!(
            eval(Operator::Plus, RuntimeVal::Number(1.), RuntimeVal::Number(2.)),
            Ok(RuntimeVal::Number(3.))
        );
    }

    #[test]
    fn add_string_and_number_concatenates() {
        assert_eq!(
            eval(
                Operator::Plus,
                RuntimeVal::Str("a".into()),
                RuntimeVal::Number(1.)
            ),
            Ok(RuntimeVal::Str("a1".into()))
        );
        assert_eq!(
            eval(
                Operator::Plus,
                RuntimeVal::Number(1.),
                RuntimeVal::Str("a".into())
            ),
            Ok(RuntimeVal::Str("1a".into()))
        );
    }

    #[test]
    fn add_string_and_bool_concatenates() {
        assert_eq!(
            eval(
                Operator::Plus,
                RuntimeVal::Str("is ".into()),
                RuntimeVal::Bool(true)
            ),
            Ok(RuntimeVal::Str("is true".into()))
        );
    }

    #[test]
    fn add_string_and_nil_poisons_to_nil() {
        assert_eq!(
            eval(Operator::Plus, RuntimeVal::Str("a".into()), RuntimeVal::Nil),
            Ok(RuntimeVal::Nil)
        );
        assert_eq!(
            eval(Operator::Plus, RuntimeVal::Nil, RuntimeVal::Str("a".into())),
            Ok(RuntimeVal::Nil)
        );
    }

    #[test]
    fn add_mismatched_types_errors() {
        assert_eq!(
            eval(Operator::Plus, RuntimeVal::Number(1.), RuntimeVal::Bool(true)),
            Err(RuntimeError::InvalidOperandTypes {
                operator: Operator::Plus,
                left: "number",
                right: "bool",
            })
        );
    }

    #[test]
    fn arithmetic_requires_numbers() {
        assert_eq!(
            eval(
                Operator::Star,
                RuntimeVal::Str("a".into()),
                RuntimeVal::Number(2.)
            ),
            Err(RuntimeError::InvalidOperandType {
                operator: Operator::Star,
                operand: "string",
            })
        );
    }

    #[test]
    fn division_by_zero_is_infinite() {
        let result = eval(
            Operator::Slash,
            RuntimeVal::Number(1.),
            RuntimeVal::Number(0.),
        );
        assert!(matches!(result, Ok(RuntimeVal::Number(n)) if n.is_infinite()));
    }

    #[test]
    fn comparisons() {
        assert_eq!(
            eval(Operator::Less, RuntimeVal::Number(1.), RuntimeVal::Number(2.)),
            Ok(RuntimeVal::Bool(true))
        );
        assert_eq!(
            eval(
                Operator::GreaterEqual,
                RuntimeVal::Number(2.),
                RuntimeVal::Number(2.)
            ),
            Ok(RuntimeVal::Bool(true))
        );
    }

    #[test]
    fn equality_never_errors() {
        assert_eq!(
            eval(
                Operator::EqualEqual,
                RuntimeVal::Number(1.),
                RuntimeVal::Str("1".into())
            ),
            Ok(RuntimeVal::Bool(false))
        );
        assert_eq!(
            eval(Operator::BangEqual, RuntimeVal::Nil, RuntimeVal::Bool(false)),
            Ok(RuntimeVal::Bool(true))
        );
    }
}
