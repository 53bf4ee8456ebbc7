use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use frontend::ast::{Expr, FunctionDecl, Stmt, StmtKind};

use super::interp_errors::RuntimeError;
use super::{Interpreter, Interrupt};
use crate::environment::Environment;
use crate::values::callable::LoxFunction;
use crate::values::class::LoxClass;
use crate::values::RuntimeVal;

impl Interpreter {
    pub(super) fn execute(&mut self, stmt: &Stmt) -> Result<(), Interrupt> {
        match &stmt.kind {
            StmtKind::Expression { expr } => {
                self.evaluate(expr)?;
                Ok(())
            }
            StmtKind::Print { expr } => {
                let value = self.evaluate(expr)?;
                println!("{}", value);
                Ok(())
            }
            StmtKind::VarDeclaration { name, initializer } => {
                match initializer {
                    Some(initializer) => {
                        let value = self.evaluate(initializer)?;
                        self.environment.borrow_mut().define(name.clone(), value);
                    }
                    // Declared but unusable until assigned
                    None => self
                        .environment
                        .borrow_mut()
                        .define_uninitialized(name.clone()),
                }

                Ok(())
            }
            StmtKind::Block { statements } => {
                let scope = Environment::with_parent(Rc::clone(&self.environment));
                self.execute_block(statements, Rc::new(RefCell::new(scope)))
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            StmtKind::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    self.execute(body)?;
                }

                Ok(())
            }
            StmtKind::FnDeclaration { declaration } => {
                // The closure snapshots the scope at declaration time
                let function = LoxFunction::new(
                    Rc::clone(declaration),
                    Rc::clone(&self.environment),
                    false,
                );

                self.environment
                    .borrow_mut()
                    .define(declaration.name.clone(), RuntimeVal::Function(Rc::new(function)));

                Ok(())
            }
            StmtKind::Return { value } => {
                let value = match value {
                    Some(value) => self.evaluate(value)?,
                    None => RuntimeVal::Nil,
                };

                // Unwinds up to the nearest function call boundary
                Err(Interrupt::Return(value))
            }
            StmtKind::ClassDeclaration {
                name,
                superclass,
                methods,
            } => self.execute_class_declaration(name, superclass.as_ref(), methods),
        }
    }

    fn execute_class_declaration(
        &mut self,
        name: &str,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<(), Interrupt> {
        let superclass = match superclass {
            Some(superclass_expr) => match self.evaluate(superclass_expr)? {
                RuntimeVal::Class(class) => Some(class),
                other => {
                    return Err(Interrupt::Error(RuntimeError::SuperclassNotClass(
                        other.type_name(),
                    )))
                }
            },
            None => None,
        };

        // Two-step binding so methods can refer to the class by name
        self.environment
            .borrow_mut()
            .define_uninitialized(name.to_string());

        // With a superclass, methods close over an extra scope holding
        // 'super'. This mirrors the scope the resolver pushed.
        let method_closure = match &superclass {
            Some(superclass) => {
                let mut scope = Environment::with_parent(Rc::clone(&self.environment));
                scope.define("super".into(), RuntimeVal::Class(Rc::clone(superclass)));
                Rc::new(RefCell::new(scope))
            }
            None => Rc::clone(&self.environment),
        };

        let mut method_map: HashMap<String, LoxFunction> = HashMap::new();
        for method in methods {
            let is_initializer = method.name == "init";
            let function =
                LoxFunction::new(Rc::clone(method), Rc::clone(&method_closure), is_initializer);
            method_map.insert(method.name.clone(), function);
        }

        let class = LoxClass {
            name: name.to_string(),
            superclass,
            methods: method_map,
        };

        self.environment
            .borrow_mut()
            .assign(name, RuntimeVal::Class(Rc::new(class)))
            .map_err(RuntimeError::from)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontend::lexer::Lexer;
    use frontend::parser::Parser;

    use crate::resolver::Resolver;

    // One full pipeline pass on an existing interpreter, the way the
    // interactive driver feeds it line by line
    fn run_with(
        interpreter: &mut Interpreter,
        code: &str,
    ) -> Result<(), tools::errors::Diagnostic> {
        colored::control::set_override(false);

        let mut lexer: Lexer = Default::default();
        lexer.tokenize(code);
        assert!(lexer.errors.is_empty(), "lex errors: {:?}", lexer.errors);

        let mut parser: Parser = Default::default();
        parser.build_ast(lexer.tokens);
        assert!(parser.errors.is_empty(), "parse errors: {:?}", parser.errors);

        let mut resolver = Resolver::new();
        let locals = resolver
            .resolve(&parser.ast_nodes)
            .expect("resolution should succeed");

        interpreter.add_locals(locals);
        interpreter.interpret(&parser.ast_nodes)
    }

    // Full pipeline helper. Programs under test stash results in globals
    // so assertions do not depend on captured stdout.
    fn run(code: &str) -> (Interpreter, Result<(), tools::errors::Diagnostic>) {
        let mut interpreter = Interpreter::new();
        let result = run_with(&mut interpreter, code);
        (interpreter, result)
    }

    fn global(interpreter: &Interpreter, name: &str) -> RuntimeVal {
        interpreter
            .globals
            .borrow()
            .get(name)
            .unwrap_or_else(|e| panic!("global {name}: {e}"))
    }

    fn run_ok(code: &str) -> Interpreter {
        let (interpreter, result) = run(code);
        result.expect("program should run");
        interpreter
    }

    fn run_err(code: &str) -> String {
        let (_, result) = run(code);
        result.expect_err("program should fail").message().to_string()
    }

    #[test]
    fn arithmetic_and_precedence() {
        let interp = run_ok("var a = 1 + 2 * 3 - (4 - 1) / 2;");
        assert_eq!(global(&interp, "a"), RuntimeVal::Number(5.5));
    }

    #[test]
    fn string_concatenation() {
        let interp = run_ok("var a = \"count: \" + 3;");
        assert_eq!(global(&interp, "a"), RuntimeVal::Str("count: 3".into()));
    }

    #[test]
    fn uninitialized_variable_read_fails() {
        let message = run_err("var a; var b = a + 1;");
        assert!(message.contains("Attempt to use uninitialized variable: a."));
        assert!(message.contains("Runtime error"));
    }

    #[test]
    fn uninitialized_variable_can_be_assigned_first() {
        let interp = run_ok("var a; a = 2; var b = a;");
        assert_eq!(global(&interp, "b"), RuntimeVal::Number(2.));
    }

    #[test]
    fn undefined_variable_fails() {
        let message = run_err("var a = ghost;");
        assert!(message.contains("Undefined variable: ghost."));
    }

    #[test]
    fn blocks_shadow_and_restore() {
        let interp = run_ok(
            "var a = 1;
             var observed = 0;
             {
                 var a = 2;
                 observed = a;
             }
             var after = a;",
        );
        assert_eq!(global(&interp, "observed"), RuntimeVal::Number(2.));
        assert_eq!(global(&interp, "after"), RuntimeVal::Number(1.));
    }

    #[test]
    fn if_else_branches() {
        let interp = run_ok(
            "var r = 0;
             if (1 < 2) r = 1; else r = 2;
             var s = 0;
             if (nil) s = 1; else s = 2;",
        );
        assert_eq!(global(&interp, "r"), RuntimeVal::Number(1.));
        assert_eq!(global(&interp, "s"), RuntimeVal::Number(2.));
    }

    #[test]
    fn logical_operators_return_operands() {
        let interp = run_ok(
            "var a = nil or \"fallback\";
             var b = 1 and 2;
             var c = false and boom();",
        );
        assert_eq!(global(&interp, "a"), RuntimeVal::Str("fallback".into()));
        assert_eq!(global(&interp, "b"), RuntimeVal::Number(2.));
        // The right side of c never ran, boom is not even defined
        assert_eq!(global(&interp, "c"), RuntimeVal::Bool(false));
    }

    #[test]
    fn while_loop_runs() {
        let interp = run_ok(
            "var sum = 0;
             var i = 0;
             while (i < 5) {
                 sum = sum + i;
                 i = i + 1;
             }",
        );
        assert_eq!(global(&interp, "sum"), RuntimeVal::Number(10.));
    }

    #[test]
    fn for_loop_desugars_and_runs() {
        let interp = run_ok(
            "var sum = 0;
             for (var i = 1; i <= 4; i = i + 1) sum = sum + i;",
        );
        assert_eq!(global(&interp, "sum"), RuntimeVal::Number(10.));
    }

    #[test]
    fn function_call_and_return() {
        let interp = run_ok(
            "fun add(a, b) { return a + b; }
             var r = add(2, 3);",
        );
        assert_eq!(global(&interp, "r"), RuntimeVal::Number(5.));
    }

    #[test]
    fn function_without_return_yields_nil() {
        let interp = run_ok(
            "fun noop() {}
             var r = noop();",
        );
        assert_eq!(global(&interp, "r"), RuntimeVal::Nil);
    }

    #[test]
    fn return_unwinds_nested_blocks_only_to_the_call() {
        let interp = run_ok(
            "fun find() {
                 while (true) {
                     { return \"found\"; }
                 }
             }
             var r = find();",
        );
        assert_eq!(global(&interp, "r"), RuntimeVal::Str("found".into()));
    }

    #[test]
    fn recursion() {
        let interp = run_ok(
            "fun fib(n) {
                 if (n < 2) return n;
                 return fib(n - 1) + fib(n - 2);
             }
             var r = fib(10);",
        );
        assert_eq!(global(&interp, "r"), RuntimeVal::Number(55.));
    }

    #[test]
    fn closures_capture_their_environment() {
        let interp = run_ok(
            "fun make_counter() {
                 var count = 0;
                 fun increment() {
                     count = count + 1;
                     return count;
                 }
                 return increment;
             }
             var counter = make_counter();
             counter();
             counter();
             var r = counter();",
        );
        assert_eq!(global(&interp, "r"), RuntimeVal::Number(3.));
    }

    #[test]
    fn two_closures_do_not_share_counters() {
        let interp = run_ok(
            "fun make_counter() {
                 var count = 0;
                 fun increment() {
                     count = count + 1;
                     return count;
                 }
                 return increment;
             }
             var a = make_counter();
             var b = make_counter();
             a();
             var ra = a();
             var rb = b();",
        );
        assert_eq!(global(&interp, "ra"), RuntimeVal::Number(2.));
        assert_eq!(global(&interp, "rb"), RuntimeVal::Number(1.));
    }

    #[test]
    fn closures_see_the_binding_not_a_copy() {
        // The classic counterexample for environments resolved too late
        let interp = run_ok(
            "var a = \"global\";
             var first = nil;
             var second = nil;
             {
                 fun read() { return a; }
                 first = read();
                 var a = \"block\";
                 second = read();
             }",
        );
        assert_eq!(global(&interp, "first"), RuntimeVal::Str("global".into()));
        assert_eq!(global(&interp, "second"), RuntimeVal::Str("global".into()));
    }

    #[test]
    fn calling_a_non_callable_fails() {
        let message = run_err("var x = 1; x();");
        assert!(message.contains("Object of type 'number' is not callable."));
    }

    #[test]
    fn arity_mismatch_fails() {
        let message = run_err("fun f(a) {} f(1, 2);");
        assert!(message.contains("Invalid argument count, expected: 1, got: 2."));
    }

    #[test]
    fn class_instantiation_and_fields() {
        let interp = run_ok(
            "class Point {}
             var p = Point();
             p.x = 3;
             p.y = 4;
             var r = p.x + p.y;",
        );
        assert_eq!(global(&interp, "r"), RuntimeVal::Number(7.));
    }

    #[test]
    fn methods_bind_this() {
        let interp = run_ok(
            "class Greeter {
                 init(name) { this.name = name; }
                 greet() { return \"hi \" + this.name; }
             }
             var r = Greeter(\"lox\").greet();",
        );
        assert_eq!(global(&interp, "r"), RuntimeVal::Str("hi lox".into()));
    }

    #[test]
    fn detached_method_keeps_this() {
        let interp = run_ok(
            "class Cake {
                 flavor() { return this.kind; }
             }
             var cake = Cake();
             cake.kind = \"chocolate\";
             var flavor = cake.flavor;
             var r = flavor();",
        );
        assert_eq!(global(&interp, "r"), RuntimeVal::Str("chocolate".into()));
    }

    #[test]
    fn fields_shadow_methods() {
        let interp = run_ok(
            "class Thing {
                 label() { return \"method\"; }
             }
             var t = Thing();
             t.label = \"field\";
             var r = t.label;",
        );
        assert_eq!(global(&interp, "r"), RuntimeVal::Str("field".into()));
    }

    #[test]
    fn init_returns_the_instance_even_explicitly() {
        let interp = run_ok(
            "class Early {
                 init() {
                     this.done = true;
                     return;
                     this.done = false;
                 }
             }
             var e = Early();
             var r = e.done;",
        );
        assert_eq!(global(&interp, "r"), RuntimeVal::Bool(true));
    }

    #[test]
    fn calling_init_again_returns_the_same_instance() {
        let interp = run_ok(
            "class A { init() { this.n = 1; } }
             var a = A();
             var b = a.init();
             var same = a == b;",
        );
        assert_eq!(global(&interp, "same"), RuntimeVal::Bool(true));
    }

    #[test]
    fn undefined_property_fails() {
        let message = run_err("class A {} var a = A(); a.missing;");
        assert!(message.contains("Undefined property: missing."));
    }

    #[test]
    fn property_on_non_instance_fails() {
        let message = run_err("var x = 1; x.field;");
        assert!(message.contains("Only instances have properties"));
    }

    #[test]
    fn inherited_methods_are_found() {
        let interp = run_ok(
            "class Animal {
                 speak() { return \"...\"; }
             }
             class Dog < Animal {}
             var r = Dog().speak();",
        );
        assert_eq!(global(&interp, "r"), RuntimeVal::Str("...".into()));
    }

    #[test]
    fn overriding_wins_and_super_reaches_up() {
        let interp = run_ok(
            "class Animal {
                 speak() { return \"...\"; }
             }
             class Dog < Animal {
                 speak() { return \"woof \" + super.speak(); }
             }
             var r = Dog().speak();",
        );
        assert_eq!(global(&interp, "r"), RuntimeVal::Str("woof ...".into()));
    }

    #[test]
    fn super_binds_statically_not_dynamically() {
        // C inherits B's method, but super inside B must still mean A
        let interp = run_ok(
            "class A { name() { return \"A\"; } }
             class B < A { name() { return \"B>\" + super.name(); } }
             class C < B {}
             var r = C().name();",
        );
        assert_eq!(global(&interp, "r"), RuntimeVal::Str("B>A".into()));
    }

    #[test]
    fn inherited_init_runs_on_subclass_instances() {
        let interp = run_ok(
            "class Base { init(v) { this.v = v; } }
             class Derived < Base {}
             var r = Derived(41).v + 1;",
        );
        assert_eq!(global(&interp, "r"), RuntimeVal::Number(42.));
    }

    #[test]
    fn superclass_must_be_a_class() {
        let message = run_err("var NotAClass = 1; class A < NotAClass {}");
        assert!(message.contains("Superclass must be a class"));
    }

    #[test]
    fn class_equality_is_identity() {
        let interp = run_ok(
            "class A {}
             var x = A();
             var y = A();
             var same = x == x;
             var different = x == y;",
        );
        assert_eq!(global(&interp, "same"), RuntimeVal::Bool(true));
        assert_eq!(global(&interp, "different"), RuntimeVal::Bool(false));
    }

    #[test]
    fn resolved_depths_survive_across_separate_runs() {
        let mut interpreter = Interpreter::new();

        // Each line goes through its own lexer, parser and resolver, but
        // the closure defined on the first line must keep its depths when
        // later lines merge fresh tables into the same interpreter
        run_with(
            &mut interpreter,
            "fun make() {
                 var n = 0;
                 fun inc() {
                     n = n + 1;
                     return n;
                 }
                 return inc;
             }",
        )
        .expect("definition line should run");
        run_with(&mut interpreter, "var c = make();").expect("line should run");
        run_with(&mut interpreter, "c();").expect("line should run");
        run_with(&mut interpreter, "var r = c();").expect("line should run");

        assert_eq!(global(&interpreter, "r"), RuntimeVal::Number(2.));
    }

    #[test]
    fn error_inside_a_block_still_restores_the_global_scope() {
        let mut interpreter = Interpreter::new();

        let result = run_with(
            &mut interpreter,
            "var a = 1;
             {
                 var local = 2;
                 a = local;
                 var bad = -\"oops\";
             }",
        );
        assert!(result.is_err());

        // The failed block was popped on the way out: globals are reachable
        // again and the block's local is gone
        run_with(&mut interpreter, "var r = a + 1;").expect("globals should still work");
        assert_eq!(global(&interpreter, "r"), RuntimeVal::Number(3.));

        let message = run_with(&mut interpreter, "print local;")
            .expect_err("the block local should not have leaked")
            .message()
            .to_string();
        assert!(message.contains("Undefined variable: local."));
    }

    #[test]
    fn clock_is_predefined() {
        let interp = run_ok("var t = clock(); var positive = t > 0;");
        assert_eq!(global(&interp, "positive"), RuntimeVal::Bool(true));
    }

    #[test]
    fn runtime_error_reports_the_statement_range() {
        let message = run_err("var a = 1;\nvar b = -\"oops\";");
        assert!(message.starts_with("[2:1-16]"), "got: {message}");
        assert!(message.contains("Unable to perform '-' on operand of type 'string'."));
    }
}
