use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use frontend::ast::{Expr, ExprId, ExprKind, FunctionDecl, Stmt, StmtKind};
use tools::errors::{Diagnostic, ReportDiag};

#[derive(Error, Debug, PartialEq)]
pub enum ResolverError {
    #[error("Cannot return from top-level code.")]
    TopLevelReturn,

    #[error("Variable '{0}' is already declared in this scope.")]
    VariableAlreadyDeclared(String),

    #[error("Cannot read variable '{0}' in its own initializer.")]
    VariableUsedInOwnInitializer(String),

    #[error("Cannot use 'this' outside of a class.")]
    ThisOutsideClass,

    #[error("Cannot use 'super' outside of a class.")]
    SuperOutsideClass,

    #[error("Cannot use 'super' in a class with no superclass.")]
    SuperWithoutSuperclass,

    #[error("A class cannot inherit from itself.")]
    SelfInheritance,
}

impl ReportDiag for ResolverError {}

/// Lexical depth of every resolved expression, keyed by node identity.
/// The interpreter uses it to jump straight to the right scope.
pub type Locals = HashMap<ExprId, usize>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum VariableState {
    Declared,
    Initialized,
}

#[derive(Debug)]
struct VariableInfo {
    state: VariableState,
    is_used: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum FunctionType {
    None,
    Function,
    Initializer,
    Method,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Static pass between parsing and execution. Walks the tree, computes
/// how many scopes up each variable use lives, and rejects the handful of
/// constructs that only make sense in specific contexts.
///
/// Top-level code runs outside any scope here: names that resolve to no
/// scope are globals and get looked up dynamically at runtime.
pub struct Resolver {
    scopes: Vec<HashMap<String, VariableInfo>>,
    locals: Locals,
    pub warnings: Vec<String>,
    current_function: FunctionType,
    current_class: ClassType,
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            scopes: Vec::new(),
            locals: Locals::new(),
            warnings: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
        }
    }

    /// Fail-fast: the first error wins. Unused-variable warnings are
    /// advisory and pile up in `warnings` without failing the pass.
    pub fn resolve(&mut self, statements: &[Stmt]) -> Result<Locals, Diagnostic> {
        for stmt in statements {
            self.resolve_stmt(stmt)
                .map_err(|e| e.to_diagnostic(stmt.range))?;
        }

        Ok(std::mem::take(&mut self.locals))
    }

    fn resolve_stmts(&mut self, statements: &[Stmt]) -> Result<(), ResolverError> {
        for stmt in statements {
            self.resolve_stmt(stmt)?;
        }

        Ok(())
    }

    fn resolve_stmt(&mut self, stmt: &Stmt) -> Result<(), ResolverError> {
        match &stmt.kind {
            StmtKind::Expression { expr } | StmtKind::Print { expr } => self.resolve_expr(expr),
            StmtKind::VarDeclaration { name, initializer } => {
                // Declared before its initializer runs, so the initializer
                // can be checked for reading the name it defines
                self.declare(name)?;
                if let Some(initializer) = initializer {
                    self.resolve_expr(initializer)?;
                }
                self.define(name);
                Ok(())
            }
            StmtKind::Block { statements } => {
                self.begin_scope();
                let result = self.resolve_stmts(statements);
                self.end_scope();
                result
            }
            StmtKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(then_branch)?;
                if let Some(else_branch) = else_branch {
                    self.resolve_stmt(else_branch)?;
                }
                Ok(())
            }
            StmtKind::While { condition, body } => {
                self.resolve_expr(condition)?;
                self.resolve_stmt(body)
            }
            StmtKind::FnDeclaration { declaration } => {
                // The name is usable inside the body, recursion needs it
                self.declare(&declaration.name)?;
                self.define(&declaration.name);
                self.resolve_function(declaration, FunctionType::Function)
            }
            StmtKind::Return { value } => {
                if self.current_function == FunctionType::None {
                    return Err(ResolverError::TopLevelReturn);
                }
                if let Some(value) = value {
                    self.resolve_expr(value)?;
                }
                Ok(())
            }
            StmtKind::ClassDeclaration {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),
        }
    }

    fn resolve_class(
        &mut self,
        name: &str,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> Result<(), ResolverError> {
        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name)?;
        self.define(name);

        if let Some(superclass_expr) = superclass {
            if let ExprKind::Variable {
                name: superclass_name,
            } = &superclass_expr.kind
            {
                if superclass_name == name {
                    self.current_class = enclosing_class;
                    return Err(ResolverError::SelfInheritance);
                }
            }

            self.current_class = ClassType::Subclass;
            if let Err(e) = self.resolve_expr(superclass_expr) {
                self.current_class = enclosing_class;
                return Err(e);
            }

            // Scope holding 'super', shared by every method of the class
            self.begin_scope();
            self.scope_insert("super");
        }

        // Scope holding 'this', nested inside the 'super' one
        self.begin_scope();
        self.scope_insert("this");

        let mut result = Ok(());
        for method in methods {
            let fn_type = if method.name == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };

            result = self.resolve_function(method, fn_type);
            if result.is_err() {
                break;
            }
        }

        self.end_scope();
        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
        result
    }

    fn resolve_function(
        &mut self,
        declaration: &FunctionDecl,
        fn_type: FunctionType,
    ) -> Result<(), ResolverError> {
        let enclosing_function = self.current_function;
        self.current_function = fn_type;

        self.begin_scope();

        let mut result = Ok(());
        for param in &declaration.params {
            if let Err(e) = self.declare(param) {
                result = Err(e);
                break;
            }
            self.define(param);
        }

        if result.is_ok() {
            result = self.resolve_stmts(&declaration.body);
        }

        self.end_scope();
        self.current_function = enclosing_function;
        result
    }

    fn resolve_expr(&mut self, expr: &Expr) -> Result<(), ResolverError> {
        match &expr.kind {
            ExprKind::BoolLiteral { .. }
            | ExprKind::NumberLiteral { .. }
            | ExprKind::StrLiteral { .. }
            | ExprKind::NilLiteral => Ok(()),
            ExprKind::Unary { right, .. } => self.resolve_expr(right),
            ExprKind::Binary { left, right, .. } | ExprKind::Logical { left, right, .. } => {
                self.resolve_expr(left)?;
                self.resolve_expr(right)
            }
            ExprKind::Grouping { expr } => self.resolve_expr(expr),
            ExprKind::Variable { name } => {
                if let Some(scope) = self.scopes.last() {
                    if let Some(info) = scope.get(name) {
                        if info.state == VariableState::Declared {
                            return Err(ResolverError::VariableUsedInOwnInitializer(name.clone()));
                        }
                    }
                }

                self.resolve_local(expr.id, name);
                Ok(())
            }
            ExprKind::Assign { name, value } => {
                self.resolve_expr(value)?;
                self.resolve_local(expr.id, name);
                Ok(())
            }
            ExprKind::Call { callee, arguments } => {
                self.resolve_expr(callee)?;
                for argument in arguments {
                    self.resolve_expr(argument)?;
                }
                Ok(())
            }
            // Property names are looked up at runtime, only the object
            // expression resolves statically
            ExprKind::Get { object, .. } => self.resolve_expr(object),
            ExprKind::Set { object, value, .. } => {
                self.resolve_expr(object)?;
                self.resolve_expr(value)
            }
            ExprKind::This => {
                if self.current_class == ClassType::None {
                    return Err(ResolverError::ThisOutsideClass);
                }

                self.resolve_local(expr.id, "this");
                Ok(())
            }
            ExprKind::Super { .. } => match self.current_class {
                ClassType::None => Err(ResolverError::SuperOutsideClass),
                ClassType::Class => Err(ResolverError::SuperWithoutSuperclass),
                ClassType::Subclass => {
                    self.resolve_local(expr.id, "super");
                    Ok(())
                }
            },
        }
    }

    /// Records how many scopes separate the use from the declaration.
    /// Names found in no scope are assumed global and left out of the
    /// table.
    fn resolve_local(&mut self, id: ExprId, name: &str) {
        for (depth, scope) in self.scopes.iter_mut().rev().enumerate() {
            if let Some(info) = scope.get_mut(name) {
                info.is_used = true;
                self.locals.insert(id, depth);
                return;
            }
        }
    }

    fn declare(&mut self, name: &str) -> Result<(), ResolverError> {
        let Some(scope) = self.scopes.last_mut() else {
            // Global scope, redeclaring is fine there
            return Ok(());
        };

        if scope.contains_key(name) {
            return Err(ResolverError::VariableAlreadyDeclared(name.into()));
        }

        scope.insert(
            name.into(),
            VariableInfo {
                state: VariableState::Declared,
                is_used: false,
            },
        );

        Ok(())
    }

    fn define(&mut self, name: &str) {
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };

        match scope.get_mut(name) {
            Some(info) => info.state = VariableState::Initialized,
            None => {
                scope.insert(
                    name.into(),
                    VariableInfo {
                        state: VariableState::Initialized,
                        is_used: false,
                    },
                );
            }
        }
    }

    // For the implicit 'this' and 'super' bindings, which never warn
    fn scope_insert(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(
                name.into(),
                VariableInfo {
                    state: VariableState::Initialized,
                    is_used: true,
                },
            );
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        if let Some(scope) = self.scopes.pop() {
            for (name, info) in scope {
                if !info.is_used {
                    self.warnings.push(format!("Unused variable: {}", name));
                }
            }
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}
