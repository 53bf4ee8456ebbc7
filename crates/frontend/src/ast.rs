use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tools::span::SourceRange;

// Ids come from a process-wide counter so expressions parsed by different
// parser instances (one per REPL line) never collide in the resolver's
// depth table.
static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

/// Stable identity of an expression node. The resolver keys its lexical
/// depth side table on this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

impl ExprId {
    pub fn fresh() -> Self {
        Self(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone)]
pub struct Expr {
    pub id: ExprId,
    pub kind: ExprKind,
    pub range: SourceRange,
}

impl Expr {
    pub fn new(kind: ExprKind, range: SourceRange) -> Self {
        Self {
            id: ExprId::fresh(),
            kind,
            range,
        }
    }
}

// Structural equality only. Identity lives in `id` and positions in
// `range`, neither belongs in tree comparisons.
impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    BoolLiteral {
        value: bool,
    },
    NumberLiteral {
        value: f64,
    },
    StrLiteral {
        value: String,
    },
    NilLiteral,
    // Box needed to avoid infinite recursion in the type layout
    Unary {
        operator: Operator,
        right: Box<Expr>,
    },
    Binary {
        operator: Operator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    // Kept apart from Binary because operands short-circuit
    Logical {
        operator: Operator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Grouping {
        expr: Box<Expr>,
    },
    Variable {
        name: String,
    },
    // Chaining is allowed: x = y = z = 3
    Assign {
        name: String,
        value: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Get {
        object: Box<Expr>,
        name: String,
    },
    Set {
        object: Box<Expr>,
        name: String,
        value: Box<Expr>,
    },
    This,
    Super {
        method: String,
    },
}

#[derive(Debug, Clone)]
pub struct Stmt {
    pub kind: StmtKind,
    pub range: SourceRange,
}

impl Stmt {
    pub fn new(kind: StmtKind, range: SourceRange) -> Self {
        Self { kind, range }
    }
}

impl PartialEq for Stmt {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expression {
        expr: Expr,
    },
    Print {
        expr: Expr,
    },
    // Option is for declaration without value
    VarDeclaration {
        name: String,
        initializer: Option<Expr>,
    },
    Block {
        statements: Vec<Stmt>,
    },
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        condition: Expr,
        body: Box<Stmt>,
    },
    // Rc because the runtime keeps the declaration alive inside function
    // values long after the statement itself was executed
    FnDeclaration {
        declaration: Rc<FunctionDecl>,
    },
    Return {
        value: Option<Expr>,
    },
    ClassDeclaration {
        name: String,
        // Always an ExprKind::Variable, kept as an Expr so the resolver
        // can record its depth
        superclass: Option<Expr>,
        methods: Vec<Rc<FunctionDecl>>,
    },
}

#[derive(Debug, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Plus,
    Minus,
    Star,
    Slash,
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    And,
    Or,
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
            Operator::Bang => "!",
            Operator::BangEqual => "!=",
            Operator::Equal => "=",
            Operator::EqualEqual => "==",
            Operator::Greater => ">",
            Operator::GreaterEqual => ">=",
            Operator::Less => "<",
            Operator::LessEqual => "<=",
            Operator::And => "and",
            Operator::Or => "or",
        };

        write!(f, "{}", symbol)
    }
}
