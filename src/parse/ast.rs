use crate::{
    lex::{Span, Token},
    symbol::Symbol,
};
use std::fmt;

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum BinOp {
    // Math
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Rem,

    // Comparisons
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl BinOp {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinOp::Gt | BinOp::Lt | BinOp::Ge | BinOp::Le | BinOp::Eq | BinOp::Ne
        )
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinOp::Add => f.write_str("+"),
            BinOp::Sub => f.write_str("-"),
            BinOp::Mul => f.write_str("*"),
            BinOp::Div => f.write_str("/"),
            BinOp::Pow => f.write_str("^"),
            BinOp::Rem => f.write_str("%"),
            BinOp::Gt => f.write_str(">"),
            BinOp::Lt => f.write_str("<"),
            BinOp::Ge => f.write_str(">="),
            BinOp::Le => f.write_str("<="),
            BinOp::Eq => f.write_str("==="),
            BinOp::Ne => f.write_str("!=="),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Lit {
    Num(f64),
    Str(Symbol),
}

#[derive(Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum ExprKind {
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Grouping(Box<Expr>),
    Literal(Lit),
    List(Vec<Expr>),
    Variable(Token),
    Call(Call),
}

#[derive(Debug, PartialEq)]
pub struct Call {
    pub callee: Token,
    pub args: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum StmtKind {
    Let {
        read_only: bool,
        name: Token,
        init: Box<Expr>,
    },
    Assign {
        name: Token,
        val: Box<Expr>,
    },
    /// `add 1 to x`, `raise x to the 2`, ...
    OpAssign {
        op: BinOp,
        target: Token,
        term: Box<Expr>,
    },
    Print(Box<Expr>),
    Automation(Automation),
    Call(Call),
    Output(Option<Box<Expr>>),
    If {
        cond: Box<Expr>,
        then_clause: Block,
        else_clause: Option<Block>,
    },
    While {
        cond: Box<Expr>,
        body: Block,
    },
    For {
        var: Token,
        list: Box<Expr>,
        body: Block,
    },
    Break,
}

#[derive(Default, Debug, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Token,
    /// `None` for an untyped parameter, which accepts anything.
    pub ty: Option<Token>,
}

#[derive(Debug, PartialEq)]
pub struct Automation {
    pub name: Token,
    pub params: Vec<Param>,
    /// `None` when the `-> type` clause is left out.
    pub output: Option<Token>,
    pub body: Block,
}

#[derive(Debug)]
pub struct Ast {
    pub stmts: Vec<Stmt>,
}
