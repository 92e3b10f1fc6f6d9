use crate::{parse::ast::BinOp, symbol::Symbol};
use std::rc::Rc;

use super::ty::Ty;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

/// A declared binding. Its type is fixed when it is declared.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: Symbol,
    pub read_only: bool,
    pub ty: Ty,
    pub builtin: bool,
}

impl Variable {
    pub fn new(name: Symbol, read_only: bool, ty: Ty) -> Self {
        Self {
            name,
            read_only,
            ty,
            builtin: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Symbol,
    pub ty: Ty,
}

/// The signature of a callable. `ty` is the output type and is never `any`.
#[derive(Debug, Clone, PartialEq)]
pub struct Automation {
    pub name: Symbol,
    pub params: Vec<Param>,
    pub ty: Ty,
    pub builtin: bool,
}

impl Automation {
    pub fn new(name: Symbol, params: Vec<Param>, ty: Ty) -> Self {
        Self {
            name,
            params,
            ty,
            builtin: false,
        }
    }
}

/// Anything an identifier can resolve to.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    Variable(Rc<Variable>),
    Automation(Rc<Automation>),
}

impl Entity {
    pub fn name(&self) -> Symbol {
        match self {
            Entity::Variable(v) => v.name,
            Entity::Automation(a) => a.name,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VarDecl(VariableDeclaration),
    Assign(Assignment),
    Change(ChangeVariable),
    Print(PrintStatement),
    AutoDecl(AutomationDeclaration),
    Call(Call),
    Output(Output),
    If(IfStatement),
    While(WhileLoop),
    For(ForLoop),
    Break,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub variable: Rc<Variable>,
    pub initializer: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub target: Rc<Variable>,
    pub source: Expr,
}

/// In-place numeric update such as `add 1 to x`.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeVariable {
    pub op: BinOp,
    pub term: Expr,
    pub target: Rc<Variable>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrintStatement {
    pub argument: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AutomationDeclaration {
    pub name: Symbol,
    pub auto: Rc<Automation>,
    /// The parameters as bound inside the body, in declaration order.
    pub params: Vec<Rc<Variable>>,
    pub output: Ty,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: Rc<Automation>,
    pub args: Vec<Expr>,
}

impl Call {
    pub fn ty(&self) -> Ty {
        self.callee.ty
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Output {
    pub value: Option<Expr>,
    pub ty: Ty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStatement {
    pub test: Expr,
    pub body: Vec<Stmt>,
    pub alternate: Option<ElseStatement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElseStatement {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhileLoop {
    pub test: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForLoop {
    pub temp_var: Rc<Variable>,
    pub list: Expr,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Num(f64),
    /// Only produced by constant folding; source programs spell booleans
    /// through the `true`/`false` library variables.
    Bool(bool),
    Str(StringLiteral),
    List(List),
    Variable(Rc<Variable>),
    Automation(Rc<Automation>),
    Binary(Expression),
    Compare(BooleanExpression),
    Paren(ParenthesesExpression),
    Call(Call),
}

impl Expr {
    pub fn ty(&self) -> Ty {
        match self {
            Expr::Num(_) => Ty::Num,
            Expr::Bool(_) => Ty::Bool,
            Expr::Str(_) => Ty::Word,
            Expr::List(_) => Ty::List,
            Expr::Variable(v) => v.ty,
            Expr::Automation(_) => Ty::Automation,
            Expr::Binary(_) => Ty::Num,
            Expr::Compare(_) => Ty::Bool,
            Expr::Paren(p) => p.contents.ty(),
            Expr::Call(c) => c.ty(),
        }
    }
}

/// Arithmetic; always a number.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub op: BinOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

/// Comparison; always a boolean.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanExpression {
    pub op: BinOp,
    pub left: Box<Expr>,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParenthesesExpression {
    pub contents: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct List {
    pub elements: Vec<Expr>,
}

/// The text between the quotes, escapes left as written.
#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub contents: Symbol,
}
