use crate::{parse::ast::BinOp, typeck::hir::*};
use bitflags::bitflags;
use std::cmp::Ordering;

bitflags! {
    /// Rewrites the optimizer may apply.
    pub struct Passes: u8 {
        /// Evaluate operators whose operands are literals.
        const FOLD = 0b01;
        /// Remove statements that can never run.
        const PRUNE = 0b10;
    }
}

impl Default for Passes {
    fn default() -> Self {
        Passes::all()
    }
}

/// Rewrites `program` into an equivalent one. Node shapes are unchanged, so
/// the result can go anywhere the input could.
pub fn optimize(program: Program, passes: Passes) -> Program {
    let mut opt = Optimizer { passes, applied: 0 };
    let stmts = opt.stmts(program.stmts);
    log::debug!("optimizer applied {} rewrite(s)", opt.applied);
    Program { stmts }
}

struct Optimizer {
    passes: Passes,
    applied: usize,
}

impl Optimizer {
    fn stmts(&mut self, stmts: Vec<Stmt>) -> Vec<Stmt> {
        let mut out = Vec::with_capacity(stmts.len());
        let mut stmts = stmts.into_iter();
        while let Some(stmt) = stmts.next() {
            let terminal = matches!(stmt, Stmt::Break | Stmt::Output(_));
            self.stmt(stmt, &mut out);
            if terminal && self.passes.contains(Passes::PRUNE) {
                let dropped = stmts.count();
                if dropped > 0 {
                    self.record(format_args!("dropped {} unreachable statement(s)", dropped));
                }
                break;
            }
        }
        out
    }

    /// Pushes the rewritten form of `stmt`, which may be zero or several
    /// statements, onto `out`.
    fn stmt(&mut self, stmt: Stmt, out: &mut Vec<Stmt>) {
        let stmt = match stmt {
            Stmt::VarDecl(d) => Stmt::VarDecl(VariableDeclaration {
                variable: d.variable,
                initializer: self.expr(d.initializer),
            }),
            Stmt::Assign(a) => Stmt::Assign(Assignment {
                target: a.target,
                source: self.expr(a.source),
            }),
            Stmt::Change(c) => Stmt::Change(ChangeVariable {
                op: c.op,
                term: self.expr(c.term),
                target: c.target,
            }),
            Stmt::Print(p) => Stmt::Print(PrintStatement {
                argument: self.expr(p.argument),
            }),
            Stmt::AutoDecl(d) => Stmt::AutoDecl(AutomationDeclaration {
                body: self.stmts(d.body),
                ..d
            }),
            Stmt::Call(c) => Stmt::Call(self.call(c)),
            Stmt::Output(o) => Stmt::Output(Output {
                value: o.value.map(|v| self.expr(v)),
                ty: o.ty,
            }),
            Stmt::If(s) => {
                let test = self.expr(s.test);
                if self.passes.contains(Passes::PRUNE) {
                    if let Some(b) = const_bool(&test) {
                        self.record(format_args!("if {} replaced by its taken branch", b));
                        let taken = if b {
                            s.body
                        } else {
                            s.alternate.map(|e| e.body).unwrap_or_default()
                        };
                        // The branch shares the enclosing scope, so splicing
                        // it in does not change what is visible.
                        out.extend(self.stmts(taken));
                        return;
                    }
                }
                Stmt::If(IfStatement {
                    test,
                    body: self.stmts(s.body),
                    alternate: s.alternate.map(|e| ElseStatement {
                        body: self.stmts(e.body),
                    }),
                })
            }
            Stmt::While(w) => {
                let test = self.expr(w.test);
                if self.passes.contains(Passes::PRUNE) && const_bool(&test) == Some(false) {
                    self.record(format_args!("removed loop while false"));
                    return;
                }
                Stmt::While(WhileLoop {
                    test,
                    body: self.stmts(w.body),
                })
            }
            Stmt::For(f) => Stmt::For(ForLoop {
                temp_var: f.temp_var,
                list: self.expr(f.list),
                body: self.stmts(f.body),
            }),
            Stmt::Break => Stmt::Break,
        };
        out.push(stmt);
    }

    fn call(&mut self, c: Call) -> Call {
        Call {
            callee: c.callee,
            args: c.args.into_iter().map(|a| self.expr(a)).collect(),
        }
    }

    fn expr(&mut self, expr: Expr) -> Expr {
        let fold = self.passes.contains(Passes::FOLD);
        match expr {
            Expr::Variable(v) if fold && v.builtin => match v.name.as_str() {
                "true" => Expr::Bool(true),
                "false" => Expr::Bool(false),
                _ => Expr::Variable(v),
            },
            Expr::Binary(b) => {
                let left = self.expr(*b.left);
                let right = self.expr(*b.right);
                if fold {
                    if let (Expr::Num(x), Expr::Num(y)) = (&left, &right) {
                        if let Some(n) = eval_arith(b.op, *x, *y) {
                            self.record(format_args!("{} {} {} => {}", x, b.op, y, n));
                            return Expr::Num(n);
                        }
                    }
                }
                Expr::Binary(Expression {
                    op: b.op,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
            Expr::Compare(b) => {
                let left = self.expr(*b.left);
                let right = self.expr(*b.right);
                if fold {
                    if let Some(r) = eval_compare(b.op, &left, &right) {
                        self.record(format_args!("comparison {} => {}", b.op, r));
                        return Expr::Bool(r);
                    }
                }
                Expr::Compare(BooleanExpression {
                    op: b.op,
                    left: Box::new(left),
                    right: Box::new(right),
                })
            }
            Expr::Paren(p) => {
                let contents = self.expr(*p.contents);
                match contents {
                    Expr::Num(_) | Expr::Bool(_) | Expr::Str(_) if fold => contents,
                    contents => Expr::Paren(ParenthesesExpression {
                        contents: Box::new(contents),
                    }),
                }
            }
            Expr::List(l) => Expr::List(List {
                elements: l.elements.into_iter().map(|e| self.expr(e)).collect(),
            }),
            Expr::Call(c) => Expr::Call(self.call(c)),
            e => e,
        }
    }

    fn record(&mut self, what: std::fmt::Arguments<'_>) {
        self.applied += 1;
        log::debug!("optimize: {}", what);
    }
}

/// The value of a test known before the program runs.
fn const_bool(expr: &Expr) -> Option<bool> {
    match expr {
        Expr::Bool(b) => Some(*b),
        Expr::Variable(v) if v.builtin && v.name.as_str() == "true" => Some(true),
        Expr::Variable(v) if v.builtin && v.name.as_str() == "false" => Some(false),
        Expr::Paren(p) => const_bool(&p.contents),
        _ => None,
    }
}

/// `None` when the result would not be a finite number, which leaves the
/// expression for the target to evaluate.
fn eval_arith(op: BinOp, x: f64, y: f64) -> Option<f64> {
    let n = match op {
        BinOp::Add => x + y,
        BinOp::Sub => x - y,
        BinOp::Mul => x * y,
        BinOp::Div if y == 0.0 => return None,
        BinOp::Div => x / y,
        BinOp::Pow => x.powf(y),
        BinOp::Rem if y == 0.0 => return None,
        BinOp::Rem => x % y,
        _ => return None,
    };
    if n.is_finite() {
        Some(n)
    } else {
        None
    }
}

fn eval_compare(op: BinOp, left: &Expr, right: &Expr) -> Option<bool> {
    match (left, right) {
        (Expr::Num(x), Expr::Num(y)) => cmp_bool(op, x, y),
        (Expr::Str(x), Expr::Str(y)) => {
            let (x, y) = (x.contents.as_str(), y.contents.as_str());
            // Escapes are kept as written, so their text says nothing about
            // the runtime value.
            if x.contains('\\') || y.contains('\\') {
                return None;
            }
            // The target orders strings by UTF-16 code unit.
            let ord = x.encode_utf16().cmp(y.encode_utf16());
            cmp_bool(op, &ord, &Ordering::Equal)
        }
        _ => None,
    }
}

fn cmp_bool<T: PartialOrd>(op: BinOp, x: &T, y: &T) -> Option<bool> {
    Some(match op {
        BinOp::Gt => x > y,
        BinOp::Lt => x < y,
        BinOp::Ge => x >= y,
        BinOp::Le => x <= y,
        BinOp::Eq => x == y,
        BinOp::Ne => x != y,
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{err::Handler, parse, typeck};
    use std::rc::Rc;

    fn optimized(src: &str, passes: Passes) -> Program {
        let src: Rc<str> = Rc::from(src);
        let handler = Rc::new(Handler::new(&src));
        let ast = parse::parse(&src, &handler).unwrap();
        let program = typeck::analyze(ast, typeck::prelude(), &handler).unwrap();
        optimize(program, passes)
    }

    fn initializer(p: &Program, i: usize) -> &Expr {
        match &p.stmts[i] {
            Stmt::VarDecl(d) => &d.initializer,
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn folds_arithmetic() {
        let p = optimized("make x with 1 plus 2 times 3;", Passes::all());
        assert_eq!(*initializer(&p, 0), Expr::Num(7.0));
        let p = optimized("make x with 2 to the 3 to the 2;", Passes::all());
        assert_eq!(*initializer(&p, 0), Expr::Num(512.0));
        let p = optimized("make x with 7 mod 4;", Passes::all());
        assert_eq!(*initializer(&p, 0), Expr::Num(3.0));
        let p = optimized("make x with (5 minus 2);", Passes::all());
        assert_eq!(*initializer(&p, 0), Expr::Num(3.0));
    }

    #[test]
    fn division_by_zero_is_left_alone() {
        let p = optimized("make x with 1 divided by 0;", Passes::all());
        assert!(matches!(initializer(&p, 0), Expr::Binary(_)));
    }

    #[test]
    fn folds_comparisons() {
        let p = optimized("make b with 3 is greater than 2;", Passes::all());
        assert_eq!(*initializer(&p, 0), Expr::Bool(true));
        let p = optimized("make b with \"a\" is not \"a\";", Passes::all());
        assert_eq!(*initializer(&p, 0), Expr::Bool(false));
        let p = optimized("make b with true;", Passes::all());
        assert_eq!(*initializer(&p, 0), Expr::Bool(true));
    }

    #[test]
    fn string_order_follows_utf16() {
        // U+1F600 encodes as a surrogate pair below U+FF61, although its
        // UTF-8 form sorts above it.
        let p = optimized("make b with \"😀\" is less than \"｡\";", Passes::all());
        assert_eq!(*initializer(&p, 0), Expr::Bool(true));
        let p = optimized("make b with \"b\" is greater than or equal to \"ab\";", Passes::all());
        assert_eq!(*initializer(&p, 0), Expr::Bool(true));
    }

    #[test]
    fn variables_are_not_folded() {
        let p = optimized("make x with 1; make y with x plus 1;", Passes::all());
        assert!(matches!(initializer(&p, 1), Expr::Binary(_)));
    }

    #[test]
    fn fold_disabled() {
        let p = optimized("make x with 1 plus 2;", Passes::PRUNE);
        assert!(matches!(initializer(&p, 0), Expr::Binary(_)));
    }

    #[test]
    fn prunes_constant_branches() {
        let p = optimized(
            "if 1 is 1 { print \"yes\"; } ifnot { print \"no\"; }",
            Passes::all(),
        );
        assert_eq!(p.stmts.len(), 1);
        match &p.stmts[0] {
            Stmt::Print(s) => match &s.argument {
                Expr::Str(s) => assert_eq!(s.contents.as_str(), "yes"),
                other => panic!("{:?}", other),
            },
            other => panic!("{:?}", other),
        }

        let p = optimized("if false { print 1; }", Passes::all());
        assert!(p.stmts.is_empty());
    }

    #[test]
    fn prune_without_fold_still_sees_library_booleans() {
        let p = optimized("loop while false { print 1; } print 2;", Passes::PRUNE);
        assert_eq!(p.stmts.len(), 1);
    }

    #[test]
    fn drops_statements_after_break_and_output() {
        let p = optimized(
            "loop while true { print 1; break; print 2; }",
            Passes::all(),
        );
        match &p.stmts[0] {
            Stmt::While(w) => assert_eq!(w.body.len(), 2),
            other => panic!("{:?}", other),
        }

        let p = optimized(
            "automate f() -> num { output 1; print 2; }",
            Passes::all(),
        );
        match &p.stmts[0] {
            Stmt::AutoDecl(d) => assert_eq!(d.body.len(), 1),
            other => panic!("{:?}", other),
        }
    }

    #[test]
    fn nothing_enabled_is_identity() {
        let src = "make x with 1 plus 2; if true { print x; }";
        let src_rc: Rc<str> = Rc::from(src);
        let handler = Rc::new(Handler::new(&src_rc));
        let ast = parse::parse(&src_rc, &handler).unwrap();
        let program = typeck::analyze(ast, typeck::prelude(), &handler).unwrap();
        assert_eq!(optimize(program.clone(), Passes::empty()), program);
    }
}
