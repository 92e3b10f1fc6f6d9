use std::rc::Rc;

use crate::{
    err::{ErrorKind, Handler, Result},
    lex::{Span, Token},
    parse::ast,
};

use super::{
    context::{Context, Overrides},
    hir::{self, Entity},
    ty::Ty,
};

/// Checks `ast` against the language rules and produces the typed program.
/// `prelude` is bound in the outermost scope before anything else.
pub fn analyze(ast: ast::Ast, prelude: Vec<Entity>, handler: &Rc<Handler>) -> Result<hir::Program> {
    let cx = Context::with_prelude(handler, prelude);
    Analyzer::new(cx, handler).analyze_ast(ast)
}

struct Analyzer {
    cx: Context,
    handler: Rc<Handler>,
}

impl Analyzer {
    fn new(cx: Context, handler: &Rc<Handler>) -> Self {
        Self {
            cx,
            handler: handler.clone(),
        }
    }

    fn analyze_ast(&mut self, ast: ast::Ast) -> Result<hir::Program> {
        let stmts = self.analyze_stmts(ast.stmts)?;
        Ok(hir::Program { stmts })
    }

    fn analyze_stmts(&mut self, stmts: Vec<ast::Stmt>) -> Result<Vec<hir::Stmt>> {
        stmts.into_iter().map(|s| self.analyze_stmt(s)).collect()
    }

    fn analyze_stmt(&mut self, stmt: ast::Stmt) -> Result<hir::Stmt> {
        let span = stmt.span;
        match stmt.kind {
            ast::StmtKind::Let {
                read_only,
                name,
                init,
            } => {
                // The initializer is analyzed before the name is bound, so
                // `make x with x;` only works if an outer `x` exists.
                let init_span = init.span;
                let initializer = self.analyze_expr(*init)?;
                let ty = initializer.ty();
                if ty == Ty::None {
                    return self.handler.mk_err(
                        init_span,
                        ErrorKind::Assign,
                        "Cannot assign a value with type 'none' to a variable.",
                    );
                }

                let variable = Rc::new(hir::Variable::new(name.symbol, read_only, ty));
                self.cx
                    .add(name.symbol, Entity::Variable(variable.clone()), name.span)?;
                log::debug!("declared {}: {}", name.symbol, ty);
                Ok(hir::Stmt::VarDecl(hir::VariableDeclaration {
                    variable,
                    initializer,
                }))
            }
            ast::StmtKind::Assign { name, val } => {
                let target = self.lookup_assignable(&name)?;
                let val_span = val.span;
                let source = self.analyze_expr(*val)?;
                if source.ty() != target.ty {
                    return self.handler.mk_err(
                        val_span,
                        ErrorKind::Assign,
                        format!(
                            "Variable '{}' ({}) cannot have a value of type {}.",
                            target.name,
                            target.ty,
                            source.ty()
                        ),
                    );
                }
                Ok(hir::Stmt::Assign(hir::Assignment { target, source }))
            }
            ast::StmtKind::OpAssign { op, target, term } => {
                let target_span = target.span;
                let target = self.lookup_assignable(&target)?;
                self.expect_numeric(target.ty, target_span)?;
                let term_span = term.span;
                let term = self.analyze_expr(*term)?;
                self.expect_numeric(term.ty(), term_span)?;
                Ok(hir::Stmt::Change(hir::ChangeVariable { op, term, target }))
            }
            ast::StmtKind::Print(val) => {
                let val_span = val.span;
                let argument = self.analyze_expr(*val)?;
                if argument.ty() == Ty::None {
                    return self.handler.mk_err(
                        val_span,
                        ErrorKind::Type,
                        "Cannot print a value of type 'none'.",
                    );
                }
                Ok(hir::Stmt::Print(hir::PrintStatement { argument }))
            }
            ast::StmtKind::Automation(a) => self.analyze_automation(a),
            ast::StmtKind::Call(call) => Ok(hir::Stmt::Call(self.analyze_call(call)?)),
            ast::StmtKind::Output(val) => self.analyze_output(val, span),
            ast::StmtKind::If {
                cond,
                then_clause,
                else_clause,
            } => {
                // Unlike loops, both branches share the enclosing scope.
                let test = self.analyze_test(*cond)?;
                let body = self.analyze_stmts(then_clause.stmts)?;
                let alternate = match else_clause {
                    Some(block) => Some(hir::ElseStatement {
                        body: self.analyze_stmts(block.stmts)?,
                    }),
                    None => None,
                };
                Ok(hir::Stmt::If(hir::IfStatement {
                    test,
                    body,
                    alternate,
                }))
            }
            ast::StmtKind::While { cond, body } => {
                let test = self.analyze_test(*cond)?;
                let body =
                    self.enter_scope(Overrides::in_loop(), |this| this.analyze_stmts(body.stmts))?;
                Ok(hir::Stmt::While(hir::WhileLoop { test, body }))
            }
            ast::StmtKind::For { var, list, body } => {
                let list_span = list.span;
                let list = self.analyze_expr(*list)?;
                self.expect(list.ty(), &[Ty::List], "a list", list_span)?;

                let (temp_var, body) = self.enter_scope(Overrides::in_loop(), |this| {
                    let temp_var = Rc::new(hir::Variable::new(var.symbol, false, Ty::Any));
                    this.cx
                        .add(var.symbol, Entity::Variable(temp_var.clone()), var.span)?;
                    let body = this.analyze_stmts(body.stmts)?;
                    Ok((temp_var, body))
                })?;
                Ok(hir::Stmt::For(hir::ForLoop {
                    temp_var,
                    list,
                    body,
                }))
            }
            ast::StmtKind::Break => {
                if self.cx.in_loop() {
                    Ok(hir::Stmt::Break)
                } else {
                    self.handler
                        .mk_err(span, ErrorKind::Call, "Break must be called in a loop.")
                }
            }
        }
    }

    fn analyze_automation(&mut self, a: ast::Automation) -> Result<hir::Stmt> {
        let ast::Automation {
            name,
            params,
            output,
            body,
        } = a;

        let output = match &output {
            Some(token) => {
                let ty = self.resolve_ty(token)?;
                if ty == Ty::Any {
                    return self.handler.mk_err(
                        token.span,
                        ErrorKind::Auto,
                        "Must specify automation output type (cannot be any).",
                    );
                }
                ty
            }
            None => Ty::None,
        };

        let mut sig = vec![];
        for p in &params {
            let ty = match &p.ty {
                Some(token) => self.resolve_ty(token)?,
                None => Ty::Any,
            };
            sig.push(hir::Param {
                name: p.name.symbol,
                ty,
            });
        }

        let auto = Rc::new(hir::Automation::new(name.symbol, sig, output));
        // Bound before the body is walked so the body may call itself.
        self.cx
            .add(name.symbol, Entity::Automation(auto.clone()), name.span)?;
        log::debug!("declared automation {} -> {}", name.symbol, output);

        let (param_vars, body) = self.enter_scope(Overrides::automation(auto.clone()), |this| {
            let mut vars = vec![];
            for (p, declared) in auto.params.iter().zip(&params) {
                if p.ty == Ty::None {
                    return this.handler.mk_err(
                        declared.name.span,
                        ErrorKind::Auto,
                        format!("Type of parameter '{}' cannot be none.", p.name),
                    );
                }
                let v = Rc::new(hir::Variable::new(p.name, false, p.ty));
                this.cx
                    .add(p.name, Entity::Variable(v.clone()), declared.name.span)?;
                vars.push(v);
            }
            let body = this.analyze_stmts(body.stmts)?;
            Ok((vars, body))
        })?;

        if output != Ty::None && !has_output(&body) {
            return self.handler.mk_err(
                name.span,
                ErrorKind::Auto,
                format!("'{}' must have an output.", name.symbol),
            );
        }

        Ok(hir::Stmt::AutoDecl(hir::AutomationDeclaration {
            name: name.symbol,
            auto,
            params: param_vars,
            output,
            body,
        }))
    }

    fn analyze_output(&mut self, val: Option<Box<ast::Expr>>, span: Span) -> Result<hir::Stmt> {
        let auto = match self.cx.automation() {
            Some(auto) => auto.clone(),
            None => {
                return self.handler.mk_err(
                    span,
                    ErrorKind::Call,
                    "Output must be called in an automation.",
                )
            }
        };

        let val = match val {
            Some(val) => val,
            None => {
                if auto.ty != Ty::None {
                    return self.handler.mk_err(
                        span,
                        ErrorKind::Auto,
                        format!(
                            "Automation '{}' must output a value of type '{}'.",
                            auto.name, auto.ty
                        ),
                    );
                }
                return Ok(hir::Stmt::Output(hir::Output {
                    value: None,
                    ty: Ty::None,
                }));
            }
        };

        let val_span = val.span;
        let value = self.analyze_expr(*val)?;
        let ty = value.ty();
        if auto.ty == Ty::None || ty != auto.ty {
            return self.handler.mk_err(
                val_span,
                ErrorKind::Auto,
                format!(
                    "Automation '{}' cannot output a value of type '{}' (must output '{}').",
                    auto.name, ty, auto.ty
                ),
            );
        }

        Ok(hir::Stmt::Output(hir::Output {
            value: Some(value),
            ty,
        }))
    }

    fn analyze_call(&mut self, call: ast::Call) -> Result<hir::Call> {
        let callee = match self.cx.lookup(call.callee.symbol, call.callee.span)? {
            Entity::Automation(a) => a,
            Entity::Variable(_) => {
                return self.handler.mk_err(
                    call.callee.span,
                    ErrorKind::Call,
                    format!(
                        "Trying to call Variable '{}' as an Automation.",
                        call.callee.symbol
                    ),
                )
            }
        };

        let spans: Vec<Span> = call.args.iter().map(|a| a.span).collect();
        let args = call
            .args
            .into_iter()
            .map(|arg| self.analyze_expr(arg))
            .collect::<Result<Vec<_>>>()?;

        if args.len() != callee.params.len() {
            return self.handler.mk_err(
                call.span,
                ErrorKind::Call,
                format!(
                    "Expected {} arg(s), found {}.",
                    callee.params.len(),
                    args.len()
                ),
            );
        }

        for (i, (arg, param)) in args.iter().zip(&callee.params).enumerate() {
            if !param.ty.accepts(arg.ty()) {
                return self.handler.mk_err(
                    spans[i],
                    ErrorKind::Call,
                    format!(
                        "Argument {} ({}) must be of type: {}.",
                        i + 1,
                        arg.ty(),
                        param.ty
                    ),
                );
            }
        }

        Ok(hir::Call { callee, args })
    }

    fn analyze_expr(&mut self, expr: ast::Expr) -> Result<hir::Expr> {
        let expr = match expr.kind {
            ast::ExprKind::Binary { op, left, right } => {
                let (left_span, right_span) = (left.span, right.span);
                let left = Box::new(self.analyze_expr(*left)?);
                let right = Box::new(self.analyze_expr(*right)?);
                if op.is_comparison() {
                    self.expect_numeric_or_word(left.ty(), left_span)?;
                    self.expect_numeric_or_word(right.ty(), right_span)?;
                    hir::Expr::Compare(hir::BooleanExpression { op, left, right })
                } else {
                    self.expect_numeric(left.ty(), left_span)?;
                    self.expect_numeric(right.ty(), right_span)?;
                    hir::Expr::Binary(hir::Expression { op, left, right })
                }
            }
            ast::ExprKind::Grouping(e) => hir::Expr::Paren(hir::ParenthesesExpression {
                contents: Box::new(self.analyze_expr(*e)?),
            }),
            ast::ExprKind::Literal(ast::Lit::Num(n)) => hir::Expr::Num(n),
            ast::ExprKind::Literal(ast::Lit::Str(s)) => {
                hir::Expr::Str(hir::StringLiteral { contents: s })
            }
            // Elements may be of any mix of types.
            ast::ExprKind::List(elements) => hir::Expr::List(hir::List {
                elements: elements
                    .into_iter()
                    .map(|e| self.analyze_expr(e))
                    .collect::<Result<_>>()?,
            }),
            ast::ExprKind::Variable(t) => match self.cx.lookup(t.symbol, t.span)? {
                Entity::Variable(v) => hir::Expr::Variable(v),
                Entity::Automation(a) => hir::Expr::Automation(a),
            },
            ast::ExprKind::Call(call) => hir::Expr::Call(self.analyze_call(call)?),
        };
        Ok(expr)
    }

    /// Condition of an `if` or `loop while`.
    fn analyze_test(&mut self, cond: ast::Expr) -> Result<hir::Expr> {
        let span = cond.span;
        let test = self.analyze_expr(cond)?;
        self.expect(test.ty(), &[Ty::Bool], "a true/false value", span)?;
        Ok(test)
    }

    /// Resolves an identifier that is about to be written to.
    fn lookup_assignable(&mut self, name: &Token) -> Result<Rc<hir::Variable>> {
        let var = match self.cx.lookup(name.symbol, name.span)? {
            Entity::Variable(v) => v,
            Entity::Automation(_) => {
                return self.handler.mk_err(
                    name.span,
                    ErrorKind::Assign,
                    format!("Cannot assign value to automation '{}'.", name.symbol),
                )
            }
        };
        if var.read_only {
            return self.handler.mk_err(
                name.span,
                ErrorKind::Assign,
                format!("Cannot change value of constant '{}'.", name.symbol),
            );
        }
        Ok(var)
    }

    fn resolve_ty(&self, token: &Token) -> Result<Ty> {
        match Ty::from_name(token.symbol.as_str()) {
            Some(ty) => Ok(ty),
            None => self.handler.mk_err(
                token.span,
                ErrorKind::Type,
                format!("Unknown type '{}'.", token.symbol),
            ),
        }
    }

    fn expect_numeric(&self, ty: Ty, span: Span) -> Result<()> {
        self.expect(ty, &[Ty::Num], "a numeric value", span)
    }

    fn expect_numeric_or_word(&self, ty: Ty, span: Span) -> Result<()> {
        self.expect(ty, &[Ty::Num, Ty::Word], "a numeric or string value", span)
    }

    /// `ty` must be compatible with one of `allowed`; `any` always is.
    fn expect(&self, ty: Ty, allowed: &[Ty], expectation: &str, span: Span) -> Result<()> {
        if allowed.iter().any(|a| ty.is_compatible(*a)) {
            return Ok(());
        }
        self.handler.mk_err(
            span,
            ErrorKind::Type,
            format!("Expected {}, got type '{}'.", expectation, ty),
        )
    }

    fn enter_scope<F, R>(&mut self, overrides: Overrides, f: F) -> Result<R>
    where
        F: FnOnce(&mut Analyzer) -> Result<R>,
    {
        let id = self.cx.new_child(overrides);
        let result = f(self);
        self.cx.exit(id);
        result
    }
}

/// Whether some statement reachable from `body`, descending into nested
/// blocks but not into nested automations, is an `output`.
fn has_output(body: &[hir::Stmt]) -> bool {
    body.iter().any(|stmt| match stmt {
        hir::Stmt::Output(_) => true,
        hir::Stmt::If(s) => {
            has_output(&s.body) || s.alternate.as_ref().map_or(false, |e| has_output(&e.body))
        }
        hir::Stmt::While(s) => has_output(&s.body),
        hir::Stmt::For(s) => has_output(&s.body),
        _ => false,
    })
}
