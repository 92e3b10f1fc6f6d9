pub mod ast;

use crate::{
    err::{ErrorKind, Handler, Result},
    lex::{Lexer, LiteralKind, Span, Token, TokenKind, TokenKind::*},
};
use ast::{Ast, Automation, BinOp, Block, Call, Expr, ExprKind, Lit, Param, Stmt, StmtKind};
use std::rc::Rc;

/// Parses a whole program. The first syntax error aborts the parse.
pub fn parse(src: &Rc<str>, handler: &Rc<Handler>) -> Result<Ast> {
    Parser::new(src.clone(), handler)?.parse()
}

pub struct Parser {
    tokens: Vec<Token>,
    handler: Rc<Handler>,
    pos: usize,
}

impl Parser {
    pub fn new(src: Rc<str>, handler: &Rc<Handler>) -> Result<Self> {
        let tokens = Lexer::new(src, handler).tokenize()?;
        Ok(Self {
            tokens,
            handler: handler.clone(),
            pos: 0,
        })
    }

    pub fn parse(&mut self) -> Result<Ast> {
        let mut stmts = vec![];
        while !self.eof() {
            stmts.push(self.stmt()?);
        }
        Ok(Ast { stmts })
    }

    fn stmt(&mut self) -> Result<Stmt> {
        let lo = self.peek().span;
        let kind = if self.eat(Constantly) {
            self.consume(Make, "Expected \"make\"")?;
            self.let_decl(true)?
        } else if self.eat(Make) {
            self.let_decl(false)?
        } else if self.eat(Change) {
            let name = self.consume(Ident, "Expected an identifier")?;
            self.consume(To, "Expected \"to\"")?;
            let val = self.expr()?;
            self.consume(SemiColon, "Expected \";\"")?;
            StmtKind::Assign { name, val }
        } else if self.eat(Add) {
            self.op_assign_term_first(BinOp::Add, To, "Expected \"to\"")?
        } else if self.eat(Subtract) {
            self.op_assign_term_first(BinOp::Sub, From, "Expected \"from\"")?
        } else if self.eat(Multiply) {
            self.op_assign_target_first(BinOp::Mul)?
        } else if self.eat(Divide) {
            self.op_assign_target_first(BinOp::Div)?
        } else if self.eat(Mod) {
            self.op_assign_target_first(BinOp::Rem)?
        } else if self.eat(Raise) {
            let target = self.consume(Ident, "Expected an identifier")?;
            self.consume(To, "Expected \"to\"")?;
            self.consume(The, "Expected \"the\"")?;
            let term = self.expr()?;
            self.consume(SemiColon, "Expected \";\"")?;
            StmtKind::OpAssign {
                op: BinOp::Pow,
                target,
                term,
            }
        } else if self.eat(Print) {
            let val = self.expr()?;
            self.consume(SemiColon, "Expected \";\"")?;
            StmtKind::Print(val)
        } else if self.eat(Automate) {
            StmtKind::Automation(self.automation()?)
        } else if self.eat(Output) {
            let val = if self.check(SemiColon) {
                None
            } else {
                Some(self.expr()?)
            };
            self.consume(SemiColon, "Expected \";\"")?;
            StmtKind::Output(val)
        } else if self.eat(If) {
            let cond = self.expr()?;
            let then_clause = self.block()?;
            let else_clause = if self.eat(IfNot) {
                Some(self.block()?)
            } else {
                None
            };
            StmtKind::If {
                cond,
                then_clause,
                else_clause,
            }
        } else if self.eat(Loop) {
            if self.eat(While) {
                let cond = self.expr()?;
                let body = self.block()?;
                StmtKind::While { cond, body }
            } else if self.eat(Over) {
                let var = self.consume(Ident, "Expected an identifier")?;
                self.consume(In, "Expected \"in\"")?;
                let list = self.expr()?;
                let body = self.block()?;
                StmtKind::For { var, list, body }
            } else {
                return self.err("Expected \"while\" or \"over\"");
            }
        } else if self.eat(Break) {
            self.consume(SemiColon, "Expected \";\"")?;
            StmtKind::Break
        } else if self.check(Ident) && self.check_next(OpenParen) {
            let call = self.call()?;
            self.consume(SemiColon, "Expected \";\"")?;
            StmtKind::Call(call)
        } else {
            return self.err("Expected a statement");
        };

        Ok(Stmt {
            kind,
            span: lo.to(self.prev().span),
        })
    }

    fn let_decl(&mut self, read_only: bool) -> Result<StmtKind> {
        let name = self.consume(Ident, "Expected an identifier")?;
        self.consume(With, "Expected \"with\"")?;
        let init = self.expr()?;
        self.consume(SemiColon, "Expected \";\"")?;
        Ok(StmtKind::Let {
            read_only,
            name,
            init,
        })
    }

    /// `add <term> to <target>;` and `subtract <term> from <target>;`
    fn op_assign_term_first(
        &mut self,
        op: BinOp,
        sep: TokenKind,
        msg: &'static str,
    ) -> Result<StmtKind> {
        let term = self.expr()?;
        self.consume(sep, msg)?;
        let target = self.consume(Ident, "Expected an identifier")?;
        self.consume(SemiColon, "Expected \";\"")?;
        Ok(StmtKind::OpAssign { op, target, term })
    }

    /// `multiply <target> by <term>;`, likewise `divide` and `mod`.
    fn op_assign_target_first(&mut self, op: BinOp) -> Result<StmtKind> {
        let target = self.consume(Ident, "Expected an identifier")?;
        self.consume(By, "Expected \"by\"")?;
        let term = self.expr()?;
        self.consume(SemiColon, "Expected \";\"")?;
        Ok(StmtKind::OpAssign { op, target, term })
    }

    fn automation(&mut self) -> Result<Automation> {
        let name = self.consume(Ident, "Expected an identifier")?;
        self.consume(OpenParen, "Expected \"(\"")?;
        let mut params = vec![];
        if !self.check(CloseParen) {
            loop {
                params.push(self.param()?);
                if !self.eat(Comma) {
                    break;
                }
            }
        }
        self.consume(CloseParen, "Expected \")\"")?;

        let output = if self.eat(Arrow) {
            Some(self.consume(Ident, "Expected a type name")?)
        } else {
            None
        };

        let body = self.block()?;
        Ok(Automation {
            name,
            params,
            output,
            body,
        })
    }

    fn param(&mut self) -> Result<Param> {
        if self.check(Ident) && self.check_next(Colon) {
            let ty = self.consume(Ident, "Expected a type name")?;
            self.consume(Colon, "Expected \":\"")?;
            let name = self.consume(Ident, "Expected an identifier")?;
            Ok(Param { name, ty: Some(ty) })
        } else {
            let name = self.consume(Ident, "Expected an identifier")?;
            Ok(Param { name, ty: None })
        }
    }

    fn block(&mut self) -> Result<Block> {
        let lo = self.consume(OpenBrace, "Expected \"{\"")?.span;
        let mut stmts = vec![];
        while !self.check(CloseBrace) && !self.eof() {
            stmts.push(self.stmt()?);
        }
        let hi = self.consume(CloseBrace, "Expected \"}\"")?.span;
        Ok(Block {
            stmts,
            span: lo.to(hi),
        })
    }

    fn call(&mut self) -> Result<Call> {
        let callee = self.consume(Ident, "Expected an identifier")?;
        self.consume(OpenParen, "Expected \"(\"")?;
        let args = self.args(CloseParen)?;
        let close = self.consume(CloseParen, "Expected \")\"")?;
        Ok(Call {
            span: callee.span.to(close.span),
            callee,
            args,
        })
    }

    fn args(&mut self, close: TokenKind) -> Result<Vec<Expr>> {
        let mut args = vec![];
        if !self.check(close) {
            loop {
                args.push(*self.expr()?);
                if !self.eat(Comma) {
                    break;
                }
            }
        }
        Ok(args)
    }

    fn expr(&mut self) -> Result<Box<Expr>> {
        let left = self.sum()?;

        let op = match self.rel_op()? {
            Some(op) => op,
            None => return Ok(left),
        };
        let right = self.sum()?;
        Ok(binary(op, left, right))
    }

    fn rel_op(&mut self) -> Result<Option<BinOp>> {
        if !self.eat(Is) {
            return Ok(None);
        }

        let op = if self.eat(Greater) {
            self.consume(Than, "Expected \"than\"")?;
            if self.or_equal_to()? {
                BinOp::Ge
            } else {
                BinOp::Gt
            }
        } else if self.eat(Less) {
            self.consume(Than, "Expected \"than\"")?;
            if self.or_equal_to()? {
                BinOp::Le
            } else {
                BinOp::Lt
            }
        } else if self.eat(Not) {
            BinOp::Ne
        } else {
            BinOp::Eq
        };
        Ok(Some(op))
    }

    fn or_equal_to(&mut self) -> Result<bool> {
        if !self.eat(Or) {
            return Ok(false);
        }
        self.consume(Equal, "Expected \"equal\"")?;
        self.consume(To, "Expected \"to\"")?;
        Ok(true)
    }

    fn sum(&mut self) -> Result<Box<Expr>> {
        let mut left = self.product()?;

        loop {
            let op = if self.eat(Plus) {
                BinOp::Add
            } else if self.eat(Minus) {
                BinOp::Sub
            } else {
                break;
            };
            let right = self.product()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn product(&mut self) -> Result<Box<Expr>> {
        let mut left = self.power()?;

        loop {
            let op = if self.eat(Times) {
                BinOp::Mul
            } else if self.eat(Divided) {
                self.consume(By, "Expected \"by\"")?;
                BinOp::Div
            } else if self.eat(Mod) {
                BinOp::Rem
            } else {
                break;
            };
            let right = self.power()?;
            left = binary(op, left, right);
        }

        Ok(left)
    }

    fn power(&mut self) -> Result<Box<Expr>> {
        let left = self.primary()?;

        if self.check(To) && self.check_next(The) {
            self.advance();
            self.advance();
            let right = self.power()?;
            return Ok(binary(BinOp::Pow, left, right));
        }

        Ok(left)
    }

    fn primary(&mut self) -> Result<Box<Expr>> {
        let lo = self.peek().span;
        let kind = if self.eat(Literal {
            kind: LiteralKind::Num,
        }) {
            let token = self.prev();
            match token.symbol.parse() {
                Ok(n) => ExprKind::Literal(Lit::Num(n)),
                Err(_) => return self.handler.mk_err(token.span, ErrorKind::Syntax, "Invalid numeral."),
            }
        } else if self.eat(Literal {
            kind: LiteralKind::Str,
        }) {
            ExprKind::Literal(Lit::Str(self.prev().symbol))
        } else if self.eat(OpenSquare) {
            let elements = self.args(CloseSquare)?;
            self.consume(CloseSquare, "Expected \"]\"")?;
            ExprKind::List(elements)
        } else if self.check(Ident) && self.check_next(OpenParen) {
            ExprKind::Call(self.call()?)
        } else if self.eat(Ident) {
            ExprKind::Variable(self.prev().clone())
        } else if self.eat(OpenParen) {
            let expr = self.expr()?;
            self.consume(CloseParen, "Expected \")\"")?;
            ExprKind::Grouping(expr)
        } else {
            return self.err("Expected an expression");
        };

        Ok(Box::new(Expr {
            kind,
            span: lo.to(self.prev().span),
        }))
    }

    fn err<T>(&self, msg: &str) -> Result<T> {
        let t = self.peek();
        let found = if t.kind == Eof {
            "end of input".to_string()
        } else {
            format!("\"{}\"", self.handler.snippet(t.span))
        };
        self.handler.mk_err(
            t.span,
            ErrorKind::Syntax,
            format!("{}, found {}.", msg, found),
        )
    }

    fn consume(&mut self, kind: TokenKind, msg: &'static str) -> Result<Token> {
        if self.check(kind) {
            self.advance();
            return Ok(self.prev().clone());
        }

        self.err(msg)
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn check_next(&self, kind: TokenKind) -> bool {
        matches!(self.tokens.get(self.pos + 1), Some(t) if t.kind == kind)
    }

    fn peek(&self) -> &Token {
        // `tokenize` always ends the stream with `Eof`.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn prev(&self) -> &Token {
        &self.tokens[self.pos.saturating_sub(1)]
    }

    fn advance(&mut self) {
        if !self.eof() {
            self.pos += 1;
        }
    }

    fn eof(&self) -> bool {
        self.peek().kind == Eof
    }
}

fn binary(op: BinOp, left: Box<Expr>, right: Box<Expr>) -> Box<Expr> {
    Box::new(Expr {
        span: left.span.to(right.span),
        kind: ExprKind::Binary { op, left, right },
    })
}
