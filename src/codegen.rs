use crate::{
    err::{CompileError, ErrorKind, Result},
    parse::ast::BinOp,
    symbol::Symbol,
    typeck::hir::*,
};
use std::{collections::HashMap, rc::Rc};

/// Renders `program` as JavaScript source. Fails on a `break` that would
/// have to leave a function body to reach its loop.
pub fn generate(program: &Program) -> Result<String> {
    let mut gen = Generator::default();
    gen.stmts(&program.stmts)?;
    Ok(gen.lines.join("\n"))
}

#[derive(Default)]
struct Generator {
    lines: Vec<String>,
    indent: usize,
    /// Suffix handed to each entity, keyed by the entity's address. Entities
    /// live in the program being generated, so addresses are stable.
    names: HashMap<*const (), usize>,
    /// Loops open inside the function body being generated.
    loops: usize,
    automation: Option<Symbol>,
}

impl Generator {
    fn emit(&mut self, line: String) {
        self.lines.push(format!("{}{}", "  ".repeat(self.indent), line));
    }

    fn block(&mut self, stmts: &[Stmt]) -> Result<()> {
        self.indent += 1;
        self.stmts(stmts)?;
        self.indent -= 1;
        Ok(())
    }

    fn loop_body(&mut self, stmts: &[Stmt]) -> Result<()> {
        self.loops += 1;
        self.block(stmts)?;
        self.loops -= 1;
        Ok(())
    }

    fn stmts(&mut self, stmts: &[Stmt]) -> Result<()> {
        for s in stmts {
            self.stmt(s)?;
        }
        Ok(())
    }

    fn stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            // The analyzer already rejected writes to constants, so `let`
            // serves for both kinds of declaration.
            Stmt::VarDecl(d) => {
                let line = format!(
                    "let {} = {};",
                    self.var(&d.variable),
                    self.expr(&d.initializer)
                );
                self.emit(line);
            }
            Stmt::Assign(a) => {
                let line = format!("{} = {};", self.var(&a.target), self.expr(&a.source));
                self.emit(line);
            }
            Stmt::Change(c) => {
                let line = format!(
                    "{} {}= {};",
                    self.var(&c.target),
                    js_op(c.op),
                    self.expr(&c.term)
                );
                self.emit(line);
            }
            Stmt::Print(p) => {
                let line = format!("console.log({});", self.expr(&p.argument));
                self.emit(line);
            }
            Stmt::AutoDecl(d) => {
                let name = self.target_name(&d.auto, d.auto.name.as_str());
                let params = d
                    .params
                    .iter()
                    .map(|p| self.var(p))
                    .collect::<Vec<_>>()
                    .join(", ");
                self.emit(format!("function {}({}) {{", name, params));
                let loops = std::mem::replace(&mut self.loops, 0);
                let outer = self.automation.replace(d.name);
                self.block(&d.body)?;
                self.loops = loops;
                self.automation = outer;
                self.emit("}".to_string());
            }
            Stmt::Call(c) => {
                let line = format!("{};", self.call(c));
                self.emit(line);
            }
            Stmt::Output(o) => {
                let line = match &o.value {
                    Some(v) => format!("return {};", self.expr(v)),
                    None => "return;".to_string(),
                };
                self.emit(line);
            }
            Stmt::If(s) => {
                let test = self.expr(&s.test);
                self.emit(format!("if ({}) {{", test));
                self.block(&s.body)?;
                if let Some(alt) = &s.alternate {
                    self.emit("} else {".to_string());
                    self.block(&alt.body)?;
                }
                self.emit("}".to_string());
            }
            Stmt::While(w) => {
                let test = self.expr(&w.test);
                self.emit(format!("while ({}) {{", test));
                self.loop_body(&w.body)?;
                self.emit("}".to_string());
            }
            Stmt::For(f) => {
                let line = format!(
                    "for (let {} of {}) {{",
                    self.var(&f.temp_var),
                    self.expr(&f.list)
                );
                self.emit(line);
                self.loop_body(&f.body)?;
                self.emit("}".to_string());
            }
            Stmt::Break => {
                if self.loops == 0 {
                    let name = self.automation.map_or("", |a| a.as_str());
                    return Err(CompileError::new(
                        ErrorKind::Call,
                        format!("Break in automation '{}' cannot leave a loop outside it.", name),
                    ));
                }
                self.emit("break;".to_string());
            }
        }
        Ok(())
    }

    fn expr(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Num(n) => num(*n),
            Expr::Bool(b) => b.to_string(),
            Expr::Str(s) => js_string(s.contents.as_str()),
            Expr::List(l) => {
                let elements = l
                    .elements
                    .iter()
                    .map(|e| self.expr(e))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{}]", elements)
            }
            Expr::Variable(v) => self.var(v),
            Expr::Automation(a) => self.target_name(a, a.name.as_str()),
            Expr::Binary(b) => format!(
                "{} {} {}",
                self.expr(&b.left),
                js_op(b.op),
                self.expr(&b.right)
            ),
            Expr::Compare(b) => format!(
                "{} {} {}",
                self.expr(&b.left),
                js_op(b.op),
                self.expr(&b.right)
            ),
            Expr::Paren(p) => format!("({})", self.expr(&p.contents)),
            Expr::Call(c) => self.call(c),
        }
    }

    /// An expression placed where only a tight-binding operand is valid,
    /// such as before `.length`.
    fn operand(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Binary(_) | Expr::Compare(_) => format!("({})", self.expr(expr)),
            _ => self.expr(expr),
        }
    }

    fn var(&mut self, v: &Rc<Variable>) -> String {
        if v.builtin {
            match v.name.as_str() {
                "π" => return "Math.PI".to_string(),
                "inf" => return "Infinity".to_string(),
                "true" => return "true".to_string(),
                "false" => return "false".to_string(),
                _ => {}
            }
        }
        self.target_name(v, v.name.as_str())
    }

    fn call(&mut self, c: &Call) -> String {
        if c.callee.builtin {
            return self.builtin_call(c);
        }
        let args = c
            .args
            .iter()
            .map(|a| self.expr(a))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({})", self.target_name(&c.callee, c.callee.name.as_str()), args)
    }

    fn builtin_call(&mut self, c: &Call) -> String {
        let args = c
            .args
            .iter()
            .map(|a| self.operand(a))
            .collect::<Vec<_>>();
        match (c.callee.name.as_str(), args.as_slice()) {
            ("append", [e, l]) => format!("{}.push({})", l, e),
            ("remove", [e, l]) => format!(
                "((l, e) => {{ const i = l.indexOf(e); if (i !== -1) l.splice(i, 1); }})({}, {})",
                l, e
            ),
            ("length", [x]) => format!("{}.length", x),
            ("range", [a, b]) => format!(
                "Array.from({{ length: {} - {} }}, (_, i) => {} + i)",
                b, a, a
            ),
            ("type", [x]) => format!("typeof {}", x),
            (name, args) => panic!(
                "no JavaScript rendering for built-in '{}' with {} argument(s)",
                name,
                args.len()
            ),
        }
    }

    /// `name_n`, where `n` counts distinct entities in order of first use.
    fn target_name<T>(&mut self, entity: &Rc<T>, name: &str) -> String {
        let next = self.names.len() + 1;
        let n = *self
            .names
            .entry(Rc::as_ptr(entity) as *const ())
            .or_insert(next);
        format!("{}_{}", name, n)
    }
}

fn js_op(op: BinOp) -> String {
    match op {
        BinOp::Pow => "**".to_string(),
        op => op.to_string(),
    }
}

/// A double-quoted JS literal. Escapes written in the source pass through;
/// raw line terminators, which JS does not allow inside a string, are
/// escaped.
fn js_string(contents: &str) -> String {
    let mut out = String::with_capacity(contents.len() + 2);
    out.push('"');
    let mut chars = contents.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{2028}' => out.push_str("\\u2028"),
            '\u{2029}' => out.push_str("\\u2029"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Negative literals are wrapped so that `**` and binary minus stay valid.
fn num(n: f64) -> String {
    if n.is_sign_negative() {
        format!("({})", n)
    } else {
        n.to_string()
    }
}
