#[macro_use]
extern crate anyhow;

use self::{err::Handler, optimize::Passes, typeck::hir::Program};
use std::{fmt, rc::Rc, str::FromStr};

pub mod args;
pub mod codegen;
pub mod err;
pub mod lex;
pub mod optimize;
pub mod parse;
pub mod symbol;
pub mod typeck;

pub use args::Args;
pub use err::{CompileError, ErrorKind, Loc, Result};

/// How far a compile runs, and so which representation it hands back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parsed,
    Analyzed,
    Optimized,
    Js,
}

impl Stage {
    pub const NAMES: [&'static str; 4] = ["parsed", "analyzed", "optimized", "js"];
}

impl FromStr for Stage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "parsed" => Ok(Stage::Parsed),
            "analyzed" => Ok(Stage::Analyzed),
            "optimized" => Ok(Stage::Optimized),
            "js" => Ok(Stage::Js),
            _ => bail!(
                "unknown output '{}', expected one of: {}",
                s,
                Stage::NAMES.join(", ")
            ),
        }
    }
}

#[derive(Debug)]
pub enum Output {
    Parsed(parse::ast::Ast),
    Analyzed(Program),
    Optimized(Program),
    Js(String),
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Parsed(ast) => write!(f, "{:#?}", ast),
            Output::Analyzed(p) | Output::Optimized(p) => write!(f, "{:#?}", p),
            Output::Js(js) => f.write_str(js),
        }
    }
}

#[derive(Default)]
pub struct Compiler {
    passes: Passes,
}

impl Compiler {
    pub fn new(passes: Passes) -> Self {
        Self { passes }
    }

    /// Runs the pipeline on `src` up to and including `stage`. Every compile
    /// starts from a fresh standard library.
    pub fn compile(&self, src: &str, stage: Stage) -> Result<Output> {
        let src: Rc<str> = Rc::from(src);
        let handler = Rc::new(Handler::new(&src));

        let ast = parse::parse(&src, &handler)?;
        log::debug!("parsed {} statement(s)", ast.stmts.len());
        if stage == Stage::Parsed {
            return Ok(Output::Parsed(ast));
        }

        let program = typeck::analyze(ast, typeck::prelude(), &handler)?;
        log::debug!("analysis finished");
        if stage == Stage::Analyzed {
            return Ok(Output::Analyzed(program));
        }

        let program = optimize::optimize(program, self.passes);
        if stage == Stage::Optimized {
            return Ok(Output::Optimized(program));
        }

        let js = codegen::generate(&program)?;
        log::debug!("generated {} line(s) of JavaScript", js.lines().count());
        Ok(Output::Js(js))
    }

    /// `err` as it should be shown to a person: the offending line with the
    /// error underlined, followed by the message.
    pub fn render_error(src: &str, err: &CompileError) -> String {
        let src: Rc<str> = Rc::from(src);
        Handler::new(&src).render(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names() {
        for name in Stage::NAMES.iter() {
            assert!(name.parse::<Stage>().is_ok());
        }
        let err = "bytecode".parse::<Stage>().unwrap_err();
        assert!(err.to_string().contains("parsed, analyzed, optimized, js"));
    }

    #[test]
    fn js_stage_skips_optimizer_when_disabled() {
        let c = Compiler::new(Passes::empty());
        let out = c.compile("print 1 plus 2;", Stage::Js).unwrap();
        assert_eq!(out.to_string(), "console.log(1 + 2);");

        let out = Compiler::default().compile("print 1 plus 2;", Stage::Js).unwrap();
        assert_eq!(out.to_string(), "console.log(3);");
    }

    #[test]
    fn stops_at_requested_stage() {
        let c = Compiler::default();
        assert!(matches!(c.compile("print 1;", Stage::Parsed), Ok(Output::Parsed(_))));
        assert!(matches!(c.compile("print 1;", Stage::Analyzed), Ok(Output::Analyzed(_))));
        assert!(matches!(c.compile("print 1;", Stage::Optimized), Ok(Output::Optimized(_))));
    }

    #[test]
    fn syntax_errors_stop_before_analysis() {
        let err = Compiler::default()
            .compile("print undeclared", Stage::Parsed)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
    }
}
