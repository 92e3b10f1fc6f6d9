use crate::lex::Span;
use std::{error, fmt, rc::Rc};

pub type Result<T> = std::result::Result<T, CompileError>;

/// Failure categories a caller can match on. Every one of them is fatal to
/// the compile that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    ContextAdd,
    ContextLookup,
    Assign,
    Call,
    Auto,
    Type,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Syntax => f.write_str("SyntaxError"),
            ErrorKind::ContextAdd => f.write_str("ContextAddError"),
            ErrorKind::ContextLookup => f.write_str("ContextLookupError"),
            ErrorKind::Assign => f.write_str("AssignError"),
            ErrorKind::Call => f.write_str("CallError"),
            ErrorKind::Auto => f.write_str("AutoError"),
            ErrorKind::Type => f.write_str("TypeError"),
        }
    }
}

/// 1-based line and column of a source position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Loc {
    pub line: usize,
    pub col: usize,
}

#[derive(Debug, Clone)]
pub struct CompileError {
    kind: ErrorKind,
    msg: String,
    loc: Option<Loc>,
    span: Option<Span>,
}

impl CompileError {
    /// An error with no source location, for checks made after analysis.
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            msg: msg.into(),
            loc: None,
            span: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn msg(&self) -> &str {
        &self.msg
    }

    pub fn loc(&self) -> Option<Loc> {
        self.loc
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(Loc { line, col }) = self.loc {
            write!(f, "Line {}, col {}: ", line, col)?;
        }
        write!(f, "{}: {}", self.kind, self.msg)
    }
}

impl error::Error for CompileError {}

/// Owns the source text so errors can be located and rendered.
#[derive(Debug)]
pub struct Handler {
    src: Rc<str>,
}

impl Handler {
    pub fn new(src: &Rc<str>) -> Self {
        Self { src: src.clone() }
    }

    pub fn snippet(&self, span: Span) -> &str {
        let span = self.clamp(span);
        &self.src[span.lo()..span.hi()]
    }

    pub fn mk_err<T>(&self, span: Span, kind: ErrorKind, msg: impl Into<String>) -> Result<T> {
        Err(self.error(span, kind, msg))
    }

    pub fn error(&self, span: Span, kind: ErrorKind, msg: impl Into<String>) -> CompileError {
        let span = self.clamp(span);
        let err = CompileError {
            kind,
            msg: msg.into(),
            loc: Some(self.loc(span)),
            span: Some(span),
        };
        log::debug!("raising {}", err);
        err
    }

    pub fn loc(&self, span: Span) -> Loc {
        let span = self.clamp(span);
        let lo = self.line_start(span);
        let line = self.src[..lo].matches('\n').count() + 1;
        let col = self.src[lo..span.lo()].chars().count() + 1;
        Loc { line, col }
    }

    /// The offending source line with the error's span underlined, followed
    /// by the message.
    pub fn render(&self, err: &CompileError) -> String {
        let span = match err.span {
            Some(span) => span,
            None => return err.to_string(),
        };

        let lo = self.line_start(span);
        let hi = self.line_end(span);
        let line = &self.src[lo..hi];
        let pad = self.src[lo..span.lo()].chars().count();
        let width = self.src[span.lo()..span.hi().min(hi)].chars().count().max(1);
        format!(
            "{}\n{}{}\n{}",
            line,
            " ".repeat(pad),
            "^".repeat(width),
            err
        )
    }

    fn clamp(&self, span: Span) -> Span {
        let len = self.src.len();
        let lo = floor_char_boundary(&self.src, span.lo().min(len));
        let hi = floor_char_boundary(&self.src, span.hi().min(len).max(lo));
        Span::new(lo, hi)
    }

    fn line_start(&self, span: Span) -> usize {
        self.src[..span.lo()]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    fn line_end(&self, span: Span) -> usize {
        self.src[span.lo()..]
            .find('\n')
            .map(|i| span.lo() + i)
            .unwrap_or_else(|| self.src.len())
    }
}

fn floor_char_boundary(s: &str, mut i: usize) -> usize {
    while !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler(src: &str) -> Handler {
        Handler::new(&Rc::from(src))
    }

    #[test]
    fn loc_counts_lines_and_chars() {
        let h = handler("make x with 1;\nmake π with 2;");
        assert_eq!(h.loc(Span::new(0, 4)), Loc { line: 1, col: 1 });
        assert_eq!(h.loc(Span::new(20, 22)), Loc { line: 2, col: 6 });
        let after_pi = "make x with 1;\nmake π ".len();
        assert_eq!(h.loc(Span::new(after_pi, after_pi + 4)), Loc { line: 2, col: 8 });
    }

    #[test]
    fn display_prefixes_location() {
        let h = handler("change y to 1;");
        let err = h.error(Span::new(7, 8), ErrorKind::ContextLookup, "Identifier 'y' not declared.");
        assert_eq!(
            err.to_string(),
            "Line 1, col 8: ContextLookupError: Identifier 'y' not declared."
        );
        assert_eq!(err.kind(), ErrorKind::ContextLookup);
    }

    #[test]
    fn render_underlines_span() {
        let h = handler("make x with 1;\nbreak;");
        let err = h.error(Span::new(15, 20), ErrorKind::Call, "Break must be called in a loop.");
        let rendered = h.render(&err);
        let mut lines = rendered.lines();
        assert_eq!(lines.next(), Some("break;"));
        assert_eq!(lines.next(), Some("^^^^^"));
        assert!(lines.next().unwrap().contains("CallError"));
    }

    #[test]
    fn out_of_range_span_is_clamped() {
        let h = handler("make");
        assert_eq!(h.loc(Span::new(10, 12)), Loc { line: 1, col: 5 });
    }
}
