use crate::lex::Span;
use crate::symbol::Symbol;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub symbol: Symbol,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, symbol: Symbol, span: Span) -> Self {
        Self { kind, symbol, span }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    // Punctuation.
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    OpenSquare,
    CloseSquare,
    Comma,
    SemiColon,
    Colon,
    Arrow,

    // Literals.
    Ident,
    Literal { kind: LiteralKind },

    // Statement keywords.
    Constantly,
    Make,
    With,
    Change,
    To,
    Add,
    Subtract,
    From,
    Multiply,
    Divide,
    By,
    Raise,
    The,
    Mod,
    Print,
    Automate,
    Output,
    If,
    IfNot,
    Loop,
    While,
    Over,
    In,
    Break,

    // Operator words.
    Plus,
    Minus,
    Times,
    Divided,
    Is,
    Not,
    Greater,
    Less,
    Than,
    Or,
    Equal,

    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LiteralKind {
    Str,
    Num,
}
