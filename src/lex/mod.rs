mod scan;
mod span;
mod token;

pub use scan::Lexer;
pub use span::Span;
pub use token::{LiteralKind, Token, TokenKind};
