use super::token::LiteralKind;
use crate::{
    err::{ErrorKind, Handler, Result},
    lex::{Span, Token, TokenKind, TokenKind::*},
    symbol::Symbol,
};
use std::{collections::HashMap, rc::Rc};

pub struct Lexer {
    src: Rc<str>,
    start_pos: usize,
    pos: usize,
    keywords: HashMap<Symbol, TokenKind>,
    handler: Rc<Handler>,
}

impl Lexer {
    pub fn new(src: Rc<str>, handler: &Rc<Handler>) -> Self {
        Self {
            src,
            start_pos: 0,
            pos: 0,
            keywords: keywords(),
            handler: handler.clone(),
        }
    }

    /// Scans the whole source. The returned tokens always end with `Eof`.
    pub fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = vec![];
        loop {
            let t = self.next_token()?;
            let eof = t.kind == Eof;
            tokens.push(t);
            if eof {
                return Ok(tokens);
            }
        }
    }

    pub fn next_token(&mut self) -> Result<Token> {
        while !self.eof() {
            self.start_pos = self.pos;
            if let Some(t) = self.scan_token()? {
                return Ok(t);
            }
        }

        Ok(Token {
            kind: Eof,
            span: Span::new(self.src.len(), self.src.len()),
            symbol: Symbol::intern(""),
        })
    }

    fn scan_token(&mut self) -> Result<Option<Token>> {
        let c = self.peek();
        self.advance();
        let t = match c {
            '(' => self.add_token(OpenParen),
            ')' => self.add_token(CloseParen),
            '{' => self.add_token(OpenBrace),
            '}' => self.add_token(CloseBrace),
            '[' => self.add_token(OpenSquare),
            ']' => self.add_token(CloseSquare),
            ',' => self.add_token(Comma),
            ';' => self.add_token(SemiColon),
            ':' => self.add_token(Colon),
            '-' => {
                if self.eat('>') {
                    self.add_token(Arrow)
                } else if self.peek().is_ascii_digit() {
                    self.number()
                } else {
                    return self.unexpected(c);
                }
            }
            '/' => {
                if self.eat('/') {
                    self.comment();
                    return Ok(None);
                } else {
                    return self.unexpected(c);
                }
            }
            ' ' | '\r' | '\t' | '\n' => return Ok(None),
            '"' => self.string()?,
            c if c.is_ascii_digit() => self.number(),
            c if is_ident_start(c) => self.ident(),
            _ => return self.unexpected(c),
        };
        Ok(Some(t))
    }

    fn unexpected<T>(&self, c: char) -> Result<T> {
        self.handler.mk_err(
            self.mk_span(),
            ErrorKind::Syntax,
            format!("Unexpected character '{}'.", c),
        )
    }

    fn add_token(&mut self, kind: TokenKind) -> Token {
        let symbol = self.mk_symbol();
        self.add_token_with_symbol(kind, symbol)
    }

    fn add_token_with_symbol(&mut self, kind: TokenKind, symbol: Symbol) -> Token {
        Token::new(kind, symbol, self.mk_span())
    }

    fn mk_span(&self) -> Span {
        Span::new(self.start_pos, self.pos)
    }

    fn mk_symbol(&self) -> Symbol {
        let s = &self.src[self.start_pos..self.pos];
        Symbol::intern(s)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == c {
            self.advance();
            true
        } else {
            false
        }
    }

    fn string(&mut self) -> Result<Token> {
        while !self.eof() && self.peek() != '"' {
            if self.eat('\\') && self.eof() {
                break;
            }
            self.advance();
        }

        if self.eof() {
            return self
                .handler
                .mk_err(self.mk_span(), ErrorKind::Syntax, "Unterminated string.");
        }

        // Eat the closing ".
        self.advance();

        let symbol = Symbol::intern(&self.src[self.start_pos + 1..self.pos - 1]);
        Ok(self.add_token_with_symbol(Literal { kind: LiteralKind::Str }, symbol))
    }

    fn number(&mut self) -> Token {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        self.add_token(Literal {
            kind: LiteralKind::Num,
        })
    }

    fn ident(&mut self) -> Token {
        while is_ident_continue(self.peek()) {
            self.advance();
        }

        let symbol = self.mk_symbol();
        let kind = self.keywords.get(&symbol).copied().unwrap_or(Ident);
        self.add_token(kind)
    }

    fn comment(&mut self) {
        while self.peek() != '\n' && !self.eof() {
            self.advance();
        }
    }

    fn eof(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> char {
        self.src[self.pos..].chars().next().unwrap_or_default()
    }

    fn peek_next(&self) -> char {
        self.src[self.pos..].chars().nth(1).unwrap_or_default()
    }

    fn advance(&mut self) {
        if !self.eof() {
            self.pos += self.peek().len_utf8();
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn keywords() -> HashMap<Symbol, TokenKind> {
    let mut m = HashMap::new();
    m.insert(Symbol::intern("constantly"), Constantly);
    m.insert(Symbol::intern("make"), Make);
    m.insert(Symbol::intern("with"), With);
    m.insert(Symbol::intern("change"), Change);
    m.insert(Symbol::intern("to"), To);
    m.insert(Symbol::intern("add"), Add);
    m.insert(Symbol::intern("subtract"), Subtract);
    m.insert(Symbol::intern("from"), From);
    m.insert(Symbol::intern("multiply"), Multiply);
    m.insert(Symbol::intern("divide"), Divide);
    m.insert(Symbol::intern("by"), By);
    m.insert(Symbol::intern("raise"), Raise);
    m.insert(Symbol::intern("the"), The);
    m.insert(Symbol::intern("mod"), Mod);
    m.insert(Symbol::intern("print"), Print);
    m.insert(Symbol::intern("automate"), Automate);
    m.insert(Symbol::intern("output"), Output);
    m.insert(Symbol::intern("if"), If);
    m.insert(Symbol::intern("ifnot"), IfNot);
    m.insert(Symbol::intern("loop"), Loop);
    m.insert(Symbol::intern("while"), While);
    m.insert(Symbol::intern("over"), Over);
    m.insert(Symbol::intern("in"), In);
    m.insert(Symbol::intern("break"), Break);
    m.insert(Symbol::intern("plus"), Plus);
    m.insert(Symbol::intern("minus"), Minus);
    m.insert(Symbol::intern("times"), Times);
    m.insert(Symbol::intern("divided"), Divided);
    m.insert(Symbol::intern("is"), Is);
    m.insert(Symbol::intern("not"), Not);
    m.insert(Symbol::intern("greater"), Greater);
    m.insert(Symbol::intern("less"), Less);
    m.insert(Symbol::intern("than"), Than);
    m.insert(Symbol::intern("or"), Or);
    m.insert(Symbol::intern("equal"), Equal);
    m
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let src: Rc<str> = Rc::from(src);
        let handler = Rc::new(Handler::new(&src));
        Lexer::new(src, &handler)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn lex_err(src: &str) -> String {
        let src: Rc<str> = Rc::from(src);
        let handler = Rc::new(Handler::new(&src));
        Lexer::new(src, &handler).tokenize().unwrap_err().to_string()
    }

    #[test]
    fn keywords_and_idents() {
        assert_eq!(
            kinds("constantly make x with π;"),
            vec![Constantly, Make, Ident, With, Ident, SemiColon, Eof]
        );
    }

    #[test]
    fn negative_numbers_and_arrow() {
        let num = Literal {
            kind: LiteralKind::Num,
        };
        assert_eq!(
            kinds("-8 -> 1.5 // trailing comment"),
            vec![num, Arrow, num, Eof]
        );
    }

    #[test]
    fn string_keeps_escaped_quote() {
        let src: Rc<str> = Rc::from(r#"print "say \"hi\"";"#);
        let handler = Rc::new(Handler::new(&src));
        let tokens = Lexer::new(src, &handler).tokenize().unwrap();
        assert_eq!(tokens[1].symbol.as_str(), r#"say \"hi\""#);
    }

    #[test]
    fn unterminated_string() {
        assert!(lex_err("make x with \"abc").contains("Unterminated string"));
    }

    #[test]
    fn backslash_at_end_of_input() {
        let msg = lex_err("print \"abc\\");
        assert_eq!(msg, "Line 1, col 7: SyntaxError: Unterminated string.");
        assert!(lex_err("print \"\\").contains("Unterminated string"));
    }

    #[test]
    fn stray_character() {
        let msg = lex_err("make x with 1 + 2;");
        assert_eq!(msg, "Line 1, col 15: SyntaxError: Unexpected character '+'.");
    }
}
