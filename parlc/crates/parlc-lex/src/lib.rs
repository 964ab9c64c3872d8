//! parlc-lex - the PArL lexer
//!
//! Tokenization is maximal munch over a hand-coded character-category
//! dispatch: from the current position, the lexer keeps extending the
//! current token while the next character is still a valid continuation
//! for the kind it started (identifier body, digit run, hex run, …), and
//! stops at the first character that isn't. This is the "direct-coded"
//! technique rather than a literal state-transition table — each lexeme
//! family gets its own small function — but the *result* is exactly the
//! DFA the language calls for: every state the grammar needs
//! (identifier-body, integer-body, float-body, colour-digit-1..6,
//! comment/sub-comment, operator disambiguation) corresponds to one loop or
//! branch below.
//!
//! The lexer never fails outright. A malformed lexeme becomes a [`Token`]
//! whose [`TokenKind`] is one of the `Error*` variants, carrying the
//! offending text so the parser (or driver) can report a precise
//! diagnostic; tokenization always resumes after an error token rather than
//! aborting.

use parlc_util::Position;

/// A type-name keyword (`int`, `float`, `bool`, `colour`), kept distinct
/// from `parlc_ast::Type` so this crate does not need to depend on the AST
/// crate merely to describe its own tokens.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeKeyword {
    Int,
    Float,
    Bool,
    Colour,
}

/// Which built-in name a `__`-prefixed identifier resolved to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Delay,
    Write,
    WriteBox,
    Clear,
    Read,
    RandI,
    Width,
    Height,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    Identifier(parlc_util::Symbol),
    IntLiteral(i64),
    FloatLiteral(f64),
    BoolLiteral(bool),
    /// Packed `0xRRGGBB`.
    ColourLiteral(u32),

    Let,
    Fun,
    If,
    Else,
    For,
    While,
    Return,
    As,
    Not,
    And,
    Or,
    Void,

    Type(TypeKeyword),
    Builtin(Builtin),

    Eq,
    EqEq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Semicolon,
    Dot,
    Arrow,

    Eof,

    ErrorInvalidFloat,
    ErrorInvalidColour,
    ErrorUnterminatedComment,
    ErrorNestedComment,
    ErrorStrayCommentClose,
    ErrorInvalid,
}

impl TokenKind {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            TokenKind::ErrorInvalidFloat
                | TokenKind::ErrorInvalidColour
                | TokenKind::ErrorUnterminatedComment
                | TokenKind::ErrorNestedComment
                | TokenKind::ErrorStrayCommentClose
                | TokenKind::ErrorInvalid
        )
    }

    /// A human label for the error kind, used when the parser turns an
    /// error token into a diagnostic message.
    pub fn error_description(&self) -> &'static str {
        match self {
            TokenKind::ErrorInvalidFloat => "invalid float literal",
            TokenKind::ErrorInvalidColour => "invalid colour literal",
            TokenKind::ErrorUnterminatedComment => "unterminated block comment",
            TokenKind::ErrorNestedComment => "nested block comments are not allowed",
            TokenKind::ErrorStrayCommentClose => "stray `*/` with no matching `/*`",
            TokenKind::ErrorInvalid => "unrecognized character",
            _ => "",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub pos: Position,
}

impl Token {
    /// A short human-readable label for diagnostics: the lexeme for
    /// anything with one, `end of input` for the EOF sentinel.
    pub fn lexeme_or_kind(&self) -> String {
        match self.kind {
            TokenKind::Eof => "end of input".to_string(),
            _ => self.lexeme.clone(),
        }
    }
}

/// Folds an identifier's text against the fixed keyword/type-name table,
/// then (for `__`-prefixed names) the builtin-name table, per §4.1's
/// two-table lookup. Returns `None` for an ordinary identifier.
fn keyword_or_type_or_builtin(text: &str) -> Option<TokenKind> {
    Some(match text {
        "let" => TokenKind::Let,
        "fun" => TokenKind::Fun,
        "if" => TokenKind::If,
        "else" => TokenKind::Else,
        "for" => TokenKind::For,
        "while" => TokenKind::While,
        "return" => TokenKind::Return,
        "as" => TokenKind::As,
        "not" => TokenKind::Not,
        "and" => TokenKind::And,
        "or" => TokenKind::Or,
        "void" => TokenKind::Void,
        "true" => TokenKind::BoolLiteral(true),
        "false" => TokenKind::BoolLiteral(false),
        "int" => TokenKind::Type(TypeKeyword::Int),
        "float" => TokenKind::Type(TypeKeyword::Float),
        "bool" => TokenKind::Type(TypeKeyword::Bool),
        "colour" => TokenKind::Type(TypeKeyword::Colour),
        "__print" => TokenKind::Builtin(Builtin::Print),
        "__delay" => TokenKind::Builtin(Builtin::Delay),
        "__write" => TokenKind::Builtin(Builtin::Write),
        "__write_box" => TokenKind::Builtin(Builtin::WriteBox),
        "__clear" => TokenKind::Builtin(Builtin::Clear),
        "__read" => TokenKind::Builtin(Builtin::Read),
        "__random_int" | "__randi" => TokenKind::Builtin(Builtin::RandI),
        "__width" => TokenKind::Builtin(Builtin::Width),
        "__height" => TokenKind::Builtin(Builtin::Height),
        _ => return None,
    })
}

pub struct Lexer<'a> {
    chars: Vec<char>,
    source: &'a str,
    pos: usize,
    line: u32,
    column: u32,
    /// Char index where the token currently being scanned began.
    token_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().collect(),
            source,
            pos: 0,
            line: 1,
            column: 1,
            token_start: 0,
        }
    }

    /// The full source text, kept around for callers that want to render a
    /// diagnostic's source line rather than just its position.
    pub fn source(&self) -> &'a str {
        self.source
    }

    /// Lex the entire input, returning every non-whitespace, non-comment
    /// token, terminated by one trailing `Eof` token. Whitespace and
    /// comments are consumed as part of lexing but never appear in the
    /// returned stream (§4.1): nothing downstream needs to filter them out.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token();
            let done = tok.kind == TokenKind::Eof;
            tokens.push(tok);
            if done {
                break;
            }
        }
        tokens
    }

    fn next_token(&mut self) -> Token {
        if let Some(err) = self.skip_trivia() {
            return err;
        }

        self.token_start = self.pos;
        let start_pos = self.position();
        if self.is_at_end() {
            return Token { kind: TokenKind::Eof, lexeme: String::new(), pos: start_pos };
        }

        let c = self.current();
        match c {
            '(' => self.single(TokenKind::LParen, start_pos),
            ')' => self.single(TokenKind::RParen, start_pos),
            '{' => self.single(TokenKind::LBrace, start_pos),
            '}' => self.single(TokenKind::RBrace, start_pos),
            '[' => self.single(TokenKind::LBracket, start_pos),
            ']' => self.single(TokenKind::RBracket, start_pos),
            ',' => self.single(TokenKind::Comma, start_pos),
            ';' => self.single(TokenKind::Semicolon, start_pos),
            ':' => self.single(TokenKind::Colon, start_pos),
            '.' => self.single(TokenKind::Dot, start_pos),
            '+' => self.single(TokenKind::Plus, start_pos),
            '*' => {
                if self.peek_is('/') {
                    // Stray close with no matching open, at top level.
                    self.advance();
                    self.advance();
                    self.finish(TokenKind::ErrorStrayCommentClose, start_pos)
                } else {
                    self.single(TokenKind::Star, start_pos)
                }
            }
            '/' => self.single(TokenKind::Slash, start_pos),
            '-' => {
                self.advance();
                if self.match_char('>') {
                    self.finish(TokenKind::Arrow, start_pos)
                } else {
                    self.finish(TokenKind::Minus, start_pos)
                }
            }
            '%' => self.single(TokenKind::Percent, start_pos),
            '=' => {
                self.advance();
                if self.match_char('=') {
                    self.finish(TokenKind::EqEq, start_pos)
                } else {
                    self.finish(TokenKind::Eq, start_pos)
                }
            }
            '<' => {
                self.advance();
                if self.match_char('=') {
                    self.finish(TokenKind::LtEq, start_pos)
                } else {
                    self.finish(TokenKind::Lt, start_pos)
                }
            }
            '>' => {
                self.advance();
                if self.match_char('=') {
                    self.finish(TokenKind::GtEq, start_pos)
                } else {
                    self.finish(TokenKind::Gt, start_pos)
                }
            }
            '!' => {
                self.advance();
                if self.match_char('=') {
                    self.finish(TokenKind::NotEq, start_pos)
                } else {
                    self.finish(TokenKind::ErrorInvalid, start_pos)
                }
            }
            '#' => self.lex_colour(start_pos),
            c if c.is_ascii_digit() => self.lex_number(start_pos),
            c if c.is_ascii_alphabetic() || c == '_' => self.lex_identifier(start_pos),
            _ => {
                self.advance();
                self.finish(TokenKind::ErrorInvalid, start_pos)
            }
        }
    }

    // -- trivia -------------------------------------------------------

    /// Skips whitespace and comments. Returns `Some(token)` if a comment
    /// turned out to be malformed (nested or unterminated) — that error
    /// must be surfaced as a real token, not silently swallowed.
    fn skip_trivia(&mut self) -> Option<Token> {
        loop {
            if self.is_at_end() {
                return None;
            }
            match self.current() {
                c if c.is_ascii_whitespace() => {
                    self.advance();
                }
                '/' if self.peek_is('/') => {
                    while !self.is_at_end() && self.current() != '\n' {
                        self.advance();
                    }
                }
                '/' if self.peek_is('*') => {
                    self.token_start = self.pos;
                    let start_pos = self.position();
                    self.advance();
                    self.advance();
                    if let Some(kind) = self.scan_block_comment() {
                        return Some(self.finish(kind, start_pos));
                    }
                }
                _ => return None,
            }
        }
    }

    /// Scans past `/* ... */`, having already consumed the opening `/*`.
    /// Returns `Some(error kind)` if the comment is nested or never closes.
    fn scan_block_comment(&mut self) -> Option<TokenKind> {
        loop {
            if self.is_at_end() {
                return Some(TokenKind::ErrorUnterminatedComment);
            }
            if self.current() == '/' && self.peek_is('*') {
                self.advance();
                self.advance();
                return Some(TokenKind::ErrorNestedComment);
            }
            if self.current() == '*' && self.peek_is('/') {
                self.advance();
                self.advance();
                return None;
            }
            self.advance();
        }
    }

    // -- lexeme families ------------------------------------------------

    fn lex_identifier(&mut self, start_pos: Position) -> Token {
        while !self.is_at_end()
            && (self.current().is_ascii_alphanumeric() || self.current() == '_')
        {
            self.advance();
        }
        let text = self.lexeme_so_far();
        let kind = keyword_or_type_or_builtin(&text)
            .unwrap_or_else(|| TokenKind::Identifier(parlc_util::Symbol::intern(&text)));
        Token { kind, lexeme: text, pos: start_pos }
    }

    fn lex_number(&mut self, start_pos: Position) -> Token {
        while !self.is_at_end() && self.current().is_ascii_digit() {
            self.advance();
        }
        if !self.is_at_end() && self.current() == '.' {
            self.advance();
            if self.is_at_end() || !self.current().is_ascii_digit() {
                // Trailing dot with no fractional digits: §4.1 InvalidFloat.
                return self.finish(TokenKind::ErrorInvalidFloat, start_pos);
            }
            while !self.is_at_end() && self.current().is_ascii_digit() {
                self.advance();
            }
            let text = self.lexeme_so_far();
            let value: f64 = text.parse().unwrap_or(0.0);
            return Token { kind: TokenKind::FloatLiteral(value), lexeme: text, pos: start_pos };
        }
        let text = self.lexeme_so_far();
        let value: i64 = text.parse().unwrap_or(0);
        Token { kind: TokenKind::IntLiteral(value), lexeme: text, pos: start_pos }
    }

    fn lex_colour(&mut self, start_pos: Position) -> Token {
        self.advance(); // consume '#'
        let mut hex_len = 0usize;
        while !self.is_at_end() && self.current().is_ascii_hexdigit() && hex_len < 6 {
            hex_len += 1;
            self.advance();
        }
        // Maximal munch: a 7th hex digit right after six valid ones makes
        // this an over-long, hence invalid, colour literal.
        let trailing_hex = hex_len == 6 && !self.is_at_end() && self.current().is_ascii_hexdigit();
        if hex_len != 6 || trailing_hex {
            while !self.is_at_end() && self.current().is_ascii_alphanumeric() {
                self.advance();
            }
            return self.finish(TokenKind::ErrorInvalidColour, start_pos);
        }
        let hex_text: String = self.chars[self.token_start + 1..self.pos].iter().collect();
        let value = u32::from_str_radix(&hex_text, 16).unwrap_or(0);
        let text = self.lexeme_so_far();
        Token { kind: TokenKind::ColourLiteral(value), lexeme: text, pos: start_pos }
    }

    // -- low-level cursor -------------------------------------------------

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn current(&self) -> char {
        self.chars[self.pos]
    }

    fn peek_is(&self, expected: char) -> bool {
        self.chars.get(self.pos + 1) == Some(&expected)
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn advance(&mut self) {
        if self.is_at_end() {
            return;
        }
        let c = self.chars[self.pos];
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    fn match_char(&mut self, expected: char) -> bool {
        if !self.is_at_end() && self.current() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn single(&mut self, kind: TokenKind, start_pos: Position) -> Token {
        self.advance();
        self.finish(kind, start_pos)
    }

    fn finish(&self, kind: TokenKind, start_pos: Position) -> Token {
        Token { kind, lexeme: self.lexeme_so_far(), pos: start_pos }
    }

    fn lexeme_so_far(&self) -> String {
        self.chars[self.token_start..self.pos].iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_a_var_decl() {
        let ks = kinds("let x: int = 5;");
        assert_eq!(
            ks,
            vec![
                TokenKind::Let,
                TokenKind::Identifier(parlc_util::Symbol::intern("x")),
                TokenKind::Colon,
                TokenKind::Type(TypeKeyword::Int),
                TokenKind::Eq,
                TokenKind::IntLiteral(5),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_float_literal() {
        let ks = kinds("3.14");
        assert_eq!(ks, vec![TokenKind::FloatLiteral(3.14), TokenKind::Eof]);
    }

    #[test]
    fn trailing_dot_is_invalid_float() {
        let ks = kinds("3.");
        assert_eq!(ks, vec![TokenKind::ErrorInvalidFloat, TokenKind::Eof]);
    }

    #[test]
    fn lexes_colour_literal() {
        let ks = kinds("#ff00aa");
        assert_eq!(ks, vec![TokenKind::ColourLiteral(0xff00aa), TokenKind::Eof]);
    }

    #[test]
    fn short_colour_is_invalid() {
        let ks = kinds("#fff;");
        assert_eq!(ks, vec![TokenKind::ErrorInvalidColour, TokenKind::Semicolon, TokenKind::Eof]);
    }

    #[test]
    fn builtin_and_keywords() {
        let ks = kinds("__print(x) and not false");
        assert_eq!(
            ks,
            vec![
                TokenKind::Builtin(Builtin::Print),
                TokenKind::LParen,
                TokenKind::Identifier(parlc_util::Symbol::intern("x")),
                TokenKind::RParen,
                TokenKind::And,
                TokenKind::Not,
                TokenKind::BoolLiteral(false),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_comment_is_skipped() {
        let ks = kinds("1 // comment\n2");
        assert_eq!(ks, vec![TokenKind::IntLiteral(1), TokenKind::IntLiteral(2), TokenKind::Eof]);
    }

    #[test]
    fn block_comment_is_skipped() {
        let ks = kinds("1 /* a block\ncomment */ 2");
        assert_eq!(ks, vec![TokenKind::IntLiteral(1), TokenKind::IntLiteral(2), TokenKind::Eof]);
    }

    #[test]
    fn unterminated_block_comment_is_an_error() {
        let ks = kinds("1 /* never closes");
        assert_eq!(ks, vec![TokenKind::IntLiteral(1), TokenKind::ErrorUnterminatedComment, TokenKind::Eof]);
    }

    #[test]
    fn nested_block_comment_is_an_error() {
        let ks = kinds("/* outer /* inner */ */");
        assert_eq!(
            ks,
            vec![
                TokenKind::ErrorNestedComment,
                TokenKind::Identifier(parlc_util::Symbol::intern("inner")),
                TokenKind::ErrorStrayCommentClose,
                TokenKind::ErrorStrayCommentClose,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn stray_comment_close_is_an_error() {
        let ks = kinds("1 */ 2");
        assert_eq!(
            ks,
            vec![TokenKind::IntLiteral(1), TokenKind::ErrorStrayCommentClose, TokenKind::IntLiteral(2), TokenKind::Eof]
        );
    }

    #[test]
    fn arrow_and_fun_header() {
        let ks = kinds("fun f(x: int) -> int {}");
        assert_eq!(
            ks,
            vec![
                TokenKind::Fun,
                TokenKind::Identifier(parlc_util::Symbol::intern("f")),
                TokenKind::LParen,
                TokenKind::Identifier(parlc_util::Symbol::intern("x")),
                TokenKind::Colon,
                TokenKind::Type(TypeKeyword::Int),
                TokenKind::RParen,
                TokenKind::Arrow,
                TokenKind::Type(TypeKeyword::Int),
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tracks_line_and_column() {
        let tokens = Lexer::new("let\nx").tokenize();
        assert_eq!(tokens[0].pos, Position::new(1, 1));
        assert_eq!(tokens[1].pos, Position::new(2, 1));
    }

    #[test]
    fn comparison_operators_disambiguate() {
        let ks = kinds("< <= > >= == !=");
        assert_eq!(
            ks,
            vec![
                TokenKind::Lt,
                TokenKind::LtEq,
                TokenKind::Gt,
                TokenKind::GtEq,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Eof,
            ]
        );
    }
}
