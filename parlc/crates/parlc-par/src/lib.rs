//! parlc-par - the PArL parser
//!
//! A hand-written recursive-descent parser, one function per grammar rule
//! in §4.2, mirroring the precedence chain named there directly:
//! `logic_or -> logic_and -> relational -> additive -> multiplicative ->
//! cast -> unary -> primary`. Each level is a thin left-associative loop
//! over the level below it; there is no generic binding-power table,
//! because PArL's precedence is fixed and small enough that naming each
//! level is clearer than generalizing over it.
//!
//! Errors are collected into a [`parlc_util::Handler`] rather than
//! aborting: on a mismatch the parser records a diagnostic and
//! panic-mode-recovers to the next synchronizing token (`;`, `{`, `}`, or a
//! statement-starting keyword), so a single run can report more than one
//! syntax error. A `None` return from an internal `parse_*` method means
//! "a diagnostic was already recorded for this construct"; callers either
//! propagate the `None` upward or, at a synchronization point, swallow it
//! and keep going.

use parlc_ast::{
    Block, BinOp, Expr, FormalParameter, LValue, LiteralValue, Program, Stmt, Type, UnOp,
};
use parlc_lex::{Builtin, Token, TokenKind, TypeKeyword};
use parlc_util::{Handler, Position, Symbol};

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    handler: &'a mut Handler,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, handler: &'a mut Handler) -> Self {
        Self { tokens, pos: 0, handler }
    }

    /// Parses the whole token stream into a [`Program`]. Always returns a
    /// (possibly partial) program; check `handler.has_errors()` to know
    /// whether it is safe to hand to the semantic analyzer.
    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while !self.at_eof() {
            match self.parse_statement() {
                Some(stmt) => statements.push(stmt),
                None => self.synchronize(),
            }
        }
        Program { statements }
    }

    // -- token cursor -----------------------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn pos_here(&self) -> Position {
        self.current().pos
    }

    fn at_eof(&self) -> bool {
        matches!(self.kind(), TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.current().clone();
        if !self.at_eof() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.kind() == kind
    }

    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consumes `kind` or records an `UnexpectedToken` diagnostic.
    fn expect(&mut self, kind: TokenKind, what: &str) -> Option<Token> {
        if self.check(&kind) {
            Some(self.advance())
        } else {
            self.unexpected(what);
            None
        }
    }

    fn unexpected(&mut self, expected: &str) {
        if self.current().kind.is_error() {
            let desc = self.current().kind.error_description();
            self.handler.error(self.pos_here(), format!("lexical error: {desc}"));
        } else {
            self.handler.error(
                self.pos_here(),
                format!("expected {expected}, found `{}`", self.current().lexeme_or_kind()),
            );
        }
    }

    /// Panic-mode recovery: discard tokens until a synchronizing one.
    fn synchronize(&mut self) {
        if self.at_eof() {
            return;
        }
        self.advance();
        while !self.at_eof() {
            if matches!(self.tokens[self.pos - 1].kind, TokenKind::Semicolon | TokenKind::RBrace) {
                return;
            }
            if matches!(
                self.kind(),
                TokenKind::Let
                    | TokenKind::Fun
                    | TokenKind::If
                    | TokenKind::While
                    | TokenKind::For
                    | TokenKind::Return
                    | TokenKind::LBrace
                    | TokenKind::Builtin(_)
            ) {
                return;
            }
            self.advance();
        }
    }

    fn ident(&mut self) -> Option<(Symbol, Position)> {
        let pos = self.pos_here();
        if let TokenKind::Identifier(sym) = self.kind().clone() {
            self.advance();
            Some((sym, pos))
        } else {
            self.unexpected("an identifier");
            None
        }
    }

    // -- statements ---------------------------------------------------------

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.kind().clone() {
            TokenKind::Fun => self.parse_function_decl(),
            TokenKind::Let => {
                let stmt = self.parse_var_decl()?;
                self.expect(TokenKind::Semicolon, "`;`")?;
                Some(stmt)
            }
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => {
                let stmt = self.parse_return()?;
                self.expect(TokenKind::Semicolon, "`;`")?;
                Some(stmt)
            }
            TokenKind::LBrace => {
                let pos = self.pos_here();
                let block = self.parse_block()?;
                Some(Stmt::Block { block, pos })
            }
            TokenKind::Builtin(b) => {
                let stmt = self.parse_builtin_statement(b)?;
                self.expect(TokenKind::Semicolon, "`;`")?;
                Some(stmt)
            }
            _ => {
                let stmt = self.parse_assignment_or_expr_stmt()?;
                self.expect(TokenKind::Semicolon, "`;`")?;
                Some(stmt)
            }
        }
    }

    fn parse_block(&mut self) -> Option<Block> {
        self.expect(TokenKind::LBrace, "`{`")?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_eof() {
            match self.parse_statement() {
                Some(stmt) => statements.push(stmt),
                None => self.synchronize(),
            }
        }
        self.expect(TokenKind::RBrace, "`}`")?;
        Some(Block { statements })
    }

    fn parse_function_decl(&mut self) -> Option<Stmt> {
        let pos = self.pos_here();
        self.advance(); // `fun`
        let (name, _) = self.ident()?;
        self.expect(TokenKind::LParen, "`(`")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.parse_param()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen, "`)`")?;
        self.expect(TokenKind::Arrow, "`->`")?;
        let return_type = self.parse_return_type()?;
        let body = self.parse_block()?;
        Some(Stmt::FunctionDecl { name, params, return_type, body, pos })
    }

    fn parse_param(&mut self) -> Option<FormalParameter> {
        let pos = self.pos_here();
        let (name, _) = self.ident()?;
        self.expect(TokenKind::Colon, "`:`")?;
        let ty = self.parse_type()?;
        Some(FormalParameter { name, ty, pos })
    }

    /// A return type is an ordinary `Type`, with the literal keyword `void`
    /// accepted only in this position (§3.2 supplement).
    fn parse_return_type(&mut self) -> Option<Type> {
        if self.match_token(&TokenKind::Void) {
            Some(Type::Void)
        } else {
            self.parse_type()
        }
    }

    fn parse_type(&mut self) -> Option<Type> {
        let base = match self.kind().clone() {
            TokenKind::Type(TypeKeyword::Int) => Type::Int,
            TokenKind::Type(TypeKeyword::Float) => Type::Float,
            TokenKind::Type(TypeKeyword::Bool) => Type::Bool,
            TokenKind::Type(TypeKeyword::Colour) => Type::Colour,
            _ => {
                self.unexpected("a type name");
                return None;
            }
        };
        self.advance();
        if self.match_token(&TokenKind::LBracket) {
            let size = if let TokenKind::IntLiteral(n) = self.kind().clone() {
                self.advance();
                Some(n as u32)
            } else {
                None
            };
            self.expect(TokenKind::RBracket, "`]`")?;
            Some(Type::Array(Box::new(base), size))
        } else {
            Some(base)
        }
    }

    fn parse_var_decl(&mut self) -> Option<Stmt> {
        let pos = self.pos_here();
        self.advance(); // `let`
        let (name, _) = self.ident()?;
        self.expect(TokenKind::Colon, "`:`")?;
        let ty = self.parse_type()?;
        let initializer = if self.match_token(&TokenKind::Eq) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Some(Stmt::VarDecl { name, ty, initializer, pos })
    }

    fn parse_if(&mut self) -> Option<Stmt> {
        let pos = self.pos_here();
        self.advance(); // `if`
        self.expect(TokenKind::LParen, "`(`")?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen, "`)`")?;
        let then_block = self.parse_block()?;
        let else_block = if self.match_token(&TokenKind::Else) {
            Some(self.parse_block()?)
        } else {
            None
        };
        Some(Stmt::If { cond, then_block, else_block, pos })
    }

    fn parse_while(&mut self) -> Option<Stmt> {
        let pos = self.pos_here();
        self.advance(); // `while`
        self.expect(TokenKind::LParen, "`(`")?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen, "`)`")?;
        let body = self.parse_block()?;
        Some(Stmt::While { cond, body, pos })
    }

    fn parse_for(&mut self) -> Option<Stmt> {
        let pos = self.pos_here();
        self.advance(); // `for`
        self.expect(TokenKind::LParen, "`(`")?;
        let init = if self.check(&TokenKind::Semicolon) {
            None
        } else if self.check(&TokenKind::Let) {
            Some(Box::new(self.parse_var_decl()?))
        } else {
            Some(Box::new(self.parse_assignment_or_expr_stmt()?))
        };
        self.expect(TokenKind::Semicolon, "`;`")?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Semicolon, "`;`")?;
        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.parse_assignment_or_expr_stmt()?))
        };
        self.expect(TokenKind::RParen, "`)`")?;
        let body = self.parse_block()?;
        Some(Stmt::For { init, cond, update, body, pos })
    }

    fn parse_return(&mut self) -> Option<Stmt> {
        let pos = self.pos_here();
        self.advance(); // `return`
        let expr = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.parse_expr()?)
        };
        Some(Stmt::Return { expr, pos })
    }

    /// `ident "=" Expr` or a bare expression statement — distinguished by
    /// parsing a full expression first (which already covers plain
    /// identifiers, indexing, and calls) and only then checking for `=`.
    /// Per §3.3 the assignment target is restricted to `Identifier` or
    /// `IndexAccess`; anything else before `=` is a parse error.
    fn parse_assignment_or_expr_stmt(&mut self) -> Option<Stmt> {
        let pos = self.pos_here();
        let expr = self.parse_expr()?;
        if self.match_token(&TokenKind::Eq) {
            let target = self.expr_to_lvalue(expr)?;
            let value = self.parse_expr()?;
            Some(Stmt::Assignment { target, value, pos })
        } else {
            Some(Stmt::ExprStmt { expr, pos })
        }
    }

    fn expr_to_lvalue(&mut self, expr: Expr) -> Option<LValue> {
        match expr {
            Expr::Identifier { name, pos } => Some(LValue::Identifier { name, pos }),
            Expr::Index { base, index, pos } => match *base {
                Expr::Identifier { name, .. } => Some(LValue::Index { name, index, pos }),
                _ => {
                    self.handler.error(pos, "invalid assignment target".to_string());
                    None
                }
            },
            other => {
                self.handler.error(other.pos(), "invalid assignment target".to_string());
                None
            }
        }
    }

    fn parse_builtin_statement(&mut self, b: Builtin) -> Option<Stmt> {
        let pos = self.pos_here();
        self.advance(); // the builtin token itself
        match b {
            Builtin::Print => Some(Stmt::Print { expr: self.parse_expr()?, pos }),
            Builtin::Delay => Some(Stmt::Delay { expr: self.parse_expr()?, pos }),
            Builtin::Clear => Some(Stmt::Clear { color: self.parse_expr()?, pos }),
            Builtin::Write => {
                let x = self.parse_expr()?;
                self.expect(TokenKind::Comma, "`,`")?;
                let y = self.parse_expr()?;
                self.expect(TokenKind::Comma, "`,`")?;
                let color = self.parse_expr()?;
                Some(Stmt::Write { x, y, color, pos })
            }
            Builtin::WriteBox => {
                let x = self.parse_expr()?;
                self.expect(TokenKind::Comma, "`,`")?;
                let y = self.parse_expr()?;
                self.expect(TokenKind::Comma, "`,`")?;
                let w = self.parse_expr()?;
                self.expect(TokenKind::Comma, "`,`")?;
                let h = self.parse_expr()?;
                self.expect(TokenKind::Comma, "`,`")?;
                let color = self.parse_expr()?;
                Some(Stmt::WriteBox { x, y, w, h, color, pos })
            }
            // __width/__height/__read/__randi are builtin *expressions*;
            // reaching here means one was used bare as a statement.
            Builtin::Read | Builtin::RandI | Builtin::Width | Builtin::Height => {
                self.pos -= 1;
                let expr = self.parse_expr()?;
                Some(Stmt::ExprStmt { expr, pos })
            }
        }
    }

    // -- expressions: one function per precedence level -------------------

    fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_logic_or()
    }

    fn parse_logic_or(&mut self) -> Option<Expr> {
        let mut left = self.parse_logic_and()?;
        while self.check(&TokenKind::Or) {
            let pos = self.pos_here();
            self.advance();
            let right = self.parse_logic_and()?;
            left = Expr::Binary { left: Box::new(left), op: BinOp::Or, right: Box::new(right), pos };
        }
        Some(left)
    }

    fn parse_logic_and(&mut self) -> Option<Expr> {
        let mut left = self.parse_relational()?;
        while self.check(&TokenKind::And) {
            let pos = self.pos_here();
            self.advance();
            let right = self.parse_relational()?;
            left = Expr::Binary { left: Box::new(left), op: BinOp::And, right: Box::new(right), pos };
        }
        Some(left)
    }

    fn parse_relational(&mut self) -> Option<Expr> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.kind() {
                TokenKind::EqEq => BinOp::Eq,
                TokenKind::NotEq => BinOp::NotEq,
                TokenKind::Lt => BinOp::Lt,
                TokenKind::Gt => BinOp::Gt,
                TokenKind::LtEq => BinOp::LtEq,
                TokenKind::GtEq => BinOp::GtEq,
                _ => break,
            };
            let pos = self.pos_here();
            self.advance();
            let right = self.parse_additive()?;
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), pos };
        }
        Some(left)
    }

    fn parse_additive(&mut self) -> Option<Expr> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            let pos = self.pos_here();
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), pos };
        }
        Some(left)
    }

    fn parse_multiplicative(&mut self) -> Option<Expr> {
        let mut left = self.parse_cast()?;
        loop {
            let op = match self.kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                TokenKind::Percent => BinOp::Mod,
                _ => break,
            };
            let pos = self.pos_here();
            self.advance();
            let right = self.parse_cast()?;
            left = Expr::Binary { left: Box::new(left), op, right: Box::new(right), pos };
        }
        Some(left)
    }

    /// Cast is postfix and non-associative: a second `as` on the same
    /// expression requires parentheses, so this does not loop.
    fn parse_cast(&mut self) -> Option<Expr> {
        let expr = self.parse_unary()?;
        if self.match_token(&TokenKind::As) {
            let pos = expr.pos();
            let target_type = self.parse_base_type()?;
            Some(Expr::Cast { expr: Box::new(expr), target_type, pos })
        } else {
            Some(expr)
        }
    }

    fn parse_base_type(&mut self) -> Option<Type> {
        let ty = match self.kind().clone() {
            TokenKind::Type(TypeKeyword::Int) => Type::Int,
            TokenKind::Type(TypeKeyword::Float) => Type::Float,
            TokenKind::Type(TypeKeyword::Bool) => Type::Bool,
            TokenKind::Type(TypeKeyword::Colour) => Type::Colour,
            _ => {
                self.unexpected("a type name");
                return None;
            }
        };
        self.advance();
        Some(ty)
    }

    fn parse_unary(&mut self) -> Option<Expr> {
        let pos = self.pos_here();
        match self.kind() {
            TokenKind::Minus => {
                self.advance();
                let operand = self.parse_unary()?;
                Some(Expr::Unary { op: UnOp::Neg, operand: Box::new(operand), pos })
            }
            TokenKind::Not => {
                self.advance();
                let operand = self.parse_unary()?;
                Some(Expr::Unary { op: UnOp::Not, operand: Box::new(operand), pos })
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Option<Expr> {
        let pos = self.pos_here();
        match self.kind().clone() {
            TokenKind::IntLiteral(v) => {
                self.advance();
                Some(Expr::Literal { value: LiteralValue::Int(v), ty: Type::Int, pos })
            }
            TokenKind::FloatLiteral(v) => {
                self.advance();
                Some(Expr::Literal { value: LiteralValue::Float(v), ty: Type::Float, pos })
            }
            TokenKind::BoolLiteral(v) => {
                self.advance();
                Some(Expr::Literal { value: LiteralValue::Bool(v), ty: Type::Bool, pos })
            }
            TokenKind::ColourLiteral(v) => {
                self.advance();
                Some(Expr::Literal { value: LiteralValue::Colour(v), ty: Type::Colour, pos })
            }
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Some(inner)
            }
            TokenKind::Builtin(b) => self.parse_builtin_expr(b, pos),
            TokenKind::Identifier(name) => {
                self.advance();
                if self.match_token(&TokenKind::LParen) {
                    let args = self.parse_args()?;
                    self.expect(TokenKind::RParen, "`)`")?;
                    Some(Expr::Call { name, args, pos })
                } else if self.match_token(&TokenKind::LBracket) {
                    let index = self.parse_expr()?;
                    self.expect(TokenKind::RBracket, "`]`")?;
                    Some(Expr::Index {
                        base: Box::new(Expr::Identifier { name, pos }),
                        index: Box::new(index),
                        pos,
                    })
                } else {
                    Some(Expr::Identifier { name, pos })
                }
            }
            _ => {
                self.unexpected("an expression");
                None
            }
        }
    }

    fn parse_array_literal(&mut self) -> Option<Expr> {
        let pos = self.pos_here();
        self.advance(); // `[`
        let mut elements = Vec::new();
        if !self.check(&TokenKind::RBracket) {
            loop {
                elements.push(self.parse_expr()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RBracket, "`]`")?;
        Some(Expr::ArrayLiteral { elements, pos })
    }

    fn parse_args(&mut self) -> Option<Vec<Expr>> {
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.match_token(&TokenKind::Comma) {
                    break;
                }
            }
        }
        Some(args)
    }

    fn parse_builtin_expr(&mut self, b: Builtin, pos: Position) -> Option<Expr> {
        self.advance();
        match b {
            Builtin::Width => Some(Expr::Width { pos }),
            Builtin::Height => Some(Expr::Height { pos }),
            Builtin::Read => {
                self.expect(TokenKind::LParen, "`(`")?;
                let x = self.parse_expr()?;
                self.expect(TokenKind::Comma, "`,`")?;
                let y = self.parse_expr()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Some(Expr::Read { x: Box::new(x), y: Box::new(y), pos })
            }
            Builtin::RandI => {
                self.expect(TokenKind::LParen, "`(`")?;
                let max = self.parse_expr()?;
                self.expect(TokenKind::RParen, "`)`")?;
                Some(Expr::RandI { max: Box::new(max), pos })
            }
            // __print/__delay/__write/__write_box/__clear are statement-only
            // builtins; used here they are a malformed construct.
            Builtin::Print | Builtin::Delay | Builtin::Write | Builtin::WriteBox | Builtin::Clear => {
                self.handler.error(pos, "this built-in may only be used as a statement".to_string());
                None
            }
        }
    }
}

/// Convenience entry point: lex and parse `source` in one call.
pub fn parse(source: &str, handler: &mut Handler) -> Program {
    let tokens = parlc_lex::Lexer::new(source).tokenize();
    let mut parser = Parser::new(tokens, handler);
    parser.parse_program()
}
