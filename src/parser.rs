// ABOUTME: Recursive-descent parser turning tokens into the Jyro AST

use crate::ast::{
    AssignOp, BinaryOp, Expr, ExprKind, Literal, ObjectKey, Program, Stmt, StmtKind, SwitchCase,
    UnaryOp,
};
use crate::diagnostics::{Diagnostic, MessageCode, Span, Stage};
use crate::lexer::{self, Keyword, Token, TokenKind};
use crate::value::ValueType;

/// Parses a script from source, reporting the first lexing or parsing error.
pub fn parse(source: &str) -> Result<Program, Diagnostic> {
    let tokens = lexer::tokenize(source)?;
    parse_tokens(tokens)
}

/// Parses a pre-tokenized script.
pub fn parse_tokens(tokens: Vec<Token>) -> Result<Program, Diagnostic> {
    let mut parser = Parser { tokens, pos: 0 };
    let statements = parser.parse_statements(&[])?;
    parser.expect_eof()?;
    Ok(Program { statements })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_span(&self) -> Span {
        self.peek().span
    }

    fn peek_ahead(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        matches!(self.peek_kind(), TokenKind::Keyword(k) if *k == kw)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn unexpected(&self, expected: &str) -> Diagnostic {
        let token = self.peek();
        if token.kind == TokenKind::Eof {
            Diagnostic::error(
                MessageCode::UnexpectedEndOfInput,
                Stage::Parsing,
                token.span,
                vec![expected.to_string()],
            )
        } else {
            Diagnostic::error(
                MessageCode::UnexpectedToken,
                Stage::Parsing,
                token.span,
                vec![token.kind.describe(), expected.to_string()],
            )
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, Diagnostic> {
        if self.peek_kind() == &kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<Token, Diagnostic> {
        if self.at_keyword(kw) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(&format!("'{}'", kw.text())))
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<(String, Span), Diagnostic> {
        match self.peek_kind() {
            TokenKind::Identifier(_) => {
                let token = self.advance();
                match token.kind {
                    TokenKind::Identifier(name) => Ok((name, token.span)),
                    _ => unreachable!(),
                }
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn expect_eof(&mut self) -> Result<(), Diagnostic> {
        if self.peek_kind() == &TokenKind::Eof {
            Ok(())
        } else {
            Err(self.unexpected("a statement"))
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    /// Parses statements until one of the terminator keywords (or end of
    /// input when `terminators` is empty). The terminator itself is left for
    /// the caller to consume.
    fn parse_statements(&mut self, terminators: &[Keyword]) -> Result<Vec<Stmt>, Diagnostic> {
        let mut statements = Vec::new();
        loop {
            while self.eat(&TokenKind::Semicolon) {}
            if self.peek_kind() == &TokenKind::Eof {
                break;
            }
            if let TokenKind::Keyword(kw) = self.peek_kind() {
                if terminators.contains(kw) {
                    break;
                }
            }
            statements.push(self.parse_statement()?);
        }
        Ok(statements)
    }

    fn parse_statement(&mut self) -> Result<Stmt, Diagnostic> {
        let span = self.peek_span();
        match self.peek_kind() {
            TokenKind::Keyword(Keyword::Var) => self.parse_var_decl(),
            TokenKind::Keyword(Keyword::If) => self.parse_if(),
            TokenKind::Keyword(Keyword::Switch) => self.parse_switch(),
            TokenKind::Keyword(Keyword::While) => self.parse_while(),
            TokenKind::Keyword(Keyword::Foreach) => self.parse_foreach(),
            TokenKind::Keyword(Keyword::Return) => {
                self.advance();
                let value = if self.starts_expression() {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                Ok(Stmt::new(StmtKind::Return(value), span))
            }
            TokenKind::Keyword(Keyword::Break) => {
                self.advance();
                Ok(Stmt::new(StmtKind::Break, span))
            }
            TokenKind::Keyword(Keyword::Continue) => {
                self.advance();
                Ok(Stmt::new(StmtKind::Continue, span))
            }
            _ => self.parse_assignment_or_expr(),
        }
    }

    fn parse_var_decl(&mut self) -> Result<Stmt, Diagnostic> {
        let span = self.expect_keyword(Keyword::Var)?.span;
        let (name, _) = self.expect_identifier("a variable name")?;
        let declared_type = if self.eat(&TokenKind::Colon) {
            Some(self.parse_type_tag()?)
        } else {
            None
        };
        let initializer = if self.eat(&TokenKind::Assign) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(Stmt::new(
            StmtKind::VarDecl {
                name,
                declared_type,
                initializer,
            },
            span,
        ))
    }

    fn parse_type_tag(&mut self) -> Result<ValueType, Diagnostic> {
        let tag = match self.peek_kind() {
            TokenKind::Keyword(Keyword::Number) => ValueType::Number,
            TokenKind::Keyword(Keyword::String) => ValueType::String,
            TokenKind::Keyword(Keyword::Boolean) => ValueType::Boolean,
            TokenKind::Keyword(Keyword::Object) => ValueType::Object,
            TokenKind::Keyword(Keyword::Array) => ValueType::Array,
            _ => return Err(self.unexpected("a type name")),
        };
        self.advance();
        Ok(tag)
    }

    fn parse_if(&mut self) -> Result<Stmt, Diagnostic> {
        let span = self.expect_keyword(Keyword::If)?.span;
        let mut branches = Vec::new();
        let condition = self.parse_expression()?;
        self.expect_keyword(Keyword::Then)?;
        let body = self.parse_statements(&[Keyword::Elseif, Keyword::Else, Keyword::End])?;
        branches.push((condition, body));
        let mut else_body = None;
        loop {
            if self.at_keyword(Keyword::Elseif) {
                self.advance();
                let condition = self.parse_expression()?;
                self.expect_keyword(Keyword::Then)?;
                let body =
                    self.parse_statements(&[Keyword::Elseif, Keyword::Else, Keyword::End])?;
                branches.push((condition, body));
            } else if self.at_keyword(Keyword::Else) {
                self.advance();
                else_body = Some(self.parse_statements(&[Keyword::End])?);
                break;
            } else {
                break;
            }
        }
        self.expect_keyword(Keyword::End)?;
        Ok(Stmt::new(
            StmtKind::If {
                branches,
                else_body,
            },
            span,
        ))
    }

    fn parse_switch(&mut self) -> Result<Stmt, Diagnostic> {
        let span = self.expect_keyword(Keyword::Switch)?.span;
        let scrutinee = self.parse_expression()?;
        self.expect_keyword(Keyword::Do)?;
        let mut cases = Vec::new();
        while self.at_keyword(Keyword::Case) {
            self.advance();
            let mut values = vec![self.parse_expression()?];
            while self.eat(&TokenKind::Comma) {
                values.push(self.parse_expression()?);
            }
            self.expect_keyword(Keyword::Then)?;
            let body = self.parse_statements(&[Keyword::Case, Keyword::Default, Keyword::End])?;
            cases.push(SwitchCase { values, body });
        }
        let default = if self.at_keyword(Keyword::Default) {
            self.advance();
            self.expect_keyword(Keyword::Then)?;
            Some(self.parse_statements(&[Keyword::End])?)
        } else {
            None
        };
        self.expect_keyword(Keyword::End)?;
        Ok(Stmt::new(
            StmtKind::Switch {
                scrutinee,
                cases,
                default,
            },
            span,
        ))
    }

    fn parse_while(&mut self) -> Result<Stmt, Diagnostic> {
        let span = self.expect_keyword(Keyword::While)?.span;
        let condition = self.parse_expression()?;
        self.expect_keyword(Keyword::Do)?;
        let body = self.parse_statements(&[Keyword::End])?;
        self.expect_keyword(Keyword::End)?;
        Ok(Stmt::new(StmtKind::While { condition, body }, span))
    }

    fn parse_foreach(&mut self) -> Result<Stmt, Diagnostic> {
        let span = self.expect_keyword(Keyword::Foreach)?.span;
        let (binding, _) = self.expect_identifier("an iterator name")?;
        self.expect_keyword(Keyword::In)?;
        let collection = self.parse_expression()?;
        self.expect_keyword(Keyword::Do)?;
        let body = self.parse_statements(&[Keyword::End])?;
        self.expect_keyword(Keyword::End)?;
        Ok(Stmt::new(
            StmtKind::Foreach {
                binding,
                collection,
                body,
            },
            span,
        ))
    }

    fn parse_assignment_or_expr(&mut self) -> Result<Stmt, Diagnostic> {
        let span = self.peek_span();
        let expr = self.parse_expression()?;
        let op = match self.peek_kind() {
            TokenKind::Assign => AssignOp::Assign,
            TokenKind::PlusAssign => AssignOp::Add,
            TokenKind::MinusAssign => AssignOp::Subtract,
            TokenKind::StarAssign => AssignOp::Multiply,
            TokenKind::SlashAssign => AssignOp::Divide,
            _ => return Ok(Stmt::new(StmtKind::ExprStmt(expr), span)),
        };
        self.advance();
        let value = self.parse_expression()?;
        Ok(Stmt::new(
            StmtKind::Assignment {
                target: expr,
                op,
                value,
            },
            span,
        ))
    }

    /// Whether the current token can begin an expression. Used to decide
    /// whether `return` carries a value.
    fn starts_expression(&self) -> bool {
        matches!(
            self.peek_kind(),
            TokenKind::Identifier(_)
                | TokenKind::Number(_)
                | TokenKind::Str(_)
                | TokenKind::Minus
                | TokenKind::LParen
                | TokenKind::LBracket
                | TokenKind::LBrace
                | TokenKind::Keyword(
                    Keyword::True | Keyword::False | Keyword::Null | Keyword::Not
                )
        )
    }

    // ========================================================================
    // Expressions, lowest to highest precedence
    // ========================================================================

    fn parse_expression(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Result<Expr, Diagnostic> {
        let span = self.peek_span();
        let condition = self.parse_or()?;
        if !self.eat(&TokenKind::Question) {
            return Ok(condition);
        }
        let then_branch = self.parse_ternary()?;
        self.expect(TokenKind::Colon, "':'")?;
        let else_branch = self.parse_ternary()?;
        Ok(Expr::new(
            ExprKind::Ternary {
                condition: Box::new(condition),
                then_branch: Box::new(then_branch),
                else_branch: Box::new(else_branch),
            },
            span,
        ))
    }

    fn parse_or(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_and()?;
        while self.at_keyword(Keyword::Or) {
            let span = self.advance().span;
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right, span);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_not()?;
        while self.at_keyword(Keyword::And) {
            let span = self.advance().span;
            let right = self.parse_not()?;
            left = binary(BinaryOp::And, left, right, span);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Expr, Diagnostic> {
        if self.at_keyword(Keyword::Not) {
            let span = self.advance().span;
            let operand = self.parse_not()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_equality()
    }

    fn parse_equality(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_relational()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::EqEq => BinaryOp::Equal,
                TokenKind::NotEq => BinaryOp::NotEqual,
                _ => break,
            };
            let span = self.advance().span;
            let right = self.parse_relational()?;
            left = binary(op, left, right, span);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Lt => BinaryOp::Less,
                TokenKind::Le => BinaryOp::LessEqual,
                TokenKind::Gt => BinaryOp::Greater,
                TokenKind::Ge => BinaryOp::GreaterEqual,
                _ => break,
            };
            let span = self.advance().span;
            let right = self.parse_additive()?;
            left = binary(op, left, right, span);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                _ => break,
            };
            let span = self.advance().span;
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right, span);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                TokenKind::Percent => BinaryOp::Modulo,
                _ => break,
            };
            let span = self.advance().span;
            let right = self.parse_unary()?;
            left = binary(op, left, right, span);
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, Diagnostic> {
        if self.peek_kind() == &TokenKind::Minus {
            let span = self.advance().span;
            let operand = self.parse_unary()?;
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Negate,
                    operand: Box::new(operand),
                },
                span,
            ));
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::Dot => {
                    let span = self.advance().span;
                    let property = self.parse_property_name()?;
                    expr = Expr::new(
                        ExprKind::Member {
                            object: Box::new(expr),
                            property,
                        },
                        span,
                    );
                }
                TokenKind::LBracket => {
                    let span = self.advance().span;
                    let index = self.parse_expression()?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    expr = Expr::new(
                        ExprKind::Index {
                            object: Box::new(expr),
                            index: Box::new(index),
                        },
                        span,
                    );
                }
                TokenKind::LParen => {
                    let ExprKind::Identifier(name) = expr.kind else {
                        return Err(self.unexpected("a function name before '('"));
                    };
                    let span = expr.span;
                    self.advance();
                    let mut args = Vec::new();
                    if self.peek_kind() != &TokenKind::RParen {
                        args.push(self.parse_expression()?);
                        while self.eat(&TokenKind::Comma) {
                            args.push(self.parse_expression()?);
                        }
                    }
                    self.expect(TokenKind::RParen, "')'")?;
                    expr = Expr::new(ExprKind::Call { name, args }, span);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Property names after `.` accept identifiers and reserved words, so
    /// host data with keys like `default` stays reachable.
    fn parse_property_name(&mut self) -> Result<String, Diagnostic> {
        match self.peek_kind() {
            TokenKind::Identifier(_) => Ok(self.expect_identifier("a property name")?.0),
            TokenKind::Keyword(kw) => {
                let text = kw.text().to_string();
                self.advance();
                Ok(text)
            }
            _ => Err(self.unexpected("a property name")),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, Diagnostic> {
        let span = self.peek_span();
        match self.peek_kind().clone() {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::Number(n)), span))
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::String(s)), span))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::Boolean(true)), span))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::Boolean(false)), span))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Expr::new(ExprKind::Literal(Literal::Null), span))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                if name == "Data" {
                    Ok(Expr::new(ExprKind::DataRoot, span))
                } else {
                    Ok(Expr::new(ExprKind::Identifier(name), span))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(expr)
            }
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_object_literal(),
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Expr, Diagnostic> {
        let span = self.expect(TokenKind::LBracket, "'['")?.span;
        let mut elements = Vec::new();
        if self.peek_kind() != &TokenKind::RBracket {
            elements.push(self.parse_expression()?);
            while self.eat(&TokenKind::Comma) {
                elements.push(self.parse_expression()?);
            }
        }
        self.expect(TokenKind::RBracket, "']'")?;
        Ok(Expr::new(ExprKind::ArrayLiteral(elements), span))
    }

    fn parse_object_literal(&mut self) -> Result<Expr, Diagnostic> {
        let span = self.expect(TokenKind::LBrace, "'{'")?.span;
        let mut entries = Vec::new();
        if self.peek_kind() != &TokenKind::RBrace {
            entries.push(self.parse_object_entry()?);
            while self.eat(&TokenKind::Comma) {
                entries.push(self.parse_object_entry()?);
            }
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(Expr::new(ExprKind::ObjectLiteral(entries), span))
    }

    fn parse_object_entry(&mut self) -> Result<(ObjectKey, Expr), Diagnostic> {
        let ahead = self.peek_ahead(1).clone();
        let key = match (self.peek_kind().clone(), ahead) {
            (TokenKind::Identifier(name), TokenKind::Colon) => {
                self.advance();
                ObjectKey::Static(name)
            }
            (TokenKind::Str(text), TokenKind::Colon) => {
                self.advance();
                ObjectKey::Static(text)
            }
            (TokenKind::Keyword(kw), TokenKind::Colon)
                if !matches!(kw, Keyword::True | Keyword::False | Keyword::Null) =>
            {
                self.advance();
                ObjectKey::Static(kw.text().to_string())
            }
            _ => ObjectKey::Computed(self.parse_or()?),
        };
        self.expect(TokenKind::Colon, "':'")?;
        let value = self.parse_expression()?;
        Ok((key, value))
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr, span: Span) -> Expr {
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}
