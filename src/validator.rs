// ABOUTME: Scope-aware validation pass over the AST

use crate::ast::{AssignOp, Expr, ExprKind, Program, Stmt, StmtKind};
use crate::diagnostics::{Diagnostic, MessageCode, Span, Stage};
use std::collections::HashSet;

/// Walks the program once, tracking lexical scope and loop depth. Any Error
/// diagnostic here is fatal: linking and execution are skipped.
pub fn validate(program: &Program) -> Vec<Diagnostic> {
    let mut validator = Validator {
        scopes: vec![HashSet::new()],
        loop_depth: 0,
        diagnostics: Vec::new(),
    };
    for stmt in &program.statements {
        validator.check_stmt(stmt);
    }
    validator.diagnostics
}

struct Validator {
    scopes: Vec<HashSet<String>>,
    loop_depth: usize,
    diagnostics: Vec<Diagnostic>,
}

impl Validator {
    fn error(&mut self, code: MessageCode, span: Span, args: Vec<String>) {
        self.diagnostics
            .push(Diagnostic::error(code, Stage::Validation, span, args));
    }

    fn warning(&mut self, code: MessageCode, span: Span, args: Vec<String>) {
        self.diagnostics
            .push(Diagnostic::warning(code, Stage::Validation, span, args));
    }

    fn is_declared(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(name))
    }

    fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string());
        }
    }

    fn check_block(&mut self, body: &[Stmt]) {
        self.scopes.push(HashSet::new());
        for stmt in body {
            self.check_stmt(stmt);
        }
        self.scopes.pop();
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VarDecl {
                name, initializer, ..
            } => {
                // The initializer sees the surrounding bindings, not the new one.
                if let Some(init) = initializer {
                    self.check_expr(init);
                }
                if self.scopes.last().is_some_and(|s| s.contains(name)) {
                    self.error(
                        MessageCode::DuplicateDeclaration,
                        stmt.span,
                        vec![name.clone()],
                    );
                }
                self.declare(name);
            }
            StmtKind::Assignment { target, op, value } => {
                self.check_expr(value);
                self.check_target(target, *op);
            }
            StmtKind::ExprStmt(expr) => self.check_expr(expr),
            StmtKind::If {
                branches,
                else_body,
            } => {
                for (condition, body) in branches {
                    self.check_expr(condition);
                    self.check_block(body);
                }
                if let Some(body) = else_body {
                    self.check_block(body);
                }
            }
            StmtKind::Switch {
                scrutinee,
                cases,
                default,
            } => {
                self.check_expr(scrutinee);
                for case in cases {
                    for value in &case.values {
                        self.check_expr(value);
                    }
                    self.check_block(&case.body);
                }
                if let Some(body) = default {
                    self.check_block(body);
                }
            }
            StmtKind::While { condition, body } => {
                self.check_expr(condition);
                self.loop_depth += 1;
                self.check_block(body);
                self.loop_depth -= 1;
            }
            StmtKind::Foreach {
                binding,
                collection,
                body,
            } => {
                self.check_expr(collection);
                self.loop_depth += 1;
                self.scopes.push(HashSet::new());
                self.declare(binding);
                for stmt in body {
                    self.check_stmt(stmt);
                }
                self.scopes.pop();
                self.loop_depth -= 1;
            }
            StmtKind::Return(value) => {
                if let Some(expr) = value {
                    self.check_expr(expr);
                }
            }
            StmtKind::Break => {
                if self.loop_depth == 0 {
                    self.error(MessageCode::BreakOutsideLoop, stmt.span, vec![]);
                }
            }
            StmtKind::Continue => {
                if self.loop_depth == 0 {
                    self.error(MessageCode::ContinueOutsideLoop, stmt.span, vec![]);
                }
            }
        }
    }

    /// Assignment targets must be an identifier or `Data` followed by
    /// member/index accessors. A bare undeclared identifier under plain `=`
    /// is an implicit declaration into the innermost scope; anything else
    /// referencing an undeclared base is an error (compound operators read
    /// before writing).
    fn check_target(&mut self, target: &Expr, op: AssignOp) {
        let mut current = target;
        let mut has_accessors = false;
        loop {
            match &current.kind {
                ExprKind::Member { object, .. } => {
                    has_accessors = true;
                    current = object;
                }
                ExprKind::Index { object, index } => {
                    has_accessors = true;
                    self.check_expr(index);
                    current = object;
                }
                ExprKind::DataRoot => return,
                ExprKind::Identifier(name) => {
                    if self.is_declared(name) {
                        return;
                    }
                    if !has_accessors && op == AssignOp::Assign {
                        self.declare(name);
                    } else {
                        self.error(
                            MessageCode::UndeclaredVariable,
                            current.span,
                            vec![name.clone()],
                        );
                    }
                    return;
                }
                _ => {
                    self.error(MessageCode::InvalidAssignmentTarget, target.span, vec![]);
                    return;
                }
            }
        }
    }

    fn check_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Literal(_) | ExprKind::DataRoot => {}
            ExprKind::Identifier(name) => {
                if !self.is_declared(name) {
                    self.error(
                        MessageCode::UndeclaredVariable,
                        expr.span,
                        vec![name.clone()],
                    );
                }
            }
            ExprKind::Unary { operand, .. } => self.check_expr(operand),
            ExprKind::Binary { left, right, .. } => {
                self.check_expr(left);
                self.check_expr(right);
            }
            ExprKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                self.check_expr(condition);
                self.check_expr(then_branch);
                self.check_expr(else_branch);
            }
            ExprKind::Member { object, .. } => self.check_expr(object),
            ExprKind::Index { object, index } => {
                self.check_expr(object);
                self.check_expr(index);
            }
            ExprKind::Call { name, args } => {
                // Call position resolves against the function table; a local
                // of the same name is silently ignored, which deserves a nudge.
                if self.is_declared(name) {
                    self.warning(
                        MessageCode::ShadowedFunctionName,
                        expr.span,
                        vec![name.clone()],
                    );
                }
                for arg in args {
                    self.check_expr(arg);
                }
            }
            ExprKind::ArrayLiteral(elements) => {
                for element in elements {
                    self.check_expr(element);
                }
            }
            ExprKind::ObjectLiteral(entries) => {
                for (key, value) in entries {
                    if let crate::ast::ObjectKey::Computed(expr) = key {
                        self.check_expr(expr);
                    }
                    self.check_expr(value);
                }
            }
        }
    }
}
