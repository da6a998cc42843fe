// ABOUTME: Resolves script call sites against the function registry and
// ABOUTME: freezes the result into an executable LinkedProgram

use crate::ast::{Expr, ExprKind, ObjectKey, Program, Stmt, StmtKind};
use crate::diagnostics::{Diagnostic, MessageCode, Span, Stage};
use crate::functions::{FunctionRegistry, FunctionTable};
use std::sync::Arc;

/// One function reference found in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub name: String,
    pub arity: usize,
    pub span: Span,
}

/// An AST plus a frozen name→function table. Immutable after linking; safe
/// to share between concurrent executions. Warnings gathered during the
/// front-end stages ride along so execution results can report them.
pub struct LinkedProgram {
    pub program: Arc<Program>,
    pub functions: FunctionTable,
    pub diagnostics: Vec<Diagnostic>,
}

impl std::fmt::Debug for LinkedProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkedProgram")
            .field("program", &self.program)
            .field("diagnostics", &self.diagnostics)
            .finish_non_exhaustive()
    }
}

/// Links a validated program. The only guarantee given here is name
/// resolution; arity and argument types are checked at execution time.
/// `Ok` still carries warnings (duplicate registrations); `Err` carries the
/// full diagnostic list including `UndefinedFunction` errors.
pub fn link(
    program: Program,
    registry: &FunctionRegistry,
) -> Result<LinkedProgram, Vec<Diagnostic>> {
    let (functions, duplicates) = registry.build_table();
    let mut diagnostics: Vec<Diagnostic> = duplicates
        .into_iter()
        .map(|name| {
            Diagnostic::warning(
                MessageCode::DuplicateFunction,
                Stage::Linking,
                Span::default(),
                vec![name],
            )
        })
        .collect();

    diagnostics.extend(unresolved_calls(&program, &functions));

    if diagnostics.iter().any(Diagnostic::is_error) {
        return Err(diagnostics);
    }
    Ok(LinkedProgram {
        program: Arc::new(program),
        functions,
        diagnostics,
    })
}

/// `UndefinedFunction` errors for every call whose name is absent from the
/// table. Also used when a nested script is compiled against an already
/// frozen table.
pub(crate) fn unresolved_calls(program: &Program, table: &FunctionTable) -> Vec<Diagnostic> {
    collect_call_sites(program)
        .into_iter()
        .filter(|site| !table.contains_key(&site.name))
        .map(|site| {
            Diagnostic::error(
                MessageCode::UndefinedFunction,
                Stage::Linking,
                site.span,
                vec![site.name],
            )
        })
        .collect()
}

/// Every `(name, arity, location)` reference in the program, in source order.
pub fn collect_call_sites(program: &Program) -> Vec<CallSite> {
    let mut sites = Vec::new();
    for stmt in &program.statements {
        collect_stmt(stmt, &mut sites);
    }
    sites
}

fn collect_stmt(stmt: &Stmt, sites: &mut Vec<CallSite>) {
    match &stmt.kind {
        StmtKind::VarDecl { initializer, .. } => {
            if let Some(expr) = initializer {
                collect_expr(expr, sites);
            }
        }
        StmtKind::Assignment { target, value, .. } => {
            collect_expr(target, sites);
            collect_expr(value, sites);
        }
        StmtKind::ExprStmt(expr) => collect_expr(expr, sites),
        StmtKind::If {
            branches,
            else_body,
        } => {
            for (condition, body) in branches {
                collect_expr(condition, sites);
                for stmt in body {
                    collect_stmt(stmt, sites);
                }
            }
            if let Some(body) = else_body {
                for stmt in body {
                    collect_stmt(stmt, sites);
                }
            }
        }
        StmtKind::Switch {
            scrutinee,
            cases,
            default,
        } => {
            collect_expr(scrutinee, sites);
            for case in cases {
                for value in &case.values {
                    collect_expr(value, sites);
                }
                for stmt in &case.body {
                    collect_stmt(stmt, sites);
                }
            }
            if let Some(body) = default {
                for stmt in body {
                    collect_stmt(stmt, sites);
                }
            }
        }
        StmtKind::While { condition, body } => {
            collect_expr(condition, sites);
            for stmt in body {
                collect_stmt(stmt, sites);
            }
        }
        StmtKind::Foreach {
            collection, body, ..
        } => {
            collect_expr(collection, sites);
            for stmt in body {
                collect_stmt(stmt, sites);
            }
        }
        StmtKind::Return(Some(expr)) => collect_expr(expr, sites),
        StmtKind::Return(None) | StmtKind::Break | StmtKind::Continue => {}
    }
}

fn collect_expr(expr: &Expr, sites: &mut Vec<CallSite>) {
    match &expr.kind {
        ExprKind::Literal(_) | ExprKind::Identifier(_) | ExprKind::DataRoot => {}
        ExprKind::Unary { operand, .. } => collect_expr(operand, sites),
        ExprKind::Binary { left, right, .. } => {
            collect_expr(left, sites);
            collect_expr(right, sites);
        }
        ExprKind::Ternary {
            condition,
            then_branch,
            else_branch,
        } => {
            collect_expr(condition, sites);
            collect_expr(then_branch, sites);
            collect_expr(else_branch, sites);
        }
        ExprKind::Member { object, .. } => collect_expr(object, sites),
        ExprKind::Index { object, index } => {
            collect_expr(object, sites);
            collect_expr(index, sites);
        }
        ExprKind::Call { name, args } => {
            sites.push(CallSite {
                name: name.clone(),
                arity: args.len(),
                span: expr.span,
            });
            for arg in args {
                collect_expr(arg, sites);
            }
        }
        ExprKind::ArrayLiteral(elements) => {
            for element in elements {
                collect_expr(element, sites);
            }
        }
        ExprKind::ObjectLiteral(entries) => {
            for (key, value) in entries {
                if let ObjectKey::Computed(expr) = key {
                    collect_expr(expr, sites);
                }
                collect_expr(value, sites);
            }
        }
    }
}
