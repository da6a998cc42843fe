// ABOUTME: Tree-walking interpreter executing a linked program against the
// ABOUTME: Data root under limiter and cancellation discipline

use crate::ast::{
    AssignOp, BinaryOp, Expr, ExprKind, Literal, ObjectKey, Program, Stmt, StmtKind, UnaryOp,
};
use crate::cancel::CancellationToken;
use crate::diagnostics::{DefaultMessageProvider, Diagnostic, MessageProvider, Span};
use crate::error::{ExecError, ExecErrorKind};
use crate::functions::{FunctionContext, FunctionTable};
use crate::limiter::ResourceLimiter;
use crate::resolver::ScriptResolver;
use crate::scope::ScopeStack;
use crate::value::{self, Value};
use indexmap::IndexMap;

/// Result of one statement: either fall through or unwind. Runtime errors
/// travel separately as `Err`, so every statement evaluator returns
/// `Result<Flow, ExecError>` and propagation stays explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Normal,
    Break,
    Continue,
    Return,
}

pub(crate) struct Interpreter<'a> {
    functions: &'a FunctionTable,
    root: &'a mut Value,
    limiter: &'a mut ResourceLimiter,
    cancel: &'a CancellationToken,
    resolver: Option<&'a dyn ScriptResolver>,
    scopes: ScopeStack,
}

/// Base slot of an assignment target.
enum TargetBase {
    Root,
    Local(String),
}

/// One accessor of an assignment path, with its index expression already
/// evaluated so navigation never re-runs script code.
enum Accessor {
    Prop { name: String, span: Span },
    Key { key: Value, span: Span },
}

impl Accessor {
    fn label(&self) -> String {
        match self {
            Accessor::Prop { name, .. } => name.clone(),
            Accessor::Key { key, .. } => format!("[{}]", key.to_display_string()),
        }
    }

    fn span(&self) -> Span {
        match self {
            Accessor::Prop { span, .. } | Accessor::Key { span, .. } => *span,
        }
    }
}

impl<'a> Interpreter<'a> {
    pub(crate) fn new(
        functions: &'a FunctionTable,
        root: &'a mut Value,
        limiter: &'a mut ResourceLimiter,
        cancel: &'a CancellationToken,
        resolver: Option<&'a dyn ScriptResolver>,
    ) -> Self {
        Interpreter {
            functions,
            root,
            limiter,
            cancel,
            resolver,
            scopes: ScopeStack::new(),
        }
    }

    /// Runs the program's statements in the global scope. `return` stops the
    /// script; `break`/`continue` cannot reach here (the validator rejects
    /// them outside loops).
    pub(crate) fn run(&mut self, program: &Program) -> Result<(), ExecError> {
        for stmt in &program.statements {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                Flow::Return => break,
                Flow::Break | Flow::Continue => {
                    return Err(ExecError::internal(
                        "loop transfer escaped validation",
                    ));
                }
            }
        }
        Ok(())
    }

    fn check_cancelled(&self) -> Result<(), ExecError> {
        if self.cancel.is_cancelled() {
            Err(ExecErrorKind::Cancelled.into())
        } else {
            Ok(())
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Flow, ExecError> {
        self.limiter.count_statement().map_err(|e| e.at(stmt.span))?;
        self.check_cancelled().map_err(|e| e.at(stmt.span))?;

        match &stmt.kind {
            StmtKind::VarDecl {
                name,
                declared_type,
                initializer,
            } => {
                let mut value = match initializer {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Null,
                };
                if let Some(tag) = declared_type {
                    value = value.coerce_to(*tag).map_err(|e| e.at(stmt.span))?;
                }
                self.scopes.declare(name.clone(), value);
                Ok(Flow::Normal)
            }
            StmtKind::Assignment { target, op, value } => {
                self.exec_assignment(target, *op, value)?;
                Ok(Flow::Normal)
            }
            StmtKind::ExprStmt(expr) => {
                self.eval_expr(expr)?;
                Ok(Flow::Normal)
            }
            StmtKind::If {
                branches,
                else_body,
            } => {
                for (condition, body) in branches {
                    if self.eval_expr(condition)?.is_truthy() {
                        return self.run_block(body);
                    }
                }
                match else_body {
                    Some(body) => self.run_block(body),
                    None => Ok(Flow::Normal),
                }
            }
            StmtKind::Switch {
                scrutinee,
                cases,
                default,
            } => {
                let subject = self.eval_expr(scrutinee)?;
                for case in cases {
                    for value_expr in &case.values {
                        let candidate = self.eval_expr(value_expr)?;
                        if subject.equals(&candidate) {
                            // Cases never fall through.
                            return self.run_block(&case.body);
                        }
                    }
                }
                match default {
                    Some(body) => self.run_block(body),
                    None => Ok(Flow::Normal),
                }
            }
            StmtKind::While { condition, body } => {
                loop {
                    if !self.eval_expr(condition)?.is_truthy() {
                        break;
                    }
                    self.limiter
                        .enter_loop_iteration()
                        .map_err(|e| e.at(stmt.span))?;
                    self.check_cancelled().map_err(|e| e.at(stmt.span))?;
                    match self.run_block(body)? {
                        Flow::Normal | Flow::Continue => {}
                        Flow::Break => break,
                        Flow::Return => return Ok(Flow::Return),
                    }
                }
                Ok(Flow::Normal)
            }
            StmtKind::Foreach {
                binding,
                collection,
                body,
            } => {
                // The collection is evaluated once; element positions are
                // fixed at iteration start.
                let items: Vec<Value> = match self.eval_expr(collection)? {
                    Value::Array(elements) => elements,
                    Value::Object(map) => {
                        map.keys().cloned().map(Value::String).collect()
                    }
                    other => {
                        return Err(ExecError::not_iterable(other.type_name())
                            .at(collection.span));
                    }
                };
                for item in items {
                    self.limiter
                        .enter_loop_iteration()
                        .map_err(|e| e.at(stmt.span))?;
                    self.check_cancelled().map_err(|e| e.at(stmt.span))?;
                    self.scopes.push();
                    self.scopes.declare(binding.clone(), item);
                    let flow = self.exec_stmts(body);
                    self.scopes.pop();
                    match flow? {
                        Flow::Normal | Flow::Continue => {}
                        Flow::Break => break,
                        Flow::Return => return Ok(Flow::Return),
                    }
                }
                Ok(Flow::Normal)
            }
            // `return` terminates the script. The expression, if present, is
            // evaluated for its effects and the value discarded, matching
            // the reference behavior.
            StmtKind::Return(value) => {
                if let Some(expr) = value {
                    self.eval_expr(expr)?;
                }
                Ok(Flow::Return)
            }
            StmtKind::Break => Ok(Flow::Break),
            StmtKind::Continue => Ok(Flow::Continue),
        }
    }

    /// Executes a body inside a fresh scope, releasing it on every exit path.
    fn run_block(&mut self, body: &[Stmt]) -> Result<Flow, ExecError> {
        self.scopes.push();
        let flow = self.exec_stmts(body);
        self.scopes.pop();
        flow
    }

    fn exec_stmts(&mut self, body: &[Stmt]) -> Result<Flow, ExecError> {
        for stmt in body {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    // ========================================================================
    // Assignment
    // ========================================================================

    fn exec_assignment(
        &mut self,
        target: &Expr,
        op: AssignOp,
        value_expr: &Expr,
    ) -> Result<(), ExecError> {
        let rhs = self.eval_expr(value_expr)?;
        let (base, accessors) = self.flatten_target(target)?;
        let value = match op {
            AssignOp::Assign => rhs,
            _ => {
                let current = self.read_target(&base, &accessors)?;
                let combined = match op {
                    AssignOp::Add => value::add(&current, &rhs),
                    AssignOp::Subtract => value::subtract(&current, &rhs),
                    AssignOp::Multiply => value::multiply(&current, &rhs),
                    AssignOp::Divide => value::divide(&current, &rhs),
                    AssignOp::Assign => unreachable!(),
                };
                combined.map_err(|e| e.at(target.span))?
            }
        };
        self.store(&base, &accessors, value, target.span)
    }

    /// Splits a validated target into its base slot and accessor path,
    /// evaluating index expressions left-to-right exactly once.
    fn flatten_target(&mut self, expr: &Expr) -> Result<(TargetBase, Vec<Accessor>), ExecError> {
        match &expr.kind {
            ExprKind::DataRoot => Ok((TargetBase::Root, Vec::new())),
            ExprKind::Identifier(name) => Ok((TargetBase::Local(name.clone()), Vec::new())),
            ExprKind::Member { object, property } => {
                let (base, mut accessors) = self.flatten_target(object)?;
                accessors.push(Accessor::Prop {
                    name: property.clone(),
                    span: expr.span,
                });
                Ok((base, accessors))
            }
            ExprKind::Index { object, index } => {
                let (base, mut accessors) = self.flatten_target(object)?;
                let key = self.eval_expr(index)?;
                accessors.push(Accessor::Key {
                    key,
                    span: expr.span,
                });
                Ok((base, accessors))
            }
            _ => Err(ExecError::internal("invalid assignment target survived validation")
                .at(expr.span)),
        }
    }

    /// Reads the target's current value for compound assignment, using the
    /// same projection rules as expression evaluation.
    fn read_target(&self, base: &TargetBase, accessors: &[Accessor]) -> Result<Value, ExecError> {
        let base_slot: &Value = match base {
            TargetBase::Root => &*self.root,
            TargetBase::Local(name) => self
                .scopes
                .get(name)
                .ok_or_else(|| ExecError::internal(format!("unbound local '{}'", name)))?,
        };
        let mut current: Option<&Value> = Some(base_slot);
        for accessor in accessors {
            let container = match current {
                Some(v) => v,
                None => {
                    return Err(ExecError::null_access(accessor.label()).at(accessor.span()))
                }
            };
            current = match (container, accessor) {
                (Value::Object(map), Accessor::Prop { name, .. }) => map.get(name),
                (Value::Object(map), Accessor::Key { key, .. }) => {
                    map.get(&key.to_display_string())
                }
                (Value::Array(items), Accessor::Key { key, span }) => {
                    let idx = array_index(key, items.len()).map_err(|e| e.at(*span))?;
                    Some(&items[idx])
                }
                (Value::Null, accessor) => {
                    return Err(ExecError::null_access(accessor.label()).at(accessor.span()));
                }
                (other, Accessor::Prop { name, span }) => {
                    return Err(ExecError::type_mismatch(format!(
                        "cannot access property '{}' on {}",
                        name,
                        other.type_name()
                    ))
                    .at(*span));
                }
                (other, Accessor::Key { span, .. }) => {
                    return Err(ExecError::type_mismatch(format!(
                        "cannot index into {}",
                        other.type_name()
                    ))
                    .at(*span));
                }
            };
        }
        Ok(current.cloned().unwrap_or(Value::Null))
    }

    /// Writes `value` through the target path, mutating the root slot or a
    /// local slot in place.
    fn store(
        &mut self,
        base: &TargetBase,
        accessors: &[Accessor],
        value: Value,
        span: Span,
    ) -> Result<(), ExecError> {
        if accessors.is_empty() {
            match base {
                TargetBase::Root => *self.root = value,
                TargetBase::Local(name) => {
                    // Update the innermost match, or implicitly declare.
                    if self.scopes.get(name).is_some() {
                        self.scopes.set(name, value);
                    } else {
                        self.scopes.declare(name.clone(), value);
                    }
                }
            }
            return Ok(());
        }

        let mut current: &mut Value = match base {
            TargetBase::Root => &mut *self.root,
            TargetBase::Local(name) => self
                .scopes
                .get_mut(name)
                .ok_or_else(|| ExecError::internal(format!("unbound local '{}'", name)).at(span))?,
        };

        for i in 0..accessors.len() - 1 {
            let accessor = &accessors[i];
            let next = &accessors[i + 1];
            current = match (current, accessor) {
                (Value::Object(map), Accessor::Prop { name, .. }) => match map.get_mut(name) {
                    Some(slot) => slot,
                    // A missing property reads as null, so the following
                    // accessor is an access on null.
                    None => return Err(ExecError::null_access(next.label()).at(next.span())),
                },
                (Value::Object(map), Accessor::Key { key, .. }) => {
                    match map.get_mut(&key.to_display_string()) {
                        Some(slot) => slot,
                        None => {
                            return Err(ExecError::null_access(next.label()).at(next.span()))
                        }
                    }
                }
                (Value::Array(items), Accessor::Key { key, span }) => {
                    let idx = array_index(key, items.len()).map_err(|e| e.at(*span))?;
                    &mut items[idx]
                }
                (Value::Null, accessor) => {
                    return Err(ExecError::null_access(accessor.label()).at(accessor.span()));
                }
                (other, Accessor::Prop { name, span }) => {
                    return Err(ExecError::type_mismatch(format!(
                        "cannot access property '{}' on {}",
                        name,
                        other.type_name()
                    ))
                    .at(*span));
                }
                (other, Accessor::Key { span, .. }) => {
                    return Err(ExecError::type_mismatch(format!(
                        "cannot index into {}",
                        other.type_name()
                    ))
                    .at(*span));
                }
            };
        }

        set_segment(current, &accessors[accessors.len() - 1], value)
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, ExecError> {
        self.eval_expr_inner(expr).map_err(|e| e.at(expr.span))
    }

    fn eval_expr_inner(&mut self, expr: &Expr) -> Result<Value, ExecError> {
        match &expr.kind {
            ExprKind::Literal(literal) => Ok(match literal {
                Literal::Null => Value::Null,
                Literal::Boolean(b) => Value::Boolean(*b),
                Literal::Number(n) => Value::Number(*n),
                Literal::String(s) => Value::String(s.clone()),
            }),
            ExprKind::DataRoot => Ok(self.root.clone()),
            ExprKind::Identifier(name) => self
                .scopes
                .get(name)
                .cloned()
                .ok_or_else(|| ExecError::internal(format!("unresolved identifier '{}'", name))),
            ExprKind::Unary { op, operand } => {
                let value = self.eval_expr(operand)?;
                match op {
                    UnaryOp::Negate => value::negate(&value),
                    UnaryOp::Not => Ok(Value::Boolean(!value.is_truthy())),
                }
            }
            ExprKind::Binary { op, left, right } => self.eval_binary(*op, left, right),
            ExprKind::Ternary {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.eval_expr(condition)?.is_truthy() {
                    self.eval_expr(then_branch)
                } else {
                    self.eval_expr(else_branch)
                }
            }
            ExprKind::Member { object, property } => {
                match self.eval_expr(object)? {
                    Value::Object(map) => {
                        // A missing property reads as null.
                        Ok(map.get(property).cloned().unwrap_or(Value::Null))
                    }
                    Value::Null => Err(ExecError::null_access(property)),
                    other => Err(ExecError::type_mismatch(format!(
                        "cannot access property '{}' on {}",
                        property,
                        other.type_name()
                    ))),
                }
            }
            ExprKind::Index { object, index } => {
                let container = self.eval_expr(object)?;
                let key = self.eval_expr(index)?;
                match container {
                    Value::Array(items) => {
                        let idx = array_index(&key, items.len())?;
                        Ok(items[idx].clone())
                    }
                    Value::Object(map) => Ok(map
                        .get(&key.to_display_string())
                        .cloned()
                        .unwrap_or(Value::Null)),
                    Value::Null => {
                        Err(ExecError::null_access(format!("[{}]", key.to_display_string())))
                    }
                    other => Err(ExecError::type_mismatch(format!(
                        "cannot index into {}",
                        other.type_name()
                    ))),
                }
            }
            ExprKind::Call { name, args } => self.eval_call(name, args, expr.span),
            ExprKind::ArrayLiteral(elements) => {
                let mut items = Vec::with_capacity(elements.len());
                for element in elements {
                    items.push(self.eval_expr(element)?);
                }
                Ok(Value::Array(items))
            }
            ExprKind::ObjectLiteral(entries) => {
                let mut map = IndexMap::with_capacity(entries.len());
                for (key, value_expr) in entries {
                    let key = match key {
                        ObjectKey::Static(text) => text.clone(),
                        ObjectKey::Computed(expr) => self.eval_expr(expr)?.to_display_string(),
                    };
                    let value = self.eval_expr(value_expr)?;
                    map.insert(key, value);
                }
                Ok(Value::Object(map))
            }
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr) -> Result<Value, ExecError> {
        // Logical operators short-circuit and always produce booleans.
        match op {
            BinaryOp::And => {
                let lhs = self.eval_expr(left)?;
                if !lhs.is_truthy() {
                    return Ok(Value::Boolean(false));
                }
                let rhs = self.eval_expr(right)?;
                return Ok(Value::Boolean(rhs.is_truthy()));
            }
            BinaryOp::Or => {
                let lhs = self.eval_expr(left)?;
                if lhs.is_truthy() {
                    return Ok(Value::Boolean(true));
                }
                let rhs = self.eval_expr(right)?;
                return Ok(Value::Boolean(rhs.is_truthy()));
            }
            _ => {}
        }

        let lhs = self.eval_expr(left)?;
        let rhs = self.eval_expr(right)?;
        match op {
            BinaryOp::Add => value::add(&lhs, &rhs),
            BinaryOp::Subtract => value::subtract(&lhs, &rhs),
            BinaryOp::Multiply => value::multiply(&lhs, &rhs),
            BinaryOp::Divide => value::divide(&lhs, &rhs),
            BinaryOp::Modulo => value::modulo(&lhs, &rhs),
            BinaryOp::Equal => Ok(Value::Boolean(lhs.equals(&rhs))),
            BinaryOp::NotEqual => Ok(Value::Boolean(!lhs.equals(&rhs))),
            BinaryOp::Less => value::compare_op("<", &lhs, &rhs),
            BinaryOp::LessEqual => value::compare_op("<=", &lhs, &rhs),
            BinaryOp::Greater => value::compare_op(">", &lhs, &rhs),
            BinaryOp::GreaterEqual => value::compare_op(">=", &lhs, &rhs),
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        }
    }

    fn eval_call(&mut self, name: &str, arg_exprs: &[Expr], span: Span) -> Result<Value, ExecError> {
        let Some(function) = self.functions.get(name).cloned() else {
            return Err(ExecError::internal(format!("call to unlinked function '{}'", name)));
        };

        let mut args = Vec::with_capacity(arg_exprs.len());
        for expr in arg_exprs {
            args.push(self.eval_expr(expr)?);
        }

        self.check_cancelled().map_err(|e| e.at(span))?;
        self.limiter.enter_call().map_err(|e| e.at(span))?;
        let outcome = match function.signature().validate_args(&args) {
            Ok(()) => {
                let mut ctx = FunctionContext {
                    root: &mut *self.root,
                    limiter: &mut *self.limiter,
                    cancel: self.cancel,
                    functions: self.functions,
                    resolver: self.resolver,
                };
                function.execute(&args, &mut ctx)
            }
            Err(err) => Err(err),
        };
        self.limiter.exit_call();
        outcome.map_err(|e| e.at(span))
    }
}

fn array_index(key: &Value, length: usize) -> Result<usize, ExecError> {
    let Value::Number(n) = key else {
        return Err(ExecError::type_mismatch(format!(
            "array index must be a number, got {}",
            key.type_name()
        )));
    };
    if !key.is_integer() {
        return Err(ExecError::type_mismatch("array index must be an integer"));
    }
    let idx = *n as i64;
    if idx < 0 || idx as usize >= length {
        return Err(ExecError::index_out_of_range(idx, length));
    }
    Ok(idx as usize)
}

fn set_segment(container: &mut Value, accessor: &Accessor, value: Value) -> Result<(), ExecError> {
    match (container, accessor) {
        (Value::Object(map), Accessor::Prop { name, .. }) => {
            map.insert(name.clone(), value);
            Ok(())
        }
        (Value::Object(map), Accessor::Key { key, .. }) => {
            map.insert(key.to_display_string(), value);
            Ok(())
        }
        (Value::Array(items), Accessor::Key { key, span }) => {
            let idx = array_index(key, items.len()).map_err(|e| e.at(*span))?;
            items[idx] = value;
            Ok(())
        }
        (Value::Null, accessor) => {
            Err(ExecError::null_access(accessor.label()).at(accessor.span()))
        }
        (other, Accessor::Prop { name, span }) => Err(ExecError::type_mismatch(format!(
            "cannot assign property '{}' on {}",
            name,
            other.type_name()
        ))
        .at(*span)),
        (other, Accessor::Key { span, .. }) => Err(ExecError::type_mismatch(format!(
            "cannot index into {}",
            other.type_name()
        ))
        .at(*span)),
    }
}

/// Compiles and runs a nested script inside the calling execution: same Data
/// root, same limiter, same function table. Any front-end failure in the
/// nested script is folded into a single `CallScript` runtime error.
pub(crate) fn run_nested_script(
    name: &str,
    source: &str,
    ctx: &mut FunctionContext<'_>,
) -> Result<(), ExecError> {
    let program = crate::parser::parse(source).map_err(|d| nested_failure(name, &d))?;

    let validation = crate::validator::validate(&program);
    if let Some(diagnostic) = validation.iter().find(|d| d.is_error()) {
        return Err(nested_failure(name, diagnostic));
    }
    let link_errors = crate::linker::unresolved_calls(&program, ctx.functions);
    if let Some(diagnostic) = link_errors.first() {
        return Err(nested_failure(name, diagnostic));
    }

    let mut interpreter = Interpreter::new(
        ctx.functions,
        &mut *ctx.root,
        &mut *ctx.limiter,
        ctx.cancel,
        ctx.resolver,
    );
    interpreter.run(&program)
}

fn nested_failure(name: &str, diagnostic: &Diagnostic) -> ExecError {
    ExecError::function_failed(
        "CallScript",
        format!("{}: {}", name, DefaultMessageProvider.format(diagnostic)),
    )
}
