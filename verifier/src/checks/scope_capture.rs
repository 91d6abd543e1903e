//! Scope capture verifier
//!
//! A scheduling handle is only valid while its own coroutine runs. Two ways
//! of smuggling one out are flagged here: driving a handle captured from an
//! enclosing coroutine inside a nested one, and storing a handle into a
//! field where it outlives the run that produced it.
//!
//! The walk keeps a stack of handle scopes, one per handle-accepting
//! callable. Each scope knows the handles it owns and the handles visible
//! by capture from enclosing scopes. A call-position use must resolve to
//! an owned handle; field stores are checked against owned and captured
//! handles alike. Anything that does not resolve stays silent.

use diagnostics::{DiagnosticBuilder, Diagnostics};
use fxhash::FxHashSet;
use smallvec::SmallVec;

use crate::checks::{anchor_span, handle_symbol, or_join, CODE_FOREIGN_HANDLE, CODE_HANDLE_ESCAPE};
use crate::driver::{AnalysisContext, Verifier};
use crate::markers::CHECK_HANDLE_SCOPE;
use crate::sem::{
    CompilationUnit, NodeId, SourceLocation, SymbolId, TypedExpression, TypedExpressionKind,
    TypedParameter, TypedStatement,
};
use crate::suppress::is_suppressed;

pub struct ScopeCaptureVerifier;

impl Verifier for ScopeCaptureVerifier {
    fn name(&self) -> &'static str {
        "scope-capture"
    }

    fn analyze(&self, unit: &CompilationUnit, ctx: &AnalysisContext<'_>, diags: &mut Diagnostics) {
        let mut walk = CaptureWalk {
            unit,
            ctx,
            scopes: Vec::new(),
            declarations: Vec::new(),
            reported: FxHashSet::default(),
            diags,
        };
        for function in unit.all_functions() {
            walk.enter_callable(function.symbol_id, &function.parameters, &function.body);
        }
    }
}

/// Handles visible in one coroutine body
struct HandleScope {
    /// Handles this body owns: its handle parameters plus handle-typed
    /// locals it declares, in declaration order
    local: SmallVec<[SymbolId; 2]>,
    /// Handles owned by enclosing coroutine bodies
    captured: FxHashSet<SymbolId>,
}

struct CaptureWalk<'a> {
    unit: &'a CompilationUnit,
    ctx: &'a AnalysisContext<'a>,
    scopes: Vec<HandleScope>,
    /// Enclosing declaration symbols, for suppression lookups
    declarations: Vec<SymbolId>,
    reported: FxHashSet<NodeId>,
    diags: &'a mut Diagnostics,
}

impl<'a> CaptureWalk<'a> {
    fn enter_callable(
        &mut self,
        symbol_id: SymbolId,
        parameters: &[TypedParameter],
        body: &[TypedStatement],
    ) {
        let handles: SmallVec<[SymbolId; 2]> = parameters
            .iter()
            .filter(|p| self.ctx.is_handle_type(p.param_type))
            .map(|p| p.symbol_id)
            .collect();

        self.declarations.push(symbol_id);
        if handles.is_empty() {
            // Plain callables stay part of the surrounding handle scope.
            for statement in body {
                self.statement(statement);
            }
        } else {
            let captured = match self.scopes.last() {
                Some(outer) => {
                    let mut captured = outer.captured.clone();
                    captured.extend(outer.local.iter().copied());
                    captured
                }
                None => FxHashSet::default(),
            };
            self.scopes.push(HandleScope {
                local: handles,
                captured,
            });
            for statement in body {
                self.statement(statement);
            }
            self.scopes.pop();
        }
        self.declarations.pop();
    }

    fn suppressed(&self) -> bool {
        let Some(&scope) = self.declarations.last() else {
            return false;
        };
        is_suppressed(
            CHECK_HANDLE_SCOPE,
            scope,
            &self.unit.symbols,
            &self.unit.types,
            self.ctx.markers,
        )
    }

    /// A handle driven in call position must belong to the current body.
    fn check_use(&mut self, expr: &TypedExpression) {
        let Some(handle) = handle_symbol(expr, self.unit, self.ctx) else {
            return;
        };
        let Some(scope) = self.scopes.last() else {
            return;
        };
        if scope.local.contains(&handle) {
            return;
        }
        if !self.reported.insert(expr.id) || self.suppressed() {
            return;
        }
        let local_names: Vec<&str> = self
            .scopes
            .last()
            .map(|s| s.local.iter().map(|&h| self.unit.symbols.name_of(h)).collect())
            .unwrap_or_default();
        let name = self.unit.symbols.name_of(handle);
        let mut builder = DiagnosticBuilder::error(
            format!(
                "coroutine handle `{}` is not owned by this coroutine body and cannot be driven here",
                name
            ),
            anchor_span(expr.location),
        )
        .code(CODE_FOREIGN_HANDLE)
        .note("a handle is only valid inside the coroutine body it was passed to");
        if !local_names.is_empty() {
            builder = builder.help(format!("use this body's own handle {}", or_join(&local_names)));
        }
        self.diags.push(builder.build());
    }

    /// Storing any visible handle into a field lets it outlive its run.
    fn check_field_store(&mut self, target: &TypedExpression, value: &TypedExpression, location: SourceLocation) -> bool {
        let field_symbol = match &target.kind {
            TypedExpressionKind::FieldAccess { field_symbol, .. }
            | TypedExpressionKind::StaticFieldAccess { field_symbol, .. } => *field_symbol,
            _ => return false,
        };
        let field_is_handle = self
            .unit
            .symbols
            .get(field_symbol)
            .is_some_and(|f| self.ctx.is_handle_type(f.type_id));
        if !field_is_handle {
            return false;
        }
        let Some(handle) = handle_symbol(value, self.unit, self.ctx) else {
            return false;
        };
        let Some(scope) = self.scopes.last() else {
            return false;
        };
        if !scope.local.contains(&handle) && !scope.captured.contains(&handle) {
            return false;
        }
        if !self.reported.insert(value.id) || self.suppressed() {
            return true;
        }
        self.diags.push(
            DiagnosticBuilder::error(
                format!(
                    "coroutine handle `{}` stored into field `{}` outlives its coroutine",
                    self.unit.symbols.name_of(handle),
                    self.unit.symbols.name_of(field_symbol)
                ),
                anchor_span(location),
            )
            .code(CODE_HANDLE_ESCAPE)
            .help("pass the handle as a parameter instead of storing it")
            .build(),
        );
        true
    }

    fn statement(&mut self, statement: &TypedStatement) {
        match statement {
            TypedStatement::Expression { expression, .. } => self.expression(expression),
            TypedStatement::VarDeclaration {
                symbol_id,
                var_type,
                initializer,
                ..
            } => {
                if let Some(init) = initializer {
                    self.check_use(init);
                    self.expression(init);
                }
                // A handle-typed local belongs to the body that declares it.
                if self.ctx.is_handle_type(*var_type) {
                    if let Some(scope) = self.scopes.last_mut() {
                        scope.local.push(*symbol_id);
                    }
                }
            }
            TypedStatement::Assignment {
                target,
                value,
                location,
            } => {
                if !self.check_field_store(target, value, *location) {
                    self.check_use(value);
                }
                self.expression(target);
                self.expression(value);
            }
            TypedStatement::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => {
                self.expression(condition);
                self.statement(then_branch);
                if let Some(else_branch) = else_branch {
                    self.statement(else_branch);
                }
            }
            TypedStatement::While {
                condition, body, ..
            } => {
                self.expression(condition);
                self.statement(body);
            }
            TypedStatement::For {
                init,
                condition,
                update,
                body,
                ..
            } => {
                if let Some(init) = init {
                    self.statement(init);
                }
                if let Some(condition) = condition {
                    self.expression(condition);
                }
                if let Some(update) = update {
                    self.expression(update);
                }
                self.statement(body);
            }
            TypedStatement::ForEach { iterable, body, .. } => {
                self.expression(iterable);
                self.statement(body);
            }
            TypedStatement::Switch {
                discriminant,
                cases,
                default_case,
                ..
            } => {
                self.expression(discriminant);
                for case in cases {
                    self.expression(&case.case_value);
                    self.statement(&case.body);
                }
                if let Some(default_case) = default_case {
                    self.statement(default_case);
                }
            }
            TypedStatement::Try {
                body,
                catch_clauses,
                finally_block,
                ..
            } => {
                self.statement(body);
                for clause in catch_clauses {
                    self.statement(&clause.body);
                }
                if let Some(finally_block) = finally_block {
                    self.statement(finally_block);
                }
            }
            TypedStatement::Return { value, .. } => {
                if let Some(value) = value {
                    self.expression(value);
                }
            }
            TypedStatement::Throw { exception, .. } => self.expression(exception),
            TypedStatement::Break { .. } | TypedStatement::Continue { .. } => {}
            TypedStatement::Block { statements, .. } => {
                for statement in statements {
                    self.statement(statement);
                }
            }
        }
    }

    fn expression(&mut self, expr: &TypedExpression) {
        match &expr.kind {
            TypedExpressionKind::MethodCall {
                receiver,
                arguments,
                ..
            } => {
                self.check_use(receiver);
                self.expression(receiver);
                for argument in arguments {
                    self.check_use(argument);
                    self.expression(argument);
                }
            }
            TypedExpressionKind::StaticMethodCall { arguments, .. }
            | TypedExpressionKind::New { arguments, .. } => {
                for argument in arguments {
                    self.check_use(argument);
                    self.expression(argument);
                }
            }
            TypedExpressionKind::FunctionCall {
                function,
                arguments,
            } => {
                self.expression(function);
                for argument in arguments {
                    self.check_use(argument);
                    self.expression(argument);
                }
            }
            TypedExpressionKind::FieldAccess { object, .. } => self.expression(object),
            TypedExpressionKind::Lambda {
                symbol_id,
                parameters,
                body,
            } => self.enter_callable(*symbol_id, parameters, body),
            TypedExpressionKind::BinaryOp { left, right, .. } => {
                self.expression(left);
                self.expression(right);
            }
            TypedExpressionKind::UnaryOp { operand, .. } => self.expression(operand),
            TypedExpressionKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                self.expression(condition);
                self.expression(then_expr);
                if let Some(else_expr) = else_expr {
                    self.expression(else_expr);
                }
            }
            TypedExpressionKind::Cast { expression, .. } => self.expression(expression),
            TypedExpressionKind::Literal { .. }
            | TypedExpressionKind::Null
            | TypedExpressionKind::This
            | TypedExpressionKind::Variable { .. }
            | TypedExpressionKind::StaticFieldAccess { .. } => {}
        }
    }
}
