//! Loop safety verifier
//!
//! Inside a coroutine body, an unbounded loop that never reaches a yield
//! point starves the cooperative scheduler. This verifier finds every
//! `while` and classic `for` loop inside a handle-accepting callable and
//! reports the ones with no yield call on an owned handle in their direct
//! body. Each nesting level is judged on its own: a yield belongs to the
//! nearest enclosing loop, so an inner loop that yields does not excuse an
//! outer loop that never does. Iterator loops are bounded by their
//! iterable and exempt.
//!
//! A lambda that takes its own handle parameter is a fresh coroutine body:
//! its loops are judged against its handle, never the enclosing one. Plain
//! lambdas stay part of the surrounding body.
//!
//! This check is never suppressible; a starved scheduler takes the whole
//! process with it.

use diagnostics::{DiagnosticBuilder, Diagnostics};
use log::trace;
use smallvec::SmallVec;

use crate::checks::{anchor_span, handle_symbol, or_join, CODE_MISSING_YIELD};
use crate::driver::{AnalysisContext, Verifier};
use crate::sem::{
    CompilationUnit, SourceLocation, SymbolId, TypedExpression, TypedExpressionKind,
    TypedParameter, TypedStatement,
};

pub struct LoopSafetyVerifier;

impl Verifier for LoopSafetyVerifier {
    fn name(&self) -> &'static str {
        "loop-safety"
    }

    fn analyze(&self, unit: &CompilationUnit, ctx: &AnalysisContext<'_>, diags: &mut Diagnostics) {
        let mut walk = LoopWalk {
            unit,
            ctx,
            owners: Vec::new(),
            loops: Vec::new(),
            diags,
        };
        for function in unit.all_functions() {
            walk.enter_callable(&function.parameters, &function.body);
        }
    }
}

/// One loop being judged, with the loops nested inside it
struct LoopState {
    location: SourceLocation,
    yields: usize,
    children: Vec<LoopState>,
}

struct LoopWalk<'a> {
    unit: &'a CompilationUnit,
    ctx: &'a AnalysisContext<'a>,
    /// Handle parameters of the enclosing coroutine bodies, innermost last
    owners: Vec<SmallVec<[SymbolId; 2]>>,
    /// Open loops of the current coroutine body, innermost last
    loops: Vec<LoopState>,
    diags: &'a mut Diagnostics,
}

impl<'a> LoopWalk<'a> {
    /// Walk a function or lambda body. A body with handle-typed parameters
    /// is a coroutine of its own and gets a fresh loop stack.
    fn enter_callable(&mut self, parameters: &[TypedParameter], body: &[TypedStatement]) {
        let handles: SmallVec<[SymbolId; 2]> = parameters
            .iter()
            .filter(|p| self.ctx.is_handle_type(p.param_type))
            .map(|p| p.symbol_id)
            .collect();
        if handles.is_empty() {
            for statement in body {
                self.statement(statement);
            }
            return;
        }

        trace!("entering coroutine body with {} handle(s)", handles.len());
        self.owners.push(handles);
        let saved_loops = std::mem::take(&mut self.loops);
        for statement in body {
            self.statement(statement);
        }
        self.loops = saved_loops;
        self.owners.pop();
    }

    fn in_coroutine(&self) -> bool {
        !self.owners.is_empty()
    }

    fn push_loop(&mut self, location: SourceLocation) {
        self.loops.push(LoopState {
            location,
            yields: 0,
            children: Vec::new(),
        });
    }

    fn pop_loop(&mut self) {
        let Some(state) = self.loops.pop() else {
            return;
        };
        match self.loops.last_mut() {
            Some(parent) => parent.children.push(state),
            None => self.report(&state),
        }
    }

    /// Outermost starved loop first, then its starved descendants.
    fn report(&mut self, state: &LoopState) {
        if state.yields == 0 {
            let yield_names: Vec<&str> = self
                .ctx
                .markers
                .yield_methods
                .iter()
                .map(|m| m.as_str())
                .collect();
            let handle_names: Vec<&str> = self
                .owners
                .last()
                .map(|handles| {
                    handles
                        .iter()
                        .map(|&h| self.unit.symbols.name_of(h))
                        .collect()
                })
                .unwrap_or_default();
            self.diags.push(
                DiagnosticBuilder::error(
                    "unbounded loop never yields control back to the scheduler",
                    anchor_span(state.location),
                )
                .code(CODE_MISSING_YIELD)
                .help(format!(
                    "call {} on {} somewhere in the loop body",
                    or_join(&yield_names),
                    or_join(&handle_names)
                ))
                .note("loops over a finite collection are exempt")
                .build(),
            );
        }
        for child in &state.children {
            self.report(child);
        }
    }

    /// A yield call counts for the innermost open loop when its receiver is
    /// one of the current body's own handles.
    fn observe_call(&mut self, receiver: &TypedExpression, method_symbol: SymbolId) {
        let Some(method) = self.unit.symbols.get(method_symbol) else {
            return;
        };
        if !self.ctx.markers.is_yield_method(&method.name) {
            return;
        }
        let Some(handle) = handle_symbol(receiver, self.unit, self.ctx) else {
            return;
        };
        let owned = self
            .owners
            .last()
            .is_some_and(|handles| handles.contains(&handle));
        if !owned {
            return;
        }
        if let Some(current) = self.loops.last_mut() {
            current.yields += 1;
        }
    }

    fn statement(&mut self, statement: &TypedStatement) {
        match statement {
            TypedStatement::Expression { expression, .. } => self.expression(expression),
            TypedStatement::VarDeclaration { initializer, .. } => {
                if let Some(init) = initializer {
                    self.expression(init);
                }
            }
            TypedStatement::Assignment { target, value, .. } => {
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
                condition,
                body,
                location,
            } => {
                self.expression(condition);
                if self.in_coroutine() {
                    self.push_loop(*location);
                    self.statement(body);
                    self.pop_loop();
                } else {
                    self.statement(body);
                }
            }
            TypedStatement::For {
                init,
                condition,
                update,
                body,
                location,
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
                if self.in_coroutine() {
                    self.push_loop(*location);
                    self.statement(body);
                    self.pop_loop();
                } else {
                    self.statement(body);
                }
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
                method_symbol,
                arguments,
            } => {
                self.expression(receiver);
                self.observe_call(receiver, *method_symbol);
                for argument in arguments {
                    self.expression(argument);
                }
            }
            TypedExpressionKind::StaticMethodCall { arguments, .. }
            | TypedExpressionKind::New { arguments, .. } => {
                for argument in arguments {
                    self.expression(argument);
                }
            }
            TypedExpressionKind::FunctionCall {
                function,
                arguments,
            } => {
                self.expression(function);
                for argument in arguments {
                    self.expression(argument);
                }
            }
            TypedExpressionKind::FieldAccess { object, .. } => self.expression(object),
            TypedExpressionKind::Lambda {
                parameters, body, ..
            } => self.enter_callable(parameters, body),
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
