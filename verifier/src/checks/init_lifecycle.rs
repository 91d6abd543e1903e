//! Initialization lifecycle verifier
//!
//! Tracks freshly constructed objects through each function body and reports
//! any whose required initializers were never called before the function
//! ends. Requirements come from `@RequiredInit` annotations on methods,
//! gathered over the declared type's full supertype closure.
//!
//! One threaded state map covers all control flow: a branch is walked in
//! sequence with its siblings, so an initializer call on any traversed path
//! counts. Tracking follows the variable binding for the whole body:
//! passing the object to a call, storing it, or returning it does not
//! discharge the requirement, only an observed initializer call (or
//! rebinding the variable away from the tracked object) does.

use diagnostics::{DiagnosticBuilder, Diagnostics};
use indexmap::{IndexMap, IndexSet};
use log::trace;

use crate::checks::{anchor_span, or_join, CODE_MISSING_INIT};
use crate::driver::{AnalysisContext, Verifier};
use crate::markers::CHECK_REQUIRED_INIT;
use crate::sem::{
    CompilationUnit, SourceLocation, SymbolId, TypeId, TypedExpression, TypedExpressionKind,
    TypedFunction, TypedStatement,
};
use crate::suppress::is_suppressed;

pub struct InitLifecycleVerifier;

impl Verifier for InitLifecycleVerifier {
    fn name(&self) -> &'static str {
        "init-lifecycle"
    }

    fn analyze(&self, unit: &CompilationUnit, ctx: &AnalysisContext<'_>, diags: &mut Diagnostics) {
        for function in unit.all_functions() {
            if is_suppressed(
                CHECK_REQUIRED_INIT,
                function.symbol_id,
                &unit.symbols,
                &unit.types,
                ctx.markers,
            ) {
                continue;
            }
            check_function(function, unit, ctx, diags);
        }
    }
}

/// One object under observation
struct Tracked {
    /// Variable name, for the message
    name: String,
    declared_type: TypeId,
    /// Construction site, used as the diagnostic anchor
    site: SourceLocation,
    /// Required initializers not yet seen, id and name, insertion order
    remaining: IndexMap<SymbolId, String>,
}

struct InitWalk<'a> {
    unit: &'a CompilationUnit,
    ctx: &'a AnalysisContext<'a>,
    tracked: IndexMap<SymbolId, Tracked>,
}

fn check_function(
    function: &TypedFunction,
    unit: &CompilationUnit,
    ctx: &AnalysisContext<'_>,
    diags: &mut Diagnostics,
) {
    let mut walk = InitWalk {
        unit,
        ctx,
        tracked: IndexMap::new(),
    };
    for statement in &function.body {
        walk.statement(statement);
    }
    walk.report(diags);
}

impl<'a> InitWalk<'a> {
    /// Required initializers for `type_id`, over its full supertype closure.
    /// The closure starts at the type itself, so an override in a subtype
    /// shadows the inherited declaration by name. Static methods only
    /// qualify when they mark an object parameter, and initializers hidden
    /// below their declaring type's own visibility are dropped since no
    /// caller outside the type could satisfy them.
    fn required_initializers(&self, type_id: TypeId) -> IndexMap<SymbolId, String> {
        let mut required = IndexMap::new();
        let mut seen_names: IndexSet<&str> = IndexSet::new();
        for ty in self.unit.types.supertype_closure(type_id) {
            let type_visibility = self
                .unit
                .symbols
                .type_declaration(ty)
                .map(|s| s.visibility)
                .unwrap_or_default();
            for method in self.unit.symbols.methods_of_type(ty) {
                if !seen_names.insert(method.name.as_str()) {
                    continue;
                }
                if !method.has_annotation(&self.ctx.markers.required_init_annotation) {
                    continue;
                }
                if method.is_static
                    && !method.has_annotation(&self.ctx.markers.init_object_param_annotation)
                {
                    continue;
                }
                if !method.visibility.at_least(type_visibility) {
                    continue;
                }
                required.insert(method.id, method.name.clone());
            }
        }
        required
    }

    fn start_tracking(&mut self, variable: SymbolId, declared_type: TypeId, site: SourceLocation) {
        // The opt-out may sit on the declaration itself, not just on the
        // enclosing function or class.
        if is_suppressed(
            CHECK_REQUIRED_INIT,
            variable,
            &self.unit.symbols,
            &self.unit.types,
            self.ctx.markers,
        ) {
            self.tracked.shift_remove(&variable);
            return;
        }
        let remaining = self.required_initializers(declared_type);
        if remaining.is_empty() {
            self.tracked.shift_remove(&variable);
            return;
        }
        let name = self.unit.symbols.name_of(variable).to_string();
        trace!(
            "tracking `{}` with {} required initializer(s)",
            name,
            remaining.len()
        );
        self.tracked.insert(
            variable,
            Tracked {
                name,
                declared_type,
                site,
                remaining,
            },
        );
    }

    /// Count a call to `method` (by symbol or by name) against `variable`.
    fn satisfy(&mut self, variable: SymbolId, method: SymbolId) {
        let Some(entry) = self.tracked.get_mut(&variable) else {
            return;
        };
        if entry.remaining.shift_remove(&method).is_some() {
            return;
        }
        // Calls can resolve to an override declared below where the
        // requirement was gathered; names tie them back together.
        if let Some(symbol) = self.unit.symbols.get(method) {
            entry.remaining.retain(|_, name| *name != symbol.name);
        }
    }

    fn statement(&mut self, statement: &TypedStatement) {
        match statement {
            TypedStatement::Expression { expression, .. } => self.expression(expression),
            TypedStatement::VarDeclaration {
                symbol_id,
                var_type,
                initializer,
                location,
            } => {
                if let Some(init) = initializer {
                    self.expression(init);
                    if let TypedExpressionKind::New { class_type, .. } = &init.kind {
                        let declared = if var_type.is_valid() { *var_type } else { *class_type };
                        self.start_tracking(*symbol_id, declared, *location);
                    }
                }
            }
            TypedStatement::Assignment {
                target,
                value,
                location,
            } => {
                self.expression(target);
                self.expression(value);
                // Rebinding a variable to a fresh object restarts its
                // lifecycle; rebinding to anything else ends tracking,
                // since the variable no longer names the tracked object.
                if let TypedExpressionKind::Variable { symbol_id } = &target.kind {
                    if let TypedExpressionKind::New { class_type, .. } = &value.kind {
                        let declared = self
                            .unit
                            .symbols
                            .get(*symbol_id)
                            .map(|s| s.type_id)
                            .filter(|t| t.is_valid())
                            .unwrap_or(*class_type);
                        self.start_tracking(*symbol_id, declared, *location);
                    } else {
                        self.tracked.shift_remove(symbol_id);
                    }
                }
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
                method_symbol,
                arguments,
            } => {
                self.expression(receiver);
                if let Some(variable) = receiver.as_variable() {
                    self.satisfy(variable, *method_symbol);
                }
                for argument in arguments {
                    self.expression(argument);
                }
            }
            TypedExpressionKind::StaticMethodCall {
                method_symbol,
                arguments,
                ..
            } => {
                let object_position = self
                    .unit
                    .symbols
                    .get(*method_symbol)
                    .and_then(|m| m.annotation(&self.ctx.markers.init_object_param_annotation))
                    .map(|a| a.int_arg.unwrap_or(0) as usize);
                for (position, argument) in arguments.iter().enumerate() {
                    self.expression(argument);
                    if object_position == Some(position) {
                        if let Some(variable) = argument.as_variable() {
                            self.satisfy(variable, *method_symbol);
                        }
                    }
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
            TypedExpressionKind::New { arguments, .. } => {
                for argument in arguments {
                    self.expression(argument);
                }
            }
            TypedExpressionKind::FieldAccess { object, .. } => self.expression(object),
            TypedExpressionKind::Lambda { body, .. } => {
                // A lambda may run before the function returns, so calls in
                // its body count toward satisfaction.
                for statement in body {
                    self.statement(statement);
                }
            }
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

    fn report(&self, diags: &mut Diagnostics) {
        for tracked in self.tracked.values() {
            if tracked.remaining.is_empty() {
                continue;
            }
            let names: Vec<&str> = tracked.remaining.values().map(|n| n.as_str()).collect();
            let type_name = self.unit.types.display_name(tracked.declared_type);
            let plural = if names.len() == 1 { "" } else { "s" };
            diags.push(
                DiagnosticBuilder::error(
                    format!(
                        "`{}` is constructed but required initializer{} {} never called",
                        tracked.name,
                        plural,
                        or_join(&names)
                    ),
                    anchor_span(tracked.site),
                )
                .code(CODE_MISSING_INIT)
                .help(format!(
                    "call {} on `{}` before the end of the enclosing function",
                    or_join(&names),
                    tracked.name
                ))
                .note(format!(
                    "`{}` declares these as required initializers",
                    type_name
                ))
                .build(),
            );
        }
    }
}
