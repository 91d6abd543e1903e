use crate::checks::ScopeCaptureVerifier;
use crate::markers::{CHECK_HANDLE_SCOPE, MarkerConfig};
use crate::sem::{Annotation, SymbolId, SymbolKind, TypeId, TypedParameter, Visibility};

use super::test_helpers::*;

struct NestedFixture {
    b: UnitBuilder,
    handle_ty: TypeId,
    yield_m: SymbolId,
    outer_func: SymbolId,
    outer_param: TypedParameter,
    lambda_sym: SymbolId,
    inner_param: TypedParameter,
}

/// A coroutine `run(outer)` whose body will hold a nested coroutine lambda
/// taking its own handle `inner`.
fn nested_fixture() -> NestedFixture {
    let mut b = UnitBuilder::new();
    let handle_ty = b.handle_type();
    let handle_class = b.declare("Coroutine", SymbolKind::Class, handle_ty, None);
    let yield_m = b.method(handle_class, handle_ty, "yield", vec![]);
    let outer_func = b.declare("run", SymbolKind::Method, TypeId::invalid(), None);
    let outer_param = b.param(outer_func, "outer", handle_ty);
    let lambda_sym = b.declare(
        "lambda#0",
        SymbolKind::Method,
        TypeId::invalid(),
        Some(outer_func),
    );
    let inner_param = b.param(lambda_sym, "inner", handle_ty);
    NestedFixture {
        b,
        handle_ty,
        yield_m,
        outer_func,
        outer_param,
        lambda_sym,
        inner_param,
    }
}

// Scenario: the inner coroutine drives the outer coroutine's handle.
#[test]
fn captured_handle_use_is_reported_with_local_alternative() {
    let mut f = nested_fixture();
    let outer_v = f.b.var(f.outer_param.symbol_id, f.handle_ty, 3);
    let call = f.b.call(outer_v, f.yield_m, vec![], 3);
    let lambda = f.b.lambda(
        f.lambda_sym,
        vec![f.inner_param.clone()],
        vec![expr_stmt(call)],
        2,
    );
    f.b.function(
        f.outer_func,
        vec![f.outer_param.clone()],
        vec![expr_stmt(lambda)],
    );
    let diags = run_verifier(&ScopeCaptureVerifier, &f.b.build());

    assert_eq!(codes(&diags), vec!["V0003"]);
    let diag = diags.iter().next().unwrap();
    assert!(diag.message.contains("`outer`"), "got: {}", diag.message);
    assert!(
        diag.help.iter().any(|h| h.contains("`inner`")),
        "got: {:?}",
        diag.help
    );
    assert_eq!(diag.span.start.line, 3);
}

#[test]
fn own_handle_use_is_fine() {
    let mut f = nested_fixture();
    let inner_v = f.b.var(f.inner_param.symbol_id, f.handle_ty, 3);
    let call = f.b.call(inner_v, f.yield_m, vec![], 3);
    let lambda = f.b.lambda(
        f.lambda_sym,
        vec![f.inner_param.clone()],
        vec![expr_stmt(call)],
        2,
    );
    f.b.function(
        f.outer_func,
        vec![f.outer_param.clone()],
        vec![expr_stmt(lambda)],
    );
    let diags = run_verifier(&ScopeCaptureVerifier, &f.b.build());
    assert!(diags.is_empty(), "got: {:?}", messages(&diags));
}

#[test]
fn captured_handle_as_argument_is_reported() {
    let mut f = nested_fixture();
    let helper = f
        .b
        .declare("spawn", SymbolKind::Method, TypeId::invalid(), None);
    let sched = f
        .b
        .declare("sched", SymbolKind::Local, TypeId::invalid(), Some(f.lambda_sym));
    let recv = f.b.var(sched, TypeId::invalid(), 3);
    let outer_v = f.b.var(f.outer_param.symbol_id, f.handle_ty, 3);
    let call = f.b.call(recv, helper, vec![outer_v], 3);
    let lambda = f.b.lambda(
        f.lambda_sym,
        vec![f.inner_param.clone()],
        vec![expr_stmt(call)],
        2,
    );
    f.b.function(
        f.outer_func,
        vec![f.outer_param.clone()],
        vec![expr_stmt(lambda)],
    );
    let diags = run_verifier(&ScopeCaptureVerifier, &f.b.build());
    assert_eq!(codes(&diags), vec!["V0003"]);
}

// Copying the foreign handle into a local is diagnosed at the copy, not
// at the later call through the alias.
#[test]
fn captured_handle_copied_into_a_local_is_reported() {
    let mut f = nested_fixture();
    let alias = f.b.declare(
        "alias",
        SymbolKind::Local,
        f.handle_ty,
        Some(f.lambda_sym),
    );
    let outer_v = f.b.var(f.outer_param.symbol_id, f.handle_ty, 3);
    let lambda = f.b.lambda(
        f.lambda_sym,
        vec![f.inner_param.clone()],
        vec![var_decl(alias, f.handle_ty, Some(outer_v), 3)],
        2,
    );
    f.b.function(
        f.outer_func,
        vec![f.outer_param.clone()],
        vec![expr_stmt(lambda)],
    );
    let diags = run_verifier(&ScopeCaptureVerifier, &f.b.build());

    assert_eq!(codes(&diags), vec!["V0003"]);
    assert!(messages(&diags)[0].contains("`outer`"));
}

#[test]
fn handle_stored_into_field_is_reported() {
    let mut b = UnitBuilder::new();
    let handle_ty = b.handle_type();
    b.declare("Coroutine", SymbolKind::Class, handle_ty, None);
    let robot_ty = b.class_type("robo.Robot", vec![]);
    let robot_class = b.declare("Robot", SymbolKind::Class, robot_ty, None);
    let field = b.declare_full(
        "stashed",
        SymbolKind::Field,
        handle_ty,
        Some(robot_class),
        Visibility::Private,
        false,
        vec![],
        Some(robot_ty),
    );
    let func = b.declare("run", SymbolKind::Method, TypeId::invalid(), Some(robot_class));
    let param = b.param(func, "c", handle_ty);
    let this_sym = b.declare("self", SymbolKind::Local, robot_ty, Some(func));

    let object = b.var(this_sym, robot_ty, 2);
    let target = b.field_access(object, field, handle_ty, 2);
    let value = b.var(param.symbol_id, handle_ty, 2);
    b.function(func, vec![param], vec![assign(target, value, 2)]);
    let diags = run_verifier(&ScopeCaptureVerifier, &b.build());

    assert_eq!(codes(&diags), vec!["V0004"]);
    let diag = diags.iter().next().unwrap();
    assert!(diag.message.contains("`c`"), "got: {}", diag.message);
    assert!(diag.message.contains("`stashed`"), "got: {}", diag.message);
}

#[test]
fn captured_handle_stored_into_field_at_depth_is_reported() {
    let mut f = nested_fixture();
    let holder_ty = f.b.class_type("robo.Holder", vec![]);
    let holder_class = f.b.declare("Holder", SymbolKind::Class, holder_ty, None);
    let field = f.b.declare_full(
        "keep",
        SymbolKind::Field,
        f.handle_ty,
        Some(holder_class),
        Visibility::Public,
        false,
        vec![],
        Some(holder_ty),
    );
    let holder = f
        .b
        .declare("holder", SymbolKind::Local, holder_ty, Some(f.lambda_sym));

    let object = f.b.var(holder, holder_ty, 3);
    let target = f.b.field_access(object, field, f.handle_ty, 3);
    let value = f.b.var(f.outer_param.symbol_id, f.handle_ty, 3);
    let lambda = f.b.lambda(
        f.lambda_sym,
        vec![f.inner_param.clone()],
        vec![assign(target, value, 3)],
        2,
    );
    f.b.function(
        f.outer_func,
        vec![f.outer_param.clone()],
        vec![expr_stmt(lambda)],
    );
    let diags = run_verifier(&ScopeCaptureVerifier, &f.b.build());
    assert_eq!(codes(&diags), vec!["V0004"]);
}

#[test]
fn non_handle_field_store_is_fine() {
    let mut b = UnitBuilder::new();
    let handle_ty = b.handle_type();
    let robot_ty = b.class_type("robo.Robot", vec![]);
    let robot_class = b.declare("Robot", SymbolKind::Class, robot_ty, None);
    let int_ty = b.types.add(crate::sem::TypeKind::Primitive {
        name: "int".to_string(),
    });
    let field = b.declare_full(
        "count",
        SymbolKind::Field,
        int_ty,
        Some(robot_class),
        Visibility::Private,
        false,
        vec![],
        Some(robot_ty),
    );
    let func = b.declare("run", SymbolKind::Method, TypeId::invalid(), Some(robot_class));
    let param = b.param(func, "c", handle_ty);
    let this_sym = b.declare("self", SymbolKind::Local, robot_ty, Some(func));

    let object = b.var(this_sym, robot_ty, 2);
    let target = b.field_access(object, field, int_ty, 2);
    let value = b.int(7, 2);
    b.function(func, vec![param], vec![assign(target, value, 2)]);
    let diags = run_verifier(&ScopeCaptureVerifier, &b.build());
    assert!(diags.is_empty(), "got: {:?}", messages(&diags));
}

#[test]
fn suppression_key_silences_the_check() {
    let markers = MarkerConfig::default();
    let mut f = nested_fixture();
    // Rebuild the lambda's enclosing function with a suppression annotation.
    let suppressed_func = f.b.declare_full(
        "runQuietly",
        SymbolKind::Method,
        TypeId::invalid(),
        None,
        Visibility::Public,
        false,
        vec![Annotation::new(&markers.suppression_annotation).with_strings(&[CHECK_HANDLE_SCOPE])],
        None,
    );
    let outer_param = f.b.param(suppressed_func, "outer2", f.handle_ty);
    let lambda_sym = f.b.declare(
        "lambda#1",
        SymbolKind::Method,
        TypeId::invalid(),
        Some(suppressed_func),
    );
    let inner_param = f.b.param(lambda_sym, "inner2", f.handle_ty);
    let outer_v = f.b.var(outer_param.symbol_id, f.handle_ty, 3);
    let call = f.b.call(outer_v, f.yield_m, vec![], 3);
    let lambda = f.b.lambda(lambda_sym, vec![inner_param], vec![expr_stmt(call)], 2);
    f.b.function(suppressed_func, vec![outer_param], vec![expr_stmt(lambda)]);
    let diags = run_verifier(&ScopeCaptureVerifier, &f.b.build());
    assert!(diags.is_empty(), "got: {:?}", messages(&diags));
}

#[test]
fn declared_handle_local_belongs_to_its_body() {
    let mut f = nested_fixture();
    let fork = f
        .b
        .declare("fork", SymbolKind::Method, TypeId::invalid(), None);
    let child = f
        .b
        .declare("child", SymbolKind::Local, f.handle_ty, Some(f.lambda_sym));
    let inner_v = f.b.var(f.inner_param.symbol_id, f.handle_ty, 3);
    let forked = f.b.call(inner_v, fork, vec![], 3);
    let child_v = f.b.var(child, f.handle_ty, 4);
    let call = f.b.call(child_v, f.yield_m, vec![], 4);
    let lambda = f.b.lambda(
        f.lambda_sym,
        vec![f.inner_param.clone()],
        vec![
            var_decl(child, f.handle_ty, Some(forked), 3),
            expr_stmt(call),
        ],
        2,
    );
    f.b.function(
        f.outer_func,
        vec![f.outer_param.clone()],
        vec![expr_stmt(lambda)],
    );
    let diags = run_verifier(&ScopeCaptureVerifier, &f.b.build());
    assert!(diags.is_empty(), "got: {:?}", messages(&diags));
}

#[test]
fn unresolvable_receiver_symbol_stays_silent() {
    let mut f = nested_fixture();
    let ghost = f.b.var(SymbolId::from_raw(999), f.handle_ty, 3);
    let call = f.b.call(ghost, f.yield_m, vec![], 3);
    let lambda = f.b.lambda(
        f.lambda_sym,
        vec![f.inner_param.clone()],
        vec![expr_stmt(call)],
        2,
    );
    f.b.function(
        f.outer_func,
        vec![f.outer_param.clone()],
        vec![expr_stmt(lambda)],
    );
    let diags = run_verifier(&ScopeCaptureVerifier, &f.b.build());
    assert!(diags.is_empty(), "got: {:?}", messages(&diags));
}

#[test]
fn use_in_the_owning_function_body_is_fine() {
    let mut b = UnitBuilder::new();
    let handle_ty = b.handle_type();
    let handle_class = b.declare("Coroutine", SymbolKind::Class, handle_ty, None);
    let yield_m = b.method(handle_class, handle_ty, "yield", vec![]);
    let func = b.declare("run", SymbolKind::Method, TypeId::invalid(), None);
    let param = b.param(func, "c", handle_ty);
    let cv = b.var(param.symbol_id, handle_ty, 2);
    let call = b.call(cv, yield_m, vec![], 2);
    b.function(func, vec![param], vec![expr_stmt(call)]);
    let diags = run_verifier(&ScopeCaptureVerifier, &b.build());
    assert!(diags.is_empty(), "got: {:?}", messages(&diags));
}
