use crate::checks::LoopSafetyVerifier;
use crate::sem::{SymbolId, SymbolKind, TypeId, TypedParameter};

use super::test_helpers::*;

/// A coroutine function `run` with one handle parameter plus a `yield`
/// method symbol to call on it.
struct CoroFixture {
    b: UnitBuilder,
    handle_ty: TypeId,
    func: SymbolId,
    yield_m: SymbolId,
    param: TypedParameter,
}

fn coro_fixture(handle_name: &str) -> CoroFixture {
    let mut b = UnitBuilder::new();
    let handle_ty = b.handle_type();
    let handle_class = b.declare("Coroutine", SymbolKind::Class, handle_ty, None);
    let yield_m = b.method(handle_class, handle_ty, "yield", vec![]);
    let func = b.declare("run", SymbolKind::Method, TypeId::invalid(), None);
    let param = b.param(func, handle_name, handle_ty);
    CoroFixture {
        b,
        handle_ty,
        func,
        yield_m,
        param,
    }
}

// Scenario: one handle `c`, empty loop body.
#[test]
fn empty_loop_in_coroutine_is_reported() {
    let mut f = coro_fixture("c");
    let cond = f.b.bool_lit(true, 2);
    f.b.function(
        f.func,
        vec![f.param.clone()],
        vec![while_loop(cond, vec![], 2)],
    );
    let diags = run_verifier(&LoopSafetyVerifier, &f.b.build());

    assert_eq!(codes(&diags), vec!["V0002"]);
    let diag = diags.iter().next().unwrap();
    assert!(diag.help.iter().any(|h| h.contains("`c`")), "got: {:?}", diag.help);
    assert!(diag.help.iter().any(|h| h.contains("`yield`")));
}

// Scenario: handles `a` and `b`, body yields on `a`.
#[test]
fn yield_on_either_owned_handle_satisfies() {
    let mut b = UnitBuilder::new();
    let handle_ty = b.handle_type();
    let handle_class = b.declare("Coroutine", SymbolKind::Class, handle_ty, None);
    let yield_m = b.method(handle_class, handle_ty, "yield", vec![]);
    let func = b.declare("run", SymbolKind::Method, TypeId::invalid(), None);
    let pa = b.param(func, "a", handle_ty);
    let pb = b.param(func, "b", handle_ty);

    let cond = b.bool_lit(true, 2);
    let av = b.var(pa.symbol_id, handle_ty, 3);
    let call = b.call(av, yield_m, vec![], 3);
    b.function(
        func,
        vec![pa, pb],
        vec![while_loop(cond, vec![expr_stmt(call)], 2)],
    );
    let diags = run_verifier(&LoopSafetyVerifier, &b.build());
    assert!(diags.is_empty(), "got: {:?}", messages(&diags));
}

#[test]
fn iterator_loops_are_exempt() {
    let mut f = coro_fixture("c");
    let items = f
        .b
        .declare("items", SymbolKind::Local, TypeId::invalid(), Some(f.func));
    let item = f
        .b
        .declare("item", SymbolKind::Local, TypeId::invalid(), Some(f.func));
    let iterable = f.b.var(items, TypeId::invalid(), 2);
    f.b.function(
        f.func,
        vec![f.param.clone()],
        vec![for_each(item, iterable, vec![], 2)],
    );
    let diags = run_verifier(&LoopSafetyVerifier, &f.b.build());
    assert!(diags.is_empty(), "got: {:?}", messages(&diags));
}

#[test]
fn loops_outside_coroutines_are_ignored() {
    let mut b = UnitBuilder::new();
    b.handle_type();
    let func = b.declare("busyWait", SymbolKind::Method, TypeId::invalid(), None);
    let cond = b.bool_lit(true, 2);
    b.function(func, vec![], vec![while_loop(cond, vec![], 2)]);
    let diags = run_verifier(&LoopSafetyVerifier, &b.build());
    assert!(diags.is_empty(), "got: {:?}", messages(&diags));
}

#[test]
fn nested_starved_loops_report_outer_first() {
    let mut f = coro_fixture("c");
    let outer_cond = f.b.bool_lit(true, 2);
    let inner_cond = f.b.bool_lit(true, 3);
    f.b.function(
        f.func,
        vec![f.param.clone()],
        vec![while_loop(
            outer_cond,
            vec![while_loop(inner_cond, vec![], 3)],
            2,
        )],
    );
    let diags = run_verifier(&LoopSafetyVerifier, &f.b.build());

    assert_eq!(codes(&diags), vec!["V0002", "V0002"]);
    let lines: Vec<usize> = diags.iter().map(|d| d.span.start.line).collect();
    assert_eq!(lines, vec![2, 3]);
}

// A yield belongs to its nearest enclosing loop; the outer loop still
// spins without yielding when the inner loop exits early.
#[test]
fn yield_in_inner_loop_does_not_excuse_the_outer() {
    let mut f = coro_fixture("c");
    let outer_cond = f.b.bool_lit(true, 2);
    let inner_cond = f.b.bool_lit(true, 3);
    let cv = f.b.var(f.param.symbol_id, f.handle_ty, 4);
    let call = f.b.call(cv, f.yield_m, vec![], 4);
    f.b.function(
        f.func,
        vec![f.param.clone()],
        vec![while_loop(
            outer_cond,
            vec![while_loop(inner_cond, vec![expr_stmt(call)], 3)],
            2,
        )],
    );
    let diags = run_verifier(&LoopSafetyVerifier, &f.b.build());

    assert_eq!(codes(&diags), vec!["V0002"]);
    assert_eq!(diags.iter().next().unwrap().span.start.line, 2);
}

#[test]
fn yield_in_each_nesting_level_satisfies_both() {
    let mut f = coro_fixture("c");
    let outer_cond = f.b.bool_lit(true, 2);
    let inner_cond = f.b.bool_lit(true, 3);
    let cv_inner = f.b.var(f.param.symbol_id, f.handle_ty, 4);
    let inner_call = f.b.call(cv_inner, f.yield_m, vec![], 4);
    let cv_outer = f.b.var(f.param.symbol_id, f.handle_ty, 5);
    let outer_call = f.b.call(cv_outer, f.yield_m, vec![], 5);
    f.b.function(
        f.func,
        vec![f.param.clone()],
        vec![while_loop(
            outer_cond,
            vec![
                while_loop(inner_cond, vec![expr_stmt(inner_call)], 3),
                expr_stmt(outer_call),
            ],
            2,
        )],
    );
    let diags = run_verifier(&LoopSafetyVerifier, &f.b.build());
    assert!(diags.is_empty(), "got: {:?}", messages(&diags));
}

#[test]
fn captured_handle_does_not_satisfy_a_nested_coroutine() {
    let mut f = coro_fixture("outer");
    let lambda_sym = f
        .b
        .declare("lambda#0", SymbolKind::Method, TypeId::invalid(), Some(f.func));
    let inner_param = f.b.param(lambda_sym, "inner", f.handle_ty);
    let cond = f.b.bool_lit(true, 3);
    let outer_v = f.b.var(f.param.symbol_id, f.handle_ty, 4);
    let call = f.b.call(outer_v, f.yield_m, vec![], 4);
    let lambda = f.b.lambda(
        lambda_sym,
        vec![inner_param],
        vec![while_loop(cond, vec![expr_stmt(call)], 3)],
        2,
    );
    f.b.function(f.func, vec![f.param.clone()], vec![expr_stmt(lambda)]);
    let diags = run_verifier(&LoopSafetyVerifier, &f.b.build());

    assert_eq!(codes(&diags), vec!["V0002"]);
    let diag = diags.iter().next().unwrap();
    assert!(diag.help.iter().any(|h| h.contains("`inner`")), "got: {:?}", diag.help);
}

#[test]
fn plain_lambda_stays_part_of_the_coroutine() {
    let mut f = coro_fixture("c");
    let lambda_sym = f
        .b
        .declare("lambda#0", SymbolKind::Method, TypeId::invalid(), Some(f.func));
    let cond = f.b.bool_lit(true, 3);
    let lambda = f.b.lambda(
        lambda_sym,
        vec![],
        vec![while_loop(cond, vec![], 3)],
        2,
    );
    f.b.function(f.func, vec![f.param.clone()], vec![expr_stmt(lambda)]);
    let diags = run_verifier(&LoopSafetyVerifier, &f.b.build());
    assert_eq!(codes(&diags), vec!["V0002"]);
}

#[test]
fn unresolved_yield_method_symbol_stays_silent() {
    let mut f = coro_fixture("c");
    let cond = f.b.bool_lit(true, 2);
    let cv = f.b.var(f.param.symbol_id, f.handle_ty, 3);
    let call = f.b.call(cv, SymbolId::invalid(), vec![], 3);
    f.b.function(
        f.func,
        vec![f.param.clone()],
        vec![while_loop(cond, vec![expr_stmt(call)], 2)],
    );
    let diags = run_verifier(&LoopSafetyVerifier, &f.b.build());
    // The call cannot be proven to yield, so the loop is still starved,
    // but the unresolved symbol itself must not panic or misfire.
    assert_eq!(codes(&diags), vec!["V0002"]);
}
