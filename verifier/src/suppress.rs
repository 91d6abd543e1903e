//! Suppression resolver
//!
//! Answers one question for the verifiers: is check `key` suppressed at the
//! declaration whose lexical ancestry starts at `scope`? A suppression
//! annotation carries the check keys it silences as string arguments; the
//! reserved key `all` silences every suppressible check.
//!
//! Annotations are honored on callables anywhere, but on a class only when
//! the class participates in the scheduler (its supertype closure reaches
//! the schedulable marker). An annotation with no keys silences nothing.

use crate::markers::{MarkerConfig, SUPPRESS_ALL};
use crate::sem::{Symbol, SymbolId, SymbolKind, SymbolTable, TypeTable};

/// Is `key` suppressed anywhere on the ancestry chain starting at `scope`?
pub fn is_suppressed(
    key: &str,
    scope: SymbolId,
    symbols: &SymbolTable,
    types: &TypeTable,
    markers: &MarkerConfig,
) -> bool {
    symbols
        .ancestry(scope)
        .any(|symbol| suppresses(symbol, key, types, markers))
}

fn suppresses(symbol: &Symbol, key: &str, types: &TypeTable, markers: &MarkerConfig) -> bool {
    let Some(annotation) = symbol.annotation(&markers.suppression_annotation) else {
        return false;
    };
    if !class_eligible(symbol, types, markers) {
        return false;
    }
    annotation
        .string_args
        .iter()
        .any(|arg| arg == key || arg == SUPPRESS_ALL)
}

/// Class-level suppression only counts on types that opt into scheduling.
fn class_eligible(symbol: &Symbol, types: &TypeTable, markers: &MarkerConfig) -> bool {
    match symbol.kind {
        SymbolKind::Class | SymbolKind::Interface => {
            types.closure_contains(symbol.type_id, &markers.suppression_class_marker)
        }
        _ => true,
    }
}
