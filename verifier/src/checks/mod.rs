//! The flow-sensitive verifiers
//!
//! Each verifier is a stateless struct whose `analyze` walks a unit's
//! function bodies with explicit context, collecting diagnostics. Shared
//! plumbing for diagnostic anchors and name formatting lives here.

pub mod init_lifecycle;
pub mod loop_safety;
pub mod scope_capture;

pub use init_lifecycle::InitLifecycleVerifier;
pub use loop_safety::LoopSafetyVerifier;
pub use scope_capture::ScopeCaptureVerifier;

use diagnostics::{FileId, SourcePosition, SourceSpan};

use crate::driver::AnalysisContext;
use crate::sem::{CompilationUnit, SourceLocation, SymbolId, TypedExpression};

/// Diagnostic code: a tracked object never saw a required initializer
pub const CODE_MISSING_INIT: &str = "V0001";
/// Diagnostic code: an unbounded loop body cannot reach a yield point
pub const CODE_MISSING_YIELD: &str = "V0002";
/// Diagnostic code: a handle used outside the scope it belongs to
pub const CODE_FOREIGN_HANDLE: &str = "V0003";
/// Diagnostic code: a handle stored into longer-lived state
pub const CODE_HANDLE_ESCAPE: &str = "V0004";

/// One-column span anchoring a diagnostic at a tree location
pub fn anchor_span(location: SourceLocation) -> SourceSpan {
    let position = SourcePosition::new(
        location.line as usize,
        location.column as usize,
        location.byte_offset as usize,
    );
    SourceSpan::point(FileId::new(location.file_id), position)
}

/// The handle-typed symbol an expression names, if any. Only plain variable
/// and parameter references count; anything fancier resolves to `None` and
/// the verifiers stay silent about it.
pub fn handle_symbol(
    expr: &TypedExpression,
    unit: &CompilationUnit,
    ctx: &AnalysisContext<'_>,
) -> Option<SymbolId> {
    let symbol_id = expr.as_variable()?;
    let symbol = unit.symbols.get(symbol_id)?;
    ctx.is_handle_type(symbol.type_id).then_some(symbol_id)
}

/// Join backticked names into an "or" list: "`a`", "`a` or `b`",
/// "`a`, `b`, or `c`".
pub fn or_join(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [only] => format!("`{}`", only),
        [first, second] => format!("`{}` or `{}`", first, second),
        [init @ .., last] => {
            let mut out = String::new();
            for name in init {
                out.push_str(&format!("`{}`, ", name));
            }
            out.push_str(&format!("or `{}`", last));
            out
        }
    }
}
