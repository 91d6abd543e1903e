//! Static verification engine for cooperative-scheduling programs
//!
//! Runs after the host compiler's semantic analysis and proves three
//! structured-discipline properties over each compilation unit's resolved
//! tree:
//!
//! - every object declaring required post-construction initializers receives
//!   all of them before the end of the unit traversal,
//! - every unbounded loop inside a handle-accepting function yields on a
//!   locally owned cooperative handle in its own body,
//! - a cooperative handle never escapes the innermost scope that owns it.
//!
//! The engine only detects and reports; it never rewrites code. Entry point
//! is [`driver::AnalysisDriver`], which is notified once per compilation
//! unit and dispatches the registered verifiers.

pub mod checks;
pub mod driver;
pub mod logging;
pub mod markers;
pub mod sem;
pub mod suppress;

pub use driver::{AnalysisContext, AnalysisDriver, Verifier};
pub use markers::MarkerConfig;
pub use sem::CompilationUnit;

#[cfg(test)]
mod tests;
