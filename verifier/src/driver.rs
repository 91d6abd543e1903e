//! Analysis driver
//!
//! Owns the registered verifiers and fans each resolved compilation unit out
//! to them in fixed registration order, once per unit. All verification runs
//! on the host compiler's thread after name and type resolution for the unit
//! has finished.

use diagnostics::Diagnostics;
use fxhash::FxHashSet;
use log::{debug, info};

use crate::checks::{InitLifecycleVerifier, LoopSafetyVerifier, ScopeCaptureVerifier};
use crate::markers::MarkerConfig;
use crate::sem::{CompilationUnit, TypeId, UnitId};

/// Shared per-unit context handed to every verifier
pub struct AnalysisContext<'a> {
    pub markers: &'a MarkerConfig,
    /// The handle type as resolved in this unit's type table
    pub handle_type: TypeId,
}

impl<'a> AnalysisContext<'a> {
    /// Does `type_id` name the scheduling handle type?
    pub fn is_handle_type(&self, type_id: TypeId) -> bool {
        type_id.is_valid() && type_id == self.handle_type
    }
}

/// One flow-sensitive check over a resolved unit
pub trait Verifier {
    /// Stable name for logs
    fn name(&self) -> &'static str;

    fn analyze(&self, unit: &CompilationUnit, ctx: &AnalysisContext<'_>, diags: &mut Diagnostics);
}

/// Dispatches verifiers over resolved compilation units
pub struct AnalysisDriver {
    markers: MarkerConfig,
    verifiers: Vec<Box<dyn Verifier>>,
    visited: FxHashSet<UnitId>,
}

impl AnalysisDriver {
    /// Driver with the three standard verifiers registered in fixed order
    pub fn new(markers: MarkerConfig) -> Self {
        Self {
            markers,
            verifiers: vec![
                Box::new(InitLifecycleVerifier),
                Box::new(LoopSafetyVerifier),
                Box::new(ScopeCaptureVerifier),
            ],
            visited: FxHashSet::default(),
        }
    }

    /// Driver with no verifiers; callers register their own
    pub fn empty(markers: MarkerConfig) -> Self {
        Self {
            markers,
            verifiers: Vec::new(),
            visited: FxHashSet::default(),
        }
    }

    pub fn register(&mut self, verifier: Box<dyn Verifier>) {
        self.verifiers.push(verifier);
    }

    pub fn markers(&self) -> &MarkerConfig {
        &self.markers
    }

    /// Entry point, called once the unit's names and types are resolved.
    /// Re-delivery of the same unit id is a no-op.
    pub fn semantic_analysis_complete(&mut self, unit: &CompilationUnit, diags: &mut Diagnostics) {
        if !self.visited.insert(unit.id) {
            debug!("unit {} already verified, skipping", unit.name);
            return;
        }

        // Units that never mention the handle type cannot participate in
        // the scheduling discipline at all; skip them wholesale.
        let Some(handle_type) = unit.types.lookup(&self.markers.handle_type) else {
            debug!(
                "unit {} does not resolve `{}`, skipping verification",
                unit.name, self.markers.handle_type
            );
            return;
        };
        let ctx = AnalysisContext {
            markers: &self.markers,
            handle_type,
        };

        let before = diags.len();
        for verifier in &self.verifiers {
            debug!("running {} on {}", verifier.name(), unit.name);
            verifier.analyze(unit, &ctx, diags);
        }
        info!(
            "verified {}: {} finding(s)",
            unit.name,
            diags.len() - before
        );
    }
}
