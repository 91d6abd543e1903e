//! Marker configuration
//!
//! The engine recognizes the scheduler runtime purely through fully
//! qualified names. Hosts that relocate the runtime override these names;
//! everything else in the engine stays name-agnostic.

use serde::{Deserialize, Serialize};

/// Check key for the initialization lifecycle verifier
pub const CHECK_REQUIRED_INIT: &str = "required-init";
/// Check key for the loop safety verifier
pub const CHECK_LOOP_YIELD: &str = "loop-yield";
/// Check key for the scope capture verifier
pub const CHECK_HANDLE_SCOPE: &str = "handle-scope";
/// Reserved suppression key matching every suppressible check
pub const SUPPRESS_ALL: &str = "all";

/// Fully qualified names the verifiers match against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Type of the cooperative-scheduling handle
    pub handle_type: String,
    /// Methods on the handle that count as a yield point
    pub yield_methods: Vec<String>,
    /// Annotation that marks a method as a required initializer
    pub required_init_annotation: String,
    /// Annotation that marks the object position of a static initializer
    pub init_object_param_annotation: String,
    /// Annotation that suppresses checks by key
    pub suppression_annotation: String,
    /// Supertype a class must carry for class-level suppression to apply
    pub suppression_class_marker: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            handle_type: "coro.sched.Coroutine".to_string(),
            yield_methods: vec!["yield".to_string()],
            required_init_annotation: "coro.lifecycle.RequiredInit".to_string(),
            init_object_param_annotation: "coro.lifecycle.InitTarget".to_string(),
            suppression_annotation: "coro.SuppressChecks".to_string(),
            suppression_class_marker: "coro.sched.Schedulable".to_string(),
        }
    }
}

impl MarkerConfig {
    pub fn is_yield_method(&self, name: &str) -> bool {
        self.yield_methods.iter().any(|m| m == name)
    }
}
