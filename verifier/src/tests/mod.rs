//! Behavioral suite for the verifiers, built on hand-assembled units


mod loop_safety_tests;
mod scope_capture_tests;
