//! Core modules implementing the state-model and project-validation pipeline.
//!
//! ## Module overview
//!
//! - **`error`**: canonical error type and the three-format diagnostic renderer.
//! - **`constants`**: fixed filenames and regexes shared by every loader.
//! - **`hierarchy`**: locates the repository root and walks project folders.
//! - **`yaml`**: loads a YAML document into an untyped, timestamp-preserving tree.
//! - **`plan`**: extracts action directives from a plan file.
//! - **`schema`**: binds raw documents to their JSON Schema and projects them
//!   into typed records.
//! - **`model`**: the state model — partition/validity checks, constraint
//!   compilation, and the breadth-first satisfiability proof.
//! - **`constraints`**: the compiled-constraint evaluator.
//! - **`interval`**: a small interval index used for logbook chronology.
//! - **`project`**: typed project records and the four per-project checks.
//! - **`report`**: console progress reporting.

pub mod constants;
pub mod constraints;
pub mod error;
pub mod hierarchy;
pub mod interval;
pub mod model;
pub mod plan;
pub mod project;
pub mod report;
pub mod schema;
pub mod yaml;
