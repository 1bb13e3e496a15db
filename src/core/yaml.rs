//! C2: the metadata loader.
//!
//! Loads a YAML document into an untyped `serde_yaml::Value` tree.
//! Unlike loaders built on top of some YAML libraries, `serde_yaml`
//! never performs implicit timestamp-tag resolution, so values that
//! look like dates stay strings all the way through to C3's schema
//! projection, satisfying the "timestamps are never auto-coerced"
//! contract with no extra loader configuration.

use crate::core::error::{Diagnostic, RobantError};
use std::fs;
use std::path::Path;

/// Read and parse a YAML file into an untyped tree.
///
/// On a syntax error, surfaces the parser's line/column when
/// `serde_yaml` reports one, else falls back to the file-only
/// diagnostic form.
pub fn load_yaml(path: &Path) -> Result<serde_yaml::Value, RobantError> {
    let text = fs::read_to_string(path)?;
    serde_yaml::from_str(&text).map_err(|err| {
        let message = err.to_string();
        let diagnostic = match err.location() {
            Some(loc) => Diagnostic::parse(path, message).with_column(loc.line(), loc.column()),
            None => Diagnostic::parse(path, message),
        };
        diagnostic.into()
    })
}
