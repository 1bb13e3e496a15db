//! Fixed filenames, marker directories, and recognisers shared across loaders.
//!
//! Collected in one module to avoid scattering the same literal across
//! several files.

use regex::Regex;
use std::sync::LazyLock;

/// Bundled schema resource paths (see `core::schema`).
pub const METADATA_SCHEMA_FNAME: &str = "metadata.json";
pub const STATES_SCHEMA_FNAME: &str = "states.json";

/// Paths within the project hierarchy.
pub const VCS_BNAME: &str = ".git";
pub const STATES_BNAME: &str = "STATES.yml";
pub const METADATA_BNAME: &str = "METADATA.yml";
pub const PLANS_BNAME: &str = "PLANS.rst";
pub const EXCLUDE_DIRS: [&str; 3] = ["LIB", "SRC", "TMP"];

/// Recogniser for a project plan's action directive lines.
///
/// Captures the TODO keyword and the title text, anchored at both ends.
pub static ACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.\. +todo:: +(?P<todo>[A-Z]+) +(?P<title>.*?) *$").unwrap());
