//! C3: schema binder.
//!
//! Two schemas are bundled into the binary and compiled lazily, once
//! each, behind a `OnceLock`. A raw document is validated against its
//! schema before being projected into its typed record;
//! `deny_unknown_fields` on every bound struct is the Rust-side
//! enforcement of "unknown fields are rejected" underneath the
//! JSON-Schema check.

use crate::core::constants::{METADATA_SCHEMA_FNAME, STATES_SCHEMA_FNAME};
use crate::core::error::{Diagnostic, RobantError};
use jsonschema::Validator;
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::OnceLock;

#[derive(RustEmbed)]
#[folder = "schema/"]
struct Schemas;

fn compile(name: &str) -> Validator {
    let bytes = Schemas::get(name).unwrap_or_else(|| panic!("bundled schema missing: {name}"));
    let schema: serde_json::Value =
        serde_json::from_slice(&bytes.data).expect("bundled schema must be valid JSON");
    jsonschema::validator_for(&schema).expect("bundled schema must compile")
}

fn metadata_validator() -> &'static Validator {
    static CELL: OnceLock<Validator> = OnceLock::new();
    CELL.get_or_init(|| compile(METADATA_SCHEMA_FNAME))
}

fn states_validator() -> &'static Validator {
    static CELL: OnceLock<Validator> = OnceLock::new();
    CELL.get_or_init(|| compile(STATES_SCHEMA_FNAME))
}

/// Which bundled schema a document must conform to.
#[derive(Debug, Clone, Copy)]
pub enum SchemaKind {
    StateModel,
    ProjectMetadata,
}

fn validator_for(kind: SchemaKind) -> &'static Validator {
    match kind {
        SchemaKind::StateModel => states_validator(),
        SchemaKind::ProjectMetadata => metadata_validator(),
    }
}

/// Validate a raw YAML tree against `kind`'s schema and project it into `T`.
pub fn bind<T: DeserializeOwned>(
    file: &Path,
    raw: serde_yaml::Value,
    kind: SchemaKind,
) -> Result<T, RobantError> {
    let json = serde_json::to_value(&raw)
        .map_err(|err| Diagnostic::parse(file, format!("not representable as JSON: {err}")))?;
    let validator = validator_for(kind);
    if let Err(err) = validator.validate(&json) {
        return Err(Diagnostic::parse(file, err.to_string()).into());
    }
    serde_json::from_value(json)
        .map_err(|err| Diagnostic::parse(file, format!("schema-valid but unbindable: {err}")).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    #[serde(deny_unknown_fields)]
    struct Minimal {
        action_states: Vec<String>,
        limb_states: Vec<String>,
        empty_states: Vec<String>,
        open_states: std::collections::BTreeMap<String, std::collections::BTreeMap<String, serde_json::Value>>,
        shut_states: std::collections::BTreeMap<String, std::collections::BTreeMap<String, serde_json::Value>>,
    }

    #[test]
    fn valid_state_model_binds() {
        let raw: serde_yaml::Value = serde_yaml::from_str(
            r#"
action_states: [HOLD, WAIT]
limb_states: [ROOT]
empty_states: [NOTE]
open_states:
  WATCH:
    HOLD: [1]
    WAIT: HOLD
shut_states: {}
"#,
        )
        .unwrap();
        let bound: Minimal =
            bind(Path::new("STATES.yml"), raw, SchemaKind::StateModel).unwrap();
        assert_eq!(bound.action_states, vec!["HOLD", "WAIT"]);
    }

    #[test]
    fn unknown_top_level_field_rejected() {
        let raw: serde_yaml::Value = serde_yaml::from_str(
            r#"
action_states: []
limb_states: []
empty_states: [NOTE]
open_states: {}
shut_states: {}
bogus: true
"#,
        )
        .unwrap();
        let err = bind::<Minimal>(Path::new("STATES.yml"), raw, SchemaKind::StateModel)
            .unwrap_err();
        assert!(matches!(err, RobantError::Diagnostic(_)));
    }
}
