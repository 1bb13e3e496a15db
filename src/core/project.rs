//! C6: per-project checks — state, identity, chronology, satisfaction.
//!
//! `ProjectMetadata` and its nested records are the typed projection of
//! `METADATA.yml` produced by C3's schema binder. The four checks below
//! are run independently so a forest-wide validate can report every
//! failure kind it finds rather than stopping at the first.

use crate::core::constraints::classifiers;
use crate::core::error::{Diagnostic, RobantError};
use crate::core::hierarchy::Label;
use crate::core::interval::IntervalTree;
use crate::core::model::{CompiledConstraints, StateModel};
use crate::core::plan::Action;
use crate::core::schema::{self, SchemaKind};
use crate::core::yaml;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerIssue {
    pub reference: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrackerEvent {
    pub reference: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionEntry {
    pub at: DateTime<Utc>,
    #[serde(rename = "to")]
    pub to_state: String,
    #[serde(rename = "from", default)]
    pub from_state: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub tracker: Option<TrackerEvent>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IntervalEntry {
    pub start: DateTime<Utc>,
    pub stop: DateTime<Utc>,
    #[serde(default)]
    pub note: Option<String>,
}

/// One logbook entry: either a point-in-time state transition or a
/// span of recorded activity.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LogbookEntry {
    Transition(TransitionEntry),
    Interval(IntervalEntry),
}

/// `METADATA.yml`, bound and schema-checked.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectMetadata {
    pub uuid: String,
    pub slug: String,
    pub title: String,
    pub todo: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub tracker: Option<TrackerIssue>,
    /// Newest-first.
    pub logbook: Vec<LogbookEntry>,
    #[serde(skip)]
    pub fname: PathBuf,
}

/// Load and schema-bind a project's metadata file.
pub fn load_project_metadata(path: &Path) -> Result<ProjectMetadata, RobantError> {
    let raw = yaml::load_yaml(path)?;
    let mut metadata: ProjectMetadata = schema::bind(path, raw, SchemaKind::ProjectMetadata)?;
    metadata.fname = path.to_path_buf();
    Ok(metadata)
}

/// Check that every state named anywhere in a project (its `todo`, its
/// logbook, and its plan's action directives) is declared in the model,
/// and that a LIMB project's `todo` is a limb state.
pub fn check_project_state(
    model: &StateModel,
    label: Label,
    metadata: &ProjectMetadata,
    plans_path: &Path,
    actions: &[Action],
) -> Result<(), RobantError> {
    let declared = model.all_project_states();
    if !declared.contains(&metadata.todo) {
        return Err(Diagnostic::project_state(
            &metadata.fname,
            format!("unknown project state: {}", metadata.todo),
        )
        .into());
    }
    if label == Label::Limb && !model.limb_states.contains(&metadata.todo) {
        return Err(Diagnostic::project_state(
            &metadata.fname,
            format!("LIMB project must be in a limb state, found {}", metadata.todo),
        )
        .into());
    }
    for entry in &metadata.logbook {
        if let LogbookEntry::Transition(t) = entry {
            if !declared.contains(&t.to_state) {
                return Err(Diagnostic::project_state(
                    &metadata.fname,
                    format!("unknown logbook state: {}", t.to_state),
                )
                .into());
            }
            if let Some(from) = &t.from_state {
                if !declared.contains(from) {
                    return Err(Diagnostic::project_state(
                        &metadata.fname,
                        format!("unknown logbook state: {from}"),
                    )
                    .into());
                }
            }
        }
    }
    for action in actions {
        if !model.action_states.contains(&action.state) {
            return Err(Diagnostic::project_state(
                plans_path,
                format!("unknown action state: {}", action.state),
            )
            .with_line(action.line)
            .into());
        }
    }
    Ok(())
}

/// Check that a project's UUID is unique across the forest and, unless
/// it is in a limb state, that its slug matches its folder name.
pub fn check_project_identity(
    uuids: &mut HashMap<String, PathBuf>,
    model: &StateModel,
    metadata: &ProjectMetadata,
    folder_name: &str,
) -> Result<(), RobantError> {
    if let Some(prev) = uuids.get(&metadata.uuid) {
        return Err(Diagnostic::project_identity(
            &metadata.fname,
            format!("duplicate UUID, already used by {}", prev.display()),
        )
        .into());
    }
    uuids.insert(metadata.uuid.clone(), metadata.fname.clone());

    if !model.limb_states.contains(&metadata.todo) && metadata.slug != folder_name {
        return Err(Diagnostic::project_identity(
            &metadata.fname,
            format!("slug {} does not match folder name {folder_name}", metadata.slug),
        )
        .into());
    }
    Ok(())
}

/// Check a project's logbook for internal consistency: inception is
/// recorded, intervals don't overlap each other across the forest,
/// and each entry picks up exactly where the previous one left off.
pub fn check_project_chronology(
    tree: &mut IntervalTree,
    model: &StateModel,
    metadata: &ProjectMetadata,
) -> Result<(), RobantError> {
    for entry in &metadata.logbook {
        if let LogbookEntry::Interval(iv) = entry {
            if iv.stop < iv.start {
                return Err(Diagnostic::project_chronology(
                    &metadata.fname,
                    format!("interval has negative span: {} .. {}", iv.start, iv.stop),
                )
                .into());
            }
            if let Some((os, oe, other)) = tree.query_overlap(iv.start, iv.stop) {
                return Err(Diagnostic::project_chronology(
                    &metadata.fname,
                    format!(
                        "interval {} .. {} overlaps {} .. {} recorded by {}",
                        iv.start,
                        iv.stop,
                        os,
                        oe,
                        other.display()
                    ),
                )
                .into());
            }
            tree.insert(iv.start, iv.stop, metadata.fname.clone());
        }
    }

    let inception = metadata.logbook.last().ok_or_else(|| {
        RobantError::from(Diagnostic::project_chronology(
            &metadata.fname,
            "Logbook MUST record project inception",
        ))
    })?;
    let (mut pred_state, mut pred_stop) = match inception {
        LogbookEntry::Transition(t) if t.from_state.is_none() => (t.to_state.clone(), t.at),
        _ => {
            return Err(Diagnostic::project_chronology(
                &metadata.fname,
                "Logbook MUST record project inception",
            )
            .into());
        }
    };

    if model.limb_states.contains(&metadata.todo) && metadata.logbook.len() > 1 {
        return Err(Diagnostic::project_chronology(
            &metadata.fname,
            "Limb projects MUST NOT record activity",
        )
        .into());
    }

    for entry in metadata.logbook[..metadata.logbook.len() - 1].iter().rev() {
        match entry {
            LogbookEntry::Transition(t) => {
                if t.at < pred_stop {
                    return Err(Diagnostic::project_chronology(
                        &metadata.fname,
                        format!("transition at {} precedes prior activity ending {}", t.at, pred_stop),
                    )
                    .into());
                }
                if t.from_state.as_deref() != Some(pred_state.as_str()) {
                    return Err(Diagnostic::project_chronology(
                        &metadata.fname,
                        format!(
                            "transition at {} has from {:?}, expected {}",
                            t.at, t.from_state, pred_state
                        ),
                    )
                    .into());
                }
                pred_state = t.to_state.clone();
                pred_stop = t.at;
            }
            LogbookEntry::Interval(iv) => {
                if iv.start < pred_stop {
                    return Err(Diagnostic::project_chronology(
                        &metadata.fname,
                        format!(
                            "interval starting {} precedes prior activity ending {}",
                            iv.start, pred_stop
                        ),
                    )
                    .into());
                }
                if model.limb_states.contains(&pred_state) || model.shut_states.contains(&pred_state) {
                    return Err(Diagnostic::project_chronology(
                        &metadata.fname,
                        format!("interval starting {} recorded while project was in {}", iv.start, pred_state),
                    )
                    .into());
                }
                pred_stop = iv.stop;
            }
        }
    }

    if pred_state != metadata.todo {
        return Err(Diagnostic::project_chronology(
            &metadata.fname,
            "Final logbook transition MUST match project state",
        )
        .into());
    }

    Ok(())
}

fn clause_label(state: &str, members: &BTreeSet<String>, lo: u32, hi: Option<u32>) -> String {
    let joined = members.iter().cloned().collect::<Vec<_>>().join("|");
    match hi {
        Some(hi) => format!("{state}: {lo} <= {joined} <= {hi}"),
        None => format!("{state}: {lo} <= {joined}"),
    }
}

/// Check that a project's plan satisfies its current state's compiled
/// constraints, classifying each offending action to its exact line.
pub fn check_project_satisfaction(
    compiled: &CompiledConstraints,
    metadata: &ProjectMetadata,
    plans_path: &Path,
    actions: &[Action],
) -> Result<(), RobantError> {
    let Some(clauses) = compiled.get(&metadata.todo) else {
        if let Some(first) = actions.first() {
            return Err(Diagnostic::project_satisfaction(
                plans_path,
                format!("{}: limb state MUST NOT declare actions", metadata.todo),
            )
            .with_line(first.line)
            .into());
        }
        return Ok(());
    };

    for clause in clauses {
        let mut count = 0u32;
        for action in actions {
            if clause.states.contains(&action.state) {
                count += 1;
                if let Some(hi) = clause.hi {
                    if count > hi {
                        let label = clause_label(&metadata.todo, &clause.states, clause.lo, clause.hi);
                        return Err(Diagnostic::project_satisfaction(plans_path, label)
                            .with_line(action.line)
                            .into());
                    }
                }
            }
        }
        if count < clause.lo {
            let label = clause_label(&metadata.todo, &clause.states, clause.lo, clause.hi);
            return Err(Diagnostic::project_satisfaction(&metadata.fname, label).into());
        }
    }
    Ok(())
}

/// Every state a bag of action counts could belong to, surfaced for
/// `robant model`'s diagnostic output rather than validation proper.
pub fn classify(compiled: &CompiledConstraints, actions: &[Action]) -> Vec<String> {
    let mut counts: HashMap<&str, u32> = HashMap::new();
    for action in actions {
        *counts.entry(action.state.as_str()).or_insert(0) += 1;
    }
    let bag: Vec<(String, u32)> = counts.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    classifiers(compiled, &bag)
}
