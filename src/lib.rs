//! Robant validates a forest of projects against a user-defined workflow
//! state model.
//!
//! A forest is a directory tree rooted at a version-control checkout.
//! Each leaf or branch in the tree that carries both a `METADATA.yml`
//! and a `PLANS.rst` is a project; `STATES.yml` at the forest root
//! declares the workflow every project's `todo` field must live inside.
//! `robant validate` walks the forest, checks every project against the
//! model, and reports the first failure it finds per project as a
//! single-line diagnostic.
//!
//! # Crate structure
//!
//! - [`core::hierarchy`]: locates the repository root and walks projects
//! - [`core::yaml`] / [`core::plan`]: load `METADATA.yml` and `PLANS.rst`
//! - [`core::schema`]: binds raw documents to their JSON Schema
//! - [`core::model`]: the state model — partition, validity, satisfiability
//! - [`core::constraints`]: the compiled-constraint evaluator
//! - [`core::interval`]: chronology's overlap index
//! - [`core::project`]: the four per-project checks
//! - [`core::report`]: console progress reporting

pub mod core;

use crate::core::error::RobantError;
use crate::core::hierarchy::{self, Label};
use crate::core::model;
use crate::core::plan;
use crate::core::project;
use crate::core::report::Report;
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "robant", version = env!("CARGO_PKG_VERSION"), about = "Validates a forest of projects against a workflow state model")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the tool's purpose and the forest layout it expects.
    About,
    /// Load and analyse the forest's state model without validating projects.
    Model {
        /// Forest root. Defaults to the enclosing repository.
        #[arg(short, long)]
        root: Option<PathBuf>,
    },
    /// Validate every project in the forest against the state model.
    Validate {
        /// Forest root. Defaults to the enclosing repository.
        #[arg(short, long)]
        root: Option<PathBuf>,
        /// Validate a single project directory instead of the whole forest.
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Scaffold a new project. Not yet implemented.
    Add,
}

fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf, RobantError> {
    let start = match root {
        Some(r) => r,
        None => std::env::current_dir()?,
    };
    hierarchy::locate_repository_root(&start)
}

const ABOUT_TEXT: &str = "\
robant validates a forest of projects against a user-defined workflow state model.

Expected layout, at the forest root:
  STATES.yml        declares action states, limb states, empty states, and the
                     open/shut states built from constraints over them
  <project>/
    METADATA.yml     identity, tags, and the project's logbook
    PLANS.rst        free-form plan text with `.. todo:: STATE title` directives

Run `robant model` to check the state model alone, or `robant validate` to
check the whole forest.";

/// Parse CLI arguments and dispatch.
pub fn run() -> Result<(), RobantError> {
    let cli = Cli::parse();
    match cli.command {
        Command::About => {
            println!("{ABOUT_TEXT}");
            Ok(())
        }
        Command::Model { root } => run_model(root),
        Command::Validate { root, dir } => run_validate(root, dir),
        Command::Add => Err(RobantError::NotImplemented("add".to_string())),
    }
}

fn run_model(root: Option<PathBuf>) -> Result<(), RobantError> {
    let root = resolve_root(root)?;
    model::load_and_analyse(&root)?;
    println!("OK");
    Ok(())
}

fn run_validate(root: Option<PathBuf>, dir: Option<PathBuf>) -> Result<(), RobantError> {
    let root = resolve_root(root)?;
    let (state_model, compiled) = model::load_and_analyse(&root)?;

    let walk_start = match &dir {
        Some(d) => d.clone(),
        None => root.clone(),
    };
    let projects = hierarchy::walk_labelled_projects(&walk_start)?;

    let mut report = Report::new();
    let mut uuids: HashMap<String, PathBuf> = HashMap::new();
    let mut tree = core::interval::IntervalTree::new();

    for labelled in &projects {
        let err = match validate_one(&state_model, &compiled, &mut uuids, &mut tree, labelled.label, labelled) {
            Ok(()) => {
                report.pass(&labelled.metadata_path.display().to_string());
                continue;
            }
            Err(err) => err,
        };
        report.fail(&labelled.metadata_path.display().to_string(), &err.to_string());
    }

    println!("{}", report.summary());
    if report.is_success() {
        Ok(())
    } else {
        Err(core::error::Diagnostic::hierarchy(root, "One or more projects failed validation").into())
    }
}

fn validate_one(
    state_model: &model::StateModel,
    compiled: &model::CompiledConstraints,
    uuids: &mut HashMap<String, PathBuf>,
    tree: &mut core::interval::IntervalTree,
    label: Label,
    labelled: &hierarchy::LabelledProject,
) -> Result<(), RobantError> {
    let metadata = project::load_project_metadata(&labelled.metadata_path)?;
    let actions = plan::load_actions(&labelled.plans_path)?;

    project::check_project_state(state_model, label, &metadata, &labelled.plans_path, &actions)?;

    let folder_name = labelled
        .metadata_path
        .parent()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    project::check_project_identity(uuids, state_model, &metadata, &folder_name)?;
    project::check_project_chronology(tree, state_model, &metadata)?;
    project::check_project_satisfaction(compiled, &metadata, &labelled.plans_path, &actions)?;
    Ok(())
}
