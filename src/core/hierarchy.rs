//! C1: locates the repository root and walks the project hierarchy.
//!
//! Hunt and visit are two mutually-recursive traversal modes collapsed
//! here into a single loop over an explicit stack of pending
//! directories, so a pathologically deep tree cannot exhaust the
//! native call stack.

use crate::core::constants::{EXCLUDE_DIRS, METADATA_BNAME, PLANS_BNAME, VCS_BNAME};
use crate::core::error::{Diagnostic, RobantError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// A project's position in the hierarchy, as yielded by the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Limb,
    Leaf,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Label::Limb => "LIMB",
            Label::Leaf => "LEAF",
        })
    }
}

/// One labelled project: its position, its metadata path, its plan path.
#[derive(Debug, Clone)]
pub struct LabelledProject {
    pub label: Label,
    pub metadata_path: PathBuf,
    pub plans_path: PathBuf,
}

enum Frame {
    Hunt(PathBuf),
    Visit(PathBuf),
}

/// Search upward from `d` for a directory containing the VCS marker.
pub fn locate_repository_root(d: &Path) -> Result<PathBuf, RobantError> {
    let resolved = d.canonicalize()?;
    let mut cursor = Some(resolved.as_path());
    while let Some(dir) = cursor {
        if dir.join(VCS_BNAME).is_dir() {
            return Ok(dir.to_path_buf());
        }
        cursor = dir.parent();
    }
    Err(Diagnostic::repository(d, "No repository found").into())
}

/// Does `dir` contain both companion files, one, or neither?
///
/// Returns `Ok(true)` if both files are present, `Ok(false)` if
/// neither is, and an error identifying the missing file otherwise.
fn is_project(dir: &Path) -> Result<bool, RobantError> {
    let metadata = dir.join(METADATA_BNAME);
    let plans = dir.join(PLANS_BNAME);
    match (metadata.is_file(), plans.is_file()) {
        (true, true) => Ok(true),
        (true, false) => Err(Diagnostic::hierarchy(plans, "Missing project plans file").into()),
        (false, true) => {
            Err(Diagnostic::hierarchy(metadata, "Missing project metadata file").into())
        }
        (false, false) => Ok(false),
    }
}

/// Non-blacklisted subdirectories of `dir`, sorted by name for a
/// deterministic traversal order.
fn list_children(dir: &Path) -> Result<Vec<PathBuf>, RobantError> {
    let mut children = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            let name = entry.file_name();
            if !EXCLUDE_DIRS.contains(&name.to_string_lossy().as_ref()) {
                children.push(path);
            }
        }
    }
    children.sort();
    Ok(children)
}

fn push_children_reversed(stack: &mut Vec<Frame>, children: Vec<PathBuf>, make: fn(PathBuf) -> Frame) {
    for child in children.into_iter().rev() {
        stack.push(make(child));
    }
}

/// Walk the project hierarchy starting at `start`, yielding labelled
/// projects in depth-first pre-order.
pub fn walk_labelled_projects(start: &Path) -> Result<Vec<LabelledProject>, RobantError> {
    let start = start.canonicalize()?;
    let starting_is_project = is_project(&start)?;

    let initial = if !starting_is_project {
        Frame::Hunt(start)
    } else {
        let has_vcs_marker = start.join(VCS_BNAME).is_dir();
        let parent_is_project = match start.parent() {
            Some(parent) => is_project(parent)?,
            None => false,
        };
        if has_vcs_marker || !parent_is_project {
            Frame::Hunt(start)
        } else {
            Frame::Visit(start)
        }
    };

    let mut stack = vec![initial];
    let mut out = Vec::new();

    while let Some(frame) = stack.pop() {
        match frame {
            Frame::Hunt(dir) => {
                if is_project(&dir)? {
                    out.push(LabelledProject {
                        label: Label::Limb,
                        metadata_path: dir.join(METADATA_BNAME),
                        plans_path: dir.join(PLANS_BNAME),
                    });
                    push_children_reversed(&mut stack, list_children(&dir)?, Frame::Visit);
                } else {
                    push_children_reversed(&mut stack, list_children(&dir)?, Frame::Hunt);
                }
            }
            Frame::Visit(dir) => {
                if !is_project(&dir)? {
                    return Err(Diagnostic::hierarchy(
                        dir,
                        "Unexpected folder in project hierarchy",
                    )
                    .into());
                }
                let children = list_children(&dir)?;
                if children.is_empty() {
                    out.push(LabelledProject {
                        label: Label::Leaf,
                        metadata_path: dir.join(METADATA_BNAME),
                        plans_path: dir.join(PLANS_BNAME),
                    });
                } else {
                    out.push(LabelledProject {
                        label: Label::Limb,
                        metadata_path: dir.join(METADATA_BNAME),
                        plans_path: dir.join(PLANS_BNAME),
                    });
                    push_children_reversed(&mut stack, children, Frame::Visit);
                }
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{create_dir_all, write};
    use tempfile::tempdir;

    fn touch_project(dir: &Path) {
        create_dir_all(dir).unwrap();
        write(dir.join(METADATA_BNAME), "").unwrap();
        write(dir.join(PLANS_BNAME), "").unwrap();
    }

    #[test]
    fn locates_root_by_vcs_marker() {
        let root = tempdir().unwrap();
        create_dir_all(root.path().join(".git")).unwrap();
        let nested = root.path().join("a/b/c");
        create_dir_all(&nested).unwrap();
        let found = locate_repository_root(&nested).unwrap();
        assert_eq!(found, root.path().canonicalize().unwrap());
    }

    #[test]
    fn missing_repository_root_errors() {
        let root = tempdir().unwrap();
        let err = locate_repository_root(root.path()).unwrap_err();
        assert!(matches!(err, RobantError::Diagnostic(_)));
    }

    #[test]
    fn hunt_then_leaf_single_project() {
        let root = tempdir().unwrap();
        touch_project(&root.path().join("proj"));
        let found = walk_labelled_projects(root.path()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].label, Label::Leaf);
    }

    #[test]
    fn limb_with_two_leaf_children() {
        let root = tempdir().unwrap();
        touch_project(&root.path().join("parent"));
        touch_project(&root.path().join("parent/alpha"));
        touch_project(&root.path().join("parent/beta"));
        let found = walk_labelled_projects(root.path()).unwrap();
        assert_eq!(found.len(), 3);
        assert_eq!(found[0].label, Label::Limb);
        assert_eq!(found[1].label, Label::Leaf);
        assert_eq!(found[2].label, Label::Leaf);
        assert!(found[1].metadata_path.ends_with("parent/alpha/METADATA.yml"));
        assert!(found[2].metadata_path.ends_with("parent/beta/METADATA.yml"));
    }

    #[test]
    fn excluded_dirs_are_skipped() {
        let root = tempdir().unwrap();
        touch_project(&root.path().join("proj"));
        create_dir_all(root.path().join("proj/LIB/inner")).unwrap();
        let found = walk_labelled_projects(root.path()).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn missing_plans_file_errors() {
        let root = tempdir().unwrap();
        create_dir_all(root.path().join("proj")).unwrap();
        write(root.path().join("proj/METADATA.yml"), "").unwrap();
        let err = walk_labelled_projects(root.path()).unwrap_err();
        match err {
            RobantError::Diagnostic(d) => assert_eq!(d.message, "Missing project plans file"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unexpected_folder_inside_project_errors() {
        let root = tempdir().unwrap();
        touch_project(&root.path().join("parent"));
        create_dir_all(root.path().join("parent/stray")).unwrap();
        let err = walk_labelled_projects(root.path()).unwrap_err();
        match err {
            RobantError::Diagnostic(d) => {
                assert_eq!(d.message, "Unexpected folder in project hierarchy")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
