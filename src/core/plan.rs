//! C2: the plan file loader.
//!
//! A plan is free-form text; the only lines this tool interprets are
//! action directives. Everything else is ignored.

use crate::core::constants::ACTION_RE;
use crate::core::error::RobantError;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One action directive: its 1-indexed source line, its state, and its title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub line: usize,
    pub state: String,
    pub title: String,
}

/// Stream a plan file, yielding one `Action` per matching directive line.
pub fn load_actions(path: &Path) -> Result<Vec<Action>, RobantError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut actions = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if let Some(caps) = ACTION_RE.captures(&line) {
            actions.push(Action {
                line: idx + 1,
                state: caps["todo"].to_string(),
                title: caps["title"].to_string(),
            });
        }
    }
    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn plan_file(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{contents}").unwrap();
        f
    }

    #[test]
    fn extracts_directives_with_line_numbers() {
        let f = plan_file(
            "Some prose\n.. todo:: HOLD Triage the bug\nMore prose\n.. todo:: WORK Fix it\n",
        );
        let actions = load_actions(f.path()).unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].line, 2);
        assert_eq!(actions[0].state, "HOLD");
        assert_eq!(actions[0].title, "Triage the bug");
        assert_eq!(actions[1].line, 4);
        assert_eq!(actions[1].state, "WORK");
    }

    #[test]
    fn non_matching_lines_are_ignored() {
        let f = plan_file("nothing here\n.. note:: not a todo\n");
        let actions = load_actions(f.path()).unwrap();
        assert!(actions.is_empty());
    }

    #[test]
    fn trailing_whitespace_is_trimmed_from_title() {
        let f = plan_file(".. todo:: WORK Fix it   \n");
        let actions = load_actions(f.path()).unwrap();
        assert_eq!(actions[0].title, "Fix it");
    }
}
