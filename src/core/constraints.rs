//! C5: the constraint evaluator.
//!
//! Pure functions over compiled clauses and action-count bags. Kept
//! separate from `model` because both the satisfiability search (C4)
//! and project satisfaction checking (C6) call `classifiers`/`satisfies`
//! against otherwise unrelated bags.

use crate::core::model::{ActionCounts, CompiledClause, CompiledConstraints};
use std::collections::HashMap;

fn lookup(bag: &ActionCounts) -> HashMap<&str, u32> {
    bag.iter().map(|(k, v)| (k.as_str(), *v)).collect()
}

/// Whether `bag` satisfies every clause in `clauses`.
pub fn satisfies(clauses: &[CompiledClause], bag: &ActionCounts) -> bool {
    let counts = lookup(bag);
    clauses.iter().all(|clause| {
        let sum: u32 = clause
            .states
            .iter()
            .map(|a| *counts.get(a.as_str()).unwrap_or(&0))
            .sum();
        sum >= clause.lo && clause.hi.is_none_or(|hi| sum <= hi)
    })
}

/// Every project state whose clauses `bag` satisfies.
pub fn classifiers(compiled: &CompiledConstraints, bag: &ActionCounts) -> Vec<String> {
    compiled
        .iter()
        .filter(|(_, clauses)| satisfies(clauses, bag))
        .map(|(state, _)| state.clone())
        .collect()
}
