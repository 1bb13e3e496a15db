//! The state model: partitioning, validity, compilation, and the
//! breadth-first satisfiability proof.
//!
//! Three checks run in order: partition (no state declared twice),
//! validity (every constraint map covers exactly the declared action
//! states), and satisfiability (every declared state is actually
//! reachable from the empty bag). A bag's classification, once
//! recorded, is never retired, which both avoids revisiting a bag and
//! bounds the visited set by a hard ceiling.

use crate::core::constants::STATES_BNAME;
use crate::core::constraints::classifiers;
use crate::core::error::{Diagnostic, RobantError};
use crate::core::schema::{self, SchemaKind};
use crate::core::yaml;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::path::{Path, PathBuf};

/// A raw constraint entry: an exact count, a `[lo]`/`[lo, hi]` bound,
/// or a cross-reference to another action state's entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawConstraintEntry {
    Count(u32),
    Bound(Vec<u32>),
    CrossRef(String),
}

/// `STATES.yml`, bound but not yet checked.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawStateModel {
    pub action_states: Vec<String>,
    pub limb_states: Vec<String>,
    pub empty_states: Vec<String>,
    pub open_states: BTreeMap<String, BTreeMap<String, RawConstraintEntry>>,
    pub shut_states: BTreeMap<String, BTreeMap<String, RawConstraintEntry>>,
}

/// The state model after the partition and validity checks have passed.
#[derive(Debug, Clone)]
pub struct StateModel {
    pub source: PathBuf,
    pub action_states: BTreeSet<String>,
    pub limb_states: BTreeSet<String>,
    pub empty_states: BTreeSet<String>,
    pub open_states: BTreeSet<String>,
    pub shut_states: BTreeSet<String>,
    pub raw: RawStateModel,
}

impl StateModel {
    /// The union of every declared project state (limb, empty, open, shut).
    pub fn all_project_states(&self) -> BTreeSet<String> {
        let mut out = BTreeSet::new();
        out.extend(self.limb_states.iter().cloned());
        out.extend(self.empty_states.iter().cloned());
        out.extend(self.open_states.iter().cloned());
        out.extend(self.shut_states.iter().cloned());
        out
    }
}

/// One compiled clause: an equivalence class of action states with a
/// lower bound and optional upper bound.
#[derive(Debug, Clone)]
pub struct CompiledClause {
    pub states: BTreeSet<String>,
    pub lo: u32,
    pub hi: Option<u32>,
}

/// Project state name -> its compiled clauses.
pub type CompiledConstraints = BTreeMap<String, Vec<CompiledClause>>;

/// A bag of action counts: one `(action_state, count)` pair per
/// declared action state, sorted ascending by name.
pub type ActionCounts = Vec<(String, u32)>;

/// An explicit ceiling on the satisfiability search's visited set,
/// defending against pathological models per the concurrency model.
const MAX_VISITED_BAGS: usize = 200_000;

/// Locate and load `STATES.yml` from the forest root.
pub fn load_state_model(root: &Path) -> Result<RawStateModel, RobantError> {
    let path = root.join(STATES_BNAME);
    if !path.is_file() {
        return Err(Diagnostic::hierarchy(path, "Missing state model file").into());
    }
    let raw = yaml::load_yaml(&path)?;
    schema::bind(&path, raw, SchemaKind::StateModel)
}

fn check_partition(source: &Path, raw: &RawStateModel) -> Result<(), RobantError> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    let sections: [(&str, Vec<&str>); 5] = [
        (
            "action_states",
            raw.action_states.iter().map(String::as_str).collect(),
        ),
        (
            "limb_states",
            raw.limb_states.iter().map(String::as_str).collect(),
        ),
        (
            "empty_states",
            raw.empty_states.iter().map(String::as_str).collect(),
        ),
        (
            "open_states",
            raw.open_states.keys().map(String::as_str).collect(),
        ),
        (
            "shut_states",
            raw.shut_states.keys().map(String::as_str).collect(),
        ),
    ];
    for (section, names) in sections {
        for name in names {
            if let Some(prev) = seen.insert(name, section) {
                return Err(Diagnostic::model_partition(
                    source,
                    format!("{name} declared in both {prev} and {section}"),
                )
                .into());
            }
        }
    }
    Ok(())
}

fn check_validity(
    source: &Path,
    action_states: &BTreeSet<String>,
    raw_constraints: &BTreeMap<String, BTreeMap<String, RawConstraintEntry>>,
) -> Result<(), RobantError> {
    for (state_name, constraints) in raw_constraints {
        for key in constraints.keys() {
            if !action_states.contains(key) {
                return Err(Diagnostic::model_validity(
                    source,
                    format!("{state_name}: unknown action state in constraint: {key}"),
                )
                .into());
            }
        }
        for a in action_states {
            if !constraints.contains_key(a) {
                return Err(Diagnostic::model_validity(
                    source,
                    format!("{state_name}: missing constraint for action state: {a}"),
                )
                .into());
            }
        }
        for (a, entry) in constraints {
            if let RawConstraintEntry::CrossRef(target) = entry {
                if !action_states.contains(target) {
                    return Err(Diagnostic::model_validity(
                        source,
                        format!("{state_name}: cross-reference to unknown action state: {a} -> {target}"),
                    )
                    .into());
                }
                if let Some(RawConstraintEntry::CrossRef(_)) = constraints.get(target) {
                    return Err(Diagnostic::model_validity(
                        source,
                        format!("{state_name}: cross-reference chains are not allowed: {a} -> {target}"),
                    )
                    .into());
                }
            }
        }
    }
    Ok(())
}

fn compile_one(
    action_states: &BTreeSet<String>,
    raw: &BTreeMap<String, RawConstraintEntry>,
) -> Vec<CompiledClause> {
    let mut clusters: BTreeMap<String, CompiledClause> = BTreeMap::new();
    for a in action_states {
        match raw.get(a) {
            Some(RawConstraintEntry::Count(n)) => {
                clusters.insert(
                    a.clone(),
                    CompiledClause {
                        states: BTreeSet::from([a.clone()]),
                        lo: *n,
                        hi: Some(*n),
                    },
                );
            }
            Some(RawConstraintEntry::Bound(bounds)) => {
                let (lo, hi) = match bounds.as_slice() {
                    [lo] => (*lo, None),
                    [lo, hi] => (*lo, Some(*hi)),
                    _ => unreachable!("schema guarantees one or two elements"),
                };
                clusters.insert(
                    a.clone(),
                    CompiledClause {
                        states: BTreeSet::from([a.clone()]),
                        lo,
                        hi,
                    },
                );
            }
            Some(RawConstraintEntry::CrossRef(_)) | None => {}
        }
    }
    for (a, entry) in raw {
        if let RawConstraintEntry::CrossRef(target) = entry {
            if let Some(clause) = clusters.get_mut(target) {
                clause.states.insert(a.clone());
            }
        }
    }
    clusters.into_values().collect()
}

/// Produce `CompiledConstraints` from a model that has already passed
/// the partition and validity checks.
pub fn compile_constraints(model: &StateModel) -> CompiledConstraints {
    let mut compiled: CompiledConstraints = BTreeMap::new();

    for empty in &model.empty_states {
        let clauses = model
            .action_states
            .iter()
            .map(|a| CompiledClause {
                states: BTreeSet::from([a.clone()]),
                lo: 0,
                hi: Some(0),
            })
            .collect();
        compiled.insert(empty.clone(), clauses);
    }

    for (state_name, raw_constraints) in model
        .raw
        .open_states
        .iter()
        .chain(model.raw.shut_states.iter())
    {
        compiled.insert(
            state_name.clone(),
            compile_one(&model.action_states, raw_constraints),
        );
    }

    compiled
}

/// Breadth-first walk over reachable action-count bags.
///
/// Yields `(classifying_state, bag)` in non-decreasing bag-size order.
/// A depth is processed as a whole: the bags at that depth are first
/// closed under same-depth transitions (moving one action from one
/// bucket to another), all closed bags are yielded, and only then are
/// their insertion-successors computed to seed the next depth. This
/// keeps a transition discovered partway through a depth from being
/// ordered after a later depth's insertions.
pub struct SatisfiabilityWalk<'a> {
    source: PathBuf,
    compiled: &'a CompiledConstraints,
    action_states: Vec<String>,
    gating: BTreeSet<String>,
    visited: HashMap<ActionCounts, String>,
    /// Bags classified and ready to yield, in closure order.
    output: VecDeque<(String, ActionCounts)>,
    /// The next depth's seed bags, populated once the current depth closes.
    frontier: Vec<ActionCounts>,
}

impl<'a> SatisfiabilityWalk<'a> {
    pub fn new(
        source: &Path,
        compiled: &'a CompiledConstraints,
        action_states: &BTreeSet<String>,
        gating: BTreeSet<String>,
    ) -> Result<Self, RobantError> {
        let action_states: Vec<String> = action_states.iter().cloned().collect();
        let zero_bag: ActionCounts = action_states.iter().map(|a| (a.clone(), 0)).collect();
        let classes = classifiers(compiled, &zero_bag);
        if classes.len() != 1 {
            return Err(Diagnostic::model_satisfaction(
                source,
                format!("empty bag has ambiguous classification: {classes:?}"),
            )
            .into());
        }
        let mut visited = HashMap::new();
        visited.insert(zero_bag.clone(), classes[0].clone());
        Ok(SatisfiabilityWalk {
            source: source.to_path_buf(),
            compiled,
            action_states,
            gating,
            visited,
            output: VecDeque::new(),
            frontier: vec![zero_bag],
        })
    }

    fn transition_neighbours(&self, bag: &ActionCounts) -> Vec<ActionCounts> {
        let mut out = Vec::new();
        for i in 0..self.action_states.len() {
            if bag[i].1 == 0 {
                continue;
            }
            for j in 0..self.action_states.len() {
                if i == j {
                    continue;
                }
                let mut next = bag.clone();
                next[i].1 -= 1;
                next[j].1 += 1;
                out.push(next);
            }
        }
        out
    }

    fn insertion_neighbours(&self, bag: &ActionCounts) -> Vec<ActionCounts> {
        let mut out = Vec::new();
        for i in 0..self.action_states.len() {
            let mut next = bag.clone();
            next[i].1 += 1;
            out.push(next);
        }
        out
    }

    /// Classify and gate-check `candidate`, reached from a bag classified
    /// as `state`. Returns `Ok(Some(candidate))` if it was newly admitted
    /// into `visited`, `Ok(None)` if it was already visited or gated out.
    fn try_admit(&mut self, state: &str, candidate: ActionCounts) -> Result<Option<ActionCounts>, RobantError> {
        if self.visited.contains_key(&candidate) {
            return Ok(None);
        }
        let classes = classifiers(self.compiled, &candidate);
        if classes.len() > 1 {
            return Err(Diagnostic::model_satisfaction(
                &self.source,
                format!("bag {candidate:?} is classified by more than one state: {classes:?}"),
            )
            .into());
        }
        let dest_state = match classes.into_iter().next() {
            Some(d) => d,
            None => return Ok(None),
        };
        if !(self.gating.contains(state) || self.gating.contains(&dest_state)) {
            return Ok(None);
        }
        if self.visited.len() >= MAX_VISITED_BAGS {
            return Err(Diagnostic::model_satisfaction(
                &self.source,
                "satisfiability search exceeded the visited-bag ceiling",
            )
            .into());
        }
        self.visited.insert(candidate.clone(), dest_state);
        Ok(Some(candidate))
    }

    /// Close the current frontier under same-depth transitions, emit the
    /// closed depth in full, then compute the next depth's frontier from
    /// its insertion-successors.
    fn expand_level(&mut self) -> Result<(), RobantError> {
        let mut level = std::mem::take(&mut self.frontier);
        let mut i = 0;
        while i < level.len() {
            let bag = level[i].clone();
            let state = self
                .visited
                .get(&bag)
                .cloned()
                .expect("every frontier bag was classified before being admitted");
            for candidate in self.transition_neighbours(&bag) {
                if let Some(admitted) = self.try_admit(&state, candidate)? {
                    level.push(admitted);
                }
            }
            i += 1;
        }

        for bag in &level {
            let state = self
                .visited
                .get(bag)
                .cloned()
                .expect("every frontier bag was classified before being admitted");
            self.output.push_back((state, bag.clone()));
        }

        let mut next_frontier = Vec::new();
        for bag in &level {
            let state = self
                .visited
                .get(bag)
                .cloned()
                .expect("every frontier bag was classified before being admitted");
            for candidate in self.insertion_neighbours(bag) {
                if let Some(admitted) = self.try_admit(&state, candidate)? {
                    next_frontier.push(admitted);
                }
            }
        }
        self.frontier = next_frontier;
        Ok(())
    }
}

impl Iterator for SatisfiabilityWalk<'_> {
    type Item = Result<(String, ActionCounts), RobantError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(pair) = self.output.pop_front() {
                return Some(Ok(pair));
            }
            if self.frontier.is_empty() {
                return None;
            }
            if let Err(err) = self.expand_level() {
                return Some(Err(err));
            }
        }
    }
}

/// Run the full satisfiability proof: every declared non-limb project
/// state must be reached at exactly its minimum depth.
pub fn prove_satisfiable(
    source: &Path,
    model: &StateModel,
    compiled: &CompiledConstraints,
) -> Result<(), RobantError> {
    let mut queue: Vec<(u32, String)> = compiled
        .iter()
        .map(|(state, clauses)| (clauses.iter().map(|c| c.lo).sum(), state.clone()))
        .collect();
    queue.sort();

    let mut gating: BTreeSet<String> = model.empty_states.clone();
    gating.extend(model.open_states.iter().cloned());

    let walk = SatisfiabilityWalk::new(source, compiled, &model.action_states, gating)?;

    for step in walk {
        let (state, bag) = step?;
        if queue.is_empty() {
            break;
        }
        let depth: u32 = bag.iter().map(|(_, c)| *c).sum();
        let min_depth = queue[0].0;
        if depth == min_depth {
            if let Some(pos) = queue.iter().position(|(d, s)| *d == depth && *s == state) {
                queue.remove(pos);
            }
            if queue.is_empty() {
                return Ok(());
            }
        } else if depth > min_depth {
            let unreachable: Vec<String> = queue
                .iter()
                .filter(|(d, _)| *d < depth)
                .map(|(_, s)| s.clone())
                .collect();
            if !unreachable.is_empty() {
                return Err(Diagnostic::model_satisfaction(
                    source,
                    format!("unreachable: {}", unreachable.join(", ")),
                )
                .into());
            }
        }
    }

    if queue.is_empty() {
        Ok(())
    } else {
        let names: Vec<String> = queue.into_iter().map(|(_, s)| s).collect();
        Err(Diagnostic::model_satisfaction(source, format!("unreachable: {}", names.join(", "))).into())
    }
}

/// Run the partition and validity checks, then compile the constraints
/// and prove the model satisfiable.
pub fn analyse(
    source: &Path,
    raw: RawStateModel,
) -> Result<(StateModel, CompiledConstraints), RobantError> {
    check_partition(source, &raw)?;
    let action_states: BTreeSet<String> = raw.action_states.iter().cloned().collect();
    check_validity(source, &action_states, &raw.open_states)?;
    check_validity(source, &action_states, &raw.shut_states)?;

    let model = StateModel {
        source: source.to_path_buf(),
        action_states,
        limb_states: raw.limb_states.iter().cloned().collect(),
        empty_states: raw.empty_states.iter().cloned().collect(),
        open_states: raw.open_states.keys().cloned().collect(),
        shut_states: raw.shut_states.keys().cloned().collect(),
        raw,
    };

    let compiled = compile_constraints(&model);
    prove_satisfiable(source, &model, &compiled)?;
    Ok((model, compiled))
}

/// Load and fully analyse the state model for the forest rooted at `root`.
pub fn load_and_analyse(root: &Path) -> Result<(StateModel, CompiledConstraints), RobantError> {
    let path = root.join(STATES_BNAME);
    let raw = load_state_model(root)?;
    analyse(&path, raw)
}
