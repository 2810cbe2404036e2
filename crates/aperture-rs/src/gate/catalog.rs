//! The action catalogue: which concrete actions exist, how they group, and
//! which groups each phase exposes.
//!
//! Everything here is plain configuration. The catalogue never changes at
//! runtime and holds no state; the [`PhaseGate`](crate::gate::PhaseGate)
//! consults it on every query.

use std::collections::HashMap;

use crate::gate::machine::Phase;

// ── Canonical action names ─────────────────────────────────────────

pub const RUN_QUERY: &str = "run_query";
pub const DESCRIBE_TABLE: &str = "describe_table";
pub const PREVIEW_ROWS: &str = "preview_rows";
pub const EXECUTE_COMMAND: &str = "execute_command";
pub const RUN_SCRIPT: &str = "run_script";
pub const INVOKE_SKILL: &str = "invoke_skill";
pub const LIST_SKILLS: &str = "list_skills";
pub const SAVE_FINDING: &str = "save_finding";
pub const RECALL_FINDINGS: &str = "recall_findings";

// ── Group names used by the standard catalogue ─────────────────────

pub const GROUP_QUERY: &str = "query";
pub const GROUP_EXECUTION: &str = "execution";
pub const GROUP_SKILL_INVOCATION: &str = "skill-invocation";
pub const GROUP_MEMORY: &str = "memory";

/// A named set of concrete action names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionGroup {
    pub name: String,
    pub actions: Vec<String>,
}

impl ActionGroup {
    pub fn new(
        name: impl Into<String>,
        actions: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            actions: actions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Maps phases to action groups and groups to concrete action names.
///
/// Built once with the `with_*` builders (or taken wholesale from
/// [`standard`](Self::standard)) and handed to a
/// [`PhaseGate`](crate::gate::PhaseGate). Phases absent from the table
/// expose nothing, and group names with no matching group are ignored.
///
/// # Example
///
/// ```ignore
/// let catalog = ActionCatalog::empty()
///     .with_group(ActionGroup::new("search", ["grep", "find_symbol"]))
///     .with_phase_groups(Phase::Analyzing, ["search"]);
/// assert_eq!(catalog.actions_for(Phase::Analyzing), vec!["grep", "find_symbol"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCatalog {
    groups: Vec<ActionGroup>,
    phase_groups: HashMap<Phase, Vec<String>>,
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl ActionCatalog {
    /// A catalogue with no groups and no phase mappings.
    pub fn empty() -> Self {
        Self {
            groups: Vec::new(),
            phase_groups: HashMap::new(),
        }
    }

    /// The built-in catalogue (also what [`Default`] yields).
    ///
    /// `querying` exposes query and memory actions; `analyzing` everything;
    /// `reporting` skill invocation and memory; `idle` and `done` nothing.
    pub fn standard() -> Self {
        Self::empty()
            .with_group(ActionGroup::new(
                GROUP_QUERY,
                [RUN_QUERY, DESCRIBE_TABLE, PREVIEW_ROWS],
            ))
            .with_group(ActionGroup::new(GROUP_EXECUTION, [EXECUTE_COMMAND, RUN_SCRIPT]))
            .with_group(ActionGroup::new(
                GROUP_SKILL_INVOCATION,
                [INVOKE_SKILL, LIST_SKILLS],
            ))
            .with_group(ActionGroup::new(GROUP_MEMORY, [SAVE_FINDING, RECALL_FINDINGS]))
            .with_phase_groups(Phase::Querying, [GROUP_QUERY, GROUP_MEMORY])
            .with_phase_groups(
                Phase::Analyzing,
                [GROUP_QUERY, GROUP_EXECUTION, GROUP_SKILL_INVOCATION, GROUP_MEMORY],
            )
            .with_phase_groups(Phase::Reporting, [GROUP_SKILL_INVOCATION, GROUP_MEMORY])
    }

    /// Add a group, replacing any existing group with the same name.
    pub fn with_group(mut self, group: ActionGroup) -> Self {
        if let Some(existing) = self.groups.iter_mut().find(|g| g.name == group.name) {
            *existing = group;
        } else {
            self.groups.push(group);
        }
        self
    }

    /// Set the group names a phase exposes, replacing any previous mapping.
    pub fn with_phase_groups(
        mut self,
        phase: Phase,
        group_names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.phase_groups
            .insert(phase, group_names.into_iter().map(Into::into).collect());
        self
    }

    /// Look up a group by name.
    pub fn group(&self, name: &str) -> Option<&ActionGroup> {
        self.groups.iter().find(|g| g.name == name)
    }

    /// Every action name a phase exposes, deduplicated, in catalogue order.
    pub fn actions_for(&self, phase: Phase) -> Vec<&str> {
        let Some(names) = self.phase_groups.get(&phase) else {
            return Vec::new();
        };
        let mut out: Vec<&str> = Vec::new();
        for name in names {
            if let Some(group) = self.group(name) {
                for action in &group.actions {
                    if !out.contains(&action.as_str()) {
                        out.push(action.as_str());
                    }
                }
            }
        }
        out
    }
}
