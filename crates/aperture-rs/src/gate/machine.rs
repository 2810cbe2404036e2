//! The phase state machine.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::gate::catalog::ActionCatalog;

/// Workflow phase of an agent. Closed vocabulary, serialized snake_case.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Querying,
    Analyzing,
    Reporting,
    Done,
}

impl Phase {
    /// Phases reachable in a single transition from this one.
    ///
    /// The table is directed and has exactly one self-loop: `analyzing` may
    /// repeat while an investigation iterates. `reporting` forks into `done`
    /// (finished) or back to `idle` (another round).
    pub fn allowed_transitions(self) -> &'static [Phase] {
        match self {
            Phase::Idle => &[Phase::Querying],
            Phase::Querying => &[Phase::Analyzing, Phase::Reporting],
            Phase::Analyzing => &[Phase::Analyzing, Phase::Reporting],
            Phase::Reporting => &[Phase::Idle, Phase::Done],
            Phase::Done => &[Phase::Idle],
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Idle => "idle",
            Phase::Querying => "querying",
            Phase::Analyzing => "analyzing",
            Phase::Reporting => "reporting",
            Phase::Done => "done",
        };
        write!(f, "{s}")
    }
}

/// Enforces the phase transition table and exposes per-phase actions.
///
/// Starts in [`Phase::Idle`]. An invalid transition is refused with `false`
/// and changes nothing; the caller decides whether that matters. Action
/// visibility is recomputed from the catalogue on every call, so it is
/// always a pure function of the current phase.
///
/// # Example
///
/// ```ignore
/// let mut gate = PhaseGate::new();
/// assert!(!gate.can_use("execute_command"));
///
/// gate.transition(Phase::Querying);
/// gate.transition(Phase::Analyzing);
/// assert!(gate.can_use("execute_command"));
/// ```
#[derive(Debug, Clone)]
pub struct PhaseGate {
    phase: Phase,
    history: Vec<Phase>,
    catalog: ActionCatalog,
}

impl Default for PhaseGate {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseGate {
    /// A gate over the [standard catalogue](ActionCatalog::standard).
    pub fn new() -> Self {
        Self::with_catalog(ActionCatalog::standard())
    }

    pub fn with_catalog(catalog: ActionCatalog) -> Self {
        Self {
            phase: Phase::Idle,
            history: vec![Phase::Idle],
            catalog,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Move to `target` if the transition table allows it.
    ///
    /// Returns `false` (leaving phase and history untouched) when it does
    /// not. Successful transitions are appended to the history log.
    pub fn transition(&mut self, target: Phase) -> bool {
        if !self.phase.allowed_transitions().contains(&target) {
            debug!("rejected transition {} -> {target}", self.phase);
            return false;
        }
        trace!("transition {} -> {target}", self.phase);
        self.phase = target;
        self.history.push(target);
        true
    }

    /// Action names the current phase exposes.
    pub fn active_actions(&self) -> Vec<&str> {
        self.catalog.actions_for(self.phase)
    }

    /// Whether a named action is callable right now.
    pub fn can_use(&self, action: &str) -> bool {
        self.active_actions().iter().any(|a| *a == action)
    }

    /// Every phase visited, in order, starting with [`Phase::Idle`].
    pub fn history(&self) -> &[Phase] {
        &self.history
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::catalog::{ActionGroup, EXECUTE_COMMAND, RUN_QUERY};

    #[test]
    fn starts_idle_with_nothing_exposed() {
        let gate = PhaseGate::new();
        assert_eq!(gate.phase(), Phase::Idle);
        assert!(gate.active_actions().is_empty());
        assert_eq!(gate.history(), &[Phase::Idle]);
    }

    #[test]
    fn transition_table_spot_checks() {
        let mut gate = PhaseGate::new();
        assert!(!gate.transition(Phase::Analyzing));
        assert!(!gate.transition(Phase::Reporting));
        assert!(gate.transition(Phase::Querying));

        assert!(gate.transition(Phase::Analyzing));
        assert!(gate.transition(Phase::Analyzing), "analyzing may repeat");
        assert!(!gate.transition(Phase::Querying), "no way back to querying");
        assert!(!gate.transition(Phase::Idle));

        assert!(gate.transition(Phase::Reporting));
        assert!(gate.transition(Phase::Done));
        assert!(gate.transition(Phase::Idle), "done resets to idle");
    }

    #[test]
    fn querying_may_skip_straight_to_reporting() {
        let mut gate = PhaseGate::new();
        assert!(gate.transition(Phase::Querying));
        assert!(gate.transition(Phase::Reporting));
    }

    #[test]
    fn reporting_may_loop_back_to_idle() {
        let mut gate = PhaseGate::new();
        gate.transition(Phase::Querying);
        gate.transition(Phase::Reporting);
        assert!(gate.transition(Phase::Idle));
        assert_eq!(gate.phase(), Phase::Idle);
    }

    #[test]
    fn rejected_transition_changes_nothing() {
        let mut gate = PhaseGate::new();
        assert!(!gate.transition(Phase::Done));
        assert_eq!(gate.phase(), Phase::Idle);
        assert_eq!(gate.history(), &[Phase::Idle]);
    }

    #[test]
    fn execute_command_is_analysis_only() {
        let mut gate = PhaseGate::new();
        assert!(!gate.can_use(EXECUTE_COMMAND));

        gate.transition(Phase::Querying);
        assert!(!gate.can_use(EXECUTE_COMMAND));
        assert!(gate.can_use(RUN_QUERY));

        gate.transition(Phase::Analyzing);
        assert!(gate.can_use(EXECUTE_COMMAND));

        gate.transition(Phase::Reporting);
        assert!(!gate.can_use(EXECUTE_COMMAND));
    }

    #[test]
    fn history_records_the_full_walk() {
        let mut gate = PhaseGate::new();
        gate.transition(Phase::Querying);
        gate.transition(Phase::Analyzing);
        gate.transition(Phase::Analyzing);
        gate.transition(Phase::Reporting);
        gate.transition(Phase::Done);

        assert_eq!(
            gate.history(),
            &[
                Phase::Idle,
                Phase::Querying,
                Phase::Analyzing,
                Phase::Analyzing,
                Phase::Reporting,
                Phase::Done,
            ]
        );
    }

    #[test]
    fn custom_catalog_drives_visibility() {
        let catalog = ActionCatalog::empty()
            .with_group(ActionGroup::new("search", ["grep_logs"]))
            .with_phase_groups(Phase::Querying, ["search"]);
        let mut gate = PhaseGate::with_catalog(catalog);

        gate.transition(Phase::Querying);
        assert!(gate.can_use("grep_logs"));
        assert!(!gate.can_use(RUN_QUERY));
    }

    #[test]
    fn phase_serializes_snake_case() {
        assert_eq!(serde_json::to_string(&Phase::Querying).unwrap(), "\"querying\"");
        let parsed: Phase = serde_json::from_str("\"done\"").unwrap();
        assert_eq!(parsed, Phase::Done);
    }
}
