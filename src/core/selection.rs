//! Capability-based agent selection.

use std::cmp::Ordering;

use super::agent::Agent;
use super::task::TaskKind;

/// Agents that may take a task of `kind`: active, capable, and at or above
/// their own reliability threshold.
pub fn eligible_agents(agents: &[Agent], kind: TaskKind) -> impl Iterator<Item = &Agent> {
    agents.iter().filter(move |a| a.is_eligible_for(kind))
}

/// Order two agents by `(priority, reliability)`, higher first when used as max.
pub fn compare_candidates(a: &Agent, b: &Agent) -> Ordering {
    a.config
        .priority
        .cmp(&b.config.priority)
        .then_with(|| a.reliability().total_cmp(&b.reliability()))
}

/// Pick the eligible agent with the greatest `(priority, reliability)`.
///
/// `admit` lets the caller drop otherwise eligible agents (e.g. ones at their
/// concurrency cap). Exact ties go to the agent that appears first in
/// `agents`. Returns `None` when nothing is eligible.
pub fn select_agent<'a>(
    agents: &'a [Agent],
    kind: TaskKind,
    admit: impl Fn(&Agent) -> bool,
) -> Option<&'a Agent> {
    eligible_agents(agents, kind)
        .filter(|a| admit(a))
        .fold(None, |best: Option<&Agent>, candidate| match best {
            Some(current) if compare_candidates(candidate, current) != Ordering::Greater => {
                Some(current)
            }
            _ => Some(candidate),
        })
}
