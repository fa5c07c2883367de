//! The force-guard policy: destructive commands must be scoped to a project
//! or explicitly forced, so an operator cannot mutate the whole fleet by
//! forgetting --project.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    ListInstances,
    ListVolumes,
    ListSnapshots,
    Stop,
    Start,
    Reboot,
    Snapshot,
}

impl Verb {
    fn is_restricted(self) -> bool {
        matches!(
            self,
            Verb::Stop | Verb::Start | Verb::Reboot | Verb::Snapshot
        )
    }
}

/// Pure decision, no I/O. Reads are always permitted; restricted verbs need
/// a non-empty project scope or an explicit force. An empty project string
/// counts as no scope.
pub fn can_process(verb: Verb, project: Option<&str>, force: bool) -> bool {
    if !verb.is_restricted() {
        return true;
    }

    project.is_some_and(|project| !project.is_empty()) || force
}
