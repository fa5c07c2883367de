use tracing::warn;

use crate::guard::{Verb, can_process};
use crate::provider::{ComputeProvider, ProviderError};

/// The closed set of single-shot state transitions. Routing through an enum
/// instead of a command string leaves no "unexpected command" branch to
/// defend against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Stop,
    Start,
    Reboot,
}

impl PowerAction {
    fn verb(self) -> Verb {
        match self {
            PowerAction::Stop => Verb::Stop,
            PowerAction::Start => Verb::Start,
            PowerAction::Reboot => Verb::Reboot,
        }
    }

    fn command(self) -> &'static str {
        match self {
            PowerAction::Stop => "stop",
            PowerAction::Start => "start",
            PowerAction::Reboot => "reboot",
        }
    }

    fn gerund(self) -> &'static str {
        match self {
            PowerAction::Stop => "Stopping",
            PowerAction::Start => "Starting",
            PowerAction::Reboot => "Rebooting",
        }
    }

    /// Fire-and-forget transition request; completion is not awaited.
    pub async fn apply<P: ComputeProvider + Sync>(
        self,
        provider: &P,
        instance_id: &str,
    ) -> Result<(), ProviderError> {
        match self {
            PowerAction::Stop => provider.stop_instance(instance_id).await,
            PowerAction::Start => provider.start_instance(instance_id).await,
            PowerAction::Reboot => provider.reboot_instance(instance_id).await,
        }
    }
}

/// Shared handler for `instances stop`, `instances start` and
/// `instances reboot`. One guard decision per invocation, before any
/// provider traffic; a provider error on one instance never aborts the rest.
pub async fn power_command<P: ComputeProvider + Sync>(
    provider: &P,
    action: PowerAction,
    project: Option<&str>,
    force: bool,
) -> anyhow::Result<()> {
    if !can_process(action.verb(), project, force) {
        println!(
            "Cannot execute instances {} without --force since --project is not set",
            action.command()
        );
        return Ok(());
    }

    for instance in provider.instances(project).await? {
        let Some(instance_id) = instance.instance_id() else {
            continue;
        };

        println!("{} {}...", action.gerund(), instance_id);
        if let Err(err) = action.apply(provider, instance_id).await {
            warn!(instance = instance_id, %err, "could not {} instance", action.command());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::fake::FakeProvider;
    use aws_sdk_ec2::types::{Instance, Tag};

    fn instance(id: &str, project: &str) -> Instance {
        Instance::builder()
            .instance_id(id)
            .tags(Tag::builder().key("Project").value(project).build())
            .build()
    }

    #[tokio::test]
    async fn stop_issues_one_request_per_filtered_instance() {
        let provider = FakeProvider::new(vec![
            instance("i-1", "webapp"),
            instance("i-2", "webapp"),
            instance("i-3", "db"),
        ]);

        power_command(&provider, PowerAction::Stop, Some("webapp"), false)
            .await
            .unwrap();

        assert_eq!(provider.calls(), vec!["stop i-1", "stop i-2"]);
    }

    #[tokio::test]
    async fn reboot_issues_reboot_requests() {
        let provider = FakeProvider::new(vec![instance("i-1", "webapp")]);

        power_command(&provider, PowerAction::Reboot, None, true)
            .await
            .unwrap();

        assert_eq!(provider.calls(), vec!["reboot i-1"]);
    }

    #[tokio::test]
    async fn guard_denies_unscoped_unforced_command() {
        let provider = FakeProvider::new(vec![instance("i-1", "webapp")]);

        power_command(&provider, PowerAction::Stop, None, false)
            .await
            .unwrap();

        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_filtered_set_is_not_an_error() {
        let provider = FakeProvider::new(vec![instance("i-1", "db")]);

        power_command(&provider, PowerAction::Stop, Some("webapp"), false)
            .await
            .unwrap();

        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn provider_error_does_not_abort_remaining_instances() {
        let mut provider = FakeProvider::new(vec![
            instance("i-1", "webapp"),
            instance("i-2", "webapp"),
        ]);
        provider.fail_power.push("i-1".into());

        power_command(&provider, PowerAction::Start, Some("webapp"), false)
            .await
            .unwrap();

        assert_eq!(provider.calls(), vec!["start i-2"]);
    }
}
