use aws_sdk_ec2::types::{Snapshot, SnapshotState};
use tracing::warn;

use crate::guard::{Verb, can_process};
use crate::provider::{ComputeProvider, is_running, state_name};

/// Handler for `instances snapshot`. Each instance is stopped, its volumes
/// snapshotted, and the instance restarted if it was running before — in
/// enumeration order, each instance independent of the others.
pub async fn snapshot_command<P: ComputeProvider + Sync>(
    provider: &P,
    project: Option<&str>,
    force: bool,
) -> anyhow::Result<()> {
    if !can_process(Verb::Snapshot, project, force) {
        println!("Cannot execute instances snapshot without --force since --project is not set");
        return Ok(());
    }

    for instance in provider.instances(project).await? {
        let Some(instance_id) = instance.instance_id() else {
            continue;
        };
        // Remembered before any mutation so the instance can be returned to
        // the state it was found in.
        let was_running = is_running(&instance);

        println!("Instance {} is {}", instance_id, state_name(&instance));
        println!("Stopping {}...", instance_id);
        if let Err(err) = provider.stop_and_wait(instance_id).await {
            warn!(instance = instance_id, %err, "could not stop instance");
            continue;
        }

        let volumes = match provider.volumes(instance_id).await {
            Ok(volumes) => volumes,
            Err(err) => {
                // Still fall through so a previously running instance gets
                // restarted below.
                warn!(instance = instance_id, %err, "could not list volumes");
                Vec::new()
            }
        };

        for volume in &volumes {
            let Some(volume_id) = volume.volume_id() else {
                continue;
            };

            match provider.snapshots(volume_id).await {
                Ok(snapshots) if has_pending_snapshot(&snapshots) => {
                    println!("  Skipping {}, snapshot already in progress", volume_id);
                    continue;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(volume = volume_id, %err, "could not list snapshots");
                    continue;
                }
            }

            println!("  Creating snapshot of {}...", volume_id);
            if let Err(err) = provider.create_snapshot(volume_id).await {
                warn!(volume = volume_id, %err, "could not create snapshot");
            }
        }

        if was_running {
            println!(
                "Instance {} was running previously, restarting...",
                instance_id
            );
            if let Err(err) = provider.start_and_wait(instance_id).await {
                warn!(instance = instance_id, %err, "could not restart instance");
            }
        } else {
            println!(
                "Instance {} was not running originally so is not restarted",
                instance_id
            );
        }
    }

    println!("Job's done!");

    Ok(())
}

/// True when the volume's most recent snapshot is still pending. Snapshots
/// arrive newest first, so only the head matters; re-running the workflow
/// while a snapshot is in flight is a no-op for that volume.
fn has_pending_snapshot(snapshots: &[Snapshot]) -> bool {
    snapshots
        .first()
        .is_some_and(|snapshot| snapshot.state() == Some(&SnapshotState::Pending))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::fake::FakeProvider;
    use aws_sdk_ec2::types::{Instance, InstanceState, InstanceStateName, Volume};

    fn instance(id: &str, state: InstanceStateName) -> Instance {
        Instance::builder()
            .instance_id(id)
            .state(InstanceState::builder().name(state).build())
            .build()
    }

    fn volume(id: &str) -> Volume {
        Volume::builder().volume_id(id).build()
    }

    fn snapshot(state: SnapshotState) -> Snapshot {
        Snapshot::builder().snapshot_id("snap-1").state(state).build()
    }

    #[test]
    fn pending_check_looks_only_at_the_most_recent_snapshot() {
        assert!(!has_pending_snapshot(&[]));
        assert!(has_pending_snapshot(&[snapshot(SnapshotState::Pending)]));
        assert!(!has_pending_snapshot(&[snapshot(SnapshotState::Completed)]));
        assert!(!has_pending_snapshot(&[snapshot(SnapshotState::Error)]));
        assert!(!has_pending_snapshot(&[
            snapshot(SnapshotState::Completed),
            snapshot(SnapshotState::Pending),
        ]));
    }

    #[tokio::test]
    async fn skips_pending_volume_and_restarts_running_instance() {
        let mut provider =
            FakeProvider::new(vec![instance("i-1", InstanceStateName::Running)]);
        provider
            .volumes
            .insert("i-1".into(), vec![volume("vol-a"), volume("vol-b")]);
        provider
            .snapshots
            .insert("vol-a".into(), vec![snapshot(SnapshotState::Pending)]);

        snapshot_command(&provider, None, true).await.unwrap();

        assert_eq!(
            provider.calls(),
            vec!["stop_and_wait i-1", "create_snapshot vol-b", "start_and_wait i-1"]
        );
    }

    #[tokio::test]
    async fn stopped_instance_is_not_restarted() {
        let mut provider =
            FakeProvider::new(vec![instance("i-1", InstanceStateName::Stopped)]);
        provider.volumes.insert("i-1".into(), vec![volume("vol-a")]);

        snapshot_command(&provider, None, true).await.unwrap();

        assert_eq!(
            provider.calls(),
            vec!["stop_and_wait i-1", "create_snapshot vol-a"]
        );
    }

    #[tokio::test]
    async fn stop_failure_abandons_only_that_instance() {
        let mut provider = FakeProvider::new(vec![
            instance("i-1", InstanceStateName::Running),
            instance("i-2", InstanceStateName::Running),
        ]);
        provider.volumes.insert("i-2".into(), vec![volume("vol-b")]);
        provider.fail_stop_and_wait.push("i-1".into());

        snapshot_command(&provider, None, true).await.unwrap();

        assert_eq!(
            provider.calls(),
            vec!["stop_and_wait i-2", "create_snapshot vol-b", "start_and_wait i-2"]
        );
    }

    #[tokio::test]
    async fn restart_failure_does_not_abort_remaining_instances() {
        let mut provider = FakeProvider::new(vec![
            instance("i-1", InstanceStateName::Running),
            instance("i-2", InstanceStateName::Running),
        ]);
        provider.volumes.insert("i-1".into(), vec![volume("vol-a")]);
        provider.volumes.insert("i-2".into(), vec![volume("vol-b")]);
        provider.fail_start_and_wait.push("i-1".into());

        snapshot_command(&provider, None, true).await.unwrap();

        assert_eq!(
            provider.calls(),
            vec![
                "stop_and_wait i-1",
                "create_snapshot vol-a",
                "stop_and_wait i-2",
                "create_snapshot vol-b",
                "start_and_wait i-2",
            ]
        );
    }

    #[tokio::test]
    async fn guard_denies_unscoped_unforced_snapshot() {
        let provider = FakeProvider::new(vec![instance("i-1", InstanceStateName::Running)]);

        snapshot_command(&provider, None, false).await.unwrap();

        assert!(provider.calls().is_empty());
    }
}
