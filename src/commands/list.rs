//! Read-only projections over the filtered instance set. The guard never
//! applies here.

use aws_sdk_ec2::types::{Snapshot, SnapshotState};
use tracing::warn;

use crate::provider::{ComputeProvider, state_name, tag_map};

pub async fn list_instances<P: ComputeProvider + Sync>(
    provider: &P,
    project: Option<&str>,
) -> anyhow::Result<()> {
    for instance in provider.instances(project).await? {
        let tags = tag_map(instance.tags());

        println!(
            "{}, {}, {}, {}, {}, {}",
            instance.instance_id().unwrap_or_default(),
            instance
                .instance_type()
                .map(|instance_type| instance_type.as_str())
                .unwrap_or_default(),
            instance
                .placement()
                .and_then(|placement| placement.availability_zone())
                .unwrap_or_default(),
            state_name(&instance),
            instance.public_dns_name().unwrap_or_default(),
            tags.get("Project").copied().unwrap_or("<no project>"),
        );
    }

    Ok(())
}

pub async fn list_volumes<P: ComputeProvider + Sync>(
    provider: &P,
    project: Option<&str>,
) -> anyhow::Result<()> {
    for instance in provider.instances(project).await? {
        let instance_id = instance.instance_id().unwrap_or_default();

        let volumes = match provider.volumes(instance_id).await {
            Ok(volumes) => volumes,
            Err(err) => {
                warn!(instance = instance_id, %err, "could not list volumes");
                continue;
            }
        };

        for volume in volumes {
            println!(
                "{}, {}, {}, {}GiB, {}",
                volume.volume_id().unwrap_or_default(),
                instance_id,
                volume
                    .state()
                    .map(|state| state.as_str())
                    .unwrap_or("unknown"),
                volume.size().unwrap_or_default(),
                if volume.encrypted().unwrap_or_default() {
                    "Encrypted"
                } else {
                    "Not Encrypted"
                },
            );
        }
    }

    Ok(())
}

pub async fn list_snapshots<P: ComputeProvider + Sync>(
    provider: &P,
    project: Option<&str>,
    list_all: bool,
) -> anyhow::Result<()> {
    for instance in provider.instances(project).await? {
        let instance_id = instance.instance_id().unwrap_or_default();

        let volumes = match provider.volumes(instance_id).await {
            Ok(volumes) => volumes,
            Err(err) => {
                warn!(instance = instance_id, %err, "could not list volumes");
                continue;
            }
        };

        for volume in volumes {
            let volume_id = volume.volume_id().unwrap_or_default();

            let snapshots = match provider.snapshots(volume_id).await {
                Ok(snapshots) => snapshots,
                Err(err) => {
                    warn!(volume = volume_id, %err, "could not list snapshots");
                    continue;
                }
            };

            for snapshot in visible_snapshots(&snapshots, list_all) {
                println!(
                    "{}, {}, {}, {}, {}, {}",
                    snapshot.snapshot_id().unwrap_or_default(),
                    volume_id,
                    instance_id,
                    snapshot
                        .state()
                        .map(|state| state.as_str())
                        .unwrap_or("unknown"),
                    snapshot.progress().unwrap_or_default(),
                    snapshot
                        .start_time()
                        .map(|time| time.to_string())
                        .unwrap_or_default(),
                );
            }
        }
    }

    Ok(())
}

/// The records the listing shows for one volume. Snapshots arrive newest
/// first; the default mode cuts off after the most recent completed one,
/// so in-flight history is still visible but old backups are not.
fn visible_snapshots(snapshots: &[Snapshot], list_all: bool) -> &[Snapshot] {
    if list_all {
        return snapshots;
    }

    match snapshots
        .iter()
        .position(|snapshot| snapshot.state() == Some(&SnapshotState::Completed))
    {
        Some(first_completed) => &snapshots[..=first_completed],
        None => snapshots,
    }
}
