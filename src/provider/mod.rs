mod provider_err;

pub use provider_err::ProviderError;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_ec2::{
    Client,
    client::Waiters,
    types::{Filter, Instance, InstanceStateName, Snapshot, Tag, Volume},
};

/// Upper bound for the stop/start waiters. Generous because stopping a busy
/// instance can take minutes.
const STATE_CHANGE_WAIT: Duration = Duration::from_secs(600);

/// Description attached to every snapshot this tool creates, so they can be
/// told apart from manual ones in the console.
const SNAPSHOT_DESCRIPTION: &str = "Created by fleetsnap";

/// The compute inventory service the controller drives. `Ec2Provider` is the
/// real implementation; tests substitute an in-memory fake.
#[async_trait]
pub trait ComputeProvider {
    /// Instances tagged `Project=<project>`, or the whole fleet when no
    /// project is given.
    async fn instances(&self, project: Option<&str>) -> Result<Vec<Instance>, ProviderError>;

    /// Volumes attached to the given instance.
    async fn volumes(&self, instance_id: &str) -> Result<Vec<Volume>, ProviderError>;

    /// Snapshots of the given volume, most recently started first.
    async fn snapshots(&self, volume_id: &str) -> Result<Vec<Snapshot>, ProviderError>;

    async fn create_snapshot(&self, volume_id: &str) -> Result<(), ProviderError>;

    async fn stop_instance(&self, instance_id: &str) -> Result<(), ProviderError>;

    async fn start_instance(&self, instance_id: &str) -> Result<(), ProviderError>;

    async fn reboot_instance(&self, instance_id: &str) -> Result<(), ProviderError>;

    /// Requests a stop and blocks until the instance reports stopped.
    async fn stop_and_wait(&self, instance_id: &str) -> Result<(), ProviderError>;

    /// Requests a start and blocks until the instance reports running.
    async fn start_and_wait(&self, instance_id: &str) -> Result<(), ProviderError>;
}

pub struct Ec2Provider {
    client: Client,
}

impl Ec2Provider {
    pub fn new(client: Client) -> Self {
        Ec2Provider { client }
    }
}

#[async_trait]
impl ComputeProvider for Ec2Provider {
    async fn instances(&self, project: Option<&str>) -> Result<Vec<Instance>, ProviderError> {
        let filters = project.map(|project| {
            vec![
                Filter::builder()
                    .name("tag:Project")
                    .values(project)
                    .build(),
            ]
        });

        Ok(self
            .client
            .describe_instances()
            .set_filters(filters)
            .send()
            .await?
            .reservations
            .unwrap_or_default()
            .into_iter()
            .flat_map(|reservation| reservation.instances.unwrap_or_default())
            .collect())
    }

    async fn volumes(&self, instance_id: &str) -> Result<Vec<Volume>, ProviderError> {
        Ok(self
            .client
            .describe_volumes()
            .filters(
                Filter::builder()
                    .name("attachment.instance-id")
                    .values(instance_id)
                    .build(),
            )
            .send()
            .await?
            .volumes
            .unwrap_or_default())
    }

    async fn snapshots(&self, volume_id: &str) -> Result<Vec<Snapshot>, ProviderError> {
        let mut snapshots = self
            .client
            .describe_snapshots()
            .filters(
                Filter::builder()
                    .name("volume-id")
                    .values(volume_id)
                    .build(),
            )
            .send()
            .await?
            .snapshots
            .unwrap_or_default();

        // DescribeSnapshots does not guarantee an ordering; the rest of the
        // controller expects newest first.
        snapshots.sort_by(|a, b| b.start_time().cmp(&a.start_time()));

        Ok(snapshots)
    }

    async fn create_snapshot(&self, volume_id: &str) -> Result<(), ProviderError> {
        self.client
            .create_snapshot()
            .volume_id(volume_id)
            .description(SNAPSHOT_DESCRIPTION)
            .send()
            .await?;

        Ok(())
    }

    async fn stop_instance(&self, instance_id: &str) -> Result<(), ProviderError> {
        self.client
            .stop_instances()
            .instance_ids(instance_id)
            .send()
            .await?;

        Ok(())
    }

    async fn start_instance(&self, instance_id: &str) -> Result<(), ProviderError> {
        self.client
            .start_instances()
            .instance_ids(instance_id)
            .send()
            .await?;

        Ok(())
    }

    async fn reboot_instance(&self, instance_id: &str) -> Result<(), ProviderError> {
        self.client
            .reboot_instances()
            .instance_ids(instance_id)
            .send()
            .await?;

        Ok(())
    }

    async fn stop_and_wait(&self, instance_id: &str) -> Result<(), ProviderError> {
        self.stop_instance(instance_id).await?;

        self.client
            .wait_until_instance_stopped()
            .instance_ids(instance_id)
            .wait(STATE_CHANGE_WAIT)
            .await
            .map_err(|err| ProviderError::from_err("error waiting for instance to stop", err))?;

        Ok(())
    }

    async fn start_and_wait(&self, instance_id: &str) -> Result<(), ProviderError> {
        self.start_instance(instance_id).await?;

        self.client
            .wait_until_instance_running()
            .instance_ids(instance_id)
            .wait(STATE_CHANGE_WAIT)
            .await
            .map_err(|err| ProviderError::from_err("error waiting for instance to start", err))?;

        Ok(())
    }
}

/// Tags keyed for O(1) lookup. EC2 guarantees unique keys per resource.
pub fn tag_map(tags: &[Tag]) -> HashMap<&str, &str> {
    tags.iter()
        .filter_map(|tag| Some((tag.key()?, tag.value()?)))
        .collect()
}

pub fn is_running(instance: &Instance) -> bool {
    instance.state().and_then(|state| state.name()) == Some(&InstanceStateName::Running)
}

pub fn state_name(instance: &Instance) -> &str {
    instance
        .state()
        .and_then(|state| state.name())
        .map(|name| name.as_str())
        .unwrap_or("unknown")
}
