mod aws_auth;
mod cli;
mod commands;
mod guard;
mod provider;

use std::collections::HashMap;

use anyhow::Context;
use aws_config::SdkConfig;
use clap::Parser;
use config::Config;
use tracing_subscriber::EnvFilter;

use cli::{Cli, CommandGroup, InstanceCommand, SnapshotCommand, VolumeCommand};
use commands::{
    PowerAction, list_instances, list_snapshots, list_volumes, power_command, snapshot_command,
};
use provider::Ec2Provider;

type AppConfig = HashMap<String, String>;

fn get_app_config() -> anyhow::Result<AppConfig> {
    Config::builder()
        .add_source(config::File::with_name("settings.toml").required(false))
        .build()?
        .try_deserialize::<AppConfig>()
        .context("invalid settings.toml")
}

fn create_ec2_client(app_config: &AppConfig, sdk_config: &SdkConfig) -> aws_sdk_ec2::Client {
    // EC2_ENDPOINT points the client at a LocalStack-style stand-in.
    let ec2_endpoint = app_config.get("EC2_ENDPOINT").cloned();
    let ec2_config = aws_sdk_ec2::config::Builder::from(sdk_config)
        .set_endpoint_url(ec2_endpoint)
        .clone()
        .build();

    aws_sdk_ec2::Client::from_conf(ec2_config)
}

/// An empty --project means no project scope at all.
fn scope(project: &Option<String>) -> Option<&str> {
    project.as_deref().filter(|project| !project.is_empty())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();
    let app_config = get_app_config()?;
    let sdk_config = aws_auth::get_config(args.profile.as_deref(), args.region.as_deref()).await;
    let ec2_client = create_ec2_client(&app_config, &sdk_config);
    let provider = Ec2Provider::new(ec2_client);

    match args.command {
        CommandGroup::Instances { command } => match command {
            InstanceCommand::List { project } => list_instances(&provider, scope(&project)).await,
            InstanceCommand::Snapshot { project, force } => {
                snapshot_command(&provider, scope(&project), force).await
            }
            InstanceCommand::Stop { project, force } => {
                power_command(&provider, PowerAction::Stop, scope(&project), force).await
            }
            InstanceCommand::Start { project, force } => {
                power_command(&provider, PowerAction::Start, scope(&project), force).await
            }
            InstanceCommand::Reboot { project, force } => {
                power_command(&provider, PowerAction::Reboot, scope(&project), force).await
            }
        },
        CommandGroup::Volumes { command } => match command {
            VolumeCommand::List { project } => list_volumes(&provider, scope(&project)).await,
        },
        CommandGroup::Snapshots { command } => match command {
            SnapshotCommand::List { project, all } => {
                list_snapshots(&provider, scope(&project), all).await
            }
        },
    }
}
