use clap::{Parser, Subcommand, command};

/// Manage snapshots of a tagged EC2 fleet.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// AWS profile to use
    #[arg(long, short('p'), global = true)]
    pub profile: Option<String>,

    /// Looks for instances in specified region
    #[arg(long, short('r'), global = true)]
    pub region: Option<String>,

    #[command(subcommand)]
    pub command: CommandGroup,
}

#[derive(Subcommand, Debug)]
pub enum CommandGroup {
    /// Commands for instances
    Instances {
        #[command(subcommand)]
        command: InstanceCommand,
    },
    /// Commands for volumes
    Volumes {
        #[command(subcommand)]
        command: VolumeCommand,
    },
    /// Commands for snapshots
    Snapshots {
        #[command(subcommand)]
        command: SnapshotCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum InstanceCommand {
    /// List EC2 instances
    List {
        /// Only instances for project (tag Project:<name>)
        #[arg(long)]
        project: Option<String>,
    },
    /// Create snapshots of all volumes
    Snapshot {
        /// Only instances for project (tag Project:<name>)
        #[arg(long)]
        project: Option<String>,
        /// Force operation if --project was not specified
        #[arg(long)]
        force: bool,
    },
    /// Stop EC2 instances
    Stop {
        /// Only instances for project (tag Project:<name>)
        #[arg(long)]
        project: Option<String>,
        /// Force operation if --project was not specified
        #[arg(long)]
        force: bool,
    },
    /// Start EC2 instances
    Start {
        /// Only instances for project (tag Project:<name>)
        #[arg(long)]
        project: Option<String>,
        /// Force operation if --project was not specified
        #[arg(long)]
        force: bool,
    },
    /// Reboot EC2 instances
    Reboot {
        /// Only instances for project (tag Project:<name>)
        #[arg(long)]
        project: Option<String>,
        /// Force operation if --project was not specified
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum VolumeCommand {
    /// List EC2 volumes
    List {
        /// Only volumes for project (tag Project:<name>)
        #[arg(long)]
        project: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SnapshotCommand {
    /// List EC2 snapshots
    List {
        /// Only snapshots for project (tag Project:<name>)
        #[arg(long)]
        project: Option<String>,
        /// List all snapshots for each volume, not just the most recent one
        #[arg(long)]
        all: bool,
    },
}
