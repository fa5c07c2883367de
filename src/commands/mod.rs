mod list;
mod power;
mod snapshot;

pub use list::{list_instances, list_snapshots, list_volumes};
pub use power::{PowerAction, power_command};
pub use snapshot::snapshot_command;
