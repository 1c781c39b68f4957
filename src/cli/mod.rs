pub mod commands;
pub mod handlers;
pub mod output;

pub use commands::{Artifact, BuildIdArgs, CliArgs, Commands, DeployArgs, PlanArgs};
pub use output::{OutputFormat, PlanWriter};
