//! jbs-planner - rebuild plans for JVM dependencies
//!
//! Given a build recipe for one dependency, the tenant's configuration and the
//! current cache state, the planner produces four artifacts that all run the
//! same build:
//!
//! - a task graph for the orchestration platform (pre-build, build, post-build)
//! - a diagnostic Dockerfile for reproducing the build on a workstation
//! - a portable Containerfile for remote container builds
//! - the `run-build.sh` script that Containerfile executes
//!
//! Problems found in the recipe, such as an unknown build tool or an
//! incomplete package download, do not fail generation. They are embedded in
//! the scripts so the build fails when it runs, with a readable message.
//!
//! # Example Usage
//!
//! ```ignore
//! use jbs_planner::{generate_plan, PlanRequest, PlannerConfig};
//!
//! let request: PlanRequest = serde_yaml::from_str(&document)?;
//! let plan = generate_plan(&request, &PlannerConfig::default())?;
//! println!("{}", plan.containerfile);
//! ```
//!
//! # Project Structure
//!
//! - [`model`]: caller supplied inputs (recipe, tenant, build identity)
//! - [`script`]: build script assembly and parameter substitution
//! - [`pipeline`]: the task graph and the deploy graph
//! - [`containerfile`]: diagnostic and portable container definitions
//! - [`plan`]: the single entry point tying them together

pub mod cli;
pub mod config;
pub mod containerfile;
pub mod model;
pub mod pipeline;
pub mod plan;
pub mod registry;
pub mod resources;
pub mod script;
pub mod util;

pub use config::{ConfigError, PlannerConfig};
pub use model::{BuildIdentity, BuildRecipe, BuildTool, TenantConfig};
pub use pipeline::{create_deploy_pipeline, PipelineSpec};
pub use plan::{generate_plan, GeneratedPlan, PlanError, PlanRequest};
pub use resources::{QuantityError, ResourceError};
pub use util::{init_default, init_from_env, init_logging, LoggingConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_name_is_jbs_planner() {
        assert_eq!(NAME, "jbs-planner");
    }
}
