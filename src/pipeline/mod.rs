//! Task graph synthesis
//!
//! Stage, parameter, result and workspace names below are shared with the
//! build-request-processor and the reconciler reading the results, so they
//! must not change.

pub mod builder;
pub mod cache;
pub mod commands;
pub mod deploy;
pub mod environment;
pub mod model;
pub mod secrets;

pub use builder::{BuildStrategy, PipelineGraphBuilder, StageSet};
pub use cache::PreBuildSource;
pub use deploy::create_deploy_pipeline;
pub use model::PipelineSpec;
pub use secrets::secret_variables;

pub const WORKSPACE_SETTINGS: &str = "build-settings";
pub const WORKSPACE_SOURCE: &str = "source";
pub const WORKSPACE_TLS: &str = "tls";
pub const WORKSPACE_MOUNT: &str = "/var/workdir";

pub const PRE_BUILD_TASK: &str = "pre-build";
pub const BUILD_TASK: &str = "build";
pub const POST_BUILD_TASK: &str = "post-build";
pub const TAG_TASK: &str = "tag";

pub const PARAM_BUILD_ID: &str = "BUILD_ID";
pub const PARAM_SCM_URL: &str = "URL";
pub const PARAM_SCM_TAG: &str = "TAG";
pub const PARAM_SCM_HASH: &str = "HASH";
pub const PARAM_CHAINS_GIT_URL: &str = "CHAINS-GIT_URL";
pub const PARAM_CHAINS_GIT_COMMIT: &str = "CHAINS-GIT_COMMIT";
pub const PARAM_GOALS: &str = "GOALS";
pub const PARAM_JAVA_VERSION: &str = "JAVA_VERSION";
pub const PARAM_TOOL_VERSION: &str = "TOOL_VERSION";
pub const PARAM_PATH: &str = "CONTEXT_DIR";
pub const PARAM_ENFORCE_VERSION: &str = "ENFORCE_VERSION";
pub const PARAM_PROJECT_VERSION: &str = "PROJECT_VERSION";
pub const PARAM_CACHE_URL: &str = "CACHE_URL";

pub const RESULT_IMAGE: &str = "IMAGE_URL";
pub const RESULT_IMAGE_DIGEST: &str = "IMAGE_DIGEST";
pub const RESULT_PRE_BUILD_IMAGE_DIGEST: &str = "PRE_BUILD_IMAGE_DIGEST";
pub const RESULT_GIT_ARCHIVE: &str = "GIT_ARCHIVE";
pub const RESULT_CONTAMINANTS: &str = "CONTAMINANTS";
pub const RESULT_DEPLOYED_RESOURCES: &str = "DEPLOYED_RESOURCES";
pub const RESULT_PASSED_VERIFICATION: &str = "PASSED_VERIFICATION";
pub const RESULT_VERIFICATION_RESULTS: &str = "VERIFICATION_RESULTS";

pub const ENV_JAVA_HOME: &str = "JAVA_HOME";

/// `$(tasks.<task>.results.<result>)`
pub fn task_result_reference(task: &str, result: &str) -> String {
    format!("$(tasks.{}.results.{})", task, result)
}
