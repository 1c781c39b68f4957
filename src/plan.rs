//! Plan generation entry point

use crate::config::{ConfigError, PlannerConfig};
use crate::containerfile::{diagnostic_dockerfile, portable_containerfile};
use crate::model::{BuildIdentity, BuildRecipe, Param, SystemConfig, TenantConfig};
use crate::pipeline::builder::StageInputs;
use crate::pipeline::cache::ExistingImageIndex;
use crate::pipeline::{PipelineGraphBuilder, PipelineSpec, StageSet};
use crate::resources::{clamp_additional_memory, ResourceError, ResourceLimits};
use crate::script::{DeferredFailure, ScriptBundle};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::{info, warn};

fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::deserialize(deserializer)?.unwrap_or_default())
}

/// Everything the reconciler supplies for one dependency build.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub recipe: BuildRecipe,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub tenant: TenantConfig,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub system: SystemConfig,
    pub build: BuildIdentity,
    /// Build-request-processor image used by the preprocessing, copy and
    /// verification steps.
    pub processor_image: String,
    pub build_id: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub existing_images: ExistingImageIndex,
    /// Resolved values of the pipeline parameters.
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub params: Vec<Param>,
    /// Commit time of the source in seconds since the epoch.
    #[serde(default)]
    pub commit_time: i64,
}

/// The four artifacts of a plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPlan {
    pub pipeline: PipelineSpec,
    pub diagnostic_dockerfile: String,
    pub containerfile: String,
    /// Portable run script that the containerfile executes.
    pub build_script: String,
    /// Problems the build script reports when it runs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub deferred_failures: Vec<DeferredFailure>,
}

impl GeneratedPlan {
    /// The plan is valid but its build fails on purpose when executed.
    pub fn fails_at_runtime(&self) -> bool {
        !self.deferred_failures.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Resources(#[from] ResourceError),

    #[error("Invalid planner configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Generates the task graph, diagnostic Dockerfile, portable Containerfile
/// and build script for one dependency build.
///
/// Fails only on invalid resource quantities or configuration; build
/// problems are embedded in the scripts instead. The output depends on
/// nothing but the arguments.
pub fn generate_plan(
    request: &PlanRequest,
    config: &PlannerConfig,
) -> Result<GeneratedPlan, PlanError> {
    config.validate()?;
    let recipe = &request.recipe;
    let tenant = &request.tenant;

    let additional_memory = clamp_additional_memory(recipe.additional_memory, &request.system);
    let limits =
        ResourceLimits::derive(&tenant.build_settings, &config.resources, additional_memory)?;

    let scripts = ScriptBundle::new(
        recipe,
        &request.build,
        &request.params,
        request.commit_time,
        &config.local,
    );
    let stages = StageSet::decide(tenant, recipe, &request.existing_images);

    let diagnostic = diagnostic_dockerfile(recipe, &request.processor_image, &scripts, config);
    let containerfile = portable_containerfile(recipe, &request.processor_image, &scripts);

    let cache_url = format!(
        "{}{}/{}",
        config.cluster_cache_url(&tenant.namespace, tenant.cache_settings.disable_tls),
        recipe.repository_suffix(),
        request.commit_time
    );
    let pipeline = PipelineGraphBuilder::new(
        StageInputs {
            tenant,
            recipe,
            identity: &request.build,
            config,
            processor_image: &request.processor_image,
            build_id: &request.build_id,
            limits: &limits,
            scripts: &scripts,
            containerfile: &containerfile,
            cache_url,
        },
        stages,
    )
    .build();

    let deferred_failures = scripts.assembled.failures().to_vec();
    if !deferred_failures.is_empty() {
        warn!(
            build = %request.build.name,
            count = deferred_failures.len(),
            "Generated plan will fail when executed"
        );
    }
    info!(
        build = %request.build.name,
        tool = %recipe.tool,
        tasks = pipeline.tasks.len(),
        "Generated build plan"
    );

    Ok(GeneratedPlan {
        pipeline,
        diagnostic_dockerfile: diagnostic,
        containerfile,
        build_script: scripts.run_build,
        deferred_failures,
    })
}
