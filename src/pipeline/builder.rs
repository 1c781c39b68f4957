//! Assembles the rebuild task graph
//!
//! The stage set is fixed before any task is created; wiring, parameter
//! fan-out and result exposure then run over that set.

use super::cache::{ExistingImageIndex, PreBuildSource};
use super::commands::{
    copy_artifacts_args, create_pre_build_image_script, deploy_pre_build_source_args,
    restore_post_build_artifacts_script, restore_pre_build_source_script,
    store_post_build_artifacts_script, verify_args, verify_built_artifacts_args,
    write_build_script, write_portable_build,
};
use super::model::{
    EnvVar, ParamSpec, PipelineResult, PipelineSpec, PipelineTask, PipelineWorkspaceDeclaration,
    PullPolicy, Step, TaskRef, TaskResult, TaskSpec, WorkspaceDeclaration,
    WorkspacePipelineTaskBinding,
};
use super::secrets::{git_token, secret_variables};
use super::*;
use crate::config::PlannerConfig;
use crate::model::{BuildIdentity, BuildRecipe, Param, ParamValue, TenantConfig};
use crate::registry::RegistryAddressResolver;
use crate::resources::ResourceLimits;
use crate::script::{run_in_processor, ScriptBundle};
use serde::Serialize;
use tracing::debug;

/// How the build stage runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildStrategy {
    /// A remote container build definition builds the portable Containerfile.
    Delegated,
    /// Steps embedded in the plan run the build script.
    Direct,
}

impl BuildStrategy {
    pub fn for_tenant(tenant: &TenantConfig) -> Self {
        if tenant.container_builds {
            Self::Delegated
        } else {
            Self::Direct
        }
    }
}

/// The stages a plan contains and how they depend on each other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSet {
    pub pre_build: PreBuildSource,
    pub build: BuildStrategy,
}

impl StageSet {
    pub fn decide(
        tenant: &TenantConfig,
        recipe: &BuildRecipe,
        existing: &ExistingImageIndex,
    ) -> Self {
        let stages = Self {
            pre_build: PreBuildSource::resolve(existing, recipe),
            build: BuildStrategy::for_tenant(tenant),
        };
        debug!(
            pre_build = stages.pre_build.needs_pre_build(),
            build = ?stages.build,
            "Decided stage set"
        );
        stages
    }

    /// Task names in dependency order.
    pub fn task_names(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(3);
        if self.pre_build.needs_pre_build() {
            names.push(PRE_BUILD_TASK);
        }
        names.push(BUILD_TASK);
        names.push(POST_BUILD_TASK);
        names
    }

    fn build_run_after(&self) -> Vec<String> {
        if self.pre_build.needs_pre_build() {
            vec![PRE_BUILD_TASK.to_string()]
        } else {
            Vec::new()
        }
    }

    fn post_build_run_after(&self) -> Vec<String> {
        let mut run_after = self.build_run_after();
        run_after.push(BUILD_TASK.to_string());
        run_after
    }
}

/// Inputs shared by every stage.
#[derive(Debug, Clone)]
pub struct StageInputs<'a> {
    pub tenant: &'a TenantConfig,
    pub recipe: &'a BuildRecipe,
    pub identity: &'a BuildIdentity,
    pub config: &'a PlannerConfig,
    pub processor_image: &'a str,
    pub build_id: &'a str,
    pub limits: &'a ResourceLimits,
    pub scripts: &'a ScriptBundle,
    /// Portable container description written next to the pre-build source.
    pub containerfile: &'a str,
    /// Default of the pipeline `CACHE_URL` parameter.
    pub cache_url: String,
}

pub struct PipelineGraphBuilder<'a> {
    inputs: StageInputs<'a>,
    stages: StageSet,
    registry: RegistryAddressResolver<'a>,
    secrets: Vec<EnvVar>,
}

impl<'a> PipelineGraphBuilder<'a> {
    pub fn new(inputs: StageInputs<'a>, stages: StageSet) -> Self {
        let registry = RegistryAddressResolver::new(&inputs.tenant.registry, inputs.config);
        let secrets = secret_variables(inputs.tenant);
        Self {
            inputs,
            stages,
            registry,
            secrets,
        }
    }

    pub fn build(self) -> PipelineSpec {
        let params = self.pipeline_params();

        let mut tasks = Vec::with_capacity(3);
        if self.stages.pre_build.needs_pre_build() {
            tasks.push(self.pre_build_task(&params));
        }
        tasks.push(match self.stages.build {
            BuildStrategy::Delegated => self.delegated_build_task(),
            BuildStrategy::Direct => self.direct_build_task(&params),
        });
        tasks.push(self.post_build_task(&params));

        fan_out_params(&params, &mut tasks);
        let results = self.expose_results(&tasks);

        PipelineSpec {
            params,
            tasks,
            results,
            workspaces: [WORKSPACE_SETTINGS, WORKSPACE_SOURCE, WORKSPACE_TLS]
                .into_iter()
                .map(|name| PipelineWorkspaceDeclaration {
                    name: name.to_string(),
                })
                .collect(),
        }
    }

    fn pipeline_params(&self) -> Vec<ParamSpec> {
        let mut params: Vec<ParamSpec> = [
            PARAM_BUILD_ID,
            PARAM_SCM_URL,
            PARAM_SCM_TAG,
            PARAM_SCM_HASH,
            PARAM_CHAINS_GIT_URL,
            PARAM_CHAINS_GIT_COMMIT,
        ]
        .into_iter()
        .map(ParamSpec::string)
        .collect();
        params.push(ParamSpec::array(PARAM_GOALS));
        params.extend(
            [
                PARAM_JAVA_VERSION,
                PARAM_TOOL_VERSION,
                PARAM_PATH,
                PARAM_ENFORCE_VERSION,
                PARAM_PROJECT_VERSION,
            ]
            .into_iter()
            .map(ParamSpec::string),
        );
        params.push(
            ParamSpec::string(PARAM_CACHE_URL)
                .with_default(ParamValue::string(self.inputs.cache_url.clone())),
        );
        params
    }

    fn stage_timeout(&self) -> Option<String> {
        Some(self.inputs.config.stage_timeout_string())
    }

    fn pull_policy(&self, image: &str) -> PullPolicy {
        PullPolicy::for_image(image, &self.inputs.config.dev_image_suffix)
    }

    fn step(&self, name: &str, image: &str) -> Step {
        Step::root(name, image, self.pull_policy(image))
    }

    fn processor_step(&self, name: &str) -> Step {
        self.step(name, self.inputs.processor_image)
    }

    fn trusted_artifacts_step(&self, name: &str) -> Step {
        self.step(name, &self.inputs.config.trusted_artifacts_image)
    }

    fn cache_url_env() -> EnvVar {
        EnvVar::plain(PARAM_CACHE_URL, format!("$(params.{})", PARAM_CACHE_URL))
    }

    fn embedded_spec(params: &[ParamSpec], extra: Option<ParamSpec>) -> TaskSpec {
        let mut declared = params.to_vec();
        declared.extend(extra);
        TaskSpec {
            workspaces: vec![
                WorkspaceDeclaration::new(WORKSPACE_SETTINGS),
                WorkspaceDeclaration::mounted(WORKSPACE_SOURCE, WORKSPACE_MOUNT),
                WorkspaceDeclaration::new(WORKSPACE_TLS),
            ],
            params: declared,
            ..Default::default()
        }
    }

    fn workspace_bindings() -> Vec<WorkspacePipelineTaskBinding> {
        [WORKSPACE_SETTINGS, WORKSPACE_SOURCE, WORKSPACE_TLS]
            .into_iter()
            .map(WorkspacePipelineTaskBinding::same)
            .collect()
    }

    /// Clones, preprocesses and archives the source, then publishes the
    /// portable build files alongside it.
    fn pre_build_task(&self, params: &[ParamSpec]) -> PipelineTask {
        let inputs = &self.inputs;
        let oras = inputs.tenant.oras_options();
        let image_id = &inputs.identity.name;

        let mut clone = self.step("git-clone-and-settings", &inputs.recipe.image);
        clone.compute_resources = Some(inputs.limits.light_step());
        clone.script = format!(
            "{}\n{}",
            inputs.scripts.checkout,
            write_build_script(inputs.scripts.assembled.text())
        );
        clone.env = vec![Self::cache_url_env(), git_token()];

        let mut preprocessor = self.processor_step("preprocessor");
        preprocessor.env = vec![Self::cache_url_env()];
        preprocessor.compute_resources = Some(inputs.limits.light_step());
        preprocessor.script = run_in_processor(&[inputs.scripts.preprocessor_args.clone()]);

        let mut source = self.processor_step("create-pre-build-source");
        source.env = self.secrets.clone();
        source.compute_resources = Some(inputs.limits.processor_step());
        source.script = format!(
            "{}\n{}",
            write_portable_build(inputs.containerfile, &inputs.scripts.run_build),
            run_in_processor(&[deploy_pre_build_source_args(
                inputs.tenant,
                inputs.identity,
                image_id,
            )])
        );

        let mut archive = self.trusted_artifacts_step("create-pre-build-image");
        archive.env = self.secrets.clone();
        archive.compute_resources = Some(inputs.limits.processor_step());
        archive.script = create_pre_build_image_script(
            oras,
            &self.registry.image(&format!("{}-pre-build-image", image_id)),
        );

        let mut spec = Self::embedded_spec(params, None);
        spec.results = vec![
            TaskResult::new(
                RESULT_PRE_BUILD_IMAGE_DIGEST,
                "Digest of the archived pre-build source",
            ),
            TaskResult::new(RESULT_GIT_ARCHIVE, "Git archive of the pre-build source"),
        ];
        spec.steps = vec![clone, preprocessor, source, archive];

        PipelineTask {
            name: PRE_BUILD_TASK.to_string(),
            task_spec: Some(spec),
            workspaces: Self::workspace_bindings(),
            ..Default::default()
        }
    }

    /// Hands the portable Containerfile to the remote build definition.
    fn delegated_build_task(&self) -> PipelineTask {
        let inputs = &self.inputs;
        PipelineTask {
            name: BUILD_TASK.to_string(),
            run_after: self.stages.build_run_after(),
            task_ref: Some(TaskRef {
                resolver: "http".to_string(),
                params: vec![Param::string("url", &inputs.config.build_definition_url)],
            }),
            timeout: self.stage_timeout(),
            params: vec![
                Param::string("DOCKERFILE", ".jbs/Containerfile"),
                Param::string("IMAGE", self.registry.image(inputs.build_id)),
                Param::string("SOURCE_ARTIFACT", self.stages.pre_build.digest_reference()),
                Param::string("ORAS_OPTIONS", inputs.tenant.oras_options()),
                Param::string("TLSVERIFY", inputs.tenant.tls_verify()),
            ],
            ..Default::default()
        }
    }

    fn direct_build_task(&self, params: &[ParamSpec]) -> PipelineTask {
        let inputs = &self.inputs;
        let oras = inputs.tenant.oras_options();

        let mut restore = self.trusted_artifacts_step("restore-pre-build-source");
        restore.env = self.secrets.clone();
        restore.script = restore_pre_build_source_script(oras);

        let mut build = self.step("build", &inputs.recipe.image);
        build.timeout = self.stage_timeout();
        build.working_dir = Some(format!("$(workspaces.{}.path)/source", WORKSPACE_SOURCE));
        build.env = inputs.scripts.env.clone();
        build.env.push(Self::cache_url_env());
        build.compute_resources = Some(inputs.limits.build_step());
        build.args = vec![format!("$(params.{}[*])", PARAM_GOALS)];
        build.script = format!("$(workspaces.{}.path)/build.sh \"$@\"", WORKSPACE_SOURCE);

        let mut copy = self.processor_step("copy-artifacts");
        copy.env = self.secrets.clone();
        copy.compute_resources = Some(inputs.limits.processor_step());
        copy.script = run_in_processor(&[copy_artifacts_args()]);

        let mut store = self.trusted_artifacts_step("store-post-build-artifacts");
        store.env = self.secrets.clone();
        store.script = store_post_build_artifacts_script(
            oras,
            &self.registry.image(&format!("{}-artifacts", inputs.build_id)),
        );

        let mut spec = Self::embedded_spec(
            params,
            Some(ParamSpec::string(RESULT_PRE_BUILD_IMAGE_DIGEST)),
        );
        spec.results = vec![
            TaskResult::new(RESULT_IMAGE, "Address of the artifact archive"),
            TaskResult::new(RESULT_IMAGE_DIGEST, "Digest of the artifact archive"),
        ];
        spec.steps = vec![restore, build, copy, store];

        PipelineTask {
            name: BUILD_TASK.to_string(),
            run_after: self.stages.build_run_after(),
            task_spec: Some(spec),
            timeout: self.stage_timeout(),
            params: vec![Param::string(
                RESULT_PRE_BUILD_IMAGE_DIGEST,
                self.stages.pre_build.digest_reference(),
            )],
            workspaces: Self::workspace_bindings(),
            ..Default::default()
        }
    }

    fn post_build_task(&self, params: &[ParamSpec]) -> PipelineTask {
        let inputs = &self.inputs;

        let mut restore = self.trusted_artifacts_step("restore-post-build-artifacts");
        restore.env = self.secrets.clone();
        restore.script = restore_post_build_artifacts_script(
            inputs.tenant.oras_options(),
            &self.registry.repository(),
            &task_result_reference(BUILD_TASK, RESULT_IMAGE_DIGEST),
        );

        let mut verify = self.processor_step("verify-and-check-for-contaminates");
        verify.env = self.secrets.clone();
        verify.compute_resources = Some(inputs.limits.processor_step());
        verify.script = run_in_processor(&[
            verify_built_artifacts_args(inputs.tenant, inputs.recipe),
            verify_args(inputs.identity, inputs.build_id),
        ]);

        let mut spec = Self::embedded_spec(
            params,
            Some(ParamSpec::string(RESULT_PRE_BUILD_IMAGE_DIGEST)),
        );
        spec.results = vec![
            TaskResult::new(
                RESULT_CONTAMINANTS,
                "Upstream artifacts that were not rebuilt",
            ),
            TaskResult::new(RESULT_DEPLOYED_RESOURCES, "Artifacts that were deployed"),
            TaskResult::new(
                RESULT_PASSED_VERIFICATION,
                "Whether the rebuilt artifacts match upstream",
            ),
            TaskResult::new(RESULT_VERIFICATION_RESULTS, "Detailed verification report"),
        ];
        spec.steps = vec![restore, verify];

        PipelineTask {
            name: POST_BUILD_TASK.to_string(),
            run_after: self.stages.post_build_run_after(),
            task_spec: Some(spec),
            timeout: self.stage_timeout(),
            params: vec![Param::string(
                RESULT_PRE_BUILD_IMAGE_DIGEST,
                self.stages.pre_build.digest_reference(),
            )],
            workspaces: Self::workspace_bindings(),
            ..Default::default()
        }
    }

    /// Every task result, addressed through its task.
    fn expose_results(&self, tasks: &[PipelineTask]) -> Vec<PipelineResult> {
        let mut results = Vec::new();
        for task in tasks {
            match &task.task_spec {
                Some(spec) => {
                    for result in &spec.results {
                        results.push(PipelineResult {
                            name: result.name.clone(),
                            description: result.description.clone(),
                            value: task_result_reference(&task.name, &result.name),
                        });
                    }
                }
                // Results of the remote build definition.
                None => {
                    for name in [RESULT_IMAGE, RESULT_IMAGE_DIGEST] {
                        results.push(PipelineResult {
                            name: name.to_string(),
                            description: None,
                            value: task_result_reference(&task.name, name),
                        });
                    }
                }
            }
        }
        results
    }
}

/// Appends each pipeline parameter, in declaration order, to every task
/// whose embedded spec declares it.
fn fan_out_params(params: &[ParamSpec], tasks: &mut [PipelineTask]) {
    for spec in params {
        for task in tasks.iter_mut() {
            if task.declares_param(&spec.name) {
                task.params.push(spec.forward());
            }
        }
    }
}
