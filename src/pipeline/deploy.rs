//! Deploy and tag graph run after a build has been verified

use super::commands::maven_deploy_args;
use super::model::{
    ParamSpec, PipelineSpec, PipelineTask, PipelineWorkspaceDeclaration, PullPolicy, Step,
    TaskSpec, WorkspaceDeclaration, WorkspacePipelineTaskBinding,
};
use super::secrets::secret_variables;
use super::{
    RESULT_IMAGE, RESULT_IMAGE_DIGEST, RESULT_PRE_BUILD_IMAGE_DIGEST, TAG_TASK, WORKSPACE_MOUNT,
    WORKSPACE_SOURCE, WORKSPACE_TLS,
};
use crate::config::PlannerConfig;
use crate::model::TenantConfig;
use crate::registry::RegistryAddressResolver;
use crate::resources::{ResourceError, ResourceLimits};
use crate::script::run_in_processor;
use tracing::debug;

/// Restores the verified artifacts, deploys them to the tenant's Maven
/// repository and tags the artifact image with every GAV.
///
/// `gavs` is a comma separated list of `group:artifact:version`.
pub fn create_deploy_pipeline(
    tenant: &TenantConfig,
    config: &PlannerConfig,
    processor_image: &str,
    gavs: &str,
) -> Result<PipelineSpec, ResourceError> {
    let limits = ResourceLimits::derive(&tenant.build_settings, &config.resources, 0)?;
    let secrets = secret_variables(tenant);
    let oras = tenant.oras_options();
    let repository = RegistryAddressResolver::new(&tenant.registry, config).repository();
    let trusted = &config.trusted_artifacts_image;

    let mut restore = Step::root(
        "restore-post-build-artifacts",
        trusted,
        PullPolicy::for_image(trusted, &config.dev_image_suffix),
    );
    restore.env = secrets.clone();
    restore.script = format!(
        r#"echo "Restoring artifacts and source to workspace"
export ORAS_OPTIONS="{oras}"
use-archive $(params.{pre_build})=$(workspaces.source.path)/source
mv $(workspaces.source.path)/source/.jbs/build.sh $(workspaces.source.path)
URL=$(params.{image})
DIGEST=$(params.{digest})
AARCHIVE=$(oras manifest fetch $ORAS_OPTIONS $URL@$DIGEST | jq --raw-output '.layers[0].digest')
echo "URL $URL DIGEST $DIGEST AARCHIVE $AARCHIVE"
use-archive oci:$URL@$AARCHIVE=$(workspaces.source.path)/artifacts"#,
        oras = oras,
        pre_build = RESULT_PRE_BUILD_IMAGE_DIGEST,
        image = RESULT_IMAGE,
        digest = RESULT_IMAGE_DIGEST,
    );

    let mut deploy = Step::root(
        "maven-deployment",
        processor_image,
        PullPolicy::for_image(processor_image, &config.dev_image_suffix),
    );
    deploy.env = secrets.clone();
    deploy.compute_resources = Some(limits.processor_step());
    deploy.script = run_in_processor(&[maven_deploy_args(tenant)]);

    let mut tag = Step::root(
        "oras-tag",
        trusted,
        PullPolicy::for_image(trusted, &config.dev_image_suffix),
    );
    tag.env = secrets;
    tag.script = format!(
        "GAVS={gavs}\necho \"Tagging for GAVs ($GAVS)\"\noras tag {oras} --verbose {repository}@$(params.{digest}) ${{GAVS//,/ }}",
        gavs = gavs,
        oras = oras,
        repository = repository,
        digest = RESULT_IMAGE_DIGEST,
    );

    let declared = [
        RESULT_PRE_BUILD_IMAGE_DIGEST,
        RESULT_IMAGE_DIGEST,
        RESULT_IMAGE,
    ];
    let task = PipelineTask {
        name: TAG_TASK.to_string(),
        task_spec: Some(TaskSpec {
            workspaces: vec![
                WorkspaceDeclaration::new(WORKSPACE_TLS),
                WorkspaceDeclaration::mounted(WORKSPACE_SOURCE, WORKSPACE_MOUNT),
            ],
            params: declared.into_iter().map(ParamSpec::string).collect(),
            steps: vec![restore, deploy, tag],
            ..Default::default()
        }),
        params: [RESULT_IMAGE, RESULT_IMAGE_DIGEST, RESULT_PRE_BUILD_IMAGE_DIGEST]
            .into_iter()
            .map(|name| ParamSpec::string(name).forward())
            .collect(),
        workspaces: vec![
            WorkspacePipelineTaskBinding::same(WORKSPACE_TLS),
            WorkspacePipelineTaskBinding::same(WORKSPACE_SOURCE),
        ],
        ..Default::default()
    };

    debug!(gavs, "Created deploy pipeline");
    Ok(PipelineSpec {
        params: [RESULT_IMAGE, RESULT_IMAGE_DIGEST, RESULT_PRE_BUILD_IMAGE_DIGEST]
            .into_iter()
            .map(ParamSpec::string)
            .collect(),
        tasks: vec![task],
        results: Vec::new(),
        workspaces: [WORKSPACE_SOURCE, WORKSPACE_TLS]
            .into_iter()
            .map(|name| PipelineWorkspaceDeclaration {
                name: name.to_string(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParamValue;

    #[test]
    fn test_deploy_pipeline_declares_referenced_params() {
        let pipeline = create_deploy_pipeline(
            &TenantConfig::default(),
            &PlannerConfig::default(),
            "quay.io/jbs/processor:1.0",
            "org.example:lib:1.0,org.example:lib-api:1.0",
        )
        .unwrap();

        let declared: Vec<&str> = pipeline.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            declared,
            vec!["IMAGE_URL", "IMAGE_DIGEST", "PRE_BUILD_IMAGE_DIGEST"]
        );
        let task = pipeline.task("tag").unwrap();
        assert_eq!(
            task.param("IMAGE_URL"),
            Some(&ParamValue::String("$(params.IMAGE_URL)".to_string()))
        );
        for name in &declared {
            assert!(task.declares_param(name));
        }
    }

    #[test]
    fn test_deploy_pipeline_tags_every_gav() {
        let mut tenant = TenantConfig::default();
        tenant.registry.owner = "team".to_string();
        tenant.maven_deployment.repository = "https://repo.example.com".to_string();
        let pipeline = create_deploy_pipeline(
            &tenant,
            &PlannerConfig::default(),
            "quay.io/jbs/processor:dev",
            "a:b:1",
        )
        .unwrap();

        let task = pipeline.task("tag").unwrap();
        let tag = task.step("oras-tag").unwrap();
        assert!(tag
            .script
            .contains("oras tag  --verbose quay.io/team/artifact-deployments@$(params.IMAGE_DIGEST) ${GAVS//,/ }"));
        let deploy = task.step("maven-deployment").unwrap();
        assert_eq!(deploy.image_pull_policy, Some(PullPolicy::Always));
        assert!(deploy.script.contains("--mvn-repo=https://repo.example.com"));
        assert_eq!(deploy.env.len(), 4);
    }

    #[test]
    fn test_deploy_pipeline_rejects_bad_quantity() {
        let mut tenant = TenantConfig::default();
        tenant.build_settings.task_request_cpu = "lots".to_string();
        let err = create_deploy_pipeline(&tenant, &PlannerConfig::default(), "img", "a:b:1")
            .unwrap_err();
        assert_eq!(err.setting, "taskRequestCPU");
    }
}
