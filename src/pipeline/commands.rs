//! Command lines and step scripts run inside the stages
//!
//! Processor arguments keep their `$(...)` references; the platform
//! resolves them when the step starts.

use super::{
    RESULT_IMAGE, RESULT_IMAGE_DIGEST, RESULT_PASSED_VERIFICATION, RESULT_PRE_BUILD_IMAGE_DIGEST,
};
use crate::model::{BuildIdentity, BuildRecipe, TenantConfig};

const HEREDOC_MARKER: &str = "RHTAPEOF";

/// Normalizes the checked out source for the recipe's build tool.
pub fn preprocessor_args(recipe: &BuildRecipe) -> Vec<String> {
    let mut args = vec![
        recipe.tool.preprocessor_command().to_string(),
        "$(workspaces.source.path)/source".to_string(),
    ];
    args.extend(recipe.disabled_plugins.iter().map(|p| format!("-dp {}", p)));
    args
}

/// Collects deployable artifacts for tools that do not deploy on their own.
pub fn copy_artifacts_args() -> Vec<String> {
    vec![
        "copy-artifacts".to_string(),
        "--source-path=$(workspaces.source.path)/source".to_string(),
        "--deploy-path=$(workspaces.source.path)/artifacts".to_string(),
    ]
}

pub fn verify_args(identity: &BuildIdentity, build_id: &str) -> Vec<String> {
    vec![
        "verify".to_string(),
        "--path=$(workspaces.source.path)/artifacts".to_string(),
        "--logs-path=$(workspaces.source.path)/logs".to_string(),
        "--task-run-name=$(context.taskRun.name)".to_string(),
        format!("--build-id={}", build_id),
        format!("--scm-uri={}", identity.scm.scm_url),
        format!("--scm-commit={}", identity.scm.commit_hash),
    ]
}

/// Flags for pushing the prepared source to the tenant's git archive.
pub fn git_archive_args(tenant: &TenantConfig, identity: &BuildIdentity) -> Vec<String> {
    let archive = &tenant.git_source_archive;
    let mut args = Vec::new();
    if !archive.identity.is_empty() {
        args.push(format!("--git-identity={}", archive.identity));
    }
    if !archive.url.is_empty() {
        args.push(format!("--git-url={}", archive.url));
    }
    if archive.disable_ssl_verification {
        args.push("--git-disable-ssl-verification".to_string());
    }
    if identity.scm.reuse_repository {
        args.push("--git-reuse-repository".to_string());
    }
    args
}

pub fn deploy_pre_build_source_args(
    tenant: &TenantConfig,
    identity: &BuildIdentity,
    image_id: &str,
) -> Vec<String> {
    let mut args = vec![
        "deploy-pre-build-source".to_string(),
        "--source-path=$(workspaces.source.path)/source".to_string(),
        "--task-run-name=$(context.taskRun.name)".to_string(),
        format!("--scm-uri={}", identity.scm.scm_url),
        format!("--scm-commit={}", identity.scm.commit_hash),
    ];
    args.extend(git_archive_args(tenant, identity));
    args.push(format!("--image-id={}", image_id));
    args
}

/// Verification against the upstream artifacts served by the cache.
pub fn verify_built_artifacts_args(tenant: &TenantConfig, recipe: &BuildRecipe) -> Vec<String> {
    let mut args = vec![
        "verify-built-artifacts".to_string(),
        "--repository-url=$(params.CACHE_URL)".to_string(),
        "--deploy-path=$(workspaces.source.path)/artifacts".to_string(),
        "--task-run-name=$(context.taskRun.name)".to_string(),
        format!("--results-file=$(results.{}.path)", RESULT_PASSED_VERIFICATION),
    ];
    if !tenant.require_artifact_verification {
        args.push("--report-only".to_string());
    }
    args.extend(
        recipe
            .allowed_differences
            .iter()
            .map(|d| format!("--excludes={}", d)),
    );
    args
}

pub fn maven_deploy_args(tenant: &TenantConfig) -> Vec<String> {
    let deployment = &tenant.maven_deployment;
    let mut args = vec![
        "deploy".to_string(),
        "--directory=$(workspaces.source.path)/artifacts".to_string(),
    ];
    if !deployment.repository.is_empty() {
        args.push(format!("--mvn-repo={}", deployment.repository));
    }
    if !deployment.username.is_empty() {
        args.push(format!("--mvn-username={}", deployment.username));
    }
    args
}

/// Writes the assembled script to `build.sh` in the source workspace.
pub fn write_build_script(build: &str) -> String {
    format!(
        "tee $(workspaces.source.path)/build.sh <<'{marker}'\n{build}\n{marker}\nchmod +x $(workspaces.source.path)/build.sh\n",
        marker = HEREDOC_MARKER,
        build = build
    )
}

/// Writes the portable container description and its run script into
/// `.jbs` so they travel with the pre-build source.
pub fn write_portable_build(containerfile: &str, run_build: &str) -> String {
    format!(
        "mkdir -p $(workspaces.source.path)/source/.jbs\n\
         tee $(workspaces.source.path)/source/.jbs/Containerfile <<'{marker}'\n{containerfile}\n{marker}\n\
         tee $(workspaces.source.path)/source/.jbs/run-build.sh <<'{marker}'\n{run_build}\n{marker}\n\
         chmod +x $(workspaces.source.path)/source/.jbs/run-build.sh\n",
        marker = HEREDOC_MARKER,
        containerfile = containerfile,
        run_build = run_build
    )
}

/// Archives the prepared source, storing the digest as a result. The
/// archive is compatible with jib so the processor can read it back.
pub fn create_pre_build_image_script(oras_options: &str, store: &str) -> String {
    format!(
        r#"echo "Creating pre-build-image archive"
export ORAS_OPTIONS="{oras} --image-spec=v1.0 --artifact-type application/vnd.oci.image.config.v1+json"
cp $(workspaces.source.path)/build.sh $(workspaces.source.path)/source/.jbs
create-archive --store {store} $(results.{result}.path)=$(workspaces.source.path)/source
"#,
        oras = oras_options,
        store = store,
        result = RESULT_PRE_BUILD_IMAGE_DIGEST
    )
}

pub fn restore_pre_build_source_script(oras_options: &str) -> String {
    format!(
        r#"echo "Restoring source to workspace : $(workspaces.source.path)"
export ORAS_OPTIONS="{oras}"
use-archive $(params.{param})=$(workspaces.source.path)/source
mv $(workspaces.source.path)/source/.jbs/build.sh $(workspaces.source.path)"#,
        oras = oras_options,
        param = RESULT_PRE_BUILD_IMAGE_DIGEST
    )
}

/// Archives the built artifacts and records the archive address and digest.
pub fn store_post_build_artifacts_script(oras_options: &str, image: &str) -> String {
    format!(
        r#"echo "Creating post-build-image archive"
export ORAS_OPTIONS="{oras} --image-spec=v1.0 --artifact-type application/vnd.oci.image.config.v1+json --no-tty --format=json"
IMGURL={image}
create-archive --store $IMGURL /tmp/artifacts=$(workspaces.source.path)/artifacts | tee /tmp/oras-create.json
IMGDIGEST=$(cat /tmp/oras-create.json | grep -Ev '(Prepared artifact|Artifacts created)' | jq -r '.digest')
echo "Storing IMGURL $IMGURL and IMGDIGEST $IMGDIGEST"
echo -n "$IMGURL" >> $(results.{url}.path)
echo -n "$IMGDIGEST" >> $(results.{digest}.path)
"#,
        oras = oras_options,
        image = image,
        url = RESULT_IMAGE,
        digest = RESULT_IMAGE_DIGEST
    )
}

/// Restores the artifact archive. Only the manifest digest is known, so the
/// archive layer is looked up from the manifest.
pub fn restore_post_build_artifacts_script(
    oras_options: &str,
    repository: &str,
    digest: &str,
) -> String {
    format!(
        r#"echo "Restoring artifacts to workspace : $(workspaces.source.path)"
export ORAS_OPTIONS="{oras}"
URL={repository}
DIGEST={digest}
AARCHIVE=$(oras manifest fetch $ORAS_OPTIONS $URL@$DIGEST | jq --raw-output '.layers[0].digest')
echo "URL $URL DIGEST $DIGEST AARCHIVE $AARCHIVE"
use-archive oci:$URL@$AARCHIVE=$(workspaces.source.path)/artifacts"#,
        oras = oras_options,
        repository = repository,
        digest = digest
    )
}
