//! Secret backed environment for stages that talk to registries and
//! deployment targets

use super::model::EnvVar;
use crate::model::TenantConfig;

pub const REGISTRY_TOKEN_KEY: &str = ".dockerconfigjson";
pub const MAVEN_SECRET_NAME: &str = "jvm-build-maven-repo-secrets";
pub const MAVEN_SECRET_KEY: &str = "mavenpassword";
pub const AWS_SECRET_NAME: &str = "jvm-build-s3-secrets";
pub const AWS_ACCESS_ID_KEY: &str = "awsaccesskey";
pub const AWS_SECRET_KEY: &str = "awssecretkey";
pub const AWS_PROFILE_KEY: &str = "awsprofile";
pub const GIT_REPO_SECRET_NAME: &str = "jvm-build-git-repo-secrets";
pub const GIT_REPO_SECRET_KEY: &str = "gitdeploytoken";
pub const GIT_SECRET_NAME: &str = "jvm-build-git-secrets";
pub const GIT_SECRET_KEY: &str = ".git-credentials";

/// Bindings for every credential the tenant configures.
///
/// All keys are optional: a secret missing a key leaves the variable unset
/// instead of blocking the step from starting.
pub fn secret_variables(tenant: &TenantConfig) -> Vec<EnvVar> {
    let mut env = Vec::new();
    if !tenant.registry.secret_name.is_empty() {
        env.push(EnvVar::optional_secret(
            "REGISTRY_TOKEN",
            &tenant.registry.secret_name,
            REGISTRY_TOKEN_KEY,
        ));
    }
    if !tenant.maven_deployment.repository.is_empty() {
        env.push(EnvVar::optional_secret(
            "MAVEN_PASSWORD",
            MAVEN_SECRET_NAME,
            MAVEN_SECRET_KEY,
        ));
        env.push(EnvVar::optional_secret(
            "AWS_ACCESS_KEY_ID",
            AWS_SECRET_NAME,
            AWS_ACCESS_ID_KEY,
        ));
        env.push(EnvVar::optional_secret(
            "AWS_SECRET_ACCESS_KEY",
            AWS_SECRET_NAME,
            AWS_SECRET_KEY,
        ));
        env.push(EnvVar::optional_secret(
            "AWS_PROFILE",
            AWS_SECRET_NAME,
            AWS_PROFILE_KEY,
        ));
    }
    if !tenant.git_source_archive.identity.is_empty() {
        env.push(EnvVar::optional_secret(
            "GIT_DEPLOY_TOKEN",
            GIT_REPO_SECRET_NAME,
            GIT_REPO_SECRET_KEY,
        ));
    }
    env
}

/// Clone credentials for private repositories.
pub fn git_token() -> EnvVar {
    EnvVar::optional_secret("GIT_TOKEN", GIT_SECRET_NAME, GIT_SECRET_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(env: &[EnvVar]) -> Vec<&str> {
        env.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_no_secrets_for_empty_tenant() {
        assert!(secret_variables(&TenantConfig::default()).is_empty());
    }

    #[test]
    fn test_all_secrets_in_order() {
        let mut tenant = TenantConfig::default();
        tenant.registry.secret_name = "quay-push".to_string();
        tenant.maven_deployment.repository = "https://repo.example.com".to_string();
        tenant.git_source_archive.identity = "jbs".to_string();

        let env = secret_variables(&tenant);
        assert_eq!(
            names(&env),
            vec![
                "REGISTRY_TOKEN",
                "MAVEN_PASSWORD",
                "AWS_ACCESS_KEY_ID",
                "AWS_SECRET_ACCESS_KEY",
                "AWS_PROFILE",
                "GIT_DEPLOY_TOKEN",
            ]
        );
        for var in &env {
            let source = var.value_from.as_ref().unwrap();
            assert!(source.secret_key_ref.optional);
            assert!(var.value.is_none());
        }
        assert_eq!(
            env[0].value_from.as_ref().unwrap().secret_key_ref.name,
            "quay-push"
        );
    }

    #[test]
    fn test_maven_repository_brings_aws_triple() {
        let mut tenant = TenantConfig::default();
        tenant.maven_deployment.repository = "s3://bucket".to_string();
        assert_eq!(secret_variables(&tenant).len(), 4);
    }
}
