//! Tenant (namespace level) build service configuration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Annotation that marks the tenant's registry as a plain-HTTP test registry.
pub const TEST_REGISTRY_ANNOTATION: &str = "jvmbuildservice.io/test-registry";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageRegistry {
    pub host: String,
    pub port: String,
    pub owner: String,
    pub repository: String,
    pub insecure: bool,
    /// Prepended to every tag as `<prepend_tag>_<tag>`.
    pub prepend_tag: String,
    /// Secret holding the registry token, if any.
    pub secret_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    #[serde(rename = "disableTLS")]
    pub disable_tls: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MavenDeployment {
    pub repository: String,
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GitSourceArchive {
    pub identity: String,
    pub url: String,
    #[serde(rename = "disableSSLVerification")]
    pub disable_ssl_verification: bool,
}

/// Resource quantity overrides. Empty strings fall back to planner defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildSettings {
    pub task_request_memory: String,
    pub build_request_memory: String,
    #[serde(rename = "taskRequestCPU")]
    pub task_request_cpu: String,
    #[serde(rename = "taskLimitCPU")]
    pub task_limit_cpu: String,
    #[serde(rename = "buildRequestCPU")]
    pub build_request_cpu: String,
    #[serde(rename = "buildLimitCPU")]
    pub build_limit_cpu: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantConfig {
    /// Namespace the tenant's cache service runs in.
    pub namespace: String,
    pub registry: ImageRegistry,
    pub cache_settings: CacheSettings,
    pub maven_deployment: MavenDeployment,
    pub git_source_archive: GitSourceArchive,
    /// Delegate the build stage to the remote container build definition.
    pub container_builds: bool,
    pub require_artifact_verification: bool,
    pub build_settings: BuildSettings,
    pub annotations: BTreeMap<String, String>,
}

impl TenantConfig {
    pub fn is_test_registry(&self) -> bool {
        self.annotations
            .get(TEST_REGISTRY_ANNOTATION)
            .is_some_and(|v| v == "true")
    }

    /// Extra flags for `oras` based archive commands.
    pub fn oras_options(&self) -> &'static str {
        if self.is_test_registry() {
            "--insecure --plain-http"
        } else {
            ""
        }
    }

    pub fn tls_verify(&self) -> &'static str {
        if self.is_test_registry() {
            "false"
        } else {
            "true"
        }
    }
}
