//! Planner configuration
//!
//! Every implicit default the planner relies on (registry host, resource
//! quantities, local paths used by standalone scripts, image names) lives in
//! [`PlannerConfig`]. It is resolved once before generation starts and passed
//! down explicitly, so tests can override any default in isolation.
//!
//! # Environment Variables
//!
//! `PlannerConfig::from_env()` overlays these on top of the compiled defaults:
//! - `JBS_PLANNER_REGISTRY_HOST`: default registry host - default: "quay.io"
//! - `JBS_PLANNER_REGISTRY_REPOSITORY`: default repository - default: "artifact-deployments"
//! - `JBS_PLANNER_MAX_TAG_LENGTH`: tag truncation length - default: "128"
//! - `JBS_PLANNER_STAGE_TIMEOUT_HOURS`: build/post-build timeout - default: "3"
//! - `JBS_PLANNER_TRUSTED_ARTIFACTS_IMAGE`: image providing `create-archive`/`use-archive`
//! - `JBS_PLANNER_BUILD_DEFINITION_URL`: remote container build task definition
//! - `JBS_PLANNER_LOCAL_CACHE_URL`: cache URL used by standalone scripts
//!
//! # Example
//!
//! ```
//! use jbs_planner::PlannerConfig;
//!
//! let config = PlannerConfig::default().with_default_registry_host("registry.example.com");
//! assert!(config.validate().is_ok());
//! ```

use crate::resources::Quantity;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_REGISTRY_HOST: &str = "quay.io";
const DEFAULT_REGISTRY_REPOSITORY: &str = "artifact-deployments";
const DEFAULT_TLS_PORT: &str = "443";
const DEFAULT_MAX_TAG_LENGTH: usize = 128;
const DEFAULT_STAGE_TIMEOUT_HOURS: u64 = 3;

const DEFAULT_TASK_REQUEST_MEMORY: &str = "512Mi";
const DEFAULT_BUILD_REQUEST_MEMORY: &str = "1024Mi";
const DEFAULT_TASK_REQUEST_CPU: &str = "10m";
const DEFAULT_TASK_LIMIT_CPU: &str = "300m";
const DEFAULT_BUILD_REQUEST_CPU: &str = "300m";
const DEFAULT_BUILD_LIMIT_CPU: &str = "2";

const DEFAULT_TRUSTED_ARTIFACTS_IMAGE: &str =
    "quay.io/redhat-appstudio/build-trusted-artifacts:latest";
const DEFAULT_BUILD_DEFINITION_URL: &str =
    "https://raw.githubusercontent.com/redhat-appstudio/jvm-build-service/main/deploy/tasks/buildah-oci-ta.yaml";

const DEFAULT_LOCAL_CACHE_URL: &str = "http://localhost:8080/v2/cache/rebuild";
const DEFAULT_LOCAL_SETTINGS_PATH: &str = "/var/workdir/software/settings";
const DEFAULT_LOCAL_SOURCE_PATH: &str = "/var/workdir/workspace";
const DEFAULT_LOCAL_TLS_PATH: &str = "/var/workdir/software/tls";

const DEFAULT_DEV_IMAGE_SUFFIX: &str = ":dev";
const DEFAULT_CACHE_SERVICE: &str = "jvm-build-workspace-artifact-cache";
const DEFAULT_PROCESSOR_IMAGE_NAME: &str = "hacbs-jvm-build-request-processor";
const DEFAULT_CACHE_IMAGE_NAME: &str = "hacbs-jvm-cache";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to parse configuration value
    #[error("Failed to parse {field}: {error}")]
    ParseError { field: String, error: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Default resource quantities, used when the tenant leaves a setting blank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDefaults {
    pub task_request_memory: String,
    pub build_request_memory: String,
    pub task_request_cpu: String,
    pub task_limit_cpu: String,
    pub build_request_cpu: String,
    pub build_limit_cpu: String,
}

impl Default for ResourceDefaults {
    fn default() -> Self {
        Self {
            task_request_memory: DEFAULT_TASK_REQUEST_MEMORY.to_string(),
            build_request_memory: DEFAULT_BUILD_REQUEST_MEMORY.to_string(),
            task_request_cpu: DEFAULT_TASK_REQUEST_CPU.to_string(),
            task_limit_cpu: DEFAULT_TASK_LIMIT_CPU.to_string(),
            build_request_cpu: DEFAULT_BUILD_REQUEST_CPU.to_string(),
            build_limit_cpu: DEFAULT_BUILD_LIMIT_CPU.to_string(),
        }
    }
}

impl ResourceDefaults {
    fn entries(&self) -> [(&'static str, &str); 6] {
        [
            ("task_request_memory", self.task_request_memory.as_str()),
            ("build_request_memory", self.build_request_memory.as_str()),
            ("task_request_cpu", self.task_request_cpu.as_str()),
            ("task_limit_cpu", self.task_limit_cpu.as_str()),
            ("build_request_cpu", self.build_request_cpu.as_str()),
            ("build_limit_cpu", self.build_limit_cpu.as_str()),
        ]
    }
}

/// Filesystem locations substituted into scripts that run outside the
/// orchestrator (diagnostic image, portable container build).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalPaths {
    pub cache_url: String,
    pub settings: String,
    pub source: String,
    pub tls: String,
}

impl Default for LocalPaths {
    fn default() -> Self {
        Self {
            cache_url: DEFAULT_LOCAL_CACHE_URL.to_string(),
            settings: DEFAULT_LOCAL_SETTINGS_PATH.to_string(),
            source: DEFAULT_LOCAL_SOURCE_PATH.to_string(),
            tls: DEFAULT_LOCAL_TLS_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerConfig {
    pub default_registry_host: String,
    pub default_registry_repository: String,
    /// Port that is never written into image references.
    pub default_tls_port: String,
    pub max_tag_length: usize,
    /// Wall-clock timeout for the build and post-build stages.
    pub stage_timeout: Duration,
    pub resources: ResourceDefaults,
    /// Image providing `create-archive` and `use-archive`.
    pub trusted_artifacts_image: String,
    /// Versioned task definition used when container builds are enabled.
    pub build_definition_url: String,
    pub local: LocalPaths,
    /// Images carrying this suffix are always pulled.
    pub dev_image_suffix: String,
    /// In-cluster cache service name; the TLS variant appends `-tls`.
    pub cache_service: String,
    /// Name fragments used to derive the cache image from the processor image.
    pub processor_image_name: String,
    pub cache_image_name: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_registry_host: DEFAULT_REGISTRY_HOST.to_string(),
            default_registry_repository: DEFAULT_REGISTRY_REPOSITORY.to_string(),
            default_tls_port: DEFAULT_TLS_PORT.to_string(),
            max_tag_length: DEFAULT_MAX_TAG_LENGTH,
            stage_timeout: Duration::from_secs(DEFAULT_STAGE_TIMEOUT_HOURS * 3600),
            resources: ResourceDefaults::default(),
            trusted_artifacts_image: DEFAULT_TRUSTED_ARTIFACTS_IMAGE.to_string(),
            build_definition_url: DEFAULT_BUILD_DEFINITION_URL.to_string(),
            local: LocalPaths::default(),
            dev_image_suffix: DEFAULT_DEV_IMAGE_SUFFIX.to_string(),
            cache_service: DEFAULT_CACHE_SERVICE.to_string(),
            processor_image_name: DEFAULT_PROCESSOR_IMAGE_NAME.to_string(),
            cache_image_name: DEFAULT_CACHE_IMAGE_NAME.to_string(),
        }
    }
}

impl PlannerConfig {
    /// Loads the compiled defaults and applies `JBS_PLANNER_*` overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(host) = env::var("JBS_PLANNER_REGISTRY_HOST") {
            config.default_registry_host = host;
        }
        if let Ok(repository) = env::var("JBS_PLANNER_REGISTRY_REPOSITORY") {
            config.default_registry_repository = repository;
        }
        if let Ok(value) = env::var("JBS_PLANNER_MAX_TAG_LENGTH") {
            config.max_tag_length = parse_env_value("JBS_PLANNER_MAX_TAG_LENGTH", &value)?;
        }
        if let Ok(value) = env::var("JBS_PLANNER_STAGE_TIMEOUT_HOURS") {
            let hours: u64 = parse_env_value("JBS_PLANNER_STAGE_TIMEOUT_HOURS", &value)?;
            let secs = hours
                .checked_mul(3600)
                .ok_or_else(|| ConfigError::ParseError {
                    field: "JBS_PLANNER_STAGE_TIMEOUT_HOURS".to_string(),
                    error: format!("{} hours is out of range", hours),
                })?;
            config.stage_timeout = Duration::from_secs(secs);
        }
        if let Ok(image) = env::var("JBS_PLANNER_TRUSTED_ARTIFACTS_IMAGE") {
            config.trusted_artifacts_image = image;
        }
        if let Ok(url) = env::var("JBS_PLANNER_BUILD_DEFINITION_URL") {
            config.build_definition_url = url;
        }
        if let Ok(url) = env::var("JBS_PLANNER_LOCAL_CACHE_URL") {
            config.local.cache_url = url;
        }

        Ok(config)
    }

    /// Validates the configuration
    ///
    /// Checks that registry defaults are non-empty, the tag length and stage
    /// timeout are positive and every default resource quantity parses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_registry_host.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Default registry host cannot be empty".to_string(),
            ));
        }
        if self.default_registry_repository.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "Default registry repository cannot be empty".to_string(),
            ));
        }
        if self.max_tag_length == 0 {
            return Err(ConfigError::ValidationFailed(
                "Max tag length must be at least 1".to_string(),
            ));
        }
        if self.stage_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "Stage timeout must be positive".to_string(),
            ));
        }
        for (field, value) in self.resources.entries() {
            value
                .parse::<Quantity>()
                .map_err(|e| ConfigError::ParseError {
                    field: field.to_string(),
                    error: e.to_string(),
                })?;
        }
        Ok(())
    }

    pub fn with_default_registry_host(mut self, host: impl Into<String>) -> Self {
        self.default_registry_host = host.into();
        self
    }

    pub fn with_default_registry_repository(mut self, repository: impl Into<String>) -> Self {
        self.default_registry_repository = repository.into();
        self
    }

    pub fn with_max_tag_length(mut self, max_tag_length: usize) -> Self {
        self.max_tag_length = max_tag_length;
        self
    }

    pub fn with_stage_timeout(mut self, timeout: Duration) -> Self {
        self.stage_timeout = timeout;
        self
    }

    pub fn with_resources(mut self, resources: ResourceDefaults) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_trusted_artifacts_image(mut self, image: impl Into<String>) -> Self {
        self.trusted_artifacts_image = image.into();
        self
    }

    pub fn with_local_paths(mut self, local: LocalPaths) -> Self {
        self.local = local;
        self
    }

    /// In-cluster cache endpoint for a tenant namespace.
    pub fn cluster_cache_url(&self, namespace: &str, disable_tls: bool) -> String {
        if disable_tls {
            format!(
                "http://{}.{}.svc.cluster.local/v2/cache/rebuild",
                self.cache_service, namespace
            )
        } else {
            format!(
                "https://{}-tls.{}.svc.cluster.local/v2/cache/rebuild",
                self.cache_service, namespace
            )
        }
    }

    /// Timeout rendered the way the orchestration platform expects it.
    pub fn stage_timeout_string(&self) -> String {
        let secs = self.stage_timeout.as_secs();
        let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        format!("{}h{}m{}s", h, m, s)
    }
}

fn parse_env_value<T>(field: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::ParseError {
        field: field.to_string(),
        error: e.to_string(),
    })
}

impl fmt::Display for PlannerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Planner Configuration:")?;
        writeln!(f, "  Registry Host: {}", self.default_registry_host)?;
        writeln!(f, "  Registry Repository: {}", self.default_registry_repository)?;
        writeln!(f, "  Max Tag Length: {}", self.max_tag_length)?;
        writeln!(f, "  Stage Timeout: {}", self.stage_timeout_string())?;
        writeln!(f, "  Trusted Artifacts Image: {}", self.trusted_artifacts_image)?;
        writeln!(f, "  Build Definition: {}", self.build_definition_url)?;
        writeln!(f, "  Local Cache URL: {}", self.local.cache_url)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    /// Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        old_value: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let old_value = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                old_value,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.old_value {
                Some(v) => env::set_var(&self.key, v),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    fn test_default_configuration() {
        let config = PlannerConfig::default();

        assert_eq!(config.default_registry_host, "quay.io");
        assert_eq!(config.default_registry_repository, "artifact-deployments");
        assert_eq!(config.max_tag_length, 128);
        assert_eq!(config.stage_timeout, Duration::from_secs(3 * 3600));
        assert_eq!(config.resources.task_request_memory, "512Mi");
        assert_eq!(config.resources.build_limit_cpu, "2");
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_environment_variable_parsing() {
        let _guards = vec![
            EnvGuard::set("JBS_PLANNER_REGISTRY_HOST", "registry.example.com"),
            EnvGuard::set("JBS_PLANNER_MAX_TAG_LENGTH", "64"),
            EnvGuard::set("JBS_PLANNER_STAGE_TIMEOUT_HOURS", "5"),
            EnvGuard::set("JBS_PLANNER_LOCAL_CACHE_URL", "http://127.0.0.1:9090/cache"),
        ];

        let config = PlannerConfig::from_env().unwrap();

        assert_eq!(config.default_registry_host, "registry.example.com");
        assert_eq!(config.max_tag_length, 64);
        assert_eq!(config.stage_timeout, Duration::from_secs(5 * 3600));
        assert_eq!(config.local.cache_url, "http://127.0.0.1:9090/cache");
        assert_eq!(config.default_registry_repository, "artifact-deployments");
    }

    #[test]
    #[serial]
    fn test_environment_variable_parse_error() {
        let _guard = EnvGuard::set("JBS_PLANNER_MAX_TAG_LENGTH", "lots");

        let result = PlannerConfig::from_env();
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    #[serial]
    fn test_stage_timeout_overflow_is_an_error() {
        let _guard = EnvGuard::set("JBS_PLANNER_STAGE_TIMEOUT_HOURS", &u64::MAX.to_string());

        let err = PlannerConfig::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ParseError { ref field, .. } if field == "JBS_PLANNER_STAGE_TIMEOUT_HOURS"
        ));
    }

    #[test]
    fn test_validation_rejects_empty_host() {
        let config = PlannerConfig::default().with_default_registry_host(" ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_default_quantity() {
        let config = PlannerConfig::default().with_resources(ResourceDefaults {
            build_limit_cpu: "two".to_string(),
            ..Default::default()
        });

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("build_limit_cpu"));
    }

    #[test]
    fn test_cluster_cache_url() {
        let config = PlannerConfig::default();
        assert_eq!(
            config.cluster_cache_url("team-a", false),
            "https://jvm-build-workspace-artifact-cache-tls.team-a.svc.cluster.local/v2/cache/rebuild"
        );
        assert_eq!(
            config.cluster_cache_url("team-a", true),
            "http://jvm-build-workspace-artifact-cache.team-a.svc.cluster.local/v2/cache/rebuild"
        );
    }

    #[test]
    fn test_stage_timeout_string() {
        let config = PlannerConfig::default();
        assert_eq!(config.stage_timeout_string(), "3h0m0s");

        let config = config.with_stage_timeout(Duration::from_secs(5400));
        assert_eq!(config.stage_timeout_string(), "1h30m0s");
    }

    #[test]
    fn test_config_display() {
        let display = format!("{}", PlannerConfig::default());
        assert!(display.contains("Planner Configuration:"));
        assert!(display.contains("quay.io"));
    }
}
