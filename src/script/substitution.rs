//! Rewrites orchestrator references into values usable outside the cluster

use crate::config::LocalPaths;
use crate::model::{Param, ParamValue};
use crate::pipeline::model::EnvVar;
use crate::pipeline::{PARAM_CACHE_URL, WORKSPACE_SETTINGS, WORKSPACE_SOURCE, WORKSPACE_TLS};

/// Produces scripts that run in a standalone container next to a locally
/// started cache.
#[derive(Debug, Clone)]
pub struct ParameterSubstitutor<'a> {
    params: &'a [Param],
    commit_time: i64,
    repository_suffix: &'a str,
    local: &'a LocalPaths,
}

impl<'a> ParameterSubstitutor<'a> {
    pub fn new(
        params: &'a [Param],
        commit_time: i64,
        repository_suffix: &'a str,
        local: &'a LocalPaths,
    ) -> Self {
        Self {
            params,
            commit_time,
            repository_suffix,
            local,
        }
    }

    /// `<local cache>[-repos]/<commit time>/`
    pub fn cache_url(&self) -> String {
        format!(
            "{}{}/{}/",
            self.local.cache_url, self.repository_suffix, self.commit_time
        )
    }

    /// Replaces string parameter references, the cache URL reference and
    /// workspace paths. Array parameters are left untouched.
    pub fn substitute(&self, script: &str) -> String {
        let mut result = script.to_string();
        for param in self.params {
            if param.name == PARAM_CACHE_URL {
                continue;
            }
            if let ParamValue::String(value) = &param.value {
                result = result.replace(&format!("$(params.{})", param.name), value);
            }
        }
        result = result.replace(&format!("$(params.{})", PARAM_CACHE_URL), &self.cache_url());
        for (workspace, path) in [
            (WORKSPACE_SETTINGS, &self.local.settings),
            (WORKSPACE_SOURCE, &self.local.source),
            (WORKSPACE_TLS, &self.local.tls),
        ] {
            result = result.replace(&format!("$(workspaces.{}.path)", workspace), path);
        }
        result
    }
}

/// Space joined elements of every array parameter named `key`, each
/// followed by a space, with parentheses removed.
///
/// Recipe arguments such as `-Pversion=$(PROJECT_VERSION)` only resolve
/// inside the orchestrator; without the parentheses they become shell
/// expansions of the exported environment.
pub fn extract_array_param(key: &str, params: &[Param]) -> String {
    let mut result = String::new();
    for param in params.iter().filter(|p| p.name == key) {
        if let ParamValue::Array(values) = &param.value {
            for value in values {
                result.push_str(&value.replace(['(', ')'], ""));
                result.push(' ');
            }
        }
    }
    result
}

/// One `export NAME=value` line per variable, in order.
pub fn extract_env_vars(env: &[EnvVar]) -> String {
    let mut result = String::new();
    for var in env {
        result.push_str("export ");
        result.push_str(&var.name);
        result.push('=');
        result.push_str(var.value.as_deref().unwrap_or_default());
        result.push('\n');
    }
    result
}
