//! Resource limits for the generated stages
//!
//! Tenant overrides fall back to [`ResourceDefaults`] when blank. A malformed
//! quantity aborts plan generation.

pub mod quantity;

pub use quantity::{Quantity, QuantityError, QuantityFormat};

use crate::config::ResourceDefaults;
use crate::model::{BuildSettings, SystemConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
#[error("invalid {setting} quantity {value:?}: {source}")]
pub struct ResourceError {
    pub setting: &'static str,
    pub value: String,
    #[source]
    pub source: QuantityError,
}

/// Requests and limits for one step, keyed by `cpu`/`memory`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub requests: BTreeMap<String, Quantity>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub limits: BTreeMap<String, Quantity>,
}

impl ResourceRequirements {
    /// Memory request equals the limit; CPU request and limit differ.
    fn new(memory: Quantity, request_cpu: Quantity, limit_cpu: Quantity) -> Self {
        Self {
            requests: BTreeMap::from([
                ("cpu".to_string(), request_cpu),
                ("memory".to_string(), memory),
            ]),
            limits: BTreeMap::from([
                ("cpu".to_string(), limit_cpu),
                ("memory".to_string(), memory),
            ]),
        }
    }
}

/// Quantities used by the different kinds of step.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceLimits {
    /// Lightweight steps (clone, preprocessor). Includes additional memory.
    pub task_request_memory: Quantity,
    /// Processor steps (archive, verify, deploy). Never includes additional memory.
    pub task_build_memory: Quantity,
    /// The build step itself. Includes additional memory.
    pub build_request_memory: Quantity,
    pub task_request_cpu: Quantity,
    pub task_limit_cpu: Quantity,
    pub build_request_cpu: Quantity,
    pub build_limit_cpu: Quantity,
}

impl ResourceLimits {
    /// Parses the tenant settings and adds `additional_memory_mb` to the
    /// lightweight and build memory requests.
    pub fn derive(
        settings: &BuildSettings,
        defaults: &ResourceDefaults,
        additional_memory_mb: u32,
    ) -> Result<Self, ResourceError> {
        let mut task_request_memory = parse_setting(
            "taskRequestMemory",
            &settings.task_request_memory,
            &defaults.task_request_memory,
        )?;
        let task_build_memory = parse_setting(
            "buildRequestMemory",
            &settings.build_request_memory,
            &defaults.build_request_memory,
        )?;
        let task_request_cpu = parse_setting(
            "taskRequestCPU",
            &settings.task_request_cpu,
            &defaults.task_request_cpu,
        )?;
        let task_limit_cpu = parse_setting(
            "taskLimitCPU",
            &settings.task_limit_cpu,
            &defaults.task_limit_cpu,
        )?;
        let build_request_cpu = parse_setting(
            "buildRequestCPU",
            &settings.build_request_cpu,
            &defaults.build_request_cpu,
        )?;
        let build_limit_cpu = parse_setting(
            "buildLimitCPU",
            &settings.build_limit_cpu,
            &defaults.build_limit_cpu,
        )?;

        let mut build_request_memory = task_build_memory;
        if additional_memory_mb > 0 {
            let additional = Quantity::from_mebibytes(additional_memory_mb);
            build_request_memory += additional;
            task_request_memory += additional;
        }

        Ok(Self {
            task_request_memory,
            task_build_memory,
            build_request_memory,
            task_request_cpu,
            task_limit_cpu,
            build_request_cpu,
            build_limit_cpu,
        })
    }

    pub fn light_step(&self) -> ResourceRequirements {
        ResourceRequirements::new(
            self.task_request_memory,
            self.task_request_cpu,
            self.task_limit_cpu,
        )
    }

    pub fn processor_step(&self) -> ResourceRequirements {
        ResourceRequirements::new(
            self.task_build_memory,
            self.task_request_cpu,
            self.task_limit_cpu,
        )
    }

    pub fn build_step(&self) -> ResourceRequirements {
        ResourceRequirements::new(
            self.build_request_memory,
            self.build_request_cpu,
            self.build_limit_cpu,
        )
    }
}

/// Caps the recipe's additional memory at the system ceiling, if one is set.
pub fn clamp_additional_memory(requested_mb: u32, system: &SystemConfig) -> u32 {
    let ceiling = system.max_additional_memory;
    if ceiling > 0 && requested_mb > ceiling {
        info!(
            requested_mb,
            ceiling_mb = ceiling,
            "Additional memory exceeds system maximum, limiting"
        );
        ceiling
    } else {
        requested_mb
    }
}

fn parse_setting(
    setting: &'static str,
    value: &str,
    default: &str,
) -> Result<Quantity, ResourceError> {
    let chosen = if value.trim().is_empty() { default } else { value };
    chosen.parse().map_err(|source| ResourceError {
        setting,
        value: chosen.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    #[test]
    fn test_defaults_apply_to_blank_settings() {
        let settings = BuildSettings {
            task_request_memory: "   ".to_string(),
            ..Default::default()
        };
        let limits = ResourceLimits::derive(&settings, &ResourceDefaults::default(), 0).unwrap();

        assert_eq!(limits.task_request_memory, q("512Mi"));
        assert_eq!(limits.task_build_memory, q("1024Mi"));
        assert_eq!(limits.build_request_memory, q("1024Mi"));
        assert_eq!(limits.task_request_cpu, q("10m"));
        assert_eq!(limits.task_limit_cpu, q("300m"));
        assert_eq!(limits.build_request_cpu, q("300m"));
        assert_eq!(limits.build_limit_cpu, q("2"));
    }

    #[test]
    fn test_overrides_win() {
        let settings = BuildSettings {
            build_request_memory: "4Gi".to_string(),
            build_limit_cpu: "8".to_string(),
            ..Default::default()
        };
        let limits = ResourceLimits::derive(&settings, &ResourceDefaults::default(), 0).unwrap();

        assert_eq!(limits.build_request_memory.to_string(), "4Gi");
        assert_eq!(limits.build_limit_cpu.to_string(), "8");
    }

    #[test]
    fn test_additional_memory_added_to_requests_only() {
        let limits = ResourceLimits::derive(
            &BuildSettings::default(),
            &ResourceDefaults::default(),
            1024,
        )
        .unwrap();

        assert_eq!(limits.build_request_memory.to_string(), "2Gi");
        assert_eq!(limits.task_request_memory.to_string(), "1536Mi");
        assert_eq!(limits.task_build_memory.to_string(), "1Gi");
    }

    #[test]
    fn test_malformed_quantity_is_fatal() {
        let settings = BuildSettings {
            task_limit_cpu: "lots".to_string(),
            ..Default::default()
        };
        let err = ResourceLimits::derive(&settings, &ResourceDefaults::default(), 0).unwrap_err();

        assert_eq!(err.setting, "taskLimitCPU");
        assert_eq!(err.value, "lots");
    }

    #[test]
    fn test_step_requirements() {
        let limits = ResourceLimits::derive(
            &BuildSettings::default(),
            &ResourceDefaults::default(),
            0,
        )
        .unwrap();

        let build = limits.build_step();
        assert_eq!(build.requests["memory"], limits.build_request_memory);
        assert_eq!(build.limits["memory"], limits.build_request_memory);
        assert_eq!(build.requests["cpu"].to_string(), "300m");
        assert_eq!(build.limits["cpu"].to_string(), "2");

        let light = limits.light_step();
        assert_eq!(light.requests["memory"].to_string(), "512Mi");
        assert_eq!(light.limits["cpu"].to_string(), "300m");
    }

    #[test]
    fn test_clamp_additional_memory() {
        let system = SystemConfig {
            max_additional_memory: 2000,
        };
        assert_eq!(clamp_additional_memory(5000, &system), 2000);
        assert_eq!(clamp_additional_memory(1500, &system), 1500);

        let unlimited = SystemConfig::default();
        assert_eq!(clamp_additional_memory(5000, &unlimited), 5000);
    }
}
