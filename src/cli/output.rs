//! Serialization and file output of generated plans
//!
//! # Example
//!
//! ```ignore
//! use jbs_planner::cli::output::{OutputFormat, PlanWriter};
//!
//! let plan = jbs_planner::generate_plan(&request, &config)?;
//! let written = PlanWriter::new("out", OutputFormat::Yaml).write(&plan)?;
//! ```

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::commands::Artifact;
use crate::pipeline::PipelineSpec;
use crate::plan::GeneratedPlan;

pub const DIAGNOSTIC_FILE: &str = "Dockerfile.diagnostic";
pub const CONTAINERFILE_FILE: &str = "Containerfile";
pub const BUILD_SCRIPT_FILE: &str = "run-build.sh";

/// Task graph serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
        }
    }

    pub fn format_pipeline(&self, pipeline: &PipelineSpec) -> Result<String> {
        match self {
            OutputFormat::Yaml => {
                serde_yaml::to_string(pipeline).context("Failed to serialize task graph to YAML")
            }
            OutputFormat::Json => serde_json::to_string_pretty(pipeline)
                .map(|mut json| {
                    json.push('\n');
                    json
                })
                .context("Failed to serialize task graph to JSON"),
        }
    }

    /// Text of a single artifact, as printed by `plan --print`.
    pub fn render(&self, plan: &GeneratedPlan, artifact: Artifact) -> Result<String> {
        match artifact {
            Artifact::Pipeline => self.format_pipeline(&plan.pipeline),
            Artifact::Diagnostic => Ok(plan.diagnostic_dockerfile.clone()),
            Artifact::Containerfile => Ok(plan.containerfile.clone()),
            Artifact::Script => Ok(plan.build_script.clone()),
        }
    }
}

/// Writes the four plan artifacts into one directory.
pub struct PlanWriter {
    dir: PathBuf,
    format: OutputFormat,
}

impl PlanWriter {
    pub fn new(dir: impl Into<PathBuf>, format: OutputFormat) -> Self {
        Self {
            dir: dir.into(),
            format,
        }
    }

    /// Returns the written paths in a fixed order.
    pub fn write(&self, plan: &GeneratedPlan) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create output directory {}", self.dir.display()))?;

        let pipeline_file = format!("pipeline.{}", self.format.extension());
        let outputs = [
            (pipeline_file.as_str(), self.format.format_pipeline(&plan.pipeline)?),
            (DIAGNOSTIC_FILE, plan.diagnostic_dockerfile.clone()),
            (CONTAINERFILE_FILE, plan.containerfile.clone()),
            (BUILD_SCRIPT_FILE, plan.build_script.clone()),
        ];

        let mut written = Vec::with_capacity(outputs.len());
        for (name, content) in outputs {
            let path = self.dir.join(name);
            fs::write(&path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            written.push(path);
        }
        make_executable(&self.dir.join(BUILD_SCRIPT_FILE))?;

        Ok(written)
    }
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)
        .with_context(|| format!("Failed to read metadata of {}", path.display()))?
        .permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(path, permissions)
        .with_context(|| format!("Failed to mark {} executable", path.display()))
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
