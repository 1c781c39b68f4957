//! Subcommand handlers. Each returns the process exit code.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use tracing::{debug, error, info};

use super::commands::{BuildIdArgs, DeployArgs, PlanArgs};
use super::output::{OutputFormat, PlanWriter};
use crate::config::PlannerConfig;
use crate::model::{BuildIdentity, TenantConfig};
use crate::pipeline::create_deploy_pipeline;
use crate::plan::{generate_plan, PlanRequest};

pub fn handle_plan(args: &PlanArgs) -> i32 {
    report(run_plan(args))
}

pub fn handle_deploy(args: &DeployArgs) -> i32 {
    report(run_deploy(args))
}

pub fn handle_build_id(args: &BuildIdArgs) -> i32 {
    println!(
        "{}",
        BuildIdentity::stable_name(&args.scm_url, &args.tag, &args.path)
    );
    0
}

fn report(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

fn run_plan(args: &PlanArgs) -> Result<()> {
    let request: PlanRequest = read_document(&args.request)?;
    let config = PlannerConfig::from_env().context("Failed to load planner configuration")?;
    let plan = generate_plan(&request, &config).context("Failed to generate plan")?;
    let format = OutputFormat::from(args.format);

    if let Some(artifact) = args.print {
        print!("{}", format.render(&plan, artifact)?);
        return Ok(());
    }

    let written = PlanWriter::new(&args.output_dir, format).write(&plan)?;
    for path in &written {
        info!(path = %path.display(), "Wrote artifact");
    }
    for failure in &plan.deferred_failures {
        eprintln!("warning: build will fail when executed: {}", failure);
    }
    Ok(())
}

fn run_deploy(args: &DeployArgs) -> Result<()> {
    let tenant: TenantConfig = read_document(&args.config)?;
    let config = PlannerConfig::from_env().context("Failed to load planner configuration")?;
    config
        .validate()
        .context("Invalid planner configuration")?;
    let pipeline = create_deploy_pipeline(&tenant, &config, &args.processor_image, &args.gavs)
        .context("Failed to generate deploy task graph")?;

    print!("{}", OutputFormat::from(args.format).format_pipeline(&pipeline)?);
    Ok(())
}

/// Reads a YAML or JSON document; JSON is accepted by the YAML parser.
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    debug!(path = %path.display(), "Reading input document");
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_read_document_accepts_json_and_yaml() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("tenant.json");
        let yaml = dir.path().join("tenant.yaml");
        fs::write(&json, r#"{"namespace": "team-a", "containerBuilds": true}"#).unwrap();
        fs::write(&yaml, "namespace: team-a\ncontainerBuilds: true\n").unwrap();

        let from_json: TenantConfig = read_document(&json).unwrap();
        let from_yaml: TenantConfig = read_document(&yaml).unwrap();
        assert_eq!(from_json, from_yaml);
        assert!(from_json.container_builds);
    }

    #[test]
    fn test_read_document_reports_missing_file() {
        let err = read_document::<TenantConfig>(Path::new("/nonexistent/tenant.yaml"))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tenant.yaml"));
    }
}
