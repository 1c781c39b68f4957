//! Composes the build script from the entry template

use super::keystore::install_keystore_script;
use super::packages::install_packages;
use super::templates::{
    render, Placeholder, ANT_BUILD, BUILD_ENTRY, ENFORCE_VERSION, GRADLE_BUILD, MAVEN_BUILD,
    MAVEN_SETTINGS, SBT_BUILD,
};
use super::DeferredFailure;
use crate::model::{BuildRecipe, BuildTool};
use std::collections::HashMap;
use tracing::{debug, warn};

/// The assembled build script, still carrying orchestrator references such
/// as `$(params.CACHE_URL)`.
#[derive(Debug, Clone, PartialEq)]
pub enum AssembledScript {
    Runnable(String),
    /// A valid script that exits non-zero when it reaches one of `failures`.
    FailsAtRuntime {
        script: String,
        failures: Vec<DeferredFailure>,
    },
}

impl AssembledScript {
    pub fn text(&self) -> &str {
        match self {
            Self::Runnable(script) | Self::FailsAtRuntime { script, .. } => script,
        }
    }

    pub fn failures(&self) -> &[DeferredFailure] {
        match self {
            Self::Runnable(_) => &[],
            Self::FailsAtRuntime { failures, .. } => failures,
        }
    }

    pub fn fails_at_runtime(&self) -> bool {
        matches!(self, Self::FailsAtRuntime { .. })
    }
}

/// Tool specific section that replaces `{{BUILD}}`.
///
/// When the recipe enforces its version, the version command runs after
/// the Maven settings are written and before the tool is invoked.
fn build_section(recipe: &BuildRecipe) -> Result<String, DeferredFailure> {
    let tool = &recipe.tool;
    let build = match tool {
        BuildTool::Maven => MAVEN_BUILD,
        BuildTool::Gradle => GRADLE_BUILD,
        BuildTool::Ant => ANT_BUILD,
        BuildTool::Sbt => SBT_BUILD,
        BuildTool::Unknown(name) => {
            return Err(DeferredFailure::build_tool(format!(
                "unknown build tool {}",
                name
            )))
        }
    };

    let mut section = String::new();
    if tool.uses_maven_settings() {
        section.push_str(MAVEN_SETTINGS);
        section.push('\n');
    }
    if let Some(command) = tool.version_command().filter(|_| recipe.enforce_version) {
        let values = HashMap::from([("VERSION_COMMAND", command)]);
        section.push_str(&render(ENFORCE_VERSION, Placeholder::Double, &values));
        section.push('\n');
    }
    section.push_str(build);
    Ok(section)
}

/// Renders the recipe into the build script shared by every artifact.
pub fn assemble(recipe: &BuildRecipe) -> AssembledScript {
    let mut failures = Vec::new();

    let build = build_section(recipe).unwrap_or_else(|failure| {
        let line = failure.shell_line();
        failures.push(failure);
        line
    });

    let packages = install_packages(&recipe.additional_downloads);
    failures.extend(packages.failures);

    let values = HashMap::from([
        ("BUILD", build.as_str()),
        ("INSTALL_PACKAGE_SCRIPT", packages.script.as_str()),
        ("PRE_BUILD_SCRIPT", recipe.pre_build_script.as_str()),
        ("POST_BUILD_SCRIPT", recipe.post_build_script.as_str()),
    ]);
    let body = render(BUILD_ENTRY, Placeholder::Double, &values);
    let script = format!("{}\n{}", install_keystore_script(), body);

    if failures.is_empty() {
        debug!(tool = %recipe.tool, "Assembled build script");
        AssembledScript::Runnable(script)
    } else {
        for failure in &failures {
            warn!(tool = %recipe.tool, %failure, "Build script will fail when executed");
        }
        AssembledScript::FailsAtRuntime { script, failures }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AdditionalDownload, FileType};

    fn recipe(tool: BuildTool) -> BuildRecipe {
        BuildRecipe {
            tool,
            image: "quay.io/builder:1".to_string(),
            java_version: "17".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_maven_includes_settings() {
        let script = assemble(&recipe(BuildTool::Maven));
        assert!(!script.fails_at_runtime());
        assert!(script.text().contains("settings.xml"));
        assert!(script.text().contains("mvn -V -B -e"));
    }

    #[test]
    fn test_sbt_omits_maven_settings() {
        let script = assemble(&recipe(BuildTool::Sbt));
        assert!(!script.text().contains("<mirrorOf>"));
        assert!(script.text().contains("sbt -Dsbt.override.build.repos=true"));
    }

    #[test]
    fn test_keystore_preamble_first() {
        let script = assemble(&recipe(BuildTool::Gradle));
        assert!(script.text().starts_with(install_keystore_script()));
    }

    #[test]
    fn test_unknown_tool_fails_at_runtime() {
        let script = assemble(&recipe(BuildTool::parse("foo")));
        assert!(script.fails_at_runtime());
        assert_eq!(script.failures().len(), 1);
        let line = script
            .text()
            .lines()
            .find(|l| l.contains("exit 1"))
            .expect("failing line");
        assert!(line.contains("foo"));
    }

    #[test]
    fn test_hooks_are_inserted_verbatim() {
        let mut r = recipe(BuildTool::Maven);
        r.pre_build_script = "sed -i s/a/b/ pom.xml # {{BUILD}}".to_string();
        r.post_build_script = "echo done".to_string();
        let text = assemble(&r).text().to_string();
        assert!(text.contains("sed -i s/a/b/ pom.xml # {{BUILD}}"));
        let pre = text.find("sed -i").unwrap();
        let build = text.find("mvn -V").unwrap();
        let post = text.find("echo done").unwrap();
        assert!(pre < build && build < post);
    }

    #[test]
    fn test_version_is_enforced_only_when_requested() {
        let mut r = recipe(BuildTool::Maven);
        assert!(!assemble(&r).text().contains("versions:set"));

        r.enforce_version = true;
        let text = assemble(&r).text().to_string();
        assert!(text.contains("if [ \"${ENFORCE_VERSION:-}\" = \"true\" ]"));
        let settings = text.find("settings.xml\" <<").unwrap();
        let enforce = text.find("versions:set").unwrap();
        let build = text.find("mvn -V").unwrap();
        assert!(settings < enforce && enforce < build);
    }

    #[test]
    fn test_package_failures_are_collected() {
        let mut r = recipe(BuildTool::Maven);
        r.additional_downloads.push(AdditionalDownload {
            uri: "https://example.com/x.tgz".to_string(),
            file_type: FileType::Tar,
            sha256: "00".to_string(),
            ..Default::default()
        });
        let script = assemble(&r);
        assert!(script.fails_at_runtime());
        assert!(script.failures()[0].component.contains("x.tgz"));
    }
}
