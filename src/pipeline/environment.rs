//! Build step environment

use super::model::EnvVar;
use super::{ENV_JAVA_HOME, PARAM_ENFORCE_VERSION, PARAM_PROJECT_VERSION, PARAM_TOOL_VERSION};
use crate::model::build_tool::TOOL_HOME_VARIABLES;
use crate::model::{java_home, BuildIdentity, BuildRecipe};

/// Tool homes for every pinned tool version, then the tool version, project
/// version, JDK location and version enforcement flag.
pub fn tool_environment(recipe: &BuildRecipe, identity: &BuildIdentity) -> Vec<EnvVar> {
    let mut env = Vec::new();
    for (tool, variable) in TOOL_HOME_VARIABLES {
        if let Some(version) = recipe.tool_versions.get(*tool).filter(|v| !v.is_empty()) {
            env.push(EnvVar::plain(variable, format!("/opt/{}/{}", tool, version)));
        }
    }
    let project_version = recipe
        .project_version
        .as_deref()
        .filter(|v| !v.is_empty())
        .unwrap_or(identity.version.as_str());
    env.push(EnvVar::plain(PARAM_TOOL_VERSION, recipe.tool_version.as_str()));
    env.push(EnvVar::plain(PARAM_PROJECT_VERSION, project_version));
    env.push(EnvVar::plain(ENV_JAVA_HOME, java_home(&recipe.java_version)));
    env.push(EnvVar::plain(
        PARAM_ENFORCE_VERSION,
        recipe.enforce_version.to_string(),
    ));
    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_tool_environment_order() {
        let recipe = BuildRecipe {
            java_version: "8".to_string(),
            tool_version: "3.9.5".to_string(),
            tool_versions: BTreeMap::from([
                ("sbt".to_string(), "1.9.0".to_string()),
                ("maven".to_string(), "3.9.5".to_string()),
            ]),
            enforce_version: true,
            ..Default::default()
        };
        let identity = BuildIdentity {
            version: "2.1.0".to_string(),
            ..Default::default()
        };

        let env = tool_environment(&recipe, &identity);
        let rendered: Vec<(String, String)> = env
            .into_iter()
            .map(|e| (e.name, e.value.unwrap_or_default()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("MAVEN_HOME".to_string(), "/opt/maven/3.9.5".to_string()),
                ("SBT_DIST".to_string(), "/opt/sbt/1.9.0".to_string()),
                ("TOOL_VERSION".to_string(), "3.9.5".to_string()),
                ("PROJECT_VERSION".to_string(), "2.1.0".to_string()),
                ("JAVA_HOME".to_string(), "/lib/jvm/java-1.8.0".to_string()),
                ("ENFORCE_VERSION".to_string(), "true".to_string()),
            ]
        );
    }

    #[test]
    fn test_project_version_override() {
        let recipe = BuildRecipe {
            project_version: Some("2.1.0.redhat-1".to_string()),
            java_version: "17".to_string(),
            ..Default::default()
        };
        let identity = BuildIdentity {
            version: "2.1.0".to_string(),
            ..Default::default()
        };
        let env = tool_environment(&recipe, &identity);
        let version = env.iter().find(|e| e.name == "PROJECT_VERSION").unwrap();
        assert_eq!(version.value.as_deref(), Some("2.1.0.redhat-1"));
    }
}
