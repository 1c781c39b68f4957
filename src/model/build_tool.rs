//! Build tools a recipe can select

crate::define_id_enum! {
    /// The build tool driving a dependency rebuild.
    ///
    /// Unknown names deserialize to `BuildTool::Unknown` and produce a script
    /// that fails when the build stage runs.
    BuildTool {
        Maven => "maven",
        Gradle => "gradle",
        Sbt => "sbt",
        Ant => "ant",
    }
}

impl BuildTool {
    /// Sub-command of the build-request-processor that normalizes the
    /// checked out source before it is archived.
    ///
    /// Unknown tools fall back to the maven preprocessor; their build script
    /// fails regardless.
    pub fn preprocessor_command(&self) -> &'static str {
        match self {
            Self::Gradle => "gradle-prepare",
            Self::Sbt => "sbt-prepare",
            Self::Ant => "ant-prepare",
            Self::Maven | Self::Unknown(_) => "maven-prepare",
        }
    }

    /// Maven, Gradle and Ant builds all resolve through a generated
    /// `settings.xml`; sbt does not.
    pub fn uses_maven_settings(&self) -> bool {
        matches!(self, Self::Maven | Self::Gradle | Self::Ant)
    }

    /// Shell command forcing the build to produce `$PROJECT_VERSION`.
    ///
    /// Maven rewrites the poms up front; the other tools take the version as
    /// an extra build argument.
    pub fn version_command(&self) -> Option<&'static str> {
        match self {
            Self::Maven => Some(
                "mvn -B -e -s \"$(workspaces.build-settings.path)/settings.xml\" versions:set -DnewVersion=\"$PROJECT_VERSION\" -DgenerateBackupPoms=false -DprocessAllModules=true",
            ),
            Self::Gradle => Some("set -- \"$@\" \"-Pversion=$PROJECT_VERSION\""),
            Self::Sbt => Some("set -- \"$@\" \"set every version := \\\"$PROJECT_VERSION\\\"\""),
            Self::Ant => Some("set -- \"$@\" \"-Dversion=$PROJECT_VERSION\""),
            Self::Unknown(_) => None,
        }
    }
}

/// Environment variables naming the install location of each tool version.
pub const TOOL_HOME_VARIABLES: &[(&str, &str)] = &[
    ("maven", "MAVEN_HOME"),
    ("gradle", "GRADLE_HOME"),
    ("ant", "ANT_HOME"),
    ("sbt", "SBT_DIST"),
];

/// Location of the JDK for a Java major version inside the builder images.
///
/// Java 7 and 8 still use the legacy `1.x` directory naming.
pub fn java_home(java_version: &str) -> String {
    match java_version {
        "7" | "8" => format!("/lib/jvm/java-1.{}.0", java_version),
        other => format!("/lib/jvm/java-{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_tools() {
        assert_eq!(BuildTool::parse("maven"), BuildTool::Maven);
        assert_eq!(BuildTool::parse("gradle"), BuildTool::Gradle);
        assert_eq!(BuildTool::parse("sbt"), BuildTool::Sbt);
        assert_eq!(BuildTool::parse("ant"), BuildTool::Ant);
    }

    #[test]
    fn test_unknown_tool_round_trips_name() {
        let tool: BuildTool = serde_json::from_str("\"foo\"").unwrap();
        assert_eq!(tool, BuildTool::Unknown("foo".to_string()));
        assert!(!tool.is_known());
        assert_eq!(serde_json::to_string(&tool).unwrap(), "\"foo\"");
    }

    #[test]
    fn test_preprocessor_commands() {
        assert_eq!(BuildTool::Maven.preprocessor_command(), "maven-prepare");
        assert_eq!(BuildTool::Gradle.preprocessor_command(), "gradle-prepare");
        assert_eq!(BuildTool::Sbt.preprocessor_command(), "sbt-prepare");
        assert_eq!(BuildTool::Ant.preprocessor_command(), "ant-prepare");
    }

    #[test]
    fn test_maven_settings_usage() {
        assert!(BuildTool::Maven.uses_maven_settings());
        assert!(BuildTool::Gradle.uses_maven_settings());
        assert!(BuildTool::Ant.uses_maven_settings());
        assert!(!BuildTool::Sbt.uses_maven_settings());
    }

    #[test]
    fn test_version_commands() {
        assert!(BuildTool::Maven
            .version_command()
            .unwrap()
            .contains("versions:set -DnewVersion=\"$PROJECT_VERSION\""));
        assert_eq!(
            BuildTool::Gradle.version_command(),
            Some("set -- \"$@\" \"-Pversion=$PROJECT_VERSION\"")
        );
        assert!(BuildTool::Unknown("foo".to_string())
            .version_command()
            .is_none());
    }

    #[test]
    fn test_java_home_legacy_versions() {
        assert_eq!(java_home("7"), "/lib/jvm/java-1.7.0");
        assert_eq!(java_home("8"), "/lib/jvm/java-1.8.0");
        assert_eq!(java_home("11"), "/lib/jvm/java-11");
        assert_eq!(java_home("21"), "/lib/jvm/java-21");
    }
}
