//! Containerfile for the delegated container build

use super::WORKDIR;
use crate::model::{BuildRecipe, BuildTool};
use crate::script::keystore::PROCESSOR_LAUNCHER;
use crate::script::ScriptBundle;

/// Builds inside the recipe image by running `.jbs/run-build.sh`, then
/// copies only the produced artifacts into a scratch image.
///
/// Ant does not deploy its own artifacts, so ant builds gain a processor
/// stage that collects them first.
pub fn portable_containerfile(
    recipe: &BuildRecipe,
    processor_image: &str,
    scripts: &ScriptBundle,
) -> String {
    let mut kf = String::new();
    kf.push_str(&format!("FROM {}", recipe.image));
    kf.push_str("\nUSER 0");
    kf.push_str(&format!("\nWORKDIR {}", WORKDIR));
    kf.push_str("\nRUN mkdir -p /var/workdir/software/settings /original-content/marker");
    kf.push_str("\nARG CACHE_URL=\"\"");
    kf.push_str("\nENV CACHE_URL=$CACHE_URL");
    kf.push_str("\nCOPY .jbs/run-build.sh /var/workdir");
    kf.push_str("\nCOPY . /var/workdir/workspace/source/");
    kf.push_str("\nRUN /var/workdir/run-build.sh");

    let artifact_stage = match recipe.tool {
        BuildTool::Ant => {
            kf.push_str(&format!("\nFROM {} AS build-request-processor", processor_image));
            kf.push_str("\nUSER 0");
            kf.push_str(&format!("\nWORKDIR {}", WORKDIR));
            kf.push_str("\nCOPY --from=0 /var/workdir/ /var/workdir/");
            kf.push_str(&format!(
                "\nRUN {} {}",
                PROCESSOR_LAUNCHER, scripts.standalone_copy_artifacts
            ));
            1
        }
        _ => 0,
    };
    kf.push_str("\nFROM scratch");
    kf.push_str(&format!(
        "\nCOPY --from={} /var/workdir/workspace/artifacts /",
        artifact_stage
    ));
    kf
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocalPaths;
    use crate::model::BuildIdentity;

    fn render(tool: BuildTool) -> String {
        let recipe = BuildRecipe {
            tool,
            image: "quay.io/builder:jdk8".to_string(),
            java_version: "8".to_string(),
            ..Default::default()
        };
        let scripts = ScriptBundle::new(
            &recipe,
            &BuildIdentity::default(),
            &[],
            0,
            &LocalPaths::default(),
        );
        portable_containerfile(&recipe, "quay.io/jbs/processor:1.0", &scripts)
    }

    #[test]
    fn test_maven_copies_artifacts_from_build_stage() {
        let kf = render(BuildTool::Maven);
        assert_eq!(kf.matches("\nFROM ").count(), 1);
        assert!(kf.ends_with("FROM scratch\nCOPY --from=0 /var/workdir/workspace/artifacts /"));
    }

    #[test]
    fn test_ant_collects_artifacts_in_processor_stage() {
        let kf = render(BuildTool::Ant);
        assert!(kf.contains("\nFROM quay.io/jbs/processor:1.0 AS build-request-processor\n"));
        assert!(kf.contains(
            "\nRUN /opt/jboss/container/java/run/run-java.sh copy-artifacts --source-path=/var/workdir/workspace/source --deploy-path=/var/workdir/workspace/artifacts\n"
        ));
        assert!(kf.ends_with("FROM scratch\nCOPY --from=1 /var/workdir/workspace/artifacts /"));
    }
}
