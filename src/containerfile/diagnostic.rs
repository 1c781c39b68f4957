//! Self-contained image for debugging a failed build locally

use super::WORKDIR;
use crate::config::PlannerConfig;
use crate::model::BuildRecipe;
use crate::script::templates::{DOCKERFILE_ENTRY, START_CACHE};
use crate::script::ScriptBundle;
use base64::{engine::general_purpose, Engine as _};
use tracing::info;

/// Writes `content` to `path` from inline base64 so the Dockerfile needs
/// nothing beyond the images it names.
fn embed(dockerfile: &mut String, content: &str, path: &str) {
    let encoded = general_purpose::STANDARD.encode(content.as_bytes());
    dockerfile.push_str(&format!("\nRUN echo {} | base64 -d >{}", encoded, path));
}

/// Dockerfile that checks out the source, starts a local cache and leaves
/// the build ready to run with `/var/workdir/run-full-build.sh`.
///
/// The checkout resets to the commit recorded for the build, before the
/// preprocessor ran. The portable build starts from the preprocessed
/// archive instead.
pub fn diagnostic_dockerfile(
    recipe: &BuildRecipe,
    processor_image: &str,
    scripts: &ScriptBundle,
    config: &PlannerConfig,
) -> String {
    info!(image = %recipe.image, "Generating diagnostic Dockerfile");
    let cache_image =
        processor_image.replace(&config.processor_image_name, &config.cache_image_name);

    let mut df = String::new();
    df.push_str(&format!("FROM {} AS build-request-processor", processor_image));
    df.push_str(&format!("\nFROM {} AS cache", cache_image));
    df.push_str(&format!("\nFROM {}", recipe.image));
    df.push_str("\nUSER 0");
    df.push_str(&format!("\nWORKDIR {}", WORKDIR));
    df.push_str(&format!("\nENV CACHE_URL={}", scripts.standalone_cache_url));
    df.push_str("\nRUN mkdir -p /var/workdir/software/settings /original-content/marker");
    df.push_str("\nCOPY --from=build-request-processor /deployments/ /var/workdir/software/build-request-processor");
    df.push_str("\nCOPY --from=build-request-processor /lib/jvm/jre-17 /var/workdir/software/system-java");
    df.push_str("\nCOPY --from=build-request-processor /etc/java/java-17-openjdk /etc/java/java-17-openjdk");
    df.push_str("\nCOPY --from=cache /deployments/ /var/workdir/software/cache");
    df.push_str(&format!("\nRUN {}", scripts.standalone_checkout));
    embed(&mut df, START_CACHE, "/var/workdir/start-cache.sh");
    embed(&mut df, &scripts.preprocessor, "/var/workdir/preprocessor.sh");
    embed(&mut df, &scripts.standalone, "/var/workdir/build.sh");
    embed(&mut df, &scripts.run_full_build(), "/var/workdir/run-full-build.sh");
    embed(&mut df, DOCKERFILE_ENTRY, "/var/workdir/entry-script.sh");
    df.push_str("\nRUN chmod +x /var/workdir/*.sh");
    df.push_str("\nCMD [ \"/bin/bash\", \"/var/workdir/entry-script.sh\" ]");
    df
}

/// Contents of every `RUN echo <base64> | base64 -d >path` line, by path.
pub fn embedded_files(dockerfile: &str) -> Vec<(String, String)> {
    dockerfile
        .lines()
        .filter_map(|line| {
            let rest = line.strip_prefix("RUN echo ")?;
            let (encoded, path) = rest.split_once(" | base64 -d >")?;
            let decoded = general_purpose::STANDARD.decode(encoded).ok()?;
            Some((path.to_string(), String::from_utf8(decoded).ok()?))
        })
        .collect()
}
