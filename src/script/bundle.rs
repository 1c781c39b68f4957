//! The script text shared by the task graph and both container definitions

use super::assembler::{assemble, AssembledScript};
use super::git::git_checkout_script;
use super::substitution::{extract_array_param, extract_env_vars, ParameterSubstitutor};
use crate::config::LocalPaths;
use crate::model::{BuildIdentity, BuildRecipe, Param};
use crate::pipeline::commands::{copy_artifacts_args, preprocessor_args};
use crate::pipeline::environment::tool_environment;
use crate::pipeline::model::EnvVar;
use crate::pipeline::{PARAM_CACHE_URL, PARAM_GOALS};

const STANDALONE_PROCESSOR: &str = "/var/workdir/software/system-java/bin/java -jar /var/workdir/software/build-request-processor/quarkus-run.jar";

/// Everything a renderer needs, computed once per plan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptBundle {
    /// Script run by the build stage, with orchestrator references intact.
    pub assembled: AssembledScript,
    /// `assembled` with references resolved for a standalone container.
    pub standalone: String,
    /// Build step environment, without `CACHE_URL`.
    pub env: Vec<EnvVar>,
    /// `env` as `export` lines.
    pub env_exports: String,
    /// Build goals as a single argument string.
    pub build_args: String,
    /// Standalone preprocessor invocation.
    pub preprocessor: String,
    /// Portable run script: exports, arguments, then the standalone script.
    pub run_build: String,
    /// Source checkout with orchestrator references intact.
    pub checkout: String,
    pub standalone_checkout: String,
    pub standalone_cache_url: String,
    pub standalone_copy_artifacts: String,
    pub preprocessor_args: Vec<String>,
}

impl ScriptBundle {
    pub fn new(
        recipe: &BuildRecipe,
        identity: &BuildIdentity,
        params: &[Param],
        commit_time: i64,
        local: &LocalPaths,
    ) -> Self {
        let repository_suffix = recipe.repository_suffix();
        let substitutor =
            ParameterSubstitutor::new(params, commit_time, &repository_suffix, local);

        let assembled = assemble(recipe);
        let standalone = substitutor.substitute(assembled.text());
        let env = tool_environment(recipe, identity);
        let env_exports = extract_env_vars(&env);
        let build_args = extract_array_param(PARAM_GOALS, params);

        let preprocessor_args = preprocessor_args(recipe);
        let preprocessor = format!(
            "#!/bin/sh\n{} {}\n",
            STANDALONE_PROCESSOR,
            substitutor.substitute(&preprocessor_args.join(" "))
        );
        let run_build = format!(
            "#!/bin/sh\n{}\nset -- \"$@\" {}\n\n{}",
            env_exports, build_args, standalone
        );

        let checkout = git_checkout_script(identity, recipe);
        let standalone_checkout = substitutor.substitute(&checkout);
        let standalone_cache_url =
            substitutor.substitute(&format!("$(params.{})", PARAM_CACHE_URL));
        let standalone_copy_artifacts =
            ParameterSubstitutor::new(&[], commit_time, &repository_suffix, local)
                .substitute(&copy_artifacts_args().join(" "));

        Self {
            assembled,
            standalone,
            env,
            env_exports,
            build_args,
            preprocessor,
            run_build,
            checkout,
            standalone_checkout,
            standalone_cache_url,
            standalone_copy_artifacts,
            preprocessor_args,
        }
    }

    /// `#!/bin/sh` script running the preprocessor then the build.
    pub fn run_full_build(&self) -> String {
        format!(
            "#!/bin/sh\n/var/workdir/preprocessor.sh\n{}\n/var/workdir/build.sh {}\n",
            self.env_exports, self.build_args
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BuildTool;

    fn bundle() -> ScriptBundle {
        let recipe = BuildRecipe {
            tool: BuildTool::Maven,
            image: "quay.io/builder:jdk17".to_string(),
            java_version: "17".to_string(),
            repositories: vec!["jboss".to_string()],
            ..Default::default()
        };
        let identity = BuildIdentity {
            version: "1.2.3".to_string(),
            ..Default::default()
        };
        let params = vec![
            Param::string("URL", "https://github.com/example/lib.git"),
            Param::string("HASH", "cafebabe"),
            Param::string("JAVA_VERSION", "17"),
            Param::array("GOALS", ["install", "-Dversion=$(PROJECT_VERSION)"]),
        ];
        ScriptBundle::new(&recipe, &identity, &params, 1700000000, &LocalPaths::default())
    }

    #[test]
    fn test_run_build_embeds_standalone_script() {
        let bundle = bundle();
        assert!(bundle.run_build.ends_with(&bundle.standalone));
        assert!(bundle
            .run_build
            .contains("set -- \"$@\" install -Dversion=$PROJECT_VERSION \n"));
        assert!(bundle.run_build.contains("export JAVA_HOME=/lib/jvm/java-17\n"));
    }

    #[test]
    fn test_standalone_has_no_orchestrator_paths() {
        let bundle = bundle();
        assert!(!bundle.standalone.contains("$(workspaces."));
        assert!(!bundle.standalone.contains("$(params.CACHE_URL)"));
        assert!(bundle
            .standalone
            .contains("http://localhost:8080/v2/cache/rebuild-jboss/1700000000/"));
        assert!(bundle.assembled.text().contains("$(params.CACHE_URL)"));
    }

    #[test]
    fn test_preprocessor_and_checkout() {
        let bundle = bundle();
        assert_eq!(
            bundle.preprocessor,
            "#!/bin/sh\n/var/workdir/software/system-java/bin/java -jar /var/workdir/software/build-request-processor/quarkus-run.jar maven-prepare /var/workdir/workspace/source\n"
        );
        assert!(bundle.standalone_checkout.contains("git reset --hard cafebabe"));
        assert!(bundle.checkout.contains("git reset --hard $(params.HASH)"));
        assert_eq!(
            bundle.standalone_copy_artifacts,
            "copy-artifacts --source-path=/var/workdir/workspace/source --deploy-path=/var/workdir/workspace/artifacts"
        );
    }
}
