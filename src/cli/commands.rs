use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Rebuild plan generator for JVM dependencies
#[derive(Parser, Debug)]
#[command(
    name = "jbs-planner",
    about = "Generate rebuild plans for JVM dependencies",
    version,
    author,
    long_about = "jbs-planner turns a build recipe and tenant configuration into a task graph, \
                  a diagnostic Dockerfile, a portable Containerfile and its build script. \
                  All four artifacts run the same build."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Enable debug logging")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - only log errors"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Generate a rebuild plan",
        long_about = "Reads a plan request (YAML or JSON) and writes the task graph, \
                      Dockerfile.diagnostic, Containerfile and run-build.sh.\n\n\
                      Examples:\n  \
                      jbs-planner plan request.yaml\n  \
                      jbs-planner plan request.yaml --output-dir out --format json\n  \
                      jbs-planner plan request.json --print diagnostic"
    )]
    Plan(PlanArgs),

    #[command(
        about = "Generate the deploy and tag task graph",
        long_about = "Reads a tenant configuration (YAML or JSON) and prints the task graph \
                      that deploys verified artifacts and tags the artifact image.\n\n\
                      Examples:\n  \
                      jbs-planner deploy tenant.yaml --processor-image quay.io/x/processor:1 \
                      --gavs org.acme:lib:1.0"
    )]
    Deploy(DeployArgs),

    #[command(about = "Print the stable identifier of a dependency build")]
    BuildId(BuildIdArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct PlanArgs {
    #[arg(value_name = "REQUEST", help = "Plan request document")]
    pub request: PathBuf,

    #[arg(
        short = 'o',
        long,
        value_name = "DIR",
        default_value = ".",
        help = "Directory the artifacts are written to"
    )]
    pub output_dir: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "yaml",
        help = "Task graph format"
    )]
    pub format: OutputFormatArg,

    #[arg(
        short = 'p',
        long,
        value_enum,
        value_name = "ARTIFACT",
        help = "Print one artifact to stdout instead of writing files"
    )]
    pub print: Option<Artifact>,
}

#[derive(Parser, Debug, Clone)]
pub struct DeployArgs {
    #[arg(value_name = "CONFIG", help = "Tenant configuration document")]
    pub config: PathBuf,

    #[arg(long, value_name = "IMAGE", help = "Build request processor image")]
    pub processor_image: String,

    #[arg(
        long,
        value_name = "LIST",
        help = "Comma separated group:artifact:version list to tag"
    )]
    pub gavs: String,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "yaml",
        help = "Task graph format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct BuildIdArgs {
    #[arg(value_name = "URL")]
    pub scm_url: String,

    #[arg(value_name = "TAG")]
    pub tag: String,

    #[arg(value_name = "PATH", default_value = "")]
    pub path: String,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Yaml,
    Json,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Yaml => super::output::OutputFormat::Yaml,
            OutputFormatArg::Json => super::output::OutputFormat::Json,
        }
    }
}

/// Single artifact selectable with `plan --print`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    Pipeline,
    Diagnostic,
    Containerfile,
    Script,
}
