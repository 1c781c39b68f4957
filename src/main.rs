use jbs_planner::cli::commands::{CliArgs, Commands};
use jbs_planner::cli::handlers::{handle_build_id, handle_deploy, handle_plan};
use jbs_planner::util::logging::{self, LoggingConfig};
use jbs_planner::VERSION;

use clap::Parser;
use std::env;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("jbs-planner v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let exit_code = match &args.command {
        Commands::Plan(plan_args) => handle_plan(plan_args),
        Commands::Deploy(deploy_args) => handle_deploy(deploy_args),
        Commands::BuildId(id_args) => handle_build_id(id_args),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        logging::parse_level(level_str).unwrap_or_else(|| {
            eprintln!(
                "Invalid log level '{}', defaulting to WARN. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::WARN
        })
    } else if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        env::var("JBS_PLANNER_LOG_LEVEL")
            .ok()
            .and_then(|v| logging::parse_level(&v))
            .unwrap_or(Level::WARN)
    };

    let use_json = env::var("JBS_PLANNER_LOG_JSON").is_ok_and(|v| v.trim() == "true");
    logging::init_logging(LoggingConfig {
        use_json,
        ..LoggingConfig::with_level(level)
    });
}
