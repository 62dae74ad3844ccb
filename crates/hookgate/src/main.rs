mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use hookgate_runtime::hooks::BLOCKING_EXIT_CODE;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the decision JSON
    hookgate_runtime::init_logging("warn");

    let cli = Cli::parse();

    // Handle init command early (doesn't need config)
    if let Commands::Init { path } = &cli.command {
        return commands::init::run_init(path);
    }

    let config = config::load_config(cli.config.as_deref())?;
    let project = cli.project.as_deref();

    match cli.command {
        Commands::Init { .. } => {
            // Already handled above
            unreachable!()
        }
        Commands::Run { event, verbose } => {
            if commands::run::execute(event, verbose, &config, project).await? {
                std::process::exit(BLOCKING_EXIT_CODE);
            }
        }
        Commands::Validate => {
            if commands::validate::execute(&config, project)? {
                std::process::exit(1);
            }
        }
        Commands::List { event } => {
            commands::list::execute(&config, project, event)?;
        }
        Commands::Watch => {
            commands::watch::execute(&config, project).await?;
        }
    }

    Ok(())
}
