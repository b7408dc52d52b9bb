use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;

use changeset_autopilot::orchestration::{run, RunContext};
use changeset_autopilot::{config, logger};

#[derive(clap::Parser)]
#[command(
    name = "changeset-autopilot",
    about = "Version and publish changesets-managed packages from CI"
)]
struct Args {
    #[arg(long, env = "GITHUB_REPOSITORY", help = "Repository in owner/repo form")]
    repository: String,

    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: String,

    #[arg(
        long,
        env = "NPM_TOKEN",
        hide_env_values = true,
        help = "npm auth token; publishing is skipped without one"
    )]
    npm_token: Option<String>,

    #[arg(long, env = "BOT_NAME", help = "Overrides the configured bot name")]
    bot_name: Option<String>,

    #[arg(long, default_value = ".", help = "Workspace checkout root")]
    root: PathBuf,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = config::load_config(args.config.as_deref(), &args.root);

    let ctx = RunContext {
        repository: args.repository,
        github_token: args.github_token,
        npm_token: args.npm_token,
        bot_name: args.bot_name.unwrap_or_else(|| config.bot_name.clone()),
        root: args.root,
    };

    // The single place a run is marked failed.
    if let Err(e) = run(&ctx, &config) {
        logger::error(&format!("Run failed: {}", e));
        return Err(e.into());
    }
    Ok(())
}
