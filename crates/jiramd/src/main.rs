#![allow(unused)]

use crate::prelude::*;
use clap::Parser;

mod error;
mod jira;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Read Jira tickets, comments, and descriptions as Markdown"
)]
pub struct App {
    #[command(subcommand)]
    pub command: jira::Commands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "JIRAMD_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    jira::run(app.command, app.global)
        .await
        .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
