use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "knivete", version, about = "Streaming-SQL swiss knife")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Apply SQL files to a streaming-SQL server
    #[command(
        visible_alias = "m",
        after_help = "example: knivete migrate --directory=scripts/ --server=http://localhost:8088"
    )]
    Migrate(MigrateArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct MigrateArgs {
    /// Directory holding the migration scripts
    #[arg(long, env = "KNIVETE_DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Base URL of the server, e.g. http://localhost:8088
    #[arg(long, env = "KNIVETE_SERVER")]
    pub server: Option<String>,

    /// Print what would be executed without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Config file (YAML or TOML); defaults to ./knivete.{yml,yaml,toml}
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Where to write the HTTP audit trail
    #[arg(long, conflicts_with = "no_http_log")]
    pub http_log: Option<PathBuf>,

    /// Do not write the HTTP audit trail
    #[arg(long)]
    pub no_http_log: bool,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}
