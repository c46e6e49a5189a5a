use clap::Parser;
use devhttpd::cli::{run_cli, Cli};
use devhttpd::logging::{init_logging, LogConfig};

fn main() -> anyhow::Result<()> {
    init_logging(&LogConfig::from_env())?;
    run_cli(Cli::parse())
}
