use crate::config::HttpdConfig;
use crate::device::MemoryDevice;
use crate::form::BufferPool;
use crate::handlers::app_routes;
use crate::lifecycle::Httpd;
use crate::router::RouteTableBuilder;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Command-line interface for devhttpd
#[derive(Parser)]
#[command(name = "devhttpd", version)]
#[command(about = "Device configuration HTTP server", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the configuration server until SIGINT/SIGTERM
    Serve {
        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Address and port to bind the server to
        #[arg(long)]
        addr: Option<String>,
    },
    /// Print the registered routes
    Routes,
}

pub fn run_cli(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { config, addr } => {
            let mut config = HttpdConfig::resolve(config.as_deref())?;
            if let Some(addr) = addr {
                config.bind_address = addr;
            }

            let device = Arc::new(MemoryDevice::default());
            let httpd = Httpd::for_device(config, device);
            httpd.start().context("Failed to start devhttpd")?;
            if let Some(table) = httpd.routes() {
                info!(routes = table.len(), "Serving device configuration");
            }

            httpd
                .wait_for_shutdown_signal()
                .context("Failed to wait for shutdown signal")?;
            httpd.stop()?;
            Ok(())
        }
        Commands::Routes => {
            let device = Arc::new(MemoryDevice::default());
            let pool = Arc::new(BufferPool::default());
            let mut builder = RouteTableBuilder::new();
            builder.register_all(app_routes(device, pool))?;
            print!("{}", builder.build());
            Ok(())
        }
    }
}
