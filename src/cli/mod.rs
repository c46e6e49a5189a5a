//! # CLI Module
//!
//! Command-line entry points of the `devhttpd` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Start the device configuration server and run until SIGINT/SIGTERM:
//!
//! ```bash
//! devhttpd serve --config /etc/devhttpd.yaml
//! devhttpd serve --addr 127.0.0.1:8080
//! ```
//!
//! Options:
//! - `--config <FILE>` - YAML configuration (see [`crate::config`])
//! - `--addr <ADDR>` - Listen address, overrides the file and `DEVHTTPD_ADDR`
//!
//! ### `routes`
//!
//! Print the route table the server would register:
//!
//! ```bash
//! devhttpd routes
//! ```

mod commands;


pub use commands::{run_cli, Cli, Commands};
