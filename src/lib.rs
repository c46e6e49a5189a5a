//! # devhttpd
//!
//! **devhttpd** is the request-dispatch and form-data layer of a small HTTP
//! server that exposes a device's configuration (status string, Wi-Fi
//! credentials) on the local network. It runs on the `may` coroutine runtime
//! through `may_minihttp`, one coroutine per connection.
//!
//! ## Architecture
//!
//! - **[`router`]** - Exact-path route table with per-method handler slots
//! - **[`dispatcher`]** - Per-request state machine: lookup, handler call,
//!   outcome reporting
//! - **[`server`]** - Response header synthesis, the header-then-body
//!   [`ResponseWriter`](server::ResponseWriter), and the `may_minihttp` binding
//! - **[`form`]** - Bounded extraction of URL-encoded form fields
//! - **[`handlers`]** - The device endpoints (`/`, `/socket`, `/wifi/config`)
//! - **[`lifecycle`]** - Idempotent start/stop of the server
//! - **[`config`]**, **[`logging`]**, **[`cli`]** - Process plumbing
//!
//! ### Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as AppService<br/>(may_minihttp)
//!     participant Dispatcher
//!     participant Table as RouteTable
//!     participant Handler
//!     participant Form as form::extract_field
//!     participant Writer as ResponseWriter
//!
//!     Client->>Server: POST /wifi/config<br/>ssid=MyWifi&key=hunter2
//!     Server->>Dispatcher: Request (method, path, body reader)
//!     Dispatcher->>Table: find(path, method)
//!     alt Unknown path / method
//!         Table-->>Dispatcher: NotFound / MethodNotAllowed
//!         Dispatcher->>Writer: 404 / 405 + Allow
//!     end
//!     Table-->>Dispatcher: handler
//!     Dispatcher->>Handler: call(req, writer)
//!     Handler->>Form: ssid (<= 32 bytes), key (<= 64 bytes)
//!     alt Form or buffer error
//!         Handler->>Writer: 400 / 413 / 503 + reason
//!     end
//!     Handler->>Writer: send_headers(200, 2, text/plain)
//!     Handler->>Writer: send_body("OK")
//!     Handler-->>Dispatcher: Ok / Err
//!     Dispatcher-->>Server: DispatchOutcome
//!     Server-->>Client: staged response, or connection error
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use devhttpd::config::HttpdConfig;
//! use devhttpd::device::MemoryDevice;
//! use devhttpd::lifecycle::Httpd;
//! use std::sync::Arc;
//!
//! let httpd = Httpd::for_device(HttpdConfig::default(), Arc::new(MemoryDevice::default()));
//! httpd.start()?;
//! httpd.wait_for_shutdown_signal()?;
//! httpd.stop()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod assets;
pub mod cli;
pub mod config;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod form;
pub mod handlers;
pub mod lifecycle;
pub mod logging;
pub mod router;
pub mod server;

pub use error::HttpdError;
pub use lifecycle::{Httpd, ServerState};
