//! Server start/stop.
//!
//! ```text
//! Uninitialized --start--> Registered --> Running --stop--> Stopped
//!                                            ^                 |
//!                                            +------start------+
//! ```
//!
//! Routes are registered on the first `start` only. Repeated `start` while
//! running and `stop` while not running are no-ops.

use crate::config::HttpdConfig;
use crate::device::Device;
use crate::error::HttpdError;
use crate::form::BufferPool;
use crate::handlers::app_routes;
use crate::router::{Route, RouteTable, RouteTableBuilder};
use crate::server::{AppService, ServerHandle};
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Uninitialized,
    Registered,
    Running,
    Stopped,
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ServerState::Uninitialized => "uninitialized",
            ServerState::Registered => "registered",
            ServerState::Running => "running",
            ServerState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

struct Inner {
    state: ServerState,
    pending: Vec<Route>,
    table: Option<RouteTable>,
    handle: Option<ServerHandle>,
}

/// The device HTTP server: owns the route set and the runtime handle.
pub struct Httpd {
    config: HttpdConfig,
    inner: Mutex<Inner>,
}

impl Httpd {
    /// Server for an explicit route set. Nothing is registered or bound yet.
    pub fn new(config: HttpdConfig, routes: Vec<Route>) -> Self {
        Self {
            config,
            inner: Mutex::new(Inner {
                state: ServerState::Uninitialized,
                pending: routes,
                table: None,
                handle: None,
            }),
        }
    }

    /// Server exposing the application routes for `device`.
    pub fn for_device(config: HttpdConfig, device: Arc<dyn Device>) -> Self {
        let pool = Arc::new(BufferPool::new(config.max_inflight_bodies));
        let routes = app_routes(device, pool);
        Self::new(config, routes)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn state(&self) -> ServerState {
        self.lock().state
    }

    #[must_use]
    pub fn config(&self) -> &HttpdConfig {
        &self.config
    }

    /// The frozen route table, once registered.
    #[must_use]
    pub fn routes(&self) -> Option<RouteTable> {
        self.lock().table.clone()
    }

    /// Address the runtime is listening on, while running.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.lock().handle.as_ref().map(ServerHandle::addr)
    }

    /// Register routes (first call only) and start accepting connections.
    ///
    /// # Errors
    ///
    /// [`HttpdError::Startup`] when the listen address cannot be resolved or
    /// bound. The server stays stopped and `start` may be retried.
    pub fn start(&self) -> Result<(), HttpdError> {
        let mut inner = self.lock();
        if inner.state == ServerState::Running {
            debug!("Server already running");
            return Ok(());
        }

        let table = if let Some(table) = inner.table.clone() {
            table
        } else {
            let table = register(std::mem::take(&mut inner.pending));
            inner.table = Some(table.clone());
            inner.state = ServerState::Registered;
            may::config().set_stack_size(self.config.stack_size);
            table
        };

        let service = AppService::new(table);
        let handle = ServerHandle::bind(service, &self.config.bind_address).map_err(|e| {
            error!(addr = %self.config.bind_address, error = %e, "Failed to start server");
            HttpdError::Startup(e)
        })?;

        info!(
            addr = %handle.addr(),
            stack_size = self.config.stack_size,
            "Server started"
        );
        inner.handle = Some(handle);
        inner.state = ServerState::Running;
        Ok(())
    }

    /// Stop accepting connections. A no-op unless running.
    pub fn stop(&self) -> Result<(), HttpdError> {
        let mut inner = self.lock();
        if inner.state != ServerState::Running {
            debug!(state = %inner.state, "Server not running");
            return Ok(());
        }
        if let Some(handle) = inner.handle.take() {
            handle.stop();
        }
        inner.state = ServerState::Stopped;
        info!("Server stopped");
        Ok(())
    }

    /// Block until the listener accepts connections.
    ///
    /// # Errors
    ///
    /// `NotConnected` when the server is not running, `TimedOut` when the
    /// listener does not come up.
    pub fn wait_ready(&self) -> io::Result<()> {
        match self.lock().handle.as_ref() {
            Some(handle) => handle.wait_ready(),
            None => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "server not running",
            )),
        }
    }

    /// Block until SIGINT or SIGTERM.
    #[cfg(unix)]
    pub fn wait_for_shutdown_signal(&self) -> io::Result<()> {
        use signal_hook::consts::{SIGINT, SIGTERM};
        use signal_hook::iterator::Signals;

        let mut signals = Signals::new([SIGINT, SIGTERM])?;
        if let Some(signal) = signals.forever().next() {
            info!(signal, "Shutdown signal received");
        }
        Ok(())
    }

    /// Block until the server coroutine ends.
    #[cfg(not(unix))]
    pub fn wait_for_shutdown_signal(&self) -> io::Result<()> {
        let handle = self.lock().handle.take();
        if let Some(handle) = handle {
            self.lock().state = ServerState::Stopped;
            handle
                .join()
                .map_err(|_| io::Error::other("server coroutine panicked"))?;
        }
        Ok(())
    }
}

impl Drop for Httpd {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            warn!(error = %e, "Failed to stop server on drop");
        }
    }
}

/// Build the table, keeping the first route for each path.
fn register(routes: Vec<Route>) -> RouteTable {
    let mut builder = RouteTableBuilder::new();
    for route in routes {
        if let Err(e) = builder.register(route) {
            warn!(error = %e, "Route not registered");
        }
    }
    builder.build()
}
