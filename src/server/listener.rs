use super::service::AppService;
use may::coroutine::JoinHandle;
use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;
use tracing::debug;

const READY_POLLS: u32 = 50;
const READY_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// A bound listener and the coroutine accepting on it.
pub struct ServerHandle {
    addr: SocketAddr,
    accept: JoinHandle<()>,
}

impl ServerHandle {
    /// Resolve `addr`, bind it and serve `service` on every connection.
    ///
    /// # Errors
    ///
    /// The address does not resolve or the port cannot be bound.
    pub fn bind(service: AppService, addr: &str) -> io::Result<Self> {
        let addr = addr.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "address resolved to nothing")
        })?;
        let accept = may_minihttp::HttpServer(service).start(addr)?;
        debug!(%addr, "Listener bound");
        Ok(Self { addr, accept })
    }

    /// Block until a TCP connect to the listener succeeds.
    ///
    /// # Errors
    ///
    /// `TimedOut` when the listener is still refusing after the last poll.
    pub fn wait_ready(&self) -> io::Result<()> {
        for _ in 0..READY_POLLS {
            if TcpStream::connect(self.addr).is_ok() {
                return Ok(());
            }
            thread::sleep(READY_POLL_INTERVAL);
        }
        Err(io::Error::new(io::ErrorKind::TimedOut, "listener not ready"))
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Cancel the accept coroutine and wait for it.
    #[allow(unsafe_code)]
    pub fn stop(self) {
        // SAFETY: the accept loop owns nothing but its listener, which is
        // released when the cancelled coroutine unwinds.
        unsafe {
            self.accept.coroutine().cancel();
        }
        // Cancellation surfaces as a panic payload on join.
        drop(self.accept.join());
    }

    /// Block until the accept coroutine ends on its own.
    ///
    /// # Errors
    ///
    /// The accept coroutine panicked.
    pub fn join(self) -> thread::Result<()> {
        self.accept.join()
    }
}
