#![allow(dead_code)]

use devhttpd::config::HttpdConfig;
use devhttpd::device::MemoryDevice;
use devhttpd::lifecycle::Httpd;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::{Arc, Once};
use std::time::Duration;

static MAY_INIT: Once = Once::new();

/// Configure May coroutines once per test binary
pub fn setup_may_runtime() {
    MAY_INIT.call_once(|| {
        may::config().set_stack_size(0x8000);
    });
}

/// A local address nothing is listening on (yet).
pub fn free_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn test_config(addr: SocketAddr) -> HttpdConfig {
    HttpdConfig {
        bind_address: addr.to_string(),
        max_inflight_bodies: 4,
        ..HttpdConfig::default()
    }
}

/// Running server over a `MemoryDevice`, stopped on drop.
pub struct DeviceTestServer {
    pub device: Arc<MemoryDevice>,
    pub httpd: Httpd,
    addr: SocketAddr,
}

impl DeviceTestServer {
    pub fn start() -> Self {
        setup_may_runtime();
        let addr = free_addr();
        let device = Arc::new(MemoryDevice::new("relay=off"));
        let httpd = Httpd::for_device(test_config(addr), device.clone());
        httpd.start().unwrap();
        httpd.wait_ready().unwrap();
        Self {
            device,
            httpd,
            addr,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn get(&self, path: &str) -> HttpResponse {
        send_request(
            self.addr,
            format!("GET {path} HTTP/1.1\r\nHost: device\r\n\r\n").as_bytes(),
        )
    }

    pub fn post(&self, path: &str, body: &[u8]) -> HttpResponse {
        let mut raw = format!(
            "POST {path} HTTP/1.1\r\nHost: device\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: {}\r\n\r\n",
            body.len()
        )
        .into_bytes();
        raw.extend_from_slice(body);
        send_request(self.addr, &raw)
    }
}

impl Drop for DeviceTestServer {
    fn drop(&mut self) {
        let _ = self.httpd.stop();
    }
}

pub struct HttpResponse {
    pub raw: Vec<u8>,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }
}

pub fn send_request(addr: SocketAddr, req: &[u8]) -> HttpResponse {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(req).unwrap();
    stream
        .set_read_timeout(Some(Duration::from_millis(200)))
        .unwrap();
    let mut buf = Vec::new();
    loop {
        let mut tmp = [0u8; 1024];
        match stream.read(&mut tmp) {
            Ok(0) => break,
            Ok(n) => buf.extend_from_slice(&tmp[..n]),
            Err(ref e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                break
            }
            Err(_) => break,
        }
    }
    parse_response(buf)
}

pub fn parse_response(raw: Vec<u8>) -> HttpResponse {
    let split = raw.windows(4).position(|w| w == b"\r\n\r\n");
    let (head, body) = match split {
        Some(at) => (
            String::from_utf8_lossy(&raw[..at]).to_string(),
            raw[at + 4..].to_vec(),
        ),
        None => (String::from_utf8_lossy(&raw).to_string(), Vec::new()),
    };

    let mut lines = head.lines();
    let status = lines
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .unwrap_or(0);
    let headers = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(n, v)| (n.trim().to_string(), v.trim().to_string()))
        .collect();

    HttpResponse {
        raw,
        status,
        headers,
        body,
    }
}
