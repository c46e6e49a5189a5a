//! Device-side actions invoked by the HTTP handlers.

use crate::error::HttpdError;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError, RwLock};
use tracing::info;

/// Opaque device actions behind the configuration endpoints.
pub trait Device: Send + Sync {
    /// Current status string reported on the `GET` endpoints.
    fn read_current_status(&self) -> String;

    /// Replace the status with the raw value posted by a client.
    fn apply_status(&self, new_value: &str);

    /// Join a Wi-Fi network. Both values are raw octets as decoded from the
    /// form; neither has to be UTF-8.
    ///
    /// # Errors
    ///
    /// The device refused or failed to start the join.
    fn join_network(&self, ssid: &[u8], key: &[u8]) -> Result<(), HttpdError>;
}

/// Credentials of one join attempt. `Debug` never prints the key.
#[derive(Clone, PartialEq, Eq)]
pub struct NetworkCredentials {
    pub ssid: Vec<u8>,
    pub key: Vec<u8>,
}

impl fmt::Debug for NetworkCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkCredentials")
            .field("ssid", &String::from_utf8_lossy(&self.ssid))
            .field("key", &"<redacted>")
            .finish()
    }
}

/// In-process device: keeps the status in memory and remembers the most
/// recent join attempt only.
#[derive(Debug)]
pub struct MemoryDevice {
    status: RwLock<String>,
    last_join: Mutex<Option<NetworkCredentials>>,
    join_count: AtomicUsize,
}

impl MemoryDevice {
    pub fn new(initial_status: impl Into<String>) -> Self {
        Self {
            status: RwLock::new(initial_status.into()),
            last_join: Mutex::new(None),
            join_count: AtomicUsize::new(0),
        }
    }

    /// Number of join attempts so far.
    #[must_use]
    pub fn join_count(&self) -> usize {
        self.join_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn last_join(&self) -> Option<NetworkCredentials> {
        self.last_join
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for MemoryDevice {
    fn default() -> Self {
        Self::new("off")
    }
}

impl Device for MemoryDevice {
    fn read_current_status(&self) -> String {
        self.status
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn apply_status(&self, new_value: &str) {
        let mut status = self.status.write().unwrap_or_else(PoisonError::into_inner);
        *status = new_value.to_owned();
        info!(status = %new_value, "Device status applied");
    }

    fn join_network(&self, ssid: &[u8], key: &[u8]) -> Result<(), HttpdError> {
        info!(
            ssid = %String::from_utf8_lossy(ssid),
            key_len = key.len(),
            "Joining Wi-Fi network"
        );
        *self.last_join.lock().unwrap_or_else(PoisonError::into_inner) = Some(NetworkCredentials {
            ssid: ssid.to_vec(),
            key: key.to_vec(),
        });
        self.join_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips() {
        let device = MemoryDevice::default();
        assert_eq!(device.read_current_status(), "off");
        device.apply_status("on");
        assert_eq!(device.read_current_status(), "on");
    }

    #[test]
    fn test_only_last_join_is_kept() {
        let device = MemoryDevice::default();
        assert!(device.last_join().is_none());
        device.join_network(b"MyWifi", b"hunter2").unwrap();
        device.join_network(b"Other", b"pw").unwrap();
        assert_eq!(device.join_count(), 2);
        let last = device.last_join().unwrap();
        assert_eq!(last.ssid, b"Other");
        assert_eq!(last.key, b"pw");
    }

    #[test]
    fn test_join_accepts_non_utf8_ssid() {
        let device = MemoryDevice::default();
        device.join_network(&[0xFF, 0x41], b"k").unwrap();
        assert_eq!(device.last_join().unwrap().ssid, [0xFF, 0x41]);
    }

    #[test]
    fn test_credentials_debug_hides_key() {
        let creds = NetworkCredentials {
            ssid: b"MyWifi".to_vec(),
            key: b"hunter2".to_vec(),
        };
        let text = format!("{creds:?}");
        assert!(text.contains("MyWifi"));
        assert!(!text.contains("hunter2"));
    }
}
