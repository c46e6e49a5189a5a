use crate::error::HttpdError;
use std::borrow::Cow;
use std::io::{self, Read};
use std::str::Utf8Error;
use tracing::debug;

/// Largest request body a configuration handler accepts.
pub const BODY_CAPACITY: usize = 512;
/// Largest Wi-Fi SSID accepted by `/wifi/config`.
pub const SSID_CAPACITY: usize = 32;
/// Largest Wi-Fi key accepted by `/wifi/config`.
pub const KEY_CAPACITY: usize = 64;

/// Extract a single URL-encoded field from `body` into `out`.
///
/// Pairs are scanned left to right and the first key that equals
/// `field_name` (case-sensitive, after decoding) wins. `%XX` escapes and `+`
/// are decoded to raw bytes, so a value need not be UTF-8. Malformed escapes
/// are kept literally. The scan never looks past `body.len()`, so a body
/// without a trailing delimiter is fine.
///
/// # Returns
///
/// The number of decoded bytes written to the front of `out`.
///
/// # Errors
///
/// * [`HttpdError::FieldNotFound`] - no pair has the requested key
/// * [`HttpdError::BufferTooSmall`] - the decoded value is longer than
///   `out`; `out` is left untouched
pub fn extract_field(body: &[u8], field_name: &str, out: &mut [u8]) -> Result<usize, HttpdError> {
    let value = body
        .split(|b| *b == b'&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let mut parts = pair.splitn(2, |b| *b == b'=');
            let key = parts.next().unwrap_or_default();
            let value = parts.next().unwrap_or_default();
            (key, value)
        })
        .find(|(key, _)| &*decode_component(key) == field_name.as_bytes())
        .map(|(_, value)| decode_component(value))
        .ok_or_else(|| HttpdError::FieldNotFound {
            field: field_name.to_string(),
        })?;

    if value.len() > out.len() {
        debug!(
            field = field_name,
            needed = value.len(),
            capacity = out.len(),
            "Form field exceeds destination buffer"
        );
        return Err(HttpdError::BufferTooSmall {
            needed: value.len(),
            capacity: out.len(),
        });
    }

    out[..value.len()].copy_from_slice(&value);
    Ok(value.len())
}

/// `+` to space, then `%XX` to the raw byte.
fn decode_component(raw: &[u8]) -> Cow<'_, [u8]> {
    if !raw.contains(&b'+') {
        return urlencoding::decode_binary(raw);
    }
    let spaced: Vec<u8> = raw
        .iter()
        .map(|&b| if b == b'+' { b' ' } else { b })
        .collect();
    Cow::Owned(urlencoding::decode_binary(&spaced).into_owned())
}

/// Fixed-capacity, stack-allocated destination for one decoded form field.
#[derive(Clone)]
pub struct FieldBuf<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> FieldBuf<N> {
    /// Capacity of this buffer in bytes
    pub const CAPACITY: usize = N;

    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: [0; N],
            len: 0,
        }
    }

    /// Decode `field_name` from `body` into this buffer.
    ///
    /// On error the previous contents are kept as they were.
    pub fn fill_from(&mut self, body: &[u8], field_name: &str) -> Result<usize, HttpdError> {
        let written = extract_field(body, field_name, &mut self.bytes)?;
        self.len = written;
        Ok(written)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Decoded value as text.
    ///
    /// # Errors
    ///
    /// The value is not valid UTF-8 (SSIDs and keys are arbitrary octets).
    pub fn as_str(&self) -> Result<&str, Utf8Error> {
        std::str::from_utf8(self.as_bytes())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<const N: usize> Default for FieldBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> std::fmt::Debug for FieldBuf<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldBuf")
            .field("capacity", &N)
            .field("len", &self.len)
            .finish()
    }
}

/// Fixed-capacity buffer holding a raw request body.
pub struct BodyBuf<const N: usize> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> BodyBuf<N> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            bytes: [0; N],
            len: 0,
        }
    }

    /// Read the whole body from `reader`.
    ///
    /// # Errors
    ///
    /// * [`HttpdError::BufferTooSmall`] - the body holds more than `N` bytes.
    ///   `needed` is a lower bound (`N + 1`); the rest of the body is not read.
    /// * [`HttpdError::BodyRead`] - the transport failed
    pub fn read_from<R: Read + ?Sized>(&mut self, reader: &mut R) -> Result<&[u8], HttpdError> {
        self.len = 0;
        while self.len < N {
            match reader.read(&mut self.bytes[self.len..]) {
                Ok(0) => return Ok(self.as_bytes()),
                Ok(n) => self.len += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HttpdError::BodyRead(e)),
            }
        }

        let mut overflow = [0u8; 1];
        loop {
            match reader.read(&mut overflow) {
                Ok(0) => return Ok(self.as_bytes()),
                Ok(_) => {
                    return Err(HttpdError::BufferTooSmall {
                        needed: N + 1,
                        capacity: N,
                    })
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(HttpdError::BodyRead(e)),
            }
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Forget the current contents so the buffer can be reused.
    pub fn clear(&mut self) {
        self.bytes[..self.len].fill(0);
        self.len = 0;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<const N: usize> Default for BodyBuf<N> {
    fn default() -> Self {
        Self::new()
    }
}
