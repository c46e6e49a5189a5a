//! Response header synthesis and the header-then-body write sequence.

use super::connection::Connection;
use crate::error::HttpdError;
use http::StatusCode;
use smallvec::SmallVec;
use std::ops::{BitOr, BitOrAssign};
use tracing::{debug, warn};

/// Value of the `Server` header.
pub const SERVER_NAME: &str = concat!("devhttpd/", env!("CARGO_PKG_VERSION"));
/// Identification line used where the transport owns the `Server` header.
pub const POWERED_BY_HEADER: &str = concat!("X-Powered-By: devhttpd/", env!("CARGO_PKG_VERSION"));

/// Build a [`ContentType`] whose header lines are `&'static str`.
///
/// ```rust
/// use devhttpd::content_type;
///
/// let svg = content_type!("image/svg+xml");
/// assert_eq!(svg.media_type(), "image/svg+xml");
/// let packed = content_type!("application/javascript", "gzip");
/// assert_eq!(packed.encoding(), Some("gzip"));
/// ```
#[macro_export]
macro_rules! content_type {
    ($media:literal) => {
        $crate::server::ContentType::from_static_lines(
            $media,
            concat!("Content-Type: ", $media),
            None,
        )
    };
    ($media:literal, $encoding:literal) => {
        $crate::server::ContentType::from_static_lines(
            $media,
            concat!("Content-Type: ", $media),
            Some(($encoding, concat!("Content-Encoding: ", $encoding))),
        )
    };
}

/// Media type plus an optional content encoding for pre-compressed bodies.
///
/// When an encoding is present the body bytes are already encoded; writers
/// emit both headers verbatim and never touch the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentType {
    media_type: &'static str,
    type_line: &'static str,
    encoding: Option<(&'static str, &'static str)>,
}

impl ContentType {
    /// Use the [`content_type!`] macro instead.
    #[doc(hidden)]
    #[must_use]
    pub const fn from_static_lines(
        media_type: &'static str,
        type_line: &'static str,
        encoding: Option<(&'static str, &'static str)>,
    ) -> Self {
        Self {
            media_type,
            type_line,
            encoding,
        }
    }

    #[must_use]
    pub const fn media_type(&self) -> &'static str {
        self.media_type
    }

    #[must_use]
    pub fn encoding(&self) -> Option<&'static str> {
        self.encoding.map(|(name, _)| name)
    }

    /// `Content-Type: <media type>`
    #[must_use]
    pub const fn type_header(&self) -> &'static str {
        self.type_line
    }

    /// `Content-Encoding: <encoding>` when the body is pre-encoded
    #[must_use]
    pub fn encoding_header(&self) -> Option<&'static str> {
        self.encoding.map(|(_, line)| line)
    }
}

pub const TEXT_HTML: ContentType = content_type!("text/html");
pub const TEXT_HTML_GZIP: ContentType = content_type!("text/html", "gzip");
pub const TEXT_PLAIN: ContentType = content_type!("text/plain");
pub const APPLICATION_JSON: ContentType = content_type!("application/json");

/// Optional response headers, combinable with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct HeaderFlags(u8);

impl HeaderFlags {
    pub const NONE: HeaderFlags = HeaderFlags(0);
    /// `Server: devhttpd/<version>`.
    ///
    /// Behind `may_minihttp` the runtime always sends its own `Server` line;
    /// this flag then adds `X-Powered-By: devhttpd/<version>` instead.
    pub const ADD_SERVER: HeaderFlags = HeaderFlags(1);
    /// `Connection: close`
    pub const ADD_CONN_CLOSE: HeaderFlags = HeaderFlags(1 << 1);
    /// `Pragma: no-cache` and `Cache-Control: no-cache`
    pub const ADD_PRAGMA_NO_CACHE: HeaderFlags = HeaderFlags(1 << 2);
    /// What every device route uses
    pub const DEFAULT: HeaderFlags =
        HeaderFlags(Self::ADD_SERVER.0 | Self::ADD_CONN_CLOSE.0 | Self::ADD_PRAGMA_NO_CACHE.0);

    #[must_use]
    pub const fn contains(self, other: HeaderFlags) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }
}

impl BitOr for HeaderFlags {
    type Output = HeaderFlags;

    fn bitor(self, rhs: HeaderFlags) -> HeaderFlags {
        HeaderFlags(self.0 | rhs.0)
    }
}

impl BitOrAssign for HeaderFlags {
    fn bitor_assign(&mut self, rhs: HeaderFlags) {
        self.0 |= rhs.0;
    }
}

/// Extra header lines beyond the ones selected by [`HeaderFlags`].
pub type ExtraHeaders = SmallVec<[&'static str; 2]>;

/// Everything needed to emit one header block. Built per request.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub content_length: usize,
    pub content_type: ContentType,
    pub flags: HeaderFlags,
    /// Full header lines such as `Allow: GET, POST`
    pub extra_headers: ExtraHeaders,
}

impl ResponseHead {
    #[must_use]
    pub fn new(
        status: StatusCode,
        content_length: usize,
        content_type: ContentType,
        flags: HeaderFlags,
    ) -> Self {
        Self {
            status,
            content_length,
            content_type,
            flags,
            extra_headers: ExtraHeaders::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, line: &'static str) -> Self {
        self.extra_headers.push(line);
        self
    }

    /// Serialise the header block, terminating blank line included.
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = String::with_capacity(192);
        out.push_str("HTTP/1.1 ");
        out.push_str(self.status.as_str());
        out.push(' ');
        out.push_str(status_reason(self.status));
        out.push_str("\r\n");
        if self.flags.contains(HeaderFlags::ADD_SERVER) {
            out.push_str("Server: ");
            out.push_str(SERVER_NAME);
            out.push_str("\r\n");
        }
        out.push_str(self.content_type.type_header());
        out.push_str("\r\n");
        if let Some(line) = self.content_type.encoding_header() {
            out.push_str(line);
            out.push_str("\r\n");
        }
        out.push_str("Content-Length: ");
        out.push_str(&self.content_length.to_string());
        out.push_str("\r\n");
        for line in connection_header_lines(self.flags) {
            out.push_str(line);
            out.push_str("\r\n");
        }
        for line in &self.extra_headers {
            out.push_str(line);
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        out.into_bytes()
    }
}

/// Header lines selected by the connection and caching flags.
pub(crate) fn connection_header_lines(flags: HeaderFlags) -> impl Iterator<Item = &'static str> {
    let close = flags
        .contains(HeaderFlags::ADD_CONN_CLOSE)
        .then_some("Connection: close");
    let no_cache = flags
        .contains(HeaderFlags::ADD_PRAGMA_NO_CACHE)
        .then_some(["Pragma: no-cache", "Cache-Control: no-cache"]);
    close
        .into_iter()
        .chain(no_cache.into_iter().flatten())
}

pub(crate) fn status_reason(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("Unknown")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    Idle,
    HeadersSent,
    Complete,
    Broken,
}

/// Writes one response onto a connection: header block first, then exactly
/// `content_length` body bytes.
///
/// After any failed write the writer refuses every further write on the
/// connection.
pub struct ResponseWriter<'c> {
    conn: &'c mut dyn Connection,
    state: WriterState,
    status: Option<StatusCode>,
    declared: usize,
    sent: usize,
}

impl<'c> ResponseWriter<'c> {
    pub fn new(conn: &'c mut dyn Connection) -> Self {
        Self {
            conn,
            state: WriterState::Idle,
            status: None,
            declared: 0,
            sent: 0,
        }
    }

    /// Emit the header block.
    pub fn send_headers(
        &mut self,
        status: StatusCode,
        content_length: usize,
        content_type: ContentType,
        flags: HeaderFlags,
    ) -> Result<(), HttpdError> {
        self.send_head(ResponseHead::new(status, content_length, content_type, flags))
    }

    /// Emit a header block carrying extra header lines.
    pub fn send_head(&mut self, head: ResponseHead) -> Result<(), HttpdError> {
        match self.state {
            WriterState::Idle => {}
            WriterState::Broken => {
                return Err(HttpdError::ProtocolViolation(
                    "write attempted after a failed send",
                ))
            }
            WriterState::HeadersSent | WriterState::Complete => {
                return Err(HttpdError::ProtocolViolation("headers already sent"))
            }
        }

        if let Err(e) = self.conn.write_head(&head) {
            warn!(status = head.status.as_u16(), error = %e, "Unable to send response headers");
            self.state = WriterState::Broken;
            return Err(HttpdError::TransportWriteError(e));
        }

        debug!(
            status = head.status.as_u16(),
            content_length = head.content_length,
            content_type = head.content_type.media_type(),
            content_encoding = head.content_type.encoding(),
            "Response headers sent"
        );
        self.status = Some(head.status);
        self.declared = head.content_length;
        self.state = if head.content_length == 0 {
            WriterState::Complete
        } else {
            WriterState::HeadersSent
        };
        Ok(())
    }

    /// Emit body bytes. May be called several times until the declared
    /// content length is reached.
    pub fn send_body(&mut self, bytes: &[u8]) -> Result<(), HttpdError> {
        match self.state {
            WriterState::Idle => {
                return Err(HttpdError::ProtocolViolation("body written before headers"))
            }
            WriterState::Broken => {
                return Err(HttpdError::ProtocolViolation(
                    "write attempted after a failed send",
                ))
            }
            WriterState::HeadersSent | WriterState::Complete => {}
        }

        if self.sent + bytes.len() > self.declared {
            self.state = WriterState::Broken;
            return Err(HttpdError::ProtocolViolation(
                "body exceeds declared content length",
            ));
        }
        if bytes.is_empty() {
            return Ok(());
        }

        if let Err(e) = self.conn.write_body(bytes) {
            warn!(sent = self.sent, error = %e, "Unable to send response body");
            self.state = WriterState::Broken;
            return Err(HttpdError::TransportWriteError(e));
        }
        self.sent += bytes.len();
        if self.sent == self.declared {
            self.state = WriterState::Complete;
        }
        Ok(())
    }

    /// Headers and the whole body in one go.
    pub fn send_response(
        &mut self,
        status: StatusCode,
        content_type: ContentType,
        flags: HeaderFlags,
        body: &[u8],
    ) -> Result<(), HttpdError> {
        self.send_headers(status, body.len(), content_type, flags)?;
        self.send_body(body)
    }

    /// True once any header write was attempted, successful or not.
    #[must_use]
    pub fn response_started(&self) -> bool {
        self.state != WriterState::Idle
    }

    /// True when headers and the full declared body went out.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == WriterState::Complete
    }

    /// True after a failed or rejected write.
    #[must_use]
    pub fn is_broken(&self) -> bool {
        self.state == WriterState::Broken
    }

    /// Status of the header block sent, if any.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    #[must_use]
    pub fn body_bytes_sent(&self) -> usize {
        self.sent
    }
}
