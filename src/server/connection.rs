use super::response::{
    connection_header_lines, status_reason, HeaderFlags, ResponseHead, POWERED_BY_HEADER,
};
use std::io::{self, Write};

/// Byte sink for one HTTP exchange.
///
/// [`ResponseWriter`](super::ResponseWriter) guarantees the call order:
/// one `write_head`, then body chunks. Implementations only move bytes.
pub trait Connection {
    /// Write the complete header block.
    fn write_head(&mut self, head: &ResponseHead) -> io::Result<()>;

    /// Write body bytes following the header block.
    fn write_body(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// Writes raw HTTP/1.1 onto any [`Write`] implementor (socket, buffer, ...).
pub struct RawConnection<W: Write> {
    inner: W,
}

impl<W: Write> RawConnection<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

impl<W: Write> Connection for RawConnection<W> {
    fn write_head(&mut self, head: &ResponseHead) -> io::Result<()> {
        self.inner.write_all(&head.to_bytes())?;
        self.inner.flush()
    }

    fn write_body(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes)?;
        self.inner.flush()
    }
}

/// Stages a response into a `may_minihttp` [`Response`](may_minihttp::Response).
///
/// The runtime serialises the staged response after the service returns and
/// always adds its own `Server`, `Date` and `Content-Length` lines, so the
/// `Server` flag becomes an `X-Powered-By` line here. Body chunks are collected and handed
/// over in [`MiniHttpConnection::finish`].
pub struct MiniHttpConnection<'r, 'b> {
    res: &'r mut may_minihttp::Response<'b>,
    body: Vec<u8>,
}

impl<'r, 'b> MiniHttpConnection<'r, 'b> {
    pub fn new(res: &'r mut may_minihttp::Response<'b>) -> Self {
        Self {
            res,
            body: Vec::new(),
        }
    }

    /// Move the collected body into the runtime response.
    pub fn finish(self) {
        self.res.body_vec(self.body);
    }
}

impl Connection for MiniHttpConnection<'_, '_> {
    fn write_head(&mut self, head: &ResponseHead) -> io::Result<()> {
        self.res
            .status_code(usize::from(head.status.as_u16()), status_reason(head.status));
        if head.flags.contains(HeaderFlags::ADD_SERVER) {
            self.res.header(POWERED_BY_HEADER);
        }
        self.res.header(head.content_type.type_header());
        if let Some(line) = head.content_type.encoding_header() {
            self.res.header(line);
        }
        for line in connection_header_lines(head.flags) {
            self.res.header(line);
        }
        for &line in &head.extra_headers {
            self.res.header(line);
        }
        self.body.reserve_exact(head.content_length);
        Ok(())
    }

    fn write_body(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.body.extend_from_slice(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::response::TEXT_PLAIN;
    use http::StatusCode;

    #[test]
    fn test_raw_connection_writes_head_and_body() {
        let mut conn = RawConnection::new(Vec::new());
        let head = ResponseHead::new(StatusCode::OK, 2, TEXT_PLAIN, HeaderFlags::NONE);
        conn.write_head(&head).unwrap();
        conn.write_body(b"OK").unwrap();
        assert_eq!(
            conn.get_ref().as_slice(),
            b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 2\r\n\r\nOK"
        );
    }
}
