use crate::error::HttpdError;
use crate::router::RouteTable;
use crate::server::{Connection, HeaderFlags, ResponseHead, ResponseWriter, TEXT_PLAIN};
use http::{Method, StatusCode};
use std::fmt;
use std::io::Read;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, error, field, info, info_span, warn};

/// Request identifier backed by a ULID, carried on the dispatch span.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub struct RequestId(ulid::Ulid);

impl RequestId {
    #[must_use]
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RequestId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ulid::Ulid::from_string(s).map(RequestId)
    }
}

/// A parsed request as handed over by the transport.
///
/// The body is exposed as a reader so handlers decide how much of it to pull
/// into their own bounded buffers.
pub struct Request<'a> {
    method: Method,
    path: &'a str,
    body: &'a mut dyn Read,
    request_id: RequestId,
}

impl<'a> Request<'a> {
    pub fn new(method: Method, path: &'a str, body: &'a mut dyn Read) -> Self {
        Self {
            method,
            path,
            body,
            request_id: RequestId::new(),
        }
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        self.path
    }

    /// Remaining request body bytes.
    pub fn body(&mut self) -> &mut dyn Read {
        &mut *self.body
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }
}

impl fmt::Debug for Request<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("request_id", &self.request_id)
            .finish_non_exhaustive()
    }
}

/// Stage of a single dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Received,
    Routed,
    HandlerRunning,
    Completed,
    Failed,
}

/// How a dispatch ended.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// A complete response went out.
    Completed {
        status: StatusCode,
        /// `false` for the `404`/`405` replies synthesised by the dispatcher.
        handled: bool,
    },
    /// The handler failed, or returned without finishing its response.
    Failed {
        error: HttpdError,
        /// Some header write was attempted before the failure.
        response_started: bool,
        /// A full response (typically a best-effort error reply) was sent
        /// before the failure was reported.
        response_complete: bool,
    },
}

impl DispatchOutcome {
    #[must_use]
    pub fn state(&self) -> DispatchState {
        match self {
            DispatchOutcome::Completed { .. } => DispatchState::Completed,
            DispatchOutcome::Failed { .. } => DispatchState::Failed,
        }
    }

    /// True when the peer received a complete response and the connection
    /// may be kept.
    #[must_use]
    pub fn response_delivered(&self) -> bool {
        match self {
            DispatchOutcome::Completed { .. } => true,
            DispatchOutcome::Failed {
                response_complete, ..
            } => *response_complete,
        }
    }
}

/// Routes requests to their handlers. Cheap to clone; every clone shares the
/// same read-only route table.
#[derive(Clone)]
pub struct Dispatcher {
    routes: RouteTable,
}

impl Dispatcher {
    #[must_use]
    pub fn new(routes: RouteTable) -> Self {
        Self { routes }
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Dispatch one request over `conn`.
    ///
    /// Never synthesises a fallback response once a handler has run: a
    /// handler error is logged and returned in [`DispatchOutcome::Failed`].
    pub fn dispatch(&self, req: &mut Request<'_>, conn: &mut dyn Connection) -> DispatchOutcome {
        let span = info_span!(
            "dispatch",
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            status = field::Empty,
            latency_ms = field::Empty,
        );
        span.in_scope(|| {
            let started = Instant::now();
            let outcome = self.run(req, conn);
            let latency_ms = started.elapsed().as_millis() as u64;
            span.record("latency_ms", latency_ms);
            match &outcome {
                DispatchOutcome::Completed { status, .. } => {
                    span.record("status", status.as_u16());
                    info!(status = status.as_u16(), latency_ms, "Request completed");
                }
                DispatchOutcome::Failed {
                    error,
                    response_started,
                    response_complete,
                } => {
                    error!(
                        error = %error,
                        response_started,
                        response_complete,
                        latency_ms,
                        "Request failed"
                    );
                }
            }
            outcome
        })
    }

    fn run(&self, req: &mut Request<'_>, conn: &mut dyn Connection) -> DispatchOutcome {
        let mut state = DispatchState::Received;

        let matched = match self.routes.find(req.path, &req.method) {
            Ok(matched) => matched,
            Err(e) => return self.reject(req.path, e, conn),
        };
        transition(&mut state, DispatchState::Routed);

        let mut res = ResponseWriter::new(conn);
        transition(&mut state, DispatchState::HandlerRunning);
        let result = (matched.handler)(req, &mut res);

        let error = match result {
            Ok(()) if res.is_complete() => {
                transition(&mut state, DispatchState::Completed);
                return DispatchOutcome::Completed {
                    status: res.status().unwrap_or(StatusCode::OK),
                    handled: true,
                };
            }
            Ok(()) => {
                HttpdError::ProtocolViolation("handler returned without completing the response")
            }
            Err(e) => e,
        };
        transition(&mut state, DispatchState::Failed);
        DispatchOutcome::Failed {
            error,
            response_started: res.response_started(),
            response_complete: res.is_complete(),
        }
    }

    /// Answer a lookup miss with its standard status.
    fn reject(&self, path: &str, e: HttpdError, conn: &mut dyn Connection) -> DispatchOutcome {
        let status = e.status();
        let mut head = ResponseHead::new(
            status,
            status_body(status).len(),
            TEXT_PLAIN,
            HeaderFlags::DEFAULT,
        );
        if matches!(e, HttpdError::MethodNotAllowed) {
            if let Some(allow) = self.routes.allow_header(path) {
                head = head.with_header(allow);
            }
        }

        let mut res = ResponseWriter::new(conn);
        let sent = res
            .send_head(head)
            .and_then(|()| res.send_body(status_body(status)));
        match sent {
            Ok(()) => {
                debug!(status = status.as_u16(), reason = %e, "Lookup miss answered");
                DispatchOutcome::Completed {
                    status,
                    handled: false,
                }
            }
            Err(write_err) => {
                warn!(status = status.as_u16(), error = %write_err, "Unable to answer lookup miss");
                DispatchOutcome::Failed {
                    error: write_err,
                    response_started: res.response_started(),
                    response_complete: false,
                }
            }
        }
    }
}

fn status_body(status: StatusCode) -> &'static [u8] {
    status
        .canonical_reason()
        .map_or(b"Error".as_slice(), str::as_bytes)
}

fn transition(state: &mut DispatchState, next: DispatchState) {
    debug!(from = ?*state, to = ?next, "Dispatch state");
    *state = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::{Route, RouteTableBuilder};
    use crate::server::RawConnection;
    use std::io;

    fn dispatcher() -> Dispatcher {
        let mut builder = RouteTableBuilder::new();
        builder
            .register_all(vec![
                Route::new("/ok", HeaderFlags::NONE).get(|_req, res| {
                    res.send_response(StatusCode::OK, TEXT_PLAIN, HeaderFlags::NONE, b"fine")
                }),
                Route::new("/echo", HeaderFlags::NONE).post(|req, res| {
                    let mut body = Vec::new();
                    req.body()
                        .read_to_end(&mut body)
                        .map_err(HttpdError::BodyRead)?;
                    res.send_response(StatusCode::OK, TEXT_PLAIN, HeaderFlags::NONE, &body)
                }),
                Route::new("/fails", HeaderFlags::NONE).get(|_req, _res| {
                    Err(HttpdError::FieldNotFound {
                        field: "ssid".into(),
                    })
                }),
                Route::new("/half", HeaderFlags::NONE).get(|_req, res| {
                    res.send_headers(StatusCode::OK, 10, TEXT_PLAIN, HeaderFlags::NONE)?;
                    res.send_body(b"abc")
                }),
                Route::new("/best-effort", HeaderFlags::NONE).get(|_req, res| {
                    res.send_response(
                        StatusCode::BAD_REQUEST,
                        TEXT_PLAIN,
                        HeaderFlags::NONE,
                        b"bad",
                    )?;
                    Err(HttpdError::FieldNotFound { field: "key".into() })
                }),
            ])
            .unwrap();
        Dispatcher::new(builder.build())
    }

    fn run(method: Method, path: &str, body: &[u8]) -> (DispatchOutcome, String) {
        let mut body = body;
        let mut req = Request::new(method, path, &mut body);
        let mut conn = RawConnection::new(Vec::new());
        let outcome = dispatcher().dispatch(&mut req, &mut conn);
        (outcome, String::from_utf8(conn.into_inner()).unwrap())
    }

    #[test]
    fn test_completed_dispatch() {
        let (outcome, wire) = run(Method::GET, "/ok", b"");
        assert!(matches!(
            outcome,
            DispatchOutcome::Completed { status, handled: true } if status == StatusCode::OK
        ));
        assert_eq!(outcome.state(), DispatchState::Completed);
        assert!(wire.ends_with("\r\n\r\nfine"));
    }

    #[test]
    fn test_handler_reads_body() {
        let (outcome, wire) = run(Method::POST, "/echo", b"ssid=a&key=b");
        assert!(outcome.response_delivered());
        assert!(wire.ends_with("\r\n\r\nssid=a&key=b"));
    }

    #[test]
    fn test_unknown_path_answers_404_without_handler() {
        let (outcome, wire) = run(Method::GET, "/nowhere", b"");
        assert!(matches!(
            outcome,
            DispatchOutcome::Completed { status, handled: false } if status == StatusCode::NOT_FOUND
        ));
        assert!(wire.starts_with("HTTP/1.1 404 Not Found\r\n"));
        assert!(wire.contains("Connection: close\r\n"));
        assert!(wire.ends_with("\r\n\r\nNot Found"));
    }

    #[test]
    fn test_wrong_method_answers_405_with_allow() {
        let (outcome, wire) = run(Method::DELETE, "/echo", b"");
        assert!(matches!(
            outcome,
            DispatchOutcome::Completed { status, handled: false } if status == StatusCode::METHOD_NOT_ALLOWED
        ));
        assert!(wire.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));
        assert!(wire.contains("Allow: POST\r\n"));
    }

    #[test]
    fn test_handler_error_sends_nothing() {
        let (outcome, wire) = run(Method::GET, "/fails", b"");
        match outcome {
            DispatchOutcome::Failed {
                error: HttpdError::FieldNotFound { field },
                response_started: false,
                response_complete: false,
            } => assert_eq!(field, "ssid"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(wire.is_empty());
    }

    #[test]
    fn test_incomplete_response_is_a_failure() {
        let (outcome, _wire) = run(Method::GET, "/half", b"");
        assert!(matches!(
            outcome,
            DispatchOutcome::Failed {
                error: HttpdError::ProtocolViolation(_),
                response_started: true,
                response_complete: false,
            }
        ));
        assert!(!outcome.response_delivered());
    }

    #[test]
    fn test_best_effort_response_is_kept_on_failure() {
        let (outcome, wire) = run(Method::GET, "/best-effort", b"");
        assert_eq!(outcome.state(), DispatchState::Failed);
        assert!(outcome.response_delivered());
        assert!(wire.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    }

    struct ClosedPeer;

    impl Connection for ClosedPeer {
        fn write_head(&mut self, _head: &ResponseHead) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn write_body(&mut self, _bytes: &[u8]) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn test_write_failure_on_lookup_miss() {
        let mut body: &[u8] = b"";
        let mut req = Request::new(Method::GET, "/nowhere", &mut body);
        let outcome = dispatcher().dispatch(&mut req, &mut ClosedPeer);
        assert!(matches!(
            outcome,
            DispatchOutcome::Failed {
                error: HttpdError::TransportWriteError(_),
                response_started: true,
                ..
            }
        ));
    }

    #[test]
    fn test_request_ids_are_unique_and_parse_back() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
        assert_eq!(a.to_string().parse::<RequestId>().unwrap(), a);
    }
}
