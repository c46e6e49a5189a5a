//! Per-request dispatch.
//!
//! A [`Dispatcher`] takes one parsed [`Request`], resolves it against the
//! [`RouteTable`](crate::router::RouteTable) and runs the matched handler
//! against a [`ResponseWriter`](crate::server::ResponseWriter) bound to the
//! request's own connection.
//!
//! Each dispatch walks `Received -> Routed -> HandlerRunning` and ends in
//! `Completed` or `Failed`. Lookup misses are answered here with `404` or
//! `405`; handler failures are logged and reported back to the transport,
//! which closes the connection when nothing usable was sent.

mod core;

pub use core::{DispatchOutcome, DispatchState, Dispatcher, Request, RequestId};
