//! # Router Module
//!
//! The router module holds the route table: the mapping from exact URL paths
//! and HTTP methods to handler callbacks.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Collecting routes at startup through a [`RouteTableBuilder`]
//! - Rejecting duplicate paths (the first registration wins)
//! - Freezing the result into an immutable [`RouteTable`]
//! - Resolving `(path, method)` to a handler, or to `NotFound` /
//!   `MethodNotAllowed`
//!
//! ## Method Slots
//!
//! Each route carries up to four handlers, one per slot:
//!
//! | Slot     | Methods served                         |
//! |----------|----------------------------------------|
//! | `get`    | `GET`                                  |
//! | `post`   | `POST`                                 |
//! | `delete` | `DELETE`                               |
//! | `extra`  | every other method (`PUT`, `PATCH`...) |
//!
//! ## Example
//!
//! ```rust
//! use devhttpd::router::{Route, RouteTableBuilder};
//! use devhttpd::server::{HeaderFlags, TEXT_PLAIN};
//! use http::{Method, StatusCode};
//!
//! let mut builder = RouteTableBuilder::new();
//! builder
//!     .register(Route::new("/ping", HeaderFlags::DEFAULT).get(|_req, res| {
//!         res.send_response(StatusCode::OK, TEXT_PLAIN, HeaderFlags::DEFAULT, b"pong")
//!     }))
//!     .unwrap();
//! let table = builder.build();
//!
//! assert!(table.find("/ping", &Method::GET).is_ok());
//! assert!(table.find("/ping", &Method::POST).is_err());
//! ```
//!
//! ## Performance
//!
//! Lookup is a linear scan with exact, case-sensitive string comparison. The
//! table holds a handful of routes and is read-only once built, so concurrent
//! lookups need no locking.

mod core;

pub use core::{Handler, MethodSlot, Route, RouteMatch, RouteTable, RouteTableBuilder};
