//! # Form Module
//!
//! The form module pulls tagged fields out of URL-encoded POST bodies into
//! bounded, request-scoped buffers.
//!
//! ## Overview
//!
//! A configuration POST looks like `ssid=MyWifi&key=hunter2`. Handlers:
//!
//! 1. Acquire a body buffer from the [`BufferPool`] (bounded number of
//!    in-flight bodies, [`HttpdError::AllocationFailure`] when exhausted)
//! 2. Read at most [`BODY_CAPACITY`] bytes of body into it
//! 3. Extract each field into a stack [`FieldBuf`] sized for that field
//!
//! Every buffer releases itself when it goes out of scope, on success and on
//! every error path alike.
//!
//! ## Example
//!
//! ```rust
//! use devhttpd::form::{extract_field, FieldBuf, SSID_CAPACITY};
//!
//! let body = b"ssid=home-net&key=s3cr3t%21";
//! let mut ssid = FieldBuf::<SSID_CAPACITY>::new();
//! ssid.fill_from(body, "ssid").unwrap();
//! assert_eq!(ssid.as_str(), Ok("home-net"));
//!
//! let mut out = [0u8; 16];
//! let n = extract_field(body, "key", &mut out).unwrap();
//! assert_eq!(&out[..n], b"s3cr3t!");
//! ```
//!
//! [`HttpdError::AllocationFailure`]: crate::error::HttpdError::AllocationFailure

mod core;
mod pool;

pub use core::{
    extract_field, BodyBuf, FieldBuf, BODY_CAPACITY, KEY_CAPACITY, SSID_CAPACITY,
};
pub use pool::{BufferPool, PooledBuffer, DEFAULT_POOL_SLOTS};
