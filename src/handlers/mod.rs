//! Device configuration endpoints.
//!
//! | Path           | GET                    | POST                           |
//! |----------------|------------------------|--------------------------------|
//! | `/`            | gzip-encoded setup page | -                             |
//! | `/socket`      | device status          | new status (raw body), `OK`    |
//! | `/wifi/config` | device status          | `ssid` + `key` form, `OK`      |

mod index;
mod socket;
mod wifi;

use crate::device::Device;
use crate::error::HttpdError;
use crate::form::BufferPool;
use crate::router::Route;
use crate::server::{HeaderFlags, ResponseWriter, TEXT_PLAIN};
use std::sync::Arc;
use tracing::debug;

/// Header flags shared by every application route.
pub const ROUTE_FLAGS: HeaderFlags = HeaderFlags::DEFAULT;

/// What the handlers share: the device and the request body pool.
#[derive(Clone)]
pub struct AppState {
    pub device: Arc<dyn Device>,
    pub pool: Arc<BufferPool>,
}

impl AppState {
    pub fn new(device: Arc<dyn Device>, pool: Arc<BufferPool>) -> Self {
        Self { device, pool }
    }
}

/// Answer `err` with its status and canonical reason, unless something was
/// already written. Returns `err` for the dispatcher.
pub(crate) fn reply_error(res: &mut ResponseWriter<'_>, err: HttpdError) -> HttpdError {
    if res.response_started() {
        return err;
    }
    let status = err.status();
    let reason = status.canonical_reason().unwrap_or("Error");
    if let Err(send_err) = res.send_response(status, TEXT_PLAIN, ROUTE_FLAGS, reason.as_bytes()) {
        debug!(error = %send_err, "Error reply not delivered");
    }
    err
}

/// The application route set, in registration order.
pub fn app_routes(device: Arc<dyn Device>, pool: Arc<BufferPool>) -> Vec<Route> {
    let state = AppState::new(device, pool);

    let (socket_state, wifi_state) = (state.clone(), state.clone());
    let post_socket_state = state.clone();

    vec![
        Route::new("/", ROUTE_FLAGS).get(index::get_index),
        Route::new("/socket", ROUTE_FLAGS)
            .get(move |req, res| socket::get_status(&socket_state, req, res))
            .post(move |req, res| socket::set_status(&post_socket_state, req, res)),
        Route::new("/wifi/config", ROUTE_FLAGS)
            .get(move |req, res| socket::get_status(&wifi_state, req, res))
            .post(move |req, res| wifi::set_config(&state, req, res)),
    ]
}
