use crate::dispatcher::Request;
use crate::error::HttpdError;
use crate::server::{ResponseWriter, TEXT_PLAIN};
use http::StatusCode;
use tracing::debug;

use super::{reply_error, AppState, ROUTE_FLAGS};

/// `GET /socket` and `GET /wifi/config`: current device status.
pub fn get_status(
    state: &AppState,
    _req: &mut Request<'_>,
    res: &mut ResponseWriter<'_>,
) -> Result<(), HttpdError> {
    let status = state.device.read_current_status();
    res.send_response(StatusCode::OK, TEXT_PLAIN, ROUTE_FLAGS, status.as_bytes())
}

/// `POST /socket`: the raw body becomes the new device status.
pub fn set_status(
    state: &AppState,
    req: &mut Request<'_>,
    res: &mut ResponseWriter<'_>,
) -> Result<(), HttpdError> {
    apply_from_body(state, req).map_err(|e| reply_error(res, e))?;
    res.send_response(StatusCode::OK, TEXT_PLAIN, ROUTE_FLAGS, b"OK")
}

fn apply_from_body(state: &AppState, req: &mut Request<'_>) -> Result<(), HttpdError> {
    let mut buf = state.pool.acquire()?;
    let body = buf.read_from(req.body())?;
    let text = String::from_utf8_lossy(body);
    let value = text.trim_end_matches(|c: char| c.is_whitespace() || c == '\0');
    debug!(body_len = body.len(), "Socket status received");

    state.device.apply_status(value);
    Ok(())
}
