use crate::dispatcher::Request;
use crate::error::HttpdError;
use crate::form::{FieldBuf, KEY_CAPACITY, SSID_CAPACITY};
use crate::server::{ResponseWriter, TEXT_PLAIN};
use http::StatusCode;
use tracing::{debug, warn};

use super::{reply_error, AppState, ROUTE_FLAGS};

/// `POST /wifi/config`: join the network named by the `ssid` and `key`
/// form fields.
///
/// A parse or join failure is answered with its status before the error is
/// returned. The body buffer goes back to the pool on every path.
pub fn set_config(
    state: &AppState,
    req: &mut Request<'_>,
    res: &mut ResponseWriter<'_>,
) -> Result<(), HttpdError> {
    join_from_form(state, req).map_err(|e| reply_error(res, e))?;
    res.send_response(StatusCode::OK, TEXT_PLAIN, ROUTE_FLAGS, b"OK")
}

fn join_from_form(state: &AppState, req: &mut Request<'_>) -> Result<(), HttpdError> {
    let mut buf = state.pool.acquire()?;
    let body = buf.read_from(req.body())?;

    let mut ssid = FieldBuf::<SSID_CAPACITY>::new();
    let mut key = FieldBuf::<KEY_CAPACITY>::new();
    if let Err(e) = ssid
        .fill_from(body, "ssid")
        .and_then(|_| key.fill_from(body, "key"))
    {
        warn!(error = %e, body_len = body.len(), "Rejected Wi-Fi configuration");
        return Err(e);
    }
    drop(buf);

    debug!(
        ssid = %String::from_utf8_lossy(ssid.as_bytes()),
        key_len = key.len(),
        "Wi-Fi configuration parsed"
    );
    state.device.join_network(ssid.as_bytes(), key.as_bytes())
}
