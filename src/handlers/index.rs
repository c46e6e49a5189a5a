use crate::assets::INDEX_HTML_GZ;
use crate::dispatcher::Request;
use crate::error::HttpdError;
use crate::server::{ResponseWriter, TEXT_HTML_GZIP};
use http::StatusCode;

use super::ROUTE_FLAGS;

/// `GET /`: the setup page, sent as stored (gzip-encoded).
pub fn get_index(_req: &mut Request<'_>, res: &mut ResponseWriter<'_>) -> Result<(), HttpdError> {
    res.send_response(StatusCode::OK, TEXT_HTML_GZIP, ROUTE_FLAGS, INDEX_HTML_GZ)
}
