//! HTTP response writing and the `may_minihttp` transport binding.

mod connection;
mod listener;
mod request;
mod response;
mod service;

pub use connection::{Connection, MiniHttpConnection, RawConnection};
pub use listener::ServerHandle;
pub use request::{request_line, strip_query};
pub use response::{
    ContentType, ExtraHeaders, HeaderFlags, ResponseHead, ResponseWriter, APPLICATION_JSON,
    POWERED_BY_HEADER, SERVER_NAME, TEXT_HTML, TEXT_HTML_GZIP, TEXT_PLAIN,
};
pub use service::AppService;
