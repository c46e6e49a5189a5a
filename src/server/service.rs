use super::connection::MiniHttpConnection;
use super::request::request_line;
use crate::dispatcher::{Dispatcher, Request};
use crate::router::RouteTable;
use may_minihttp::{HttpService, Response};
use std::io;

/// `may_minihttp` service: one call per request, run on the connection's
/// coroutine.
#[derive(Clone)]
pub struct AppService {
    dispatcher: Dispatcher,
}

impl AppService {
    #[must_use]
    pub fn new(routes: RouteTable) -> Self {
        Self {
            dispatcher: Dispatcher::new(routes),
        }
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }
}

impl HttpService for AppService {
    fn call(&mut self, req: may_minihttp::Request, res: &mut Response) -> io::Result<()> {
        let (method, path) = request_line(&req)?;
        let mut body = req.body();
        let mut request = Request::new(method, &path, &mut body);

        let mut conn = MiniHttpConnection::new(res);
        let outcome = self.dispatcher.dispatch(&mut request, &mut conn);
        if outcome.response_delivered() {
            conn.finish();
            Ok(())
        } else {
            Err(io::Error::other("response not completed"))
        }
    }
}
