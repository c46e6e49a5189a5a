use crate::dispatcher::Request;
use crate::error::HttpdError;
use crate::server::{HeaderFlags, ResponseWriter};
use http::Method;
use smallvec::SmallVec;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Handler callback: receives the request by reference and owns the whole
/// response through the writer.
pub type Handler = Arc<
    dyn Fn(&mut Request<'_>, &mut ResponseWriter<'_>) -> Result<(), HttpdError> + Send + Sync,
>;

/// Which handler slot of a route serves a method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodSlot {
    Get,
    Post,
    Delete,
    Extra,
}

impl MethodSlot {
    #[must_use]
    pub fn for_method(method: &Method) -> Self {
        if *method == Method::GET {
            MethodSlot::Get
        } else if *method == Method::POST {
            MethodSlot::Post
        } else if *method == Method::DELETE {
            MethodSlot::Delete
        } else {
            MethodSlot::Extra
        }
    }
}

/// One path with its header flags and per-method handlers.
#[derive(Clone)]
pub struct Route {
    path: String,
    flags: HeaderFlags,
    get: Option<Handler>,
    post: Option<Handler>,
    delete: Option<Handler>,
    extra: Option<Handler>,
}

impl Route {
    pub fn new(path: impl Into<String>, flags: HeaderFlags) -> Self {
        Self {
            path: path.into(),
            flags,
            get: None,
            post: None,
            delete: None,
            extra: None,
        }
    }

    #[must_use]
    pub fn get<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Request<'_>, &mut ResponseWriter<'_>) -> Result<(), HttpdError>
            + Send
            + Sync
            + 'static,
    {
        self.get = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn post<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Request<'_>, &mut ResponseWriter<'_>) -> Result<(), HttpdError>
            + Send
            + Sync
            + 'static,
    {
        self.post = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn delete<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Request<'_>, &mut ResponseWriter<'_>) -> Result<(), HttpdError>
            + Send
            + Sync
            + 'static,
    {
        self.delete = Some(Arc::new(handler));
        self
    }

    /// Handler for every method without a dedicated slot.
    #[must_use]
    pub fn extra<F>(mut self, handler: F) -> Self
    where
        F: Fn(&mut Request<'_>, &mut ResponseWriter<'_>) -> Result<(), HttpdError>
            + Send
            + Sync
            + 'static,
    {
        self.extra = Some(Arc::new(handler));
        self
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn flags(&self) -> HeaderFlags {
        self.flags
    }

    #[must_use]
    pub fn handler(&self, slot: MethodSlot) -> Option<&Handler> {
        match slot {
            MethodSlot::Get => self.get.as_ref(),
            MethodSlot::Post => self.post.as_ref(),
            MethodSlot::Delete => self.delete.as_ref(),
            MethodSlot::Extra => self.extra.as_ref(),
        }
    }

    /// Methods with a dedicated handler, in slot order.
    #[must_use]
    pub fn allowed_methods(&self) -> SmallVec<[&'static str; 3]> {
        let mut methods = SmallVec::new();
        if self.get.is_some() {
            methods.push("GET");
        }
        if self.post.is_some() {
            methods.push("POST");
        }
        if self.delete.is_some() {
            methods.push("DELETE");
        }
        methods
    }

    fn has_handler(&self) -> bool {
        self.get.is_some() || self.post.is_some() || self.delete.is_some() || self.extra.is_some()
    }

    fn validate(&self) -> Result<(), HttpdError> {
        let reason = if !self.path.starts_with('/') {
            "path must start with '/'"
        } else if !self.has_handler() {
            "route has no handler"
        } else {
            return Ok(());
        };
        Err(HttpdError::InvalidRoute {
            path: self.path.clone(),
            reason,
        })
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("path", &self.path)
            .field("flags", &self.flags)
            .field("methods", &self.allowed_methods())
            .field("extra", &self.extra.is_some())
            .finish()
    }
}

/// Collects routes at startup. Consumed by [`RouteTableBuilder::build`].
#[derive(Default, Debug)]
pub struct RouteTableBuilder {
    routes: Vec<Route>,
}

impl RouteTableBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one route.
    ///
    /// # Errors
    ///
    /// * [`HttpdError::DuplicatePath`] - the path is already registered; the
    ///   existing route stays in place
    /// * [`HttpdError::InvalidRoute`] - no handler, or the path is not absolute
    pub fn register(&mut self, route: Route) -> Result<&mut Self, HttpdError> {
        route.validate()?;
        if self.routes.iter().any(|r| r.path == route.path) {
            return Err(HttpdError::DuplicatePath { path: route.path });
        }
        debug!(path = %route.path, methods = ?route.allowed_methods(), "Route registered");
        self.routes.push(route);
        Ok(self)
    }

    /// Add a sequence of routes.
    ///
    /// Every route is attempted; the accepted ones stay registered. Returns
    /// the first rejection, if any.
    pub fn register_all<I>(&mut self, routes: I) -> Result<(), HttpdError>
    where
        I: IntoIterator<Item = Route>,
    {
        let mut first_error = None;
        for route in routes {
            if let Err(e) = self.register(route) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Freeze the routes into a read-only table.
    #[must_use]
    pub fn build(self) -> RouteTable {
        let entries: Vec<RouteEntry> = self
            .routes
            .into_iter()
            .map(|route| {
                let allow = allow_header_line(&route);
                RouteEntry { route, allow }
            })
            .collect();

        let routes_summary: Vec<&str> = entries.iter().map(|e| e.route.path()).collect();
        info!(
            routes_count = entries.len(),
            routes_summary = ?routes_summary,
            "Route table built"
        );

        RouteTable {
            entries: entries.into(),
        }
    }
}

/// `Allow:` line for 405 replies, built once per route. The header line must
/// be `'static` for the runtime, and routes live for the whole process.
fn allow_header_line(route: &Route) -> &'static str {
    let line = format!("Allow: {}", route.allowed_methods().join(", "));
    Box::leak(line.into_boxed_str())
}

struct RouteEntry {
    route: Route,
    allow: &'static str,
}

/// Result of a successful lookup.
pub struct RouteMatch<'t> {
    pub route: &'t Route,
    pub handler: &'t Handler,
}

impl fmt::Debug for RouteMatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteMatch").field("route", self.route).finish()
    }
}

/// Immutable, cheaply clonable route table shared by every connection.
#[derive(Clone)]
pub struct RouteTable {
    entries: Arc<[RouteEntry]>,
}

impl RouteTable {
    /// Resolve a request to its handler.
    ///
    /// # Errors
    ///
    /// * [`HttpdError::NotFound`] - no route has exactly this path
    /// * [`HttpdError::MethodNotAllowed`] - the route has no handler for
    ///   `method`
    pub fn find(&self, path: &str, method: &Method) -> Result<RouteMatch<'_>, HttpdError> {
        debug!(method = %method, path = %path, "Route match attempt");

        let Some(entry) = self.entries.iter().find(|e| e.route.path == path) else {
            warn!(method = %method, path = %path, "No route matched");
            return Err(HttpdError::NotFound);
        };

        match entry.route.handler(MethodSlot::for_method(method)) {
            Some(handler) => {
                debug!(method = %method, path = %path, "Route matched");
                Ok(RouteMatch {
                    route: &entry.route,
                    handler,
                })
            }
            None => {
                warn!(
                    method = %method,
                    path = %path,
                    allowed = ?entry.route.allowed_methods(),
                    "Method not allowed for route"
                );
                Err(HttpdError::MethodNotAllowed)
            }
        }
    }

    /// `Allow:` header line for a registered path.
    #[must_use]
    pub fn allow_header(&self, path: &str) -> Option<&'static str> {
        self.entries
            .iter()
            .find(|e| e.route.path == path)
            .map(|e| e.allow)
    }

    pub fn routes(&self) -> impl Iterator<Item = &Route> {
        self.entries.iter().map(|e| &e.route)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[routes] count={}", self.entries.len())?;
        for entry in self.entries.iter() {
            let route = &entry.route;
            write!(f, "[route] {} -> {}", route.path, route.allowed_methods().join(","))?;
            if route.extra.is_some() {
                write!(f, " (+extra)")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
