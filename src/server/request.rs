use http::Method;
use may_minihttp::Request;
use std::io;
use tracing::debug;

/// Method and query-less path of an incoming request.
///
/// Both are copied out because reading the body consumes the runtime request.
pub fn request_line(req: &Request) -> io::Result<(Method, String)> {
    let raw_method = req.method();
    let method = Method::from_bytes(raw_method.as_bytes()).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid request method '{raw_method}'"),
        )
    })?;
    let path = strip_query(req.path()).to_string();

    debug!(
        method = %method,
        path = %path,
        header_count = req.headers().len(),
        "HTTP request parsed"
    );
    Ok((method, path))
}

/// Route lookup uses the path only; everything from `?` on is dropped.
pub fn strip_query(raw_path: &str) -> &str {
    raw_path
        .split_once('?')
        .map_or(raw_path, |(path, _query)| path)
}

#[cfg(test)]
mod tests {
    use super::strip_query;

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("/wifi/config"), "/wifi/config");
        assert_eq!(strip_query("/socket?verbose=1"), "/socket");
        assert_eq!(strip_query("/?"), "/");
        assert_eq!(strip_query(""), "");
    }
}
