//! Static content compiled into the binary.

/// Setup page, gzip-compressed at build time from `static_site/index.html`.
/// Served as-is with `Content-Encoding: gzip`.
pub static INDEX_HTML_GZ: &[u8] = include_bytes!("../static_site/index.html.gz");

#[cfg(test)]
mod tests {
    use super::INDEX_HTML_GZ;

    #[test]
    fn test_index_is_gzip() {
        assert!(INDEX_HTML_GZ.len() > 18);
        assert_eq!(&INDEX_HTML_GZ[..2], &[0x1f, 0x8b]);
    }
}
