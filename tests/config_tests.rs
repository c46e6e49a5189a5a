//! Configuration file plus environment overrides.

use devhttpd::config::HttpdConfig;
use std::io::Write;

// Single test: the process environment is shared by every test in a binary.
#[test]
fn test_resolve_applies_env_over_file() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "bind_address: \"127.0.0.1:9000\"").unwrap();
    writeln!(file, "stack_size: 0x4000").unwrap();

    std::env::remove_var("DEVHTTPD_ADDR");
    std::env::remove_var("DEVHTTPD_STACK_SIZE");
    let config = HttpdConfig::resolve(Some(file.path())).unwrap();
    assert_eq!(config.bind_address, "127.0.0.1:9000");
    assert_eq!(config.stack_size, 0x4000);

    std::env::set_var("DEVHTTPD_ADDR", "127.0.0.1:9100");
    std::env::set_var("DEVHTTPD_STACK_SIZE", "0x10000");
    let config = HttpdConfig::resolve(Some(file.path())).unwrap();
    assert_eq!(config.bind_address, "127.0.0.1:9100");
    assert_eq!(config.stack_size, 0x10000);

    std::env::set_var("DEVHTTPD_STACK_SIZE", "lots");
    let config = HttpdConfig::resolve(None).unwrap();
    assert_eq!(config.stack_size, 0x8000);
    assert_eq!(config.max_inflight_bodies, 8);

    std::env::set_var("DEVHTTPD_STACK_SIZE", "0");
    assert!(HttpdConfig::resolve(None).is_err());

    std::env::remove_var("DEVHTTPD_ADDR");
    std::env::remove_var("DEVHTTPD_STACK_SIZE");
}
