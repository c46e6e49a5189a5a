//! End-to-end tests over TCP against the device endpoints.

mod common;

use common::DeviceTestServer;
use devhttpd::assets::INDEX_HTML_GZ;
use devhttpd::device::Device;

#[test]
fn test_index_page_is_served_compressed() {
    let server = DeviceTestServer::start();
    let resp = server.get("/");

    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("Content-Type"), Some("text/html"));
    assert_eq!(resp.header("Content-Encoding"), Some("gzip"));
    assert_eq!(
        resp.header("Content-Length"),
        Some(INDEX_HTML_GZ.len().to_string().as_str())
    );
    assert_eq!(resp.header("Connection"), Some("close"));
    assert_eq!(resp.header("Pragma"), Some("no-cache"));
    assert!(resp.header("Server").is_some());
    assert_eq!(
        resp.header("X-Powered-By"),
        Some(concat!("devhttpd/", env!("CARGO_PKG_VERSION")))
    );
    assert_eq!(resp.body, INDEX_HTML_GZ);
}

#[test]
fn test_status_endpoints() {
    let server = DeviceTestServer::start();
    for path in ["/socket", "/wifi/config"] {
        let resp = server.get(path);
        assert_eq!(resp.status, 200, "{path}");
        assert_eq!(resp.header("Content-Type"), Some("text/plain"), "{path}");
        assert_eq!(resp.body_text(), "relay=off", "{path}");
    }
}

#[test]
fn test_post_socket_updates_status() {
    let server = DeviceTestServer::start();
    let resp = server.post("/socket", b"relay=on");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body_text(), "OK");
    assert_eq!(server.device.read_current_status(), "relay=on");
    assert_eq!(server.get("/socket").body_text(), "relay=on");
}

#[test]
fn test_post_wifi_config_joins_network() {
    let server = DeviceTestServer::start();
    let resp = server.post("/wifi/config", b"ssid=MyWifi&key=hunter2");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body_text(), "OK");

    let joined = server.device.last_join().expect("join attempted");
    assert_eq!(joined.ssid, b"MyWifi");
    assert_eq!(joined.key, b"hunter2");
}

#[test]
fn test_invalid_wifi_config_is_400() {
    let server = DeviceTestServer::start();
    let resp = server.post("/wifi/config", b"ssid=MyWifi");
    assert_eq!(resp.status, 400);
    assert_eq!(resp.body_text(), "Bad Request");
    assert_eq!(resp.header("Connection"), Some("close"));
    assert_eq!(server.device.join_count(), 0);

    // The server keeps serving after a failed exchange.
    assert_eq!(server.get("/socket").status, 200);
}

#[test]
fn test_oversized_socket_body_is_413() {
    let server = DeviceTestServer::start();
    let resp = server.post("/socket", &[b'x'; 600]);
    assert_eq!(resp.status, 413);
    assert_eq!(resp.body_text(), "Payload Too Large");
    assert_eq!(server.device.read_current_status(), "relay=off");
}

#[test]
fn test_oversized_ssid_is_413() {
    let server = DeviceTestServer::start();
    let body = format!("ssid={}&key=k", "s".repeat(33));
    let resp = server.post("/wifi/config", body.as_bytes());
    assert_eq!(resp.status, 413);
    assert!(server.device.last_join().is_none());
}

#[test]
fn test_unknown_path_is_404() {
    let server = DeviceTestServer::start();
    let resp = server.get("/admin");
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body_text(), "Not Found");
}

#[test]
fn test_wrong_method_is_405_with_allow() {
    let server = DeviceTestServer::start();
    let resp = server.post("/", b"");
    assert_eq!(resp.status, 405);
    assert_eq!(resp.header("Allow"), Some("GET"));
}

#[test]
fn test_query_string_is_ignored_for_routing() {
    let server = DeviceTestServer::start();
    let resp = server.get("/socket?refresh=1");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body_text(), "relay=off");
}
