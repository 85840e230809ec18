//! Exercises the render exchange against a one-shot local HTTP server, so
//! the full request/response path runs without a live render service.

use gaia_rs::Client;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::JoinHandle;

struct CannedResponse {
    status: &'static str,
    content_type: Option<&'static str>,
    body: Vec<u8>,
}

/// Serve exactly one request, returning what the client sent.
fn serve_once(response: CannedResponse) -> (u16, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = std::thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        // read headers, then the declared body length
        let header_end = loop {
            let n = stream.read(&mut buf).unwrap();
            request.extend_from_slice(&buf[..n]);
            if let Some(pos) = request.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&request[..header_end]).to_string();
        let content_length: usize = head
            .lines()
            .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(str::to_owned))
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(0);
        while request.len() < header_end + content_length {
            let n = stream.read(&mut buf).unwrap();
            request.extend_from_slice(&buf[..n]);
        }

        let mut reply = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n",
            response.status,
            response.body.len()
        );
        if let Some(ct) = response.content_type {
            reply.push_str(&format!("Content-Type: {ct}\r\n"));
        }
        reply.push_str("\r\n");
        stream.write_all(reply.as_bytes()).unwrap();
        stream.write_all(&response.body).unwrap();

        String::from_utf8_lossy(&request).to_string()
    });
    (port, handle)
}

#[test]
fn saves_png_response_under_png_extension() {
    let png_bytes = vec![0x89, b'P', b'N', b'G', 1, 2, 3, 4];
    let (port, server) = serve_once(CannedResponse {
        status: "200 OK",
        content_type: Some("image/png"),
        body: png_bytes.clone(),
    });

    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("outbreak");
    let client = Client::new("127.0.0.1", port);
    let saved = client.render("<gaia></gaia>", &base).unwrap();

    assert_eq!(saved, dir.path().join("outbreak.png"));
    assert_eq!(std::fs::read(&saved).unwrap(), png_bytes);

    let request = server.join().unwrap();
    assert!(request.contains("text/xml"), "request declared {request}");
    assert!(request.contains("<gaia></gaia>"));
}

#[test]
fn unknown_content_type_falls_back_to_generic_extension() {
    let (port, server) = serve_once(CannedResponse {
        status: "200 OK",
        content_type: Some("application/unknown"),
        body: b"mystery artifact".to_vec(),
    });

    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("out");
    let client = Client::new("127.0.0.1", port);
    let saved = client.render("<gaia></gaia>", &base).unwrap();

    assert_eq!(saved, dir.path().join("out.gaia"));
    assert_eq!(std::fs::read(&saved).unwrap(), b"mystery artifact");
    server.join().unwrap();
}

#[test]
fn missing_content_type_also_falls_back() {
    let (port, server) = serve_once(CannedResponse {
        status: "200 OK",
        content_type: None,
        body: vec![1],
    });

    let dir = tempfile::tempdir().unwrap();
    let client = Client::new("127.0.0.1", port);
    let saved = client.render("<gaia></gaia>", &dir.path().join("x")).unwrap();
    assert!(saved.to_string_lossy().ends_with(".gaia"));
    server.join().unwrap();
}

#[test]
fn empty_response_is_fatal_regardless_of_content_type() {
    let (port, server) = serve_once(CannedResponse {
        status: "200 OK",
        content_type: Some("image/png"),
        body: Vec::new(),
    });

    let dir = tempfile::tempdir().unwrap();
    let client = Client::new("127.0.0.1", port);
    let err = client
        .render("<gaia></gaia>", &dir.path().join("nothing"))
        .unwrap_err();
    assert!(
        format!("{err:#}").contains("empty visualization"),
        "{err:#}"
    );
    // nothing was written
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
    server.join().unwrap();
}

#[test]
fn http_error_status_is_fatal() {
    let (port, server) = serve_once(CannedResponse {
        status: "500 Internal Server Error",
        content_type: Some("text/plain"),
        body: b"boom".to_vec(),
    });

    let dir = tempfile::tempdir().unwrap();
    let client = Client::new("127.0.0.1", port);
    let err = client
        .render("<gaia></gaia>", &dir.path().join("x"))
        .unwrap_err();
    assert!(format!("{err:#}").contains("500"), "{err:#}");
    server.join().unwrap();
}
