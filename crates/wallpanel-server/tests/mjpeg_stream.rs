// wallpanel — turn a spare screen into a presence-aware wall display

//! Integration tests for the MJPEG broadcaster: real TCP viewers against a
//! running server.

use bytes::Bytes;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use wallpanel_server::MjpegServer;

const HANDSHAKE: &str = "HTTP/1.1 200 OK\r\n\
Content-Type: multipart/x-mixed-replace; boundary=frame\r\n\
Connection: close\r\n\
\r\n";

async fn connect(server: &MjpegServer) -> TcpStream {
    let addr = server.local_addr().await.expect("server is running");
    TcpStream::connect(("127.0.0.1", addr.port()))
        .await
        .expect("viewer connects")
}

async fn read_exact_bytes(stream: &mut TcpStream, n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    timeout(Duration::from_secs(5), stream.read_exact(&mut buf))
        .await
        .expect("read timed out")
        .expect("read failed");
    buf
}

/// Read from `stream` into `collected` until it contains `needle`.
async fn read_until(stream: &mut TcpStream, collected: &mut Vec<u8>, needle: &[u8]) {
    while !contains(collected, needle) {
        let mut chunk = [0u8; 4096];
        let n = timeout(Duration::from_secs(5), stream.read(&mut chunk))
            .await
            .expect("read timed out")
            .expect("read failed");
        assert!(n > 0, "connection closed before expected data arrived");
        collected.extend_from_slice(&chunk[..n]);
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find_from(haystack, needle, 0).is_some()
}

fn find_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| from + pos)
}

async fn wait_for_viewers(server: &MjpegServer, count: usize) {
    for _ in 0..500 {
        if server.viewer_count() == count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!(
        "expected {} viewers, saw {}",
        count,
        server.viewer_count()
    );
}

#[tokio::test]
async fn new_viewer_gets_handshake_and_cached_frame() {
    let server = MjpegServer::new(0);
    server.start().await.unwrap();

    // No viewers yet: publish is a cache update with no write attempts.
    server.publish(Bytes::from_static(b"jpegdata")).await;
    assert_eq!(server.viewer_count(), 0);

    let mut viewer = connect(&server).await;
    let expected = format!(
        "{HANDSHAKE}--frame\r\nContent-Type: image/jpeg\r\nContent-Length: 8\r\n\r\njpegdata\r\n"
    );
    let bytes = read_exact_bytes(&mut viewer, expected.len()).await;
    assert_eq!(String::from_utf8_lossy(&bytes), expected);

    server.stop().await;
}

#[tokio::test]
async fn frames_fan_out_in_publish_order() {
    let server = MjpegServer::new(0);
    server.start().await.unwrap();

    let mut first = connect(&server).await;
    let mut second = connect(&server).await;
    wait_for_viewers(&server, 2).await;

    for i in 0..5 {
        server.publish(Bytes::from(format!("frame-{i}"))).await;
    }

    for viewer in [&mut first, &mut second] {
        let mut collected = Vec::new();
        read_until(viewer, &mut collected, b"frame-4").await;
        let mut pos = 0;
        for i in 0..5 {
            let needle = format!("frame-{i}");
            pos = find_from(&collected, needle.as_bytes(), pos)
                .unwrap_or_else(|| panic!("{} missing or out of order", needle));
        }
    }

    server.stop().await;
}

#[tokio::test]
async fn dead_viewer_never_blocks_the_rest() {
    let server = MjpegServer::new(0);
    server.start().await.unwrap();

    let doomed = connect(&server).await;
    let mut first = connect(&server).await;
    let mut second = connect(&server).await;
    wait_for_viewers(&server, 3).await;

    drop(doomed);

    // Publish until the write failure reaps the dead viewer.
    let mut published = Vec::new();
    for i in 0..200 {
        if server.viewer_count() == 2 {
            break;
        }
        let payload = format!("pre-{i}");
        server.publish(Bytes::from(payload.clone())).await;
        published.push(payload);
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(
        server.viewer_count(),
        2,
        "dead viewer still registered after repeated publishes"
    );

    server.publish(Bytes::from_static(b"tail-frame")).await;

    // The surviving viewers got every published frame.
    for viewer in [&mut first, &mut second] {
        let mut collected = Vec::new();
        read_until(viewer, &mut collected, b"tail-frame").await;
        for payload in &published {
            assert!(
                contains(&collected, payload.as_bytes()),
                "{} missing from a surviving viewer",
                payload
            );
        }
    }

    server.stop().await;
}

#[tokio::test]
async fn start_and_stop_are_idempotent() {
    let server = MjpegServer::new(0);
    server.start().await.unwrap();
    let addr = server.local_addr().await.unwrap();

    // Second start while running is a no-op: same listener, same address.
    server.start().await.unwrap();
    assert_eq!(server.local_addr().await, Some(addr));

    let mut viewer = connect(&server).await;
    wait_for_viewers(&server, 1).await;

    server.stop().await;
    server.stop().await;
    assert_eq!(server.viewer_count(), 0);
    assert!(!server.is_running().await);

    // The viewer's connection was closed.
    let mut buf = [0u8; 4096];
    loop {
        let n = timeout(Duration::from_secs(5), viewer.read(&mut buf))
            .await
            .expect("read timed out")
            .unwrap_or(0);
        if n == 0 {
            break;
        }
    }

    // The listener is gone.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(TcpStream::connect(("127.0.0.1", addr.port())).await.is_err());

    // And the server can come back up.
    server.start().await.unwrap();
    let mut viewer = connect(&server).await;
    let bytes = read_exact_bytes(&mut viewer, HANDSHAKE.len()).await;
    assert_eq!(String::from_utf8_lossy(&bytes), HANDSHAKE);
    server.stop().await;
}

#[tokio::test]
async fn bind_failure_leaves_the_server_stopped() {
    let blocker = tokio::net::TcpListener::bind(("0.0.0.0", 0)).await.unwrap();
    let port = blocker.local_addr().unwrap().port();

    let server = MjpegServer::new(port);
    assert!(server.start().await.is_err());
    assert!(!server.is_running().await);
}
