// crates/network/tests/transfer_tests.rs
//! Integration tests for the transfer executor against a local server

use std::io::{Read, Write};
use std::net::TcpListener;
use std::time::Duration;

use talefetch_network::{
    Client, NetworkError, TransferExecutor, MIN_VALID_RESPONSE_BYTES,
};
use tempfile::TempDir;
use tokio::sync::mpsc;

/// Serves one canned HTTP response per connection on a random port
fn spawn_server(response: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");

    std::thread::spawn(move || {
        for stream in listener.incoming().take(4) {
            let Ok(mut stream) = stream else { continue };
            let mut request = [0u8; 2048];
            let _ = stream.read(&mut request);
            let _ = stream.write_all(&response);
        }
    });

    format!("http://{}", addr)
}

fn http_response(status_line: &str, body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status_line,
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

#[tokio::test]
async fn test_successful_transfer_reports_progress_and_bytes() {
    let body = vec![0xAAu8; 4096];
    let base = spawn_server(http_response("200 OK", &body));
    let spool = TempDir::new().expect("spool dir");

    let client = Client::new().expect("client");
    let executor = TransferExecutor::new(client, spool.path());
    let (tx, mut rx) = mpsc::channel(64);

    let complete = executor
        .transfer(&format!("{}/chapter.mp3", base), tx)
        .await
        .expect("transfer should succeed");

    assert_eq!(complete.bytes, 4096);
    let written = std::fs::read(complete.file.path()).expect("read temp file");
    assert_eq!(written, body);

    // At least one progress sample arrived, monotonic, expected size known
    let mut last = 0u64;
    let mut samples = 0;
    while let Ok(update) = rx.try_recv() {
        assert!(update.bytes_written >= last);
        assert_eq!(update.bytes_expected, Some(4096));
        last = update.bytes_written;
        samples += 1;
    }
    assert!(samples >= 1);
    assert_eq!(last, 4096);
}

#[tokio::test]
async fn test_http_error_status_fails_without_body() {
    let base = spawn_server(http_response("404 Not Found", b"gone"));
    let spool = TempDir::new().expect("spool dir");

    let client = Client::new().expect("client");
    let executor = TransferExecutor::new(client, spool.path());
    let (tx, _rx) = mpsc::channel(8);

    let result = executor.transfer(&format!("{}/missing.mp3", base), tx).await;
    assert!(matches!(result, Err(NetworkError::HttpStatus(404))));
}

#[tokio::test]
async fn test_undersized_body_is_rejected_as_error_page() {
    let body = vec![b'x'; (MIN_VALID_RESPONSE_BYTES - 1) as usize];
    let base = spawn_server(http_response("200 OK", &body));
    let spool = TempDir::new().expect("spool dir");

    let client = Client::new().expect("client");
    let executor = TransferExecutor::new(client, spool.path());
    let (tx, _rx) = mpsc::channel(8);

    let result = executor.transfer(&format!("{}/welcome.mp3", base), tx).await;
    match result {
        Err(NetworkError::ResponseTooSmall { bytes }) => {
            assert_eq!(bytes, MIN_VALID_RESPONSE_BYTES - 1)
        }
        other => panic!("expected ResponseTooSmall, got {:?}", other.map(|c| c.bytes)),
    }
}

#[tokio::test]
async fn test_body_at_floor_is_accepted() {
    let body = vec![b'x'; MIN_VALID_RESPONSE_BYTES as usize];
    let base = spawn_server(http_response("200 OK", &body));
    let spool = TempDir::new().expect("spool dir");

    let client = Client::new().expect("client");
    let executor = TransferExecutor::new(client, spool.path());
    let (tx, _rx) = mpsc::channel(8);

    let complete = executor
        .transfer(&format!("{}/tiny.mp3", base), tx)
        .await
        .expect("floor-sized body should pass");
    assert_eq!(complete.bytes, MIN_VALID_RESPONSE_BYTES);
}

#[tokio::test]
async fn test_failed_transfer_leaves_no_spool_files() {
    let base = spawn_server(http_response("500 Internal Server Error", b""));
    let spool = TempDir::new().expect("spool dir");

    let client = Client::new().expect("client");
    let executor = TransferExecutor::new(client, spool.path());
    let (tx, _rx) = mpsc::channel(8);

    let result = executor.transfer(&format!("{}/err.mp3", base), tx).await;
    assert!(result.is_err());

    let leftovers: Vec<_> = std::fs::read_dir(spool.path())
        .expect("read spool dir")
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn test_content_length_probe() {
    let base = spawn_server(http_response("200 OK", &vec![0u8; 2048]));

    let client = Client::new().expect("client");
    let length = client
        .content_length(&format!("{}/chapter.mp3", base))
        .await
        .expect("head request");
    assert_eq!(length, Some(2048));
}

#[tokio::test]
async fn test_stalled_transfer_times_out() {
    // A server that sends headers then goes silent
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    std::thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut request = [0u8; 2048];
            let _ = stream.read(&mut request);
            let _ = stream.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100000\r\n\r\n");
            std::thread::sleep(Duration::from_secs(10));
        }
    });

    let spool = TempDir::new().expect("spool dir");
    let client = Client::new().expect("client");
    let executor =
        TransferExecutor::new(client, spool.path()).with_stall_timeout(Duration::from_millis(300));
    let (tx, _rx) = mpsc::channel(8);

    let result = executor
        .transfer(&format!("http://{}/stall.mp3", addr), tx)
        .await;
    assert!(matches!(result, Err(NetworkError::Stalled { .. })));
}
