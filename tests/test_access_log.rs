mod common;

use std::io;
use std::sync::{Arc, Mutex};

use common::{Fixture, peer};
use staticd::http::connection::Connection;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

/// Serves `raw` on the current thread with a subscriber capturing log lines.
async fn serve_logged(fx: &Fixture, raw: &[u8]) -> String {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let (mut client, server) = tokio::io::duplex(64 * 1024);
    client.write_all(raw).await.unwrap();
    client.shutdown().await.unwrap();
    Connection::new(server, peer(), fx.site.clone()).run().await;

    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    captured.text()
}

#[tokio::test]
async fn test_access_line_fields() {
    let fx = Fixture::new();
    let log = serve_logged(&fx, b"GET /hello.txt HTTP/1.1\r\n\r\n").await;

    let line = log.lines().find(|l| l.contains("request served")).unwrap();
    assert!(line.contains(r#"method="GET""#));
    assert!(line.contains(r#"path="/hello.txt""#));
    assert!(line.contains("status=200"));
}

#[tokio::test]
async fn test_access_line_escapes_control_characters() {
    let fx = Fixture::new();
    let log = serve_logged(&fx, b"GET /a\nstatus=200 forged/ HTTP/1.1\r\n\r\n").await;

    let access: Vec<&str> = log.lines().filter(|l| l.contains("access")).collect();
    assert_eq!(access.len(), 1, "{}", log);
    assert!(access[0].contains(r#"path="/a\nstatus=200"#));
    assert!(access[0].contains("status=400"));
    assert!(!log.lines().any(|l| l.starts_with("status=200")));
}
