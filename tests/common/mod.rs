#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use staticd::http::connection::{AccessRecord, Connection, Site};
use staticd::http::path::ServerRoot;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

pub const HELLO: &[u8] = b"Hello, static world!\n";

/// A served tree:
///
/// ```text
/// root/
///   hello.txt
///   docs/
///     guide.txt
///   empty/
/// ```
///
/// plus `outside/secret.txt` next to the root.
pub struct Fixture {
    pub dir: TempDir,
    pub site: Arc<Site>,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        std::fs::create_dir_all(root.join("docs")).unwrap();
        std::fs::create_dir_all(root.join("empty")).unwrap();
        std::fs::write(root.join("hello.txt"), HELLO).unwrap();
        std::fs::write(root.join("docs/guide.txt"), b"guide").unwrap();

        let outside = dir.path().join("outside");
        std::fs::create_dir_all(&outside).unwrap();
        std::fs::write(outside.join("secret.txt"), b"top secret").unwrap();

        let site = Arc::new(Site::new(ServerRoot::new(&root).unwrap()));
        Self { dir, site }
    }

    pub fn root(&self) -> &Path {
        self.site.root.path()
    }

    pub fn outside(&self) -> std::path::PathBuf {
        self.dir.path().join("outside")
    }
}

pub fn peer() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

/// A response split into head and body.
pub struct Reply {
    pub head: String,
    pub body: Vec<u8>,
    pub record: AccessRecord,
}

impl Reply {
    pub fn status_line(&self) -> &str {
        self.head.lines().next().unwrap_or_default()
    }

    /// First value of `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.head.lines().skip(1).find_map(|line| {
            let (k, v) = line.split_once(": ")?;
            k.eq_ignore_ascii_case(name).then_some(v)
        })
    }
}

/// Sends `raw` over an in-memory stream and collects the full response.
pub async fn exchange(site: &Arc<Site>, raw: &[u8]) -> Reply {
    let (mut client, server) = tokio::io::duplex(64 * 1024);
    let handler = tokio::spawn(Connection::new(server, peer(), site.clone()).run());

    client.write_all(raw).await.unwrap();
    let mut out = Vec::new();
    client.read_to_end(&mut out).await.unwrap();
    let record = handler.await.unwrap();

    split_reply(out, record)
}

pub fn split_reply(out: Vec<u8>, record: AccessRecord) -> Reply {
    let end = out
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no header terminator");
    Reply {
        head: String::from_utf8(out[..end].to_vec()).unwrap(),
        body: out[end + 4..].to_vec(),
        record,
    }
}

pub fn get(path: &str) -> Vec<u8> {
    format!("GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path).into_bytes()
}
