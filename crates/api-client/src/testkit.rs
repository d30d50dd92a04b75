//! A local stand-in for the blob-storage container, for tests.
//!
//! Speaks just enough HTTP/1.1 for `reqwest`: one request per connection,
//! `200` with the stored bytes or `404`.

use crate::BlobStorageClient;
use std::collections::HashMap;
use std::io::{self, BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

type Blobs = Arc<Mutex<HashMap<String, Vec<u8>>>>;

pub struct BlobServer {
    addr: SocketAddr,
    container: String,
    blobs: Blobs,
    requests: Arc<AtomicUsize>,
}

impl BlobServer {
    /// Binds an ephemeral port on localhost and serves `/{container}/{name}`.
    pub fn start(container: &str) -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let addr = listener.local_addr()?;
        let blobs: Blobs = Arc::new(Mutex::new(HashMap::new()));
        let requests = Arc::new(AtomicUsize::new(0));

        let prefix = format!("/{container}/");
        let shared_blobs = Arc::clone(&blobs);
        let shared_requests = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                shared_requests.fetch_add(1, Ordering::SeqCst);
                let _ = respond(stream, &prefix, &shared_blobs);
            }
        });

        Ok(Self {
            addr,
            container: container.to_string(),
            blobs,
            requests,
        })
    }

    pub fn insert(&self, name: &str, bytes: Vec<u8>) {
        self.blobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(name.to_string(), bytes);
    }

    /// Base URL to hand to `BlobStorageClient`.
    pub fn base_url(&self) -> String {
        format!("http://{}/{}", self.addr, self.container)
    }

    /// A client for this server that bypasses any configured HTTP proxy.
    pub fn client(&self) -> BlobStorageClient {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .unwrap_or_default();
        BlobStorageClient::with_client(client, &self.base_url())
    }

    /// Connections served so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// A client whose container URL nothing listens on.
    pub fn unreachable_client() -> BlobStorageClient {
        let client = reqwest::Client::builder()
            .no_proxy()
            .build()
            .unwrap_or_default();
        BlobStorageClient::with_client(client, &Self::unreachable_url())
    }

    /// A URL on a localhost port nothing listens on.
    pub fn unreachable_url() -> String {
        let port = TcpListener::bind("127.0.0.1:0")
            .and_then(|l| l.local_addr())
            .map(|a| a.port())
            .unwrap_or(9);
        format!("http://127.0.0.1:{port}/aiap18-assessment-data")
    }
}

fn respond(stream: TcpStream, prefix: &str, blobs: &Blobs) -> io::Result<()> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line)?;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header)? == 0 || header == "\r\n" {
            break;
        }
    }

    let path = request_line.split_whitespace().nth(1).unwrap_or("/");
    let body = path
        .strip_prefix(prefix)
        .and_then(|name| blobs.lock().unwrap_or_else(|e| e.into_inner()).get(name).cloned());

    let mut stream = stream;
    match body {
        Some(bytes) => {
            write!(
                stream,
                "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                bytes.len()
            )?;
            stream.write_all(&bytes)?;
        }
        None => {
            let body = b"BlobNotFound";
            write!(
                stream,
                "HTTP/1.1 404 Not Found\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                body.len()
            )?;
            stream.write_all(body)?;
        }
    }
    stream.flush()
}
