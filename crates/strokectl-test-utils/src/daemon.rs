//! Mock control daemon for transport and end-to-end tests.
//!
//! Binds a Unix socket in a temporary directory, records every stroke
//! message it receives, replies with canned response lines, and closes the
//! connection — the shape of one real exchange, without a real daemon.

use std::path::Path;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixListener;
use tokio::task::JoinHandle;

use strokectl_core::proto::MSG_CAPACITY;

/// A fake daemon listening on a throwaway socket path.
pub struct MockDaemon {
    _dir: tempfile::TempDir,
    socket_path: std::path::PathBuf,
    received: Arc<Mutex<Vec<Vec<u8>>>>,
    handle: JoinHandle<()>,
}

impl MockDaemon {
    /// Bind a socket and serve connections until dropped. Each connection
    /// gets `responses` written back as newline-terminated lines after its
    /// message is read; an empty slice means "read and close immediately".
    pub async fn spawn(responses: &[&str]) -> Self {
        let dir = tempfile::TempDir::new().expect("temp dir for mock daemon");
        let socket_path = dir.path().join("charon.ctl");
        let listener = UnixListener::bind(&socket_path).expect("bind mock daemon socket");

        let received: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);
        let responses: Vec<String> = responses.iter().map(|s| s.to_string()).collect();

        let handle = tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let Some(msg) = read_stroke_msg(&mut stream).await else {
                    continue;
                };
                tracing::debug!(len = msg.len(), "mock daemon received message");
                sink.lock().unwrap().push(msg);
                for line in &responses {
                    if stream.write_all(line.as_bytes()).await.is_err()
                        || stream.write_all(b"\n").await.is_err()
                    {
                        break;
                    }
                }
                // Dropping the stream closes the connection; that is the
                // end-of-response signal the client waits for.
            }
        });

        Self {
            _dir: dir,
            socket_path,
            received,
            handle,
        }
    }

    /// The socket path to point a transport at.
    pub fn path(&self) -> &Path {
        &self.socket_path
    }

    /// Every raw message received so far, in arrival order.
    pub fn received(&self) -> Vec<Vec<u8>> {
        self.received.lock().unwrap().clone()
    }
}

impl Drop for MockDaemon {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Read one length-framed stroke message off the stream.
async fn read_stroke_msg(stream: &mut tokio::net::UnixStream) -> Option<Vec<u8>> {
    let mut len_field = [0u8; 4];
    stream.read_exact(&mut len_field).await.ok()?;
    let len = u32::from_le_bytes(len_field) as usize;
    if len < 4 || len > MSG_CAPACITY {
        return None;
    }
    let mut msg = vec![0u8; len];
    msg[..4].copy_from_slice(&len_field);
    stream.read_exact(&mut msg[4..]).await.ok()?;
    Some(msg)
}
