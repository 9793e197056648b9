// wallpanel — turn a spare screen into a presence-aware wall display

//! MJPEG broadcast server.
//!
//! Streams the most recently published frame to every connected viewer over
//! a persistent `multipart/x-mixed-replace` connection. Each viewer gets a
//! bounded frame queue and a dedicated writer task, so one slow or dead
//! viewer never delays or corrupts delivery to the rest.

use anyhow::{Context, Result};
use bytes::Bytes;
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Multipart boundary token. Fixed: standard MJPEG viewers match the
/// handshake and part framing byte-for-byte.
const BOUNDARY: &str = "frame";

/// Handshake written to every accepted connection.
const STREAM_HEADER: &[u8] = b"HTTP/1.1 200 OK\r\n\
Content-Type: multipart/x-mixed-replace; boundary=frame\r\n\
Connection: close\r\n\
\r\n";

/// Frames queued per viewer before the publisher starts skipping frames for
/// that viewer.
const CLIENT_QUEUE_DEPTH: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerStatus {
    Stopped,
    Running,
}

struct Client {
    frames: mpsc::Sender<Bytes>,
    writer: JoinHandle<()>,
}

pub struct MjpegServer {
    port: u16,
    status: RwLock<ServerStatus>,
    local_addr: RwLock<Option<SocketAddr>>,
    accept_task: Mutex<Option<JoinHandle<()>>>,
    clients: Arc<DashMap<u64, Client>>,
    last_frame: Arc<RwLock<Option<Bytes>>>,
    next_client_id: Arc<AtomicU64>,
}

impl MjpegServer {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            status: RwLock::new(ServerStatus::Stopped),
            local_addr: RwLock::new(None),
            accept_task: Mutex::new(None),
            clients: Arc::new(DashMap::new()),
            last_frame: Arc::new(RwLock::new(None)),
            next_client_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Begin listening and accepting viewers.
    ///
    /// Idempotent: calling while already running is a no-op. A bind failure
    /// leaves the server stopped and is returned to the caller, which owns
    /// the retry decision.
    pub async fn start(&self) -> Result<()> {
        let mut status = self.status.write().await;
        if *status == ServerStatus::Running {
            debug!("mjpeg server already running");
            return Ok(());
        }

        let listener = TcpListener::bind(("0.0.0.0", self.port))
            .await
            .with_context(|| format!("failed to bind mjpeg stream port {}", self.port))?;
        let addr = listener.local_addr().context("listener has no local addr")?;
        info!("mjpeg server listening on {}", addr);

        *self.local_addr.write().await = Some(addr);
        let task = tokio::spawn(accept_loop(
            listener,
            self.clients.clone(),
            self.last_frame.clone(),
            self.next_client_id.clone(),
        ));
        *self.accept_task.lock().await = Some(task);
        *status = ServerStatus::Running;
        Ok(())
    }

    /// Cache `frame` as the most recent and fan it out to every connected
    /// viewer. With no viewers connected this is a cheap state update only.
    pub async fn publish(&self, frame: Bytes) {
        *self.last_frame.write().await = Some(frame.clone());
        if self.clients.is_empty() {
            return;
        }

        let mut dead = Vec::new();
        for entry in self.clients.iter() {
            match entry.value().frames.try_send(frame.clone()) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    // Slow viewer: skip this frame for them rather than
                    // stalling the publisher.
                    debug!("viewer {} lagging, frame skipped", entry.key());
                }
                Err(TrySendError::Closed(_)) => dead.push(*entry.key()),
            }
        }
        for id in dead {
            if let Some((_, client)) = self.clients.remove(&id) {
                client.writer.abort();
            }
        }
    }

    /// Stop accepting viewers, close the listener, and drop every connected
    /// viewer. Idempotent.
    pub async fn stop(&self) {
        let mut status = self.status.write().await;
        if *status == ServerStatus::Stopped {
            debug!("mjpeg server already stopped");
            return;
        }
        *status = ServerStatus::Stopped;
        *self.local_addr.write().await = None;

        if let Some(task) = self.accept_task.lock().await.take() {
            task.abort();
        }
        let ids: Vec<u64> = self.clients.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            if let Some((_, client)) = self.clients.remove(&id) {
                client.writer.abort();
            }
        }
        info!("mjpeg server stopped");
    }

    pub async fn is_running(&self) -> bool {
        *self.status.read().await == ServerStatus::Running
    }

    /// Address actually bound, once running. Useful when the configured port
    /// is 0.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.read().await
    }

    pub fn viewer_count(&self) -> usize {
        self.clients.len()
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

async fn accept_loop(
    listener: TcpListener,
    clients: Arc<DashMap<u64, Client>>,
    last_frame: Arc<RwLock<Option<Bytes>>>,
    next_client_id: Arc<AtomicU64>,
) {
    loop {
        let (mut stream, addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                // One failed accept must not take the stream server down.
                warn!("viewer accept failed: {}", e);
                continue;
            }
        };

        if let Err(e) = stream.write_all(STREAM_HEADER).await {
            debug!("viewer {} dropped during handshake: {}", addr, e);
            continue;
        }

        let id = next_client_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(CLIENT_QUEUE_DEPTH);
        // New viewers should not have to wait for the next motion event:
        // seed the queue with the most recent frame.
        if let Some(frame) = last_frame.read().await.clone() {
            let _ = tx.try_send(frame);
        }
        let writer = tokio::spawn(client_writer(id, addr, stream, rx, clients.clone()));
        clients.insert(id, Client { frames: tx, writer });
        info!("viewer {} connected from {} ({} total)", id, addr, clients.len());
    }
}

/// Drain one viewer's frame queue into its socket. The first write failure
/// unregisters the viewer; the rest of the viewers are untouched.
async fn client_writer(
    id: u64,
    addr: SocketAddr,
    mut stream: TcpStream,
    mut frames: mpsc::Receiver<Bytes>,
    clients: Arc<DashMap<u64, Client>>,
) {
    while let Some(frame) = frames.recv().await {
        if let Err(e) = write_frame(&mut stream, &frame).await {
            debug!("viewer {} ({}) write failed, dropping: {}", id, addr, e);
            break;
        }
    }
    clients.remove(&id);
    debug!("viewer {} disconnected", id);
}

async fn write_frame(stream: &mut TcpStream, frame: &Bytes) -> std::io::Result<()> {
    let part_header = format!(
        "--{BOUNDARY}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        frame.len()
    );
    stream.write_all(part_header.as_bytes()).await?;
    stream.write_all(frame).await?;
    stream.write_all(b"\r\n").await?;
    stream.flush().await
}
