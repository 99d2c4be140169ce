//! Persistent TCP line streams between peers (spec §4.5).
//!
//! Each configured peer gets one outbound, newline-delimited JSON
//! stream used for sending; inbound connections accepted on the
//! listen socket are read-only and feed the router.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use crate::error::{Result, SsamError};
use crate::network::message::Envelope;
use crate::network::router::MessageRouter;

/// Default bind address (spec §4.5: listening port is fixed, bind
/// address is `0.0.0.0`).
pub const DEFAULT_PORT: u16 = 5000;

const MAX_CONNECT_ATTEMPTS: u32 = 3;
/// Within the spec's stated 2-5 second backoff range.
const CONNECT_BACKOFF: Duration = Duration::from_secs(3);

pub struct PeerTransport {
    listen_addr: String,
    peers: Vec<String>,
    outbound: Arc<DashMap<String, Mutex<OwnedWriteHalf>>>,
}

impl PeerTransport {
    pub fn new(listen_addr: impl Into<String>, peers: Vec<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            peers,
            outbound: Arc::new(DashMap::new()),
        }
    }

    /// Launches the accept loop and dials every configured peer.
    /// Returns once the listener is bound; outbound connects and the
    /// accept loop continue running in spawned tasks.
    pub async fn start(&self, router: Arc<MessageRouter>) -> Result<()> {
        let listener = TcpListener::bind(&self.listen_addr).await?;
        log::info!("listening on {}", self.listen_addr);

        {
            let router = Arc::clone(&router);
            tokio::spawn(async move {
                loop {
                    match listener.accept().await {
                        Ok((stream, addr)) => {
                            log::info!("accepted connection from {}", addr);
                            let router = Arc::clone(&router);
                            tokio::spawn(async move {
                                if let Err(e) = Self::read_loop(stream, router).await {
                                    log::warn!("connection from {} closed: {}", addr, e);
                                }
                            });
                        }
                        Err(e) => {
                            log::warn!("accept failed: {}", e);
                        }
                    }
                }
            });
        }

        for peer in self.peers.clone() {
            let outbound = Arc::clone(&self.outbound);
            tokio::spawn(async move {
                Self::connect_with_retry(peer, outbound).await;
            });
        }

        Ok(())
    }

    async fn connect_with_retry(peer: String, outbound: Arc<DashMap<String, Mutex<OwnedWriteHalf>>>) {
        for attempt in 1..=MAX_CONNECT_ATTEMPTS {
            match TcpStream::connect(&peer).await {
                Ok(stream) => {
                    let (_read_half, write_half) = stream.into_split();
                    outbound.insert(peer.clone(), Mutex::new(write_half));
                    log::info!("connected to peer {}", peer);
                    return;
                }
                Err(e) => {
                    log::warn!(
                        "connect attempt {}/{} to {} failed: {}",
                        attempt,
                        MAX_CONNECT_ATTEMPTS,
                        peer,
                        e
                    );
                    if attempt < MAX_CONNECT_ATTEMPTS {
                        tokio::time::sleep(CONNECT_BACKOFF).await;
                    }
                }
            }
        }
        log::warn!(
            "giving up on peer {} after {} attempts",
            peer,
            MAX_CONNECT_ATTEMPTS
        );
    }

    async fn read_loop(stream: TcpStream, router: Arc<MessageRouter>) -> Result<()> {
        let mut lines = BufReader::new(stream).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match Envelope::from_line(&line) {
                Ok(envelope) => router.dispatch(envelope),
                Err(e) => log::warn!("dropping undecodable message: {}", e),
            }
        }
        Ok(())
    }

    /// Writes `json(msg) + "\n"` to the outbound connection keyed by
    /// `peer`, flushing after. Fails with [`SsamError::Connection`] if
    /// there is no registered outbound connection for `peer`.
    pub async fn send_message(&self, peer: &str, envelope: &Envelope) -> Result<()> {
        let entry = self
            .outbound
            .get(peer)
            .ok_or_else(|| SsamError::Connection(format!("no connection to {}", peer)))?;
        let mut writer = entry.lock().await;
        let line = envelope.to_line()?;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Sends `envelope` to every configured peer concurrently. Each
    /// failure is logged and isolated; it does not affect delivery to
    /// other peers.
    pub async fn broadcast_message(&self, envelope: &Envelope) {
        let sends = self.peers.iter().map(|peer| async move {
            if let Err(e) = self.send_message(peer, envelope).await {
                log::warn!("broadcast to {} failed: {}", peer, e);
            }
        });
        futures::future::join_all(sends).await;
    }

    /// Closes every registered outbound connection.
    pub async fn stop(&self) {
        for mut entry in self.outbound.iter_mut() {
            let _ = entry.value_mut().get_mut().shutdown().await;
        }
        self.outbound.clear();
    }
}
