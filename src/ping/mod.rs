// Ping subsystem: an independent lower-frequency loop performing raw ICMP
// echo with a timeout, merging results into the aggregator's latest network
// sample. It never blocks the main refresh tick.

pub mod icmp;

use std::mem::MaybeUninit;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, ToSocketAddrs};
use std::sync::Arc;
use std::time::{Duration, Instant};

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::aggregator::Aggregator;

/// How often the public address is re-resolved.
const PUBLIC_ADDRESS_REFRESH: Duration = Duration::from_secs(300);

const ECHO_PAYLOAD: &[u8] = b"sysmetrics-echo";

#[derive(Debug, thiserror::Error)]
pub enum PingError {
    #[error("no IPv4 address for host {0:?}")]
    Resolve(String),
    #[error("echo reply timed out")]
    Timeout,
    #[error("reply too short for an ICMP header")]
    Malformed,
    #[error("reply checksum invalid")]
    Checksum,
    #[error("unexpected ICMP type {0}")]
    UnexpectedType(u8),
    #[error("reply identifier mismatch")]
    IdentifierMismatch,
    #[error("reply sequence mismatch")]
    SequenceMismatch,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct PingConfig {
    /// Target host; `None` disables probing.
    pub host: Option<String>,
    pub interval_secs: u64,
    pub timeout_ms: u64,
    pub public_address_url: Option<String>,
}

impl Default for PingConfig {
    fn default() -> Self {
        Self {
            host: None,
            interval_secs: 10,
            timeout_ms: 1000,
            public_address_url: Some("https://api.ipify.org".into()),
        }
    }
}

/// Handle to the running ping loop.
pub struct PingWorker {
    target_tx: watch::Sender<Option<String>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl PingWorker {
    /// Changes the probe target; `None` disables probing. The last
    /// successful reading is left in place either way.
    pub fn set_target(&self, host: Option<String>) {
        self.target_tx.send_replace(host);
    }

    /// Safe to call at any time and repeatedly; an in-flight probe is not
    /// aborted.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            tracing::warn!(error = %e, operation = "ping_stop", "ping task join failed");
        }
    }
}

pub fn spawn(aggregator: Arc<Aggregator>, config: PingConfig) -> PingWorker {
    let (target_tx, target_rx) = watch::channel(config.host.clone());
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
    let interval = Duration::from_secs(config.interval_secs.max(1));
    let timeout = Duration::from_millis(config.timeout_ms.max(1));
    let address_url = config.public_address_url.clone();

    let handle = tokio::spawn(async move {
        let mut tick = tokio::time::interval(interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut address_tick = tokio::time::interval(PUBLIC_ADDRESS_REFRESH);
        address_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut seq: u16 = 0;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let Some(host) = target_rx.borrow().clone() else {
                        continue;
                    };
                    seq = seq.wrapping_add(1);
                    let probe_timeout = timeout;
                    let result = tokio::task::spawn_blocking(move || {
                        probe_blocking(&host, seq, probe_timeout)
                    })
                    .await;
                    match result {
                        Ok(Ok(rtt)) => {
                            aggregator.merge_ping(rtt.as_secs_f64() * 1000.0);
                        }
                        // No update on failure: the last good reading stays.
                        Ok(Err(e)) => {
                            tracing::debug!(error = %e, operation = "ping", "echo probe failed");
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, operation = "ping", "probe task join failed");
                        }
                    }
                }
                _ = address_tick.tick() => {
                    if let Some(url) = address_url.as_deref()
                        && let Some(address) = fetch_public_address(url).await
                    {
                        aggregator.merge_public_address(address);
                    }
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Ping worker shutting down");
                    break;
                }
            }
        }
    });

    PingWorker {
        target_tx,
        shutdown_tx: Some(shutdown_tx),
        handle: Some(handle),
    }
}

async fn fetch_public_address(url: &str) -> Option<String> {
    // Bounded so a stuck lookup cannot stall the probe loop.
    let fetch = async {
        let text = reqwest::get(url).await?.text().await?;
        Ok::<String, reqwest::Error>(text)
    };
    let text = match tokio::time::timeout(Duration::from_secs(10), fetch).await {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            tracing::debug!(error = %e, operation = "public_address", "lookup failed");
            return None;
        }
        Err(_) => {
            tracing::debug!(operation = "public_address", "lookup timed out");
            return None;
        }
    };
    text.trim().parse::<IpAddr>().ok().map(|a| a.to_string())
}

/// One blocking echo exchange, bounded by `timeout`.
fn probe_blocking(host: &str, seq: u16, timeout: Duration) -> Result<Duration, PingError> {
    let addr = resolve(host)?;
    let (socket, raw) = open_socket()?;
    let ident = std::process::id() as u16;
    let packet = icmp::encode_echo_request(ident, seq, ECHO_PAYLOAD);
    let dest: SockAddr = SocketAddr::new(IpAddr::V4(addr), 0).into();

    let started = Instant::now();
    socket.send_to(&packet, &dest)?;
    let deadline = started + timeout;
    // The kernel rewrites the identifier on datagram sockets; only raw
    // replies can be matched on it.
    let expected_ident = raw.then_some(ident);

    let mut buf = [MaybeUninit::<u8>::uninit(); 1024];
    loop {
        let now = Instant::now();
        if now >= deadline {
            return Err(PingError::Timeout);
        }
        socket.set_read_timeout(Some(deadline - now))?;
        let len = match socket.recv_from(&mut buf) {
            Ok((len, _)) => len,
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                return Err(PingError::Timeout);
            }
            Err(e) => return Err(e.into()),
        };
        let reply = unsafe { std::slice::from_raw_parts(buf.as_ptr().cast::<u8>(), len) };
        if icmp::parse_echo_reply(reply, expected_ident, seq).is_ok() {
            return Ok(started.elapsed());
        }
        // Unrelated traffic; keep listening until the deadline.
    }
}

fn open_socket() -> Result<(Socket, bool), PingError> {
    match Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::ICMPV4)) {
        Ok(socket) => Ok((socket, false)),
        Err(_) => {
            let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?;
            Ok((socket, true))
        }
    }
}

fn resolve(host: &str) -> Result<Ipv4Addr, PingError> {
    (host, 0)
        .to_socket_addrs()?
        .find_map(|addr| match addr.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| PingError::Resolve(host.to_string()))
}
