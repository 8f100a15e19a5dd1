//! A single probe cycle: connect, optionally send, read until the probe's
//! parser reaches a verdict or the cycle times out.
//!
//! The original module drives this as a chain of event handlers
//! (`ngx_http_check_connect_handler` → `send_handler` → `recv_handler`)
//! invoked by nginx's event loop, one state transition per callback. An
//! `async fn` is the same state machine with the states folded into the
//! compiler-generated future instead of named by hand — the module's own
//! design notes call the two approaches equivalent for a strictly
//! sequential per-peer probe, so this rewrite takes the simpler one.

use bytes::BytesMut;
use check_config::{ProbeKind, StatusMask};
use check_probes::{ParseOutcome, Probe};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Initial receive buffer size. The original comments this exact constant
/// with "2048, is it enough?" while doubling it on overflow; this rewrite
/// keeps both the starting size and the doubling strategy.
const INITIAL_RECV_BUF: usize = 2048;
/// Ceiling on how large the receive buffer is allowed to grow before a
/// probe cycle gives up rather than buffering an unbounded reply.
const MAX_RECV_BUF: usize = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleVerdict {
    Pass,
    Fail,
}

#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("connect to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("send to {addr} failed: {source}")]
    Send {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("recv from {addr} failed: {source}")]
    Recv {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("peer {addr} closed the connection before a verdict was reached")]
    ClosedEarly { addr: SocketAddr },
    #[error("probe cycle against {addr} exceeded its {timeout:?} timeout")]
    Timeout { addr: SocketAddr, timeout: Duration },
    #[error("reply from {addr} exceeded the {limit}-byte recv buffer ceiling")]
    BufferExhausted { addr: SocketAddr, limit: usize },
}

/// Runs one connect→send→recv→parse cycle against `addr`, bounded by
/// `timeout`. A transport-level failure (connect refused, reset mid-read,
/// deadline exceeded) is reported as [`CycleError`] rather than folded into
/// [`CycleVerdict::Fail`] — callers that want "anything that isn't a pass
/// counts as down" should map every `Err` to `Fail` themselves, which is
/// exactly what the scheduler does, but the distinction is kept here for
/// logging.
pub async fn run_cycle(
    addr: SocketAddr,
    probe: &dyn Probe,
    send_payload: &[u8],
    mask: StatusMask,
    timeout: Duration,
) -> Result<CycleVerdict, CycleError> {
    tokio::time::timeout(timeout, run_cycle_inner(addr, probe, send_payload, mask))
        .await
        .map_err(|_| CycleError::Timeout { addr, timeout })?
}

async fn run_cycle_inner(
    addr: SocketAddr,
    probe: &dyn Probe,
    send_payload: &[u8],
    mask: StatusMask,
) -> Result<CycleVerdict, CycleError> {
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|source| CycleError::Connect { addr, source })?;

    // The tcp kind's verdict is the connect itself: per spec, a peer that
    // accepts the connection and never sends anything is healthy. Running it
    // through the generic recv loop below would instead block until the
    // peer speaks or the cycle times out, turning a silent-but-healthy
    // backend into a recorded failure.
    if probe.kind() == ProbeKind::Tcp {
        return Ok(CycleVerdict::Pass);
    }

    if !send_payload.is_empty() {
        stream
            .write_all(send_payload)
            .await
            .map_err(|source| CycleError::Send { addr, source })?;
    }

    let mut buf = BytesMut::with_capacity(INITIAL_RECV_BUF);
    loop {
        if buf.capacity() == buf.len() {
            if buf.capacity() >= MAX_RECV_BUF {
                return Err(CycleError::BufferExhausted {
                    addr,
                    limit: MAX_RECV_BUF,
                });
            }
            buf.reserve(buf.capacity().max(INITIAL_RECV_BUF));
        }
        let n = stream
            .read_buf(&mut buf)
            .await
            .map_err(|source| CycleError::Recv { addr, source })?;
        if n == 0 {
            return Err(CycleError::ClosedEarly { addr });
        }
        match probe.parse(&buf, mask) {
            ParseOutcome::Pass => return Ok(CycleVerdict::Pass),
            ParseOutcome::Fail => return Ok(CycleVerdict::Fail),
            ParseOutcome::Again => continue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use check_probes::probe_for;
    use tokio::io::AsyncWriteExt as _;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn tcp_probe_passes_on_bare_connect_even_if_peer_never_sends() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and hold the connection open without ever sending or
            // closing it, so a generic read loop would hang here forever.
            let (sock, _) = listener.accept().await.unwrap();
            std::mem::forget(sock);
        });

        let probe = probe_for(check_config::ProbeKind::Tcp);
        let verdict = run_cycle(addr, probe, b"", StatusMask::empty(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(verdict, CycleVerdict::Pass);
    }

    #[tokio::test]
    async fn pop3_probe_reads_greeting_then_passes() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut sock, _)) = listener.accept().await {
                let _ = sock.write_all(b"+OK ready\r\n").await;
            }
        });

        let probe = probe_for(check_config::ProbeKind::Pop3);
        let verdict = run_cycle(addr, probe, b"", StatusMask::empty(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(verdict, CycleVerdict::Pass);
    }

    #[tokio::test]
    async fn cycle_times_out_against_a_silent_peer() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (sock, _) = listener.accept().await.unwrap();
            // Hold the connection open without ever replying.
            std::mem::forget(sock);
        });

        let probe = probe_for(check_config::ProbeKind::Pop3);
        let result = run_cycle(
            addr,
            probe,
            b"",
            StatusMask::empty(),
            Duration::from_millis(50),
        )
        .await;
        assert!(matches!(result, Err(CycleError::Timeout { .. })));
    }
}
