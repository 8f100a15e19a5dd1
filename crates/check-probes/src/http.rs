//! HTTP probe: send a bare `GET / HTTP/1.0` and bucket the status line's
//! reply code against the configured mask, default `2xx | 3xx`.

use crate::probe::{ParseOutcome, Probe};
use check_config::{ProbeKind, StatusMask};

pub const DEFAULT_SEND: &[u8] = b"GET / HTTP/1.0\r\n\r\n";
const DEFAULT_MASK: StatusMask = StatusMask::from_bits_truncate(
    StatusMask::TWO_XX.bits() | StatusMask::THREE_XX.bits(),
);
/// Bail out rather than buffer forever against a peer that never sends a
/// newline; this is generous enough for any real status line.
const MAX_SCAN: usize = 4096;

#[derive(Debug, Default)]
pub struct HttpProbe;

impl Probe for HttpProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Http
    }

    fn default_send_payload(&self) -> &'static [u8] {
        DEFAULT_SEND
    }

    fn default_status_mask(&self) -> StatusMask {
        DEFAULT_MASK
    }

    fn parse(&self, buf: &[u8], mask: StatusMask) -> ParseOutcome {
        match parse_status_line(buf) {
            Some(code) => {
                if mask.contains(StatusMask::bucket(code)) {
                    ParseOutcome::Pass
                } else {
                    ParseOutcome::Fail
                }
            }
            None if buf.len() >= MAX_SCAN => ParseOutcome::Fail,
            None => ParseOutcome::Again,
        }
    }
}

/// Extracts the three-digit status code from an HTTP response's first line
/// (`HTTP/1.x CODE reason`). Returns `None` until a full line has arrived,
/// or if the line never contained a well-formed code once it did.
fn parse_status_line(buf: &[u8]) -> Option<u16> {
    let line_end = buf.windows(2).position(|w| w == b"\r\n")?;
    let line = &buf[..line_end];
    let mut parts = line.split(|&b| b == b' ').filter(|p| !p.is_empty());
    parts.next()?; // "HTTP/1.x"
    let code_bytes = parts.next()?;
    if code_bytes.len() != 3 {
        return None;
    }
    std::str::from_utf8(code_bytes)
        .ok()
        .and_then(|s| s.parse::<u16>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_200_under_default_mask() {
        let p = HttpProbe;
        let outcome = p.parse(b"HTTP/1.1 200 OK\r\nServer: x\r\n\r\n", DEFAULT_MASK);
        assert_eq!(outcome, ParseOutcome::Pass);
    }

    #[test]
    fn rejects_500_under_default_mask() {
        let p = HttpProbe;
        let outcome = p.parse(b"HTTP/1.1 500 Internal Error\r\n\r\n", DEFAULT_MASK);
        assert_eq!(outcome, ParseOutcome::Fail);
    }

    #[test]
    fn custom_mask_can_accept_5xx() {
        let p = HttpProbe;
        let outcome = p.parse(b"HTTP/1.0 503 Busy\r\n\r\n", StatusMask::FIVE_XX);
        assert_eq!(outcome, ParseOutcome::Pass);
    }

    #[test]
    fn waits_for_full_status_line() {
        let p = HttpProbe;
        assert_eq!(p.parse(b"HTTP/1.1 2", DEFAULT_MASK), ParseOutcome::Again);
    }
}
