//! SMTP probe: send `HELO smtp.localdomain` and bucket the reply code,
//! default `2xx` only. Falls back to a lenient first-byte check when the
//! reply doesn't parse as a standard `CODE[- ]text` line but still starts
//! with '2' — some greeting-only servers reply before HELO is even read.

use crate::probe::{ParseOutcome, Probe};
use check_config::{ProbeKind, StatusMask};

pub const DEFAULT_SEND: &[u8] = b"HELO smtp.localdomain\r\n";
const DEFAULT_MASK: StatusMask = StatusMask::TWO_XX;
const MAX_SCAN: usize = 4096;

#[derive(Debug, Default)]
pub struct SmtpProbe;

impl Probe for SmtpProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Smtp
    }

    fn default_send_payload(&self) -> &'static [u8] {
        DEFAULT_SEND
    }

    fn default_status_mask(&self) -> StatusMask {
        DEFAULT_MASK
    }

    fn parse(&self, buf: &[u8], mask: StatusMask) -> ParseOutcome {
        let Some(line_end) = buf.windows(2).position(|w| w == b"\r\n") else {
            return if buf.len() >= MAX_SCAN {
                ParseOutcome::Fail
            } else {
                ParseOutcome::Again
            };
        };
        let line = &buf[..line_end];
        match parse_reply_code(line) {
            Some(code) if mask.contains(StatusMask::bucket(code)) => ParseOutcome::Pass,
            Some(_) => ParseOutcome::Fail,
            None if line.first() == Some(&b'2') => ParseOutcome::Pass,
            None => ParseOutcome::Fail,
        }
    }
}

/// Parses a `CODE-text` or `CODE text` reply line into its three-digit code.
fn parse_reply_code(line: &[u8]) -> Option<u16> {
    if line.len() < 3 {
        return None;
    }
    let code_bytes = &line[..3];
    if line.len() > 3 && !matches!(line[3], b' ' | b'-') {
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
    fn accepts_250_ok() {
        let p = SmtpProbe;
        assert_eq!(
            p.parse(b"250 mail.example.com Hello\r\n", DEFAULT_MASK),
            ParseOutcome::Pass
        );
    }

    #[test]
    fn rejects_550() {
        let p = SmtpProbe;
        assert_eq!(
            p.parse(b"550 relay denied\r\n", DEFAULT_MASK),
            ParseOutcome::Fail
        );
    }

    #[test]
    fn lenient_fallback_on_unparseable_2xx_style_banner() {
        let p = SmtpProbe;
        // No space/dash after the code, so the strict parse fails, but the
        // line still starts with '2'.
        assert_eq!(p.parse(b"2zz\r\n", DEFAULT_MASK), ParseOutcome::Pass);
    }

    #[test]
    fn lenient_fallback_does_not_rescue_non_2xx() {
        let p = SmtpProbe;
        assert_eq!(p.parse(b"5zz\r\n", DEFAULT_MASK), ParseOutcome::Fail);
    }
}
