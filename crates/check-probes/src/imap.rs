//! IMAP probe: read the server greeting, skip past the leading tag up to
//! the first space, and check that the next two bytes are `OK` (the
//! untagged server greeting is `* OK ...`).

use crate::probe::{ParseOutcome, Probe};
use check_config::{ProbeKind, StatusMask};

const MAX_SCAN: usize = 64;

#[derive(Debug, Default)]
pub struct ImapProbe;

impl Probe for ImapProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Imap
    }

    fn default_send_payload(&self) -> &'static [u8] {
        b""
    }

    fn default_status_mask(&self) -> StatusMask {
        StatusMask::empty()
    }

    fn parse(&self, buf: &[u8], _mask: StatusMask) -> ParseOutcome {
        let Some(space) = buf.iter().position(|&b| b == b' ') else {
            return if buf.len() >= MAX_SCAN {
                ParseOutcome::Fail
            } else {
                ParseOutcome::Again
            };
        };
        let after = &buf[space + 1..];
        if after.len() < 2 {
            return ParseOutcome::Again;
        }
        if &after[..2] == b"OK" {
            ParseOutcome::Pass
        } else {
            ParseOutcome::Fail
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_untagged_ok_greeting() {
        let p = ImapProbe;
        assert_eq!(
            p.parse(b"* OK IMAP4rev1 ready\r\n", StatusMask::empty()),
            ParseOutcome::Pass
        );
    }

    #[test]
    fn rejects_bye_greeting() {
        let p = ImapProbe;
        assert_eq!(
            p.parse(b"* BYE server unavailable\r\n", StatusMask::empty()),
            ParseOutcome::Fail
        );
    }

    #[test]
    fn waits_for_space_and_two_bytes_after_it() {
        let p = ImapProbe;
        assert_eq!(p.parse(b"*", StatusMask::empty()), ParseOutcome::Again);
        assert_eq!(p.parse(b"* O", StatusMask::empty()), ParseOutcome::Again);
    }
}
