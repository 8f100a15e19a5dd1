//! MySQL probe: read the server's initial handshake packet and judge on its
//! very first byte.
//!
//! A real MySQL handshake packet begins with a 3-byte little-endian payload
//! length followed by a 1-byte sequence id, so a payload under 256 bytes
//! (true for essentially every greeting) makes that first byte `0x00`
//! regardless of anything the server actually says. This probe never looks
//! past that byte — preserved unchanged from the module it's drawn from,
//! which checks the same single byte. A MySQL server that fails to start
//! but still leaves something listening on the port long enough to hand
//! back any short reply will still read as healthy; this is a known
//! characteristic of the check; see the open question in the design notes.

use crate::probe::{ParseOutcome, Probe};
use check_config::{ProbeKind, StatusMask};

const EXPECTED_FIRST_BYTE: u8 = 0x00;

#[derive(Debug, Default)]
pub struct MysqlProbe;

impl Probe for MysqlProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Mysql
    }

    fn default_send_payload(&self) -> &'static [u8] {
        b""
    }

    fn default_status_mask(&self) -> StatusMask {
        StatusMask::empty()
    }

    fn parse(&self, buf: &[u8], _mask: StatusMask) -> ParseOutcome {
        match buf.first() {
            None => ParseOutcome::Again,
            Some(&EXPECTED_FIRST_BYTE) => ParseOutcome::Pass,
            Some(_) => ParseOutcome::Fail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_on_leading_zero_byte() {
        let p = MysqlProbe;
        assert_eq!(
            p.parse(&[0x00, 0x00, 0x00, 0x01, 0x0a], StatusMask::empty()),
            ParseOutcome::Pass
        );
    }

    #[test]
    fn fails_on_nonzero_leading_byte() {
        let p = MysqlProbe;
        assert_eq!(
            p.parse(&[0xff, 0x10, 0x04], StatusMask::empty()),
            ParseOutcome::Fail
        );
    }

    #[test]
    fn waits_for_first_byte() {
        let p = MysqlProbe;
        assert_eq!(p.parse(&[], StatusMask::empty()), ParseOutcome::Again);
    }
}
