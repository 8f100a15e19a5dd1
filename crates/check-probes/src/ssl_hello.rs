//! SSLv3 ClientHello probe: send a fixed ClientHello record and check that
//! the reply starts with a TLS/SSL record of type Handshake carrying a
//! ServerHello. This rewrite does not attempt a real handshake — like the
//! original, it only reads enough of the record header to recognize a
//! plausible ServerHello, then declares victory.

use crate::probe::{ParseOutcome, Probe};
use check_config::{ProbeKind, StatusMask};

const RECORD_TYPE_HANDSHAKE: u8 = 0x16;
const HANDSHAKE_TYPE_SERVER_HELLO: u8 = 0x02;

/// The literal 127-byte SSLv3 ClientHello record. Built from a TLS record
/// header (type 0x16, version 0x0300), a ClientHello handshake header, a
/// fixed 29-byte "random" field, an empty session id, and the 39-entry
/// cipher suite list used across the module family this probe is drawn
/// from. Receiving servers treat the random field as opaque, so its exact
/// contents only need to be the right length, not cryptographically random.
#[rustfmt::skip]
pub const CLIENT_HELLO: [u8; 127] = [
    0x16, 0x03, 0x00, 0x00, 0x7a, 0x01, 0x00, 0x00, 0x76, 0x03, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x4e, 0x47, 0x58, 0x5f, 0x48, 0x54, 0x54, 0x50, 0x5f,
    0x43, 0x48, 0x45, 0x43, 0x4b, 0x5f, 0x53, 0x53, 0x4c, 0x5f, 0x48, 0x45,
    0x4c, 0x4c, 0x4f, 0x0a, 0x0a, 0x0a, 0x0a, 0x0a, 0x00, 0x00, 0x4e, 0x00,
    0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x04, 0x00, 0x05, 0x00, 0x06, 0x00,
    0x07, 0x00, 0x08, 0x00, 0x09, 0x00, 0x0a, 0x00, 0x0b, 0x00, 0x0c, 0x00,
    0x0d, 0x00, 0x0e, 0x00, 0x0f, 0x00, 0x10, 0x00, 0x11, 0x00, 0x12, 0x00,
    0x13, 0x00, 0x14, 0x00, 0x15, 0x00, 0x16, 0x00, 0x17, 0x00, 0x18, 0x00,
    0x19, 0x00, 0x1a, 0x00, 0x1b, 0x00, 0x2f, 0x00, 0x30, 0x00, 0x31, 0x00,
    0x32, 0x00, 0x33, 0x00, 0x34, 0x00, 0x35, 0x00, 0x36, 0x00, 0x37, 0x00,
    0x38, 0x00, 0x39, 0x00, 0x3a, 0x01, 0x00,
];

#[derive(Debug, Default)]
pub struct SslHelloProbe;

impl Probe for SslHelloProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::SslHello
    }

    fn default_send_payload(&self) -> &'static [u8] {
        &CLIENT_HELLO
    }

    fn default_status_mask(&self) -> StatusMask {
        StatusMask::empty()
    }

    fn parse(&self, buf: &[u8], _mask: StatusMask) -> ParseOutcome {
        if buf.len() < 6 {
            return ParseOutcome::Again;
        }
        if buf[0] == RECORD_TYPE_HANDSHAKE && buf[5] == HANDSHAKE_TYPE_SERVER_HELLO {
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
    fn client_hello_is_exactly_127_bytes() {
        assert_eq!(CLIENT_HELLO.len(), 127);
        assert_eq!(CLIENT_HELLO[0], 0x16);
    }

    #[test]
    fn accepts_server_hello_record() {
        let p = SslHelloProbe;
        let reply = [0x16, 0x03, 0x00, 0x00, 0x4a, 0x02, 0x00, 0x00];
        assert_eq!(p.parse(&reply, StatusMask::empty()), ParseOutcome::Pass);
    }

    #[test]
    fn rejects_alert_record() {
        let p = SslHelloProbe;
        let reply = [0x15, 0x03, 0x00, 0x00, 0x02, 0x02, 0x28];
        assert_eq!(p.parse(&reply, StatusMask::empty()), ParseOutcome::Fail);
    }

    #[test]
    fn waits_for_handshake_type_byte() {
        let p = SslHelloProbe;
        assert_eq!(
            p.parse(&[0x16, 0x03, 0x00], StatusMask::empty()),
            ParseOutcome::Again
        );
    }
}
