//! Plain TCP reachability: a completed, non-reset connect is the whole
//! verdict. The original module's peek handler additionally tries a
//! non-blocking `MSG_PEEK` read purely to detect a connection the peer
//! has already reset; this rewrite's transport layer treats that as a
//! connect-time failure instead, so the parser here never runs.

use crate::probe::{ParseOutcome, Probe};
use check_config::{ProbeKind, StatusMask};

#[derive(Debug, Default)]
pub struct TcpProbe;

impl Probe for TcpProbe {
    fn kind(&self) -> ProbeKind {
        ProbeKind::Tcp
    }

    fn default_send_payload(&self) -> &'static [u8] {
        b""
    }

    fn default_status_mask(&self) -> StatusMask {
        StatusMask::empty()
    }

    fn parse(&self, _buf: &[u8], _mask: StatusMask) -> ParseOutcome {
        ParseOutcome::Pass
    }
}
