//! Maps a [`ProbeKind`] to its implementation.
//!
//! The module this is drawn from keeps a static table of function pointers
//! (`check_conf_t ngx_check_types[]`) selected by an integer type code. A
//! closed enum match does the same job here without the indirection or the
//! need to keep a parallel array in sync by hand — adding a probe kind is a
//! compile error in every `match` until this one is updated too.

use crate::http::HttpProbe;
use crate::imap::ImapProbe;
use crate::mysql::MysqlProbe;
use crate::pop3::Pop3Probe;
use crate::probe::Probe;
use crate::smtp::SmtpProbe;
use crate::ssl_hello::SslHelloProbe;
use crate::tcp::TcpProbe;
use check_config::ProbeKind;

/// Returns the shared probe implementation for `kind`. Implementations are
/// stateless, so this is cheap enough to call per probe cycle rather than
/// caching the result.
pub fn probe_for(kind: ProbeKind) -> &'static dyn Probe {
    match kind {
        ProbeKind::Tcp => &TcpProbe,
        ProbeKind::Http => &HttpProbe,
        ProbeKind::SslHello => &SslHelloProbe,
        ProbeKind::Smtp => &SmtpProbe,
        ProbeKind::Mysql => &MysqlProbe,
        ProbeKind::Pop3 => &Pop3Probe,
        ProbeKind::Imap => &ImapProbe,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_probe_kind_resolves() {
        for kind in ProbeKind::ALL {
            assert_eq!(probe_for(kind).kind(), kind);
        }
    }
}
