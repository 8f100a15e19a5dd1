//! Typed configuration consumed by the health-check core.
//!
//! This crate does not parse any proxy configuration directive language. It only
//! defines the shapes that an external config source constructs — in this
//! repository that source is a JSON file loaded by the daemon binary, but the
//! type is equally at home behind a directive parser embedded in a larger proxy.

mod status_mask;

pub use status_mask::StatusMask;

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The kind of protocol probe to run against a peer. Closed set, matching the
/// original module's `ngx_check_types` table — adding a protocol means adding
/// a variant here and an implementation in `check-probes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    Tcp,
    Http,
    SslHello,
    Smtp,
    Mysql,
    Pop3,
    Imap,
}

impl ProbeKind {
    /// Name used in logs and on the status page.
    pub fn name(&self) -> &'static str {
        match self {
            ProbeKind::Tcp => "tcp",
            ProbeKind::Http => "http",
            ProbeKind::SslHello => "ssl_hello",
            ProbeKind::Smtp => "smtp",
            ProbeKind::Mysql => "mysql",
            ProbeKind::Pop3 => "pop3",
            ProbeKind::Imap => "imap",
        }
    }

    /// All probe kinds, for iteration (registry construction, tests, docs).
    pub const ALL: [ProbeKind; 7] = [
        ProbeKind::Tcp,
        ProbeKind::Http,
        ProbeKind::SslHello,
        ProbeKind::Smtp,
        ProbeKind::Mysql,
        ProbeKind::Pop3,
        ProbeKind::Imap,
    ];
}

/// Per-upstream health check configuration. Immutable once constructed; the
/// core never mutates it. Validate once at load time with [`CheckConfig::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    pub kind: ProbeKind,
    /// How often a probe is started against this upstream.
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// How long a single probe cycle (connect through verdict) may run before
    /// it is treated as a failure.
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    /// Consecutive successful verdicts required to flip `down` to `false`.
    pub rise: u32,
    /// Consecutive failed verdicts required to flip `down` to `true`.
    pub fall: u32,
    /// Overrides the probe kind's default acceptable-reply mask. Only
    /// meaningful for `http` and `smtp`; ignored otherwise.
    #[serde(default)]
    pub status_mask: Option<StatusMask>,
    /// Overrides the probe kind's default send payload. Empty means "send
    /// nothing", which is valid for every probe kind including `http`.
    #[serde(default)]
    pub send_override: Option<Vec<u8>>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("rise threshold must be at least 1")]
    ZeroRise,
    #[error("fall threshold must be at least 1")]
    ZeroFall,
    #[error("check interval must be greater than zero")]
    ZeroInterval,
    #[error("check timeout must be greater than zero")]
    ZeroTimeout,
}

impl CheckConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rise == 0 {
            return Err(ConfigError::ZeroRise);
        }
        if self.fall == 0 {
            return Err(ConfigError::ZeroFall);
        }
        if self.interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// The half-interval poll period the scheduler re-arms its timer at,
    /// per §4.6: `max(1s, interval/2)`.
    pub fn poll_period(&self) -> Duration {
        std::cmp::max(Duration::from_secs(1), self.interval / 2)
    }

    /// The jitter ceiling for the very first probe timer, per §4.8:
    /// `max(1s, interval)`.
    pub fn initial_jitter_ceiling(&self) -> Duration {
        std::cmp::max(Duration::from_secs(1), self.interval)
    }
}

/// Top-level module configuration: how large the shared-memory region should be.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShmConfig {
    /// Minimum size of the shared-memory region, in bytes. The daemon takes
    /// the larger of this and `(peer_count + 1) * page_size`.
    #[serde(default)]
    pub min_size_bytes: usize,
}

impl Default for ShmConfig {
    fn default() -> Self {
        ShmConfig { min_size_bytes: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_thresholds() {
        let mut cfg = sample();
        cfg.rise = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroRise));

        let mut cfg = sample();
        cfg.fall = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroFall));
    }

    #[test]
    fn rejects_zero_durations() {
        let mut cfg = sample();
        cfg.interval = Duration::ZERO;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroInterval));

        let mut cfg = sample();
        cfg.timeout = Duration::ZERO;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroTimeout));
    }

    #[test]
    fn poll_period_floors_at_one_second() {
        let mut cfg = sample();
        cfg.interval = Duration::from_millis(500);
        assert_eq!(cfg.poll_period(), Duration::from_secs(1));

        cfg.interval = Duration::from_secs(10);
        assert_eq!(cfg.poll_period(), Duration::from_secs(5));
    }

    #[test]
    fn deserializes_from_json() {
        let json = r#"{
            "kind": "http",
            "interval": "5s",
            "timeout": "2s",
            "rise": 2,
            "fall": 3
        }"#;
        let cfg: CheckConfig = serde_json::from_str(json).unwrap();
        assert_eq!(cfg.kind, ProbeKind::Http);
        assert_eq!(cfg.interval, Duration::from_secs(5));
        assert!(cfg.status_mask.is_none());
        cfg.validate().unwrap();
    }

    fn sample() -> CheckConfig {
        CheckConfig {
            kind: ProbeKind::Tcp,
            interval: Duration::from_secs(5),
            timeout: Duration::from_secs(2),
            rise: 2,
            fall: 3,
            status_mask: None,
            send_override: None,
        }
    }
}
