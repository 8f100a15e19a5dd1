bitflags::bitflags! {
    /// Buckets of reply status code that a probe may accept as a passing verdict.
    ///
    /// The same five buckets are used for both the HTTP and SMTP probes in this
    /// rewrite — the original module keeps separate `NGX_CHECK_HTTP_*` and
    /// `NGX_CHECK_SMTP_*` bit constants, but they mean the same thing (2xx/3xx/4xx/5xx/
    /// unparseable), so one mask type is shared here.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
    pub struct StatusMask: u32 {
        const TWO_XX   = 0b00001;
        const THREE_XX = 0b00010;
        const FOUR_XX  = 0b00100;
        const FIVE_XX  = 0b01000;
        const OTHER    = 0b10000;
    }
}

impl StatusMask {
    /// Buckets a three-digit reply code into the single bit it belongs to.
    pub fn bucket(code: u16) -> StatusMask {
        match code {
            200..=299 => StatusMask::TWO_XX,
            300..=399 => StatusMask::THREE_XX,
            400..=499 => StatusMask::FOUR_XX,
            500..=599 => StatusMask::FIVE_XX,
            _ => StatusMask::OTHER,
        }
    }
}
