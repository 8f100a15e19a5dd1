//! Pure rise/fall hysteresis logic, extracted from `ngx_http_check_status_update`
//! so it can be unit- and property-tested without a shared-memory region.

/// A single pass/fail verdict folded into a peer's streak counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

/// The streak counters and resulting up/down flag for one peer. Rise and
/// fall counts are mutually exclusive: a pass resets the fall streak to zero
/// before incrementing rise, and vice versa, matching the original's
/// `peer->shm->rise_count = 0` / `fall_count = 0` resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HysteresisState {
    pub rise_count: u32,
    pub fall_count: u32,
    pub down: bool,
}

impl HysteresisState {
    /// The state of a freshly created peer: down until it proves otherwise,
    /// per `init_shm_zone` setting `down = 1`.
    pub fn initial() -> Self {
        HysteresisState {
            rise_count: 0,
            fall_count: 0,
            down: true,
        }
    }

    /// Folds one verdict into the state, applying the rise/fall thresholds
    /// from the peer's [`check-config::CheckConfig`]. Returns the updated state;
    /// `down` only flips once the relevant streak reaches its threshold.
    #[must_use]
    pub fn apply(self, verdict: Verdict, rise: u32, fall: u32) -> HysteresisState {
        match verdict {
            Verdict::Pass => {
                let rise_count = self.rise_count.saturating_add(1);
                let down = if rise_count >= rise { false } else { self.down };
                HysteresisState {
                    rise_count,
                    fall_count: 0,
                    down,
                }
            }
            Verdict::Fail => {
                let fall_count = self.fall_count.saturating_add(1);
                let down = if fall_count >= fall { true } else { self.down };
                HysteresisState {
                    rise_count: 0,
                    fall_count,
                    down,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_down_until_rise_threshold_reached() {
        let mut s = HysteresisState::initial();
        assert!(s.down);
        s = s.apply(Verdict::Pass, 3, 2);
        assert!(s.down);
        s = s.apply(Verdict::Pass, 3, 2);
        assert!(s.down);
        s = s.apply(Verdict::Pass, 3, 2);
        assert!(!s.down);
    }

    #[test]
    fn single_fail_resets_rise_streak() {
        let mut s = HysteresisState::initial();
        s = s.apply(Verdict::Pass, 3, 2);
        s = s.apply(Verdict::Pass, 3, 2);
        assert_eq!(s.rise_count, 2);
        s = s.apply(Verdict::Fail, 3, 2);
        assert_eq!(s.rise_count, 0);
        assert_eq!(s.fall_count, 1);
    }

    #[test]
    fn flips_up_then_back_down() {
        let mut s = HysteresisState::initial();
        for _ in 0..2 {
            s = s.apply(Verdict::Pass, 2, 2);
        }
        assert!(!s.down);
        for _ in 0..2 {
            s = s.apply(Verdict::Fail, 2, 2);
        }
        assert!(s.down);
    }

    #[quickcheck_macros::quickcheck]
    fn rise_and_fall_counts_never_both_nonzero(verdicts: Vec<bool>, rise: u32, fall: u32) -> bool {
        let rise = rise % 8 + 1;
        let fall = fall % 8 + 1;
        let mut s = HysteresisState::initial();
        for v in verdicts {
            let verdict = if v { Verdict::Pass } else { Verdict::Fail };
            s = s.apply(verdict, rise, fall);
            if s.rise_count != 0 && s.fall_count != 0 {
                return false;
            }
        }
        true
    }
}
