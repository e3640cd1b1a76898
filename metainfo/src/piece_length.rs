//! Pure piece-length policy: chooses an exponent `e` (piece length is
//! `1 << e`) from total content size, user overrides, and the tracker rules
//! table. No I/O; same inputs always produce the same result.

use log::debug;

use crate::error::ConfigError;
use crate::tracker;

pub const MIN_EXP: u32 = 14;
pub const MAX_EXP: u32 = 24;

/// Default table: content size upper bound -> recommended exponent, used
/// when no tracker rule narrows the choice.
const DEFAULT_TABLE: &[(u64, u32)] = &[
    (58 * 1024 * 1024, 16),
    (122 * 1024 * 1024, 17),
    (213 * 1024 * 1024, 18),
    (444 * 1024 * 1024, 19),
    (922 * 1024 * 1024, 20),
    (3977 * 1024 * 1024, 21),
    (6861 * 1024 * 1024, 22),
    (14234 * 1024 * 1024, 23),
];

#[derive(Debug, Clone, Default)]
pub struct PieceLengthOptions {
    pub user_exp: Option<u32>,
    pub user_max_exp: Option<u32>,
    pub tracker_url: Option<String>,
}

pub fn choose(total_size: u64, options: &PieceLengthOptions) -> Result<u32, ConfigError> {
    let mut max_exp = MAX_EXP;

    let rule = options.tracker_url.as_deref().and_then(tracker::lookup);
    if let Some(rule) = rule {
        max_exp = max_exp.min(rule.max_piece_exp);
    }

    // A tracker's content-size table is mandated policy, not a default: it
    // wins over an explicit user exponent, not just over the fallback table.
    if let Some(rule) = rule {
        if let Some(ranges) = rule.content_ranges {
            let chosen = ranges
                .iter()
                .find(|(max_size, _)| total_size <= *max_size)
                .map(|(_, exp)| *exp)
                .or_else(|| ranges.last().map(|(_, exp)| *exp))
                .unwrap_or_else(|| default_exp(total_size));
            let clamped = chosen.clamp(MIN_EXP, max_exp);
            debug!("piece-length: exponent {clamped} from tracker {} content-size table for {total_size} bytes", rule.label);
            return Ok(clamped);
        }
    }

    if let Some(user_exp) = options.user_exp {
        if let Some(rule) = rule {
            if user_exp > rule.max_piece_exp {
                return Err(ConfigError::TrackerCapExceeded { exp: user_exp, cap: rule.max_piece_exp, tracker: rule.label.to_string() });
            }
        }
        if user_exp < MIN_EXP || user_exp > max_exp {
            return Err(ConfigError::PieceLengthOutOfRange { exp: user_exp, min: MIN_EXP, max: max_exp });
        }
        debug!("piece-length: exponent {user_exp} from explicit user override");
        return Ok(user_exp);
    }

    if let Some(user_max) = options.user_max_exp {
        max_exp = max_exp.min(user_max).max(MIN_EXP);
    }

    let clamped = default_exp(total_size).clamp(MIN_EXP, max_exp);
    debug!("piece-length: exponent {clamped} from the default size table for {total_size} bytes");
    Ok(clamped)
}

fn default_exp(total_size: u64) -> u32 {
    for &(max_size, exp) in DEFAULT_TABLE {
        if total_size <= max_size {
            return exp;
        }
    }
    MAX_EXP
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_scale_with_content_size() {
        assert_eq!(choose(1024, &PieceLengthOptions::default()).unwrap(), 16);
        assert_eq!(choose(1024 * 1024 * 1024, &PieceLengthOptions::default()).unwrap(), 21);
    }

    #[test]
    fn user_exponent_outside_range_is_an_error() {
        let options = PieceLengthOptions { user_exp: Some(30), ..Default::default() };
        assert!(matches!(choose(1024, &options), Err(ConfigError::PieceLengthOutOfRange { .. })));
    }

    #[test]
    fn user_exponent_within_range_is_honored_regardless_of_content_size() {
        let options = PieceLengthOptions { user_exp: Some(18), ..Default::default() };
        assert_eq!(choose(10, &options).unwrap(), 18);
    }

    #[test]
    fn tracker_cap_overrides_a_higher_user_max() {
        let options = PieceLengthOptions {
            user_max_exp: Some(24),
            tracker_url: Some("iptorrents.com".to_string()),
            ..Default::default()
        };
        let chosen = choose(20 * 1024 * 1024 * 1024, &options).unwrap();
        assert!(chosen <= 23);
    }

    #[test]
    fn tracker_cap_rejects_an_explicit_user_exponent_above_it() {
        let options = PieceLengthOptions {
            user_exp: Some(24),
            tracker_url: Some("iptorrents.com".to_string()),
            ..Default::default()
        };
        assert!(matches!(choose(1024, &options), Err(ConfigError::TrackerCapExceeded { .. })));
    }

    #[test]
    fn trackers_content_size_table_wins_over_an_explicit_user_exponent() {
        let options = PieceLengthOptions {
            user_exp: Some(16),
            tracker_url: Some("passthepopcorn.me".to_string()),
            ..Default::default()
        };
        // 1 GiB falls in PassThePopcorn's 2048 MiB bracket (exponent 20), which
        // must win even though the caller asked for 16 explicitly.
        let chosen = choose(1024 * 1024 * 1024, &options).unwrap();
        assert_eq!(chosen, 20);
    }

    #[test]
    fn result_is_always_a_valid_power_of_two_exponent() {
        for size in [0u64, 1, 1 << 20, 1 << 34] {
            let exp = choose(size, &PieceLengthOptions::default()).unwrap();
            assert!((MIN_EXP..=MAX_EXP).contains(&exp));
        }
    }
}
