//! Static per-tracker constraint table and the read-only validator that
//! checks a loaded metainfo against it. Validation never mutates the
//! metainfo; it only produces a list of rule results.

use log::debug;

use crate::metainfo::Metainfo;

#[derive(Debug, Clone, Copy)]
pub struct TrackerRule {
    pub label: &'static str,
    pub aliases: &'static [&'static str],
    pub max_piece_exp: u32,
    pub content_ranges: Option<&'static [(u64, u32)]>,
    pub requires_private: bool,
    pub max_torrent_bytes: Option<u64>,
}

const MIB: u64 = 1024 * 1024;

/// A small, illustrative set of per-tracker rules. Real deployments would
/// grow this table; the validator logic is independent of its size.
pub const TRACKER_RULES: &[TrackerRule] = &[
    TrackerRule {
        label: "IPTorrents",
        aliases: &["iptorrents.com"],
        max_piece_exp: 23,
        content_ranges: None,
        requires_private: true,
        max_torrent_bytes: Some(MIB),
    },
    TrackerRule {
        label: "PassThePopcorn",
        aliases: &["passthepopcorn.me"],
        max_piece_exp: 24,
        content_ranges: Some(&[(512 * MIB, 18), (2048 * MIB, 20), (8192 * MIB, 22), (u64::MAX, 24)]),
        requires_private: true,
        max_torrent_bytes: None,
    },
    TrackerRule {
        label: "Gazelle-default",
        aliases: &["gazelle"],
        max_piece_exp: 22,
        content_ranges: None,
        requires_private: true,
        max_torrent_bytes: None,
    },
];

pub fn lookup(tracker_url: &str) -> Option<&'static TrackerRule> {
    let lower = tracker_url.to_ascii_lowercase();
    TRACKER_RULES.iter().find(|rule| rule.aliases.iter().any(|alias| lower.contains(alias)))
}

/// Whether `url` parses as a well-formed absolute URL. `create` and `modify`
/// use this to reject a typo'd tracker before it ends up baked into a
/// `.torrent` file; the tracker announce protocol itself is out of scope
/// here.
pub fn is_valid_url(url: &str) -> bool {
    url::Url::parse(url).is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleStatus {
    Pass,
    Fail,
    Warn,
    Info,
    Skip,
}

#[derive(Debug, Clone)]
pub struct RuleResult {
    pub rule: &'static str,
    pub status: RuleStatus,
    pub message: String,
}

/// Checks `metainfo` against the rule set for `tracker_url`. `torrent_bytes`,
/// when known, is the size of the encoded `.torrent` file on disk.
pub fn validate(metainfo: &Metainfo, tracker_url: &str, torrent_bytes: Option<u64>) -> Vec<RuleResult> {
    let mut results = Vec::new();
    let needle = tracker_url.to_ascii_lowercase();

    let has_announce = metainfo.announce().map(|a| a.to_ascii_lowercase().contains(&needle)).unwrap_or(false)
        || metainfo
            .announce_list()
            .map(|tiers| tiers.iter().flatten().any(|u| u.to_ascii_lowercase().contains(&needle)))
            .unwrap_or(false);

    results.push(RuleResult {
        rule: "announce-present",
        status: if has_announce { RuleStatus::Pass } else { RuleStatus::Fail },
        message: if has_announce {
            "an announce URL matches the tracker".to_string()
        } else {
            "no announce URL matches the tracker".to_string()
        },
    });

    let Some(rule) = lookup(tracker_url) else {
        results.push(RuleResult {
            rule: "tracker-known",
            status: RuleStatus::Skip,
            message: format!("no rule set is known for tracker {tracker_url:?}"),
        });
        for result in &results {
            debug!("validate: rule {} -> {:?}: {}", result.rule, result.status, result.message);
        }
        return results;
    };

    if rule.requires_private {
        let status = match metainfo.info().is_private() {
            Some(true) => RuleStatus::Pass,
            Some(false) => RuleStatus::Fail,
            None => RuleStatus::Info,
        };
        results.push(RuleResult {
            rule: "private-flag",
            status,
            message: "tracker requires the private flag to be set".to_string(),
        });
    }

    let piece_exp = metainfo.info().piece_length_exp();
    results.push(RuleResult {
        rule: "piece-length-cap",
        status: if piece_exp <= rule.max_piece_exp { RuleStatus::Pass } else { RuleStatus::Fail },
        message: format!("piece length exponent {piece_exp} against cap {}", rule.max_piece_exp),
    });

    if let Some(ranges) = rule.content_ranges {
        let total = metainfo.info().total_size();
        if let Some((_, recommended)) = ranges.iter().find(|(max_size, _)| total <= *max_size) {
            let status = if *recommended == piece_exp { RuleStatus::Pass } else { RuleStatus::Warn };
            results.push(RuleResult {
                rule: "piece-length-recommendation",
                status,
                message: format!("recommended exponent for this content size is {recommended}, torrent uses {piece_exp}"),
            });
        }
    }

    if let (Some(cap), Some(bytes)) = (rule.max_torrent_bytes, torrent_bytes) {
        results.push(RuleResult {
            rule: "torrent-file-size",
            status: if bytes <= cap { RuleStatus::Pass } else { RuleStatus::Fail },
            message: format!(".torrent file is {bytes} bytes against a cap of {cap}"),
        });
    }

    for result in &results {
        debug!("validate: rule {} -> {:?}: {}", result.rule, result.status, result.message);
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metainfo::{Info, Layout};

    fn sample_metainfo(piece_exp: u32, private: Option<bool>) -> Metainfo {
        let mut info = Info::new("f", piece_exp, vec![[0u8; 20]], Layout::Single { length: 10, md5sum: None });
        info.set_private(private);
        let mut metainfo = Metainfo::new(info);
        metainfo.set_announce(Some("udp://tracker.iptorrents.com:80".to_string()));
        metainfo
    }

    #[test]
    fn url_validity_rejects_garbage_but_accepts_udp_and_http() {
        assert!(is_valid_url("udp://tracker.example:80/announce"));
        assert!(is_valid_url("https://tracker.example/announce"));
        assert!(!is_valid_url("not a url"));
    }

    #[test]
    fn unknown_tracker_skips_after_checking_announce() {
        let metainfo = sample_metainfo(16, Some(true));
        let results = validate(&metainfo, "unknown-tracker.example", None);

        assert_eq!(results[0].rule, "announce-present");
        assert!(results.iter().any(|r| r.rule == "tracker-known" && r.status == RuleStatus::Skip));
    }

    #[test]
    fn known_tracker_reports_info_when_private_flag_is_unset() {
        let metainfo = sample_metainfo(16, None);
        let results = validate(&metainfo, "iptorrents.com", None);

        let private = results.iter().find(|r| r.rule == "private-flag").unwrap();
        assert_eq!(private.status, RuleStatus::Info);
    }

    #[test]
    fn piece_length_over_cap_fails() {
        let metainfo = sample_metainfo(24, Some(true));
        let results = validate(&metainfo, "iptorrents.com", None);

        let cap = results.iter().find(|r| r.rule == "piece-length-cap").unwrap();
        assert_eq!(cap.status, RuleStatus::Fail);
    }

    #[test]
    fn torrent_file_size_over_cap_fails() {
        let metainfo = sample_metainfo(16, Some(true));
        let results = validate(&metainfo, "iptorrents.com", Some(2 * 1024 * 1024));

        let size = results.iter().find(|r| r.rule == "torrent-file-size").unwrap();
        assert_eq!(size.status, RuleStatus::Fail);
    }
}
