// Backup folder name dialects

use chrono::NaiveDateTime;
use regex::Regex;

use crate::constants::{BACKUP_STAMP_FORMAT, IN_PROGRESS_SUFFIX};

/// Outcome of matching a backup folder name against the known dialects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StampMatch {
    /// `2025-01-03-095001`
    Dense(NaiveDateTime),
    /// `2025-01-03-095001.backup`, `2025-01-03-095001.local`, ...
    DotSuffixed { taken_at: NaiveDateTime, suffix: String },
    Unrecognized,
}

impl StampMatch {
    pub fn taken_at(&self) -> Option<NaiveDateTime> {
        match self {
            StampMatch::Dense(taken_at) => Some(*taken_at),
            StampMatch::DotSuffixed { taken_at, .. } => Some(*taken_at),
            StampMatch::Unrecognized => None,
        }
    }

    /// Backups still being written are not usable snapshots
    pub fn is_in_progress(&self) -> bool {
        matches!(self, StampMatch::DotSuffixed { suffix, .. } if suffix.eq_ignore_ascii_case(IN_PROGRESS_SUFFIX))
    }
}

type Matcher = fn(&str) -> Option<StampMatch>;

/// Dialects in the order they are tried
const MATCHERS: [Matcher; 2] = [match_dense, match_dot_suffixed];

/// Classify a folder name; the first dialect that parses wins
pub fn classify(folder_name: &str) -> StampMatch {
    MATCHERS
        .iter()
        .find_map(|matcher| matcher(folder_name))
        .unwrap_or(StampMatch::Unrecognized)
}

fn match_dense(folder_name: &str) -> Option<StampMatch> {
    let stamp_regex = Regex::new(r"^\d{4}-\d{2}-\d{2}-\d{6}$").ok()?;
    if !stamp_regex.is_match(folder_name) {
        return None;
    }
    parse_stamp(folder_name).map(StampMatch::Dense)
}

fn match_dot_suffixed(folder_name: &str) -> Option<StampMatch> {
    let stamp_regex = Regex::new(r"^(\d{4}-\d{2}-\d{2}-\d{6})\.([A-Za-z0-9_-]+)$").ok()?;
    let caps = stamp_regex.captures(folder_name)?;
    let taken_at = parse_stamp(caps.get(1)?.as_str())?;
    let suffix = caps.get(2)?.as_str().to_string();
    Some(StampMatch::DotSuffixed { taken_at, suffix })
}

fn parse_stamp(stamp: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(stamp, BACKUP_STAMP_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn expected() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, 3)
            .unwrap()
            .and_hms_opt(9, 50, 1)
            .unwrap()
    }

    #[test]
    fn test_dense_stamp() {
        assert_eq!(classify("2025-01-03-095001"), StampMatch::Dense(expected()));
    }

    #[test]
    fn test_dot_suffixed_stamps() {
        let backup = classify("2025-01-03-095001.backup");
        assert_eq!(backup.taken_at(), Some(expected()));
        assert!(matches!(backup, StampMatch::DotSuffixed { ref suffix, .. } if suffix == "backup"));

        let local = classify("2025-01-03-095001.local");
        assert_eq!(local.taken_at(), Some(expected()));
        assert!(!local.is_in_progress());
    }

    #[test]
    fn test_in_progress_is_flagged() {
        let stamp = classify("2025-01-03-095001.inProgress");
        assert_eq!(stamp.taken_at(), Some(expected()));
        assert!(stamp.is_in_progress());
    }

    #[test]
    fn test_unparsable_names() {
        assert_eq!(classify("scratch"), StampMatch::Unrecognized);
        assert_eq!(classify("Latest"), StampMatch::Unrecognized);
        assert_eq!(classify("2025-13-40-995999"), StampMatch::Unrecognized);
        assert_eq!(classify("2025-01-03-095001.backup.old"), StampMatch::Unrecognized);
    }
}
