//! Admission cycles, peer tolerance windows and the coarsened cohort cache key.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use super::source::{PeerQuery, SubmissionId};

/// Month in which a new admission cycle opens.
const CYCLE_START_MONTH: u32 = 8;

/// Admission cycle identified by the calendar year it opens, e.g. `2025-2026`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AdmissionCycle {
    start_year: i32,
}

impl AdmissionCycle {
    pub const fn new(start_year: i32) -> Self {
        Self { start_year }
    }

    pub const fn start_year(self) -> i32 {
        self.start_year
    }

    /// Cycle open on `date`; cycles run August through July.
    pub fn containing(date: NaiveDate) -> Self {
        if date.month() >= CYCLE_START_MONTH {
            Self::new(date.year())
        } else {
            Self::new(date.year() - 1)
        }
    }

    pub fn current() -> Self {
        Self::containing(Local::now().date_naive())
    }
}

impl fmt::Display for AdmissionCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_year, self.start_year + 1)
    }
}

impl FromStr for AdmissionCycle {
    type Err = CycleParseError;

    /// Accepts `2025-2026` and `2025-26`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let invalid = || CycleParseError {
            value: raw.to_string(),
        };

        let (start, end) = raw.trim().split_once('-').ok_or_else(invalid)?;
        let start_year: i32 = start.trim().parse().map_err(|_| invalid())?;
        let end = end.trim();
        let end_matches = match end.len() {
            4 => end.parse::<i32>().ok() == Some(start_year + 1),
            2 => end.parse::<i32>().ok() == Some((start_year + 1).rem_euclid(100)),
            _ => false,
        };

        if start.trim().len() == 4 && end_matches {
            Ok(Self::new(start_year))
        } else {
            Err(invalid())
        }
    }
}

impl TryFrom<String> for AdmissionCycle {
    type Error = CycleParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AdmissionCycle> for String {
    fn from(value: AdmissionCycle) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{value}' is not an admission cycle (expected YYYY-YYYY or YYYY-YY)")]
pub struct CycleParseError {
    pub value: String,
}

/// Tolerance windows defining a peer of the requester.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeerWindow {
    pub gpa: f64,
    pub sat: u16,
    pub act: u8,
}

impl Default for PeerWindow {
    fn default() -> Self {
        Self {
            gpa: 0.15,
            sat: 80,
            act: 3,
        }
    }
}

/// Canonical, coarsened form of a [`PeerQuery`] used as the cohort cache key.
///
/// GPA is rounded to the nearest 0.1, SAT to the nearest 20 and the major is
/// normalized, so near-identical profiles share an entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CohortKey {
    gpa_tenths: Option<u8>,
    sat: Option<u16>,
    act: Option<u8>,
    major: Option<String>,
    cycle: AdmissionCycle,
    exclude_submission: Option<SubmissionId>,
}

impl CohortKey {
    pub fn from_query(query: &PeerQuery) -> Self {
        Self {
            gpa_tenths: query
                .gpa
                .filter(|gpa| gpa.is_finite())
                .map(|gpa| (gpa.clamp(0.0, 4.0) * 10.0).round() as u8),
            sat: query
                .sat
                .map(|sat| ((u32::from(sat) + 10) / 20 * 20) as u16),
            act: query.act,
            major: query.intended_major.as_deref().and_then(normalize_major),
            cycle: query.cycle,
            exclude_submission: query.exclude_submission.clone(),
        }
    }

    /// The coarsened query this key stands for; running it keeps cache hits exact.
    pub fn to_query(&self) -> PeerQuery {
        PeerQuery {
            gpa: self.gpa_tenths.map(|tenths| f64::from(tenths) / 10.0),
            sat: self.sat,
            act: self.act,
            intended_major: self.major.clone(),
            cycle: self.cycle,
            exclude_submission: self.exclude_submission.clone(),
        }
    }

    pub fn cycle(&self) -> AdmissionCycle {
        self.cycle
    }
}

/// Lowercase alphanumeric words separated by single spaces; `None` when nothing remains.
pub fn normalize_major(raw: &str) -> Option<String> {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                ' '
            }
        })
        .collect();
    let normalized = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(gpa: f64, sat: u16, act: Option<u8>) -> PeerQuery {
        PeerQuery {
            gpa: Some(gpa),
            sat: Some(sat),
            act,
            intended_major: Some("Computer Science".to_string()),
            cycle: AdmissionCycle::new(2025),
            exclude_submission: None,
        }
    }

    #[test]
    fn near_identical_profiles_share_a_key() {
        let a = CohortKey::from_query(&query(3.87, 1487, Some(33)));
        let b = CohortKey::from_query(&query(3.92, 1476, Some(33)));
        assert_eq!(a, b);
        assert_eq!(a.to_query().sat, Some(1480));
        assert_eq!(a.to_query().gpa, Some(3.9));
    }

    #[test]
    fn sat_rounds_half_up_to_twenty() {
        assert_eq!(CohortKey::from_query(&query(3.5, 1490, None)).sat, Some(1500));
        assert_eq!(CohortKey::from_query(&query(3.5, 1489, None)).sat, Some(1480));
        assert_eq!(CohortKey::from_query(&query(3.5, 1600, None)).sat, Some(1600));
    }

    #[test]
    fn different_cycles_do_not_collide() {
        let mut later = query(3.9, 1480, None);
        later.cycle = AdmissionCycle::new(2026);
        assert_ne!(
            CohortKey::from_query(&query(3.9, 1480, None)),
            CohortKey::from_query(&later)
        );
    }

    #[test]
    fn majors_are_normalized() {
        assert_eq!(
            normalize_major("  Computer-Science "),
            Some("computer science".to_string())
        );
        assert_eq!(normalize_major(" -- "), None);
    }

    #[test]
    fn cycle_parses_both_notations() {
        assert_eq!("2025-2026".parse::<AdmissionCycle>(), Ok(AdmissionCycle::new(2025)));
        assert_eq!("2025-26".parse::<AdmissionCycle>(), Ok(AdmissionCycle::new(2025)));
        assert_eq!("1999-00".parse::<AdmissionCycle>(), Ok(AdmissionCycle::new(1999)));
        assert!("2025-2027".parse::<AdmissionCycle>().is_err());
        assert!("fall 2025".parse::<AdmissionCycle>().is_err());
        assert_eq!(AdmissionCycle::new(2025).to_string(), "2025-2026");
    }

    #[test]
    fn cycle_opens_in_august() {
        let july = NaiveDate::from_ymd_opt(2026, 7, 31).expect("valid date");
        let august = NaiveDate::from_ymd_opt(2026, 8, 1).expect("valid date");
        assert_eq!(AdmissionCycle::containing(july), AdmissionCycle::new(2025));
        assert_eq!(AdmissionCycle::containing(august), AdmissionCycle::new(2026));
    }
}
