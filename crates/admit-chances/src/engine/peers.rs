use std::collections::HashMap;

use super::config::EngineConfig;
use super::domain::{RoundBreakdown, SchoolId, SimilarProfileStats};

/// Empirical admission rate of a peer cohort with its trust weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeerSignal {
    pub empirical_rate: f64,
    pub confidence: f64,
    pub sample_size: u32,
    pub rounds: RoundBreakdown,
}

/// Reasons a peer cohort entry is excluded from blending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PeerStatsDefect {
    #[error("peer cohort is empty")]
    EmptyCohort,
    #[error("outcome counts ({outcomes}) exceed cohort size ({total})")]
    OutcomesExceedTotal { outcomes: u64, total: u32 },
    #[error("round acceptances ({rounds}) exceed accepted count ({accepted})")]
    RoundsExceedAccepted { rounds: u64, accepted: u32 },
    #[error("more than one peer cohort entry for the school")]
    Duplicate,
}

/// Peer cohort entry for one school after validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum PeerEntry<'a> {
    Valid(&'a SimilarProfileStats),
    Corrupt(PeerStatsDefect),
}

/// Linear ramp from 0 to 1 that saturates at `min_confident_sample` peers.
pub fn peer_confidence(total_similar: u32, min_confident_sample: u32) -> f64 {
    let threshold = min_confident_sample.max(1);
    (f64::from(total_similar) / f64::from(threshold)).min(1.0)
}

pub fn validate(stats: &SimilarProfileStats) -> Result<(), PeerStatsDefect> {
    if stats.total_similar == 0 {
        return Err(PeerStatsDefect::EmptyCohort);
    }

    let outcomes =
        u64::from(stats.accepted) + u64::from(stats.rejected) + u64::from(stats.waitlisted);
    if outcomes > u64::from(stats.total_similar) {
        return Err(PeerStatsDefect::OutcomesExceedTotal {
            outcomes,
            total: stats.total_similar,
        });
    }

    let rounds = u64::from(stats.accepted_early_decision)
        + u64::from(stats.accepted_early_action)
        + u64::from(stats.accepted_regular);
    if rounds > u64::from(stats.accepted) {
        return Err(PeerStatsDefect::RoundsExceedAccepted {
            rounds,
            accepted: stats.accepted,
        });
    }

    Ok(())
}

/// Turn validated cohort counts into an empirical rate and confidence.
pub fn aggregate(stats: &SimilarProfileStats, config: &EngineConfig) -> PeerSignal {
    PeerSignal {
        empirical_rate: f64::from(stats.accepted) / f64::from(stats.total_similar.max(1)),
        confidence: peer_confidence(stats.total_similar, config.min_confident_sample),
        sample_size: stats.total_similar,
        rounds: stats.rounds(),
    }
}

pub(crate) fn index_by_school(stats: &[SimilarProfileStats]) -> HashMap<&SchoolId, PeerEntry<'_>> {
    let mut index = HashMap::with_capacity(stats.len());

    for entry in stats {
        let validated = match validate(entry) {
            Ok(()) => PeerEntry::Valid(entry),
            Err(defect) => PeerEntry::Corrupt(defect),
        };
        index
            .entry(&entry.school_id)
            .and_modify(|existing| *existing = PeerEntry::Corrupt(PeerStatsDefect::Duplicate))
            .or_insert(validated);
    }

    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(total: u32, accepted: u32, rejected: u32, waitlisted: u32) -> SimilarProfileStats {
        SimilarProfileStats {
            total_similar: total,
            accepted,
            rejected,
            waitlisted,
            ..SimilarProfileStats::empty(SchoolId::from("harbor"))
        }
    }

    #[test]
    fn confidence_ramps_to_threshold() {
        assert_eq!(peer_confidence(0, 8), 0.0);
        assert_eq!(peer_confidence(2, 8), 0.25);
        assert_eq!(peer_confidence(8, 8), 1.0);
        assert_eq!(peer_confidence(40, 8), 1.0);
    }

    #[test]
    fn aggregate_reports_empirical_rate() {
        let signal = aggregate(&stats(20, 2, 15, 3), &EngineConfig::default());
        assert!((signal.empirical_rate - 0.10).abs() < 1e-12);
        assert_eq!(signal.confidence, 1.0);
        assert_eq!(signal.sample_size, 20);
    }

    #[test]
    fn outcome_overflow_is_corrupt() {
        assert_eq!(
            validate(&stats(3, 4, 0, 0)),
            Err(PeerStatsDefect::OutcomesExceedTotal {
                outcomes: 4,
                total: 3
            })
        );
    }

    #[test]
    fn round_overflow_is_corrupt() {
        let mut entry = stats(5, 1, 2, 0);
        entry.accepted_early_action = 2;
        assert!(matches!(
            validate(&entry),
            Err(PeerStatsDefect::RoundsExceedAccepted { .. })
        ));
    }

    #[test]
    fn empty_cohort_is_corrupt() {
        assert_eq!(validate(&stats(0, 0, 0, 0)), Err(PeerStatsDefect::EmptyCohort));
    }

    #[test]
    fn duplicate_entries_are_both_discarded() {
        let entries = vec![stats(4, 1, 3, 0), stats(6, 2, 4, 0)];
        let index = index_by_school(&entries);
        assert_eq!(
            index.get(&SchoolId::from("harbor")),
            Some(&PeerEntry::Corrupt(PeerStatsDefect::Duplicate))
        );
    }
}
