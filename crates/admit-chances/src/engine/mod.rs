//! Chances classification engine.
//!
//! Pure and synchronous: positions the student against each school's published
//! distributions, blends the resulting baseline with peer cohort outcomes and maps the
//! estimate onto a difficulty tier. Missing or malformed data degrades toward the
//! institutional baseline and finally to [`Tier::Unscored`]; nothing here fails.

pub mod assemble;
pub mod blend;
mod config;
pub mod domain;
pub mod peers;
pub mod position;
pub mod tiers;

#[cfg(test)]
mod tests;

pub use assemble::{group_by_tier, TierGroup};
pub use config::{EngineConfig, EngineConfigError};
pub use domain::{
    ActDistribution, AxisPositions, ClassificationResult, Evidence, GpaBand, GpaBands,
    RoundBreakdown, SatDistribution, SchoolData, SchoolId, SimilarProfileStats, StudentProfile,
    Tier, TierRule,
};
pub use peers::{PeerSignal, PeerStatsDefect};

use peers::PeerEntry;
use tiers::TierInputs;
use tracing::{debug, warn};

/// Stateless classifier applying one [`EngineConfig`] to every request.
#[derive(Debug, Clone, Default)]
pub struct ClassificationEngine {
    config: EngineConfig,
}

impl ClassificationEngine {
    /// Build an engine over a validated config. Thresholds that are out of range or
    /// unordered are rejected here so classification itself stays infallible.
    pub fn new(config: EngineConfig) -> Result<Self, EngineConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Classify every school for one student, in presentation order.
    pub fn classify_schools(
        &self,
        profile: &StudentProfile,
        schools: &[SchoolData],
        peer_stats: &[SimilarProfileStats],
    ) -> Vec<ClassificationResult> {
        let peers = peers::index_by_school(peer_stats);

        let mut results: Vec<ClassificationResult> = if profile.has_any_stat() {
            schools
                .iter()
                .map(|school| self.classify_school(profile, school, peers.get(&school.id)))
                .collect()
        } else {
            warn!(
                schools = schools.len(),
                "student profile has no usable GPA, SAT or ACT; every school is unscored"
            );
            schools.iter().map(unscored_without_stats).collect()
        };

        let orphaned = peers
            .keys()
            .filter(|id| !schools.iter().any(|school| school.id == ***id))
            .count();
        if orphaned > 0 {
            debug!(orphaned, "ignored peer statistics for schools outside the snapshot");
        }

        assemble::sort_results(&mut results);
        results
    }

    fn classify_school(
        &self,
        profile: &StudentProfile,
        school: &SchoolData,
        peer_entry: Option<&PeerEntry<'_>>,
    ) -> ClassificationResult {
        let mut notes = Vec::new();

        let axes = position::position_student(profile, school);
        let position_score = axes.overall();
        describe_axes(profile, &axes, &mut notes);

        let acceptance_rate = blend::usable_acceptance_rate(school);
        if school.acceptance_rate.is_some() && acceptance_rate.is_none() {
            warn!(school = %school.id, rate = ?school.acceptance_rate, "ignoring malformed acceptance rate");
        }

        let (peer_signal, peer_data_rejected) = match peer_entry {
            Some(PeerEntry::Valid(stats)) => (Some(peers::aggregate(stats, &self.config)), false),
            Some(PeerEntry::Corrupt(defect)) => {
                warn!(school = %school.id, %defect, "excluding corrupt peer statistics");
                notes.push(format!("peer statistics excluded: {defect}"));
                (None, true)
            }
            None => (None, false),
        };

        if acceptance_rate.is_none() && peer_signal.is_none() {
            notes.push(TierRule::NoData.describe().to_string());
            return ClassificationResult {
                school_id: school.id.clone(),
                school_name: school.name.clone(),
                probability_estimate: None,
                tier: Tier::Unscored,
                confidence: 0.0,
                evidence: Evidence {
                    institutional_signal: None,
                    acceptance_rate: None,
                    position_score,
                    axis_positions: axes,
                    used_global_prior: false,
                    peer_signal: None,
                    peer_sample_size: 0,
                    peer_confidence: 0.0,
                    rounds: None,
                    peer_data_rejected,
                    tier_rule: TierRule::NoData,
                    notes,
                },
            };
        }

        let baseline = blend::baseline(acceptance_rate, position_score, &self.config);
        match acceptance_rate {
            Some(rate) => notes.push(format!(
                "published acceptance rate {rate:.1}% adjusts to {:.0}%",
                baseline.adjusted * 100.0
            )),
            None => notes.push(format!(
                "no published acceptance rate; global prior {:.0}% adjusts to {:.0}%",
                self.config.global_prior * 100.0,
                baseline.adjusted * 100.0
            )),
        }
        if let Some(signal) = &peer_signal {
            notes.push(format!(
                "{} of {} similar applicants admitted (weight {:.2})",
                (signal.empirical_rate * f64::from(signal.sample_size)).round(),
                signal.sample_size,
                signal.confidence
            ));
        }

        let blended = blend::blend(&baseline, peer_signal.as_ref());
        let (tier, tier_rule) = tiers::classify(
            &TierInputs {
                probability: Some(blended.probability),
                acceptance_rate,
                confidence: blended.confidence,
            },
            &self.config,
        );
        if tier_rule != TierRule::ProbabilityBand {
            notes.push(tier_rule.describe().to_string());
        }

        ClassificationResult {
            school_id: school.id.clone(),
            school_name: school.name.clone(),
            probability_estimate: Some(blended.probability),
            tier,
            confidence: blended.confidence,
            evidence: Evidence {
                institutional_signal: Some(baseline.adjusted),
                acceptance_rate,
                position_score,
                axis_positions: axes,
                used_global_prior: baseline.used_global_prior,
                peer_signal: peer_signal.map(|signal| signal.empirical_rate),
                peer_sample_size: peer_signal.map(|signal| signal.sample_size).unwrap_or(0),
                peer_confidence: peer_signal.map(|signal| signal.confidence).unwrap_or(0.0),
                rounds: peer_signal.map(|signal| signal.rounds),
                peer_data_rejected,
                tier_rule,
                notes,
            },
        }
    }
}

/// Classify with the default configuration.
pub fn classify_schools(
    profile: &StudentProfile,
    schools: &[SchoolData],
    peer_stats: &[SimilarProfileStats],
) -> Vec<ClassificationResult> {
    ClassificationEngine::default().classify_schools(profile, schools, peer_stats)
}

fn unscored_without_stats(school: &SchoolData) -> ClassificationResult {
    ClassificationResult {
        school_id: school.id.clone(),
        school_name: school.name.clone(),
        probability_estimate: None,
        tier: Tier::Unscored,
        confidence: 0.0,
        evidence: Evidence {
            institutional_signal: None,
            acceptance_rate: blend::usable_acceptance_rate(school),
            position_score: None,
            axis_positions: AxisPositions::default(),
            used_global_prior: false,
            peer_signal: None,
            peer_sample_size: 0,
            peer_confidence: 0.0,
            rounds: None,
            peer_data_rejected: false,
            tier_rule: TierRule::NoStudentStats,
            notes: vec![TierRule::NoStudentStats.describe().to_string()],
        },
    }
}

fn describe_axes(profile: &StudentProfile, axes: &AxisPositions, notes: &mut Vec<String>) {
    if let (Some(score), Some(position)) = (profile.usable_sat(), axes.sat) {
        notes.push(format!("SAT {score} {}", quartile_phrase(position)));
    }
    if let (Some(score), Some(position)) = (profile.usable_act(), axes.act) {
        notes.push(format!("ACT {score} {}", quartile_phrase(position)));
    }
    if let (Some(gpa), Some(position)) = (profile.usable_gpa(), axes.gpa) {
        let side = if position >= 0.0 { "above" } else { "below" };
        notes.push(format!(
            "GPA {gpa:.2} ({} band) ranks {side} the median enrolled student",
            GpaBand::for_gpa(gpa).label()
        ));
    }
}

fn quartile_phrase(position: f64) -> &'static str {
    if position >= 1.0 {
        "is at or above the 75th percentile"
    } else if position >= 0.0 {
        "falls within the middle 50%"
    } else {
        "is below the 25th percentile"
    }
}
