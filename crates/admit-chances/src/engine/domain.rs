use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier wrapper for schools in the institutional snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchoolId(pub String);

impl fmt::Display for SchoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SchoolId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Academic profile supplied with a single chances request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentProfile {
    #[serde(default)]
    pub gpa_unweighted: Option<f64>,
    #[serde(default)]
    pub sat_score: Option<u16>,
    #[serde(default)]
    pub act_score: Option<u8>,
    pub state_of_residence: String,
    #[serde(default)]
    pub intended_major: Option<String>,
    #[serde(default)]
    pub ap_courses_count: Option<u8>,
}

impl StudentProfile {
    /// Unweighted GPA on the 0.00-4.00 scale. Anything off that scale counts as missing.
    pub fn usable_gpa(&self) -> Option<f64> {
        self.gpa_unweighted
            .filter(|gpa| gpa.is_finite() && (0.0..=4.0).contains(gpa))
    }

    pub fn usable_sat(&self) -> Option<u16> {
        self.sat_score.filter(|score| (400..=1600).contains(score))
    }

    pub fn usable_act(&self) -> Option<u8> {
        self.act_score.filter(|score| (1..=36).contains(score))
    }

    /// True when at least one stat axis can be positioned against a school.
    pub fn has_any_stat(&self) -> bool {
        self.usable_gpa().is_some() || self.usable_sat().is_some() || self.usable_act().is_some()
    }
}

/// Published SAT composite distribution for admitted or enrolled students.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatDistribution {
    #[serde(default)]
    pub average: Option<u16>,
    #[serde(default)]
    pub p25: Option<u16>,
    #[serde(default)]
    pub p75: Option<u16>,
}

/// Published ACT composite distribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActDistribution {
    #[serde(default)]
    pub median: Option<u8>,
    #[serde(default)]
    pub p25: Option<u8>,
    #[serde(default)]
    pub p75: Option<u8>,
}

/// Share of enrolled students (percent) reporting each high-school GPA band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GpaBands {
    #[serde(default)]
    pub gpa_4_00: Option<f64>,
    #[serde(default)]
    pub gpa_3_75_to_3_99: Option<f64>,
    #[serde(default)]
    pub gpa_3_50_to_3_74: Option<f64>,
    #[serde(default)]
    pub gpa_3_25_to_3_49: Option<f64>,
    #[serde(default)]
    pub gpa_3_00_to_3_24: Option<f64>,
    #[serde(default)]
    pub gpa_below_3_00: Option<f64>,
}

impl GpaBands {
    /// Band shares ordered from the highest band to the lowest.
    pub fn shares(&self) -> [Option<f64>; 6] {
        [
            self.gpa_4_00,
            self.gpa_3_75_to_3_99,
            self.gpa_3_50_to_3_74,
            self.gpa_3_25_to_3_49,
            self.gpa_3_00_to_3_24,
            self.gpa_below_3_00,
        ]
    }
}

/// GPA bands used by the institutional data set, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpaBand {
    FourPointZero,
    ThreeSeventyFive,
    ThreeFifty,
    ThreeTwentyFive,
    ThreePointZero,
    BelowThree,
}

impl GpaBand {
    pub fn for_gpa(gpa: f64) -> Self {
        if gpa >= 4.0 {
            Self::FourPointZero
        } else if gpa >= 3.75 {
            Self::ThreeSeventyFive
        } else if gpa >= 3.5 {
            Self::ThreeFifty
        } else if gpa >= 3.25 {
            Self::ThreeTwentyFive
        } else if gpa >= 3.0 {
            Self::ThreePointZero
        } else {
            Self::BelowThree
        }
    }

    /// Position of the band in [`GpaBands::shares`].
    pub const fn index(self) -> usize {
        match self {
            Self::FourPointZero => 0,
            Self::ThreeSeventyFive => 1,
            Self::ThreeFifty => 2,
            Self::ThreeTwentyFive => 3,
            Self::ThreePointZero => 4,
            Self::BelowThree => 5,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::FourPointZero => "4.00",
            Self::ThreeSeventyFive => "3.75-3.99",
            Self::ThreeFifty => "3.50-3.74",
            Self::ThreeTwentyFive => "3.25-3.49",
            Self::ThreePointZero => "3.00-3.24",
            Self::BelowThree => "below 3.00",
        }
    }
}

/// Read-only institutional snapshot for one school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolData {
    pub id: SchoolId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub acceptance_rate: Option<f64>,
    #[serde(default)]
    pub sat: SatDistribution,
    #[serde(default)]
    pub act: ActDistribution,
    #[serde(default)]
    pub gpa_bands: GpaBands,
}

impl SchoolData {
    /// School with identity only; every statistic unknown.
    pub fn new(id: impl Into<String>, name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: SchoolId(id.into()),
            name: name.into(),
            slug: slug.into(),
            acceptance_rate: None,
            sat: SatDistribution::default(),
            act: ActDistribution::default(),
            gpa_bands: GpaBands::default(),
        }
    }
}

/// Outcome counts for the peer cohort that applied to one school.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarProfileStats {
    pub school_id: SchoolId,
    pub total_similar: u32,
    pub accepted: u32,
    pub rejected: u32,
    pub waitlisted: u32,
    #[serde(default)]
    pub accepted_early_decision: u32,
    #[serde(default)]
    pub accepted_early_action: u32,
    #[serde(default)]
    pub accepted_regular: u32,
}

impl SimilarProfileStats {
    /// Empty counter for a school, filled by cohort aggregation.
    pub fn empty(school_id: SchoolId) -> Self {
        Self {
            school_id,
            total_similar: 0,
            accepted: 0,
            rejected: 0,
            waitlisted: 0,
            accepted_early_decision: 0,
            accepted_early_action: 0,
            accepted_regular: 0,
        }
    }

    pub fn rounds(&self) -> RoundBreakdown {
        RoundBreakdown {
            early_decision: self.accepted_early_decision,
            early_action: self.accepted_early_action,
            regular: self.accepted_regular,
        }
    }
}

/// Accepted peers split by application round. Display only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundBreakdown {
    pub early_decision: u32,
    pub early_action: u32,
    pub regular: u32,
}

/// Admissions-difficulty tier for one school relative to one student.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Safety,
    Target,
    Reach,
    FarReach,
    Unscored,
}

impl Tier {
    /// Presentation order, most favorable first.
    pub const fn ordered() -> [Tier; 5] {
        [
            Tier::Safety,
            Tier::Target,
            Tier::Reach,
            Tier::FarReach,
            Tier::Unscored,
        ]
    }

    pub const fn rank(self) -> u8 {
        match self {
            Tier::Safety => 0,
            Tier::Target => 1,
            Tier::Reach => 2,
            Tier::FarReach => 3,
            Tier::Unscored => 4,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Tier::Safety => "Safety",
            Tier::Target => "Target",
            Tier::Reach => "Reach",
            Tier::FarReach => "Far Reach",
            Tier::Unscored => "Unscored",
        }
    }
}

/// Classifier rule that settled a school's tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TierRule {
    NoStudentStats,
    NoData,
    Selectivity,
    ProbabilityBand,
    LowConfidenceDowngrade,
}

impl TierRule {
    pub const fn describe(self) -> &'static str {
        match self {
            TierRule::NoStudentStats => "no GPA, SAT or ACT supplied",
            TierRule::NoData => "no acceptance rate and no peer outcomes for this school",
            TierRule::Selectivity => "highly selective school with a sub-40% estimate",
            TierRule::ProbabilityBand => "probability band",
            TierRule::LowConfidenceDowngrade => "safety downgraded to target on thin evidence",
        }
    }
}

/// Per-axis percentile positions in [-1, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AxisPositions {
    pub gpa: Option<f64>,
    pub sat: Option<f64>,
    pub act: Option<f64>,
}

impl AxisPositions {
    /// Unweighted mean of the available axes.
    pub fn overall(&self) -> Option<f64> {
        let available: Vec<f64> = [self.gpa, self.sat, self.act]
            .into_iter()
            .flatten()
            .collect();
        if available.is_empty() {
            None
        } else {
            Some(available.iter().sum::<f64>() / available.len() as f64)
        }
    }
}

/// Signals behind a classification, kept for explainability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    pub institutional_signal: Option<f64>,
    pub acceptance_rate: Option<f64>,
    pub position_score: Option<f64>,
    pub axis_positions: AxisPositions,
    pub used_global_prior: bool,
    pub peer_signal: Option<f64>,
    pub peer_sample_size: u32,
    pub peer_confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounds: Option<RoundBreakdown>,
    pub peer_data_rejected: bool,
    pub tier_rule: TierRule,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Engine output for one school.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub school_id: SchoolId,
    pub school_name: String,
    pub probability_estimate: Option<f64>,
    pub tier: Tier,
    pub confidence: f64,
    pub evidence: Evidence,
}
