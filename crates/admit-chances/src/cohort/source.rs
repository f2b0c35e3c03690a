use std::fmt;

use serde::{Deserialize, Serialize};

use super::key::AdmissionCycle;
use crate::engine::{SchoolData, SimilarProfileStats, StudentProfile};

/// Identifier of a previously submitted applicant profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub String);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Profile neighborhood used to select a peer cohort.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerQuery {
    pub gpa: Option<f64>,
    pub sat: Option<u16>,
    pub act: Option<u8>,
    pub intended_major: Option<String>,
    pub cycle: AdmissionCycle,
    /// The requester's own submission, never counted as a peer.
    pub exclude_submission: Option<SubmissionId>,
}

impl PeerQuery {
    pub fn for_profile(
        profile: &StudentProfile,
        cycle: AdmissionCycle,
        exclude_submission: Option<SubmissionId>,
    ) -> Self {
        Self {
            gpa: profile.usable_gpa(),
            sat: profile.usable_sat(),
            act: profile.usable_act(),
            intended_major: profile.intended_major.clone(),
            cycle,
            exclude_submission,
        }
    }
}

/// Full institutional snapshot provider.
pub trait InstitutionalSource: Send + Sync {
    fn institutional_stats(&self) -> Result<Vec<SchoolData>, SourceError>;
}

/// Peer cohort outcome counts, one entry per school with at least one matching peer.
pub trait PeerCohortSource: Send + Sync {
    fn peer_cohort_stats(&self, query: &PeerQuery) -> Result<Vec<SimilarProfileStats>, SourceError>;
}

/// Data-source failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("submission {0} already exists")]
    Conflict(SubmissionId),
    #[error("submission {0} not found")]
    NotFound(SubmissionId),
    #[error("data source unavailable: {0}")]
    Unavailable(String),
}
