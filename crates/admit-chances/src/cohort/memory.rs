use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use super::key::{normalize_major, AdmissionCycle, PeerWindow};
use super::source::{InstitutionalSource, PeerCohortSource, PeerQuery, SourceError, SubmissionId};
use crate::engine::{SchoolData, SchoolId, SimilarProfileStats};

const GPA_EPSILON: f64 = 1e-9;

/// Final admissions decision a peer reported for one school.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accepted,
    Rejected,
    Waitlisted,
    Deferred,
    Withdrawn,
}

impl FromStr for Decision {
    type Err = LabelParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "accepted" | "admitted" => Ok(Self::Accepted),
            "rejected" | "denied" => Ok(Self::Rejected),
            "waitlisted" | "waitlist" => Ok(Self::Waitlisted),
            "deferred" => Ok(Self::Deferred),
            "withdrawn" => Ok(Self::Withdrawn),
            _ => Err(LabelParseError::new("decision", raw)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationRound {
    EarlyDecision,
    EarlyAction,
    Regular,
}

impl FromStr for ApplicationRound {
    type Err = LabelParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "ed" | "early_decision" => Ok(Self::EarlyDecision),
            "ea" | "early_action" => Ok(Self::EarlyAction),
            "rd" | "regular" | "regular_decision" => Ok(Self::Regular),
            _ => Err(LabelParseError::new("application round", raw)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized {kind} '{value}'")]
pub struct LabelParseError {
    pub kind: &'static str,
    pub value: String,
}

impl LabelParseError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolOutcome {
    pub school_id: SchoolId,
    pub decision: Decision,
    #[serde(default)]
    pub round: Option<ApplicationRound>,
}

/// A previously submitted applicant profile with its reported outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerSubmission {
    pub id: SubmissionId,
    pub cycle: AdmissionCycle,
    pub gpa_unweighted: Option<f64>,
    pub sat_score: Option<u16>,
    pub act_score: Option<u8>,
    pub intended_major: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    pub outcomes: Vec<SchoolOutcome>,
}

impl PeerSubmission {
    fn matches(&self, query: &PeerQuery, window: &PeerWindow) -> bool {
        if self.cycle != query.cycle || self.hidden {
            return false;
        }
        if query.exclude_submission.as_ref() == Some(&self.id) {
            return false;
        }

        let gpa_ok = match query.gpa {
            Some(target) => self
                .gpa_unweighted
                .filter(|gpa| gpa.is_finite())
                .is_some_and(|gpa| (gpa - target).abs() <= window.gpa + GPA_EPSILON),
            None => true,
        };
        let sat_ok = match query.sat {
            Some(target) => self
                .sat_score
                .is_some_and(|sat| sat.abs_diff(target) <= window.sat),
            None => true,
        };
        let act_ok = match query.act {
            Some(target) => self
                .act_score
                .is_some_and(|act| act.abs_diff(target) <= window.act),
            None => true,
        };

        gpa_ok && sat_ok && act_ok && self.major_matches(query.intended_major.as_deref())
    }

    fn major_matches(&self, requested: Option<&str>) -> bool {
        let Some(requested) = requested.and_then(normalize_major) else {
            return true;
        };
        match self.intended_major.as_deref().and_then(normalize_major) {
            Some(own) => own.contains(&requested) || requested.contains(&own),
            None => false,
        }
    }
}

/// Thread-safe store backing both data sources for the API service and tests.
#[derive(Debug, Default)]
pub struct InMemoryAdmissionsStore {
    schools: RwLock<Vec<SchoolData>>,
    submissions: RwLock<BTreeMap<SubmissionId, PeerSubmission>>,
    window: PeerWindow,
}

impl InMemoryAdmissionsStore {
    pub fn new(schools: Vec<SchoolData>) -> Self {
        Self::with_window(schools, PeerWindow::default())
    }

    pub fn with_window(schools: Vec<SchoolData>, window: PeerWindow) -> Self {
        Self {
            schools: RwLock::new(schools),
            submissions: RwLock::new(BTreeMap::new()),
            window,
        }
    }

    pub fn replace_schools(&self, schools: Vec<SchoolData>) -> Result<(), SourceError> {
        let mut guard = self.schools.write().map_err(|_| poisoned())?;
        *guard = schools;
        Ok(())
    }

    pub fn record_submission(&self, submission: PeerSubmission) -> Result<(), SourceError> {
        let mut guard = self.submissions.write().map_err(|_| poisoned())?;
        if guard.contains_key(&submission.id) {
            return Err(SourceError::Conflict(submission.id));
        }
        guard.insert(submission.id.clone(), submission);
        Ok(())
    }

    /// Hidden submissions stay stored but never join a peer cohort.
    pub fn set_hidden(&self, id: &SubmissionId, hidden: bool) -> Result<(), SourceError> {
        let mut guard = self.submissions.write().map_err(|_| poisoned())?;
        let submission = guard
            .get_mut(id)
            .ok_or_else(|| SourceError::NotFound(id.clone()))?;
        submission.hidden = hidden;
        Ok(())
    }

    pub fn submission_count(&self) -> Result<usize, SourceError> {
        Ok(self.submissions.read().map_err(|_| poisoned())?.len())
    }
}

impl InstitutionalSource for InMemoryAdmissionsStore {
    fn institutional_stats(&self) -> Result<Vec<SchoolData>, SourceError> {
        Ok(self.schools.read().map_err(|_| poisoned())?.clone())
    }
}

impl PeerCohortSource for InMemoryAdmissionsStore {
    fn peer_cohort_stats(&self, query: &PeerQuery) -> Result<Vec<SimilarProfileStats>, SourceError> {
        let guard = self.submissions.read().map_err(|_| poisoned())?;
        let mut by_school: BTreeMap<SchoolId, SimilarProfileStats> = BTreeMap::new();

        for submission in guard
            .values()
            .filter(|submission| submission.matches(query, &self.window))
        {
            // One peer counts once per school; a later row for the same school wins.
            let latest: BTreeMap<&SchoolId, &SchoolOutcome> = submission
                .outcomes
                .iter()
                .map(|outcome| (&outcome.school_id, outcome))
                .collect();
            for outcome in latest.into_values() {
                tally(&mut by_school, outcome);
            }
        }

        Ok(by_school
            .into_values()
            .filter(|stats| stats.total_similar > 0)
            .collect())
    }
}

// Withdrawn applications carry no decision and are left out of the cohort.
fn tally(by_school: &mut BTreeMap<SchoolId, SimilarProfileStats>, outcome: &SchoolOutcome) {
    if outcome.decision == Decision::Withdrawn {
        return;
    }

    let stats = by_school
        .entry(outcome.school_id.clone())
        .or_insert_with(|| SimilarProfileStats::empty(outcome.school_id.clone()));
    stats.total_similar += 1;

    match outcome.decision {
        Decision::Accepted => {
            stats.accepted += 1;
            match outcome.round {
                Some(ApplicationRound::EarlyDecision) => stats.accepted_early_decision += 1,
                Some(ApplicationRound::EarlyAction) => stats.accepted_early_action += 1,
                Some(ApplicationRound::Regular) => stats.accepted_regular += 1,
                None => {}
            }
        }
        Decision::Rejected => stats.rejected += 1,
        Decision::Waitlisted => stats.waitlisted += 1,
        Decision::Deferred | Decision::Withdrawn => {}
    }
}

fn poisoned() -> SourceError {
    SourceError::Unavailable("admissions store lock poisoned".to_string())
}
