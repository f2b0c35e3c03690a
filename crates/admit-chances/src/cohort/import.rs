//! CSV loaders for the institutional snapshot and peer submissions.
//!
//! Cells are trimmed and empty cells read as absent values. Malformed numbers,
//! cycles and decision labels are rejected here so the engine only ever sees typed
//! values.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};

use super::key::{AdmissionCycle, CycleParseError};
use super::memory::{
    ApplicationRound, Decision, InMemoryAdmissionsStore, LabelParseError, PeerSubmission,
    SchoolOutcome,
};
use super::source::{SourceError, SubmissionId};
use crate::engine::{ActDistribution, GpaBands, SatDistribution, SchoolData, SchoolId};

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("line {line}: {source}")]
    InvalidCycle {
        line: usize,
        #[source]
        source: CycleParseError,
    },
    #[error("line {line}: {source}")]
    InvalidDecision {
        line: usize,
        #[source]
        source: LabelParseError,
    },
    #[error("line {line}: {source}")]
    InvalidRound {
        line: usize,
        #[source]
        source: LabelParseError,
    },
    #[error("submission {0} is already loaded")]
    Conflict(SubmissionId),
    #[error(transparent)]
    Store(SourceError),
}

impl From<SourceError> for ImportError {
    fn from(value: SourceError) -> Self {
        match value {
            SourceError::Conflict(id) => Self::Conflict(id),
            other => Self::Store(other),
        }
    }
}

pub fn schools_from_path(path: &Path) -> Result<Vec<SchoolData>, ImportError> {
    schools_from_reader(open(path)?)
}

pub fn schools_from_reader<R: Read>(reader: R) -> Result<Vec<SchoolData>, ImportError> {
    let mut csv_reader = reader_builder().from_reader(reader);
    let mut schools = Vec::new();

    for row in csv_reader.deserialize::<SchoolRow>() {
        schools.push(row?.into_school());
    }

    Ok(schools)
}

pub fn submissions_from_path(path: &Path) -> Result<Vec<PeerSubmission>, ImportError> {
    submissions_from_reader(open(path)?)
}

/// One row per (submission, school outcome); rows sharing a `submission_id` are merged
/// and the profile columns of the first row win.
pub fn submissions_from_reader<R: Read>(reader: R) -> Result<Vec<PeerSubmission>, ImportError> {
    let mut csv_reader = reader_builder().from_reader(reader);
    let mut submissions: Vec<PeerSubmission> = Vec::new();

    for (index, row) in csv_reader.deserialize::<SubmissionRow>().enumerate() {
        let row = row?;
        // Header occupies line 1.
        let line = index + 2;

        let outcome = row.outcome(line)?;
        let id = SubmissionId(row.submission_id.clone());
        if let Some(existing) = submissions.iter_mut().find(|submission| submission.id == id) {
            existing.outcomes.extend(outcome);
            continue;
        }

        let cycle: AdmissionCycle = row
            .cycle
            .parse()
            .map_err(|source| ImportError::InvalidCycle { line, source })?;
        submissions.push(PeerSubmission {
            id,
            cycle,
            gpa_unweighted: row.gpa_unweighted,
            sat_score: row.sat_score,
            act_score: row.act_score,
            intended_major: row.intended_major,
            hidden: row.hidden.unwrap_or(false),
            outcomes: outcome.into_iter().collect(),
        });
    }

    Ok(submissions)
}

/// Load submissions from `reader` into `store`, returning how many were recorded.
pub fn load_submissions<R: Read>(
    store: &InMemoryAdmissionsStore,
    reader: R,
) -> Result<usize, ImportError> {
    let submissions = submissions_from_reader(reader)?;
    let count = submissions.len();
    for submission in submissions {
        store.record_submission(submission)?;
    }
    Ok(count)
}

fn open(path: &Path) -> Result<File, ImportError> {
    File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.trim(csv::Trim::All);
    builder
}

#[derive(Debug, Deserialize)]
struct SchoolRow {
    id: String,
    name: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    slug: Option<String>,
    acceptance_rate: Option<f64>,
    sat_average: Option<u16>,
    sat_p25: Option<u16>,
    sat_p75: Option<u16>,
    act_median: Option<u8>,
    act_p25: Option<u8>,
    act_p75: Option<u8>,
    gpa_4_00: Option<f64>,
    gpa_3_75_to_3_99: Option<f64>,
    gpa_3_50_to_3_74: Option<f64>,
    gpa_3_25_to_3_49: Option<f64>,
    gpa_3_00_to_3_24: Option<f64>,
    gpa_below_3_00: Option<f64>,
}

impl SchoolRow {
    fn into_school(self) -> SchoolData {
        let slug = self.slug.unwrap_or_else(|| slugify(&self.name));
        SchoolData {
            id: SchoolId(self.id),
            name: self.name,
            slug,
            acceptance_rate: self.acceptance_rate,
            sat: SatDistribution {
                average: self.sat_average,
                p25: self.sat_p25,
                p75: self.sat_p75,
            },
            act: ActDistribution {
                median: self.act_median,
                p25: self.act_p25,
                p75: self.act_p75,
            },
            gpa_bands: GpaBands {
                gpa_4_00: self.gpa_4_00,
                gpa_3_75_to_3_99: self.gpa_3_75_to_3_99,
                gpa_3_50_to_3_74: self.gpa_3_50_to_3_74,
                gpa_3_25_to_3_49: self.gpa_3_25_to_3_49,
                gpa_3_00_to_3_24: self.gpa_3_00_to_3_24,
                gpa_below_3_00: self.gpa_below_3_00,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct SubmissionRow {
    submission_id: String,
    cycle: String,
    gpa_unweighted: Option<f64>,
    sat_score: Option<u16>,
    act_score: Option<u8>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    intended_major: Option<String>,
    #[serde(default)]
    hidden: Option<bool>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    school_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    decision: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    round: Option<String>,
}

impl SubmissionRow {
    /// The outcome carried by this row; a submission may list no schools at all.
    fn outcome(&self, line: usize) -> Result<Option<SchoolOutcome>, ImportError> {
        let (Some(school_id), Some(decision)) = (&self.school_id, &self.decision) else {
            return Ok(None);
        };

        let decision: Decision = decision
            .parse()
            .map_err(|source| ImportError::InvalidDecision { line, source })?;
        let round = self
            .round
            .as_deref()
            .map(str::parse::<ApplicationRound>)
            .transpose()
            .map_err(|source| ImportError::InvalidRound { line, source })?;

        Ok(Some(SchoolOutcome {
            school_id: SchoolId(school_id.clone()),
            decision,
            round,
        }))
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn slugify(name: &str) -> String {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
