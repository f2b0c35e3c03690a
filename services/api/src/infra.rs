use admit_chances::cohort::{self, AdmissionCycle, InMemoryAdmissionsStore};
use admit_chances::config::DataConfig;
use admit_chances::error::AppError;
use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::fs::File;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

use crate::demo;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Build the admissions store from the configured CSV files, falling back to the demo
/// dataset for whichever file is not configured.
pub(crate) fn load_store(
    data: &DataConfig,
    cycle: AdmissionCycle,
) -> Result<InMemoryAdmissionsStore, AppError> {
    let schools = match &data.schools_csv {
        Some(path) => {
            let schools = cohort::import::schools_from_path(path)?;
            info!(path = %path.display(), schools = schools.len(), "loaded institutional snapshot");
            schools
        }
        None => demo::demo_schools(),
    };

    let store = InMemoryAdmissionsStore::new(schools);
    match &data.submissions_csv {
        Some(path) => {
            let file = File::open(path)?;
            let loaded = cohort::load_submissions(&store, file)?;
            info!(path = %path.display(), submissions = loaded, "loaded peer submissions");
        }
        None => {
            for submission in demo::demo_submissions(cycle) {
                store
                    .record_submission(submission)
                    .map_err(cohort::ImportError::from)?;
            }
        }
    }

    Ok(store)
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_cycle(raw: &str) -> Result<AdmissionCycle, String> {
    raw.parse::<AdmissionCycle>().map_err(|err| err.to_string())
}
