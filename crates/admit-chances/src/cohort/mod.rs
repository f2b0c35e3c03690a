//! Data-source boundary feeding the engine: peer query keys, caching, the in-memory
//! admissions store and CSV import.

pub mod cache;
pub mod import;
pub mod key;
pub mod memory;
pub mod source;

pub use cache::{CacheConfig, CacheStats, Cached, CohortCache};
pub use import::{load_submissions, ImportError};
pub use key::{normalize_major, AdmissionCycle, CohortKey, CycleParseError, PeerWindow};
pub use memory::{
    ApplicationRound, Decision, InMemoryAdmissionsStore, LabelParseError, PeerSubmission,
    SchoolOutcome,
};
pub use source::{InstitutionalSource, PeerCohortSource, PeerQuery, SourceError, SubmissionId};
