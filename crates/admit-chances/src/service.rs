use std::panic;
use std::sync::Arc;
use std::thread;

use serde::Serialize;
use tracing::{info, warn};

use crate::cohort::{
    AdmissionCycle, CacheConfig, CacheStats, Cached, CohortCache, CohortKey, InstitutionalSource,
    PeerCohortSource, PeerQuery, SourceError, SubmissionId,
};
use crate::engine::{
    group_by_tier, ClassificationEngine, ClassificationResult, EngineConfig, EngineConfigError,
    SimilarProfileStats, StudentProfile, Tier, TierGroup,
};

/// One student asking for chances at every school in the snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ChancesRequest {
    pub profile: StudentProfile,
    /// Defaults to the cycle open today.
    pub cycle: Option<AdmissionCycle>,
    /// The requester's own stored submission, kept out of their peer cohort.
    pub submission_id: Option<SubmissionId>,
}

impl ChancesRequest {
    pub fn new(profile: StudentProfile) -> Self {
        Self {
            profile,
            cycle: None,
            submission_id: None,
        }
    }
}

/// Classified schools in presentation order plus their per-tier grouping.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChancesReport {
    pub cycle: AdmissionCycle,
    pub results: Vec<ClassificationResult>,
    pub groups: Vec<TierGroup>,
    pub cohort_cache_hit: bool,
}

impl ChancesReport {
    pub fn count(&self, tier: Tier) -> usize {
        self.results
            .iter()
            .filter(|result| result.tier == tier)
            .count()
    }
}

/// Service composing the data sources, the cohort cache and the classification engine.
pub struct ChancesService<I, P> {
    institutional: Arc<I>,
    peers: Arc<P>,
    cache: CohortCache,
    engine: ClassificationEngine,
}

impl<I, P> ChancesService<I, P>
where
    I: InstitutionalSource + 'static,
    P: PeerCohortSource + 'static,
{
    /// Fails when `engine_config` does not validate.
    pub fn new(
        institutional: Arc<I>,
        peers: Arc<P>,
        engine_config: EngineConfig,
        cache_config: CacheConfig,
    ) -> Result<Self, EngineConfigError> {
        Ok(Self {
            institutional,
            peers,
            cache: CohortCache::new(&cache_config),
            engine: ClassificationEngine::new(engine_config)?,
        })
    }

    pub fn engine(&self) -> &ClassificationEngine {
        &self.engine
    }

    /// Classify every school for the requester.
    ///
    /// Institutional data and the peer cohort are fetched concurrently. A failing peer
    /// source degrades to institutional-only estimates; a failing institutional source
    /// fails the request.
    pub fn chances(&self, request: &ChancesRequest) -> Result<ChancesReport, ChancesServiceError> {
        let cycle = request.cycle.unwrap_or_else(AdmissionCycle::current);
        let key = CohortKey::from_query(&PeerQuery::for_profile(
            &request.profile,
            cycle,
            request.submission_id.clone(),
        ));
        let wants_peers = request.profile.has_any_stat();

        let (schools, cohort) = thread::scope(|scope| {
            let cohort = scope.spawn(|| {
                if wants_peers {
                    self.cohort(&key)
                } else {
                    Ok(Cached {
                        value: Arc::new(Vec::new()),
                        hit: false,
                    })
                }
            });
            let schools = self
                .cache
                .schools_or_fetch(|| self.institutional.institutional_stats());
            let cohort = match cohort.join() {
                Ok(cohort) => cohort,
                Err(payload) => panic::resume_unwind(payload),
            };
            (schools, cohort)
        });

        let schools = schools?.value;
        let (peer_stats, cohort_cache_hit) = match cohort {
            Ok(cached) => (cached.value, cached.hit),
            Err(error) => {
                warn!(%cycle, %error, "peer cohort unavailable; using institutional data only");
                (Arc::new(Vec::new()), false)
            }
        };

        let results = self
            .engine
            .classify_schools(&request.profile, &schools, &peer_stats);
        let groups = group_by_tier(&results);
        let report = ChancesReport {
            cycle,
            results,
            groups,
            cohort_cache_hit,
        };

        info!(
            %cycle,
            schools = report.results.len(),
            peer_schools = peer_stats.len(),
            cohort_cache_hit,
            safety = report.count(Tier::Safety),
            target = report.count(Tier::Target),
            reach = report.count(Tier::Reach),
            far_reach = report.count(Tier::FarReach),
            unscored = report.count(Tier::Unscored),
            "classified chances request"
        );

        Ok(report)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Forget cached snapshots and cohorts, e.g. after importing new submissions.
    pub fn invalidate_caches(&self) {
        self.cache.invalidate_all();
    }

    fn cohort(&self, key: &CohortKey) -> Result<Cached<Vec<SimilarProfileStats>>, SourceError> {
        self.cache
            .cohort_or_fetch(key, || self.peers.peer_cohort_stats(&key.to_query()))
    }
}

/// Error raised by the chances service.
#[derive(Debug, thiserror::Error)]
pub enum ChancesServiceError {
    #[error("institutional data unavailable: {0}")]
    Institutional(#[from] SourceError),
}
