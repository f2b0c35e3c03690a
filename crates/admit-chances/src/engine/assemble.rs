use std::cmp::Ordering;

use serde::Serialize;

use super::domain::{ClassificationResult, SchoolId, Tier};

/// Schools sharing a tier, in presentation order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TierGroup {
    pub tier: Tier,
    pub tier_label: &'static str,
    pub count: usize,
    pub school_ids: Vec<SchoolId>,
}

/// Tier order, then descending probability, peer sample size, name and id.
pub fn presentation_order(a: &ClassificationResult, b: &ClassificationResult) -> Ordering {
    a.tier
        .rank()
        .cmp(&b.tier.rank())
        .then_with(|| descending_probability(a.probability_estimate, b.probability_estimate))
        .then_with(|| {
            b.evidence
                .peer_sample_size
                .cmp(&a.evidence.peer_sample_size)
        })
        .then_with(|| a.school_name.cmp(&b.school_name))
        .then_with(|| a.school_id.cmp(&b.school_id))
}

pub fn sort_results(results: &mut [ClassificationResult]) {
    results.sort_by(presentation_order);
}

/// Group sorted results by tier; tiers without schools are omitted.
pub fn group_by_tier(results: &[ClassificationResult]) -> Vec<TierGroup> {
    Tier::ordered()
        .into_iter()
        .filter_map(|tier| {
            let school_ids: Vec<SchoolId> = results
                .iter()
                .filter(|result| result.tier == tier)
                .map(|result| result.school_id.clone())
                .collect();
            if school_ids.is_empty() {
                None
            } else {
                Some(TierGroup {
                    tier,
                    tier_label: tier.label(),
                    count: school_ids.len(),
                    school_ids,
                })
            }
        })
        .collect()
}

// Scored schools precede unscored ones.
fn descending_probability(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(left), Some(right)) => right.total_cmp(&left),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
