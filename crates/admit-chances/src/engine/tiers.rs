use super::config::EngineConfig;
use super::domain::{Tier, TierRule};

/// Everything the classifier looks at for one school.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierInputs {
    pub probability: Option<f64>,
    /// Usable published acceptance rate, in percent.
    pub acceptance_rate: Option<f64>,
    pub confidence: f64,
}

/// Map an estimate onto a tier. Boundaries belong to the more optimistic tier.
pub fn classify(inputs: &TierInputs, config: &EngineConfig) -> (Tier, TierRule) {
    let Some(probability) = inputs.probability else {
        return (Tier::Unscored, TierRule::NoData);
    };

    let highly_selective = inputs
        .acceptance_rate
        .map(|rate| rate < config.far_reach_acceptance_rate)
        .unwrap_or(false);
    if highly_selective && probability < config.far_reach_ceiling {
        return (Tier::FarReach, TierRule::Selectivity);
    }

    if probability < config.reach_ceiling {
        return (Tier::Reach, TierRule::ProbabilityBand);
    }

    if probability < config.safety_floor {
        return (Tier::Target, TierRule::ProbabilityBand);
    }

    if inputs.confidence < config.min_display_confidence {
        return (Tier::Target, TierRule::LowConfidenceDowngrade);
    }

    (Tier::Safety, TierRule::ProbabilityBand)
}
