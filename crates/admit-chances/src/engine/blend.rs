use super::config::EngineConfig;
use super::domain::SchoolData;
use super::peers::PeerSignal;

// Institutional completeness by available evidence.
const COMPLETE: f64 = 1.0;
const RATE_WITHOUT_POSITION: f64 = 0.6;
const PRIOR_WITH_POSITION: f64 = 0.3;
const PRIOR_ONLY: f64 = 0.0;

/// Institutional baseline for one school before peer blending.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Baseline {
    pub adjusted: f64,
    pub used_global_prior: bool,
    pub completeness: f64,
}

/// Final estimate for one school.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blend {
    pub probability: f64,
    pub confidence: f64,
}

/// Published acceptance rate, ignoring values that cannot be a percentage.
pub fn usable_acceptance_rate(school: &SchoolData) -> Option<f64> {
    school
        .acceptance_rate
        .filter(|rate| rate.is_finite() && (0.0..=100.0).contains(rate))
}

/// `clamp(rate + position * scale, floor, ceiling)`; a missing position adds nothing.
pub fn adjusted_baseline(institutional_rate: f64, position: Option<f64>, config: &EngineConfig) -> f64 {
    let shift = position.unwrap_or(0.0) * config.adjustment_scale;
    (institutional_rate + shift).clamp(config.probability_floor, config.probability_ceiling)
}

pub fn baseline(acceptance_rate: Option<f64>, position: Option<f64>, config: &EngineConfig) -> Baseline {
    let (rate, used_global_prior) = match acceptance_rate {
        Some(percent) => (percent / 100.0, false),
        None => (config.global_prior, true),
    };

    let completeness = match (used_global_prior, position.is_some()) {
        (false, true) => COMPLETE,
        (false, false) => RATE_WITHOUT_POSITION,
        (true, true) => PRIOR_WITH_POSITION,
        (true, false) => PRIOR_ONLY,
    };

    Baseline {
        adjusted: adjusted_baseline(rate, position, config),
        used_global_prior,
        completeness,
    }
}

/// Confidence-weighted interpolation between the peer rate and the baseline.
pub fn blend(baseline: &Baseline, peer: Option<&PeerSignal>) -> Blend {
    match peer {
        Some(signal) => {
            let weight = signal.confidence;
            Blend {
                probability: (weight * signal.empirical_rate + (1.0 - weight) * baseline.adjusted)
                    .clamp(0.0, 1.0),
                confidence: weight + (1.0 - weight) * baseline.completeness,
            }
        }
        None => Blend {
            probability: baseline.adjusted,
            confidence: baseline.completeness,
        },
    }
}
