use serde::{Deserialize, Serialize};

/// Tunable constants for positioning, blending and tier thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// How far a full positional swing moves the institutional rate.
    pub adjustment_scale: f64,
    /// Peer cohort size at which the empirical rate is fully trusted.
    pub min_confident_sample: u32,
    /// Below this confidence a Safety result is shown as Target.
    pub min_display_confidence: f64,
    /// Baseline rate used when a school publishes no acceptance rate.
    pub global_prior: f64,
    pub probability_floor: f64,
    pub probability_ceiling: f64,
    /// Estimates below this are Reach.
    pub reach_ceiling: f64,
    /// Estimates at or above this are Safety.
    pub safety_floor: f64,
    /// Acceptance rate (percent) under which a school counts as highly selective.
    pub far_reach_acceptance_rate: f64,
    /// Highly selective schools below this estimate are FarReach.
    pub far_reach_ceiling: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            adjustment_scale: 0.25,
            min_confident_sample: 8,
            min_display_confidence: 0.15,
            global_prior: 0.30,
            probability_floor: 0.01,
            probability_ceiling: 0.99,
            reach_ceiling: 0.25,
            safety_floor: 0.60,
            far_reach_acceptance_rate: 10.0,
            far_reach_ceiling: 0.40,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineConfigError> {
        unit_interval("adjustment_scale", self.adjustment_scale)?;
        unit_interval("min_display_confidence", self.min_display_confidence)?;
        unit_interval("global_prior", self.global_prior)?;
        unit_interval("probability_floor", self.probability_floor)?;
        unit_interval("probability_ceiling", self.probability_ceiling)?;
        unit_interval("reach_ceiling", self.reach_ceiling)?;
        unit_interval("safety_floor", self.safety_floor)?;
        unit_interval("far_reach_ceiling", self.far_reach_ceiling)?;

        if self.min_confident_sample == 0 {
            return Err(EngineConfigError::ZeroConfidentSample);
        }
        if !(0.0..=100.0).contains(&self.far_reach_acceptance_rate) {
            return Err(EngineConfigError::OutOfRange {
                field: "far_reach_acceptance_rate",
                value: self.far_reach_acceptance_rate,
            });
        }
        if self.probability_floor >= self.probability_ceiling {
            return Err(EngineConfigError::Unordered {
                lower: "probability_floor",
                upper: "probability_ceiling",
            });
        }
        if self.reach_ceiling >= self.safety_floor {
            return Err(EngineConfigError::Unordered {
                lower: "reach_ceiling",
                upper: "safety_floor",
            });
        }

        Ok(())
    }
}

fn unit_interval(field: &'static str, value: f64) -> Result<(), EngineConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(EngineConfigError::OutOfRange { field, value })
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineConfigError {
    #[error("{field} = {value} is outside its allowed range")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("min_confident_sample must be at least 1")]
    ZeroConfidentSample,
    #[error("{lower} must be strictly below {upper}")]
    Unordered {
        lower: &'static str,
        upper: &'static str,
    },
}
