//! Percentile positioning of a student's stats against a school's distributions.

use super::domain::{
    ActDistribution, AxisPositions, GpaBand, GpaBands, SatDistribution, SchoolData, StudentProfile,
};

/// Half-width of the synthesized SAT middle band when only the average is published.
pub const SAT_BAND_HALF_WIDTH: f64 = 80.0;
/// Half-width of the synthesized ACT middle band when only the median is published.
pub const ACT_BAND_HALF_WIDTH: f64 = 3.0;

/// Score range holding the middle 50% of a school's students.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MiddleBand {
    pub p25: f64,
    pub p75: f64,
}

impl MiddleBand {
    /// Resolve a usable band from published quartiles, falling back to the center.
    ///
    /// Returns `None` when the quartiles are inverted or nothing usable is published.
    pub fn resolve(
        p25: Option<f64>,
        p75: Option<f64>,
        center: Option<f64>,
        half_width: f64,
    ) -> Option<Self> {
        match (p25, p75) {
            (Some(low), Some(high)) if low > high => None,
            (Some(low), Some(high)) if high - low < f64::EPSILON => Some(Self {
                p25: low - half_width,
                p75: low + half_width,
            }),
            (Some(low), Some(high)) => Some(Self {
                p25: low,
                p75: high,
            }),
            _ => center.map(|mid| Self {
                p25: mid - half_width,
                p75: mid + half_width,
            }),
        }
    }

    /// Linear 0..1 inside the band, +1 at or above p75, negative below p25 floored at -1.
    pub fn position(&self, score: f64) -> f64 {
        let width = self.p75 - self.p25;
        if score >= self.p75 {
            1.0
        } else if score >= self.p25 {
            (score - self.p25) / width
        } else {
            (-(self.p25 - score) / width).max(-1.0)
        }
    }
}

pub fn sat_position(score: u16, distribution: &SatDistribution) -> Option<f64> {
    let band = MiddleBand::resolve(
        published(distribution.p25),
        published(distribution.p75),
        published(distribution.average),
        SAT_BAND_HALF_WIDTH,
    )?;
    Some(band.position(f64::from(score)))
}

pub fn act_position(score: u8, distribution: &ActDistribution) -> Option<f64> {
    let band = MiddleBand::resolve(
        published(distribution.p25),
        published(distribution.p75),
        published(distribution.median),
        ACT_BAND_HALF_WIDTH,
    )?;
    Some(band.position(f64::from(score)))
}

/// Mid-rank percentile of the student's GPA band among enrolled students, mapped to [-1, 1].
///
/// Absent bands count as zero; negative or non-finite shares make the axis unusable.
pub fn gpa_position(gpa: f64, bands: &GpaBands) -> Option<f64> {
    let shares = bands.shares();
    if shares
        .iter()
        .flatten()
        .any(|share| !share.is_finite() || *share < 0.0)
    {
        return None;
    }

    let total: f64 = shares.iter().flatten().sum();
    if total <= 0.0 {
        return None;
    }

    let index = GpaBand::for_gpa(gpa).index();
    let in_band = shares[index].unwrap_or(0.0);
    let below: f64 = shares[index + 1..].iter().flatten().sum();
    let percentile = (below + in_band / 2.0) / total;

    Some((percentile * 2.0 - 1.0).clamp(-1.0, 1.0))
}

/// Position every axis the student and the school both provide.
pub fn position_student(profile: &StudentProfile, school: &SchoolData) -> AxisPositions {
    AxisPositions {
        gpa: profile
            .usable_gpa()
            .and_then(|gpa| gpa_position(gpa, &school.gpa_bands)),
        sat: profile
            .usable_sat()
            .and_then(|score| sat_position(score, &school.sat)),
        act: profile
            .usable_act()
            .and_then(|score| act_position(score, &school.act)),
    }
}

// Zero is how several feeds encode "not reported".
fn published<T: Into<f64> + Copy>(value: Option<T>) -> Option<f64> {
    value
        .map(|raw| -> f64 { raw.into() })
        .filter(|value| *value > 0.0)
}
