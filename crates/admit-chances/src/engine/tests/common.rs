use crate::engine::{
    ActDistribution, ClassificationEngine, EngineConfig, GpaBands, SatDistribution, SchoolData,
    SchoolId, SimilarProfileStats, StudentProfile,
};

pub(super) fn student() -> StudentProfile {
    StudentProfile {
        gpa_unweighted: Some(3.9),
        sat_score: Some(1480),
        act_score: None,
        state_of_residence: "CA".to_string(),
        intended_major: Some("Computer Science".to_string()),
        ap_courses_count: Some(7),
    }
}

pub(super) fn engine() -> ClassificationEngine {
    ClassificationEngine::new(EngineConfig::default()).expect("default config validates")
}

pub(super) fn selective_bands() -> GpaBands {
    GpaBands {
        gpa_4_00: Some(62.0),
        gpa_3_75_to_3_99: Some(25.0),
        gpa_3_50_to_3_74: Some(8.0),
        gpa_3_25_to_3_49: Some(3.0),
        gpa_3_00_to_3_24: Some(1.5),
        gpa_below_3_00: Some(0.5),
    }
}

pub(super) fn ivy() -> SchoolData {
    SchoolData {
        acceptance_rate: Some(8.0),
        sat: SatDistribution {
            average: Some(1500),
            p25: Some(1450),
            p75: Some(1550),
        },
        gpa_bands: selective_bands(),
        ..SchoolData::new("ivy", "Ivy Hall University", "ivy-hall")
    }
}

pub(super) fn state_flagship() -> SchoolData {
    SchoolData {
        acceptance_rate: Some(65.0),
        sat: SatDistribution {
            average: None,
            p25: Some(1350),
            p75: Some(1500),
        },
        ..SchoolData::new("flagship", "Coastal State University", "coastal-state")
    }
}

pub(super) fn mid_selective() -> SchoolData {
    SchoolData {
        acceptance_rate: Some(35.0),
        sat: SatDistribution {
            average: None,
            p25: Some(1400),
            p75: Some(1520),
        },
        act: ActDistribution {
            median: Some(32),
            p25: Some(31),
            p75: Some(34),
        },
        ..SchoolData::new("lakeside", "Lakeside College", "lakeside")
    }
}

pub(super) fn unknown_school() -> SchoolData {
    SchoolData::new("mystery", "Mystery Institute", "mystery")
}

pub(super) fn peers(school: &str, total: u32, accepted: u32, rejected: u32) -> SimilarProfileStats {
    SimilarProfileStats {
        total_similar: total,
        accepted,
        rejected,
        ..SimilarProfileStats::empty(SchoolId::from(school))
    }
}
