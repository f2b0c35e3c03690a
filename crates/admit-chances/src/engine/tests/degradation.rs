use super::common::*;
use crate::engine::{
    classify_schools, ClassificationEngine, EngineConfig, EngineConfigError, SchoolId,
    StudentProfile, Tier, TierRule,
};

#[test]
fn profile_without_stats_returns_every_school_unscored() {
    let profile = StudentProfile {
        gpa_unweighted: None,
        sat_score: None,
        act_score: None,
        ..student()
    };

    let schools = vec![ivy(), state_flagship(), unknown_school()];
    let results = engine().classify_schools(&profile, &schools, &[peers("ivy", 20, 2, 18)]);

    assert_eq!(results.len(), 3);
    for result in &results {
        assert_eq!(result.tier, Tier::Unscored);
        assert_eq!(result.probability_estimate, None);
        assert_eq!(result.evidence.tier_rule, TierRule::NoStudentStats);
    }
}

#[test]
fn out_of_range_stats_count_as_missing() {
    let profile = StudentProfile {
        gpa_unweighted: Some(f64::NAN),
        sat_score: Some(2400),
        act_score: Some(0),
        ..student()
    };
    assert!(!profile.has_any_stat());

    let results = engine().classify_schools(&profile, &[state_flagship()], &[]);
    assert_eq!(results[0].evidence.tier_rule, TierRule::NoStudentStats);

    for gpa in [-1.0, -2.0, 4.6] {
        let gpa_only = StudentProfile {
            gpa_unweighted: Some(gpa),
            sat_score: None,
            act_score: None,
            ..student()
        };
        assert_eq!(gpa_only.usable_gpa(), None, "gpa {gpa} is off the 4.0 scale");
        assert!(!gpa_only.has_any_stat());

        let results = engine().classify_schools(&gpa_only, &[state_flagship()], &[]);
        assert_eq!(results[0].tier, Tier::Unscored);
        assert_eq!(results[0].probability_estimate, None);
        assert_eq!(results[0].evidence.tier_rule, TierRule::NoStudentStats);
    }
}

#[test]
fn off_scale_gpa_leaves_other_axes_in_play() {
    let profile = StudentProfile {
        gpa_unweighted: Some(4.6),
        ..student()
    };
    let results = engine().classify_schools(&profile, &[ivy()], &[]);

    assert_eq!(results[0].evidence.axis_positions.gpa, None);
    assert!(results[0].evidence.axis_positions.sat.is_some());
    assert!(results[0].probability_estimate.is_some());
}

#[test]
fn corrupt_peer_counts_fall_back_to_baseline() {
    let clean = engine().classify_schools(&student(), &[state_flagship()], &[]);
    let corrupt = engine().classify_schools(
        &student(),
        &[state_flagship()],
        &[peers("flagship", 4, 6, 0)],
    );

    assert_eq!(
        corrupt[0].probability_estimate,
        clean[0].probability_estimate
    );
    assert_eq!(corrupt[0].confidence, clean[0].confidence);
    assert!(corrupt[0].evidence.peer_data_rejected);
    assert_eq!(corrupt[0].evidence.peer_sample_size, 0);
    assert!(corrupt[0]
        .evidence
        .notes
        .iter()
        .any(|note| note.contains("excluded")));
}

#[test]
fn corrupt_entry_does_not_affect_other_schools() {
    let results = engine().classify_schools(
        &student(),
        &[ivy(), mid_selective()],
        &[peers("ivy", 0, 0, 0), peers("lakeside", 10, 5, 5)],
    );

    let ivy_result = results
        .iter()
        .find(|result| result.school_id == SchoolId::from("ivy"))
        .expect("ivy present");
    let lakeside = results
        .iter()
        .find(|result| result.school_id == SchoolId::from("lakeside"))
        .expect("lakeside present");

    assert!(ivy_result.evidence.peer_data_rejected);
    assert_eq!(lakeside.evidence.peer_sample_size, 10);
    assert!(!lakeside.evidence.peer_data_rejected);
}

#[test]
fn missing_rate_with_peers_uses_global_prior() {
    let mut school = mid_selective();
    school.acceptance_rate = None;

    let results = engine().classify_schools(&student(), &[school], &[peers("lakeside", 4, 1, 3)]);
    let result = &results[0];

    assert_ne!(result.tier, Tier::Unscored);
    assert!(result.evidence.used_global_prior);
    assert_eq!(result.evidence.acceptance_rate, None);
    assert!(result.confidence < 1.0);
}

#[test]
fn missing_rate_without_peers_is_unscored() {
    let mut school = mid_selective();
    school.acceptance_rate = None;

    let results = engine().classify_schools(&student(), &[school], &[]);

    assert_eq!(results[0].tier, Tier::Unscored);
    assert_eq!(results[0].probability_estimate, None);
    assert!(results[0].evidence.position_score.is_some());
}

#[test]
fn malformed_acceptance_rate_is_treated_as_missing() {
    let mut school = state_flagship();
    school.acceptance_rate = Some(165.0);

    let results = classify_schools(&student(), &[school], &[]);
    assert_eq!(results[0].tier, Tier::Unscored);
}

#[test]
fn peers_for_unknown_schools_are_ignored() {
    let results = engine().classify_schools(
        &student(),
        &[state_flagship()],
        &[peers("elsewhere", 12, 6, 6)],
    );

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].evidence.peer_sample_size, 0);
}

#[test]
fn engine_rejects_inverted_probability_bounds() {
    let inverted = EngineConfig {
        probability_floor: 0.9,
        probability_ceiling: 0.1,
        ..EngineConfig::default()
    };
    assert_eq!(
        ClassificationEngine::new(inverted).map(|_| ()),
        Err(EngineConfigError::Unordered {
            lower: "probability_floor",
            upper: "probability_ceiling",
        })
    );

    let unbounded = EngineConfig {
        probability_ceiling: f64::NAN,
        ..EngineConfig::default()
    };
    assert!(matches!(
        ClassificationEngine::new(unbounded),
        Err(EngineConfigError::OutOfRange {
            field: "probability_ceiling",
            ..
        })
    ));
}
