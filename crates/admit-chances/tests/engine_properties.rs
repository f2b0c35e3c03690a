use admit_chances::engine::blend;
use admit_chances::engine::{
    classify_schools, ActDistribution, ClassificationEngine, EngineConfig, GpaBands,
    SatDistribution, SchoolData, SchoolId, SimilarProfileStats, StudentProfile, Tier, TierRule,
};
use proptest::prelude::*;

prop_compose! {
    fn school(index: usize)(
        rate in proptest::option::of(0.5f64..95.0),
        sat_p25 in 900u16..1450,
        sat_width in 40u16..180,
        act_p25 in 18u8..32,
        bands in proptest::option::of(proptest::array::uniform6(0.0f64..60.0)),
    ) -> SchoolData {
        SchoolData {
            acceptance_rate: rate,
            sat: SatDistribution {
                average: None,
                p25: Some(sat_p25),
                p75: Some(sat_p25 + sat_width),
            },
            act: ActDistribution {
                median: None,
                p25: Some(act_p25),
                p75: Some(act_p25 + 3),
            },
            gpa_bands: bands
                .map(|shares| GpaBands {
                    gpa_4_00: Some(shares[0]),
                    gpa_3_75_to_3_99: Some(shares[1]),
                    gpa_3_50_to_3_74: Some(shares[2]),
                    gpa_3_25_to_3_49: Some(shares[3]),
                    gpa_3_00_to_3_24: Some(shares[4]),
                    gpa_below_3_00: Some(shares[5]),
                })
                .unwrap_or_default(),
            ..SchoolData::new(format!("school-{index}"), format!("School {index}"), format!("s{index}"))
        }
    }
}

prop_compose! {
    fn student()(
        gpa in proptest::option::of(2.0f64..4.0),
        sat in proptest::option::of(800u16..=1600),
        act in proptest::option::of(15u8..=36),
    ) -> StudentProfile {
        StudentProfile {
            gpa_unweighted: gpa,
            sat_score: sat,
            act_score: act,
            state_of_residence: "NY".to_string(),
            intended_major: None,
            ap_courses_count: None,
        }
    }
}

fn peers(school: &SchoolData, total: u32, accepted: u32) -> SimilarProfileStats {
    SimilarProfileStats {
        total_similar: total,
        accepted,
        rejected: total - accepted,
        ..SimilarProfileStats::empty(school.id.clone())
    }
}

fn schools() -> impl Strategy<Value = Vec<SchoolData>> {
    (school(0), school(1), school(2), school(3)).prop_map(|(a, b, c, d)| vec![a, b, c, d])
}

proptest! {
    #[test]
    fn probabilities_and_confidence_stay_in_bounds(
        profile in student(),
        schools in schools(),
        total in 1u32..40,
        accepted_share in 0.0f64..=1.0,
    ) {
        let accepted = (f64::from(total) * accepted_share).floor() as u32;
        let peer_stats = vec![peers(&schools[0], total, accepted)];

        for result in classify_schools(&profile, &schools, &peer_stats) {
            if let Some(probability) = result.probability_estimate {
                prop_assert!((0.0..=1.0).contains(&probability));
            }
            prop_assert!((0.0..=1.0).contains(&result.confidence));
        }
    }

    #[test]
    fn confidence_grows_with_peer_sample(
        profile in student(),
        school in school(0),
        small in 1u32..20,
        extra in 1u32..20,
    ) {
        let engine = ClassificationEngine::default();
        let smaller = engine.classify_schools(&profile, &[school.clone()], &[peers(&school, small, 0)]);
        let larger = engine.classify_schools(
            &profile,
            &[school.clone()],
            &[peers(&school, small + extra, 0)],
        );
        prop_assert!(larger[0].confidence >= smaller[0].confidence);
        prop_assert!(larger[0].evidence.peer_confidence >= smaller[0].evidence.peer_confidence);
    }

    #[test]
    fn without_peers_the_estimate_is_the_adjusted_baseline(
        profile in student(),
        school in school(0),
    ) {
        prop_assume!(profile.has_any_stat() && school.acceptance_rate.is_some());

        let config = EngineConfig::default();
        let engine = ClassificationEngine::new(config.clone()).expect("default config validates");
        let result = &engine.classify_schools(&profile, &[school.clone()], &[])[0];
        let expected = blend::baseline(
            school.acceptance_rate,
            result.evidence.position_score,
            &config,
        );

        prop_assert_eq!(result.probability_estimate, Some(expected.adjusted));
        prop_assert_eq!(result.evidence.institutional_signal, Some(expected.adjusted));
    }

    #[test]
    fn higher_sat_never_lowers_the_estimate(
        school in school(0),
        low in 400u16..1600,
        raise in 0u16..400,
    ) {
        let high = (low + raise).min(1600);
        let profile = |sat| StudentProfile {
            gpa_unweighted: None,
            sat_score: Some(sat),
            act_score: None,
            state_of_residence: "TX".to_string(),
            intended_major: None,
            ap_courses_count: None,
        };

        let engine = ClassificationEngine::default();
        let lower = engine.classify_schools(&profile(low), &[school.clone()], &[]);
        let higher = engine.classify_schools(&profile(high), &[school.clone()], &[]);
        prop_assert!(higher[0].probability_estimate >= lower[0].probability_estimate);
    }

    #[test]
    fn missing_rate_without_peers_is_unscored(
        profile in student(),
        school in school(0),
    ) {
        let school = SchoolData { acceptance_rate: None, ..school };
        let result = &classify_schools(&profile, &[school], &[])[0];

        prop_assert_eq!(result.tier, Tier::Unscored);
        prop_assert_eq!(result.probability_estimate, None);
        prop_assert!(matches!(result.evidence.tier_rule, TierRule::NoData | TierRule::NoStudentStats));
    }

    #[test]
    fn classification_is_deterministic_and_order_independent(
        profile in student(),
        schools in schools(),
        total in 1u32..30,
    ) {
        let peer_stats = vec![peers(&schools[1], total, total / 3)];
        let first = classify_schools(&profile, &schools, &peer_stats);
        let again = classify_schools(&profile, &schools, &peer_stats);
        prop_assert_eq!(&first, &again);

        let mut reversed = schools.clone();
        reversed.reverse();
        let shuffled = classify_schools(&profile, &reversed, &peer_stats);
        prop_assert_eq!(&first, &shuffled);

        let ids: Vec<&SchoolId> = first.iter().map(|result| &result.school_id).collect();
        prop_assert_eq!(ids.len(), schools.len());
    }
}
