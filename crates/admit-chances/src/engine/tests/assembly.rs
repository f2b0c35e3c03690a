use super::common::*;
use crate::engine::{group_by_tier, SchoolData, SchoolId, Tier};

fn even_odds(id: &str, name: &str) -> SchoolData {
    SchoolData {
        acceptance_rate: Some(50.0),
        ..SchoolData::new(id, name, id)
    }
}

#[test]
fn results_follow_tier_order() {
    let schools = vec![unknown_school(), ivy(), mid_selective(), state_flagship()];
    let results = engine().classify_schools(&student(), &schools, &[peers("ivy", 20, 2, 18)]);

    let tiers: Vec<Tier> = results.iter().map(|result| result.tier).collect();
    assert_eq!(
        tiers,
        vec![Tier::Safety, Tier::Target, Tier::FarReach, Tier::Unscored]
    );
}

#[test]
fn equal_estimates_break_ties_by_sample_size_then_name() {
    let schools = vec![
        even_odds("aardvark", "Aardvark College"),
        even_odds("alpha", "Alpha University"),
        even_odds("beta", "Beta Institute"),
    ];
    let peer_stats = vec![peers("alpha", 4, 2, 2), peers("beta", 8, 4, 4)];

    let results = engine().classify_schools(&student(), &schools, &peer_stats);

    let order: Vec<&str> = results
        .iter()
        .map(|result| result.school_id.0.as_str())
        .collect();
    assert_eq!(order, vec!["beta", "alpha", "aardvark"]);
    assert!(results
        .iter()
        .all(|result| result.probability_estimate == Some(0.5)));
}

#[test]
fn identical_estimates_without_peers_sort_by_name() {
    let schools = vec![
        even_odds("z", "Zephyr College"),
        even_odds("m", "Meridian College"),
    ];
    let results = engine().classify_schools(&student(), &schools, &[]);
    assert_eq!(results[0].school_name, "Meridian College");
    assert_eq!(results[1].school_name, "Zephyr College");
}

#[test]
fn groups_summarize_non_empty_tiers() {
    let schools = vec![ivy(), state_flagship(), unknown_school(), mid_selective()];
    let results = engine().classify_schools(&student(), &schools, &[peers("ivy", 20, 2, 18)]);

    let groups = group_by_tier(&results);
    let labels: Vec<&str> = groups.iter().map(|group| group.tier_label).collect();
    assert_eq!(labels, vec!["Safety", "Target", "Far Reach", "Unscored"]);
    assert_eq!(groups[0].school_ids, vec![SchoolId::from("flagship")]);
    assert!(groups.iter().all(|group| group.count == 1));
}

#[test]
fn classification_is_deterministic() {
    let schools = vec![unknown_school(), ivy(), mid_selective(), state_flagship()];
    let peer_stats = vec![peers("ivy", 20, 2, 18), peers("lakeside", 5, 2, 3)];

    let first = engine().classify_schools(&student(), &schools, &peer_stats);
    let second = engine().classify_schools(&student(), &schools, &peer_stats);

    assert_eq!(first, second);
}
