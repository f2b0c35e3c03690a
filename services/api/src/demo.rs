use crate::infra::{load_store, parse_cycle, parse_date};
use admit_chances::cohort::{
    AdmissionCycle, ApplicationRound, CacheConfig, Decision, PeerSubmission, SchoolOutcome,
    SubmissionId,
};
use admit_chances::config::{AppConfig, ConfigError, DataConfig};
use admit_chances::engine::{
    ActDistribution, EngineConfig, GpaBands, SatDistribution, SchoolData, SchoolId,
    StudentProfile, Tier,
};
use admit_chances::error::AppError;
use admit_chances::service::{ChancesReport, ChancesRequest, ChancesService};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date used to pick the admission cycle (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Print the raw JSON report instead of the text summary.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ClassifyArgs {
    /// Unweighted GPA on the 4.0 scale
    #[arg(long)]
    pub(crate) gpa: Option<f64>,
    /// SAT composite (400-1600)
    #[arg(long)]
    pub(crate) sat: Option<u16>,
    /// ACT composite (1-36)
    #[arg(long)]
    pub(crate) act: Option<u8>,
    /// Two-letter state of residence
    #[arg(long, default_value = "CA")]
    pub(crate) state: String,
    /// Intended major, used to narrow the peer cohort
    #[arg(long)]
    pub(crate) major: Option<String>,
    /// Admission cycle such as 2025-2026 (defaults to the current cycle)
    #[arg(long, value_parser = parse_cycle)]
    pub(crate) cycle: Option<AdmissionCycle>,
    /// Institutional snapshot CSV (overrides CHANCES_SCHOOLS_CSV)
    #[arg(long)]
    pub(crate) schools_csv: Option<PathBuf>,
    /// Peer submissions CSV (overrides CHANCES_SUBMISSIONS_CSV)
    #[arg(long)]
    pub(crate) submissions_csv: Option<PathBuf>,
    /// Print the raw JSON report instead of the text summary.
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_classify(args: ClassifyArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let cycle = args.cycle.unwrap_or_else(AdmissionCycle::current);
    let data = DataConfig {
        schools_csv: args.schools_csv.or(config.data.schools_csv),
        submissions_csv: args.submissions_csv.or(config.data.submissions_csv),
    };

    let profile = StudentProfile {
        gpa_unweighted: args.gpa,
        sat_score: args.sat,
        act_score: args.act,
        state_of_residence: args.state,
        intended_major: args.major,
        ap_courses_count: None,
    };
    let report = classify(&data, cycle, profile, config.engine, config.cache)?;
    print_report(&report, args.json)
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let cycle = AdmissionCycle::containing(today);

    println!("Admission chances demo ({cycle} cycle)");
    println!("Student: GPA 3.90, SAT 1480, California, Computer Science");
    let report = classify(
        &DataConfig::default(),
        cycle,
        demo_student(),
        EngineConfig::default(),
        CacheConfig::default(),
    )?;
    print_report(&report, args.json)
}

fn classify(
    data: &DataConfig,
    cycle: AdmissionCycle,
    profile: StudentProfile,
    engine: EngineConfig,
    cache: CacheConfig,
) -> Result<ChancesReport, AppError> {
    let store = Arc::new(load_store(data, cycle)?);
    let service =
        ChancesService::new(store.clone(), store, engine, cache).map_err(ConfigError::Engine)?;

    let request = ChancesRequest {
        cycle: Some(cycle),
        ..ChancesRequest::new(profile)
    };
    Ok(service.chances(&request)?)
}

fn print_report(report: &ChancesReport, json: bool) -> Result<(), AppError> {
    if json {
        let rendered = serde_json::to_string_pretty(report).map_err(std::io::Error::other)?;
        println!("{rendered}");
    } else {
        print!("{}", render_report(report));
    }
    Ok(())
}

pub(crate) fn render_report(report: &ChancesReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\nCycle {} | {} schools | peer cohort {}\n",
        report.cycle,
        report.results.len(),
        if report.cohort_cache_hit {
            "served from cache"
        } else {
            "freshly queried"
        }
    ));

    for group in &report.groups {
        out.push_str(&format!("\n{} ({})\n", group.tier_label, group.count));
        for result in report
            .results
            .iter()
            .filter(|result| result.tier == group.tier)
        {
            let estimate = result
                .probability_estimate
                .map(|probability| format!("{:>3.0}%", probability * 100.0))
                .unwrap_or_else(|| "  --".to_string());
            out.push_str(&format!(
                "  {estimate}  {} (confidence {:.2}, {} peers)\n",
                result.school_name, result.confidence, result.evidence.peer_sample_size
            ));
            for note in &result.evidence.notes {
                out.push_str(&format!("        - {note}\n"));
            }
        }
    }

    if report.groups.iter().all(|group| group.tier == Tier::Unscored) {
        out.push_str("\nNo school could be scored; add a GPA, SAT or ACT score.\n");
    }
    out
}

pub(crate) fn demo_student() -> StudentProfile {
    StudentProfile {
        gpa_unweighted: Some(3.9),
        sat_score: Some(1480),
        act_score: None,
        state_of_residence: "CA".to_string(),
        intended_major: Some("Computer Science".to_string()),
        ap_courses_count: Some(9),
    }
}

pub(crate) fn demo_schools() -> Vec<SchoolData> {
    let mut ivy = SchoolData::new("ivy-u", "Ivy University", "ivy-university");
    ivy.acceptance_rate = Some(6.0);
    ivy.sat = sat(1500, 1470, 1570);
    ivy.act = act(34, 33, 35);
    ivy.gpa_bands = bands([62.0, 24.0, 9.0, 3.0, 1.5, 0.5]);

    let mut tech = SchoolData::new("tech-inst", "Pacific Institute of Technology", "pit");
    tech.acceptance_rate = Some(9.0);
    tech.sat = sat(1530, 1500, 1580);

    let mut lakeside = SchoolData::new("lakeside", "Lakeside College", "lakeside-college");
    lakeside.acceptance_rate = Some(35.0);
    lakeside.sat = sat(1450, 1400, 1520);
    lakeside.act = act(32, 31, 34);
    lakeside.gpa_bands = bands([38.0, 30.0, 18.0, 8.0, 4.0, 2.0]);

    let mut flagship = SchoolData::new("state-flagship", "State Flagship University", "state");
    flagship.acceptance_rate = Some(65.0);
    flagship.sat = sat(1420, 1350, 1500);
    flagship.gpa_bands = bands([20.0, 30.0, 25.0, 15.0, 7.0, 3.0]);

    let mut regional = SchoolData::new("valley-state", "Valley State", "valley-state");
    regional.acceptance_rate = Some(82.0);
    regional.sat = SatDistribution {
        average: Some(1180),
        p25: None,
        p75: None,
    };

    let mystery = SchoolData::new("new-college", "New Horizons College", "new-horizons");

    vec![ivy, tech, lakeside, flagship, regional, mystery]
}

/// Twelve synthetic peers clustered around the demo student.
pub(crate) fn demo_submissions(cycle: AdmissionCycle) -> Vec<PeerSubmission> {
    (0..12u16)
        .map(|index| {
            let ivy = if index % 6 == 0 {
                Decision::Accepted
            } else {
                Decision::Rejected
            };
            let lakeside = match index % 3 {
                0 | 1 => Decision::Accepted,
                _ => Decision::Waitlisted,
            };
            let round = if index % 4 == 0 {
                Some(ApplicationRound::EarlyAction)
            } else {
                Some(ApplicationRound::Regular)
            };

            PeerSubmission {
                id: SubmissionId(format!("demo-{index:03}")),
                cycle,
                gpa_unweighted: Some(3.8 + f64::from(index % 3) * 0.05),
                sat_score: Some(1440 + (index % 5) * 20),
                act_score: None,
                intended_major: Some(if index % 4 == 3 {
                    "Computer Science and Mathematics".to_string()
                } else {
                    "Computer Science".to_string()
                }),
                hidden: false,
                outcomes: vec![
                    outcome("ivy-u", ivy, Some(ApplicationRound::Regular)),
                    outcome("lakeside", lakeside, round),
                    outcome("state-flagship", Decision::Accepted, round),
                ],
            }
        })
        .collect()
}

fn outcome(school: &str, decision: Decision, round: Option<ApplicationRound>) -> SchoolOutcome {
    SchoolOutcome {
        school_id: SchoolId::from(school),
        decision,
        round,
    }
}

fn sat(average: u16, p25: u16, p75: u16) -> SatDistribution {
    SatDistribution {
        average: Some(average),
        p25: Some(p25),
        p75: Some(p75),
    }
}

fn act(median: u8, p25: u8, p75: u8) -> ActDistribution {
    ActDistribution {
        median: Some(median),
        p25: Some(p25),
        p75: Some(p75),
    }
}

fn bands(shares: [f64; 6]) -> GpaBands {
    GpaBands {
        gpa_4_00: Some(shares[0]),
        gpa_3_75_to_3_99: Some(shares[1]),
        gpa_3_50_to_3_74: Some(shares[2]),
        gpa_3_25_to_3_49: Some(shares[3]),
        gpa_3_00_to_3_24: Some(shares[4]),
        gpa_below_3_00: Some(shares[5]),
    }
}
