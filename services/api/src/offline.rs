use crate::infra::load_store;
use campus_nest::analytics::{PlacementStatsParams, PlacementStatsQuery};
use campus_nest::error::{AppError, ServiceError};
use campus_nest::reports::{render_csv, ReportRequest};
use campus_nest::{AnalyticsEngine, ReportService};
use chrono::Utc;
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct StatsArgs {
    /// JSON snapshot of users, companies, jobs, applications, and resumes
    #[arg(long)]
    pub(crate) seed: PathBuf,
    /// Restrict the overview to one department
    #[arg(long)]
    pub(crate) department: Option<String>,
    /// Earliest student creation date (YYYY-MM-DD)
    #[arg(long)]
    pub(crate) from: Option<String>,
    /// Latest student creation date (YYYY-MM-DD)
    #[arg(long)]
    pub(crate) to: Option<String>,
    /// Trend bucket: day, week, or month
    #[arg(long)]
    pub(crate) interval: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ExportArgs {
    /// JSON snapshot of users, companies, jobs, applications, and resumes
    #[arg(long)]
    pub(crate) seed: PathBuf,
    /// Report kind: placement, applications, or companies
    #[arg(long = "type")]
    pub(crate) report_type: String,
    #[arg(long)]
    pub(crate) department: Option<String>,
    /// Window start (YYYY-MM-DD); applications report only
    #[arg(long)]
    pub(crate) start_date: Option<String>,
    /// Window end (YYYY-MM-DD); applications report only
    #[arg(long)]
    pub(crate) end_date: Option<String>,
}

pub(crate) fn run_stats(args: StatsArgs) -> Result<(), AppError> {
    println!("{}", stats_json(args)?);
    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    print!("{}", export_csv(args)?);
    Ok(())
}

fn stats_json(args: StatsArgs) -> Result<String, AppError> {
    let StatsArgs {
        seed,
        department,
        from,
        to,
        interval,
    } = args;
    let store = Arc::new(load_store(Some(&seed))?);
    let query = PlacementStatsQuery::try_from(PlacementStatsParams {
        from,
        to,
        department,
        interval,
        ..PlacementStatsParams::default()
    })?;
    let stats = AnalyticsEngine::new(store).placement_stats(&query, Utc::now())?;
    serde_json::to_string_pretty(&stats)
        .map_err(|err| AppError::Service(ServiceError::Worker(err.to_string())))
}

fn export_csv(args: ExportArgs) -> Result<String, AppError> {
    let ExportArgs {
        seed,
        report_type,
        department,
        start_date,
        end_date,
    } = args;
    let store = Arc::new(load_store(Some(&seed))?);
    let report = ReportService::new(store).generate(
        ReportRequest {
            report_type,
            department,
            start_date,
            end_date,
        },
        Utc::now(),
    )?;
    Ok(render_csv(&report).map_err(ServiceError::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SEED: &str = r#"{
        "companies": [
            {"id": "00000000-0000-0000-0000-0000000000c1", "name": "Acme Systems"}
        ],
        "users": [
            {
                "id": "00000000-0000-0000-0000-000000000001",
                "firstName": "Asha", "lastName": "Rao", "email": "asha@campus.test",
                "role": "student", "createdAt": "2025-01-10T08:00:00Z",
                "department": "CS", "placedStatus": "Placed"
            },
            {
                "id": "00000000-0000-0000-0000-000000000002",
                "firstName": "Bilal", "lastName": "Khan", "email": "bilal@campus.test",
                "role": "student", "createdAt": "2025-01-11T08:00:00Z",
                "department": "ME"
            }
        ],
        "jobs": [
            {
                "id": "00000000-0000-0000-0000-0000000000a1",
                "company": {"id": "00000000-0000-0000-0000-0000000000c1", "name": "Acme Systems"},
                "position": "Backend Engineer",
                "applicationDeadline": "2025-12-01T00:00:00Z",
                "createdAt": "2025-01-01T00:00:00Z"
            }
        ],
        "applications": [
            {
                "id": "00000000-0000-0000-0000-0000000000b1",
                "jobId": "00000000-0000-0000-0000-0000000000a1",
                "studentId": "00000000-0000-0000-0000-000000000001",
                "status": "selected",
                "appliedOn": "2025-02-01T00:00:00Z",
                "updatedOn": "2025-02-10T00:00:00Z"
            }
        ]
    }"#;

    fn seed_file(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "campus-nest-{name}-{}.json",
            std::process::id()
        ));
        let mut file = std::fs::File::create(&path).expect("seed file");
        file.write_all(SEED.as_bytes()).expect("seed written");
        path
    }

    #[test]
    fn stats_command_reports_status_breakdown() {
        let seed = seed_file("stats");
        let json = stats_json(StatsArgs {
            seed: seed.clone(),
            department: None,
            from: None,
            to: None,
            interval: None,
        })
        .expect("stats render");
        std::fs::remove_file(seed).ok();

        let stats: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(stats["overview"]["totalStudents"], 2);
    }

    #[test]
    fn export_command_renders_placement_csv() {
        let seed = seed_file("export");
        let csv = export_csv(ExportArgs {
            seed: seed.clone(),
            report_type: "placement".to_string(),
            department: None,
            start_date: None,
            end_date: None,
        })
        .expect("csv render");
        std::fs::remove_file(seed).ok();

        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("name,email,department,cgpa"));
        assert_eq!(lines.next(), Some("Asha Rao,asha@campus.test,CS,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn export_command_rejects_unknown_kind() {
        let seed = seed_file("unknown");
        let err = export_csv(ExportArgs {
            seed: seed.clone(),
            report_type: "salaries".to_string(),
            department: None,
            start_date: None,
            end_date: None,
        })
        .expect_err("invalid kind");
        std::fs::remove_file(seed).ok();
        assert!(matches!(err, AppError::Service(ServiceError::Validation(_))));
    }
}
