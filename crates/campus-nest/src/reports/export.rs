use super::Report;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv write failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv buffer flush failed: {0}")]
    Flush(String),
    #[error("csv output is not utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

const PLACEMENT_HEADER: [&str; 4] = ["name", "email", "department", "cgpa"];
const APPLICATIONS_HEADER: [&str; 8] = [
    "application_id",
    "status",
    "applied_on",
    "student_name",
    "student_email",
    "department",
    "position",
    "company",
];
const COMPANIES_HEADER: [&str; 5] = ["company_id", "name", "industry", "total_jobs", "active_jobs"];

fn optional(value: Option<&str>) -> &str {
    value.unwrap_or("")
}

/// Renders the row section of a report as CSV with a header line.
pub fn render_csv(report: &Report) -> Result<String, ExportError> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    match report {
        Report::Placement(report) => {
            writer.write_record(PLACEMENT_HEADER)?;
            for student in &report.placed_students_list {
                let cgpa = student.cgpa.map(|cgpa| cgpa.to_string()).unwrap_or_default();
                writer.write_record([
                    student.name.as_str(),
                    student.email.as_str(),
                    optional(student.department.as_deref()),
                    cgpa.as_str(),
                ])?;
            }
        }
        Report::Applications(report) => {
            writer.write_record(APPLICATIONS_HEADER)?;
            for row in &report.applications {
                writer.write_record([
                    row.id.to_string().as_str(),
                    row.status.label(),
                    row.applied_on.to_rfc3339().as_str(),
                    row.student.name.as_str(),
                    row.student.email.as_str(),
                    optional(row.student.department.as_deref()),
                    row.job.position.as_str(),
                    row.job.company.as_str(),
                ])?;
            }
        }
        Report::Companies(report) => {
            writer.write_record(COMPANIES_HEADER)?;
            for row in &report.companies {
                writer.write_record([
                    row.id.to_string().as_str(),
                    row.name.as_str(),
                    optional(row.industry.as_deref()),
                    row.total_jobs.to_string().as_str(),
                    row.active_jobs.to_string().as_str(),
                ])?;
            }
        }
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ExportError::Flush(err.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::{CompaniesReport, CompanyRow, PlacedStudent, PlacementReport};
    use crate::domain::CompanyId;
    use crate::test_support::now;

    #[test]
    fn placement_csv_has_header_and_rows() {
        let report = Report::Placement(PlacementReport {
            department: None,
            total_students: 1,
            placed_students: 1,
            placement_rate: 100.0,
            placed_students_list: vec![PlacedStudent {
                name: "Asha Rao".to_string(),
                email: "asha@campus.test".to_string(),
                department: Some("CS".to_string()),
                cgpa: Some(8.5),
            }],
            generated_at: now(),
        });
        let csv = render_csv(&report).expect("csv");
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("name,email,department,cgpa"));
        assert_eq!(lines.next(), Some("Asha Rao,asha@campus.test,CS,8.5"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        let report = Report::Companies(CompaniesReport {
            total_companies: 1,
            companies: vec![CompanyRow {
                id: CompanyId::from_u128(7),
                name: "Acme, Inc".to_string(),
                industry: None,
                total_jobs: 3,
                active_jobs: 2,
            }],
            generated_at: now(),
        });
        let csv = render_csv(&report).expect("csv");
        assert!(csv.starts_with("company_id,name,industry,total_jobs,active_jobs\n"));
        assert!(csv.contains(",\"Acme, Inc\",,3,2"));
    }
}
