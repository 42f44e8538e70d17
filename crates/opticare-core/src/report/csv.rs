//! Sectioned CSV layout for the patient report download.

use chrono::{DateTime, NaiveDate, Utc};

use super::stats::{AgeBucket, ReportStats};

/// Report title row.
pub const REPORT_TITLE: &str = "OptiCare - Patient Report";

/// Download name for a report generated on `date`.
pub fn report_file_name(date: NaiveDate) -> String {
    format!("opticare-report-{}.csv", date.format("%Y-%m-%d"))
}

/// Render the report. Every cell is quoted, rows are joined with `\n`,
/// and sections are separated by an empty row.
pub fn render_report_csv(stats: &ReportStats, generated_at: &DateTime<Utc>) -> String {
    report_rows(stats, generated_at)
        .iter()
        .map(|row| {
            row.iter()
                .map(|cell| quote(cell))
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn report_rows(stats: &ReportStats, generated_at: &DateTime<Utc>) -> Vec<Vec<String>> {
    let mut rows: Vec<Vec<String>> = vec![
        vec![REPORT_TITLE.into()],
        vec![format!(
            "Generated on: {}",
            generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        )],
        vec![],
        vec!["KEY METRICS".into()],
        row(["Metric", "Value"]),
        vec!["Total Patients".into(), stats.total_patients.to_string()],
        vec!["Average Age".into(), stats.average_age.to_string()],
        vec![
            "Patients with Refractive Error".into(),
            stats.with_refractive_error.to_string(),
        ],
        vec![
            "Patients with Astigmatism".into(),
            stats.with_astigmatism.to_string(),
        ],
        vec![
            "Patients with Presbyopia".into(),
            stats.with_addition.to_string(),
        ],
        vec![],
        vec!["GENDER DISTRIBUTION".into()],
        row(["Gender", "Count", "Percentage"]),
    ];

    for (label, count, percent) in stats.gender_rows() {
        rows.push(vec![label.into(), count.to_string(), format!("{}%", percent)]);
    }

    rows.push(vec![]);
    rows.push(vec!["AGE DISTRIBUTION".into()]);
    rows.push(row(["Age Range", "Count"]));
    for bucket in AgeBucket::ALL {
        rows.push(vec![
            bucket.label().into(),
            stats.age_distribution.count(bucket).to_string(),
        ]);
    }

    rows.push(vec![]);
    rows.push(vec!["CLINICAL CONDITIONS".into()]);
    rows.push(row(["Condition", "Count"]));
    rows.push(vec![
        "Myopia/Sphere Error".into(),
        stats.with_refractive_error.to_string(),
    ]);
    rows.push(vec![
        "Astigmatism (Cylinder)".into(),
        stats.with_astigmatism.to_string(),
    ]);
    rows.push(vec![
        "Presbyopia (Addition)".into(),
        stats.with_addition.to_string(),
    ]);

    rows
}

fn row<const N: usize>(cells: [&str; N]) -> Vec<String> {
    cells.iter().map(|c| c.to_string()).collect()
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}
