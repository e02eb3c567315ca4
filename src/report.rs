use std::fmt::Write;

use chrono::NaiveDate;

use crate::gpa::{self, GradePointTable};
use crate::models::{GradeBucket, GradeRecord};

/// Count grade letters across every record considered. Records dropped for
/// a non-positive credit weight are left out, so bucket counts sum to the
/// number of records the aggregation actually saw.
pub fn grade_histogram(records: &[GradeRecord]) -> Vec<GradeBucket> {
    let mut map: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    for record in records {
        if record.credits <= 0.0 {
            continue;
        }
        *map.entry(record.letter_grade.clone()).or_insert(0) += 1;
    }

    let mut buckets: Vec<GradeBucket> = map
        .into_iter()
        .map(|(letter, count)| GradeBucket { letter, count })
        .collect();

    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.letter.cmp(&b.letter)));
    buckets
}

pub fn build_report(
    scope: Option<&str>,
    top: usize,
    generated_on: NaiveDate,
    table: &GradePointTable,
    records: &[GradeRecord],
) -> String {
    let summaries = gpa::summarize_students(table, records);
    let buckets = grade_histogram(records);
    let mean = gpa::mean_cgpa(&summaries);

    let mut output = String::new();
    let scope_label = scope.unwrap_or("all batches");

    let _ = writeln!(output, "# CGPA Report");
    let _ = writeln!(
        output,
        "Generated for {} on {}",
        scope_label, generated_on
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overview");

    if summaries.is_empty() {
        let _ = writeln!(output, "No grade records in scope.");
    } else {
        let _ = writeln!(output, "- Students: {}", summaries.len());
        let _ = writeln!(
            output,
            "- Grade records considered: {}",
            buckets.iter().map(|b| b.count).sum::<usize>()
        );
        let _ = writeln!(output, "- Mean CGPA: {:.2}", mean);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Students by CGPA");

    if summaries.is_empty() {
        let _ = writeln!(output, "No students with grades in scope.");
    } else {
        for summary in summaries.iter().take(top) {
            let _ = writeln!(
                output,
                "- {} ({}, batch {}) CGPA {:.2} over {} credits in {} modules",
                summary.student_name,
                summary.index_number,
                summary.batch,
                summary.cgpa,
                summary.total_credits,
                summary.module_count
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Grade Distribution");

    if buckets.is_empty() {
        let _ = writeln!(output, "No grade records in scope.");
    } else {
        for bucket in buckets.iter() {
            let _ = writeln!(output, "- {}: {}", bucket.letter, bucket.count);
        }
    }

    let mut recent = records.to_vec();
    recent.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Grade Entries");

    if recent.is_empty() {
        let _ = writeln!(output, "No grade records in scope.");
    } else {
        for record in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({}) {}: {} on {}",
                record.student_name,
                record.index_number,
                record.module_title,
                record.letter_grade,
                record.recorded_at
            );
        }
    }

    let anomalies: Vec<(&str, &str)> = summaries
        .iter()
        .flat_map(|summary| {
            summary
                .anomalies
                .iter()
                .map(|note| (summary.index_number.as_str(), note.as_str()))
        })
        .collect();

    if !anomalies.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Data Anomalies");
        for (index, note) in anomalies {
            let _ = writeln!(output, "- {}: {}", index, note);
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use uuid::Uuid;

    fn record(index: &str, credits: f64, letter: &str) -> GradeRecord {
        GradeRecord {
            student_id: Uuid::new_v4(),
            index_number: index.to_string(),
            student_name: format!("Student {index}"),
            batch: "2021".to_string(),
            module_code: "CS1040".to_string(),
            module_title: "Program Construction".to_string(),
            credits,
            letter_grade: letter.to_string(),
            recorded_at: NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(),
        }
    }

    #[test]
    fn histogram_counts_sum_to_records_considered() {
        let records = vec![
            record("CS-001", 3.0, "A"),
            record("CS-002", 2.0, "A"),
            record("CS-003", 3.0, "W"),
            record("CS-004", 0.0, "B"),
        ];

        let buckets = grade_histogram(&records);
        let total: usize = buckets.iter().map(|b| b.count).sum();
        assert_eq!(total, 3);

        let a_bucket = buckets.iter().find(|b| b.letter == "A").unwrap();
        assert_eq!(a_bucket.count, 2);
    }

    #[test]
    fn histogram_order_is_deterministic() {
        let records = vec![
            record("CS-001", 3.0, "B"),
            record("CS-002", 3.0, "A"),
            record("CS-003", 3.0, "A"),
            record("CS-004", 3.0, "C"),
        ];

        let buckets = grade_histogram(&records);
        let letters: Vec<&str> = buckets.iter().map(|b| b.letter.as_str()).collect();
        assert_eq!(letters, vec!["A", "B", "C"]);
    }

    #[test]
    fn report_lists_overview_and_anomalies() {
        let table = GradePointTable::standard();
        let mut records = vec![
            record("CS-001", 3.0, "A"),
            record("CS-001", -1.0, "B"),
        ];
        records[1].student_id = records[0].student_id;
        let generated_on = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();

        let report = build_report(Some("2021"), 10, generated_on, &table, &records);
        assert!(report.contains("# CGPA Report"));
        assert!(report.contains("Generated for 2021"));
        assert!(report.contains("Mean CGPA: 4.00"));
        assert!(report.contains("## Data Anomalies"));
        assert!(report.contains("non-positive credit weight"));
    }

    #[test]
    fn empty_scope_renders_placeholders() {
        let table = GradePointTable::standard();
        let generated_on = NaiveDate::from_ymd_opt(2026, 8, 29).unwrap();

        let report = build_report(None, 10, generated_on, &table, &[]);
        assert!(report.contains("Generated for all batches"));
        assert!(report.contains("No grade records in scope."));
        assert!(report.contains("No students with grades in scope."));
    }
}
