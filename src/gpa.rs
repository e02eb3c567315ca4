use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::models::{CgpaSummary, GradeRecord, GradeSlip, StudentSummary};

pub const NON_BEARING: &[&str] = &["I", "W"];

/// Static letter-to-point mapping, never mutated after startup.
#[derive(Debug, Clone)]
pub struct GradePointTable {
    points: HashMap<String, f64>,
}

impl GradePointTable {
    pub fn standard() -> Self {
        let points = [
            ("A+", 4.0),
            ("A", 4.0),
            ("A-", 3.7),
            ("B+", 3.3),
            ("B", 3.0),
            ("B-", 2.7),
            ("C+", 2.3),
            ("C", 2.0),
            ("C-", 1.7),
            ("D+", 1.3),
            ("D", 1.0),
            ("E", 0.0),
            ("F", 0.0),
        ]
        .into_iter()
        .map(|(letter, point)| (letter.to_string(), point))
        .collect();

        Self { points }
    }

    pub fn point(&self, letter: &str) -> Option<f64> {
        if NON_BEARING.contains(&letter) {
            return None;
        }
        self.points.get(letter).copied()
    }
}

// Non-positive credit weights are dropped and reported through `anomalies`
// rather than failing the whole summary. `module_count` is distinct modules,
// so a retake counts once; non-bearing letters still count as attempts.
pub fn summarize(table: &GradePointTable, slips: &[GradeSlip]) -> CgpaSummary {
    let mut weighted_points = 0.0;
    let mut total_credits = 0.0;
    let mut modules_seen: HashSet<&str> = HashSet::new();
    let mut anomalies = Vec::new();

    for slip in slips {
        if slip.credits <= 0.0 {
            anomalies.push(format!(
                "{}: non-positive credit weight {}",
                slip.module_code, slip.credits
            ));
            continue;
        }

        modules_seen.insert(slip.module_code.as_str());

        if let Some(point) = table.point(&slip.letter_grade) {
            weighted_points += slip.credits * point;
            total_credits += slip.credits;
        }
    }

    let cgpa = if total_credits > 0.0 {
        weighted_points / total_credits
    } else {
        0.0
    };

    CgpaSummary {
        cgpa,
        total_credits,
        module_count: modules_seen.len(),
        anomalies,
    }
}

/// Group grade rows by student and summarize each one, ranked best first.
pub fn summarize_students(
    table: &GradePointTable,
    records: &[GradeRecord],
) -> Vec<StudentSummary> {
    struct Bucket {
        index_number: String,
        student_name: String,
        batch: String,
        slips: Vec<GradeSlip>,
    }

    let mut buckets: HashMap<Uuid, Bucket> = HashMap::new();

    for record in records.iter() {
        let bucket = buckets.entry(record.student_id).or_insert_with(|| Bucket {
            index_number: record.index_number.clone(),
            student_name: record.student_name.clone(),
            batch: record.batch.clone(),
            slips: Vec::new(),
        });

        bucket.slips.push(GradeSlip {
            module_code: record.module_code.clone(),
            credits: record.credits,
            letter_grade: record.letter_grade.clone(),
        });
    }

    let mut summaries: Vec<StudentSummary> = buckets
        .into_values()
        .map(|bucket| {
            let summary = summarize(table, &bucket.slips);
            StudentSummary {
                index_number: bucket.index_number,
                student_name: bucket.student_name,
                batch: bucket.batch,
                cgpa: summary.cgpa,
                total_credits: summary.total_credits,
                module_count: summary.module_count,
                anomalies: summary.anomalies,
            }
        })
        .collect();

    summaries.sort_by(rank_order);
    summaries
}

/// Total order for leaderboards: CGPA descending, index number ascending,
/// so ties are deterministic regardless of input order.
fn rank_order(a: &StudentSummary, b: &StudentSummary) -> Ordering {
    b.cgpa
        .partial_cmp(&a.cgpa)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.index_number.cmp(&b.index_number))
}

pub fn top_n(summaries: &[StudentSummary], n: usize) -> Vec<StudentSummary> {
    let mut ranked = summaries.to_vec();
    ranked.sort_by(rank_order);
    ranked.truncate(n);
    ranked
}

pub fn mean_cgpa(summaries: &[StudentSummary]) -> f64 {
    if summaries.is_empty() {
        return 0.0;
    }
    summaries.iter().map(|s| s.cgpa).sum::<f64>() / summaries.len() as f64
}

/// Round to two decimals for display; internal math keeps full precision.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
