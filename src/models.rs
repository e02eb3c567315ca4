use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

/// One grade row joined with its student and module, as fetched from storage.
#[derive(Debug, Clone)]
pub struct GradeRecord {
    pub student_id: Uuid,
    pub index_number: String,
    pub student_name: String,
    pub batch: String,
    pub module_code: String,
    pub module_title: String,
    pub credits: f64,
    pub letter_grade: String,
    pub recorded_at: NaiveDate,
}

/// Minimal aggregator input: the aggregator never depends on a storage row type.
#[derive(Debug, Clone)]
pub struct GradeSlip {
    pub module_code: String,
    pub credits: f64,
    pub letter_grade: String,
}

/// Per-student aggregation result. `cgpa` keeps full precision; rounding
/// happens only at display boundaries.
#[derive(Debug, Clone)]
pub struct CgpaSummary {
    pub cgpa: f64,
    pub total_credits: f64,
    pub module_count: usize,
    pub anomalies: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudentSummary {
    pub index_number: String,
    pub student_name: String,
    pub batch: String,
    pub cgpa: f64,
    pub total_credits: f64,
    pub module_count: usize,
    pub anomalies: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct GradeBucket {
    pub letter: String,
    pub count: usize,
}
