//! Assessment projection

use super::grading::GradingScale;
use crate::domain::records::AssessmentRecord;
use serde::{Deserialize, Serialize};

/// One assessment result as it appears in the export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentSummaryRecord {
    pub student_id: String,
    pub subject_id: String,
    pub assessment_type: String,
    pub score: f64,
    pub max_score: f64,
    /// `None` only when the record had no grade and none could be derived
    pub letter_grade: Option<String>,
    pub term: String,
    pub academic_year: String,
}

/// Project each record 1:1, deriving missing letter grades from the scale
///
/// A grade entered upstream is kept as-is.
pub fn summarize_assessments(
    records: &[AssessmentRecord],
    scale: &GradingScale,
) -> Vec<AssessmentSummaryRecord> {
    records
        .iter()
        .map(|record| {
            let letter_grade = match record.letter_grade.as_deref().map(str::trim) {
                Some(grade) if !grade.is_empty() => Some(grade.to_string()),
                _ => scale
                    .letter_for_score(record.score, record.max_score)
                    .map(str::to_string),
            };

            AssessmentSummaryRecord {
                student_id: record.student_id.clone(),
                subject_id: record.subject_id.clone(),
                assessment_type: record.assessment_type.clone(),
                score: record.score,
                max_score: record.max_score,
                letter_grade,
                term: record.term.clone(),
                academic_year: record.academic_year.clone(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::grading::GradeBand;

    fn record(score: f64, max_score: f64, letter: Option<&str>) -> AssessmentRecord {
        AssessmentRecord {
            student_id: "S1".to_string(),
            subject_id: "MATH".to_string(),
            assessment_type: "exam".to_string(),
            score,
            max_score,
            letter_grade: letter.map(str::to_string),
            term: "T1".to_string(),
            academic_year: "2024".to_string(),
        }
    }

    #[test]
    fn test_derives_missing_grade() {
        let summary = summarize_assessments(&[record(30.0, 50.0, None)], &GradingScale::default());
        assert_eq!(summary[0].letter_grade.as_deref(), Some("B"));
    }

    #[test]
    fn test_keeps_entered_grade() {
        let summary =
            summarize_assessments(&[record(10.0, 100.0, Some("A+"))], &GradingScale::default());
        assert_eq!(summary[0].letter_grade.as_deref(), Some("A+"));
    }

    #[test]
    fn test_blank_grade_is_derived() {
        let summary =
            summarize_assessments(&[record(90.0, 100.0, Some("  "))], &GradingScale::default());
        assert_eq!(summary[0].letter_grade.as_deref(), Some("A"));
    }

    #[test]
    fn test_no_deduplication() {
        let records = vec![record(50.0, 100.0, None), record(50.0, 100.0, None)];
        assert_eq!(
            summarize_assessments(&records, &GradingScale::default()).len(),
            2
        );
    }

    #[test]
    fn test_custom_scale() {
        let scale = GradingScale::new(vec![GradeBand::new(70.0, "Pass")], "Fail").unwrap();
        let summary = summarize_assessments(
            &[record(69.0, 100.0, None), record(70.0, 100.0, None)],
            &scale,
        );
        assert_eq!(summary[0].letter_grade.as_deref(), Some("Fail"));
        assert_eq!(summary[1].letter_grade.as_deref(), Some("Pass"));
    }

    #[test]
    fn test_zero_max_score_leaves_grade_empty() {
        let summary = summarize_assessments(&[record(5.0, 0.0, None)], &GradingScale::default());
        assert!(summary[0].letter_grade.is_none());
    }
}
