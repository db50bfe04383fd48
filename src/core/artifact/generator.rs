//! Snapshot serialization and artifact assembly

use super::document::{ComplianceDocument, MEDIA_TYPE, SCHEMA_VERSION};
use super::fingerprint;
use crate::core::aggregate::AggregatedSnapshot;
use crate::core::clock::{Clock, SystemClock};
use crate::domain::errors::JobError;
use crate::domain::profile::ComplianceProfile;
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;

/// A generated compliance file
///
/// Cloning is cheap; the payload is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    payload: Arc<[u8]>,
    media_type: &'static str,
    filename: String,
    fingerprint: String,
    record_count: usize,
    generated_at: DateTime<Utc>,
}

impl ExportArtifact {
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn media_type(&self) -> &str {
        self.media_type
    }

    /// Suggested file name, `<institution code>_compliance_<YYYY-MM-DD>.json`
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Hex SHA-256 of the payload
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Number of records across all exported collections
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Whether `bytes` is exactly the payload that was generated
    pub fn verify(&self, bytes: &[u8]) -> bool {
        fingerprint::matches(bytes, &self.fingerprint)
    }
}

/// Serializes snapshots into the compliance format
///
/// Output depends only on the snapshot, the profile and the clock, so two
/// calls with the same inputs produce identical bytes.
#[derive(Clone)]
pub struct ArtifactGenerator {
    clock: Arc<dyn Clock>,
}

impl ArtifactGenerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Build the artifact for a snapshot
    ///
    /// # Errors
    ///
    /// Returns [`JobError::Serialization`] with the offending field path when a
    /// value cannot be represented, e.g. a non-finite score.
    pub fn generate(
        &self,
        snapshot: &AggregatedSnapshot,
        profile: &ComplianceProfile,
    ) -> Result<ExportArtifact, JobError> {
        check_representable(snapshot)?;

        let now = self.clock.now();
        let document = ComplianceDocument {
            schema_version: SCHEMA_VERSION,
            export_date: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            school_info: profile,
            academic_year: &snapshot.period.academic_year,
            period: &snapshot.period.term,
            students: &snapshot.students,
            staff: &snapshot.staff,
            classes: &snapshot.classes,
            subjects: &snapshot.subjects,
            attendance_summary: &snapshot.attendance_summary,
            assessment_summary: &snapshot.assessment_summary,
        };

        let payload = serde_json::to_vec_pretty(&document).map_err(|e| JobError::Serialization {
            path: "$".to_string(),
            message: e.to_string(),
        })?;
        let fingerprint = fingerprint::fingerprint(&payload);

        Ok(ExportArtifact {
            payload: payload.into(),
            media_type: MEDIA_TYPE,
            filename: artifact_filename(&profile.institution_code, now),
            fingerprint,
            record_count: snapshot.record_count(),
            generated_at: now,
        })
    }
}

impl Default for ArtifactGenerator {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

fn check_representable(snapshot: &AggregatedSnapshot) -> Result<(), JobError> {
    for (i, record) in snapshot.assessment_summary.iter().enumerate() {
        let problem = if !record.score.is_finite() {
            Some(("score", format!("{} is not a finite number", record.score)))
        } else if !record.max_score.is_finite() || record.max_score <= 0.0 {
            Some((
                "maxScore",
                format!("{} is not a positive finite number", record.max_score),
            ))
        } else if record.letter_grade.is_none() {
            Some(("letterGrade", "no grade could be derived".to_string()))
        } else {
            None
        };

        if let Some((field, message)) = problem {
            return Err(JobError::Serialization {
                path: format!("assessmentSummary[{i}].{field}"),
                message,
            });
        }
    }
    Ok(())
}

fn artifact_filename(institution_code: &str, date: DateTime<Utc>) -> String {
    let code: String = institution_code
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();
    format!("{code}_compliance_{}.json", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::{aggregate, GradingScale};
    use crate::core::clock::FixedClock;
    use crate::core::fetch::SourceRecordSet;
    use crate::domain::period::ExportPeriod;
    use crate::domain::profile::{ComplianceProfileBuilder, SchoolCategory};
    use crate::domain::records::{AssessmentRecord, StudentRecord};
    use chrono::TimeZone;
    use serde_json::Value;

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(
            Utc.with_ymd_and_hms(2024, 4, 2, 9, 30, 15).unwrap(),
        ))
    }

    fn profile() -> ComplianceProfile {
        ComplianceProfileBuilder::new(SchoolCategory::Primary)
            .institution_code("INST 42")
            .institution_name("Riverside Primary")
            .district("Coastal")
            .region("South")
            .contact_person("E. Agyeman")
            .build()
    }

    fn snapshot(score: f64, max_score: f64) -> AggregatedSnapshot {
        let set = SourceRecordSet {
            period: ExportPeriod::new("2023/2024", "T2").unwrap(),
            students: vec![StudentRecord {
                id: "S1".to_string(),
                first_name: "Ama".to_string(),
                last_name: "Owusu".to_string(),
                date_of_birth: None,
                gender: None,
                class_id: Some("C1".to_string()),
                enrollment_date: None,
            }],
            staff: Vec::new(),
            classes: Vec::new(),
            subjects: Vec::new(),
            attendance: Vec::new(),
            assessments: vec![AssessmentRecord {
                student_id: "S1".to_string(),
                subject_id: "ENG".to_string(),
                assessment_type: "exam".to_string(),
                score,
                max_score,
                letter_grade: None,
                term: "T2".to_string(),
                academic_year: "2023/2024".to_string(),
            }],
            fetched_at: Utc.with_ymd_and_hms(2024, 4, 2, 9, 0, 0).unwrap(),
        };
        aggregate(&set, &GradingScale::default())
    }

    #[test]
    fn test_document_fields() {
        let artifact = ArtifactGenerator::new(clock())
            .generate(&snapshot(45.0, 60.0), &profile())
            .unwrap();

        let json: Value = serde_json::from_slice(artifact.payload()).unwrap();
        assert_eq!(json["schemaVersion"], "1.0");
        assert_eq!(json["exportDate"], "2024-04-02T09:30:15Z");
        assert_eq!(json["schoolInfo"]["institutionCode"], "INST 42");
        assert_eq!(json["academicYear"], "2023/2024");
        assert_eq!(json["period"], "T2");
        assert_eq!(json["students"][0]["studentId"], "S1");
        assert_eq!(json["assessmentSummary"][0]["letterGrade"], "B");
        assert!(json["attendanceSummary"].as_array().unwrap().is_empty());

        assert_eq!(artifact.media_type(), "application/json");
        assert_eq!(artifact.filename(), "INST-42_compliance_2024-04-02.json");
        assert_eq!(artifact.record_count(), 2);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let generator = ArtifactGenerator::new(clock());
        let snapshot = snapshot(45.0, 60.0);
        let first = generator.generate(&snapshot, &profile()).unwrap();
        let second = generator.generate(&snapshot, &profile()).unwrap();
        assert_eq!(first.payload(), second.payload());
        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn test_verify_detects_tampering() {
        let artifact = ArtifactGenerator::new(clock())
            .generate(&snapshot(45.0, 60.0), &profile())
            .unwrap();
        assert!(artifact.verify(artifact.payload()));

        let mut tampered = artifact.payload().to_vec();
        tampered.push(b' ');
        assert!(!artifact.verify(&tampered));
    }

    #[test]
    fn test_non_finite_score_rejected_with_path() {
        let err = ArtifactGenerator::new(clock())
            .generate(&snapshot(f64::NAN, 100.0), &profile())
            .unwrap_err();
        match err {
            JobError::Serialization { path, .. } => {
                assert_eq!(path, "assessmentSummary[0].score")
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_zero_max_score_rejected_with_path() {
        let err = ArtifactGenerator::new(clock())
            .generate(&snapshot(5.0, 0.0), &profile())
            .unwrap_err();
        assert!(matches!(
            err,
            JobError::Serialization { ref path, .. } if path == "assessmentSummary[0].maxScore"
        ));
    }
}
