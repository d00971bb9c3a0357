//! Attempt report with JSON persistence.
//!
//! A snapshot of one attempt's outcome — what was answered, how each
//! section fared, and the payload that was (or would be) delivered to the
//! sink. Written by the rehearse command and by callers that want a
//! durable record of a finished attempt.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::QuestionKind;
use crate::payload::SubmissionPayload;
use crate::session::{ExamSession, SessionStatus};

/// A complete attempt report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptReport {
    /// Attempt identifier.
    pub attempt_id: Uuid,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// When the report was produced.
    pub finished_at: DateTime<Utc>,
    /// Session status at report time.
    pub status: SessionStatus,
    /// Per-section breakdown.
    pub sections: Vec<SectionSummary>,
    /// Answered question count across the paper.
    pub answered: usize,
    /// Unanswered question count across the paper.
    pub unanswered: usize,
    /// The submission payload built from the recorded answers.
    pub payload: SubmissionPayload,
}

/// Per-section progress summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionSummary {
    pub title: String,
    pub kind: QuestionKind,
    pub questions: usize,
    pub answered: usize,
    pub time_budget_secs: u64,
}

impl AttemptReport {
    /// Snapshot a session into a report.
    pub fn from_session(session: &ExamSession) -> Self {
        let paper = session.paper();
        let sections: Vec<SectionSummary> = paper
            .sections()
            .iter()
            .map(|s| SectionSummary {
                title: s.title.clone(),
                kind: s.kind,
                questions: s.questions.len(),
                answered: s
                    .questions
                    .iter()
                    .filter(|q| session.answers().contains_key(&q.id))
                    .count(),
                time_budget_secs: s.time_budget_secs,
            })
            .collect();
        let answered = session.answers().len();

        Self {
            attempt_id: session.attempt_id(),
            started_at: session.started_at(),
            finished_at: Utc::now(),
            status: session.status(),
            sections,
            answered,
            unanswered: paper.question_count() - answered,
            payload: SubmissionPayload::build(paper, session.answers()),
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: AttemptReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_fixtures::small_paper;
    use crate::model::{AnswerValue, OptionId, QuestionId};

    #[test]
    fn report_counts_and_roundtrip() {
        let mut session = ExamSession::new(small_paper());
        session
            .record_answer(QuestionId(1), AnswerValue::Choice(OptionId(7)))
            .unwrap();

        let report = AttemptReport::from_session(&session);
        assert_eq!(report.answered, 1);
        assert_eq!(report.unanswered, 2);
        assert_eq!(report.sections.len(), 2);
        assert_eq!(report.sections[0].answered, 1);
        assert_eq!(report.sections[1].answered, 0);
        assert_eq!(report.status, SessionStatus::InProgress);
        assert_eq!(report.payload.answer_count(), 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/attempt.json");
        report.save_json(&path).unwrap();
        let loaded = AttemptReport::load_json(&path).unwrap();
        assert_eq!(loaded.attempt_id, report.attempt_id);
        assert_eq!(loaded.payload, report.payload);
    }
}
