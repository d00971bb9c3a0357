//! In-memory provider and sink for testing.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use proctor_core::model::ExamPaper;
use proctor_core::payload::{SubmissionPayload, SubmissionReceipt};
use proctor_core::traits::{QuestionProvider, SubmissionSink};

/// A question provider that serves a fixed paper without any I/O.
///
/// Supports failure injection so session-start error paths can be tested.
pub struct FixedProvider {
    paper: ExamPaper,
    /// Number of fetches that should fail before one succeeds.
    fail_fetches: AtomicU32,
    call_count: AtomicU32,
}

impl FixedProvider {
    pub fn new(paper: ExamPaper) -> Self {
        Self {
            paper,
            fail_fetches: AtomicU32::new(0),
            call_count: AtomicU32::new(0),
        }
    }

    /// Make the next `n` fetches fail with a simulated outage.
    pub fn fail_next_fetches(&self, n: u32) {
        self.fail_fetches.store(n, Ordering::SeqCst);
    }

    /// Number of fetches made against this provider.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuestionProvider for FixedProvider {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn fetch_paper(&self) -> anyhow::Result<ExamPaper> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let remaining = self.fail_fetches.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_fetches.store(remaining - 1, Ordering::SeqCst);
            anyhow::bail!("simulated provider outage");
        }
        Ok(self.paper.clone())
    }
}

/// A submission sink that records every payload it receives.
///
/// Failures are scriptable: `fail_next_submissions(n)` rejects the next
/// `n` deliveries, after which submissions succeed again — handy for
/// exercising the preserve-answers-and-retry contract.
pub struct RecordingSink {
    submissions: Mutex<Vec<SubmissionPayload>>,
    fail_submissions: AtomicU32,
    call_count: AtomicU32,
    message: String,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            submissions: Mutex::new(Vec::new()),
            fail_submissions: AtomicU32::new(0),
            call_count: AtomicU32::new(0),
            message: "Exam submitted successfully".to_string(),
        }
    }

    pub fn with_message(message: &str) -> Self {
        Self {
            message: message.to_string(),
            ..Self::new()
        }
    }

    /// Make the next `n` submissions fail with a simulated portal error.
    pub fn fail_next_submissions(&self, n: u32) {
        self.fail_submissions.store(n, Ordering::SeqCst);
    }

    /// Number of submissions attempted against this sink (including
    /// failed ones).
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every payload received, in delivery order.
    pub fn submissions(&self) -> Vec<SubmissionPayload> {
        self.submissions.lock().unwrap().clone()
    }

    /// The most recent payload received, if any.
    pub fn last_submission(&self) -> Option<SubmissionPayload> {
        self.submissions.lock().unwrap().last().cloned()
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SubmissionSink for RecordingSink {
    fn name(&self) -> &str {
        "recording"
    }

    async fn submit(&self, payload: &SubmissionPayload) -> anyhow::Result<SubmissionReceipt> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.submissions.lock().unwrap().push(payload.clone());
        let remaining = self.fail_submissions.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_submissions.store(remaining - 1, Ordering::SeqCst);
            anyhow::bail!("simulated submission rejection");
        }
        Ok(SubmissionReceipt {
            message: self.message.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_core::model::{ChoiceOption, OptionId, Question, QuestionId, QuestionKind, Section};

    fn paper() -> ExamPaper {
        ExamPaper::new(
            "Mock Paper".to_string(),
            vec![
                Section {
                    kind: QuestionKind::MultipleChoice,
                    title: "One".to_string(),
                    time_budget_secs: 60,
                    questions: vec![Question {
                        id: QuestionId(1),
                        description: "Q1".to_string(),
                        image_url: None,
                        kind: QuestionKind::MultipleChoice,
                        options: vec![ChoiceOption {
                            id: OptionId(1),
                            text: Some("A".to_string()),
                            image_url: None,
                        }],
                    }],
                },
                Section {
                    kind: QuestionKind::Essay,
                    title: "Two".to_string(),
                    time_budget_secs: 60,
                    questions: vec![Question {
                        id: QuestionId(2),
                        description: "Q2".to_string(),
                        image_url: None,
                        kind: QuestionKind::Essay,
                        options: vec![],
                    }],
                },
            ],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn fixed_provider_counts_and_fails_on_demand() {
        let provider = FixedProvider::new(paper());
        provider.fail_next_fetches(1);

        assert!(provider.fetch_paper().await.is_err());
        let fetched = provider.fetch_paper().await.unwrap();
        assert_eq!(fetched.question_count(), 2);
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn recording_sink_records_and_recovers() {
        let sink = RecordingSink::new();
        sink.fail_next_submissions(1);
        let payload = SubmissionPayload {
            multiple_choice_answers: vec![],
            essay_answers: vec![],
        };

        assert!(sink.submit(&payload).await.is_err());
        let receipt = sink.submit(&payload).await.unwrap();
        assert_eq!(receipt.message, "Exam submitted successfully");
        assert_eq!(sink.call_count(), 2);
        assert_eq!(sink.submissions().len(), 2);
        assert_eq!(sink.last_submission().unwrap(), payload);
    }
}
