//! Session controller: the state machine paired with its collaborators.
//!
//! [`SessionController`] owns one attempt end to end: it fetches the paper
//! through the [`QuestionProvider`], delegates every synchronous event to
//! the [`ExamSession`] reducer, and runs submission against the
//! [`SubmissionSink`] — the only operation that awaits. Timeout-forced
//! submission (`tick()` hitting zero in the final section) and end-of-exam
//! submission (`advance()` past the last question) both route through
//! [`SessionController::submit`], so the failure semantics are identical
//! everywhere: answers intact, manual retry possible.

use std::sync::Arc;

use crate::error::SessionError;
use crate::model::{AnswerValue, QuestionId};
use crate::payload::SubmissionReceipt;
use crate::session::{AdvanceOutcome, ExamSession, SessionView, TickOutcome};
use crate::traits::{QuestionProvider, SubmissionSink};

/// Orchestrates one exam attempt.
pub struct SessionController {
    sink: Arc<dyn SubmissionSink>,
    session: ExamSession,
    last_receipt: Option<SubmissionReceipt>,
}

impl SessionController {
    /// Fetch the paper and start a session over it.
    ///
    /// Any fetch failure — transport, portal error, empty or malformed
    /// paper — collapses into `ProviderUnavailable`; the caller may retry
    /// by calling `start` again. No automatic retry, no backoff.
    pub async fn start(
        provider: Arc<dyn QuestionProvider>,
        sink: Arc<dyn SubmissionSink>,
    ) -> Result<Self, SessionError> {
        let paper = provider.fetch_paper().await.map_err(|e| {
            tracing::warn!(provider = provider.name(), error = %format!("{e:#}"), "paper fetch failed");
            SessionError::ProviderUnavailable {
                reason: format!("{e:#}"),
            }
        })?;
        let session = ExamSession::new(paper);
        tracing::info!(
            attempt_id = %session.attempt_id(),
            paper = session.paper().title(),
            "exam session started"
        );
        Ok(Self {
            sink,
            session,
            last_receipt: None,
        })
    }

    /// Build a controller over an already-constructed session. Used by
    /// tests and rehearsals that source the paper locally.
    pub fn with_session(session: ExamSession, sink: Arc<dyn SubmissionSink>) -> Self {
        Self {
            sink,
            session,
            last_receipt: None,
        }
    }

    pub fn session(&self) -> &ExamSession {
        &self.session
    }

    pub fn view(&self) -> SessionView {
        self.session.view()
    }

    /// Acknowledgement of the most recent successful submission, if any.
    pub fn last_receipt(&self) -> Option<&SubmissionReceipt> {
        self.last_receipt.as_ref()
    }

    pub fn record_answer(
        &mut self,
        question_id: QuestionId,
        value: AnswerValue,
    ) -> Result<(), SessionError> {
        self.session.record_answer(question_id, value)
    }

    pub fn answer(&self, question_id: QuestionId) -> Result<Option<&AnswerValue>, SessionError> {
        self.session.answer(question_id)
    }

    pub fn jump_to(&mut self, number: u32) -> Result<(), SessionError> {
        self.session.jump_to(number)
    }

    /// Advance the cursor; past the last question of the last section this
    /// triggers submission.
    pub async fn advance(&mut self) -> Result<AdvanceOutcome, SessionError> {
        match self.session.advance()? {
            AdvanceOutcome::ExamComplete => {
                self.submit().await?;
                Ok(AdvanceOutcome::ExamComplete)
            }
            outcome => Ok(outcome),
        }
    }

    /// Apply one second of elapsed time; expiry of the final section
    /// triggers submission with whatever answers exist.
    ///
    /// A sink failure during the forced submission surfaces as
    /// `SubmissionFailed` while the session stays `Expired`, so the
    /// presentation layer can offer its manual "try again" affordance.
    pub async fn tick(&mut self) -> Result<TickOutcome, SessionError> {
        match self.session.tick() {
            TickOutcome::ExamExpired => {
                self.submit().await?;
                Ok(TickOutcome::ExamExpired)
            }
            outcome => Ok(outcome),
        }
    }

    /// Run one submission round-trip against the sink.
    pub async fn submit(&mut self) -> Result<SubmissionReceipt, SessionError> {
        let payload = self.session.begin_submission()?;
        tracing::debug!(
            attempt_id = %self.session.attempt_id(),
            answers = payload.answer_count(),
            sink = self.sink.name(),
            "submitting exam"
        );
        match self.sink.submit(&payload).await {
            Ok(receipt) => {
                self.session.submission_succeeded();
                tracing::info!(attempt_id = %self.session.attempt_id(), "submission accepted");
                self.last_receipt = Some(receipt.clone());
                Ok(receipt)
            }
            Err(e) => {
                self.session.submission_failed();
                tracing::warn!(
                    attempt_id = %self.session.attempt_id(),
                    status = %self.session.status(),
                    error = %format!("{e:#}"),
                    "submission rejected, answers preserved"
                );
                Err(SessionError::SubmissionFailed {
                    message: format!("{e:#}"),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_fixtures::small_paper;
    use crate::model::{ExamPaper, OptionId};
    use crate::payload::SubmissionPayload;
    use crate::session::SessionStatus;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    struct TestProvider {
        fail: bool,
    }

    #[async_trait]
    impl QuestionProvider for TestProvider {
        fn name(&self) -> &str {
            "test"
        }

        async fn fetch_paper(&self) -> anyhow::Result<ExamPaper> {
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(small_paper())
        }
    }

    struct TestSink {
        fail_next: AtomicBool,
        payloads: Mutex<Vec<SubmissionPayload>>,
    }

    impl TestSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                fail_next: AtomicBool::new(false),
                payloads: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl SubmissionSink for TestSink {
        fn name(&self) -> &str {
            "test"
        }

        async fn submit(&self, payload: &SubmissionPayload) -> anyhow::Result<SubmissionReceipt> {
            self.payloads.lock().unwrap().push(payload.clone());
            if self.fail_next.swap(false, Ordering::SeqCst) {
                anyhow::bail!("portal returned 502");
            }
            Ok(SubmissionReceipt {
                message: "Exam submitted successfully".to_string(),
            })
        }
    }

    async fn controller(sink: Arc<TestSink>) -> SessionController {
        SessionController::start(Arc::new(TestProvider { fail: false }), sink)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn start_fails_with_provider_unavailable() {
        let err = SessionController::start(
            Arc::new(TestProvider { fail: true }),
            TestSink::new(),
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, SessionError::ProviderUnavailable { .. }));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn advance_past_exam_end_submits() {
        let sink = TestSink::new();
        let mut c = controller(Arc::clone(&sink)).await;
        c.record_answer(QuestionId(1), AnswerValue::Choice(OptionId(7)))
            .unwrap();
        c.advance().await.unwrap();
        c.advance().await.unwrap();
        c.record_answer(QuestionId(3), AnswerValue::Essay("essay".into()))
            .unwrap();
        assert_eq!(c.advance().await.unwrap(), AdvanceOutcome::ExamComplete);
        assert_eq!(c.session().status(), SessionStatus::Submitted);
        assert!(c.last_receipt().is_some());

        let payloads = sink.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].answer_count(), 2);
    }

    #[tokio::test]
    async fn final_timeout_submits_partial_answers() {
        // 30 ticks in the final section auto-submit whatever exists.
        let sink = TestSink::new();
        let mut c = controller(Arc::clone(&sink)).await;
        c.advance().await.unwrap();
        c.advance().await.unwrap();
        for _ in 0..29 {
            c.tick().await.unwrap();
        }
        assert_eq!(c.tick().await.unwrap(), TickOutcome::ExamExpired);
        assert_eq!(c.session().status(), SessionStatus::Submitted);

        let payloads = sink.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 1);
        assert!(payloads[0].is_empty());
    }

    #[tokio::test]
    async fn failed_forced_submission_stays_expired_and_retries_identically() {
        let sink = TestSink::new();
        sink.fail_next.store(true, Ordering::SeqCst);
        let mut c = controller(Arc::clone(&sink)).await;
        c.record_answer(QuestionId(1), AnswerValue::Choice(OptionId(7)))
            .unwrap();
        c.advance().await.unwrap();
        c.advance().await.unwrap();
        for _ in 0..29 {
            c.tick().await.unwrap();
        }
        let err = c.tick().await.err().unwrap();
        assert!(matches!(err, SessionError::SubmissionFailed { .. }));
        assert_eq!(c.session().status(), SessionStatus::Expired);

        // Manual retry sends an identical payload and succeeds.
        c.submit().await.unwrap();
        assert_eq!(c.session().status(), SessionStatus::Submitted);
        let payloads = sink.payloads.lock().unwrap();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0], payloads[1]);
    }

    #[tokio::test]
    async fn failed_user_submission_reverts_to_in_progress() {
        let sink = TestSink::new();
        sink.fail_next.store(true, Ordering::SeqCst);
        let mut c = controller(Arc::clone(&sink)).await;
        c.record_answer(QuestionId(1), AnswerValue::Choice(OptionId(5)))
            .unwrap();

        let err = c.submit().await.err().unwrap();
        assert!(matches!(err, SessionError::SubmissionFailed { .. }));
        assert_eq!(c.session().status(), SessionStatus::InProgress);
        assert_eq!(
            c.answer(QuestionId(1)).unwrap(),
            Some(&AnswerValue::Choice(OptionId(5)))
        );
    }
}
