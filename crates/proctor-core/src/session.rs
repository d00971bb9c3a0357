//! The exam session state machine.
//!
//! [`ExamSession`] is a synchronous, single-writer reducer over discrete
//! external events: answer recording, navigation, one-second ticks, and
//! submission lifecycle transitions. It owns no timer thread and never
//! reads the wall clock; driving `tick()` at roughly 1 Hz is the caller's
//! job (see `proctor-runner`). That keeps the machine fully testable
//! without real delays.
//!
//! Navigation rules encode the product's assessment-integrity contract:
//! free movement within the current section via the question grid, strictly
//! one-way movement across sections. A section, once exited, is closed for
//! good — reads and writes against it are rejected, not ignored.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SessionError;
use crate::model::{AnswerValue, ExamPaper, Question, QuestionId};
use crate::payload::SubmissionPayload;

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Accepting answers and navigation; the current section's clock runs.
    InProgress,
    /// A submission is in flight; all mutation is rejected.
    Submitting,
    /// The sink acknowledged the submission. Terminal.
    Submitted,
    /// Time ran out in the final section and no submission has succeeded
    /// yet. Non-terminal only in that a manual resubmission is permitted.
    Expired,
}

impl SessionStatus {
    /// `true` once the session can be disposed of.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Submitted)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStatus::InProgress => write!(f, "in-progress"),
            SessionStatus::Submitting => write!(f, "submitting"),
            SessionStatus::Submitted => write!(f, "submitted"),
            SessionStatus::Expired => write!(f, "expired"),
        }
    }
}

/// What `advance()` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Moved to the next question of the current section.
    MovedWithinSection,
    /// Closed the current section and entered the next one; the cursor is
    /// on its first question and the timer was reset to its budget.
    SectionAdvanced,
    /// The last question of the last section was advanced past; the caller
    /// must now run submission.
    ExamComplete,
}

/// What a one-second tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The clock is still running.
    Running { remaining_secs: u64 },
    /// The current section's time ran out; the session force-advanced into
    /// the next section (answers kept, timer reset).
    SectionExpired,
    /// Time ran out in the final section; the session is now `Expired` and
    /// the caller must run submission with whatever answers exist.
    ExamExpired,
    /// The session is no longer in progress; the tick was ignored.
    Ignored,
}

/// Read-only snapshot handed to the presentation layer: enough state to
/// render the timer, the progress grid, and terminal redirects.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub attempt_id: Uuid,
    pub status: SessionStatus,
    pub section_index: usize,
    pub section_count: usize,
    pub section_title: String,
    /// Paper-wide 1-based number of the current question.
    pub question_number: u32,
    pub question_count: usize,
    pub remaining_secs: u64,
    /// Ids of answered questions, in paper order (progress grid highlight).
    pub answered: Vec<QuestionId>,
}

/// The complete in-memory record of one exam attempt's progress.
///
/// Created once per attempt, mutated only through its methods, and dropped
/// after a terminal submission or abandonment. Nothing is persisted across
/// reloads here; that is explicitly not a contract of this core.
#[derive(Debug)]
pub struct ExamSession {
    paper: ExamPaper,
    attempt_id: Uuid,
    started_at: DateTime<Utc>,
    section_index: usize,
    question_index: usize,
    answers: HashMap<QuestionId, AnswerValue>,
    remaining_secs: u64,
    status: SessionStatus,
    /// Status to fall back to when an in-flight submission fails.
    resume_status: SessionStatus,
}

impl ExamSession {
    /// Start a session over a validated paper: cursor at section 0,
    /// question 0, section-one timer armed.
    pub fn new(paper: ExamPaper) -> Self {
        let remaining_secs = paper.sections()[0].time_budget_secs;
        let attempt_id = Uuid::new_v4();
        tracing::debug!(%attempt_id, questions = paper.question_count(), "session created");
        Self {
            paper,
            attempt_id,
            started_at: Utc::now(),
            section_index: 0,
            question_index: 0,
            answers: HashMap::new(),
            remaining_secs,
            status: SessionStatus::InProgress,
            resume_status: SessionStatus::InProgress,
        }
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn paper(&self) -> &ExamPaper {
        &self.paper
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    /// The question under the cursor.
    pub fn current_question(&self) -> &Question {
        &self.paper.sections()[self.section_index].questions[self.question_index]
    }

    /// Answer map, keyed by question id.
    pub fn answers(&self) -> &HashMap<QuestionId, AnswerValue> {
        &self.answers
    }

    /// Resolve a question id against the one-way section rules: open
    /// questions are addressable, exited sections report `SectionClosed`,
    /// unentered sections report `SectionNotOpen`.
    fn addressable(&self, question_id: QuestionId) -> Result<&Question, SessionError> {
        match self.paper.section_of(question_id) {
            None => Err(SessionError::UnknownQuestion { question_id }),
            Some(s) if s < self.section_index => Err(SessionError::SectionClosed { question_id }),
            Some(s) if s > self.section_index => Err(SessionError::SectionNotOpen { question_id }),
            Some(_) => Ok(self
                .paper
                .question(question_id)
                .expect("section_of and question agree on membership")),
        }
    }

    /// Insert or overwrite the answer for a question (last-write-wins).
    ///
    /// No completeness or emptiness validation happens here; the only
    /// checks are the section addressing rules and that the value's shape
    /// matches the question's kind.
    pub fn record_answer(
        &mut self,
        question_id: QuestionId,
        value: AnswerValue,
    ) -> Result<(), SessionError> {
        if self.status != SessionStatus::InProgress {
            return Err(SessionError::SessionBusy);
        }
        let question = self.addressable(question_id)?;
        if question.kind != value.kind() {
            return Err(SessionError::KindMismatch { question_id });
        }
        self.answers.insert(question_id, value);
        Ok(())
    }

    /// The current answer for a question, if any. Used to pre-populate the
    /// presentation layer when the user revisits a question via the grid.
    pub fn answer(&self, question_id: QuestionId) -> Result<Option<&AnswerValue>, SessionError> {
        self.addressable(question_id)?;
        Ok(self.answers.get(&question_id))
    }

    /// Move the cursor to the next question, transitioning sections (and
    /// resetting the timer) at a section boundary. Never validates
    /// completeness; unanswered questions are simply left behind.
    pub fn advance(&mut self) -> Result<AdvanceOutcome, SessionError> {
        if self.status != SessionStatus::InProgress {
            return Err(SessionError::SessionBusy);
        }
        let section_len = self.paper.sections()[self.section_index].questions.len();
        if self.question_index + 1 < section_len {
            self.question_index += 1;
            return Ok(AdvanceOutcome::MovedWithinSection);
        }
        if self.section_index + 1 < self.paper.sections().len() {
            self.enter_next_section();
            return Ok(AdvanceOutcome::SectionAdvanced);
        }
        Ok(AdvanceOutcome::ExamComplete)
    }

    /// Jump to an arbitrary question within the current section, addressed
    /// by its paper-wide 1-based number.
    pub fn jump_to(&mut self, number: u32) -> Result<(), SessionError> {
        if self.status != SessionStatus::InProgress {
            return Err(SessionError::SessionBusy);
        }
        match self.paper.locate(number) {
            Some((section, question)) if section == self.section_index => {
                self.question_index = question;
                Ok(())
            }
            _ => Err(SessionError::InvalidNavigation { number }),
        }
    }

    /// Consume one second of the current section's budget.
    ///
    /// The machine trusts the caller to invoke this at roughly 1 Hz and
    /// performs no wall-clock reconciliation; drift is accepted. Ticks
    /// arriving after submission has started are ignored.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != SessionStatus::InProgress {
            return TickOutcome::Ignored;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs > 0 {
            return TickOutcome::Running {
                remaining_secs: self.remaining_secs,
            };
        }
        if self.section_index + 1 < self.paper.sections().len() {
            tracing::info!(
                section = self.paper.sections()[self.section_index].title,
                "section time expired, force-advancing"
            );
            self.enter_next_section();
            TickOutcome::SectionExpired
        } else {
            tracing::info!("final section time expired");
            self.status = SessionStatus::Expired;
            TickOutcome::ExamExpired
        }
    }

    fn enter_next_section(&mut self) {
        self.section_index += 1;
        self.question_index = 0;
        self.remaining_secs = self.paper.sections()[self.section_index].time_budget_secs;
    }

    /// Begin a submission: build the payload and move to `Submitting`.
    ///
    /// Allowed from `InProgress` (user-initiated or end-of-exam) and from
    /// `Expired` (timeout-forced, or a manual retry after a failed forced
    /// submission). The pre-submission status is remembered so a sink
    /// failure can restore it.
    pub fn begin_submission(&mut self) -> Result<SubmissionPayload, SessionError> {
        match self.status {
            SessionStatus::InProgress | SessionStatus::Expired => {
                self.resume_status = self.status;
                self.status = SessionStatus::Submitting;
                Ok(SubmissionPayload::build(&self.paper, &self.answers))
            }
            SessionStatus::Submitting | SessionStatus::Submitted => Err(SessionError::SessionBusy),
        }
    }

    /// The sink acknowledged the payload; the session is done.
    pub fn submission_succeeded(&mut self) {
        debug_assert_eq!(self.status, SessionStatus::Submitting);
        self.status = SessionStatus::Submitted;
    }

    /// The sink rejected the payload; answers stay intact and the status
    /// reverts to what it was when submission began (`InProgress` if time
    /// remained, `Expired` if the submission was timeout-forced).
    pub fn submission_failed(&mut self) {
        debug_assert_eq!(self.status, SessionStatus::Submitting);
        self.status = self.resume_status;
    }

    /// Snapshot for the presentation layer.
    pub fn view(&self) -> SessionView {
        let section = &self.paper.sections()[self.section_index];
        let mut answered: Vec<QuestionId> = Vec::new();
        for s in self.paper.sections() {
            for q in &s.questions {
                if self.answers.contains_key(&q.id) {
                    answered.push(q.id);
                }
            }
        }
        SessionView {
            attempt_id: self.attempt_id,
            status: self.status,
            section_index: self.section_index,
            section_count: self.paper.sections().len(),
            section_title: section.title.clone(),
            question_number: self.paper.number_of(self.section_index, self.question_index),
            question_count: self.paper.question_count(),
            remaining_secs: self.remaining_secs,
            answered,
        }
    }
}
