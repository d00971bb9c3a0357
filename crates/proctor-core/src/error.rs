//! Session error taxonomy.
//!
//! Every operation on the session surfaces failures synchronously to the
//! caller (the presentation layer) as a [`SessionError`]; the core never
//! logs to a central sink of its own. The addressing variants
//! (`SectionClosed`, `SectionNotOpen`, `InvalidNavigation`, `KindMismatch`,
//! `UnknownQuestion`) report presentation-layer contract violations rather
//! than silently ignoring them, so integration bugs show up in development.

use thiserror::Error;

use crate::model::{InvalidPaper, QuestionId};

/// Errors that can occur while running an exam session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The question fetch failed or returned an unusable paper.
    /// Recoverable by starting the session again; retries are manual.
    #[error("assessment unavailable: {reason}")]
    ProviderUnavailable { reason: String },

    /// The question belongs to a section that has already been exited.
    #[error("question {question_id} belongs to a section that is already closed")]
    SectionClosed { question_id: QuestionId },

    /// The question belongs to a section that has not been entered yet.
    #[error("question {question_id} belongs to a section that is not open yet")]
    SectionNotOpen { question_id: QuestionId },

    /// The question id does not exist in the paper at all.
    #[error("unknown question id {question_id}")]
    UnknownQuestion { question_id: QuestionId },

    /// A jump target outside the current section.
    #[error("question {number} is outside the current section")]
    InvalidNavigation { number: u32 },

    /// A mutation was attempted while a submission is in flight (or after
    /// the session reached a state that no longer accepts input).
    #[error("session does not accept input while a submission is pending or finished")]
    SessionBusy,

    /// The answer value shape does not match the question's kind.
    #[error("answer kind does not match question {question_id}")]
    KindMismatch { question_id: QuestionId },

    /// The submission sink rejected the payload. Recorded answers are
    /// preserved; a manual resubmission sends an identical payload.
    #[error("submission failed: {message}")]
    SubmissionFailed { message: String },

    /// The paper failed structural validation.
    #[error(transparent)]
    InvalidPaper(#[from] InvalidPaper),
}

impl SessionError {
    /// Returns `true` if the failure can be recovered by a manual retry
    /// (re-fetching the paper or re-submitting), as opposed to a caller
    /// contract violation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SessionError::ProviderUnavailable { .. } | SessionError::SubmissionFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_classification() {
        assert!(SessionError::ProviderUnavailable {
            reason: "down".into()
        }
        .is_recoverable());
        assert!(SessionError::SubmissionFailed {
            message: "500".into()
        }
        .is_recoverable());
        assert!(!SessionError::SessionBusy.is_recoverable());
        assert!(!SessionError::SectionClosed {
            question_id: QuestionId(1)
        }
        .is_recoverable());
    }
}
