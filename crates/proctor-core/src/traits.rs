//! Collaborator trait definitions.
//!
//! The session core consumes questions from a [`QuestionProvider`] and
//! delivers the final payload to a [`SubmissionSink`]. Both are external
//! collaborators reached over a fixed contract; the `proctor-providers`
//! crate supplies HTTP, file, and in-memory implementations.

use async_trait::async_trait;

use crate::model::ExamPaper;
use crate::payload::{SubmissionPayload, SubmissionReceipt};

/// Source of the ordered, sectioned question set for an attempt.
///
/// The request is implicit ("the current applicant's exam for their
/// track"); a failure or unusable paper surfaces to the session as
/// `ProviderUnavailable`, and retrying is the caller's manual decision.
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    /// Human-readable provider name (e.g. "portal").
    fn name(&self) -> &str;

    /// Fetch and validate the paper for this attempt.
    async fn fetch_paper(&self) -> anyhow::Result<ExamPaper>;
}

/// Endpoint that accepts the consolidated answer payload for grading.
///
/// The core performs no retries on failure beyond what the presentation
/// layer manually triggers; recorded answers survive any number of failed
/// deliveries.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    /// Human-readable sink name (e.g. "portal").
    fn name(&self) -> &str;

    /// Deliver the payload; returns the portal's acknowledgement.
    async fn submit(&self, payload: &SubmissionPayload) -> anyhow::Result<SubmissionReceipt>;
}
