//! Submission payload formatting.
//!
//! The consolidated answer payload sent to the Submission Sink on
//! completion or timeout. Field names follow the portal wire contract
//! (camelCase). Entries are ordered by paper position so that retrying a
//! failed submission with unchanged answers produces a byte-identical
//! payload.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{AnswerValue, ExamPaper, OptionId, QuestionId};

/// One answered multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceAnswer {
    pub question_id: QuestionId,
    pub option_id: OptionId,
}

/// One answered essay question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EssayAnswer {
    pub question_id: QuestionId,
    pub answer: String,
}

/// The complete submission body: recorded answers partitioned by kind.
/// Questions without a recorded answer are omitted entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub multiple_choice_answers: Vec<ChoiceAnswer>,
    pub essay_answers: Vec<EssayAnswer>,
}

impl SubmissionPayload {
    /// Build a payload from the session's answer map, walking the paper in
    /// section/question order for a deterministic result.
    pub fn build(paper: &ExamPaper, answers: &HashMap<QuestionId, AnswerValue>) -> Self {
        let mut multiple_choice_answers = Vec::new();
        let mut essay_answers = Vec::new();

        for section in paper.sections() {
            for question in &section.questions {
                match answers.get(&question.id) {
                    Some(AnswerValue::Choice(option_id)) => {
                        multiple_choice_answers.push(ChoiceAnswer {
                            question_id: question.id,
                            option_id: *option_id,
                        });
                    }
                    Some(AnswerValue::Essay(text)) => {
                        essay_answers.push(EssayAnswer {
                            question_id: question.id,
                            answer: text.clone(),
                        });
                    }
                    None => {}
                }
            }
        }

        Self {
            multiple_choice_answers,
            essay_answers,
        }
    }

    /// Total number of answers in the payload.
    pub fn answer_count(&self) -> usize {
        self.multiple_choice_answers.len() + self.essay_answers.len()
    }

    /// `true` if no question was answered at all.
    pub fn is_empty(&self) -> bool {
        self.answer_count() == 0
    }
}

/// Acknowledgement returned by the Submission Sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionReceipt {
    pub message: String,
}
