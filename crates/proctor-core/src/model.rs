//! Core data model types for proctor.
//!
//! These are the fundamental types the entire proctor system uses to
//! represent question papers, sections, questions, and answers. A paper is
//! immutable for the lifetime of a session; correctness information never
//! appears client-side (grading is the portal's job).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default time budget for a multiple-choice section when the provider
/// does not specify one.
pub const DEFAULT_CHOICE_BUDGET_SECS: u64 = 20 * 60;

/// Default time budget for an essay section when the provider does not
/// specify one.
pub const DEFAULT_ESSAY_BUDGET_SECS: u64 = 30 * 60;

/// Stable integer identifier of a question, assigned by the portal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct QuestionId(pub i64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Stable integer identifier of a multiple-choice option.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OptionId(pub i64);

impl fmt::Display for OptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two kinds of questions a paper can contain. Sections are
/// homogeneous: every question in a section shares the section's kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    MultipleChoice,
    Essay,
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuestionKind::MultipleChoice => write!(f, "multiple-choice"),
            QuestionKind::Essay => write!(f, "essay"),
        }
    }
}

impl FromStr for QuestionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "multiple-choice" | "multiple_choice" | "multiplechoice" | "choice" => {
                Ok(QuestionKind::MultipleChoice)
            }
            "essay" | "free-text" | "free_text" => Ok(QuestionKind::Essay),
            other => Err(format!("unknown question kind: {other}")),
        }
    }
}

/// One selectable option of a multiple-choice question. A valid option
/// carries text, an image, or both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceOption {
    /// Option identifier, unique within its question.
    pub id: OptionId,
    /// Option text, possibly containing markup rendered verbatim.
    #[serde(default)]
    pub text: Option<String>,
    /// Optional option illustration.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// A single question as supplied by the Question Provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    /// Unique identifier, stable for the whole session.
    pub id: QuestionId,
    /// Question prompt; may contain markup rendered verbatim by the
    /// presentation layer.
    pub description: String,
    /// Optional illustration.
    #[serde(default)]
    pub image_url: Option<String>,
    /// Question kind, inherited from the owning section.
    pub kind: QuestionKind,
    /// Ordered options; non-empty iff the question is multiple-choice.
    #[serde(default)]
    pub options: Vec<ChoiceOption>,
}

/// A named, ordered group of questions with a fixed time budget.
///
/// Sections are traversed in fixed order; once exited (by completion or
/// timeout) a section cannot be re-entered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Kind shared by every question in the section.
    pub kind: QuestionKind,
    /// Human-readable section title.
    pub title: String,
    /// Countdown budget for the section, in seconds.
    pub time_budget_secs: u64,
    /// Ordered questions.
    pub questions: Vec<Question>,
}

/// The applicant-supplied response to one question. Exactly one shape per
/// question kind; a new value for the same question overwrites the prior
/// one (last-write-wins, no history).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnswerValue {
    /// Selected option of a multiple-choice question.
    Choice(OptionId),
    /// Free text of an essay question. Stored verbatim; emptiness checks
    /// are a presentation-layer affordance, not a controller invariant.
    Essay(String),
}

impl AnswerValue {
    /// The question kind this value is shaped for.
    pub fn kind(&self) -> QuestionKind {
        match self {
            AnswerValue::Choice(_) => QuestionKind::MultipleChoice,
            AnswerValue::Essay(_) => QuestionKind::Essay,
        }
    }
}

/// A reason a candidate paper failed validation.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid paper: {0}")]
pub struct InvalidPaper(pub String);

/// A validated two-section question paper.
///
/// Construction via [`ExamPaper::new`] is the only way to obtain one, so a
/// session never has to re-check structural invariants: exactly two
/// sections in server order (multiple-choice first, essay second), every
/// section non-empty, question ids unique paper-wide, options present
/// exactly on multiple-choice questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "PaperParts", into = "PaperParts")]
pub struct ExamPaper {
    title: String,
    sections: Vec<Section>,
}

/// Serde-facing representation of a paper; re-validated on deserialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PaperParts {
    title: String,
    sections: Vec<Section>,
}

impl TryFrom<PaperParts> for ExamPaper {
    type Error = InvalidPaper;

    fn try_from(parts: PaperParts) -> Result<Self, Self::Error> {
        ExamPaper::new(parts.title, parts.sections)
    }
}

impl From<ExamPaper> for PaperParts {
    fn from(paper: ExamPaper) -> Self {
        PaperParts {
            title: paper.title,
            sections: paper.sections,
        }
    }
}

impl ExamPaper {
    /// Validate and construct a paper from server-ordered sections.
    pub fn new(title: String, sections: Vec<Section>) -> Result<Self, InvalidPaper> {
        if sections.len() != 2 {
            return Err(InvalidPaper(format!(
                "expected exactly 2 sections, got {}",
                sections.len()
            )));
        }
        if sections[0].kind != QuestionKind::MultipleChoice {
            return Err(InvalidPaper(
                "section one must be multiple-choice".to_string(),
            ));
        }
        if sections[1].kind != QuestionKind::Essay {
            return Err(InvalidPaper("section two must be essay".to_string()));
        }

        let mut seen = std::collections::HashSet::new();
        for section in &sections {
            if section.questions.is_empty() {
                return Err(InvalidPaper(format!(
                    "section '{}' has no questions",
                    section.title
                )));
            }
            if section.time_budget_secs == 0 {
                return Err(InvalidPaper(format!(
                    "section '{}' has a zero time budget",
                    section.title
                )));
            }
            for question in &section.questions {
                if !seen.insert(question.id) {
                    return Err(InvalidPaper(format!(
                        "duplicate question id {}",
                        question.id
                    )));
                }
                if question.kind != section.kind {
                    return Err(InvalidPaper(format!(
                        "question {} kind does not match its section",
                        question.id
                    )));
                }
                match question.kind {
                    QuestionKind::MultipleChoice => {
                        if question.options.is_empty() {
                            return Err(InvalidPaper(format!(
                                "multiple-choice question {} has no options",
                                question.id
                            )));
                        }
                        if question
                            .options
                            .iter()
                            .any(|o| o.text.is_none() && o.image_url.is_none())
                        {
                            return Err(InvalidPaper(format!(
                                "question {} has an option with neither text nor image",
                                question.id
                            )));
                        }
                    }
                    QuestionKind::Essay => {
                        if !question.options.is_empty() {
                            return Err(InvalidPaper(format!(
                                "essay question {} must not carry options",
                                question.id
                            )));
                        }
                    }
                }
            }
        }

        Ok(Self { title, sections })
    }

    /// Paper title.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Sections in traversal order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Total number of questions across all sections.
    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }

    /// Resolve a paper-wide 1-based question number to a
    /// `(section_index, question_index)` cursor position.
    pub fn locate(&self, number: u32) -> Option<(usize, usize)> {
        if number == 0 {
            return None;
        }
        let mut remaining = number as usize - 1;
        for (section_index, section) in self.sections.iter().enumerate() {
            if remaining < section.questions.len() {
                return Some((section_index, remaining));
            }
            remaining -= section.questions.len();
        }
        None
    }

    /// Paper-wide 1-based number of the question at a cursor position.
    pub fn number_of(&self, section_index: usize, question_index: usize) -> u32 {
        let before: usize = self.sections[..section_index]
            .iter()
            .map(|s| s.questions.len())
            .sum();
        (before + question_index + 1) as u32
    }

    /// Look up a question by its paper-wide 1-based number.
    pub fn question_by_number(&self, number: u32) -> Option<&Question> {
        let (s, q) = self.locate(number)?;
        Some(&self.sections[s].questions[q])
    }

    /// Index of the section that owns a question id.
    pub fn section_of(&self, id: QuestionId) -> Option<usize> {
        self.sections
            .iter()
            .position(|s| s.questions.iter().any(|q| q.id == id))
    }

    /// Look up a question by id.
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.sections
            .iter()
            .flat_map(|s| &s.questions)
            .find(|q| q.id == id)
    }
}

#[cfg(any(test, feature = "test-fixtures"))]
pub mod test_fixtures {
    use super::*;

    pub fn choice_question(id: i64, options: &[i64]) -> Question {
        Question {
            id: QuestionId(id),
            description: format!("Choice question {id}"),
            image_url: None,
            kind: QuestionKind::MultipleChoice,
            options: options
                .iter()
                .map(|&o| ChoiceOption {
                    id: OptionId(o),
                    text: Some(format!("Option {o}")),
                    image_url: None,
                })
                .collect(),
        }
    }

    pub fn essay_question(id: i64) -> Question {
        Question {
            id: QuestionId(id),
            description: format!("Essay question {id}"),
            image_url: None,
            kind: QuestionKind::Essay,
            options: Vec::new(),
        }
    }

    /// A small paper: two choice questions (60s budget) and one essay
    /// question (30s budget).
    pub fn small_paper() -> ExamPaper {
        ExamPaper::new(
            "Walkthrough".to_string(),
            vec![
                Section {
                    kind: QuestionKind::MultipleChoice,
                    title: "Section One".to_string(),
                    time_budget_secs: 60,
                    questions: vec![choice_question(1, &[5, 7, 99]), choice_question(2, &[1, 2])],
                },
                Section {
                    kind: QuestionKind::Essay,
                    title: "Section Two".to_string(),
                    time_budget_secs: 30,
                    questions: vec![essay_question(3)],
                },
            ],
        )
        .unwrap()
    }
}
