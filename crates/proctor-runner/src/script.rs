//! Scripted attempt execution.
//!
//! A rehearsal script is a TOML file describing, step by step, what a
//! candidate does during an attempt: answering, advancing, jumping back,
//! and letting the clock run. The runner plays the script against a
//! [`SessionController`] and then lets the clock run out if the script
//! never submits, so every rehearsal ends with a submission attempt.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use proctor_core::controller::SessionController;
use proctor_core::model::{AnswerValue, OptionId, QuestionKind};
use proctor_core::session::AdvanceOutcome;

use crate::driver::{DriveOutcome, SessionObserver, TickDriver};

/// One scripted candidate action.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ScriptStep {
    /// Record an answer to a question by its paper-wide number.
    Answer {
        question: u32,
        #[serde(default)]
        option: Option<i64>,
        #[serde(default)]
        text: Option<String>,
    },
    /// Move to the next question (past the last one this submits).
    Advance,
    /// Jump to a question in the current section by number.
    Jump { question: u32 },
    /// Let the given number of seconds elapse.
    Wait { secs: u64 },
    /// Submit the exam explicitly.
    Submit,
}

/// A parsed rehearsal script.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AttemptScript {
    #[serde(default)]
    pub name: Option<String>,
    pub steps: Vec<ScriptStep>,
}

/// Parse a script from a TOML file.
pub fn parse_script(path: &Path) -> Result<AttemptScript> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script: {}", path.display()))?;
    parse_script_str(&content)
        .with_context(|| format!("failed to parse script: {}", path.display()))
}

/// Parse a script from a TOML string.
pub fn parse_script_str(content: &str) -> Result<AttemptScript> {
    let script: AttemptScript = toml::from_str(content)?;
    anyhow::ensure!(!script.steps.is_empty(), "script has no steps");
    Ok(script)
}

/// Plays scripted attempts against a session.
pub struct ScriptRunner {
    driver: TickDriver,
}

impl ScriptRunner {
    pub fn new(driver: TickDriver) -> Self {
        Self { driver }
    }

    /// Execute every step, then let the clock run until the session
    /// reaches a submission attempt.
    ///
    /// Step errors are hard failures: a script that answers a closed
    /// section or jumps across a section boundary is a broken script, not
    /// a scenario worth continuing.
    pub async fn run(
        &self,
        controller: &mut SessionController,
        script: &AttemptScript,
        observer: &dyn SessionObserver,
    ) -> Result<DriveOutcome> {
        observer.on_section_started(&controller.view());

        for (index, step) in script.steps.iter().enumerate() {
            tracing::debug!(step = index + 1, ?step, "executing script step");
            let outcome = self
                .apply_step(controller, step, observer)
                .await
                .with_context(|| format!("script step {} failed", index + 1))?;
            if let Some(outcome) = outcome {
                return Ok(outcome);
            }
        }

        // Script ran out without submitting; let the timers finish the job.
        self.driver.drive_to_end(controller, observer).await
    }

    async fn apply_step(
        &self,
        controller: &mut SessionController,
        step: &ScriptStep,
        observer: &dyn SessionObserver,
    ) -> Result<Option<DriveOutcome>> {
        match step {
            ScriptStep::Answer {
                question,
                option,
                text,
            } => {
                let value = self.resolve_answer(controller, *question, *option, text.as_deref())?;
                let id = controller
                    .session()
                    .paper()
                    .question_by_number(*question)
                    .map(|q| q.id)
                    .with_context(|| format!("no question number {question}"))?;
                controller.record_answer(id, value)?;
                Ok(None)
            }
            ScriptStep::Advance => match controller.advance().await? {
                AdvanceOutcome::ExamComplete => {
                    observer.on_submitted(&controller.view());
                    Ok(Some(DriveOutcome::Submitted))
                }
                AdvanceOutcome::SectionAdvanced => {
                    observer.on_section_started(&controller.view());
                    Ok(None)
                }
                AdvanceOutcome::MovedWithinSection => Ok(None),
            },
            ScriptStep::Jump { question } => {
                controller.jump_to(*question)?;
                Ok(None)
            }
            ScriptStep::Wait { secs } => {
                match self.driver.drive(controller, observer, *secs).await? {
                    DriveOutcome::Budgeted => Ok(None),
                    outcome => Ok(Some(outcome)),
                }
            }
            ScriptStep::Submit => {
                controller.submit().await?;
                observer.on_submitted(&controller.view());
                Ok(Some(DriveOutcome::Submitted))
            }
        }
    }

    fn resolve_answer(
        &self,
        controller: &SessionController,
        question: u32,
        option: Option<i64>,
        text: Option<&str>,
    ) -> Result<AnswerValue> {
        let q = controller
            .session()
            .paper()
            .question_by_number(question)
            .with_context(|| format!("no question number {question}"))?;

        match (q.kind, option, text) {
            (QuestionKind::MultipleChoice, Some(option), None) => {
                Ok(AnswerValue::Choice(OptionId(option)))
            }
            (QuestionKind::Essay, None, Some(text)) => Ok(AnswerValue::Essay(text.to_string())),
            (QuestionKind::MultipleChoice, _, _) => anyhow::bail!(
                "question {question} is multiple-choice and takes exactly an `option`"
            ),
            (QuestionKind::Essay, _, _) => {
                anyhow::bail!("question {question} is an essay and takes exactly a `text`")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::NoopObserver;
    use proctor_core::model::test_fixtures::small_paper;
    use proctor_core::model::QuestionId;
    use proctor_core::payload::{SubmissionPayload, SubmissionReceipt};
    use proctor_core::session::{ExamSession, SessionStatus};
    use proctor_core::traits::SubmissionSink;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct CaptureSink {
        submissions: Mutex<Vec<SubmissionPayload>>,
    }

    impl CaptureSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                submissions: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl SubmissionSink for CaptureSink {
        fn name(&self) -> &str {
            "capture"
        }

        async fn submit(&self, payload: &SubmissionPayload) -> anyhow::Result<SubmissionReceipt> {
            self.submissions.lock().unwrap().push(payload.clone());
            Ok(SubmissionReceipt {
                message: "accepted".into(),
            })
        }
    }

    fn runner() -> ScriptRunner {
        ScriptRunner::new(TickDriver::new(Duration::from_millis(1)))
    }

    fn controller(sink: Arc<CaptureSink>) -> SessionController {
        SessionController::with_session(ExamSession::new(small_paper()), sink)
    }

    const FULL_RUN: &str = r#"
[[steps]]
action = "answer"
question = 1
option = 7

[[steps]]
action = "advance"

[[steps]]
action = "answer"
question = 2
option = 2

[[steps]]
action = "jump"
question = 1

[[steps]]
action = "answer"
question = 1
option = 99

[[steps]]
action = "advance"

[[steps]]
action = "advance"

[[steps]]
action = "answer"
question = 3
text = "a short essay"

[[steps]]
action = "advance"
"#;

    #[test]
    fn parse_all_step_kinds() {
        let script = parse_script_str(
            r#"
name = "smoke"

[[steps]]
action = "answer"
question = 1
option = 5

[[steps]]
action = "wait"
secs = 10

[[steps]]
action = "jump"
question = 2

[[steps]]
action = "advance"

[[steps]]
action = "submit"
"#,
        )
        .unwrap();
        assert_eq!(script.name.as_deref(), Some("smoke"));
        assert_eq!(script.steps.len(), 5);
        assert_eq!(
            script.steps[1],
            ScriptStep::Wait { secs: 10 }
        );
    }

    #[test]
    fn empty_script_rejected() {
        assert!(parse_script_str("steps = []").is_err());
        assert!(parse_script_str("[[steps]]\naction = \"launch\"").is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn full_scripted_run_submits_revised_answers() {
        let sink = CaptureSink::new();
        let mut c = controller(Arc::clone(&sink));
        let script = parse_script_str(FULL_RUN).unwrap();

        let outcome = runner().run(&mut c, &script, &NoopObserver).await.unwrap();

        assert_eq!(outcome, DriveOutcome::Submitted);
        assert_eq!(c.session().status(), SessionStatus::Submitted);

        let submissions = sink.submissions.lock().unwrap();
        assert_eq!(submissions.len(), 1);
        let payload = &submissions[0];
        assert_eq!(payload.answer_count(), 3);
        // The jump-back revision won.
        let q1 = payload
            .multiple_choice_answers
            .iter()
            .find(|a| a.question_id == QuestionId(1))
            .unwrap();
        assert_eq!(q1.option_id, OptionId(99));
    }

    #[tokio::test(start_paused = true)]
    async fn waiting_past_the_final_budget_submits_partial() {
        let sink = CaptureSink::new();
        let mut c = controller(Arc::clone(&sink));
        let script = parse_script_str(
            r#"
[[steps]]
action = "answer"
question = 1
option = 5

[[steps]]
action = "wait"
secs = 120
"#,
        )
        .unwrap();

        let outcome = runner().run(&mut c, &script, &NoopObserver).await.unwrap();

        assert_eq!(outcome, DriveOutcome::Submitted);
        let submissions = sink.submissions.lock().unwrap();
        assert_eq!(submissions[0].answer_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn script_without_submission_runs_clock_to_the_end() {
        let sink = CaptureSink::new();
        let mut c = controller(Arc::clone(&sink));
        let script = parse_script_str(
            r#"
[[steps]]
action = "answer"
question = 1
option = 7
"#,
        )
        .unwrap();

        let outcome = runner().run(&mut c, &script, &NoopObserver).await.unwrap();
        assert_eq!(outcome, DriveOutcome::Submitted);
        assert_eq!(c.session().status(), SessionStatus::Submitted);
    }

    #[tokio::test(start_paused = true)]
    async fn cross_section_jump_is_a_script_error() {
        let sink = CaptureSink::new();
        let mut c = controller(Arc::clone(&sink));
        let script = parse_script_str(
            r#"
[[steps]]
action = "jump"
question = 3
"#,
        )
        .unwrap();

        let err = runner()
            .run(&mut c, &script, &NoopObserver)
            .await
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("step 1"));
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_answer_shape_is_a_script_error() {
        let sink = CaptureSink::new();
        let mut c = controller(Arc::clone(&sink));
        let script = parse_script_str(
            r#"
[[steps]]
action = "answer"
question = 1
text = "not an option"
"#,
        )
        .unwrap();

        let err = runner()
            .run(&mut c, &script, &NoopObserver)
            .await
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("multiple-choice"));
    }
}
