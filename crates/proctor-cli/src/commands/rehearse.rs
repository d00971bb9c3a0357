//! The `proctor rehearse` command.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use proctor_core::controller::SessionController;
use proctor_core::report::AttemptReport;
use proctor_core::session::{ExamSession, SessionView};
use proctor_core::traits::SubmissionSink;
use proctor_providers::config::{create_portal_client, load_config_from};
use proctor_providers::mock::RecordingSink;
use proctor_runner::{parse_script, DriveOutcome, ScriptRunner, SessionObserver, TickDriver};

/// Console progress observer.
struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_section_started(&self, view: &SessionView) {
        eprintln!(
            "  Section {}/{}: {} ({}s on the clock)",
            view.section_index + 1,
            view.section_count,
            view.section_title,
            view.remaining_secs
        );
    }

    fn on_tick(&self, view: &SessionView) {
        if view.remaining_secs % 10 == 0 {
            eprintln!("  {}s remaining", view.remaining_secs);
        }
    }

    fn on_section_expired(&self, view: &SessionView) {
        eprintln!("  Time up for section {}", view.section_index);
    }

    fn on_submitted(&self, view: &SessionView) {
        eprintln!(
            "  Submitted with {}/{} questions answered",
            view.answered.len(),
            view.question_count
        );
    }

    fn on_submission_failed(&self, _: &SessionView, error: &str) {
        eprintln!("  Submission failed: {error}");
    }
}

pub async fn execute(
    paper_path: PathBuf,
    script_path: PathBuf,
    tick_ms: u64,
    output: PathBuf,
    live: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(tick_ms >= 1, "tick-ms must be at least 1");

    let paper = proctor_core::parser::parse_paper(&paper_path)?;
    let script = parse_script(&script_path)?;

    let sink: Arc<dyn SubmissionSink> = if live {
        let config = load_config_from(config_path.as_deref())?;
        Arc::new(create_portal_client(&config)?)
    } else {
        Arc::new(RecordingSink::new())
    };

    eprintln!(
        "Rehearsing {} against {} ({} steps, {}ms per second)",
        script.name.as_deref().unwrap_or("script"),
        paper.title(),
        script.steps.len(),
        tick_ms
    );

    let mut controller =
        SessionController::with_session(ExamSession::new(paper), Arc::clone(&sink));
    let runner = ScriptRunner::new(TickDriver::new(Duration::from_millis(tick_ms)));
    let outcome = runner
        .run(&mut controller, &script, &ConsoleObserver)
        .await?;

    let report = AttemptReport::from_session(controller.session());
    print_summary(&report);

    std::fs::create_dir_all(&output)?;
    let timestamp = chrono::Utc::now().format("%Y-%m-%dT%H%M%S");
    let path = output.join(format!("attempt-{timestamp}.json"));
    report.save_json(&path)?;
    eprintln!("Attempt report saved to: {}", path.display());

    if outcome == DriveOutcome::SubmissionFailed {
        anyhow::bail!("submission failed; answers are preserved in the report");
    }
    if let Some(receipt) = controller.last_receipt() {
        eprintln!("Portal response: {}", receipt.message);
    }

    Ok(())
}

fn print_summary(report: &AttemptReport) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Section", "Kind", "Answered", "Budget"]);

    for section in &report.sections {
        table.add_row(vec![
            Cell::new(&section.title),
            Cell::new(section.kind),
            Cell::new(format!("{}/{}", section.answered, section.questions)),
            Cell::new(format!("{} min", section.time_budget_secs / 60)),
        ]);
    }

    eprintln!("\n{table}");
    eprintln!(
        "Status: {} — {} answered, {} unanswered",
        report.status, report.answered, report.unanswered
    );
}
