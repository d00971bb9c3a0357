//! Wall-clock tick driving and session progress observation.

use std::time::Duration;

use anyhow::Result;
use proctor_core::controller::SessionController;
use proctor_core::error::SessionError;
use proctor_core::session::{SessionStatus, SessionView, TickOutcome};
use tokio::time::MissedTickBehavior;

/// Progress observation trait.
///
/// Implementations render session progress as it happens; the driver and
/// the script runner call these between ticks and steps.
pub trait SessionObserver: Send + Sync {
    fn on_section_started(&self, view: &SessionView);
    fn on_tick(&self, view: &SessionView);
    fn on_section_expired(&self, view: &SessionView);
    fn on_submitted(&self, view: &SessionView);
    fn on_submission_failed(&self, view: &SessionView, error: &str);
}

/// No-op observer.
pub struct NoopObserver;

impl SessionObserver for NoopObserver {
    fn on_section_started(&self, _: &SessionView) {}
    fn on_tick(&self, _: &SessionView) {}
    fn on_section_expired(&self, _: &SessionView) {}
    fn on_submitted(&self, _: &SessionView) {}
    fn on_submission_failed(&self, _: &SessionView, _: &str) {}
}

/// Why a driving loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveOutcome {
    /// The requested number of ticks was delivered and the session is
    /// still running.
    Budgeted,
    /// The session reached a submitted state.
    Submitted,
    /// The final section timed out and the forced submission failed; the
    /// session holds its answers awaiting a manual retry.
    SubmissionFailed,
}

/// Delivers one-second ticks to a session at a fixed wall-clock period.
///
/// The period is configurable so rehearsals can run faster than real
/// time; the session itself always interprets one tick as one second.
pub struct TickDriver {
    period: Duration,
}

impl TickDriver {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Deliver up to `ticks` ticks, stopping early if the session leaves
    /// `InProgress`.
    pub async fn drive(
        &self,
        controller: &mut SessionController,
        observer: &dyn SessionObserver,
        ticks: u64,
    ) -> Result<DriveOutcome> {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First interval tick fires immediately; burn it so every session
        // tick lands one period apart.
        interval.tick().await;

        for _ in 0..ticks {
            interval.tick().await;
            match controller.tick().await {
                Ok(TickOutcome::Running { .. }) => {
                    observer.on_tick(&controller.view());
                }
                Ok(TickOutcome::SectionExpired) => {
                    let view = controller.view();
                    observer.on_section_expired(&view);
                    observer.on_section_started(&view);
                }
                Ok(TickOutcome::ExamExpired) => {
                    observer.on_submitted(&controller.view());
                    return Ok(DriveOutcome::Submitted);
                }
                Ok(TickOutcome::Ignored) => {
                    return Ok(if controller.session().status() == SessionStatus::Submitted {
                        DriveOutcome::Submitted
                    } else {
                        DriveOutcome::Budgeted
                    });
                }
                Err(SessionError::SubmissionFailed { message }) => {
                    observer.on_submission_failed(&controller.view(), &message);
                    return Ok(DriveOutcome::SubmissionFailed);
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(DriveOutcome::Budgeted)
    }

    /// Tick until the session reaches a terminal state or a forced
    /// submission fails.
    pub async fn drive_to_end(
        &self,
        controller: &mut SessionController,
        observer: &dyn SessionObserver,
    ) -> Result<DriveOutcome> {
        loop {
            match self.drive(controller, observer, u64::MAX).await? {
                DriveOutcome::Budgeted => continue,
                outcome => return Ok(outcome),
            }
        }
    }
}

impl Default for TickDriver {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proctor_core::model::test_fixtures::small_paper;
    use proctor_core::payload::{SubmissionPayload, SubmissionReceipt};
    use proctor_core::session::ExamSession;
    use proctor_core::traits::SubmissionSink;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    pub(crate) struct OkSink {
        pub(crate) submissions: Mutex<Vec<SubmissionPayload>>,
        pub(crate) fail_next: AtomicU32,
    }

    impl OkSink {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self {
                submissions: Mutex::new(Vec::new()),
                fail_next: AtomicU32::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl SubmissionSink for OkSink {
        fn name(&self) -> &str {
            "test"
        }

        async fn submit(&self, payload: &SubmissionPayload) -> anyhow::Result<SubmissionReceipt> {
            self.submissions.lock().unwrap().push(payload.clone());
            let remaining = self.fail_next.load(Ordering::SeqCst);
            if remaining > 0 {
                self.fail_next.store(remaining - 1, Ordering::SeqCst);
                anyhow::bail!("portal unreachable");
            }
            Ok(SubmissionReceipt {
                message: "accepted".into(),
            })
        }
    }

    pub(crate) struct EventLog {
        pub(crate) events: Mutex<Vec<String>>,
    }

    impl EventLog {
        pub(crate) fn new() -> Self {
            Self {
                events: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn events(&self) -> Vec<String> {
            self.events.lock().unwrap().clone()
        }
    }

    impl SessionObserver for EventLog {
        fn on_section_started(&self, view: &SessionView) {
            self.events
                .lock()
                .unwrap()
                .push(format!("section-started:{}", view.section_index));
        }
        fn on_tick(&self, view: &SessionView) {
            self.events
                .lock()
                .unwrap()
                .push(format!("tick:{}", view.remaining_secs));
        }
        fn on_section_expired(&self, view: &SessionView) {
            self.events
                .lock()
                .unwrap()
                .push(format!("section-expired:{}", view.section_index));
        }
        fn on_submitted(&self, _: &SessionView) {
            self.events.lock().unwrap().push("submitted".into());
        }
        fn on_submission_failed(&self, _: &SessionView, error: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("submission-failed:{error}"));
        }
    }

    fn controller(sink: Arc<OkSink>) -> SessionController {
        SessionController::with_session(ExamSession::new(small_paper()), sink)
    }

    #[tokio::test(start_paused = true)]
    async fn driving_ticks_counts_down() {
        let sink = OkSink::new();
        let mut c = controller(Arc::clone(&sink));
        let log = EventLog::new();

        let driver = TickDriver::new(Duration::from_millis(10));
        let outcome = driver.drive(&mut c, &log, 3).await.unwrap();

        assert_eq!(outcome, DriveOutcome::Budgeted);
        assert_eq!(c.session().remaining_secs(), 57);
        assert_eq!(log.events(), vec!["tick:59", "tick:58", "tick:57"]);
    }

    #[tokio::test(start_paused = true)]
    async fn driving_to_end_expires_both_sections_and_submits() {
        let sink = OkSink::new();
        let mut c = controller(Arc::clone(&sink));
        let log = EventLog::new();

        let driver = TickDriver::new(Duration::from_millis(1));
        let outcome = driver.drive_to_end(&mut c, &log).await.unwrap();

        assert_eq!(outcome, DriveOutcome::Submitted);
        assert_eq!(c.session().status(), SessionStatus::Submitted);
        assert_eq!(sink.submissions.lock().unwrap().len(), 1);

        let events = log.events();
        assert!(events.contains(&"section-expired:1".to_string()));
        assert_eq!(events.last().unwrap(), "submitted");
    }

    #[tokio::test(start_paused = true)]
    async fn failed_forced_submission_reported_and_answers_survive() {
        let sink = OkSink::new();
        sink.fail_next.store(1, Ordering::SeqCst);
        let mut c = controller(Arc::clone(&sink));
        let log = EventLog::new();

        let driver = TickDriver::new(Duration::from_millis(1));
        let outcome = driver.drive_to_end(&mut c, &log).await.unwrap();

        assert_eq!(outcome, DriveOutcome::SubmissionFailed);
        assert_eq!(c.session().status(), SessionStatus::Expired);
        assert!(log
            .events()
            .iter()
            .any(|e| e.starts_with("submission-failed:")));

        // Manual retry still works.
        c.submit().await.unwrap();
        assert_eq!(c.session().status(), SessionStatus::Submitted);
    }
}
