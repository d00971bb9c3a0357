//! proctor-runner — tick driving and scripted attempt execution.
//!
//! Feeds one-second ticks into an exam session at a configurable
//! wall-clock period and plays rehearsal scripts against it, reporting
//! progress through the `SessionObserver` trait.

pub mod driver;
pub mod script;

pub use driver::{DriveOutcome, NoopObserver, SessionObserver, TickDriver};
pub use script::{parse_script, parse_script_str, AttemptScript, ScriptRunner, ScriptStep};
