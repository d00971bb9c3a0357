//! proctor-providers — question paper sources and submission sinks.
//!
//! Implements the `QuestionProvider` and `SubmissionSink` traits for the
//! recruitment portal HTTP API, local TOML paper files, and in-memory
//! test doubles.

pub mod config;
pub mod error;
pub mod local;
pub mod mock;
pub mod portal;

pub use config::{create_portal_client, load_config, load_config_from, ProctorConfig};
pub use error::PortalError;
pub use local::LocalPaperProvider;
pub use mock::{FixedProvider, RecordingSink};
pub use portal::PortalClient;
