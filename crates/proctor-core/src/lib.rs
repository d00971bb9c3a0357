//! proctor-core — Exam session state machine and collaborator contracts.
//!
//! This crate defines the data model, the session state machine that
//! enforces the one-way navigation and timing rules of a two-section
//! assessment, the submission payload format, and the traits the rest of
//! the proctor system implements.

pub mod controller;
pub mod error;
pub mod model;
pub mod parser;
pub mod payload;
pub mod report;
pub mod session;
pub mod traits;
