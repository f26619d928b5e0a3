//! Adopilot agent: narrow the tool catalog per prompt and drive the
//! completion round-trip.
//!
//! This crate contains:
//! - **catalog**: the tools discovered from the tool server, and the
//!   consistency check against the category table
//! - **intent**: keyword classification of a prompt into categories
//! - **toolset**: the catalog subset offered to the model
//! - **truncate**: the size cap on tool results
//! - **conversation**: the per-run transcript
//! - **orchestrator**: the first completion, tool dispatch, and second completion

pub mod catalog;
pub mod conversation;
pub mod error;
pub mod intent;
pub mod orchestrator;
pub mod toolset;
pub mod truncate;

pub use catalog::{CoverageReport, ToolCatalog};
pub use conversation::Conversation;
pub use error::{AgentError, CompletionPhase};
pub use intent::IntentClassifier;
pub use orchestrator::{ConversationOrchestrator, RunOutcome};
pub use toolset::{reduction_pct, to_definitions, SelectionRecord, ToolSetBuilder};
pub use truncate::{truncate, ResultTruncator, TRUNCATION_MARKER};
