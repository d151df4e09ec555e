//! The editorial decision and revision workflow.
//!
//! This module implements the deterministic control logic around externally
//! produced editorial verdicts. The design separates:
//! - **Routing**: a pure function `(Verdict, revision_count) -> next action`
//!   with no side effects (`decision`)
//! - **Revision**: the bounded Reviser + Fix Validator loop (`revision`)
//! - **Interview**: contact selection, question generation, and dispatch
//!   (`interview`)
//! - **Terminal handlers**: publish and reject, both safe against partial
//!   failure (`terminal`)
//! - **Engine**: the loop that feeds each new verdict back into the router
//!   until a terminal outcome or an interview hand-off (`engine`)

pub mod decision;
pub mod engine;
pub mod interview;
pub mod revision;
pub mod terminal;

pub use decision::{route, NextAction, RoutedDecision};
pub use engine::{Workflow, WorkflowError, WorkflowOutcome};
pub use interview::{InterviewError, InterviewRouter};
pub use revision::{RevisionCycle, RevisionError};
pub use terminal::{PublishOutcome, RejectOutcome, TerminalError};
