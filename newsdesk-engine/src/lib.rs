//! Editorial decision and revision workflow engine.
//!
//! The engine receives an article together with an externally produced
//! editorial verdict and drives it to a terminal outcome: publish it,
//! reject it, send it back through a bounded revision loop, or dispatch an
//! interview and hand control back to the orchestrator until a reply
//! arrives. It is invoked as a library by an external orchestrator; there
//! is no server or CLI surface here.

pub mod collaborators;
pub mod config;
pub mod dispatch;
pub mod repository;
pub mod workflow;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use workflow::{Workflow, WorkflowError, WorkflowOutcome};
