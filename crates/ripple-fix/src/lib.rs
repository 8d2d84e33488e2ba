//! Test execution and the iterative fix loop.
//!
//! - [`runner`]: run a named list of pytest ids as a bounded-time subprocess
//! - [`pytest`]: parse pytest's `-rA` summary and failure sections
//! - [`agent`], [`diff`]: seams to the external coding agent and version control
//! - [`feedback`]: failure detail handed back to the agent
//! - [`orchestrator`]: the candidate / impact / run / feedback state machine

pub mod agent;
pub mod diff;
pub mod feedback;
pub mod orchestrator;
pub mod pytest;
pub mod runner;
