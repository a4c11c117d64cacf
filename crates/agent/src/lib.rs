//! The mediation engine — the heart of Weaver.
//!
//! A turn follows a **Recall → Reason ⇄ Act → Commit** cycle:
//!
//! 1. **Recall** the speaking participant's view of the space ledger
//! 2. **Reason**: send policy + context + tool schema to the capability
//! 3. **Act**: if it requested tools, execute them in order, feed the
//!    results back, and reason again
//! 4. **Commit** the human message and everything the loop produced to
//!    the ledger in one step
//!
//! The loop ends when the capability answers with text, or degrades after
//! a fixed number of iterations.

pub mod loop_runner;
pub mod runtime;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use loop_runner::{DEFAULT_MAX_ITERATIONS, LoopOutcome, LoopState, ReasoningLoop};
pub use runtime::MediationRuntime;
