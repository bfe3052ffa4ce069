//! Triage services
//!
//! The engine (`triage`), the user-driven actions on it (`actions`), and the
//! digest builder (`summary`). Nothing here knows about a particular front end.

mod actions;
mod helpers;
mod summary;
mod triage;

pub use actions::{ActionOutcome, ActionRequest};
pub use helpers::{
    hours_to_duration, run_blocking, shift_back, shift_forward, validate_thread_id, with_timeout,
};
pub use summary::build_summary;
pub use triage::TriageEngine;
