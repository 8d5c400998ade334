//! Differential schema inference.
//!
//! ```text
//! baseline + probe buffers ──scanner──► transitions ─┐
//! expectations ──resolver──► expected transitions ───┴─mapper──► ProbeMapping
//!                      (low match rate) ──alignment──► shifted rescan
//! ```
//!
//! [`SchemaInference`] drives the whole flow for a batch of probes and hands
//! the per-probe reports to [`crate::schema::aggregate`].

mod alignment;
mod expectations;
mod mapper;
mod pipeline;
mod resolver;
mod scanner;
mod types;

pub use alignment::{ShiftReport, count_matches, detect_shift, trial_order};
pub use expectations::CategoryExpectations;
pub use mapper::{AmbiguousTransition, ProbeMapping, UnmappedReason, UnmappedTransition, map};
pub use pipeline::{ProbeInput, ProbeReport, SchemaInference};
pub use resolver::{build_expected_transitions, scan_layouts_for};
pub use scanner::{scan, scan_layouts};
pub use types::{
    Candidate, Confidence, Encoding, ExpectedTransitions, FieldName, SchemaEntry, Transition,
    TransitionKey,
};
