//! Transaction relay pipeline
//!
//! Stages run in order for every object: [`record::RawObject::parse`],
//! [`validator::validate`], [`transformer::transform`], [`Publisher::publish`].
//! [`PollCycle`] drives one pass over the bucket and [`Scheduler`] repeats it.

pub mod orchestrator;
pub mod publisher;
pub mod record;
pub mod report;
pub mod scheduler;
pub mod transformer;
pub mod validator;

pub use orchestrator::PollCycle;
pub use publisher::{Delivery, Publisher};
pub use record::{ParsedRecord, RawObject, ValidatedRecord};
pub use report::{CycleReport, KeyOutcome};
pub use scheduler::Scheduler;
pub use validator::{Diagnostic, DiagnosticKind};
